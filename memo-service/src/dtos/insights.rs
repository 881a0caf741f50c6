use crate::analysis::frequency::{DEFAULT_TOP_TAGS, DEFAULT_WINDOW_DAYS};
use serde::Deserialize;

#[derive(Debug, Default, Deserialize)]
pub struct ChartParams {
    /// `0` covers every memo.
    pub window_days: Option<u32>,
    pub top: Option<usize>,
}

impl ChartParams {
    pub fn window(&self) -> Option<u32> {
        match self.window_days.unwrap_or(DEFAULT_WINDOW_DAYS) {
            0 => None,
            days => Some(days),
        }
    }

    pub fn top(&self) -> usize {
        self.top.unwrap_or(DEFAULT_TOP_TAGS).max(1)
    }
}

#[derive(Debug, Default, Deserialize)]
pub struct GraphParams {
    pub tag: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn chart_defaults() {
        let params = ChartParams::default();
        assert_eq!(params.window(), Some(30));
        assert_eq!(params.top(), 10);
    }

    #[test]
    fn zero_window_means_all_time() {
        let params = ChartParams {
            window_days: Some(0),
            top: Some(0),
        };
        assert_eq!(params.window(), None);
        assert_eq!(params.top(), 1);
    }
}
