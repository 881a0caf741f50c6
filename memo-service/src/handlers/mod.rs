pub mod assist;
pub mod health;
pub mod insights;
pub mod memos;

pub use assist::{chat, generate_suggestions, generate_tags, generate_title};
pub use health::{health_check, metrics_handler, readiness_check};
pub use insights::{chart, graph};
pub use memos::{create_memo, delete_memo, get_memo, list_memos, memo_stats, update_memo};
