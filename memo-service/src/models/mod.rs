//! Domain models for the memo service.

pub mod memo;

pub use memo::{CreateMemo, Memo, MemoStats, TagCount, UpdateMemo};
