pub mod assistant;
pub mod database;
pub mod metrics;
pub mod providers;

pub use assistant::{Assistant, AssistantTimeouts, ChatTurn, Suggestion};
pub use database::{MemoStore, PgMemoStore};
pub use metrics::{get_metrics, init_metrics};
