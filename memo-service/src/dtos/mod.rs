pub mod assist;
pub mod insights;
pub mod memos;

pub use assist::{
    ChatRequest, ContentRequest, SuggestionsResponse, TagsResponse, TitleResponse,
};
pub use insights::{ChartParams, GraphParams};
pub use memos::{CreateMemoRequest, DeleteResponse, SearchParams, UpdateMemoRequest};
