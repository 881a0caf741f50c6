//! Deterministic memo analysis: fallbacks for the model-backed features and
//! the aggregations behind the visualization views.

pub mod context;
pub mod frequency;
pub mod graph;
pub mod keywords;
pub mod title;

pub use context::{format_memo_context, recent_window, CONTEXT_LIMIT};
pub use frequency::{chart_slices, tag_counts, tag_frequency, ChartData, ChartSlice, MemoPreview};
pub use graph::{build_graph, GraphEdge, GraphNode, Position, RelationshipGraph};
pub use keywords::{extract_keywords, parse_tag_reply, MAX_TAGS, PLACEHOLDER_TAG};
pub use title::{clamp_generated_title, fallback_title};
