//! Tag/memo relationship graph for the visualization view.
//!
//! Tags sit evenly on a circle. With a tag selected, that tag's memos form a
//! smaller ring around it; otherwise every tagged memo is placed near the
//! centroid of its tags with a little random jitter, and linked to each tag.

use super::frequency::tag_counts;
use crate::models::Memo;
use rand::Rng;
use serde::Serialize;
use std::collections::{HashMap, HashSet};
use std::f64::consts::PI;
use uuid::Uuid;

pub const TAG_RING_RADIUS: f64 = 220.0;
pub const MEMO_RING_RADIUS: f64 = 140.0;
/// Maximum offset on each axis applied to centroid-placed memos.
pub const MEMO_JITTER: f64 = 40.0;

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Position {
    pub x: f64,
    pub y: f64,
}

impl Position {
    fn on_circle(center: Position, radius: f64, angle: f64) -> Self {
        Self {
            x: center.x + angle.cos() * radius,
            y: center.y + angle.sin() * radius,
        }
    }

    fn origin() -> Self {
        Self { x: 0.0, y: 0.0 }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum GraphNode {
    Tag {
        id: String,
        position: Position,
        label: String,
        memo_count: usize,
        selected: bool,
    },
    Memo {
        id: String,
        position: Position,
        memo_id: Uuid,
        title: String,
        content: String,
        tags: Vec<String>,
    },
}

impl GraphNode {
    pub fn id(&self) -> &str {
        match self {
            GraphNode::Tag { id, .. } | GraphNode::Memo { id, .. } => id,
        }
    }

    pub fn position(&self) -> Position {
        match self {
            GraphNode::Tag { position, .. } | GraphNode::Memo { position, .. } => *position,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct GraphEdge {
    pub id: String,
    pub source: String,
    pub target: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RelationshipGraph {
    /// The selection actually applied; unknown tags are dropped.
    pub selected_tag: Option<String>,
    pub nodes: Vec<GraphNode>,
    pub edges: Vec<GraphEdge>,
}

pub fn tag_node_id(tag: &str) -> String {
    format!("tag-{}", tag)
}

pub fn memo_node_id(id: &Uuid) -> String {
    format!("memo-{}", id)
}

fn edge(tag: &str, memo: &Memo) -> GraphEdge {
    GraphEdge {
        id: format!("edge-{}-{}", tag, memo.id),
        source: tag_node_id(tag),
        target: memo_node_id(&memo.id),
    }
}

fn memo_node(memo: &Memo, position: Position) -> GraphNode {
    GraphNode::Memo {
        id: memo_node_id(&memo.id),
        position,
        memo_id: memo.id,
        title: memo.title.clone(),
        content: memo.content.clone(),
        tags: memo.tags.clone(),
    }
}

/// Angle of slot `index` out of `count`, starting at the top of the circle.
fn ring_angle(index: usize, count: usize) -> f64 {
    (index as f64 / count.max(1) as f64) * 2.0 * PI - PI / 2.0
}

/// Build the graph for `memos`, optionally focused on `selected_tag`.
pub fn build_graph<R: Rng + ?Sized>(
    memos: &[Memo],
    selected_tag: Option<&str>,
    rng: &mut R,
) -> RelationshipGraph {
    let stats = tag_counts(memos);

    let tag_positions: HashMap<&str, Position> = stats
        .iter()
        .enumerate()
        .map(|(i, stat)| {
            let angle = ring_angle(i, stats.len());
            (
                stat.tag.as_str(),
                Position::on_circle(Position::origin(), TAG_RING_RADIUS, angle),
            )
        })
        .collect();

    let selected = selected_tag.filter(|tag| tag_positions.contains_key(tag));

    let mut nodes: Vec<GraphNode> = stats
        .iter()
        .map(|stat| GraphNode::Tag {
            id: tag_node_id(&stat.tag),
            position: tag_positions[stat.tag.as_str()],
            label: stat.tag.clone(),
            memo_count: stat.count,
            selected: selected == Some(stat.tag.as_str()),
        })
        .collect();
    let mut edges = Vec::new();

    match selected {
        Some(tag) => {
            let center = tag_positions[tag];
            let related: Vec<&Memo> = memos.iter().filter(|m| m.has_tag(tag)).collect();

            for (j, memo) in related.iter().enumerate() {
                let angle = ring_angle(j, related.len());
                nodes.push(memo_node(
                    memo,
                    Position::on_circle(center, MEMO_RING_RADIUS, angle),
                ));
                edges.push(edge(tag, memo));
            }
        }
        None => {
            for memo in memos {
                let mut seen = HashSet::new();
                let tags: Vec<&str> = memo
                    .tags
                    .iter()
                    .map(String::as_str)
                    .filter(|t| seen.insert(*t))
                    .collect();
                if tags.is_empty() {
                    continue;
                }

                let n = tags.len() as f64;
                let (sum_x, sum_y) = tags.iter().fold((0.0, 0.0), |(x, y), tag| {
                    let p = tag_positions[tag];
                    (x + p.x, y + p.y)
                });
                let position = Position {
                    x: sum_x / n + rng.gen_range(-MEMO_JITTER..=MEMO_JITTER),
                    y: sum_y / n + rng.gen_range(-MEMO_JITTER..=MEMO_JITTER),
                };

                nodes.push(memo_node(memo, position));
                edges.extend(tags.iter().map(|tag| edge(tag, memo)));
            }
        }
    }

    RelationshipGraph {
        selected_tag: selected.map(str::to_string),
        nodes,
        edges,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use rand::{rngs::StdRng, SeedableRng};

    fn memo(tags: &[&str]) -> Memo {
        let now = Utc::now();
        Memo {
            id: Uuid::new_v4(),
            user_email: "a@example.com".to_string(),
            title: "t".to_string(),
            content: "c".to_string(),
            tags: tags.iter().map(|t| t.to_string()).collect(),
            created_at: now,
            updated_at: now,
        }
    }

    fn distance(a: Position, b: Position) -> f64 {
        ((a.x - b.x).powi(2) + (a.y - b.y).powi(2)).sqrt()
    }

    fn node<'a>(graph: &'a RelationshipGraph, id: &str) -> &'a GraphNode {
        graph.nodes.iter().find(|n| n.id() == id).unwrap()
    }

    #[test]
    fn tags_are_spaced_evenly_starting_at_the_top() {
        let memos = vec![memo(&["a", "b"]), memo(&["c", "d"])];
        let graph = build_graph(&memos, Some("none"), &mut StdRng::seed_from_u64(1));

        let first = node(&graph, "tag-a").position();
        assert!(first.x.abs() < 1e-9);
        assert!((first.y + TAG_RING_RADIUS).abs() < 1e-9);

        let second = node(&graph, "tag-b").position();
        assert!((second.x - TAG_RING_RADIUS).abs() < 1e-9);
        assert!(second.y.abs() < 1e-9);

        for tag in ["a", "b", "c", "d"] {
            let p = node(&graph, &tag_node_id(tag)).position();
            assert!((distance(p, Position::origin()) - TAG_RING_RADIUS).abs() < 1e-9);
        }
    }

    #[test]
    fn unknown_selection_is_ignored() {
        let memos = vec![memo(&["a"])];
        let graph = build_graph(&memos, Some("missing"), &mut StdRng::seed_from_u64(1));
        assert_eq!(graph.selected_tag, None);
        assert_eq!(graph.edges.len(), 1);
    }

    #[test]
    fn selected_tag_rings_its_memos() {
        let memos = vec![memo(&["a", "b"]), memo(&["a"]), memo(&["b"])];
        let graph = build_graph(&memos, Some("a"), &mut StdRng::seed_from_u64(1));

        assert_eq!(graph.selected_tag.as_deref(), Some("a"));
        let center = node(&graph, "tag-a").position();

        let memo_nodes: Vec<&GraphNode> = graph
            .nodes
            .iter()
            .filter(|n| matches!(n, GraphNode::Memo { .. }))
            .collect();
        assert_eq!(memo_nodes.len(), 2);
        for n in &memo_nodes {
            assert!((distance(n.position(), center) - MEMO_RING_RADIUS).abs() < 1e-9);
        }

        assert_eq!(graph.edges.len(), 2);
        assert!(graph.edges.iter().all(|e| e.source == "tag-a"));
        assert_eq!(graph.edges[0].id, format!("edge-a-{}", memos[0].id));

        let selected: Vec<bool> = graph
            .nodes
            .iter()
            .filter_map(|n| match n {
                GraphNode::Tag { selected, .. } => Some(*selected),
                _ => None,
            })
            .collect();
        assert_eq!(selected, vec![true, false]);
    }

    #[test]
    fn unselected_graph_links_every_memo_to_each_tag() {
        let memos = vec![memo(&["a", "b"]), memo(&["a"]), memo(&[]), memo(&["c", "c"])];
        let graph = build_graph(&memos, None, &mut StdRng::seed_from_u64(7));

        // Untagged memos get no node; duplicate tags yield one edge.
        let memo_count = graph
            .nodes
            .iter()
            .filter(|n| matches!(n, GraphNode::Memo { .. }))
            .count();
        assert_eq!(memo_count, 3);
        assert_eq!(graph.edges.len(), 4);

        let expected: HashSet<(String, String)> = [
            ("tag-a", &memos[0]),
            ("tag-b", &memos[0]),
            ("tag-a", &memos[1]),
            ("tag-c", &memos[3]),
        ]
        .iter()
        .map(|(t, m)| (t.to_string(), memo_node_id(&m.id)))
        .collect();
        let actual: HashSet<(String, String)> = graph
            .edges
            .iter()
            .map(|e| (e.source.clone(), e.target.clone()))
            .collect();
        assert_eq!(actual, expected);
    }

    #[test]
    fn memos_land_near_the_centroid_of_their_tags() {
        let memos = vec![memo(&["a", "b"])];
        let graph = build_graph(&memos, None, &mut StdRng::seed_from_u64(42));

        let a = node(&graph, "tag-a").position();
        let b = node(&graph, "tag-b").position();
        let centroid = Position {
            x: (a.x + b.x) / 2.0,
            y: (a.y + b.y) / 2.0,
        };

        let placed = node(&graph, &memo_node_id(&memos[0].id)).position();
        assert!((placed.x - centroid.x).abs() <= MEMO_JITTER);
        assert!((placed.y - centroid.y).abs() <= MEMO_JITTER);
    }

    #[test]
    fn empty_input_gives_empty_graph() {
        let graph = build_graph(&[], None, &mut StdRng::seed_from_u64(1));
        assert!(graph.nodes.is_empty());
        assert!(graph.edges.is_empty());
    }
}
