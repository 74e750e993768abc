//! Relationship graph and backlink engine.
//!
//! Infers inbound links between pages, mutates bidirectional relation
//! properties, and walks relation edges breadth-first with a depth bound.
//! Everything here is built fresh per invocation from the remote workspace;
//! nothing is cached or persisted across calls.

mod backlinks;
mod links;
mod render;
mod traversal;

pub use backlinks::{find_backlinks, BacklinkReport};
pub use links::{link, unlink, LinkOutcome, LinkReport};
pub use render::{render, GraphFormat};
pub use traversal::traverse;

use serde::Serialize;

/// How an inbound link was discovered.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum BacklinkKind {
    /// Explicit relation property on the source page; carries the name of
    /// the property whose reference set matched.
    Relation { property: String },
    /// The source surfaced in a title search for the target.
    Mention,
}

/// One inbound reference discovered during resolution.
#[derive(Debug, Clone, Serialize)]
pub struct Backlink {
    pub source_id: String,
    pub source_title: String,
    #[serde(flatten)]
    pub kind: BacklinkKind,
}

/// A page visited during traversal, recorded once at its first-discovery
/// depth (lowest wins, the standard BFS property).
#[derive(Debug, Clone, Serialize)]
pub struct GraphNode {
    pub id: String,
    pub title: String,
    pub depth: usize,
}

/// A directed relation edge. Parallel edges between the same pair via
/// different properties are distinct and all retained.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct GraphEdge {
    pub source: String,
    pub target: String,
    pub property: String,
}

/// Result of a bounded breadth-first walk from a root page.
#[derive(Debug, Clone, Serialize)]
pub struct RelationGraph {
    pub root_id: String,
    pub nodes: Vec<GraphNode>,
    pub edges: Vec<GraphEdge>,
    /// Ids whose fetch failed and were skipped. Partial coverage, not fatal:
    /// their outgoing edges were never discovered.
    pub unreachable: Vec<String>,
}
