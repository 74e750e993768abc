//! Rendering of traversal results: machine JSON, Graphviz DOT, or a
//! human-readable outline centered on the root. Pure functions, no network
//! or mutation side effects.

use std::collections::HashMap;
use std::str::FromStr;

use crate::error::Result;

use super::RelationGraph;

/// Output representation for a rendered graph.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GraphFormat {
    Json,
    Dot,
    Outline,
}

impl FromStr for GraphFormat {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s {
            "json" => Ok(Self::Json),
            "dot" => Ok(Self::Dot),
            "outline" => Ok(Self::Outline),
            other => Err(format!(
                "Unknown graph format '{}' (expected json, dot or outline)",
                other
            )),
        }
    }
}

/// Render `graph` in the requested format.
pub fn render(graph: &RelationGraph, format: GraphFormat) -> Result<String> {
    Ok(match format {
        GraphFormat::Json => serde_json::to_string_pretty(graph)?,
        GraphFormat::Dot => render_dot(graph),
        GraphFormat::Outline => render_outline(graph),
    })
}

const LABEL_MAX: usize = 32;

fn truncate(text: &str, max: usize) -> String {
    if text.chars().count() <= max {
        text.to_string()
    } else {
        let cut: String = text.chars().take(max.saturating_sub(3)).collect();
        format!("{}...", cut)
    }
}

fn short_id(id: &str) -> &str {
    match id.get(..8) {
        Some(prefix) => prefix,
        None => id,
    }
}

fn escape(text: &str) -> String {
    text.replace('\\', "\\\\").replace('"', "\\\"")
}

/// Graphviz DOT: one box per node labeled with a truncated title and a
/// shortened id, one labeled edge per relation reference.
fn render_dot(graph: &RelationGraph) -> String {
    let mut out = String::from("digraph relations {\n");
    out.push_str("  rankdir=LR;\n");
    out.push_str("  node [shape=box];\n");
    for node in &graph.nodes {
        out.push_str(&format!(
            "  \"{}\" [label=\"{}\\n{}\"];\n",
            escape(&node.id),
            escape(&truncate(&node.title, LABEL_MAX)),
            escape(short_id(&node.id)),
        ));
    }
    for edge in &graph.edges {
        out.push_str(&format!(
            "  \"{}\" -> \"{}\" [label=\"{}\"];\n",
            escape(&edge.source),
            escape(&edge.target),
            escape(&edge.property),
        ));
    }
    out.push_str("}\n");
    out
}

/// Human outline: the root, its outgoing edges ("links to"), its incoming
/// edges ("linked from"), and a closing count line.
fn render_outline(graph: &RelationGraph) -> String {
    let titles: HashMap<&str, &str> = graph
        .nodes
        .iter()
        .map(|n| (n.id.as_str(), n.title.as_str()))
        .collect();
    let label = |id: &str| -> String {
        match titles.get(id) {
            Some(t) => format!("{} ({})", t, short_id(id)),
            None => short_id(id).to_string(),
        }
    };

    let root_title = titles
        .get(graph.root_id.as_str())
        .copied()
        .unwrap_or("Untitled");
    let mut out = String::new();
    out.push_str(&format!("{} ({})\n", root_title, short_id(&graph.root_id)));

    out.push_str("\nlinks to:\n");
    let outgoing: Vec<_> = graph
        .edges
        .iter()
        .filter(|e| e.source == graph.root_id)
        .collect();
    if outgoing.is_empty() {
        out.push_str("  (none)\n");
    }
    for edge in outgoing {
        out.push_str(&format!("  -> {} [{}]\n", label(&edge.target), edge.property));
    }

    out.push_str("\nlinked from:\n");
    let incoming: Vec<_> = graph
        .edges
        .iter()
        .filter(|e| e.target == graph.root_id)
        .collect();
    if incoming.is_empty() {
        out.push_str("  (none)\n");
    }
    for edge in incoming {
        out.push_str(&format!("  <- {} [{}]\n", label(&edge.source), edge.property));
    }

    out.push_str(&format!(
        "\n{} pages, {} links\n",
        graph.nodes.len(),
        graph.edges.len()
    ));
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::graph::{GraphEdge, GraphNode};

    fn sample() -> RelationGraph {
        RelationGraph {
            root_id: "root-123456789".to_string(),
            nodes: vec![
                GraphNode {
                    id: "root-123456789".to_string(),
                    title: "Root".to_string(),
                    depth: 0,
                },
                GraphNode {
                    id: "child-1".to_string(),
                    title: "A rather long child title that overflows the label".to_string(),
                    depth: 1,
                },
            ],
            edges: vec![
                GraphEdge {
                    source: "root-123456789".to_string(),
                    target: "child-1".to_string(),
                    property: "Blocks".to_string(),
                },
                GraphEdge {
                    source: "child-1".to_string(),
                    target: "root-123456789".to_string(),
                    property: "Blocked by".to_string(),
                },
            ],
            unreachable: vec![],
        }
    }

    #[test]
    fn test_format_from_str() {
        assert_eq!("dot".parse::<GraphFormat>().unwrap(), GraphFormat::Dot);
        assert_eq!("json".parse::<GraphFormat>().unwrap(), GraphFormat::Json);
        assert!("mermaid".parse::<GraphFormat>().is_err());
    }

    #[test]
    fn test_json_is_machine_readable() {
        let rendered = render(&sample(), GraphFormat::Json).unwrap();
        let value: serde_json::Value = serde_json::from_str(&rendered).unwrap();
        assert_eq!(value["root_id"], "root-123456789");
        assert_eq!(value["nodes"].as_array().unwrap().len(), 2);
        assert_eq!(value["edges"][0]["property"], "Blocks");
    }

    #[test]
    fn test_dot_contains_nodes_and_labeled_edges() {
        let rendered = render(&sample(), GraphFormat::Dot).unwrap();
        assert!(rendered.starts_with("digraph relations {"));
        assert!(rendered.contains("\"root-123456789\" -> \"child-1\" [label=\"Blocks\"]"));
        // Long titles are truncated in labels
        assert!(rendered.contains("..."));
        assert!(!rendered.contains("overflows the label"));
    }

    #[test]
    fn test_dot_escapes_quotes() {
        let mut graph = sample();
        graph.nodes[0].title = "He said \"hi\"".to_string();
        let rendered = render(&graph, GraphFormat::Dot).unwrap();
        assert!(rendered.contains("He said \\\"hi\\\""));
    }

    #[test]
    fn test_outline_shows_both_directions() {
        let rendered = render(&sample(), GraphFormat::Outline).unwrap();
        assert!(rendered.starts_with("Root (root-123"));
        assert!(rendered.contains("links to:"));
        assert!(rendered.contains("-> A rather long child title"));
        assert!(rendered.contains("linked from:"));
        assert!(rendered.contains("<- A rather long child title"));
        assert!(rendered.contains("2 pages, 2 links"));
    }

    #[test]
    fn test_outline_unknown_edge_target_falls_back_to_id() {
        let mut graph = sample();
        graph.edges.push(GraphEdge {
            source: "root-123456789".to_string(),
            target: "beyond-depth-horizon".to_string(),
            property: "Next".to_string(),
        });
        let rendered = render(&graph, GraphFormat::Outline).unwrap();
        assert!(rendered.contains("-> beyond-d [Next]"));
    }
}
