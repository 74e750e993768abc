//! Bounded breadth-first traversal over relation edges.

use std::collections::{HashSet, VecDeque};

use crate::api::Remote;
use crate::error::Result;
use crate::workspace::{page_relations, title, Workspace};

use super::{GraphEdge, GraphNode, RelationGraph};

/// Walk relation edges outward from `root_id` to at most `max_depth` hops.
///
/// A FIFO queue and a visited set give every node the depth of its first
/// discovery and guarantee termination on cyclic graphs. A node at the depth
/// limit contributes neither edges nor children: an edge is only recorded
/// when its target level would still be within the bound.
///
/// The root fetch failing is fatal. Any other fetch failure skips that node,
/// reports it in `unreachable`, and the walk continues.
pub async fn traverse<R: Remote>(
    ws: &Workspace<R>,
    root_id: &str,
    max_depth: usize,
) -> Result<RelationGraph> {
    let mut visited: HashSet<String> = HashSet::new();
    let mut queue: VecDeque<(String, usize)> = VecDeque::new();
    let mut nodes = Vec::new();
    let mut edges = Vec::new();
    let mut unreachable = Vec::new();

    queue.push_back((root_id.to_string(), 0));

    while let Some((id, level)) = queue.pop_front() {
        if visited.contains(&id) || level > max_depth {
            continue;
        }
        visited.insert(id.clone());

        let page = match ws.page(&id).await {
            Ok(page) => page,
            Err(err) if id != root_id => {
                log::warn!("Skipping unreachable page {}: {}", id, err);
                unreachable.push(id);
                continue;
            }
            Err(err) => return Err(err),
        };

        nodes.push(GraphNode {
            id: id.clone(),
            title: title(&page),
            depth: level,
        });

        if level + 1 > max_depth {
            // Frontier node: no edges, no children
            continue;
        }

        for (property, refs) in page_relations(&page) {
            for reference in refs {
                edges.push(GraphEdge {
                    source: id.clone(),
                    target: reference.id.clone(),
                    property: property.to_string(),
                });
                if !visited.contains(&reference.id) {
                    queue.push_back((reference.id.clone(), level + 1));
                }
            }
        }
    }

    Ok(RelationGraph {
        root_id: root_id.to_string(),
        nodes,
        edges,
        unreachable,
    })
}
