//! k-hop neighborhood query (spec.md §4.5 query contract), grounded on
//! the teacher's `features/query_engine/traversal_engine.rs` BFS-by-depth
//! traversal, but emitting a fully deterministic total order over the
//! collected edges instead of relying on the teacher's hash-map
//! iteration order.

use crate::error::GraphError;
use crate::graph::{CodeGraph, GraphNode};
use petgraph::Direction;
use scalpel_core::graph::GraphEdge;
use scalpel_core::SymbolId;
use std::cmp::Ordering;
use std::collections::{HashSet, VecDeque};

/// Result of a `k_hop` traversal: the reachable nodes and the edges that
/// connect them, already in the deterministic order spec.md §4.5 demands.
#[derive(Debug, Clone)]
pub struct Subgraph {
    pub nodes: Vec<GraphNode>,
    pub edges: Vec<GraphEdge>,
}

/// Breadth-first traversal out to `k` hops from `seed`, following edges
/// in `direction`. Returns every node reached within `k` hops (inclusive
/// of the seed) and every edge between two reached nodes.
pub fn k_hop(
    graph: &CodeGraph,
    seed: &SymbolId,
    k: usize,
    direction: Direction,
) -> Result<Subgraph, GraphError> {
    if !graph.contains(seed) {
        return Err(GraphError::UnknownSymbol(seed.as_str().to_string()));
    }

    let mut visited = HashSet::new();
    visited.insert(seed.clone());
    let mut frontier = VecDeque::new();
    frontier.push_back((seed.clone(), 0usize));

    while let Some((current, depth)) = frontier.pop_front() {
        if depth >= k {
            continue;
        }
        for (_, neighbor) in graph.neighbors(&current, direction) {
            if visited.insert(neighbor.clone()) {
                frontier.push_back((neighbor, depth + 1));
            }
        }
    }

    let mut nodes: Vec<GraphNode> = visited
        .iter()
        .filter_map(|id| graph.node(id).cloned())
        .collect();
    nodes.sort_by(|a, b| a.id.as_str().cmp(b.id.as_str()));

    let mut edges: Vec<GraphEdge> = visited
        .iter()
        .flat_map(|id| graph.edges_out(id))
        .filter(|e| visited.contains(&e.dst))
        .cloned()
        .collect();
    edges.sort_by(total_order);

    Ok(Subgraph { nodes, edges })
}

/// `(confidence desc, edge-kind priority, lexicographic node id)` per
/// spec.md §4.5.
fn total_order(a: &GraphEdge, b: &GraphEdge) -> Ordering {
    b.confidence
        .partial_cmp(&a.confidence)
        .unwrap_or(Ordering::Equal)
        .then_with(|| a.kind.traversal_priority().cmp(&b.kind.traversal_priority()))
        .then_with(|| a.src.as_str().cmp(b.src.as_str()))
        .then_with(|| a.dst.as_str().cmp(b.dst.as_str()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::graph::CodeGraph;
    use scalpel_core::graph::EdgeKind;
    use scalpel_core::symbol::SymbolKind;
    use std::path::PathBuf;

    fn sym(name: &str) -> SymbolId {
        SymbolId::new("python", "m", SymbolKind::Function, name, None)
    }

    fn node(id: &SymbolId) -> GraphNode {
        GraphNode {
            id: id.clone(),
            kind: SymbolKind::Function,
            file: PathBuf::from("m.py"),
        }
    }

    #[test]
    fn one_hop_stops_at_direct_neighbors() {
        let mut g = CodeGraph::new();
        let a = sym("a");
        let b = sym("b");
        let c = sym("c");
        g.add_node(node(&a));
        g.add_node(node(&b));
        g.add_node(node(&c));
        g.add_edge(GraphEdge::new_definite(a.clone(), b.clone(), EdgeKind::DirectCall));
        g.add_edge(GraphEdge::new_definite(b.clone(), c.clone(), EdgeKind::DirectCall));

        let sub = k_hop(&g, &a, 1, Direction::Outgoing).unwrap();
        let ids: HashSet<_> = sub.nodes.iter().map(|n| n.id.clone()).collect();
        assert!(ids.contains(&a));
        assert!(ids.contains(&b));
        assert!(!ids.contains(&c));
    }

    #[test]
    fn unknown_seed_is_an_error() {
        let g = CodeGraph::new();
        assert!(k_hop(&g, &sym("ghost"), 1, Direction::Outgoing).is_err());
    }

    #[test]
    fn edges_sort_by_confidence_then_priority_then_id() {
        let mut g = CodeGraph::new();
        let a = sym("a");
        let b = sym("b");
        let c = sym("c");
        g.add_node(node(&a));
        g.add_node(node(&b));
        g.add_node(node(&c));
        g.add_edge(GraphEdge::new_heuristic(a.clone(), b.clone(), EdgeKind::InferredType, 0.5, "x", 0.8));
        g.add_edge(GraphEdge::new_definite(a.clone(), c.clone(), EdgeKind::DirectCall));

        let sub = k_hop(&g, &a, 1, Direction::Outgoing).unwrap();
        assert_eq!(sub.edges[0].kind, EdgeKind::DirectCall);
        assert_eq!(sub.edges[1].kind, EdgeKind::InferredType);
    }
}
