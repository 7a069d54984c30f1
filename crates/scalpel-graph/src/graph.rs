//! Unified cross-language graph storage (spec.md §4.5), grounded on the
//! teacher's `features::cross_file::symbol_graph::SymbolDependencyGraph`
//! (a `petgraph::DiGraph` plus a `SymbolId -> NodeIndex` side index), but
//! with spec.md's richer `GraphEdge` (confidence, evidence,
//! human-approval flag) as edge weight instead of a bare edge-kind enum.

use petgraph::graph::{DiGraph, NodeIndex};
use petgraph::Direction;
use scalpel_core::graph::{EdgeKind, GraphEdge};
use scalpel_core::symbol::SymbolKind;
use scalpel_core::SymbolId;
use std::collections::HashMap;
use std::path::PathBuf;

/// A node in the unified graph: a resolved symbol plus the file it was
/// defined in, for Mermaid rendering and surgery hand-off.
#[derive(Debug, Clone)]
pub struct GraphNode {
    pub id: SymbolId,
    pub kind: SymbolKind,
    pub file: PathBuf,
}

pub struct CodeGraph {
    graph: DiGraph<GraphNode, GraphEdge>,
    index: HashMap<SymbolId, NodeIndex>,
}

impl CodeGraph {
    pub fn new() -> Self {
        Self {
            graph: DiGraph::new(),
            index: HashMap::new(),
        }
    }

    pub fn node_count(&self) -> usize {
        self.graph.node_count()
    }

    pub fn edge_count(&self) -> usize {
        self.graph.edge_count()
    }

    pub fn contains(&self, id: &SymbolId) -> bool {
        self.index.contains_key(id)
    }

    /// Insert a node if not already present; idempotent re-insertion of
    /// the same symbol (e.g. seen from both a def and a ref pass) is a
    /// no-op.
    pub fn add_node(&mut self, node: GraphNode) -> NodeIndex {
        if let Some(&idx) = self.index.get(&node.id) {
            return idx;
        }
        let id = node.id.clone();
        let idx = self.graph.add_node(node);
        self.index.insert(id, idx);
        idx
    }

    pub fn node(&self, id: &SymbolId) -> Option<&GraphNode> {
        self.index.get(id).map(|&idx| &self.graph[idx])
    }

    /// Add an edge between two symbols. Both endpoints must already be
    /// present as nodes (spec.md's construction order inserts defs/refs
    /// before any edge pass); a missing endpoint is silently skipped per
    /// the "ambiguity produces multiple edges, not exceptions" failure
    /// model in spec.md §4.5 — an edge to a node we never saw a
    /// definition for is treated the same way as an unresolved name.
    pub fn add_edge(&mut self, edge: GraphEdge) {
        let (Some(&src), Some(&dst)) = (self.index.get(&edge.src), self.index.get(&edge.dst)) else {
            return;
        };
        self.graph.add_edge(src, dst, edge);
    }

    pub fn edges_out(&self, id: &SymbolId) -> Vec<&GraphEdge> {
        let Some(&idx) = self.index.get(id) else {
            return Vec::new();
        };
        self.graph
            .edges_directed(idx, Direction::Outgoing)
            .map(|e| e.weight())
            .collect()
    }

    pub fn edges_in(&self, id: &SymbolId) -> Vec<&GraphEdge> {
        let Some(&idx) = self.index.get(id) else {
            return Vec::new();
        };
        self.graph
            .edges_directed(idx, Direction::Incoming)
            .map(|e| e.weight())
            .collect()
    }

    pub fn neighbors(&self, id: &SymbolId, direction: Direction) -> Vec<(EdgeKind, SymbolId)> {
        let Some(&idx) = self.index.get(id) else {
            return Vec::new();
        };
        self.graph
            .edges_directed(idx, direction)
            .map(|e| {
                let other = if direction == Direction::Outgoing {
                    e.target()
                } else {
                    e.source()
                };
                (e.weight().kind, self.graph[other].id.clone())
            })
            .collect()
    }

    pub fn all_nodes(&self) -> impl Iterator<Item = &GraphNode> {
        self.graph.node_weights()
    }

    pub fn all_edges(&self) -> impl Iterator<Item = &GraphEdge> {
        self.graph.edge_weights()
    }
}

impl Default for CodeGraph {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sym(name: &str) -> SymbolId {
        SymbolId::new("python", "m", SymbolKind::Function, name, None)
    }

    #[test]
    fn add_node_is_idempotent() {
        let mut g = CodeGraph::new();
        let id = sym("foo");
        g.add_node(GraphNode {
            id: id.clone(),
            kind: SymbolKind::Function,
            file: PathBuf::from("m.py"),
        });
        g.add_node(GraphNode {
            id: id.clone(),
            kind: SymbolKind::Function,
            file: PathBuf::from("m.py"),
        });
        assert_eq!(g.node_count(), 1);
    }

    #[test]
    fn edge_to_missing_node_is_skipped() {
        let mut g = CodeGraph::new();
        let a = sym("a");
        g.add_node(GraphNode {
            id: a.clone(),
            kind: SymbolKind::Function,
            file: PathBuf::from("m.py"),
        });
        g.add_edge(GraphEdge::new_definite(a.clone(), sym("ghost"), EdgeKind::DirectCall));
        assert_eq!(g.edge_count(), 0);
    }

    #[test]
    fn direct_call_edge_is_queryable() {
        let mut g = CodeGraph::new();
        let a = sym("a");
        let b = sym("b");
        g.add_node(GraphNode { id: a.clone(), kind: SymbolKind::Function, file: PathBuf::from("m.py") });
        g.add_node(GraphNode { id: b.clone(), kind: SymbolKind::Function, file: PathBuf::from("m.py") });
        g.add_edge(GraphEdge::new_definite(a.clone(), b.clone(), EdgeKind::DirectCall));

        let out = g.edges_out(&a);
        assert_eq!(out.len(), 1);
        assert_eq!(out[0].dst, b);
    }
}
