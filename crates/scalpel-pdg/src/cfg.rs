//! Control-flow graph construction over a function's UIR subtree
//! (spec.md §4.6 "PDG construction"), grounded on
//! `codegraph-ir/src/features/pdg/infrastructure/pdg.rs`'s CFG pass.
//!
//! The UIR keeps control constructs generic (`If`, `Loop`, `Try`,
//! `ExceptHandler`) rather than per-language-grammar shaped, so the CFG
//! here is built structurally: a `Block`'s children run in sequence, an
//! `If` node's first child is its condition and every later child is a
//! conditionally-taken branch that rejoins after the node, a `Loop`
//! node's children form a body that branches back to the loop's entry,
//! and every statement inside a `Try` body also gets an exception edge
//! to the nearest `ExceptHandler` sibling — exception edges are ordinary
//! successors, per spec.md §4.6.

use petgraph::graph::{DiGraph, NodeIndex};
use scalpel_core::uir::{NodeId, UirNodeKind, UirTree};
use std::collections::HashMap;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CfgEdgeKind {
    Normal,
    Exception,
}

/// One function's control-flow graph. `entry`/`exit` are synthetic
/// sentinel nodes (`NodeId` values never produced by the parser) so
/// slicing and dominator computation have a single source/sink.
pub struct Cfg {
    pub graph: DiGraph<NodeId, CfgEdgeKind>,
    pub index: HashMap<NodeId, NodeIndex>,
    pub entry: NodeIndex,
    pub exit: NodeIndex,
}

impl Cfg {
    pub fn node_index(&self, id: NodeId) -> Option<NodeIndex> {
        self.index.get(&id).copied()
    }
}

const ENTRY_SENTINEL: NodeId = NodeId(u32::MAX);
const EXIT_SENTINEL: NodeId = NodeId(u32::MAX - 1);

pub fn build_cfg(tree: &UirTree, function_root: NodeId) -> Cfg {
    let mut graph = DiGraph::new();
    let mut index = HashMap::new();
    let entry = graph.add_node(ENTRY_SENTINEL);
    let exit = graph.add_node(EXIT_SENTINEL);
    index.insert(ENTRY_SENTINEL, entry);
    index.insert(EXIT_SENTINEL, exit);

    let mut builder = Builder {
        tree,
        graph: &mut graph,
        index: &mut index,
        exit,
    };

    let body_entry = builder.node_for(function_root);
    builder.link(entry, body_entry, CfgEdgeKind::Normal);
    let tails = builder.walk_statement(function_root, None);
    for tail in tails {
        builder.link(tail, exit, CfgEdgeKind::Normal);
    }

    Cfg { graph, index, entry, exit }
}

struct Builder<'a> {
    tree: &'a UirTree,
    graph: &'a mut DiGraph<NodeId, CfgEdgeKind>,
    index: &'a mut HashMap<NodeId, NodeIndex>,
    exit: NodeIndex,
}

impl<'a> Builder<'a> {
    fn node_for(&mut self, id: NodeId) -> NodeIndex {
        if let Some(&idx) = self.index.get(&id) {
            return idx;
        }
        let idx = self.graph.add_node(id);
        self.index.insert(id, idx);
        idx
    }

    fn link(&mut self, from: NodeIndex, to: NodeIndex, kind: CfgEdgeKind) {
        self.graph.add_edge(from, to, kind);
    }

    /// Walk one statement, linking its internal control flow, and return
    /// the set of "tail" nodes control can fall through to afterward
    /// (empty if the statement always diverts control, e.g. `return`).
    fn walk_statement(&mut self, id: NodeId, handler: Option<NodeId>) -> Vec<NodeIndex> {
        let node = self.tree.get(id);
        match &node.kind {
            UirNodeKind::Return | UirNodeKind::Raise => {
                let idx = self.node_for(id);
                self.link(idx, self.exit, CfgEdgeKind::Normal);
                Vec::new()
            }
            UirNodeKind::Block | UirNodeKind::Module | UirNodeKind::FunctionDef => {
                self.walk_sequence(&node.children.clone(), handler)
            }
            UirNodeKind::If => {
                let children = node.children.clone();
                let cond_idx = self.node_for(id);
                let mut tails = Vec::new();
                let mut any_branch = false;
                for &branch in children.iter().skip(1) {
                    any_branch = true;
                    let branch_entry = self.node_for(branch);
                    self.link(cond_idx, branch_entry, CfgEdgeKind::Normal);
                    tails.extend(self.walk_statement(branch, handler));
                }
                if !any_branch || children.len() < 3 {
                    // No explicit else: the condition itself can fall
                    // through when false.
                    tails.push(cond_idx);
                }
                tails
            }
            UirNodeKind::Loop => {
                let children = node.children.clone();
                let loop_idx = self.node_for(id);
                let body_tails = self.walk_sequence(&children, handler);
                for tail in &body_tails {
                    self.link(*tail, loop_idx, CfgEdgeKind::Normal);
                }
                vec![loop_idx]
            }
            UirNodeKind::Try => {
                let children = node.children.clone();
                let handlers: Vec<NodeId> = children
                    .iter()
                    .copied()
                    .filter(|c| self.tree.get(*c).kind == UirNodeKind::ExceptHandler)
                    .collect();
                let body: Vec<NodeId> = children
                    .iter()
                    .copied()
                    .filter(|c| self.tree.get(*c).kind != UirNodeKind::ExceptHandler)
                    .collect();
                let nearest_handler = handlers.first().copied().or(handler);

                let mut tails = self.walk_sequence(&body, nearest_handler);
                for &stmt in &body {
                    if let Some(h) = nearest_handler {
                        let stmt_idx = self.node_for(stmt);
                        let handler_idx = self.node_for(h);
                        self.link(stmt_idx, handler_idx, CfgEdgeKind::Exception);
                    }
                }
                for &h in &handlers {
                    tails.extend(self.walk_statement(h, handler));
                }
                tails
            }
            UirNodeKind::ExceptHandler => self.walk_sequence(&node.children.clone(), handler),
            _ => vec![self.node_for(id)],
        }
    }

    fn walk_sequence(&mut self, statements: &[NodeId], handler: Option<NodeId>) -> Vec<NodeIndex> {
        let mut tails: Vec<NodeIndex> = Vec::new();
        for &stmt in statements {
            let stmt_idx = self.node_for(stmt);
            if tails.is_empty() {
                tails.push(stmt_idx);
            } else {
                for t in std::mem::take(&mut tails) {
                    self.link(t, stmt_idx, CfgEdgeKind::Normal);
                }
                tails.push(stmt_idx);
            }
            tails = self.walk_statement(stmt, handler);
            if tails.is_empty() {
                return Vec::new();
            }
        }
        tails
    }
}
