//! Program dependence graph: control dependence from the post-dominator
//! frontier, data dependence from reaching definitions (spec.md §4.6),
//! grounded on `codegraph-ir/src/features/pdg/infrastructure/pdg.rs`.

use crate::cfg::{build_cfg, Cfg};
use crate::dominators::PostDominators;
use petgraph::graph::NodeIndex;
use petgraph::visit::EdgeRef;
use petgraph::Direction;
use scalpel_core::uir::{NodeId, UirNodeKind, UirTree};
use std::collections::{HashMap, HashSet};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PdgEdgeKind {
    Control,
    Data,
}

#[derive(Debug, Clone)]
pub struct PdgEdge {
    pub from: NodeId,
    pub to: NodeId,
    pub kind: PdgEdgeKind,
}

pub struct Pdg {
    /// statement -> statements it depends on (control or data)
    pub edges: Vec<PdgEdge>,
    /// statement -> statements that depend on it (reverse index, for slicing)
    pub dependents: HashMap<NodeId, Vec<usize>>,
    pub depends_on: HashMap<NodeId, Vec<usize>>,
}

impl Pdg {
    pub fn build(tree: &UirTree, function_root: NodeId) -> Self {
        let cfg = build_cfg(tree, function_root);
        let pdom = PostDominators::compute(&cfg);

        let mut edges = Vec::new();
        edges.extend(control_dependence(&cfg, &pdom));
        edges.extend(data_dependence(tree, &cfg));

        let mut dependents: HashMap<NodeId, Vec<usize>> = HashMap::new();
        let mut depends_on: HashMap<NodeId, Vec<usize>> = HashMap::new();
        for (i, edge) in edges.iter().enumerate() {
            dependents.entry(edge.from).or_default().push(i);
            depends_on.entry(edge.to).or_default().push(i);
        }

        Pdg { edges, dependents, depends_on }
    }
}

fn control_dependence(cfg: &Cfg, pdom: &PostDominators) -> Vec<PdgEdge> {
    let mut edges = Vec::new();
    for a in cfg.graph.node_indices() {
        for edge in cfg.graph.edges_directed(a, Direction::Outgoing) {
            let b = edge.target();
            if pdom.post_dominates(b, a) {
                continue;
            }
            let stop = pdom.immediate(a);
            let mut cur = Some(b);
            while let Some(node) = cur {
                if Some(node) == stop {
                    break;
                }
                if node != cfg.exit {
                    edges.push(PdgEdge {
                        from: cfg.graph[a],
                        to: cfg.graph[node],
                        kind: PdgEdgeKind::Control,
                    });
                }
                cur = pdom.immediate(node);
            }
        }
    }
    edges
}

fn defs_of(tree: &UirTree, stmt: NodeId) -> HashSet<String> {
    let node = tree.get(stmt);
    if node.kind == UirNodeKind::Assign {
        if let Some(&first) = node.children.first() {
            let target = tree.get(first);
            if target.kind == UirNodeKind::Name {
                if let Some(name) = target.attrs.get("name").and_then(|v| v.as_str()) {
                    return HashSet::from([name.to_string()]);
                }
            }
        }
    }
    HashSet::new()
}

fn uses_of(tree: &UirTree, stmt: NodeId) -> HashSet<String> {
    let node = tree.get(stmt);
    let skip_first = node.kind == UirNodeKind::Assign;
    let mut uses = HashSet::new();
    let children = if skip_first {
        node.children.iter().skip(1).copied().collect::<Vec<_>>()
    } else {
        node.children.clone()
    };
    for child in children {
        collect_names(tree, child, &mut uses);
    }
    uses
}

fn collect_names(tree: &UirTree, id: NodeId, out: &mut HashSet<String>) {
    let node = tree.get(id);
    if node.kind == UirNodeKind::Name {
        if let Some(name) = node.attrs.get("name").and_then(|v| v.as_str()) {
            out.insert(name.to_string());
        }
    }
    for &child in &node.children {
        collect_names(tree, child, out);
    }
}

/// Reaching-definitions data dependence: for every statement and every
/// variable it uses, find the statements whose reaching definition of
/// that variable is still live at this use.
fn data_dependence(tree: &UirTree, cfg: &Cfg) -> Vec<PdgEdge> {
    let nodes: Vec<NodeIndex> = cfg.graph.node_indices().collect();
    let mut gen: HashMap<NodeIndex, HashMap<String, NodeIndex>> = HashMap::new();
    for &n in &nodes {
        let id = cfg.graph[n];
        if id == cfg.graph[cfg.entry] || id == cfg.graph[cfg.exit] {
            continue;
        }
        let mut g = HashMap::new();
        for name in defs_of(tree, id) {
            g.insert(name, n);
        }
        gen.insert(n, g);
    }

    let mut reach_in: HashMap<NodeIndex, HashMap<String, HashSet<NodeIndex>>> =
        nodes.iter().map(|&n| (n, HashMap::new())).collect();
    let mut reach_out: HashMap<NodeIndex, HashMap<String, HashSet<NodeIndex>>> =
        nodes.iter().map(|&n| (n, HashMap::new())).collect();

    let mut changed = true;
    while changed {
        changed = false;
        for &n in &nodes {
            let mut incoming: HashMap<String, HashSet<NodeIndex>> = HashMap::new();
            for pred in cfg.graph.neighbors_directed(n, Direction::Incoming) {
                for (var, defs) in &reach_out[&pred] {
                    incoming.entry(var.clone()).or_default().extend(defs.iter().copied());
                }
            }
            if incoming != reach_in[&n] {
                reach_in.insert(n, incoming.clone());
                changed = true;
            }

            let mut out = incoming;
            if let Some(g) = gen.get(&n) {
                for (var, def_node) in g {
                    out.insert(var.clone(), HashSet::from([*def_node]));
                }
            }
            if out != reach_out[&n] {
                reach_out.insert(n, out);
                changed = true;
            }
        }
    }

    let mut edges = Vec::new();
    for &n in &nodes {
        let id = cfg.graph[n];
        if id == cfg.graph[cfg.entry] || id == cfg.graph[cfg.exit] {
            continue;
        }
        let used = uses_of(tree, id);
        for var in used {
            if let Some(defs) = reach_in[&n].get(&var) {
                for &def in defs {
                    edges.push(PdgEdge {
                        from: cfg.graph[def],
                        to: id,
                        kind: PdgEdgeKind::Data,
                    });
                }
            }
        }
    }
    edges
}

#[cfg(test)]
mod tests {
    use super::*;
    use scalpel_core::Language;

    #[test]
    fn assignment_reaches_its_use() {
        let src = b"def f():\n    x = 1\n    y = x\n    return y\n";
        let tree = scalpel_parse::parse_and_lower(Language::Python, src, "m").unwrap();
        let pdg = Pdg::build(&tree, tree.root);
        assert!(pdg.edges.iter().any(|e| e.kind == PdgEdgeKind::Data));
    }

    #[test]
    fn statement_inside_if_is_control_dependent_on_condition() {
        let src = b"def f():\n    if x:\n        y = 1\n    return 0\n";
        let tree = scalpel_parse::parse_and_lower(Language::Python, src, "m").unwrap();
        let pdg = Pdg::build(&tree, tree.root);
        assert!(pdg.edges.iter().any(|e| e.kind == PdgEdgeKind::Control));
    }
}
