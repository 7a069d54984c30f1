//! Forward/backward slicing over a [`Pdg`] (spec.md §4.6). Both are a
//! BFS over the dependence edges, so both run in linear time in the
//! number of edges and are insensitive to incidental rewrites of
//! statements that don't change the dependence edges themselves.

use crate::pdg::Pdg;
use scalpel_core::uir::NodeId;
use std::collections::{HashSet, VecDeque};

/// Every statement whose removal could change the value computed at
/// `criterion`: the transitive closure of `criterion`'s dependencies.
pub fn backward_slice(pdg: &Pdg, criterion: NodeId) -> HashSet<NodeId> {
    closure(pdg, criterion, true)
}

/// The dual: every statement whose value could change if `criterion`
/// changed.
pub fn forward_slice(pdg: &Pdg, criterion: NodeId) -> HashSet<NodeId> {
    closure(pdg, criterion, false)
}

fn closure(pdg: &Pdg, criterion: NodeId, backward: bool) -> HashSet<NodeId> {
    let mut visited = HashSet::new();
    visited.insert(criterion);
    let mut queue = VecDeque::from([criterion]);

    while let Some(stmt) = queue.pop_front() {
        let index_map = if backward { &pdg.depends_on } else { &pdg.dependents };
        let Some(edge_indices) = index_map.get(&stmt) else {
            continue;
        };
        for &i in edge_indices {
            let edge = &pdg.edges[i];
            let next = if backward { edge.from } else { edge.to };
            if visited.insert(next) {
                queue.push_back(next);
            }
        }
    }

    visited
}

#[cfg(test)]
mod tests {
    use super::*;
    use scalpel_core::uir::UirNodeKind;
    use scalpel_core::Language;

    #[test]
    fn backward_slice_of_return_includes_its_data_dependency() {
        let src = b"def f():\n    x = 1\n    y = x\n    z = 2\n    return y\n";
        let tree = scalpel_parse::parse_and_lower(Language::Python, src, "m").unwrap();
        let pdg = Pdg::build(&tree, tree.root);

        let return_stmt = tree
            .nodes
            .iter()
            .enumerate()
            .find(|(_, n)| n.kind == UirNodeKind::Return)
            .map(|(i, _)| scalpel_core::uir::NodeId(i as u32))
            .unwrap();

        let slice = backward_slice(&pdg, return_stmt);
        // `y = x` is in the slice (direct data dependency), `z = 2` is not.
        let z_def = tree
            .nodes
            .iter()
            .enumerate()
            .find(|(_, n)| {
                n.kind == UirNodeKind::Assign
                    && n.children
                        .first()
                        .map(|&c| tree.get(c).attrs.get("name").and_then(|v| v.as_str()) == Some("z"))
                        .unwrap_or(false)
            })
            .map(|(i, _)| scalpel_core::uir::NodeId(i as u32))
            .unwrap();
        assert!(!slice.contains(&z_def));
    }

    #[test]
    fn forward_slice_is_dual_of_backward() {
        let src = b"def f():\n    x = 1\n    y = x\n    return y\n";
        let tree = scalpel_parse::parse_and_lower(Language::Python, src, "m").unwrap();
        let pdg = Pdg::build(&tree, tree.root);

        let x_def = tree
            .nodes
            .iter()
            .enumerate()
            .find(|(_, n)| {
                n.kind == UirNodeKind::Assign
                    && n.children
                        .first()
                        .map(|&c| tree.get(c).attrs.get("name").and_then(|v| v.as_str()) == Some("x"))
                        .unwrap_or(false)
            })
            .map(|(i, _)| scalpel_core::uir::NodeId(i as u32))
            .unwrap();

        let slice = forward_slice(&pdg, x_def);
        assert!(slice.len() > 1);
    }
}
