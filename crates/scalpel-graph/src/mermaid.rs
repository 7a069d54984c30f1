//! Mermaid `graph TD` renderer for a [`Subgraph`] (spec.md §6 output
//! format: node ids suffixed with a short label, edges annotated with
//! the edge-kind initial and confidence to one decimal place). No direct
//! teacher counterpart; follows the teacher's convention of placing
//! output adapters under their own module rather than inline in the
//! engine.

use crate::query::Subgraph;
use std::collections::HashMap;
use std::fmt::Write as _;

/// Render a subgraph to Mermaid flowchart syntax. Node ids are mapped to
/// short `n0`, `n1`, ... identifiers (Mermaid node ids can't contain the
/// `::` used by [`SymbolId`](scalpel_core::SymbolId)), each labeled with
/// the symbol's own display string.
pub fn render(subgraph: &Subgraph) -> String {
    let mut ids = HashMap::new();
    for (i, node) in subgraph.nodes.iter().enumerate() {
        ids.insert(node.id.as_str().to_string(), format!("n{i}"));
    }

    let mut out = String::from("graph TD\n");
    for node in &subgraph.nodes {
        let id = &ids[node.id.as_str()];
        let _ = writeln!(out, "    {id}[\"{}\"]", node.id.as_str());
    }
    for edge in &subgraph.edges {
        let Some(src) = ids.get(edge.src.as_str()) else {
            continue;
        };
        let Some(dst) = ids.get(edge.dst.as_str()) else {
            continue;
        };
        let _ = writeln!(
            out,
            "    {src} -->|{} {:.1}| {dst}",
            edge.kind.initial(),
            edge.confidence
        );
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::graph::GraphNode;
    use scalpel_core::graph::{EdgeKind, GraphEdge};
    use scalpel_core::symbol::SymbolKind;
    use scalpel_core::SymbolId;
    use std::path::PathBuf;

    #[test]
    fn renders_node_and_edge_lines() {
        let a = SymbolId::new("python", "m", SymbolKind::Function, "a", None);
        let b = SymbolId::new("python", "m", SymbolKind::Function, "b", None);
        let subgraph = Subgraph {
            nodes: vec![
                GraphNode { id: a.clone(), kind: SymbolKind::Function, file: PathBuf::from("m.py") },
                GraphNode { id: b.clone(), kind: SymbolKind::Function, file: PathBuf::from("m.py") },
            ],
            edges: vec![GraphEdge::new_definite(a, b, EdgeKind::DirectCall)],
        };

        let rendered = render(&subgraph);
        assert!(rendered.starts_with("graph TD\n"));
        assert!(rendered.contains("-->|C 1.0|"));
    }
}
