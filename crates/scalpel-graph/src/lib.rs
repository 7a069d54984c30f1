//! Unified cross-language symbol graph (C5), built from the UIR trees
//! that `scalpel-parse` produces: defs/refs, import edges, direct-call
//! edges, HTTP links, then inferred-type edges, in that fixed order.

pub mod builder;
pub mod error;
pub mod graph;
pub mod http_link;
pub mod mermaid;
pub mod query;

pub use builder::{build, FileUnit};
pub use error::GraphError;
pub use graph::{CodeGraph, GraphNode};
pub use query::{k_hop, Subgraph};

#[cfg(test)]
mod tests {
    use super::*;
    use petgraph::Direction;
    use scalpel_core::symbol::SymbolKind;
    use scalpel_core::{Language, SymbolId};
    use std::path::PathBuf;

    #[test]
    fn end_to_end_call_and_http_link() {
        let backend_src = b"@app.get(\"/users/{id}\")\ndef get_user():\n    return fetch_profile()\n\ndef fetch_profile():\n    return 1\n";
        let backend_tree =
            scalpel_parse::parse_and_lower(Language::Python, backend_src, "server").unwrap();
        let backend = FileUnit {
            path: PathBuf::from("server.py"),
            language: Language::Python,
            module_path: "server".to_string(),
            source: backend_src.to_vec(),
            tree: backend_tree,
        };

        let frontend_src = b"fetch(`/users/${id}`)";
        let frontend_tree =
            scalpel_parse::parse_and_lower(Language::TypeScript, frontend_src, "client").unwrap();
        let frontend = FileUnit {
            path: PathBuf::from("client.ts"),
            language: Language::TypeScript,
            module_path: "client".to_string(),
            source: frontend_src.to_vec(),
            tree: frontend_tree,
        };

        let graph = build(&[backend, frontend]);

        let get_user = SymbolId::new("python", "server", SymbolKind::Function, "get_user", None);
        let fetch_profile =
            SymbolId::new("python", "server", SymbolKind::Function, "fetch_profile", None);
        assert!(graph
            .edges_out(&get_user)
            .iter()
            .any(|e| e.dst == fetch_profile));

        let sub = k_hop(&graph, &get_user, 2, Direction::Outgoing).unwrap();
        assert!(sub.nodes.iter().any(|n| n.id == fetch_profile));

        let rendered = mermaid::render(&sub);
        assert!(rendered.starts_with("graph TD\n"));
    }
}
