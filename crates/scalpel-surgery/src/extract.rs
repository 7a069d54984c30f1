//! `extract()` (spec.md §4.7): locate a definition, return its exact
//! source substring plus a minimal import preamble.

use crate::error::SurgeryError;
use crate::locate::locate;
use scalpel_core::symbol::SymbolKind;
use scalpel_core::uir::{ByteRange, NodeId, UirNodeKind, UirTree};
use scalpel_core::Language;

#[derive(Debug, Clone)]
pub struct Extracted {
    pub code: String,
    pub range: ByteRange,
    pub containing_class: Option<String>,
    pub import_preamble: Vec<String>,
}

pub fn extract(
    language: Language,
    source: &[u8],
    module_path: &str,
    symbol_name: &str,
    kind: Option<SymbolKind>,
) -> Result<Extracted, SurgeryError> {
    let tree = scalpel_parse::parse_and_lower(language, source, module_path)
        .map_err(|e| SurgeryError::ParseFailed(e.to_string()))?;

    let located = locate(&tree, source, symbol_name, kind)?;
    let code =
        std::str::from_utf8(&source[located.range.start as usize..located.range.end as usize])
            .unwrap_or_default()
            .to_string();

    let containing_class = located
        .containing_class
        .and_then(|id| tree.get(id).attrs.get("name").and_then(|v| v.as_str()).map(str::to_string));

    let used_names = names_referenced(&tree, located.node_id);
    let import_preamble = minimal_imports(&tree, source, &used_names);

    Ok(Extracted { code, range: located.range, containing_class, import_preamble })
}

fn names_referenced(tree: &UirTree, root: NodeId) -> std::collections::HashSet<String> {
    let mut names = std::collections::HashSet::new();
    collect(tree, root, &mut names);
    names
}

fn collect(tree: &UirTree, id: NodeId, out: &mut std::collections::HashSet<String>) {
    let node = tree.get(id);
    if node.kind == UirNodeKind::Name && node.unresolved {
        if let Some(name) = node.attrs.get("name").and_then(|v| v.as_str()) {
            out.insert(name.to_string());
        }
    }
    for &child in &node.children {
        collect(tree, child, out);
    }
}

/// Imports whose raw source text mentions one of the extracted
/// definition's unresolved names — a minimal, best-effort preamble
/// since the UIR has no resolved cross-module import graph of its own.
fn minimal_imports(tree: &UirTree, source: &[u8], used_names: &std::collections::HashSet<String>) -> Vec<String> {
    tree.nodes
        .iter()
        .filter(|n| n.kind == UirNodeKind::Import)
        .filter_map(|n| {
            let text = std::str::from_utf8(&source[n.byte_range.start as usize..n.byte_range.end as usize]).ok()?;
            used_names.iter().any(|name| text.contains(name.as_str())).then(|| text.trim().to_string())
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn extract_returns_exact_substring() {
        let src = b"def foo():\n    return 1\n\ndef bar():\n    return foo()\n";
        let extracted = extract(Language::Python, src, "m", "bar", Some(SymbolKind::Function)).unwrap();
        assert_eq!(extracted.code, "def bar():\n    return foo()\n");
    }

    #[test]
    fn extract_finds_containing_class() {
        let src = b"class C:\n    def method(self):\n        return 1\n";
        let extracted = extract(Language::Python, src, "m", "method", Some(SymbolKind::Function)).unwrap();
        assert_eq!(extracted.containing_class.as_deref(), Some("C"));
    }
}
