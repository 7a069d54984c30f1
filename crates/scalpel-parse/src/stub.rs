//! Stub-level lowering for Go/C++ (spec.md §1, §4.3): only top-level
//! declarations are recognized; everything else becomes a single
//! `Unsupported` leaf. No tree-sitter grammar is loaded for these
//! languages — a line-oriented scan is enough to name the declarations
//! surgery/graph need to reference, and nothing downstream of this
//! workspace claims deeper Go/C++ support.

use regex::Regex;
use scalpel_core::symbol::SymbolKind;
use scalpel_core::uir::{ByteRange, UirNode, UirNodeKind, UirTree};
use scalpel_core::{Language, SymbolId};

struct Decl {
    kind: SymbolKind,
    uir_kind: UirNodeKind,
    name: String,
    range: ByteRange,
}

fn go_declarations(source: &str) -> Vec<Decl> {
    let func_re = Regex::new(r"(?m)^func\s+(?:\([^)]*\)\s*)?(\w+)\s*\(").unwrap();
    let type_re = Regex::new(r"(?m)^type\s+(\w+)\s+(?:struct|interface)\b").unwrap();
    let mut decls = Vec::new();
    for m in func_re.captures_iter(source) {
        let whole = m.get(0).unwrap();
        let name = m.get(1).unwrap();
        decls.push(Decl {
            kind: SymbolKind::Function,
            uir_kind: UirNodeKind::FunctionDef,
            name: name.as_str().to_string(),
            range: ByteRange::new(whole.start() as u32, whole.end() as u32),
        });
    }
    for m in type_re.captures_iter(source) {
        let whole = m.get(0).unwrap();
        let name = m.get(1).unwrap();
        decls.push(Decl {
            kind: SymbolKind::Class,
            uir_kind: UirNodeKind::ClassDef,
            name: name.as_str().to_string(),
            range: ByteRange::new(whole.start() as u32, whole.end() as u32),
        });
    }
    decls.sort_by_key(|d| d.range.start);
    decls
}

fn cpp_declarations(source: &str) -> Vec<Decl> {
    let class_re = Regex::new(r"(?m)^(?:class|struct)\s+(\w+)\b").unwrap();
    let func_re = Regex::new(r"(?m)^\w[\w:<>\*&\s]*\s+(\w+)\s*\([^;{]*\)\s*\{").unwrap();
    let mut decls = Vec::new();
    for m in class_re.captures_iter(source) {
        let whole = m.get(0).unwrap();
        let name = m.get(1).unwrap();
        decls.push(Decl {
            kind: SymbolKind::Class,
            uir_kind: UirNodeKind::ClassDef,
            name: name.as_str().to_string(),
            range: ByteRange::new(whole.start() as u32, whole.end() as u32),
        });
    }
    for m in func_re.captures_iter(source) {
        let whole = m.get(0).unwrap();
        let name = m.get(1).unwrap();
        decls.push(Decl {
            kind: SymbolKind::Function,
            uir_kind: UirNodeKind::FunctionDef,
            name: name.as_str().to_string(),
            range: ByteRange::new(whole.start() as u32, whole.end() as u32),
        });
    }
    decls.sort_by_key(|d| d.range.start);
    decls
}

pub fn lower_stub(source: &[u8], language: Language, module_path: &str) -> UirTree {
    let text = String::from_utf8_lossy(source);
    let decls = match language {
        Language::Go => go_declarations(&text),
        Language::Cpp => cpp_declarations(&text),
        _ => Vec::new(),
    };

    let mut tree = UirTree::new();
    let mut children = Vec::new();
    let mut cursor = 0u32;

    for decl in &decls {
        if decl.range.start > cursor {
            let gap = UirNode::leaf(
                UirNodeKind::Unsupported {
                    kind: "stub_gap".into(),
                },
                ByteRange::new(cursor, decl.range.start),
            );
            children.push(tree.push(gap));
        }
        let symbol = SymbolId::new(language.as_str(), module_path, decl.kind, &decl.name, None);
        let mut node = UirNode::leaf(decl.uir_kind.clone(), decl.range);
        node.symbol = Some(symbol);
        node.attrs
            .insert("name".into(), serde_json::Value::String(decl.name.clone()));
        children.push(tree.push(node));
        cursor = decl.range.end;
    }

    let end = source.len() as u32;
    if cursor < end {
        let gap = UirNode::leaf(
            UirNodeKind::Unsupported {
                kind: "stub_gap".into(),
            },
            ByteRange::new(cursor, end),
        );
        children.push(tree.push(gap));
    }

    let mut root = UirNode::leaf(UirNodeKind::Module, ByteRange::new(0, end));
    root.children = children;
    tree.root = tree.push(root);
    tree
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn finds_top_level_go_func_and_type() {
        let source = b"package main\n\nfunc Greet() string {\n\treturn \"hi\"\n}\n\ntype Widget struct {\n\tName string\n}\n";
        let tree = lower_stub(source, Language::Go, "m");
        assert!(tree.validate().is_ok());
        let has_func = tree
            .nodes
            .iter()
            .any(|n| matches!(n.kind, UirNodeKind::FunctionDef));
        let has_type = tree
            .nodes
            .iter()
            .any(|n| matches!(n.kind, UirNodeKind::ClassDef));
        assert!(has_func && has_type);
    }
}
