//! Shared symbol-location logic for `extract`/`patch` (spec.md §4.7):
//! both must land on the exact same byte range, or a round-trip
//! extract-then-patch would not leave the file byte-identical.

use crate::error::SurgeryError;
use scalpel_core::symbol::SymbolKind;
use scalpel_core::uir::{ByteRange, NodeId, UirNodeKind, UirTree};

pub struct Located {
    pub node_id: NodeId,
    /// Byte range expanded to include attached decorator/comment lines
    /// immediately above the definition, with no blank line between.
    pub range: ByteRange,
    pub containing_class: Option<NodeId>,
}

pub fn locate(
    tree: &UirTree,
    source: &[u8],
    symbol_name: &str,
    kind: Option<SymbolKind>,
) -> Result<Located, SurgeryError> {
    let node_id = tree
        .nodes
        .iter()
        .enumerate()
        .find(|(_, n)| {
            let kind_matches = match kind {
                Some(SymbolKind::Function) => n.kind == UirNodeKind::FunctionDef,
                Some(SymbolKind::Class) => n.kind == UirNodeKind::ClassDef,
                Some(_) | None => matches!(n.kind, UirNodeKind::FunctionDef | UirNodeKind::ClassDef),
            };
            kind_matches && n.attrs.get("name").and_then(|v| v.as_str()) == Some(symbol_name)
        })
        .map(|(i, _)| NodeId(i as u32))
        .ok_or_else(|| SurgeryError::SymbolNotFound(symbol_name.to_string(), "<file>".to_string()))?;

    let node = tree.get(node_id);
    let expanded_start = expand_backward(source, node.byte_range.start);
    let range = ByteRange::new(expanded_start, node.byte_range.end);

    let containing_class = tree
        .nodes
        .iter()
        .enumerate()
        .filter(|(i, n)| n.kind == UirNodeKind::ClassDef && NodeId(*i as u32) != node_id)
        .filter(|(_, n)| n.byte_range.contains(&node.byte_range))
        .min_by_key(|(_, n)| n.byte_range.len())
        .map(|(i, _)| NodeId(i as u32));

    Ok(Located { node_id, range, containing_class })
}

/// Walk backward line by line from `start`, absorbing decorator (`@...`)
/// and comment (`#...`) lines with no blank line gap.
fn expand_backward(source: &[u8], start: u32) -> u32 {
    let mut cursor = start as usize;
    loop {
        let line_start = source[..cursor]
            .iter()
            .rposition(|&b| b == b'\n')
            .map(|i| i + 1)
            .unwrap_or(0);
        if line_start == cursor {
            // cursor sits right after a newline already; look at the
            // previous line instead.
            if line_start == 0 {
                break;
            }
            let prev_line_start = source[..line_start - 1]
                .iter()
                .rposition(|&b| b == b'\n')
                .map(|i| i + 1)
                .unwrap_or(0);
            let prev_line = &source[prev_line_start..line_start - 1];
            let trimmed = std::str::from_utf8(prev_line).unwrap_or("").trim();
            if trimmed.is_empty() || !(trimmed.starts_with('@') || trimmed.starts_with('#')) {
                break;
            }
            cursor = prev_line_start;
            continue;
        }
        let line = &source[line_start..cursor];
        let trimmed = std::str::from_utf8(line).unwrap_or("").trim();
        if trimmed.starts_with('@') || trimmed.starts_with('#') {
            cursor = line_start;
            continue;
        }
        break;
    }
    cursor as u32
}

#[cfg(test)]
mod tests {
    use super::*;
    use scalpel_core::Language;

    #[test]
    fn locates_function_by_name() {
        let src = b"def foo():\n    return 1\n\ndef bar():\n    return 2\n";
        let tree = scalpel_parse::parse_and_lower(Language::Python, src, "m").unwrap();
        let located = locate(&tree, src, "bar", Some(SymbolKind::Function)).unwrap();
        let text = std::str::from_utf8(&src[located.range.start as usize..located.range.end as usize]).unwrap();
        assert!(text.starts_with("def bar()"));
    }

    #[test]
    fn expands_to_include_decorator() {
        let src = b"@app.get(\"/x\")\ndef handler():\n    return 1\n";
        let tree = scalpel_parse::parse_and_lower(Language::Python, src, "m").unwrap();
        let located = locate(&tree, src, "handler", Some(SymbolKind::Function)).unwrap();
        assert_eq!(located.range.start, 0);
    }

    #[test]
    fn missing_symbol_is_an_error() {
        let src = b"def foo():\n    return 1\n";
        let tree = scalpel_parse::parse_and_lower(Language::Python, src, "m").unwrap();
        assert!(locate(&tree, src, "ghost", None).is_err());
    }
}
