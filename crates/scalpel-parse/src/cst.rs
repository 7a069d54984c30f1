//! Concrete syntax tree wrapper around `tree_sitter::Tree` (spec.md §4.2).
//!
//! Carries the source bytes alongside the tree (tree-sitter trees are
//! structure-only) and the set of error-node byte ranges so downstream
//! stages can treat them as opaque per spec.md §4.2/§7.

use scalpel_core::Language;
use tree_sitter::{InputEdit, Parser, Point, Tree};

pub struct Cst {
    pub language: Language,
    pub source: Vec<u8>,
    pub tree: Tree,
}

impl Cst {
    /// True when the tree contains at least one `ERROR` node — parsers
    /// recover and return a partial tree rather than failing outright
    /// (spec.md §4.2).
    pub fn has_errors(&self) -> bool {
        self.tree.root_node().has_error()
    }

    /// Byte ranges of every `ERROR` node, for the "findings that depend
    /// on unparseable regions are omitted" rule in spec.md §7.
    pub fn error_ranges(&self) -> Vec<(usize, usize)> {
        let mut out = Vec::new();
        collect_error_ranges(self.tree.root_node(), &mut out);
        out
    }
}

fn collect_error_ranges(node: tree_sitter::Node, out: &mut Vec<(usize, usize)>) {
    if node.is_error() || node.is_missing() {
        out.push((node.start_byte(), node.end_byte()));
        return;
    }
    let mut cursor = node.walk();
    for child in node.children(&mut cursor) {
        collect_error_ranges(child, out);
    }
}

/// A single source-level edit, expressed as byte offsets plus the full
/// new source. Used for `parse_edit` (spec.md §4.2).
#[derive(Debug, Clone)]
pub struct Edit {
    pub start_byte: usize,
    pub old_end_byte: usize,
    pub new_end_byte: usize,
    pub new_source: Vec<u8>,
}

fn byte_to_point(source: &[u8], byte: usize) -> Point {
    let mut row = 0usize;
    let mut col = 0usize;
    for &b in &source[..byte.min(source.len())] {
        if b == b'\n' {
            row += 1;
            col = 0;
        } else {
            col += 1;
        }
    }
    Point { row, column: col }
}

/// Apply an incremental edit and reparse using the old tree as a
/// starting point, for sub-millisecond re-parses on typical edits
/// (spec.md §4.2).
pub fn parse_edit(
    cst: &Cst,
    edit: &Edit,
    parser: &mut Parser,
) -> Result<Cst, crate::ParseError> {
    let mut tree = cst.tree.clone();
    let start_position = byte_to_point(&cst.source, edit.start_byte);
    let old_end_position = byte_to_point(&cst.source, edit.old_end_byte);
    let new_end_position = byte_to_point(&edit.new_source, edit.new_end_byte);

    tree.edit(&InputEdit {
        start_byte: edit.start_byte,
        old_end_byte: edit.old_end_byte,
        new_end_byte: edit.new_end_byte,
        start_position,
        old_end_position,
        new_end_position,
    });

    let new_tree = parser
        .parse(&edit.new_source, Some(&tree))
        .ok_or_else(|| crate::ParseError::ParserFailure(cst.language.as_str().to_string()))?;

    Ok(Cst {
        language: cst.language,
        source: edit.new_source.clone(),
        tree: new_tree,
    })
}
