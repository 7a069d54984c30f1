//! The Unified IR (UIR) — spec.md §3 "UIR Node" and §4.3.
//!
//! An arena of tagged nodes: `{kind, byte_range, children, attrs}`. Byte
//! ranges are non-overlapping among siblings and monotonically
//! increasing; every `Name` node either resolves to a [`SymbolId`] or is
//! marked `Unresolved`. `attrs` is a `BTreeMap`, not a `HashMap` —
//! required for the determinism invariant in spec.md §8.1 (five
//! normalizations of identical content must produce byte-identical
//! serialized UIR); `HashMap`'s iteration order is not stable across
//! runs.

use crate::symbol::SymbolId;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Index of a node within a [`UirTree`]'s arena. Not to be confused with
/// [`SymbolId`], the cross-file universal id — `NodeId` is only valid
/// relative to the tree that produced it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct NodeId(pub u32);

/// Byte offsets into the original file content. Half-open `[start, end)`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ByteRange {
    pub start: u32,
    pub end: u32,
}

impl ByteRange {
    pub fn new(start: u32, end: u32) -> Self {
        debug_assert!(start <= end, "byte range start must not exceed end");
        Self { start, end }
    }

    pub fn len(&self) -> u32 {
        self.end - self.start
    }

    pub fn is_empty(&self) -> bool {
        self.start == self.end
    }

    pub fn contains(&self, other: &ByteRange) -> bool {
        self.start <= other.start && other.end <= self.end
    }
}

/// UIR node kinds. Language constructs with no common-ground mapping
/// lower to `Unsupported{kind}` (spec.md §4.3) but still carry a byte
/// range so surgery and graph referencing stay precise.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum UirNodeKind {
    Module,
    FunctionDef,
    ClassDef,
    Call,
    Name,
    Assign,
    If,
    Loop,
    Return,
    Import,
    Literal,
    BinOp,
    CompareOp,
    Parameter,
    Block,
    Raise,
    Try,
    ExceptHandler,
    /// Opaque leaf for a construct the UIR has no common-ground shape
    /// for. `kind` is the source grammar's own node kind name.
    Unsupported { kind: String },
    /// A region that failed to parse (see `ErrorNode` in spec.md §4.2).
    /// Downstream stages must treat these as opaque.
    Error,
}

/// A single UIR tree node.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UirNode {
    pub kind: UirNodeKind,
    pub byte_range: ByteRange,
    pub children: Vec<NodeId>,
    pub attrs: BTreeMap<String, serde_json::Value>,
    /// Present when this node resolves to a symbol in scope; `None` for
    /// non-`Name` nodes or when resolution could not be attempted.
    pub symbol: Option<SymbolId>,
    /// True for `Name` nodes that could not be resolved in the current
    /// module scope chain (spec.md §3 invariant).
    pub unresolved: bool,
}

impl UirNode {
    pub fn leaf(kind: UirNodeKind, byte_range: ByteRange) -> Self {
        Self {
            kind,
            byte_range,
            children: Vec::new(),
            attrs: BTreeMap::new(),
            symbol: None,
            unresolved: false,
        }
    }
}

/// A full UIR tree for one file: an arena plus a root index.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UirTree {
    pub nodes: Vec<UirNode>,
    pub root: NodeId,
}

impl UirTree {
    pub fn new() -> Self {
        Self {
            nodes: Vec::new(),
            root: NodeId(0),
        }
    }

    pub fn push(&mut self, node: UirNode) -> NodeId {
        let id = NodeId(self.nodes.len() as u32);
        self.nodes.push(node);
        id
    }

    pub fn get(&self, id: NodeId) -> &UirNode {
        &self.nodes[id.0 as usize]
    }

    pub fn get_mut(&mut self, id: NodeId) -> &mut UirNode {
        &mut self.nodes[id.0 as usize]
    }

    /// Validate the structural invariants from spec.md §3: sibling byte
    /// ranges are non-overlapping and monotonically increasing, and every
    /// child's range is contained in its parent's.
    pub fn validate(&self) -> Result<(), String> {
        if self.nodes.is_empty() {
            return Ok(());
        }
        self.validate_subtree(self.root)
    }

    fn validate_subtree(&self, id: NodeId) -> Result<(), String> {
        let node = self.get(id);
        let mut prev_end: Option<u32> = None;
        for &child_id in &node.children {
            let child = self.get(child_id);
            if !node.byte_range.contains(&child.byte_range) {
                return Err(format!(
                    "node {id:?} range {:?} does not contain child {child_id:?} range {:?}",
                    node.byte_range, child.byte_range
                ));
            }
            if let Some(prev) = prev_end {
                if child.byte_range.start < prev {
                    return Err(format!(
                        "sibling ranges overlap or regress at child {child_id:?}"
                    ));
                }
            }
            prev_end = Some(child.byte_range.end);
            self.validate_subtree(child_id)?;
        }
        Ok(())
    }

    /// Every `Name` node in the tree, for determinism/resolution checks.
    pub fn names(&self) -> impl Iterator<Item = (NodeId, &UirNode)> {
        self.nodes
            .iter()
            .enumerate()
            .filter(|(_, n)| matches!(n.kind, UirNodeKind::Name))
            .map(|(i, n)| (NodeId(i as u32), n))
    }

    /// Serialize to a canonical byte form for the determinism property
    /// (spec.md §8.1): `BTreeMap` attrs plus insertion-ordered arena make
    /// this stable for repeated runs over identical input.
    pub fn canonical_bytes(&self) -> Vec<u8> {
        serde_json::to_vec(self).expect("UirTree serialization is infallible")
    }
}

impl Default for UirTree {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_tree() -> UirTree {
        let mut t = UirTree::new();
        let child_a = t.push(UirNode::leaf(UirNodeKind::Literal, ByteRange::new(2, 5)));
        let child_b = t.push(UirNode::leaf(UirNodeKind::Literal, ByteRange::new(5, 8)));
        let mut root = UirNode::leaf(UirNodeKind::Module, ByteRange::new(0, 10));
        root.children = vec![child_a, child_b];
        t.root = t.push(root);
        t
    }

    #[test]
    fn validates_well_formed_tree() {
        assert!(sample_tree().validate().is_ok());
    }

    #[test]
    fn rejects_overlapping_siblings() {
        let mut t = UirTree::new();
        let child_a = t.push(UirNode::leaf(UirNodeKind::Literal, ByteRange::new(2, 6)));
        let child_b = t.push(UirNode::leaf(UirNodeKind::Literal, ByteRange::new(5, 8)));
        let mut root = UirNode::leaf(UirNodeKind::Module, ByteRange::new(0, 10));
        root.children = vec![child_a, child_b];
        t.root = t.push(root);
        assert!(t.validate().is_err());
    }

    #[test]
    fn five_serializations_are_byte_identical() {
        let t = sample_tree();
        let first = t.canonical_bytes();
        for _ in 0..4 {
            assert_eq!(t.canonical_bytes(), first);
        }
    }
}
