//! Graph edge model shared between `scalpel-graph` and `scalpel-pdg`
//! (spec.md §3 "Graph Edge").

use crate::symbol::SymbolId;
use serde::{Deserialize, Serialize};

/// Edge kinds across the unified cross-language graph and the PDG.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum EdgeKind {
    DirectCall,
    ImportDependency,
    HttpExactMatch,
    HttpPatternMatch,
    HttpDynamicRoute,
    InferredType,
    ControlDep,
    DataDep,
    Taint,
    ReExport,
}

impl EdgeKind {
    /// Definite edges always carry confidence 1.0 (spec.md §3).
    pub fn is_definite(self) -> bool {
        matches!(self, EdgeKind::DirectCall | EdgeKind::ImportDependency)
    }

    /// Traversal priority used by the total order in spec.md §5 and
    /// §4.5 (`k_hop` determinism): lower value sorts first.
    pub fn traversal_priority(self) -> u8 {
        match self {
            EdgeKind::DirectCall => 0,
            EdgeKind::ImportDependency => 1,
            EdgeKind::HttpExactMatch => 2,
            EdgeKind::HttpPatternMatch => 3,
            EdgeKind::HttpDynamicRoute => 4,
            EdgeKind::ControlDep => 5,
            EdgeKind::DataDep => 6,
            EdgeKind::Taint => 7,
            EdgeKind::InferredType => 8,
            EdgeKind::ReExport => 9,
        }
    }

    /// Single-character initial used by the Mermaid renderer (spec.md §6).
    pub fn initial(self) -> char {
        match self {
            EdgeKind::DirectCall => 'C',
            EdgeKind::ImportDependency => 'I',
            EdgeKind::HttpExactMatch => 'E',
            EdgeKind::HttpPatternMatch => 'P',
            EdgeKind::HttpDynamicRoute => 'D',
            EdgeKind::InferredType => 'T',
            EdgeKind::ControlDep => 'X',
            EdgeKind::DataDep => 'F',
            EdgeKind::Taint => 'N',
            EdgeKind::ReExport => 'R',
        }
    }
}

/// Confidence-scored edge between two symbols (spec.md §3).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GraphEdge {
    pub src: SymbolId,
    pub dst: SymbolId,
    pub kind: EdgeKind,
    pub confidence: f32,
    pub evidence: String,
    pub requires_human_approval: bool,
}

impl GraphEdge {
    /// The default confidence threshold below which edges require human
    /// approval (spec.md §3, overridable per-project).
    pub const DEFAULT_THRESHOLD: f32 = 0.8;

    pub fn new_definite(src: SymbolId, dst: SymbolId, kind: EdgeKind) -> Self {
        debug_assert!(kind.is_definite());
        Self {
            src,
            dst,
            kind,
            confidence: 1.0,
            evidence: String::new(),
            requires_human_approval: false,
        }
    }

    /// Build a heuristic edge, applying the threshold rule from
    /// spec.md §3/§4.5: `confidence < 1.0 ⇒ evidence non-empty`,
    /// `confidence < threshold ⇒ requires_human_approval`.
    pub fn new_heuristic(
        src: SymbolId,
        dst: SymbolId,
        kind: EdgeKind,
        confidence: f32,
        evidence: impl Into<String>,
        threshold: f32,
    ) -> Self {
        let evidence = evidence.into();
        debug_assert!(
            confidence >= 1.0 || !evidence.is_empty(),
            "heuristic edges must carry non-empty evidence"
        );
        Self {
            requires_human_approval: confidence < threshold,
            src,
            dst,
            kind,
            confidence,
            evidence,
        }
    }
}
