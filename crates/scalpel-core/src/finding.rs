//! Finding model (spec.md §3 "Finding").

use crate::uir::{ByteRange, NodeId};
use serde::{Deserialize, Serialize};

/// Finding severity. Ordering matters: findings are sorted by
/// `(severity, file, line, finding_kind)` per spec.md §5, most severe
/// first, so the derived `Ord` must rank `Critical` lowest.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Severity {
    Critical,
    High,
    Medium,
    Low,
    Info,
}

/// A single UIR node reference within a file, used for finding traces.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UirNodeRef {
    pub file: std::path::PathBuf,
    pub node: NodeId,
    pub byte_range: ByteRange,
    pub line: u32,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Finding {
    pub id: String,
    pub severity: Severity,
    pub kind: String,
    pub primary_location: UirNodeRef,
    pub trace: Vec<UirNodeRef>,
    pub confidence: f32,
    pub evidence: String,
    pub fix_hint: Option<String>,
}

impl Finding {
    /// The `(severity, file, line, finding_kind)` sort key from spec.md §5.
    pub fn sort_key(&self) -> (Severity, String, u32, String) {
        (
            self.severity,
            self.primary_location.file.to_string_lossy().into_owned(),
            self.primary_location.line,
            self.kind.clone(),
        )
    }
}

/// Sort a finding list in place per the spec.md §5 total order.
pub fn sort_findings(findings: &mut [Finding]) {
    findings.sort_by(|a, b| a.sort_key().cmp(&b.sort_key()));
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    fn finding(severity: Severity, file: &str, line: u32, kind: &str) -> Finding {
        Finding {
            id: format!("{file}:{line}:{kind}"),
            severity,
            kind: kind.to_string(),
            primary_location: UirNodeRef {
                file: PathBuf::from(file),
                node: NodeId(0),
                byte_range: ByteRange::new(0, 1),
                line,
            },
            trace: vec![],
            confidence: 1.0,
            evidence: "test".into(),
            fix_hint: None,
        }
    }

    #[test]
    fn sorts_critical_before_low() {
        let mut findings = vec![
            finding(Severity::Low, "a.py", 1, "x"),
            finding(Severity::Critical, "a.py", 1, "x"),
        ];
        sort_findings(&mut findings);
        assert_eq!(findings[0].severity, Severity::Critical);
    }
}
