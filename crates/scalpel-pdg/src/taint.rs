//! Taint propagation over a function's data-dependence edges (spec.md
//! §4.6 "Taint engine" / "Cross-file taint"), grounded on
//! `codegraph-ir/src/features/taint_analysis/domain/function_summary.rs`
//! for the `{param_label_in -> return_label_out, param_label_in ->
//! sink_reached?}` summary shape, simplified from the teacher's full
//! IFDS/IDE solver to a direct data-dependence BFS since this crate has
//! no points-to/alias analysis layer of its own.
//!
//! Sources/sinks/sanitizers are substring patterns matched against each
//! statement's own source text (spec.md: "declared per language in a
//! configuration bundle, not hardcoded") rather than against resolved
//! symbols, since attribute/subscript access (`request.args["q"]`) has
//! no single resolved `SymbolId` in the UIR.

use crate::pdg::{Pdg, PdgEdgeKind};
use crate::symbolic::node_ref;
use scalpel_core::cancel::CancellationToken;
use scalpel_core::finding::{Finding, Severity};
use scalpel_core::uir::{NodeId, UirTree};
use scalpel_core::SymbolId;
use std::collections::{HashMap, HashSet, VecDeque};
use std::path::Path;

#[derive(Debug, Clone)]
pub struct TaintConfig {
    pub sources: Vec<String>,
    pub sinks: Vec<String>,
    pub sanitizers: Vec<String>,
    /// The `Finding.kind` this bundle reports (e.g. "sql_injection",
    /// "command_injection") — one bundle covers one vulnerability class
    /// per spec.md's "declared per language in a configuration bundle".
    pub finding_kind: String,
    pub severity: Severity,
}

#[derive(Debug, Clone)]
pub struct TaintFinding {
    pub source: NodeId,
    pub sink: NodeId,
    pub trace: Vec<NodeId>,
    pub kind: String,
    pub severity: Severity,
}

impl TaintFinding {
    /// Lower this into the shared `Finding` model (spec.md §3), used for
    /// the sql_injection-style scenario: `kind`, `severity`, and a
    /// multi-hop `trace` the caller can sort with `sort_findings`.
    pub fn into_finding(self, file: &Path, tree: &UirTree, source: &[u8]) -> Finding {
        let trace: Vec<_> = self.trace.iter().map(|&n| node_ref(file, tree, source, n)).collect();
        let primary_location = node_ref(file, tree, source, self.sink);
        Finding {
            id: format!("taint:{}:{}:{}", file.display(), self.source.0, self.sink.0),
            severity: self.severity,
            kind: self.kind,
            primary_location,
            trace,
            confidence: 1.0,
            evidence: "unsanitized data-dependence path from source to sink".to_string(),
            fix_hint: None,
        }
    }
}

/// Per-function taint summary: does *any* unsanitized path from a
/// parameter reach a sink, and does the return value carry taint from a
/// parameter. Collapsed across all parameters (spec.md leaves per-param
/// sensitivity as an implementation detail); a real per-parameter table
/// is future work, not something this pass needs to claim.
#[derive(Debug, Clone, Copy, Default)]
pub struct FunctionSummary {
    pub reaches_sink: bool,
    pub return_tainted: bool,
}

pub struct TaintEngine {
    config: TaintConfig,
    summaries: HashMap<SymbolId, FunctionSummary>,
    in_progress: HashSet<SymbolId>,
}

impl TaintEngine {
    pub fn new(config: TaintConfig) -> Self {
        Self {
            config,
            summaries: HashMap::new(),
            in_progress: HashSet::new(),
        }
    }

    fn text_of<'a>(source: &'a [u8], range: scalpel_core::uir::ByteRange) -> &'a str {
        std::str::from_utf8(&source[range.start as usize..range.end as usize]).unwrap_or("")
    }

    fn matches_any(text: &str, patterns: &[String]) -> bool {
        patterns.iter().any(|p| text.contains(p.as_str()))
    }

    /// Analyze one function body for taint findings. `source` is the raw
    /// file bytes (for pattern matching against statement text).
    /// `callee_summary` resolves a callee statement's symbol to a
    /// previously (or newly) computed [`FunctionSummary`], used for the
    /// cross-file case; returns `None` if the callee can't be analyzed
    /// (no body available and not already cached).
    pub fn analyze(
        &mut self,
        symbol: &SymbolId,
        tree: &UirTree,
        function_root: NodeId,
        source: &[u8],
        cancellation: &CancellationToken,
        mut resolve_callee: impl FnMut(&SymbolId) -> Option<FunctionSummary>,
    ) -> (Vec<TaintFinding>, FunctionSummary) {
        if let Some(&cached) = self.summaries.get(symbol) {
            return (Vec::new(), cached);
        }
        if !self.in_progress.insert(symbol.clone()) {
            // Cycle: bottom assumption, no labels propagate on the back edge.
            return (Vec::new(), FunctionSummary::default());
        }

        let pdg = Pdg::build(tree, function_root);
        let mut statements: Vec<NodeId> = pdg
            .dependents
            .keys()
            .chain(pdg.depends_on.keys())
            .copied()
            .collect();
        statements.sort_by_key(|n| n.0);
        statements.dedup();

        let mut taint_origin: Vec<NodeId> = Vec::new();
        let mut sink_stmts: HashSet<NodeId> = HashSet::new();
        let mut sanitized: HashSet<NodeId> = HashSet::new();
        for &stmt in &statements {
            let text = Self::text_of(source, tree.get(stmt).byte_range);
            if Self::matches_any(text, &self.config.sources) {
                taint_origin.push(stmt);
            }
            if Self::matches_any(text, &self.config.sinks) {
                sink_stmts.insert(stmt);
            }
            if Self::matches_any(text, &self.config.sanitizers) {
                sanitized.insert(stmt);
            }
        }

        let mut findings = Vec::new();
        let mut summary = FunctionSummary::default();
        let returns: HashSet<NodeId> = statements
            .iter()
            .copied()
            .filter(|&s| tree.get(s).kind == scalpel_core::uir::UirNodeKind::Return)
            .collect();

        for &origin in &taint_origin {
            let mut visited = HashSet::new();
            visited.insert(origin);
            let mut parent: HashMap<NodeId, NodeId> = HashMap::new();
            let mut queue = VecDeque::from([origin]);

            while let Some(stmt) = queue.pop_front() {
                if cancellation.is_cancelled() {
                    self.in_progress.remove(symbol);
                    return (findings, summary);
                }
                if sink_stmts.contains(&stmt) {
                    summary.reaches_sink = true;
                    findings.push(TaintFinding {
                        source: origin,
                        sink: stmt,
                        trace: reconstruct_trace(&parent, origin, stmt),
                        kind: self.config.finding_kind.clone(),
                        severity: self.config.severity,
                    });
                    continue;
                }
                if returns.contains(&stmt) {
                    summary.return_tainted = true;
                }
                if sanitized.contains(&stmt) && stmt != origin {
                    continue;
                }
                // Cross-file: a tainted value flowing into a call whose
                // callee summary says it reaches a sink is itself a finding.
                let node = tree.get(stmt);
                if node.kind == scalpel_core::uir::UirNodeKind::Call {
                    if let Some(callee) = node.symbol.clone() {
                        if let Some(callee_summary) = resolve_callee(&callee) {
                            if callee_summary.reaches_sink {
                                summary.reaches_sink = true;
                                findings.push(TaintFinding {
                                    source: origin,
                                    sink: stmt,
                                    trace: reconstruct_trace(&parent, origin, stmt),
                                    kind: self.config.finding_kind.clone(),
                                    severity: self.config.severity,
                                });
                            }
                            if !callee_summary.return_tainted {
                                continue;
                            }
                        }
                    }
                }

                let Some(edge_indices) = pdg.dependents.get(&stmt) else {
                    continue;
                };
                for &i in edge_indices {
                    let edge = &pdg.edges[i];
                    if edge.kind != PdgEdgeKind::Data {
                        continue;
                    }
                    if visited.insert(edge.to) {
                        parent.insert(edge.to, stmt);
                        queue.push_back(edge.to);
                    }
                }
            }
        }

        self.in_progress.remove(symbol);
        self.summaries.insert(symbol.clone(), summary);
        (findings, summary)
    }
}

fn reconstruct_trace(parent: &HashMap<NodeId, NodeId>, origin: NodeId, sink: NodeId) -> Vec<NodeId> {
    let mut trace = vec![sink];
    let mut cur = sink;
    while cur != origin {
        let Some(&prev) = parent.get(&cur) else { break };
        trace.push(prev);
        cur = prev;
    }
    trace.reverse();
    trace
}

#[cfg(test)]
mod tests {
    use super::*;
    use scalpel_core::Language;

    fn config() -> TaintConfig {
        TaintConfig {
            sources: vec!["request.args".to_string()],
            sinks: vec!["execute(".to_string()],
            sanitizers: vec!["escape(".to_string()],
            finding_kind: "sql_injection".to_string(),
            severity: Severity::High,
        }
    }

    #[test]
    fn three_hop_source_to_sink_is_found() {
        let src = b"def handle():\n    q = request.args\n    sql = build_query(q)\n    db.execute(sql)\n";
        let tree = scalpel_parse::parse_and_lower(Language::Python, src, "handlers").unwrap();
        let symbol = SymbolId::new(
            "python",
            "handlers",
            scalpel_core::symbol::SymbolKind::Function,
            "handle",
            None,
        );
        let mut engine = TaintEngine::new(config());
        let (findings, summary) =
            engine.analyze(&symbol, &tree, tree.root, src, &CancellationToken::new(), |_| None);
        assert_eq!(findings.len(), 1);
        assert!(summary.reaches_sink);
        assert!(findings[0].trace.len() >= 2);
        assert_eq!(findings[0].kind, "sql_injection");
        assert_eq!(findings[0].severity, Severity::High);

        let finding = findings[0].clone().into_finding(std::path::Path::new("handlers.py"), &tree, src);
        assert_eq!(finding.kind, "sql_injection");
        assert_eq!(finding.severity, Severity::High);
        assert!(finding.trace.len() >= 2);
    }

    #[test]
    fn sanitizer_blocks_propagation() {
        let src = b"def handle():\n    q = request.args\n    safe = escape(q)\n    db.execute(safe)\n";
        let tree = scalpel_parse::parse_and_lower(Language::Python, src, "handlers").unwrap();
        let symbol = SymbolId::new(
            "python",
            "handlers",
            scalpel_core::symbol::SymbolKind::Function,
            "handle",
            None,
        );
        let mut engine = TaintEngine::new(config());
        let (findings, _) =
            engine.analyze(&symbol, &tree, tree.root, src, &CancellationToken::new(), |_| None);
        assert!(findings.is_empty());
    }

    #[test]
    fn cancelled_token_stops_analysis_without_panicking() {
        let src = b"def handle():\n    q = request.args\n    sql = build_query(q)\n    db.execute(sql)\n";
        let tree = scalpel_parse::parse_and_lower(Language::Python, src, "handlers").unwrap();
        let symbol = SymbolId::new(
            "python",
            "handlers",
            scalpel_core::symbol::SymbolKind::Function,
            "handle",
            None,
        );
        let mut engine = TaintEngine::new(config());
        let token = CancellationToken::new();
        token.cancel();
        let (findings, summary) = engine.analyze(&symbol, &tree, tree.root, src, &token, |_| None);
        assert!(findings.is_empty());
        assert!(!summary.reaches_sink);
    }
}
