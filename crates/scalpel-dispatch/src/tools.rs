//! Real tool registrations (spec.md §4.9): wires each `tool_id` to its
//! owning component instead of a registry that only ever sees test
//! stubs. Crawl-style ingest additionally enforces spec.md §8's S6 tier
//! limit one file at a time, so the cap is respected before a file is
//! ever read rather than after the fact.

use crate::envelope::ToolRequest;
use crate::registry::{ToolHandler, ToolRegistry};
use scalpel_core::audit::AuditSink;
use scalpel_core::cancel::CancellationToken;
use scalpel_core::config::{IngestConfig, SymbolicConfig};
use scalpel_core::error::ScalpelError;
use scalpel_core::finding::sort_findings;
use scalpel_core::symbol::SymbolKind;
use scalpel_core::uir::NodeId;
use scalpel_core::{Language, SymbolId};
use scalpel_pdg::{symbolic_execute, IntervalSolver, TaintConfig, TaintEngine};
use scalpel_policy::{PolicyEngine, RequestContext};
use scalpel_surgery::{extract, patch, PatchOptions};
use std::path::PathBuf;
use std::str::FromStr;
use std::sync::Arc;

fn arg_str<'a>(req: &'a ToolRequest, field: &str) -> Result<&'a str, ScalpelError> {
    req.arguments
        .get(field)
        .and_then(|v| v.as_str())
        .ok_or_else(|| ScalpelError::invalid_argument(format!("missing `{field}` argument")))
}

fn arg_u64(req: &ToolRequest, field: &str, default: u64) -> u64 {
    req.arguments.get(field).and_then(|v| v.as_u64()).unwrap_or(default)
}

fn language_of(path: &std::path::Path) -> Result<Language, ScalpelError> {
    path.extension()
        .and_then(|e| e.to_str())
        .and_then(Language::from_extension)
        .ok_or_else(|| ScalpelError::invalid_argument(format!("unrecognized file extension: {}", path.display())))
}

/// `ingest.crawl`: walks `root` and hashes each candidate file,
/// re-checking the requester's tier bundle before every single file so
/// a `community`-tier crawl over a 1000-file tree stops at file 101
/// without ever reading file 102 (spec.md §8 S6).
fn ingest_crawl(policy: Arc<PolicyEngine>) -> ToolHandler {
    Arc::new(move |req, cancellation| {
        let root = PathBuf::from(arg_str(req, "root")?);
        let config = IngestConfig::default();
        let candidates = scalpel_ingest::walker::walk(&root, &[], &[], &config)?;

        let mut files = Vec::new();
        let mut warnings = Vec::new();
        for (i, path) in candidates.iter().enumerate() {
            if cancellation.is_cancelled() {
                return Err(ScalpelError::new(scalpel_core::error::ErrorKind::Timeout, "ingest.crawl was cancelled"));
            }

            let mut ctx = RequestContext { tier: req.tier_context.clone(), ..Default::default() };
            ctx.fields.insert("max_files".to_string(), serde_json::json!((i + 1) as u64));
            policy.admit(&ctx)?;

            match scalpel_ingest::ingest_one(path, &config) {
                Ok(file) => files.push(serde_json::to_value(&file).unwrap_or(serde_json::Value::Null)),
                Err(warning) => warnings.push(warning),
            }
        }

        Ok(serde_json::json!({ "files": files, "warnings": warnings }))
    })
}

/// `graph.k_hop`: ingest, parse+lower, and build the cross-file graph
/// for `root`, then return the `k`-hop neighborhood of `seed`.
fn graph_k_hop() -> ToolHandler {
    Arc::new(|req, cancellation| {
        let root = PathBuf::from(arg_str(req, "root")?);
        let seed = SymbolId::from_str(arg_str(req, "seed")?).map_err(ScalpelError::invalid_argument)?;
        let k = arg_u64(req, "k", 1) as usize;
        let direction = match req.arguments.get("direction").and_then(|v| v.as_str()) {
            Some("incoming") => petgraph::Direction::Incoming,
            _ => petgraph::Direction::Outgoing,
        };

        let ingest_req = scalpel_ingest::IngestRequest { root: root.clone(), ..Default::default() };
        let outcome = scalpel_ingest::ingest(&ingest_req, &IngestConfig::default(), cancellation)?;

        let mut units = Vec::with_capacity(outcome.files.len());
        for file in &outcome.files {
            if cancellation.is_cancelled() {
                return Err(ScalpelError::new(scalpel_core::error::ErrorKind::Timeout, "graph.k_hop was cancelled"));
            }
            let source = std::fs::read(&file.path).map_err(|e| ScalpelError::internal(e.to_string()))?;
            let module_path = module_path_of(&root, &file.path);
            let tree = scalpel_parse::parse_and_lower(file.language, &source, &module_path)?;
            units.push(scalpel_graph::FileUnit {
                path: file.path.clone(),
                language: file.language,
                module_path,
                source,
                tree,
            });
        }

        let graph = scalpel_graph::build(&units);
        let sub = scalpel_graph::k_hop(&graph, &seed, k, direction)?;

        let nodes: Vec<_> = sub
            .nodes
            .iter()
            .map(|n| serde_json::json!({ "id": n.id.as_str(), "kind": n.kind.to_string(), "file": n.file }))
            .collect();
        let edges: Vec<_> = sub.edges.iter().map(|e| serde_json::to_value(e).unwrap_or(serde_json::Value::Null)).collect();

        Ok(serde_json::json!({ "nodes": nodes, "edges": edges }))
    })
}

/// `surgery.extract`: returns the exact source substring plus import
/// preamble for one symbol.
fn surgery_extract() -> ToolHandler {
    Arc::new(|req, _cancellation| {
        let path = PathBuf::from(arg_str(req, "file")?);
        let language = language_of(&path)?;
        let source = std::fs::read(&path).map_err(|e| ScalpelError::internal(e.to_string()))?;
        let module_path = arg_str(req, "module_path")?;
        let symbol_name = arg_str(req, "symbol_name")?;
        let kind = match req.arguments.get("kind").and_then(|v| v.as_str()) {
            Some(k) => Some(SymbolKind::from_str(k).map_err(ScalpelError::invalid_argument)?),
            None => None,
        };

        let extracted = extract(language, &source, module_path, symbol_name, kind)?;
        Ok(serde_json::json!({
            "code": extracted.code,
            "containing_class": extracted.containing_class,
            "import_preamble": extracted.import_preamble,
        }))
    })
}

/// `surgery.patch`: atomic byte-range replace of one symbol's body,
/// recording the outcome to the shared audit sink either way.
fn surgery_patch(audit: Arc<dyn AuditSink>) -> ToolHandler {
    Arc::new(move |req, _cancellation| {
        let path = PathBuf::from(arg_str(req, "file")?);
        let module_path = arg_str(req, "module_path")?;
        let symbol_name = arg_str(req, "symbol_name")?;
        let new_source = arg_str(req, "new_source")?;
        let kind = match req.arguments.get("kind").and_then(|v| v.as_str()) {
            Some(k) => Some(SymbolKind::from_str(k).map_err(ScalpelError::invalid_argument)?),
            None => None,
        };
        let options = PatchOptions {
            allow_new_unresolved_symbols: req
                .arguments
                .get("allow_new_unresolved_symbols")
                .and_then(|v| v.as_bool())
                .unwrap_or(false),
        };

        let outcome = patch(&path, module_path, symbol_name, kind, new_source, &options, audit.as_ref())?;
        Ok(serde_json::json!({
            "old_hash": hex(&outcome.old_hash),
            "new_hash": hex(&outcome.new_hash),
        }))
    })
}

fn hex(bytes: &[u8; 32]) -> String {
    bytes.iter().map(|b| format!("{b:02x}")).collect()
}

/// `pdg.taint_analyze`: runs the taint engine over one function body and
/// returns `Finding`s in `sort_findings` order.
fn pdg_taint_analyze() -> ToolHandler {
    Arc::new(|req, cancellation| {
        let path = PathBuf::from(arg_str(req, "file")?);
        let language = language_of(&path)?;
        let source = std::fs::read(&path).map_err(|e| ScalpelError::internal(e.to_string()))?;
        let module_path = arg_str(req, "module_path")?;
        let function_name = arg_str(req, "function_name")?;

        let tree = scalpel_parse::parse_and_lower(language, &source, module_path)?;
        let function_root = tree
            .nodes
            .iter()
            .enumerate()
            .find(|(_, n)| {
                n.kind == scalpel_core::uir::UirNodeKind::FunctionDef
                    && n.attrs.get("name").and_then(|v| v.as_str()) == Some(function_name)
            })
            .map(|(i, _)| NodeId(i as u32))
            .ok_or_else(|| ScalpelError::not_found(format!("function `{function_name}` not found in {module_path}")))?;

        let symbol = SymbolId::new(language.as_str(), module_path, SymbolKind::Function, function_name, None);
        let sink_patterns = read_str_list(req, "sinks", &["execute(".to_string()]);
        let config = TaintConfig {
            sources: read_str_list(req, "sources", &["request.args".to_string(), "request.form".to_string()]),
            sinks: sink_patterns.clone(),
            sanitizers: read_str_list(req, "sanitizers", &["escape(".to_string()]),
            finding_kind: req.arguments.get("finding_kind").and_then(|v| v.as_str()).unwrap_or("sql_injection").to_string(),
            severity: scalpel_core::finding::Severity::High,
        };

        let mut engine = TaintEngine::new(config);
        let (taint_findings, _summary) =
            engine.analyze(&symbol, &tree, function_root, &source, cancellation, |_| None);

        let mut findings: Vec<_> =
            taint_findings.into_iter().map(|f| f.into_finding(&path, &tree, &source)).collect();

        if req.arguments.get("symbolic").and_then(|v| v.as_bool()).unwrap_or(false) {
            let sinks: Vec<NodeId> = tree
                .nodes
                .iter()
                .enumerate()
                .filter(|(_, n)| {
                    let text = std::str::from_utf8(&source[n.byte_range.start as usize..n.byte_range.end as usize]).unwrap_or("");
                    sink_patterns.iter().any(|p| text.contains(p.as_str()))
                })
                .map(|(i, _)| NodeId(i as u32))
                .collect();
            let result = symbolic_execute(
                &tree,
                function_root,
                &sinks,
                &source,
                &SymbolicConfig::default(),
                &IntervalSolver,
                cancellation,
            );
            findings.extend(result.findings.into_iter().map(|f| f.into_finding(&path, &tree, &source)));
        }

        sort_findings(&mut findings);
        Ok(serde_json::to_value(&findings).unwrap_or(serde_json::Value::Null))
    })
}

fn read_str_list(req: &ToolRequest, field: &str, default: &[String]) -> Vec<String> {
    req.arguments
        .get(field)
        .and_then(|v| v.as_array())
        .map(|arr| arr.iter().filter_map(|v| v.as_str().map(str::to_string)).collect())
        .unwrap_or_else(|| default.to_vec())
}

fn module_path_of(root: &std::path::Path, file: &std::path::Path) -> String {
    file.strip_prefix(root)
        .unwrap_or(file)
        .with_extension("")
        .to_string_lossy()
        .replace(['/', '\\'], ".")
}

/// Build a registry wired to every component this workspace implements.
/// `policy` is shared with the [`crate::Dispatcher`] so `ingest.crawl`'s
/// per-file checks and the dispatcher's own admission check evaluate
/// against the exact same rule set.
pub fn build_registry(policy: Arc<PolicyEngine>, audit: Arc<dyn AuditSink>) -> ToolRegistry {
    let mut registry = ToolRegistry::new();
    registry.register("ingest.crawl", ingest_crawl(policy));
    registry.register("graph.k_hop", graph_k_hop());
    registry.register("surgery.extract", surgery_extract());
    registry.register("surgery.patch", surgery_patch(audit));
    registry.register("pdg.taint_analyze", pdg_taint_analyze());
    registry
}

#[cfg(test)]
mod tests {
    use super::*;
    use scalpel_core::audit::InMemoryAuditSink;
    use scalpel_policy::manifest::{PolicyFileEntry, PolicyManifest};
    use scalpel_policy::tier::default_bundles;
    use sha2::{Digest, Sha256};
    use std::fs;

    fn hash_hex(bytes: &[u8]) -> String {
        let digest: [u8; 32] = Sha256::digest(bytes).into();
        digest.iter().map(|b| format!("{:02x}", b)).collect()
    }

    fn test_policy(dir: &std::path::Path) -> Arc<PolicyEngine> {
        std::fs::write(dir.join("rules.json"), b"{}").unwrap();
        let entry = PolicyFileEntry {
            path: PathBuf::from("rules.json"),
            sha256: hash_hex(b"{}"),
            created_at: chrono::Utc::now(),
        };
        let manifest = PolicyManifest::signed(vec![entry], b"secret");
        Arc::new(PolicyEngine::load(vec![], default_bundles(), manifest, dir, b"secret".to_vec()))
    }

    fn request(tool_id: &str, tier: &str, arguments: serde_json::Value) -> ToolRequest {
        ToolRequest {
            tool_id: tool_id.to_string(),
            arguments,
            request_id: "r1".to_string(),
            tier_context: tier.to_string(),
            cancellation_token: CancellationToken::new(),
        }
    }

    #[test]
    fn community_tier_crawl_stops_at_one_hundred_and_one_files() {
        let policy_dir = tempfile::tempdir().unwrap();
        let policy = test_policy(policy_dir.path());

        let tree_dir = tempfile::tempdir().unwrap();
        for i in 0..150 {
            fs::write(tree_dir.path().join(format!("f{i}.py")), "x = 1\n").unwrap();
        }

        let registry = build_registry(policy, Arc::new(InMemoryAuditSink::new(16)));
        let handler = registry.resolve("ingest.crawl").unwrap();
        let req = request("ingest.crawl", "community", serde_json::json!({ "root": tree_dir.path() }));
        let err = handler(&req, &CancellationToken::new()).unwrap_err();
        assert_eq!(err.kind, scalpel_core::error::ErrorKind::Forbidden);
        assert!(err.message.contains("community:max_files"));
    }

    #[test]
    fn unlimited_tier_crawl_reads_every_file() {
        let policy_dir = tempfile::tempdir().unwrap();
        let policy = test_policy(policy_dir.path());

        let tree_dir = tempfile::tempdir().unwrap();
        for i in 0..5 {
            fs::write(tree_dir.path().join(format!("f{i}.py")), "x = 1\n").unwrap();
        }

        let registry = build_registry(policy, Arc::new(InMemoryAuditSink::new(16)));
        let handler = registry.resolve("ingest.crawl").unwrap();
        let req = request("ingest.crawl", "unlimited", serde_json::json!({ "root": tree_dir.path() }));
        let data = handler(&req, &CancellationToken::new()).unwrap();
        assert_eq!(data["files"].as_array().unwrap().len(), 5);
    }

    #[test]
    fn graph_k_hop_finds_a_direct_call_neighbor() {
        let policy_dir = tempfile::tempdir().unwrap();
        let policy = test_policy(policy_dir.path());
        let tree_dir = tempfile::tempdir().unwrap();
        fs::write(
            tree_dir.path().join("server.py"),
            "def get_user():\n    return fetch_profile()\n\ndef fetch_profile():\n    return 1\n",
        )
        .unwrap();

        let registry = build_registry(policy, Arc::new(InMemoryAuditSink::new(16)));
        let handler = registry.resolve("graph.k_hop").unwrap();
        let seed = SymbolId::new("python", "server", SymbolKind::Function, "get_user", None);
        let req = request(
            "graph.k_hop",
            "unlimited",
            serde_json::json!({ "root": tree_dir.path(), "seed": seed.as_str(), "k": 2 }),
        );
        let data = handler(&req, &CancellationToken::new()).unwrap();
        let nodes = data["nodes"].as_array().unwrap();
        assert!(nodes.iter().any(|n| n["id"] == "python::server::function::fetch_profile"));
    }

    #[test]
    fn taint_analyze_reports_a_sql_injection_finding() {
        let policy_dir = tempfile::tempdir().unwrap();
        let policy = test_policy(policy_dir.path());
        let tree_dir = tempfile::tempdir().unwrap();
        fs::write(
            tree_dir.path().join("handlers.py"),
            "def handle():\n    q = request.args\n    sql = build_query(q)\n    db.execute(sql)\n",
        )
        .unwrap();

        let registry = build_registry(policy, Arc::new(InMemoryAuditSink::new(16)));
        let handler = registry.resolve("pdg.taint_analyze").unwrap();
        let req = request(
            "pdg.taint_analyze",
            "unlimited",
            serde_json::json!({
                "file": tree_dir.path().join("handlers.py"),
                "module_path": "handlers",
                "function_name": "handle",
            }),
        );
        let data = handler(&req, &CancellationToken::new()).unwrap();
        let findings = data.as_array().unwrap();
        assert_eq!(findings.len(), 1);
        assert_eq!(findings[0]["kind"], "sql_injection");
    }
}
