//! `patch()` (spec.md §4.7): atomic byte-range replace with a
//! write-backup → replace → reparse → verify → restore-on-failure
//! sequence, grounded on the atomic tmp-then-rename idiom in
//! `codegraph-ir/src/features/cache/l2_disk_cache.rs`.

use crate::error::SurgeryError;
use crate::locate::locate;
use scalpel_core::audit::{AuditRecord, AuditSink};
use scalpel_core::symbol::SymbolKind;
use scalpel_core::uir::UirNodeKind;
use scalpel_core::Language;
use sha2::{Digest, Sha256};
use std::collections::HashSet;
use std::path::Path;

pub struct PatchOptions {
    /// Permit the patch even if it introduces unresolved external
    /// symbols not present before (spec.md §4.7 invariant).
    pub allow_new_unresolved_symbols: bool,
}

impl Default for PatchOptions {
    fn default() -> Self {
        Self { allow_new_unresolved_symbols: false }
    }
}

#[derive(Debug, Clone)]
pub struct PatchOutcome {
    pub old_hash: [u8; 32],
    pub new_hash: [u8; 32],
}

pub fn patch(
    file: &Path,
    module_path: &str,
    symbol_name: &str,
    kind: Option<SymbolKind>,
    new_source: &str,
    options: &PatchOptions,
    audit: &dyn AuditSink,
) -> Result<PatchOutcome, SurgeryError> {
    let language = file
        .extension()
        .and_then(|e| e.to_str())
        .and_then(Language::from_extension)
        .ok_or_else(|| SurgeryError::ParseFailed("unrecognized file extension".to_string()))?;

    let original = std::fs::read(file)?;
    let old_hash: [u8; 32] = Sha256::digest(&original).into();

    let old_tree = scalpel_parse::parse_and_lower(language, &original, module_path)
        .map_err(|e| SurgeryError::ParseFailed(e.to_string()))?;
    let located = locate(&old_tree, &original, symbol_name, kind)?;

    let backup_path = file.with_extension(format!(
        "{}.surgery-bak",
        file.extension().and_then(|e| e.to_str()).unwrap_or("")
    ));
    std::fs::write(&backup_path, &original)?;

    let mut new_content = Vec::with_capacity(original.len());
    new_content.extend_from_slice(&original[..located.range.start as usize]);
    new_content.extend_from_slice(new_source.as_bytes());
    new_content.extend_from_slice(&original[located.range.end as usize..]);

    let result = (|| -> Result<PatchOutcome, SurgeryError> {
        let new_tree = scalpel_parse::parse_and_lower(language, &new_content, module_path)
            .map_err(|e| SurgeryError::ParseFailed(e.to_string()))?;

        let new_located = locate(&new_tree, &new_content, symbol_name, kind)?;

        let old_params = param_count(&old_tree, located.node_id);
        let new_params = param_count(&new_tree, new_located.node_id);
        if new_params > old_params {
            return Err(SurgeryError::InterfaceWidened);
        }

        if !options.allow_new_unresolved_symbols {
            let old_unresolved = unresolved_names(&old_tree, located.node_id);
            let new_unresolved = unresolved_names(&new_tree, new_located.node_id);
            let introduced: Vec<String> = new_unresolved.difference(&old_unresolved).cloned().collect();
            if !introduced.is_empty() {
                return Err(SurgeryError::NewUnresolvedSymbols(introduced));
            }
        }

        let tmp_path = file.with_extension(format!(
            "{}.surgery-tmp",
            file.extension().and_then(|e| e.to_str()).unwrap_or("")
        ));
        std::fs::write(&tmp_path, &new_content)?;
        std::fs::rename(&tmp_path, file)?;

        let new_hash: [u8; 32] = Sha256::digest(&new_content).into();
        Ok(PatchOutcome { old_hash, new_hash })
    })();

    match &result {
        Ok(outcome) => {
            audit.record(AuditRecord {
                file: Some(file.to_path_buf()),
                symbol_id: Some(symbol_name.to_string()),
                old_hash: Some(to_hex(&outcome.old_hash)),
                new_hash: Some(to_hex(&outcome.new_hash)),
                timestamp: chrono::Utc::now(),
                kind: "surgery_patch".to_string(),
                details: serde_json::json!({ "file": file.display().to_string() }),
            });
            let _ = std::fs::remove_file(&backup_path);
        }
        Err(_) => {
            // Original file was never touched (we only rename after
            // every check passes), so restoring is just discarding the
            // backup; the on-disk bytes already equal old_hash.
            let _ = std::fs::remove_file(&backup_path);
        }
    }

    result
}

fn to_hex(bytes: &[u8; 32]) -> String {
    bytes.iter().map(|b| format!("{:02x}", b)).collect()
}

fn param_count(tree: &scalpel_core::uir::UirTree, node_id: scalpel_core::uir::NodeId) -> usize {
    tree.get(node_id)
        .children
        .iter()
        .filter(|&&c| tree.get(c).kind == UirNodeKind::Parameter)
        .count()
}

fn unresolved_names(tree: &scalpel_core::uir::UirTree, root: scalpel_core::uir::NodeId) -> HashSet<String> {
    let mut out = HashSet::new();
    collect(tree, root, &mut out);
    out
}

fn collect(tree: &scalpel_core::uir::UirTree, id: scalpel_core::uir::NodeId, out: &mut HashSet<String>) {
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
