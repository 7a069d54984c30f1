//! C1 Source Ingest (spec.md §4.1).
//!
//! Walks the filesystem once per request, respects a fixed set of ignore
//! directories plus user globs, detects language by extension first then
//! shebang then content sniffing, and yields each file exactly once.
//! Symlinks are followed only if they resolve inside `root`.

mod error;
mod hash;
mod language_sniff;
pub mod walker;

pub use error::IngestError;
pub use hash::hash_file;
pub use language_sniff::sniff_language;

use rayon::prelude::*;
use scalpel_core::cancel::CancellationToken;
use scalpel_core::config::IngestConfig;
use scalpel_core::{File, Language};
use std::path::{Path, PathBuf};

/// Suspension-point granularity for cancellation (spec.md §5): the
/// candidate list is processed in batches no larger than this, with a
/// cancellation check between batches rather than only at the very end.
const BATCH_SIZE: usize = 64;

/// Parameters for one ingest round (spec.md §4.1 contract).
#[derive(Debug, Clone, Default)]
pub struct IngestRequest {
    pub root: PathBuf,
    pub include_globs: Vec<String>,
    pub exclude_globs: Vec<String>,
    pub language_filter: Option<Vec<Language>>,
}

/// Result of one ingest round: the files found plus non-fatal warnings
/// for individually unreadable files (spec.md §4.1).
#[derive(Debug, Clone, Default)]
pub struct IngestOutcome {
    pub files: Vec<File>,
    pub warnings: Vec<String>,
}

/// `ingest(root, include_globs, exclude_globs, language_filter?) -> stream<File>`.
///
/// Synchronous batch form of the contract: since every downstream
/// consumer in this workspace (C2-C6) ends up materializing the file set
/// before building cross-file graphs, `IngestOutcome` is a realized
/// collection rather than a lazy iterator. A true streaming caller can
/// drive [`walker::walk`] directly.
///
/// Candidates are hashed in batches of [`BATCH_SIZE`] so a long-running
/// ingest over a large tree observes `cancellation` between batches
/// (spec.md §5) instead of only at completion.
pub fn ingest(
    req: &IngestRequest,
    config: &IngestConfig,
    cancellation: &CancellationToken,
) -> Result<IngestOutcome, IngestError> {
    if !req.root.exists() {
        return Err(IngestError::invalid_path(&req.root));
    }
    if std::fs::read_dir(&req.root).is_err() && !req.root.is_file() {
        return Err(IngestError::forbidden(&req.root));
    }

    let candidates = walker::walk(&req.root, &req.include_globs, &req.exclude_globs, config)?;

    let mut files = Vec::with_capacity(candidates.len());
    let mut warnings = Vec::new();
    for batch in candidates.chunks(BATCH_SIZE) {
        if cancellation.is_cancelled() {
            return Err(IngestError::Cancelled);
        }

        let results: Vec<Result<File, String>> =
            batch.into_par_iter().map(|path| ingest_one(path, config)).collect();

        for result in results {
            match result {
                Ok(file) => {
                    if let Some(filter) = &req.language_filter {
                        if !filter.contains(&file.language) {
                            continue;
                        }
                    }
                    files.push(file);
                }
                Err(warning) => warnings.push(warning),
            }
        }
    }
    // Deterministic yield order regardless of parallel hashing order.
    files.sort_by(|a, b| a.path.cmp(&b.path));

    Ok(IngestOutcome { files, warnings })
}

/// Ingest a single already-located path. Exposed so incremental callers
/// (e.g. a crawl handler enforcing a per-file policy limit) can hash one
/// candidate at a time instead of materializing the whole batch.
pub fn ingest_one(path: &Path, config: &IngestConfig) -> Result<File, String> {
    let metadata = std::fs::metadata(path).map_err(|e| format!("{}: {e}", path.display()))?;
    let language = sniff_language(path, config.sniff_bytes)
        .ok_or_else(|| format!("{}: could not detect language", path.display()))?;
    let content_hash =
        hash_file(path, metadata.len()).map_err(|e| format!("{}: {e}", path.display()))?;
    let mtime_ns = metadata
        .modified()
        .ok()
        .and_then(|t| t.duration_since(std::time::UNIX_EPOCH).ok())
        .map(|d| d.as_nanos() as i64)
        .unwrap_or(0);

    Ok(File {
        path: path.to_path_buf(),
        content_hash,
        language,
        size: metadata.len(),
        mtime_ns,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::tempdir;

    #[test]
    fn ingests_a_simple_tree_and_skips_ignored_dirs() {
        let dir = tempdir().unwrap();
        fs::write(dir.path().join("a.py"), "x = 1\n").unwrap();
        fs::create_dir(dir.path().join("node_modules")).unwrap();
        fs::write(dir.path().join("node_modules/skip.py"), "y = 2\n").unwrap();

        let req = IngestRequest {
            root: dir.path().to_path_buf(),
            ..Default::default()
        };
        let outcome = ingest(&req, &IngestConfig::default(), &CancellationToken::new()).unwrap();
        assert_eq!(outcome.files.len(), 1);
        assert_eq!(outcome.files[0].language, Language::Python);
    }

    #[test]
    fn fails_invalid_path() {
        let req = IngestRequest {
            root: PathBuf::from("/does/not/exist/at/all"),
            ..Default::default()
        };
        let err = ingest(&req, &IngestConfig::default(), &CancellationToken::new()).unwrap_err();
        assert!(matches!(err, IngestError::InvalidPath(_)));
    }

    #[test]
    fn cancelled_token_stops_before_hashing_any_batch() {
        let dir = tempdir().unwrap();
        fs::write(dir.path().join("a.py"), "x = 1\n").unwrap();

        let req = IngestRequest {
            root: dir.path().to_path_buf(),
            ..Default::default()
        };
        let token = CancellationToken::new();
        token.cancel();
        let err = ingest(&req, &IngestConfig::default(), &token).unwrap_err();
        assert!(matches!(err, IngestError::Cancelled));
    }

    #[test]
    fn batches_larger_than_batch_size_are_still_ingested_in_full() {
        let dir = tempdir().unwrap();
        for i in 0..(BATCH_SIZE * 2 + 3) {
            fs::write(dir.path().join(format!("f{i}.py")), "x = 1\n").unwrap();
        }

        let req = IngestRequest {
            root: dir.path().to_path_buf(),
            ..Default::default()
        };
        let outcome = ingest(&req, &IngestConfig::default(), &CancellationToken::new()).unwrap();
        assert_eq!(outcome.files.len(), BATCH_SIZE * 2 + 3);
    }
}
