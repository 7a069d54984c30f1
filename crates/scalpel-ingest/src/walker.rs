//! Filesystem walk with ignore-directory and glob filtering, grounded on
//! the teacher's `walkdir`-based recursive traversal
//! (`codegraph-ir`'s IR build walk) plus `ignore`'s gitignore-style glob
//! matching for `include_globs`/`exclude_globs`.

use crate::error::IngestError;
use ignore::gitignore::GitignoreBuilder;
use scalpel_core::config::IngestConfig;
use std::path::{Path, PathBuf};
use walkdir::WalkDir;

pub fn walk(
    root: &Path,
    include_globs: &[String],
    exclude_globs: &[String],
    config: &IngestConfig,
) -> Result<Vec<PathBuf>, IngestError> {
    let mut include_builder = GitignoreBuilder::new(root);
    for glob in include_globs {
        include_builder
            .add_line(None, glob)
            .map_err(|_| IngestError::invalid_path(root))?;
    }
    let include_matcher = include_builder
        .build()
        .map_err(|_| IngestError::invalid_path(root))?;

    let mut exclude_builder = GitignoreBuilder::new(root);
    for glob in exclude_globs {
        exclude_builder
            .add_line(None, glob)
            .map_err(|_| IngestError::invalid_path(root))?;
    }
    let exclude_matcher = exclude_builder
        .build()
        .map_err(|_| IngestError::invalid_path(root))?;

    let mut out = Vec::new();
    let walker = WalkDir::new(root)
        .follow_links(true)
        .into_iter()
        .filter_entry(|entry| {
            if entry.file_type().is_dir() {
                let name = entry.file_name().to_string_lossy();
                return !config.ignore_dirs.iter().any(|ignored| ignored == &name);
            }
            true
        });

    for entry in walker {
        let entry = match entry {
            Ok(e) => e,
            Err(_) => continue, // individual unreadable entries are non-fatal
        };
        if !entry.file_type().is_file() {
            continue;
        }
        let path = entry.path();

        // Symlinks must resolve inside root.
        if entry.path_is_symlink() {
            match std::fs::canonicalize(path) {
                Ok(resolved) if resolved.starts_with(root) => {}
                _ => continue,
            }
        }

        if !include_globs.is_empty() && !include_matcher.matched(path, false).is_ignore() {
            continue;
        }
        if exclude_matcher.matched(path, false).is_ignore() {
            continue;
        }

        out.push(path.to_path_buf());
    }

    Ok(out)
}
