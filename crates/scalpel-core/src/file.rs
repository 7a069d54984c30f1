//! File and Language (spec.md §3: "File").

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// A supported (or stub-level) source language.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Language {
    Python,
    TypeScript,
    JavaScript,
    Java,
    Go,
    Cpp,
}

impl Language {
    pub fn as_str(self) -> &'static str {
        match self {
            Language::Python => "python",
            Language::TypeScript => "typescript",
            Language::JavaScript => "javascript",
            Language::Java => "java",
            Language::Go => "go",
            Language::Cpp => "cpp",
        }
    }

    /// Stub-level languages get top-level-only lowering per spec.md §1/§4.3.
    pub fn is_stub_level(self) -> bool {
        matches!(self, Language::Go | Language::Cpp)
    }

    pub fn from_extension(ext: &str) -> Option<Self> {
        Some(match ext {
            "py" | "pyi" => Language::Python,
            "ts" | "tsx" => Language::TypeScript,
            "js" | "jsx" | "mjs" | "cjs" => Language::JavaScript,
            "java" => Language::Java,
            "go" => Language::Go,
            "cc" | "cpp" | "cxx" | "hpp" | "hh" | "h" => Language::Cpp,
            _ => return None,
        })
    }

    /// Shebang-based fallback detection for extension-less scripts.
    pub fn from_shebang(first_line: &str) -> Option<Self> {
        if first_line.starts_with("#!") {
            if first_line.contains("python") {
                return Some(Language::Python);
            }
            if first_line.contains("node") {
                return Some(Language::JavaScript);
            }
        }
        None
    }
}

/// `(path, content_hash, language, size, mtime)` per spec.md §3.
///
/// Immutable once hashed; owned exclusively by the cache (spec.md §3
/// "Ownership") — every other component borrows it by reference.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct File {
    pub path: PathBuf,
    pub content_hash: [u8; 32],
    pub language: Language,
    pub size: u64,
    pub mtime_ns: i64,
}

impl File {
    pub fn content_hash_hex(&self) -> String {
        self.content_hash.iter().map(|b| format!("{b:02x}")).collect()
    }
}
