//! Language detection: extension first, shebang fallback, then content
//! sniffing bounded to the first N bytes (spec.md §4.1).

use scalpel_core::Language;
use std::fs;
use std::io::{BufRead, BufReader};
use std::path::Path;

pub fn sniff_language(path: &Path, sniff_bytes: usize) -> Option<Language> {
    if let Some(ext) = path.extension().and_then(|e| e.to_str()) {
        if let Some(lang) = Language::from_extension(ext) {
            return Some(lang);
        }
    }

    let file = fs::File::open(path).ok()?;
    let mut reader = BufReader::new(file);
    let mut first_line = String::new();
    let _ = reader.read_line(&mut first_line);
    if let Some(lang) = Language::from_shebang(first_line.trim_end()) {
        return Some(lang);
    }

    sniff_content(path, sniff_bytes)
}

/// Bounded content sniffing: look for unambiguous per-language syntax
/// markers within the first `sniff_bytes` bytes.
fn sniff_content(path: &Path, sniff_bytes: usize) -> Option<Language> {
    let bytes = fs::read(path).ok()?;
    let head = &bytes[..bytes.len().min(sniff_bytes)];
    let text = String::from_utf8_lossy(head);

    if text.contains("def ") && text.contains(':') {
        return Some(Language::Python);
    }
    if text.contains("public class ") || text.contains("package ") {
        return Some(Language::Java);
    }
    if text.contains("function ") || text.contains("=>") || text.contains("const ") {
        return Some(Language::JavaScript);
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    #[test]
    fn detects_python_shebang_without_extension() {
        let mut f = NamedTempFile::new().unwrap();
        writeln!(f, "#!/usr/bin/env python3").unwrap();
        writeln!(f, "print('hi')").unwrap();
        f.flush().unwrap();
        assert_eq!(sniff_language(f.path(), 4096), Some(Language::Python));
    }
}
