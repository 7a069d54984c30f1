//! Content hashing (spec.md §4.4 "Files larger than 1 MiB use
//! memory-mapped hashing").

use sha2::{Digest, Sha256};
use std::fs;
use std::io::{self, Read};
use std::path::Path;

/// 1 MiB, matching spec.md's mmap threshold.
pub const MMAP_THRESHOLD_BYTES: u64 = 1024 * 1024;

pub fn hash_file(path: &Path, size_hint: u64) -> io::Result<[u8; 32]> {
    if size_hint >= MMAP_THRESHOLD_BYTES {
        hash_file_mmap(path)
    } else {
        hash_file_buffered(path)
    }
}

fn hash_file_buffered(path: &Path) -> io::Result<[u8; 32]> {
    let mut file = fs::File::open(path)?;
    let mut hasher = Sha256::new();
    let mut buf = [0u8; 64 * 1024];
    loop {
        let n = file.read(&mut buf)?;
        if n == 0 {
            break;
        }
        hasher.update(&buf[..n]);
    }
    Ok(hasher.finalize().into())
}

fn hash_file_mmap(path: &Path) -> io::Result<[u8; 32]> {
    let file = fs::File::open(path)?;
    // Zero-length files can't be mmap'ed; fall back to the buffered path.
    if file.metadata()?.len() == 0 {
        return hash_file_buffered(path);
    }
    let mmap = unsafe { memmap2::Mmap::map(&file)? };
    let mut hasher = Sha256::new();
    hasher.update(&mmap[..]);
    Ok(hasher.finalize().into())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    #[test]
    fn buffered_and_mmap_paths_agree() {
        let mut f = NamedTempFile::new().unwrap();
        let content = vec![b'x'; 4096];
        f.write_all(&content).unwrap();
        f.flush().unwrap();

        let buffered = hash_file_buffered(f.path()).unwrap();
        let mmapped = hash_file_mmap(f.path()).unwrap();
        assert_eq!(buffered, mmapped);
    }
}
