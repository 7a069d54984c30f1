//! On-disk tier, persisted under the layout from spec.md §6: an
//! `index` append-only log, a `data` blob file, and a `manifest.json`
//! recording schema version and compaction watermark. Grounded on the
//! teacher's `l2_disk_cache.rs` (atomic tmp-then-rename writes,
//! key→location index) but without rkyv/mmap: this tier serializes with
//! `bincode`, the crate the rest of this workspace already standardizes
//! on for wire/cache formats.

use crate::error::CacheError;
use crate::key::CacheKey;
use dashmap::DashMap;
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::fs::{self, File, OpenOptions};
use std::io::{Read, Seek, SeekFrom, Write};
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Mutex;

const SCHEMA_VERSION: u32 = 1;
const RECORD_SIZE: usize = 32 + 8 + 8 + 8 + 1; // key + offset + len + seq + tombstone
const COMPACTION_THRESHOLD: f64 = 0.2;

#[derive(Debug, Clone, Copy)]
struct IndexEntry {
    offset: u64,
    len: u64,
    seq: u64,
}

struct IndexRecord {
    key: [u8; 32],
    offset: u64,
    len: u64,
    seq: u64,
    tombstone: bool,
}

impl IndexRecord {
    fn to_bytes(&self) -> [u8; RECORD_SIZE] {
        let mut buf = [0u8; RECORD_SIZE];
        buf[0..32].copy_from_slice(&self.key);
        buf[32..40].copy_from_slice(&self.offset.to_le_bytes());
        buf[40..48].copy_from_slice(&self.len.to_le_bytes());
        buf[48..56].copy_from_slice(&self.seq.to_le_bytes());
        buf[56] = self.tombstone as u8;
        buf
    }

    fn from_bytes(buf: &[u8; RECORD_SIZE]) -> Self {
        let mut key = [0u8; 32];
        key.copy_from_slice(&buf[0..32]);
        Self {
            key,
            offset: u64::from_le_bytes(buf[32..40].try_into().unwrap()),
            len: u64::from_le_bytes(buf[40..48].try_into().unwrap()),
            seq: u64::from_le_bytes(buf[48..56].try_into().unwrap()),
            tombstone: buf[56] != 0,
        }
    }
}

#[derive(serde::Serialize, serde::Deserialize)]
struct Manifest {
    schema_version: u32,
    compaction_watermark: u64,
}

pub struct DiskTier {
    dir: PathBuf,
    index: DashMap<CacheKey, IndexEntry>,
    next_seq: AtomicU64,
    tombstones: AtomicU64,
    total_records: AtomicU64,
    data_file: Mutex<File>,
}

impl DiskTier {
    pub fn open(dir: &Path) -> Result<Self, CacheError> {
        fs::create_dir_all(dir).map_err(|e| CacheError::Io(e.to_string()))?;
        let index_path = dir.join("index");
        let data_path = dir.join("data");
        let manifest_path = dir.join("manifest.json");

        if !data_path.exists() {
            File::create(&data_path).map_err(|e| CacheError::Io(e.to_string()))?;
        }
        if !manifest_path.exists() {
            let manifest = Manifest {
                schema_version: SCHEMA_VERSION,
                compaction_watermark: 0,
            };
            fs::write(
                &manifest_path,
                serde_json::to_vec_pretty(&manifest).map_err(|e| CacheError::Serialization(e.to_string()))?,
            )
            .map_err(|e| CacheError::Io(e.to_string()))?;
        }

        let index = DashMap::new();
        let mut tombstones = 0u64;
        let mut total_records = 0u64;
        let mut max_seq = 0u64;

        if index_path.exists() {
            let bytes = fs::read(&index_path).map_err(|e| CacheError::Io(e.to_string()))?;
            for chunk in bytes.chunks_exact(RECORD_SIZE) {
                let buf: [u8; RECORD_SIZE] = chunk.try_into().unwrap();
                let record = IndexRecord::from_bytes(&buf);
                total_records += 1;
                max_seq = max_seq.max(record.seq);
                let key = CacheKey(record.key);

                if record.tombstone {
                    if index.remove(&key).is_some() {
                        tombstones += 1;
                    }
                } else {
                    if index
                        .insert(
                            key,
                            IndexEntry {
                                offset: record.offset,
                                len: record.len,
                                seq: record.seq,
                            },
                        )
                        .is_some()
                    {
                        tombstones += 1;
                    }
                }
            }
        }

        let data_file = OpenOptions::new()
            .read(true)
            .append(true)
            .open(&data_path)
            .map_err(|e| CacheError::Io(e.to_string()))?;

        let tier = Self {
            dir: dir.to_path_buf(),
            index,
            next_seq: AtomicU64::new(max_seq + 1),
            tombstones: AtomicU64::new(tombstones),
            total_records: AtomicU64::new(total_records),
            data_file: Mutex::new(data_file),
        };

        if total_records > 0 && tombstones as f64 / total_records as f64 > COMPACTION_THRESHOLD {
            tier.compact()?;
        }

        Ok(tier)
    }

    pub fn get<V: DeserializeOwned>(&self, key: &CacheKey) -> Result<Option<V>, CacheError> {
        let Some(entry) = self.index.get(key).map(|e| *e) else {
            return Ok(None);
        };
        let mut file = self.data_file.lock().unwrap();
        file.seek(SeekFrom::Start(entry.offset))
            .map_err(|e| CacheError::Io(e.to_string()))?;
        let mut buf = vec![0u8; entry.len as usize];
        file.read_exact(&mut buf)
            .map_err(|e| CacheError::Io(e.to_string()))?;
        let value = bincode::deserialize(&buf).map_err(|e| CacheError::Deserialization(e.to_string()))?;
        Ok(Some(value))
    }

    pub fn set<V: Serialize>(&self, key: &CacheKey, value: &V) -> Result<(), CacheError> {
        let bytes = bincode::serialize(value).map_err(|e| CacheError::Serialization(e.to_string()))?;
        let offset = {
            let mut file = self.data_file.lock().unwrap();
            let offset = file
                .seek(SeekFrom::End(0))
                .map_err(|e| CacheError::Io(e.to_string()))?;
            file.write_all(&bytes).map_err(|e| CacheError::Io(e.to_string()))?;
            file.sync_data().map_err(|e| CacheError::Io(e.to_string()))?;
            offset
        };

        let seq = self.next_seq.fetch_add(1, Ordering::SeqCst);
        let record = IndexRecord {
            key: key.0,
            offset,
            len: bytes.len() as u64,
            seq,
            tombstone: false,
        };
        self.append_index_record(&record)?;

        if self
            .index
            .insert(
                *key,
                IndexEntry {
                    offset,
                    len: bytes.len() as u64,
                    seq,
                },
            )
            .is_some()
        {
            self.tombstones.fetch_add(1, Ordering::SeqCst);
        }
        self.total_records.fetch_add(1, Ordering::SeqCst);

        Ok(())
    }

    pub fn invalidate(&self, key: &CacheKey) -> Result<(), CacheError> {
        if self.index.remove(key).is_some() {
            let seq = self.next_seq.fetch_add(1, Ordering::SeqCst);
            let record = IndexRecord {
                key: key.0,
                offset: 0,
                len: 0,
                seq,
                tombstone: true,
            };
            self.append_index_record(&record)?;
            self.tombstones.fetch_add(1, Ordering::SeqCst);
            self.total_records.fetch_add(1, Ordering::SeqCst);
        }
        Ok(())
    }

    fn append_index_record(&self, record: &IndexRecord) -> Result<(), CacheError> {
        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(self.dir.join("index"))
            .map_err(|e| CacheError::Io(e.to_string()))?;
        file.write_all(&record.to_bytes())
            .map_err(|e| CacheError::Io(e.to_string()))?;
        file.sync_data().map_err(|e| CacheError::Io(e.to_string()))
    }

    /// Rewrite `data`/`index` keeping only live entries, via a
    /// tmp-then-rename swap so a crash mid-compaction never leaves a
    /// half-written cache (spec.md §7 fail-closed posture).
    fn compact(&self) -> Result<(), CacheError> {
        let tmp_data_path = self.dir.join("data.tmp");
        let tmp_index_path = self.dir.join("index.tmp");

        let mut tmp_data = File::create(&tmp_data_path).map_err(|e| CacheError::Io(e.to_string()))?;
        let mut tmp_index = File::create(&tmp_index_path).map_err(|e| CacheError::Io(e.to_string()))?;

        let mut old_data = self.data_file.lock().unwrap();
        let mut new_offset = 0u64;
        let mut seq = 0u64;

        let mut entries: Vec<(CacheKey, IndexEntry)> =
            self.index.iter().map(|e| (*e.key(), *e.value())).collect();
        entries.sort_by_key(|(k, _)| k.0);

        for (key, entry) in &entries {
            old_data
                .seek(SeekFrom::Start(entry.offset))
                .map_err(|e| CacheError::Io(e.to_string()))?;
            let mut buf = vec![0u8; entry.len as usize];
            old_data.read_exact(&mut buf).map_err(|e| CacheError::Io(e.to_string()))?;
            tmp_data.write_all(&buf).map_err(|e| CacheError::Io(e.to_string()))?;

            let record = IndexRecord {
                key: key.0,
                offset: new_offset,
                len: entry.len,
                seq,
                tombstone: false,
            };
            tmp_index
                .write_all(&record.to_bytes())
                .map_err(|e| CacheError::Io(e.to_string()))?;

            self.index.insert(
                *key,
                IndexEntry {
                    offset: new_offset,
                    len: entry.len,
                    seq,
                },
            );

            new_offset += entry.len;
            seq += 1;
        }

        tmp_data.sync_all().map_err(|e| CacheError::Io(e.to_string()))?;
        tmp_index.sync_all().map_err(|e| CacheError::Io(e.to_string()))?;
        drop(tmp_data);
        drop(tmp_index);
        drop(old_data);

        fs::rename(&tmp_data_path, self.dir.join("data")).map_err(|e| CacheError::Io(e.to_string()))?;
        fs::rename(&tmp_index_path, self.dir.join("index")).map_err(|e| CacheError::Io(e.to_string()))?;

        *self.data_file.lock().unwrap() = OpenOptions::new()
            .read(true)
            .append(true)
            .open(self.dir.join("data"))
            .map_err(|e| CacheError::Io(e.to_string()))?;

        self.tombstones.store(0, Ordering::SeqCst);
        self.total_records.store(entries.len() as u64, Ordering::SeqCst);
        self.next_seq.store(seq, Ordering::SeqCst);

        let manifest = Manifest {
            schema_version: SCHEMA_VERSION,
            compaction_watermark: seq,
        };
        fs::write(
            self.dir.join("manifest.json"),
            serde_json::to_vec_pretty(&manifest).map_err(|e| CacheError::Serialization(e.to_string()))?,
        )
        .map_err(|e| CacheError::Io(e.to_string()))?;

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::{Deserialize, Serialize};
    use tempfile::TempDir;

    #[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
    struct Data {
        id: u64,
        name: String,
    }

    fn key(n: u8) -> CacheKey {
        CacheKey::new(&[n; 32], 1, 0)
    }

    #[test]
    fn set_then_get_round_trips() {
        let dir = TempDir::new().unwrap();
        let tier = DiskTier::open(dir.path()).unwrap();
        let data = Data { id: 1, name: "a".into() };
        tier.set(&key(1), &data).unwrap();
        let got: Option<Data> = tier.get(&key(1)).unwrap();
        assert_eq!(got, Some(data));
    }

    #[test]
    fn invalidate_removes_entry() {
        let dir = TempDir::new().unwrap();
        let tier = DiskTier::open(dir.path()).unwrap();
        tier.set(&key(1), &Data { id: 1, name: "a".into() }).unwrap();
        tier.invalidate(&key(1)).unwrap();
        let got: Option<Data> = tier.get(&key(1)).unwrap();
        assert_eq!(got, None);
    }

    #[test]
    fn reopening_replays_index() {
        let dir = TempDir::new().unwrap();
        {
            let tier = DiskTier::open(dir.path()).unwrap();
            tier.set(&key(1), &Data { id: 9, name: "persisted".into() }).unwrap();
        }
        let tier = DiskTier::open(dir.path()).unwrap();
        let got: Option<Data> = tier.get(&key(1)).unwrap();
        assert_eq!(got, Some(Data { id: 9, name: "persisted".into() }));
    }

    #[test]
    fn compacts_when_tombstone_ratio_exceeds_threshold() {
        let dir = TempDir::new().unwrap();
        let tier = DiskTier::open(dir.path()).unwrap();
        for i in 0..10u8 {
            tier.set(&key(i), &Data { id: i as u64, name: "x".into() }).unwrap();
        }
        for i in 0..5u8 {
            tier.invalidate(&key(i)).unwrap();
        }
        drop(tier);
        // Reopening replays the log; >20% tombstoned triggers compaction.
        let tier = DiskTier::open(dir.path()).unwrap();
        for i in 0..5u8 {
            let got: Option<Data> = tier.get(&key(i)).unwrap();
            assert_eq!(got, None);
        }
        for i in 5..10u8 {
            let got: Option<Data> = tier.get(&key(i)).unwrap();
            assert!(got.is_some());
        }
    }
}
