//! Audit sink for surgery patches (spec.md §4.7) and policy denials
//! (spec.md §4.8). Kept as a trait so the dispatcher can swap in a
//! durable implementation without this crate depending on any storage
//! backend.

use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// One audited event. `file`/`symbol_id`/`old_hash`/`new_hash` cover the
/// surgery audit record shape from spec.md §4.7; policy denials reuse the
/// same envelope with `symbol_id` left empty and `details` carrying the
/// violated rule id.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuditRecord {
    pub file: Option<PathBuf>,
    pub symbol_id: Option<String>,
    pub old_hash: Option<String>,
    pub new_hash: Option<String>,
    pub timestamp: chrono::DateTime<chrono::Utc>,
    pub kind: String,
    pub details: serde_json::Value,
}

pub trait AuditSink: Send + Sync {
    fn record(&self, record: AuditRecord);
}

/// Default in-memory ring-buffer sink; bounded so long-running services
/// don't grow this unboundedly without an operator wiring a real sink.
pub struct InMemoryAuditSink {
    capacity: usize,
    records: Mutex<Vec<AuditRecord>>,
}

impl InMemoryAuditSink {
    pub fn new(capacity: usize) -> Self {
        Self {
            capacity,
            records: Mutex::new(Vec::new()),
        }
    }

    pub fn snapshot(&self) -> Vec<AuditRecord> {
        self.records.lock().clone()
    }
}

impl AuditSink for InMemoryAuditSink {
    fn record(&self, record: AuditRecord) {
        let mut records = self.records.lock();
        records.push(record);
        if records.len() > self.capacity {
            let overflow = records.len() - self.capacity;
            records.drain(0..overflow);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bounds_to_capacity() {
        let sink = InMemoryAuditSink::new(2);
        for i in 0..5 {
            sink.record(AuditRecord {
                file: None,
                symbol_id: None,
                old_hash: None,
                new_hash: None,
                timestamp: chrono::Utc::now(),
                kind: format!("event-{i}"),
                details: serde_json::Value::Null,
            });
        }
        let snap = sink.snapshot();
        assert_eq!(snap.len(), 2);
        assert_eq!(snap[1].kind, "event-4");
    }
}
