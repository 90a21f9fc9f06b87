use async_trait::async_trait;
use dashmap::DashMap;

use iyashi_audit::{AuditEntry, AuditError, AuditSink};

/// In-memory audit sink backed by a `DashMap`.
///
/// Entries are keyed by entry ID; [`entries`](Self::entries) returns a
/// snapshot ordered by timestamp so tests can assert on what was recorded.
#[derive(Debug, Default)]
pub struct MemoryAuditSink {
    entries: DashMap<String, AuditEntry>,
}

impl MemoryAuditSink {
    /// Create a new empty sink.
    pub fn new() -> Self {
        Self::default()
    }

    /// Snapshot of all recorded entries, oldest first.
    pub fn entries(&self) -> Vec<AuditEntry> {
        let mut all: Vec<AuditEntry> = self.entries.iter().map(|e| e.value().clone()).collect();
        all.sort_by(|a, b| a.timestamp.cmp(&b.timestamp));
        all
    }

    /// Number of recorded entries.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether no entries have been recorded.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[async_trait]
impl AuditSink for MemoryAuditSink {
    async fn record(&self, entry: AuditEntry) -> Result<(), AuditError> {
        self.entries.insert(entry.id.clone(), entry);
        Ok(())
    }
}
