//! Durable history log
//!
//! Append-only log of scored readings under one fixed storage key.
//! History is advisory telemetry: read failures degrade to an empty log and
//! write failures never interrupt monitoring. Both are logged.

use crate::storage::KeyValueStore;
use crate::types::HistoryEntry;
use std::sync::Arc;
use tracing::warn;

/// Fixed storage key for the serialized history array
pub const HISTORY_KEY: &str = "stress_history";

/// Append-only history log over a key-value store.
///
/// Single-writer: only the polling cycle appends within a session, so the
/// non-atomic read-modify-write is not a race in practice.
#[derive(Clone)]
pub struct HistoryStore {
    store: Arc<dyn KeyValueStore>,
}

impl HistoryStore {
    pub fn new(store: Arc<dyn KeyValueStore>) -> Self {
        Self { store }
    }

    /// Load all entries, oldest first.
    ///
    /// Missing, unreadable, or corrupt history degrades to empty.
    pub fn load_all(&self) -> Vec<HistoryEntry> {
        let raw = match self.store.get(HISTORY_KEY) {
            Ok(Some(raw)) => raw,
            Ok(None) => return Vec::new(),
            Err(e) => {
                warn!(error = %e, "history read failed; treating as empty");
                return Vec::new();
            }
        };

        match serde_json::from_str(&raw) {
            Ok(entries) => entries,
            Err(e) => {
                warn!(error = %e, "history payload corrupt; treating as empty");
                Vec::new()
            }
        }
    }

    /// Append one entry to the end of the log.
    ///
    /// Fail-open: a storage failure is logged and swallowed.
    pub fn append(&self, entry: HistoryEntry) {
        let mut entries = self.load_all();
        entries.push(entry);

        let serialized = match serde_json::to_string(&entries) {
            Ok(serialized) => serialized,
            Err(e) => {
                warn!(error = %e, "history serialization failed; entry dropped");
                return;
            }
        };

        if let Err(e) = self.store.set(HISTORY_KEY, &serialized) {
            warn!(error = %e, "history write failed; entry dropped");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::EngineError;
    use crate::storage::MemoryStore;
    use chrono::{TimeZone, Utc};
    use pretty_assertions::assert_eq;

    fn make_entry(name: &str, score: u32, minute: u32) -> HistoryEntry {
        HistoryEntry {
            user_name: name.to_string(),
            timestamp: Utc.with_ymd_and_hms(2024, 1, 15, 8, minute, 0).unwrap(),
            stress_score: score,
        }
    }

    #[test]
    fn test_append_preserves_order() {
        let history = HistoryStore::new(Arc::new(MemoryStore::new()));

        history.append(make_entry("ada", 35, 0));
        history.append(make_entry("ada", 52, 2));
        history.append(make_entry("ada", 71, 4));

        let entries = history.load_all();
        assert_eq!(entries.len(), 3);
        assert_eq!(entries[0].stress_score, 35);
        assert_eq!(entries[2].stress_score, 71);
        assert_eq!(entries.last().unwrap(), &make_entry("ada", 71, 4));
    }

    #[test]
    fn test_load_missing_history_is_empty() {
        let history = HistoryStore::new(Arc::new(MemoryStore::new()));
        assert_eq!(history.load_all(), Vec::new());
    }

    #[test]
    fn test_corrupt_payload_degrades_to_empty() {
        let store = Arc::new(MemoryStore::new());
        store.set(HISTORY_KEY, "{not valid").unwrap();

        let history = HistoryStore::new(store);
        assert_eq!(history.load_all(), Vec::new());

        // And the log recovers on the next append
        history.append(make_entry("ada", 40, 0));
        assert_eq!(history.load_all().len(), 1);
    }

    /// Store that refuses every operation
    struct BrokenStore;

    impl KeyValueStore for BrokenStore {
        fn get(&self, _key: &str) -> Result<Option<String>, EngineError> {
            Err(EngineError::StorageUnavailable("disk on fire".to_string()))
        }

        fn set(&self, _key: &str, _value: &str) -> Result<(), EngineError> {
            Err(EngineError::StorageUnavailable("disk on fire".to_string()))
        }
    }

    #[test]
    fn test_storage_failure_is_swallowed() {
        let history = HistoryStore::new(Arc::new(BrokenStore));
        // Neither call panics or errors out
        history.append(make_entry("ada", 40, 0));
        assert_eq!(history.load_all(), Vec::new());
    }
}
