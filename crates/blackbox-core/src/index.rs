//! Log index and event markers.
//!
//! The index maps virtual-time windows onto records in the NVMe backing
//! file. Entries are appended in pipeline order and never removed, so a
//! timestamp that once resolved keeps resolving to the same record. Event
//! markers are free-form time-stamped annotations added at orchestrator
//! discretion.

use serde::{Deserialize, Serialize};

/// One record's position in the backing file, keyed by its time window.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct LogIndexEntry {
    /// Virtual time at which the pipeline for this record started.
    pub timestamp_start: u64,
    /// Virtual time at which the record was ready for persistence.
    pub timestamp_end: u64,
    /// Byte offset of the record in the NVMe backing file.
    pub file_offset: u64,
    /// Persisted (encoded) size in bytes.
    pub compressed_size: u32,
    /// Original input size in bytes.
    pub uncompressed_size: u32,
}

/// Append-only, timestamp-searchable record index.
#[derive(Debug, Default)]
pub struct LogIndex {
    entries: Vec<LogIndexEntry>,
}

impl LogIndex {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Append an entry. `timestamp_start` must not exceed `timestamp_end`.
    pub fn append(&mut self, entry: LogIndexEntry) {
        debug_assert!(entry.timestamp_start <= entry.timestamp_end);
        self.entries.push(entry);
    }

    /// First entry whose window contains `timestamp`.
    #[must_use]
    pub fn lookup(&self, timestamp: u64) -> Option<&LogIndexEntry> {
        self.entries
            .iter()
            .find(|e| timestamp >= e.timestamp_start && timestamp <= e.timestamp_end)
    }

    #[must_use]
    pub fn entries(&self) -> &[LogIndexEntry] {
        &self.entries
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// A time-stamped annotation with free-form JSON metadata.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EventMarker {
    pub timestamp: u64,
    pub label: String,
    pub metadata: serde_json::Value,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn entry(start: u64, end: u64, offset: u64) -> LogIndexEntry {
        LogIndexEntry {
            timestamp_start: start,
            timestamp_end: end,
            file_offset: offset,
            compressed_size: 51,
            uncompressed_size: 4096,
        }
    }

    #[test]
    fn test_lookup_hits_containing_window() {
        let mut index = LogIndex::new();
        index.append(entry(0, 100, 0));
        index.append(entry(200, 300, 51));

        assert_eq!(index.lookup(50).unwrap().file_offset, 0);
        assert_eq!(index.lookup(200).unwrap().file_offset, 51);
        assert_eq!(index.lookup(300).unwrap().file_offset, 51);
    }

    #[test]
    fn test_lookup_outside_every_window_misses() {
        let mut index = LogIndex::new();
        index.append(entry(10, 20, 0));
        assert!(index.lookup(9).is_none());
        assert!(index.lookup(21).is_none());
    }

    #[test]
    fn test_lookup_is_stable_after_later_appends() {
        let mut index = LogIndex::new();
        index.append(entry(0, 100, 0));
        let first = *index.lookup(40).unwrap();

        index.append(entry(150, 250, 51));
        index.append(entry(300, 400, 102));
        assert_eq!(*index.lookup(40).unwrap(), first);
    }

    #[test]
    fn test_overlapping_windows_resolve_to_first_appended() {
        let mut index = LogIndex::new();
        index.append(entry(0, 100, 0));
        index.append(entry(50, 150, 51));
        assert_eq!(index.lookup(75).unwrap().file_offset, 0);
    }

    #[test]
    fn test_marker_metadata_serializes() {
        let marker = EventMarker {
            timestamp: 42,
            label: "CMD".to_string(),
            metadata: serde_json::json!({ "event": "cloud_reconnect" }),
        };
        let json = serde_json::to_string(&marker).unwrap();
        assert!(json.contains("cloud_reconnect"));
    }
}
