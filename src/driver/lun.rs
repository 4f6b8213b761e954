//! LUN Metadata Tracking
//!
//! Local table of LUNs the driver has seen, keyed by the consumer-facing
//! name. Metadata is a read-only snapshot derived from a raw backend
//! record and re-derived on each backend query, never mutated in place.

use crate::domain::ports::RawLunRecord;
use chrono::{DateTime, Utc};
use dashmap::DashMap;
use serde::{Deserialize, Serialize};

// =============================================================================
// LUN Metadata
// =============================================================================

/// Read-only metadata snapshot for one LUN
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LunMetadata {
    /// Owning tenant/vserver context
    pub context: String,
    /// Pool (backend volume) hosting the LUN
    pub pool: String,
    /// Qtree the LUN lives in, empty if none
    pub qtree: String,
    /// Full backend path
    pub path: String,
    /// Multiprotocol OS type
    pub os_type: String,
    /// Whether space reservation is enabled
    pub space_reserved: bool,
}

impl LunMetadata {
    /// Derive metadata from a raw backend LUN record
    pub fn from_record(record: &RawLunRecord) -> Self {
        Self {
            context: record.context.clone(),
            pool: record.pool.clone(),
            qtree: record.qtree.clone(),
            path: record.path.clone(),
            os_type: record.os_type.clone(),
            space_reserved: record.space_reserved,
        }
    }

    /// Composite handle used to look the LUN up and trace it back to
    /// its owning pool: `context:path`
    pub fn handle(&self) -> String {
        format!("{}:{}", self.context, self.path)
    }
}

// =============================================================================
// Tracked LUN
// =============================================================================

/// A LUN tracked by the driver
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Lun {
    /// Composite handle (`context:path`)
    pub handle: String,
    /// Consumer-facing name
    pub name: String,
    /// Size in bytes
    pub size_bytes: u64,
    /// Backend metadata snapshot
    pub metadata: LunMetadata,
    /// When the driver first tracked this LUN
    pub tracked_at: DateTime<Utc>,
}

impl Lun {
    pub fn new(name: impl Into<String>, size_bytes: u64, metadata: LunMetadata) -> Self {
        Self {
            handle: metadata.handle(),
            name: name.into(),
            size_bytes,
            metadata,
            tracked_at: Utc::now(),
        }
    }
}

// =============================================================================
// LUN Table
// =============================================================================

/// Concurrent table of tracked LUNs, keyed by consumer-facing name
#[derive(Debug, Default)]
pub struct LunTable {
    luns: DashMap<String, Lun>,
}

impl LunTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Track a LUN, replacing any previous entry under the same name
    pub fn insert(&self, lun: Lun) {
        self.luns.insert(lun.name.clone(), lun);
    }

    /// Look up a tracked LUN by name
    pub fn get(&self, name: &str) -> Option<Lun> {
        self.luns.get(name).map(|entry| entry.value().clone())
    }

    /// The owning pool of a tracked LUN, if tracked
    pub fn pool_of(&self, name: &str) -> Option<String> {
        self.luns.get(name).map(|entry| entry.metadata.pool.clone())
    }

    /// Stop tracking a LUN; returns the evicted entry if present
    pub fn remove(&self, name: &str) -> Option<Lun> {
        self.luns.remove(name).map(|(_, lun)| lun)
    }

    /// Whether a LUN is tracked under this name
    pub fn contains(&self, name: &str) -> bool {
        self.luns.contains_key(name)
    }

    /// Number of tracked LUNs
    pub fn len(&self) -> usize {
        self.luns.len()
    }

    /// Whether the table is empty
    pub fn is_empty(&self) -> bool {
        self.luns.is_empty()
    }

    /// Snapshot of all tracked LUNs
    pub fn all(&self) -> Vec<Lun> {
        self.luns.iter().map(|entry| entry.value().clone()).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn metadata(pool: &str, name: &str) -> LunMetadata {
        LunMetadata {
            context: "svm1".into(),
            pool: pool.into(),
            qtree: String::new(),
            path: format!("/vol/{}/{}", pool, name),
            os_type: "linux".into(),
            space_reserved: true,
        }
    }

    #[test]
    fn test_handle_is_context_and_path() {
        let meta = metadata("pool1", "lun1");
        assert_eq!(meta.handle(), "svm1:/vol/pool1/lun1");
    }

    #[test]
    fn test_table_tracks_and_evicts() {
        let table = LunTable::new();
        table.insert(Lun::new("lun1", 1 << 30, metadata("pool1", "lun1")));

        assert!(table.contains("lun1"));
        assert_eq!(table.pool_of("lun1").as_deref(), Some("pool1"));
        assert_eq!(table.len(), 1);

        let evicted = table.remove("lun1").unwrap();
        assert_eq!(evicted.name, "lun1");
        assert!(table.is_empty());
        assert!(table.pool_of("lun1").is_none());
    }

    #[test]
    fn test_insert_replaces_previous_entry() {
        let table = LunTable::new();
        table.insert(Lun::new("lun1", 1 << 30, metadata("pool1", "lun1")));
        table.insert(Lun::new("lun1", 2 << 30, metadata("pool2", "lun1")));

        assert_eq!(table.len(), 1);
        assert_eq!(table.pool_of("lun1").as_deref(), Some("pool2"));
        assert_eq!(table.get("lun1").unwrap().size_bytes, 2 << 30);
    }

    #[test]
    fn test_metadata_rederived_from_record() {
        let record = crate::domain::ports::RawLunRecord {
            context: "svm1".into(),
            pool: "pool1".into(),
            qtree: "q1".into(),
            path: "/vol/pool1/q1/lun1".into(),
            os_type: "vmware".into(),
            size_bytes: 42,
            space_reserved: false,
        };
        let meta = LunMetadata::from_record(&record);

        assert_eq!(meta.pool, "pool1");
        assert_eq!(meta.qtree, "q1");
        assert_eq!(meta.os_type, "vmware");
        assert!(!meta.space_reserved);
    }
}
