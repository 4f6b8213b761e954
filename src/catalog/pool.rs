//! Pool Inventory Model
//!
//! In-memory representation of one backend storage pool: identity,
//! capacity, and capability flags, derived from a raw inventory record.
//! Entries are rebuilt wholesale on every catalog refresh.

use crate::domain::ports::RawPoolRecord;
use serde::{Deserialize, Serialize};

// =============================================================================
// Pool Key
// =============================================================================

/// Identity of a pool: name plus owning context
///
/// Two pools with the same name in different contexts are distinct.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct PoolKey {
    /// Pool name
    pub name: String,
    /// Owning tenant/vserver context
    pub context: String,
}

impl PoolKey {
    pub fn new(name: impl Into<String>, context: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            context: context.into(),
        }
    }
}

impl std::fmt::Display for PoolKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}:{}", self.context, self.name)
    }
}

// =============================================================================
// Pool Inventory
// =============================================================================

/// Capability axes a pool is classified on
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Capability {
    Mirrored,
    Dedup,
    Compression,
    Thin,
}

impl std::fmt::Display for Capability {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Capability::Mirrored => write!(f, "mirrored"),
            Capability::Dedup => write!(f, "dedup"),
            Capability::Compression => write!(f, "compression"),
            Capability::Thin => write!(f, "thin"),
        }
    }
}

/// Inventory entry for one storage pool
///
/// Identity is stable across refreshes as long as the backend still
/// reports the pool. Capability membership is computed from the flags
/// here, never stored independently.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PoolInventory {
    /// Pool identity
    pub key: PoolKey,
    /// Total size in raw backend bytes
    pub size_total_bytes: u64,
    /// Available size in raw backend bytes
    pub size_available_bytes: u64,
    /// RAID type of the backing aggregate
    pub raid_type: String,
    /// Disk type of the backing aggregate
    pub disk_type: String,
    /// Mirrored to a partner aggregate
    pub mirrored: bool,
    /// Deduplication enabled
    pub dedup_enabled: bool,
    /// Inline compression enabled
    pub compression_enabled: bool,
    /// No space guarantee
    pub thin_provisioned: bool,
}

impl PoolInventory {
    /// Derive an inventory entry from a raw backend record
    pub fn from_record(record: &RawPoolRecord) -> Self {
        Self {
            key: PoolKey::new(&record.name, &record.context),
            size_total_bytes: record.size_total_bytes,
            size_available_bytes: record.size_available_bytes,
            raid_type: record.raid_type.clone(),
            disk_type: record.disk_type.clone(),
            mirrored: record.mirrored,
            dedup_enabled: record.dedup_enabled,
            compression_enabled: record.compression_enabled,
            thin_provisioned: record.thin_provisioned,
        }
    }

    /// Whether this pool has the given capability
    pub fn has_capability(&self, capability: Capability) -> bool {
        match capability {
            Capability::Mirrored => self.mirrored,
            Capability::Dedup => self.dedup_enabled,
            Capability::Compression => self.compression_enabled,
            Capability::Thin => self.thin_provisioned,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(name: &str) -> RawPoolRecord {
        RawPoolRecord {
            name: name.into(),
            context: "svm1".into(),
            size_total_bytes: 1024,
            size_available_bytes: 512,
            raid_type: "raid_dp".into(),
            disk_type: "SAS".into(),
            mirrored: true,
            dedup_enabled: false,
            compression_enabled: true,
            thin_provisioned: false,
        }
    }

    #[test]
    fn test_pool_key_identity() {
        let a = PoolKey::new("pool1", "svm1");
        let b = PoolKey::new("pool1", "svm1");
        let c = PoolKey::new("pool1", "svm2");

        assert_eq!(a, b);
        assert_ne!(a, c);
        assert_eq!(a.to_string(), "svm1:pool1");
    }

    #[test]
    fn test_inventory_from_record() {
        let inv = PoolInventory::from_record(&record("pool1"));
        assert_eq!(inv.key, PoolKey::new("pool1", "svm1"));
        assert!(inv.has_capability(Capability::Mirrored));
        assert!(!inv.has_capability(Capability::Dedup));
        assert!(inv.has_capability(Capability::Compression));
        assert!(!inv.has_capability(Capability::Thin));
    }
}
