//! Domain Ports - Core trait definitions for the blockd driver
//!
//! These traits define the boundary between the driver's catalog and
//! lifecycle logic and the storage cluster it manages. Backend adapters
//! implement these traits to provide concrete functionality.

use crate::error::Result;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::sync::Arc;

// =============================================================================
// Raw Backend Records
// =============================================================================

/// Raw inventory record for one backend storage pool
///
/// One entry per pool as reported by a full inventory scan. Capacity is
/// in raw backend bytes; capability flags come straight off the pool's
/// efficiency and guarantee settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RawPoolRecord {
    /// Pool name, unique within its context
    pub name: String,
    /// Owning tenant/vserver context
    pub context: String,
    /// Total size in bytes
    pub size_total_bytes: u64,
    /// Available size in bytes
    pub size_available_bytes: u64,
    /// RAID type of the backing aggregate
    pub raid_type: String,
    /// Disk type of the backing aggregate
    pub disk_type: String,
    /// Whether the pool is mirrored to a partner
    pub mirrored: bool,
    /// Whether deduplication is enabled
    pub dedup_enabled: bool,
    /// Whether inline compression is enabled
    pub compression_enabled: bool,
    /// Whether the pool has no space guarantee (thin)
    pub thin_provisioned: bool,
}

/// Raw record for one LUN as reported by the backend
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RawLunRecord {
    /// Owning tenant/vserver context
    pub context: String,
    /// Pool (backend volume) hosting the LUN
    pub pool: String,
    /// Qtree the LUN lives in, empty if none
    pub qtree: String,
    /// Full backend path, e.g. `/vol/pool1/lun1`
    pub path: String,
    /// Multiprotocol OS type
    pub os_type: String,
    /// Size in bytes
    pub size_bytes: u64,
    /// Whether space reservation is enabled
    pub space_reserved: bool,
}

/// Raw record for an initiator group
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RawInitiatorGroup {
    /// Group name
    pub name: String,
    /// Group protocol type (iscsi, fcp, mixed)
    pub group_type: String,
    /// OS type of the group
    pub os_type: String,
    /// Member initiator IDs
    pub initiators: Vec<String>,
}

/// Raw record for a LUN-to-initiator-group mapping
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RawLunMapping {
    /// Mapped initiator group name
    pub initiator_group: String,
    /// LUN ID within the group
    pub lun_id: u32,
    /// Backend path of the mapped LUN
    pub path: String,
}

/// A target endpoint exposed by the cluster
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TargetEndpoint {
    /// Worldwide port name of the target port
    pub wwpn: String,
    /// Node hosting the port
    pub node: String,
}

/// Block range for a sub-LUN clone request
///
/// Accepted on the wire for interface compatibility; the clone
/// primitive in this driver always performs a full clone.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize)]
pub struct BlockRange {
    pub src_block: u64,
    pub dest_block: u64,
    pub block_count: u64,
}

/// Properties supplied when creating a LUN
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LunProperties {
    /// Multiprotocol OS type for the new LUN
    pub os_type: String,
    /// Whether to reserve space up front
    pub space_reserved: bool,
}

impl Default for LunProperties {
    fn default() -> Self {
        Self {
            os_type: "linux".to_string(),
            space_reserved: true,
        }
    }
}

// =============================================================================
// Backend Client Port
// =============================================================================

/// Port for the storage cluster management API
///
/// The driver's catalog and lifecycle engines are written once against
/// this trait; cluster-mode and single-node adapters implement it.
/// Communication failures are propagated unchanged - retry policy
/// belongs to the caller.
#[async_trait]
pub trait BackendClient: Send + Sync {
    /// Create a LUN on the given pool
    async fn create_lun(
        &self,
        pool: &str,
        name: &str,
        size_bytes: u64,
        properties: &LunProperties,
        qos_policy: Option<&str>,
    ) -> Result<()>;

    /// Clone a LUN within its pool
    ///
    /// `block_range` is accepted for interface compatibility but the
    /// clone is always a full clone.
    async fn clone_lun(
        &self,
        pool: &str,
        source_name: &str,
        new_name: &str,
        space_reserved: bool,
        block_range: Option<BlockRange>,
    ) -> Result<()>;

    /// Destroy the LUN at the given backend path
    async fn destroy_lun(&self, path: &str) -> Result<()>;

    /// Find LUNs by path, optionally restricted to a context
    ///
    /// Returns an empty list when nothing matches.
    async fn find_luns(&self, context: Option<&str>, path: &str) -> Result<Vec<RawLunRecord>>;

    /// Get initiator groups containing any of the given initiators
    async fn initiator_groups(&self, initiators: &[String]) -> Result<Vec<RawInitiatorGroup>>;

    /// Get mappings for the LUN at the given path
    async fn lun_mappings(&self, path: &str) -> Result<Vec<RawLunMapping>>;

    /// Full pool inventory scan
    async fn list_pools(&self) -> Result<Vec<RawPoolRecord>>;

    /// Target endpoints exposed by the cluster
    async fn target_endpoints(&self) -> Result<Vec<TargetEndpoint>>;

    /// Fire-and-forget usage telemetry, not part of correctness
    async fn notify_usage(&self, context: &str, driver_name: &str, version: &str) -> Result<()>;

    /// Check if the backend is reachable
    async fn health_check(&self) -> Result<bool> {
        Ok(true)
    }

    /// Get backend name
    fn backend_name(&self) -> &str;
}

/// Type alias for an Arc'd backend client
pub type BackendClientRef = Arc<dyn BackendClient>;

impl std::fmt::Debug for dyn BackendClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BackendClient")
            .field("backend_name", &self.backend_name())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_lun_properties_default() {
        let props = LunProperties::default();
        assert_eq!(props.os_type, "linux");
        assert!(props.space_reserved);
    }

    #[test]
    fn test_raw_pool_record_roundtrip() {
        let record = RawPoolRecord {
            name: "pool1".into(),
            context: "svm1".into(),
            size_total_bytes: 10_737_418_240,
            size_available_bytes: 5_368_709_120,
            raid_type: "raid_dp".into(),
            disk_type: "SSD".into(),
            mirrored: false,
            dedup_enabled: true,
            compression_enabled: false,
            thin_provisioned: true,
        };
        let json = serde_json::to_string(&record).unwrap();
        let back: RawPoolRecord = serde_json::from_str(&json).unwrap();
        assert_eq!(back, record);
    }
}
