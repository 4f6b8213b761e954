//! Pool Statistics Aggregation
//!
//! Projects a catalog snapshot into the externally reported per-pool
//! statistics: capacity normalized to gibibytes (de-rated by the
//! configured size multiplier, rounded down so capacity is never
//! over-reported) and capability tags as paired booleans derived from
//! classification membership.

use crate::catalog::cache::Catalog;
use crate::catalog::pool::Capability;
use serde::{Deserialize, Serialize};

/// Bytes per gibibyte
pub const BYTES_PER_GIB: f64 = (1u64 << 30) as f64;

/// Round a value down to two decimal places
///
/// Truncation, not nearest: reported capacity must never exceed what
/// the backend actually has.
pub fn round_down(value: f64) -> f64 {
    (value * 100.0).floor() / 100.0
}

// =============================================================================
// Pool Stats Entry
// =============================================================================

/// Externally reported statistics for one pool
///
/// Capability tags come in pairs (`mirrored`/`unmirrored`, ...) so
/// consumers needing either polarity can filter directly. Both sides
/// are derived from the same classification membership and can never
/// disagree.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PoolStats {
    /// Pool name
    pub pool_name: String,
    /// Owning tenant/vserver context
    pub context: String,
    /// Total capacity in GiB, de-rated and rounded down
    pub total_capacity_gb: f64,
    /// Free capacity in GiB, de-rated and rounded down
    pub free_capacity_gb: f64,
    /// RAID type of the backing aggregate
    pub raid_type: String,
    /// Disk type of the backing aggregate
    pub disk_type: String,
    /// The backend does not report QoS capability
    pub qos_support: bool,
    /// The backend does not report a reserved percentage
    pub reserved_percentage: u8,
    pub mirrored: bool,
    pub unmirrored: bool,
    pub dedup: bool,
    pub nodedup: bool,
    pub compression: bool,
    pub nocompression: bool,
    pub thin_provisioned: bool,
    pub thick_provisioned: bool,
}

/// Project a catalog snapshot into reported pool statistics
///
/// An uninitialized catalog yields an empty list, not an error -
/// callers must tolerate zero pools during cold start.
pub fn pool_stats(catalog: Option<&Catalog>, size_multiplier: f64) -> Vec<PoolStats> {
    let catalog = match catalog {
        Some(catalog) => catalog,
        None => return Vec::new(),
    };

    catalog
        .iter()
        .map(|pool| {
            let total = pool.size_total_bytes as f64 / size_multiplier / BYTES_PER_GIB;
            let free = pool.size_available_bytes as f64 / size_multiplier / BYTES_PER_GIB;

            let mirrored = catalog.in_capability_set(&pool.key, Capability::Mirrored);
            let dedup = catalog.in_capability_set(&pool.key, Capability::Dedup);
            let compression = catalog.in_capability_set(&pool.key, Capability::Compression);
            let thin = catalog.in_capability_set(&pool.key, Capability::Thin);

            PoolStats {
                pool_name: pool.key.name.clone(),
                context: pool.key.context.clone(),
                total_capacity_gb: round_down(total),
                free_capacity_gb: round_down(free),
                raid_type: pool.raid_type.clone(),
                disk_type: pool.disk_type.clone(),
                qos_support: false,
                reserved_percentage: 0,
                mirrored,
                unmirrored: !mirrored,
                dedup,
                nodedup: !dedup,
                compression,
                nocompression: !compression,
                thin_provisioned: thin,
                thick_provisioned: !thin,
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::ports::RawPoolRecord;

    fn record(name: &str, total: u64, available: u64) -> RawPoolRecord {
        RawPoolRecord {
            name: name.into(),
            context: "svm1".into(),
            size_total_bytes: total,
            size_available_bytes: available,
            raid_type: "raid_dp".into(),
            disk_type: "SSD".into(),
            mirrored: true,
            dedup_enabled: false,
            compression_enabled: true,
            thin_provisioned: false,
        }
    }

    #[test]
    fn test_round_down_truncates() {
        assert_eq!(round_down(10.0), 10.00);
        assert_eq!(round_down(10.005), 10.00);
        assert_eq!(round_down(10.019), 10.01);
        assert_eq!(round_down(10.999), 10.99);
        assert_eq!(round_down(0.001), 0.00);
    }

    #[test]
    fn test_uninitialized_catalog_yields_empty_list() {
        assert!(pool_stats(None, 1.0).is_empty());
    }

    #[test]
    fn test_capacity_normalization() {
        // 10 GiB exactly, multiplier 1.0
        let catalog = Catalog::build(vec![record("p1", 1_073_741_824 * 10, 1_073_741_824 * 4)]);
        let stats = pool_stats(Some(&catalog), 1.0);

        assert_eq!(stats.len(), 1);
        assert_eq!(stats[0].total_capacity_gb, 10.00);
        assert_eq!(stats[0].free_capacity_gb, 4.00);
    }

    #[test]
    fn test_size_multiplier_derates_capacity() {
        // 12 GiB de-rated by 1.2 reports 10 GiB
        let catalog = Catalog::build(vec![record("p1", 1_073_741_824 * 12, 1_073_741_824 * 6)]);
        let stats = pool_stats(Some(&catalog), 1.2);

        assert_eq!(stats[0].total_capacity_gb, 10.00);
        assert_eq!(stats[0].free_capacity_gb, 5.00);
    }

    #[test]
    fn test_fractional_capacity_rounds_down() {
        // 10.759... GiB must report 10.75, not 10.76
        let bytes = (10.7591 * BYTES_PER_GIB) as u64;
        let catalog = Catalog::build(vec![record("p1", bytes, bytes / 2)]);
        let stats = pool_stats(Some(&catalog), 1.0);

        assert_eq!(stats[0].total_capacity_gb, 10.75);
    }

    #[test]
    fn test_capability_tags_are_paired_negations() {
        let catalog = Catalog::build(vec![record("p1", 1 << 30, 1 << 29)]);
        let stats = pool_stats(Some(&catalog), 1.0);
        let entry = &stats[0];

        assert!(entry.mirrored);
        assert!(!entry.unmirrored);
        assert!(!entry.dedup);
        assert!(entry.nodedup);
        assert!(entry.compression);
        assert!(!entry.nocompression);
        assert!(!entry.thin_provisioned);
        assert!(entry.thick_provisioned);

        assert_eq!(entry.mirrored, !entry.unmirrored);
        assert_eq!(entry.dedup, !entry.nodedup);
        assert_eq!(entry.compression, !entry.nocompression);
        assert_eq!(entry.thin_provisioned, !entry.thick_provisioned);
    }

    #[test]
    fn test_fixed_constants() {
        let catalog = Catalog::build(vec![record("p1", 1 << 30, 1 << 29)]);
        let stats = pool_stats(Some(&catalog), 1.0);

        assert!(!stats[0].qos_support);
        assert_eq!(stats[0].reserved_percentage, 0);
    }

    #[test]
    fn test_stats_preserve_inventory_order() {
        let catalog = Catalog::build(vec![
            record("pz", 1 << 30, 1 << 29),
            record("pa", 1 << 30, 1 << 29),
            record("pm", 1 << 30, 1 << 29),
        ]);
        let stats = pool_stats(Some(&catalog), 1.0);
        let names: Vec<_> = stats.iter().map(|s| s.pool_name.as_str()).collect();

        assert_eq!(names, vec!["pz", "pa", "pm"]);
    }
}
