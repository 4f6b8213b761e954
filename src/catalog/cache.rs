//! Catalog Cache and Invalidation Set
//!
//! The catalog is an immutable snapshot of the classified pool
//! inventory. `CatalogCache` holds the current snapshot behind a lock
//! and swaps it atomically on refresh; `StalePools` records pools
//! touched by mutating operations since the last reconciliation.
//!
//! Lifecycle operations never touch the catalog directly - they only
//! mark pools stale. The refresh engine is the single writer.

use crate::catalog::pool::{Capability, PoolInventory, PoolKey};
use crate::domain::ports::RawPoolRecord;
use chrono::{DateTime, Utc};
use indexmap::IndexMap;
use parking_lot::{Mutex, RwLock};
use std::collections::HashSet;
use std::sync::Arc;

// =============================================================================
// Catalog Snapshot
// =============================================================================

/// Immutable, fully-classified pool inventory snapshot
///
/// Classification sets are computed wholesale at build time and are
/// always subsets of `pools`. Each pool is in exactly one polarity per
/// capability axis.
#[derive(Debug)]
pub struct Catalog {
    /// All pools, keyed by identity, in backend inventory order
    pools: IndexMap<PoolKey, PoolInventory>,
    /// Pools mirrored to a partner
    mirrored: HashSet<PoolKey>,
    /// Pools with deduplication enabled
    dedup: HashSet<PoolKey>,
    /// Pools with inline compression enabled
    compression: HashSet<PoolKey>,
    /// Pools with no space guarantee
    thin: HashSet<PoolKey>,
    /// When this snapshot was built
    built_at: DateTime<Utc>,
}

impl Catalog {
    /// Build a catalog from a full raw inventory scan
    pub fn build(records: Vec<RawPoolRecord>) -> Self {
        let mut pools = IndexMap::with_capacity(records.len());
        let mut mirrored = HashSet::new();
        let mut dedup = HashSet::new();
        let mut compression = HashSet::new();
        let mut thin = HashSet::new();

        for record in &records {
            let inventory = PoolInventory::from_record(record);
            let key = inventory.key.clone();

            if inventory.mirrored {
                mirrored.insert(key.clone());
            }
            if inventory.dedup_enabled {
                dedup.insert(key.clone());
            }
            if inventory.compression_enabled {
                compression.insert(key.clone());
            }
            if inventory.thin_provisioned {
                thin.insert(key.clone());
            }

            pools.insert(key, inventory);
        }

        Self {
            pools,
            mirrored,
            dedup,
            compression,
            thin,
            built_at: Utc::now(),
        }
    }

    /// Number of pools in the snapshot
    pub fn len(&self) -> usize {
        self.pools.len()
    }

    /// Whether the snapshot holds no pools
    pub fn is_empty(&self) -> bool {
        self.pools.is_empty()
    }

    /// Iterate all pools in inventory order
    pub fn iter(&self) -> impl Iterator<Item = &PoolInventory> {
        self.pools.values()
    }

    /// Look up one pool by identity
    pub fn get(&self, key: &PoolKey) -> Option<&PoolInventory> {
        self.pools.get(key)
    }

    /// Whether the pool is a member of the given capability set
    pub fn in_capability_set(&self, key: &PoolKey, capability: Capability) -> bool {
        match capability {
            Capability::Mirrored => self.mirrored.contains(key),
            Capability::Dedup => self.dedup.contains(key),
            Capability::Compression => self.compression.contains(key),
            Capability::Thin => self.thin.contains(key),
        }
    }

    /// When this snapshot was built
    pub fn built_at(&self) -> DateTime<Utc> {
        self.built_at
    }
}

// =============================================================================
// Catalog Cache
// =============================================================================

/// Shared slot holding the current catalog snapshot
///
/// Starts uninitialized; `replace` installs a full snapshot under the
/// write lock. Readers clone the `Arc` and observe either the old or
/// the new catalog in full, never a partial mix. There is no path back
/// to uninitialized.
#[derive(Debug, Default)]
pub struct CatalogCache {
    inner: RwLock<Option<Arc<Catalog>>>,
}

impl CatalogCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Current snapshot, or `None` before the first refresh completes
    pub fn snapshot(&self) -> Option<Arc<Catalog>> {
        self.inner.read().clone()
    }

    /// Whether the cold-path populate has ever completed
    pub fn is_populated(&self) -> bool {
        self.inner.read().is_some()
    }

    /// Atomically install a freshly built snapshot
    pub fn replace(&self, catalog: Catalog) {
        *self.inner.write() = Some(Arc::new(catalog));
    }
}

// =============================================================================
// Invalidation Set
// =============================================================================

/// Set of pool identities touched by mutating operations since the
/// last reconciliation
///
/// `mark` and `drain` share one mutex, so no mark is lost and no pool
/// is drained twice for the same mutation. Marks arriving during or
/// after a drain accumulate for the next drain.
#[derive(Debug, Default)]
pub struct StalePools {
    inner: Mutex<HashSet<PoolKey>>,
}

impl StalePools {
    pub fn new() -> Self {
        Self::default()
    }

    /// Mark a pool stale; idempotent. Returns whether the pool was
    /// newly marked.
    pub fn mark(&self, key: PoolKey) -> bool {
        self.inner.lock().insert(key)
    }

    /// Atomically take the current set and clear it
    pub fn drain(&self) -> HashSet<PoolKey> {
        std::mem::take(&mut *self.inner.lock())
    }

    /// Whether any pool is currently marked stale
    pub fn is_dirty(&self) -> bool {
        !self.inner.lock().is_empty()
    }

    /// Number of pools currently marked stale
    pub fn len(&self) -> usize {
        self.inner.lock().len()
    }

    /// Whether the set is empty
    pub fn is_empty(&self) -> bool {
        !self.is_dirty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use std::thread;

    fn record(name: &str, mirrored: bool, thin: bool) -> RawPoolRecord {
        RawPoolRecord {
            name: name.into(),
            context: "svm1".into(),
            size_total_bytes: 1 << 30,
            size_available_bytes: 1 << 29,
            raid_type: "raid_dp".into(),
            disk_type: "SSD".into(),
            mirrored,
            dedup_enabled: false,
            compression_enabled: false,
            thin_provisioned: thin,
        }
    }

    #[test]
    fn test_catalog_classification_subsets() {
        let catalog = Catalog::build(vec![
            record("p1", true, false),
            record("p2", false, true),
            record("p3", false, false),
        ]);

        assert_eq!(catalog.len(), 3);
        // Every classified pool is also in the full set, with the
        // polarity matching its inventory flags.
        for pool in catalog.iter() {
            for capability in [
                Capability::Mirrored,
                Capability::Dedup,
                Capability::Compression,
                Capability::Thin,
            ] {
                assert_eq!(
                    catalog.in_capability_set(&pool.key, capability),
                    pool.has_capability(capability),
                );
            }
        }
        assert!(catalog.in_capability_set(&PoolKey::new("p1", "svm1"), Capability::Mirrored));
        assert!(!catalog.in_capability_set(&PoolKey::new("p2", "svm1"), Capability::Mirrored));
    }

    #[test]
    fn test_cache_starts_uninitialized() {
        let cache = CatalogCache::new();
        assert!(!cache.is_populated());
        assert!(cache.snapshot().is_none());
    }

    #[test]
    fn test_replace_is_wholesale() {
        let cache = CatalogCache::new();
        cache.replace(Catalog::build(vec![record("p1", false, false)]));
        let first = cache.snapshot().unwrap();
        assert_eq!(first.len(), 1);

        cache.replace(Catalog::build(vec![
            record("p1", false, false),
            record("p2", true, false),
        ]));
        let second = cache.snapshot().unwrap();
        assert_eq!(second.len(), 2);

        // The old snapshot is still internally consistent.
        assert_eq!(first.len(), 1);
        assert!(!first.in_capability_set(&PoolKey::new("p2", "svm1"), Capability::Mirrored));
    }

    #[test]
    fn test_reader_sees_old_or_new_snapshot_never_a_mix() {
        let cache = Arc::new(CatalogCache::new());
        cache.replace(Catalog::build(vec![record("p1", true, false)]));

        let reader = {
            let cache = Arc::clone(&cache);
            thread::spawn(move || {
                for _ in 0..1000 {
                    if let Some(snapshot) = cache.snapshot() {
                        // Classification must agree with the pool set of
                        // the same snapshot.
                        for pool in snapshot.iter() {
                            assert_eq!(
                                snapshot.in_capability_set(&pool.key, Capability::Mirrored),
                                pool.mirrored,
                            );
                        }
                    }
                }
            })
        };

        for i in 0..100 {
            let mirrored = i % 2 == 0;
            cache.replace(Catalog::build(vec![
                record("p1", mirrored, false),
                record("p2", !mirrored, true),
            ]));
        }

        reader.join().unwrap();
    }

    #[test]
    fn test_stale_mark_is_idempotent() {
        let stale = StalePools::new();
        assert!(stale.mark(PoolKey::new("p1", "svm1")));
        assert!(!stale.mark(PoolKey::new("p1", "svm1")));
        assert_eq!(stale.len(), 1);
    }

    #[test]
    fn test_drain_clears_and_preserves_later_marks() {
        let stale = StalePools::new();
        stale.mark(PoolKey::new("p1", "svm1"));
        stale.mark(PoolKey::new("p2", "svm1"));

        let drained = stale.drain();
        assert_eq!(drained.len(), 2);
        assert!(stale.is_empty());

        // A mark after the drain accumulates for the next drain.
        stale.mark(PoolKey::new("p3", "svm1"));
        let next = stale.drain();
        assert_eq!(next.len(), 1);
        assert!(next.contains(&PoolKey::new("p3", "svm1")));
    }

    #[test]
    fn test_no_mark_lost_under_concurrent_drain() {
        let stale = Arc::new(StalePools::new());
        let mut handles = Vec::new();

        // Writers mark distinct pools while a drainer repeatedly takes
        // the set. The union of drain outputs must equal the marks.
        for worker in 0..4 {
            let stale = Arc::clone(&stale);
            handles.push(thread::spawn(move || {
                for i in 0..250 {
                    stale.mark(PoolKey::new(format!("p{}-{}", worker, i), "svm1"));
                }
            }));
        }

        let drainer = {
            let stale = Arc::clone(&stale);
            thread::spawn(move || {
                let mut seen = HashSet::new();
                for _ in 0..50 {
                    seen.extend(stale.drain());
                }
                seen
            })
        };

        for handle in handles {
            handle.join().unwrap();
        }
        let mut seen = drainer.join().unwrap();
        seen.extend(stale.drain());

        assert_eq!(seen.len(), 4 * 250);
    }
}
