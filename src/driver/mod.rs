//! Block Driver - LUN lifecycle entry points over the pool catalog
//!
//! `BlockDriver` is the surface exposed to volume-lifecycle callers and
//! placement logic: create/clone/delete LUNs, pool statistics, and
//! initiator-group/target resolution. Every mutating operation marks
//! its pool stale in the catalog after the backend confirms success;
//! reads trigger the refresh engine's cold or warm path as needed.

pub mod lun;
pub mod mapping;

pub use lun::{Lun, LunMetadata, LunTable};
pub use mapping::GROUP_PREFIX;

use crate::catalog::{pool_stats, CatalogCache, PoolKey, PoolStats, RefreshEngine, StalePools};
use crate::config::DriverConfig;
use crate::domain::ports::{BackendClientRef, BlockRange, LunProperties, TargetEndpoint};
use crate::error::{Error, Result};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{debug, info, warn};

/// Driver name reported in stats and usage telemetry
pub const DRIVER_NAME: &str = "blockd";

/// Vendor name reported in stats
pub const VENDOR_NAME: &str = "Blockd Project";

// =============================================================================
// Driver Stats
// =============================================================================

/// Driver-level statistics: identity plus the current pool list
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DriverStats {
    pub backend_name: String,
    pub vendor_name: String,
    pub driver_version: String,
    pub storage_protocol: String,
    pub pools: Vec<PoolStats>,
}

// =============================================================================
// Block Driver
// =============================================================================

/// Clustered block storage driver
pub struct BlockDriver {
    config: DriverConfig,
    backend: BackendClientRef,
    luns: LunTable,
    refresh: Arc<RefreshEngine>,
}

impl BlockDriver {
    /// Create a driver over the given backend client
    pub fn new(config: DriverConfig, backend: BackendClientRef) -> Arc<Self> {
        let catalog = Arc::new(CatalogCache::new());
        let stale = Arc::new(StalePools::new());
        let refresh = RefreshEngine::new(Arc::clone(&backend), catalog, stale);

        Arc::new(Self {
            config,
            backend,
            luns: LunTable::new(),
            refresh,
        })
    }

    /// Validate configuration and perform the cold catalog populate
    ///
    /// Blocks until the first full inventory scan completes, so
    /// capability checks made right after setup see fresh data.
    pub async fn setup(&self) -> Result<()> {
        self.config.validate()?;
        self.refresh.rescan().await?;
        info!(
            backend = self.backend.backend_name(),
            context = %self.config.context,
            pools = self.refresh.catalog().snapshot().map(|c| c.len()).unwrap_or(0),
            "driver setup complete"
        );
        Ok(())
    }

    /// The refresh engine driving this driver's catalog
    pub fn refresh_engine(&self) -> &Arc<RefreshEngine> {
        &self.refresh
    }

    /// The driver's LUN table
    pub fn luns(&self) -> &LunTable {
        &self.luns
    }

    /// Driver configuration
    pub fn config(&self) -> &DriverConfig {
        &self.config
    }

    fn pool_key(&self, pool: &str) -> PoolKey {
        PoolKey::new(pool, &self.config.context)
    }

    fn lun_path(&self, pool: &str, name: &str) -> String {
        format!("/vol/{}/{}", pool, name)
    }

    // =========================================================================
    // LUN Lifecycle
    // =========================================================================

    /// Create a LUN on the given pool
    ///
    /// Backend failures propagate unchanged; on success the pool is
    /// marked stale and the LUN is tracked locally.
    pub async fn create_lun(
        &self,
        pool: &str,
        name: &str,
        size_bytes: u64,
        properties: LunProperties,
        qos_policy: Option<&str>,
    ) -> Result<Lun> {
        self.backend
            .create_lun(pool, name, size_bytes, &properties, qos_policy)
            .await?;

        let metadata = LunMetadata {
            context: self.config.context.clone(),
            pool: pool.to_string(),
            qtree: String::new(),
            path: self.lun_path(pool, name),
            os_type: properties.os_type,
            space_reserved: properties.space_reserved,
        };
        let lun = Lun::new(name, size_bytes, metadata);
        self.luns.insert(lun.clone());

        self.refresh.mark_stale(self.pool_key(pool));
        info!(lun = name, pool, size_bytes, "created LUN");

        Ok(lun)
    }

    /// Clone a LUN under a new name within its pool
    ///
    /// The clone is always a full clone; a `block_range` is accepted
    /// but not honored. After the backend acknowledges the clone, the
    /// new LUN must be visible on lookup - zero matches surface as a
    /// distinct inconsistency error and nothing is registered.
    pub async fn clone_lun(
        &self,
        source_name: &str,
        new_name: &str,
        space_reserved: bool,
        block_range: Option<BlockRange>,
    ) -> Result<Lun> {
        let source = self.luns.get(source_name).ok_or_else(|| Error::LunNotFound {
            name: source_name.to_string(),
        })?;
        let pool = source.metadata.pool.clone();

        if block_range.is_some() {
            debug!(lun = source_name, "block range ignored, performing full clone");
        }
        self.backend
            .clone_lun(&pool, source_name, new_name, space_reserved, None)
            .await?;
        debug!(lun = source_name, clone = new_name, "cloned LUN");

        // Consistency check against eventual-visibility races: the
        // backend acknowledged the clone, so it must be findable.
        let path = self.lun_path(&pool, new_name);
        let records = self
            .backend
            .find_luns(Some(&self.config.context), &path)
            .await?;
        let record = records.first().ok_or_else(|| Error::CloneNotVisible {
            name: new_name.to_string(),
        })?;

        let clone = Lun::new(new_name, record.size_bytes, LunMetadata::from_record(record));
        self.luns.insert(clone.clone());

        // The clone shares the source pool.
        self.refresh.mark_stale(self.pool_key(&pool));

        Ok(clone)
    }

    /// Delete a LUN
    ///
    /// The owning pool is read from local metadata before deletion and
    /// marked stale afterwards. Deleting a LUN the driver never tracked
    /// is a no-op: nothing to destroy, no catalog effect.
    pub async fn delete_lun(&self, name: &str) -> Result<()> {
        let tracked = self.luns.get(name);
        let lun = match tracked {
            Some(lun) => lun,
            None => {
                warn!(lun = name, "delete of untracked LUN, skipping");
                return Ok(());
            }
        };

        self.backend.destroy_lun(&lun.metadata.path).await?;
        self.luns.remove(name);
        self.refresh.mark_stale(self.pool_key(&lun.metadata.pool));
        info!(lun = name, pool = %lun.metadata.pool, "deleted LUN");

        Ok(())
    }

    // =========================================================================
    // Stats
    // =========================================================================

    /// Per-pool statistics from the catalog
    ///
    /// Cold start blocks on the first full scan; afterwards a stale
    /// catalog schedules a deferred rescan and this call reports the
    /// currently installed snapshot. An uninitialized catalog yields an
    /// empty list.
    pub async fn pool_stats(&self) -> Result<Vec<PoolStats>> {
        Arc::clone(&self.refresh).ensure_fresh().await?;
        let snapshot = self.refresh.catalog().snapshot();
        Ok(pool_stats(snapshot.as_deref(), self.config.size_multiplier))
    }

    /// Driver-level statistics wrapper around the pool list
    ///
    /// Also fires usage telemetry; telemetry failures are logged and
    /// never affect the result.
    pub async fn driver_stats(&self) -> Result<DriverStats> {
        let pools = self.pool_stats().await?;

        let backend = Arc::clone(&self.backend);
        let context = self.config.context.clone();
        tokio::spawn(async move {
            if let Err(error) = backend
                .notify_usage(&context, DRIVER_NAME, env!("CARGO_PKG_VERSION"))
                .await
            {
                warn!(%error, "usage notification failed");
            }
        });

        Ok(DriverStats {
            backend_name: self.backend.backend_name().to_string(),
            vendor_name: VENDOR_NAME.to_string(),
            driver_version: env!("CARGO_PKG_VERSION").to_string(),
            storage_protocol: self.config.protocol.clone(),
            pools,
        })
    }

    // =========================================================================
    // Mapping / Targets
    // =========================================================================

    /// Find the driver-owned initiator group a tracked LUN is mapped to
    pub async fn mapped_lun_group(
        &self,
        name: &str,
        initiators: &[String],
    ) -> Result<Option<(String, u32)>> {
        let lun = self.luns.get(name).ok_or_else(|| Error::LunNotFound {
            name: name.to_string(),
        })?;
        mapping::mapped_lun_group(self.backend.as_ref(), &lun.metadata.path, initiators).await
    }

    /// Target endpoints exposed by the cluster
    ///
    /// `include_partner` is a no-op toggle, see [`mapping::target_endpoints`].
    pub async fn target_endpoints(&self, include_partner: bool) -> Result<Vec<TargetEndpoint>> {
        mapping::target_endpoints(self.backend.as_ref(), include_partner).await
    }
}
