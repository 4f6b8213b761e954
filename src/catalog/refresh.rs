//! Refresh Engine
//!
//! Rebuilds the catalog cache from the backend. Cold path: the first
//! populate is a synchronous full inventory scan that blocks its
//! caller. Warm path: once populated, a rescan triggered by staleness
//! is spawned onto the runtime and never blocks lifecycle operations
//! or stats reads.
//!
//! The backend has no cheap per-pool delta query, so every rescan is a
//! full `list_pools` scan. The drained invalidation set is consumed as
//! a staleness flag, not a work list: non-empty means a rescan is due.
//! Only one rescan runs at a time; a request arriving while one is in
//! flight is coalesced, and marks added during that rescan stay pending
//! for the next one.

use crate::catalog::cache::{Catalog, CatalogCache, StalePools};
use crate::catalog::pool::PoolKey;
use crate::domain::ports::BackendClientRef;
use crate::error::Result;
use std::sync::Arc;
use tracing::{debug, info, warn};

/// Keeps the catalog cache reasonably fresh without a full backend
/// re-scan on every mutation
pub struct RefreshEngine {
    backend: BackendClientRef,
    catalog: Arc<CatalogCache>,
    stale: Arc<StalePools>,
    /// Single-flight gate: at most one rescan at a time
    gate: tokio::sync::Mutex<()>,
}

impl RefreshEngine {
    pub fn new(
        backend: BackendClientRef,
        catalog: Arc<CatalogCache>,
        stale: Arc<StalePools>,
    ) -> Arc<Self> {
        Arc::new(Self {
            backend,
            catalog,
            stale,
            gate: tokio::sync::Mutex::new(()),
        })
    }

    /// The catalog cache this engine maintains
    pub fn catalog(&self) -> &Arc<CatalogCache> {
        &self.catalog
    }

    /// The invalidation set this engine drains
    pub fn stale(&self) -> &Arc<StalePools> {
        &self.stale
    }

    /// Record that a mutating operation touched a pool
    pub fn mark_stale(&self, key: PoolKey) {
        if self.stale.mark(key.clone()) {
            debug!(pool = %key, "pool marked stale");
        }
    }

    /// Make the catalog usable for a read
    ///
    /// Cold path: blocks on a full synchronous scan when the cache has
    /// never been populated, so callers that need guaranteed-fresh data
    /// can rely on the result. Warm path: if any pool is marked stale,
    /// schedules a deferred rescan and returns immediately; the caller
    /// reads whatever snapshot is currently installed.
    pub async fn ensure_fresh(self: Arc<Self>) -> Result<()> {
        if !self.catalog.is_populated() {
            debug!("catalog uninitialized, performing synchronous scan");
            return self.rescan().await;
        }

        if self.stale.is_dirty() {
            let engine = Arc::clone(&self);
            tokio::spawn(async move {
                if let Err(error) = engine.rescan_if_idle().await {
                    warn!(%error, "deferred catalog rescan failed");
                }
            });
        }

        Ok(())
    }

    /// Run a full rescan, waiting for any in-flight rescan to finish
    pub async fn rescan(&self) -> Result<()> {
        let _gate = self.gate.lock().await;
        self.rescan_locked().await
    }

    /// Run a full rescan unless one is already in flight
    ///
    /// A no-op when coalesced: the in-flight rescan picks up all
    /// staleness marked before its drain, and anything marked later
    /// stays pending for the next rescan.
    pub async fn rescan_if_idle(&self) -> Result<()> {
        match self.gate.try_lock() {
            Ok(_gate) => self.rescan_locked().await,
            Err(_) => {
                debug!("rescan already in flight, coalescing");
                Ok(())
            }
        }
    }

    async fn rescan_locked(&self) -> Result<()> {
        let drained = self.stale.drain();
        if !drained.is_empty() {
            debug!(pools = drained.len(), "draining stale pools for rescan");
        }

        match self.backend.list_pools().await {
            Ok(records) => {
                let catalog = Catalog::build(records);
                info!(pools = catalog.len(), "installed catalog snapshot");
                self.catalog.replace(catalog);
                Ok(())
            }
            Err(error) => {
                // The scan failed, so the drained pools are still
                // stale; put them back for the next attempt.
                for key in drained {
                    self.stale.mark(key);
                }
                Err(error)
            }
        }
    }
}
