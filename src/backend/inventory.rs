//! Shared in-memory backend inventory
//!
//! Both backend adapters track cluster state here while the management
//! wire protocol lives outside this crate. Capacity accounting follows
//! the backend's behavior: creating or cloning a LUN draws the LUN's
//! size from its pool's available bytes, destroying returns it.

use crate::domain::ports::{RawLunRecord, RawPoolRecord};
use crate::error::{Error, Result};
use indexmap::IndexMap;
use std::collections::BTreeMap;
use tokio::sync::RwLock;

/// In-memory pool and LUN state for a backend adapter
#[derive(Debug, Default)]
pub(crate) struct InventoryState {
    /// Pools by name, in inventory order
    pools: RwLock<IndexMap<String, RawPoolRecord>>,
    /// LUN records by backend path
    luns: RwLock<BTreeMap<String, RawLunRecord>>,
}

impl InventoryState {
    pub(crate) fn new(pools: Vec<RawPoolRecord>) -> Self {
        let pools = pools
            .into_iter()
            .map(|record| (record.name.clone(), record))
            .collect();
        Self {
            pools: RwLock::new(pools),
            luns: RwLock::new(BTreeMap::new()),
        }
    }

    pub(crate) async fn list_pools(&self) -> Vec<RawPoolRecord> {
        self.pools.read().await.values().cloned().collect()
    }

    /// Reserve capacity and record a new LUN
    pub(crate) async fn create_lun(&self, record: RawLunRecord) -> Result<()> {
        let mut pools = self.pools.write().await;
        let pool = pools
            .get_mut(&record.pool)
            .ok_or_else(|| Error::PoolNotFound {
                name: record.pool.clone(),
            })?;

        if pool.size_available_bytes < record.size_bytes {
            return Err(Error::InsufficientCapacity {
                pool: record.pool.clone(),
                requested: record.size_bytes,
                available: pool.size_available_bytes,
            });
        }

        let mut luns = self.luns.write().await;
        if luns.contains_key(&record.path) {
            return Err(Error::LunExists {
                name: record.path.clone(),
            });
        }

        pool.size_available_bytes -= record.size_bytes;
        luns.insert(record.path.clone(), record);
        Ok(())
    }

    /// Copy an existing LUN record under a new path
    pub(crate) async fn clone_lun(
        &self,
        backend: &str,
        source_path: &str,
        new_path: &str,
        space_reserved: bool,
    ) -> Result<()> {
        let source = {
            let luns = self.luns.read().await;
            luns.get(source_path)
                .cloned()
                .ok_or_else(|| Error::BackendOperationFailed {
                    backend: backend.to_string(),
                    operation: "clone_lun".into(),
                    reason: format!("no source LUN at {}", source_path),
                })?
        };

        let clone = RawLunRecord {
            path: new_path.to_string(),
            space_reserved,
            ..source
        };

        self.create_lun(clone).await
    }

    /// Remove a LUN record and return its capacity to the pool
    pub(crate) async fn destroy_lun(&self, path: &str) -> Result<()> {
        let record = self
            .luns
            .write()
            .await
            .remove(path)
            .ok_or_else(|| Error::LunNotFound {
                name: path.to_string(),
            })?;

        if let Some(pool) = self.pools.write().await.get_mut(&record.pool) {
            pool.size_available_bytes += record.size_bytes;
        }
        Ok(())
    }

    /// LUN records matching a path, optionally filtered by context
    pub(crate) async fn find_luns(&self, context: Option<&str>, path: &str) -> Vec<RawLunRecord> {
        self.luns
            .read()
            .await
            .values()
            .filter(|record| record.path == path)
            .filter(|record| context.map_or(true, |context| record.context == context))
            .cloned()
            .collect()
    }
}
