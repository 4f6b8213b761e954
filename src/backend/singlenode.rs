//! Single-Node Backend Adapter
//!
//! Implements the `BackendClient` port for a non-clustered backend.
//! There is no tenant/vserver partitioning - the context reported on
//! records is the node name - and QoS policy groups are a cluster-only
//! feature, rejected here.

use crate::backend::inventory::InventoryState;
use crate::domain::ports::{
    BackendClient, BlockRange, LunProperties, RawInitiatorGroup, RawLunMapping, RawLunRecord,
    RawPoolRecord, TargetEndpoint,
};
use crate::error::{Error, Result};
use async_trait::async_trait;
use parking_lot::RwLock;
use tracing::info;

/// Configuration for the single-node adapter
#[derive(Debug, Clone)]
pub struct SingleNodeSettings {
    /// Management API endpoint
    pub endpoint: String,
    /// Management API login
    pub username: String,
    /// Management API password (should use secrets in production)
    pub password: String,
    /// Node name reported as the context on records
    pub node: String,
}

impl Default for SingleNodeSettings {
    fn default() -> Self {
        Self {
            endpoint: "https://127.0.0.1:8443".to_string(),
            username: "admin".to_string(),
            password: String::new(),
            node: "node1".to_string(),
        }
    }
}

/// Adapter for a single-node storage backend
pub struct SingleNodeBackend {
    settings: SingleNodeSettings,
    inventory: InventoryState,
    endpoints: RwLock<Vec<TargetEndpoint>>,
}

impl SingleNodeBackend {
    pub fn new(settings: SingleNodeSettings) -> Self {
        Self::with_inventory(settings, Vec::new())
    }

    pub fn with_inventory(settings: SingleNodeSettings, pools: Vec<RawPoolRecord>) -> Self {
        Self {
            settings,
            inventory: InventoryState::new(pools),
            endpoints: RwLock::new(Vec::new()),
        }
    }

    /// Seed a target endpoint
    pub fn add_target_endpoint(&self, endpoint: TargetEndpoint) {
        self.endpoints.write().push(endpoint);
    }
}

#[async_trait]
impl BackendClient for SingleNodeBackend {
    async fn create_lun(
        &self,
        pool: &str,
        name: &str,
        size_bytes: u64,
        properties: &LunProperties,
        qos_policy: Option<&str>,
    ) -> Result<()> {
        if qos_policy.is_some() {
            return Err(Error::BackendOperationFailed {
                backend: self.backend_name().to_string(),
                operation: "create_lun".into(),
                reason: "QoS policy groups require a clustered backend".into(),
            });
        }

        let record = RawLunRecord {
            context: self.settings.node.clone(),
            pool: pool.to_string(),
            qtree: String::new(),
            path: format!("/vol/{}/{}", pool, name),
            os_type: properties.os_type.clone(),
            size_bytes,
            space_reserved: properties.space_reserved,
        };
        self.inventory.create_lun(record).await
    }

    async fn clone_lun(
        &self,
        pool: &str,
        source_name: &str,
        new_name: &str,
        space_reserved: bool,
        _block_range: Option<BlockRange>,
    ) -> Result<()> {
        self.inventory
            .clone_lun(
                self.backend_name(),
                &format!("/vol/{}/{}", pool, source_name),
                &format!("/vol/{}/{}", pool, new_name),
                space_reserved,
            )
            .await
    }

    async fn destroy_lun(&self, path: &str) -> Result<()> {
        self.inventory.destroy_lun(path).await
    }

    async fn find_luns(&self, _context: Option<&str>, path: &str) -> Result<Vec<RawLunRecord>> {
        // No tenant partitioning on a single node; the context filter
        // does not apply.
        Ok(self.inventory.find_luns(None, path).await)
    }

    async fn initiator_groups(&self, _initiators: &[String]) -> Result<Vec<RawInitiatorGroup>> {
        Ok(Vec::new())
    }

    async fn lun_mappings(&self, _path: &str) -> Result<Vec<RawLunMapping>> {
        Ok(Vec::new())
    }

    async fn list_pools(&self) -> Result<Vec<RawPoolRecord>> {
        Ok(self.inventory.list_pools().await)
    }

    async fn target_endpoints(&self) -> Result<Vec<TargetEndpoint>> {
        Ok(self.endpoints.read().clone())
    }

    async fn notify_usage(&self, context: &str, driver_name: &str, version: &str) -> Result<()> {
        info!(context, driver_name, version, "usage notification sent");
        Ok(())
    }

    fn backend_name(&self) -> &str {
        "single-node"
    }
}
