//! REST API Server
//!
//! Serves the driver's REST surface with graceful shutdown.

use crate::api::rest::RestRouter;
use crate::driver::BlockDriver;
use crate::error::{Error, Result};
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::sync::broadcast;
use tracing::info;

// =============================================================================
// Server Configuration
// =============================================================================

/// Configuration for the API server
#[derive(Debug, Clone)]
pub struct ApiServerConfig {
    /// REST API bind address
    pub rest_addr: SocketAddr,
}

impl Default for ApiServerConfig {
    fn default() -> Self {
        Self {
            rest_addr: ([0, 0, 0, 0], 8090).into(),
        }
    }
}

// =============================================================================
// API Server
// =============================================================================

/// REST server over the block driver
pub struct ApiServer {
    config: ApiServerConfig,
    driver: Arc<BlockDriver>,
    shutdown_tx: broadcast::Sender<()>,
}

impl ApiServer {
    /// Create a new API server
    pub fn new(config: ApiServerConfig, driver: Arc<BlockDriver>) -> Self {
        let (shutdown_tx, _) = broadcast::channel(1);
        Self {
            config,
            driver,
            shutdown_tx,
        }
    }

    /// Signal the server to shut down
    pub fn shutdown(&self) {
        let _ = self.shutdown_tx.send(());
    }

    /// Run the server until shutdown is signaled
    pub async fn run(&self) -> Result<()> {
        let router = RestRouter::new(Arc::clone(&self.driver)).build();
        let listener = tokio::net::TcpListener::bind(self.config.rest_addr).await?;
        info!("REST API listening on {}", self.config.rest_addr);

        let mut shutdown_rx = self.shutdown_tx.subscribe();
        axum::serve(listener, router)
            .with_graceful_shutdown(async move {
                let _ = shutdown_rx.recv().await;
            })
            .await
            .map_err(|error| Error::Internal(format!("REST server error: {}", error)))?;

        info!("REST API shut down");
        Ok(())
    }
}
