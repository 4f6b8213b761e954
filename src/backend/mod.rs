//! Backend Adapters
//!
//! Implementations of the `BackendClient` port:
//! - Cluster-mode: tenant/vserver-scoped requests, QoS support
//! - Single-node: flat namespace, no QoS
//!
//! The catalog and lifecycle engines are written once against the port;
//! picking a variant here is the only place the difference shows.

pub mod cluster;
mod inventory;
pub mod singlenode;

pub use cluster::{ClusterBackend, ClusterSettings};
pub use singlenode::{SingleNodeBackend, SingleNodeSettings};

use crate::config::DriverConfig;
use crate::domain::ports::BackendClientRef;
use crate::error::{Error, Result};
use std::sync::Arc;

/// Factory for creating backend adapters
pub struct BackendFactory;

impl BackendFactory {
    /// Create a backend adapter from the driver configuration
    pub fn create(config: &DriverConfig) -> Result<BackendClientRef> {
        match config.backend.to_lowercase().as_str() {
            "cluster" => Ok(Arc::new(ClusterBackend::new(ClusterSettings {
                endpoint: config.endpoint.clone(),
                username: config.username.clone(),
                password: config.password.clone(),
                context: config.context.clone(),
            }))),
            "single" | "single-node" => {
                Ok(Arc::new(SingleNodeBackend::new(SingleNodeSettings {
                    endpoint: config.endpoint.clone(),
                    username: config.username.clone(),
                    password: config.password.clone(),
                    node: config.context.clone(),
                })))
            }
            other => Err(Error::BackendUnavailable {
                backend: other.to_string(),
            }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;

    #[test]
    fn test_factory_creates_known_variants() {
        let mut config = DriverConfig {
            context: "svm1".into(),
            ..DriverConfig::default()
        };

        config.backend = "cluster".into();
        assert_eq!(
            BackendFactory::create(&config).unwrap().backend_name(),
            "cluster"
        );

        config.backend = "single".into();
        assert_eq!(
            BackendFactory::create(&config).unwrap().backend_name(),
            "single-node"
        );
    }

    #[test]
    fn test_factory_rejects_unknown_variant() {
        let config = DriverConfig {
            backend: "tape".into(),
            context: "svm1".into(),
            ..DriverConfig::default()
        };
        assert_matches!(
            BackendFactory::create(&config),
            Err(Error::BackendUnavailable { .. })
        );
    }
}
