//! Driver Configuration
//!
//! Connection parameters, the capacity de-rating multiplier, and the
//! refresh cadence. Loaded from CLI flags/environment in `main.rs` or
//! from a YAML file.

use crate::error::{Error, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Configuration for the block driver
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DriverConfig {
    /// Backend variant name (`cluster` or `single`)
    pub backend: String,
    /// Management API endpoint of the storage backend
    pub endpoint: String,
    /// Management API login
    pub username: String,
    /// Management API password (use secrets in production)
    pub password: String,
    /// Owning tenant/vserver context; required
    pub context: String,
    /// Storage protocol reported in driver stats (iscsi or fcp)
    pub protocol: String,
    /// Capacity de-rating factor applied before reporting pool sizes
    pub size_multiplier: f64,
    /// Interval of the periodic staleness check in seconds
    pub refresh_interval_secs: u64,
}

impl Default for DriverConfig {
    fn default() -> Self {
        Self {
            backend: "cluster".to_string(),
            endpoint: "https://127.0.0.1:8443".to_string(),
            username: "admin".to_string(),
            password: String::new(),
            context: String::new(),
            protocol: "iscsi".to_string(),
            size_multiplier: 1.2,
            refresh_interval_secs: 60,
        }
    }
}

impl DriverConfig {
    /// Load configuration from a YAML file
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let raw = std::fs::read_to_string(path)?;
        let config: Self = serde_yaml::from_str(&raw)?;
        Ok(config)
    }

    /// Validate required fields before the driver starts
    pub fn validate(&self) -> Result<()> {
        if self.context.is_empty() {
            return Err(Error::Configuration(
                "backend context (vserver) must be set".into(),
            ));
        }
        if self.size_multiplier <= 0.0 {
            return Err(Error::Configuration(format!(
                "size multiplier must be positive, got {}",
                self.size_multiplier
            )));
        }
        match self.protocol.as_str() {
            "iscsi" | "fcp" => {}
            other => {
                return Err(Error::Configuration(format!(
                    "unknown storage protocol: {}",
                    other
                )));
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;
    use std::io::Write;

    fn valid() -> DriverConfig {
        DriverConfig {
            context: "svm1".into(),
            ..DriverConfig::default()
        }
    }

    #[test]
    fn test_context_is_required() {
        let config = DriverConfig::default();
        assert_matches!(config.validate(), Err(Error::Configuration(_)));

        assert!(valid().validate().is_ok());
    }

    #[test]
    fn test_multiplier_must_be_positive() {
        let config = DriverConfig {
            size_multiplier: 0.0,
            ..valid()
        };
        assert_matches!(config.validate(), Err(Error::Configuration(_)));
    }

    #[test]
    fn test_protocol_must_be_known() {
        let config = DriverConfig {
            protocol: "nfs".into(),
            ..valid()
        };
        assert_matches!(config.validate(), Err(Error::Configuration(_)));
    }

    #[test]
    fn test_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(
            file,
            "context: svm9\nendpoint: https://cluster.example:8443\nsize_multiplier: 1.0"
        )
        .unwrap();

        let config = DriverConfig::from_file(file.path()).unwrap();
        assert_eq!(config.context, "svm9");
        assert_eq!(config.endpoint, "https://cluster.example:8443");
        assert_eq!(config.size_multiplier, 1.0);
        // Unspecified fields fall back to defaults.
        assert_eq!(config.refresh_interval_secs, 60);
        assert!(config.validate().is_ok());
    }
}
