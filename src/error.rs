//! Error types for the blockd driver
//!
//! Structured error types for the catalog, LUN lifecycle operations,
//! backend adapters, and the REST surface.

use std::time::Duration;
use thiserror::Error;

/// Unified error type for the driver
#[derive(Error, Debug)]
pub enum Error {
    // =========================================================================
    // Internal Errors
    // =========================================================================
    #[error("Internal error: {0}")]
    Internal(String),

    #[error("Configuration error: {0}")]
    Configuration(String),

    // =========================================================================
    // Backend Errors
    // =========================================================================
    #[error("Backend unavailable: {backend}")]
    BackendUnavailable { backend: String },

    #[error("Backend operation failed: {backend} - {operation}: {reason}")]
    BackendOperationFailed {
        backend: String,
        operation: String,
        reason: String,
    },

    #[error("Backend connection error: {0}")]
    BackendConnection(#[from] reqwest::Error),

    /// Clone acknowledged by the backend but not visible on lookup.
    /// Carries the expected clone name so callers can retry the lookup
    /// at a higher layer.
    #[error("No cloned LUN named {name} found on the backend")]
    CloneNotVisible { name: String },

    // =========================================================================
    // LUN / Pool Errors
    // =========================================================================
    #[error("LUN not found: {name}")]
    LunNotFound { name: String },

    #[error("LUN already exists: {name}")]
    LunExists { name: String },

    #[error("Pool not found: {name}")]
    PoolNotFound { name: String },

    #[error("Insufficient capacity in pool {pool}: requested {requested} bytes, available {available} bytes")]
    InsufficientCapacity {
        pool: String,
        requested: u64,
        available: u64,
    },

    // =========================================================================
    // API Errors
    // =========================================================================
    #[error("API request validation failed: {0}")]
    ApiValidation(String),

    // =========================================================================
    // Parse Errors
    // =========================================================================
    #[error("Capacity parse error: {0}")]
    CapacityParse(String),

    #[error("JSON parse error: {0}")]
    JsonParse(#[from] serde_json::Error),

    #[error("Config parse error: {0}")]
    ConfigParse(#[from] serde_yaml::Error),

    // =========================================================================
    // IO Errors
    // =========================================================================
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Action a caller should take on error
///
/// The driver never retries internally; this classification tells the
/// caller (scheduler, API client) what to do with a failed operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorAction {
    /// Retry with exponential backoff
    RetryWithBackoff,
    /// Retry after a specific duration
    RetryAfter(Duration),
    /// Don't retry, the request must change
    NoRetry,
}

impl Error {
    /// Determine what action a caller should take for this error
    pub fn action(&self) -> ErrorAction {
        match self {
            // Transient connectivity issues - retry with backoff
            Error::BackendConnection(_) | Error::BackendUnavailable { .. } => {
                ErrorAction::RetryWithBackoff
            }

            // Eventual-visibility race on the backend - retry shortly
            Error::CloneNotVisible { .. } => ErrorAction::RetryAfter(Duration::from_secs(5)),

            // Capacity pressure - retry once placement may have changed
            Error::InsufficientCapacity { .. } => ErrorAction::RetryAfter(Duration::from_secs(60)),

            // Configuration/validation errors - the request itself is wrong
            Error::Configuration(_)
            | Error::ApiValidation(_)
            | Error::CapacityParse(_)
            | Error::LunExists { .. } => ErrorAction::NoRetry,

            // All other errors - retry with backoff
            _ => ErrorAction::RetryWithBackoff,
        }
    }

    /// Check if this error is retryable
    pub fn is_retryable(&self) -> bool {
        !matches!(self.action(), ErrorAction::NoRetry)
    }

    /// Check if this error is transient
    pub fn is_transient(&self) -> bool {
        matches!(
            self,
            Error::BackendConnection(_)
                | Error::BackendUnavailable { .. }
                | Error::CloneNotVisible { .. }
        )
    }
}

/// Result type alias for the driver
pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_actions() {
        let err = Error::CloneNotVisible {
            name: "lun-2".into(),
        };
        assert_eq!(err.action(), ErrorAction::RetryAfter(Duration::from_secs(5)));

        let err = Error::Configuration("missing context".into());
        assert_eq!(err.action(), ErrorAction::NoRetry);

        let err = Error::InsufficientCapacity {
            pool: "pool-1".into(),
            requested: 1000,
            available: 500,
        };
        assert_eq!(
            err.action(),
            ErrorAction::RetryAfter(Duration::from_secs(60))
        );
    }

    #[test]
    fn test_error_retryable() {
        let transient = Error::BackendUnavailable {
            backend: "cluster".into(),
        };
        assert!(transient.is_retryable());
        assert!(transient.is_transient());

        let config_err = Error::Configuration("invalid".into());
        assert!(!config_err.is_retryable());
        assert!(!config_err.is_transient());
    }

    #[test]
    fn test_clone_not_visible_message_names_expected_lun() {
        let err = Error::CloneNotVisible {
            name: "vol-clone".into(),
        };
        assert!(err.to_string().contains("vol-clone"));
    }
}
