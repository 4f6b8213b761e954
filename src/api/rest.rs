//! REST API Handlers
//!
//! Implements the REST endpoints for LUN lifecycle operations, pool
//! statistics, and target discovery.

use crate::catalog::PoolStats;
use crate::domain::ports::LunProperties;
use crate::driver::{BlockDriver, DriverStats, Lun};
use crate::error::{Error, Result};
use axum::{
    extract::{Json, Path, Query, State},
    http::StatusCode,
    response::IntoResponse,
    routing::{delete, get, post},
    Router,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use tracing::{error, info};

// =============================================================================
// Request/Response Types
// =============================================================================

/// LUN creation request
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateLunRequest {
    /// Name for the new LUN
    pub name: String,
    /// Target pool
    pub pool: String,
    /// Capacity (e.g., "100Gi", "1Ti")
    pub capacity: String,
    /// Multiprotocol OS type
    #[serde(default)]
    pub os_type: Option<String>,
    /// Reserve space up front
    #[serde(default)]
    pub space_reserved: Option<bool>,
    /// QoS policy group to attach
    #[serde(default)]
    pub qos_policy: Option<String>,
}

/// LUN clone request
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CloneLunRequest {
    /// Name for the clone
    pub new_name: String,
    /// Reserve space up front
    #[serde(default)]
    pub space_reserved: Option<bool>,
}

/// LUN info response
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LunResponse {
    pub handle: String,
    pub name: String,
    pub pool: String,
    pub path: String,
    pub size_bytes: u64,
    pub os_type: String,
    pub space_reserved: bool,
}

impl From<Lun> for LunResponse {
    fn from(lun: Lun) -> Self {
        Self {
            handle: lun.handle,
            name: lun.name,
            pool: lun.metadata.pool,
            path: lun.metadata.path,
            size_bytes: lun.size_bytes,
            os_type: lun.metadata.os_type,
            space_reserved: lun.metadata.space_reserved,
        }
    }
}

/// Target endpoint query parameters
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TargetQuery {
    /// Accepted for interface compatibility; has no effect
    #[serde(default)]
    pub include_partner: bool,
}

/// API error response
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ApiErrorResponse {
    pub error: String,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<String>,
}

// =============================================================================
// REST Router
// =============================================================================

/// REST API router builder
pub struct RestRouter {
    driver: Arc<BlockDriver>,
}

impl RestRouter {
    /// Create a new REST router
    pub fn new(driver: Arc<BlockDriver>) -> Self {
        Self { driver }
    }

    /// Build the Axum router
    pub fn build(self) -> Router {
        Router::new()
            // LUN lifecycle endpoints
            .route("/v1/luns", post(create_lun))
            .route("/v1/luns", get(list_luns))
            .route("/v1/luns/:name/clone", post(clone_lun))
            .route("/v1/luns/:name", delete(delete_lun))
            // Stats endpoints
            .route("/v1/pools/stats", get(pool_stats))
            .route("/v1/stats", get(driver_stats))
            // Target discovery
            .route("/v1/targets", get(target_endpoints))
            // Health endpoints
            .route("/health", get(health_check))
            .route("/ready", get(readiness_check))
            .layer(TraceLayer::new_for_http())
            .layer(CorsLayer::permissive())
            .with_state(self.driver)
    }
}

/// HTTP status for a driver error
fn error_status(error: &Error) -> StatusCode {
    match error {
        Error::LunNotFound { .. } | Error::PoolNotFound { .. } => StatusCode::NOT_FOUND,
        Error::LunExists { .. } => StatusCode::CONFLICT,
        Error::ApiValidation(_) | Error::CapacityParse(_) | Error::Configuration(_) => {
            StatusCode::BAD_REQUEST
        }
        Error::InsufficientCapacity { .. } => StatusCode::INSUFFICIENT_STORAGE,
        // The clone exists per the backend ack but is not yet visible;
        // the caller may retry the request.
        Error::CloneNotVisible { .. } => StatusCode::CONFLICT,
        Error::BackendUnavailable { .. } | Error::BackendConnection(_) => {
            StatusCode::SERVICE_UNAVAILABLE
        }
        _ => StatusCode::INTERNAL_SERVER_ERROR,
    }
}

fn error_response(kind: &str, error: Error) -> axum::response::Response {
    (
        error_status(&error),
        Json(ApiErrorResponse {
            error: kind.to_string(),
            message: error.to_string(),
            details: None,
        }),
    )
        .into_response()
}

// =============================================================================
// Handlers
// =============================================================================

/// Create a LUN
async fn create_lun(
    State(driver): State<Arc<BlockDriver>>,
    Json(request): Json<CreateLunRequest>,
) -> impl IntoResponse {
    info!(lun = %request.name, pool = %request.pool, "creating LUN");

    if request.name.is_empty() || request.pool.is_empty() {
        return error_response(
            "invalid_request",
            Error::ApiValidation("LUN name and pool must be non-empty".into()),
        );
    }

    let size_bytes = match parse_capacity(&request.capacity) {
        Ok(bytes) => bytes,
        Err(error) => return error_response("invalid_capacity", error),
    };

    let defaults = LunProperties::default();
    let properties = LunProperties {
        os_type: request.os_type.unwrap_or(defaults.os_type),
        space_reserved: request.space_reserved.unwrap_or(defaults.space_reserved),
    };

    match driver
        .create_lun(
            &request.pool,
            &request.name,
            size_bytes,
            properties,
            request.qos_policy.as_deref(),
        )
        .await
    {
        Ok(lun) => (StatusCode::CREATED, Json(LunResponse::from(lun))).into_response(),
        Err(error) => {
            error!(%error, lun = %request.name, "LUN create failed");
            error_response("create_failed", error)
        }
    }
}

/// List tracked LUNs
async fn list_luns(State(driver): State<Arc<BlockDriver>>) -> impl IntoResponse {
    let luns: Vec<LunResponse> = driver
        .luns()
        .all()
        .into_iter()
        .map(LunResponse::from)
        .collect();
    (StatusCode::OK, Json(luns))
}

/// Clone a LUN
async fn clone_lun(
    State(driver): State<Arc<BlockDriver>>,
    Path(name): Path<String>,
    Json(request): Json<CloneLunRequest>,
) -> impl IntoResponse {
    info!(lun = %name, clone = %request.new_name, "cloning LUN");

    match driver
        .clone_lun(
            &name,
            &request.new_name,
            request.space_reserved.unwrap_or(true),
            None,
        )
        .await
    {
        Ok(lun) => (StatusCode::CREATED, Json(LunResponse::from(lun))).into_response(),
        Err(error) => {
            error!(%error, lun = %name, "LUN clone failed");
            error_response("clone_failed", error)
        }
    }
}

/// Delete a LUN
async fn delete_lun(
    State(driver): State<Arc<BlockDriver>>,
    Path(name): Path<String>,
) -> impl IntoResponse {
    match driver.delete_lun(&name).await {
        Ok(()) => StatusCode::NO_CONTENT.into_response(),
        Err(error) => {
            error!(%error, lun = %name, "LUN delete failed");
            error_response("delete_failed", error)
        }
    }
}

/// Per-pool statistics
async fn pool_stats(State(driver): State<Arc<BlockDriver>>) -> impl IntoResponse {
    match driver.pool_stats().await {
        Ok(stats) => (StatusCode::OK, Json::<Vec<PoolStats>>(stats)).into_response(),
        Err(error) => error_response("pool_stats_failed", error),
    }
}

/// Driver-level statistics
async fn driver_stats(State(driver): State<Arc<BlockDriver>>) -> impl IntoResponse {
    match driver.driver_stats().await {
        Ok(stats) => (StatusCode::OK, Json::<DriverStats>(stats)).into_response(),
        Err(error) => error_response("driver_stats_failed", error),
    }
}

/// Target endpoints
async fn target_endpoints(
    State(driver): State<Arc<BlockDriver>>,
    Query(query): Query<TargetQuery>,
) -> impl IntoResponse {
    match driver.target_endpoints(query.include_partner).await {
        Ok(endpoints) => (StatusCode::OK, Json(endpoints)).into_response(),
        Err(error) => error_response("target_endpoints_failed", error),
    }
}

/// Health check
async fn health_check() -> impl IntoResponse {
    (StatusCode::OK, "ok")
}

/// Readiness check
async fn readiness_check(State(driver): State<Arc<BlockDriver>>) -> impl IntoResponse {
    // Ready once the cold-path populate has completed.
    if driver.refresh_engine().catalog().is_populated() {
        (StatusCode::OK, "ready")
    } else {
        (StatusCode::SERVICE_UNAVAILABLE, "catalog not populated")
    }
}

// =============================================================================
// Utility Functions
// =============================================================================

/// Parse capacity string (e.g., "100Gi", "1Ti") to bytes
fn parse_capacity(s: &str) -> Result<u64> {
    let s = s.trim();
    if s.is_empty() {
        return Err(Error::CapacityParse("empty capacity string".into()));
    }

    let mut num_end = 0;
    for (i, c) in s.char_indices() {
        if !c.is_ascii_digit() && c != '.' {
            num_end = i;
            break;
        }
        num_end = i + 1;
    }

    let num_str = &s[..num_end];
    let unit_str = s[num_end..].trim();

    let num: f64 = num_str
        .parse()
        .map_err(|_| Error::CapacityParse(format!("invalid number: {}", num_str)))?;

    let multiplier: u64 = match unit_str.to_uppercase().as_str() {
        "" | "B" => 1,
        "K" | "KB" | "KI" | "KIB" => 1024,
        "M" | "MB" | "MI" | "MIB" => 1024 * 1024,
        "G" | "GB" | "GI" | "GIB" => 1024 * 1024 * 1024,
        "T" | "TB" | "TI" | "TIB" => 1024 * 1024 * 1024 * 1024,
        _ => {
            return Err(Error::CapacityParse(format!("unknown unit: {}", unit_str)));
        }
    };

    Ok((num * multiplier as f64) as u64)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_capacity() {
        assert_eq!(parse_capacity("100").unwrap(), 100);
        assert_eq!(parse_capacity("100B").unwrap(), 100);
        assert_eq!(parse_capacity("1K").unwrap(), 1024);
        assert_eq!(parse_capacity("1Gi").unwrap(), 1024 * 1024 * 1024);
        assert_eq!(parse_capacity("10Gi").unwrap(), 10 * 1024 * 1024 * 1024);
        assert_eq!(parse_capacity("1T").unwrap(), 1024u64.pow(4));

        assert!(parse_capacity("").is_err());
        assert!(parse_capacity("abc").is_err());
        assert!(parse_capacity("100X").is_err());
    }

    #[test]
    fn test_error_status_mapping() {
        assert_eq!(
            error_status(&Error::LunNotFound { name: "l1".into() }),
            StatusCode::NOT_FOUND
        );
        assert_eq!(
            error_status(&Error::CloneNotVisible { name: "l2".into() }),
            StatusCode::CONFLICT
        );
        assert_eq!(
            error_status(&Error::CapacityParse("bad".into())),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            error_status(&Error::BackendUnavailable {
                backend: "cluster".into()
            }),
            StatusCode::SERVICE_UNAVAILABLE
        );
    }
}
