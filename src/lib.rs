//! blockd - Clustered Block Storage Driver
//!
//! A block-storage driver daemon that provisions LUNs on the pools of a
//! clustered storage backend and maintains an eventually-consistent,
//! capability-classified catalog of pool inventory for placement and
//! capacity reporting.
//!
//! # Architecture
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────────────┐
//! │                          REST API (axum)                          │
//! │     /v1/luns   /v1/pools/stats   /v1/stats   /v1/targets          │
//! ├──────────────────────────────────────────────────────────────────┤
//! │                          Block Driver                             │
//! │   create / clone / delete LUNs      pool + driver statistics      │
//! │            │                               │                      │
//! │       mark stale                      ensure fresh                │
//! │            ▼                               ▼                      │
//! │   ┌────────────────┐   drain    ┌──────────────────┐              │
//! │   │   StalePools   │──────────▶ │  RefreshEngine   │              │
//! │   └────────────────┘            │ cold: blocking   │              │
//! │                                 │ warm: deferred   │              │
//! │   ┌────────────────┐  replace   └──────────────────┘              │
//! │   │  CatalogCache  │◀───────────────────┘                         │
//! │   └────────────────┘                                              │
//! ├──────────────────────────────────────────────────────────────────┤
//! │                       Backend Adapters                            │
//! │        Cluster-mode (vserver-scoped)      Single-node             │
//! └──────────────────────────────────────────────────────────────────┘
//! ```
//!
//! # Modules
//!
//! - [`catalog`]: Pool catalog cache, invalidation set, refresh engine,
//!   stats aggregation
//! - [`driver`]: LUN lifecycle entry points and metadata tracking
//! - [`backend`]: Backend adapters implementing the client port
//! - [`domain`]: Port definitions and raw backend records
//! - [`api`]: REST surface
//! - [`error`]: Error types and handling

pub mod api;
pub mod backend;
pub mod catalog;
pub mod config;
pub mod domain;
pub mod driver;
pub mod error;

// Re-export commonly used types
pub use api::{ApiServer, ApiServerConfig, RestRouter};

pub use backend::{BackendFactory, ClusterBackend, ClusterSettings, SingleNodeBackend,
    SingleNodeSettings};

pub use catalog::{
    pool_stats, round_down, Capability, Catalog, CatalogCache, PoolInventory, PoolKey, PoolStats,
    RefreshEngine, StalePools,
};

pub use config::DriverConfig;

pub use domain::ports::{
    BackendClient, BackendClientRef, BlockRange, LunProperties, RawInitiatorGroup, RawLunMapping,
    RawLunRecord, RawPoolRecord, TargetEndpoint,
};

pub use driver::{BlockDriver, DriverStats, Lun, LunMetadata, LunTable, DRIVER_NAME, VENDOR_NAME};

pub use error::{Error, ErrorAction, Result};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Library name
pub const NAME: &str = env!("CARGO_PKG_NAME");
