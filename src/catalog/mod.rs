//! Storage Pool Catalog
//!
//! An eventually-consistent, capability-classified cache of backend
//! pool inventory with invalidation tracking.
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────┐
//! │                      LUN Lifecycle Operations                    │
//! │              create / clone / delete  ──── mark stale           │
//! └───────────────┬─────────────────────────────────┬───────────────┘
//!                 │                                 │
//!         ┌───────┴────────┐               ┌────────┴────────┐
//!         │  StalePools    │── drain ─────▶│  RefreshEngine  │
//!         │  (mark/drain)  │               │  cold: blocking │
//!         └────────────────┘               │  warm: spawned  │
//!                                          └────────┬────────┘
//!                                                   │ replace
//!         ┌────────────────┐               ┌────────┴────────┐
//!         │ Stats          │◀── snapshot ──│  CatalogCache   │
//!         │ Aggregator     │               │  (Arc swap)     │
//!         └────────────────┘               └─────────────────┘
//! ```
//!
//! Mutations mark a pool stale; a stats-triggered or periodic refresh
//! drains the staleness flag and installs a freshly classified
//! snapshot; stats reads project whatever snapshot is installed.

pub mod cache;
pub mod pool;
pub mod refresh;
pub mod stats;

pub use cache::{Catalog, CatalogCache, StalePools};
pub use pool::{Capability, PoolInventory, PoolKey};
pub use refresh::RefreshEngine;
pub use stats::{pool_stats, round_down, PoolStats, BYTES_PER_GIB};
