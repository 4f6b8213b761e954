//! Domain layer - Port definitions and raw backend records
//!
//! This module defines the core traits (ports) that backend adapters
//! implement, following hexagonal architecture principles.

pub mod ports;

pub use ports::*;
