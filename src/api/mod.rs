//! REST API surface for volume-lifecycle callers

pub mod rest;
pub mod server;

pub use rest::{
    ApiErrorResponse, CloneLunRequest, CreateLunRequest, LunResponse, RestRouter, TargetQuery,
};
pub use server::{ApiServer, ApiServerConfig};
