//! Core types for the OPERA Cloud bridge.
//!
//! This module provides foundational types used throughout the system:
//! - **IDs**: Strongly-typed identifiers (RequestId, HotelId)
//! - **Errors**: Application error types with thiserror derives
//! - **Config**: Configuration structures, loading, and startup validation

mod config;
mod errors;
mod ids;

pub use config::{
    AuthConfig, Config, Environment, HttpConfig, ObservabilityConfig, PRODUCTION_GATEWAY,
    TOKEN_PATH,
};
pub use errors::{Error, FailureKind, Result};
pub use ids::{HotelId, RequestId};
