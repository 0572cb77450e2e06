//! # OPERA Cloud MCP
//!
//! Bridges MCP tool calls from AI agents to the OPERA Cloud hospitality
//! REST API:
//! - OAuth2 client-credentials tokens with single-flight refresh
//! - A declarative catalogue of tools mapped onto REST endpoints
//! - A request bridge that validates, authenticates, retries and maps errors
//! - A newline-delimited JSON-RPC server speaking the MCP tool subset
//!
//! ## Architecture
//!
//! ```text
//!   agent ── tools/call ──▶ McpServer ──▶ RequestBridge ──▶ OPERA Cloud
//!                                │            │   ▲
//!                                │            ▼   │ bearer
//!                                │        ToolRegistry
//!                                └──────▶ TokenManager ──▶ token endpoint
//! ```

// Enforce strict safety at compile time
#![deny(unsafe_code)]
#![warn(missing_debug_implementations)]
#![warn(rust_2018_idioms)]

pub mod auth;
pub mod bridge;
pub mod mcp;
pub mod tools;
pub mod types;

// Internal utilities
pub mod observability;
pub mod retry;
pub mod validation;

#[cfg(feature = "mcp-stdio")]
pub mod liveness;

pub use types::{Config, Error, Result};
