//! Application error types.
//!
//! All errors use `thiserror` for automatic Error trait derivation and provide
//! clear error messages with context. Only `Config` is process-fatal; every
//! other variant is turned into a per-invocation failure by the bridge.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Application result type.
pub type Result<T> = std::result::Result<T, Error>;

/// Main error enum for the OPERA Cloud bridge.
#[derive(Error, Debug)]
pub enum Error {
    /// Missing or invalid startup configuration (fatal).
    #[error("configuration error: {0}")]
    Config(String),

    /// Credential exchange failed after the retry budget.
    #[error("authentication error: {cause}")]
    Auth { cause: String, transient: bool },

    /// Invocation named a tool that is not registered.
    #[error("unknown tool: {0}")]
    UnknownTool(String),

    /// Argument validation failed.
    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    /// Upstream returned 2xx with a body that does not match the expected shape.
    #[error("malformed response: {0}")]
    MalformedResponse(String),

    /// Transport failure or non-2xx after exhausting retries.
    #[error("upstream error: {message}")]
    Upstream {
        message: String,
        status: Option<u16>,
        retryable: bool,
    },

    /// Serialization/deserialization errors.
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// HTTP client construction or transport errors.
    #[error("http error: {0}")]
    Http(#[from] reqwest::Error),

    /// I/O errors.
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

/// Stable failure vocabulary exposed to MCP clients.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FailureKind {
    Config,
    Auth,
    UnknownTool,
    InvalidArgument,
    MalformedResponse,
    Upstream,
}

impl FailureKind {
    pub fn as_str(self) -> &'static str {
        match self {
            FailureKind::Config => "config",
            FailureKind::Auth => "auth",
            FailureKind::UnknownTool => "unknown_tool",
            FailureKind::InvalidArgument => "invalid_argument",
            FailureKind::MalformedResponse => "malformed_response",
            FailureKind::Upstream => "upstream",
        }
    }
}

impl std::fmt::Display for FailureKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl Error {
    /// Map to the stable MCP failure vocabulary.
    pub fn failure_kind(&self) -> FailureKind {
        match self {
            Error::Config(_) => FailureKind::Config,
            Error::Auth { .. } => FailureKind::Auth,
            Error::UnknownTool(_) => FailureKind::UnknownTool,
            Error::InvalidArgument(_) => FailureKind::InvalidArgument,
            Error::MalformedResponse(_) | Error::Serialization(_) => {
                FailureKind::MalformedResponse
            }
            Error::Upstream { .. } | Error::Http(_) | Error::Io(_) => FailureKind::Upstream,
        }
    }

    /// Whether the MCP client may usefully re-issue the call.
    pub fn is_retryable(&self) -> bool {
        match self {
            Error::Auth { transient, .. } => *transient,
            Error::Upstream { retryable, .. } => *retryable,
            Error::Http(e) => e.is_timeout() || e.is_connect(),
            Error::Io(_) => true,
            Error::Config(_)
            | Error::UnknownTool(_)
            | Error::InvalidArgument(_)
            | Error::MalformedResponse(_)
            | Error::Serialization(_) => false,
        }
    }

    /// Last upstream HTTP status, if one was observed.
    pub fn status(&self) -> Option<u16> {
        match self {
            Error::Upstream { status, .. } => *status,
            Error::Http(e) => e.status().map(|s| s.as_u16()),
            _ => None,
        }
    }

    /// JSON-RPC error code for errors that cross the protocol boundary.
    pub fn to_jsonrpc_code(&self) -> i32 {
        match self {
            Error::InvalidArgument(_) | Error::UnknownTool(_) => -32602,
            Error::Serialization(_) => -32700,
            _ => -32603,
        }
    }
}

// Convenience constructors
impl Error {
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config(msg.into())
    }

    pub fn auth(cause: impl Into<String>, transient: bool) -> Self {
        Self::Auth {
            cause: cause.into(),
            transient,
        }
    }

    pub fn unknown_tool(name: impl Into<String>) -> Self {
        Self::UnknownTool(name.into())
    }

    pub fn invalid_argument(msg: impl Into<String>) -> Self {
        Self::InvalidArgument(msg.into())
    }

    pub fn malformed_response(msg: impl Into<String>) -> Self {
        Self::MalformedResponse(msg.into())
    }

    pub fn upstream(msg: impl Into<String>, status: Option<u16>, retryable: bool) -> Self {
        Self::Upstream {
            message: msg.into(),
            status,
            retryable,
        }
    }
}
