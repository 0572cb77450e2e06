//! Invocation input and tagged outcome.

use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

use crate::types::{Error, FailureKind};

/// One tool call: a tool name and its argument map.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ToolInvocation {
    pub tool_name: String,
    /// Expected to be a JSON object; `null` is treated as `{}`.
    #[serde(default)]
    pub arguments: Value,
}

impl ToolInvocation {
    pub fn new(tool_name: impl Into<String>, arguments: Value) -> Self {
        Self {
            tool_name: tool_name.into(),
            arguments,
        }
    }
}

/// Outcome of an invocation. Only this crosses the bridge boundary.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum ToolResult {
    Success {
        payload: Value,
    },
    Failure {
        kind: FailureKind,
        message: String,
        retryable: bool,
        /// Last upstream HTTP status observed, if any.
        #[serde(skip_serializing_if = "Option::is_none")]
        status: Option<u16>,
        /// Outbound resource calls made, including the replay after a 401.
        attempts: u32,
    },
}

impl ToolResult {
    pub fn success(payload: Value) -> Self {
        ToolResult::Success { payload }
    }

    pub fn from_error(err: &Error, attempts: u32) -> Self {
        ToolResult::Failure {
            kind: err.failure_kind(),
            message: err.to_string(),
            retryable: err.is_retryable(),
            status: err.status(),
            attempts,
        }
    }

    pub fn is_success(&self) -> bool {
        matches!(self, ToolResult::Success { .. })
    }

    pub fn failure_kind(&self) -> Option<FailureKind> {
        match self {
            ToolResult::Success { .. } => None,
            ToolResult::Failure { kind, .. } => Some(*kind),
        }
    }

    pub fn is_retryable(&self) -> bool {
        matches!(self, ToolResult::Failure { retryable: true, .. })
    }

    pub fn status(&self) -> Option<u16> {
        match self {
            ToolResult::Success { .. } => None,
            ToolResult::Failure { status, .. } => *status,
        }
    }

    /// Payload on success, `{"error": {...}}` on failure.
    pub fn to_structured(&self) -> Value {
        match self {
            ToolResult::Success { payload } => payload.clone(),
            ToolResult::Failure {
                kind,
                message,
                retryable,
                status,
                attempts,
            } => json!({
                "error": {
                    "kind": kind,
                    "message": message,
                    "retryable": retryable,
                    "status": status,
                    "attempts": attempts,
                }
            }),
        }
    }
}
