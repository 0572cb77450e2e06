//! Server-level tools answered without touching the gateway.

use chrono::Utc;
use serde_json::{json, Value};

use super::protocol::ToolInfo;
use crate::auth::{TokenManager, TokenState};
use crate::bridge::{RequestBridge, ToolResult};
use crate::tools::HealthStatus;

pub const SERVER_NAME: &str = "opera-cloud-mcp";
pub const SERVER_VERSION: &str = env!("CARGO_PKG_VERSION");

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BuiltinTool {
    HealthCheck,
    GetAuthStatus,
    ValidateAuthCredentials,
    GetServerInfo,
}

impl BuiltinTool {
    pub const ALL: [BuiltinTool; 4] = [
        BuiltinTool::HealthCheck,
        BuiltinTool::GetAuthStatus,
        BuiltinTool::ValidateAuthCredentials,
        BuiltinTool::GetServerInfo,
    ];

    pub fn name(self) -> &'static str {
        match self {
            BuiltinTool::HealthCheck => "health_check",
            BuiltinTool::GetAuthStatus => "get_auth_status",
            BuiltinTool::ValidateAuthCredentials => "validate_auth_credentials",
            BuiltinTool::GetServerInfo => "get_server_info",
        }
    }

    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|b| b.name() == name)
    }

    fn description(self) -> &'static str {
        match self {
            BuiltinTool::HealthCheck => {
                "Report authentication state and per-tool health of the OPERA Cloud bridge."
            }
            BuiltinTool::GetAuthStatus => "Report the cached OAuth token state.",
            BuiltinTool::ValidateAuthCredentials => {
                "Perform a fresh token exchange to verify the configured credentials."
            }
            BuiltinTool::GetServerInfo => "Describe this server and its configuration.",
        }
    }

    pub fn info(self) -> ToolInfo {
        ToolInfo {
            name: self.name().to_string(),
            description: self.description().to_string(),
            input_schema: json!({
                "type": "object",
                "properties": {},
                "additionalProperties": false,
            }),
        }
    }

    pub async fn call(self, bridge: &RequestBridge, tokens: &TokenManager) -> ToolResult {
        match self {
            BuiltinTool::HealthCheck => ToolResult::success(health_check(bridge, tokens).await),
            BuiltinTool::GetAuthStatus => ToolResult::success(json!({
                "auth": tokens.status().await,
                "client_id": tokens.credential().masked_client_id(),
                "environment": tokens.credential().environment().as_str(),
            })),
            BuiltinTool::ValidateAuthCredentials => {
                ToolResult::success(validate_credentials(tokens).await)
            }
            BuiltinTool::GetServerInfo => ToolResult::success(server_info(bridge, tokens)),
        }
    }
}

async fn health_check(bridge: &RequestBridge, tokens: &TokenManager) -> Value {
    let auth = tokens.status().await;
    let tools = bridge.health_report().await;

    let auth_healthy = matches!(auth.state, TokenState::Valid | TokenState::ExpiringSoon)
        || auth.last_error.is_none();
    let status = if auth_healthy {
        tools.status
    } else {
        HealthStatus::Unhealthy
    };

    json!({
        "status": status,
        "timestamp": Utc::now().to_rfc3339(),
        "version": SERVER_VERSION,
        "auth": auth,
        "tools": tools,
    })
}

async fn validate_credentials(tokens: &TokenManager) -> Value {
    match tokens.validate_credentials().await {
        Ok(token) => json!({
            "valid": true,
            "expires_in_secs": token.remaining().as_secs(),
            "generation": token.generation(),
        }),
        Err(err) => json!({
            "valid": false,
            "kind": err.failure_kind(),
            "error": err.to_string(),
        }),
    }
}

fn server_info(bridge: &RequestBridge, tokens: &TokenManager) -> Value {
    let credential = tokens.credential();
    json!({
        "name": SERVER_NAME,
        "version": SERVER_VERSION,
        "environment": credential.environment().as_str(),
        "base_url": bridge.base_url().as_str(),
        "token_url": credential.token_endpoint().as_str(),
        "client_id": credential.masked_client_id(),
        "default_hotel_id": bridge.default_hotel_id(),
        "tool_count": bridge.registry().len() + BuiltinTool::ALL.len(),
    })
}
