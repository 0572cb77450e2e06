//! Minimal MCP surface: JSON-RPC framing, tool listing and dispatch.

pub mod builtins;
pub mod protocol;
pub mod server;

pub use builtins::{BuiltinTool, SERVER_NAME, SERVER_VERSION};
pub use protocol::{
    CallToolParams, CallToolResult, Content, JsonRpcError, JsonRpcRequest, JsonRpcResponse,
    ToolInfo,
};
pub use server::McpServer;
