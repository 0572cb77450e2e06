//! MCP server loop: line reader, per-call tasks, single writer.

use serde_json::{json, Value};
use std::collections::HashMap;
use std::io;
use std::sync::Arc;
use tokio::io::{AsyncBufReadExt, AsyncRead, AsyncWrite, AsyncWriteExt, BufReader};
use tokio::sync::{mpsc, Mutex};
use tokio::task::AbortHandle;
use tokio_util::sync::CancellationToken;

use super::builtins::{BuiltinTool, SERVER_NAME, SERVER_VERSION};
use super::protocol::{
    negotiate_version, CallToolParams, CallToolResult, CancelledParams, JsonRpcError,
    JsonRpcRequest, JsonRpcResponse, ToolInfo,
};
use crate::auth::{TokenManager, TokenProvider};
use crate::bridge::{BridgeSettings, RequestBridge, ToolInvocation};
use crate::tools::ToolRegistry;
use crate::types::{Config, Error, Result};

/// Responses queued for the writer before callers wait.
const OUTBOUND_QUEUE: usize = 64;

/// Running `tools/call` tasks keyed by the JSON text of their request id.
type InFlight = Arc<Mutex<HashMap<String, AbortHandle>>>;

#[derive(Debug)]
struct Context {
    bridge: Arc<RequestBridge>,
    tokens: TokenManager,
}

impl Context {
    async fn call_tool(&self, params: CallToolParams) -> CallToolResult {
        let result = match BuiltinTool::from_name(&params.name) {
            Some(builtin) => builtin.call(&self.bridge, &self.tokens).await,
            None => {
                self.bridge
                    .invoke(ToolInvocation::new(params.name, params.arguments))
                    .await
            }
        };
        CallToolResult::from(&result)
    }

    fn list_tools(&self) -> Vec<ToolInfo> {
        let default_hotel = self.bridge.default_hotel_id().is_some();
        self.bridge
            .registry()
            .list_tools()
            .iter()
            .map(|tool| ToolInfo {
                name: tool.name.clone(),
                description: tool.description.clone(),
                input_schema: tool.input_schema(default_hotel),
            })
            .chain(BuiltinTool::ALL.into_iter().map(BuiltinTool::info))
            .collect()
    }
}

/// MCP server over newline-delimited JSON-RPC.
#[derive(Debug)]
pub struct McpServer {
    ctx: Arc<Context>,
    cancel: CancellationToken,
}

impl McpServer {
    pub fn new(bridge: Arc<RequestBridge>, tokens: TokenManager) -> Self {
        for builtin in BuiltinTool::ALL {
            if bridge.registry().contains(builtin.name()) {
                tracing::warn!(tool = builtin.name(), "registry tool shadowed by built-in");
            }
        }
        Self {
            ctx: Arc::new(Context { bridge, tokens }),
            cancel: CancellationToken::new(),
        }
    }

    /// Wire the OPERA catalogue, token manager and bridge from a validated config.
    pub fn from_config(config: &Config) -> Result<Self> {
        let tokens = TokenManager::from_config(config)?;
        let registry = Arc::new(ToolRegistry::opera()?);
        let provider: Arc<dyn TokenProvider> = Arc::new(tokens.clone());
        let bridge = RequestBridge::new(registry, provider, BridgeSettings::from_config(config)?)?;
        Ok(Self::new(Arc::new(bridge), tokens))
    }

    pub fn bridge(&self) -> &RequestBridge {
        &self.ctx.bridge
    }

    pub fn cancellation_token(&self) -> CancellationToken {
        self.cancel.clone()
    }

    /// Request graceful shutdown.
    pub fn shutdown(&self) {
        self.cancel.cancel();
    }

    /// `tools/list` entries: catalogue order, then built-ins.
    pub fn list_tools(&self) -> Vec<ToolInfo> {
        self.ctx.list_tools()
    }

    pub async fn call_tool(&self, params: CallToolParams) -> CallToolResult {
        self.ctx.call_tool(params).await
    }

    pub async fn serve_stdio(&self) -> io::Result<()> {
        self.serve(tokio::io::stdin(), tokio::io::stdout()).await
    }

    /// Serve until input closes or the server is cancelled.
    ///
    /// On EOF, running calls finish and their responses are flushed before
    /// returning. On cancellation, running calls are aborted.
    pub async fn serve<R, W>(&self, reader: R, writer: W) -> io::Result<()>
    where
        R: AsyncRead + Unpin,
        W: AsyncWrite + Unpin + Send + 'static,
    {
        let (tx, rx) = mpsc::channel(OUTBOUND_QUEUE);
        let writer_task = tokio::spawn(write_responses(writer, rx));
        let in_flight: InFlight = Arc::default();
        let mut reader = BufReader::new(reader);
        let mut line = String::new();

        tracing::info!(tools = self.ctx.bridge.registry().len(), "MCP server ready");

        loop {
            line.clear();
            tokio::select! {
                _ = self.cancel.cancelled() => {
                    tracing::info!("MCP server shutting down");
                    abort_all(&in_flight).await;
                    break;
                }
                read = reader.read_line(&mut line) => {
                    let read = match read {
                        Ok(n) => n,
                        Err(e) => {
                            abort_all(&in_flight).await;
                            return Err(e);
                        }
                    };
                    if read == 0 {
                        tracing::info!("client closed input");
                        break;
                    }
                    let trimmed = line.trim();
                    if trimmed.is_empty() {
                        continue;
                    }
                    self.dispatch(trimmed, &tx, &in_flight).await;
                }
            }
        }

        drop(tx);
        writer_task.await.map_err(io::Error::other)?
    }

    async fn dispatch(
        &self,
        line: &str,
        tx: &mpsc::Sender<JsonRpcResponse>,
        in_flight: &InFlight,
    ) {
        let request: JsonRpcRequest = match serde_json::from_str(line) {
            Ok(request) => request,
            Err(e) => {
                tracing::warn!(error = %e, "unparseable message");
                send(tx, JsonRpcResponse::error(None, JsonRpcError::parse_error(format!("Parse error: {}", e)))).await;
                return;
            }
        };

        let Some(id) = request.id.clone() else {
            self.handle_notification(&request, in_flight).await;
            return;
        };

        if request.jsonrpc != "2.0" {
            send(
                tx,
                JsonRpcResponse::error(
                    Some(id),
                    JsonRpcError::invalid_request(format!("unsupported jsonrpc version: {}", request.jsonrpc)),
                ),
            )
            .await;
            return;
        }

        tracing::debug!(method = %request.method, id = %id, "request");

        let response = match request.method.as_str() {
            "initialize" => JsonRpcResponse::success(Some(id), initialize_result(&request.params)),
            "ping" => JsonRpcResponse::success(Some(id), json!({})),
            "tools/list" => JsonRpcResponse::success(
                Some(id),
                json!({ "tools": self.ctx.list_tools() }),
            ),
            "tools/call" => {
                match serde_json::from_value::<CallToolParams>(request.params) {
                    Ok(params) => self.spawn_call(id, params, tx, in_flight).await,
                    Err(e) => {
                        let err = Error::invalid_argument(format!("tools/call params: {}", e));
                        send(tx, JsonRpcResponse::error(Some(id), JsonRpcError::from(&err))).await
                    }
                }
                return;
            }
            other => JsonRpcResponse::error(Some(id), JsonRpcError::method_not_found(other)),
        };
        send(tx, response).await;
    }

    async fn spawn_call(
        &self,
        id: Value,
        params: CallToolParams,
        tx: &mpsc::Sender<JsonRpcResponse>,
        in_flight: &InFlight,
    ) {
        let key = id.to_string();
        let ctx = Arc::clone(&self.ctx);
        let tx = tx.clone();
        let registry = Arc::clone(in_flight);
        let task_key = key.clone();

        // Held across spawn so the task cannot deregister before it is registered.
        let mut running = in_flight.lock().await;
        let handle = tokio::spawn(async move {
            let result = ctx.call_tool(params).await;
            registry.lock().await.remove(&task_key);
            let response = match serde_json::to_value(&result) {
                Ok(value) => JsonRpcResponse::success(Some(id), value),
                Err(e) => JsonRpcResponse::error(Some(id), JsonRpcError::internal_error(e.to_string())),
            };
            send(&tx, response).await;
        });
        if running.insert(key, handle.abort_handle()).is_some() {
            tracing::warn!("duplicate request id for in-flight tools/call");
        }
    }

    async fn handle_notification(&self, request: &JsonRpcRequest, in_flight: &InFlight) {
        match request.method.as_str() {
            "notifications/initialized" => tracing::debug!("client initialized"),
            "notifications/cancelled" => {
                let params = match serde_json::from_value::<CancelledParams>(request.params.clone()) {
                    Ok(params) => params,
                    Err(e) => {
                        tracing::warn!(error = %e, "malformed cancellation");
                        return;
                    }
                };
                let key = params.request_id.to_string();
                match in_flight.lock().await.remove(&key) {
                    Some(handle) => {
                        handle.abort();
                        tracing::info!(
                            request_id = %key,
                            reason = params.reason.as_deref().unwrap_or(""),
                            "tool call cancelled"
                        );
                    }
                    None => tracing::debug!(request_id = %key, "cancellation for unknown request"),
                }
            }
            other => tracing::debug!(method = other, "ignoring notification"),
        }
    }
}

fn initialize_result(params: &Value) -> Value {
    let requested = params.get("protocolVersion").and_then(Value::as_str);
    json!({
        "protocolVersion": negotiate_version(requested),
        "serverInfo": {
            "name": SERVER_NAME,
            "version": SERVER_VERSION,
        },
        "capabilities": {
            "tools": { "listChanged": false }
        }
    })
}

async fn send(tx: &mpsc::Sender<JsonRpcResponse>, response: JsonRpcResponse) {
    if tx.send(response).await.is_err() {
        tracing::debug!("writer closed, response dropped");
    }
}

async fn abort_all(in_flight: &InFlight) {
    for (_, handle) in in_flight.lock().await.drain() {
        handle.abort();
    }
}

async fn write_responses<W>(mut writer: W, mut rx: mpsc::Receiver<JsonRpcResponse>) -> io::Result<()>
where
    W: AsyncWrite + Unpin,
{
    while let Some(response) = rx.recv().await {
        let mut line = serde_json::to_string(&response).map_err(io::Error::other)?;
        line.push('\n');
        writer.write_all(line.as_bytes()).await?;
        writer.flush().await?;
    }
    Ok(())
}

// =============================================================================
// Tests
// =============================================================================
