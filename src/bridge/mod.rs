//! Request bridge: tool invocation → authenticated OPERA Cloud call → `ToolResult`.
//!
//! ```text
//!   invoke(ToolInvocation)
//!     │ resolve tool            (UnknownTool)
//!     │ validate + place args   (InvalidArgument)
//!     │ token()                 (Auth)
//!     ▼
//!   send ──2xx──► check body against the response shape ──► Success | MalformedResponse
//!     │ 401 (first) ─► force_refresh(stale) ─► send again
//!     │ 429 / 5xx / transport ─► backoff ─► send again (bounded)
//!     └ other 4xx, second 401, budget spent ─► Upstream
//! ```
//!
//! Only the final `ToolResult` leaves this module; no error escapes `invoke`.

pub mod outbound;
pub mod result;
pub mod state;

pub use result::{ToolInvocation, ToolResult};
pub use state::{AttemptOutcome, InvocationState, Phase, Verdict};

use reqwest::Url;
use serde_json::{Map, Value};
use std::collections::{BTreeMap, HashMap};
use std::fmt;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::Mutex;
use tracing::Instrument;

use crate::auth::{AccessToken, TokenProvider};
use crate::observability::mask_sensitive;
use crate::retry::RetryPolicy;
use crate::tools::{HealthConfig, SystemHealthReport, ToolDefinition, ToolHealthTracker, ToolRegistry};
use crate::types::{Config, Error, RequestId, Result};

// =============================================================================
// Settings
// =============================================================================

/// Everything the bridge needs besides the registry and token source.
#[derive(Debug, Clone)]
pub struct BridgeSettings {
    pub base_url: Url,
    /// Per-tool gateway overrides.
    pub tool_base_urls: BTreeMap<String, Url>,
    pub retry: RetryPolicy,
    pub request_timeout: Duration,
    pub connect_timeout: Duration,
    pub user_agent: String,
    pub app_key: Option<String>,
    pub default_hotel_id: Option<String>,
    pub health: HealthConfig,
}

impl BridgeSettings {
    /// Defaults for everything but the gateway.
    pub fn new(base_url: Url) -> Self {
        let http = crate::types::HttpConfig::default();
        Self {
            base_url,
            tool_base_urls: BTreeMap::new(),
            retry: RetryPolicy::from_http(&http),
            request_timeout: http.request_timeout,
            connect_timeout: http.connect_timeout,
            user_agent: http.user_agent,
            app_key: None,
            default_hotel_id: None,
            health: HealthConfig::default(),
        }
    }

    pub fn from_config(config: &Config) -> Result<Self> {
        let mut tool_base_urls = BTreeMap::new();
        for (tool, raw) in &config.tool_base_urls {
            let url = Url::parse(raw)
                .map_err(|e| Error::config(format!("tool_base_urls.{}: {}", tool, e)))?;
            tool_base_urls.insert(tool.clone(), url);
        }
        Ok(Self {
            base_url: config.resolved_base_url()?,
            tool_base_urls,
            retry: RetryPolicy::from_http(&config.http),
            request_timeout: config.http.request_timeout,
            connect_timeout: config.http.connect_timeout,
            user_agent: config.http.user_agent.clone(),
            app_key: config.app_key.clone().filter(|k| !k.is_empty()),
            default_hotel_id: config.default_hotel_id.clone().filter(|h| !h.is_empty()),
            health: config.health.clone(),
        })
    }
}

// =============================================================================
// Bridge
// =============================================================================

pub struct RequestBridge {
    registry: Arc<ToolRegistry>,
    tokens: Arc<dyn TokenProvider>,
    http: reqwest::Client,
    base_url: Url,
    tool_base_urls: HashMap<String, Url>,
    retry: RetryPolicy,
    request_timeout: Duration,
    app_key: Option<String>,
    default_hotel_id: Option<String>,
    health: Mutex<ToolHealthTracker>,
}

impl fmt::Debug for RequestBridge {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RequestBridge")
            .field("tools", &self.registry.len())
            .field("base_url", &self.base_url.as_str())
            .field("tool_base_urls", &self.tool_base_urls.len())
            .field("retry", &self.retry)
            .field("request_timeout", &self.request_timeout)
            .finish_non_exhaustive()
    }
}

impl RequestBridge {
    /// Build the bridge. Base URL overrides must name registered tools.
    pub fn new(
        registry: Arc<ToolRegistry>,
        tokens: Arc<dyn TokenProvider>,
        settings: BridgeSettings,
    ) -> Result<Self> {
        let unknown: Vec<&str> = settings
            .tool_base_urls
            .keys()
            .filter(|name| !registry.contains(name))
            .map(String::as_str)
            .collect();
        if !unknown.is_empty() {
            return Err(Error::config(format!(
                "tool_base_urls names unknown tool(s): {}",
                unknown.join(", ")
            )));
        }
        for (tool, url) in std::iter::once(("<default>", &settings.base_url))
            .chain(settings.tool_base_urls.iter().map(|(k, v)| (k.as_str(), v)))
        {
            if url.cannot_be_a_base() {
                return Err(Error::config(format!("base URL for {} cannot carry a path: {}", tool, url)));
            }
        }

        let http = reqwest::Client::builder()
            .connect_timeout(settings.connect_timeout)
            .user_agent(settings.user_agent.clone())
            .build()?;

        let mut tracker = ToolHealthTracker::new(settings.health);
        tracker.set_registered_tools(registry.names());

        Ok(Self {
            registry,
            tokens,
            http,
            base_url: settings.base_url,
            tool_base_urls: settings.tool_base_urls.into_iter().collect(),
            retry: settings.retry,
            request_timeout: settings.request_timeout,
            app_key: settings.app_key,
            default_hotel_id: settings.default_hotel_id,
            health: Mutex::new(tracker),
        })
    }

    pub fn registry(&self) -> &ToolRegistry {
        &self.registry
    }

    pub fn default_hotel_id(&self) -> Option<&str> {
        self.default_hotel_id.as_deref()
    }

    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    pub fn base_url_for(&self, tool: &str) -> &Url {
        self.tool_base_urls.get(tool).unwrap_or(&self.base_url)
    }

    pub async fn health_report(&self) -> SystemHealthReport {
        self.health.lock().await.check_system()
    }

    /// Run one invocation to a terminal `ToolResult`.
    pub async fn invoke(&self, invocation: ToolInvocation) -> ToolResult {
        let request_id = RequestId::new();
        let span = tracing::info_span!(
            "invoke",
            tool = %invocation.tool_name,
            request_id = %request_id,
        );

        async {
            let started = Instant::now();
            tracing::debug!(arguments = %mask_sensitive(&invocation.arguments), "tool invocation");

            let mut state = InvocationState::new(self.retry);
            let outcome = self.run(&invocation, &request_id, &mut state).await;
            let elapsed = started.elapsed();

            let result = match outcome {
                Ok(payload) => ToolResult::success(payload),
                Err(err) => {
                    state.fail();
                    ToolResult::from_error(&err, state.sends())
                }
            };

            if self.registry.contains(&invocation.tool_name) {
                self.health.lock().await.record(
                    &invocation.tool_name,
                    result.failure_kind(),
                    state.last_status(),
                    elapsed,
                );
            }

            match &result {
                ToolResult::Success { .. } => tracing::info!(
                    sends = state.sends(),
                    status = ?state.last_status(),
                    elapsed_ms = elapsed.as_millis() as u64,
                    "tool call succeeded"
                ),
                ToolResult::Failure {
                    kind,
                    message,
                    retryable,
                    ..
                } => tracing::warn!(
                    kind = %kind,
                    retryable,
                    sends = state.sends(),
                    status = ?state.last_status(),
                    elapsed_ms = elapsed.as_millis() as u64,
                    error = %message,
                    "tool call failed"
                ),
            }
            result
        }
        .instrument(span)
        .await
    }

    async fn run(
        &self,
        invocation: &ToolInvocation,
        request_id: &RequestId,
        state: &mut InvocationState,
    ) -> Result<Value> {
        state.advance(Phase::Validating);
        let tool = self.registry.resolve(&invocation.tool_name)?;
        let empty = Map::new();
        let args = match &invocation.arguments {
            Value::Object(map) => map,
            Value::Null => &empty,
            other => {
                return Err(Error::invalid_argument(format!(
                    "arguments must be a JSON object, got {}",
                    json_kind(other)
                )))
            }
        };
        let prepared = tool.prepare(args, self.default_hotel_id.as_deref())?;
        let url = outbound::render_url(self.base_url_for(&tool.name), tool, &prepared)?;
        let body = prepared.body.clone().map(outbound::sanitize_body);

        state.advance(Phase::Authenticating);
        let mut token = self.tokens.token().await?;

        loop {
            state.advance(Phase::Sending);
            state.begin_attempt();
            let request = outbound::build_request(
                &self.http,
                tool,
                &url,
                body.as_ref(),
                &token,
                request_id,
                prepared.hotel_id.as_deref(),
                self.app_key.as_deref(),
                self.request_timeout,
            );

            let (attempt, response_body, transport_error) = match send(request).await {
                Ok((status, retry_after, bytes)) => (
                    AttemptOutcome::Status {
                        status,
                        retry_after,
                    },
                    bytes,
                    None,
                ),
                Err(e) => (AttemptOutcome::Transport, Vec::new(), Some(e)),
            };

            match state.classify(attempt) {
                Verdict::Done => {
                    let payload = parse_payload(tool, &response_body)?;
                    state.advance(Phase::Succeeded);
                    return Ok(payload);
                }
                Verdict::RefreshAndResend => {
                    tracing::info!(
                        generation = token.generation(),
                        "upstream rejected token, forcing one refresh"
                    );
                    state.advance(Phase::Authenticating);
                    token = self.refresh(&token).await?;
                }
                Verdict::RetryAfter(delay) => {
                    tracing::warn!(
                        attempt = state.attempts(),
                        status = ?attempt.status(),
                        delay_ms = delay.as_millis() as u64,
                        error = ?transport_error,
                        "transient upstream failure, retrying"
                    );
                    state.advance(Phase::Retrying);
                    tokio::time::sleep(delay).await;
                }
                Verdict::Fail { retryable } => {
                    state.advance(Phase::Failed);
                    return Err(upstream_failure(
                        tool,
                        attempt,
                        &response_body,
                        transport_error,
                        retryable,
                        state.sends(),
                    ));
                }
            }
        }
    }

    async fn refresh(&self, stale: &AccessToken) -> Result<Arc<AccessToken>> {
        self.tokens.force_refresh(stale).await
    }
}

/// Send and read the whole body. Body read failures count as transport failures.
async fn send(
    request: reqwest::RequestBuilder,
) -> std::result::Result<(u16, Option<Duration>, Vec<u8>), reqwest::Error> {
    let response = request.send().await?;
    let status = response.status().as_u16();
    let retry_after = outbound::retry_after(response.headers());
    let bytes = response.bytes().await?;
    Ok((status, retry_after, bytes.to_vec()))
}

/// Decode a 2xx body and check it against the tool's response shape.
fn parse_payload(tool: &ToolDefinition, body: &[u8]) -> Result<Value> {
    let payload = if body.iter().all(u8::is_ascii_whitespace) {
        Value::Object(Map::new())
    } else {
        serde_json::from_slice(body).map_err(|e| {
            Error::malformed_response(format!("{} returned a body that is not JSON: {}", tool.name, e))
        })?
    };
    tool.response.check(&payload).map_err(|violation| {
        Error::malformed_response(format!(
            "{} returned an unexpected shape: {}",
            tool.name, violation
        ))
    })?;
    Ok(payload)
}

fn upstream_failure(
    tool: &ToolDefinition,
    attempt: AttemptOutcome,
    body: &[u8],
    transport_error: Option<reqwest::Error>,
    retryable: bool,
    sends: u32,
) -> Error {
    let message = match (attempt, transport_error) {
        (AttemptOutcome::Status { status, .. }, _) => format!(
            "{} {} returned {} after {} call(s): {}",
            tool.method,
            tool.path_template,
            status,
            sends,
            outbound::upstream_message(body).unwrap_or_else(|| "no details".to_string())
        ),
        (AttemptOutcome::Transport, Some(e)) => format!(
            "{} {} failed after {} call(s): {}",
            tool.method, tool.path_template, sends, e
        ),
        (AttemptOutcome::Transport, None) => format!(
            "{} {} failed after {} call(s)",
            tool.method, tool.path_template, sends
        ),
    };
    Error::upstream(message, attempt.status(), retryable)
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::MockTokenProvider;
    use tracing_test::traced_test;
    use crate::types::FailureKind;
    use serde_json::json;

    fn token(generation: u64) -> Arc<AccessToken> {
        Arc::new(AccessToken::new(
            format!("token-{}", generation),
            "Bearer",
            Duration::from_secs(3600),
            generation,
        ))
    }

    fn bridge_with(tokens: MockTokenProvider) -> RequestBridge {
        // Nothing listens on the discard port; tests here fail before or at connect.
        let mut settings = BridgeSettings::new(Url::parse("http://127.0.0.1:9").unwrap());
        settings.retry = RetryPolicy::new(2, Duration::from_millis(1), Duration::from_millis(2));
        settings.request_timeout = Duration::from_millis(500);
        RequestBridge::new(
            Arc::new(ToolRegistry::opera().unwrap()),
            Arc::new(tokens),
            settings,
        )
        .unwrap()
    }

    #[tokio::test]
    async fn test_unknown_tool_never_asks_for_token() {
        let mut tokens = MockTokenProvider::new();
        tokens.expect_token().never();
        let bridge = bridge_with(tokens);

        let result = bridge
            .invoke(ToolInvocation::new("does-not-exist", json!({})))
            .await;
        assert_eq!(result.failure_kind(), Some(FailureKind::UnknownTool));
        assert!(!result.is_retryable());
    }

    #[tokio::test]
    #[traced_test]
    async fn test_failure_logged_with_kind() {
        let bridge = bridge_with(MockTokenProvider::new());
        bridge
            .invoke(ToolInvocation::new("does-not-exist", json!({"cardNumber": "4111"})))
            .await;
        assert!(logs_contain("tool call failed"));
        assert!(logs_contain("unknown_tool"));
        assert!(!logs_contain("4111"));
    }

    #[tokio::test]
    async fn test_missing_argument_never_asks_for_token() {
        let mut tokens = MockTokenProvider::new();
        tokens.expect_token().never();
        let bridge = bridge_with(tokens);

        let result = bridge
            .invoke(ToolInvocation::new("search_reservations", json!({})))
            .await;
        assert_eq!(result.failure_kind(), Some(FailureKind::InvalidArgument));
        assert!(!result.is_retryable());
    }

    #[tokio::test]
    async fn test_non_object_arguments_rejected() {
        let mut tokens = MockTokenProvider::new();
        tokens.expect_token().never();
        let bridge = bridge_with(tokens);

        let result = bridge
            .invoke(ToolInvocation::new("search_reservations", json!(["H1"])))
            .await;
        assert_eq!(result.failure_kind(), Some(FailureKind::InvalidArgument));
    }

    #[tokio::test]
    async fn test_auth_failure_becomes_auth_result() {
        let mut tokens = MockTokenProvider::new();
        tokens
            .expect_token()
            .times(1)
            .returning(|| Err(Error::auth("token endpoint returned 401", false)));
        let bridge = bridge_with(tokens);

        let result = bridge
            .invoke(ToolInvocation::new("search_reservations", json!({"hotelId": "H1"})))
            .await;
        assert_eq!(result.failure_kind(), Some(FailureKind::Auth));
        assert!(!result.is_retryable());
        assert!(matches!(result, ToolResult::Failure { attempts: 0, .. }));
    }

    #[tokio::test]
    async fn test_transport_failure_exhausts_attempts() {
        let mut tokens = MockTokenProvider::new();
        tokens.expect_token().times(1).returning(|| Ok(token(1)));
        tokens.expect_force_refresh().never();
        let bridge = bridge_with(tokens);

        let result = bridge
            .invoke(ToolInvocation::new("search_reservations", json!({"hotelId": "H1"})))
            .await;
        assert_eq!(result.failure_kind(), Some(FailureKind::Upstream));
        assert!(result.is_retryable());
        assert!(matches!(result, ToolResult::Failure { attempts: 2, status: None, .. }));
    }

    #[test]
    fn test_override_for_unknown_tool_rejected() {
        let mut settings = BridgeSettings::new(Url::parse("http://127.0.0.1:9").unwrap());
        settings
            .tool_base_urls
            .insert("no_such_tool".into(), Url::parse("http://127.0.0.1:10").unwrap());
        let err = RequestBridge::new(
            Arc::new(ToolRegistry::opera().unwrap()),
            Arc::new(MockTokenProvider::new()),
            settings,
        )
        .unwrap_err();
        assert!(matches!(err, Error::Config(_)));
        assert!(err.to_string().contains("no_such_tool"));
    }

    #[test]
    fn test_parse_payload_rules() {
        let registry = ToolRegistry::opera().unwrap();
        let tool = registry.resolve("search_reservations").unwrap();

        assert_eq!(parse_payload(tool, b"").unwrap(), json!({}));
        assert_eq!(
            parse_payload(tool, br#"{"reservations":[]}"#).unwrap(),
            json!({"reservations": []})
        );
        assert!(matches!(
            parse_payload(tool, b"<html>"),
            Err(Error::MalformedResponse(_))
        ));
        assert!(matches!(
            parse_payload(tool, br#"{"reservations":"none"}"#),
            Err(Error::MalformedResponse(_))
        ));
    }
}
