//! In-process mock of the OPERA Cloud gateway and token endpoint.

#![allow(dead_code)]

use axum::body::Bytes;
use axum::extract::State;
use axum::http::{header, HeaderMap, HeaderValue, Method, StatusCode, Uri};
use axum::response::{IntoResponse, Response};
use axum::routing::post;
use axum::{Json, Router};
use opera_cloud_mcp::auth::{Credential, Secret, TokenManager, TokenProvider};
use opera_cloud_mcp::bridge::{BridgeSettings, RequestBridge};
use opera_cloud_mcp::retry::RetryPolicy;
use opera_cloud_mcp::tools::ToolRegistry;
use opera_cloud_mcp::types::{AuthConfig, Environment};
use reqwest::Url;
use serde_json::{json, Value};
use std::collections::VecDeque;
use std::net::SocketAddr;
use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

pub const HOTEL: &str = "HOTEL1";

/// One canned resource response.
#[derive(Debug, Clone)]
pub struct Scripted {
    pub status: u16,
    pub body: String,
    pub retry_after: Option<u64>,
}

impl Scripted {
    pub fn json(status: u16, body: Value) -> Self {
        Self {
            status,
            body: body.to_string(),
            retry_after: None,
        }
    }

    pub fn raw(status: u16, body: &str) -> Self {
        Self {
            status,
            body: body.to_string(),
            retry_after: None,
        }
    }

    pub fn retry_after(mut self, secs: u64) -> Self {
        self.retry_after = Some(secs);
        self
    }
}

/// A resource request as the gateway saw it.
#[derive(Debug, Clone)]
pub struct Recorded {
    pub method: Method,
    pub path: String,
    pub query: Option<String>,
    pub headers: HeaderMap,
    pub body: Bytes,
}

impl Recorded {
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers.get(name).and_then(|v| v.to_str().ok())
    }

    pub fn json(&self) -> Value {
        serde_json::from_slice(&self.body).unwrap()
    }
}

#[derive(Debug, Default)]
pub struct GatewayState {
    pub token_calls: AtomicUsize,
    pub resource_calls: AtomicUsize,
    token_delay_ms: AtomicU64,
    token_lifetime_secs: AtomicU64,
    token_failures: Mutex<VecDeque<u16>>,
    token_forms: Mutex<Vec<(Option<String>, String)>>,
    resources: Mutex<VecDeque<Scripted>>,
    fallback: Mutex<Option<Scripted>>,
    requests: Mutex<Vec<Recorded>>,
}

impl GatewayState {
    pub fn token_calls(&self) -> usize {
        self.token_calls.load(Ordering::SeqCst)
    }

    pub fn resource_calls(&self) -> usize {
        self.resource_calls.load(Ordering::SeqCst)
    }

    pub fn delay_tokens(&self, delay: Duration) {
        self.token_delay_ms
            .store(delay.as_millis() as u64, Ordering::SeqCst);
    }

    pub fn token_lifetime(&self, secs: u64) {
        self.token_lifetime_secs.store(secs, Ordering::SeqCst);
    }

    /// Fail the next token requests with these statuses, in order.
    pub fn fail_tokens(&self, statuses: &[u16]) {
        self.token_failures.lock().unwrap().extend(statuses);
    }

    /// (Authorization header, form body) of each token request.
    pub fn token_forms(&self) -> Vec<(Option<String>, String)> {
        self.token_forms.lock().unwrap().clone()
    }

    pub fn push(&self, response: Scripted) {
        self.resources.lock().unwrap().push_back(response);
    }

    /// Response used once the scripted queue is empty.
    pub fn always(&self, response: Scripted) {
        *self.fallback.lock().unwrap() = Some(response);
    }

    pub fn requests(&self) -> Vec<Recorded> {
        self.requests.lock().unwrap().clone()
    }
}

#[derive(Debug)]
pub struct MockGateway {
    pub state: Arc<GatewayState>,
    pub addr: SocketAddr,
}

impl MockGateway {
    pub async fn start() -> Self {
        let state = Arc::new(GatewayState::default());
        let app = Router::new()
            .route("/oauth/v1/tokens", post(token))
            .fallback(resource)
            .with_state(Arc::clone(&state));

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            let _ = axum::serve(listener, app).await;
        });
        Self { state, addr }
    }

    pub fn base_url(&self) -> Url {
        Url::parse(&format!("http://{}/", self.addr)).unwrap()
    }

    pub fn token_url(&self) -> Url {
        Url::parse(&format!("http://{}/oauth/v1/tokens", self.addr)).unwrap()
    }

    pub fn credential(&self) -> Credential {
        Credential::new("client-id", Secret::new("client-secret"), Environment::Test, self.token_url())
            .unwrap()
    }

    pub fn token_manager(&self) -> TokenManager {
        self.token_manager_with(fast_auth())
    }

    pub fn token_manager_with(&self, auth: AuthConfig) -> TokenManager {
        TokenManager::new(self.credential(), &auth, reqwest::Client::new())
    }

    pub fn settings(&self, max_attempts: u32) -> BridgeSettings {
        let mut settings = BridgeSettings::new(self.base_url());
        settings.retry = RetryPolicy::new(max_attempts, Duration::from_millis(5), Duration::from_millis(20));
        settings.request_timeout = Duration::from_secs(2);
        settings.default_hotel_id = Some(HOTEL.to_string());
        settings
    }

    /// Bridge over the OPERA catalogue with a fresh token manager.
    pub fn bridge(&self, max_attempts: u32) -> (RequestBridge, TokenManager) {
        let tokens = self.token_manager();
        let bridge = self.bridge_with(tokens.clone(), max_attempts);
        (bridge, tokens)
    }

    pub fn bridge_with(&self, tokens: TokenManager, max_attempts: u32) -> RequestBridge {
        let provider: Arc<dyn TokenProvider> = Arc::new(tokens);
        RequestBridge::new(
            Arc::new(ToolRegistry::opera().unwrap()),
            provider,
            self.settings(max_attempts),
        )
        .unwrap()
    }
}

pub fn fast_auth() -> AuthConfig {
    AuthConfig {
        refresh_margin: Duration::from_secs(60),
        max_attempts: 3,
        backoff_base: Duration::from_millis(5),
        backoff_max: Duration::from_millis(20),
        request_timeout: Duration::from_secs(2),
    }
}

async fn token(
    State(state): State<Arc<GatewayState>>,
    headers: HeaderMap,
    body: String,
) -> Response {
    let n = state.token_calls.fetch_add(1, Ordering::SeqCst) + 1;
    let authorization = headers
        .get(header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .map(str::to_string);
    state.token_forms.lock().unwrap().push((authorization, body));

    let delay = state.token_delay_ms.load(Ordering::SeqCst);
    if delay > 0 {
        tokio::time::sleep(Duration::from_millis(delay)).await;
    }

    let failure = state.token_failures.lock().unwrap().pop_front();
    if let Some(status) = failure {
        let status = StatusCode::from_u16(status).unwrap();
        return (
            status,
            Json(json!({"error": "invalid_client", "error_description": "rejected by mock"})),
        )
            .into_response();
    }

    let lifetime = match state.token_lifetime_secs.load(Ordering::SeqCst) {
        0 => 3600,
        secs => secs,
    };
    Json(json!({
        "access_token": format!("token-{}", n),
        "token_type": "Bearer",
        "expires_in": lifetime,
    }))
    .into_response()
}

async fn resource(
    State(state): State<Arc<GatewayState>>,
    method: Method,
    uri: Uri,
    headers: HeaderMap,
    body: Bytes,
) -> Response {
    state.resource_calls.fetch_add(1, Ordering::SeqCst);
    state.requests.lock().unwrap().push(Recorded {
        method,
        path: uri.path().to_string(),
        query: uri.query().map(str::to_string),
        headers,
        body,
    });

    let scripted = state.resources.lock().unwrap().pop_front();
    let scripted = scripted.or_else(|| state.fallback.lock().unwrap().clone());
    match scripted {
        None => Json(json!({"reservations": [], "hasMore": false})).into_response(),
        Some(s) => {
            let mut response = (StatusCode::from_u16(s.status).unwrap(), s.body).into_response();
            response
                .headers_mut()
                .insert(header::CONTENT_TYPE, HeaderValue::from_static("application/json"));
            if let Some(secs) = s.retry_after {
                response
                    .headers_mut()
                    .insert(header::RETRY_AFTER, HeaderValue::from(secs));
            }
            response
        }
    }
}
