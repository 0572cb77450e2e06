//! Token manager: cached OAuth2 client-credentials token with single-flight refresh.
//!
//! The cached token is the only shared mutable state in the bridge. All
//! reads and writes go through `TokenSlot` under one async mutex:
//!
//! ```text
//!   token() ──► fresh cached token? ──yes──► return it
//!                      │ no
//!                      ▼
//!               refresh in flight? ──yes──► await shared outcome
//!                      │ no
//!                      ▼
//!          spawn exchange task (detached) ──► store shared handle ──► await
//! ```
//!
//! The exchange runs in its own task so a caller that is cancelled while
//! waiting never cancels a refresh other callers are sharing. The task
//! itself swaps the new token into the slot before the shared outcome resolves.

use async_trait::async_trait;
use futures::future::{BoxFuture, FutureExt, Shared};
use reqwest::header::ACCEPT;
use reqwest::StatusCode;
use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Mutex;

use super::credential::Credential;
use super::token::{AccessToken, TokenGrant, TokenState, TokenStatus};
use crate::bridge::outbound::upstream_message;
use crate::retry::RetryPolicy;
use crate::types::{AuthConfig, Config, Error, Result};

/// Source of bearer tokens for outbound calls.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait TokenProvider: Send + Sync {
    /// A token with more than the refresh margin of lifetime left.
    async fn token(&self) -> Result<Arc<AccessToken>>;

    /// Replace `stale` (rejected upstream) unless a newer token already exists.
    async fn force_refresh(&self, stale: &AccessToken) -> Result<Arc<AccessToken>>;
}

/// Why an exchange failed. Cloneable so every waiter sees the same outcome.
#[derive(Debug, Clone)]
struct AuthFailure {
    cause: String,
    transient: bool,
}

impl AuthFailure {
    fn new(cause: impl Into<String>, transient: bool) -> Self {
        Self {
            cause: cause.into(),
            transient,
        }
    }
}

impl From<AuthFailure> for Error {
    fn from(failure: AuthFailure) -> Self {
        Error::auth(failure.cause, failure.transient)
    }
}

type ExchangeOutcome = std::result::Result<Arc<AccessToken>, AuthFailure>;
type SharedExchange = Shared<BoxFuture<'static, ExchangeOutcome>>;

#[derive(Default)]
struct TokenSlot {
    current: Option<Arc<AccessToken>>,
    in_flight: Option<SharedExchange>,
    generation: u64,
    refresh_count: u64,
    last_error: Option<String>,
}

impl fmt::Debug for TokenSlot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TokenSlot")
            .field("current", &self.current)
            .field("in_flight", &self.in_flight.is_some())
            .field("generation", &self.generation)
            .field("refresh_count", &self.refresh_count)
            .field("last_error", &self.last_error)
            .finish()
    }
}

#[derive(Debug)]
struct Inner {
    credential: Credential,
    http: reqwest::Client,
    policy: RetryPolicy,
    refresh_margin: Duration,
    request_timeout: Duration,
    slot: Mutex<TokenSlot>,
    exchanges: AtomicU64,
}

/// Owns the cached bearer token. Cheap to clone; clones share the cache.
#[derive(Debug, Clone)]
pub struct TokenManager {
    inner: Arc<Inner>,
}

impl TokenManager {
    pub fn new(credential: Credential, config: &AuthConfig, http: reqwest::Client) -> Self {
        Self {
            inner: Arc::new(Inner {
                credential,
                http,
                policy: RetryPolicy::from_auth(config),
                refresh_margin: config.refresh_margin,
                request_timeout: config.request_timeout,
                slot: Mutex::new(TokenSlot::default()),
                exchanges: AtomicU64::new(0),
            }),
        }
    }

    /// Build credential and HTTP client from validated configuration.
    pub fn from_config(config: &Config) -> Result<Self> {
        let credential = Credential::from_config(config)?;
        let http = reqwest::Client::builder()
            .connect_timeout(config.http.connect_timeout)
            .user_agent(config.http.user_agent.clone())
            .build()?;
        Ok(Self::new(credential, &config.auth, http))
    }

    pub fn credential(&self) -> &Credential {
        &self.inner.credential
    }

    pub fn refresh_margin(&self) -> Duration {
        self.inner.refresh_margin
    }

    /// Outbound token requests issued so far (every attempt counts).
    pub fn exchange_count(&self) -> u64 {
        self.inner.exchanges.load(Ordering::SeqCst)
    }

    /// Return the cached token, refreshing first if it is missing or inside the margin.
    pub async fn token(&self) -> Result<Arc<AccessToken>> {
        let exchange = {
            let mut slot = self.inner.slot.lock().await;
            if let Some(current) = &slot.current {
                if current.is_fresh(self.inner.refresh_margin) {
                    return Ok(Arc::clone(current));
                }
            }
            self.begin_refresh(&mut slot)
        };
        exchange.await.map_err(Error::from)
    }

    /// Discard `stale` and refresh, unless another caller already replaced it.
    pub async fn force_refresh(&self, stale: &AccessToken) -> Result<Arc<AccessToken>> {
        let exchange = {
            let mut slot = self.inner.slot.lock().await;
            if let Some(current) = &slot.current {
                if current.generation() > stale.generation()
                    && current.is_fresh(self.inner.refresh_margin)
                {
                    tracing::debug!(
                        stale = stale.generation(),
                        current = current.generation(),
                        "token already refreshed by another caller"
                    );
                    return Ok(Arc::clone(current));
                }
            }
            slot.current = None;
            self.begin_refresh(&mut slot)
        };
        exchange.await.map_err(Error::from)
    }

    /// Drop the cached token; the next `token()` call exchanges again.
    pub async fn invalidate(&self) {
        let mut slot = self.inner.slot.lock().await;
        slot.current = None;
    }

    /// Force a fresh exchange to prove the credentials work.
    pub async fn validate_credentials(&self) -> Result<Arc<AccessToken>> {
        self.invalidate().await;
        self.token().await
    }

    pub async fn status(&self) -> TokenStatus {
        let slot = self.inner.slot.lock().await;
        let (state, expires_in_secs, issued_at) = match &slot.current {
            None => (TokenState::None, None, None),
            Some(token) => {
                let state = if token.is_expired() {
                    TokenState::Expired
                } else if token.is_fresh(self.inner.refresh_margin) {
                    TokenState::Valid
                } else {
                    TokenState::ExpiringSoon
                };
                (state, Some(token.remaining().as_secs()), Some(token.issued_at()))
            }
        };
        TokenStatus {
            has_token: slot.current.is_some(),
            state,
            expires_in_secs,
            issued_at,
            generation: slot.generation,
            refresh_count: slot.refresh_count,
            exchange_count: self.exchange_count(),
            refresh_in_flight: slot.in_flight.is_some(),
            last_error: slot.last_error.clone(),
        }
    }

    /// Join the in-flight refresh or start one. Caller holds the slot lock.
    fn begin_refresh(&self, slot: &mut TokenSlot) -> SharedExchange {
        if let Some(existing) = &slot.in_flight {
            return existing.clone();
        }

        let task = tokio::spawn(Arc::clone(&self.inner).refresh());
        let inner = Arc::clone(&self.inner);
        let exchange = async move {
            match task.await {
                Ok(outcome) => outcome,
                Err(join_error) => {
                    // The task never reached its own cleanup.
                    let mut slot = inner.slot.lock().await;
                    slot.in_flight = None;
                    let failure =
                        AuthFailure::new(format!("token refresh task failed: {}", join_error), true);
                    slot.last_error = Some(failure.cause.clone());
                    Err(failure)
                }
            }
        }
        .boxed()
        .shared();

        slot.in_flight = Some(exchange.clone());
        exchange
    }
}

impl Inner {
    /// Exchange with retry, then publish the outcome into the slot.
    async fn refresh(self: Arc<Self>) -> ExchangeOutcome {
        let mut attempt = 0;
        let outcome = loop {
            attempt += 1;
            match self.exchange_once().await {
                Ok(grant) => break Ok(grant),
                Err(failure) if self.policy.has_attempts_left(attempt) => {
                    let delay = self.policy.backoff(attempt);
                    tracing::warn!(
                        attempt,
                        delay_ms = delay.as_millis() as u64,
                        cause = %failure.cause,
                        "token exchange failed, retrying"
                    );
                    tokio::time::sleep(delay).await;
                }
                Err(failure) => {
                    break Err(AuthFailure::new(
                        format!(
                            "token exchange failed after {} attempt(s): {}",
                            attempt, failure.cause
                        ),
                        failure.transient,
                    ))
                }
            }
        };

        let mut slot = self.slot.lock().await;
        slot.in_flight = None;
        match outcome {
            Ok(grant) => {
                if grant.lifetime() <= self.refresh_margin {
                    tracing::warn!(
                        expires_in = grant.expires_in,
                        margin_secs = self.refresh_margin.as_secs(),
                        "token lifetime is inside the refresh margin"
                    );
                }
                slot.generation += 1;
                let token = Arc::new(AccessToken::new(
                    grant.access_token,
                    grant.token_type.unwrap_or_else(|| "Bearer".to_string()),
                    Duration::from_secs(grant.expires_in),
                    slot.generation,
                ));
                slot.current = Some(Arc::clone(&token));
                slot.refresh_count += 1;
                slot.last_error = None;
                tracing::info!(
                    generation = token.generation(),
                    expires_in = grant.expires_in,
                    attempts = attempt,
                    "obtained OPERA Cloud access token"
                );
                Ok(token)
            }
            Err(failure) => {
                tracing::error!(cause = %failure.cause, "token refresh failed");
                slot.last_error = Some(failure.cause.clone());
                Err(failure)
            }
        }
    }

    async fn exchange_once(&self) -> std::result::Result<TokenGrant, AuthFailure> {
        self.exchanges.fetch_add(1, Ordering::SeqCst);

        let mut form = vec![("grant_type", "client_credentials")];
        if let Some(scope) = self.credential.scope() {
            form.push(("scope", scope));
        }

        let mut request = self
            .http
            .post(self.credential.token_endpoint().clone())
            .basic_auth(
                self.credential.client_id(),
                Some(self.credential.client_secret().expose()),
            )
            .header(ACCEPT, "application/json")
            .form(&form)
            .timeout(self.request_timeout);
        if let Some(app_key) = self.credential.app_key() {
            request = request.header("x-app-key", app_key);
        }

        let response = request
            .send()
            .await
            .map_err(|e| AuthFailure::new(format!("token request failed: {}", e), true))?;
        let status = response.status();
        let body = response
            .bytes()
            .await
            .map_err(|e| AuthFailure::new(format!("token response read failed: {}", e), true))?;

        if !status.is_success() {
            let transient =
                status.is_server_error() || status == StatusCode::TOO_MANY_REQUESTS;
            return Err(AuthFailure::new(
                format!(
                    "token endpoint returned {}: {}",
                    status.as_u16(),
                    upstream_message(&body).unwrap_or_else(|| "no details".to_string())
                ),
                transient,
            ));
        }

        TokenGrant::parse(&body).map_err(|cause| AuthFailure::new(cause, true))
    }
}

#[async_trait]
impl TokenProvider for TokenManager {
    async fn token(&self) -> Result<Arc<AccessToken>> {
        TokenManager::token(self).await
    }

    async fn force_refresh(&self, stale: &AccessToken) -> Result<Arc<AccessToken>> {
        TokenManager::force_refresh(self, stale).await
    }
}
