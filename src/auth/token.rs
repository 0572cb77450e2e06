//! Bearer tokens and the token endpoint's response body.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::time::Duration;
use tokio::time::Instant;

/// Longest `expires_in` accepted from the token endpoint.
pub const MAX_TOKEN_LIFETIME: Duration = Duration::from_secs(24 * 60 * 60);

/// A cached OAuth2 bearer token. Replaced on refresh, never mutated.
#[derive(Clone, PartialEq, Eq)]
pub struct AccessToken {
    value: String,
    token_type: String,
    expires_at: Instant,
    issued_at: DateTime<Utc>,
    generation: u64,
}

impl AccessToken {
    pub fn new(
        value: impl Into<String>,
        token_type: impl Into<String>,
        lifetime: Duration,
        generation: u64,
    ) -> Self {
        let now = Instant::now();
        let expires_at = now
            .checked_add(lifetime)
            .unwrap_or_else(|| now + MAX_TOKEN_LIFETIME);
        Self {
            value: value.into(),
            token_type: token_type.into(),
            expires_at,
            issued_at: Utc::now(),
            generation,
        }
    }

    pub fn value(&self) -> &str {
        &self.value
    }

    pub fn token_type(&self) -> &str {
        &self.token_type
    }

    pub fn expires_at(&self) -> Instant {
        self.expires_at
    }

    pub fn issued_at(&self) -> DateTime<Utc> {
        self.issued_at
    }

    /// Monotonic counter assigned by the token manager; higher is newer.
    pub fn generation(&self) -> u64 {
        self.generation
    }

    pub fn remaining(&self) -> Duration {
        self.expires_at.saturating_duration_since(Instant::now())
    }

    /// More than `margin` of lifetime left.
    pub fn is_fresh(&self, margin: Duration) -> bool {
        self.remaining() > margin
    }

    pub fn is_expired(&self) -> bool {
        self.remaining().is_zero()
    }
}

impl fmt::Debug for AccessToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AccessToken")
            .field("token_type", &self.token_type)
            .field("remaining", &self.remaining())
            .field("generation", &self.generation)
            .finish_non_exhaustive()
    }
}

/// Token endpoint success body.
#[derive(Debug, Clone, Deserialize)]
pub struct TokenGrant {
    pub access_token: String,
    #[serde(default)]
    pub token_type: Option<String>,
    pub expires_in: u64,
}

impl TokenGrant {
    /// Parse and sanity-check a token endpoint body.
    pub fn parse(body: &[u8]) -> Result<Self, String> {
        let grant: TokenGrant = serde_json::from_slice(body)
            .map_err(|e| format!("malformed token response: {}", e))?;
        if grant.access_token.trim().is_empty() {
            return Err("malformed token response: empty access_token".to_string());
        }
        if grant.expires_in == 0 {
            return Err("malformed token response: expires_in must be positive".to_string());
        }
        if grant.expires_in > MAX_TOKEN_LIFETIME.as_secs() {
            return Err(format!(
                "malformed token response: expires_in {} exceeds {}s",
                grant.expires_in,
                MAX_TOKEN_LIFETIME.as_secs()
            ));
        }
        Ok(grant)
    }

    pub fn lifetime(&self) -> Duration {
        Duration::from_secs(self.expires_in)
    }
}

/// Coarse token state for status reporting.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TokenState {
    None,
    Valid,
    ExpiringSoon,
    Expired,
}

/// Snapshot of the token manager for `get_auth_status` / `health_check`.
#[derive(Debug, Clone, Serialize)]
pub struct TokenStatus {
    pub has_token: bool,
    pub state: TokenState,
    pub expires_in_secs: Option<u64>,
    pub issued_at: Option<DateTime<Utc>>,
    pub generation: u64,
    pub refresh_count: u64,
    pub exchange_count: u64,
    pub refresh_in_flight: bool,
    pub last_error: Option<String>,
}
