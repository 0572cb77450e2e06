//! Credential store: client credentials and the environment they target.

use reqwest::Url;
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::types::{Config, Environment, Error, Result};

/// A string that never prints its contents.
#[derive(Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Secret(String);

impl Secret {
    pub fn new(value: impl Into<String>) -> Self {
        Self(value.into())
    }

    pub fn expose(&self) -> &str {
        &self.0
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl fmt::Debug for Secret {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("Secret(***)")
    }
}

impl fmt::Display for Secret {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("***")
    }
}

/// Immutable OAuth2 client credentials.
#[derive(Debug, Clone)]
pub struct Credential {
    client_id: String,
    client_secret: Secret,
    environment: Environment,
    token_endpoint: Url,
    app_key: Option<String>,
    scope: Option<String>,
}

impl Credential {
    pub fn new(
        client_id: impl Into<String>,
        client_secret: Secret,
        environment: Environment,
        token_endpoint: Url,
    ) -> Result<Self> {
        let client_id = client_id.into();
        if client_id.trim().is_empty() {
            return Err(Error::config("client id cannot be empty"));
        }
        if client_secret.expose().trim().is_empty() {
            return Err(Error::config("client secret cannot be empty"));
        }
        Ok(Self {
            client_id,
            client_secret,
            environment,
            token_endpoint,
            app_key: None,
            scope: None,
        })
    }

    /// Build from validated configuration.
    pub fn from_config(config: &Config) -> Result<Self> {
        let mut credential = Self::new(
            config.client_id.clone(),
            config.client_secret.clone(),
            config.environment,
            config.resolved_token_url()?,
        )?;
        credential.app_key = config.app_key.clone().filter(|k| !k.is_empty());
        credential.scope = config.scope.clone().filter(|s| !s.is_empty());
        Ok(credential)
    }

    pub fn with_app_key(mut self, app_key: impl Into<String>) -> Self {
        self.app_key = Some(app_key.into());
        self
    }

    pub fn with_scope(mut self, scope: impl Into<String>) -> Self {
        self.scope = Some(scope.into());
        self
    }

    pub fn client_id(&self) -> &str {
        &self.client_id
    }

    pub fn client_secret(&self) -> &Secret {
        &self.client_secret
    }

    pub fn environment(&self) -> Environment {
        self.environment
    }

    pub fn token_endpoint(&self) -> &Url {
        &self.token_endpoint
    }

    pub fn app_key(&self) -> Option<&str> {
        self.app_key.as_deref()
    }

    pub fn scope(&self) -> Option<&str> {
        self.scope.as_deref()
    }

    /// Client id shortened for status output.
    pub fn masked_client_id(&self) -> String {
        let prefix: String = self.client_id.chars().take(8).collect();
        format!("{}...", prefix)
    }
}
