//! Configuration structures.
//!
//! Configuration is loaded from defaults, an optional TOML file, and
//! `OPERA_*` environment variables (nested sections split on `__`), then
//! validated once at startup. Any problem is a fatal `Error::Config`.

use figment::{
    providers::{Env, Format, Serialized, Toml},
    Figment,
};
use reqwest::Url;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::Path;
use std::time::Duration;

use super::errors::{Error, Result};
use crate::auth::Secret;
use crate::tools::HealthConfig;
use crate::validation;

/// Production OHIP gateway.
pub const PRODUCTION_GATEWAY: &str = "https://api.oracle-hospitality.com";

/// Token path relative to the gateway.
pub const TOKEN_PATH: &str = "/oauth/v1/tokens";

/// Environment variable prefix.
pub const ENV_PREFIX: &str = "OPERA_";

/// OPERA Cloud environment.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum Environment {
    Test,
    #[default]
    Production,
}

impl Environment {
    /// Gateway used when no `base_url` is configured.
    pub fn default_gateway(self) -> Option<&'static str> {
        match self {
            Environment::Production => Some(PRODUCTION_GATEWAY),
            Environment::Test => None,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Environment::Test => "test",
            Environment::Production => "production",
        }
    }
}

/// Global server configuration.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct Config {
    /// OAuth2 client id (`OPERA_CLIENT_ID`).
    #[serde(default)]
    pub client_id: String,

    /// OAuth2 client secret (`OPERA_CLIENT_SECRET`).
    #[serde(default)]
    pub client_secret: Secret,

    /// Target environment (`OPERA_ENVIRONMENT`).
    #[serde(default)]
    pub environment: Environment,

    /// OAuth2 token endpoint. Defaults to the gateway's token path.
    #[serde(default)]
    pub token_url: Option<String>,

    /// Gateway base URL. Defaults to the production gateway.
    #[serde(default)]
    pub base_url: Option<String>,

    /// Application key sent as `x-app-key`.
    #[serde(default)]
    pub app_key: Option<String>,

    /// Optional OAuth2 scope.
    #[serde(default)]
    pub scope: Option<String>,

    /// Hotel used when a tool's `hotelId` argument is omitted.
    #[serde(default)]
    pub default_hotel_id: Option<String>,

    /// Per-tool base URL overrides, keyed by tool name.
    #[serde(default)]
    pub tool_base_urls: BTreeMap<String, String>,

    /// Outbound resource call configuration.
    #[serde(default)]
    pub http: HttpConfig,

    /// Token manager configuration.
    #[serde(default)]
    pub auth: AuthConfig,

    /// Observability configuration.
    #[serde(default)]
    pub observability: ObservabilityConfig,

    /// Tool health tracking thresholds.
    #[serde(default)]
    pub health: HealthConfig,
}

/// Outbound resource call configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HttpConfig {
    /// Per-attempt timeout for resource calls.
    #[serde(with = "humantime_serde")]
    pub request_timeout: Duration,

    /// TCP connect timeout.
    #[serde(with = "humantime_serde")]
    pub connect_timeout: Duration,

    /// Total attempts per invocation (first call included).
    pub max_attempts: u32,

    /// First retry delay; doubles per attempt.
    #[serde(with = "humantime_serde")]
    pub backoff_base: Duration,

    /// Upper bound for any single retry delay.
    #[serde(with = "humantime_serde")]
    pub backoff_max: Duration,

    /// User-Agent header for all outbound calls.
    pub user_agent: String,
}

impl Default for HttpConfig {
    fn default() -> Self {
        Self {
            request_timeout: Duration::from_secs(30),
            connect_timeout: Duration::from_secs(10),
            max_attempts: 4,
            backoff_base: Duration::from_secs(1),
            backoff_max: Duration::from_secs(30),
            user_agent: concat!("opera-cloud-mcp/", env!("CARGO_PKG_VERSION")).to_string(),
        }
    }
}

/// Token manager configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuthConfig {
    /// Refresh when the cached token has less than this lifetime left.
    #[serde(with = "humantime_serde")]
    pub refresh_margin: Duration,

    /// Total exchange attempts per refresh.
    pub max_attempts: u32,

    /// First retry delay; doubles per attempt.
    #[serde(with = "humantime_serde")]
    pub backoff_base: Duration,

    /// Upper bound for any single retry delay.
    #[serde(with = "humantime_serde")]
    pub backoff_max: Duration,

    /// Timeout for a single token request.
    #[serde(with = "humantime_serde")]
    pub request_timeout: Duration,
}

impl Default for AuthConfig {
    fn default() -> Self {
        Self {
            refresh_margin: Duration::from_secs(60),
            max_attempts: 3,
            backoff_base: Duration::from_secs(1),
            backoff_max: Duration::from_secs(10),
            request_timeout: Duration::from_secs(30),
        }
    }
}

/// Observability configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ObservabilityConfig {
    /// Tracing log level (trace, debug, info, warn, error).
    pub log_level: String,

    /// Enable JSON log formatting.
    pub json_logs: bool,
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
            json_logs: false,
        }
    }
}

impl Config {
    /// Load configuration: defaults, then `path` (if any), then `OPERA_*` env.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let mut figment = Figment::new().merge(Serialized::defaults(Config::default()));
        if let Some(path) = path {
            if !path.exists() {
                return Err(Error::config(format!(
                    "config file not found: {}",
                    path.display()
                )));
            }
            figment = figment.merge(Toml::file(path));
        }
        figment = figment.merge(Env::prefixed(ENV_PREFIX).split("__"));

        figment
            .extract()
            .map_err(|e| Error::config(e.to_string()))
    }

    /// Load and validate in one step.
    pub fn load_validated(path: Option<&Path>) -> Result<Self> {
        let config = Self::load(path)?;
        config.validate()?;
        Ok(config)
    }

    /// Validate every startup requirement, reporting all problems at once.
    pub fn validate(&self) -> Result<()> {
        let mut problems = Vec::new();

        if self.client_id.trim().is_empty() {
            problems.push("OPERA_CLIENT_ID is required".to_string());
        }
        if self.client_secret.expose().trim().is_empty() {
            problems.push("OPERA_CLIENT_SECRET is required".to_string());
        }

        if self.environment == Environment::Test {
            if self.base_url.is_none() {
                problems.push("OPERA_BASE_URL is required for the test environment".to_string());
            }
            if self.token_url.is_none() {
                problems
                    .push("OPERA_TOKEN_URL is required for the test environment".to_string());
            }
        }

        for (field, value) in [("base_url", &self.base_url), ("token_url", &self.token_url)] {
            if let Some(url) = value {
                if let Err(e) = parse_http_url(url) {
                    problems.push(format!("{}: {}", field, e));
                }
            }
        }
        for (tool, url) in &self.tool_base_urls {
            if let Err(e) = parse_http_url(url) {
                problems.push(format!("tool_base_urls.{}: {}", tool, e));
            }
        }

        if let Some(hotel) = &self.default_hotel_id {
            if let Err(e) = validation::validate_identifier(hotel, "default_hotel_id") {
                problems.push(e.to_string());
            }
        }

        check(&mut problems, validation::validate_positive(self.http.max_attempts, "http.max_attempts"));
        check(&mut problems, validation::validate_positive(self.auth.max_attempts, "auth.max_attempts"));
        if self.http.request_timeout.is_zero() {
            problems.push("http.request_timeout must be positive".to_string());
        }
        if self.auth.request_timeout.is_zero() {
            problems.push("auth.request_timeout must be positive".to_string());
        }
        if self.http.backoff_max < self.http.backoff_base {
            problems.push("http.backoff_max must be >= http.backoff_base".to_string());
        }
        if self.auth.backoff_max < self.auth.backoff_base {
            problems.push("auth.backoff_max must be >= auth.backoff_base".to_string());
        }

        if problems.is_empty() {
            Ok(())
        } else {
            Err(Error::config(problems.join("; ")))
        }
    }

    /// Gateway base URL after applying the environment default.
    pub fn resolved_base_url(&self) -> Result<Url> {
        let raw = match (&self.base_url, self.environment.default_gateway()) {
            (Some(url), _) => url.as_str(),
            (None, Some(default)) => default,
            (None, None) => {
                return Err(Error::config(format!(
                    "no base_url configured for the {} environment",
                    self.environment.as_str()
                )))
            }
        };
        parse_http_url(raw).map_err(Error::config)
    }

    /// Token endpoint after applying the gateway default.
    pub fn resolved_token_url(&self) -> Result<Url> {
        match &self.token_url {
            Some(url) => parse_http_url(url).map_err(Error::config),
            None => {
                let base = self.resolved_base_url()?;
                base.join(TOKEN_PATH)
                    .map_err(|e| Error::config(format!("token_url: {}", e)))
            }
        }
    }
}

fn check(problems: &mut Vec<String>, result: Result<()>) {
    if let Err(e) = result {
        problems.push(e.to_string());
    }
}

fn parse_http_url(raw: &str) -> std::result::Result<Url, String> {
    let url = Url::parse(raw).map_err(|e| format!("invalid URL '{}': {}", raw, e))?;
    match url.scheme() {
        "http" | "https" => Ok(url),
        other => Err(format!("unsupported URL scheme '{}' in '{}'", other, raw)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn valid_config() -> Config {
        Config {
            client_id: "client".to_string(),
            client_secret: Secret::new("secret"),
            ..Default::default()
        }
    }

    #[test]
    fn test_defaults_validate_with_credentials() {
        assert!(valid_config().validate().is_ok());
    }

    #[test]
    fn test_missing_credentials_reported_together() {
        let err = Config::default().validate().unwrap_err();
        let msg = err.to_string();
        assert!(msg.contains("OPERA_CLIENT_ID"));
        assert!(msg.contains("OPERA_CLIENT_SECRET"));
        assert!(matches!(err, Error::Config(_)));
    }

    #[test]
    fn test_test_environment_requires_urls() {
        let config = Config {
            environment: Environment::Test,
            ..valid_config()
        };
        let msg = config.validate().unwrap_err().to_string();
        assert!(msg.contains("OPERA_BASE_URL"));
        assert!(msg.contains("OPERA_TOKEN_URL"));
    }

    #[test]
    fn test_zero_attempts_rejected() {
        let mut config = valid_config();
        config.http.max_attempts = 0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_bad_scheme_rejected() {
        let config = Config {
            base_url: Some("ftp://example.com".to_string()),
            ..valid_config()
        };
        assert!(config.validate().unwrap_err().to_string().contains("scheme"));
    }

    #[test]
    fn test_token_url_defaults_to_gateway_path() {
        let url = valid_config().resolved_token_url().unwrap();
        assert_eq!(url.as_str(), "https://api.oracle-hospitality.com/oauth/v1/tokens");
    }

    #[test]
    fn test_load_from_file_and_env() {
        figment::Jail::expect_with(|jail| {
            jail.create_file(
                "opera.toml",
                r#"
                client_id = "from-file"
                environment = "test"
                base_url = "http://127.0.0.1:9000"
                token_url = "http://127.0.0.1:9000/oauth/v1/tokens"

                [http]
                request_timeout = "5s"
                connect_timeout = "1s"
                max_attempts = 2
                backoff_base = "10ms"
                backoff_max = "100ms"
                user_agent = "test"
                "#,
            )?;
            jail.set_env("OPERA_CLIENT_SECRET", "from-env");
            jail.set_env("OPERA_AUTH__MAX_ATTEMPTS", "5");

            let config = Config::load_validated(Some(Path::new("opera.toml")))
                .map_err(|e| e.to_string())?;
            assert_eq!(config.client_id, "from-file");
            assert_eq!(config.client_secret.expose(), "from-env");
            assert_eq!(config.environment, Environment::Test);
            assert_eq!(config.http.max_attempts, 2);
            assert_eq!(config.http.request_timeout, Duration::from_secs(5));
            assert_eq!(config.auth.max_attempts, 5);
            Ok(())
        });
    }

    #[test]
    fn test_unknown_environment_is_config_error() {
        figment::Jail::expect_with(|jail| {
            jail.set_env("OPERA_ENVIRONMENT", "staging");
            let err = Config::load(None).unwrap_err();
            assert!(matches!(err, Error::Config(_)));
            Ok(())
        });
    }
}
