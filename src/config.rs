//! Client configuration.
//!
//! Defaults, environment overrides and the opaque API credential.

use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use std::fmt;
use std::time::Duration;

/// Default backend address.
pub const DEFAULT_BASE_URL: &str = "http://localhost:8080";
/// Default refresh interval of the synchronizer.
pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_secs(5);
/// Default per-request timeout.
pub const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

pub const ENV_BASE_URL: &str = "DISTSYNC_BASE_URL";
pub const ENV_POLL_INTERVAL: &str = "DISTSYNC_POLL_INTERVAL_SECS";
pub const ENV_TIMEOUT: &str = "DISTSYNC_TIMEOUT_SECS";
pub const ENV_TOKEN: &str = "DISTSYNC_TOKEN";
pub const ENV_USERNAME: &str = "DISTSYNC_USERNAME";
pub const ENV_PASSWORD: &str = "DISTSYNC_PASSWORD";

/// Credential attached to every API request. Never inspected, only forwarded.
#[derive(Clone, PartialEq, Eq)]
pub enum ApiCredential {
    Bearer(String),
    Basic { username: String, password: String },
}

impl ApiCredential {
    /// Value of the `Authorization` header.
    pub fn header_value(&self) -> String {
        match self {
            ApiCredential::Bearer(token) => format!("Bearer {}", token),
            ApiCredential::Basic { username, password } => {
                format!("Basic {}", STANDARD.encode(format!("{}:{}", username, password)))
            }
        }
    }
}

impl fmt::Debug for ApiCredential {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ApiCredential::Bearer(_) => f.write_str("Bearer(<redacted>)"),
            ApiCredential::Basic { username, .. } => f
                .debug_struct("Basic")
                .field("username", username)
                .field("password", &"<redacted>")
                .finish(),
        }
    }
}

/// Configuration for talking to the distribution API.
///
/// # Example
///
/// ```ignore
/// use distsync::config::ClientConfig;
///
/// let config = ClientConfig::from_env()
///     .with_base_url("https://registry.example.com")
///     .with_poll_interval(Duration::from_secs(10));
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClientConfig {
    /// Backend address without trailing slash
    pub base_url: String,
    /// Synchronizer refresh interval (default: 5s)
    pub poll_interval: Duration,
    /// Per-request timeout applied by the transport (default: 30s)
    pub request_timeout: Duration,
    pub credential: Option<ApiCredential>,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            poll_interval: DEFAULT_POLL_INTERVAL,
            request_timeout: DEFAULT_REQUEST_TIMEOUT,
            credential: None,
        }
    }
}

impl ClientConfig {
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the backend address. Trailing slashes are dropped.
    pub fn with_base_url(mut self, url: impl Into<String>) -> Self {
        self.base_url = url.into().trim_end_matches('/').to_string();
        self
    }

    /// Set the refresh interval. Zero is ignored.
    pub fn with_poll_interval(mut self, interval: Duration) -> Self {
        if interval.is_zero() {
            tracing::warn!("Ignoring zero poll interval, keeping {:?}", self.poll_interval);
        } else {
            self.poll_interval = interval;
        }
        self
    }

    pub fn with_request_timeout(mut self, timeout: Duration) -> Self {
        self.request_timeout = timeout;
        self
    }

    pub fn with_credential(mut self, credential: ApiCredential) -> Self {
        self.credential = Some(credential);
        self
    }

    /// Build config from `DISTSYNC_*` environment variables.
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build config from any key lookup; unset keys keep their defaults.
    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = Self::default();

        if let Some(url) = lookup(ENV_BASE_URL).filter(|u| !u.trim().is_empty()) {
            config = config.with_base_url(url.trim());
        }
        if let Some(secs) = parse_secs(ENV_POLL_INTERVAL, lookup(ENV_POLL_INTERVAL)) {
            config = config.with_poll_interval(Duration::from_secs(secs));
        }
        if let Some(secs) = parse_secs(ENV_TIMEOUT, lookup(ENV_TIMEOUT)) {
            config = config.with_request_timeout(Duration::from_secs(secs));
        }

        if let Some(token) = lookup(ENV_TOKEN).filter(|t| !t.is_empty()) {
            config = config.with_credential(ApiCredential::Bearer(token));
        } else if let (Some(username), Some(password)) = (lookup(ENV_USERNAME), lookup(ENV_PASSWORD))
        {
            config = config.with_credential(ApiCredential::Basic { username, password });
        }

        config
    }
}

fn parse_secs(key: &str, raw: Option<String>) -> Option<u64> {
    let raw = raw?;
    match raw.trim().parse::<u64>() {
        Ok(secs) => Some(secs),
        Err(_) => {
            tracing::warn!(key, value = %raw, "Ignoring unparseable duration");
            None
        }
    }
}
