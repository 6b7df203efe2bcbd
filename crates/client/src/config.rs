//! Client configuration and credential lookup.

use std::time::Duration;

use agentic_core::{mask_api_key, validate_api_key_format};

use crate::error::{ClientError, Result};

/// Default platform endpoint.
pub const DEFAULT_BASE_URL: &str = "https://agenticteam.dev";

/// Default per-attempt request timeout.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

/// Retries after the first attempt.
pub const DEFAULT_MAX_RETRIES: u32 = 3;

/// Environment variable holding the API key.
pub const API_KEY_ENV: &str = "AGENTIC_API_KEY";

/// Environment variable overriding the base URL.
pub const BASE_URL_ENV: &str = "AGENTIC_BASE_URL";

/// Environment variable overriding the timeout, in seconds.
pub const TIMEOUT_ENV: &str = "AGENTIC_TIMEOUT_SECS";

/// Delays between attempts: 1s, 2s, 4s.
pub fn default_backoff() -> Vec<Duration> {
    vec![
        Duration::from_secs(1),
        Duration::from_secs(2),
        Duration::from_secs(4),
    ]
}

/// Settings for a [`PlatformClient`](crate::PlatformClient).
#[derive(Clone)]
pub struct ClientConfig {
    /// Bearer token sent with every request
    pub api_key: String,

    /// Platform base URL, without trailing slash
    pub base_url: String,

    /// Per-attempt timeout
    pub timeout: Duration,

    /// Attempts after the first one for transient failures
    pub max_retries: u32,

    /// Fixed delay schedule; the last entry repeats when exhausted
    pub backoff: Vec<Duration>,
}

impl std::fmt::Debug for ClientConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ClientConfig")
            .field("api_key", &mask_api_key(&self.api_key))
            .field("base_url", &self.base_url)
            .field("timeout", &self.timeout)
            .field("max_retries", &self.max_retries)
            .field("backoff", &self.backoff)
            .finish()
    }
}

impl ClientConfig {
    /// Configuration with defaults for everything but the key.
    pub fn new(api_key: impl Into<String>) -> Self {
        Self {
            api_key: api_key.into(),
            base_url: DEFAULT_BASE_URL.to_string(),
            timeout: DEFAULT_TIMEOUT,
            max_retries: DEFAULT_MAX_RETRIES,
            backoff: default_backoff(),
        }
    }

    /// Load the key from `source` and apply environment overrides.
    pub fn from_source(source: &dyn CredentialSource) -> Result<Self> {
        let api_key = source
            .api_key()?
            .ok_or_else(|| ClientError::Config(format!("{API_KEY_ENV} is not set")))?;

        let mut config = Self::new(api_key);
        if let Ok(url) = std::env::var(BASE_URL_ENV) {
            config = config.with_base_url(url);
        }
        if let Ok(raw) = std::env::var(TIMEOUT_ENV) {
            let secs: u64 = raw
                .parse()
                .map_err(|_| ClientError::Config(format!("{TIMEOUT_ENV} must be a number of seconds, got {raw:?}")))?;
            config = config.with_timeout(Duration::from_secs(secs));
        }
        Ok(config)
    }

    /// Shorthand for [`from_source`](Self::from_source) with [`EnvCredentials`].
    pub fn from_env() -> Result<Self> {
        Self::from_source(&EnvCredentials)
    }

    /// Override the base URL.
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into().trim_end_matches('/').to_string();
        self
    }

    /// Override the per-attempt timeout.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Override the retry budget.
    pub fn with_max_retries(mut self, max_retries: u32) -> Self {
        self.max_retries = max_retries;
        self
    }

    /// Override the backoff schedule.
    pub fn with_backoff(mut self, backoff: Vec<Duration>) -> Self {
        self.backoff = backoff;
        self
    }

    /// Delay before retry number `retry` (0-based).
    pub fn delay_for(&self, retry: u32) -> Duration {
        let idx = (retry as usize).min(self.backoff.len().saturating_sub(1));
        self.backoff.get(idx).copied().unwrap_or_default()
    }

    /// Reject configuration that cannot work before any request is made.
    pub fn validate(&self) -> Result<()> {
        validate_api_key_format(&self.api_key)?;
        if self.base_url.trim().is_empty() {
            return Err(ClientError::Config("base URL must not be empty".to_string()));
        }
        if self.timeout.is_zero() {
            return Err(ClientError::Config("timeout must be positive".to_string()));
        }
        Ok(())
    }
}

/// Seam to the secret store that owns the API key.
pub trait CredentialSource: Send + Sync {
    /// The stored key, or `None` if none has been configured.
    fn api_key(&self) -> Result<Option<String>>;
}

/// Reads the key from `AGENTIC_API_KEY`.
#[derive(Debug, Clone, Copy, Default)]
pub struct EnvCredentials;

impl CredentialSource for EnvCredentials {
    fn api_key(&self) -> Result<Option<String>> {
        Ok(std::env::var(API_KEY_ENV)
            .ok()
            .map(|key| key.trim().to_string())
            .filter(|key| !key.is_empty()))
    }
}

/// A key held in memory, for callers that already fetched it.
#[derive(Clone)]
pub struct StaticCredentials(pub Option<String>);

impl CredentialSource for StaticCredentials {
    fn api_key(&self) -> Result<Option<String>> {
        Ok(self.0.clone())
    }
}
