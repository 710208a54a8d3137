//! Client configuration.
//!
//! A [`ClientConfig`] is built once through [`ClientConfigBuilder`] and never
//! changes afterwards; a client with different settings needs a new config.
//!
//! The worst-case duration of a single operation compounds: every attempt may
//! run for the full `timeout`, so a call can take up to
//! `timeout * (max_retries + 1)` plus the linear backoff
//! (`backoff_unit * (1 + 2 + ... + max_retries)`) plus one `rate_limit_delay`
//! per 429 response. Keep that in mind when pairing long timeouts with many
//! retries.

use std::fmt;
use std::time::Duration;

use reqwest::Url;

use crate::error::{Error, Result};

pub const DEFAULT_BASE_URL: &str = "https://api.jwtrevoke.com";
pub const DEFAULT_MAX_RETRIES: usize = 3;
pub const DEFAULT_RATE_LIMIT_DELAY: Duration = Duration::from_secs(1);
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(10);
pub const DEFAULT_BACKOFF_UNIT: Duration = Duration::from_secs(1);

/// Immutable settings shared by every request a client makes.
#[derive(Clone)]
pub struct ClientConfig {
    api_key: String,
    base_url: Url,
    max_retries: usize,
    rate_limit_delay: Duration,
    timeout: Duration,
    backoff_unit: Duration,
    user_agent: String,
}

impl ClientConfig {
    /// Starts a builder for the given API key.
    pub fn builder(api_key: impl Into<String>) -> ClientConfigBuilder {
        ClientConfigBuilder::new(api_key)
    }

    /// Configuration with every default applied.
    pub fn new(api_key: impl Into<String>) -> Result<Self> {
        Self::builder(api_key).build()
    }

    pub fn api_key(&self) -> &str {
        &self.api_key
    }

    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    /// Retries after the first attempt; total attempts are `max_retries + 1`.
    pub fn max_retries(&self) -> usize {
        self.max_retries
    }

    pub fn rate_limit_delay(&self) -> Duration {
        self.rate_limit_delay
    }

    /// Per-attempt request timeout.
    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    /// Attempt `k` (counting from zero) waits `k * backoff_unit` before sending.
    pub fn backoff_unit(&self) -> Duration {
        self.backoff_unit
    }

    pub fn user_agent(&self) -> &str {
        &self.user_agent
    }
}

impl fmt::Debug for ClientConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ClientConfig")
            .field("api_key", &"<redacted>")
            .field("base_url", &self.base_url.as_str())
            .field("max_retries", &self.max_retries)
            .field("rate_limit_delay", &self.rate_limit_delay)
            .field("timeout", &self.timeout)
            .field("backoff_unit", &self.backoff_unit)
            .field("user_agent", &self.user_agent)
            .finish()
    }
}

/// Consuming builder for [`ClientConfig`]. Unset fields take the defaults above.
#[derive(Clone)]
pub struct ClientConfigBuilder {
    api_key: String,
    base_url: Option<String>,
    max_retries: usize,
    rate_limit_delay: Duration,
    timeout: Duration,
    backoff_unit: Duration,
    user_agent: Option<String>,
}

impl ClientConfigBuilder {
    pub fn new(api_key: impl Into<String>) -> Self {
        Self {
            api_key: api_key.into(),
            base_url: None,
            max_retries: DEFAULT_MAX_RETRIES,
            rate_limit_delay: DEFAULT_RATE_LIMIT_DELAY,
            timeout: DEFAULT_TIMEOUT,
            backoff_unit: DEFAULT_BACKOFF_UNIT,
            user_agent: None,
        }
    }

    pub fn base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = Some(base_url.into());
        self
    }

    pub fn max_retries(mut self, retries: usize) -> Self {
        self.max_retries = retries;
        self
    }

    pub fn rate_limit_delay(mut self, delay: Duration) -> Self {
        self.rate_limit_delay = delay;
        self
    }

    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn backoff_unit(mut self, unit: Duration) -> Self {
        self.backoff_unit = unit;
        self
    }

    pub fn user_agent(mut self, user_agent: impl Into<String>) -> Self {
        self.user_agent = Some(user_agent.into());
        self
    }

    /// Validates the collected settings.
    pub fn build(self) -> Result<ClientConfig> {
        let api_key = self.api_key.trim().to_string();
        if api_key.is_empty() {
            return Err(Error::InvalidConfig("API key must not be empty".to_string()));
        }

        let raw_url = self.base_url.as_deref().unwrap_or(DEFAULT_BASE_URL);
        let base_url = Url::parse(raw_url.trim_end_matches('/'))
            .map_err(|e| Error::InvalidConfig(format!("invalid base URL {:?}: {}", raw_url, e)))?;
        if base_url.cannot_be_a_base() {
            return Err(Error::InvalidConfig(format!(
                "base URL {:?} cannot carry a path",
                raw_url
            )));
        }

        let user_agent = self
            .user_agent
            .unwrap_or_else(|| format!("jwtrevoke/{}", env!("JWTREVOKE_VERSION")));

        Ok(ClientConfig {
            api_key,
            base_url,
            max_retries: self.max_retries,
            rate_limit_delay: self.rate_limit_delay,
            timeout: self.timeout,
            backoff_unit: self.backoff_unit,
            user_agent,
        })
    }
}
