//! Client configuration loaded from environment variables with explicit
//! overrides. Values here are endpoints and tuning knobs, never secrets.

use std::env;
use std::time::Duration;

/// Default per-request timeout applied to all API calls.
const DEFAULT_TIMEOUT_MS: u64 = 10_000;

const ENV_API_BASE_URL: &str = "GARDISTO_API_BASE_URL";
const ENV_TIMEOUT_MS: &str = "GARDISTO_TIMEOUT_MS";
const ENV_USER_AGENT: &str = "GARDISTO_USER_AGENT";

/// User agent reported to the backend unless overridden.
pub const APP_USER_AGENT: &str = concat!(env!("CARGO_PKG_NAME"), "/", env!("CARGO_PKG_VERSION"));

#[derive(Clone, Debug)]
pub struct ClientConfig {
    pub api_base_url: String,
    pub timeout: Duration,
    pub user_agent: String,
}

impl ClientConfig {
    /// Builds a config with the given base URL and default timeout/agent.
    pub fn new(api_base_url: impl Into<String>) -> Self {
        Self {
            api_base_url: api_base_url.into(),
            timeout: Duration::from_millis(DEFAULT_TIMEOUT_MS),
            user_agent: APP_USER_AGENT.to_string(),
        }
    }

    /// Loads config from the `GARDISTO_*` environment variables.
    ///
    /// Missing or malformed values fall back to defaults; the base URL is
    /// validated later when the client is built, so deployments get one
    /// consistent error path for a bad endpoint.
    #[must_use]
    pub fn from_env() -> Self {
        let api_base_url = read_env(ENV_API_BASE_URL).unwrap_or_default();
        let timeout = read_env(ENV_TIMEOUT_MS)
            .and_then(|value| value.parse::<u64>().ok())
            .filter(|millis| *millis > 0)
            .map_or(Duration::from_millis(DEFAULT_TIMEOUT_MS), Duration::from_millis);
        let user_agent = read_env(ENV_USER_AGENT).unwrap_or_else(|| APP_USER_AGENT.to_string());

        Self {
            api_base_url,
            timeout,
            user_agent,
        }
    }

    #[must_use]
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    #[must_use]
    pub fn with_user_agent(mut self, user_agent: impl Into<String>) -> Self {
        self.user_agent = user_agent.into();
        self
    }
}

fn read_env(name: &str) -> Option<String> {
    let value = env::var(name).ok()?;
    let trimmed = value.trim();
    if trimmed.is_empty() {
        None
    } else {
        Some(trimmed.to_string())
    }
}
