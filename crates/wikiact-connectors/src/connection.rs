use serde::{Deserialize, Serialize};
use wikiact_core::DEFAULT_API_PATH;

use crate::error::{ConnectorError, ConnectorResult};
use crate::timeout_manager::TimeoutManager;
use crate::url_builder::UrlBuilder;

pub const DEFAULT_USER_AGENT: &str = concat!("wikiact/", env!("CARGO_PKG_VERSION"));

/// Timeout configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct TimeoutConfig {
    pub connect_ms: u64,
    pub read_ms: u64,
    pub total_ms: u64,
}

impl Default for TimeoutConfig {
    fn default() -> Self {
        Self {
            connect_ms: 10_000, // 10 seconds
            read_ms: 30_000,    // 30 seconds
            total_ms: 60_000,   // 60 seconds
        }
    }
}

/// Retry policy configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RetryPolicy {
    pub max_retries: u32,
    pub initial_delay_ms: u64,
    pub max_delay_ms: u64,
    pub backoff_multiplier: f64,
    pub retry_on_status_codes: Vec<u16>,
    /// Also retry POST requests. Write actions are not idempotent, so this
    /// is off unless asked for.
    pub retry_post: bool,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_retries: 3,
            initial_delay_ms: 1000,
            max_delay_ms: 30000,
            backoff_multiplier: 2.0,
            retry_on_status_codes: vec![429, 500, 502, 503, 504],
            retry_post: false,
        }
    }
}

impl RetryPolicy {
    /// A policy that never retries.
    pub fn disabled() -> Self {
        Self {
            max_retries: 0,
            ..Self::default()
        }
    }
}

/// Where and how to reach a wiki's API endpoint.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WikiConnection {
    /// Host URL of the wiki, e.g. `https://en.wikipedia.org/w/`
    pub base_url: String,
    #[serde(default = "default_api_path")]
    pub api_path: String,
    #[serde(default = "default_user_agent")]
    pub user_agent: String,
    #[serde(default)]
    pub timeout_config: TimeoutConfig,
    #[serde(default)]
    pub retry_policy: RetryPolicy,
}

fn default_api_path() -> String {
    DEFAULT_API_PATH.to_string()
}

fn default_user_agent() -> String {
    DEFAULT_USER_AGENT.to_string()
}

impl WikiConnection {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            api_path: default_api_path(),
            user_agent: default_user_agent(),
            timeout_config: TimeoutConfig::default(),
            retry_policy: RetryPolicy::default(),
        }
    }

    pub fn with_api_path(mut self, api_path: impl Into<String>) -> Self {
        self.api_path = api_path.into();
        self
    }

    pub fn with_user_agent(mut self, user_agent: impl Into<String>) -> Self {
        self.user_agent = user_agent.into();
        self
    }

    pub fn with_timeouts(mut self, timeout_config: TimeoutConfig) -> Self {
        self.timeout_config = timeout_config;
        self
    }

    pub fn with_retry_policy(mut self, retry_policy: RetryPolicy) -> Self {
        self.retry_policy = retry_policy;
        self
    }

    /// Absolute URL of the API endpoint.
    pub fn endpoint(&self) -> ConnectorResult<String> {
        UrlBuilder::join(&self.base_url, &self.api_path)
    }

    pub fn validate(&self) -> ConnectorResult<()> {
        UrlBuilder::validate(&self.base_url)?;
        if self.user_agent.trim().is_empty() {
            return Err(ConnectorError::InvalidConfig(
                "User agent must not be empty".to_string(),
            ));
        }
        if self.retry_policy.backoff_multiplier < 1.0 {
            return Err(ConnectorError::InvalidConfig(
                "Backoff multiplier must be at least 1.0".to_string(),
            ));
        }
        TimeoutManager::new(self.timeout_config.clone()).validate()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_from_minimal_json() {
        let conn: WikiConnection =
            serde_json::from_str(r#"{"base_url": "https://wiki.example.org/w/"}"#).unwrap();
        assert_eq!(conn.api_path, "api.php");
        assert_eq!(conn.user_agent, DEFAULT_USER_AGENT);
        assert_eq!(conn.timeout_config, TimeoutConfig::default());
        assert!(!conn.retry_policy.retry_post);
        assert_eq!(
            conn.endpoint().unwrap(),
            "https://wiki.example.org/w/api.php"
        );
    }

    #[test]
    fn test_endpoint_without_trailing_slash() {
        let conn = WikiConnection::new("https://wiki.example.org/w");
        assert_eq!(
            conn.endpoint().unwrap(),
            "https://wiki.example.org/w/api.php"
        );
    }

    #[test]
    fn test_validate() {
        assert!(WikiConnection::new("https://wiki.example.org/").validate().is_ok());
        assert!(WikiConnection::new("not a url").validate().is_err());
        assert!(WikiConnection::new("https://wiki.example.org/")
            .with_user_agent("  ")
            .validate()
            .is_err());

        let bad_timeouts = TimeoutConfig {
            connect_ms: 5_000,
            read_ms: 1_000,
            total_ms: 1_000,
        };
        assert!(WikiConnection::new("https://wiki.example.org/")
            .with_timeouts(bad_timeouts)
            .validate()
            .is_err());
    }
}
