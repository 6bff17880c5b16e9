//! Per-request timeouts for the HTTP transport

use crate::connection::TimeoutConfig;
use crate::error::{ConnectorError, ConnectorResult};
use reqwest::ClientBuilder;
use std::future::Future;
use std::time::Duration;
use tokio::time::timeout;

// Anything above ten minutes is almost certainly a unit mix-up.
const MAX_REASONABLE_TIMEOUT_MS: u64 = 10 * 60 * 1000;

/// Applies connection-level timeouts to the client and bounds every request.
#[derive(Debug, Clone)]
pub struct TimeoutManager {
    config: TimeoutConfig,
}

impl TimeoutManager {
    pub fn new(config: TimeoutConfig) -> Self {
        Self { config }
    }

    /// Only the connect timeout goes on the client; the client is shared
    /// across requests.
    pub fn apply_to_client_builder(&self, builder: ClientBuilder) -> ClientBuilder {
        builder.connect_timeout(Duration::from_millis(self.config.connect_ms))
    }

    /// `read_ms` when set and within `total_ms`, otherwise `total_ms`.
    pub fn request_timeout(&self) -> Duration {
        if self.config.read_ms > 0 && self.config.read_ms <= self.config.total_ms {
            Duration::from_millis(self.config.read_ms)
        } else {
            Duration::from_millis(self.config.total_ms)
        }
    }

    /// Run one request under the request timeout, mapping timeouts and
    /// connect failures onto their own error variants.
    pub async fn execute_with_timeout<F, T>(&self, operation: F) -> ConnectorResult<T>
    where
        F: Future<Output = Result<T, reqwest::Error>>,
    {
        let request_timeout = self.request_timeout();

        match timeout(request_timeout, operation).await {
            Ok(Ok(result)) => Ok(result),
            Ok(Err(e)) if e.is_timeout() => Err(ConnectorError::Timeout(format!(
                "Request timed out after {}ms (read timeout)",
                request_timeout.as_millis()
            ))),
            Ok(Err(e)) if e.is_connect() => {
                Err(ConnectorError::Connection(format!("Connection failed: {}", e)))
            }
            Ok(Err(e)) => Err(ConnectorError::Http(e)),
            Err(_) => Err(ConnectorError::Timeout(format!(
                "Request timed out after {}ms (total timeout)",
                request_timeout.as_millis()
            ))),
        }
    }

    pub fn config(&self) -> &TimeoutConfig {
        &self.config
    }

    /// Rejects zero timeouts and phase timeouts longer than the whole request.
    pub fn validate(&self) -> ConnectorResult<()> {
        let TimeoutConfig {
            connect_ms,
            read_ms,
            total_ms,
        } = self.config;

        let problem = match () {
            _ if connect_ms == 0 => Some("connect_ms must be positive"),
            _ if total_ms == 0 => Some("total_ms must be positive"),
            _ if connect_ms > total_ms => Some("connect_ms exceeds total_ms"),
            _ if read_ms > total_ms => Some("read_ms exceeds total_ms"),
            _ => None,
        };
        if let Some(problem) = problem {
            return Err(ConnectorError::InvalidConfig(format!(
                "timeouts (connect {connect_ms}ms, read {read_ms}ms, total {total_ms}ms): {problem}"
            )));
        }

        if total_ms > MAX_REASONABLE_TIMEOUT_MS {
            tracing::warn!(total_ms, "total timeout above ten minutes");
        }
        Ok(())
    }
}
