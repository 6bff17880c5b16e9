use std::time::Duration;

use wikiact_core::CoreError;

#[derive(Debug, thiserror::Error)]
pub enum ConnectorError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Unexpected status {status}: {body}")]
    Status {
        status: u16,
        body: String,
        /// Parsed `Retry-After` header
        retry_after: Option<Duration>,
    },

    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("Timeout: {0}")]
    Timeout(String),

    #[error("Connection error: {0}")]
    Connection(String),

    #[error("Retry stopped: {reason} (error: {source})")]
    RetriesExhausted {
        reason: String,
        #[source]
        source: Box<ConnectorError>,
    },
}

impl ConnectorError {
    pub fn status_code(&self) -> Option<u16> {
        match self {
            ConnectorError::Status { status, .. } => Some(*status),
            ConnectorError::Http(e) => e.status().map(|s| s.as_u16()),
            ConnectorError::RetriesExhausted { source, .. } => source.status_code(),
            _ => None,
        }
    }

    /// Wait time the server asked for, if any.
    pub fn retry_after(&self) -> Option<Duration> {
        match self {
            ConnectorError::Status { retry_after, .. } => *retry_after,
            _ => None,
        }
    }
}

// Configuration problems surface at construction; everything else is a
// failed exchange.
impl From<ConnectorError> for CoreError {
    fn from(err: ConnectorError) -> Self {
        match err {
            ConnectorError::InvalidConfig(msg) => CoreError::InvalidArgument(msg),
            other => CoreError::Transport(other.to_string()),
        }
    }
}

pub type ConnectorResult<T> = Result<T, ConnectorError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_conversion_into_core_error() {
        let core: CoreError = ConnectorError::Timeout("after 10ms".to_string()).into();
        assert!(core.is_transport());

        let core: CoreError = ConnectorError::InvalidConfig("no host".to_string()).into();
        assert!(matches!(core, CoreError::InvalidArgument(_)));
    }

    #[test]
    fn test_status_code_through_exhausted_retries() {
        let err = ConnectorError::RetriesExhausted {
            reason: "Maximum retry attempts (3) exceeded".to_string(),
            source: Box::new(ConnectorError::Status {
                status: 503,
                body: String::new(),
                retry_after: None,
            }),
        };
        assert_eq!(err.status_code(), Some(503));
        assert!(err.to_string().contains("Maximum retry attempts"));
    }
}
