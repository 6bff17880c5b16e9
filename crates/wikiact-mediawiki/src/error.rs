use wikiact_config::ConfigError;
use wikiact_connectors::ConnectorError;
use wikiact_core::CoreError;

#[derive(Debug, thiserror::Error)]
pub enum BotError {
    #[error(transparent)]
    Core(#[from] CoreError),

    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Transport setup failed: {0}")]
    Connector(#[from] ConnectorError),

    #[error("Permission denied: {0}")]
    Permission(String),

    #[error("Tracing setup failed: {0}")]
    Tracing(String),
}

impl BotError {
    pub fn permission(msg: impl Into<String>) -> Self {
        Self::Permission(msg.into())
    }

    /// The engine error underneath, if this is one.
    pub fn as_core(&self) -> Option<&CoreError> {
        match self {
            BotError::Core(e) => Some(e),
            _ => None,
        }
    }
}

pub type BotResult<T> = Result<T, BotError>;
