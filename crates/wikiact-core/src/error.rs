use thiserror::Error;

use crate::version::MediaWikiVersion;

pub type CoreResult<T> = Result<T, CoreError>;

/// Errors surfaced by the action engine.
///
/// None of these are swallowed inside the engine; every one reaches the
/// caller of `ActionRunner::run` or `ContinuableQuery::advance`.
#[derive(Debug, Error)]
pub enum CoreError {
    #[error("unsupported version: {negotiated} (supported: {supported})")]
    UnsupportedVersion {
        negotiated: MediaWikiVersion,
        supported: String,
    },

    #[error("transport: {0}")]
    Transport(String),

    #[error("parse: {0}")]
    Parse(String),

    #[error("server announced continuation '{token}' but returned an empty page")]
    EmptyPage { token: String },

    #[error("prerequisite '{action}' produced no usable token")]
    MissingToken { action: String },

    #[error("api error [{code}]: {info}")]
    Api { code: String, info: String },

    #[error("action contract violated: {0}")]
    ContractViolation(String),

    #[error("invalid argument: {0}")]
    InvalidArgument(String),
}

impl CoreError {
    pub fn transport(msg: impl Into<String>) -> Self {
        Self::Transport(msg.into())
    }

    pub fn parse(msg: impl Into<String>) -> Self {
        Self::Parse(msg.into())
    }

    pub fn invalid(msg: impl Into<String>) -> Self {
        Self::InvalidArgument(msg.into())
    }

    pub fn api(code: impl Into<String>, info: impl Into<String>) -> Self {
        Self::Api {
            code: code.into(),
            info: info.into(),
        }
    }

    /// True for failures that happened on the wire rather than in our own logic.
    pub fn is_transport(&self) -> bool {
        matches!(self, Self::Transport(_))
    }
}

impl From<serde_json::Error> for CoreError {
    fn from(err: serde_json::Error) -> Self {
        Self::Parse(err.to_string())
    }
}
