//! Contract for the component that moves requests over the wire

use async_trait::async_trait;

use crate::error::CoreResult;
use crate::request::ApiRequest;

/// Sends one request and returns the response body.
///
/// Implementations must be safe for concurrent use and map every I/O
/// failure, timeouts included, to `CoreError::Transport`. Retrying is the
/// implementation's business; the engine never retries.
#[async_trait]
pub trait Transport: Send + Sync {
    async fn send(&self, request: &ApiRequest) -> CoreResult<String>;
}
