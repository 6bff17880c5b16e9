//! HTTP transport collaborator for wikiact.
//!
//! [`HttpTransport`] implements [`wikiact_core::Transport`] on top of a
//! cookie-keeping `reqwest` client. Timeouts and retries live here, never in
//! the core runner.

pub mod connection;
pub mod error;
pub mod retry_manager;
pub mod timeout_manager;
pub mod transport;
pub mod url_builder;

pub use connection::{RetryPolicy, TimeoutConfig, WikiConnection};
pub use error::{ConnectorError, ConnectorResult};
pub use retry_manager::{ErrorClassification, RetryDecision, RetryManager};
pub use timeout_manager::TimeoutManager;
pub use transport::HttpTransport;
pub use url_builder::UrlBuilder;
