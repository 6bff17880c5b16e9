//! Core engine for driving actions against a versioned wiki API.
//!
//! Concrete API operations implement [`Action`]; the [`ActionRunner`]
//! exchanges their requests and responses over a [`Transport`]. Paginated
//! listings are described by a [`QueryStrategy`] and traversed lazily
//! through [`ContinuableQuery`]. Token-protected operations are composed
//! with [`ChainedAction`].

pub mod action;
pub mod chain;
pub mod error;
pub mod query;
pub mod request;
pub mod runner;
pub mod sanitization;
pub mod transport;
pub mod version;

#[cfg(any(test, feature = "testing"))]
pub mod testing;

pub use action::{Action, SingleShot, TokenSource, Versioned};
pub use chain::{ChainedAction, PrimaryBuilder};
pub use error::{CoreError, CoreResult};
pub use query::{
    ApiErrorInfo, ContinuableQuery, ContinuationToken, ParsedPage, QueryBatch, QueryFactory,
    QueryPhase, QueryStrategy,
};
pub use request::{
    ApiRequest, ApiRequestBuilder, HttpMethod, ResponseFormat, DEFAULT_API_PATH,
};
pub use runner::ActionRunner;
pub use transport::Transport;
pub use version::{MediaWikiVersion, VersionGate};
