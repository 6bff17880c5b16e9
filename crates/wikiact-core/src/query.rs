//! Paginated queries that issue continuation requests on demand
//!
//! A [`QueryStrategy`] knows how to build the request for a given
//! continuation token and how to parse one page of results. The engine
//! turns it into a single ordered stream of items: every page is fetched
//! through an [`Action`] driven by the [`ActionRunner`], so queries share
//! the runner's error semantics.

use std::fmt;
use std::sync::Arc;

use futures::stream::{self, Stream};

use crate::action::{Action, SingleShot, Versioned};
use crate::error::{CoreError, CoreResult};
use crate::request::ApiRequest;
use crate::runner::ActionRunner;
use crate::version::MediaWikiVersion;

/// Opaque continuation marker handed out by the server.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ContinuationToken {
    /// No request issued yet
    First,
    /// More pages expected
    Next(String),
    /// The server signalled the end
    Exhausted,
}

impl ContinuationToken {
    /// Map the token extracted from a response; absent and empty both mean
    /// the sequence is exhausted.
    pub fn from_server(token: Option<String>) -> Self {
        match token {
            Some(token) if !token.is_empty() => Self::Next(token),
            _ => Self::Exhausted,
        }
    }

    /// The raw token when one is pending.
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Self::Next(token) => Some(token),
            _ => None,
        }
    }

    pub fn is_exhausted(&self) -> bool {
        matches!(self, Self::Exhausted)
    }
}

impl fmt::Display for ContinuationToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::First => f.write_str("<first>"),
            Self::Next(token) => f.write_str(token),
            Self::Exhausted => f.write_str("<exhausted>"),
        }
    }
}

/// Error indicator reported by a response parser.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ApiErrorInfo {
    pub code: String,
    pub info: String,
}

impl ApiErrorInfo {
    pub fn new(code: impl Into<String>, info: impl Into<String>) -> Self {
        Self {
            code: code.into(),
            info: info.into(),
        }
    }
}

impl From<ApiErrorInfo> for CoreError {
    fn from(err: ApiErrorInfo) -> Self {
        CoreError::Api {
            code: err.code,
            info: err.info,
        }
    }
}

/// What a parser extracts from one response: zero or more items, an
/// optional continuation token and an optional error indicator.
///
/// `received` counts the entries the server sent, before a parser drops
/// any of them (hidden log rows, duplicates). It can exceed `items.len()`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParsedPage<T> {
    pub items: Vec<T>,
    pub received: usize,
    pub continuation: Option<String>,
    pub error: Option<ApiErrorInfo>,
}

impl<T> ParsedPage<T> {
    pub fn new(items: Vec<T>, continuation: Option<String>) -> Self {
        Self {
            received: items.len(),
            items,
            continuation,
            error: None,
        }
    }

    /// Record how many entries the response held before filtering.
    pub fn with_received(mut self, received: usize) -> Self {
        self.received = received.max(self.items.len());
        self
    }

    pub fn failed(error: ApiErrorInfo) -> Self {
        Self {
            items: Vec::new(),
            received: 0,
            continuation: None,
            error: Some(error),
        }
    }
}

/// Items of one response together with the token found in that response.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QueryBatch<T> {
    pub items: Vec<T>,
    /// Entries in the response, filtered ones included
    pub received: usize,
    pub token: ContinuationToken,
}

impl<T> TryFrom<ParsedPage<T>> for QueryBatch<T> {
    type Error = CoreError;

    fn try_from(page: ParsedPage<T>) -> Result<Self, Self::Error> {
        if let Some(error) = page.error {
            return Err(error.into());
        }
        Ok(Self {
            items: page.items,
            received: page.received,
            token: ContinuationToken::from_server(page.continuation),
        })
    }
}

/// Request/parse pair describing one paginated API listing.
///
/// Implementations are immutable parameter records; all paging state lives
/// in [`ContinuableQuery`].
pub trait QueryStrategy: Versioned + Send + Sync + 'static {
    type Item: Send + 'static;

    /// Name used in log fields
    fn name(&self) -> &str;

    /// Request for the page identified by `token` (`First` for the opening request).
    fn build_request(&self, token: &ContinuationToken) -> CoreResult<ApiRequest>;

    /// Parse one response body.
    fn parse(&self, response: &str) -> CoreResult<ParsedPage<Self::Item>>;
}

/// Fetches a single page for a given token.
struct PageAction<'a, S: QueryStrategy> {
    strategy: &'a S,
    shot: SingleShot,
    batch: Option<QueryBatch<S::Item>>,
}

impl<'a, S: QueryStrategy> PageAction<'a, S> {
    fn new(strategy: &'a S, token: &ContinuationToken) -> CoreResult<Self> {
        let request = strategy.build_request(token)?;
        Ok(Self {
            strategy,
            shot: SingleShot::new(request),
            batch: None,
        })
    }

    fn into_batch(self) -> CoreResult<QueryBatch<S::Item>> {
        self.batch.ok_or_else(|| {
            CoreError::ContractViolation(format!(
                "page of '{}' finished without a batch",
                self.strategy.name()
            ))
        })
    }
}

impl<S: QueryStrategy> Action for PageAction<'_, S> {
    fn name(&self) -> &str {
        self.strategy.name()
    }

    fn build_next_request(&mut self) -> CoreResult<Option<ApiRequest>> {
        Ok(self.shot.next_request())
    }

    fn consume_response(&mut self, text: &str) -> CoreResult<()> {
        let page = self.strategy.parse(text)?;
        self.batch = Some(QueryBatch::try_from(page)?);
        self.shot.mark_complete();
        Ok(())
    }

    fn is_complete(&self) -> bool {
        self.shot.is_complete()
    }
}

/// Paging state of a traversal. Only `advance` moves between phases.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum QueryPhase {
    /// Nothing requested yet
    Pending,
    /// The last page carried a continuation token
    AwaitingContinuation,
    /// The server reported the end; remaining buffered items drain first
    Exhausted,
    /// A request or parse failed; the traversal cannot be resumed
    Failed,
}

/// One lazy traversal over a paginated listing.
pub struct ContinuableQuery<S: QueryStrategy> {
    strategy: Arc<S>,
    runner: ActionRunner,
    batch: std::vec::IntoIter<S::Item>,
    token: ContinuationToken,
    phase: QueryPhase,
    requests_issued: usize,
}

impl<S: QueryStrategy> ContinuableQuery<S> {
    fn fresh(strategy: Arc<S>, runner: ActionRunner) -> Self {
        Self {
            strategy,
            runner,
            batch: Vec::new().into_iter(),
            token: ContinuationToken::First,
            phase: QueryPhase::Pending,
            requests_issued: 0,
        }
    }

    pub fn phase(&self) -> QueryPhase {
        self.phase
    }

    pub fn token(&self) -> &ContinuationToken {
        &self.token
    }

    pub fn requests_issued(&self) -> usize {
        self.requests_issued
    }

    pub fn strategy(&self) -> &S {
        &self.strategy
    }

    /// A new traversal from the first page, sharing nothing but the
    /// immutable strategy with this one.
    pub fn restart(&self) -> Self {
        Self::fresh(Arc::clone(&self.strategy), self.runner.clone())
    }

    /// Next item, fetching the next page when the buffered one runs out.
    /// `Ok(None)` marks the end; once there, no further request is issued.
    pub async fn advance(&mut self) -> CoreResult<Option<S::Item>> {
        loop {
            if let Some(item) = self.batch.next() {
                return Ok(Some(item));
            }

            match self.phase {
                QueryPhase::Exhausted => return Ok(None),
                QueryPhase::Failed => {
                    return Err(CoreError::ContractViolation(format!(
                        "query '{}' already failed; start a fresh traversal",
                        self.strategy.name()
                    )))
                }
                QueryPhase::Pending | QueryPhase::AwaitingContinuation => {}
            }

            if let Err(e) = self.fetch_next_page().await {
                self.phase = QueryPhase::Failed;
                return Err(e);
            }
        }
    }

    async fn fetch_next_page(&mut self) -> CoreResult<()> {
        let mut page = PageAction::new(self.strategy.as_ref(), &self.token)?;
        self.requests_issued += 1;
        self.runner.run(&mut page).await?;
        let batch = page.into_batch()?;

        // a page whose entries were all filtered out is not empty
        if batch.received == 0 {
            if let ContinuationToken::Next(token) = &batch.token {
                return Err(CoreError::EmptyPage {
                    token: token.clone(),
                });
            }
        }

        tracing::debug!(
            query = %self.strategy.name(),
            page = self.requests_issued,
            items = batch.items.len(),
            received = batch.received,
            token_state = %batch.token,
            "Fetched page"
        );

        self.phase = if batch.token.is_exhausted() {
            QueryPhase::Exhausted
        } else {
            QueryPhase::AwaitingContinuation
        };
        self.token = batch.token;
        self.batch = batch.items.into_iter();
        Ok(())
    }

    /// Drain the whole traversal.
    pub async fn collect_all(&mut self) -> CoreResult<Vec<S::Item>> {
        let mut items = Vec::new();
        while let Some(item) = self.advance().await? {
            items.push(item);
        }
        Ok(items)
    }

    /// Adapt the traversal into a stream that ends after the first error.
    pub fn into_stream(self) -> impl Stream<Item = CoreResult<S::Item>> {
        stream::try_unfold(self, |mut query| async move {
            let next = query.advance().await?;
            Ok::<_, CoreError>(next.map(|item| (item, query)))
        })
    }
}

/// Immutable description of a query from which independent traversals are
/// built. The version gate runs once, here.
pub struct QueryFactory<S: QueryStrategy> {
    strategy: Arc<S>,
    runner: ActionRunner,
}

impl<S: QueryStrategy> Clone for QueryFactory<S> {
    fn clone(&self) -> Self {
        Self {
            strategy: Arc::clone(&self.strategy),
            runner: self.runner.clone(),
        }
    }
}

impl<S: QueryStrategy> std::fmt::Debug for QueryFactory<S> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("QueryFactory")
            .field("strategy", &self.strategy.name())
            .finish_non_exhaustive()
    }
}

impl<S: QueryStrategy> QueryFactory<S> {
    pub fn new(strategy: S, runner: ActionRunner, negotiated: MediaWikiVersion) -> CoreResult<Self> {
        S::admit(negotiated)?;
        Ok(Self {
            strategy: Arc::new(strategy),
            runner,
        })
    }

    pub fn strategy(&self) -> &S {
        &self.strategy
    }

    /// A traversal starting at the first page.
    pub fn traversal(&self) -> ContinuableQuery<S> {
        ContinuableQuery::fresh(Arc::clone(&self.strategy), self.runner.clone())
    }

    /// Convenience for `traversal().collect_all()`.
    pub async fn collect_all(&self) -> CoreResult<Vec<S::Item>> {
        self.traversal().collect_all().await
    }
}
