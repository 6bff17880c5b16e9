//! Two-phase actions: fetch a token, then run the action that needs it

use crate::action::{Action, TokenSource};
use crate::error::{CoreError, CoreResult};
use crate::request::ApiRequest;

/// Builds the primary action once the prerequisite has produced a token.
pub trait PrimaryBuilder: Send {
    type Action: Action;

    fn build(self, token: String) -> CoreResult<Self::Action>;
}

impl<F, A> PrimaryBuilder for F
where
    F: FnOnce(String) -> CoreResult<A> + Send,
    A: Action,
{
    type Action = A;

    fn build(self, token: String) -> CoreResult<A> {
        self(token)
    }
}

/// Runs a token-fetching prerequisite to completion, then a primary action
/// parameterized by that token, presenting both as one [`Action`].
///
/// The primary is not constructed until the token is known. A missing or
/// empty token fails with [`CoreError::MissingToken`] and the primary never
/// sends anything.
pub struct ChainedAction<P, B>
where
    P: TokenSource,
    B: PrimaryBuilder,
{
    name: String,
    prerequisite: P,
    builder: Option<B>,
    primary: Option<B::Action>,
}

impl<P, B> ChainedAction<P, B>
where
    P: TokenSource,
    B: PrimaryBuilder,
{
    pub fn new(name: impl Into<String>, prerequisite: P, builder: B) -> Self {
        Self {
            name: name.into(),
            prerequisite,
            builder: Some(builder),
            primary: None,
        }
    }

    pub fn prerequisite(&self) -> &P {
        &self.prerequisite
    }

    /// The primary action, once the token has been obtained.
    pub fn primary(&self) -> Option<&B::Action> {
        self.primary.as_ref()
    }

    /// The pending builder; `None` once the primary has been built.
    pub fn builder_mut(&mut self) -> Option<&mut B> {
        self.builder.as_mut()
    }

    fn ensure_primary(&mut self) -> CoreResult<&mut B::Action> {
        if self.primary.is_none() {
            let token = self
                .prerequisite
                .token()
                .filter(|token| !token.is_empty())
                .ok_or_else(|| CoreError::MissingToken {
                    action: self.name.clone(),
                })?
                .to_string();
            let builder = self.builder.take().ok_or_else(|| {
                CoreError::ContractViolation(format!(
                    "primary of '{}' could not be built earlier",
                    self.name
                ))
            })?;

            tracing::debug!(action = %self.name, prerequisite = %self.prerequisite.name(), "Token obtained");
            self.primary = Some(builder.build(token)?);
        }

        self.primary
            .as_mut()
            .ok_or_else(|| CoreError::ContractViolation(format!("primary of '{}' missing", self.name)))
    }
}

impl<P, B> Action for ChainedAction<P, B>
where
    P: TokenSource,
    B: PrimaryBuilder,
{
    fn name(&self) -> &str {
        &self.name
    }

    fn build_next_request(&mut self) -> CoreResult<Option<ApiRequest>> {
        if !self.prerequisite.is_complete() {
            return self.prerequisite.build_next_request();
        }
        self.ensure_primary()?.build_next_request()
    }

    fn consume_response(&mut self, text: &str) -> CoreResult<()> {
        if !self.prerequisite.is_complete() {
            self.prerequisite.consume_response(text)?;
            if self.prerequisite.is_complete() {
                self.ensure_primary()?;
            }
            return Ok(());
        }
        self.ensure_primary()?.consume_response(text)
    }

    fn is_complete(&self) -> bool {
        self.prerequisite.is_complete()
            && self.primary.as_ref().is_some_and(|primary| primary.is_complete())
    }
}
