use wikiact_core::{
    Action, ApiRequest, ChainedAction, CoreError, CoreResult, MediaWikiVersion, PrimaryBuilder,
    SingleShot, Versioned,
};

use super::token::{TokenRequest, TokenType};
use super::json_request;
use crate::parse::json;

/// Parameters of a page move.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MoveRequest {
    pub from: String,
    pub to: String,
    pub reason: Option<String>,
    pub move_talk: bool,
    pub move_subpages: bool,
    pub no_redirect: bool,
}

impl MoveRequest {
    /// Moves the talk page along; subpages stay, a redirect is left behind.
    pub fn new(from: impl Into<String>, to: impl Into<String>) -> Self {
        Self {
            from: from.into(),
            to: to.into(),
            reason: None,
            move_talk: true,
            move_subpages: false,
            no_redirect: false,
        }
    }

    pub fn with_reason(mut self, reason: impl Into<String>) -> Self {
        self.reason = Some(reason.into());
        self
    }

    pub fn with_subpages(mut self, move_subpages: bool) -> Self {
        self.move_subpages = move_subpages;
        self
    }

    pub fn without_redirect(mut self) -> Self {
        self.no_redirect = true;
        self
    }

    fn validate(&self) -> CoreResult<()> {
        if self.from.trim().is_empty() || self.to.trim().is_empty() {
            return Err(CoreError::invalid("source and target titles must not be empty"));
        }
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MoveResult {
    pub from: String,
    pub to: String,
    pub reason: String,
}

/// The `action=move` request itself.
#[derive(Debug)]
pub struct MoveSubmit {
    shot: SingleShot,
    result: Option<MoveResult>,
}

impl PrimaryBuilder for MoveRequest {
    type Action = MoveSubmit;

    fn build(self, token: String) -> CoreResult<MoveSubmit> {
        let request = json_request("move")
            .param("from", self.from)
            .param("to", self.to)
            .param_opt("reason", self.reason.filter(|r| !r.is_empty()))
            .param_if(self.move_talk, "movetalk", "")
            .param_if(self.move_subpages, "movesubpages", "")
            .param_if(self.no_redirect, "noredirect", "")
            .param("token", token)
            .build_post();
        Ok(MoveSubmit {
            shot: SingleShot::new(request),
            result: None,
        })
    }
}

impl Action for MoveSubmit {
    fn name(&self) -> &str {
        "move"
    }

    fn build_next_request(&mut self) -> CoreResult<Option<ApiRequest>> {
        Ok(self.shot.next_request())
    }

    fn consume_response(&mut self, text: &str) -> CoreResult<()> {
        let value = json::parse(text)?;
        json::check(&value)?;

        let moved = value
            .get("move")
            .ok_or_else(|| CoreError::parse("unknown reply; not a response to a move"))?;
        let result = MoveResult {
            from: json::str_field(moved, "from").unwrap_or_default(),
            to: json::str_field(moved, "to").unwrap_or_default(),
            reason: json::str_field(moved, "reason").unwrap_or_default(),
        };

        tracing::info!(from = %result.from, to = %result.to, reason = %result.reason, "Moved page");
        self.result = Some(result);
        self.shot.mark_complete();
        Ok(())
    }

    fn is_complete(&self) -> bool {
        self.shot.is_complete()
    }
}

/// Renames a page: fetch a move token, then post the move.
pub struct MovePage {
    chain: ChainedAction<TokenRequest, MoveRequest>,
}

impl Versioned for MovePage {
    const SUPPORTED_VERSIONS: &'static [MediaWikiVersion] = &[MediaWikiVersion::MW1_13];
}

impl MovePage {
    pub fn new(request: MoveRequest, version: MediaWikiVersion) -> CoreResult<Self> {
        request.validate()?;
        Self::admit(version)?;
        let token = TokenRequest::new(TokenType::Move, &request.from, version)?;
        Ok(Self {
            chain: ChainedAction::new("move_page", token, request),
        })
    }

    pub fn result(&self) -> Option<&MoveResult> {
        self.chain.primary().and_then(|submit| submit.result.as_ref())
    }
}

delegate_action!(MovePage, chain);

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use wikiact_core::testing::ScriptedTransport;
    use wikiact_core::ActionRunner;

    #[tokio::test]
    async fn test_move_after_token() {
        let transport = Arc::new(ScriptedTransport::new([
            r#"{"query":{"tokens":{"csrftoken":"abc+\\"}}}"#,
            r#"{"move":{"from":"Old","to":"New","reason":"cleanup","talkfrom":"Talk:Old","talkto":"Talk:New"}}"#,
        ]));
        let runner = ActionRunner::new(transport.clone());
        let request = MoveRequest::new("Old", "New").with_reason("cleanup").without_redirect();
        let mut action = MovePage::new(request, MediaWikiVersion::MW1_39).unwrap();

        runner.run(&mut action).await.unwrap();

        let result = action.result().unwrap();
        assert_eq!(result.to, "New");
        let requests = transport.requests();
        assert_eq!(
            requests[1].encoded_params(),
            "action=move&format=json&from=Old&to=New&reason=cleanup&movetalk=&noredirect=&token=abc%2B%5C"
        );
    }

    #[tokio::test]
    async fn test_missing_token_sends_no_move() {
        for response in [
            r#"{"query":{"tokens":{}}}"#,
            r#"{"query":{"tokens":{"csrftoken":""}}}"#,
        ] {
            let transport = Arc::new(ScriptedTransport::new([response]));
            let runner = ActionRunner::new(transport.clone());
            let mut action =
                MovePage::new(MoveRequest::new("Old", "New"), MediaWikiVersion::MW1_39).unwrap();

            let err = runner.run(&mut action).await.unwrap_err();
            assert!(matches!(err, CoreError::MissingToken { .. }), "{response}: {err}");
            assert_eq!(transport.request_count(), 1);
            assert!(action.result().is_none());
        }
    }

    #[tokio::test]
    async fn test_api_error_on_move() {
        let transport = Arc::new(ScriptedTransport::new([
            r#"{"query":{"tokens":{"csrftoken":"t"}}}"#,
            r#"{"error":{"code":"articleexists","info":"A page of that name already exists"}}"#,
        ]));
        let runner = ActionRunner::new(transport);
        let mut action =
            MovePage::new(MoveRequest::new("Old", "New"), MediaWikiVersion::MW1_39).unwrap();

        match runner.run(&mut action).await.unwrap_err() {
            CoreError::Api { code, .. } => assert_eq!(code, "articleexists"),
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_construction_checks() {
        assert!(matches!(
            MovePage::new(MoveRequest::new("", "New"), MediaWikiVersion::MW1_39),
            Err(CoreError::InvalidArgument(_))
        ));
        assert!(matches!(
            MovePage::new(MoveRequest::new("Old", "New"), MediaWikiVersion::MW1_12),
            Err(CoreError::UnsupportedVersion { .. })
        ));
        assert!(matches!(
            MovePage::new(MoveRequest::new("Old", "New"), MediaWikiVersion::Unknown),
            Err(CoreError::UnsupportedVersion { .. })
        ));
    }
}
