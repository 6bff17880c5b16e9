use wikiact_core::{
    Action, ApiRequest, ChainedAction, CoreError, CoreResult, MediaWikiVersion, PrimaryBuilder,
    SingleShot, Versioned,
};

use super::token::{TokenRequest, TokenType};
use super::json_request;
use crate::parse::json;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeleteResult {
    pub title: String,
    pub reason: String,
    pub log_id: Option<u64>,
}

#[derive(Debug, Clone)]
pub struct DeleteTarget {
    title: String,
    reason: Option<String>,
}

#[derive(Debug)]
pub struct DeleteSubmit {
    shot: SingleShot,
    result: Option<DeleteResult>,
}

impl PrimaryBuilder for DeleteTarget {
    type Action = DeleteSubmit;

    fn build(self, token: String) -> CoreResult<DeleteSubmit> {
        let request = json_request("delete")
            .param("title", self.title)
            .param_opt("reason", self.reason.filter(|r| !r.is_empty()))
            .param("token", token)
            .build_post();
        Ok(DeleteSubmit {
            shot: SingleShot::new(request),
            result: None,
        })
    }
}

impl Action for DeleteSubmit {
    fn name(&self) -> &str {
        "delete"
    }

    fn build_next_request(&mut self) -> CoreResult<Option<ApiRequest>> {
        Ok(self.shot.next_request())
    }

    fn consume_response(&mut self, text: &str) -> CoreResult<()> {
        let value = json::parse(text)?;
        json::check(&value)?;

        let deleted = value
            .get("delete")
            .ok_or_else(|| CoreError::parse("unknown reply; not a response to a delete"))?;
        let result = DeleteResult {
            title: json::str_field(deleted, "title").unwrap_or_default(),
            reason: json::str_field(deleted, "reason").unwrap_or_default(),
            log_id: deleted.get("logid").and_then(|id| id.as_u64()),
        };

        tracing::info!(title = %result.title, reason = %result.reason, "Deleted page");
        self.result = Some(result);
        self.shot.mark_complete();
        Ok(())
    }

    fn is_complete(&self) -> bool {
        self.shot.is_complete()
    }
}

/// Deletes a page: fetch a delete token, then post the deletion.
pub struct DeletePage {
    chain: ChainedAction<TokenRequest, DeleteTarget>,
}

impl Versioned for DeletePage {
    const SUPPORTED_VERSIONS: &'static [MediaWikiVersion] = &[MediaWikiVersion::MW1_12];
}

impl DeletePage {
    pub fn new(title: &str, reason: Option<&str>, version: MediaWikiVersion) -> CoreResult<Self> {
        if title.trim().is_empty() {
            return Err(CoreError::invalid("title must not be empty"));
        }
        Self::admit(version)?;
        let token = TokenRequest::new(TokenType::Delete, title, version)?;
        let target = DeleteTarget {
            title: title.to_string(),
            reason: reason.map(str::to_string),
        };
        Ok(Self {
            chain: ChainedAction::new("delete_page", token, target),
        })
    }

    pub fn result(&self) -> Option<&DeleteResult> {
        self.chain.primary().and_then(|submit| submit.result.as_ref())
    }
}

delegate_action!(DeletePage, chain);
