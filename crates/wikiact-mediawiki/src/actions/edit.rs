use wikiact_core::{
    Action, ApiRequest, ChainedAction, CoreError, CoreResult, MediaWikiVersion, PrimaryBuilder,
    SingleShot, Versioned,
};

use super::revision::SimpleArticle;
use super::token::{TokenRequest, TokenType};
use super::json_request;
use crate::parse::json;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EditResult {
    pub title: String,
    pub result: String,
    /// Absent when the edit changed nothing.
    pub new_revid: Option<u64>,
}

#[derive(Debug, Clone)]
pub struct EditTarget {
    article: SimpleArticle,
    bot: bool,
}

#[derive(Debug)]
pub struct EditSubmit {
    shot: SingleShot,
    result: Option<EditResult>,
}

impl PrimaryBuilder for EditTarget {
    type Action = EditSubmit;

    fn build(self, token: String) -> CoreResult<EditSubmit> {
        let SimpleArticle {
            title,
            text,
            edit_summary,
            minor_edit,
            ..
        } = self.article;

        let request = json_request("edit")
            .param("title", title)
            .param("text", text)
            .param("summary", edit_summary)
            .param_if(minor_edit, "minor", "")
            .param_if(self.bot, "bot", "")
            .param("token", token)
            .build_post();
        Ok(EditSubmit {
            shot: SingleShot::new(request),
            result: None,
        })
    }
}

impl Action for EditSubmit {
    fn name(&self) -> &str {
        "edit"
    }

    fn build_next_request(&mut self) -> CoreResult<Option<ApiRequest>> {
        Ok(self.shot.next_request())
    }

    fn consume_response(&mut self, text: &str) -> CoreResult<()> {
        let value = json::parse(text)?;
        json::check(&value)?;

        let edit = value
            .get("edit")
            .ok_or_else(|| CoreError::parse("unknown reply; not a response to an edit"))?;
        let result = json::str_field(edit, "result").unwrap_or_default();
        if result != "Success" {
            return Err(CoreError::api(
                result.to_lowercase(),
                json::str_field(edit, "info").unwrap_or_else(|| format!("edit ended with '{}'", result)),
            ));
        }

        let result = EditResult {
            title: json::str_field(edit, "title").unwrap_or_default(),
            result,
            new_revid: edit.get("newrevid").and_then(|id| id.as_u64()),
        };
        tracing::info!(title = %result.title, revision = ?result.new_revid, "Saved page");
        self.result = Some(result);
        self.shot.mark_complete();
        Ok(())
    }

    fn is_complete(&self) -> bool {
        self.shot.is_complete()
    }
}

/// Replaces the text of a page: fetch an edit token, then post the new
/// content.
pub struct EditPage {
    chain: ChainedAction<TokenRequest, EditTarget>,
}

impl Versioned for EditPage {
    const SUPPORTED_VERSIONS: &'static [MediaWikiVersion] = &[MediaWikiVersion::MW1_13];
}

impl EditPage {
    pub fn new(article: SimpleArticle, version: MediaWikiVersion) -> CoreResult<Self> {
        if article.title.trim().is_empty() {
            return Err(CoreError::invalid("title must not be empty"));
        }
        Self::admit(version)?;
        let token = TokenRequest::new(TokenType::Edit, &article.title, version)?;
        Ok(Self {
            chain: ChainedAction::new("edit_page", token, EditTarget { article, bot: false }),
        })
    }

    /// Flag the edit as made by a bot. Only valid before the action runs.
    pub fn as_bot(mut self) -> Self {
        if let Some(target) = self.chain.builder_mut() {
            target.bot = true;
        }
        self
    }

    pub fn result(&self) -> Option<&EditResult> {
        self.chain.primary().and_then(|submit| submit.result.as_ref())
    }
}

delegate_action!(EditPage, chain);
