use serde_json::Value;
use wikiact_core::{Action, ApiRequest, CoreError, CoreResult, MediaWikiVersion, SingleShot, Versioned};

use super::json_request;
use crate::parse::json;

/// The latest revision of a page, or content about to be written.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SimpleArticle {
    pub title: String,
    pub text: String,
    pub revision_id: Option<u64>,
    pub timestamp: Option<String>,
    pub user: Option<String>,
    pub edit_summary: String,
    pub minor_edit: bool,
}

impl SimpleArticle {
    pub fn new(title: impl Into<String>, text: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            text: text.into(),
            ..Default::default()
        }
    }

    pub fn with_summary(mut self, summary: impl Into<String>) -> Self {
        self.edit_summary = summary.into();
        self
    }

    pub fn minor(mut self, minor: bool) -> Self {
        self.minor_edit = minor;
        self
    }
}

/// Reads the current content of one page.
#[derive(Debug)]
pub struct GetRevision {
    shot: SingleShot,
    article: Option<SimpleArticle>,
}

impl Versioned for GetRevision {
    const SUPPORTED_VERSIONS: &'static [MediaWikiVersion] = &[MediaWikiVersion::MW1_09];
}

impl GetRevision {
    pub fn new(title: &str, version: MediaWikiVersion) -> CoreResult<Self> {
        if title.trim().is_empty() {
            return Err(CoreError::invalid("title must not be empty"));
        }
        Self::admit(version)?;

        let request = json_request("query")
            .param("prop", "revisions")
            .param("rvprop", "ids|timestamp|user|comment|content")
            .param_if(version.greater_eq(&MediaWikiVersion::MW1_31), "rvslots", "main")
            .param("titles", title)
            .build_get();
        Ok(Self {
            shot: SingleShot::new(request),
            article: None,
        })
    }

    pub fn article(&self) -> Option<&SimpleArticle> {
        self.article.as_ref()
    }

    pub fn into_article(self) -> Option<SimpleArticle> {
        self.article
    }
}

/// Content lives under `slots.main` since 1.31, directly on the revision before.
fn revision_text(revision: &Value) -> Option<String> {
    revision
        .pointer("/slots/main")
        .and_then(|main| json::str_field(main, "*").or_else(|| json::str_field(main, "content")))
        .or_else(|| json::str_field(revision, "*"))
}

impl Action for GetRevision {
    fn name(&self) -> &str {
        "get_revision"
    }

    fn build_next_request(&mut self) -> CoreResult<Option<ApiRequest>> {
        Ok(self.shot.next_request())
    }

    fn consume_response(&mut self, text: &str) -> CoreResult<()> {
        let value = json::parse(text)?;
        json::check(&value)?;

        let page = json::first_page(&value)?;
        let title = json::str_field(page, "title").unwrap_or_default();
        if json::flag(page, "missing") || json::flag(page, "invalid") {
            return Err(CoreError::api("missingtitle", format!("page '{}' does not exist", title)));
        }

        let revision = page
            .get("revisions")
            .and_then(|revisions| revisions.get(0))
            .ok_or_else(|| CoreError::parse(format!("no revision returned for '{}'", title)))?;

        let article = SimpleArticle {
            title,
            text: revision_text(revision).unwrap_or_default(),
            revision_id: revision.get("revid").and_then(Value::as_u64),
            timestamp: json::str_field(revision, "timestamp"),
            user: json::str_field(revision, "user"),
            edit_summary: json::str_field(revision, "comment").unwrap_or_default(),
            minor_edit: json::flag(revision, "minor"),
        };

        tracing::debug!(title = %article.title, revision = ?article.revision_id, "Revision fetched");
        self.article = Some(article);
        self.shot.mark_complete();
        Ok(())
    }

    fn is_complete(&self) -> bool {
        self.shot.is_complete()
    }
}
