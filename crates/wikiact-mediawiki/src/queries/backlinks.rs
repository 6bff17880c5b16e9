use wikiact_core::{
    ApiRequest, ContinuationToken, CoreError, CoreResult, MediaWikiVersion, ParsedPage,
    QueryStrategy, ResponseFormat, Versioned,
};

use super::{check_limit, continue_from, list_request};
use crate::parse::json;

/// Which backlinks to report, by whether the linking page is a redirect.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum RedirectFilter {
    #[default]
    All,
    Redirects,
    NonRedirects,
}

impl RedirectFilter {
    fn as_param(&self) -> &'static str {
        match self {
            Self::All => "all",
            Self::Redirects => "redirects",
            Self::NonRedirects => "nonredirects",
        }
    }
}

/// Titles of pages linking to a page.
#[derive(Debug, Clone)]
pub struct Backlinks {
    title: String,
    namespaces: Vec<i32>,
    filter: RedirectFilter,
    limit: u32,
}

impl Versioned for Backlinks {
    const SUPPORTED_VERSIONS: &'static [MediaWikiVersion] = &[MediaWikiVersion::MW1_09];
}

impl Backlinks {
    pub fn new(title: &str, namespaces: &[i32], limit: u32) -> CoreResult<Self> {
        if title.trim().is_empty() {
            return Err(CoreError::invalid("backlink target must not be empty"));
        }
        Ok(Self {
            title: title.to_string(),
            namespaces: namespaces.to_vec(),
            filter: RedirectFilter::All,
            limit: check_limit(limit)?,
        })
    }

    pub fn with_filter(mut self, filter: RedirectFilter) -> Self {
        self.filter = filter;
        self
    }
}

impl QueryStrategy for Backlinks {
    type Item = String;

    fn name(&self) -> &str {
        "backlinks"
    }

    fn build_request(&self, token: &ContinuationToken) -> CoreResult<ApiRequest> {
        let builder = list_request("backlinks", ResponseFormat::Json)
            .param("bltitle", self.title.as_str())
            .namespaces("blnamespace", &self.namespaces)
            .param_if(self.filter != RedirectFilter::All, "blfilterredir", self.filter.as_param())
            .param("bllimit", self.limit.to_string());
        continue_from(builder, token)
    }

    fn parse(&self, response: &str) -> CoreResult<ParsedPage<String>> {
        json::list_page(response, "backlinks", json::title)
    }
}
