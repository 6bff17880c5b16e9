use wikiact_core::{
    ApiRequest, ContinuationToken, CoreError, CoreResult, MediaWikiVersion, ParsedPage,
    QueryStrategy, ResponseFormat, Versioned,
};

use super::{check_limit, continue_from, list_request};
use crate::actions::with_namespace;
use crate::parse::json;

/// Titles of the members of a category.
#[derive(Debug, Clone)]
pub struct CategoryMembers {
    category: String,
    namespaces: Vec<i32>,
    limit: u32,
}

impl Versioned for CategoryMembers {
    const SUPPORTED_VERSIONS: &'static [MediaWikiVersion] = &[MediaWikiVersion::MW1_11];
}

impl CategoryMembers {
    /// `category` may be given with or without its `Category:` prefix.
    pub fn new(category: &str, namespaces: &[i32], limit: u32) -> CoreResult<Self> {
        if category.trim().is_empty() {
            return Err(CoreError::invalid("category must not be empty"));
        }
        Ok(Self {
            category: with_namespace(category, "Category", &[]),
            namespaces: namespaces.to_vec(),
            limit: check_limit(limit)?,
        })
    }

    pub fn category(&self) -> &str {
        &self.category
    }
}

impl QueryStrategy for CategoryMembers {
    type Item = String;

    fn name(&self) -> &str {
        "categorymembers"
    }

    fn build_request(&self, token: &ContinuationToken) -> CoreResult<ApiRequest> {
        let builder = list_request("categorymembers", ResponseFormat::Json)
            .param("cmtitle", self.category.as_str())
            .namespaces("cmnamespace", &self.namespaces)
            .param("cmlimit", self.limit.to_string());
        continue_from(builder, token)
    }

    fn parse(&self, response: &str) -> CoreResult<ParsedPage<String>> {
        json::list_page(response, "categorymembers", json::title)
    }
}
