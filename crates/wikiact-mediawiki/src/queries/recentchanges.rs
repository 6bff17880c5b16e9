use std::collections::HashSet;

use wikiact_core::{
    ApiRequest, ContinuationToken, CoreResult, MediaWikiVersion, ParsedPage, QueryStrategy,
    ResponseFormat, Versioned,
};

use super::{check_limit, continue_from, list_request};
use crate::parse::json;

/// Titles of recently changed pages, newest first.
#[derive(Debug, Clone)]
pub struct RecentChanges {
    namespaces: Vec<i32>,
    limit: u32,
    unique: bool,
}

impl Versioned for RecentChanges {
    const SUPPORTED_VERSIONS: &'static [MediaWikiVersion] = &[MediaWikiVersion::MW1_09];
}

impl RecentChanges {
    pub fn new(namespaces: &[i32], limit: u32) -> CoreResult<Self> {
        Ok(Self {
            namespaces: namespaces.to_vec(),
            limit: check_limit(limit)?,
            unique: false,
        })
    }

    /// Report each title at most once per page.
    pub fn unique(mut self) -> Self {
        self.unique = true;
        self
    }
}

impl QueryStrategy for RecentChanges {
    type Item = String;

    fn name(&self) -> &str {
        "recentchanges"
    }

    fn build_request(&self, token: &ContinuationToken) -> CoreResult<ApiRequest> {
        let builder = list_request("recentchanges", ResponseFormat::Json)
            .param("rcprop", "title|timestamp|ids")
            .namespaces("rcnamespace", &self.namespaces)
            .param("rclimit", self.limit.to_string());
        continue_from(builder, token)
    }

    fn parse(&self, response: &str) -> CoreResult<ParsedPage<String>> {
        let mut page = json::list_page(response, "recentchanges", json::title)?;
        if self.unique {
            let mut seen = HashSet::new();
            page.items.retain(|title| seen.insert(title.clone()));
        }
        Ok(page)
    }
}
