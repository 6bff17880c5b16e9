use serde_json::Value;
use wikiact_core::{
    ApiRequest, ContinuationToken, CoreResult, MediaWikiVersion, ParsedPage, QueryStrategy,
    ResponseFormat, Versioned,
};

use super::{check_limit, continue_from, list_request};
use crate::parse::json;

/// One entry of a wiki log.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LogItem {
    pub title: String,
    pub user: String,
    pub log_type: String,
    pub action: String,
    pub timestamp: String,
}

impl LogItem {
    fn from_entry(entry: &Value) -> CoreResult<Option<Self>> {
        // suppressed entries carry no title
        let Some(title) = json::str_field(entry, "title") else {
            return Ok(None);
        };
        Ok(Some(Self {
            title,
            user: json::str_field(entry, "user").unwrap_or_default(),
            log_type: json::str_field(entry, "type").unwrap_or_default(),
            action: json::str_field(entry, "action").unwrap_or_default(),
            timestamp: json::str_field(entry, "timestamp").unwrap_or_default(),
        }))
    }
}

/// Log events, optionally restricted to one log type (`delete`, `move`, ...).
#[derive(Debug, Clone)]
pub struct LogEvents {
    log_type: Option<String>,
    limit: u32,
}

impl Versioned for LogEvents {
    const SUPPORTED_VERSIONS: &'static [MediaWikiVersion] = &[MediaWikiVersion::MW1_11];
}

impl LogEvents {
    pub fn new(log_type: Option<&str>, limit: u32) -> CoreResult<Self> {
        Ok(Self {
            log_type: log_type.filter(|t| !t.is_empty()).map(str::to_string),
            limit: check_limit(limit)?,
        })
    }
}

impl QueryStrategy for LogEvents {
    type Item = LogItem;

    fn name(&self) -> &str {
        "logevents"
    }

    fn build_request(&self, token: &ContinuationToken) -> CoreResult<ApiRequest> {
        let builder = list_request("logevents", ResponseFormat::Json)
            .param("leprop", "title|type|user|timestamp")
            .param_opt("letype", self.log_type.as_deref())
            .param("lelimit", self.limit.to_string());
        continue_from(builder, token)
    }

    fn parse(&self, response: &str) -> CoreResult<ParsedPage<LogItem>> {
        json::list_page(response, "logevents", LogItem::from_entry)
    }
}
