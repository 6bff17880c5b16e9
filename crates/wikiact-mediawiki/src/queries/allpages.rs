use wikiact_core::{
    ApiRequest, ContinuationToken, CoreResult, MediaWikiVersion, ParsedPage, QueryStrategy,
    ResponseFormat, Versioned,
};

use super::{check_limit, continue_from, list_request};
use crate::parse::json;

/// Titles of all pages in one namespace, optionally starting with a prefix.
#[derive(Debug, Clone)]
pub struct AllPages {
    namespace: i32,
    prefix: Option<String>,
    limit: u32,
}

impl Versioned for AllPages {
    const SUPPORTED_VERSIONS: &'static [MediaWikiVersion] = &[MediaWikiVersion::MW1_09];
}

impl AllPages {
    pub fn new(namespace: i32, limit: u32) -> CoreResult<Self> {
        Ok(Self {
            namespace,
            prefix: None,
            limit: check_limit(limit)?,
        })
    }

    pub fn with_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.prefix = Some(prefix.into()).filter(|p| !p.is_empty());
        self
    }
}

impl QueryStrategy for AllPages {
    type Item = String;

    fn name(&self) -> &str {
        "allpages"
    }

    fn build_request(&self, token: &ContinuationToken) -> CoreResult<ApiRequest> {
        let builder = list_request("allpages", ResponseFormat::Json)
            .param("apnamespace", self.namespace.to_string())
            .param_opt("apprefix", self.prefix.as_deref())
            .param("aplimit", self.limit.to_string());
        continue_from(builder, token)
    }

    fn parse(&self, response: &str) -> CoreResult<ParsedPage<String>> {
        json::list_page(response, "allpages", json::title)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use wikiact_core::testing::ScriptedTransport;
    use wikiact_core::{ActionRunner, QueryFactory};

    #[tokio::test]
    async fn test_all_pages_with_prefix() {
        let transport = Arc::new(ScriptedTransport::new([
            r#"{"continue":{"apcontinue":"Foo_c","continue":"-||"},"query":{"allpages":[{"pageid":1,"ns":0,"title":"Foo a"},{"pageid":2,"ns":0,"title":"Foo b"}]}}"#,
            r#"{"batchcomplete":"","query":{"allpages":[{"pageid":3,"ns":0,"title":"Foo c"}]}}"#,
        ]));
        let strategy = AllPages::new(0, 2).unwrap().with_prefix("Foo");
        let factory = QueryFactory::new(strategy, ActionRunner::new(transport.clone()), MediaWikiVersion::MW1_39).unwrap();

        let titles = factory.collect_all().await.unwrap();
        assert_eq!(titles, vec!["Foo a", "Foo b", "Foo c"]);

        let requests = transport.requests();
        assert_eq!(requests[0].param("apprefix"), Some("Foo"));
        assert_eq!(requests[0].param("aplimit"), Some("2"));
        assert_eq!(requests[0].param("apcontinue"), None);
        assert_eq!(requests[1].param("apcontinue"), Some("Foo_c"));
        assert_eq!(requests[1].param("continue"), Some("-||"));
    }
}
