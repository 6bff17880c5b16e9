//! Paginated `list=` modules, expressed as [`QueryStrategy`](wikiact_core::QueryStrategy)s

mod allpages;
mod backlinks;
mod categorymembers;
mod imageusage;
mod logevents;
mod recentchanges;

pub use allpages::AllPages;
pub use backlinks::{Backlinks, RedirectFilter};
pub use categorymembers::CategoryMembers;
pub use imageusage::ImageUsage;
pub use logevents::{LogEvents, LogItem};
pub use recentchanges::RecentChanges;

use wikiact_core::{ApiRequest, ApiRequestBuilder, ContinuationToken, CoreError, CoreResult, ResponseFormat};

use crate::parse::merge_continuation;

/// Default page size when none is configured.
pub const DEFAULT_LIMIT: u32 = 50;

/// `action=query&list=<list>` in the given format. The opening request
/// asks for the `continue` protocol with an empty `continue` parameter.
pub(crate) fn list_request(list: &str, format: ResponseFormat) -> ApiRequestBuilder {
    ApiRequestBuilder::new()
        .action("query")
        .format(format)
        .param("continue", "")
        .param("list", list)
}

/// Finish a list request for the page identified by `token`.
pub(crate) fn continue_from(builder: ApiRequestBuilder, token: &ContinuationToken) -> CoreResult<ApiRequest> {
    let builder = match token {
        ContinuationToken::First => builder,
        ContinuationToken::Next(token) => merge_continuation(builder, token)?,
        ContinuationToken::Exhausted => {
            return Err(CoreError::ContractViolation(
                "no request exists past an exhausted continuation".to_string(),
            ))
        }
    };
    Ok(builder.build_get())
}

pub(crate) fn check_limit(limit: u32) -> CoreResult<u32> {
    if limit == 0 {
        return Err(CoreError::invalid("query limit must be greater than zero"));
    }
    Ok(limit)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_opening_request() {
        let request = continue_from(list_request("allpages", ResponseFormat::Json), &ContinuationToken::First).unwrap();
        assert_eq!(request.encoded_params(), "action=query&format=json&continue=&list=allpages");
    }

    #[test]
    fn test_continued_request() {
        let token = ContinuationToken::Next(r#"{"apcontinue":"B"}"#.to_string());
        let request = continue_from(list_request("allpages", ResponseFormat::Json), &token).unwrap();
        assert_eq!(request.param("apcontinue"), Some("B"));
        assert!(continue_from(list_request("allpages", ResponseFormat::Json), &ContinuationToken::Exhausted).is_err());
    }

    #[test]
    fn test_zero_limit() {
        assert!(check_limit(0).is_err());
        assert_eq!(check_limit(10).unwrap(), 10);
    }
}
