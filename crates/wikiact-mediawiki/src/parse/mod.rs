//! Response parsing helpers shared by actions and queries

pub mod json;
pub mod xml;

use wikiact_core::{ApiRequestBuilder, CoreError, CoreResult};

/// Merge an opaque continuation token (a serialized JSON object of request
/// parameters) into a request.
pub fn merge_continuation(builder: ApiRequestBuilder, token: &str) -> CoreResult<ApiRequestBuilder> {
    let params: serde_json::Map<String, serde_json::Value> = serde_json::from_str(token)
        .map_err(|e| CoreError::parse(format!("malformed continuation token '{}': {}", token, e)))?;
    Ok(builder.params(params.into_iter().map(|(k, v)| (k, json::scalar_to_string(&v)))))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_merge_continuation_replaces_in_place() {
        let request = merge_continuation(
            ApiRequestBuilder::new()
                .action("query")
                .param("continue", "")
                .param("list", "allpages"),
            r#"{"apcontinue":"Foo","continue":"-||"}"#,
        )
        .unwrap()
        .build_get();

        assert_eq!(
            request.encoded_params(),
            "action=query&continue=-%7C%7C&list=allpages&apcontinue=Foo"
        );
    }

    #[test]
    fn test_malformed_token() {
        assert!(matches!(
            merge_continuation(ApiRequestBuilder::new(), "not json"),
            Err(CoreError::Parse(_))
        ));
    }
}
