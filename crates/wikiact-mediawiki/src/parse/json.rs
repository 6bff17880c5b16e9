//! `format=json` responses

use serde_json::{Map, Value};
use wikiact_core::sanitization::sanitize_response;
use wikiact_core::{ApiErrorInfo, CoreError, CoreResult, ParsedPage};

const SNIPPET_LEN: usize = 120;

/// Parse a response body, reporting a short sanitized excerpt on failure.
pub fn parse(text: &str) -> CoreResult<Value> {
    serde_json::from_str(text).map_err(|e| {
        CoreError::parse(format!(
            "invalid JSON response ({}): {}",
            e,
            sanitize_response(text, SNIPPET_LEN)
        ))
    })
}

/// The `error` object of a response, if present.
pub fn api_error(value: &Value) -> Option<ApiErrorInfo> {
    let error = value.get("error")?;
    Some(ApiErrorInfo::new(
        str_field(error, "code").unwrap_or_else(|| "unknown".to_string()),
        str_field(error, "info").unwrap_or_default(),
    ))
}

/// Fail with [`CoreError::Api`] when the response carries an error.
pub fn check(value: &Value) -> CoreResult<()> {
    match api_error(value) {
        Some(error) => Err(error.into()),
        None => Ok(()),
    }
}

/// Continuation parameters as an opaque token.
///
/// Servers since 1.21 return a top-level `continue` object; older ones
/// return `query-continue` keyed by module, which is flattened.
pub fn continuation(value: &Value) -> Option<String> {
    let params = match value.get("continue").and_then(Value::as_object) {
        Some(obj) => obj.clone(),
        None => {
            let legacy = value.get("query-continue")?.as_object()?;
            let mut flat = Map::new();
            for module in legacy.values().filter_map(Value::as_object) {
                flat.extend(module.iter().map(|(k, v)| (k.clone(), v.clone())));
            }
            flat
        }
    };

    if params.is_empty() {
        None
    } else {
        Some(Value::Object(params).to_string())
    }
}

pub fn scalar_to_string(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        Value::Null => String::new(),
        other => other.to_string(),
    }
}

pub fn str_field(value: &Value, key: &str) -> Option<String> {
    value.get(key).map(scalar_to_string)
}

/// In `formatversion=1` output boolean flags are present-or-absent keys.
pub fn flag(value: &Value, key: &str) -> bool {
    match value.get(key) {
        Some(Value::Bool(b)) => *b,
        Some(_) => true,
        None => false,
    }
}

pub fn string_list(value: &Value, key: &str) -> Vec<String> {
    value
        .get(key)
        .and_then(Value::as_array)
        .map(|items| items.iter().map(scalar_to_string).collect())
        .unwrap_or_default()
}

/// The first entry of `query.pages`.
pub fn first_page(value: &Value) -> CoreResult<&Value> {
    value
        .pointer("/query/pages")
        .and_then(|pages| match pages {
            Value::Object(map) => map.values().next(),
            Value::Array(list) => list.first(),
            _ => None,
        })
        .ok_or_else(|| CoreError::parse("response has no query.pages entry"))
}

/// Parse one page of a `list=` module: items under `query.<list>` plus the
/// continuation.
pub fn list_page<T, F>(text: &str, list: &str, mut item: F) -> CoreResult<ParsedPage<T>>
where
    F: FnMut(&Value) -> CoreResult<Option<T>>,
{
    let value = parse(text)?;
    if let Some(error) = api_error(&value) {
        return Ok(ParsedPage::failed(error));
    }

    let mut items = Vec::new();
    let mut received = 0;
    if let Some(entries) = value.get("query").and_then(|q| q.get(list)) {
        let entries = entries
            .as_array()
            .ok_or_else(|| CoreError::parse(format!("query.{} is not a list", list)))?;
        received = entries.len();
        for entry in entries {
            if let Some(parsed) = item(entry)? {
                items.push(parsed);
            }
        }
    }

    Ok(ParsedPage::new(items, continuation(&value)).with_received(received))
}

/// The `title` field of a list entry.
pub fn title(entry: &Value) -> CoreResult<Option<String>> {
    Ok(str_field(entry, "title"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_api_error() {
        let value = json!({"error": {"code": "badtoken", "info": "Invalid CSRF token."}});
        let err = check(&value).unwrap_err();
        assert!(matches!(err, CoreError::Api { ref code, .. } if code == "badtoken"));
        assert!(check(&json!({"batchcomplete": ""})).is_ok());
    }

    #[test]
    fn test_modern_continuation() {
        let value = json!({"continue": {"rccontinue": "20240101|42", "continue": "-||"}});
        let token = continuation(&value).unwrap();
        let parsed: Value = serde_json::from_str(&token).unwrap();
        assert_eq!(parsed["rccontinue"], "20240101|42");
        assert_eq!(parsed["continue"], "-||");
    }

    #[test]
    fn test_legacy_continuation_is_flattened() {
        let value = json!({"query-continue": {"imageusage": {"iucontinue": "6|Foo.png|12"}}});
        assert_eq!(
            continuation(&value).unwrap(),
            r#"{"iucontinue":"6|Foo.png|12"}"#
        );
        assert!(continuation(&json!({"batchcomplete": ""})).is_none());
    }

    #[test]
    fn test_list_page() {
        let text = r#"{"continue":{"apcontinue":"C"},"query":{"allpages":[{"title":"A"},{"title":"B"}]}}"#;
        let page = list_page(text, "allpages", title).unwrap();
        assert_eq!(page.items, vec!["A", "B"]);
        assert!(page.continuation.is_some());

        // entries without a title still count as received
        let text = r#"{"continue":{"rccontinue":"x"},"query":{"recentchanges":[{"rcid":1,"actionhidden":""}]}}"#;
        let page = list_page(text, "recentchanges", title).unwrap();
        assert!(page.items.is_empty());
        assert_eq!(page.received, 1);

        let page = list_page(r#"{"error":{"code":"x","info":"y"}}"#, "allpages", title).unwrap();
        assert_eq!(page.error.unwrap().code, "x");

        assert!(list_page("<html>", "allpages", title).is_err());
    }

    #[test]
    fn test_flags_and_pages() {
        let value = json!({"query": {"pages": {"-1": {"title": "Nope", "missing": ""}}}});
        let page = first_page(&value).unwrap();
        assert!(flag(page, "missing"));
        assert!(!flag(page, "redirect"));
        assert!(first_page(&json!({"query": {}})).is_err());
    }
}
