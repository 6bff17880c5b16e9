//! `format=xml` responses
//!
//! API XML output is flat: every value of interest is an attribute of a
//! self-describing element, so elements are matched by tag and their
//! attributes collected. No DTDs, CDATA or namespaces are involved.

use std::sync::OnceLock;

use indexmap::IndexMap;
use regex::Regex;
use serde_json::{Map, Value};
use wikiact_core::{ApiErrorInfo, CoreError, CoreResult, ParsedPage};

pub type Attributes = IndexMap<String, String>;

fn attribute_pattern() -> CoreResult<&'static Regex> {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    if let Some(re) = PATTERN.get() {
        return Ok(re);
    }
    let re = Regex::new(r#"([A-Za-z_][\w:.-]*)\s*=\s*"([^"]*)""#)
        .map_err(|e| CoreError::parse(e.to_string()))?;
    Ok(PATTERN.get_or_init(|| re))
}

fn tag_pattern(tag: &str) -> CoreResult<Regex> {
    Regex::new(&format!(r"<{}(\s[^>]*?)?\s*/?>", regex::escape(tag)))
        .map_err(|e| CoreError::parse(e.to_string()))
}

/// Replace the predefined entities and numeric character references.
pub fn decode_entities(text: &str) -> String {
    if !text.contains('&') {
        return text.to_string();
    }

    let mut out = String::with_capacity(text.len());
    let mut rest = text;
    while let Some(start) = rest.find('&') {
        out.push_str(&rest[..start]);
        let candidate = &rest[start..];
        let decoded = candidate.find(';').and_then(|end| {
            let entity = &candidate[1..end];
            let ch = match entity {
                "amp" => Some('&'),
                "lt" => Some('<'),
                "gt" => Some('>'),
                "quot" => Some('"'),
                "apos" => Some('\''),
                _ => entity
                    .strip_prefix("#x")
                    .or_else(|| entity.strip_prefix("#X"))
                    .and_then(|hex| u32::from_str_radix(hex, 16).ok())
                    .or_else(|| entity.strip_prefix('#').and_then(|dec| dec.parse().ok()))
                    .and_then(char::from_u32),
            };
            ch.map(|c| (c, end + 1))
        });

        match decoded {
            Some((c, consumed)) => {
                out.push(c);
                rest = &candidate[consumed..];
            }
            None => {
                out.push('&');
                rest = &candidate[1..];
            }
        }
    }
    out.push_str(rest);
    out
}

fn attributes(raw: &str) -> CoreResult<Attributes> {
    Ok(attribute_pattern()?
        .captures_iter(raw)
        .map(|caps| (caps[1].to_string(), decode_entities(&caps[2])))
        .collect())
}

/// Attributes of every `<tag .../>` or `<tag ...>` element, in document order.
pub fn elements(xml: &str, tag: &str) -> CoreResult<Vec<Attributes>> {
    tag_pattern(tag)?
        .captures_iter(xml)
        .map(|caps| attributes(caps.get(1).map_or("", |m| m.as_str())))
        .collect()
}

pub fn first_element(xml: &str, tag: &str) -> CoreResult<Option<Attributes>> {
    Ok(elements(xml, tag)?.into_iter().next())
}

/// The text between `<container ...>` and `</container>`, if present.
pub fn section<'a>(xml: &'a str, container: &str) -> CoreResult<Option<&'a str>> {
    let open = match tag_pattern(container)?.find(xml) {
        Some(m) => m,
        None => return Ok(None),
    };
    let body = &xml[open.end()..];
    Ok(body.find(&format!("</{}>", container)).map(|end| &body[..end]))
}

pub fn api_error(xml: &str) -> CoreResult<Option<ApiErrorInfo>> {
    Ok(first_element(xml, "error")?.map(|attrs| {
        ApiErrorInfo::new(
            attrs.get("code").cloned().unwrap_or_else(|| "unknown".to_string()),
            attrs.get("info").cloned().unwrap_or_default(),
        )
    }))
}

/// Continuation as an opaque token: the attributes of `<continue/>`, or of
/// `<module/>` inside `<query-continue>` on older servers.
pub fn continuation(xml: &str, module: &str) -> CoreResult<Option<String>> {
    let attrs = match first_element(xml, "continue")? {
        Some(attrs) => Some(attrs),
        None => match section(xml, "query-continue")? {
            Some(legacy) => first_element(legacy, module)?,
            None => None,
        },
    };

    Ok(attrs.filter(|a| !a.is_empty()).map(|a| {
        let map: Map<String, Value> = a.into_iter().map(|(k, v)| (k, Value::String(v))).collect();
        Value::Object(map).to_string()
    }))
}

/// Parse one page of a `list=` module whose entries are `<tag/>` elements.
pub fn list_page<T, F>(xml: &str, module: &str, tag: &str, mut item: F) -> CoreResult<ParsedPage<T>>
where
    F: FnMut(Attributes) -> Option<T>,
{
    if !xml.trim_start().starts_with('<') {
        return Err(CoreError::parse("response is not XML"));
    }
    if let Some(error) = api_error(xml)? {
        return Ok(ParsedPage::failed(error));
    }

    let entries = elements(xml, tag)?;
    let received = entries.len();
    let items = entries.into_iter().filter_map(&mut item).collect();
    Ok(ParsedPage::new(items, continuation(xml, module)?).with_received(received))
}
