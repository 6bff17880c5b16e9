//! Masking of credentials before requests and responses reach the logs

use serde_json::{Map, Value as JsonValue};

/// Parameter and field names that are always masked
const SENSITIVE_FIELDS: &[&str] = &[
    "token",
    "lgtoken",
    "lgpassword",
    "password",
    "passwd",
    "secret",
    "authorization",
    "cookie",
];

/// Substrings that mark a name as sensitive (case-insensitive)
const SENSITIVE_PATTERNS: &[&str] = &["token", "password", "secret"];

pub const SANITIZED_PLACEHOLDER: &str = "***REDACTED***";

/// Check if a parameter or field name carries credentials
pub fn is_sensitive_field(field_name: &str) -> bool {
    let field_lower = field_name.to_lowercase();

    if SENSITIVE_FIELDS.iter().any(|&sensitive| field_lower == sensitive) {
        return true;
    }

    SENSITIVE_PATTERNS
        .iter()
        .any(|&pattern| field_lower.contains(pattern))
}

/// Value to log for a request parameter
pub fn sanitize_param(key: &str, value: &str) -> String {
    if is_sensitive_field(key) && !value.is_empty() {
        SANITIZED_PLACEHOLDER.to_string()
    } else {
        value.to_string()
    }
}

/// Sanitize a JSON response body by replacing sensitive fields with placeholders
pub fn sanitize_json_value(value: &JsonValue) -> JsonValue {
    match value {
        JsonValue::Object(map) => {
            let sanitized: Map<String, JsonValue> = map
                .iter()
                .map(|(key, val)| {
                    let val = match val {
                        JsonValue::String(_) | JsonValue::Number(_) | JsonValue::Bool(_)
                            if is_sensitive_field(key) =>
                        {
                            JsonValue::String(SANITIZED_PLACEHOLDER.to_string())
                        }
                        other => sanitize_json_value(other),
                    };
                    (key.clone(), val)
                })
                .collect();
            JsonValue::Object(sanitized)
        }
        JsonValue::Array(arr) => JsonValue::Array(arr.iter().map(sanitize_json_value).collect()),
        other => other.clone(),
    }
}

/// Log-safe rendering of a response body. Non-JSON bodies are truncated.
pub fn sanitize_response(body: &str, max_len: usize) -> String {
    if let Ok(json) = serde_json::from_str::<JsonValue>(body) {
        return sanitize_json_value(&json).to_string();
    }
    if body.len() <= max_len {
        return body.to_string();
    }
    let mut end = max_len;
    while !body.is_char_boundary(end) {
        end -= 1;
    }
    format!("{}... ({} bytes)", &body[..end], body.len())
}
