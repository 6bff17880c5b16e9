//! `${VAR}` and `${VAR:default}` substitution inside a parsed config tree

use std::sync::OnceLock;

use regex::Regex;
use serde_json::{Map, Value as JsonValue};
use thiserror::Error;

const REFERENCE: &str = r"\$\{([A-Za-z_][A-Za-z0-9_]*)(?::([^}]*))?\}";

/// Substituted values may contain references again; expansion stops after
/// this many rounds.
const DEFAULT_MAX_ROUNDS: usize = 8;

#[derive(Debug, Error)]
pub enum EnvResolverError {
    #[error("environment variable '{name}' is not set and has no default")]
    Missing { name: String },

    #[error("environment variable '{name}' is not allowed; permitted prefixes: {allowed}")]
    NotAllowed { name: String, allowed: String },

    #[error("'{0}' still contains references after expansion; is a variable referring to itself?")]
    TooDeep(String),

    #[error("invalid reference pattern: {0}")]
    Pattern(String),
}

fn reference_pattern() -> Result<&'static Regex, EnvResolverError> {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    if let Some(re) = PATTERN.get() {
        return Ok(re);
    }
    let re = Regex::new(REFERENCE).map_err(|e| EnvResolverError::Pattern(e.to_string()))?;
    Ok(PATTERN.get_or_init(|| re))
}

/// Expands references in every string of a config tree.
///
/// Only names starting with one of the allowed prefixes are looked up, so a
/// bot config cannot read arbitrary process environment. An empty prefix
/// list allows everything.
#[derive(Debug, Clone)]
pub struct EnvResolver {
    allowed_prefixes: Vec<String>,
    max_rounds: usize,
}

impl Default for EnvResolver {
    fn default() -> Self {
        Self::new(["WIKIACT_", "MW_", "HTTP_", "LOG_"].map(String::from).to_vec())
    }
}

impl EnvResolver {
    pub fn new(allowed_prefixes: Vec<String>) -> Self {
        Self {
            allowed_prefixes,
            max_rounds: DEFAULT_MAX_ROUNDS,
        }
    }

    pub fn unrestricted() -> Self {
        Self::new(Vec::new())
    }

    pub fn with_max_rounds(mut self, rounds: usize) -> Self {
        self.max_rounds = rounds;
        self
    }

    pub fn allowed_prefixes(&self) -> &[String] {
        &self.allowed_prefixes
    }

    /// Expand against the process environment.
    pub fn resolve(&self, value: &JsonValue) -> Result<JsonValue, EnvResolverError> {
        self.resolve_with(value, &|name| std::env::var(name).ok())
    }

    /// Expand against an arbitrary variable source.
    pub fn resolve_with(
        &self,
        value: &JsonValue,
        lookup: &dyn Fn(&str) -> Option<String>,
    ) -> Result<JsonValue, EnvResolverError> {
        Ok(match value {
            JsonValue::String(text) if text.contains("${") => coerce_scalar(self.expand(text, lookup)?),
            JsonValue::Object(entries) => {
                let mut out = Map::with_capacity(entries.len());
                for (key, entry) in entries {
                    out.insert(key.clone(), self.resolve_with(entry, lookup)?);
                }
                JsonValue::Object(out)
            }
            JsonValue::Array(items) => JsonValue::Array(
                items
                    .iter()
                    .map(|item| self.resolve_with(item, lookup))
                    .collect::<Result<_, _>>()?,
            ),
            other => other.clone(),
        })
    }

    fn expand(&self, text: &str, lookup: &dyn Fn(&str) -> Option<String>) -> Result<String, EnvResolverError> {
        let pattern = reference_pattern()?;
        let mut current = text.to_string();

        for _ in 0..self.max_rounds {
            if !pattern.is_match(&current) {
                return Ok(current);
            }

            let mut next = String::with_capacity(current.len());
            let mut last = 0;
            for caps in pattern.captures_iter(&current) {
                let whole = caps.get(0).map_or(0..0, |m| m.range());
                let name = &caps[1];
                self.check_allowed(name)?;

                let value = match (lookup(name), caps.get(2)) {
                    (Some(value), _) => value,
                    (None, Some(default)) => default.as_str().to_string(),
                    (None, None) => return Err(EnvResolverError::Missing { name: name.to_string() }),
                };
                next.push_str(&current[last..whole.start]);
                next.push_str(&value);
                last = whole.end;
            }
            next.push_str(&current[last..]);
            current = next;
        }

        if pattern.is_match(&current) {
            return Err(EnvResolverError::TooDeep(text.to_string()));
        }
        Ok(current)
    }

    fn check_allowed(&self, name: &str) -> Result<(), EnvResolverError> {
        if self.allowed_prefixes.is_empty() || self.allowed_prefixes.iter().any(|p| name.starts_with(p.as_str())) {
            return Ok(());
        }
        Err(EnvResolverError::NotAllowed {
            name: name.to_string(),
            allowed: self.allowed_prefixes.join(", "),
        })
    }
}

/// Expanded text that reads as a bool, a number or JSON becomes that value,
/// so `"${HTTP_TIMEOUT:5000}"` can feed an integer field.
fn coerce_scalar(text: String) -> JsonValue {
    if text.starts_with('{') || text.starts_with('[') {
        return serde_json::from_str(&text).unwrap_or(JsonValue::String(text));
    }
    if let Ok(flag) = text.parse::<bool>() {
        return JsonValue::Bool(flag);
    }
    if let Ok(int) = text.parse::<i64>() {
        return JsonValue::Number(int.into());
    }
    match text.parse::<f64>().ok().and_then(serde_json::Number::from_f64) {
        Some(number) => JsonValue::Number(number),
        None => JsonValue::String(text),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use std::collections::HashMap;

    fn vars(pairs: &[(&str, &str)]) -> HashMap<String, String> {
        pairs.iter().map(|(k, v)| (k.to_string(), v.to_string())).collect()
    }

    fn resolve(value: JsonValue, env: &HashMap<String, String>) -> Result<JsonValue, EnvResolverError> {
        EnvResolver::default().resolve_with(&value, &|name| env.get(name).cloned())
    }

    #[test]
    fn test_substitution_and_defaults() {
        let env = vars(&[("MW_HOST", "wiki.example.org")]);
        assert_eq!(
            resolve(json!("https://${MW_HOST}/w/"), &env).unwrap(),
            json!("https://wiki.example.org/w/")
        );
        assert_eq!(resolve(json!("${MW_USER:Bot}"), &env).unwrap(), json!("Bot"));
        assert_eq!(resolve(json!("plain $ text"), &env).unwrap(), json!("plain $ text"));
    }

    #[test]
    fn test_missing_and_not_allowed() {
        let env = vars(&[("HOME", "/root")]);
        assert!(matches!(
            resolve(json!("${MW_PASSWORD}"), &env),
            Err(EnvResolverError::Missing { ref name }) if name == "MW_PASSWORD"
        ));
        assert!(matches!(
            resolve(json!("${HOME}"), &env),
            Err(EnvResolverError::NotAllowed { .. })
        ));
        assert!(EnvResolver::unrestricted()
            .resolve_with(&json!("${HOME}"), &|name| env.get(name).cloned())
            .is_ok());
    }

    #[test]
    fn test_tree_and_coercion() {
        let env = vars(&[("HTTP_TIMEOUT", "15000"), ("WIKIACT_URL", "https://wiki.example.org/w/")]);
        let input = json!({
            "connection": {
                "base_url": "${WIKIACT_URL}",
                "timeout_config": { "total_ms": "${HTTP_TIMEOUT}" },
                "retry_policy": { "retry_on_status_codes": ["${HTTP_RETRY:503}"] }
            },
            "logging": { "json": "${LOG_JSON:false}", "level": "info" }
        });

        assert_eq!(
            resolve(input, &env).unwrap(),
            json!({
                "connection": {
                    "base_url": "https://wiki.example.org/w/",
                    "timeout_config": { "total_ms": 15000 },
                    "retry_policy": { "retry_on_status_codes": [503] }
                },
                "logging": { "json": false, "level": "info" }
            })
        );
    }

    #[test]
    fn test_nested_reference() {
        let env = vars(&[("MW_API", "${MW_HOST}/api.php"), ("MW_HOST", "https://wiki.example.org")]);
        assert_eq!(
            resolve(json!("${MW_API}"), &env).unwrap(),
            json!("https://wiki.example.org/api.php")
        );
    }

    #[test]
    fn test_self_reference_is_bounded() {
        let env = vars(&[("WIKIACT_LOOP", "${WIKIACT_LOOP}")]);
        assert!(matches!(
            resolve(json!("${WIKIACT_LOOP}"), &env),
            Err(EnvResolverError::TooDeep(_))
        ));
    }

    #[test]
    fn test_process_environment() {
        std::env::set_var("WIKIACT_ENV_RESOLVER_TEST", "from-env");
        assert_eq!(
            EnvResolver::default().resolve(&json!("${WIKIACT_ENV_RESOLVER_TEST}")).unwrap(),
            json!("from-env")
        );
        std::env::remove_var("WIKIACT_ENV_RESOLVER_TEST");
    }
}
