//! Outgoing request model
//!
//! Parameters keep insertion order so that a request always serializes to
//! the same string, which keeps logs and tests reproducible.

use std::fmt;

use indexmap::IndexMap;

use crate::sanitization::sanitize_param;

/// Default API entry point relative to the wiki's script path.
pub const DEFAULT_API_PATH: &str = "api.php";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum HttpMethod {
    Get,
    Post,
}

impl HttpMethod {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Get => "GET",
            Self::Post => "POST",
        }
    }
}

impl fmt::Display for HttpMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Wire format requested from the server. The engine itself never looks
/// at the body; parsers are chosen by whoever builds the request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum ResponseFormat {
    #[default]
    Json,
    Xml,
}

impl ResponseFormat {
    pub fn as_param(&self) -> &'static str {
        match self {
            Self::Json => "json",
            Self::Xml => "xml",
        }
    }
}

/// A single API call: method, target path and ordered, unique parameters.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ApiRequest {
    method: HttpMethod,
    path: String,
    params: IndexMap<String, String>,
}

impl ApiRequest {
    pub fn new(method: HttpMethod, path: impl Into<String>) -> Self {
        Self {
            method,
            path: path.into(),
            params: IndexMap::new(),
        }
    }

    pub fn method(&self) -> HttpMethod {
        self.method
    }

    pub fn path(&self) -> &str {
        &self.path
    }

    pub fn params(&self) -> &IndexMap<String, String> {
        &self.params
    }

    pub fn param(&self, key: &str) -> Option<&str> {
        self.params.get(key).map(String::as_str)
    }

    /// Insert or replace a parameter. A replaced key keeps its original position.
    pub fn set_param(&mut self, key: impl Into<String>, value: impl Into<String>) {
        self.params.insert(key.into(), value.into());
    }

    /// `k=v&k2=v2` in insertion order, percent-encoded.
    pub fn encoded_params(&self) -> String {
        self.params
            .iter()
            .map(|(k, v)| format!("{}={}", percent_encode(k), percent_encode(v)))
            .collect::<Vec<_>>()
            .join("&")
    }

    /// Path plus query string, the GET form of the request.
    pub fn to_url_path(&self) -> String {
        if self.params.is_empty() {
            self.path.clone()
        } else {
            format!("{}?{}", self.path, self.encoded_params())
        }
    }

    /// Copy with credential-like values masked, safe to log.
    pub fn sanitized(&self) -> Self {
        Self {
            method: self.method,
            path: self.path.clone(),
            params: self
                .params
                .iter()
                .map(|(k, v)| (k.clone(), sanitize_param(k, v)))
                .collect(),
        }
    }
}

impl fmt::Display for ApiRequest {
    /// Always prints the sanitized form.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.method, self.sanitized().to_url_path())
    }
}

/// Percent-encode every byte outside the RFC 3986 unreserved set
/// (`A-Z a-z 0-9 - . _ ~`), using uppercase hex digits.
pub fn percent_encode(value: &str) -> String {
    urlencoding::encode(value).into_owned()
}

/// Join namespace numbers the way the API expects them: `0|1|14`.
pub fn namespace_list(namespaces: &[i32]) -> String {
    namespaces
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join("|")
}

/// Fluent builder for `api.php` requests.
#[derive(Debug, Clone)]
pub struct ApiRequestBuilder {
    path: String,
    params: IndexMap<String, String>,
}

impl Default for ApiRequestBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl ApiRequestBuilder {
    pub fn new() -> Self {
        Self::with_path(DEFAULT_API_PATH)
    }

    pub fn with_path(path: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            params: IndexMap::new(),
        }
    }

    pub fn action(self, action: &str) -> Self {
        self.param("action", action)
    }

    pub fn format(self, format: ResponseFormat) -> Self {
        self.param("format", format.as_param())
    }

    pub fn param(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.params.insert(key.into(), value.into());
        self
    }

    pub fn param_if(self, condition: bool, key: impl Into<String>, value: impl Into<String>) -> Self {
        if condition {
            self.param(key, value)
        } else {
            self
        }
    }

    pub fn param_opt(self, key: impl Into<String>, value: Option<impl Into<String>>) -> Self {
        match value {
            Some(value) => self.param(key, value),
            None => self,
        }
    }

    /// Adds a pipe-joined namespace filter; an empty slice adds nothing.
    pub fn namespaces(self, key: impl Into<String>, namespaces: &[i32]) -> Self {
        if namespaces.is_empty() {
            self
        } else {
            self.param(key, namespace_list(namespaces))
        }
    }

    /// Merge a list of key/value pairs, e.g. a server `continue` object.
    pub fn params<I, K, V>(mut self, pairs: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        for (k, v) in pairs {
            self.params.insert(k.into(), v.into());
        }
        self
    }

    pub fn build(self, method: HttpMethod) -> ApiRequest {
        ApiRequest {
            method,
            path: self.path,
            params: self.params,
        }
    }

    pub fn build_get(self) -> ApiRequest {
        self.build(HttpMethod::Get)
    }

    pub fn build_post(self) -> ApiRequest {
        self.build(HttpMethod::Post)
    }
}
