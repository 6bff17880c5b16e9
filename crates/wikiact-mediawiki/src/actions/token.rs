use std::fmt;

use wikiact_core::{
    Action, ApiRequest, ApiRequestBuilder, CoreError, CoreResult, HttpMethod, MediaWikiVersion,
    ResponseFormat, SingleShot, TokenSource, Versioned,
};

use super::json_request;
use crate::parse::json;

/// Kinds of short-lived authorization tokens.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TokenType {
    Csrf,
    Edit,
    Move,
    Delete,
    Login,
}

impl TokenType {
    /// Name used by the legacy `intoken=` parameter.
    fn legacy_name(&self) -> &'static str {
        match self {
            TokenType::Csrf | TokenType::Edit => "edit",
            TokenType::Move => "move",
            TokenType::Delete => "delete",
            TokenType::Login => "login",
        }
    }

    /// Name used by `meta=tokens`; all write tokens collapsed into `csrf`.
    fn modern_name(&self) -> &'static str {
        match self {
            TokenType::Login => "login",
            _ => "csrf",
        }
    }
}

impl fmt::Display for TokenType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.legacy_name())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Flavor {
    /// `meta=tokens`
    Tokens,
    /// `prop=info&intoken=`
    Intoken,
    /// `action=login` without a token answers `NeedToken`
    LoginHandshake,
}

/// Fetches one token, picking the API flavor the negotiated version
/// understands. `meta=tokens` exists since 1.24; before that, write tokens
/// come from `prop=info` and login tokens from a login handshake.
#[derive(Debug)]
pub struct TokenRequest {
    token_type: TokenType,
    flavor: Flavor,
    shot: SingleShot,
    token: Option<String>,
}

impl Versioned for TokenRequest {}

impl TokenRequest {
    /// A write token. `title` is only sent to servers that need a page to
    /// issue the token for.
    pub fn new(token_type: TokenType, title: &str, version: MediaWikiVersion) -> CoreResult<Self> {
        if token_type == TokenType::Login {
            return Err(CoreError::invalid("login tokens are requested with TokenRequest::login"));
        }
        Self::admit(version)?;

        if version.greater_eq(&MediaWikiVersion::MW1_24) {
            Ok(Self::modern(token_type))
        } else {
            if title.is_empty() {
                return Err(CoreError::invalid("a title is required to fetch a token on this server"));
            }
            let request = json_request("query")
                .param("prop", "info")
                .param("intoken", token_type.legacy_name())
                .param("titles", title)
                .build_get();
            Ok(Self::with(token_type, Flavor::Intoken, request))
        }
    }

    pub fn login(username: &str, version: MediaWikiVersion) -> CoreResult<Self> {
        Self::admit(version)?;

        if version.greater_eq(&MediaWikiVersion::MW1_24) {
            Ok(Self::modern(TokenType::Login))
        } else {
            let request = ApiRequestBuilder::new()
                .action("login")
                .format(ResponseFormat::Json)
                .param("lgname", username)
                .build(HttpMethod::Post);
            Ok(Self::with(TokenType::Login, Flavor::LoginHandshake, request))
        }
    }

    fn modern(token_type: TokenType) -> Self {
        let request = json_request("query")
            .param("meta", "tokens")
            .param("type", token_type.modern_name())
            .build_get();
        Self::with(token_type, Flavor::Tokens, request)
    }

    fn with(token_type: TokenType, flavor: Flavor, request: ApiRequest) -> Self {
        Self {
            token_type,
            flavor,
            shot: SingleShot::new(request),
            token: None,
        }
    }

    pub fn token_type(&self) -> TokenType {
        self.token_type
    }

    fn extract(&self, value: &serde_json::Value) -> CoreResult<Option<String>> {
        let token = match self.flavor {
            Flavor::Tokens => value
                .pointer("/query/tokens")
                .and_then(|tokens| json::str_field(tokens, &format!("{}token", self.token_type.modern_name()))),
            Flavor::Intoken => {
                json::str_field(json::first_page(value)?, &format!("{}token", self.token_type.legacy_name()))
            }
            Flavor::LoginHandshake => value.get("login").and_then(|login| json::str_field(login, "token")),
        };
        Ok(token)
    }
}

impl Action for TokenRequest {
    fn name(&self) -> &str {
        "token"
    }

    fn build_next_request(&mut self) -> CoreResult<Option<ApiRequest>> {
        Ok(self.shot.next_request())
    }

    fn consume_response(&mut self, text: &str) -> CoreResult<()> {
        let value = json::parse(text)?;
        json::check(&value)?;

        self.token = self.extract(&value)?;
        tracing::debug!(
            token_type = %self.token_type,
            present = self.token.as_deref().is_some_and(|t| !t.is_empty()),
            "Token response received"
        );
        self.shot.mark_complete();
        Ok(())
    }

    fn is_complete(&self) -> bool {
        self.shot.is_complete()
    }
}

impl TokenSource for TokenRequest {
    fn token(&self) -> Option<&str> {
        self.token.as_deref()
    }
}
