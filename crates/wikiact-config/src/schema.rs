//! Bot configuration schema

use std::fmt;

use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value as JsonValue;
use wikiact_connectors::WikiConnection;

use crate::error::{ConfigError, ConfigResult};

/// Upper bound the API accepts for `*limit` parameters from bot accounts.
pub const MAX_QUERY_LIMIT: u32 = 5000;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BotConfig {
    pub connection: WikiConnection,
    #[serde(default)]
    pub credentials: Option<Credentials>,
    #[serde(default)]
    pub logging: LoggingConfig,
    #[serde(default)]
    pub query: QueryDefaults,
}

impl BotConfig {
    pub fn new(connection: WikiConnection) -> Self {
        Self {
            connection,
            credentials: None,
            logging: LoggingConfig::default(),
            query: QueryDefaults::default(),
        }
    }

    pub fn validate(&self) -> ConfigResult<()> {
        self.connection.validate()?;

        if let Some(credentials) = &self.credentials {
            if credentials.username.trim().is_empty() {
                return Err(ConfigError::MissingField("credentials.username".to_string()));
            }
            if credentials.password.is_empty() {
                return Err(ConfigError::MissingField("credentials.password".to_string()));
            }
        }

        if self.query.default_limit == 0 || self.query.default_limit > MAX_QUERY_LIMIT {
            return Err(ConfigError::Validation(format!(
                "query.default_limit must be between 1 and {}, got {}",
                MAX_QUERY_LIMIT, self.query.default_limit
            )));
        }

        if self.logging.level.trim().is_empty() {
            return Err(ConfigError::MissingField("logging.level".to_string()));
        }

        Ok(())
    }
}

/// Login credentials. Bot passwords use the `User@BotName` form.
#[derive(Clone, PartialEq, Serialize, Deserialize)]
pub struct Credentials {
    #[serde(deserialize_with = "scalar_string")]
    pub username: String,
    #[serde(deserialize_with = "scalar_string")]
    pub password: String,
}

impl Credentials {
    pub fn new(username: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            username: username.into(),
            password: password.into(),
        }
    }
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("username", &self.username)
            .field("password", &wikiact_core::sanitization::SANITIZED_PLACEHOLDER)
            .finish()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Filter directive, e.g. `info` or `wikiact_core=debug,info`
    pub level: String,
    pub json: bool,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            json: false,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct QueryDefaults {
    /// Page size requested by listings that take a limit
    pub default_limit: u32,
}

impl Default for QueryDefaults {
    fn default() -> Self {
        Self { default_limit: 50 }
    }
}

// Environment resolution turns numeric-looking values into numbers; a
// password of digits must still deserialize as a string.
fn scalar_string<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    match JsonValue::deserialize(deserializer)? {
        JsonValue::String(s) => Ok(s),
        JsonValue::Number(n) => Ok(n.to_string()),
        JsonValue::Bool(b) => Ok(b.to_string()),
        other => Err(serde::de::Error::custom(format!(
            "expected a string, found {}",
            other
        ))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn config() -> BotConfig {
        BotConfig::new(WikiConnection::new("https://wiki.example.org/w/"))
    }

    #[test]
    fn test_defaults() {
        let parsed: BotConfig = serde_json::from_value(json!({
            "connection": { "base_url": "https://wiki.example.org/w/" }
        }))
        .unwrap();
        assert_eq!(parsed, config());
        assert_eq!(parsed.query.default_limit, 50);
        assert_eq!(parsed.logging.level, "info");
        assert!(parsed.validate().is_ok());
    }

    #[test]
    fn test_numeric_password_stays_string() {
        let credentials: Credentials =
            serde_json::from_value(json!({"username": "Bot@job", "password": 123456})).unwrap();
        assert_eq!(credentials.password, "123456");
        assert!(!format!("{:?}", credentials).contains("123456"));
    }

    #[test]
    fn test_validation_errors() {
        let mut bad_limit = config();
        bad_limit.query.default_limit = 0;
        assert!(matches!(bad_limit.validate(), Err(ConfigError::Validation(_))));

        bad_limit.query.default_limit = MAX_QUERY_LIMIT + 1;
        assert!(bad_limit.validate().is_err());

        let mut no_user = config();
        no_user.credentials = Some(Credentials::new(" ", "secret"));
        assert!(matches!(no_user.validate(), Err(ConfigError::MissingField(_))));

        let bad_url = BotConfig::new(WikiConnection::new("wiki.example.org"));
        assert!(matches!(bad_url.validate(), Err(ConfigError::Connection(_))));
    }
}
