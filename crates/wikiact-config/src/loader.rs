use crate::env_resolver::EnvResolver;
use crate::error::{ConfigError, ConfigResult};
use crate::schema::BotConfig;
use serde_json::Value as JsonValue;
use std::fs;
use std::path::Path;

/// Supported file formats for configuration
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FileFormat {
    Yaml,
    Json,
}

impl FileFormat {
    /// Detect file format from extension
    pub fn from_path<P: AsRef<Path>>(path: P) -> ConfigResult<Self> {
        match path.as_ref().extension().and_then(|s| s.to_str()) {
            Some("yaml") | Some("yml") => Ok(FileFormat::Yaml),
            Some("json") => Ok(FileFormat::Json),
            Some(ext) => Err(ConfigError::UnsupportedFormat(ext.to_string())),
            None => Err(ConfigError::UnsupportedFormat("no extension".to_string())),
        }
    }
}

/// Reads a [`BotConfig`]: parse, resolve environment references, then
/// deserialize and validate.
#[derive(Debug, Clone, Default)]
pub struct ConfigLoader {
    resolver: EnvResolver,
}

impl ConfigLoader {
    pub fn new(resolver: EnvResolver) -> Self {
        Self { resolver }
    }

    /// Load with the default resolver, picking the format from the extension.
    pub fn from_file<P: AsRef<Path>>(path: P) -> ConfigResult<BotConfig> {
        Self::default().load_file(path)
    }

    /// Parse with the default resolver.
    pub fn from_str(content: &str, format: FileFormat) -> ConfigResult<BotConfig> {
        Self::default().load_str(content, format)
    }

    pub fn load_file<P: AsRef<Path>>(&self, path: P) -> ConfigResult<BotConfig> {
        let path = path.as_ref();
        let format = FileFormat::from_path(path)?;
        let content = fs::read_to_string(path)?;

        tracing::debug!(path = %path.display(), format = ?format, "Loading bot configuration");
        self.load_str(&content, format)
    }

    pub fn load_str(&self, content: &str, format: FileFormat) -> ConfigResult<BotConfig> {
        let raw: JsonValue = match format {
            FileFormat::Yaml => serde_yaml::from_str(content)?,
            FileFormat::Json => serde_json::from_str(content)?,
        };

        if raw.get("connection").is_none() {
            return Err(ConfigError::MissingField("connection".to_string()));
        }

        let resolved = self.resolver.resolve(&raw)?;
        let config: BotConfig = serde_json::from_value(resolved)?;
        config.validate()?;
        Ok(config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    const YAML: &str = r#"
connection:
  base_url: "https://${WIKIACT_LOADER_HOST:wiki.example.org}/w/"
  user_agent: "MaintenanceBot/2.1 (ops@example.org)"
  timeout_config:
    connect_ms: 5000
    read_ms: 20000
    total_ms: 30000
  retry_policy:
    max_retries: 1
credentials:
  username: "Maintenance@cleanup"
  password: "${MW_LOADER_PASSWORD:hunter2}"
logging:
  level: debug
query:
  default_limit: 500
"#;

    #[test]
    fn test_load_yaml_file() {
        let mut file = tempfile::Builder::new().suffix(".yaml").tempfile().unwrap();
        file.write_all(YAML.as_bytes()).unwrap();

        let config = ConfigLoader::from_file(file.path()).unwrap();
        assert_eq!(config.connection.base_url, "https://wiki.example.org/w/");
        assert_eq!(config.connection.api_path, "api.php");
        assert_eq!(config.connection.timeout_config.read_ms, 20000);
        assert_eq!(config.connection.retry_policy.max_retries, 1);
        assert_eq!(config.connection.retry_policy.initial_delay_ms, 1000);
        let credentials = config.credentials.unwrap();
        assert_eq!(credentials.username, "Maintenance@cleanup");
        assert_eq!(credentials.password, "hunter2");
        assert_eq!(config.logging.level, "debug");
        assert_eq!(config.query.default_limit, 500);
    }

    #[test]
    fn test_load_json_str() {
        let config = ConfigLoader::from_str(
            r#"{"connection": {"base_url": "http://localhost:8080/", "api_path": "w/api.php"}}"#,
            FileFormat::Json,
        )
        .unwrap();
        assert_eq!(config.connection.api_path, "w/api.php");
        assert!(config.credentials.is_none());
    }

    #[test]
    fn test_unsupported_extension() {
        let file = NamedTempFile::new().unwrap();
        let path = file.path().with_extension("toml");
        assert!(matches!(
            ConfigLoader::from_file(path),
            Err(ConfigError::UnsupportedFormat(_))
        ));
    }

    #[test]
    fn test_missing_connection() {
        let result = ConfigLoader::from_str("logging:\n  level: info\n", FileFormat::Yaml);
        assert!(matches!(result, Err(ConfigError::MissingField(_))));
    }

    #[test]
    fn test_restricted_resolver_rejects_variable() {
        let loader = ConfigLoader::new(EnvResolver::new(vec!["ONLY_THIS_".to_string()]));
        let result = loader.load_str(YAML, FileFormat::Yaml);
        assert!(matches!(result, Err(ConfigError::Env(_))));
    }

    #[test]
    fn test_invalid_values_fail_validation() {
        let result = ConfigLoader::from_str(
            r#"{"connection": {"base_url": "https://wiki.example.org/"}, "query": {"default_limit": 0}}"#,
            FileFormat::Json,
        );
        assert!(matches!(result, Err(ConfigError::Validation(_))));
    }
}
