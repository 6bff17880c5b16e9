//! URL joining for API endpoints and file links

use crate::error::{ConnectorError, ConnectorResult};
use url::Url;

/// URL builder that handles proper URL joining and encoding
pub struct UrlBuilder;

impl UrlBuilder {
    /// Join a host URL with a path.
    ///
    /// A relative path is appended to the base path, so
    /// `join("https://wiki.example.org/w", "api.php")` gives
    /// `https://wiki.example.org/w/api.php`. An absolute path replaces it.
    pub fn join(base_url: &str, path: &str) -> ConnectorResult<String> {
        let mut base = Self::parse(base_url)?;

        if path.is_empty() {
            return Ok(base.to_string());
        }

        let result = if path.starts_with('/') {
            base.join(path)
        } else {
            let base_path = base.path();
            if !base_path.ends_with('/') {
                base.set_path(&format!("{}/", base_path));
            }
            base.join(path)
        }
        .map_err(|e| {
            ConnectorError::InvalidConfig(format!(
                "Failed to join URL '{}' with path '{}': {}",
                base_url, path, e
            ))
        })?;

        Ok(result.to_string())
    }

    /// Resolve a link returned by the wiki against the host URL. Absolute
    /// links pass through, protocol-relative ones take the host's scheme.
    pub fn resolve(base_url: &str, link: &str) -> ConnectorResult<String> {
        if Url::parse(link).is_ok() {
            return Ok(link.to_string());
        }
        let base = Self::parse(base_url)?;
        base.join(link).map(|u| u.to_string()).map_err(|e| {
            ConnectorError::InvalidConfig(format!("Cannot resolve '{}' against '{}': {}", link, base_url, e))
        })
    }

    /// Validate that a URL is well-formed
    pub fn validate(url: &str) -> ConnectorResult<()> {
        Self::parse(url).map(|_| ())
    }

    fn parse(url: &str) -> ConnectorResult<Url> {
        let parsed = Url::parse(url)
            .map_err(|e| ConnectorError::InvalidConfig(format!("Invalid URL '{}': {}", url, e)))?;
        if parsed.cannot_be_a_base() {
            return Err(ConnectorError::InvalidConfig(format!(
                "URL '{}' cannot be used as a base",
                url
            )));
        }
        Ok(parsed)
    }
}
