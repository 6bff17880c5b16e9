use wikiact_connectors::UrlBuilder;
use wikiact_core::{Action, ApiRequest, CoreError, CoreResult, MediaWikiVersion, SingleShot, Versioned};

use super::{json_request, with_namespace};
use crate::parse::json;

/// Looks up the file URL of an uploaded image.
#[derive(Debug)]
pub struct ImageInfo {
    shot: SingleShot,
    host_url: Option<String>,
    raw_url: Option<String>,
}

impl Versioned for ImageInfo {
    const SUPPORTED_VERSIONS: &'static [MediaWikiVersion] = &[
        MediaWikiVersion::MW1_11,
        MediaWikiVersion::MW1_12,
        MediaWikiVersion::MW1_13,
    ];
}

impl ImageInfo {
    /// `host_url` resolves relative file URLs; without it only absolute
    /// URLs can be reported.
    pub fn new(name: &str, host_url: Option<&str>, version: MediaWikiVersion) -> CoreResult<Self> {
        if name.trim().is_empty() {
            return Err(CoreError::invalid("image name must not be empty"));
        }
        Self::admit(version)?;

        let request = json_request("query")
            .param("titles", with_namespace(name, "File", &["Image"]))
            .param("prop", "imageinfo")
            .param("iiprop", "url")
            .build_get();
        Ok(Self {
            shot: SingleShot::new(request),
            host_url: host_url.filter(|h| !h.is_empty()).map(str::to_string),
            raw_url: None,
        })
    }

    /// The URL as returned by the server.
    pub fn raw_url(&self) -> Option<&str> {
        self.raw_url.as_deref()
    }

    /// The absolute file URL.
    pub fn url(&self) -> CoreResult<String> {
        let raw = self
            .raw_url
            .as_deref()
            .ok_or_else(|| CoreError::ContractViolation("image info has not been fetched".to_string()))?;

        if let Some(host) = &self.host_url {
            return Ok(UrlBuilder::resolve(host, raw)?);
        }
        UrlBuilder::validate(raw).map_err(|_| {
            CoreError::invalid(format!("relative image URL '{}' needs a host URL to resolve", raw))
        })?;
        Ok(raw.to_string())
    }
}

impl Action for ImageInfo {
    fn name(&self) -> &str {
        "imageinfo"
    }

    fn build_next_request(&mut self) -> CoreResult<Option<ApiRequest>> {
        Ok(self.shot.next_request())
    }

    fn consume_response(&mut self, text: &str) -> CoreResult<()> {
        let value = json::parse(text)?;
        json::check(&value)?;

        let page = json::first_page(&value)?;
        let url = page
            .get("imageinfo")
            .and_then(|info| info.get(0))
            .and_then(|info| json::str_field(info, "url"));

        match url {
            Some(url) => self.raw_url = Some(url),
            None if json::flag(page, "missing") => {
                return Err(CoreError::api(
                    "missingfile",
                    format!("{} does not exist", json::str_field(page, "title").unwrap_or_default()),
                ))
            }
            None => return Err(CoreError::parse("imageinfo response carries no url")),
        }

        self.shot.mark_complete();
        Ok(())
    }

    fn is_complete(&self) -> bool {
        self.shot.is_complete()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn fetched(host: Option<&str>, url: &str) -> ImageInfo {
        let mut action = ImageInfo::new("Example.jpg", host, MediaWikiVersion::MW1_39).unwrap();
        let request = action.build_next_request().unwrap().unwrap();
        assert_eq!(request.param("titles"), Some("File:Example.jpg"));
        action
            .consume_response(&format!(
                r#"{{"query":{{"pages":{{"3":{{"title":"File:Example.jpg","imageinfo":[{{"url":"{}"}}]}}}}}}}}"#,
                url
            ))
            .unwrap();
        action
    }

    #[test]
    fn test_absolute_url() {
        let action = fetched(None, "https://upload.example.org/a/ab/Example.jpg");
        assert_eq!(action.url().unwrap(), "https://upload.example.org/a/ab/Example.jpg");
    }

    #[test]
    fn test_relative_url_resolved_against_host() {
        let action = fetched(Some("https://wiki.example.org/w/"), "/images/a/ab/Example.jpg");
        assert_eq!(action.url().unwrap(), "https://wiki.example.org/images/a/ab/Example.jpg");
    }

    #[test]
    fn test_relative_url_without_host() {
        let action = fetched(None, "/images/a/ab/Example.jpg");
        assert!(matches!(action.url(), Err(CoreError::InvalidArgument(_))));
    }

    #[test]
    fn test_missing_file() {
        let mut action = ImageInfo::new("Nope.png", None, MediaWikiVersion::MW1_39).unwrap();
        action.build_next_request().unwrap();
        let err = action
            .consume_response(r#"{"query":{"pages":{"-1":{"ns":6,"title":"File:Nope.png","missing":"","imagerepository":""}}}}"#)
            .unwrap_err();
        assert!(matches!(err, CoreError::Api { ref code, .. } if code == "missingfile"));
    }

    #[test]
    fn test_gate() {
        assert!(ImageInfo::new("A.png", None, MediaWikiVersion::MW1_10).is_err());
    }
}
