use wikiact_core::{
    ApiRequest, ContinuationToken, CoreError, CoreResult, MediaWikiVersion, ParsedPage,
    QueryStrategy, ResponseFormat, Versioned,
};

use super::{check_limit, continue_from, list_request};
use crate::actions::with_namespace;
use crate::parse::{json, xml};

/// Titles of pages that embed an image.
#[derive(Debug, Clone)]
pub struct ImageUsage {
    image: String,
    namespaces: Vec<i32>,
    limit: u32,
    format: ResponseFormat,
}

impl Versioned for ImageUsage {
    const SUPPORTED_VERSIONS: &'static [MediaWikiVersion] = &[
        MediaWikiVersion::MW1_11,
        MediaWikiVersion::MW1_12,
        MediaWikiVersion::MW1_13,
        MediaWikiVersion::MW1_14,
        MediaWikiVersion::MW1_15,
    ];
}

impl ImageUsage {
    pub fn new(image: &str, namespaces: &[i32], limit: u32) -> CoreResult<Self> {
        if image.trim().is_empty() {
            return Err(CoreError::invalid("image title must not be empty"));
        }
        Ok(Self {
            image: with_namespace(image, "File", &["Image"]),
            namespaces: namespaces.to_vec(),
            limit: check_limit(limit)?,
            format: ResponseFormat::Json,
        })
    }

    /// Request and parse a different wire format.
    pub fn with_format(mut self, format: ResponseFormat) -> Self {
        self.format = format;
        self
    }
}

impl QueryStrategy for ImageUsage {
    type Item = String;

    fn name(&self) -> &str {
        "imageusage"
    }

    fn build_request(&self, token: &ContinuationToken) -> CoreResult<ApiRequest> {
        let builder = list_request("imageusage", self.format)
            .param("iutitle", self.image.as_str())
            .namespaces("iunamespace", &self.namespaces)
            .param("iulimit", self.limit.to_string());
        continue_from(builder, token)
    }

    fn parse(&self, response: &str) -> CoreResult<ParsedPage<String>> {
        match self.format {
            ResponseFormat::Json => json::list_page(response, "imageusage", json::title),
            ResponseFormat::Xml => xml::list_page(response, "imageusage", "iu", |mut attrs| {
                attrs.shift_remove("title")
            }),
        }
    }
}
