use serde::{Deserialize, Serialize};
use wikiact_core::{Action, ApiRequest, CoreError, CoreResult, MediaWikiVersion, SingleShot, Versioned};

use super::json_request;
use crate::parse::json;

/// General site information from `meta=siteinfo`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SiteGeneral {
    pub sitename: String,
    pub generator: String,
    pub base: String,
    pub server: String,
    pub mainpage: String,
    pub lang: String,
    #[serde(skip)]
    pub version: MediaWikiVersion,
}

/// Fetches `meta=siteinfo&siprop=general`; used to negotiate the server
/// version, so it carries no version gate itself.
#[derive(Debug)]
pub struct SiteInfo {
    shot: SingleShot,
    general: Option<SiteGeneral>,
}

impl Versioned for SiteInfo {}

impl SiteInfo {
    pub fn new() -> Self {
        let request = json_request("query")
            .param("meta", "siteinfo")
            .param("siprop", "general")
            .build_get();
        Self {
            shot: SingleShot::new(request),
            general: None,
        }
    }

    pub fn general(&self) -> Option<&SiteGeneral> {
        self.general.as_ref()
    }

    pub fn into_general(self) -> Option<SiteGeneral> {
        self.general
    }

    pub fn version(&self) -> MediaWikiVersion {
        self.general.as_ref().map(|g| g.version).unwrap_or_default()
    }
}

impl Default for SiteInfo {
    fn default() -> Self {
        Self::new()
    }
}

impl Action for SiteInfo {
    fn name(&self) -> &str {
        "siteinfo"
    }

    fn build_next_request(&mut self) -> CoreResult<Option<ApiRequest>> {
        Ok(self.shot.next_request())
    }

    fn consume_response(&mut self, text: &str) -> CoreResult<()> {
        let value = json::parse(text)?;
        json::check(&value)?;

        let general = value
            .pointer("/query/general")
            .cloned()
            .ok_or_else(|| CoreError::parse("siteinfo response has no query.general"))?;
        let mut general: SiteGeneral = serde_json::from_value(general)?;
        general.version = MediaWikiVersion::from_generator(&general.generator);

        tracing::debug!(sitename = %general.sitename, version = %general.version, "Site information received");
        self.general = Some(general);
        self.shot.mark_complete();
        Ok(())
    }

    fn is_complete(&self) -> bool {
        self.shot.is_complete()
    }
}
