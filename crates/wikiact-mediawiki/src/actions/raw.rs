use wikiact_core::{Action, ApiRequest, CoreResult, SingleShot, Versioned};

/// Sends one arbitrary request and keeps the response text untouched, for
/// API modules without a dedicated action (e.g. Wikibase `wbgetclaims`).
#[derive(Debug)]
pub struct RawRequest {
    shot: SingleShot,
    response: Option<String>,
}

impl Versioned for RawRequest {}

impl RawRequest {
    pub fn new(request: ApiRequest) -> Self {
        Self {
            shot: SingleShot::new(request),
            response: None,
        }
    }

    pub fn response(&self) -> Option<&str> {
        self.response.as_deref()
    }

    pub fn into_response(self) -> Option<String> {
        self.response
    }
}

impl Action for RawRequest {
    fn name(&self) -> &str {
        "raw"
    }

    fn build_next_request(&mut self) -> CoreResult<Option<ApiRequest>> {
        Ok(self.shot.next_request())
    }

    fn consume_response(&mut self, text: &str) -> CoreResult<()> {
        self.response = Some(text.to_string());
        self.shot.mark_complete();
        Ok(())
    }

    fn is_complete(&self) -> bool {
        self.shot.is_complete()
    }
}
