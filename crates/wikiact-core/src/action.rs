//! The unit-of-work contract

use crate::error::CoreResult;
use crate::request::ApiRequest;
use crate::version::{MediaWikiVersion, VersionGate};

/// A unit of work that produces requests and consumes responses until it
/// reports completion.
///
/// An action never touches the transport itself; it is driven by
/// [`ActionRunner`](crate::runner::ActionRunner) or by a composite that
/// embeds it. Results are read off the concrete type once complete.
pub trait Action: Send {
    /// Name used in log fields
    fn name(&self) -> &str;

    /// Next outgoing request, or `None` when there is nothing left to send.
    ///
    /// Returning `None` while [`is_complete`](Self::is_complete) is false is
    /// a contract violation.
    fn build_next_request(&mut self) -> CoreResult<Option<ApiRequest>>;

    /// Feed back the text of the response to the last request.
    fn consume_response(&mut self, text: &str) -> CoreResult<()>;

    /// Once true, never reverts.
    fn is_complete(&self) -> bool;
}

impl<A: Action + ?Sized> Action for Box<A> {
    fn name(&self) -> &str {
        (**self).name()
    }

    fn build_next_request(&mut self) -> CoreResult<Option<ApiRequest>> {
        (**self).build_next_request()
    }

    fn consume_response(&mut self, text: &str) -> CoreResult<()> {
        (**self).consume_response(text)
    }

    fn is_complete(&self) -> bool {
        (**self).is_complete()
    }
}

/// Statically declared server versions of an action variant.
pub trait Versioned {
    /// Releases this variant was written against. Empty means no minimum.
    const SUPPORTED_VERSIONS: &'static [MediaWikiVersion] = &[];

    /// Run the version gate for this variant. Constructors call this once.
    fn admit(negotiated: MediaWikiVersion) -> CoreResult<()> {
        VersionGate::check(Self::SUPPORTED_VERSIONS, negotiated)
    }
}

/// An action whose outcome is a short-lived authorization token.
pub trait TokenSource: Action {
    /// The fetched token, if the response carried one.
    fn token(&self) -> Option<&str>;
}

/// Tracks the request/response exchange of an action that needs exactly one
/// round trip. Concrete single-shot actions embed it.
#[derive(Debug, Clone)]
pub struct SingleShot {
    request: Option<ApiRequest>,
    sent: bool,
    complete: bool,
}

impl SingleShot {
    pub fn new(request: ApiRequest) -> Self {
        Self {
            request: Some(request),
            sent: false,
            complete: false,
        }
    }

    /// Hands out the request once; later calls return `None`.
    pub fn next_request(&mut self) -> Option<ApiRequest> {
        if self.complete || self.sent {
            return None;
        }
        self.sent = true;
        self.request.clone()
    }

    pub fn request(&self) -> Option<&ApiRequest> {
        self.request.as_ref()
    }

    pub fn mark_complete(&mut self) {
        self.complete = true;
    }

    pub fn is_complete(&self) -> bool {
        self.complete
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::request::ApiRequestBuilder;
    use crate::CoreError;

    struct Gated;

    impl Versioned for Gated {
        const SUPPORTED_VERSIONS: &'static [MediaWikiVersion] =
            &[MediaWikiVersion::MW1_11, MediaWikiVersion::MW1_12];
    }

    struct Ungated;

    impl Versioned for Ungated {}

    #[test]
    fn test_admit_uses_declared_versions() {
        assert!(Gated::admit(MediaWikiVersion::MW1_39).is_ok());
        assert!(matches!(
            Gated::admit(MediaWikiVersion::MW1_10),
            Err(CoreError::UnsupportedVersion { .. })
        ));
        assert!(Ungated::admit(MediaWikiVersion::Unknown).is_ok());
    }

    #[test]
    fn test_single_shot_hands_out_request_once() {
        let mut shot = SingleShot::new(ApiRequestBuilder::new().action("query").build_get());
        assert!(shot.next_request().is_some());
        assert!(shot.next_request().is_none());
        assert!(!shot.is_complete());
        shot.mark_complete();
        assert!(shot.is_complete());
        assert!(shot.request().is_some());
    }
}
