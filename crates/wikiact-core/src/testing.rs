//! In-memory transport that replays a fixed script of responses

use std::collections::VecDeque;
use std::sync::Mutex;

use async_trait::async_trait;

use crate::error::{CoreError, CoreResult};
use crate::request::ApiRequest;
use crate::transport::Transport;

/// Replays queued responses in order and records every request it receives.
/// Running past the end of the script is a transport failure.
#[derive(Debug, Default)]
pub struct ScriptedTransport {
    script: Mutex<VecDeque<Result<String, String>>>,
    requests: Mutex<Vec<ApiRequest>>,
}

impl ScriptedTransport {
    pub fn new<I, S>(responses: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            script: Mutex::new(responses.into_iter().map(|r| Ok(r.into())).collect()),
            requests: Mutex::new(Vec::new()),
        }
    }

    pub fn push_failure(&self, message: impl Into<String>) {
        self.script.lock().unwrap().push_back(Err(message.into()));
    }

    /// Every request sent so far, in order.
    pub fn requests(&self) -> Vec<ApiRequest> {
        self.requests.lock().unwrap().clone()
    }

    pub fn request_count(&self) -> usize {
        self.requests.lock().unwrap().len()
    }
}

#[async_trait]
impl Transport for ScriptedTransport {
    async fn send(&self, request: &ApiRequest) -> CoreResult<String> {
        self.requests.lock().unwrap().push(request.clone());
        match self.script.lock().unwrap().pop_front() {
            Some(Ok(body)) => Ok(body),
            Some(Err(message)) => Err(CoreError::Transport(message)),
            None => Err(CoreError::transport("script exhausted")),
        }
    }
}
