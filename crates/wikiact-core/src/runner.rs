//! Drives a single action to completion

use std::sync::Arc;
use std::time::Instant;

use crate::action::Action;
use crate::error::{CoreError, CoreResult};
use crate::transport::Transport;

/// Repeatedly asks an action for its next request, sends it and feeds the
/// response back until the action reports completion.
///
/// Errors abort the loop immediately and leave the action in whatever
/// state it reached; nothing is retried here.
#[derive(Clone)]
pub struct ActionRunner {
    transport: Arc<dyn Transport>,
}

impl ActionRunner {
    pub fn new(transport: Arc<dyn Transport>) -> Self {
        Self { transport }
    }

    pub fn transport(&self) -> &Arc<dyn Transport> {
        &self.transport
    }

    /// Run `action` until complete. Returns the number of round trips made.
    pub async fn run<A: Action + ?Sized>(&self, action: &mut A) -> CoreResult<usize> {
        let start_time = Instant::now();
        let mut rounds = 0usize;

        while !action.is_complete() {
            let request = action.build_next_request()?.ok_or_else(|| {
                CoreError::ContractViolation(format!(
                    "action '{}' has no request to send but is not complete",
                    action.name()
                ))
            })?;

            rounds += 1;
            tracing::debug!(
                action = %action.name(),
                round = rounds,
                request = %request,
                "Sending request"
            );

            let response = self.transport.send(&request).await.map_err(|e| {
                tracing::debug!(action = %action.name(), round = rounds, error = %e, "Request failed");
                e
            })?;

            action.consume_response(&response)?;
        }

        tracing::debug!(
            action = %action.name(),
            rounds = rounds,
            elapsed_ms = start_time.elapsed().as_millis() as u64,
            "Action complete"
        );
        Ok(rounds)
    }
}
