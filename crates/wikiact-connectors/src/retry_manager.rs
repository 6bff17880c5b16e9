//! Retry decisions for failed API exchanges
//!
//! Delays grow exponentially with full jitter, unless the server sent a
//! `Retry-After` hint (MediaWiki does so for `maxlag` and rate limiting),
//! in which case the hint wins. Every decision is bounded by a total time
//! budget.

use std::time::{Duration, Instant};

use rand::Rng;

use crate::connection::RetryPolicy;
use crate::error::ConnectorError;

const DEFAULT_TOTAL_BUDGET: Duration = Duration::from_secs(300);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorClassification {
    /// Network trouble and temporary server errors
    Retryable,
    /// Client errors and configuration problems
    NonRetryable,
    /// HTTP 429; backs off twice as long
    RateLimited,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RetryDecision {
    /// Sleep for `delay`, then make attempt number `attempt`.
    Retry { delay: Duration, attempt: u32 },
    /// Give up; `retries` retries were made before this error.
    Stop { reason: String, retries: u32 },
}

#[derive(Debug, Clone)]
pub struct RetryManager {
    policy: RetryPolicy,
    total_budget: Duration,
    use_jitter: bool,
}

impl RetryManager {
    pub fn new(policy: RetryPolicy) -> Self {
        Self {
            policy,
            total_budget: DEFAULT_TOTAL_BUDGET,
            use_jitter: true,
        }
    }

    /// Upper bound on time spent in one `execute` call, delays included.
    pub fn with_total_timeout(mut self, budget: Duration) -> Self {
        self.total_budget = budget;
        self
    }

    pub fn with_jitter(mut self, use_jitter: bool) -> Self {
        self.use_jitter = use_jitter;
        self
    }

    pub fn policy(&self) -> &RetryPolicy {
        &self.policy
    }

    pub fn classify_error(&self, error: &ConnectorError) -> ErrorClassification {
        match error {
            ConnectorError::Timeout(_) | ConnectorError::Connection(_) => ErrorClassification::Retryable,
            ConnectorError::Status { status, .. } => self.classify_status_code(*status),
            ConnectorError::Http(e) => match e.status() {
                Some(status) => self.classify_status_code(status.as_u16()),
                None if e.is_timeout() || e.is_connect() => ErrorClassification::Retryable,
                None => ErrorClassification::NonRetryable,
            },
            ConnectorError::InvalidConfig(_) | ConnectorError::RetriesExhausted { .. } => {
                ErrorClassification::NonRetryable
            }
        }
    }

    /// 429 is always rate limiting; other codes retry only when listed in
    /// the policy.
    pub fn classify_status_code(&self, status: u16) -> ErrorClassification {
        if status == 429 {
            ErrorClassification::RateLimited
        } else if self.policy.retry_on_status_codes.contains(&status) {
            ErrorClassification::Retryable
        } else {
            ErrorClassification::NonRetryable
        }
    }

    /// Decide what to do after `error`, with `retries` retries already made
    /// since `started`.
    pub fn should_retry(&self, error: &ConnectorError, retries: u32, started: Instant) -> RetryDecision {
        let stop = |reason: String| RetryDecision::Stop { reason, retries };
        let elapsed = started.elapsed();

        let classification = self.classify_error(error);
        if classification == ErrorClassification::NonRetryable {
            return stop("error is not retryable".to_string());
        }
        if retries >= self.policy.max_retries {
            return stop(format!("gave up after {} retries", self.policy.max_retries));
        }

        let delay = match error.retry_after() {
            Some(hint) => hint.min(Duration::from_millis(self.policy.max_delay_ms)),
            None => self.backoff(retries, classification),
        };
        if elapsed + delay > self.total_budget {
            return stop(format!(
                "next delay of {}ms would exceed the {}ms budget",
                delay.as_millis(),
                self.total_budget.as_millis()
            ));
        }

        RetryDecision::Retry {
            delay,
            attempt: retries + 1,
        }
    }

    pub(crate) fn backoff(&self, retries: u32, classification: ErrorClassification) -> Duration {
        let mut millis =
            self.policy.initial_delay_ms as f64 * self.policy.backoff_multiplier.powi(retries as i32);
        if classification == ErrorClassification::RateLimited {
            millis *= 2.0;
        }
        let capped = millis.min(self.policy.max_delay_ms as f64);

        let millis = if self.use_jitter {
            rand::thread_rng().gen::<f64>() * capped
        } else {
            capped
        };
        Duration::from_millis(millis as u64)
    }
}
