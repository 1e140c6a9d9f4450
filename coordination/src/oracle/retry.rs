//! Retry layer over a [`DecisionOracle`].
//!
//! Each call gets `max_retries + 1` attempts with increasing delay. An
//! empty or whitespace-only reply counts as a transient failure. When every
//! attempt fails the caller receives [`FAILURE_SENTINEL`]-prefixed text
//! instead of an error.

use std::sync::{Arc, LazyLock};
use std::time::Duration;

use regex::Regex;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use super::{DecisionOracle, OracleError, OracleRequest};

/// Prefix of the text returned when every attempt failed.
pub const FAILURE_SENTINEL: &str = "[oracle call failed";

static THINK_BLOCK: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?s)<think>.*?</think>").unwrap());

/// Whether a reply is the exhaustion sentinel rather than real output.
pub fn is_failure(text: &str) -> bool {
    text.starts_with(FAILURE_SENTINEL)
}

/// Retry policy for oracle calls.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RetryPolicy {
    /// Maximum number of retry attempts (0 = no retries).
    pub max_retries: u32,
    /// Initial backoff delay in milliseconds.
    pub initial_backoff_ms: u64,
    /// Backoff multiplier (e.g., 2.0 for exponential).
    pub backoff_multiplier: f64,
    /// Maximum backoff delay in milliseconds.
    pub max_backoff_ms: u64,
}

impl RetryPolicy {
    /// No waiting between attempts. Used by tests.
    pub fn immediate(max_retries: u32) -> Self {
        Self {
            max_retries,
            initial_backoff_ms: 0,
            backoff_multiplier: 1.0,
            max_backoff_ms: 0,
        }
    }

    /// Calculate the backoff delay for a given attempt number (0-indexed).
    pub fn backoff_ms(&self, attempt: u32) -> u64 {
        if attempt == 0 {
            return 0;
        }
        let delay =
            self.initial_backoff_ms as f64 * self.backoff_multiplier.powi(attempt as i32 - 1);
        (delay as u64).min(self.max_backoff_ms)
    }

    /// Whether another retry is allowed given the attempt count.
    pub fn should_retry(&self, attempt: u32) -> bool {
        attempt < self.max_retries
    }

    /// Get the backoff as a Duration for a given attempt.
    pub fn backoff_duration(&self, attempt: u32) -> Duration {
        Duration::from_millis(self.backoff_ms(attempt))
    }

    pub fn total_attempts(&self) -> u32 {
        self.max_retries + 1
    }
}

impl Default for RetryPolicy {
    /// Default: 2 retries (3 attempts), 2s then 4s between them.
    fn default() -> Self {
        Self {
            max_retries: 2,
            initial_backoff_ms: 2_000,
            backoff_multiplier: 2.0,
            max_backoff_ms: 10_000,
        }
    }
}

/// Strip reasoning blocks and surrounding whitespace; reject empty output.
fn clean_response(text: &str) -> Result<String, OracleError> {
    let cleaned = THINK_BLOCK.replace_all(text, "");
    let cleaned = cleaned.trim();
    if cleaned.is_empty() {
        return Err(OracleError::EmptyResponse);
    }
    Ok(cleaned.to_string())
}

/// Shared reference to a retrying oracle.
pub type SharedOracle = Arc<RetryingOracle>;

/// Oracle wrapper that never raises.
pub struct RetryingOracle {
    inner: Arc<dyn DecisionOracle>,
    policy: RetryPolicy,
}

impl RetryingOracle {
    pub fn new(inner: Arc<dyn DecisionOracle>, policy: RetryPolicy) -> Self {
        Self { inner, policy }
    }

    pub fn shared(self) -> SharedOracle {
        Arc::new(self)
    }

    pub fn name(&self) -> &str {
        self.inner.name()
    }

    pub fn policy(&self) -> &RetryPolicy {
        &self.policy
    }

    /// Call the oracle, retrying transient failures. Returns the cleaned
    /// reply, or sentinel text once the attempts are exhausted.
    pub async fn ask(&self, request: &OracleRequest) -> String {
        let mut attempt: u32 = 0;
        loop {
            let result = self
                .inner
                .complete(request)
                .await
                .and_then(|text| clean_response(&text));

            match result {
                Ok(text) => {
                    debug!(
                        oracle = self.inner.name(),
                        attempt,
                        chars = text.len(),
                        "Oracle call succeeded"
                    );
                    return text;
                }
                Err(e) if self.policy.should_retry(attempt) => {
                    attempt += 1;
                    let delay = self.policy.backoff_duration(attempt);
                    warn!(
                        oracle = self.inner.name(),
                        attempt,
                        delay_ms = delay.as_millis() as u64,
                        error = %e,
                        "Oracle call failed, retrying"
                    );
                    tokio::time::sleep(delay).await;
                }
                Err(e) => {
                    warn!(
                        oracle = self.inner.name(),
                        attempts = attempt + 1,
                        error = %e,
                        "Oracle call failed, giving up"
                    );
                    return format!("{} ({} attempts): {}]", FAILURE_SENTINEL, attempt + 1, e);
                }
            }
        }
    }
}
