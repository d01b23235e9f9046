use std::fmt::Display;
use std::thread;
use std::time::Duration;

use tracing::{error, warn};

/// Classifies an error as worth retrying (network/timeout style failures) or
/// permanent (validation, auth). Permanent errors propagate on the first try.
pub trait Retryable {
    fn is_transient(&self) -> bool;
}

/// Exponential-backoff wrapper around a fallible remote call.
#[derive(Debug, Clone)]
pub struct RetryPolicy {
    max_attempts: u32,
    initial_delay: Duration,
    backoff_factor: f64,
}

impl RetryPolicy {
    pub fn new(max_attempts: u32, initial_delay: Duration) -> Self {
        Self {
            max_attempts: max_attempts.max(1),
            initial_delay,
            backoff_factor: 2.0,
        }
    }

    pub fn with_backoff_factor(mut self, factor: f64) -> Self {
        self.backoff_factor = factor;
        self
    }

    /// Run `op`, retrying transient failures with exponentially growing delays.
    /// Exhaustion re-raises the last error; retries are never silent.
    pub fn run<T, E, F>(&self, label: &str, mut op: F) -> Result<T, E>
    where
        E: Retryable + Display,
        F: FnMut() -> Result<T, E>,
    {
        let mut delay = self.initial_delay;
        let mut attempt = 1;

        loop {
            match op() {
                Ok(value) => return Ok(value),
                Err(err) if !err.is_transient() => return Err(err),
                Err(err) if attempt >= self.max_attempts => {
                    error!(%err, attempts = self.max_attempts, "{label}: retries exhausted");
                    return Err(err);
                }
                Err(err) => {
                    warn!(
                        %err,
                        attempt,
                        max_attempts = self.max_attempts,
                        delay_ms = delay.as_millis() as u64,
                        "{label}: transient failure, retrying"
                    );
                    thread::sleep(delay);
                    delay = delay.mul_f64(self.backoff_factor);
                    attempt += 1;
                }
            }
        }
    }
}
