use std::fmt::Display;
use std::time::Duration;

use tokio::time::sleep;
use tokio_util::sync::CancellationToken;
use tracing::warn;

/// Attempt budget for a retried operation: one initial attempt plus one
/// additional attempt per configured delay.
#[derive(Debug, Clone)]
pub struct RetryPolicy {
    delays: Vec<Duration>,
}

impl Default for RetryPolicy {
    /// Four retries after the first attempt, 5 attempts total.
    fn default() -> Self {
        Self::new([2, 4, 6, 8].map(Duration::from_secs).to_vec())
    }
}

impl RetryPolicy {
    #[must_use]
    pub const fn new(delays: Vec<Duration>) -> Self {
        Self { delays }
    }

    /// Total number of attempts this policy allows.
    #[expect(clippy::cast_possible_truncation, reason = "delay lists are tiny")]
    #[must_use]
    pub fn attempts(&self) -> u32 {
        self.delays.len() as u32 + 1
    }

    fn delay_after(&self, attempt: usize) -> Option<Duration> {
        self.delays.get(attempt).copied()
    }
}

/// Outcome of a retried operation that did not succeed.
#[derive(Debug)]
pub enum RetryError<E> {
    /// The classifier ruled the failure non-retryable; surfaced immediately.
    Terminal(E),
    /// Every attempt in the budget failed; carries the last error.
    Exhausted(E),
    /// The cancellation signal fired before completion.
    Cancelled,
}

/// Retry an async operation with per-attempt backoff delays.
///
/// Attempts are strictly sequential. `is_retryable` classifies each failure:
/// a non-retryable error stops the loop immediately, everything else is
/// re-attempted until the policy budget is exhausted. Cancellation is
/// observed before each attempt, while an attempt is in flight (the attempt
/// future is dropped) and during the backoff sleep; once it fires, no
/// further attempt is made.
///
/// # Returns
/// The operation result if any attempt succeeds, otherwise the classified
/// [`RetryError`].
pub async fn retry_with_backoff<F, Fut, T, E>(
    mut operation: F,
    policy: &RetryPolicy,
    cancel: &CancellationToken,
    is_retryable: impl Fn(&E) -> bool,
) -> Result<T, RetryError<E>>
where
    F: FnMut() -> Fut,
    Fut: std::future::Future<Output = Result<T, E>>,
    E: Display,
{
    let total = policy.attempts();
    let mut last_error = None;

    for attempt in 0..policy.delays.len() + 1 {
        if cancel.is_cancelled() {
            return Err(RetryError::Cancelled);
        }

        let outcome = tokio::select! {
            () = cancel.cancelled() => return Err(RetryError::Cancelled),
            outcome = operation() => outcome,
        };

        match outcome {
            Ok(value) => return Ok(value),
            Err(e) if !is_retryable(&e) => return Err(RetryError::Terminal(e)),
            Err(e) => {
                if let Some(delay) = policy.delay_after(attempt) {
                    warn!(
                        "Request failed (attempt {}/{total}): {e}. Retrying after {delay:?}...",
                        attempt + 1,
                    );
                    tokio::select! {
                        () = cancel.cancelled() => return Err(RetryError::Cancelled),
                        () = sleep(delay) => {}
                    }
                }
                last_error = Some(e);
            }
        }
    }

    Err(RetryError::Exhausted(last_error.unwrap_or_else(|| {
        panic!("all retry attempts exhausted but no error was stored")
    })))
}
