//! Bounded retry for a single outbound request.
//!
//! Only gateway/timeout-class failures re-issue the request, immediately
//! and without backoff; everything else terminates on first failure.
//! The attempt number is passed to the request closure by value, so the
//! request itself stays free of retry bookkeeping.

use ampliqc_core::{AmpliqcError, AmpliqcResult, TransportError};
use std::future::Future;

/// Default retryability classifier: timeout-class transport failures only.
fn transient_only(error: &AmpliqcError) -> bool {
    error.is_transient()
}

/// A single outbound call with bounded automatic retry.
#[derive(Debug, Clone)]
pub struct RetryingRequest<C = fn(&AmpliqcError) -> bool> {
    max_attempts: u32,
    is_retryable: C,
}

impl RetryingRequest {
    /// Retry gateway timeouts up to `max_attempts` total attempts
    /// (including the first).
    pub fn gateway_timeouts(max_attempts: u32) -> Self {
        Self::new(max_attempts, transient_only)
    }
}

impl<C> RetryingRequest<C>
where
    C: Fn(&AmpliqcError) -> bool,
{
    /// Create a policy with a custom retryability classifier.
    /// `max_attempts` below 1 is treated as 1.
    pub fn new(max_attempts: u32, is_retryable: C) -> Self {
        Self {
            max_attempts: max_attempts.max(1),
            is_retryable,
        }
    }

    pub fn max_attempts(&self) -> u32 {
        self.max_attempts
    }

    /// Execute the request, re-issuing it on retryable failure.
    ///
    /// The closure receives the attempt number, starting at 1. On success at
    /// any attempt that response is returned. A non-retryable failure is
    /// returned as-is; a retryable failure on the final attempt is reported
    /// as retries exhausted.
    pub async fn execute<T, F, Fut>(&self, mut request: F) -> AmpliqcResult<T>
    where
        F: FnMut(u32) -> Fut,
        Fut: Future<Output = AmpliqcResult<T>>,
    {
        let mut attempt = 1;
        loop {
            match request(attempt).await {
                Ok(response) => {
                    if attempt > 1 {
                        tracing::info!(attempt, "Request succeeded after retry");
                    }
                    return Ok(response);
                }
                Err(error) if !(self.is_retryable)(&error) => return Err(error),
                Err(error) if attempt >= self.max_attempts => {
                    tracing::error!(
                        attempts = self.max_attempts,
                        error = %error,
                        "Retries exhausted"
                    );
                    return Err(exhausted(error, self.max_attempts));
                }
                Err(error) => {
                    tracing::warn!(
                        attempt,
                        max_attempts = self.max_attempts,
                        error = %error,
                        "Transient failure, retrying immediately"
                    );
                    attempt += 1;
                }
            }
        }
    }
}

/// Fold the final transient failure into an exhaustion report.
fn exhausted(last: AmpliqcError, attempts: u32) -> AmpliqcError {
    match last {
        AmpliqcError::Transport(TransportError::GatewayTimeout { endpoint }) => {
            TransportError::RetriesExhausted { endpoint, attempts }.into()
        }
        other => other,
    }
}

// =============================================================================
// TESTS
// =============================================================================
