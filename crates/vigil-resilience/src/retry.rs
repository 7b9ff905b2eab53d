// SPDX-FileCopyrightText: 2026 Vigil Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Generic retry wrapper with exponential backoff and jitter.
//!
//! Turns any transient-failing async operation into a bounded retry:
//! sleep `min(initial * multiplier^(attempt-1) + jitter, max)` between
//! attempts, where jitter is ±25% of the computed backoff drawn from the
//! OS CSPRNG. Cancelling the caller's scope aborts the sleep immediately.

use std::time::Duration;

use rand::rngs::OsRng;
use rand::RngCore;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, warn};

use vigil_core::VigilError;

/// Retry behavior knobs.
#[derive(Debug, Clone)]
pub struct RetryPolicy {
    pub max_retries: u32,
    pub initial_backoff: Duration,
    pub max_backoff: Duration,
    pub multiplier: f64,
    pub jitter: bool,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_retries: 3,
            initial_backoff: Duration::from_millis(100),
            max_backoff: Duration::from_secs(30),
            multiplier: 2.0,
            jitter: true,
        }
    }
}

/// Executes operations under a [`RetryPolicy`].
#[derive(Debug, Clone, Default)]
pub struct Retrier {
    policy: RetryPolicy,
}

impl Retrier {
    pub fn new(policy: RetryPolicy) -> Self {
        Self { policy }
    }

    /// Run `op` until it succeeds, fails terminally, or the retry budget is
    /// exhausted.
    ///
    /// Non-retryable errors (cancellation, timeout, validation, lifecycle
    /// rejections) surface immediately. Cancellation during a backoff sleep
    /// returns [`VigilError::Cancelled`].
    pub async fn run<F, Fut>(
        &self,
        operation: &str,
        cancel: &CancellationToken,
        mut op: F,
    ) -> Result<(), VigilError>
    where
        F: FnMut() -> Fut,
        Fut: std::future::Future<Output = Result<(), VigilError>>,
    {
        let mut last_err = None;

        for attempt in 0..=self.policy.max_retries {
            if attempt > 0 {
                let backoff = self.backoff_for(attempt);
                debug!(operation, attempt, backoff_ms = backoff.as_millis() as u64, "retrying operation");

                tokio::select! {
                    _ = cancel.cancelled() => return Err(VigilError::Cancelled),
                    _ = tokio::time::sleep(backoff) => {}
                }
            }

            if cancel.is_cancelled() {
                return Err(VigilError::Cancelled);
            }

            match op().await {
                Ok(()) => {
                    if attempt > 0 {
                        debug!(operation, attempts = attempt + 1, "operation succeeded after retry");
                    }
                    return Ok(());
                }
                Err(err) if !err.is_retryable() => return Err(err),
                Err(err) => {
                    warn!(
                        operation,
                        attempt = attempt + 1,
                        max_retries = self.policy.max_retries,
                        error = %err,
                        "operation failed"
                    );
                    last_err = Some(err);
                }
            }
        }

        let err = last_err.unwrap_or_else(|| VigilError::Internal("retry budget exhausted".into()));
        error!(
            operation,
            attempts = self.policy.max_retries + 1,
            error = %err,
            "operation failed after all retries"
        );
        Err(err)
    }

    /// Backoff for the given attempt (1-indexed), with jitter and the
    /// configured ceiling applied.
    fn backoff_for(&self, attempt: u32) -> Duration {
        let mut backoff = self.policy.initial_backoff.as_secs_f64()
            * self.policy.multiplier.powi(attempt as i32 - 1);

        if self.policy.jitter {
            let mut bytes = [0u8; 8];
            match OsRng.try_fill_bytes(&mut bytes) {
                Ok(()) => {
                    let raw = u64::from_be_bytes(bytes);
                    let unit = raw as f64 / (u64::MAX as f64 + 1.0);
                    backoff += backoff * 0.25 * (unit * 2.0 - 1.0);
                }
                Err(err) => {
                    error!(error = %err, "failed to draw secure jitter; proceeding without jitter");
                }
            }
        }

        let max = self.policy.max_backoff.as_secs_f64();
        if backoff > max {
            backoff = max;
        }

        Duration::from_secs_f64(backoff.max(0.0))
    }
}
