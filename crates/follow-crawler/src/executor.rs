//! Retry, backoff and rate-limit handling for single remote calls.

use crate::config::RetryPolicy;
use crate::error::{ApiFailure, CrawlError, FailureKind, Result};
use std::future::Future;
use std::time::Duration;
use tokio_util::sync::CancellationToken;
use tracing::{error, info, warn};

/// Wait period and consecutive-error counter for one retry sequence.
#[derive(Debug, Clone, PartialEq)]
pub struct BackoffState {
    wait_period: Duration,
    consecutive_errors: u32,
    total_waited: Duration,
}

impl BackoffState {
    pub fn new(policy: &RetryPolicy) -> Self {
        Self {
            wait_period: policy.initial_wait,
            consecutive_errors: 0,
            total_waited: Duration::ZERO,
        }
    }

    pub fn wait_period(&self) -> Duration {
        self.wait_period
    }

    pub fn consecutive_errors(&self) -> u32 {
        self.consecutive_errors
    }

    pub fn total_waited(&self) -> Duration {
        self.total_waited
    }

    /// Records a transient failure and returns how long to wait before the next
    /// attempt, or `None` once the error budget or the cumulative wait limit is spent.
    pub fn register_transient(&mut self, policy: &RetryPolicy) -> Option<Duration> {
        self.consecutive_errors += 1;
        if self.consecutive_errors >= policy.max_consecutive_errors {
            return None;
        }

        let wait = self.wait_period;
        if self.total_waited + wait > policy.max_total_wait {
            return None;
        }

        self.total_waited += wait;
        self.wait_period = wait.mul_f64(policy.multiplier);
        Some(wait)
    }

    pub fn reset(&mut self, policy: &RetryPolicy) {
        *self = Self::new(policy);
    }
}

/// Executes remote calls, absorbing throttling and transient faults.
///
/// Unauthorized and NotFound yield `Ok(None)` so callers can skip the target.
/// Rate limiting suspends the task for the cooldown and retries without limit.
/// Transient failures back off exponentially until the consecutive-error budget
/// or the cumulative wait limit runs out. Everything else is returned as an error.
#[derive(Debug, Clone)]
pub struct RequestExecutor {
    policy: RetryPolicy,
    cancel: CancellationToken,
}

impl RequestExecutor {
    pub fn new(policy: RetryPolicy, cancel: CancellationToken) -> Self {
        Self { policy, cancel }
    }

    pub fn policy(&self) -> &RetryPolicy {
        &self.policy
    }

    pub fn cancel_token(&self) -> &CancellationToken {
        &self.cancel
    }

    /// Runs `call` with the policy's consecutive-error budget.
    pub async fn execute<T, F, Fut>(&self, endpoint: &str, call: F) -> Result<Option<T>>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = std::result::Result<T, ApiFailure>>,
    {
        self.execute_with_limit(endpoint, self.policy.max_consecutive_errors, call)
            .await
    }

    pub async fn execute_with_limit<T, F, Fut>(
        &self,
        endpoint: &str,
        max_consecutive_errors: u32,
        mut call: F,
    ) -> Result<Option<T>>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = std::result::Result<T, ApiFailure>>,
    {
        let policy = self
            .policy
            .clone()
            .with_max_consecutive_errors(max_consecutive_errors);
        let mut backoff = BackoffState::new(&policy);

        loop {
            if self.cancel.is_cancelled() {
                return Err(CrawlError::Cancelled);
            }

            let failure = match call().await {
                Ok(value) => return Ok(Some(value)),
                Err(failure) => failure,
            };

            match failure.kind {
                FailureKind::Unauthorized | FailureKind::NotFound => {
                    warn!(endpoint, kind = %failure.kind, "{}; treating target as unreachable", failure);
                    return Ok(None);
                }
                FailureKind::RateLimited => {
                    backoff.reset(&policy);
                    warn!(
                        endpoint,
                        wait_secs = policy.rate_limit_cooldown.as_secs(),
                        "Rate limit exceeded, retrying after cooldown"
                    );
                    self.pause(policy.rate_limit_cooldown).await?;
                    info!(endpoint, "Cooldown finished, trying again");
                }
                FailureKind::TransientServer | FailureKind::TransientTransport => {
                    match backoff.register_transient(&policy) {
                        Some(wait) => {
                            warn!(
                                endpoint,
                                kind = %failure.kind,
                                attempt = backoff.consecutive_errors(),
                                wait_secs = wait.as_secs_f64(),
                                "{}. Retrying", failure
                            );
                            self.pause(wait).await?;
                        }
                        None => {
                            error!(
                                endpoint,
                                attempts = backoff.consecutive_errors(),
                                "Too many consecutive errors, bailing out"
                            );
                            return Err(CrawlError::RetriesExhausted {
                                endpoint: endpoint.to_string(),
                                attempts: backoff.consecutive_errors(),
                                kind: failure.kind,
                            });
                        }
                    }
                }
                FailureKind::Fatal => {
                    return Err(CrawlError::Fatal {
                        endpoint: endpoint.to_string(),
                        message: failure.message,
                    });
                }
            }
        }
    }

    async fn pause(&self, wait: Duration) -> Result<()> {
        tokio::select! {
            _ = self.cancel.cancelled() => Err(CrawlError::Cancelled),
            _ = tokio::time::sleep(wait) => Ok(()),
        }
    }
}
