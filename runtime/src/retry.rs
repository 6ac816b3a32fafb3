//! Retry logic with exponential backoff for handling transient failures.
//!
//! The policy is a small state machine driven by the failure classifier:
//!
//! ```text
//! Attempting(n) --success-----------------------------> Succeeded
//! Attempting(n) --retryable kind, n < max_retries-----> Backoff(n + 1)
//! Attempting(n) --anything else-----------------------> TerminallyFailed(kind)
//! Backoff(n)    --after delay_for_retry(n)------------> Attempting(n)
//! ```
//!
//! Only `Transient` and `Network` failures are retried. Every other kind fails
//! on the first attempt. The attempt number is threaded through each call as a
//! fresh [`RequestDescriptor`]; nothing about an invocation's progress is
//! shared with any other invocation.
//!
//! # Example
//!
//! ```rust
//! use festival_core::{FailureKind, RequestDescriptor};
//! use festival_runtime::retry::{Classified, RetryPolicy, retry_classified};
//! use std::time::Duration;
//!
//! #[derive(Debug)]
//! struct Unavailable;
//!
//! impl std::fmt::Display for Unavailable {
//!     fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
//!         f.write_str("service unavailable")
//!     }
//! }
//!
//! impl Classified for Unavailable {
//!     fn failure_kind(&self) -> Option<FailureKind> {
//!         Some(FailureKind::Transient)
//!     }
//! }
//!
//! # async fn example() -> Result<(), Unavailable> {
//! let policy = RetryPolicy::builder()
//!     .max_retries(3)
//!     .initial_delay(Duration::from_millis(100))
//!     .build();
//!
//! let descriptor = RequestDescriptor::get("/schedule/slots");
//! let slots = retry_classified(&policy, &descriptor, |request| async move {
//!     // Issue `request` here; `request.attempt()` is 0 on the first call.
//!     Ok::<_, Unavailable>(request.attempt())
//! })
//! .await?;
//! # Ok(())
//! # }
//! ```

use crate::metrics::RetryMetrics;
use festival_core::{FailureKind, RequestDescriptor};
use std::fmt::Display;
use std::future::Future;
use std::time::Duration;
use tokio::time::sleep;

/// Errors the retry policy can reason about.
pub trait Classified {
    /// Failure class of this error.
    ///
    /// `None` marks an error outside the transport taxonomy (for example a
    /// malformed payload). Such errors are never retried.
    fn failure_kind(&self) -> Option<FailureKind>;
}

impl Classified for FailureKind {
    fn failure_kind(&self) -> Option<FailureKind> {
        Some(*self)
    }
}

/// Retry policy configuration for exponential backoff.
///
/// # Default Values
///
/// - `max_retries`: 3
/// - `initial_delay`: 100ms
/// - `max_delay`: 30 seconds
/// - `multiplier`: 2.0 (delay doubles each retry)
#[derive(Debug, Clone, PartialEq)]
pub struct RetryPolicy {
    /// Maximum number of retry attempts
    pub max_retries: usize,
    /// Delay before the first retry
    pub initial_delay: Duration,
    /// Maximum delay between retries (cap for exponential backoff)
    pub max_delay: Duration,
    /// Multiplier for exponential backoff
    pub multiplier: f64,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_retries: 3,
            initial_delay: Duration::from_millis(100),
            max_delay: Duration::from_secs(30),
            multiplier: 2.0,
        }
    }
}

impl RetryPolicy {
    /// Create a new policy builder.
    #[must_use]
    pub const fn builder() -> RetryPolicyBuilder {
        RetryPolicyBuilder {
            max_retries: Some(3),
            initial_delay: Some(Duration::from_millis(100)),
            max_delay: Some(Duration::from_secs(30)),
            multiplier: Some(2.0),
        }
    }

    /// Policy that never retries.
    #[must_use]
    pub fn no_retry() -> Self {
        Self {
            max_retries: 0,
            ..Self::default()
        }
    }

    /// Delay slept in `Backoff(retry)`, i.e. before retry number `retry`.
    ///
    /// `retry` is 1-based: `initial_delay * multiplier ^ (retry - 1)`, capped at
    /// `max_delay`. With the defaults this yields 100ms, 200ms, 400ms.
    #[must_use]
    #[allow(
        clippy::cast_possible_truncation,
        clippy::cast_possible_wrap,
        clippy::cast_precision_loss,
        clippy::cast_sign_loss
    )] // Delays are small; float math saturates on overflow
    pub fn delay_for_retry(&self, retry: usize) -> Duration {
        let exponent = retry.saturating_sub(1).min(i32::MAX as usize) as i32;
        let delay_ms = self.initial_delay.as_millis() as f64 * self.multiplier.powi(exponent);

        let delay = Duration::from_millis(delay_ms as u64);

        if delay > self.max_delay {
            self.max_delay
        } else {
            delay
        }
    }
}

/// Builder for [`RetryPolicy`].
#[derive(Debug, Clone)]
pub struct RetryPolicyBuilder {
    max_retries: Option<usize>,
    initial_delay: Option<Duration>,
    max_delay: Option<Duration>,
    multiplier: Option<f64>,
}

impl RetryPolicyBuilder {
    /// Set maximum number of retries.
    #[must_use]
    pub const fn max_retries(mut self, max_retries: usize) -> Self {
        self.max_retries = Some(max_retries);
        self
    }

    /// Set delay before the first retry.
    #[must_use]
    pub const fn initial_delay(mut self, delay: Duration) -> Self {
        self.initial_delay = Some(delay);
        self
    }

    /// Set maximum delay (cap for exponential backoff).
    #[must_use]
    pub const fn max_delay(mut self, delay: Duration) -> Self {
        self.max_delay = Some(delay);
        self
    }

    /// Set multiplier for exponential backoff.
    #[must_use]
    pub const fn multiplier(mut self, multiplier: f64) -> Self {
        self.multiplier = Some(multiplier);
        self
    }

    /// Build the [`RetryPolicy`].
    #[must_use]
    pub fn build(self) -> RetryPolicy {
        RetryPolicy {
            max_retries: self.max_retries.unwrap_or(3),
            initial_delay: self.initial_delay.unwrap_or(Duration::from_millis(100)),
            max_delay: self.max_delay.unwrap_or(Duration::from_secs(30)),
            multiplier: self.multiplier.unwrap_or(2.0),
        }
    }
}

/// State of one retry invocation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RetryState {
    /// Attempt `n` (0-based) is in flight
    Attempting(usize),
    /// Waiting before attempt `n`
    Backoff(usize),
    /// An attempt succeeded
    Succeeded,
    /// Gave up; `None` when the error carried no failure kind
    TerminallyFailed(Option<FailureKind>),
}

impl RetryState {
    /// Initial state of every invocation.
    #[must_use]
    pub const fn initial() -> Self {
        Self::Attempting(0)
    }

    /// Transition after the in-flight attempt succeeded.
    #[must_use]
    pub const fn on_success(self) -> Self {
        match self {
            Self::Attempting(_) => Self::Succeeded,
            other => other,
        }
    }

    /// Transition after the in-flight attempt failed with `kind`.
    #[must_use]
    pub fn on_failure(self, kind: Option<FailureKind>, policy: &RetryPolicy) -> Self {
        match (self, kind) {
            (Self::Attempting(n), Some(kind)) if kind.is_retryable() && n < policy.max_retries => {
                Self::Backoff(n + 1)
            }
            (Self::Attempting(_), kind) => Self::TerminallyFailed(kind),
            (other, _) => other,
        }
    }

    /// Transition once the backoff delay has elapsed.
    #[must_use]
    pub const fn on_backoff_elapsed(self) -> Self {
        match self {
            Self::Backoff(n) => Self::Attempting(n),
            other => other,
        }
    }

    /// Whether no further transitions are possible.
    #[must_use]
    pub const fn is_terminal(self) -> bool {
        matches!(self, Self::Succeeded | Self::TerminallyFailed(_))
    }
}

/// Run `operation` under `policy`, retrying classified retryable failures.
///
/// `operation` receives a copy of `descriptor` carrying the current attempt
/// number. Attempts are strictly sequential: the next attempt starts only
/// after the previous outcome is known and its backoff delay has elapsed.
///
/// # Errors
///
/// Returns the error of the final attempt when it is not retryable, or when
/// `policy.max_retries` retries have been used up.
pub async fn retry_classified<F, Fut, T, E>(
    policy: &RetryPolicy,
    descriptor: &RequestDescriptor,
    mut operation: F,
) -> Result<T, E>
where
    F: FnMut(RequestDescriptor) -> Fut,
    Fut: Future<Output = Result<T, E>>,
    E: Classified + Display,
{
    let mut state = RetryState::initial();
    let mut attempt = 0;

    loop {
        RetryMetrics::record_attempt();
        tracing::debug!(
            method = %descriptor.method(),
            path = descriptor.path(),
            attempt,
            "Issuing request"
        );

        let outcome = operation(descriptor.with_attempt(attempt)).await;
        state = match &outcome {
            Ok(_) => state.on_success(),
            Err(err) => state.on_failure(err.failure_kind(), policy),
        };

        match (state, outcome) {
            (_, Ok(result)) => {
                if attempt > 0 {
                    tracing::info!(attempt, path = descriptor.path(), "Operation succeeded after retry");
                    RetryMetrics::record_success();
                }
                return Ok(result);
            }
            (RetryState::Backoff(next), Err(err)) => {
                let delay = policy.delay_for_retry(next);
                tracing::warn!(
                    attempt,
                    path = descriptor.path(),
                    delay_ms = delay.as_millis(),
                    error = %err,
                    "Operation failed, retrying..."
                );
                sleep(delay).await;
                state = state.on_backoff_elapsed();
                attempt = next;
            }
            (_, Err(err)) => {
                report_terminal(descriptor, attempt, err.failure_kind(), &err);
                return Err(err);
            }
        }
    }
}

fn report_terminal<E: Display>(
    descriptor: &RequestDescriptor,
    attempt: usize,
    kind: Option<FailureKind>,
    err: &E,
) {
    let Some(kind) = kind else {
        tracing::debug!(path = descriptor.path(), error = %err, "Unclassified failure, not retrying");
        return;
    };

    RetryMetrics::record_terminal(kind);

    if kind.is_retryable() {
        RetryMetrics::record_exhausted();
        tracing::error!(
            attempt,
            path = descriptor.path(),
            kind = %kind,
            error = %err,
            "Operation failed after max retries"
        );
    } else if kind.is_warning() {
        tracing::warn!(
            path = descriptor.path(),
            kind = %kind,
            error = %err,
            "Request refused by remote authority"
        );
    } else {
        tracing::debug!(
            path = descriptor.path(),
            kind = %kind,
            error = %err,
            "Error is not retryable, failing immediately"
        );
    }
}
