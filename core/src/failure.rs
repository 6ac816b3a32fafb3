//! Failure classification for remote calls.
//!
//! Every failed call maps to exactly one [`FailureKind`]. Classification is a
//! pure function of the call outcome: the status code when a response was
//! received, or the absence of a response.

use serde::{Deserialize, Serialize};
use std::fmt;

/// What a single remote call produced, as far as classification cares.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum CallOutcome {
    /// A response with this HTTP status was received
    Status(u16),
    /// No response was received (connect failure, timeout, reset)
    NoResponse,
}

/// Failure classes for remote calls.
#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum FailureKind {
    /// Server-side failure (5xx)
    Transient,
    /// Missing or rejected credential (401/403)
    Unauthorized,
    /// Too many requests (429)
    RateLimited,
    /// Any other 4xx: the request itself is wrong
    ClientError,
    /// No response received
    Network,
}

impl FailureKind {
    /// Classify a call outcome.
    ///
    /// Returns `None` when the outcome is a success (status below 400).
    /// Rules are applied in priority order: no response, 5xx, 401/403, 429,
    /// other 4xx.
    #[must_use]
    pub const fn classify(outcome: CallOutcome) -> Option<Self> {
        match outcome {
            CallOutcome::NoResponse => Some(Self::Network),
            CallOutcome::Status(500..=599) => Some(Self::Transient),
            CallOutcome::Status(401 | 403) => Some(Self::Unauthorized),
            CallOutcome::Status(429) => Some(Self::RateLimited),
            CallOutcome::Status(status) if status >= 400 => Some(Self::ClientError),
            CallOutcome::Status(_) => None,
        }
    }

    /// Whether the retry policy may re-issue a call that failed this way.
    ///
    /// A missing response is indistinguishable from a recoverable outage, so
    /// `Network` retries like `Transient`.
    #[must_use]
    pub const fn is_retryable(self) -> bool {
        matches!(self, Self::Transient | Self::Network)
    }

    /// Whether a terminal failure of this kind emits a warning before it is
    /// surfaced.
    #[must_use]
    pub const fn is_warning(self) -> bool {
        matches!(self, Self::Unauthorized | Self::RateLimited)
    }

    /// Stable label used in logs and metrics.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Transient => "transient",
            Self::Unauthorized => "unauthorized",
            Self::RateLimited => "rate_limited",
            Self::ClientError => "client_error",
            Self::Network => "network",
        }
    }
}

impl fmt::Display for FailureKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
