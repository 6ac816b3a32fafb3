//! Error types for the festival client

use festival_core::{CallOutcome, FailureKind, ReservationError};
use festival_runtime::Classified;
use serde::Deserialize;
use thiserror::Error;

/// Errors that can occur when talking to the festival platform
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ClientError {
    /// No response was received
    #[error("Request failed: {0}")]
    Network(String),

    /// Server-side failure (5xx)
    #[error("Server error (status {status}): {message}")]
    Transient {
        /// HTTP status code
        status: u16,
        /// Response body or error detail
        message: String,
    },

    /// Credential missing or refused (401/403)
    #[error("Unauthorized (status {status})")]
    Unauthorized {
        /// HTTP status code
        status: u16,
    },

    /// Rate limited - too many requests
    #[error("Rate limited - too many requests")]
    RateLimited,

    /// The platform rejected the request itself (other 4xx)
    #[error("Request rejected (status {status}): {message}")]
    Rejected {
        /// HTTP status code
        status: u16,
        /// Error detail from the platform
        message: String,
    },

    /// Response payload did not match the expected shape
    #[error("Malformed payload: {0}")]
    MalformedPayload(String),

    /// Reservation quantity was zero
    #[error("Reservation quantity must be greater than zero")]
    InvalidQuantity,

    /// Configured base endpoint is not a valid URL
    #[error("Invalid base URL: {0}")]
    InvalidBaseUrl(String),

    /// HTTP client could not be constructed
    #[error("HTTP client setup failed: {0}")]
    Setup(String),
}

/// Error body shape used by the platform (`{"detail": "..."}`).
#[derive(Deserialize)]
struct ErrorBody {
    detail: String,
}

impl ClientError {
    /// Build the error for a response whose status classified as `kind`.
    #[must_use]
    pub fn from_response(kind: FailureKind, status: u16, body: &[u8]) -> Self {
        match kind {
            FailureKind::Transient => Self::Transient {
                status,
                message: detail(body),
            },
            FailureKind::Unauthorized => Self::Unauthorized { status },
            FailureKind::RateLimited => Self::RateLimited,
            FailureKind::ClientError => Self::Rejected {
                status,
                message: detail(body),
            },
            FailureKind::Network => Self::Network(detail(body)),
        }
    }

    /// Failure class, if this error belongs to the transport taxonomy.
    #[must_use]
    pub fn kind(&self) -> Option<FailureKind> {
        match self {
            Self::Network(_) => Some(FailureKind::Network),
            Self::Transient { status, .. }
            | Self::Unauthorized { status }
            | Self::Rejected { status, .. } => FailureKind::classify(CallOutcome::Status(*status)),
            Self::RateLimited => Some(FailureKind::RateLimited),
            Self::MalformedPayload(_)
            | Self::InvalidQuantity
            | Self::InvalidBaseUrl(_)
            | Self::Setup(_) => None,
        }
    }

    /// Whether the retry policy would re-issue a call that failed this way.
    #[must_use]
    pub fn is_retryable(&self) -> bool {
        self.kind().is_some_and(FailureKind::is_retryable)
    }
}

impl Classified for ClientError {
    fn failure_kind(&self) -> Option<FailureKind> {
        self.kind()
    }
}

impl From<ReservationError> for ClientError {
    fn from(err: ReservationError) -> Self {
        match err {
            ReservationError::ZeroQuantity => Self::InvalidQuantity,
            other @ (ReservationError::OverGranted { .. } | ReservationError::MissingGrant) => {
                Self::MalformedPayload(other.to_string())
            }
        }
    }
}

fn detail(body: &[u8]) -> String {
    serde_json::from_slice::<ErrorBody>(body)
        .map_or_else(|_| String::from_utf8_lossy(body).into_owned(), |b| b.detail)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_detail_extracted_from_json_body() {
        let err = ClientError::from_response(
            FailureKind::ClientError,
            400,
            br#"{"detail": "Ticket not on sale"}"#,
        );
        assert_eq!(
            err,
            ClientError::Rejected {
                status: 400,
                message: "Ticket not on sale".to_string()
            }
        );
        assert_eq!(err.kind(), Some(FailureKind::ClientError));
    }

    #[test]
    fn test_plain_text_body_kept_verbatim() {
        let err = ClientError::from_response(FailureKind::Transient, 502, b"Bad Gateway");
        assert_eq!(err.to_string(), "Server error (status 502): Bad Gateway");
        assert!(err.is_retryable());
    }

    #[test]
    fn test_kinds_round_trip_through_errors() {
        let cases = [
            (FailureKind::Transient, 503),
            (FailureKind::Unauthorized, 401),
            (FailureKind::Unauthorized, 403),
            (FailureKind::RateLimited, 429),
            (FailureKind::ClientError, 404),
        ];
        for (kind, status) in cases {
            assert_eq!(ClientError::from_response(kind, status, b"").kind(), Some(kind));
        }
    }

    #[test]
    fn test_local_errors_are_unclassified() {
        assert_eq!(ClientError::MalformedPayload("x".into()).kind(), None);
        assert_eq!(ClientError::InvalidQuantity.kind(), None);
        assert!(!ClientError::InvalidQuantity.is_retryable());
    }

    #[test]
    fn test_reservation_errors_convert() {
        assert_eq!(
            ClientError::from(ReservationError::ZeroQuantity),
            ClientError::InvalidQuantity
        );
        assert!(matches!(
            ClientError::from(ReservationError::OverGranted {
                reserved: 3,
                requested: 1
            }),
            ClientError::MalformedPayload(_)
        ));
        assert!(matches!(
            ClientError::from(ReservationError::MissingGrant),
            ClientError::MalformedPayload(_)
        ));
    }
}
