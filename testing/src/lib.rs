//! # Festival Testing
//!
//! Testing utilities for the festival client.
//!
//! This crate provides:
//! - [`ScriptedTransport`]: replays queued outcomes and records every attempt
//!   with its (tokio) timestamp, for exact backoff assertions under paused time
//! - [`QuotaAuthority`]: an in-memory remote service holding ticket quota,
//!   with partial grants and side-effect-free dry runs
//! - [`fixtures`]: sample platform records
//!
//! ## Example
//!
//! ```ignore
//! use festival_client::{FestivalClient, RetryPolicy};
//! use festival_testing::ScriptedTransport;
//! use std::sync::Arc;
//!
//! #[tokio::test(start_paused = true)]
//! async fn test_recovers_after_outage() {
//!     let transport = Arc::new(
//!         ScriptedTransport::new()
//!             .respond(503, "")
//!             .respond_json(200, &serde_json::json!([])),
//!     );
//!     let client = FestivalClient::new(Arc::clone(&transport), RetryPolicy::default());
//!
//!     client.schedule_slots().await.unwrap();
//!     assert_eq!(transport.attempt_count(), 2);
//! }
//! ```

/// Sample platform records
pub mod fixtures;

/// In-memory remote quota authority
pub mod quota;

/// Transport replaying queued outcomes
pub mod scripted;

// Re-export commonly used items
pub use quota::QuotaAuthority;
pub use scripted::{RecordedCall, ScriptedTransport};

/// Install a test-friendly `tracing` subscriber.
///
/// Honors `RUST_LOG`; safe to call from every test.
pub fn init_test_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}
