//! # Festival Runtime
//!
//! Resilience and caching layer for the festival client.
//!
//! ## Core Components
//!
//! - **Retry Policy**: bounded exponential backoff driven by failure
//!   classification ([`retry`])
//! - **Query Cache**: last-known value per read query, invalidated by
//!   mutations ([`cache`])
//! - **Metrics**: counters and histograms for requests, retries, cache and
//!   reservations ([`metrics`])
//!
//! ## Example
//!
//! ```ignore
//! use festival_runtime::{QueryCache, QueryKey, RetryPolicy, retry_classified};
//!
//! let cache = QueryCache::new();
//! let policy = RetryPolicy::default();
//! let key = QueryKey::new(["schedule", "slots"]);
//!
//! let slots = cache
//!     .get_or_fetch(&key, || retry_classified(&policy, &descriptor, |req| transport.execute(req)))
//!     .await?;
//! ```

/// Retry logic with exponential backoff
pub mod retry;

/// Query cache with event-driven invalidation
pub mod cache;

/// Prometheus metrics for observability
pub mod metrics;

pub use cache::{QueryCache, QueryKey};
pub use retry::{Classified, RetryPolicy, RetryPolicyBuilder, RetryState, retry_classified};
