//! Prometheus metrics for observability and monitoring.
//!
//! This module provides metric collection for the client's moving parts:
//! - Outbound HTTP requests
//! - Retry attempts and terminal failures
//! - Query cache hits, misses and invalidations
//! - Reservation previews and commits
//!
//! Recording is always cheap: without an installed recorder the `metrics`
//! macros are no-ops.
//!
//! # Example
//!
//! ```rust,no_run
//! use festival_runtime::metrics::PrometheusExporter;
//!
//! # fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let mut exporter = PrometheusExporter::new();
//! exporter.install()?;
//!
//! // ... run the client ...
//!
//! if let Some(text) = exporter.render() {
//!     println!("{text}");
//! }
//! # Ok(())
//! # }
//! ```

use festival_core::FailureKind;
use metrics::{describe_counter, describe_histogram};
use metrics_exporter_prometheus::{Matcher, PrometheusBuilder, PrometheusHandle};
use std::time::Duration;
use thiserror::Error;

// Re-export metrics macros for use in other modules
pub use metrics::{counter, gauge, histogram};

/// Errors from metrics operations.
#[derive(Error, Debug)]
pub enum MetricsError {
    /// Failed to build metrics exporter
    #[error("Failed to build metrics exporter: {0}")]
    Build(String),
    /// Failed to install metrics exporter
    #[error("Failed to install metrics exporter: {0}")]
    Install(String),
}

/// Prometheus recorder installer.
///
/// Installs a process-wide recorder and renders the collected metrics in the
/// Prometheus text format.
#[derive(Default)]
pub struct PrometheusExporter {
    handle: Option<PrometheusHandle>,
}

impl PrometheusExporter {
    /// Create an exporter that has not been installed yet.
    #[must_use]
    pub const fn new() -> Self {
        Self { handle: None }
    }

    /// Register metric descriptions and install the Prometheus recorder.
    ///
    /// # Errors
    ///
    /// Returns error if the exporter cannot be built or installed.
    ///
    /// # Note
    ///
    /// If a metrics recorder is already installed (e.g., in tests), this
    /// logs a warning and succeeds without a handle.
    pub fn install(&mut self) -> Result<(), MetricsError> {
        register_metrics();

        let builder = PrometheusBuilder::new()
            .set_buckets_for_metric(
                Matcher::Suffix("duration_seconds".to_string()),
                &[
                    0.005, 0.01, 0.025, 0.05, 0.1, 0.25, 0.5, 1.0, 2.5, 5.0, 10.0, 30.0,
                ],
            )
            .map_err(|e| MetricsError::Build(e.to_string()))?;

        match builder.install_recorder() {
            Ok(handle) => {
                self.handle = Some(handle);
                tracing::info!("Prometheus metrics recorder installed");
                Ok(())
            }
            Err(e) => {
                let err_msg = e.to_string();
                if err_msg.contains("already initialized") {
                    tracing::warn!("Metrics recorder already initialized, skipping re-initialization");
                    Ok(())
                } else {
                    Err(MetricsError::Install(err_msg))
                }
            }
        }
    }

    /// Get the metrics handle for rendering.
    #[must_use]
    pub const fn handle(&self) -> Option<&PrometheusHandle> {
        self.handle.as_ref()
    }

    /// Render current metrics in Prometheus format.
    ///
    /// Returns `None` if this exporter did not install the recorder.
    #[must_use]
    pub fn render(&self) -> Option<String> {
        self.handle.as_ref().map(PrometheusHandle::render)
    }
}

/// Register all metric descriptions.
fn register_metrics() {
    // HTTP
    describe_counter!(
        "http_requests_total",
        "Total number of HTTP requests sent, labelled by method and outcome"
    );
    describe_histogram!(
        "http_request_duration_seconds",
        "Time from sending a request to receiving its response"
    );

    // Retry
    describe_counter!(
        "retry_attempts_total",
        "Total number of attempts issued through the retry policy"
    );
    describe_counter!(
        "retry_successes_total",
        "Total number of calls that succeeded after at least one retry"
    );
    describe_counter!(
        "retry_exhausted_total",
        "Total number of calls that failed after max retries"
    );
    describe_counter!(
        "retry_terminal_failures_total",
        "Total number of terminal failures, labelled by failure kind"
    );

    // Query cache
    describe_counter!("query_cache_hits_total", "Total number of cache hits");
    describe_counter!("query_cache_misses_total", "Total number of cache misses");
    describe_counter!(
        "query_cache_invalidations_total",
        "Total number of cache entries invalidated"
    );
    describe_counter!(
        "query_cache_stale_writes_discarded_total",
        "Fetch results not stored because their key was invalidated mid-flight"
    );

    // Reservations
    describe_counter!(
        "reservations_total",
        "Total number of successful reservation calls, labelled by mode"
    );
    describe_counter!(
        "reservation_partial_grants_total",
        "Commits that granted fewer units than requested"
    );
}

/// HTTP metrics recorder.
pub struct HttpMetrics;

impl HttpMetrics {
    /// Record a request that received a response.
    pub fn record_response(method: &'static str, status: u16, duration: Duration) {
        counter!("http_requests_total", "method" => method, "outcome" => status_class(status))
            .increment(1);
        histogram!("http_request_duration_seconds").record(duration.as_secs_f64());
    }

    /// Record a request that received no response.
    pub fn record_no_response(method: &'static str) {
        counter!("http_requests_total", "method" => method, "outcome" => "no_response").increment(1);
    }
}

const fn status_class(status: u16) -> &'static str {
    match status {
        100..=199 => "1xx",
        200..=299 => "2xx",
        300..=399 => "3xx",
        400..=499 => "4xx",
        500..=599 => "5xx",
        _ => "other",
    }
}

/// Retry metrics recorder.
pub struct RetryMetrics;

impl RetryMetrics {
    /// Record an attempt.
    pub fn record_attempt() {
        counter!("retry_attempts_total").increment(1);
    }

    /// Record a successful retry.
    pub fn record_success() {
        counter!("retry_successes_total").increment(1);
    }

    /// Record exhausted retries.
    pub fn record_exhausted() {
        counter!("retry_exhausted_total").increment(1);
    }

    /// Record a terminal failure.
    pub fn record_terminal(kind: FailureKind) {
        counter!("retry_terminal_failures_total", "kind" => kind.as_str()).increment(1);
    }
}

/// Query cache metrics recorder.
pub struct CacheMetrics;

impl CacheMetrics {
    /// Record a cache hit.
    pub fn record_hit() {
        counter!("query_cache_hits_total").increment(1);
    }

    /// Record a cache miss.
    pub fn record_miss() {
        counter!("query_cache_misses_total").increment(1);
    }

    /// Record invalidated entries.
    pub fn record_invalidations(count: usize) {
        counter!("query_cache_invalidations_total").increment(count as u64);
    }

    /// Record a fetch result that was not stored.
    pub fn record_stale_write_discarded() {
        counter!("query_cache_stale_writes_discarded_total").increment(1);
    }
}

/// Reservation metrics recorder.
pub struct ReservationMetrics;

impl ReservationMetrics {
    /// Record a successful reservation call.
    pub fn record(dry_run: bool, partial: bool) {
        let mode = if dry_run { "preview" } else { "commit" };
        counter!("reservations_total", "mode" => mode).increment(1);
        if partial && !dry_run {
            counter!("reservation_partial_grants_total").increment(1);
        }
    }
}
