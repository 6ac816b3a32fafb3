//! Transport that replays a queue of outcomes.
//!
//! Each call pops the next queued outcome. Once the queue is empty the
//! optional repeating outcome is returned; without one, the call fails with a
//! [`TransportError`] so a test that under-scripts shows up as a network
//! failure rather than a hang.
//!
//! Every call is recorded with a [`tokio::time::Instant`], which follows the
//! paused test clock, so backoff gaps can be asserted exactly.

#![allow(clippy::unwrap_used)] // Test infrastructure uses unwrap for simplicity
#![allow(clippy::missing_panics_doc)] // Panics only on poisoned locks

use festival_client::{RawResponse, Transport, TransportError};
use festival_core::RequestDescriptor;
use serde::Serialize;
use std::collections::VecDeque;
use std::sync::Mutex;
use std::time::Duration;
use tokio::time::Instant;

type Outcome = Result<RawResponse, TransportError>;

/// One call seen by a [`ScriptedTransport`].
#[derive(Debug, Clone)]
pub struct RecordedCall {
    /// Request as received, including its attempt number
    pub request: RequestDescriptor,
    /// When the call started
    pub at: Instant,
}

/// Transport replaying queued outcomes.
///
/// # Example
///
/// ```
/// use festival_testing::ScriptedTransport;
///
/// let transport = ScriptedTransport::new()
///     .respond(503, "down")
///     .respond(503, "down")
///     .respond(200, "[]");
/// assert_eq!(transport.attempt_count(), 0);
/// ```
#[derive(Debug, Default)]
pub struct ScriptedTransport {
    script: Mutex<VecDeque<Outcome>>,
    repeat: Option<Outcome>,
    calls: Mutex<Vec<RecordedCall>>,
}

impl ScriptedTransport {
    /// Create a transport with an empty script.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Queue a response with a raw body.
    #[must_use]
    pub fn respond(self, status: u16, body: impl Into<Vec<u8>>) -> Self {
        self.push(Ok(RawResponse::new(status, body)))
    }

    /// Queue a response with a JSON body.
    #[must_use]
    pub fn respond_json<B: Serialize + ?Sized>(self, status: u16, body: &B) -> Self {
        let body = serde_json::to_vec(body).unwrap();
        self.push(Ok(RawResponse::new(status, body)))
    }

    /// Queue a call that receives no response.
    #[must_use]
    pub fn fail(self, message: impl Into<String>) -> Self {
        self.push(Err(TransportError(message.into())))
    }

    /// Return this response for every call once the queue is drained.
    #[must_use]
    pub fn always(mut self, status: u16, body: impl Into<Vec<u8>>) -> Self {
        self.repeat = Some(Ok(RawResponse::new(status, body)));
        self
    }

    /// Fail every call with no response once the queue is drained.
    #[must_use]
    pub fn always_fail(mut self, message: impl Into<String>) -> Self {
        self.repeat = Some(Err(TransportError(message.into())));
        self
    }

    fn push(self, outcome: Outcome) -> Self {
        self.script.lock().unwrap().push_back(outcome);
        self
    }

    /// Every call received so far, in order.
    #[must_use]
    pub fn calls(&self) -> Vec<RecordedCall> {
        self.calls.lock().unwrap().clone()
    }

    /// Number of calls received so far.
    #[must_use]
    pub fn attempt_count(&self) -> usize {
        self.calls.lock().unwrap().len()
    }

    /// Time between consecutive calls.
    #[must_use]
    pub fn gaps(&self) -> Vec<Duration> {
        let calls = self.calls.lock().unwrap();
        calls
            .windows(2)
            .map(|pair| pair[1].at.duration_since(pair[0].at))
            .collect()
    }

    /// Outcomes still queued.
    #[must_use]
    pub fn remaining(&self) -> usize {
        self.script.lock().unwrap().len()
    }
}

impl Transport for ScriptedTransport {
    async fn execute(&self, request: &RequestDescriptor) -> Result<RawResponse, TransportError> {
        self.calls.lock().unwrap().push(RecordedCall {
            request: request.clone(),
            at: Instant::now(),
        });

        let next = self.script.lock().unwrap().pop_front();
        next.or_else(|| self.repeat.clone())
            .unwrap_or_else(|| Err(TransportError("script exhausted".to_string())))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_outcomes_replayed_in_order() {
        let transport = ScriptedTransport::new()
            .respond(503, "down")
            .fail("reset")
            .respond(200, "ok");
        let request = RequestDescriptor::get("/schedule/slots");

        assert_eq!(transport.execute(&request).await.unwrap().status, 503);
        assert!(transport.execute(&request).await.is_err());
        assert_eq!(transport.execute(&request).await.unwrap().body, b"ok");
        assert_eq!(transport.attempt_count(), 3);
        assert_eq!(transport.remaining(), 0);
    }

    #[tokio::test]
    async fn test_exhausted_script_fails_without_response() {
        let transport = ScriptedTransport::new();
        let result = transport.execute(&RequestDescriptor::get("/x")).await;
        assert_eq!(result, Err(TransportError("script exhausted".to_string())));
    }

    #[tokio::test]
    async fn test_repeat_outcome_after_queue() {
        let transport = ScriptedTransport::new().respond(200, "first").always(500, "");
        let request = RequestDescriptor::get("/x");

        assert_eq!(transport.execute(&request).await.unwrap().status, 200);
        for _ in 0..3 {
            assert_eq!(transport.execute(&request).await.unwrap().status, 500);
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_gaps_follow_paused_clock() {
        let transport = ScriptedTransport::new().always(200, "");
        let request = RequestDescriptor::get("/x");

        transport.execute(&request).await.unwrap();
        tokio::time::sleep(Duration::from_millis(250)).await;
        transport.execute(&request).await.unwrap();

        assert_eq!(transport.gaps(), vec![Duration::from_millis(250)]);
    }
}
