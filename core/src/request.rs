//! Request descriptors.
//!
//! A [`RequestDescriptor`] describes one logical remote call. It is immutable:
//! the retry layer threads the attempt count through by deriving a new
//! descriptor with [`RequestDescriptor::with_attempt`], so no attempt state is
//! ever shared between calls.

use serde_json::Value;
use std::fmt;

/// HTTP method of a logical call.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Method {
    /// Read
    Get,
    /// Write
    Post,
}

impl Method {
    /// Upper-case method name.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Get => "GET",
            Self::Post => "POST",
        }
    }
}

impl fmt::Display for Method {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One logical remote call.
#[derive(Clone, Debug, PartialEq)]
pub struct RequestDescriptor {
    method: Method,
    path: String,
    params: Vec<(String, String)>,
    body: Option<Value>,
    attempt: usize,
}

impl RequestDescriptor {
    /// Create a `GET` descriptor for a logical resource path.
    #[must_use]
    pub fn get(path: impl Into<String>) -> Self {
        Self::new(Method::Get, path)
    }

    /// Create a `POST` descriptor for a logical resource path.
    #[must_use]
    pub fn post(path: impl Into<String>) -> Self {
        Self::new(Method::Post, path)
    }

    fn new(method: Method, path: impl Into<String>) -> Self {
        Self {
            method,
            path: path.into(),
            params: Vec::new(),
            body: None,
            attempt: 0,
        }
    }

    /// Append a query parameter.
    #[must_use]
    pub fn param(mut self, key: impl Into<String>, value: impl ToString) -> Self {
        self.params.push((key.into(), value.to_string()));
        self
    }

    /// Attach a JSON body. It is sent exactly as given.
    #[must_use]
    pub fn json(mut self, body: Value) -> Self {
        self.body = Some(body);
        self
    }

    /// Copy of this descriptor for the given attempt number.
    #[must_use]
    pub fn with_attempt(&self, attempt: usize) -> Self {
        Self {
            attempt,
            ..self.clone()
        }
    }

    /// HTTP method.
    #[must_use]
    pub const fn method(&self) -> Method {
        self.method
    }

    /// Logical resource path (relative to the session's base endpoint).
    #[must_use]
    pub fn path(&self) -> &str {
        &self.path
    }

    /// Query parameters in insertion order.
    #[must_use]
    pub fn params(&self) -> &[(String, String)] {
        &self.params
    }

    /// JSON body, if any.
    #[must_use]
    pub const fn body(&self) -> Option<&Value> {
        self.body.as_ref()
    }

    /// Zero-based attempt number.
    #[must_use]
    pub const fn attempt(&self) -> usize {
        self.attempt
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_descriptor_starts_at_attempt_zero() {
        let descriptor = RequestDescriptor::get("/schedule/slots");
        assert_eq!(descriptor.attempt(), 0);
        assert_eq!(descriptor.method(), Method::Get);
        assert!(descriptor.body().is_none());
    }

    #[test]
    fn test_with_attempt_leaves_original_untouched() {
        let original = RequestDescriptor::get("/lineup/artists/top").param("limit", 6);
        let retried = original.with_attempt(2);

        assert_eq!(original.attempt(), 0);
        assert_eq!(retried.attempt(), 2);
        assert_eq!(retried.params(), original.params());
        assert_eq!(retried.path(), "/lineup/artists/top");
    }

    #[test]
    fn test_json_body_preserved() {
        let descriptor = RequestDescriptor::post("/tickets/types/4/reserve")
            .json(json!({ "quantity": 2, "channel": "web", "dry_run": true }));

        assert_eq!(
            descriptor.body(),
            Some(&json!({ "quantity": 2, "channel": "web", "dry_run": true }))
        );
        assert_eq!(descriptor.method().as_str(), "POST");
    }
}
