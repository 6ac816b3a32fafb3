//! Transport session: base endpoint, credential attachment and the HTTP
//! transport.
//!
//! A transport sends exactly one request per call. It does not retry, cache or
//! classify; every response that arrives, whatever its status, is handed back
//! as a [`RawResponse`]. Only a call that received no response at all yields a
//! [`TransportError`].

use crate::error::ClientError;
use festival_core::{Method, RequestDescriptor};
use festival_runtime::metrics::HttpMetrics;
use reqwest::{Client, Url};
use serde::de::DeserializeOwned;
use std::fmt;
use std::future::Future;
use std::sync::Arc;
use std::time::{Duration, Instant};
use thiserror::Error;

/// No response was received for a request.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[error("{0}")]
pub struct TransportError(pub String);

/// A response as received, before classification.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawResponse {
    /// HTTP status code
    pub status: u16,
    /// Response body
    pub body: Vec<u8>,
}

impl RawResponse {
    /// Create a response.
    #[must_use]
    pub fn new(status: u16, body: impl Into<Vec<u8>>) -> Self {
        Self {
            status,
            body: body.into(),
        }
    }

    /// Decode the body as JSON.
    ///
    /// # Errors
    ///
    /// Returns [`ClientError::MalformedPayload`] if the body does not match `T`.
    pub fn json<T: DeserializeOwned>(&self) -> Result<T, ClientError> {
        serde_json::from_slice(&self.body).map_err(|e| ClientError::MalformedPayload(e.to_string()))
    }
}

/// Sends one request and reports what came back.
pub trait Transport: Send + Sync {
    /// Execute `request` once.
    fn execute(
        &self,
        request: &RequestDescriptor,
    ) -> impl Future<Output = Result<RawResponse, TransportError>> + Send;
}

impl<T: Transport> Transport for Arc<T> {
    fn execute(
        &self,
        request: &RequestDescriptor,
    ) -> impl Future<Output = Result<RawResponse, TransportError>> + Send {
        (**self).execute(request)
    }
}

/// Opaque bearer credential.
///
/// Produced elsewhere (login flow); this layer only attaches it.
#[derive(Clone, PartialEq, Eq)]
pub struct Credential(String);

impl Credential {
    /// Wrap a token.
    #[must_use]
    pub fn new(token: impl Into<String>) -> Self {
        Self(token.into())
    }

    /// The raw token.
    #[must_use]
    pub fn expose(&self) -> &str {
        &self.0
    }
}

impl fmt::Debug for Credential {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("Credential(***)")
    }
}

/// Base endpoint plus the credential attached to every call.
///
/// Rotating the credential means building a new session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Session {
    base_url: String,
    credential: Option<Credential>,
}

impl Session {
    /// Create a session for `base_url`.
    ///
    /// # Errors
    ///
    /// Returns [`ClientError::InvalidBaseUrl`] if `base_url` does not parse as
    /// an absolute URL.
    pub fn new(base_url: impl Into<String>, credential: Option<Credential>) -> Result<Self, ClientError> {
        let base_url = base_url.into();
        Url::parse(&base_url).map_err(|e| ClientError::InvalidBaseUrl(format!("{base_url}: {e}")))?;
        Ok(Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            credential,
        })
    }

    /// Same endpoint, different credential.
    #[must_use]
    pub fn with_credential(&self, credential: Option<Credential>) -> Self {
        Self {
            base_url: self.base_url.clone(),
            credential,
        }
    }

    /// Base endpoint without a trailing slash.
    #[must_use]
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Credential, if one is configured.
    #[must_use]
    pub const fn credential(&self) -> Option<&Credential> {
        self.credential.as_ref()
    }

    /// Absolute URL for a logical resource path.
    #[must_use]
    pub fn resolve(&self, path: &str) -> String {
        format!("{}/{}", self.base_url, path.trim_start_matches('/'))
    }
}

/// HTTP transport over `reqwest`.
#[derive(Clone)]
pub struct HttpTransport {
    client: Client,
    session: Session,
}

impl HttpTransport {
    /// Create a transport with the given request timeout.
    ///
    /// # Errors
    ///
    /// Returns [`ClientError::Setup`] if the HTTP client cannot be built.
    pub fn new(session: Session, timeout: Duration) -> Result<Self, ClientError> {
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| ClientError::Setup(e.to_string()))?;

        Ok(Self { client, session })
    }

    /// Same HTTP client, different session.
    #[must_use]
    pub fn with_session(&self, session: Session) -> Self {
        Self {
            client: self.client.clone(),
            session,
        }
    }

    /// The session this transport attaches to requests.
    #[must_use]
    pub const fn session(&self) -> &Session {
        &self.session
    }
}

impl Transport for HttpTransport {
    async fn execute(&self, request: &RequestDescriptor) -> Result<RawResponse, TransportError> {
        let method = match request.method() {
            Method::Get => reqwest::Method::GET,
            Method::Post => reqwest::Method::POST,
        };

        let mut builder = self
            .client
            .request(method, self.session.resolve(request.path()));

        if !request.params().is_empty() {
            builder = builder.query(request.params());
        }
        if let Some(body) = request.body() {
            builder = builder.json(body);
        }
        if let Some(credential) = self.session.credential() {
            builder = builder.bearer_auth(credential.expose());
        }

        let started = Instant::now();
        let response = builder.send().await.map_err(|e| {
            HttpMetrics::record_no_response(request.method().as_str());
            TransportError(e.to_string())
        })?;

        let status = response.status().as_u16();
        let body = response.bytes().await.map_err(|e| {
            HttpMetrics::record_no_response(request.method().as_str());
            TransportError(e.to_string())
        })?;

        HttpMetrics::record_response(request.method().as_str(), status, started.elapsed());

        Ok(RawResponse {
            status,
            body: body.to_vec(),
        })
    }
}
