//! Festival platform client

use crate::config::ClientConfig;
use crate::error::ClientError;
use crate::reservations::ReservationCoordinator;
use crate::session::{Credential, HttpTransport, RawResponse, Session, Transport};
use festival_core::{CallOutcome, FailureKind, RequestDescriptor};
use festival_runtime::{QueryCache, QueryKey, RetryPolicy, retry_classified};
use serde::de::DeserializeOwned;
use std::sync::Arc;

/// Channel tag used for previews when none is configured.
pub const DEFAULT_CHANNEL: &str = "web";

/// Festival platform client.
///
/// Cheap to clone: clones share the transport, retry policy and query cache,
/// so concurrent tasks see one cache.
pub struct FestivalClient<T = HttpTransport> {
    inner: Arc<Inner<T>>,
}

struct Inner<T> {
    transport: T,
    policy: RetryPolicy,
    cache: Arc<QueryCache>,
    default_channel: String,
}

impl<T> Clone for FestivalClient<T> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl FestivalClient<HttpTransport> {
    /// Create an HTTP client from configuration.
    ///
    /// # Errors
    ///
    /// Returns [`ClientError::InvalidBaseUrl`] for an unusable base endpoint
    /// or [`ClientError::Setup`] if the HTTP client cannot be built.
    pub fn from_config(config: &ClientConfig) -> Result<Self, ClientError> {
        let session = Session::new(
            config.api_base.clone(),
            config.api_token.clone().map(Credential::new),
        )?;
        let transport = HttpTransport::new(session, config.http_timeout)?;

        Ok(Self::builder(transport)
            .policy(config.retry.clone())
            .default_channel(config.reserve_channel.clone())
            .build())
    }

    /// Same client with a different credential.
    ///
    /// The query cache is kept; the transport's session is rebuilt.
    #[must_use]
    pub fn with_credential(&self, credential: Option<Credential>) -> Self {
        let session = self.inner.transport.session().with_credential(credential);
        self.with_transport(self.inner.transport.with_session(session))
    }
}

/// Builder for [`FestivalClient`].
pub struct FestivalClientBuilder<T> {
    transport: T,
    policy: RetryPolicy,
    cache: Option<Arc<QueryCache>>,
    default_channel: String,
}

impl<T: Transport> FestivalClientBuilder<T> {
    /// Set the retry policy.
    #[must_use]
    pub fn policy(mut self, policy: RetryPolicy) -> Self {
        self.policy = policy;
        self
    }

    /// Share an existing query cache instead of creating one.
    #[must_use]
    pub fn cache(mut self, cache: Arc<QueryCache>) -> Self {
        self.cache = Some(cache);
        self
    }

    /// Set the channel tag used by previews.
    #[must_use]
    pub fn default_channel(mut self, channel: impl Into<String>) -> Self {
        self.default_channel = channel.into();
        self
    }

    /// Build the [`FestivalClient`].
    #[must_use]
    pub fn build(self) -> FestivalClient<T> {
        FestivalClient {
            inner: Arc::new(Inner {
                transport: self.transport,
                policy: self.policy,
                cache: self.cache.unwrap_or_default(),
                default_channel: self.default_channel,
            }),
        }
    }
}

impl<T: Transport> FestivalClient<T> {
    /// Create a client builder over `transport`.
    ///
    /// Defaults: [`RetryPolicy::default`], a fresh cache, channel `"web"`.
    #[must_use]
    pub fn builder(transport: T) -> FestivalClientBuilder<T> {
        FestivalClientBuilder {
            transport,
            policy: RetryPolicy::default(),
            cache: None,
            default_channel: DEFAULT_CHANNEL.to_string(),
        }
    }

    /// Create a client over `transport` with an empty cache.
    #[must_use]
    pub fn new(transport: T, policy: RetryPolicy) -> Self {
        Self::builder(transport).policy(policy).build()
    }

    /// Same policy, channel and cache over another transport.
    #[must_use]
    pub fn with_transport<U: Transport>(&self, transport: U) -> FestivalClient<U> {
        FestivalClient::builder(transport)
            .policy(self.inner.policy.clone())
            .cache(Arc::clone(&self.inner.cache))
            .default_channel(self.inner.default_channel.clone())
            .build()
    }

    /// Shared query cache.
    #[must_use]
    pub fn cache(&self) -> &Arc<QueryCache> {
        &self.inner.cache
    }

    /// Retry policy applied to every call.
    #[must_use]
    pub fn policy(&self) -> &RetryPolicy {
        &self.inner.policy
    }

    /// Channel tag used by previews.
    #[must_use]
    pub fn default_channel(&self) -> &str {
        &self.inner.default_channel
    }

    /// Underlying transport.
    #[must_use]
    pub fn transport(&self) -> &T {
        &self.inner.transport
    }

    /// Reservation coordinator sharing this client's transport and cache.
    #[must_use]
    pub fn reservations(&self) -> ReservationCoordinator<T> {
        ReservationCoordinator::new(self.clone())
    }

    /// Send `descriptor` through the retry policy.
    ///
    /// # Errors
    ///
    /// Returns the classified failure of the last attempt.
    pub async fn send(&self, descriptor: &RequestDescriptor) -> Result<RawResponse, ClientError> {
        retry_classified(&self.inner.policy, descriptor, |request| async move {
            let response = self
                .inner
                .transport
                .execute(&request)
                .await
                .map_err(|e| ClientError::Network(e.0))?;

            match FailureKind::classify(CallOutcome::Status(response.status)) {
                None => Ok(response),
                Some(kind) => Err(ClientError::from_response(kind, response.status, &response.body)),
            }
        })
        .await
    }

    /// Send `descriptor` and decode the JSON response.
    ///
    /// # Errors
    ///
    /// Returns the classified failure of the last attempt, or
    /// [`ClientError::MalformedPayload`] if the body does not decode.
    pub async fn fetch<R: DeserializeOwned>(&self, descriptor: &RequestDescriptor) -> Result<R, ClientError> {
        self.send(descriptor).await?.json()
    }

    /// Read through the query cache.
    ///
    /// # Errors
    ///
    /// Same as [`FestivalClient::fetch`]. Errors are never cached.
    pub async fn cached<R>(&self, key: &QueryKey, descriptor: &RequestDescriptor) -> Result<R, ClientError>
    where
        R: DeserializeOwned + Clone + Send + Sync + 'static,
    {
        let value = self
            .inner
            .cache
            .get_or_fetch(key, || self.fetch::<R>(descriptor))
            .await?;
        Ok(R::clone(&value))
    }
}
