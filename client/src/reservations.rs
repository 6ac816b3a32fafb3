//! Two-phase ticket reservation: preview (dry run) and commit.
//!
//! The remote service is the only authority on quota. The coordinator sends
//! the request, checks that the service did not grant more than was asked,
//! and returns `reserved`/`available` exactly as reported. A grant smaller
//! than the request is a success; interpreting the shortfall is up to the
//! caller.
//!
//! A successful commit invalidates the cached on-sale listing before it
//! returns, so the next read through the cache sees post-commit availability.
//! Previews and failed commits leave the cache alone.

use crate::catalog::keys;
use crate::client::FestivalClient;
use crate::error::ClientError;
use crate::session::{HttpTransport, Transport};
use festival_core::{RequestDescriptor, ReservationRequest, ReservationResult, ReserveReply, TicketTypeId};
use festival_runtime::metrics::ReservationMetrics;

/// Runs previews and commits against the reserve endpoint.
pub struct ReservationCoordinator<T = HttpTransport> {
    client: FestivalClient<T>,
}

impl<T> Clone for ReservationCoordinator<T> {
    fn clone(&self) -> Self {
        Self {
            client: self.client.clone(),
        }
    }
}

impl<T: Transport> ReservationCoordinator<T> {
    /// Coordinator over `client`'s transport, retry policy and cache.
    #[must_use]
    pub const fn new(client: FestivalClient<T>) -> Self {
        Self { client }
    }

    /// Ask what a commit of `quantity` units would currently yield.
    ///
    /// Sent with `dry_run = true` on the client's default channel. Never
    /// changes remote quota and never touches the cache.
    ///
    /// # Errors
    ///
    /// Returns [`ClientError::InvalidQuantity`] for a zero quantity, or the
    /// terminal failure of the call.
    pub async fn preview(
        &self,
        ticket_type_id: TicketTypeId,
        quantity: u32,
    ) -> Result<ReservationResult, ClientError> {
        let request = ReservationRequest::preview(ticket_type_id, quantity, self.client.default_channel())?;
        self.reserve(&request).await
    }

    /// Reserve up to `quantity` units on `channel`.
    ///
    /// On success the on-sale ticket types cache entry is invalidated before
    /// returning.
    ///
    /// # Errors
    ///
    /// Returns [`ClientError::InvalidQuantity`] for a zero quantity, or the
    /// terminal failure of the call. No invalidation happens on failure.
    pub async fn commit(
        &self,
        ticket_type_id: TicketTypeId,
        quantity: u32,
        channel: &str,
    ) -> Result<ReservationResult, ClientError> {
        let request = ReservationRequest::commit(ticket_type_id, quantity, channel)?;
        let result = self.reserve(&request).await?;

        self.client
            .cache()
            .invalidate(&keys::on_sale_ticket_types())
            .await;

        Ok(result)
    }

    /// Send an already built request.
    ///
    /// Commits (`dry_run = false`) invalidate the on-sale listing on success,
    /// exactly like [`ReservationCoordinator::commit`].
    ///
    /// # Errors
    ///
    /// Returns the terminal failure of the call.
    pub async fn submit(&self, request: &ReservationRequest) -> Result<ReservationResult, ClientError> {
        let result = self.reserve(request).await?;
        if !request.dry_run() {
            self.client
                .cache()
                .invalidate(&keys::on_sale_ticket_types())
                .await;
        }
        Ok(result)
    }

    async fn reserve(&self, request: &ReservationRequest) -> Result<ReservationResult, ClientError> {
        let descriptor = RequestDescriptor::post(request.path()).json(request.body());

        let result = self
            .client
            .fetch::<ReserveReply>(&descriptor)
            .await?
            .into_result(request)?;

        let partial = result.is_partial(request.quantity());
        ReservationMetrics::record(request.dry_run(), partial);
        tracing::info!(
            ticket_type_id = %request.ticket_type_id(),
            channel = request.channel(),
            requested = request.quantity(),
            reserved = result.reserved,
            available = result.available,
            dry_run = request.dry_run(),
            partial,
            "Reservation call completed"
        );

        Ok(result)
    }
}
