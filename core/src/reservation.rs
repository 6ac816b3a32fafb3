//! Reservation request and result records.
//!
//! A reservation is issued either as a *dry run* (preview: reports what a
//! commit would currently yield, never touches quota) or as a *commit*
//! (decrements remote quota, possibly granting fewer units than requested).
//!
//! The remote service is the only authority on quota. [`ReservationResult`]
//! values are carried verbatim; the only local check is that the service did
//! not grant more than was asked for.

use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

/// Errors raised while building or validating reservation records.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ReservationError {
    /// Quantity must be at least one unit.
    #[error("Reservation quantity must be greater than zero")]
    ZeroQuantity,

    /// The remote service reported more units than were requested.
    #[error("Remote service granted {reserved} units but only {requested} were requested")]
    OverGranted {
        /// Units reported as reserved
        reserved: u32,
        /// Units requested
        requested: u32,
    },

    /// A committed reply did not say how many units were granted.
    #[error("Remote service reply is missing the reserved unit count")]
    MissingGrant,
}

/// Identifier of a ticket type.
#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[serde(transparent)]
pub struct TicketTypeId(pub u64);

impl TicketTypeId {
    /// Create a new identifier.
    #[must_use]
    pub const fn new(id: u64) -> Self {
        Self(id)
    }

    /// Raw identifier.
    #[must_use]
    pub const fn get(self) -> u64 {
        self.0
    }
}

impl fmt::Display for TicketTypeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<u64> for TicketTypeId {
    fn from(id: u64) -> Self {
        Self(id)
    }
}

/// One reservation attempt. Immutable once built.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ReservationRequest {
    ticket_type_id: TicketTypeId,
    quantity: u32,
    channel: String,
    dry_run: bool,
}

/// Wire body of the reserve endpoint.
#[derive(Debug, Serialize)]
struct ReserveBody<'a> {
    quantity: u32,
    channel: &'a str,
    dry_run: bool,
}

impl ReservationRequest {
    /// Build a reservation request.
    ///
    /// # Errors
    ///
    /// Returns [`ReservationError::ZeroQuantity`] if `quantity` is zero.
    pub fn new(
        ticket_type_id: TicketTypeId,
        quantity: u32,
        channel: impl Into<String>,
        dry_run: bool,
    ) -> Result<Self, ReservationError> {
        if quantity == 0 {
            return Err(ReservationError::ZeroQuantity);
        }
        Ok(Self {
            ticket_type_id,
            quantity,
            channel: channel.into(),
            dry_run,
        })
    }

    /// Build a dry-run (preview) request.
    ///
    /// # Errors
    ///
    /// Returns [`ReservationError::ZeroQuantity`] if `quantity` is zero.
    pub fn preview(
        ticket_type_id: TicketTypeId,
        quantity: u32,
        channel: impl Into<String>,
    ) -> Result<Self, ReservationError> {
        Self::new(ticket_type_id, quantity, channel, true)
    }

    /// Build a committing request.
    ///
    /// # Errors
    ///
    /// Returns [`ReservationError::ZeroQuantity`] if `quantity` is zero.
    pub fn commit(
        ticket_type_id: TicketTypeId,
        quantity: u32,
        channel: impl Into<String>,
    ) -> Result<Self, ReservationError> {
        Self::new(ticket_type_id, quantity, channel, false)
    }

    /// Ticket type being reserved.
    #[must_use]
    pub const fn ticket_type_id(&self) -> TicketTypeId {
        self.ticket_type_id
    }

    /// Requested units (always > 0).
    #[must_use]
    pub const fn quantity(&self) -> u32 {
        self.quantity
    }

    /// Sales channel tag.
    #[must_use]
    pub fn channel(&self) -> &str {
        &self.channel
    }

    /// Whether this is a dry run.
    #[must_use]
    pub const fn dry_run(&self) -> bool {
        self.dry_run
    }

    /// Logical path of the reserve endpoint for this ticket type.
    #[must_use]
    pub fn path(&self) -> String {
        format!("/tickets/types/{}/reserve", self.ticket_type_id)
    }

    /// JSON body sent to the reserve endpoint.
    #[must_use]
    pub fn body(&self) -> serde_json::Value {
        serde_json::json!(ReserveBody {
            quantity: self.quantity,
            channel: &self.channel,
            dry_run: self.dry_run,
        })
    }
}

/// Outcome reported by the remote service for one reservation call.
#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct ReservationResult {
    /// Units actually granted (`0 ..= requested`)
    pub reserved: u32,
    /// Remaining quota after this call
    #[serde(alias = "quota_remaining", alias = "remaining_if_ok")]
    pub available: u32,
    /// Dry-run echo, when the service includes it
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub dry_run: Option<bool>,
}

impl ReservationResult {
    /// Check the result against the request that produced it.
    ///
    /// # Errors
    ///
    /// Returns [`ReservationError::OverGranted`] if the service reported more
    /// units than were requested.
    pub fn validate_for(self, request: &ReservationRequest) -> Result<Self, ReservationError> {
        if self.reserved > request.quantity {
            return Err(ReservationError::OverGranted {
                reserved: self.reserved,
                requested: request.quantity,
            });
        }
        Ok(self)
    }

    /// Units requested but not granted.
    #[must_use]
    pub const fn shortfall(&self, requested: u32) -> u32 {
        requested.saturating_sub(self.reserved)
    }

    /// Whether fewer units were granted than requested.
    #[must_use]
    pub const fn is_partial(&self, requested: u32) -> bool {
        self.reserved < requested
    }
}

/// Reply body of the reserve endpoint as sent on the wire.
///
/// Commits report `reserved` and `quota_remaining`. Dry runs only answer
/// successfully when the whole quantity fits, so they omit `reserved` and
/// report `remaining_if_ok` instead.
#[derive(Clone, Copy, Debug, Deserialize, PartialEq, Eq)]
pub struct ReserveReply {
    /// Units granted, absent on dry runs
    #[serde(default)]
    pub reserved: Option<u32>,
    /// Remaining quota, or what would remain if the dry run were committed
    #[serde(alias = "quota_remaining", alias = "remaining_if_ok")]
    pub available: u32,
    /// Dry-run echo
    #[serde(default)]
    pub dry_run: Option<bool>,
}

impl ReserveReply {
    /// Resolve the reply against the request that produced it.
    ///
    /// A dry-run reply without `reserved` grants the full requested quantity.
    ///
    /// # Errors
    ///
    /// Returns [`ReservationError::MissingGrant`] when a commit reply has no
    /// `reserved` count, or [`ReservationError::OverGranted`] when it exceeds
    /// the request.
    pub fn into_result(self, request: &ReservationRequest) -> Result<ReservationResult, ReservationError> {
        let dry_run = self.dry_run.unwrap_or(request.dry_run);
        let reserved = match self.reserved {
            Some(reserved) => reserved,
            None if dry_run => request.quantity,
            None => return Err(ReservationError::MissingGrant),
        };

        ReservationResult {
            reserved,
            available: self.available,
            dry_run: self.dry_run,
        }
        .validate_for(request)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_zero_quantity_rejected() {
        let result = ReservationRequest::commit(TicketTypeId::new(1), 0, "web");
        assert_eq!(result, Err(ReservationError::ZeroQuantity));
    }

    #[test]
    fn test_request_body_shape() {
        let request = ReservationRequest::preview(TicketTypeId::new(12), 3, "web").unwrap();

        assert_eq!(request.path(), "/tickets/types/12/reserve");
        assert_eq!(
            request.body(),
            json!({ "quantity": 3, "channel": "web", "dry_run": true })
        );
    }

    #[test]
    fn test_result_accepts_quota_remaining_alias() {
        let result: ReservationResult =
            serde_json::from_value(json!({ "reserved": 2, "quota_remaining": 8 })).unwrap();

        assert_eq!(result.reserved, 2);
        assert_eq!(result.available, 8);
        assert_eq!(result.dry_run, None);
    }

    #[test]
    fn test_partial_grant_is_valid() {
        let request = ReservationRequest::commit(TicketTypeId::new(1), 3, "web").unwrap();
        let result = ReservationResult {
            reserved: 2,
            available: 0,
            dry_run: None,
        };

        let validated = result.validate_for(&request).unwrap();
        assert!(validated.is_partial(request.quantity()));
        assert_eq!(validated.shortfall(request.quantity()), 1);
    }

    #[test]
    fn test_over_grant_rejected() {
        let request = ReservationRequest::commit(TicketTypeId::new(1), 2, "web").unwrap();
        let result = ReservationResult {
            reserved: 5,
            available: 0,
            dry_run: Some(false),
        };

        assert_eq!(
            result.validate_for(&request),
            Err(ReservationError::OverGranted {
                reserved: 5,
                requested: 2
            })
        );
    }

    #[test]
    fn test_dry_run_reply_grants_requested_quantity() {
        let request = ReservationRequest::preview(TicketTypeId::new(7), 3, "web").unwrap();
        let reply: ReserveReply =
            serde_json::from_value(json!({ "ok": true, "dry_run": true, "remaining_if_ok": 2 })).unwrap();

        let result = reply.into_result(&request).unwrap();

        assert_eq!(
            result,
            ReservationResult {
                reserved: 3,
                available: 2,
                dry_run: Some(true),
            }
        );
    }

    #[test]
    fn test_commit_reply_reads_backend_fields() {
        let request = ReservationRequest::commit(TicketTypeId::new(7), 2, "web").unwrap();
        let reply: ReserveReply = serde_json::from_value(json!({
            "ok": true,
            "id": 7,
            "reserved": 2,
            "quota_remaining": 18,
            "reserved_by_channel": { "web": 2 }
        }))
        .unwrap();

        let result = reply.into_result(&request).unwrap();

        assert_eq!((result.reserved, result.available, result.dry_run), (2, 18, None));
    }

    #[test]
    fn test_commit_reply_without_grant_rejected() {
        let request = ReservationRequest::commit(TicketTypeId::new(7), 2, "web").unwrap();
        let reply: ReserveReply = serde_json::from_value(json!({ "quota_remaining": 18 })).unwrap();

        assert_eq!(reply.into_result(&request), Err(ReservationError::MissingGrant));
    }
}
