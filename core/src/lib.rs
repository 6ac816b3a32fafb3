//! # Festival Core
//!
//! Domain types shared by every layer of the festival client.
//!
//! This crate has no I/O. It defines:
//!
//! - **Entities**: read-only records returned by the platform (`Edition`,
//!   `Artist`, `Slot`, `TicketType`)
//! - **Requests**: the immutable [`RequestDescriptor`] handed to a transport
//! - **Failures**: the [`FailureKind`] taxonomy and its classifier
//! - **Reservations**: the preview/commit request and result records
//!
//! ## Example
//!
//! ```
//! use festival_core::{CallOutcome, FailureKind};
//!
//! assert_eq!(FailureKind::classify(CallOutcome::Status(503)), Some(FailureKind::Transient));
//! assert_eq!(FailureKind::classify(CallOutcome::Status(403)), Some(FailureKind::Unauthorized));
//! assert_eq!(FailureKind::classify(CallOutcome::Status(200)), None);
//! ```

/// Read-only platform records
pub mod entities;

/// Failure taxonomy and classification
pub mod failure;

/// Request descriptors handed to transports
pub mod request;

/// Reservation request and result records
pub mod reservation;

// Re-export commonly used types
pub use entities::{Artist, Edition, SalePhase, Slot, SlotStatus, TicketType};
pub use failure::{CallOutcome, FailureKind};
pub use request::{Method, RequestDescriptor};
pub use reservation::{ReservationError, ReservationRequest, ReservationResult, ReserveReply, TicketTypeId};
