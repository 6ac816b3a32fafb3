//! # Festival Platform Client
//!
//! Rust client library for the festival platform API: cached reads of the
//! edition, lineup, schedule and ticket catalog, plus two-phase ticket
//! reservations (preview, then commit).
//!
//! ## Example
//!
//! ```no_run
//! use festival_client::{ClientConfig, FestivalClient, TicketTypeId};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     // Base endpoint and credential from FESTIVAL_* environment variables
//!     let client = FestivalClient::from_config(&ClientConfig::from_env()?)?;
//!
//!     let on_sale = client.on_sale_ticket_types().await?;
//!     println!("{} ticket types on sale", on_sale.len());
//!
//!     let reservations = client.reservations();
//!     let preview = reservations.preview(TicketTypeId::new(12), 2).await?;
//!     if preview.reserved > 0 {
//!         let result = reservations.commit(TicketTypeId::new(12), 2, "web").await?;
//!         println!("Reserved {} ({} left)", result.reserved, result.available);
//!     }
//!     Ok(())
//! }
//! ```
//!
//! ## Features
//!
//! - Bounded exponential backoff for transient and network failures
//! - Shared query cache, invalidated after every successful commit
//! - Partial grants reported as success with the remote `available` count
//! - Pluggable [`Transport`] for tests

pub mod catalog;
pub mod client;
pub mod config;
pub mod error;
pub mod reservations;
pub mod session;

// Re-export main types for convenience
pub use catalog::{DEFAULT_TOP_ARTISTS, keys};
pub use client::{DEFAULT_CHANNEL, FestivalClient, FestivalClientBuilder};
pub use config::{ClientConfig, ConfigError};
pub use error::ClientError;
pub use reservations::ReservationCoordinator;
pub use session::{Credential, HttpTransport, RawResponse, Session, Transport, TransportError};

pub use festival_core::{
    Artist, Edition, FailureKind, ReservationRequest, ReservationResult, SalePhase, Slot, SlotStatus,
    TicketType, TicketTypeId,
};
pub use festival_runtime::{QueryCache, QueryKey, RetryPolicy};
