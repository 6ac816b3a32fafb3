//! In-memory stand-in for the remote ticket quota authority.
//!
//! Serves two endpoints:
//!
//! - `GET /tickets/types/on-sale`: active ticket types, with `quota` set to
//!   the units still remaining
//! - `POST /tickets/types/{id}/reserve`: grants `min(quantity, remaining)`.
//!   A dry run reports the same grant without touching quota.
//!
//! `available` is always the remaining quota after the call (projected, for a
//! dry run). Any other path answers 404.

#![allow(clippy::unwrap_used)] // Test infrastructure uses unwrap for simplicity
#![allow(clippy::missing_panics_doc)] // Panics only on poisoned locks

use crate::fixtures;
use festival_client::{RawResponse, Transport, TransportError};
use festival_core::{Method, RequestDescriptor, TicketType, TicketTypeId};
use serde::Deserialize;
use serde_json::json;
use std::collections::{BTreeMap, VecDeque};
use std::sync::Mutex;

const ON_SALE_PATH: &str = "/tickets/types/on-sale";

#[derive(Debug)]
struct Stock {
    ticket_type: TicketType,
    remaining: u32,
}

#[derive(Debug, Default)]
struct State {
    stock: BTreeMap<TicketTypeId, Stock>,
    injected: VecDeque<u16>,
    on_sale_fetches: usize,
    reserve_calls: usize,
    commits: usize,
}

#[derive(Deserialize)]
struct ReserveBody {
    quantity: u32,
    #[serde(default)]
    dry_run: bool,
}

/// In-memory remote quota authority.
///
/// # Example
///
/// ```
/// use festival_core::TicketTypeId;
/// use festival_testing::QuotaAuthority;
///
/// let authority = QuotaAuthority::new().with_quota(TicketTypeId::new(7), 5);
/// assert_eq!(authority.remaining(TicketTypeId::new(7)), Some(5));
/// ```
#[derive(Debug, Default)]
pub struct QuotaAuthority {
    state: Mutex<State>,
}

impl QuotaAuthority {
    /// Create an authority with no ticket types.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a fixture ticket type holding `quota` units.
    #[must_use]
    pub fn with_quota(self, id: TicketTypeId, quota: u32) -> Self {
        self.with_ticket_type(fixtures::ticket_type(id.get(), quota))
    }

    /// Add a ticket type. Its `quota` (or zero) is the starting stock.
    #[must_use]
    pub fn with_ticket_type(self, ticket_type: TicketType) -> Self {
        let id = TicketTypeId::new(ticket_type.id);
        let remaining = ticket_type.quota.unwrap_or(0);
        self.state.lock().unwrap().stock.insert(
            id,
            Stock {
                ticket_type,
                remaining,
            },
        );
        self
    }

    /// Answer the next call, whatever its path, with `status`.
    pub fn fail_next(&self, status: u16) {
        self.state.lock().unwrap().injected.push_back(status);
    }

    /// Units still held for `id`.
    #[must_use]
    pub fn remaining(&self, id: TicketTypeId) -> Option<u32> {
        self.state.lock().unwrap().stock.get(&id).map(|s| s.remaining)
    }

    /// Number of on-sale listings served (successful or not).
    #[must_use]
    pub fn on_sale_fetches(&self) -> usize {
        self.state.lock().unwrap().on_sale_fetches
    }

    /// Number of reserve calls received, dry runs included.
    #[must_use]
    pub fn reserve_calls(&self) -> usize {
        self.state.lock().unwrap().reserve_calls
    }

    /// Number of committing reserve calls that changed stock.
    #[must_use]
    pub fn commits(&self) -> usize {
        self.state.lock().unwrap().commits
    }

    fn handle(&self, request: &RequestDescriptor) -> RawResponse {
        let mut guard = self.state.lock().unwrap();
        let state = &mut *guard;
        let path = request.path();

        if path == ON_SALE_PATH && request.method() == Method::Get {
            state.on_sale_fetches += 1;
        }
        let reserve_id = reserve_target(path).filter(|_| request.method() == Method::Post);
        if reserve_id.is_some() {
            state.reserve_calls += 1;
        }

        if let Some(status) = state.injected.pop_front() {
            return detail(status, "Injected failure");
        }

        if path == ON_SALE_PATH && request.method() == Method::Get {
            let listing: Vec<TicketType> = state
                .stock
                .values()
                .filter(|s| s.ticket_type.is_active)
                .map(|s| TicketType {
                    quota: Some(s.remaining),
                    ..s.ticket_type.clone()
                })
                .collect();
            return RawResponse::new(200, serde_json::to_vec(&listing).unwrap());
        }

        let Some(id) = reserve_id else {
            return detail(404, "Not found.");
        };
        let Some(body) = request
            .body()
            .and_then(|b| serde_json::from_value::<ReserveBody>(b.clone()).ok())
        else {
            return detail(400, "Invalid body");
        };
        if body.quantity == 0 {
            return detail(400, "quantity must be >= 1");
        }
        let Some(stock) = state.stock.get_mut(&id) else {
            return detail(404, "Not found.");
        };

        let reserved = body.quantity.min(stock.remaining);
        let available = stock.remaining - reserved;
        if !body.dry_run {
            stock.remaining = available;
            state.commits += 1;
        }

        let payload = json!({
            "reserved": reserved,
            "available": available,
            "dry_run": body.dry_run,
        });
        RawResponse::new(200, serde_json::to_vec(&payload).unwrap())
    }
}

impl Transport for QuotaAuthority {
    async fn execute(&self, request: &RequestDescriptor) -> Result<RawResponse, TransportError> {
        Ok(self.handle(request))
    }
}

fn reserve_target(path: &str) -> Option<TicketTypeId> {
    path.strip_prefix("/tickets/types/")?
        .strip_suffix("/reserve")?
        .parse()
        .ok()
        .map(TicketTypeId::new)
}

fn detail(status: u16, message: &str) -> RawResponse {
    RawResponse::new(status, json!({ "detail": message }).to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use festival_core::{ReservationRequest, ReservationResult};

    fn reserve(id: u64, quantity: u32, dry_run: bool) -> RequestDescriptor {
        let request = ReservationRequest::new(TicketTypeId::new(id), quantity, "web", dry_run).unwrap();
        RequestDescriptor::post(request.path()).json(request.body())
    }

    async fn result(authority: &QuotaAuthority, request: &RequestDescriptor) -> ReservationResult {
        authority.execute(request).await.unwrap().json().unwrap()
    }

    #[tokio::test]
    async fn test_commit_grants_up_to_remaining() {
        let authority = QuotaAuthority::new().with_quota(TicketTypeId::new(7), 5);

        let first = result(&authority, &reserve(7, 3, false)).await;
        assert_eq!((first.reserved, first.available), (3, 2));

        let second = result(&authority, &reserve(7, 3, false)).await;
        assert_eq!((second.reserved, second.available), (2, 0));

        assert_eq!(authority.remaining(TicketTypeId::new(7)), Some(0));
        assert_eq!(authority.commits(), 2);
    }

    #[tokio::test]
    async fn test_dry_run_leaves_stock_alone() {
        let authority = QuotaAuthority::new().with_quota(TicketTypeId::new(7), 4);

        let preview = result(&authority, &reserve(7, 3, true)).await;
        assert_eq!((preview.reserved, preview.available), (3, 1));
        assert_eq!(preview.dry_run, Some(true));
        assert_eq!(authority.remaining(TicketTypeId::new(7)), Some(4));
        assert_eq!(authority.commits(), 0);
    }

    #[tokio::test]
    async fn test_listing_reflects_remaining_quota() {
        let authority = QuotaAuthority::new().with_quota(TicketTypeId::new(7), 5);
        result(&authority, &reserve(7, 2, false)).await;

        let response = authority
            .execute(&RequestDescriptor::get(ON_SALE_PATH))
            .await
            .unwrap();
        let listing: Vec<TicketType> = response.json().unwrap();

        assert_eq!(listing.len(), 1);
        assert_eq!(listing[0].quota, Some(3));
        assert_eq!(authority.on_sale_fetches(), 1);
    }

    #[tokio::test]
    async fn test_injected_failure_and_unknown_paths() {
        let authority = QuotaAuthority::new().with_quota(TicketTypeId::new(7), 5);
        authority.fail_next(503);

        let failed = authority.execute(&reserve(7, 1, false)).await.unwrap();
        assert_eq!(failed.status, 503);
        assert_eq!(authority.remaining(TicketTypeId::new(7)), Some(5));

        let missing = authority.execute(&reserve(99, 1, false)).await.unwrap();
        assert_eq!(missing.status, 404);

        let other = authority
            .execute(&RequestDescriptor::get("/lineup/artists"))
            .await
            .unwrap();
        assert_eq!(other.status, 404);
        assert_eq!(authority.reserve_calls(), 2);
    }
}
