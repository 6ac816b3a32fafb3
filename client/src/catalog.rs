//! Cached read operations: editions, lineup, schedule and ticket types.
//!
//! Every read goes through the query cache, and on a miss through the retry
//! policy to the transport. Cache keys mirror the resource layout so a whole
//! area can be invalidated by prefix.

use crate::client::FestivalClient;
use crate::error::ClientError;
use crate::session::Transport;
use festival_core::{Artist, Edition, RequestDescriptor, Slot, TicketType};
use festival_runtime::QueryKey;

/// Number of artists returned by [`FestivalClient::top_artists`] by default.
pub const DEFAULT_TOP_ARTISTS: usize = 6;

/// Cache keys for the read operations.
pub mod keys {
    use festival_runtime::QueryKey;

    /// Active edition.
    #[must_use]
    pub fn active_edition() -> QueryKey {
        QueryKey::new(["core", "editions", "active"])
    }

    /// Full artist list.
    #[must_use]
    pub fn artists() -> QueryKey {
        QueryKey::new(["lineup", "artists"])
    }

    /// Top artists, one entry per limit.
    #[must_use]
    pub fn top_artists(limit: usize) -> QueryKey {
        QueryKey::new(["lineup", "artists", "top"]).param("limit", limit)
    }

    /// Schedule slots.
    #[must_use]
    pub fn schedule_slots() -> QueryKey {
        QueryKey::new(["schedule", "slots"])
    }

    /// On-sale ticket types. Invalidated by every successful commit.
    #[must_use]
    pub fn on_sale_ticket_types() -> QueryKey {
        QueryKey::new(["tickets", "on-sale"])
    }
}

impl<T: Transport> FestivalClient<T> {
    /// The active edition, or `None` when no edition is active.
    ///
    /// # Errors
    ///
    /// Returns the terminal failure of the read.
    pub async fn active_edition(&self) -> Result<Option<Edition>, ClientError> {
        let descriptor = RequestDescriptor::get("/core/editions").param("is_active", true);
        let editions: Vec<Edition> = self.cached(&keys::active_edition(), &descriptor).await?;
        Ok(editions.into_iter().next())
    }

    /// All artists.
    ///
    /// # Errors
    ///
    /// Returns the terminal failure of the read.
    pub async fn artists(&self) -> Result<Vec<Artist>, ClientError> {
        self.cached(&keys::artists(), &RequestDescriptor::get("/lineup/artists"))
            .await
    }

    /// At most `limit` top artists.
    ///
    /// # Errors
    ///
    /// Returns the terminal failure of the read.
    pub async fn top_artists(&self, limit: usize) -> Result<Vec<Artist>, ClientError> {
        let descriptor = RequestDescriptor::get("/lineup/artists/top").param("limit", limit);
        self.cached(&keys::top_artists(limit), &descriptor).await
    }

    /// Schedule slots.
    ///
    /// # Errors
    ///
    /// Returns the terminal failure of the read.
    pub async fn schedule_slots(&self) -> Result<Vec<Slot>, ClientError> {
        self.cached(&keys::schedule_slots(), &RequestDescriptor::get("/schedule/slots"))
            .await
    }

    /// Ticket types currently on sale.
    ///
    /// # Errors
    ///
    /// Returns the terminal failure of the read.
    pub async fn on_sale_ticket_types(&self) -> Result<Vec<TicketType>, ClientError> {
        self.cached(
            &keys::on_sale_ticket_types(),
            &RequestDescriptor::get("/tickets/types/on-sale"),
        )
        .await
    }

    /// Drop every cached read under `prefix`.
    pub async fn invalidate(&self, prefix: &QueryKey) -> usize {
        self.cache().invalidate_prefix(prefix).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_keys_nest_under_resource_prefixes() {
        let lineup = keys::artists();

        assert!(keys::top_artists(DEFAULT_TOP_ARTISTS).starts_with(&lineup));
        assert!(!keys::schedule_slots().starts_with(&lineup));
        assert_ne!(keys::top_artists(3), keys::top_artists(6));
        assert_eq!(keys::on_sale_ticket_types().to_string(), "tickets/on-sale");
    }
}
