//! Sample records shaped like the platform's payloads.

#![allow(clippy::unwrap_used)] // Hardcoded dates and times always parse

use chrono::{NaiveDate, NaiveTime};
use festival_core::{Artist, Edition, SalePhase, Slot, SlotStatus, TicketType};

fn date(year: i32, month: u32, day: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(year, month, day).unwrap()
}

fn time(hour: u32, minute: u32) -> NaiveTime {
    NaiveTime::from_hms_opt(hour, minute, 0).unwrap()
}

/// Active 2025 edition.
#[must_use]
pub fn edition() -> Edition {
    Edition {
        id: 1,
        name: "Summer Sound 2025".to_string(),
        year: 2025,
        start_date: date(2025, 7, 11),
        end_date: date(2025, 7, 13),
        tagline: Some("Three days, four stages".to_string()),
        is_active: true,
    }
}

/// Artist with the given id and popularity.
#[must_use]
pub fn artist(id: u64, name: &str, popularity: f64) -> Artist {
    Artist {
        id,
        name: name.to_string(),
        country: Some("FR".to_string()),
        bio: None,
        popularity: Some(popularity),
        genres: vec![1],
        links: None,
    }
}

/// A small lineup ordered by descending popularity.
#[must_use]
pub fn lineup() -> Vec<Artist> {
    vec![
        artist(10, "Northern Lights", 92.5),
        artist(11, "Brass Foundry", 81.0),
        artist(12, "Low Tide", 64.0),
    ]
}

/// Confirmed slot for `artist` on the first festival day.
#[must_use]
pub fn slot(id: u64, artist: u64) -> Slot {
    Slot {
        id,
        edition: 1,
        stage: 1,
        artist,
        day: date(2025, 7, 11),
        start_time: time(20, 0),
        end_time: time(21, 15),
        status: SlotStatus::Confirmed,
        is_headliner: Some(false),
    }
}

/// Active regular-phase ticket type with the given quota.
#[must_use]
pub fn ticket_type(id: u64, quota: u32) -> TicketType {
    TicketType {
        id,
        edition: 1,
        code: format!("PASS-{id}"),
        name: format!("Festival pass {id}"),
        description: None,
        price: 129.0,
        currency: "EUR".to_string(),
        quota: Some(quota),
        phase: SalePhase::Regular,
        is_active: true,
        day: None,
    }
}
