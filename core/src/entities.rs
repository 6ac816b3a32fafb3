//! Read-only records returned by the festival platform.
//!
//! These are plain data: the client never derives state from them. Optional
//! fields are the ones the platform may omit; everything else is required and
//! a payload missing it fails to decode.

use chrono::{NaiveDate, NaiveTime};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// A festival edition (one yearly instance of the event).
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct Edition {
    /// Edition identifier
    pub id: u64,
    /// Display name
    pub name: String,
    /// Calendar year
    pub year: i32,
    /// First festival day
    pub start_date: NaiveDate,
    /// Last festival day
    pub end_date: NaiveDate,
    /// Marketing tagline
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tagline: Option<String>,
    /// Whether this is the currently active edition
    pub is_active: bool,
}

/// A performing artist.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct Artist {
    /// Artist identifier
    pub id: u64,
    /// Stage name
    pub name: String,
    /// Country of origin
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub country: Option<String>,
    /// Short biography
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub bio: Option<String>,
    /// Popularity score used for "top artists" ordering
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub popularity: Option<f64>,
    /// Genre identifiers
    pub genres: Vec<u64>,
    /// External links keyed by platform name
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub links: Option<BTreeMap<String, String>>,
}

/// Booking status of a schedule slot.
#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum SlotStatus {
    /// Pencilled in, not yet confirmed
    Tentative,
    /// Confirmed performance
    Confirmed,
    /// Cancelled performance
    Cancelled,
}

/// A performance slot on a stage.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct Slot {
    /// Slot identifier
    pub id: u64,
    /// Edition identifier
    pub edition: u64,
    /// Stage identifier
    pub stage: u64,
    /// Artist identifier
    pub artist: u64,
    /// Performance day
    pub day: NaiveDate,
    /// Start time (local to the venue)
    pub start_time: NaiveTime,
    /// End time (local to the venue)
    pub end_time: NaiveTime,
    /// Booking status
    pub status: SlotStatus,
    /// Whether the slot is a headline act
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub is_headliner: Option<bool>,
}

/// Pricing phase of a ticket type.
#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum SalePhase {
    /// Early-bird pricing
    Early,
    /// Regular pricing
    Regular,
    /// Late pricing
    Late,
}

/// A purchasable ticket type.
///
/// `quota` is informational only. The remote service is the sole authority on
/// remaining units; use the reservation coordinator to ask it.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct TicketType {
    /// Ticket type identifier
    pub id: u64,
    /// Edition identifier
    pub edition: u64,
    /// Short code (e.g. `PASS-3D`)
    pub code: String,
    /// Display name
    pub name: String,
    /// Long description
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    /// Gross price; decimal fields arrive as strings (`"45.00"`) or numbers
    #[serde(deserialize_with = "decimal")]
    pub price: f64,
    /// ISO currency code
    pub currency: String,
    /// Total quota, when published
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub quota: Option<u32>,
    /// Pricing phase
    pub phase: SalePhase,
    /// Whether the ticket type is enabled
    pub is_active: bool,
    /// Day the ticket is valid for (day passes only)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub day: Option<NaiveDate>,
}

/// Accept a decimal serialized either as a JSON number or as a numeric string.
fn decimal<'de, D>(deserializer: D) -> Result<f64, D::Error>
where
    D: serde::Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Decimal {
        Number(f64),
        Text(String),
    }

    match Decimal::deserialize(deserializer)? {
        Decimal::Number(value) => Ok(value),
        Decimal::Text(text) => text
            .trim()
            .parse()
            .map_err(|_| serde::de::Error::custom(format!("invalid decimal: {text:?}"))),
    }
}
