use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::nullable_string;

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Ship {
    pub id: Uuid,
    #[serde(default, deserialize_with = "nullable_string")]
    pub name: String,
    /// Maximum number of cabins the ship may carry
    #[serde(default)]
    pub capacity: i32,
    #[serde(default, deserialize_with = "nullable_string")]
    pub description: String,
}

impl Ship {
    pub fn has_capacity_for(&self, room_count: usize) -> bool {
        usize::try_from(self.capacity).map_or(false, |cap| room_count <= cap)
    }
}

/// A bookable cabin, owned by exactly one ship.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Room {
    pub id: Uuid,
    pub ship_id: Uuid,
    /// Display label; not unique across ships
    #[serde(rename = "name", default, deserialize_with = "nullable_string")]
    pub room_number: String,
    #[serde(rename = "type", default, deserialize_with = "nullable_string")]
    pub room_type: String,
    /// Nominal rate, informational only
    #[serde(default)]
    pub price: Decimal,
    /// Admin flag, independent of bookings
    #[serde(rename = "is_available", default)]
    pub available: bool,
}

/// Template for repeated sailings.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Tour {
    pub id: Uuid,
    #[serde(default, deserialize_with = "nullable_string")]
    pub name: String,
    #[serde(rename = "from", default, deserialize_with = "nullable_string")]
    pub origin: String,
    #[serde(rename = "to", default, deserialize_with = "nullable_string")]
    pub destination: String,
    #[serde(default, deserialize_with = "nullable_string")]
    pub description: String,
}

/// One concrete voyage of a tour on a ship (stored in `tour_instances`).
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Sailing {
    pub id: Uuid,
    pub tour_id: Uuid,
    pub ship_id: Uuid,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
}

impl Sailing {
    pub fn is_well_formed(&self) -> bool {
        self.start_date <= self.end_date
    }

    pub fn is_upcoming(&self, today: NaiveDate) -> bool {
        self.start_date > today
    }

    pub fn is_current(&self, today: NaiveDate) -> bool {
        self.start_date <= today && today <= self.end_date
    }
}
