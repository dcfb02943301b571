use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

use super::nullable_string;
use crate::money;

/// Booking lifecycle. Only two states exist; anything the store returns that is
/// not "CANCELLED" (case-insensitive, including a missing value) is active.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, Default)]
#[serde(from = "Option<String>", into = "String")]
pub enum BookingStatus {
    #[default]
    Pending,
    Cancelled,
}

impl BookingStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            BookingStatus::Pending => "PENDING",
            BookingStatus::Cancelled => "CANCELLED",
        }
    }

    pub fn is_active(&self) -> bool {
        *self != BookingStatus::Cancelled
    }
}

impl From<Option<String>> for BookingStatus {
    fn from(raw: Option<String>) -> Self {
        match raw {
            Some(s) if s.trim().eq_ignore_ascii_case("CANCELLED") => BookingStatus::Cancelled,
            _ => BookingStatus::Pending,
        }
    }
}

impl From<BookingStatus> for String {
    fn from(status: BookingStatus) -> Self {
        status.as_str().to_string()
    }
}

impl fmt::Display for BookingStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// How a reservation that selects several cabins is committed.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "snake_case")]
pub enum MultiRoomPolicy {
    /// Book the first selected cabin; the rest are display text only
    #[default]
    FirstRoomOnly,
    /// One booking per selected cabin, sharing guest and payment data
    BookingPerRoom,
}

/// A cabin reservation for one sailing. This is the stored record; display
/// fields (room number, type) are joined on read and never persisted.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Booking {
    pub id: Uuid,
    pub tour_instance_id: Uuid,
    pub room_id: Uuid,
    #[serde(default, deserialize_with = "nullable_string")]
    pub name: String,
    #[serde(default, deserialize_with = "nullable_string")]
    pub phone: String,
    #[serde(default, deserialize_with = "nullable_string")]
    pub email: String,
    #[serde(default, deserialize_with = "nullable_string")]
    pub payment_method: String,
    #[serde(default, deserialize_with = "nullable_string")]
    pub payment_details: String,
    #[serde(default)]
    pub total_payment: Decimal,
    #[serde(default)]
    pub paid_amount: Decimal,
    #[serde(default)]
    pub due_amount: Decimal,
    #[serde(default)]
    pub discount: Decimal,
    #[serde(default)]
    pub adult_count: i32,
    #[serde(default)]
    pub child_count: i32,
    #[serde(default)]
    pub status: BookingStatus,
}

impl Booking {
    pub fn is_active(&self) -> bool {
        self.status.is_active()
    }

    /// Recompute the due balance from the stored total, discount and paid amounts.
    pub fn refresh_due(&mut self) {
        self.due_amount = money::due_amount(self.total_payment, self.discount, self.paid_amount);
    }

    pub fn payment_status(&self) -> super::PaymentStatus {
        if self.due_amount > Decimal::ZERO {
            super::PaymentStatus::Due
        } else {
            super::PaymentStatus::Paid
        }
    }
}
