pub mod availability;
pub mod catalog;
pub mod lifecycle;
pub mod reconciler;
pub mod roster;
pub mod validation;

pub use availability::{Availability, RoomAvailabilityResolver};
pub use catalog::{FleetSummary, SailingCatalog, SailingView};
pub use lifecycle::{BookingEdit, BookingLifecycleStore, BookingView};
pub use reconciler::{BookingReconciler, BookingRequest, GuestDetails, PaymentDetails, Reservation};
pub use roster::CustomerEntry;

use uuid::Uuid;
use voyage_core::StoreError;

#[derive(Debug, thiserror::Error)]
pub enum BookingError {
    #[error("Validation failed: {0}")]
    Validation(String),

    #[error("Room {room_label} is already booked for this sailing")]
    RoomAlreadyBooked { room_id: Uuid, room_label: String },

    #[error("Could not load records: {0}")]
    AvailabilityFetch(#[source] StoreError),

    #[error("Could not persist booking: {0}")]
    Persistence(#[source] StoreError),

    #[error("Not found: {0}")]
    NotFound(String),
}

pub type BookingResult<T> = Result<T, BookingError>;
