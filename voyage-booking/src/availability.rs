use serde::Serialize;
use std::collections::HashSet;
use std::sync::Arc;
use tracing::debug;
use uuid::Uuid;
use voyage_core::records::{fetch_by_id, fetch_typed};
use voyage_core::{Filter, RecordStore, StoreResult, Table};
use voyage_shared::{Booking, Room, Sailing};

use crate::{BookingError, BookingResult};

/// Cabins of a sailing's ship that staff may offer, and which of them are
/// currently held by an active booking. Locked cabins stay in `eligible_rooms`
/// so callers can show them disabled.
#[derive(Debug, Clone, Default, Serialize)]
pub struct Availability {
    pub eligible_rooms: Vec<Room>,
    pub locked_room_ids: HashSet<Uuid>,
}

impl Availability {
    pub fn is_locked(&self, room_id: &Uuid) -> bool {
        self.locked_room_ids.contains(room_id)
    }

    pub fn room(&self, room_id: &Uuid) -> Option<&Room> {
        self.eligible_rooms.iter().find(|r| r.id == *room_id)
    }

    pub fn open_rooms(&self) -> impl Iterator<Item = &Room> {
        self.eligible_rooms.iter().filter(|r| !self.is_locked(&r.id))
    }
}

/// Room ids held by bookings that are not cancelled.
pub fn lock_set(bookings: &[Booking]) -> HashSet<Uuid> {
    bookings
        .iter()
        .filter(|b| b.is_active())
        .map(|b| b.room_id)
        .collect()
}

#[derive(Clone)]
pub struct RoomAvailabilityResolver {
    store: Arc<dyn RecordStore>,
    ship_scoped: bool,
}

impl RoomAvailabilityResolver {
    pub fn new(store: Arc<dyn RecordStore>) -> Self {
        Self {
            store,
            ship_scoped: false,
        }
    }

    /// Offer only cabins of the sailing's own ship. Off by default: every
    /// cabin flagged available is eligible.
    pub fn with_ship_scope(mut self, ship_scoped: bool) -> Self {
        self.ship_scoped = ship_scoped;
        self
    }

    /// Unknown sailings yield empty availability; a stale screen may still
    /// reference a sailing that was removed.
    pub async fn available_rooms(&self, sailing_id: Uuid) -> BookingResult<Availability> {
        match self.find_sailing(sailing_id).await? {
            Some(sailing) => self.availability_for(&sailing).await,
            None => {
                debug!("Sailing {} not found, nothing available", sailing_id);
                Ok(Availability::default())
            }
        }
    }

    pub async fn availability_for(&self, sailing: &Sailing) -> BookingResult<Availability> {
        let mut rooms_filter = Filter::new().eq("is_available", true);
        if self.ship_scoped {
            rooms_filter = rooms_filter.eq("ship_id", sailing.ship_id);
        }

        // Both reads are independent; join them and fail as a whole.
        let (eligible_rooms, bookings) = tokio::try_join!(
            fetch_typed::<Room>(self.store.as_ref(), Table::Rooms, Some(&rooms_filter)),
            self.bookings_for(sailing.id),
        )
        .map_err(BookingError::AvailabilityFetch)?;

        let locked_room_ids = lock_set(&bookings);
        debug!(
            "Sailing {}: {} eligible cabins, {} locked",
            sailing.id,
            eligible_rooms.len(),
            locked_room_ids.len()
        );

        Ok(Availability {
            eligible_rooms,
            locked_room_ids,
        })
    }

    /// Fresh lock computation, used right before a reservation is written.
    pub async fn locked_room_ids(&self, sailing_id: Uuid) -> BookingResult<HashSet<Uuid>> {
        let bookings = self
            .bookings_for(sailing_id)
            .await
            .map_err(BookingError::AvailabilityFetch)?;
        Ok(lock_set(&bookings))
    }

    pub async fn find_sailing(&self, sailing_id: Uuid) -> BookingResult<Option<Sailing>> {
        fetch_by_id(self.store.as_ref(), Table::TourInstances, &sailing_id.to_string())
            .await
            .map_err(BookingError::AvailabilityFetch)
    }

    pub(crate) async fn bookings_for(&self, sailing_id: Uuid) -> StoreResult<Vec<Booking>> {
        let filter = Filter::new().eq("tour_instance_id", sailing_id);
        fetch_typed(self.store.as_ref(), Table::Bookings, Some(&filter)).await
    }
}
