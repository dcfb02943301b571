use chrono::NaiveDate;
use serde::Serialize;
use std::collections::HashMap;
use std::sync::Arc;
use tracing::warn;
use uuid::Uuid;
use voyage_core::records::decode_lenient;
use voyage_core::{Filter, RecordStore, StoreResult, Table};
use voyage_shared::{Booking, Room, Sailing, Ship, Tour};

use crate::{BookingError, BookingResult};

/// A sailing with its tour and ship names resolved for display.
#[derive(Debug, Clone, Serialize)]
pub struct SailingView {
    #[serde(flatten)]
    pub sailing: Sailing,
    pub tour_name: Option<String>,
    pub origin: Option<String>,
    pub destination: Option<String>,
    pub ship_name: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, PartialEq, Eq)]
pub struct FleetSummary {
    pub ships: usize,
    pub tours: usize,
    pub sailings: usize,
    pub upcoming: usize,
    pub current: usize,
    pub bookings: usize,
    pub active_bookings: usize,
    /// Ships carrying more cabins than their declared capacity
    pub over_capacity_ships: usize,
}

pub struct SailingCatalog {
    store: Arc<dyn RecordStore>,
}

impl SailingCatalog {
    pub fn new(store: Arc<dyn RecordStore>) -> Self {
        Self { store }
    }

    pub async fn list_sailings(&self) -> BookingResult<Vec<SailingView>> {
        self.list_sailings_between(None, None).await
    }

    /// Sailings departing within `[from, until]`; either bound may be open.
    pub async fn list_sailings_between(
        &self,
        from: Option<NaiveDate>,
        until: Option<NaiveDate>,
    ) -> BookingResult<Vec<SailingView>> {
        let mut window = Filter::new();
        if let Some(from) = from {
            window = window.gte("start_date", from);
        }
        if let Some(until) = until {
            window = window.lte("start_date", until);
        }

        let (sailings, tours, ships) = tokio::try_join!(
            self.fetch_sailings(&window),
            self.store.fetch_all(Table::Tours),
            self.store.fetch_all(Table::Ships),
        )
        .map_err(BookingError::AvailabilityFetch)?;

        let tours: HashMap<Uuid, Tour> = decode_lenient::<Tour>(Table::Tours, tours)
            .into_iter()
            .map(|t| (t.id, t))
            .collect();
        let ships: HashMap<Uuid, Ship> = decode_lenient::<Ship>(Table::Ships, ships)
            .into_iter()
            .map(|s| (s.id, s))
            .collect();

        let mut views: Vec<SailingView> = well_formed(decode_lenient(Table::TourInstances, sailings))
            .into_iter()
            .map(|sailing| {
                let tour = tours.get(&sailing.tour_id);
                let ship = ships.get(&sailing.ship_id);
                SailingView {
                    tour_name: tour.map(|t| t.name.clone()),
                    origin: tour.map(|t| t.origin.clone()),
                    destination: tour.map(|t| t.destination.clone()),
                    ship_name: ship.map(|s| s.name.clone()),
                    sailing,
                }
            })
            .collect();

        views.sort_by_key(|v| v.sailing.start_date);
        Ok(views)
    }

    pub async fn summary(&self, today: NaiveDate) -> BookingResult<FleetSummary> {
        let (ships, tours, sailings, bookings, rooms) = tokio::try_join!(
            self.store.fetch_all(Table::Ships),
            self.store.fetch_all(Table::Tours),
            self.store.fetch_all(Table::TourInstances),
            self.store.fetch_all(Table::Bookings),
            self.store.fetch_all(Table::Rooms),
        )
        .map_err(BookingError::AvailabilityFetch)?;

        let ships = decode_lenient::<Ship>(Table::Ships, ships);
        let sailings = well_formed(decode_lenient(Table::TourInstances, sailings));
        let bookings = decode_lenient::<Booking>(Table::Bookings, bookings);

        let mut cabins_per_ship: HashMap<Uuid, usize> = HashMap::new();
        for room in decode_lenient::<Room>(Table::Rooms, rooms) {
            *cabins_per_ship.entry(room.ship_id).or_default() += 1;
        }

        let over_capacity_ships = ships
            .iter()
            .filter(|s| {
                let cabins = cabins_per_ship.get(&s.id).copied().unwrap_or(0);
                let over = !s.has_capacity_for(cabins);
                if over {
                    warn!("Ship {} carries {} cabins but has capacity {}", s.name, cabins, s.capacity);
                }
                over
            })
            .count();

        Ok(FleetSummary {
            ships: ships.len(),
            tours: tours.len(),
            sailings: sailings.len(),
            upcoming: sailings.iter().filter(|s| s.is_upcoming(today)).count(),
            current: sailings.iter().filter(|s| s.is_current(today)).count(),
            bookings: bookings.len(),
            active_bookings: bookings.iter().filter(|b| b.is_active()).count(),
            over_capacity_ships,
        })
    }
}

impl SailingCatalog {
    async fn fetch_sailings(&self, window: &Filter) -> StoreResult<Vec<serde_json::Value>> {
        if window.is_empty() {
            self.store.fetch_all(Table::TourInstances).await
        } else {
            self.store.fetch_where(Table::TourInstances, window).await
        }
    }
}

fn well_formed(sailings: Vec<Sailing>) -> Vec<Sailing> {
    sailings
        .into_iter()
        .filter(|s| {
            if s.is_well_formed() {
                true
            } else {
                warn!("Skipping sailing {} that ends before it starts", s.id);
                false
            }
        })
        .collect()
}
