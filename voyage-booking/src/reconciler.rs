use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{error, info, warn};
use uuid::Uuid;
use voyage_core::records::encode;
use voyage_core::{RecordStore, RoomClaims, StoreError, Table};
use voyage_shared::{money, Booking, BookingStatus, MultiRoomPolicy, Room, Sailing};

use crate::availability::RoomAvailabilityResolver;
use crate::validation::{normalize_guest, normalize_payment};
use crate::{BookingError, BookingResult};

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct GuestDetails {
    pub name: String,
    pub phone: String,
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub adults: i32,
    #[serde(default)]
    pub children: i32,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PaymentDetails {
    #[serde(default)]
    pub method: String,
    #[serde(default)]
    pub details: String,
    #[serde(default)]
    pub total: Decimal,
    #[serde(default)]
    pub paid: Decimal,
    #[serde(default)]
    pub discount: Decimal,
}

#[derive(Debug, Clone, Deserialize)]
pub struct BookingRequest {
    pub sailing_id: Uuid,
    pub room_ids: Vec<Uuid>,
    pub guest: GuestDetails,
    #[serde(default)]
    pub payment: PaymentDetails,
}

/// Result of a committed reservation. `selected_rooms` lists every cabin the
/// guest picked; under `FirstRoomOnly` only the first one is actually booked.
#[derive(Debug, Clone, Serialize)]
pub struct Reservation {
    pub bookings: Vec<Booking>,
    pub selected_rooms: Vec<String>,
}

impl Reservation {
    pub fn primary(&self) -> Option<&Booking> {
        self.bookings.first()
    }
}

pub struct BookingReconciler {
    store: Arc<dyn RecordStore>,
    claims: Arc<dyn RoomClaims>,
    resolver: RoomAvailabilityResolver,
    policy: MultiRoomPolicy,
}

impl BookingReconciler {
    pub fn new(store: Arc<dyn RecordStore>, claims: Arc<dyn RoomClaims>) -> Self {
        Self {
            resolver: RoomAvailabilityResolver::new(store.clone()),
            store,
            claims,
            policy: MultiRoomPolicy::default(),
        }
    }

    pub fn with_policy(mut self, policy: MultiRoomPolicy) -> Self {
        self.policy = policy;
        self
    }

    pub fn with_ship_scope(mut self, ship_scoped: bool) -> Self {
        self.resolver = self.resolver.with_ship_scope(ship_scoped);
        self
    }

    /// Validate a request against current availability and commit it.
    pub async fn reconcile(&self, request: BookingRequest) -> BookingResult<Reservation> {
        // 1. Normalize input
        let guest = normalize_guest(request.guest)?;
        let payment = normalize_payment(request.payment)?;

        let mut room_ids: Vec<Uuid> = Vec::with_capacity(request.room_ids.len());
        for id in request.room_ids {
            if !room_ids.contains(&id) {
                room_ids.push(id);
            }
        }
        if room_ids.is_empty() {
            return Err(BookingError::Validation("Select at least one room".to_string()));
        }

        // 2. Resolve sailing and cabins
        let sailing = self
            .resolver
            .find_sailing(request.sailing_id)
            .await?
            .ok_or_else(|| BookingError::NotFound(format!("sailing {}", request.sailing_id)))?;
        let availability = self.resolver.availability_for(&sailing).await?;

        // Unknown ids and cabins withdrawn by staff cannot be booked at all
        let mut selected: Vec<Room> = Vec::with_capacity(room_ids.len());
        for id in &room_ids {
            let room = availability.room(id).ok_or_else(|| {
                BookingError::Validation(format!("Room {} is not open for booking", id))
            })?;
            selected.push(room.clone());
        }

        let to_book: Vec<Room> = match self.policy {
            MultiRoomPolicy::FirstRoomOnly => selected.iter().take(1).cloned().collect(),
            MultiRoomPolicy::BookingPerRoom => selected.clone(),
        };

        if let Some(room) = to_book.iter().find(|r| availability.is_locked(&r.id)) {
            return Err(already_booked(room));
        }

        // 3. Claim, re-check, write
        let token = Uuid::new_v4();
        let mut claimed: Vec<Uuid> = Vec::with_capacity(to_book.len());
        for room in &to_book {
            match self.claims.acquire(sailing.id, room.id, token).await {
                Ok(true) => claimed.push(room.id),
                Ok(false) => {
                    self.release(sailing.id, &claimed, token).await;
                    return Err(already_booked(room));
                }
                Err(e) => {
                    self.release(sailing.id, &claimed, token).await;
                    return Err(BookingError::AvailabilityFetch(e));
                }
            }
        }

        let result = self.commit(&sailing, &to_book, &guest, &payment).await;
        self.release(sailing.id, &claimed, token).await;

        let bookings = result?;
        info!(
            "Reserved {} cabin(s) on sailing {} for {}",
            bookings.len(),
            sailing.id,
            guest.name
        );

        Ok(Reservation {
            bookings,
            selected_rooms: selected.into_iter().map(|r| r.room_number).collect(),
        })
    }

    async fn commit(
        &self,
        sailing: &Sailing,
        rooms: &[Room],
        guest: &GuestDetails,
        payment: &PaymentDetails,
    ) -> BookingResult<Vec<Booking>> {
        // The screen that produced this request may be stale
        let locked = self.resolver.locked_room_ids(sailing.id).await?;
        if let Some(room) = rooms.iter().find(|r| locked.contains(&r.id)) {
            return Err(already_booked(room));
        }

        let mut committed: Vec<Booking> = Vec::with_capacity(rooms.len());
        for room in rooms {
            let booking = new_booking(sailing.id, room.id, guest, payment);
            let outcome = match encode(Table::Bookings, &booking) {
                Ok(record) => self.store.insert(Table::Bookings, &record).await,
                Err(e) => Err(e),
            };

            match outcome {
                Ok(()) => committed.push(booking),
                Err(e) => {
                    self.compensate(&committed).await;
                    return Err(match e {
                        StoreError::Conflict(_) => already_booked(room),
                        other => {
                            error!("Failed to insert booking for room {}: {}", room.id, other);
                            BookingError::Persistence(other)
                        }
                    });
                }
            }
        }

        Ok(committed)
    }

    /// Undo earlier cabins of a multi-cabin reservation whose later insert failed.
    async fn compensate(&self, committed: &[Booking]) {
        let patch = serde_json::json!({ "status": BookingStatus::Cancelled });
        for booking in committed {
            let id = booking.id.to_string();
            if let Err(e) = self.store.update_by_id(Table::Bookings, &id, &patch).await {
                error!("Could not cancel partial booking {}: {}", id, e);
            } else {
                warn!("Cancelled partial booking {}", id);
            }
        }
    }

    async fn release(&self, sailing_id: Uuid, room_ids: &[Uuid], token: Uuid) {
        for room_id in room_ids {
            if let Err(e) = self.claims.release(sailing_id, *room_id, token).await {
                warn!("Failed to release claim on room {}: {}", room_id, e);
            }
        }
    }
}

fn new_booking(sailing_id: Uuid, room_id: Uuid, guest: &GuestDetails, payment: &PaymentDetails) -> Booking {
    Booking {
        id: Uuid::new_v4(),
        tour_instance_id: sailing_id,
        room_id,
        name: guest.name.clone(),
        phone: guest.phone.clone(),
        email: guest.email.clone(),
        payment_method: payment.method.clone(),
        payment_details: payment.details.clone(),
        total_payment: payment.total,
        paid_amount: payment.paid,
        due_amount: money::due_amount(payment.total, payment.discount, payment.paid),
        discount: payment.discount,
        adult_count: guest.adults,
        child_count: guest.children,
        status: BookingStatus::Pending,
    }
}

fn already_booked(room: &Room) -> BookingError {
    BookingError::RoomAlreadyBooked {
        room_id: room.id,
        room_label: room.room_number.clone(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use voyage_store::{LocalClaims, MemoryRecordStore};

    struct Fixture {
        store: Arc<MemoryRecordStore>,
        sailing: Uuid,
        r1: Uuid,
        r2: Uuid,
    }

    async fn fixture(store: MemoryRecordStore) -> Fixture {
        let store = Arc::new(store);
        let ship = Uuid::new_v4();
        let sailing = Uuid::new_v4();
        let (r1, r2) = (Uuid::new_v4(), Uuid::new_v4());

        store
            .seed(
                Table::TourInstances,
                vec![json!({
                    "id": sailing, "tour_id": Uuid::new_v4(), "ship_id": ship,
                    "start_date": "2026-11-01", "end_date": "2026-11-03"
                })],
            )
            .await;
        store
            .seed(
                Table::Rooms,
                vec![
                    json!({ "id": r1, "ship_id": ship, "name": "101", "type": "Single", "is_available": true }),
                    json!({ "id": r2, "ship_id": ship, "name": "102", "type": "Double", "is_available": true }),
                ],
            )
            .await;

        Fixture { store, sailing, r1, r2 }
    }

    fn request(sailing: Uuid, rooms: Vec<Uuid>, name: &str) -> BookingRequest {
        BookingRequest {
            sailing_id: sailing,
            room_ids: rooms,
            guest: GuestDetails {
                name: name.to_string(),
                phone: "555".to_string(),
                email: String::new(),
                adults: 2,
                children: -1,
            },
            payment: PaymentDetails {
                method: "Cash".to_string(),
                details: String::new(),
                total: Decimal::from(100),
                paid: Decimal::from(40),
                discount: Decimal::ZERO,
            },
        }
    }

    fn reconciler(store: Arc<MemoryRecordStore>) -> BookingReconciler {
        BookingReconciler::new(store, Arc::new(LocalClaims::new()))
    }

    #[tokio::test]
    async fn test_reconcile_commits_pending_booking() {
        let f = fixture(MemoryRecordStore::new()).await;
        let reconciler = reconciler(f.store.clone());

        let reservation = reconciler.reconcile(request(f.sailing, vec![f.r1], "Alice")).await.unwrap();
        let booking = reservation.primary().unwrap();

        assert_eq!(booking.status, BookingStatus::Pending);
        assert_eq!(booking.due_amount, Decimal::from(60));
        assert_eq!(booking.child_count, 0);
        assert_eq!(booking.room_id, f.r1);
        assert_eq!(f.store.snapshot(Table::Bookings).await.len(), 1);
    }

    #[tokio::test]
    async fn test_second_booking_for_same_room_rejected() {
        let f = fixture(MemoryRecordStore::new()).await;
        let reconciler = reconciler(f.store.clone());

        reconciler.reconcile(request(f.sailing, vec![f.r1], "Alice")).await.unwrap();
        let result = reconciler.reconcile(request(f.sailing, vec![f.r1], "Bob")).await;

        match result {
            Err(BookingError::RoomAlreadyBooked { room_id, room_label }) => {
                assert_eq!(room_id, f.r1);
                assert_eq!(room_label, "101");
            }
            other => panic!("expected RoomAlreadyBooked, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_first_room_only_policy() {
        let f = fixture(MemoryRecordStore::new()).await;
        let reconciler = reconciler(f.store.clone());

        let reservation = reconciler
            .reconcile(request(f.sailing, vec![f.r2, f.r1], "Alice"))
            .await
            .unwrap();

        assert_eq!(reservation.bookings.len(), 1);
        assert_eq!(reservation.bookings[0].room_id, f.r2);
        assert_eq!(reservation.selected_rooms, vec!["102", "101"]);

        // The informational room stays bookable
        reconciler.reconcile(request(f.sailing, vec![f.r1], "Bob")).await.unwrap();
    }

    #[tokio::test]
    async fn test_booking_per_room_policy() {
        let f = fixture(MemoryRecordStore::new()).await;
        let reconciler = reconciler(f.store.clone()).with_policy(MultiRoomPolicy::BookingPerRoom);

        let reservation = reconciler
            .reconcile(request(f.sailing, vec![f.r1, f.r2, f.r1], "Alice"))
            .await
            .unwrap();

        assert_eq!(reservation.bookings.len(), 2);
        assert!(reservation.bookings.iter().all(|b| b.name == "Alice"));
    }

    #[tokio::test]
    async fn test_booking_per_room_rejects_when_any_room_locked() {
        let f = fixture(MemoryRecordStore::new()).await;
        let reconciler = reconciler(f.store.clone()).with_policy(MultiRoomPolicy::BookingPerRoom);

        reconciler.reconcile(request(f.sailing, vec![f.r2], "Alice")).await.unwrap();
        let result = reconciler.reconcile(request(f.sailing, vec![f.r1, f.r2], "Bob")).await;

        assert!(matches!(result, Err(BookingError::RoomAlreadyBooked { .. })));
        assert_eq!(f.store.snapshot(Table::Bookings).await.len(), 1);
    }

    #[tokio::test]
    async fn test_validation_errors() {
        let f = fixture(MemoryRecordStore::new()).await;
        let reconciler = reconciler(f.store.clone());

        let empty = reconciler.reconcile(request(f.sailing, vec![], "Alice")).await;
        assert!(matches!(empty, Err(BookingError::Validation(_))));

        let nameless = reconciler.reconcile(request(f.sailing, vec![f.r1], " ")).await;
        assert!(matches!(nameless, Err(BookingError::Validation(_))));

        let foreign_room = reconciler.reconcile(request(f.sailing, vec![Uuid::new_v4()], "Alice")).await;
        assert!(matches!(foreign_room, Err(BookingError::Validation(_))));

        assert!(f.store.snapshot(Table::Bookings).await.is_empty());
    }

    #[tokio::test]
    async fn test_room_from_another_ship_is_bookable() {
        let f = fixture(MemoryRecordStore::new()).await;
        let elsewhere = Uuid::new_v4();
        f.store
            .seed(
                Table::Rooms,
                vec![json!({ "id": elsewhere, "ship_id": Uuid::new_v4(), "name": "201", "type": "Suite", "is_available": true })],
            )
            .await;

        let reservation = reconciler(f.store.clone())
            .reconcile(request(f.sailing, vec![elsewhere], "Alice"))
            .await
            .unwrap();
        assert_eq!(reservation.primary().unwrap().room_id, elsewhere);

        let scoped = reconciler(f.store.clone()).with_ship_scope(true);
        let result = scoped.reconcile(request(f.sailing, vec![elsewhere], "Bob")).await;
        assert!(matches!(result, Err(BookingError::Validation(_))));
    }

    #[tokio::test]
    async fn test_unknown_sailing_is_not_found() {
        let f = fixture(MemoryRecordStore::new()).await;
        let reconciler = reconciler(f.store.clone());

        let result = reconciler.reconcile(request(Uuid::new_v4(), vec![f.r1], "Alice")).await;
        assert!(matches!(result, Err(BookingError::NotFound(_))));
    }

    #[tokio::test]
    async fn test_claimed_room_is_rejected() {
        let f = fixture(MemoryRecordStore::new()).await;
        let claims = Arc::new(LocalClaims::new());
        let reconciler = BookingReconciler::new(f.store.clone(), claims.clone());

        // Another writer is mid-commit on room 101
        claims.acquire(f.sailing, f.r1, Uuid::new_v4()).await.unwrap();

        let result = reconciler.reconcile(request(f.sailing, vec![f.r1], "Bob")).await;
        assert!(matches!(result, Err(BookingError::RoomAlreadyBooked { .. })));
    }

    #[tokio::test]
    async fn test_claims_released_after_commit() {
        let f = fixture(MemoryRecordStore::new()).await;
        let claims = Arc::new(LocalClaims::new());
        let reconciler = BookingReconciler::new(f.store.clone(), claims.clone());

        reconciler.reconcile(request(f.sailing, vec![f.r1], "Alice")).await.unwrap();
        assert!(claims.acquire(f.sailing, f.r1, Uuid::new_v4()).await.unwrap());
    }

    #[tokio::test]
    async fn test_unreachable_bookings_table_fails_fetch() {
        let f = fixture(MemoryRecordStore::new()).await;
        let reconciler = reconciler(f.store.clone());

        // Lock-set lookup fails before any write is attempted
        f.store.set_unreachable(Table::Bookings, true).await;
        let result = reconciler.reconcile(request(f.sailing, vec![f.r1], "Alice")).await;
        assert!(matches!(result, Err(BookingError::AvailabilityFetch(_))));
    }

    #[tokio::test]
    async fn test_concurrent_reconciliations_book_room_once() {
        let f = fixture(MemoryRecordStore::without_room_lock_constraint()).await;
        let reconciler = Arc::new(reconciler(f.store.clone()));

        let mut handles = Vec::new();
        for i in 0..8 {
            let reconciler = reconciler.clone();
            let req = request(f.sailing, vec![f.r1], &format!("Guest {}", i));
            handles.push(tokio::spawn(async move { reconciler.reconcile(req).await }));
        }

        let mut successes = 0;
        for handle in handles {
            if handle.await.unwrap().is_ok() {
                successes += 1;
            }
        }

        assert_eq!(successes, 1);
        let active = f
            .store
            .snapshot(Table::Bookings)
            .await
            .into_iter()
            .filter(|b| b["status"] == "PENDING")
            .count();
        assert_eq!(active, 1);
    }
}
