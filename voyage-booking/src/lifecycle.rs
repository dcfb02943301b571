use serde::{Deserialize, Serialize};
use serde_json::json;
use std::collections::HashMap;
use std::sync::Arc;
use tracing::{error, info};
use uuid::Uuid;
use voyage_core::records::{decode, decode_lenient, fetch_by_id};
use voyage_core::{Filter, RecordStore, Table};
use voyage_shared::{money, Booking, BookingStatus, Room, User};

use crate::availability::RoomAvailabilityResolver;
use crate::reconciler::{GuestDetails, PaymentDetails};
use crate::roster::{self, CustomerEntry};
use crate::validation::{normalize_guest, normalize_payment};
use crate::{BookingError, BookingResult};

/// Replacement guest and payment data for an existing booking.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct BookingEdit {
    pub guest: GuestDetails,
    #[serde(default)]
    pub payment: PaymentDetails,
}

/// A booking joined with its cabin for display. The room fields and the due
/// balance are derived on read and never written back.
#[derive(Debug, Clone, Serialize)]
pub struct BookingView {
    #[serde(flatten)]
    pub booking: Booking,
    pub room_number: Option<String>,
    pub room_type: Option<String>,
}

impl BookingView {
    pub fn join(mut booking: Booking, room: Option<&Room>) -> Self {
        // Stored balance may predate the last payment edit
        booking.refresh_due();
        Self {
            room_number: room.map(|r| r.room_number.clone()),
            room_type: room.map(|r| r.room_type.clone()),
            booking,
        }
    }
}

pub struct BookingLifecycleStore {
    store: Arc<dyn RecordStore>,
    resolver: RoomAvailabilityResolver,
}

impl BookingLifecycleStore {
    pub fn new(store: Arc<dyn RecordStore>) -> Self {
        Self {
            resolver: RoomAvailabilityResolver::new(store.clone()),
            store,
        }
    }

    /// Mark a booking cancelled. The record stays in the store and its cabin
    /// becomes bookable again. Cancelling twice is harmless.
    pub async fn cancel(&self, booking_id: Uuid) -> BookingResult<()> {
        let patch = json!({ "status": BookingStatus::Cancelled });
        let id = booking_id.to_string();

        match self.store.update_by_id(Table::Bookings, &id, &patch).await {
            Ok(Some(_)) => {
                info!("Cancelled booking {}", id);
                Ok(())
            }
            Ok(None) => Err(BookingError::NotFound(format!("booking {}", id))),
            Err(e) => {
                error!("Failed to cancel booking {}: {}", id, e);
                Err(BookingError::Persistence(e))
            }
        }
    }

    /// Replace guest and payment fields. Sailing, cabin and status are left alone.
    pub async fn edit(&self, booking_id: Uuid, edit: BookingEdit) -> BookingResult<Booking> {
        let guest = normalize_guest(edit.guest)?;
        let payment = normalize_payment(edit.payment)?;
        let due = money::due_amount(payment.total, payment.discount, payment.paid);

        let patch = json!({
            "name": guest.name,
            "phone": guest.phone,
            "email": guest.email,
            "adult_count": guest.adults,
            "child_count": guest.children,
            "payment_method": payment.method,
            "payment_details": payment.details,
            "total_payment": payment.total,
            "paid_amount": payment.paid,
            "discount": payment.discount,
            "due_amount": due,
        });

        let id = booking_id.to_string();
        let updated = self
            .store
            .update_by_id(Table::Bookings, &id, &patch)
            .await
            .map_err(|e| {
                error!("Failed to update booking {}: {}", id, e);
                BookingError::Persistence(e)
            })?
            .ok_or_else(|| BookingError::NotFound(format!("booking {}", id)))?;

        info!("Updated booking {}", id);
        decode(Table::Bookings, updated).map_err(BookingError::Persistence)
    }

    pub async fn get(&self, booking_id: Uuid) -> BookingResult<BookingView> {
        let id = booking_id.to_string();
        let booking: Booking = fetch_by_id(self.store.as_ref(), Table::Bookings, &id)
            .await
            .map_err(BookingError::AvailabilityFetch)?
            .ok_or_else(|| BookingError::NotFound(format!("booking {}", id)))?;

        let room: Option<Room> =
            fetch_by_id(self.store.as_ref(), Table::Rooms, &booking.room_id.to_string())
                .await
                .map_err(BookingError::AvailabilityFetch)?;

        Ok(BookingView::join(booking, room.as_ref()))
    }

    /// Non-cancelled bookings of a sailing with their cabin details.
    pub async fn active_bookings(&self, sailing_id: Uuid) -> BookingResult<Vec<BookingView>> {
        let mut views = self.all_bookings(sailing_id).await?;
        views.retain(|v| v.booking.is_active());
        Ok(views)
    }

    /// Every booking of a sailing, cancelled ones included.
    pub async fn all_bookings(&self, sailing_id: Uuid) -> BookingResult<Vec<BookingView>> {
        let (bookings, rooms) = tokio::try_join!(
            self.resolver.bookings_for(sailing_id),
            self.store.fetch_all(Table::Rooms),
        )
        .map_err(BookingError::AvailabilityFetch)?;

        let rooms: HashMap<Uuid, Room> = decode_lenient::<Room>(Table::Rooms, rooms)
            .into_iter()
            .map(|r| (r.id, r))
            .collect();

        Ok(bookings
            .into_iter()
            .map(|b| {
                let room = rooms.get(&b.room_id);
                BookingView::join(b, room)
            })
            .collect())
    }

    /// Unique customers among the active bookings of a sailing.
    pub async fn customer_roster(
        &self,
        sailing_id: Uuid,
        query: Option<&str>,
    ) -> BookingResult<Vec<CustomerEntry>> {
        let views = self.active_bookings(sailing_id).await?;
        Ok(roster::project(&views, query))
    }

    /// Passenger accounts, independent of any sailing.
    pub async fn registered_passengers(&self, query: Option<&str>) -> BookingResult<Vec<User>> {
        let filter = Filter::new().eq("role", "passenger");
        let users = self
            .store
            .fetch_where(Table::Users, &filter)
            .await
            .map_err(BookingError::AvailabilityFetch)?;
        Ok(roster::passengers(decode_lenient(Table::Users, users), query))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal::Decimal;
    use voyage_store::MemoryRecordStore;

    struct Fixture {
        store: Arc<MemoryRecordStore>,
        sailing: Uuid,
        room: Uuid,
        booking: Uuid,
    }

    async fn fixture(status: &str) -> Fixture {
        let store = Arc::new(MemoryRecordStore::new());
        let sailing = Uuid::new_v4();
        let room = Uuid::new_v4();
        let booking = Uuid::new_v4();

        store
            .seed(
                Table::Rooms,
                vec![json!({ "id": room, "ship_id": Uuid::new_v4(), "name": "101", "type": "Deluxe", "is_available": true })],
            )
            .await;
        store
            .seed(
                Table::Bookings,
                vec![json!({
                    "id": booking, "tour_instance_id": sailing, "room_id": room,
                    "name": "Alice", "phone": "555", "email": "alice@example.com",
                    "total_payment": 100, "paid_amount": 40, "due_amount": 60, "discount": 0,
                    "adult_count": 2, "child_count": 1, "status": status
                })],
            )
            .await;

        Fixture { store, sailing, room, booking }
    }

    fn edit(name: &str, total: i64, paid: i64, discount: i64) -> BookingEdit {
        BookingEdit {
            guest: GuestDetails {
                name: name.to_string(),
                phone: "777".to_string(),
                email: "new@example.com".to_string(),
                adults: 1,
                children: 0,
            },
            payment: PaymentDetails {
                method: "Card".to_string(),
                details: "visa".to_string(),
                total: Decimal::from(total),
                paid: Decimal::from(paid),
                discount: Decimal::from(discount),
            },
        }
    }

    #[tokio::test]
    async fn test_cancel_is_non_destructive() {
        let f = fixture("PENDING").await;
        let lifecycle = BookingLifecycleStore::new(f.store.clone());

        lifecycle.cancel(f.booking).await.unwrap();

        let rows = f.store.snapshot(Table::Bookings).await;
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0]["status"], "CANCELLED");
        assert_eq!(rows[0]["name"], "Alice");

        assert!(lifecycle.active_bookings(f.sailing).await.unwrap().is_empty());
        assert_eq!(lifecycle.all_bookings(f.sailing).await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_cancel_twice_is_idempotent() {
        let f = fixture("PENDING").await;
        let lifecycle = BookingLifecycleStore::new(f.store.clone());

        lifecycle.cancel(f.booking).await.unwrap();
        lifecycle.cancel(f.booking).await.unwrap();
    }

    #[tokio::test]
    async fn test_cancel_unknown_booking() {
        let f = fixture("PENDING").await;
        let lifecycle = BookingLifecycleStore::new(f.store.clone());

        let result = lifecycle.cancel(Uuid::new_v4()).await;
        assert!(matches!(result, Err(BookingError::NotFound(_))));
    }

    #[tokio::test]
    async fn test_cancel_store_failure_is_persistence() {
        let f = fixture("PENDING").await;
        let lifecycle = BookingLifecycleStore::new(f.store.clone());

        f.store.set_unreachable(Table::Bookings, true).await;
        let result = lifecycle.cancel(f.booking).await;
        assert!(matches!(result, Err(BookingError::Persistence(_))));
    }

    #[tokio::test]
    async fn test_edit_recomputes_due_and_keeps_identity() {
        let f = fixture("PENDING").await;
        let lifecycle = BookingLifecycleStore::new(f.store.clone());

        let updated = lifecycle.edit(f.booking, edit("Alice B", 200, 50, 30)).await.unwrap();

        assert_eq!(updated.name, "Alice B");
        assert_eq!(updated.due_amount, Decimal::from(120));
        assert_eq!(updated.room_id, f.room);
        assert_eq!(updated.tour_instance_id, f.sailing);
        assert_eq!(updated.status, BookingStatus::Pending);
    }

    #[tokio::test]
    async fn test_edit_overpayment_clamps_due() {
        let f = fixture("PENDING").await;
        let lifecycle = BookingLifecycleStore::new(f.store.clone());

        let updated = lifecycle.edit(f.booking, edit("Alice", 100, 150, 0)).await.unwrap();
        assert_eq!(updated.due_amount, Decimal::ZERO);
    }

    #[tokio::test]
    async fn test_edit_cancelled_booking_stays_cancelled() {
        let f = fixture("cancelled").await;
        let lifecycle = BookingLifecycleStore::new(f.store.clone());

        let updated = lifecycle.edit(f.booking, edit("Alice", 100, 100, 0)).await.unwrap();
        assert_eq!(updated.status, BookingStatus::Cancelled);
    }

    #[tokio::test]
    async fn test_edit_rejects_invalid_input_without_writing() {
        let f = fixture("PENDING").await;
        let lifecycle = BookingLifecycleStore::new(f.store.clone());

        let result = lifecycle.edit(f.booking, edit("", 100, 10, 0)).await;
        assert!(matches!(result, Err(BookingError::Validation(_))));

        let rows = f.store.snapshot(Table::Bookings).await;
        assert_eq!(rows[0]["name"], "Alice");
    }

    #[tokio::test]
    async fn test_edit_unknown_booking() {
        let f = fixture("PENDING").await;
        let lifecycle = BookingLifecycleStore::new(f.store.clone());

        let result = lifecycle.edit(Uuid::new_v4(), edit("Bob", 10, 0, 0)).await;
        assert!(matches!(result, Err(BookingError::NotFound(_))));
    }

    #[tokio::test]
    async fn test_views_join_room_details() {
        let f = fixture("PENDING").await;
        let lifecycle = BookingLifecycleStore::new(f.store.clone());

        let view = lifecycle.get(f.booking).await.unwrap();
        assert_eq!(view.room_number.as_deref(), Some("101"));
        assert_eq!(view.room_type.as_deref(), Some("Deluxe"));

        let listed = lifecycle.active_bookings(f.sailing).await.unwrap();
        assert_eq!(listed.len(), 1);
        assert_eq!(listed[0].room_number.as_deref(), Some("101"));
    }

    #[tokio::test]
    async fn test_view_serializes_flat() {
        let f = fixture("PENDING").await;
        let lifecycle = BookingLifecycleStore::new(f.store.clone());

        let view = lifecycle.get(f.booking).await.unwrap();
        let value = serde_json::to_value(&view).unwrap();
        assert_eq!(value["name"], "Alice");
        assert_eq!(value["room_number"], "101");
    }

    #[tokio::test]
    async fn test_views_recompute_stale_due() {
        let f = fixture("PENDING").await;
        let stale = Uuid::new_v4();
        f.store
            .seed(
                Table::Bookings,
                vec![json!({
                    "id": stale, "tour_instance_id": f.sailing, "room_id": Uuid::new_v4(),
                    "name": "Carol", "phone": "999", "email": "carol@example.com",
                    "total_payment": 100, "paid_amount": 0, "due_amount": 0, "discount": 0,
                    "status": "PENDING"
                })],
            )
            .await;
        let lifecycle = BookingLifecycleStore::new(f.store.clone());

        let view = lifecycle.get(stale).await.unwrap();
        assert_eq!(view.booking.due_amount, Decimal::from(100));

        let roster = lifecycle.customer_roster(f.sailing, Some("carol")).await.unwrap();
        assert_eq!(roster.len(), 1);
        assert_eq!(roster[0].payment_status, voyage_shared::PaymentStatus::Due);
    }

    #[tokio::test]
    async fn test_registered_passengers() {
        let f = fixture("PENDING").await;
        f.store
            .seed(
                Table::Users,
                vec![
                    json!({ "id": Uuid::new_v4(), "name": "Dina", "email": "dina@example.com", "phone": "1", "role": "passenger" }),
                    json!({ "id": Uuid::new_v4(), "name": "Staff", "email": "ops@example.com", "phone": "2", "role": "admin" }),
                ],
            )
            .await;
        let lifecycle = BookingLifecycleStore::new(f.store.clone());

        let all = lifecycle.registered_passengers(None).await.unwrap();
        assert_eq!(all.len(), 1);
        assert_eq!(all[0].name, "Dina");
        assert!(lifecycle.registered_passengers(Some("zed")).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_roster_skips_cancelled() {
        let f = fixture("CANCELLED").await;
        let lifecycle = BookingLifecycleStore::new(f.store.clone());

        assert!(lifecycle.customer_roster(f.sailing, None).await.unwrap().is_empty());
    }
}
