use async_trait::async_trait;
use serde_json::Value;
use std::fmt;
use uuid::Uuid;

use crate::filter::Filter;
use crate::StoreResult;

/// Flat tables exposed by the record store.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Table {
    Ships,
    Rooms,
    Tours,
    TourInstances,
    Bookings,
    Users,
}

impl Table {
    pub fn as_str(&self) -> &'static str {
        match self {
            Table::Ships => "ships",
            Table::Rooms => "rooms",
            Table::Tours => "tours",
            Table::TourInstances => "tour_instances",
            Table::Bookings => "bookings",
            Table::Users => "users",
        }
    }
}

impl fmt::Display for Table {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Generic remote CRUD surface. Records are flat JSON objects keyed by `id`;
/// the store never joins, so cross-table enrichment happens in the caller.
#[async_trait]
pub trait RecordStore: Send + Sync {
    async fn fetch_all(&self, table: Table) -> StoreResult<Vec<Value>>;

    async fn fetch_where(&self, table: Table, filter: &Filter) -> StoreResult<Vec<Value>>;

    /// Fails with `StoreError::Conflict` when the store rejects the row on a uniqueness constraint.
    async fn insert(&self, table: Table, record: &Value) -> StoreResult<()>;

    /// Partial update. Returns the updated record, or `None` when no row has this id.
    async fn update_by_id(&self, table: Table, id: &str, patch: &Value) -> StoreResult<Option<Value>>;

    /// Hard delete. Administrative override only; bookings are cancelled, not deleted.
    async fn delete_by_id(&self, table: Table, id: &str) -> StoreResult<bool>;
}

/// Short-lived claim on a cabin for one sailing, held while a reservation is written.
/// Serializes concurrent reconciliations of the same cabin.
#[async_trait]
pub trait RoomClaims: Send + Sync {
    /// Returns false when another writer already holds the claim.
    async fn acquire(&self, sailing_id: Uuid, room_id: Uuid, token: Uuid) -> StoreResult<bool>;

    /// Releases the claim only if it is still held by `token`.
    async fn release(&self, sailing_id: Uuid, room_id: Uuid, token: Uuid) -> StoreResult<()>;
}
