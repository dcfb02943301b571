use async_trait::async_trait;
use serde_json::Value;
use std::collections::{HashMap, HashSet};
use tokio::sync::Mutex;
use tracing::warn;
use voyage_core::{Filter, RecordStore, StoreError, StoreResult, Table};

/// In-process record store. Enforces the same active-cabin uniqueness the
/// production schema does (see `migrations/`), so a reservation that loses a
/// race is rejected at write time rather than producing a double booking.
pub struct MemoryRecordStore {
    tables: Mutex<HashMap<Table, Vec<Value>>>,
    unreachable: Mutex<HashSet<Table>>,
    enforce_room_lock: bool,
}

impl MemoryRecordStore {
    pub fn new() -> Self {
        Self {
            tables: Mutex::new(HashMap::new()),
            unreachable: Mutex::new(HashSet::new()),
            enforce_room_lock: true,
        }
    }

    /// A store without the active-cabin constraint, like a backend that was
    /// never migrated. Only the claim guard protects it.
    pub fn without_room_lock_constraint() -> Self {
        Self {
            enforce_room_lock: false,
            ..Self::new()
        }
    }

    pub async fn seed(&self, table: Table, records: Vec<Value>) {
        self.tables.lock().await.entry(table).or_default().extend(records);
    }

    pub async fn snapshot(&self, table: Table) -> Vec<Value> {
        self.tables.lock().await.get(&table).cloned().unwrap_or_default()
    }

    /// Simulate an outage: every call touching `table` fails until restored.
    pub async fn set_unreachable(&self, table: Table, unreachable: bool) {
        let mut down = self.unreachable.lock().await;
        if unreachable {
            down.insert(table);
        } else {
            down.remove(&table);
        }
    }

    async fn check_reachable(&self, table: Table) -> StoreResult<()> {
        if self.unreachable.lock().await.contains(&table) {
            return Err(StoreError::Transport(format!("{} is unreachable", table)));
        }
        Ok(())
    }

    fn violates_room_lock(&self, table: Table, rows: &[Value], candidate: &Value) -> bool {
        if !self.enforce_room_lock || table != Table::Bookings || !is_active(candidate) {
            return false;
        }

        rows.iter().any(|row| {
            row.get("id") != candidate.get("id")
                && is_active(row)
                && row.get("tour_instance_id") == candidate.get("tour_instance_id")
                && row.get("room_id") == candidate.get("room_id")
        })
    }
}

impl Default for MemoryRecordStore {
    fn default() -> Self {
        Self::new()
    }
}

fn is_active(record: &Value) -> bool {
    !record
        .get("status")
        .and_then(Value::as_str)
        .is_some_and(|s| s.eq_ignore_ascii_case("CANCELLED"))
}

fn id_matches(record: &Value, id: &str) -> bool {
    record.get("id").and_then(Value::as_str) == Some(id)
}

#[async_trait]
impl RecordStore for MemoryRecordStore {
    async fn fetch_all(&self, table: Table) -> StoreResult<Vec<Value>> {
        self.check_reachable(table).await?;
        Ok(self.snapshot(table).await)
    }

    async fn fetch_where(&self, table: Table, filter: &Filter) -> StoreResult<Vec<Value>> {
        self.check_reachable(table).await?;
        let tables = self.tables.lock().await;
        Ok(tables
            .get(&table)
            .map(|rows| rows.iter().filter(|r| filter.matches(r)).cloned().collect())
            .unwrap_or_default())
    }

    async fn insert(&self, table: Table, record: &Value) -> StoreResult<()> {
        self.check_reachable(table).await?;
        if !record.is_object() {
            return Err(StoreError::Decode(format!("{} record must be an object", table)));
        }

        let mut tables = self.tables.lock().await;
        let rows = tables.entry(table).or_default();

        if let Some(id) = record.get("id").and_then(Value::as_str) {
            if rows.iter().any(|r| id_matches(r, id)) {
                return Err(StoreError::Conflict(format!("duplicate id {}", id)));
            }
        }
        if self.violates_room_lock(table, rows, record) {
            warn!("Rejected second active booking for the same cabin");
            return Err(StoreError::Conflict(
                "cabin already held by an active booking".to_string(),
            ));
        }

        rows.push(record.clone());
        Ok(())
    }

    async fn update_by_id(&self, table: Table, id: &str, patch: &Value) -> StoreResult<Option<Value>> {
        self.check_reachable(table).await?;
        let Some(fields) = patch.as_object() else {
            return Err(StoreError::Decode(format!("{} patch must be an object", table)));
        };

        let mut tables = self.tables.lock().await;
        let rows = tables.entry(table).or_default();
        let Some(index) = rows.iter().position(|r| id_matches(r, id)) else {
            return Ok(None);
        };

        let mut updated = rows[index].clone();
        if let Some(obj) = updated.as_object_mut() {
            for (key, value) in fields {
                obj.insert(key.clone(), value.clone());
            }
        }

        if self.violates_room_lock(table, rows, &updated) {
            return Err(StoreError::Conflict(
                "cabin already held by an active booking".to_string(),
            ));
        }

        rows[index] = updated.clone();
        Ok(Some(updated))
    }

    async fn delete_by_id(&self, table: Table, id: &str) -> StoreResult<bool> {
        self.check_reachable(table).await?;
        let mut tables = self.tables.lock().await;
        let rows = tables.entry(table).or_default();
        let before = rows.len();
        rows.retain(|r| !id_matches(r, id));
        Ok(rows.len() != before)
    }
}
