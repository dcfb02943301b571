use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;
use tracing::warn;

use crate::filter::Filter;
use crate::repository::{RecordStore, Table};
use crate::{StoreError, StoreResult};

/// Decode every record, failing on the first malformed one.
pub fn decode_all<T: DeserializeOwned>(table: Table, records: Vec<Value>) -> StoreResult<Vec<T>> {
    records
        .into_iter()
        .map(|r| decode(table, r))
        .collect()
}

pub fn decode<T: DeserializeOwned>(table: Table, record: Value) -> StoreResult<T> {
    serde_json::from_value(record)
        .map_err(|e| StoreError::Decode(format!("{}: {}", table, e)))
}

/// Decode what can be decoded and log the rest. Used for listings where one
/// bad row should not blank the whole screen.
pub fn decode_lenient<T: DeserializeOwned>(table: Table, records: Vec<Value>) -> Vec<T> {
    records
        .into_iter()
        .filter_map(|r| match serde_json::from_value(r) {
            Ok(v) => Some(v),
            Err(e) => {
                warn!("Skipping malformed {} record: {}", table, e);
                None
            }
        })
        .collect()
}

pub fn encode<T: Serialize>(table: Table, record: &T) -> StoreResult<Value> {
    serde_json::to_value(record)
        .map_err(|e| StoreError::Decode(format!("{}: {}", table, e)))
}

pub async fn fetch_typed<T: DeserializeOwned>(
    store: &dyn RecordStore,
    table: Table,
    filter: Option<&Filter>,
) -> StoreResult<Vec<T>> {
    let records = match filter {
        Some(f) => store.fetch_where(table, f).await?,
        None => store.fetch_all(table).await?,
    };
    decode_all(table, records)
}

pub async fn fetch_by_id<T: DeserializeOwned>(
    store: &dyn RecordStore,
    table: Table,
    id: &str,
) -> StoreResult<Option<T>> {
    let filter = Filter::new().eq("id", id);
    let mut records = store.fetch_where(table, &filter).await?;
    if records.is_empty() {
        return Ok(None);
    }
    decode(table, records.swap_remove(0)).map(Some)
}
