use async_trait::async_trait;
use reqwest::header::{HeaderMap, HeaderValue, AUTHORIZATION, CONTENT_TYPE};
use reqwest::StatusCode;
use serde_json::Value;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, error};
use voyage_core::{Filter, RecordStore, StoreError, StoreResult, Table};

use crate::app_config::RecordStoreConfig;

/// Record store client speaking PostgREST (`/rest/v1/{table}`).
#[derive(Clone)]
pub struct RestRecordStore {
    inner: Arc<RestInner>,
}

struct RestInner {
    client: reqwest::Client,
    base_url: String,
}

impl RestRecordStore {
    pub fn new(config: &RecordStoreConfig) -> StoreResult<Self> {
        let api_key = config.api_key.expose();

        let mut headers = HeaderMap::new();
        headers.insert("apikey", header_value(api_key)?);
        headers.insert(AUTHORIZATION, header_value(&format!("Bearer {}", api_key))?);
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
        // Writes echo the affected rows so updates can report "no such id"
        headers.insert("Prefer", HeaderValue::from_static("return=representation"));

        let client = reqwest::Client::builder()
            .default_headers(headers)
            .timeout(Duration::from_secs(config.timeout_seconds))
            .build()
            .map_err(|e| StoreError::Config(e.to_string()))?;

        Ok(Self {
            inner: Arc::new(RestInner {
                client,
                base_url: format!("{}/rest/v1", config.url.trim_end_matches('/')),
            }),
        })
    }

    fn table_url(&self, table: Table) -> String {
        format!("{}/{}", self.inner.base_url, table)
    }

    async fn rows(&self, table: Table, response: reqwest::Response) -> StoreResult<Vec<Value>> {
        let status = response.status();
        if !status.is_success() {
            return Err(status_error(table, status, response).await);
        }

        // PostgREST may answer 204 with an empty body
        let body = response.text().await.map_err(transport)?;
        if body.trim().is_empty() {
            return Ok(Vec::new());
        }

        match serde_json::from_str::<Value>(&body) {
            Ok(Value::Array(rows)) => Ok(rows),
            Ok(other) => Ok(vec![other]),
            Err(e) => Err(StoreError::Decode(format!("{}: {}", table, e))),
        }
    }
}

#[async_trait]
impl RecordStore for RestRecordStore {
    async fn fetch_all(&self, table: Table) -> StoreResult<Vec<Value>> {
        debug!("GET {}", table);
        let response = self
            .inner
            .client
            .get(self.table_url(table))
            .send()
            .await
            .map_err(transport)?;
        self.rows(table, response).await
    }

    async fn fetch_where(&self, table: Table, filter: &Filter) -> StoreResult<Vec<Value>> {
        debug!("GET {}?{}", table, filter);
        let response = self
            .inner
            .client
            .get(self.table_url(table))
            .query(&filter.query_pairs())
            .send()
            .await
            .map_err(transport)?;
        self.rows(table, response).await
    }

    async fn insert(&self, table: Table, record: &Value) -> StoreResult<()> {
        debug!("POST {}", table);
        let response = self
            .inner
            .client
            .post(self.table_url(table))
            .json(record)
            .send()
            .await
            .map_err(transport)?;
        self.rows(table, response).await.map(|_| ())
    }

    async fn update_by_id(&self, table: Table, id: &str, patch: &Value) -> StoreResult<Option<Value>> {
        debug!("PATCH {} id={}", table, id);
        let filter = Filter::new().eq("id", id);
        let response = self
            .inner
            .client
            .patch(self.table_url(table))
            .query(&filter.query_pairs())
            .json(patch)
            .send()
            .await
            .map_err(transport)?;
        Ok(self.rows(table, response).await?.into_iter().next())
    }

    async fn delete_by_id(&self, table: Table, id: &str) -> StoreResult<bool> {
        debug!("DELETE {} id={}", table, id);
        let filter = Filter::new().eq("id", id);
        let response = self
            .inner
            .client
            .delete(self.table_url(table))
            .query(&filter.query_pairs())
            .send()
            .await
            .map_err(transport)?;
        Ok(!self.rows(table, response).await?.is_empty())
    }
}

fn header_value(raw: &str) -> StoreResult<HeaderValue> {
    HeaderValue::from_str(raw).map_err(|e| StoreError::Config(format!("invalid api key: {}", e)))
}

fn transport(e: reqwest::Error) -> StoreError {
    StoreError::Transport(e.to_string())
}

async fn status_error(table: Table, status: StatusCode, response: reqwest::Response) -> StoreError {
    let body = response.text().await.unwrap_or_default();
    error!("{} request failed with {}: {}", table, status, body);

    if status == StatusCode::CONFLICT {
        StoreError::Conflict(body)
    } else {
        StoreError::Status {
            status: status.as_u16(),
            body,
        }
    }
}
