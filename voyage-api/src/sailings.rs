use axum::{
    extract::{Path, Query, State},
    routing::get,
    Json, Router,
};
use chrono::{NaiveDate, Utc};
use serde::Deserialize;
use uuid::Uuid;
use voyage_booking::{Availability, CustomerEntry, FleetSummary, SailingView};
use voyage_shared::User;

use crate::error::AppError;
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct SailingWindow {
    pub from: Option<NaiveDate>,
    pub until: Option<NaiveDate>,
}

#[derive(Debug, Deserialize)]
pub struct SummaryQuery {
    pub today: Option<NaiveDate>,
}

#[derive(Debug, Deserialize)]
pub struct CustomerQuery {
    pub q: Option<String>,
}

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/v1/sailings", get(list_sailings))
        .route("/v1/summary", get(fleet_summary))
        .route("/v1/sailings/{id}/availability", get(availability))
        .route("/v1/sailings/{id}/customers", get(customers))
        .route("/v1/customers", get(passengers))
}

async fn list_sailings(
    State(state): State<AppState>,
    Query(window): Query<SailingWindow>,
) -> Result<Json<Vec<SailingView>>, AppError> {
    let sailings = state
        .catalog
        .list_sailings_between(window.from, window.until)
        .await?;
    Ok(Json(sailings))
}

async fn fleet_summary(
    State(state): State<AppState>,
    Query(query): Query<SummaryQuery>,
) -> Result<Json<FleetSummary>, AppError> {
    let today = query.today.unwrap_or_else(|| Utc::now().date_naive());
    Ok(Json(state.catalog.summary(today).await?))
}

async fn availability(
    State(state): State<AppState>,
    Path(sailing_id): Path<Uuid>,
) -> Result<Json<Availability>, AppError> {
    Ok(Json(state.resolver.available_rooms(sailing_id).await?))
}

async fn customers(
    State(state): State<AppState>,
    Path(sailing_id): Path<Uuid>,
    Query(query): Query<CustomerQuery>,
) -> Result<Json<Vec<CustomerEntry>>, AppError> {
    let roster = state
        .lifecycle
        .customer_roster(sailing_id, query.q.as_deref())
        .await?;
    Ok(Json(roster))
}

async fn passengers(
    State(state): State<AppState>,
    Query(query): Query<CustomerQuery>,
) -> Result<Json<Vec<User>>, AppError> {
    Ok(Json(state.lifecycle.registered_passengers(query.q.as_deref()).await?))
}
