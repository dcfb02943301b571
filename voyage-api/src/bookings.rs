use axum::{
    extract::{rejection::JsonRejection, Path, Query, State},
    http::StatusCode,
    routing::{get, post},
    Json, Router,
};
use serde::{Deserialize, Serialize};
use tracing::info;
use uuid::Uuid;
use voyage_booking::{
    BookingEdit, BookingRequest, BookingView, GuestDetails, PaymentDetails, Reservation,
};
use voyage_shared::{Booking, BookingStatus};

use crate::error::AppError;
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct ListQuery {
    #[serde(default)]
    pub include_cancelled: bool,
}

/// Body of a new reservation; the sailing comes from the path.
#[derive(Debug, Deserialize)]
pub struct NewBooking {
    pub room_ids: Vec<Uuid>,
    pub guest: GuestDetails,
    #[serde(default)]
    pub payment: PaymentDetails,
}

#[derive(Debug, Serialize)]
pub struct CancelResponse {
    pub booking_id: Uuid,
    pub status: BookingStatus,
}

pub fn routes() -> Router<AppState> {
    Router::new()
        .route(
            "/v1/sailings/{id}/bookings",
            get(list_bookings).post(create_booking),
        )
        .route("/v1/bookings/{id}", get(get_booking).patch(edit_booking))
        .route("/v1/bookings/{id}/cancel", post(cancel_booking))
}

async fn list_bookings(
    State(state): State<AppState>,
    Path(sailing_id): Path<Uuid>,
    Query(query): Query<ListQuery>,
) -> Result<Json<Vec<BookingView>>, AppError> {
    let views = if query.include_cancelled {
        state.lifecycle.all_bookings(sailing_id).await?
    } else {
        state.lifecycle.active_bookings(sailing_id).await?
    };
    Ok(Json(views))
}

async fn create_booking(
    State(state): State<AppState>,
    Path(sailing_id): Path<Uuid>,
    payload: Result<Json<NewBooking>, JsonRejection>,
) -> Result<(StatusCode, Json<Reservation>), AppError> {
    let Json(body) = payload?;
    info!("Reservation requested on sailing {} for {} room(s)", sailing_id, body.room_ids.len());

    let reservation = state
        .reconciler
        .reconcile(BookingRequest {
            sailing_id,
            room_ids: body.room_ids,
            guest: body.guest,
            payment: body.payment,
        })
        .await?;

    Ok((StatusCode::CREATED, Json(reservation)))
}

async fn get_booking(
    State(state): State<AppState>,
    Path(booking_id): Path<Uuid>,
) -> Result<Json<BookingView>, AppError> {
    Ok(Json(state.lifecycle.get(booking_id).await?))
}

async fn edit_booking(
    State(state): State<AppState>,
    Path(booking_id): Path<Uuid>,
    payload: Result<Json<BookingEdit>, JsonRejection>,
) -> Result<Json<Booking>, AppError> {
    let Json(edit) = payload?;
    Ok(Json(state.lifecycle.edit(booking_id, edit).await?))
}

async fn cancel_booking(
    State(state): State<AppState>,
    Path(booking_id): Path<Uuid>,
) -> Result<Json<CancelResponse>, AppError> {
    state.lifecycle.cancel(booking_id).await?;
    Ok(Json(CancelResponse {
        booking_id,
        status: BookingStatus::Cancelled,
    }))
}
