use axum::{
    extract::{Path, State},
    http::header,
    response::IntoResponse,
    routing::get,
    Json, Router,
};
use uuid::Uuid;
use voyage_layout::{layout, render_text, Page};

use crate::error::AppError;
use crate::state::AppState;

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/v1/sailings/{id}/layout", get(layout_pages))
        .route("/v1/sailings/{id}/layout.txt", get(layout_text))
}

async fn pages_for(state: &AppState, sailing_id: Uuid) -> Result<Vec<Page>, AppError> {
    let occupants = state.lifecycle.active_bookings(sailing_id).await?;
    Ok(layout(&occupants, &state.layout))
}

async fn layout_pages(
    State(state): State<AppState>,
    Path(sailing_id): Path<Uuid>,
) -> Result<Json<Vec<Page>>, AppError> {
    Ok(Json(pages_for(&state, sailing_id).await?))
}

async fn layout_text(
    State(state): State<AppState>,
    Path(sailing_id): Path<Uuid>,
) -> Result<impl IntoResponse, AppError> {
    let pages = pages_for(&state, sailing_id).await?;
    Ok((
        [(header::CONTENT_TYPE, "text/plain; charset=utf-8")],
        render_text(&pages),
    ))
}
