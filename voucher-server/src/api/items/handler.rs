//! Item API Handlers

use axum::{
    Json,
    extract::{Path, State},
    http::StatusCode,
};
use shared::error::AppError;
use shared::models::{Item, ItemCreate, ItemUpdate};

use crate::db::items;
use crate::state::AppState;

pub async fn list(State(state): State<AppState>) -> Result<Json<Vec<Item>>, AppError> {
    Ok(Json(items::list(&state.pool).await?))
}

pub async fn create(
    State(state): State<AppState>,
    Json(payload): Json<ItemCreate>,
) -> Result<(StatusCode, Json<Item>), AppError> {
    let item = items::create(&state.pool, &payload).await?;
    Ok((StatusCode::CREATED, Json(item)))
}

pub async fn update(
    State(state): State<AppState>,
    Path(id): Path<i64>,
    Json(payload): Json<ItemUpdate>,
) -> Result<Json<Item>, AppError> {
    Ok(Json(items::update(&state.pool, id, &payload).await?))
}
