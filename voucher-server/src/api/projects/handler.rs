//! Voucher Project API Handlers

use axum::{
    Json,
    extract::{Path, State},
    http::StatusCode,
};
use shared::error::AppError;
use shared::models::{ProjectDashboardRow, VoucherProject, VoucherProjectCreate, VoucherProjectUpdate};

use crate::auth::CurrentUser;
use crate::db::projects;
use crate::state::AppState;

pub async fn list(State(state): State<AppState>) -> Result<Json<Vec<VoucherProject>>, AppError> {
    Ok(Json(projects::list(&state.pool).await?))
}

pub async fn active(State(state): State<AppState>) -> Result<Json<Vec<VoucherProject>>, AppError> {
    Ok(Json(projects::active(&state.pool).await?))
}

pub async fn get_by_id(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<Json<VoucherProject>, AppError> {
    Ok(Json(projects::get(&state.pool, id).await?))
}

pub async fn create(
    State(state): State<AppState>,
    user: CurrentUser,
    Json(payload): Json<VoucherProjectCreate>,
) -> Result<(StatusCode, Json<VoucherProject>), AppError> {
    let project = projects::create(&state.pool, &payload, &user.username).await?;
    Ok((StatusCode::CREATED, Json(project)))
}

pub async fn update(
    State(state): State<AppState>,
    user: CurrentUser,
    Path(id): Path<i64>,
    Json(payload): Json<VoucherProjectUpdate>,
) -> Result<Json<VoucherProject>, AppError> {
    Ok(Json(
        projects::update(&state.pool, id, &payload, &user.username).await?,
    ))
}

/// DELETE /voucher-projects/{id}/ - soft delete, vouchers keep their project
pub async fn deactivate(
    State(state): State<AppState>,
    user: CurrentUser,
    Path(id): Path<i64>,
) -> Result<Json<VoucherProject>, AppError> {
    Ok(Json(projects::deactivate(&state.pool, id, &user.username).await?))
}

pub async fn toggle_status(
    State(state): State<AppState>,
    user: CurrentUser,
    Path(id): Path<i64>,
) -> Result<Json<VoucherProject>, AppError> {
    Ok(Json(projects::toggle(&state.pool, id, &user.username).await?))
}

pub async fn dashboard(
    State(state): State<AppState>,
) -> Result<Json<Vec<ProjectDashboardRow>>, AppError> {
    Ok(Json(projects::dashboard(&state.pool).await?))
}
