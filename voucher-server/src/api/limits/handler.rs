//! Voucher Limit API Handlers

use axum::{
    Json,
    extract::{Path, Query, State},
    http::StatusCode,
};
use serde::Deserialize;
use shared::error::{ApiResponse, AppError};
use shared::models::{
    IncrementRequest, LimitSummary, QuotaStatus, VoucherLimit, VoucherLimitCreate,
    VoucherLimitUpdate,
};

use crate::db::limits;
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct CounterQuery {
    pub id: Option<i64>,
    pub project_id: Option<i64>,
}

pub async fn list(State(state): State<AppState>) -> Result<Json<Vec<VoucherLimit>>, AppError> {
    Ok(Json(limits::list(&state.pool).await?))
}

pub async fn get_by_id(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<Json<VoucherLimit>, AppError> {
    Ok(Json(limits::get(&state.pool, id).await?))
}

pub async fn by_project(
    State(state): State<AppState>,
    Query(query): Query<CounterQuery>,
) -> Result<Json<Vec<VoucherLimit>>, AppError> {
    let project_id = query
        .project_id
        .ok_or_else(|| AppError::required("project_id"))?;
    Ok(Json(limits::by_project(&state.pool, project_id).await?))
}

pub async fn create(
    State(state): State<AppState>,
    Json(payload): Json<VoucherLimitCreate>,
) -> Result<(StatusCode, Json<VoucherLimit>), AppError> {
    let limit = limits::create(&state.pool, &payload).await?;
    Ok((StatusCode::CREATED, Json(limit)))
}

pub async fn update(
    State(state): State<AppState>,
    Path(id): Path<i64>,
    Json(payload): Json<VoucherLimitUpdate>,
) -> Result<Json<VoucherLimit>, AppError> {
    Ok(Json(limits::update(&state.pool, id, &payload).await?))
}

pub async fn delete(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<ApiResponse<()>, AppError> {
    limits::delete(&state.pool, id).await?;
    Ok(ApiResponse::<()>::message("Voucher limit deleted"))
}

/// POST /voucherlimit/{id}/increment/ - body optional, defaults to one
pub async fn increment(
    State(state): State<AppState>,
    Path(id): Path<i64>,
    payload: Option<Json<IncrementRequest>>,
) -> Result<Json<QuotaStatus>, AppError> {
    let by = payload.and_then(|Json(p)| p.by).unwrap_or(1);
    Ok(Json(limits::increment(&state.pool, id, by).await?))
}

pub async fn summary(State(state): State<AppState>) -> Result<Json<LimitSummary>, AppError> {
    Ok(Json(limits::summary(&state.pool).await?))
}

/// GET /current-count/?id=&project_id=
pub async fn current_count(
    State(state): State<AppState>,
    Query(query): Query<CounterQuery>,
) -> Result<Json<QuotaStatus>, AppError> {
    Ok(Json(
        limits::current(&state.pool, query.id, query.project_id).await?,
    ))
}
