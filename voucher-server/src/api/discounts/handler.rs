//! Retailer Discount API Handlers

use axum::{
    Json,
    extract::{Path, Query, State},
    http::StatusCode,
};
use serde::Deserialize;
use shared::error::{ApiResponse, AppError};
use shared::models::{
    VoucherRetailerDiscount, VoucherRetailerDiscountCreate, VoucherRetailerDiscountUpdate,
};

use crate::auth::CurrentUser;
use crate::db::discounts;
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct ProjectQuery {
    pub project_id: Option<i64>,
}

#[derive(Debug, Deserialize)]
pub struct VoucherQuery {
    pub voucher_code: Option<String>,
}

pub async fn list(
    State(state): State<AppState>,
) -> Result<Json<Vec<VoucherRetailerDiscount>>, AppError> {
    Ok(Json(discounts::list(&state.pool).await?))
}

pub async fn get_by_id(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<Json<VoucherRetailerDiscount>, AppError> {
    Ok(Json(discounts::get(&state.pool, id).await?))
}

/// GET /voucher-discounts/by_project/?project_id=
pub async fn by_project(
    State(state): State<AppState>,
    Query(query): Query<ProjectQuery>,
) -> Result<Json<Vec<VoucherRetailerDiscount>>, AppError> {
    let project_id = query
        .project_id
        .ok_or_else(|| AppError::required("project_id"))?;
    Ok(Json(discounts::by_project(&state.pool, project_id).await?))
}

/// GET /voucher-discounts/by_voucher/?voucher_code=
pub async fn by_voucher(
    State(state): State<AppState>,
    Query(query): Query<VoucherQuery>,
) -> Result<Json<Vec<VoucherRetailerDiscount>>, AppError> {
    let code = query
        .voucher_code
        .as_deref()
        .map(str::trim)
        .filter(|c| !c.is_empty())
        .ok_or_else(|| AppError::required("voucher_code"))?;
    Ok(Json(discounts::by_voucher(&state.pool, code).await?))
}

pub async fn create(
    State(state): State<AppState>,
    user: CurrentUser,
    Json(payload): Json<VoucherRetailerDiscountCreate>,
) -> Result<(StatusCode, Json<VoucherRetailerDiscount>), AppError> {
    let discount = discounts::create(&state.pool, &payload, &user.username).await?;
    Ok((StatusCode::CREATED, Json(discount)))
}

pub async fn update(
    State(state): State<AppState>,
    user: CurrentUser,
    Path(id): Path<i64>,
    Json(payload): Json<VoucherRetailerDiscountUpdate>,
) -> Result<Json<VoucherRetailerDiscount>, AppError> {
    Ok(Json(
        discounts::update(&state.pool, id, &payload, &user.username).await?,
    ))
}

pub async fn delete(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<ApiResponse<()>, AppError> {
    discounts::delete(&state.pool, id).await?;
    Ok(ApiResponse::<()>::message("Discount deleted"))
}
