//! Retailer API Handlers

use axum::{
    Json,
    extract::{Path, Query, State},
    http::StatusCode,
};
use serde::Serialize;
use shared::error::{ApiResponse, AppError};
use shared::models::{
    Retailer, RetailerCreate, RetailerListEntry, RetailerPhoto, RetailerPhotoGroup,
    RetailerUpdate, VerificationReportRow,
};

use crate::auth::CurrentUser;
use crate::db::retailers::{self, PhotoFilter, RetailerFilter};
use crate::db::vouchers::{self, DecisionOutcome};
use crate::lifecycle::PhotoDecision;
use crate::state::AppState;

/// Retailers of the caller's wholesaler (all of them for staff)
pub async fn list(
    State(state): State<AppState>,
    user: CurrentUser,
) -> Result<Json<Vec<RetailerListEntry>>, AppError> {
    let filter = RetailerFilter {
        ws_id: user.wholesale_scope(None)?,
        ..Default::default()
    };
    Ok(Json(retailers::list(&state.pool, &filter).await?))
}

async fn load_visible(state: &AppState, user: &CurrentUser, id: i64) -> Result<Retailer, AppError> {
    let retailer = retailers::get(&state.pool, id).await?;
    if !user.is_staff {
        match retailer.wholesale_id {
            Some(ws_id) => user.require_wholesale(ws_id)?,
            None => return Err(AppError::permission_denied("Retailer has no wholesaler")),
        }
    }
    Ok(retailer)
}

pub async fn get_by_id(
    State(state): State<AppState>,
    user: CurrentUser,
    Path(id): Path<i64>,
) -> Result<Json<Retailer>, AppError> {
    Ok(Json(load_visible(&state, &user, id).await?))
}

pub async fn photos(
    State(state): State<AppState>,
    user: CurrentUser,
    Path(id): Path<i64>,
) -> Result<Json<Vec<RetailerPhoto>>, AppError> {
    load_visible(&state, &user, id).await?;
    Ok(Json(retailers::photos(&state.pool, id).await?))
}

pub async fn create(
    State(state): State<AppState>,
    Json(payload): Json<RetailerCreate>,
) -> Result<(StatusCode, Json<Retailer>), AppError> {
    let retailer = retailers::create(&state.pool, &payload).await?;
    Ok((StatusCode::CREATED, Json(retailer)))
}

pub async fn update(
    State(state): State<AppState>,
    Path(id): Path<i64>,
    Json(payload): Json<RetailerUpdate>,
) -> Result<Json<Retailer>, AppError> {
    Ok(Json(retailers::update(&state.pool, id, &payload).await?))
}

pub async fn delete(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<ApiResponse<()>, AppError> {
    retailers::delete(&state.pool, id).await?;
    Ok(ApiResponse::<()>::message("Retailer deleted"))
}

// ── Photo review ──

async fn decide(
    state: &AppState,
    user: &CurrentUser,
    id: i64,
    decision: PhotoDecision,
) -> Result<Json<DecisionOutcome>, AppError> {
    let outcome = vouchers::decide(&state.pool, id, decision).await?;
    tracing::info!(
        retailer_id = id,
        voucher_code = %outcome.voucher_code,
        decision = decision.as_str(),
        decided_by = %user.username,
        "Registration decided"
    );
    Ok(Json(outcome))
}

/// POST /retailers/{id}/verify_photos/ - approve, consuming project quota
pub async fn verify_photos(
    State(state): State<AppState>,
    user: CurrentUser,
    Path(id): Path<i64>,
) -> Result<Json<DecisionOutcome>, AppError> {
    decide(&state, &user, id, PhotoDecision::Approve).await
}

/// POST /retailers/{id}/reject_photos/
pub async fn reject_photos(
    State(state): State<AppState>,
    user: CurrentUser,
    Path(id): Path<i64>,
) -> Result<Json<DecisionOutcome>, AppError> {
    decide(&state, &user, id, PhotoDecision::Reject).await
}

// ── Listings ──

/// GET /list_retailers/
pub async fn list_retailers(
    State(state): State<AppState>,
    user: CurrentUser,
    Query(mut filter): Query<RetailerFilter>,
) -> Result<Json<Vec<RetailerListEntry>>, AppError> {
    filter.ws_id = user.wholesale_scope(filter.ws_id)?;
    Ok(Json(retailers::list(&state.pool, &filter).await?))
}

/// GET /list_photos/
pub async fn list_photos(
    State(state): State<AppState>,
    user: CurrentUser,
    Query(mut filter): Query<PhotoFilter>,
) -> Result<Json<Vec<RetailerPhotoGroup>>, AppError> {
    filter.ws_id = user.wholesale_scope(filter.ws_id)?;
    Ok(Json(retailers::list_photos(&state.pool, &filter).await?))
}

#[derive(Debug, Serialize)]
pub struct VerificationReport {
    pub photos_to_verify: Vec<VerificationReportRow>,
}

/// GET /office_verification_report/
pub async fn verification_report(
    State(state): State<AppState>,
) -> Result<Json<VerificationReport>, AppError> {
    let photos_to_verify = retailers::verification_report(&state.pool).await?;
    Ok(Json(VerificationReport { photos_to_verify }))
}
