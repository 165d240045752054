//! Reimbursement API Handlers

use axum::{
    Json,
    extract::{Path, Query, State},
    http::StatusCode,
};
use shared::error::{ApiResponse, AppError};
use shared::models::{ReimburseListEntry, SubmitReimburseRequest, SubmitReimburseResult};

use crate::auth::CurrentUser;
use crate::db::reimburses::{self, ReimburseFilter};
use crate::state::AppState;

/// POST /submit_reimburse/ - one result per submitted code
pub async fn submit(
    State(state): State<AppState>,
    user: CurrentUser,
    Json(payload): Json<SubmitReimburseRequest>,
) -> Result<(StatusCode, Json<Vec<SubmitReimburseResult>>), AppError> {
    let codes: Vec<String> = payload
        .voucher_codes
        .iter()
        .map(|c| c.trim().to_string())
        .filter(|c| !c.is_empty())
        .collect();

    let results = reimburses::submit(&state.pool, &codes, &user.username).await?;
    let accepted = results.iter().filter(|r| r.success).count();
    tracing::info!(
        submitted = codes.len(),
        accepted,
        submitted_by = %user.username,
        "Reimbursement batch processed"
    );
    Ok((StatusCode::CREATED, Json(results)))
}

/// PATCH /update_reimburse_status/{id}/{new_status}/
pub async fn update_status(
    State(state): State<AppState>,
    user: CurrentUser,
    Path((id, new_status)): Path<(i64, String)>,
) -> Result<ApiResponse<()>, AppError> {
    let claim = reimburses::update_status(&state.pool, id, &new_status, &user.username).await?;
    tracing::info!(
        reimburse_id = claim.id,
        status = %new_status,
        changed_by = %user.username,
        "Reimbursement status updated"
    );
    Ok(ApiResponse::<()>::message(format!(
        "Reimburse status updated to {}",
        new_status.trim().to_lowercase()
    )))
}

/// GET /list_reimburse/
pub async fn list(
    State(state): State<AppState>,
    Query(filter): Query<ReimburseFilter>,
) -> Result<Json<Vec<ReimburseListEntry>>, AppError> {
    Ok(Json(reimburses::list(&state.pool, &filter).await?))
}
