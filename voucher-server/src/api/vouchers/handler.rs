//! Voucher API Handlers

use axum::{
    Json,
    extract::{Query, State},
};
use serde::{Deserialize, Serialize};
use shared::error::AppError;
use shared::models::{RedeemReportRow, RedeemRequest, VoucherListRow, VoucherRedeem};

use crate::auth::CurrentUser;
use crate::db::vouchers::{self, VoucherFilter};
use crate::state::AppState;

#[derive(Debug, Serialize)]
pub struct RedeemResponse {
    pub message: &'static str,
    pub voucher_redeem: VoucherRedeem,
}

/// POST /redeem_voucher/
pub async fn redeem(
    State(state): State<AppState>,
    user: CurrentUser,
    Json(payload): Json<RedeemRequest>,
) -> Result<Json<RedeemResponse>, AppError> {
    let code = payload.voucher_code.trim();
    if code.is_empty() {
        return Err(AppError::required("voucher_code"));
    }
    user.require_wholesale(payload.ws_id)?;

    let voucher_redeem = vouchers::redeem(&state.pool, code, payload.ws_id).await?;
    tracing::info!(
        voucher_code = %code,
        wholesale_id = payload.ws_id,
        redeemed_by = %user.username,
        "Voucher redeemed"
    );
    Ok(Json(RedeemResponse {
        message: "Voucher redeemed successfully",
        voucher_redeem,
    }))
}

/// GET /list_vouchers/
pub async fn list(
    State(state): State<AppState>,
    user: CurrentUser,
    Query(mut filter): Query<VoucherFilter>,
) -> Result<Json<Vec<VoucherListRow>>, AppError> {
    filter.ws_id = user.wholesale_scope(filter.ws_id)?;
    Ok(Json(vouchers::list(&state.pool, &filter).await?))
}

#[derive(Debug, Deserialize)]
pub struct ReportQuery {
    pub ws_id: Option<i64>,
}

#[derive(Debug, Serialize)]
pub struct RedeemReport {
    pub redeemed_vouchers: Vec<RedeemReportRow>,
}

/// GET /redeem_report/?ws_id=
pub async fn redeem_report(
    State(state): State<AppState>,
    user: CurrentUser,
    Query(query): Query<ReportQuery>,
) -> Result<Json<RedeemReport>, AppError> {
    let ws_id = user.wholesale_scope(query.ws_id)?;
    let redeemed_vouchers = vouchers::redeem_report(&state.pool, ws_id).await?;
    Ok(Json(RedeemReport { redeemed_vouchers }))
}
