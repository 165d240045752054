//! Voucher API Module

mod handler;

use axum::{
    Router,
    routing::{get, post},
};

use crate::state::AppState;

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/redeem_voucher/", post(handler::redeem))
        .route("/list_vouchers/", get(handler::list))
        .route("/redeem_report/", get(handler::redeem_report))
}
