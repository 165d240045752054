//! Wholesale Transaction API Module

mod handler;

use axum::{Router, extract::DefaultBodyLimit, routing::post};

use crate::state::AppState;

pub fn router(state: &AppState) -> Router<AppState> {
    Router::new()
        .route("/submit_redeem_voucher/", post(handler::submit))
        .layer(DefaultBodyLimit::max(super::upload_body_limit(state, 1)))
}
