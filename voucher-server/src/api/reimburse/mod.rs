//! Reimbursement API Module

mod handler;

use axum::{
    Router, middleware,
    routing::{get, patch, post},
};

use crate::auth::require_staff;
use crate::state::AppState;

pub fn router() -> Router<AppState> {
    let office_routes = Router::new()
        .route("/submit_reimburse/", post(handler::submit))
        .route(
            "/update_reimburse_status/{id}/{new_status}/",
            patch(handler::update_status),
        )
        .layer(middleware::from_fn(require_staff));

    Router::new()
        .route("/list_reimburse/", get(handler::list))
        .merge(office_routes)
}
