//! Voucher Project API Module

mod handler;

use axum::{
    Router, middleware,
    routing::{get, post, put},
};

use crate::auth::require_staff;
use crate::state::AppState;

pub fn router() -> Router<AppState> {
    let read_routes = Router::new()
        .route("/voucher-projects/", get(handler::list))
        .route("/voucher-projects/active/", get(handler::active))
        .route("/voucher-projects/dashboard/", get(handler::dashboard))
        .route("/voucher-projects/{id}/", get(handler::get_by_id));

    let manage_routes = Router::new()
        .route("/voucher-projects/", post(handler::create))
        .route(
            "/voucher-projects/{id}/",
            put(handler::update)
                .patch(handler::update)
                .delete(handler::deactivate),
        )
        .route("/voucher-projects/{id}/toggle_status/", post(handler::toggle_status))
        .layer(middleware::from_fn(require_staff));

    read_routes.merge(manage_routes)
}
