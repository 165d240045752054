//! Retailer Discount API Module

mod handler;

use axum::{
    Router, middleware,
    routing::{get, post, put},
};

use crate::auth::require_staff;
use crate::state::AppState;

pub fn router() -> Router<AppState> {
    let read_routes = Router::new()
        .route("/voucher-discounts/", get(handler::list))
        .route("/voucher-discounts/by_project/", get(handler::by_project))
        .route("/voucher-discounts/by_voucher/", get(handler::by_voucher))
        .route("/voucher-discounts/{id}/", get(handler::get_by_id));

    let manage_routes = Router::new()
        .route("/voucher-discounts/", post(handler::create))
        .route(
            "/voucher-discounts/{id}/",
            put(handler::update)
                .patch(handler::update)
                .delete(handler::delete),
        )
        .layer(middleware::from_fn(require_staff));

    read_routes.merge(manage_routes)
}
