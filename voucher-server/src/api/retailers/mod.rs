//! Retailer API Module
//!
//! CRUD, photo review (verify/reject) and the retailer listings.

mod handler;

use axum::{
    Router, middleware,
    routing::{get, post, put},
};

use crate::auth::require_staff;
use crate::state::AppState;

pub fn router() -> Router<AppState> {
    let read_routes = Router::new()
        .route("/retailers/", get(handler::list))
        .route("/retailers/{id}/", get(handler::get_by_id))
        .route("/retailers/{id}/photos/", get(handler::photos))
        .route("/list_retailers/", get(handler::list_retailers))
        .route("/list_photos/", get(handler::list_photos))
        .route(
            "/office_verification_report/",
            get(handler::verification_report),
        );

    let office_routes = Router::new()
        .route("/retailers/", post(handler::create))
        .route(
            "/retailers/{id}/",
            put(handler::update)
                .patch(handler::update)
                .delete(handler::delete),
        )
        .route("/retailers/{id}/verify_photos/", post(handler::verify_photos))
        .route("/retailers/{id}/reject_photos/", post(handler::reject_photos))
        .layer(middleware::from_fn(require_staff));

    read_routes.merge(office_routes)
}
