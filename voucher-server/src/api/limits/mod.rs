//! Voucher Limit API Module

mod handler;

use axum::{
    Router, middleware,
    routing::{get, post, put},
};

use crate::auth::require_staff;
use crate::state::AppState;

pub fn router() -> Router<AppState> {
    routes().route("/current-count/", get(handler::current_count))
}

fn routes() -> Router<AppState> {
    let read_routes = Router::new()
        .route("/voucherlimit/", get(handler::list))
        .route("/voucherlimit/summary/", get(handler::summary))
        .route("/voucherlimit/by_project/", get(handler::by_project))
        .route("/voucherlimit/{id}/", get(handler::get_by_id));

    let manage_routes = Router::new()
        .route("/voucherlimit/", post(handler::create))
        .route(
            "/voucherlimit/{id}/",
            put(handler::update)
                .patch(handler::update)
                .delete(handler::delete),
        )
        .route("/voucherlimit/{id}/increment/", post(handler::increment))
        .layer(middleware::from_fn(require_staff));

    read_routes.merge(manage_routes)
}
