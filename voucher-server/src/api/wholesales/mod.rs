//! Wholesale API Module

mod handler;

use axum::{
    Router, middleware,
    routing::{get, post, put},
};

use crate::auth::require_staff;
use crate::state::AppState;

pub fn router() -> Router<AppState> {
    let read_routes = Router::new()
        .route("/wholesales/", get(handler::list))
        .route("/wholesales/roots/", get(handler::roots))
        .route("/wholesales/leaves/", get(handler::leaves))
        .route("/wholesales/by_level/", get(handler::by_level))
        .route("/wholesales/{id}/", get(handler::get_by_id))
        .route("/wholesales/{id}/children/", get(handler::children))
        .route("/wholesales/{id}/descendants/", get(handler::descendants))
        .route("/wholesales/{id}/ancestors/", get(handler::ancestors))
        .route("/wholesales/{id}/level/", get(handler::level))
        .route("/wholesales/{id}/tree/", get(handler::tree))
        .route("/wholesales/{id}/hierarchy/", get(handler::hierarchy));

    let manage_routes = Router::new()
        .route("/wholesales/", post(handler::create))
        .route(
            "/wholesales/{id}/",
            put(handler::update)
                .patch(handler::update)
                .delete(handler::delete),
        )
        .layer(middleware::from_fn(require_staff));

    read_routes.merge(manage_routes)
}
