//! Item API Module

mod handler;

use axum::{
    Router, middleware,
    routing::{get, post, put},
};

use crate::auth::require_staff;
use crate::state::AppState;

pub fn router() -> Router<AppState> {
    let manage = Router::new()
        .route("/items/", post(handler::create))
        .route("/items/{id}/", put(handler::update).patch(handler::update))
        .layer(middleware::from_fn(require_staff));

    Router::new().route("/items/", get(handler::list)).merge(manage)
}
