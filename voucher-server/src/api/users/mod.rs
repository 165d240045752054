//! User API Module

mod handler;

use axum::{
    Router, middleware,
    routing::{delete, get, post, put},
};

use crate::auth::require_staff;
use crate::state::AppState;

pub fn router() -> Router<AppState> {
    let self_routes = Router::new()
        .route("/user/profile/", get(handler::profile))
        .route("/user/updprofile/", put(handler::update_profile))
        .route("/user/delprofile/", delete(handler::delete_profile));

    // Account administration: staff only
    let manage_routes = Router::new()
        .route("/user/", get(handler::list))
        .route("/user/register/", post(handler::register))
        .route("/user/update/{id}/", put(handler::update))
        .route("/user/delete/{id}/", delete(handler::delete))
        .layer(middleware::from_fn(require_staff));

    self_routes.merge(manage_routes)
}
