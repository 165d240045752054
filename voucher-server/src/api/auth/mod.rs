//! Auth API Module

mod handler;

use axum::{Router, middleware, routing::post};

use crate::auth::login_rate_limit;
use crate::state::AppState;

/// Login and refresh (no token required)
pub fn public_router(state: &AppState) -> Router<AppState> {
    let login = Router::new()
        .route("/login/", post(handler::login))
        .route("/token/", post(handler::login))
        .layer(middleware::from_fn_with_state(state.clone(), login_rate_limit));

    Router::new()
        .route("/token/refresh/", post(handler::refresh))
        .merge(login)
}

/// Session routes for an authenticated user
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/logout/", post(handler::logout))
        .route("/change_password/", post(handler::change_password))
}
