//! Retailer self-registration (public, rate limited)

mod handler;

use axum::{Router, extract::DefaultBodyLimit, middleware, routing::post};

use crate::auth::register_rate_limit;
use crate::state::AppState;

/// Photos accepted per registration
pub(crate) const MAX_PHOTOS: usize = 10;

pub fn router(state: &AppState) -> Router<AppState> {
    Router::new()
        .route("/retailer_register_upload/", post(handler::register))
        .layer(DefaultBodyLimit::max(super::upload_body_limit(state, MAX_PHOTOS)))
        .layer(middleware::from_fn_with_state(
            state.clone(),
            register_rate_limit,
        ))
}
