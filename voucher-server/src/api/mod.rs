//! HTTP API
//!
//! # Structure
//!
//! Public routes:
//! - [`health`] - liveness and database check
//! - [`auth`] - login, token refresh (login is rate limited)
//! - [`registration`] - retailer self-registration upload (rate limited)
//! - [`regions`] - postal code lookups
//!
//! Authenticated routes (staff-only writes are guarded per module):
//! - [`users`], [`wholesales`], [`retailers`], [`vouchers`],
//!   [`transactions`], [`reimburse`], [`projects`], [`limits`],
//!   [`discounts`], [`items`]

pub mod auth;
pub mod discounts;
mod form;
pub mod health;
pub mod items;
pub mod limits;
pub mod projects;
pub mod regions;
pub mod registration;
pub mod reimburse;
pub mod retailers;
pub mod transactions;
pub mod users;
pub mod vouchers;
pub mod wholesales;

use std::time::Duration;

use axum::{Router, middleware};
use tower_http::cors::CorsLayer;
use tower_http::services::ServeDir;
use tower_http::timeout::TimeoutLayer;
use tower_http::trace::TraceLayer;

use crate::auth::require_auth;
use crate::state::AppState;

/// Body limit for JSON routes
const DEFAULT_BODY_LIMIT: usize = 1024 * 1024;

/// Build the application router with all middleware and state
pub fn create_router(state: AppState) -> Router {
    let public = Router::new()
        .merge(health::router())
        .merge(auth::public_router(&state))
        .merge(registration::router(&state))
        .merge(regions::router());

    let protected = Router::new()
        .merge(auth::router())
        .merge(users::router())
        .merge(wholesales::router())
        .merge(retailers::router())
        .merge(vouchers::router())
        .merge(transactions::router(&state))
        .merge(reimburse::router())
        .merge(projects::router())
        .merge(limits::router())
        .merge(discounts::router())
        .merge(items::router())
        .layer(middleware::from_fn_with_state(state.clone(), require_auth));

    let media_url = state.config.media_url.clone();
    let media = ServeDir::new(state.media.root());
    let timeout = Duration::from_secs(state.config.request_timeout_secs);

    Router::new()
        .merge(public)
        .merge(protected)
        .nest_service(&media_url, media)
        .layer(axum::extract::DefaultBodyLimit::max(DEFAULT_BODY_LIMIT))
        .layer(TimeoutLayer::with_status_code(
            http::StatusCode::REQUEST_TIMEOUT,
            timeout,
        ))
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Body limit for multipart routes carrying `files` uploads
pub(crate) fn upload_body_limit(state: &AppState, files: usize) -> usize {
    state.media.max_bytes().saturating_mul(files) + DEFAULT_BODY_LIMIT
}
