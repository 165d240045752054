//! Postal code lookups (public)

mod handler;

use axum::{Router, routing::get};

use crate::state::AppState;

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/kodepos/", get(handler::kodepos))
        .route("/kodepos/detail/", get(handler::detail))
        .route("/provinsi/", get(handler::provinsi))
        .route("/kota/", get(handler::kota))
        .route("/kecamatan/", get(handler::kecamatan))
        .route("/kelurahan/", get(handler::kelurahan))
}
