//! Region Handlers

use axum::{
    Json,
    extract::{Query, State},
};
use serde::Deserialize;
use shared::error::AppError;
use shared::models::Kodepos;

use crate::db::regions::{self, KodeposQuery};
use crate::state::AppState;

/// Parent filter for the cascading dropdowns
#[derive(Debug, Deserialize)]
pub struct ParentQuery {
    pub provinsi: Option<String>,
    pub kota: Option<String>,
    pub kecamatan: Option<String>,
}

pub async fn kodepos(State(state): State<AppState>) -> Result<Json<Vec<String>>, AppError> {
    Ok(Json(regions::kodepos(&state.pool).await?))
}

pub async fn provinsi(State(state): State<AppState>) -> Result<Json<Vec<String>>, AppError> {
    Ok(Json(regions::provinsi(&state.pool).await?))
}

pub async fn kota(
    State(state): State<AppState>,
    Query(query): Query<ParentQuery>,
) -> Result<Json<Vec<String>>, AppError> {
    Ok(Json(regions::kota(&state.pool, query.provinsi.as_deref()).await?))
}

pub async fn kecamatan(
    State(state): State<AppState>,
    Query(query): Query<ParentQuery>,
) -> Result<Json<Vec<String>>, AppError> {
    Ok(Json(regions::kecamatan(&state.pool, query.kota.as_deref()).await?))
}

pub async fn kelurahan(
    State(state): State<AppState>,
    Query(query): Query<ParentQuery>,
) -> Result<Json<Vec<String>>, AppError> {
    Ok(Json(
        regions::kelurahan(&state.pool, query.kecamatan.as_deref()).await?,
    ))
}

pub async fn detail(
    State(state): State<AppState>,
    Query(query): Query<KodeposQuery>,
) -> Result<Json<Kodepos>, AppError> {
    Ok(Json(regions::detail(&state.pool, &query).await?))
}
