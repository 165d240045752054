//! Wholesale API Handlers

use std::collections::BTreeMap;

use axum::{
    Json,
    extract::{Path, Query, State},
    http::StatusCode,
};
use serde::Deserialize;
use shared::error::{ApiResponse, AppError};
use shared::models::{
    Wholesale, WholesaleCreate, WholesaleHierarchy, WholesaleNode, WholesaleUpdate,
    WholesaleWithLevel,
};

use crate::db::wholesales;
use crate::state::AppState;

pub async fn list(State(state): State<AppState>) -> Result<Json<Vec<Wholesale>>, AppError> {
    Ok(Json(wholesales::list(&state.pool).await?))
}

pub async fn get_by_id(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<Json<Wholesale>, AppError> {
    Ok(Json(wholesales::get(&state.pool, id).await?))
}

pub async fn create(
    State(state): State<AppState>,
    Json(payload): Json<WholesaleCreate>,
) -> Result<(StatusCode, Json<Wholesale>), AppError> {
    let wholesale = wholesales::create(&state.pool, &payload).await?;
    Ok((StatusCode::CREATED, Json(wholesale)))
}

pub async fn update(
    State(state): State<AppState>,
    Path(id): Path<i64>,
    Json(payload): Json<WholesaleUpdate>,
) -> Result<Json<Wholesale>, AppError> {
    Ok(Json(wholesales::update(&state.pool, id, &payload).await?))
}

pub async fn delete(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<ApiResponse<()>, AppError> {
    wholesales::delete(&state.pool, id).await?;
    Ok(ApiResponse::<()>::message("Wholesaler deleted"))
}

// ── Hierarchy ──

pub async fn roots(State(state): State<AppState>) -> Result<Json<Vec<WholesaleNode>>, AppError> {
    Ok(Json(wholesales::roots(&state.pool).await?))
}

pub async fn leaves(State(state): State<AppState>) -> Result<Json<Vec<Wholesale>>, AppError> {
    Ok(Json(wholesales::leaves(&state.pool).await?))
}

pub async fn children(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<Json<Vec<Wholesale>>, AppError> {
    Ok(Json(wholesales::children(&state.pool, id).await?))
}

pub async fn descendants(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<Json<Vec<WholesaleWithLevel>>, AppError> {
    Ok(Json(wholesales::descendants(&state.pool, id).await?))
}

pub async fn ancestors(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<Json<Vec<Wholesale>>, AppError> {
    Ok(Json(wholesales::ancestors(&state.pool, id).await?))
}

pub async fn level(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<Json<serde_json::Value>, AppError> {
    let level = wholesales::level(&state.pool, id).await?;
    Ok(Json(serde_json::json!({ "id": id, "level": level })))
}

pub async fn tree(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<Json<WholesaleNode>, AppError> {
    Ok(Json(wholesales::tree(&state.pool, id).await?))
}

pub async fn hierarchy(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<Json<WholesaleHierarchy>, AppError> {
    Ok(Json(wholesales::hierarchy_info(&state.pool, id).await?))
}

#[derive(Debug, Deserialize)]
pub struct LevelQuery {
    pub level: Option<i32>,
}

/// GET /wholesales/by_level/ - one level as a list, or all levels keyed `level_<n>`
pub async fn by_level(
    State(state): State<AppState>,
    Query(query): Query<LevelQuery>,
) -> Result<Json<serde_json::Value>, AppError> {
    let mut levels = wholesales::by_level(&state.pool).await?;
    let body = match query.level {
        Some(level) => serde_json::to_value(levels.remove(&level).unwrap_or_default()),
        None => {
            let keyed: BTreeMap<String, Vec<WholesaleWithLevel>> = levels
                .into_iter()
                .map(|(level, rows)| (format!("level_{level}"), rows))
                .collect();
            serde_json::to_value(keyed)
        }
    }
    .map_err(|e| AppError::internal(format!("Serialization failed: {e}")))?;
    Ok(Json(body))
}
