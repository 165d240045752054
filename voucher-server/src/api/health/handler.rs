//! Health check handler

use axum::Json;
use axum::extract::State;

use crate::state::AppState;

pub async fn health_check(State(state): State<AppState>) -> Json<serde_json::Value> {
    let db_ok = sqlx::query("SELECT 1").execute(&state.pool).await.is_ok();
    Json(serde_json::json!({
        "status": if db_ok { "healthy" } else { "degraded" },
        "service": "voucher-server",
        "version": env!("CARGO_PKG_VERSION"),
        "environment": state.config.environment,
        "db": db_ok,
    }))
}
