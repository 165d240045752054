//! voucher-server: retailer voucher campaign backend
//!
//! Serves the HTTP API over PostgreSQL. Startup order: environment, logging,
//! database pool and migrations, bootstrap staff account, listener.

use std::net::SocketAddr;

use voucher_server::api::create_router;
use voucher_server::db::users;
use voucher_server::util::hash_new_password;
use voucher_server::{AppState, BoxError, Config, logging};

#[tokio::main]
async fn main() -> Result<(), BoxError> {
    // Load .env file
    let _ = dotenvy::dotenv();

    let config = Config::from_env()?;
    let _log_guard = logging::init(config.log_json, config.log_dir.as_deref())?;

    tracing::info!(
        environment = %config.environment,
        version = env!("CARGO_PKG_VERSION"),
        "Starting voucher-server"
    );

    let http_port = config.http_port;
    let state = AppState::new(config).await?;

    seed_admin(&state).await?;

    // Rate limiter entries and refresh tokens
    let _sweep = state.spawn_maintenance();

    let app = create_router(state);

    let addr = SocketAddr::from(([0, 0, 0, 0], http_port));
    let listener = tokio::net::TcpListener::bind(addr).await?;
    tracing::info!("HTTP listening on {addr}");

    axum::serve(
        listener,
        app.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .with_graceful_shutdown(shutdown_signal())
    .await?;

    tracing::info!("voucher-server stopped");
    Ok(())
}

/// Create the first staff account from `ADMIN_USERNAME` / `ADMIN_PASSWORD`
async fn seed_admin(state: &AppState) -> Result<(), BoxError> {
    let (Some(username), Some(password)) = (
        state.config.admin_username.as_deref(),
        state.config.admin_password.as_deref(),
    ) else {
        return Ok(());
    };

    let hash = hash_new_password(password)?;
    let created = users::seed_admin(
        &state.pool,
        username,
        state.config.admin_email.as_deref(),
        &hash,
    )
    .await
    .map_err(|e| e.into_boxed())?;
    if created {
        tracing::info!(username, "Bootstrap staff account created");
    }
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!("Failed to listen for shutdown signal: {e}");
        return;
    }
    tracing::info!("Shutdown signal received");
}
