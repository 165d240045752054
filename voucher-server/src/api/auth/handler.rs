//! Auth API Handlers

use axum::{Json, extract::State};
use shared::error::{ApiResponse, AppError, ErrorCode};
use shared::models::{ChangePasswordRequest, LoginRequest, LoginResponse, RefreshRequest, TokenPair, User};

use crate::auth::CurrentUser;
use crate::db::{refresh_tokens, users};
use crate::security_log;
use crate::state::AppState;
use crate::util::{hash_new_password, verify_password};

/// Argon2 verification off the async workers
async fn check_password(password: String, hash: String) -> Result<bool, AppError> {
    tokio::task::spawn_blocking(move || verify_password(&password, &hash))
        .await
        .map_err(|e| AppError::internal(format!("Password check failed: {e}")))
}

async fn issue_tokens(state: &AppState, user: &User) -> Result<TokenPair, AppError> {
    let access = state.jwt.generate_token(user)?;
    let refresh =
        refresh_tokens::create(&state.pool, user.id, state.config.refresh_token_days).await?;
    Ok(TokenPair { access, refresh })
}

/// POST /login/ and /token/
pub async fn login(
    State(state): State<AppState>,
    Json(req): Json<LoginRequest>,
) -> Result<Json<LoginResponse>, AppError> {
    let username = req.username.trim();
    if username.is_empty() || req.password.is_empty() {
        return Err(AppError::required("username and password"));
    }

    let found = users::find_for_login(&state.pool, username).await?;
    let Some((user, hash)) = found else {
        security_log!(WARN, "login_failed", username = %username, reason = "unknown_user");
        return Err(AppError::invalid_credentials());
    };

    if !check_password(req.password, hash).await? {
        security_log!(WARN, "login_failed", username = %username, reason = "bad_password");
        return Err(AppError::invalid_credentials());
    }
    if !user.is_active {
        security_log!(WARN, "login_failed", username = %username, reason = "disabled");
        return Err(AppError::new(ErrorCode::AccountDisabled));
    }

    let tokens = issue_tokens(&state, &user).await?;
    let profile = users::profile(&state.pool, user.id).await?;

    security_log!(INFO, "login_success", user_id = user.id, username = %user.username);

    Ok(Json(LoginResponse {
        message: "Login successful".to_string(),
        access: tokens.access,
        refresh: tokens.refresh,
        userid: user.id,
        username: user.username,
        email: user.email,
        is_staff: user.is_staff,
        wholesale: user.wholesale_id,
        wholesale_name: profile.wholesale_name,
        wholesale_phone_number: profile.wholesale_phone_number,
    }))
}

/// POST /token/refresh/ - single-use refresh token rotation
pub async fn refresh(
    State(state): State<AppState>,
    Json(req): Json<RefreshRequest>,
) -> Result<Json<TokenPair>, AppError> {
    let rotated =
        refresh_tokens::rotate(&state.pool, req.refresh.trim(), state.config.refresh_token_days)
            .await?;
    let Some((user_id, refresh)) = rotated else {
        security_log!(WARN, "refresh_rejected");
        return Err(AppError::new(ErrorCode::RefreshTokenInvalid));
    };

    let user = users::find_by_id(&state.pool, user_id)
        .await?
        .filter(|u| u.is_active)
        .ok_or_else(|| AppError::new(ErrorCode::AccountDisabled))?;

    let access = state.jwt.generate_token(&user)?;
    Ok(Json(TokenPair { access, refresh }))
}

/// POST /logout/ - revoke the given refresh token
pub async fn logout(
    State(state): State<AppState>,
    user: CurrentUser,
    Json(req): Json<RefreshRequest>,
) -> Result<ApiResponse<()>, AppError> {
    if !refresh_tokens::revoke(&state.pool, req.refresh.trim(), user.id).await? {
        return Err(AppError::new(ErrorCode::RefreshTokenInvalid));
    }
    tracing::info!(user_id = user.id, "Logged out");
    Ok(ApiResponse::<()>::message("Logout successful"))
}

/// POST /change_password/
pub async fn change_password(
    State(state): State<AppState>,
    user: CurrentUser,
    Json(req): Json<ChangePasswordRequest>,
) -> Result<ApiResponse<()>, AppError> {
    let hash = users::password_hash(&state.pool, user.id).await?;
    if !check_password(req.current_password, hash).await? {
        security_log!(WARN, "password_change_failed", user_id = user.id);
        return Err(AppError::with_message(
            ErrorCode::InvalidCredentials,
            "Current password is incorrect",
        ));
    }

    let new_hash = hash_new_password(&req.new_password)?;
    users::set_password(&state.pool, user.id, &new_hash).await?;
    refresh_tokens::revoke_all(&state.pool, user.id).await?;

    security_log!(INFO, "password_changed", user_id = user.id);
    Ok(ApiResponse::<()>::message("Password changed successfully"))
}
