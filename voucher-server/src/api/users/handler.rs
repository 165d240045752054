//! User API Handlers

use axum::{
    Json,
    extract::{Path, State},
    http::StatusCode,
};
use shared::error::{ApiResponse, AppError, ErrorCode};
use shared::models::{User, UserCreate, UserProfile, UserUpdate};

use crate::auth::CurrentUser;
use crate::db::{refresh_tokens, users};
use crate::security_log;
use crate::state::AppState;
use crate::util::{MAX_SHORT_TEXT_LEN, hash_new_password, validate_optional_text, validate_required_text};

/// GET /user/profile/
pub async fn profile(
    State(state): State<AppState>,
    user: CurrentUser,
) -> Result<Json<UserProfile>, AppError> {
    Ok(Json(users::profile(&state.pool, user.id).await?))
}

/// Only staff may change role, activation or wholesaler on themselves
fn check_own_changes(user: &CurrentUser, changes: &UserUpdate) -> Result<(), AppError> {
    let privileged =
        changes.is_staff.is_some() || changes.is_active.is_some() || changes.wholesale_id.is_some();
    if privileged && !user.is_staff {
        return Err(AppError::with_message(
            ErrorCode::PermissionDenied,
            "Only email and password can be changed on your own account",
        ));
    }
    Ok(())
}

/// PUT /user/updprofile/
pub async fn update_profile(
    State(state): State<AppState>,
    user: CurrentUser,
    Json(payload): Json<UserUpdate>,
) -> Result<Json<User>, AppError> {
    check_own_changes(&user, &payload)?;
    validate_optional_text(payload.email.as_deref(), "email", 254)?;
    let hash = payload.password.as_deref().map(hash_new_password).transpose()?;

    let updated = users::update(&state.pool, user.id, &payload, hash.as_deref()).await?;
    if hash.is_some() || payload.is_active == Some(false) {
        refresh_tokens::revoke_all(&state.pool, user.id).await?;
    }
    tracing::info!(user_id = user.id, "Profile updated");
    Ok(Json(updated))
}

/// DELETE /user/delprofile/
pub async fn delete_profile(
    State(state): State<AppState>,
    user: CurrentUser,
) -> Result<ApiResponse<()>, AppError> {
    refresh_tokens::revoke_all(&state.pool, user.id).await?;
    users::delete(&state.pool, user.id).await?;
    security_log!(INFO, "account_self_deleted", user_id = user.id, username = %user.username);
    Ok(ApiResponse::<()>::message("Profile deleted successfully"))
}

/// GET /user/
pub async fn list(State(state): State<AppState>) -> Result<Json<Vec<User>>, AppError> {
    Ok(Json(users::list(&state.pool).await?))
}

/// POST /user/register/
pub async fn register(
    State(state): State<AppState>,
    Json(payload): Json<UserCreate>,
) -> Result<(StatusCode, Json<User>), AppError> {
    validate_required_text(&payload.username, "username", MAX_SHORT_TEXT_LEN)?;
    validate_optional_text(payload.email.as_deref(), "email", 254)?;
    let hash = hash_new_password(&payload.password)?;

    let user = users::create(&state.pool, &payload, &hash).await?;
    tracing::info!(user_id = user.id, username = %user.username, "User created");
    Ok((StatusCode::CREATED, Json(user)))
}

/// PUT /user/update/{id}/
pub async fn update(
    State(state): State<AppState>,
    Path(id): Path<i64>,
    Json(payload): Json<UserUpdate>,
) -> Result<Json<User>, AppError> {
    validate_optional_text(payload.email.as_deref(), "email", 254)?;
    let hash = payload.password.as_deref().map(hash_new_password).transpose()?;

    let user = users::update(&state.pool, id, &payload, hash.as_deref()).await?;
    if hash.is_some() || payload.is_active == Some(false) {
        refresh_tokens::revoke_all(&state.pool, id).await?;
    }
    Ok(Json(user))
}

/// DELETE /user/delete/{id}/
pub async fn delete(
    State(state): State<AppState>,
    current: CurrentUser,
    Path(id): Path<i64>,
) -> Result<ApiResponse<()>, AppError> {
    if current.id == id {
        return Err(AppError::invalid_request("Cannot delete your own account"));
    }
    users::delete(&state.pool, id).await?;
    tracing::info!(user_id = id, deleted_by = current.id, "User deleted");
    Ok(ApiResponse::<()>::message("User deleted successfully"))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn current(is_staff: bool) -> CurrentUser {
        CurrentUser {
            id: 7,
            username: "agent".to_string(),
            is_staff,
            wholesale_id: Some(2),
        }
    }

    #[test]
    fn test_own_changes_limited_for_agents() {
        let email_only = UserUpdate {
            email: Some("agent@example.com".into()),
            ..Default::default()
        };
        assert!(check_own_changes(&current(false), &email_only).is_ok());

        let promote = UserUpdate {
            is_staff: Some(true),
            ..Default::default()
        };
        assert_eq!(
            check_own_changes(&current(false), &promote).unwrap_err().code,
            ErrorCode::PermissionDenied
        );
        let move_wholesaler = UserUpdate {
            wholesale_id: Some(9),
            ..Default::default()
        };
        assert!(check_own_changes(&current(false), &move_wholesaler).is_err());
        assert!(check_own_changes(&current(true), &promote).is_ok());
    }
}
