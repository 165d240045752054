//! Refresh token storage

use shared::util::now_millis;
use sqlx::PgPool;

use crate::error::ServiceResult;

const DAY_MS: i64 = 24 * 60 * 60 * 1000;

/// Issue a new refresh token for `user_id`
pub async fn create(pool: &PgPool, user_id: i64, ttl_days: i64) -> ServiceResult<String> {
    let token_id = uuid::Uuid::new_v4().to_string();
    let now = now_millis();

    sqlx::query(
        "INSERT INTO refresh_tokens (id, user_id, expires_at, revoked, created_at) VALUES ($1, $2, $3, FALSE, $4)",
    )
    .bind(&token_id)
    .bind(user_id)
    .bind(now + ttl_days * DAY_MS)
    .bind(now)
    .execute(pool)
    .await?;

    Ok(token_id)
}

/// Consume a refresh token and issue its replacement.
///
/// Returns `(user_id, new_token)`, or `None` when the token is unknown,
/// revoked or expired. The revoke is a single conditional update so a token
/// can only be rotated once.
pub async fn rotate(
    pool: &PgPool,
    refresh_token: &str,
    ttl_days: i64,
) -> ServiceResult<Option<(i64, String)>> {
    let user_id: Option<i64> = sqlx::query_scalar(
        "UPDATE refresh_tokens SET revoked = TRUE WHERE id = $1 AND NOT revoked AND expires_at > $2 RETURNING user_id",
    )
    .bind(refresh_token)
    .bind(now_millis())
    .fetch_optional(pool)
    .await?;

    let Some(user_id) = user_id else {
        return Ok(None);
    };
    let new_token = create(pool, user_id, ttl_days).await?;
    Ok(Some((user_id, new_token)))
}

/// Revoke one of `user_id`'s tokens (logout). Returns whether a live token was revoked.
pub async fn revoke(pool: &PgPool, refresh_token: &str, user_id: i64) -> ServiceResult<bool> {
    let rows = sqlx::query(
        "UPDATE refresh_tokens SET revoked = TRUE WHERE id = $1 AND user_id = $2 AND NOT revoked",
    )
    .bind(refresh_token)
    .bind(user_id)
    .execute(pool)
    .await?;
    Ok(rows.rows_affected() > 0)
}

/// Revoke every token of a user (password change, account removal)
pub async fn revoke_all(pool: &PgPool, user_id: i64) -> ServiceResult<()> {
    sqlx::query("UPDATE refresh_tokens SET revoked = TRUE WHERE user_id = $1 AND NOT revoked")
        .bind(user_id)
        .execute(pool)
        .await?;
    Ok(())
}

/// Delete revoked and expired tokens; returns the number removed
pub async fn purge_stale(pool: &PgPool) -> ServiceResult<u64> {
    let rows = sqlx::query("DELETE FROM refresh_tokens WHERE revoked OR expires_at <= $1")
        .bind(now_millis())
        .execute(pool)
        .await?;
    Ok(rows.rows_affected())
}
