//! User accounts

use shared::error::{AppError, ErrorCode};
use shared::models::{User, UserCreate, UserProfile, UserUpdate};
use shared::util::now_millis;
use sqlx::PgPool;

use crate::error::{ServiceResult, unique_or};

const USER_COLUMNS: &str =
    "id, username, email, is_active, is_staff, wholesale_id, created_at, updated_at";

#[derive(sqlx::FromRow)]
struct UserAuthRow {
    #[sqlx(flatten)]
    user: User,
    password_hash: String,
}

/// Look up a user with its password hash for login
pub async fn find_for_login(pool: &PgPool, username: &str) -> ServiceResult<Option<(User, String)>> {
    let row: Option<UserAuthRow> = sqlx::query_as(&format!(
        "SELECT {USER_COLUMNS}, password_hash FROM users WHERE username = $1"
    ))
    .bind(username)
    .fetch_optional(pool)
    .await?;
    Ok(row.map(|r| (r.user, r.password_hash)))
}

pub async fn password_hash(pool: &PgPool, id: i64) -> ServiceResult<String> {
    let hash: Option<String> = sqlx::query_scalar("SELECT password_hash FROM users WHERE id = $1")
        .bind(id)
        .fetch_optional(pool)
        .await?;
    hash.ok_or_else(|| AppError::new(ErrorCode::UserNotFound).into())
}

pub async fn find_by_id(pool: &PgPool, id: i64) -> ServiceResult<Option<User>> {
    let user = sqlx::query_as(&format!("SELECT {USER_COLUMNS} FROM users WHERE id = $1"))
        .bind(id)
        .fetch_optional(pool)
        .await?;
    Ok(user)
}

/// User with the name and phone of the linked wholesaler
pub async fn profile(pool: &PgPool, id: i64) -> ServiceResult<UserProfile> {
    let profile: Option<UserProfile> = sqlx::query_as(
        r#"
        SELECT u.id, u.username, u.email, u.is_active, u.is_staff, u.wholesale_id,
               w.name AS wholesale_name, w.phone_number AS wholesale_phone_number
        FROM users u
        LEFT JOIN wholesales w ON w.id = u.wholesale_id
        WHERE u.id = $1
        "#,
    )
    .bind(id)
    .fetch_optional(pool)
    .await?;
    profile.ok_or_else(|| AppError::new(ErrorCode::UserNotFound).into())
}

pub async fn list(pool: &PgPool) -> ServiceResult<Vec<User>> {
    let users = sqlx::query_as(&format!("SELECT {USER_COLUMNS} FROM users ORDER BY id"))
        .fetch_all(pool)
        .await?;
    Ok(users)
}

pub async fn count(pool: &PgPool) -> ServiceResult<i64> {
    let n: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM users")
        .fetch_one(pool)
        .await?;
    Ok(n)
}

async fn ensure_wholesale(pool: &PgPool, wholesale_id: Option<i64>) -> ServiceResult<()> {
    let Some(id) = wholesale_id else {
        return Ok(());
    };
    let exists: bool = sqlx::query_scalar("SELECT EXISTS(SELECT 1 FROM wholesales WHERE id = $1)")
        .bind(id)
        .fetch_one(pool)
        .await?;
    if !exists {
        return Err(AppError::new(ErrorCode::WholesaleNotFound)
            .with_detail("wholesale_id", id)
            .into());
    }
    Ok(())
}

/// Create a user; `password_hash` is already hashed
pub async fn create(pool: &PgPool, data: &UserCreate, password_hash: &str) -> ServiceResult<User> {
    ensure_wholesale(pool, data.wholesale_id).await?;
    let now = now_millis();
    sqlx::query_as(&format!(
        r#"
        INSERT INTO users (username, email, password_hash, is_active, is_staff, wholesale_id, created_at, updated_at)
        VALUES ($1, $2, $3, TRUE, $4, $5, $6, $6)
        RETURNING {USER_COLUMNS}
        "#
    ))
    .bind(data.username.trim())
    .bind(&data.email)
    .bind(password_hash)
    .bind(data.is_staff.unwrap_or(false))
    .bind(data.wholesale_id)
    .bind(now)
    .fetch_one(pool)
    .await
    .map_err(|e| unique_or(e, AppError::new(ErrorCode::UsernameExists)))
}

pub async fn update(
    pool: &PgPool,
    id: i64,
    data: &UserUpdate,
    password_hash: Option<&str>,
) -> ServiceResult<User> {
    ensure_wholesale(pool, data.wholesale_id).await?;
    let user: Option<User> = sqlx::query_as(&format!(
        r#"
        UPDATE users SET
            email = COALESCE($1, email),
            password_hash = COALESCE($2, password_hash),
            is_active = COALESCE($3, is_active),
            is_staff = COALESCE($4, is_staff),
            wholesale_id = COALESCE($5, wholesale_id),
            updated_at = $6
        WHERE id = $7
        RETURNING {USER_COLUMNS}
        "#
    ))
    .bind(&data.email)
    .bind(password_hash)
    .bind(data.is_active)
    .bind(data.is_staff)
    .bind(data.wholesale_id)
    .bind(now_millis())
    .bind(id)
    .fetch_optional(pool)
    .await?;
    user.ok_or_else(|| AppError::new(ErrorCode::UserNotFound).into())
}

pub async fn set_password(pool: &PgPool, id: i64, password_hash: &str) -> ServiceResult<()> {
    let rows = sqlx::query("UPDATE users SET password_hash = $1, updated_at = $2 WHERE id = $3")
        .bind(password_hash)
        .bind(now_millis())
        .bind(id)
        .execute(pool)
        .await?;
    if rows.rows_affected() == 0 {
        return Err(AppError::new(ErrorCode::UserNotFound).into());
    }
    Ok(())
}

pub async fn delete(pool: &PgPool, id: i64) -> ServiceResult<()> {
    let rows = sqlx::query("DELETE FROM users WHERE id = $1")
        .bind(id)
        .execute(pool)
        .await?;
    if rows.rows_affected() == 0 {
        return Err(AppError::new(ErrorCode::UserNotFound).into());
    }
    Ok(())
}

/// Create the bootstrap staff account when the table is empty.
///
/// Returns `true` if an account was created.
pub async fn seed_admin(
    pool: &PgPool,
    username: &str,
    email: Option<&str>,
    password_hash: &str,
) -> ServiceResult<bool> {
    if count(pool).await? > 0 {
        return Ok(false);
    }
    let now = now_millis();
    let inserted = sqlx::query(
        r#"
        INSERT INTO users (username, email, password_hash, is_active, is_staff, created_at, updated_at)
        VALUES ($1, $2, $3, TRUE, TRUE, $4, $4)
        ON CONFLICT (username) DO NOTHING
        "#,
    )
    .bind(username)
    .bind(email)
    .bind(password_hash)
    .bind(now)
    .execute(pool)
    .await?;
    Ok(inserted.rows_affected() == 1)
}
