//! Voucher quota counters
//!
//! `current_count` only moves through [`try_increment`], a single
//! conditional `UPDATE`, so concurrent callers can never push a counter
//! past its limit. The table CHECK constraint backs this up.

use shared::error::{AppError, ErrorCode};
use shared::models::{
    LimitSummary, QuotaStatus, VoucherLimit, VoucherLimitCreate, VoucherLimitUpdate, percentage,
};
use shared::util::now_millis;
use sqlx::{PgConnection, PgPool};

use crate::error::ServiceResult;
use crate::lifecycle;
use crate::util::{MAX_TEXT_LEN, validate_optional_text};

const LIMIT_COLUMNS: &str =
    r#"id, description, "limit", current_count, voucher_project_id, created_at, updated_at"#;

fn not_found(id: i64) -> AppError {
    AppError::new(ErrorCode::LimitNotFound).with_detail("limit_id", id)
}

async fn ensure_project(conn: &mut PgConnection, project_id: Option<i64>) -> ServiceResult<()> {
    let Some(id) = project_id else {
        return Ok(());
    };
    let exists: bool =
        sqlx::query_scalar("SELECT EXISTS(SELECT 1 FROM voucher_projects WHERE id = $1)")
            .bind(id)
            .fetch_one(&mut *conn)
            .await?;
    if !exists {
        return Err(AppError::new(ErrorCode::ProjectNotFound)
            .with_detail("project_id", id)
            .into());
    }
    Ok(())
}

// ── CRUD ──

pub async fn list(pool: &PgPool) -> ServiceResult<Vec<VoucherLimit>> {
    let rows = sqlx::query_as(&format!("SELECT {LIMIT_COLUMNS} FROM voucher_limits ORDER BY id"))
        .fetch_all(pool)
        .await?;
    Ok(rows)
}

pub async fn by_project(pool: &PgPool, project_id: i64) -> ServiceResult<Vec<VoucherLimit>> {
    let rows = sqlx::query_as(&format!(
        "SELECT {LIMIT_COLUMNS} FROM voucher_limits WHERE voucher_project_id = $1 ORDER BY id"
    ))
    .bind(project_id)
    .fetch_all(pool)
    .await?;
    Ok(rows)
}

pub async fn get(pool: &PgPool, id: i64) -> ServiceResult<VoucherLimit> {
    let row: Option<VoucherLimit> =
        sqlx::query_as(&format!("SELECT {LIMIT_COLUMNS} FROM voucher_limits WHERE id = $1"))
            .bind(id)
            .fetch_optional(pool)
            .await?;
    row.ok_or_else(|| not_found(id).into())
}

pub async fn create(pool: &PgPool, data: &VoucherLimitCreate) -> ServiceResult<VoucherLimit> {
    let current_count = data.current_count.unwrap_or(0);
    lifecycle::check_limit_values(data.limit, current_count)?;
    validate_optional_text(data.description.as_deref(), "description", MAX_TEXT_LEN)?;

    let mut conn = pool.acquire().await?;
    ensure_project(&mut conn, data.voucher_project_id).await?;

    let now = now_millis();
    let row: VoucherLimit = sqlx::query_as(&format!(
        r#"
        INSERT INTO voucher_limits (description, "limit", current_count, voucher_project_id, created_at, updated_at)
        VALUES ($1, $2, $3, $4, $5, $5)
        RETURNING {LIMIT_COLUMNS}
        "#
    ))
    .bind(&data.description)
    .bind(data.limit)
    .bind(current_count)
    .bind(data.voucher_project_id)
    .bind(now)
    .fetch_one(&mut *conn)
    .await?;

    tracing::info!(limit_id = row.id, limit = row.limit, "Voucher limit created");
    Ok(row)
}

pub async fn update(pool: &PgPool, id: i64, data: &VoucherLimitUpdate) -> ServiceResult<VoucherLimit> {
    validate_optional_text(data.description.as_deref(), "description", MAX_TEXT_LEN)?;

    let mut tx = pool.begin().await?;
    let current: Option<VoucherLimit> = sqlx::query_as(&format!(
        "SELECT {LIMIT_COLUMNS} FROM voucher_limits WHERE id = $1 FOR UPDATE"
    ))
    .bind(id)
    .fetch_optional(&mut *tx)
    .await?;
    let current = current.ok_or_else(|| not_found(id))?;

    let limit = data.limit.unwrap_or(current.limit);
    let current_count = data.current_count.unwrap_or(current.current_count);
    lifecycle::check_limit_values(limit, current_count)?;
    ensure_project(&mut tx, data.voucher_project_id).await?;

    let row: VoucherLimit = sqlx::query_as(&format!(
        r#"
        UPDATE voucher_limits SET
            description = COALESCE($1, description),
            "limit" = $2,
            current_count = $3,
            voucher_project_id = COALESCE($4, voucher_project_id),
            updated_at = $5
        WHERE id = $6
        RETURNING {LIMIT_COLUMNS}
        "#
    ))
    .bind(&data.description)
    .bind(limit)
    .bind(current_count)
    .bind(data.voucher_project_id)
    .bind(now_millis())
    .bind(id)
    .fetch_one(&mut *tx)
    .await?;
    tx.commit().await?;
    Ok(row)
}

pub async fn delete(pool: &PgPool, id: i64) -> ServiceResult<()> {
    let rows = sqlx::query("DELETE FROM voucher_limits WHERE id = $1")
        .bind(id)
        .execute(pool)
        .await?;
    if rows.rows_affected() == 0 {
        return Err(not_found(id).into());
    }
    Ok(())
}

// ── Quota ──

/// Atomically add `by` to counter `id` if it stays within the limit.
///
/// Returns the new status, or `QuotaExceeded` with the unchanged figures.
pub async fn try_increment(conn: &mut PgConnection, id: i64, by: i32) -> ServiceResult<QuotaStatus> {
    if by < 1 {
        return Err(AppError::with_message(ErrorCode::ValueOutOfRange, "by must be at least 1").into());
    }

    let updated: Option<(i32, i32)> = sqlx::query_as(
        r#"
        UPDATE voucher_limits
        SET current_count = current_count + $2, updated_at = $3
        WHERE id = $1 AND current_count + $2 <= "limit"
        RETURNING "limit", current_count
        "#,
    )
    .bind(id)
    .bind(by)
    .bind(now_millis())
    .fetch_optional(&mut *conn)
    .await?;

    if let Some((limit, current_count)) = updated {
        return Ok(QuotaStatus::new(id, limit, current_count));
    }

    // Refused: report the unchanged counter, or not found
    let current: Option<(i32, i32)> =
        sqlx::query_as(r#"SELECT "limit", current_count FROM voucher_limits WHERE id = $1"#)
            .bind(id)
            .fetch_optional(&mut *conn)
            .await?;
    match current {
        Some((limit, current_count)) => {
            tracing::info!(limit_id = id, limit, current_count, by, "Quota refused");
            Err(AppError::quota_exceeded(current_count, limit)
                .with_detail("limit_id", id)
                .into())
        }
        None => Err(not_found(id).into()),
    }
}

/// Increment endpoint
pub async fn increment(pool: &PgPool, id: i64, by: i32) -> ServiceResult<QuotaStatus> {
    let mut conn = pool.acquire().await?;
    try_increment(&mut conn, id, by).await
}

/// Consume quota from the project's counter (the lowest-id one).
///
/// Returns `None` when the project has no counter: approval is then
/// unbounded.
pub async fn consume_for_project(
    conn: &mut PgConnection,
    project_id: i64,
    by: i32,
) -> ServiceResult<Option<QuotaStatus>> {
    let counter_id: Option<i64> = sqlx::query_scalar(
        "SELECT id FROM voucher_limits WHERE voucher_project_id = $1 ORDER BY id LIMIT 1",
    )
    .bind(project_id)
    .fetch_optional(&mut *conn)
    .await?;

    match counter_id {
        Some(id) => try_increment(conn, id, by).await.map(Some),
        None => Ok(None),
    }
}

/// Counter status by counter id, or by project (its first counter)
pub async fn current(pool: &PgPool, id: Option<i64>, project_id: Option<i64>) -> ServiceResult<QuotaStatus> {
    let row: Option<VoucherLimit> = match (id, project_id) {
        (Some(id), _) => Some(get(pool, id).await?),
        (None, Some(project_id)) => sqlx::query_as(&format!(
            "SELECT {LIMIT_COLUMNS} FROM voucher_limits WHERE voucher_project_id = $1 ORDER BY id LIMIT 1"
        ))
        .bind(project_id)
        .fetch_optional(pool)
        .await?,
        (None, None) => return Err(AppError::required("id or project_id").into()),
    };
    let row = row.ok_or_else(|| {
        AppError::with_message(ErrorCode::LimitNotFound, "No voucher limit for this project")
            .with_detail("project_id", project_id)
    })?;
    Ok(row.status())
}

#[derive(sqlx::FromRow)]
struct SummaryRow {
    total_projects: i64,
    active_projects: i64,
    limits_count: i64,
    total_allocated: i64,
    total_used: i64,
}

/// Totals across all counters and projects
pub async fn summary(pool: &PgPool) -> ServiceResult<LimitSummary> {
    let row: SummaryRow = sqlx::query_as(
        r#"
        SELECT
            (SELECT COUNT(*) FROM voucher_projects) AS total_projects,
            (SELECT COUNT(*) FROM voucher_projects WHERE is_active) AS active_projects,
            COUNT(l.id) AS limits_count,
            COALESCE(SUM(l."limit"), 0)::BIGINT AS total_allocated,
            COALESCE(SUM(l.current_count), 0)::BIGINT AS total_used
        FROM voucher_limits l
        "#,
    )
    .fetch_one(pool)
    .await?;

    Ok(LimitSummary {
        total_projects: row.total_projects,
        active_projects: row.active_projects,
        inactive_projects: row.total_projects - row.active_projects,
        limits_count: row.limits_count,
        total_allocated: row.total_allocated,
        total_used: row.total_used,
        total_remaining: (row.total_allocated - row.total_used).max(0),
        usage_percentage: percentage(row.total_used, row.total_allocated),
    })
}
