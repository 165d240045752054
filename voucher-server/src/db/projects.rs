//! Voucher projects (campaigns)

use shared::error::{AppError, ErrorCode};
use shared::models::{ProjectDashboardRow, VoucherProject, VoucherProjectCreate, VoucherProjectUpdate};
use shared::util::now_millis;
use sqlx::PgPool;

use crate::error::ServiceResult;
use crate::time::{day_end_millis, day_start_millis, normalize_period, parse_business_date};
use crate::util::{MAX_NAME_LEN, MAX_TEXT_LEN, validate_optional_text, validate_required_text};

const PROJECT_COLUMNS: &str = "id, name, description, periode_start, periode_end, is_active, \
     created_by, updated_by, created_at, updated_at";

fn not_found(id: i64) -> AppError {
    AppError::new(ErrorCode::ProjectNotFound).with_detail("project_id", id)
}

pub async fn list(pool: &PgPool) -> ServiceResult<Vec<VoucherProject>> {
    let rows = sqlx::query_as(&format!(
        "SELECT {PROJECT_COLUMNS} FROM voucher_projects ORDER BY periode_start DESC, id DESC"
    ))
    .fetch_all(pool)
    .await?;
    Ok(rows)
}

pub async fn active(pool: &PgPool) -> ServiceResult<Vec<VoucherProject>> {
    let rows = sqlx::query_as(&format!(
        "SELECT {PROJECT_COLUMNS} FROM voucher_projects WHERE is_active ORDER BY periode_start DESC, id DESC"
    ))
    .fetch_all(pool)
    .await?;
    Ok(rows)
}

pub async fn get(pool: &PgPool, id: i64) -> ServiceResult<VoucherProject> {
    let row: Option<VoucherProject> =
        sqlx::query_as(&format!("SELECT {PROJECT_COLUMNS} FROM voucher_projects WHERE id = $1"))
            .bind(id)
            .fetch_optional(pool)
            .await?;
    row.ok_or_else(|| not_found(id).into())
}

pub async fn create(pool: &PgPool, data: &VoucherProjectCreate, username: &str) -> ServiceResult<VoucherProject> {
    validate_required_text(&data.name, "name", MAX_NAME_LEN)?;
    validate_optional_text(data.description.as_deref(), "description", MAX_TEXT_LEN)?;
    let (start, end) = normalize_period(&data.periode_start, &data.periode_end)?;

    let now = now_millis();
    let row: VoucherProject = sqlx::query_as(&format!(
        r#"
        INSERT INTO voucher_projects
            (name, description, periode_start, periode_end, is_active, created_by, updated_by, created_at, updated_at)
        VALUES ($1, $2, $3, $4, $5, $6, $6, $7, $7)
        RETURNING {PROJECT_COLUMNS}
        "#
    ))
    .bind(data.name.trim())
    .bind(&data.description)
    .bind(start)
    .bind(end)
    .bind(data.is_active.unwrap_or(true))
    .bind(username)
    .bind(now)
    .fetch_one(pool)
    .await?;

    tracing::info!(project_id = row.id, name = %row.name, "Voucher project created");
    Ok(row)
}

/// Update a project. A new `periode_end` is pushed to every unredeemed
/// voucher of the project in the same transaction.
pub async fn update(
    pool: &PgPool,
    id: i64,
    data: &VoucherProjectUpdate,
    username: &str,
) -> ServiceResult<VoucherProject> {
    if let Some(name) = &data.name {
        validate_required_text(name, "name", MAX_NAME_LEN)?;
    }
    validate_optional_text(data.description.as_deref(), "description", MAX_TEXT_LEN)?;

    let mut tx = pool.begin().await?;
    let current: Option<VoucherProject> = sqlx::query_as(&format!(
        "SELECT {PROJECT_COLUMNS} FROM voucher_projects WHERE id = $1 FOR UPDATE"
    ))
    .bind(id)
    .fetch_optional(&mut *tx)
    .await?;
    let current = current.ok_or_else(|| not_found(id))?;

    let start = match &data.periode_start {
        Some(s) => day_start_millis(parse_business_date(s)?),
        None => current.periode_start,
    };
    let end = match &data.periode_end {
        Some(s) => day_end_millis(parse_business_date(s)?),
        None => current.periode_end,
    };
    if end < start {
        return Err(AppError::new(ErrorCode::InvalidPeriod).into());
    }

    let row: VoucherProject = sqlx::query_as(&format!(
        r#"
        UPDATE voucher_projects SET
            name = COALESCE($1, name),
            description = COALESCE($2, description),
            periode_start = $3,
            periode_end = $4,
            is_active = COALESCE($5, is_active),
            updated_by = $6,
            updated_at = $7
        WHERE id = $8
        RETURNING {PROJECT_COLUMNS}
        "#
    ))
    .bind(data.name.as_deref().map(str::trim))
    .bind(&data.description)
    .bind(start)
    .bind(end)
    .bind(data.is_active)
    .bind(username)
    .bind(now_millis())
    .bind(id)
    .fetch_one(&mut *tx)
    .await?;

    if end != current.periode_end {
        let moved = sqlx::query("UPDATE vouchers SET expired_at = $1 WHERE project_id = $2 AND NOT redeemed")
            .bind(end)
            .bind(id)
            .execute(&mut *tx)
            .await?;
        tracing::info!(
            project_id = id,
            vouchers = moved.rows_affected(),
            "Voucher expiry moved with project end"
        );
    }

    tx.commit().await?;
    Ok(row)
}

async fn set_active(pool: &PgPool, id: i64, active: Option<bool>, username: &str) -> ServiceResult<VoucherProject> {
    // `None` flips the current value
    let row: Option<VoucherProject> = sqlx::query_as(&format!(
        r#"
        UPDATE voucher_projects SET
            is_active = COALESCE($1, NOT is_active),
            updated_by = $2,
            updated_at = $3
        WHERE id = $4
        RETURNING {PROJECT_COLUMNS}
        "#
    ))
    .bind(active)
    .bind(username)
    .bind(now_millis())
    .bind(id)
    .fetch_optional(pool)
    .await?;
    let row = row.ok_or_else(|| not_found(id))?;
    tracing::info!(project_id = id, is_active = row.is_active, "Voucher project status changed");
    Ok(row)
}

/// Soft delete
pub async fn deactivate(pool: &PgPool, id: i64, username: &str) -> ServiceResult<VoucherProject> {
    set_active(pool, id, Some(false), username).await
}

pub async fn toggle(pool: &PgPool, id: i64, username: &str) -> ServiceResult<VoucherProject> {
    set_active(pool, id, None, username).await
}

/// Voucher counts by stage and quota usage per project
pub async fn dashboard(pool: &PgPool) -> ServiceResult<Vec<ProjectDashboardRow>> {
    let rows = sqlx::query_as(
        r#"
        SELECT p.id AS project_id, p.name AS project_name, p.is_active,
               p.periode_start, p.periode_end,
               COALESCE(v.total, 0) AS total_vouchers,
               COALESCE(v.pending, 0) AS pending_vouchers,
               COALESCE(v.approved, 0) AS approved_vouchers,
               COALESCE(v.rejected, 0) AS rejected_vouchers,
               COALESCE(v.redeemed, 0) AS redeemed_vouchers,
               COALESCE(l.quota_limit, 0) AS quota_limit,
               COALESCE(l.quota_used, 0) AS quota_used
        FROM voucher_projects p
        LEFT JOIN (
            SELECT project_id,
                   COUNT(*) AS total,
                   COUNT(*) FILTER (WHERE NOT is_approved AND NOT is_rejected) AS pending,
                   COUNT(*) FILTER (WHERE is_approved) AS approved,
                   COUNT(*) FILTER (WHERE is_rejected) AS rejected,
                   COUNT(*) FILTER (WHERE redeemed) AS redeemed
            FROM vouchers
            GROUP BY project_id
        ) v ON v.project_id = p.id
        LEFT JOIN (
            SELECT voucher_project_id,
                   SUM("limit")::BIGINT AS quota_limit,
                   SUM(current_count)::BIGINT AS quota_used
            FROM voucher_limits
            GROUP BY voucher_project_id
        ) l ON l.voucher_project_id = p.id
        ORDER BY p.periode_start DESC, p.id DESC
        "#,
    )
    .fetch_all(pool)
    .await?;
    Ok(rows)
}
