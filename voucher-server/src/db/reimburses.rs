//! Reimbursement claims and their status history
//!
//! `reimburse_statuses` is append-only; `reimburses.status_id` always
//! points at the newest row.

use serde::Deserialize;
use shared::error::{AppError, ErrorCode};
use shared::models::{
    Reimburse, ReimburseListEntry, ReimburseStatusEntry, ReimburseStatusKind,
    SubmitReimburseResult,
};
use shared::util::now_millis;
use sqlx::{PgConnection, PgPool};

use crate::db::transactions;
use crate::error::{ServiceError, ServiceResult, unique_or};
use crate::lifecycle;

const REIMBURSE_COLUMNS: &str =
    "id, voucher_id, status_id, reimbursed_by, created_at, completed_at, paid_at";

async fn append_status(
    conn: &mut PgConnection,
    reimburse_id: i64,
    status: ReimburseStatusKind,
    changed_by: &str,
    now: i64,
) -> ServiceResult<i64> {
    let status_id: i64 = sqlx::query_scalar(
        r#"
        INSERT INTO reimburse_statuses (reimburse_id, status, changed_by, created_at)
        VALUES ($1, $2, $3, $4)
        RETURNING id
        "#,
    )
    .bind(reimburse_id)
    .bind(status.as_str())
    .bind(changed_by)
    .bind(now)
    .fetch_one(&mut *conn)
    .await?;

    sqlx::query("UPDATE reimburses SET status_id = $1 WHERE id = $2")
        .bind(status_id)
        .bind(reimburse_id)
        .execute(&mut *conn)
        .await?;
    Ok(status_id)
}

#[derive(sqlx::FromRow)]
struct ClaimCandidate {
    id: i64,
    redeemed: bool,
    has_claim: bool,
}

/// Open a claim for one voucher, in its own transaction
async fn submit_one(pool: &PgPool, code: &str, submitted_by: &str) -> ServiceResult<i64> {
    let mut tx = pool.begin().await?;

    let voucher: Option<ClaimCandidate> = sqlx::query_as(
        r#"
        SELECT v.id, v.redeemed,
               EXISTS(SELECT 1 FROM reimburses rb WHERE rb.voucher_id = v.id) AS has_claim
        FROM vouchers v
        WHERE v.code = $1
        FOR UPDATE
        "#,
    )
    .bind(code)
    .fetch_optional(&mut *tx)
    .await?;
    let voucher = voucher.ok_or_else(|| AppError::new(ErrorCode::VoucherNotFound))?;
    lifecycle::check_reimbursable(voucher.redeemed, voucher.has_claim)?;

    let now = now_millis();
    let reimburse_id: i64 = sqlx::query_scalar(
        "INSERT INTO reimburses (voucher_id, reimbursed_by, created_at) VALUES ($1, $2, $3) RETURNING id",
    )
    .bind(voucher.id)
    .bind(submitted_by)
    .bind(now)
    .fetch_one(&mut *tx)
    .await
    .map_err(|e| unique_or(e, AppError::new(ErrorCode::ReimburseAlreadySubmitted)))?;

    append_status(&mut tx, reimburse_id, ReimburseStatusKind::Waiting, submitted_by, now).await?;
    tx.commit().await?;

    tracing::info!(reimburse_id, voucher_code = %code, "Reimbursement submitted");
    Ok(reimburse_id)
}

/// Submit a batch of voucher codes.
///
/// Each code succeeds or fails on its own; infrastructure errors abort the
/// whole batch.
pub async fn submit(
    pool: &PgPool,
    voucher_codes: &[String],
    submitted_by: &str,
) -> ServiceResult<Vec<SubmitReimburseResult>> {
    if voucher_codes.is_empty() {
        return Err(AppError::with_message(
            ErrorCode::RequiredField,
            "Voucher codes must be provided as a list",
        )
        .with_detail("field", "voucher_codes")
        .into());
    }

    let mut results = Vec::with_capacity(voucher_codes.len());
    for code in voucher_codes {
        let code = code.trim();
        let result = match submit_one(pool, code, submitted_by).await {
            Ok(reimburse_id) => SubmitReimburseResult {
                voucher_code: code.to_string(),
                success: true,
                message: "submitted".to_string(),
                reimburse_id: Some(reimburse_id),
                error_code: None,
            },
            Err(ServiceError::App(err)) => SubmitReimburseResult {
                voucher_code: code.to_string(),
                success: false,
                message: err.message,
                reimburse_id: None,
                error_code: Some(err.code.code()),
            },
            Err(e) => return Err(e),
        };
        results.push(result);
    }
    Ok(results)
}

#[derive(sqlx::FromRow)]
struct LockedClaim {
    #[sqlx(flatten)]
    reimburse: Reimburse,
    status: Option<String>,
}

/// Move a claim forward to `completed` or `paid`
pub async fn update_status(
    pool: &PgPool,
    id: i64,
    raw_status: &str,
    changed_by: &str,
) -> ServiceResult<Reimburse> {
    let next = lifecycle::parse_target_status(raw_status)?;

    let mut tx = pool.begin().await?;
    let claim: Option<LockedClaim> = sqlx::query_as(
        r#"
        SELECT rb.id, rb.voucher_id, rb.status_id, rb.reimbursed_by, rb.created_at,
               rb.completed_at, rb.paid_at, rs.status
        FROM reimburses rb
        LEFT JOIN reimburse_statuses rs ON rs.id = rb.status_id
        WHERE rb.id = $1
        FOR UPDATE OF rb
        "#,
    )
    .bind(id)
    .fetch_optional(&mut *tx)
    .await?;
    let claim = claim.ok_or_else(|| {
        AppError::new(ErrorCode::ReimburseNotFound).with_detail("reimburse_id", id)
    })?;

    let current = claim
        .status
        .as_deref()
        .and_then(|s| s.parse::<ReimburseStatusKind>().ok());
    lifecycle::check_reimburse_transition(current, next)?;

    let now = now_millis();
    append_status(&mut tx, id, next, changed_by, now).await?;

    // Paying a claim that skipped `completed` stamps both
    let row: Reimburse = sqlx::query_as(&format!(
        r#"
        UPDATE reimburses SET
            completed_at = COALESCE(completed_at, $2),
            paid_at = CASE WHEN $3 THEN $2 ELSE paid_at END
        WHERE id = $1
        RETURNING {REIMBURSE_COLUMNS}
        "#
    ))
    .bind(id)
    .bind(now)
    .bind(next == ReimburseStatusKind::Paid)
    .fetch_one(&mut *tx)
    .await?;
    tx.commit().await?;

    tracing::info!(
        reimburse_id = id,
        from = current.map(|s| s.as_str()).unwrap_or("waiting"),
        to = next.as_str(),
        "Reimbursement status changed"
    );
    Ok(row)
}

/// `list_reimburse` filters
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ReimburseFilter {
    pub status: Option<String>,
    pub id: Option<i64>,
    pub voucher_code: Option<String>,
}

#[derive(sqlx::FromRow)]
struct ListRow {
    id: i64,
    voucher_id: i64,
    voucher_code: String,
    status: Option<String>,
    reimbursed_by: Option<String>,
    created_at: i64,
    completed_at: Option<i64>,
    paid_at: Option<i64>,
    retailer_name: String,
    retailer_address: String,
    retailer_kelurahan: Option<String>,
    retailer_kecamatan: Option<String>,
    retailer_kota: Option<String>,
    retailer_provinsi: Option<String>,
}

/// Claims with current status, history, retailer address and transactions
pub async fn list(pool: &PgPool, filter: &ReimburseFilter) -> ServiceResult<Vec<ReimburseListEntry>> {
    let status = filter
        .status
        .as_deref()
        .filter(|s| !s.trim().is_empty())
        .map(|s| {
            s.parse::<ReimburseStatusKind>().map_err(|_| {
                AppError::with_message(ErrorCode::InvalidReimburseStatus, format!("Invalid status '{s}'"))
            })
        })
        .transpose()?;

    let rows: Vec<ListRow> = sqlx::query_as(
        r#"
        SELECT rb.id, rb.voucher_id, v.code AS voucher_code, rs.status, rb.reimbursed_by,
               rb.created_at, rb.completed_at, rb.paid_at,
               r.name AS retailer_name, r.address AS retailer_address,
               r.kelurahan AS retailer_kelurahan, r.kecamatan AS retailer_kecamatan,
               r.kota AS retailer_kota, r.provinsi AS retailer_provinsi
        FROM reimburses rb
        JOIN vouchers v ON v.id = rb.voucher_id
        JOIN retailers r ON r.id = v.retailer_id
        LEFT JOIN reimburse_statuses rs ON rs.id = rb.status_id
        WHERE ($1::TEXT IS NULL OR rs.status = $1)
          AND ($2::BIGINT IS NULL OR rb.id = $2)
          AND ($3::TEXT IS NULL OR v.code = $3)
        ORDER BY rb.created_at DESC, rb.id DESC
        "#,
    )
    .bind(status.map(|s| s.as_str()))
    .bind(filter.id)
    .bind(filter.voucher_code.as_deref())
    .fetch_all(pool)
    .await?;

    if rows.is_empty() {
        return Ok(Vec::new());
    }

    let ids: Vec<i64> = rows.iter().map(|r| r.id).collect();
    let history: Vec<ReimburseStatusEntry> = sqlx::query_as(
        r#"
        SELECT id, reimburse_id, status, changed_by, created_at
        FROM reimburse_statuses
        WHERE reimburse_id = ANY($1)
        ORDER BY created_at, id
        "#,
    )
    .bind(&ids)
    .fetch_all(pool)
    .await?;

    let voucher_ids: Vec<i64> = rows.iter().map(|r| r.voucher_id).collect();
    let mut transactions = transactions::for_vouchers(pool, &voucher_ids).await?;

    Ok(rows
        .into_iter()
        .map(|row| ReimburseListEntry {
            history: history
                .iter()
                .filter(|h| h.reimburse_id == row.id)
                .cloned()
                .collect(),
            transactions: transactions.remove(&row.voucher_id).unwrap_or_default(),
            id: row.id,
            voucher_id: row.voucher_id,
            voucher_code: row.voucher_code,
            status: row.status,
            reimbursed_by: row.reimbursed_by,
            created_at: row.created_at,
            completed_at: row.completed_at,
            paid_at: row.paid_at,
            retailer_name: row.retailer_name,
            retailer_address: row.retailer_address,
            retailer_kelurahan: row.retailer_kelurahan,
            retailer_kecamatan: row.retailer_kecamatan,
            retailer_kota: row.retailer_kota,
            retailer_provinsi: row.retailer_provinsi,
        })
        .collect())
}
