//! Voucher lifecycle workflows: approve/reject, redeem, listings
//!
//! Each workflow runs in one transaction with the voucher row locked
//! (`FOR UPDATE`) before any rule is evaluated.

use serde::Deserialize;
use shared::error::{AppError, ErrorCode};
use shared::models::{QuotaStatus, RedeemReportRow, Voucher, VoucherListRow, VoucherRedeem};
use shared::util::now_millis;
use sqlx::PgPool;

use crate::db::limits;
use crate::error::{ServiceResult, unique_or};
use crate::lifecycle::{self, PhotoDecision, PhotoFlags, RedeemCandidate};

const VOUCHER_COLUMNS: &str = "id, code, retailer_id, project_id, is_approved, approved_at, \
     is_rejected, rejected_at, redeemed, redeemed_at, created_at, expired_at";

/// Result of an approve/reject decision
#[derive(Debug, Clone, serde::Serialize)]
pub struct DecisionOutcome {
    pub retailer_id: i64,
    pub voucher_id: i64,
    pub voucher_code: String,
    pub decision: &'static str,
    /// Counter state after consumption (approval under a counted project)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub quota: Option<QuotaStatus>,
}

#[derive(sqlx::FromRow)]
struct LockedVoucher {
    id: i64,
    code: String,
    project_id: Option<i64>,
    is_approved: bool,
    is_rejected: bool,
}

/// Approve or reject a retailer's registration.
///
/// Approval consumes one unit of the project's quota in the same
/// transaction; a full counter rolls the whole decision back.
pub async fn decide(
    pool: &PgPool,
    retailer_id: i64,
    decision: PhotoDecision,
) -> ServiceResult<DecisionOutcome> {
    let mut tx = pool.begin().await?;

    let retailer_exists: bool =
        sqlx::query_scalar("SELECT EXISTS(SELECT 1 FROM retailers WHERE id = $1)")
            .bind(retailer_id)
            .fetch_one(&mut *tx)
            .await?;
    if !retailer_exists {
        return Err(AppError::new(ErrorCode::RetailerNotFound)
            .with_detail("retailer_id", retailer_id)
            .into());
    }

    let voucher: Option<LockedVoucher> = sqlx::query_as(
        r#"
        SELECT id, code, project_id, is_approved, is_rejected
        FROM vouchers
        WHERE retailer_id = $1
        ORDER BY created_at DESC, id DESC
        LIMIT 1
        FOR UPDATE
        "#,
    )
    .bind(retailer_id)
    .fetch_optional(&mut *tx)
    .await?;
    let voucher = voucher.ok_or_else(|| {
        AppError::new(ErrorCode::VoucherNotFound).with_detail("retailer_id", retailer_id)
    })?;

    let photo_count: i64 =
        sqlx::query_scalar("SELECT COUNT(*) FROM retailer_photos WHERE retailer_id = $1")
            .bind(retailer_id)
            .fetch_one(&mut *tx)
            .await?;

    lifecycle::check_decidable(voucher.is_approved, voucher.is_rejected, photo_count)?;

    let now = now_millis();
    let quota = match decision {
        PhotoDecision::Approve => {
            let quota = match voucher.project_id {
                Some(project_id) => limits::consume_for_project(&mut tx, project_id, 1).await?,
                None => None,
            };
            sqlx::query("UPDATE vouchers SET is_approved = TRUE, approved_at = $1 WHERE id = $2")
                .bind(now)
                .bind(voucher.id)
                .execute(&mut *tx)
                .await?;
            sqlx::query(
                r#"
                UPDATE retailer_photos
                SET is_verified = TRUE, is_approved = TRUE, is_rejected = FALSE,
                    verified_at = $1, approved_at = $1
                WHERE retailer_id = $2
                "#,
            )
            .bind(now)
            .bind(retailer_id)
            .execute(&mut *tx)
            .await?;
            quota
        }
        PhotoDecision::Reject => {
            sqlx::query("UPDATE vouchers SET is_rejected = TRUE, rejected_at = $1 WHERE id = $2")
                .bind(now)
                .bind(voucher.id)
                .execute(&mut *tx)
                .await?;
            sqlx::query(
                r#"
                UPDATE retailer_photos
                SET is_verified = TRUE, is_approved = FALSE, is_rejected = TRUE,
                    verified_at = $1, rejected_at = $1
                WHERE retailer_id = $2
                "#,
            )
            .bind(now)
            .bind(retailer_id)
            .execute(&mut *tx)
            .await?;
            None
        }
    };

    tx.commit().await?;

    Ok(DecisionOutcome {
        retailer_id,
        voucher_id: voucher.id,
        voucher_code: voucher.code,
        decision: decision.as_str(),
        quota,
    })
}

#[derive(sqlx::FromRow)]
struct RedeemRow {
    id: i64,
    redeemed: bool,
    is_approved: bool,
    is_rejected: bool,
    expired_at: Option<i64>,
    retailer_id: i64,
    retailer_wholesale_id: Option<i64>,
}

/// Redeem a voucher for `wholesale_id`
pub async fn redeem(pool: &PgPool, code: &str, wholesale_id: i64) -> ServiceResult<VoucherRedeem> {
    let mut tx = pool.begin().await?;

    let row: Option<RedeemRow> = sqlx::query_as(
        r#"
        SELECT v.id, v.redeemed, v.is_approved, v.is_rejected, v.expired_at,
               v.retailer_id, r.wholesale_id AS retailer_wholesale_id
        FROM vouchers v
        JOIN retailers r ON r.id = v.retailer_id
        WHERE v.code = $1
        FOR UPDATE OF v
        "#,
    )
    .bind(code)
    .fetch_optional(&mut *tx)
    .await?;
    let row = row.ok_or_else(|| {
        AppError::with_message(ErrorCode::VoucherInvalid, "Voucher code not found")
            .with_detail("voucher_code", code)
    })?;

    let photos: Vec<(bool, bool, bool)> = sqlx::query_as(
        "SELECT is_verified, is_approved, is_rejected FROM retailer_photos WHERE retailer_id = $1",
    )
    .bind(row.retailer_id)
    .fetch_all(&mut *tx)
    .await?;
    let photos: Vec<PhotoFlags> = photos
        .into_iter()
        .map(|(is_verified, is_approved, is_rejected)| PhotoFlags {
            is_verified,
            is_approved,
            is_rejected,
        })
        .collect();

    let now = now_millis();
    let candidate = RedeemCandidate {
        redeemed: row.redeemed,
        is_approved: row.is_approved,
        is_rejected: row.is_rejected,
        expired_at: row.expired_at,
        retailer_wholesale_id: row.retailer_wholesale_id,
    };
    lifecycle::check_redeemable(&candidate, &photos, wholesale_id, now)?;

    sqlx::query("UPDATE vouchers SET redeemed = TRUE, redeemed_at = $1 WHERE id = $2")
        .bind(now)
        .bind(row.id)
        .execute(&mut *tx)
        .await?;

    let redeem: VoucherRedeem = sqlx::query_as(
        r#"
        INSERT INTO voucher_redeems (voucher_id, wholesale_id, redeemed_at)
        VALUES ($1, $2, $3)
        RETURNING id, voucher_id, wholesale_id, redeemed_at
        "#,
    )
    .bind(row.id)
    .bind(wholesale_id)
    .bind(now)
    .fetch_one(&mut *tx)
    .await
    .map_err(|e| unique_or(e, AppError::new(ErrorCode::VoucherInvalid)))?;

    tx.commit().await?;

    Ok(redeem)
}

pub async fn find_by_code(pool: &PgPool, code: &str) -> ServiceResult<Option<Voucher>> {
    let row = sqlx::query_as(&format!("SELECT {VOUCHER_COLUMNS} FROM vouchers WHERE code = $1"))
        .bind(code)
        .fetch_optional(pool)
        .await?;
    Ok(row)
}

/// `list_vouchers` filters; absent fields do not filter
#[derive(Debug, Clone, Default, Deserialize)]
pub struct VoucherFilter {
    pub retailer_id: Option<i64>,
    pub ws_id: Option<i64>,
    pub voucher_code: Option<String>,
    pub redeemed: Option<bool>,
}

pub async fn list(pool: &PgPool, filter: &VoucherFilter) -> ServiceResult<Vec<VoucherListRow>> {
    let rows = sqlx::query_as(
        r#"
        SELECT v.id, v.code, v.retailer_id, r.name AS retailer_name, r.phone_number AS retailer_phone,
               r.wholesale_id, w.name AS wholesale_name, v.project_id,
               v.is_approved, v.is_rejected, v.redeemed, v.redeemed_at, v.created_at, v.expired_at
        FROM vouchers v
        JOIN retailers r ON r.id = v.retailer_id
        LEFT JOIN wholesales w ON w.id = r.wholesale_id
        WHERE ($1::BIGINT IS NULL OR v.retailer_id = $1)
          AND ($2::BIGINT IS NULL OR r.wholesale_id = $2)
          AND ($3::TEXT IS NULL OR v.code = $3)
          AND ($4::BOOLEAN IS NULL OR v.redeemed = $4)
        ORDER BY v.created_at DESC, v.id DESC
        "#,
    )
    .bind(filter.retailer_id)
    .bind(filter.ws_id)
    .bind(filter.voucher_code.as_deref())
    .bind(filter.redeemed)
    .fetch_all(pool)
    .await?;
    Ok(rows)
}

/// Redemptions, optionally for one wholesaler
pub async fn redeem_report(pool: &PgPool, ws_id: Option<i64>) -> ServiceResult<Vec<RedeemReportRow>> {
    let rows = sqlx::query_as(
        r#"
        SELECT vr.id AS redeem_id, v.code AS voucher_code,
               r.name AS retailer_name, r.phone_number AS retailer_phone,
               vr.wholesale_id, w.name AS wholesale_name, vr.redeemed_at
        FROM voucher_redeems vr
        JOIN vouchers v ON v.id = vr.voucher_id
        JOIN retailers r ON r.id = v.retailer_id
        JOIN wholesales w ON w.id = vr.wholesale_id
        WHERE ($1::BIGINT IS NULL OR vr.wholesale_id = $1)
        ORDER BY vr.redeemed_at DESC, vr.id DESC
        "#,
    )
    .bind(ws_id)
    .fetch_all(pool)
    .await?;
    Ok(rows)
}
