//! Retailer discount terms per project

use rust_decimal::Decimal;
use shared::error::{AppError, ErrorCode};
use shared::models::{
    VoucherRetailerDiscount, VoucherRetailerDiscountCreate, VoucherRetailerDiscountUpdate,
};
use shared::util::now_millis;
use sqlx::PgPool;

use crate::error::ServiceResult;

const DISCOUNT_COLUMNS: &str = "id, discount_amount, discount_percentage, agen_fee, \
     voucher_project_id, created_by, updated_by, created_at, updated_at";

fn not_found(id: i64) -> AppError {
    AppError::new(ErrorCode::DiscountNotFound).with_detail("discount_id", id)
}

/// Amounts are non-negative and the percentage lies in 0..=100
pub fn validate_terms(
    amount: Decimal,
    percentage: Decimal,
    agen_fee: Option<Decimal>,
) -> Result<(), AppError> {
    if amount.is_sign_negative() {
        return Err(AppError::with_message(
            ErrorCode::ValueOutOfRange,
            "discount_amount must not be negative",
        ));
    }
    if percentage.is_sign_negative() || percentage > Decimal::ONE_HUNDRED {
        return Err(AppError::with_message(
            ErrorCode::ValueOutOfRange,
            "discount_percentage must be between 0 and 100",
        ));
    }
    if agen_fee.is_some_and(|f| f.is_sign_negative()) {
        return Err(AppError::with_message(
            ErrorCode::ValueOutOfRange,
            "agen_fee must not be negative",
        ));
    }
    Ok(())
}

pub async fn list(pool: &PgPool) -> ServiceResult<Vec<VoucherRetailerDiscount>> {
    let rows = sqlx::query_as(&format!(
        "SELECT {DISCOUNT_COLUMNS} FROM voucher_retailer_discounts ORDER BY id"
    ))
    .fetch_all(pool)
    .await?;
    Ok(rows)
}

pub async fn by_project(pool: &PgPool, project_id: i64) -> ServiceResult<Vec<VoucherRetailerDiscount>> {
    let rows = sqlx::query_as(&format!(
        "SELECT {DISCOUNT_COLUMNS} FROM voucher_retailer_discounts WHERE voucher_project_id = $1 ORDER BY id"
    ))
    .bind(project_id)
    .fetch_all(pool)
    .await?;
    Ok(rows)
}

/// Discounts of the project a voucher belongs to
pub async fn by_voucher(pool: &PgPool, voucher_code: &str) -> ServiceResult<Vec<VoucherRetailerDiscount>> {
    let project: Option<Option<i64>> =
        sqlx::query_scalar("SELECT project_id FROM vouchers WHERE code = $1")
            .bind(voucher_code)
            .fetch_optional(pool)
            .await?;
    match project {
        None => Err(AppError::new(ErrorCode::VoucherNotFound)
            .with_detail("voucher_code", voucher_code)
            .into()),
        Some(None) => Ok(Vec::new()),
        Some(Some(project_id)) => by_project(pool, project_id).await,
    }
}

pub async fn get(pool: &PgPool, id: i64) -> ServiceResult<VoucherRetailerDiscount> {
    let row: Option<VoucherRetailerDiscount> = sqlx::query_as(&format!(
        "SELECT {DISCOUNT_COLUMNS} FROM voucher_retailer_discounts WHERE id = $1"
    ))
    .bind(id)
    .fetch_optional(pool)
    .await?;
    row.ok_or_else(|| not_found(id).into())
}

async fn ensure_project(pool: &PgPool, project_id: Option<i64>) -> ServiceResult<()> {
    let Some(id) = project_id else {
        return Ok(());
    };
    let exists: bool =
        sqlx::query_scalar("SELECT EXISTS(SELECT 1 FROM voucher_projects WHERE id = $1)")
            .bind(id)
            .fetch_one(pool)
            .await?;
    if !exists {
        return Err(AppError::new(ErrorCode::ProjectNotFound)
            .with_detail("project_id", id)
            .into());
    }
    Ok(())
}

pub async fn create(
    pool: &PgPool,
    data: &VoucherRetailerDiscountCreate,
    username: &str,
) -> ServiceResult<VoucherRetailerDiscount> {
    validate_terms(data.discount_amount, data.discount_percentage, data.agen_fee)?;
    ensure_project(pool, data.voucher_project_id).await?;

    let row = sqlx::query_as(&format!(
        r#"
        INSERT INTO voucher_retailer_discounts
            (discount_amount, discount_percentage, agen_fee, voucher_project_id, created_by, updated_by, created_at, updated_at)
        VALUES ($1, $2, $3, $4, $5, $5, $6, $6)
        RETURNING {DISCOUNT_COLUMNS}
        "#
    ))
    .bind(data.discount_amount)
    .bind(data.discount_percentage)
    .bind(data.agen_fee)
    .bind(data.voucher_project_id)
    .bind(username)
    .bind(now_millis())
    .fetch_one(pool)
    .await?;
    Ok(row)
}

pub async fn update(
    pool: &PgPool,
    id: i64,
    data: &VoucherRetailerDiscountUpdate,
    username: &str,
) -> ServiceResult<VoucherRetailerDiscount> {
    let current = get(pool, id).await?;
    validate_terms(
        data.discount_amount.unwrap_or(current.discount_amount),
        data.discount_percentage.unwrap_or(current.discount_percentage),
        data.agen_fee.or(current.agen_fee),
    )?;
    ensure_project(pool, data.voucher_project_id).await?;

    let row: Option<VoucherRetailerDiscount> = sqlx::query_as(&format!(
        r#"
        UPDATE voucher_retailer_discounts SET
            discount_amount = COALESCE($1, discount_amount),
            discount_percentage = COALESCE($2, discount_percentage),
            agen_fee = COALESCE($3, agen_fee),
            voucher_project_id = COALESCE($4, voucher_project_id),
            updated_by = $5,
            updated_at = $6
        WHERE id = $7
        RETURNING {DISCOUNT_COLUMNS}
        "#
    ))
    .bind(data.discount_amount)
    .bind(data.discount_percentage)
    .bind(data.agen_fee)
    .bind(data.voucher_project_id)
    .bind(username)
    .bind(now_millis())
    .bind(id)
    .fetch_optional(pool)
    .await?;
    row.ok_or_else(|| not_found(id).into())
}

pub async fn delete(pool: &PgPool, id: i64) -> ServiceResult<()> {
    let rows = sqlx::query("DELETE FROM voucher_retailer_discounts WHERE id = $1")
        .bind(id)
        .execute(pool)
        .await?;
    if rows.rows_affected() == 0 {
        return Err(not_found(id).into());
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_discount_terms() {
        assert!(validate_terms(Decimal::from(5000), Decimal::from(10), None).is_ok());
        assert!(validate_terms(Decimal::ZERO, Decimal::ONE_HUNDRED, Some(Decimal::ZERO)).is_ok());
        assert!(validate_terms(Decimal::from(-1), Decimal::from(10), None).is_err());
        assert!(validate_terms(Decimal::from(1), Decimal::from(101), None).is_err());
        assert!(validate_terms(Decimal::from(1), Decimal::from(10), Some(Decimal::from(-2))).is_err());
    }
}
