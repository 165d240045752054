//! Wholesaler sales recorded against redeemed vouchers

use std::collections::{HashMap, HashSet};

use rust_decimal::Decimal;
use shared::error::{AppError, ErrorCode};
use shared::models::{
    TransactionLine, TransactionWithDetails, VoucherRedeem, WholesaleTransaction,
    WholesaleTransactionDetail,
};
use shared::util::now_millis;
use sqlx::PgPool;

use crate::error::{ServiceResult, unique_or};

const TRANSACTION_COLUMNS: &str = "t.id, t.voucher_redeem_id, t.total_price, \
     t.total_price_after_discount, t.image_url, t.created_by, t.created_at";

const DETAIL_COLUMNS: &str =
    "d.id, d.transaction_id, d.item_id, i.sku AS item_sku, i.name AS item_name, d.qty, d.sub_total";

/// Transaction submission, receipt already stored
#[derive(Debug, Clone)]
pub struct NewTransaction {
    pub voucher_code: String,
    pub ws_id: i64,
    pub total_price: Decimal,
    pub total_price_after_discount: Decimal,
    pub image_url: String,
    pub lines: Vec<TransactionLine>,
}

impl NewTransaction {
    pub fn validate(&self) -> Result<(), AppError> {
        validate_totals(self.total_price, self.total_price_after_discount)?;
        validate_lines(&self.lines)
    }
}

pub fn validate_totals(total: Decimal, after_discount: Decimal) -> Result<(), AppError> {
    if total.is_sign_negative() || after_discount.is_sign_negative() {
        return Err(AppError::with_message(
            ErrorCode::ValueOutOfRange,
            "Totals must not be negative",
        ));
    }
    if after_discount > total {
        return Err(AppError::with_message(
            ErrorCode::ValueOutOfRange,
            "total_price_after_discount exceeds total_price",
        ));
    }
    Ok(())
}

pub fn validate_lines(lines: &[TransactionLine]) -> Result<(), AppError> {
    if lines.is_empty() {
        return Err(AppError::required("items"));
    }
    for (idx, line) in lines.iter().enumerate() {
        if line.qty <= Decimal::ZERO {
            return Err(
                AppError::with_message(ErrorCode::ValueOutOfRange, "qty must be positive")
                    .with_detail("line", idx),
            );
        }
        if line.sub_total.is_sign_negative() {
            return Err(AppError::with_message(
                ErrorCode::ValueOutOfRange,
                "sub_total must not be negative",
            )
            .with_detail("line", idx));
        }
    }
    Ok(())
}

/// Record the sale for a redemption made by `ws_id`.
///
/// Returns the redemption and the stored transaction with its lines.
pub async fn submit(
    pool: &PgPool,
    input: &NewTransaction,
    created_by: &str,
) -> ServiceResult<(VoucherRedeem, TransactionWithDetails)> {
    input.validate()?;

    let mut tx = pool.begin().await?;

    let redeem: Option<VoucherRedeem> = sqlx::query_as(
        r#"
        SELECT vr.id, vr.voucher_id, vr.wholesale_id, vr.redeemed_at
        FROM voucher_redeems vr
        JOIN vouchers v ON v.id = vr.voucher_id
        WHERE v.code = $1 AND vr.wholesale_id = $2
        FOR UPDATE OF vr
        "#,
    )
    .bind(&input.voucher_code)
    .bind(input.ws_id)
    .fetch_optional(&mut *tx)
    .await?;
    let redeem = redeem.ok_or_else(|| {
        AppError::new(ErrorCode::RedeemNotFound)
            .with_detail("voucher_code", input.voucher_code.as_str())
            .with_detail("ws_id", input.ws_id)
    })?;

    let submitted: bool = sqlx::query_scalar(
        "SELECT EXISTS(SELECT 1 FROM wholesale_transactions WHERE voucher_redeem_id = $1)",
    )
    .bind(redeem.id)
    .fetch_one(&mut *tx)
    .await?;
    if submitted {
        return Err(AppError::new(ErrorCode::TransactionAlreadySubmitted)
            .with_detail("voucher_code", input.voucher_code.as_str())
            .into());
    }

    let wanted: Vec<i64> = input
        .lines
        .iter()
        .map(|l| l.item_id)
        .collect::<HashSet<_>>()
        .into_iter()
        .collect();
    let found: Vec<i64> = sqlx::query_scalar("SELECT id FROM items WHERE id = ANY($1)")
        .bind(&wanted)
        .fetch_all(&mut *tx)
        .await?;
    if let Some(missing) = wanted.iter().find(|id| !found.contains(id)) {
        return Err(AppError::new(ErrorCode::ItemNotFound)
            .with_detail("item_id", *missing)
            .into());
    }

    let transaction: WholesaleTransaction = sqlx::query_as(
        r#"
        INSERT INTO wholesale_transactions
            (voucher_redeem_id, total_price, total_price_after_discount, image_url, created_by, created_at)
        VALUES ($1, $2, $3, $4, $5, $6)
        RETURNING id, voucher_redeem_id, total_price, total_price_after_discount, image_url, created_by, created_at
        "#,
    )
    .bind(redeem.id)
    .bind(input.total_price)
    .bind(input.total_price_after_discount)
    .bind(&input.image_url)
    .bind(created_by)
    .bind(now_millis())
    .fetch_one(&mut *tx)
    .await
    .map_err(|e| unique_or(e, AppError::new(ErrorCode::TransactionAlreadySubmitted)))?;

    for line in &input.lines {
        sqlx::query(
            "INSERT INTO wholesale_transaction_details (transaction_id, item_id, qty, sub_total) VALUES ($1, $2, $3, $4)",
        )
        .bind(transaction.id)
        .bind(line.item_id)
        .bind(line.qty)
        .bind(line.sub_total)
        .execute(&mut *tx)
        .await?;
    }

    let details: Vec<WholesaleTransactionDetail> = sqlx::query_as(&format!(
        r#"
        SELECT {DETAIL_COLUMNS}
        FROM wholesale_transaction_details d
        JOIN items i ON i.id = d.item_id
        WHERE d.transaction_id = $1
        ORDER BY d.id
        "#
    ))
    .bind(transaction.id)
    .fetch_all(&mut *tx)
    .await?;

    tx.commit().await?;

    tracing::info!(
        transaction_id = transaction.id,
        voucher_code = %input.voucher_code,
        wholesale_id = input.ws_id,
        lines = details.len(),
        created_by = %created_by,
        "Transaction submitted"
    );

    Ok((redeem, TransactionWithDetails { transaction, details }))
}

#[derive(sqlx::FromRow)]
struct VoucherTransactionRow {
    voucher_id: i64,
    #[sqlx(flatten)]
    transaction: WholesaleTransaction,
}

/// Transactions with lines, keyed by voucher id
pub async fn for_vouchers(
    pool: &PgPool,
    voucher_ids: &[i64],
) -> ServiceResult<HashMap<i64, Vec<TransactionWithDetails>>> {
    if voucher_ids.is_empty() {
        return Ok(HashMap::new());
    }

    let transactions: Vec<VoucherTransactionRow> = sqlx::query_as(&format!(
        r#"
        SELECT vr.voucher_id, {TRANSACTION_COLUMNS}
        FROM wholesale_transactions t
        JOIN voucher_redeems vr ON vr.id = t.voucher_redeem_id
        WHERE vr.voucher_id = ANY($1)
        ORDER BY t.id
        "#
    ))
    .bind(voucher_ids)
    .fetch_all(pool)
    .await?;

    let tx_ids: Vec<i64> = transactions.iter().map(|t| t.transaction.id).collect();
    let details: Vec<WholesaleTransactionDetail> = sqlx::query_as(&format!(
        r#"
        SELECT {DETAIL_COLUMNS}
        FROM wholesale_transaction_details d
        JOIN items i ON i.id = d.item_id
        WHERE d.transaction_id = ANY($1)
        ORDER BY d.id
        "#
    ))
    .bind(&tx_ids)
    .fetch_all(pool)
    .await?;

    let mut lines: HashMap<i64, Vec<WholesaleTransactionDetail>> = HashMap::new();
    for detail in details {
        lines.entry(detail.transaction_id).or_default().push(detail);
    }

    let mut by_voucher: HashMap<i64, Vec<TransactionWithDetails>> = HashMap::new();
    for row in transactions {
        let details = lines.remove(&row.transaction.id).unwrap_or_default();
        by_voucher
            .entry(row.voucher_id)
            .or_default()
            .push(TransactionWithDetails {
                transaction: row.transaction,
                details,
            });
    }
    Ok(by_voucher)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn line(item_id: i64, qty: Decimal, sub_total: Decimal) -> TransactionLine {
        TransactionLine { item_id, qty, sub_total }
    }

    #[test]
    fn test_totals() {
        assert!(validate_totals(Decimal::from(100000), Decimal::from(90000)).is_ok());
        assert!(validate_totals(Decimal::from(100000), Decimal::from(100000)).is_ok());
        assert_eq!(
            validate_totals(Decimal::from(100), Decimal::from(150)).unwrap_err().code,
            ErrorCode::ValueOutOfRange
        );
        assert!(validate_totals(Decimal::from(-1), Decimal::from(0)).is_err());
    }

    #[test]
    fn test_lines_required() {
        assert_eq!(validate_lines(&[]).unwrap_err().code, ErrorCode::RequiredField);
    }

    #[test]
    fn test_line_quantities() {
        assert!(validate_lines(&[line(1, Decimal::from(2), Decimal::from(20000))]).is_ok());
        let err = validate_lines(&[line(1, Decimal::from(1), Decimal::from(1)), line(2, Decimal::from(0), Decimal::from(0))]).unwrap_err();
        assert_eq!(err.code, ErrorCode::ValueOutOfRange);
        assert_eq!(err.details.unwrap()["line"], 1);
        assert!(validate_lines(&[line(1, Decimal::from(1), Decimal::from(-5))]).is_err());
    }
}
