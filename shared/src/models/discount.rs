//! Voucher Retailer Discount Model

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Discount terms of a voucher project
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "db", derive(sqlx::FromRow))]
pub struct VoucherRetailerDiscount {
    pub id: i64,
    pub discount_amount: Decimal,
    pub discount_percentage: Decimal,
    pub agen_fee: Option<Decimal>,
    pub voucher_project_id: Option<i64>,
    pub created_by: Option<String>,
    pub updated_by: Option<String>,
    pub created_at: i64,
    pub updated_at: i64,
}

/// Create discount payload
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VoucherRetailerDiscountCreate {
    pub discount_amount: Decimal,
    pub discount_percentage: Decimal,
    pub agen_fee: Option<Decimal>,
    pub voucher_project_id: Option<i64>,
}

/// Update discount payload
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct VoucherRetailerDiscountUpdate {
    pub discount_amount: Option<Decimal>,
    pub discount_percentage: Option<Decimal>,
    pub agen_fee: Option<Decimal>,
    pub voucher_project_id: Option<i64>,
}
