//! Wholesale Transaction Model

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Sale recorded by a wholesaler against a redeemed voucher
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "db", derive(sqlx::FromRow))]
pub struct WholesaleTransaction {
    pub id: i64,
    pub voucher_redeem_id: i64,
    pub total_price: Decimal,
    pub total_price_after_discount: Decimal,
    pub image_url: String,
    pub created_by: Option<String>,
    pub created_at: i64,
}

/// Transaction line
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "db", derive(sqlx::FromRow))]
pub struct WholesaleTransactionDetail {
    pub id: i64,
    pub transaction_id: i64,
    pub item_id: i64,
    pub item_sku: String,
    pub item_name: String,
    pub qty: Decimal,
    pub sub_total: Decimal,
}

/// Line as submitted by the client
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TransactionLine {
    pub item_id: i64,
    pub qty: Decimal,
    pub sub_total: Decimal,
}

/// Transaction with its lines
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TransactionWithDetails {
    #[serde(flatten)]
    pub transaction: WholesaleTransaction,
    pub details: Vec<WholesaleTransactionDetail>,
}
