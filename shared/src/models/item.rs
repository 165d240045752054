//! Item Model

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Catalogue item referenced by transaction lines
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "db", derive(sqlx::FromRow))]
pub struct Item {
    pub id: i64,
    pub sku: String,
    pub name: String,
    pub price: Decimal,
    pub is_active: bool,
}

/// Create item payload
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ItemCreate {
    pub sku: String,
    pub name: String,
    pub price: Decimal,
    pub is_active: Option<bool>,
}

/// Update item payload
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ItemUpdate {
    pub sku: Option<String>,
    pub name: Option<String>,
    pub price: Option<Decimal>,
    pub is_active: Option<bool>,
}
