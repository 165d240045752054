//! Voucher Project Model

use serde::{Deserialize, Serialize};

/// Voucher project (campaign). Period bounds are Unix millis at
/// business-timezone day boundaries.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "db", derive(sqlx::FromRow))]
pub struct VoucherProject {
    pub id: i64,
    pub name: String,
    pub description: Option<String>,
    pub periode_start: i64,
    pub periode_end: i64,
    pub is_active: bool,
    pub created_by: Option<String>,
    pub updated_by: Option<String>,
    pub created_at: i64,
    pub updated_at: i64,
}

/// Create project payload. Dates accept `YYYY-MM-DD` or RFC 3339.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VoucherProjectCreate {
    pub name: String,
    pub description: Option<String>,
    pub periode_start: String,
    pub periode_end: String,
    pub is_active: Option<bool>,
}

/// Update project payload
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct VoucherProjectUpdate {
    pub name: Option<String>,
    pub description: Option<String>,
    pub periode_start: Option<String>,
    pub periode_end: Option<String>,
    pub is_active: Option<bool>,
}

/// Per-project dashboard figures
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "db", derive(sqlx::FromRow))]
pub struct ProjectDashboardRow {
    pub project_id: i64,
    pub project_name: String,
    pub is_active: bool,
    pub periode_start: i64,
    pub periode_end: i64,
    pub total_vouchers: i64,
    pub pending_vouchers: i64,
    pub approved_vouchers: i64,
    pub rejected_vouchers: i64,
    pub redeemed_vouchers: i64,
    pub quota_limit: i64,
    pub quota_used: i64,
}
