//! Voucher Limit (quota counter) Model

use serde::{Deserialize, Serialize};

/// Bounded counter of approved vouchers, optionally scoped to a project
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "db", derive(sqlx::FromRow))]
pub struct VoucherLimit {
    pub id: i64,
    pub description: Option<String>,
    pub limit: i32,
    pub current_count: i32,
    pub voucher_project_id: Option<i64>,
    pub created_at: i64,
    pub updated_at: i64,
}

impl VoucherLimit {
    pub fn remaining(&self) -> i32 {
        (self.limit - self.current_count).max(0)
    }

    pub fn status(&self) -> QuotaStatus {
        QuotaStatus::new(self.id, self.limit, self.current_count)
    }
}

/// Create limit payload
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VoucherLimitCreate {
    pub description: Option<String>,
    pub limit: i32,
    pub current_count: Option<i32>,
    pub voucher_project_id: Option<i64>,
}

/// Update limit payload
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct VoucherLimitUpdate {
    pub description: Option<String>,
    pub limit: Option<i32>,
    pub current_count: Option<i32>,
    pub voucher_project_id: Option<i64>,
}

/// Increment request; `by` defaults to 1
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct IncrementRequest {
    pub by: Option<i32>,
}

/// Snapshot of a counter for read endpoints
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QuotaStatus {
    pub id: i64,
    pub limit: i32,
    pub current_count: i32,
    pub remaining: i32,
    pub percentage_used: f64,
}

impl QuotaStatus {
    pub fn new(id: i64, limit: i32, current_count: i32) -> Self {
        Self {
            id,
            limit,
            current_count,
            remaining: (limit - current_count).max(0),
            percentage_used: percentage(current_count as i64, limit as i64),
        }
    }
}

/// Aggregate counters across projects and limits
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LimitSummary {
    pub total_projects: i64,
    pub active_projects: i64,
    pub inactive_projects: i64,
    pub limits_count: i64,
    pub total_allocated: i64,
    pub total_used: i64,
    pub total_remaining: i64,
    pub usage_percentage: f64,
}

/// `used / total` as a percentage rounded to two decimals; 0 when `total` is 0
pub fn percentage(used: i64, total: i64) -> f64 {
    if total <= 0 {
        return 0.0;
    }
    ((used as f64 / total as f64) * 10_000.0).round() / 100.0
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_quota_status() {
        let s = QuotaStatus::new(1, 5, 2);
        assert_eq!(s.remaining, 3);
        assert_eq!(s.percentage_used, 40.0);

        let full = QuotaStatus::new(1, 5, 5);
        assert_eq!(full.remaining, 0);
        assert_eq!(full.percentage_used, 100.0);
    }

    #[test]
    fn test_percentage_zero_total() {
        assert_eq!(percentage(3, 0), 0.0);
        assert_eq!(percentage(1, 3), 33.33);
    }
}
