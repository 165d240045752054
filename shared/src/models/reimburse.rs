//! Reimbursement Model

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use super::TransactionWithDetails;

/// Reimbursement status vocabulary, ordered `waiting < completed < paid`
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ReimburseStatusKind {
    Waiting,
    Completed,
    Paid,
}

impl ReimburseStatusKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Waiting => "waiting",
            Self::Completed => "completed",
            Self::Paid => "paid",
        }
    }
}

impl fmt::Display for ReimburseStatusKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ReimburseStatusKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "waiting" => Ok(Self::Waiting),
            "completed" => Ok(Self::Completed),
            "paid" => Ok(Self::Paid),
            other => Err(format!("unknown reimbursement status: {other}")),
        }
    }
}

/// Reimbursement claim for a redeemed voucher
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "db", derive(sqlx::FromRow))]
pub struct Reimburse {
    pub id: i64,
    pub voucher_id: i64,
    pub status_id: Option<i64>,
    pub reimbursed_by: Option<String>,
    pub created_at: i64,
    pub completed_at: Option<i64>,
    pub paid_at: Option<i64>,
}

/// Status history entry (append-only)
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "db", derive(sqlx::FromRow))]
pub struct ReimburseStatusEntry {
    pub id: i64,
    pub reimburse_id: i64,
    pub status: String,
    pub changed_by: Option<String>,
    pub created_at: i64,
}

/// Submit reimbursement request
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SubmitReimburseRequest {
    pub voucher_codes: Vec<String>,
}

/// Per-code outcome of a reimbursement submission
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SubmitReimburseResult {
    pub voucher_code: String,
    pub success: bool,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reimburse_id: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error_code: Option<u16>,
}

/// Reimbursement listing entry
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReimburseListEntry {
    pub id: i64,
    pub voucher_id: i64,
    pub voucher_code: String,
    pub status: Option<String>,
    pub reimbursed_by: Option<String>,
    pub created_at: i64,
    pub completed_at: Option<i64>,
    pub paid_at: Option<i64>,
    pub retailer_name: String,
    pub retailer_address: String,
    pub retailer_kelurahan: Option<String>,
    pub retailer_kecamatan: Option<String>,
    pub retailer_kota: Option<String>,
    pub retailer_provinsi: Option<String>,
    pub history: Vec<ReimburseStatusEntry>,
    pub transactions: Vec<TransactionWithDetails>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_parse() {
        assert_eq!("waiting".parse(), Ok(ReimburseStatusKind::Waiting));
        assert_eq!("Completed".parse(), Ok(ReimburseStatusKind::Completed));
        assert_eq!(" PAID ".parse(), Ok(ReimburseStatusKind::Paid));
        assert!("cancelled".parse::<ReimburseStatusKind>().is_err());
    }

    #[test]
    fn test_status_order() {
        assert!(ReimburseStatusKind::Waiting < ReimburseStatusKind::Completed);
        assert!(ReimburseStatusKind::Completed < ReimburseStatusKind::Paid);
    }

    #[test]
    fn test_status_serde() {
        assert_eq!(
            serde_json::to_string(&ReimburseStatusKind::Completed).unwrap(),
            "\"completed\""
        );
        assert_eq!(ReimburseStatusKind::Paid.to_string(), "paid");
    }
}
