//! Voucher Model

use serde::{Deserialize, Serialize};

use super::ReimburseStatusKind;

/// Voucher entity
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "db", derive(sqlx::FromRow))]
pub struct Voucher {
    pub id: i64,
    pub code: String,
    pub retailer_id: i64,
    pub project_id: Option<i64>,
    pub is_approved: bool,
    pub approved_at: Option<i64>,
    pub is_rejected: bool,
    pub rejected_at: Option<i64>,
    pub redeemed: bool,
    pub redeemed_at: Option<i64>,
    pub created_at: i64,
    pub expired_at: Option<i64>,
}

/// Lifecycle stage of a voucher, derived from its flags and reimbursement.
///
/// Serialized with the labels used by the listing filters.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum VoucherStage {
    #[serde(rename = "PENDING")]
    Pending,
    #[serde(rename = "REJECTED")]
    Rejected,
    #[serde(rename = "RECEIVED")]
    Received,
    #[serde(rename = "REDEEMED")]
    Redeemed,
    #[serde(rename = "WAITING PAYMENT")]
    ReimburseWaiting,
    #[serde(rename = "PAYMENT COMPLETED")]
    ReimburseCompleted,
    #[serde(rename = "PAID")]
    ReimbursePaid,
}

impl VoucherStage {
    /// Derive the stage from persisted flags.
    ///
    /// Reimbursement status wins over the voucher flags since a
    /// reimbursement only exists for redeemed vouchers.
    pub fn derive(
        is_approved: bool,
        is_rejected: bool,
        redeemed: bool,
        reimburse: Option<ReimburseStatusKind>,
    ) -> Self {
        match reimburse {
            Some(ReimburseStatusKind::Waiting) => return Self::ReimburseWaiting,
            Some(ReimburseStatusKind::Completed) => return Self::ReimburseCompleted,
            Some(ReimburseStatusKind::Paid) => return Self::ReimbursePaid,
            None => {}
        }
        if redeemed {
            Self::Redeemed
        } else if is_rejected {
            Self::Rejected
        } else if is_approved {
            Self::Received
        } else {
            Self::Pending
        }
    }

    /// Filter label (`PENDING`, `WAITING PAYMENT`, ...)
    pub fn label(&self) -> &'static str {
        match self {
            Self::Pending => "PENDING",
            Self::Rejected => "REJECTED",
            Self::Received => "RECEIVED",
            Self::Redeemed => "REDEEMED",
            Self::ReimburseWaiting => "WAITING PAYMENT",
            Self::ReimburseCompleted => "PAYMENT COMPLETED",
            Self::ReimbursePaid => "PAID",
        }
    }

    /// Parse a filter label, case-insensitively
    pub fn from_label(label: &str) -> Option<Self> {
        let label = label.trim().to_ascii_uppercase();
        [
            Self::Pending,
            Self::Rejected,
            Self::Received,
            Self::Redeemed,
            Self::ReimburseWaiting,
            Self::ReimburseCompleted,
            Self::ReimbursePaid,
        ]
        .into_iter()
        .find(|s| s.label() == label)
    }

    /// Terminal stages have no outgoing transition
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Rejected | Self::ReimbursePaid)
    }
}

/// Voucher redemption record
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "db", derive(sqlx::FromRow))]
pub struct VoucherRedeem {
    pub id: i64,
    pub voucher_id: i64,
    pub wholesale_id: i64,
    pub redeemed_at: i64,
}

/// Redeem request
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RedeemRequest {
    pub voucher_code: String,
    pub ws_id: i64,
}

/// Voucher row in the `list_vouchers` view
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "db", derive(sqlx::FromRow))]
pub struct VoucherListRow {
    pub id: i64,
    pub code: String,
    pub retailer_id: i64,
    pub retailer_name: String,
    pub retailer_phone: String,
    pub wholesale_id: Option<i64>,
    pub wholesale_name: Option<String>,
    pub project_id: Option<i64>,
    pub is_approved: bool,
    pub is_rejected: bool,
    pub redeemed: bool,
    pub redeemed_at: Option<i64>,
    pub created_at: i64,
    pub expired_at: Option<i64>,
}

/// Redemption report row
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "db", derive(sqlx::FromRow))]
pub struct RedeemReportRow {
    pub redeem_id: i64,
    pub voucher_code: String,
    pub retailer_name: String,
    pub retailer_phone: String,
    pub wholesale_id: i64,
    pub wholesale_name: String,
    pub redeemed_at: i64,
}
