//! Error category classification

use super::codes::ErrorCode;
use serde::{Deserialize, Serialize};

/// Error category classification based on error code ranges
///
/// Categories are determined by the leading digit of the error code:
/// - 0xxx: General errors
/// - 1xxx: Authentication errors
/// - 2xxx: Permission errors
/// - 3xxx: Retailer errors
/// - 4xxx: Voucher errors
/// - 5xxx: Settlement errors
/// - 6xxx: Campaign errors
/// - 7xxx: Wholesale errors
/// - 8xxx: Upload errors
/// - 9xxx: System errors
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorCategory {
    /// General errors (0xxx)
    General,
    /// Authentication errors (1xxx)
    Auth,
    /// Permission errors (2xxx)
    Permission,
    /// Retailer errors (3xxx)
    Retailer,
    /// Voucher errors (4xxx)
    Voucher,
    /// Settlement errors (5xxx)
    Settlement,
    /// Campaign errors (6xxx)
    Campaign,
    /// Wholesale errors (7xxx)
    Wholesale,
    /// Upload errors (8xxx)
    Upload,
    /// System errors (9xxx)
    System,
}

impl ErrorCategory {
    /// Determine category from error code value
    pub fn from_code(code: u16) -> Self {
        match code {
            0..1000 => Self::General,
            1000..2000 => Self::Auth,
            2000..3000 => Self::Permission,
            3000..4000 => Self::Retailer,
            4000..5000 => Self::Voucher,
            5000..6000 => Self::Settlement,
            6000..7000 => Self::Campaign,
            7000..8000 => Self::Wholesale,
            8000..9000 => Self::Upload,
            _ => Self::System,
        }
    }

    /// Get the string name for this category
    pub fn name(&self) -> &'static str {
        match self {
            Self::General => "general",
            Self::Auth => "auth",
            Self::Permission => "permission",
            Self::Retailer => "retailer",
            Self::Voucher => "voucher",
            Self::Settlement => "settlement",
            Self::Campaign => "campaign",
            Self::Wholesale => "wholesale",
            Self::Upload => "upload",
            Self::System => "system",
        }
    }
}

impl ErrorCode {
    /// Get the category for this error code
    pub fn category(&self) -> ErrorCategory {
        ErrorCategory::from_code(self.code())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_category_from_code() {
        assert_eq!(ErrorCategory::from_code(0), ErrorCategory::General);
        assert_eq!(ErrorCategory::from_code(999), ErrorCategory::General);
        assert_eq!(ErrorCategory::from_code(1001), ErrorCategory::Auth);
        assert_eq!(ErrorCategory::from_code(2001), ErrorCategory::Permission);
        assert_eq!(ErrorCategory::from_code(3001), ErrorCategory::Retailer);
        assert_eq!(ErrorCategory::from_code(4001), ErrorCategory::Voucher);
        assert_eq!(ErrorCategory::from_code(5001), ErrorCategory::Settlement);
        assert_eq!(ErrorCategory::from_code(6001), ErrorCategory::Campaign);
        assert_eq!(ErrorCategory::from_code(7001), ErrorCategory::Wholesale);
        assert_eq!(ErrorCategory::from_code(8001), ErrorCategory::Upload);
        assert_eq!(ErrorCategory::from_code(9001), ErrorCategory::System);
        assert_eq!(ErrorCategory::from_code(10000), ErrorCategory::System);
    }

    #[test]
    fn test_error_code_category() {
        assert_eq!(ErrorCode::TokenExpired.category(), ErrorCategory::Auth);
        assert_eq!(
            ErrorCode::NoPhotosFound.category(),
            ErrorCategory::Retailer
        );
        assert_eq!(ErrorCode::VoucherExpired.category(), ErrorCategory::Voucher);
        assert_eq!(
            ErrorCode::ReimburseNotFound.category(),
            ErrorCategory::Settlement
        );
        assert_eq!(ErrorCode::QuotaExceeded.category(), ErrorCategory::Campaign);
        assert_eq!(ErrorCode::UserNotFound.category(), ErrorCategory::Wholesale);
        assert_eq!(ErrorCode::FileTooLarge.category(), ErrorCategory::Upload);
        assert_eq!(ErrorCode::DatabaseError.category(), ErrorCategory::System);
    }

    #[test]
    fn test_category_serde() {
        let json = serde_json::to_string(&ErrorCategory::Settlement).unwrap();
        assert_eq!(json, "\"settlement\"");

        let category: ErrorCategory = serde_json::from_str("\"campaign\"").unwrap();
        assert_eq!(category, ErrorCategory::Campaign);
    }
}
