//! Unified error codes for the voucher platform
//!
//! Error codes are organized by category:
//! - 0xxx: General errors
//! - 1xxx: Authentication errors
//! - 2xxx: Permission errors
//! - 3xxx: Retailer errors
//! - 4xxx: Voucher errors
//! - 5xxx: Settlement errors (transactions, reimbursement, items)
//! - 6xxx: Campaign errors (projects, quota, discounts)
//! - 7xxx: Wholesale and account errors
//! - 8xxx: Upload errors
//! - 9xxx: System errors

use serde::{Deserialize, Serialize};
use std::fmt;

/// Unified error code enum
///
/// All error codes are represented as u16 values so clients can branch on
/// them without parsing messages.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(into = "u16", try_from = "u16")]
#[repr(u16)]
pub enum ErrorCode {
    // ==================== 0xxx: General ====================
    /// Operation completed successfully
    Success = 0,
    /// Unknown error
    Unknown = 1,
    /// Validation failed
    ValidationFailed = 2,
    /// Resource not found
    NotFound = 3,
    /// Resource already exists
    AlreadyExists = 4,
    /// Invalid request
    InvalidRequest = 5,
    /// Invalid format
    InvalidFormat = 6,
    /// Required field missing
    RequiredField = 7,
    /// Value out of range
    ValueOutOfRange = 8,

    // ==================== 1xxx: Auth ====================
    /// User is not authenticated
    NotAuthenticated = 1001,
    /// Invalid credentials (username/password)
    InvalidCredentials = 1002,
    /// Token has expired
    TokenExpired = 1003,
    /// Token is invalid
    TokenInvalid = 1004,
    /// Refresh token unknown, revoked or expired
    RefreshTokenInvalid = 1005,
    /// Too many attempts from the same client
    TooManyAttempts = 1006,
    /// Account is disabled
    AccountDisabled = 1007,
    /// Password does not meet the length requirement
    PasswordTooShort = 1008,

    // ==================== 2xxx: Permission ====================
    /// Permission denied
    PermissionDenied = 2001,
    /// Office (staff) account required
    StaffRequired = 2002,

    // ==================== 3xxx: Retailer ====================
    /// Retailer not found
    RetailerNotFound = 3001,
    /// Phone number already has an active registration
    PhoneAlreadyRegistered = 3002,
    /// Retailer has no photos
    NoPhotosFound = 3003,
    /// Registration requires at least one photo
    PhotoRequired = 3004,
    /// Photos have not been verified and approved
    PhotosNotVerified = 3005,
    /// Photos were rejected
    PhotosRejected = 3006,

    // ==================== 4xxx: Voucher ====================
    /// Voucher not found
    VoucherNotFound = 4001,
    /// Voucher does not exist or is already redeemed
    VoucherInvalid = 4002,
    /// Voucher has expired
    VoucherExpired = 4003,
    /// Redeeming wholesaler does not own the retailer
    WholesalerMismatch = 4004,
    /// Voucher is already approved or rejected
    VoucherAlreadyDecided = 4005,
    /// Voucher has not been redeemed
    VoucherNotRedeemed = 4006,
    /// Could not allocate a unique voucher code
    VoucherCodeExhausted = 4007,
    /// Redemption record not found
    RedeemNotFound = 4008,

    // ==================== 5xxx: Settlement ====================
    /// Transaction already submitted for this redemption
    TransactionAlreadySubmitted = 5001,
    /// Reimbursement already submitted for this voucher
    ReimburseAlreadySubmitted = 5002,
    /// Reimbursement not found
    ReimburseNotFound = 5003,
    /// Unknown reimbursement status
    InvalidReimburseStatus = 5004,
    /// Reimbursement status cannot move backwards
    ReimburseTransitionInvalid = 5005,
    /// Item not found
    ItemNotFound = 5101,
    /// Item SKU already exists
    ItemSkuExists = 5102,

    // ==================== 6xxx: Campaign ====================
    /// Voucher project not found
    ProjectNotFound = 6001,
    /// Voucher project is inactive
    ProjectInactive = 6002,
    /// Project period is invalid
    InvalidPeriod = 6003,
    /// Quota counter not found
    LimitNotFound = 6101,
    /// Quota counter is full
    QuotaExceeded = 6102,
    /// Discount not found
    DiscountNotFound = 6201,

    // ==================== 7xxx: Wholesale & Accounts ====================
    /// Wholesaler not found
    WholesaleNotFound = 7001,
    /// Parent assignment would create a cycle
    WholesaleHierarchyCycle = 7002,
    /// Wholesaler is inactive
    WholesaleInactive = 7003,
    /// User not found
    UserNotFound = 7101,
    /// Username already taken
    UsernameExists = 7102,

    // ==================== 8xxx: Upload ====================
    /// File too large
    FileTooLarge = 8001,
    /// Unsupported file format
    UnsupportedFileFormat = 8002,
    /// Invalid image file
    InvalidImageFile = 8003,
    /// No file provided
    NoFileProvided = 8004,
    /// Empty file
    EmptyFile = 8005,
    /// Failed to store file
    FileStorageFailed = 8006,

    // ==================== 9xxx: System ====================
    /// Internal server error
    InternalError = 9001,
    /// Database error
    DatabaseError = 9002,
    /// Configuration error
    ConfigError = 9005,
}

impl ErrorCode {
    /// Get the numeric code value
    #[inline]
    pub const fn code(&self) -> u16 {
        *self as u16
    }

    /// Check if this is a success code
    #[inline]
    pub const fn is_success(&self) -> bool {
        matches!(self, ErrorCode::Success)
    }

    /// Get the developer-facing English message for this error code
    pub const fn message(&self) -> &'static str {
        match self {
            // General
            ErrorCode::Success => "Operation completed successfully",
            ErrorCode::Unknown => "An unknown error occurred",
            ErrorCode::ValidationFailed => "Validation failed",
            ErrorCode::NotFound => "Resource not found",
            ErrorCode::AlreadyExists => "Resource already exists",
            ErrorCode::InvalidRequest => "Invalid request",
            ErrorCode::InvalidFormat => "Invalid format",
            ErrorCode::RequiredField => "Required field is missing",
            ErrorCode::ValueOutOfRange => "Value is out of range",

            // Auth
            ErrorCode::NotAuthenticated => "User is not authenticated",
            ErrorCode::InvalidCredentials => "Invalid username or password",
            ErrorCode::TokenExpired => "Authentication token has expired",
            ErrorCode::TokenInvalid => "Authentication token is invalid",
            ErrorCode::RefreshTokenInvalid => "Refresh token is invalid or expired",
            ErrorCode::TooManyAttempts => "Too many attempts, please try again later",
            ErrorCode::AccountDisabled => "Account is disabled",
            ErrorCode::PasswordTooShort => "Password must be at least 8 characters",

            // Permission
            ErrorCode::PermissionDenied => "Permission denied",
            ErrorCode::StaffRequired => "Office account is required",

            // Retailer
            ErrorCode::RetailerNotFound => "Retailer not found",
            ErrorCode::PhoneAlreadyRegistered => "Phone number already registered",
            ErrorCode::NoPhotosFound => "No photos found for this retailer",
            ErrorCode::PhotoRequired => "At least one photo is required",
            ErrorCode::PhotosNotVerified => "Retailer photos are not verified",
            ErrorCode::PhotosRejected => "Retailer photos were rejected",

            // Voucher
            ErrorCode::VoucherNotFound => "Voucher not found",
            ErrorCode::VoucherInvalid => "Voucher is invalid or already redeemed",
            ErrorCode::VoucherExpired => "Voucher has expired",
            ErrorCode::WholesalerMismatch => "Voucher does not belong to this wholesaler",
            ErrorCode::VoucherAlreadyDecided => "Voucher is already approved or rejected",
            ErrorCode::VoucherNotRedeemed => "Voucher has not been redeemed",
            ErrorCode::VoucherCodeExhausted => "Could not generate a unique voucher code",
            ErrorCode::RedeemNotFound => "Voucher redemption not found",

            // Settlement
            ErrorCode::TransactionAlreadySubmitted => "Transaction already submitted",
            ErrorCode::ReimburseAlreadySubmitted => "Reimbursement already submitted",
            ErrorCode::ReimburseNotFound => "Reimbursement not found",
            ErrorCode::InvalidReimburseStatus => "Invalid reimbursement status",
            ErrorCode::ReimburseTransitionInvalid => "Reimbursement status cannot go backwards",
            ErrorCode::ItemNotFound => "Item not found",
            ErrorCode::ItemSkuExists => "Item SKU already exists",

            // Campaign
            ErrorCode::ProjectNotFound => "Voucher project not found",
            ErrorCode::ProjectInactive => "Voucher project is inactive",
            ErrorCode::InvalidPeriod => "Project period end must not precede its start",
            ErrorCode::LimitNotFound => "Voucher limit not found",
            ErrorCode::QuotaExceeded => "Voucher limit reached",
            ErrorCode::DiscountNotFound => "Voucher discount not found",

            // Wholesale & accounts
            ErrorCode::WholesaleNotFound => "Wholesaler not found",
            ErrorCode::WholesaleHierarchyCycle => "Parent assignment would create a cycle",
            ErrorCode::WholesaleInactive => "Wholesaler is inactive",
            ErrorCode::UserNotFound => "User not found",
            ErrorCode::UsernameExists => "Username already exists",

            // Upload
            ErrorCode::FileTooLarge => "File is too large",
            ErrorCode::UnsupportedFileFormat => "Unsupported file format",
            ErrorCode::InvalidImageFile => "Invalid image file",
            ErrorCode::NoFileProvided => "No file provided",
            ErrorCode::EmptyFile => "File is empty",
            ErrorCode::FileStorageFailed => "Failed to store file",

            // System
            ErrorCode::InternalError => "Internal server error",
            ErrorCode::DatabaseError => "Database error",
            ErrorCode::ConfigError => "Configuration error",
        }
    }
}

impl From<ErrorCode> for u16 {
    #[inline]
    fn from(code: ErrorCode) -> Self {
        code.code()
    }
}

/// Error when converting from an invalid u16 to ErrorCode
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct InvalidErrorCode(pub u16);

impl fmt::Display for InvalidErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "invalid error code: {}", self.0)
    }
}

impl std::error::Error for InvalidErrorCode {}

impl TryFrom<u16> for ErrorCode {
    type Error = InvalidErrorCode;

    fn try_from(value: u16) -> Result<Self, Self::Error> {
        match value {
            // General
            0 => Ok(ErrorCode::Success),
            1 => Ok(ErrorCode::Unknown),
            2 => Ok(ErrorCode::ValidationFailed),
            3 => Ok(ErrorCode::NotFound),
            4 => Ok(ErrorCode::AlreadyExists),
            5 => Ok(ErrorCode::InvalidRequest),
            6 => Ok(ErrorCode::InvalidFormat),
            7 => Ok(ErrorCode::RequiredField),
            8 => Ok(ErrorCode::ValueOutOfRange),

            // Auth
            1001 => Ok(ErrorCode::NotAuthenticated),
            1002 => Ok(ErrorCode::InvalidCredentials),
            1003 => Ok(ErrorCode::TokenExpired),
            1004 => Ok(ErrorCode::TokenInvalid),
            1005 => Ok(ErrorCode::RefreshTokenInvalid),
            1006 => Ok(ErrorCode::TooManyAttempts),
            1007 => Ok(ErrorCode::AccountDisabled),
            1008 => Ok(ErrorCode::PasswordTooShort),

            // Permission
            2001 => Ok(ErrorCode::PermissionDenied),
            2002 => Ok(ErrorCode::StaffRequired),

            // Retailer
            3001 => Ok(ErrorCode::RetailerNotFound),
            3002 => Ok(ErrorCode::PhoneAlreadyRegistered),
            3003 => Ok(ErrorCode::NoPhotosFound),
            3004 => Ok(ErrorCode::PhotoRequired),
            3005 => Ok(ErrorCode::PhotosNotVerified),
            3006 => Ok(ErrorCode::PhotosRejected),

            // Voucher
            4001 => Ok(ErrorCode::VoucherNotFound),
            4002 => Ok(ErrorCode::VoucherInvalid),
            4003 => Ok(ErrorCode::VoucherExpired),
            4004 => Ok(ErrorCode::WholesalerMismatch),
            4005 => Ok(ErrorCode::VoucherAlreadyDecided),
            4006 => Ok(ErrorCode::VoucherNotRedeemed),
            4007 => Ok(ErrorCode::VoucherCodeExhausted),
            4008 => Ok(ErrorCode::RedeemNotFound),

            // Settlement
            5001 => Ok(ErrorCode::TransactionAlreadySubmitted),
            5002 => Ok(ErrorCode::ReimburseAlreadySubmitted),
            5003 => Ok(ErrorCode::ReimburseNotFound),
            5004 => Ok(ErrorCode::InvalidReimburseStatus),
            5005 => Ok(ErrorCode::ReimburseTransitionInvalid),
            5101 => Ok(ErrorCode::ItemNotFound),
            5102 => Ok(ErrorCode::ItemSkuExists),

            // Campaign
            6001 => Ok(ErrorCode::ProjectNotFound),
            6002 => Ok(ErrorCode::ProjectInactive),
            6003 => Ok(ErrorCode::InvalidPeriod),
            6101 => Ok(ErrorCode::LimitNotFound),
            6102 => Ok(ErrorCode::QuotaExceeded),
            6201 => Ok(ErrorCode::DiscountNotFound),

            // Wholesale & accounts
            7001 => Ok(ErrorCode::WholesaleNotFound),
            7002 => Ok(ErrorCode::WholesaleHierarchyCycle),
            7003 => Ok(ErrorCode::WholesaleInactive),
            7101 => Ok(ErrorCode::UserNotFound),
            7102 => Ok(ErrorCode::UsernameExists),

            // Upload
            8001 => Ok(ErrorCode::FileTooLarge),
            8002 => Ok(ErrorCode::UnsupportedFileFormat),
            8003 => Ok(ErrorCode::InvalidImageFile),
            8004 => Ok(ErrorCode::NoFileProvided),
            8005 => Ok(ErrorCode::EmptyFile),
            8006 => Ok(ErrorCode::FileStorageFailed),

            // System
            9001 => Ok(ErrorCode::InternalError),
            9002 => Ok(ErrorCode::DatabaseError),
            9005 => Ok(ErrorCode::ConfigError),

            _ => Err(InvalidErrorCode(value)),
        }
    }
}

impl fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.code())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const ALL: &[ErrorCode] = &[
        ErrorCode::Success,
        ErrorCode::Unknown,
        ErrorCode::ValidationFailed,
        ErrorCode::NotFound,
        ErrorCode::AlreadyExists,
        ErrorCode::InvalidRequest,
        ErrorCode::InvalidFormat,
        ErrorCode::RequiredField,
        ErrorCode::ValueOutOfRange,
        ErrorCode::NotAuthenticated,
        ErrorCode::InvalidCredentials,
        ErrorCode::TokenExpired,
        ErrorCode::TokenInvalid,
        ErrorCode::RefreshTokenInvalid,
        ErrorCode::TooManyAttempts,
        ErrorCode::AccountDisabled,
        ErrorCode::PasswordTooShort,
        ErrorCode::PermissionDenied,
        ErrorCode::StaffRequired,
        ErrorCode::RetailerNotFound,
        ErrorCode::PhoneAlreadyRegistered,
        ErrorCode::NoPhotosFound,
        ErrorCode::PhotoRequired,
        ErrorCode::PhotosNotVerified,
        ErrorCode::PhotosRejected,
        ErrorCode::VoucherNotFound,
        ErrorCode::VoucherInvalid,
        ErrorCode::VoucherExpired,
        ErrorCode::WholesalerMismatch,
        ErrorCode::VoucherAlreadyDecided,
        ErrorCode::VoucherNotRedeemed,
        ErrorCode::VoucherCodeExhausted,
        ErrorCode::RedeemNotFound,
        ErrorCode::TransactionAlreadySubmitted,
        ErrorCode::ReimburseAlreadySubmitted,
        ErrorCode::ReimburseNotFound,
        ErrorCode::InvalidReimburseStatus,
        ErrorCode::ReimburseTransitionInvalid,
        ErrorCode::ItemNotFound,
        ErrorCode::ItemSkuExists,
        ErrorCode::ProjectNotFound,
        ErrorCode::ProjectInactive,
        ErrorCode::InvalidPeriod,
        ErrorCode::LimitNotFound,
        ErrorCode::QuotaExceeded,
        ErrorCode::DiscountNotFound,
        ErrorCode::WholesaleNotFound,
        ErrorCode::WholesaleHierarchyCycle,
        ErrorCode::WholesaleInactive,
        ErrorCode::UserNotFound,
        ErrorCode::UsernameExists,
        ErrorCode::FileTooLarge,
        ErrorCode::UnsupportedFileFormat,
        ErrorCode::InvalidImageFile,
        ErrorCode::NoFileProvided,
        ErrorCode::EmptyFile,
        ErrorCode::FileStorageFailed,
        ErrorCode::InternalError,
        ErrorCode::DatabaseError,
        ErrorCode::ConfigError,
    ];

    #[test]
    fn test_error_code_values() {
        assert_eq!(ErrorCode::Success.code(), 0);
        assert_eq!(ErrorCode::NotFound.code(), 3);
        assert_eq!(ErrorCode::NotAuthenticated.code(), 1001);
        assert_eq!(ErrorCode::StaffRequired.code(), 2002);
        assert_eq!(ErrorCode::PhoneAlreadyRegistered.code(), 3002);
        assert_eq!(ErrorCode::VoucherExpired.code(), 4003);
        assert_eq!(ErrorCode::TransactionAlreadySubmitted.code(), 5001);
        assert_eq!(ErrorCode::QuotaExceeded.code(), 6102);
        assert_eq!(ErrorCode::WholesaleHierarchyCycle.code(), 7002);
        assert_eq!(ErrorCode::FileTooLarge.code(), 8001);
        assert_eq!(ErrorCode::InternalError.code(), 9001);
    }

    #[test]
    fn test_every_code_roundtrips_through_u16() {
        for code in ALL {
            let raw: u16 = (*code).into();
            assert_eq!(ErrorCode::try_from(raw), Ok(*code), "code {raw}");
        }
    }

    #[test]
    fn test_codes_are_unique() {
        let mut seen = std::collections::HashSet::new();
        for code in ALL {
            assert!(seen.insert(code.code()), "duplicate code {}", code.code());
        }
    }

    #[test]
    fn test_try_from_invalid() {
        assert_eq!(ErrorCode::try_from(999), Err(InvalidErrorCode(999)));
        assert_eq!(ErrorCode::try_from(10000), Err(InvalidErrorCode(10000)));
        assert_eq!(ErrorCode::try_from(4999), Err(InvalidErrorCode(4999)));
    }

    #[test]
    fn test_serialize() {
        assert_eq!(serde_json::to_string(&ErrorCode::NotFound).unwrap(), "3");
        assert_eq!(
            serde_json::to_string(&ErrorCode::VoucherInvalid).unwrap(),
            "4002"
        );
    }

    #[test]
    fn test_deserialize() {
        let code: ErrorCode = serde_json::from_str("6102").unwrap();
        assert_eq!(code, ErrorCode::QuotaExceeded);

        let result: Result<ErrorCode, _> = serde_json::from_str("999");
        assert!(result.is_err());
    }

    #[test]
    fn test_display() {
        assert_eq!(format!("{}", ErrorCode::Success), "0");
        assert_eq!(format!("{}", ErrorCode::VoucherNotFound), "4001");
    }

    #[test]
    fn test_message() {
        assert_eq!(ErrorCode::NotFound.message(), "Resource not found");
        assert_eq!(ErrorCode::QuotaExceeded.message(), "Voucher limit reached");
        assert_eq!(ErrorCode::InternalError.message(), "Internal server error");
    }

    #[test]
    fn test_invalid_error_code_display() {
        let err = InvalidErrorCode(999);
        assert_eq!(format!("{}", err), "invalid error code: 999");
    }
}
