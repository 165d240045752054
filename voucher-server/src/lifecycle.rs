//! Voucher lifecycle rules
//!
//! Pure checks evaluated by the db layer on rows it has already locked
//! inside a transaction. Keeping them free of I/O lets every transition rule
//! be tested without a database.
//!
//! ```text
//! PENDING ──approve──▶ RECEIVED ──redeem──▶ REDEEMED ──submit──▶ WAITING PAYMENT
//!    │                                                             │
//!    └──reject──▶ REJECTED                          completed ◀────┘ ──▶ PAID
//! ```

use shared::error::{AppError, ErrorCode};
use shared::models::ReimburseStatusKind;

/// Voucher fields the redemption rules look at
#[derive(Debug, Clone)]
pub struct RedeemCandidate {
    pub redeemed: bool,
    pub is_approved: bool,
    pub is_rejected: bool,
    pub expired_at: Option<i64>,
    /// Owning wholesaler of the voucher's retailer
    pub retailer_wholesale_id: Option<i64>,
}

/// Review flags of one photo
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(test, derive(Default))]
pub struct PhotoFlags {
    pub is_verified: bool,
    pub is_approved: bool,
    pub is_rejected: bool,
}

/// Decide whether `voucher` may be redeemed by `wholesale_id` at `now`.
///
/// Checks run in a fixed order so clients always see the first failing rule:
/// redeemed, expiry, ownership, then photo review.
pub fn check_redeemable(
    voucher: &RedeemCandidate,
    photos: &[PhotoFlags],
    wholesale_id: i64,
    now: i64,
) -> Result<(), AppError> {
    if voucher.redeemed {
        return Err(AppError::new(ErrorCode::VoucherInvalid));
    }
    if let Some(expired_at) = voucher.expired_at
        && expired_at <= now
    {
        return Err(AppError::new(ErrorCode::VoucherExpired).with_detail("expired_at", expired_at));
    }
    if voucher.retailer_wholesale_id != Some(wholesale_id) {
        return Err(AppError::new(ErrorCode::WholesalerMismatch));
    }
    if voucher.is_rejected || photos.iter().any(|p| p.is_rejected) {
        return Err(AppError::new(ErrorCode::PhotosRejected));
    }
    let all_approved = !photos.is_empty() && photos.iter().all(|p| p.is_verified && p.is_approved);
    if !voucher.is_approved || !all_approved {
        return Err(AppError::new(ErrorCode::PhotosNotVerified));
    }
    Ok(())
}

/// Office decision on a registration's photos
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PhotoDecision {
    Approve,
    Reject,
}

impl PhotoDecision {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Approve => "approve",
            Self::Reject => "reject",
        }
    }
}

/// Approve/reject is only possible once: the voucher must still be pending
/// and the retailer must have photos.
pub fn check_decidable(is_approved: bool, is_rejected: bool, photo_count: i64) -> Result<(), AppError> {
    if photo_count == 0 {
        return Err(AppError::new(ErrorCode::NoPhotosFound));
    }
    if is_approved || is_rejected {
        return Err(AppError::new(ErrorCode::VoucherAlreadyDecided)
            .with_detail("is_approved", is_approved)
            .with_detail("is_rejected", is_rejected));
    }
    Ok(())
}

/// A voucher may enter reimbursement once it is redeemed and has no claim yet
pub fn check_reimbursable(redeemed: bool, has_claim: bool) -> Result<(), AppError> {
    if has_claim {
        return Err(AppError::new(ErrorCode::ReimburseAlreadySubmitted));
    }
    if !redeemed {
        return Err(AppError::new(ErrorCode::VoucherNotRedeemed));
    }
    Ok(())
}

/// Parse the target of a status change. Only `completed` and `paid` may be
/// set explicitly; `waiting` is assigned on submission.
pub fn parse_target_status(raw: &str) -> Result<ReimburseStatusKind, AppError> {
    match raw.parse::<ReimburseStatusKind>() {
        Ok(status @ (ReimburseStatusKind::Completed | ReimburseStatusKind::Paid)) => Ok(status),
        _ => Err(AppError::with_message(
            ErrorCode::InvalidReimburseStatus,
            format!("Invalid status '{raw}', expected one of: completed, paid"),
        )),
    }
}

/// Status may only move forward along `waiting < completed < paid`
pub fn check_reimburse_transition(
    current: Option<ReimburseStatusKind>,
    next: ReimburseStatusKind,
) -> Result<(), AppError> {
    let current = current.unwrap_or(ReimburseStatusKind::Waiting);
    if next <= current {
        return Err(AppError::new(ErrorCode::ReimburseTransitionInvalid)
            .with_detail("current", current.as_str())
            .with_detail("requested", next.as_str()));
    }
    Ok(())
}

/// Whether `by` more units fit under `limit`
pub fn quota_allows(current_count: i32, limit: i32, by: i32) -> bool {
    by >= 1
        && current_count
            .checked_add(by)
            .is_some_and(|next| next <= limit)
}

/// Check a counter's stored values against `0 <= current_count <= limit`
pub fn check_limit_values(limit: i32, current_count: i32) -> Result<(), AppError> {
    if limit < 0 {
        return Err(AppError::with_message(
            ErrorCode::ValueOutOfRange,
            "limit must not be negative",
        ));
    }
    if current_count < 0 || current_count > limit {
        return Err(AppError::with_message(
            ErrorCode::ValueOutOfRange,
            format!("current_count must be between 0 and limit ({limit})"),
        ));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    const NOW: i64 = 1_700_000_000_000;
    const WS: i64 = 7;

    fn approved_voucher() -> RedeemCandidate {
        RedeemCandidate {
            redeemed: false,
            is_approved: true,
            is_rejected: false,
            expired_at: Some(NOW + 86_400_000),
            retailer_wholesale_id: Some(WS),
        }
    }

    fn approved_photo() -> PhotoFlags {
        PhotoFlags {
            is_verified: true,
            is_approved: true,
            is_rejected: false,
        }
    }

    fn code(result: Result<(), AppError>) -> ErrorCode {
        result.unwrap_err().code
    }

    #[test]
    fn test_redeem_happy_path() {
        let photos = [approved_photo(), approved_photo()];
        assert!(check_redeemable(&approved_voucher(), &photos, WS, NOW).is_ok());
    }

    #[test]
    fn test_redeem_without_expiry() {
        let voucher = RedeemCandidate {
            expired_at: None,
            ..approved_voucher()
        };
        assert!(check_redeemable(&voucher, &[approved_photo()], WS, NOW).is_ok());
    }

    #[test]
    fn test_redeem_already_redeemed() {
        let voucher = RedeemCandidate {
            redeemed: true,
            ..approved_voucher()
        };
        assert_eq!(
            code(check_redeemable(&voucher, &[approved_photo()], WS, NOW)),
            ErrorCode::VoucherInvalid
        );
    }

    #[test]
    fn test_redeem_expired() {
        let voucher = RedeemCandidate {
            expired_at: Some(NOW - 1),
            ..approved_voucher()
        };
        assert_eq!(
            code(check_redeemable(&voucher, &[approved_photo()], WS, NOW)),
            ErrorCode::VoucherExpired
        );

        let at_cutoff = RedeemCandidate {
            expired_at: Some(NOW),
            ..approved_voucher()
        };
        assert_eq!(
            code(check_redeemable(&at_cutoff, &[approved_photo()], WS, NOW)),
            ErrorCode::VoucherExpired
        );
    }

    #[test]
    fn test_redeem_wrong_wholesaler() {
        assert_eq!(
            code(check_redeemable(&approved_voucher(), &[approved_photo()], WS + 1, NOW)),
            ErrorCode::WholesalerMismatch
        );

        let orphan = RedeemCandidate {
            retailer_wholesale_id: None,
            ..approved_voucher()
        };
        assert_eq!(
            code(check_redeemable(&orphan, &[approved_photo()], WS, NOW)),
            ErrorCode::WholesalerMismatch
        );
    }

    #[test]
    fn test_redeem_requires_reviewed_photos() {
        let pending = RedeemCandidate {
            is_approved: false,
            ..approved_voucher()
        };
        assert_eq!(
            code(check_redeemable(&pending, &[PhotoFlags::default()], WS, NOW)),
            ErrorCode::PhotosNotVerified
        );

        let mixed = [approved_photo(), PhotoFlags::default()];
        assert_eq!(
            code(check_redeemable(&approved_voucher(), &mixed, WS, NOW)),
            ErrorCode::PhotosNotVerified
        );

        assert_eq!(
            code(check_redeemable(&approved_voucher(), &[], WS, NOW)),
            ErrorCode::PhotosNotVerified
        );
    }

    #[test]
    fn test_redeem_rejected_registration() {
        let rejected = RedeemCandidate {
            is_approved: false,
            is_rejected: true,
            ..approved_voucher()
        };
        let photo = PhotoFlags {
            is_verified: true,
            is_approved: false,
            is_rejected: true,
        };
        assert_eq!(
            code(check_redeemable(&rejected, &[photo], WS, NOW)),
            ErrorCode::PhotosRejected
        );
    }

    #[test]
    fn test_redeem_check_order() {
        // Redeemed and expired and wrong wholesaler: redeemed is reported first
        let voucher = RedeemCandidate {
            redeemed: true,
            expired_at: Some(NOW - 1),
            retailer_wholesale_id: Some(WS + 1),
            ..approved_voucher()
        };
        assert_eq!(
            code(check_redeemable(&voucher, &[], WS, NOW)),
            ErrorCode::VoucherInvalid
        );

        // Expired and wrong wholesaler: expiry first
        let voucher = RedeemCandidate {
            expired_at: Some(NOW - 1),
            retailer_wholesale_id: Some(WS + 1),
            ..approved_voucher()
        };
        assert_eq!(
            code(check_redeemable(&voucher, &[], WS, NOW)),
            ErrorCode::VoucherExpired
        );
    }

    #[test]
    fn test_decidable() {
        assert!(check_decidable(false, false, 2).is_ok());
        assert_eq!(code(check_decidable(false, false, 0)), ErrorCode::NoPhotosFound);
        assert_eq!(
            code(check_decidable(true, false, 1)),
            ErrorCode::VoucherAlreadyDecided
        );
        assert_eq!(
            code(check_decidable(false, true, 1)),
            ErrorCode::VoucherAlreadyDecided
        );
    }

    #[test]
    fn test_reimbursable() {
        assert!(check_reimbursable(true, false).is_ok());
        assert_eq!(
            code(check_reimbursable(true, true)),
            ErrorCode::ReimburseAlreadySubmitted
        );
        assert_eq!(
            code(check_reimbursable(false, false)),
            ErrorCode::VoucherNotRedeemed
        );
    }

    #[test]
    fn test_parse_target_status() {
        assert_eq!(
            parse_target_status("completed").unwrap(),
            ReimburseStatusKind::Completed
        );
        assert_eq!(parse_target_status("PAID").unwrap(), ReimburseStatusKind::Paid);
        assert_eq!(
            parse_target_status("waiting").unwrap_err().code,
            ErrorCode::InvalidReimburseStatus
        );
        assert_eq!(
            parse_target_status("refunded").unwrap_err().code,
            ErrorCode::InvalidReimburseStatus
        );
    }

    #[test]
    fn test_reimburse_transitions() {
        use ReimburseStatusKind::*;
        assert!(check_reimburse_transition(Some(Waiting), Completed).is_ok());
        assert!(check_reimburse_transition(Some(Completed), Paid).is_ok());
        assert!(check_reimburse_transition(Some(Waiting), Paid).is_ok());
        assert!(check_reimburse_transition(None, Completed).is_ok());

        assert_eq!(
            code(check_reimburse_transition(Some(Completed), Completed)),
            ErrorCode::ReimburseTransitionInvalid
        );
        assert_eq!(
            code(check_reimburse_transition(Some(Paid), Completed)),
            ErrorCode::ReimburseTransitionInvalid
        );
    }

    #[test]
    fn test_quota_allows() {
        assert!(quota_allows(0, 5, 1));
        assert!(quota_allows(4, 5, 1));
        assert!(!quota_allows(5, 5, 1));
        assert!(quota_allows(2, 5, 3));
        assert!(!quota_allows(3, 5, 3));
        assert!(!quota_allows(0, 5, 0));
        assert!(!quota_allows(i32::MAX, i32::MAX, 1));
    }

    #[test]
    fn test_limit_values() {
        assert!(check_limit_values(5, 0).is_ok());
        assert!(check_limit_values(5, 5).is_ok());
        assert!(check_limit_values(0, 0).is_ok());
        assert!(check_limit_values(5, 6).is_err());
        assert!(check_limit_values(5, -1).is_err());
        assert!(check_limit_values(-1, 0).is_err());
    }

    #[test]
    fn test_photo_decision_labels() {
        assert_eq!(PhotoDecision::Approve.as_str(), "approve");
        assert_eq!(PhotoDecision::Reject.as_str(), "reject");
    }
}
