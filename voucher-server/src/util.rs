//! Password hashing and input validation helpers

use shared::error::{AppError, ErrorCode};

// ── Text length limits ──────────────────────────────────────────────

/// Names: retailer, wholesaler, project, item
pub const MAX_NAME_LEN: usize = 255;
/// Phone numbers (normalized)
pub const MAX_PHONE_LEN: usize = 15;
/// Photo remarks
pub const MAX_REMARKS_LEN: usize = 50;
/// Region names (kelurahan, kecamatan, kota, provinsi)
pub const MAX_REGION_LEN: usize = 100;
/// Usernames and PIC names
pub const MAX_SHORT_TEXT_LEN: usize = 50;
/// Item SKU
pub const MAX_SKU_LEN: usize = 3;
/// Addresses and descriptions
pub const MAX_TEXT_LEN: usize = 1000;
/// Minimum password length
pub const MIN_PASSWORD_LEN: usize = 8;

// ── Passwords ───────────────────────────────────────────────────────

pub fn hash_password(password: &str) -> Result<String, argon2::password_hash::Error> {
    use argon2::password_hash::SaltString;
    use argon2::password_hash::rand_core::OsRng;
    use argon2::{Argon2, PasswordHasher};
    let salt = SaltString::generate(&mut OsRng);
    let hash = Argon2::default().hash_password(password.as_bytes(), &salt)?;
    Ok(hash.to_string())
}

pub fn verify_password(password: &str, hash: &str) -> bool {
    use argon2::{Argon2, PasswordHash, PasswordVerifier};
    let Ok(parsed) = PasswordHash::new(hash) else {
        return false;
    };
    Argon2::default()
        .verify_password(password.as_bytes(), &parsed)
        .is_ok()
}

/// Hash a password after checking its length
pub fn hash_new_password(password: &str) -> Result<String, AppError> {
    if password.chars().count() < MIN_PASSWORD_LEN {
        return Err(AppError::new(ErrorCode::PasswordTooShort));
    }
    hash_password(password).map_err(|e| {
        tracing::error!("Password hashing failed: {e}");
        AppError::new(ErrorCode::InternalError)
    })
}

// ── Validation ──────────────────────────────────────────────────────

/// Validate that a required string is non-empty and within the length limit.
pub fn validate_required_text(value: &str, field: &str, max_len: usize) -> Result<(), AppError> {
    if value.trim().is_empty() {
        return Err(AppError::required(field));
    }
    if value.chars().count() > max_len {
        return Err(AppError::validation(format!(
            "{field} is too long ({} chars, max {max_len})",
            value.chars().count()
        ))
        .with_detail("field", field));
    }
    Ok(())
}

/// Validate that an optional string, if present, is within the length limit.
pub fn validate_optional_text(
    value: Option<&str>,
    field: &str,
    max_len: usize,
) -> Result<(), AppError> {
    if let Some(v) = value
        && v.chars().count() > max_len
    {
        return Err(AppError::validation(format!(
            "{field} is too long ({} chars, max {max_len})",
            v.chars().count()
        ))
        .with_detail("field", field));
    }
    Ok(())
}

/// Normalize and validate a phone number (digits only after normalization)
pub fn validate_phone(raw: &str, field: &str) -> Result<String, AppError> {
    let phone = shared::util::normalize_phone(raw);
    validate_required_text(&phone, field, MAX_PHONE_LEN)?;
    if !phone.bytes().all(|b| b.is_ascii_digit()) {
        return Err(
            AppError::validation(format!("{field} must contain digits only"))
                .with_detail("field", field),
        );
    }
    Ok(phone)
}

/// Trim an optional string, mapping blank to `None`
pub fn non_blank(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}
