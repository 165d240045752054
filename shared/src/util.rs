use rand::Rng;

/// Current UTC timestamp in milliseconds
pub fn now_millis() -> i64 {
    chrono::Utc::now().timestamp_millis()
}

/// Length of a voucher code
pub const VOUCHER_CODE_LEN: usize = 10;

const VOUCHER_CODE_ALPHABET: &[u8] = b"ABCDEFGHIJKLMNOPQRSTUVWXYZ0123456789";

/// Normalize an Indonesian phone number to the international `62` prefix.
///
/// A leading `0` is replaced with `62`; anything else is returned unchanged
/// (after trimming), so the function is idempotent.
pub fn normalize_phone(phone: &str) -> String {
    let phone = phone.trim();
    match phone.strip_prefix('0') {
        Some(rest) => format!("62{rest}"),
        None => phone.to_string(),
    }
}

/// Generate a random voucher code of [`VOUCHER_CODE_LEN`] characters from `[A-Z0-9]`.
///
/// Uniqueness is not guaranteed here; callers rely on the database constraint
/// and retry on conflict.
pub fn generate_voucher_code() -> String {
    let mut rng = rand::thread_rng();
    (0..VOUCHER_CODE_LEN)
        .map(|_| {
            let idx = rng.gen_range(0..VOUCHER_CODE_ALPHABET.len());
            VOUCHER_CODE_ALPHABET[idx] as char
        })
        .collect()
}

/// Whether `code` has the shape of a generated voucher code
pub fn is_voucher_code(code: &str) -> bool {
    code.len() == VOUCHER_CODE_LEN
        && code
            .bytes()
            .all(|b| b.is_ascii_uppercase() || b.is_ascii_digit())
}
