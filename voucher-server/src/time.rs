//! Business-timezone date handling
//!
//! Date strings are converted to Unix millis here; the db layer only sees `i64`.

use chrono::{DateTime, NaiveDate};
use chrono_tz::Tz;
use shared::error::{AppError, AppResult, ErrorCode};

/// Timezone project periods are defined in
pub const BUSINESS_TZ: Tz = chrono_tz::Asia::Jakarta;

/// Parse `YYYY-MM-DD`, or an RFC 3339 timestamp reduced to its business-timezone date
pub fn parse_business_date(value: &str) -> AppResult<NaiveDate> {
    let value = value.trim();
    if let Ok(date) = NaiveDate::parse_from_str(value, "%Y-%m-%d") {
        return Ok(date);
    }
    DateTime::parse_from_rfc3339(value)
        .map(|dt| dt.with_timezone(&BUSINESS_TZ).date_naive())
        .map_err(|_| {
            AppError::with_message(
                ErrorCode::InvalidFormat,
                format!("Invalid date: {value} (expected YYYY-MM-DD)"),
            )
        })
}

fn local_midnight_millis(date: NaiveDate, tz: Tz) -> i64 {
    let naive = date.and_time(chrono::NaiveTime::MIN);
    naive
        .and_local_timezone(tz)
        .earliest()
        .map(|dt| dt.timestamp_millis())
        .unwrap_or_else(|| naive.and_utc().timestamp_millis())
}

/// 00:00:00.000 of `date` in the business timezone
pub fn day_start_millis(date: NaiveDate) -> i64 {
    local_midnight_millis(date, BUSINESS_TZ)
}

/// 23:59:59.999 of `date` in the business timezone
pub fn day_end_millis(date: NaiveDate) -> i64 {
    let next = date.succ_opt().unwrap_or(date);
    local_midnight_millis(next, BUSINESS_TZ) - 1
}

/// Normalize a project period to whole business days.
pub fn normalize_period(start: &str, end: &str) -> AppResult<(i64, i64)> {
    let start = day_start_millis(parse_business_date(start)?);
    let end = day_end_millis(parse_business_date(end)?);
    if end < start {
        return Err(AppError::new(ErrorCode::InvalidPeriod));
    }
    Ok((start, end))
}

/// Parse a voucher expiry: a bare date expires at the end of that business
/// day, a full timestamp at that instant.
pub fn parse_expiry(value: &str) -> AppResult<i64> {
    let value = value.trim();
    if let Ok(dt) = DateTime::parse_from_rfc3339(value) {
        return Ok(dt.timestamp_millis());
    }
    parse_business_date(value).map(day_end_millis)
}
