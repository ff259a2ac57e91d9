//! EOL validity timestamps.
//!
//! Records carry their expiry as RFC 3339 text with nine fractional digits,
//! always in UTC: `2030-01-01T00:00:00.000000000Z`.

use chrono::{DateTime, NaiveDateTime, SecondsFormat, TimeZone, Timelike, Utc};
use std::time::Duration;

use crate::error::CoreError;

/// Render an instant in the canonical validity form.
pub fn format_validity(at: DateTime<Utc>) -> String {
    at.to_rfc3339_opts(SecondsFormat::Nanos, true)
}

/// Strictly parse a validity string: `YYYY-MM-DDThh:mm:ss.f+Z`.
///
/// A fractional part is required. Digits past the ninth are truncated.
pub fn parse_validity(input: &str) -> Result<DateTime<Utc>, CoreError> {
    let unrecognized = || CoreError::UnrecognizedValidityFormat(input.to_string());

    let s = input.trim();
    let body = s.strip_suffix('Z').ok_or_else(unrecognized)?;
    let (datetime, fraction) = body.split_once('.').ok_or_else(unrecognized)?;
    if datetime.len() != 19
        || fraction.is_empty()
        || !fraction.bytes().all(|b| b.is_ascii_digit())
    {
        return Err(unrecognized());
    }

    let naive =
        NaiveDateTime::parse_from_str(datetime, "%Y-%m-%dT%H:%M:%S").map_err(|_| unrecognized())?;

    let digits = &fraction[..fraction.len().min(9)];
    let mut nanos: u32 = digits.parse().map_err(|_| unrecognized())?;
    for _ in digits.len()..9 {
        nanos *= 10;
    }
    let naive = naive.with_nanosecond(nanos).ok_or_else(unrecognized)?;

    Ok(Utc.from_utc_datetime(&naive))
}

/// `now + lifetime`, failing if the result is not representable.
pub fn expiration_from_lifetime(
    now: DateTime<Utc>,
    lifetime: Duration,
) -> Result<DateTime<Utc>, CoreError> {
    let delta = chrono::Duration::from_std(lifetime)
        .map_err(|_| CoreError::InvalidLifetime(format!("{lifetime:?} is out of range")))?;
    now.checked_add_signed(delta)
        .ok_or_else(|| CoreError::InvalidLifetime(format!("{lifetime:?} overflows the calendar")))
}

/// Accept any RFC 3339 timestamp and re-render it canonically in UTC.
pub fn canonicalize_expiration(input: &str) -> Result<String, CoreError> {
    let parsed = DateTime::parse_from_rfc3339(input.trim())
        .map_err(|_| CoreError::UnrecognizedValidityFormat(input.to_string()))?;
    Ok(format_validity(parsed.with_timezone(&Utc)))
}

/// Milliseconds from `now` until `expiry`, clamped at zero.
pub fn millis_until(expiry: DateTime<Utc>, now: DateTime<Utc>) -> u64 {
    let remaining = expiry.signed_duration_since(now).num_milliseconds();
    u64::try_from(remaining).unwrap_or(0)
}
