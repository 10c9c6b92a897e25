//! Integer time-of-day codec.
//!
//! The backend stores times of day as `hour * 100 + minute` (so `08:30` is
//! `830` and end-of-day is `2400`). These helpers convert between that form,
//! absolute minutes and the `"HH:MM"` strings shown in the console.

use std::sync::LazyLock;

use regex::Regex;

use crate::types::Hhmm;

/// Start of day.
pub const MIN_HHMM: Hhmm = 0;

/// End of day. Valid as an end time only.
pub const MAX_HHMM: Hhmm = 2400;

/// Display value used whenever an encoded time cannot be decoded.
pub const FALLBACK_DISPLAY: &str = "00:00";

/// Zero-padded four digit form: hour `00..=24`, minute `00..=59`.
static HHMM_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^([01][0-9]|2[0-4])[0-5][0-9]$").expect("valid regex"));

// ---------------------------------------------------------------------------
// Encoding
// ---------------------------------------------------------------------------

/// Encode an hour/minute pair.
///
/// Valid inputs are `hours` in `0..=24` and `minutes` in `0..=59`; nothing is
/// checked here, use [`is_valid`] on the result when the input is untrusted.
pub fn encode(hours: i32, minutes: i32) -> Hhmm {
    hours * 100 + minutes
}

/// Whether `hhmm` satisfies the `HH in 00..=24, MM in 00..=59` constraint.
pub fn is_valid(hhmm: Hhmm) -> bool {
    hhmm >= 0 && HHMM_RE.is_match(&format!("{hhmm:04}"))
}

/// Format an encoded time as `"HH:MM"`.
///
/// Invalid values degrade to [`FALLBACK_DISPLAY`] instead of failing.
///
/// # Examples
///
/// ```
/// use crewboard_core::hhmm::decode;
/// assert_eq!(decode(830), "08:30");
/// assert_eq!(decode(2560), "00:00");
/// ```
pub fn decode(hhmm: Hhmm) -> String {
    if !is_valid(hhmm) {
        return FALLBACK_DISPLAY.to_string();
    }
    let digits = format!("{hhmm:04}");
    format!("{}:{}", &digits[..2], &digits[2..])
}

/// Parse user input of the form `"HH:MM"` or `"H:MM"`.
///
/// Returns `None` when the text is malformed or outside the valid domain.
pub fn parse(text: &str) -> Option<Hhmm> {
    let (hours, minutes) = text.trim().split_once(':')?;
    if hours.is_empty() || hours.len() > 2 || minutes.len() != 2 {
        return None;
    }
    let hours: i32 = hours.parse().ok()?;
    let minutes: i32 = minutes.parse().ok()?;
    let value = encode(hours, minutes);
    is_valid(value).then_some(value)
}

// ---------------------------------------------------------------------------
// Arithmetic
// ---------------------------------------------------------------------------

/// Convert to minutes since midnight.
pub fn to_minutes(hhmm: Hhmm) -> i32 {
    (hhmm / 100) * 60 + hhmm % 100
}

/// Convert minutes since midnight back to the encoded form.
pub fn from_minutes(total: i32) -> Hhmm {
    (total / 60) * 100 + total % 60
}

/// Add `delta` minutes to an encoded time.
///
/// The result is not clamped to `0..=2400`; a delta that crosses midnight
/// produces a value outside the domain.
pub fn add_minutes(hhmm: Hhmm, delta: i32) -> Hhmm {
    from_minutes(to_minutes(hhmm) + delta)
}

/// Minutes from `start` to `end`. Negative when `end` is earlier.
pub fn minutes_between(start: Hhmm, end: Hhmm) -> i32 {
    to_minutes(end) - to_minutes(start)
}

/// Round to the nearest multiple of `granularity` minutes.
///
/// A non-positive granularity leaves the value unchanged.
pub fn snap(hhmm: Hhmm, granularity: i32) -> Hhmm {
    if granularity <= 0 {
        return hhmm;
    }
    let minutes = to_minutes(hhmm);
    let snapped = ((minutes + granularity / 2) / granularity) * granularity;
    from_minutes(snapped)
}
