//! Number formatting and float-to-integer conversion.
//!
//! Balances in this game span hundreds of orders of magnitude. Display
//! uses short-scale suffixes up to decillions and scientific notation
//! beyond. Conversions from `f64` saturate instead of wrapping.

use chrono::{DateTime, TimeDelta, Utc};

/// Short-scale suffixes, one per power of 1000 starting at 1e3.
const SUFFIXES: [&str; 11] = ["K", "M", "B", "T", "Qa", "Qi", "Sx", "Sp", "Oc", "No", "Dc"];

/// Values at or above this are always shown in scientific notation.
const SCIENTIFIC_FLOOR: f64 = 1e306;

/// Render an amount for display.
///
/// - below 1000: up to two decimals, trailing zeros trimmed
/// - up to the suffix table: three significant figures and a suffix
/// - beyond it, at or above `1e306`, or non-finite: scientific notation,
///   with infinities clamped to `f64::MAX`
pub fn format_amount(value: f64) -> String {
    if value.is_nan() {
        return "0".to_owned();
    }
    let sign = if value < 0.0 { "-" } else { "" };
    let magnitude = value.abs().min(f64::MAX);

    if magnitude < 1000.0 {
        let fixed = format!("{magnitude:.2}");
        let trimmed = fixed.trim_end_matches('0').trim_end_matches('.');
        return format!("{sign}{trimmed}");
    }

    if magnitude < SCIENTIFIC_FLOOR {
        let mut scaled = magnitude;
        for suffix in SUFFIXES {
            scaled /= 1000.0;
            if scaled < 999.995 {
                return format!("{sign}{}{suffix}", three_significant(scaled));
            }
        }
    }

    format!("{sign}{magnitude:.3e}")
}

/// Three significant figures for a value in `[1, 1000)`.
fn three_significant(value: f64) -> String {
    if value >= 100.0 {
        format!("{value:.0}")
    } else if value >= 10.0 {
        format!("{value:.1}")
    } else {
        format!("{value:.2}")
    }
}

/// Replace NaN with zero and infinities with the largest finite value of
/// the same sign.
pub fn finite_or_clamped(value: f64) -> f64 {
    if value.is_nan() {
        0.0
    } else {
        value.clamp(f64::MIN, f64::MAX)
    }
}

/// Round down to a `u64`, saturating. Negative and NaN inputs give 0.
#[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
pub fn floor_to_u64(value: f64) -> u64 {
    if value.is_nan() || value <= 0.0 {
        return 0;
    }
    // `as` saturates at u64::MAX for out-of-range floats.
    value.floor() as u64
}

/// Round down to a `u32`, saturating. Negative and NaN inputs give 0.
#[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
pub fn floor_to_u32(value: f64) -> u32 {
    if value.is_nan() || value <= 0.0 {
        return 0;
    }
    value.floor() as u32
}

/// Convert fractional seconds to a [`TimeDelta`] with millisecond
/// precision. Non-positive and NaN inputs give zero; huge inputs saturate
/// at the largest representable delta.
#[allow(clippy::cast_possible_truncation)]
pub fn seconds_to_delta(seconds: f64) -> TimeDelta {
    if seconds.is_nan() || seconds <= 0.0 {
        return TimeDelta::zero();
    }
    let millis = (seconds * 1000.0).round().min(i64::MAX as f64) as i64;
    TimeDelta::try_milliseconds(millis).unwrap_or(TimeDelta::MAX)
}

/// `9999-12-31T23:59:59Z`, the last instant with a four-digit RFC 3339 year.
const LATEST_DEADLINE_SECS: i64 = 253_402_300_799;

/// `now` plus `seconds`, saturating at the end of year 9999 so saved
/// deadlines stay valid RFC 3339.
pub fn deadline(now: DateTime<Utc>, seconds: f64) -> DateTime<Utc> {
    let latest = DateTime::from_timestamp(LATEST_DEADLINE_SECS, 0)
        .unwrap_or(DateTime::<Utc>::MAX_UTC)
        .max(now);
    now.checked_add_signed(seconds_to_delta(seconds))
        .map_or(latest, |end| end.min(latest))
}

/// Fractional seconds in a [`TimeDelta`], floored at zero.
pub fn delta_to_seconds(delta: TimeDelta) -> f64 {
    (delta.num_milliseconds() as f64 / 1000.0).max(0.0)
}
