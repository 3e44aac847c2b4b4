//! Slack `"<unix-seconds>.<micros>"` timestamps.

use chrono::{DateTime, Utc};

use crate::{AppError, Result};

/// Digits of sub-second precision carried by Slack timestamps.
const FRACTION_DIGITS: usize = 6;

/// Parse a Slack timestamp into an instant.
///
/// An empty string means "no activity" and yields `Ok(None)`. The fractional
/// part is right-padded or truncated to six digits and read as microseconds.
///
/// # Errors
///
/// Returns `AppError::Transport` if either part is not a decimal number.
pub fn parse_slack_ts(ts: &str) -> Result<Option<DateTime<Utc>>> {
    let ts = ts.trim();
    if ts.is_empty() {
        return Ok(None);
    }

    let (secs, frac) = ts.split_once('.').unwrap_or((ts, ""));
    if secs.is_empty() || !secs.bytes().all(|b| b.is_ascii_digit()) {
        return Err(invalid(ts));
    }
    if !frac.bytes().all(|b| b.is_ascii_digit()) {
        return Err(invalid(ts));
    }

    let secs: i64 = secs.parse().map_err(|_| invalid(ts))?;
    let mut micros: String = frac.chars().take(FRACTION_DIGITS).collect();
    while micros.len() < FRACTION_DIGITS {
        micros.push('0');
    }
    let micros: u32 = micros.parse().map_err(|_| invalid(ts))?;

    DateTime::from_timestamp(secs, micros * 1_000)
        .map(Some)
        .ok_or_else(|| invalid(ts))
}

/// Format an instant as a Slack timestamp.
#[must_use]
pub fn format_slack_ts(instant: DateTime<Utc>) -> String {
    format!(
        "{}.{:06}",
        instant.timestamp(),
        instant.timestamp_subsec_micros()
    )
}

fn invalid(ts: &str) -> AppError {
    AppError::Transport(format!("invalid slack timestamp {ts:?}"))
}
