//! Local calendar day to UTC window conversion.
//!
//! A window runs from `day_start_hour` on the requested local date to
//! `day_start_hour` on the following local date, half-open. The default hour
//! is 0, so the window is local midnight to local midnight. Both edges are
//! built as local wall-clock times and converted to UTC independently, so a
//! daylight-saving day yields a 23- or 25-hour window.

use chrono::{DateTime, Duration, LocalResult, NaiveDate, NaiveDateTime, TimeZone, Utc};
use chrono_tz::Tz;

use crate::models::window::DateWindow;
use crate::{AppError, Result};

/// Step used to skip over a daylight-saving gap.
const GAP_STEP_MINUTES: i64 = 15;

/// Longest daylight-saving gap searched for a valid local time.
const MAX_GAP_HOURS: i64 = 3;

/// Maps a local calendar date in an IANA zone to a UTC window.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DateWindowCalculator {
    day_start_hour: u32,
}

impl DateWindowCalculator {
    /// Midnight-to-midnight calculator.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Calculator whose local day starts at `hour` instead of midnight.
    ///
    /// # Errors
    ///
    /// Returns `AppError::Config` if `hour` is not in `0..24`.
    pub fn with_day_start_hour(hour: u32) -> Result<Self> {
        if hour >= 24 {
            return Err(AppError::Config(format!(
                "day_start_hour must be between 0 and 23, got {hour}"
            )));
        }
        Ok(Self {
            day_start_hour: hour,
        })
    }

    /// Local hour at which each export day begins.
    #[must_use]
    pub fn day_start_hour(&self) -> u32 {
        self.day_start_hour
    }

    /// Window for `date` (`YYYY-MM-DD`) in `timezone`.
    ///
    /// # Errors
    ///
    /// Returns `AppError::InvalidTimezone` for an unknown zone and
    /// `AppError::InvalidDate` for a malformed or impossible date.
    pub fn window(&self, date: &str, timezone: &str) -> Result<DateWindow> {
        let tz = parse_timezone(timezone)?;
        let date = parse_date(date)?;
        self.window_for(date, tz)
    }

    /// Window for an already-parsed date and zone.
    ///
    /// # Errors
    ///
    /// Returns `AppError::InvalidDate` if the window edges cannot be
    /// represented.
    pub fn window_for(&self, date: NaiveDate, tz: Tz) -> Result<DateWindow> {
        let next = date
            .succ_opt()
            .ok_or_else(|| AppError::InvalidDate(format!("{date} has no following day")))?;
        Ok(DateWindow {
            start_utc: self.local_boundary(date, tz)?,
            end_utc: self.local_boundary(next, tz)?,
        })
    }

    fn local_boundary(&self, date: NaiveDate, tz: Tz) -> Result<DateTime<Utc>> {
        let wall = date
            .and_hms_opt(self.day_start_hour, 0, 0)
            .ok_or_else(|| AppError::InvalidDate(format!("{date} has no {}:00", self.day_start_hour)))?;
        resolve_local(tz, wall)
            .ok_or_else(|| AppError::InvalidDate(format!("{wall} does not exist in {tz}")))
    }
}

/// Parse an IANA zone name.
///
/// # Errors
///
/// Returns `AppError::InvalidTimezone` for unknown names.
pub fn parse_timezone(name: &str) -> Result<Tz> {
    name.trim()
        .parse::<Tz>()
        .map_err(|_| AppError::InvalidTimezone(name.to_owned()))
}

/// Parse a strict `YYYY-MM-DD` date.
///
/// # Errors
///
/// Returns `AppError::InvalidDate` unless the input is exactly four year
/// digits, two month digits, and two day digits forming a real date.
pub fn parse_date(raw: &str) -> Result<NaiveDate> {
    let bytes = raw.as_bytes();
    let well_formed = bytes.len() == 10
        && bytes.iter().enumerate().all(|(i, b)| match i {
            4 | 7 => *b == b'-',
            _ => b.is_ascii_digit(),
        });
    if !well_formed {
        return Err(AppError::InvalidDate(format!(
            "{raw:?} is not in YYYY-MM-DD form"
        )));
    }
    NaiveDate::parse_from_str(raw, "%Y-%m-%d")
        .map_err(|err| AppError::InvalidDate(format!("{raw}: {err}")))
}

/// Today's calendar date in `tz`.
#[must_use]
pub fn local_today(tz: Tz) -> NaiveDate {
    Utc::now().with_timezone(&tz).date_naive()
}

/// Convert a local wall-clock time to UTC.
///
/// Ambiguous times (repeated hour) take the earlier instant; nonexistent
/// times (skipped hour) move forward to the first valid local time.
fn resolve_local(tz: Tz, wall: NaiveDateTime) -> Option<DateTime<Utc>> {
    let mut candidate = wall;
    let limit = wall + Duration::hours(MAX_GAP_HOURS);
    while candidate <= limit {
        match tz.from_local_datetime(&candidate) {
            LocalResult::Single(t) | LocalResult::Ambiguous(t, _) => {
                return Some(t.with_timezone(&Utc));
            }
            LocalResult::None => candidate += Duration::minutes(GAP_STEP_MINUTES),
        }
    }
    None
}
