//! Export day window.

use chrono::{DateTime, Utc};
use serde::Serialize;

/// Half-open `[start_utc, end_utc)` range covering one local export day.
#[derive(Debug, Clone, Copy, Serialize, PartialEq, Eq)]
pub struct DateWindow {
    /// Inclusive start.
    pub start_utc: DateTime<Utc>,
    /// Exclusive end.
    pub end_utc: DateTime<Utc>,
}

impl DateWindow {
    /// Length of the local day the window covers.
    #[must_use]
    pub fn duration(&self) -> chrono::Duration {
        self.end_utc - self.start_utc
    }

    /// Whether `instant` falls inside the window.
    #[must_use]
    pub fn contains(&self, instant: DateTime<Utc>) -> bool {
        instant >= self.start_utc && instant < self.end_utc
    }
}
