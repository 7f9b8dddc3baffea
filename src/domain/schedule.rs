//! Daily recording schedule
//!
//! Turns the stored "HH:MM" start/end times into the next concrete
//! start/stop instants. The start is the next occurrence of the start time
//! at or after now; the stop is the next occurrence of the end time
//! strictly after the chosen start, rolling to the next day when the end
//! time is not after the start as clock time.

use std::str::FromStr;

use chrono::{Duration, NaiveDateTime, NaiveTime};

use crate::domain::error::ClockTimeParseError;

/// A wall-clock time of day parsed from a 24-hour "HH:MM" string.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ClockTime(NaiveTime);

impl ClockTime {
    pub fn as_naive(&self) -> NaiveTime {
        self.0
    }
}

impl FromStr for ClockTime {
    type Err = ClockTimeParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let invalid = || ClockTimeParseError {
            input: s.to_string(),
        };
        let (hour, minute) = s.trim().split_once(':').ok_or_else(invalid)?;
        let hour: u32 = hour.parse().map_err(|_| invalid())?;
        let minute: u32 = minute.parse().map_err(|_| invalid())?;
        NaiveTime::from_hms_opt(hour, minute, 0)
            .map(ClockTime)
            .ok_or_else(invalid)
    }
}

/// The user-chosen daily recording window.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DailySchedule {
    pub start: ClockTime,
    pub end: ClockTime,
}

impl DailySchedule {
    pub fn parse(start: &str, end: &str) -> Result<Self, ClockTimeParseError> {
        Ok(Self {
            start: start.parse()?,
            end: end.parse()?,
        })
    }

    /// Compute the next (start, stop) instants relative to `now`.
    ///
    /// Invariant: stop is strictly after start.
    pub fn next_window(&self, now: NaiveDateTime) -> (NaiveDateTime, NaiveDateTime) {
        let mut start = now.date().and_time(self.start.as_naive());
        if start < now {
            start += Duration::days(1);
        }
        let mut stop = start.date().and_time(self.end.as_naive());
        if stop <= start {
            stop += Duration::days(1);
        }
        (start, stop)
    }
}
