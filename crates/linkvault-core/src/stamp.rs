//! Snapshot and week-bucket naming.
//!
//! A snapshot directory is named after its creation time at minute
//! granularity (`20250116-0930`). The fixed-width format makes
//! lexicographic order equal to chronological order. Aged snapshots are
//! relocated into week buckets named `week-2025-02` (Monday-based
//! week-of-year, days before the year's first Monday fall in week 00).

use std::fmt;

use chrono::{Datelike, Local, NaiveDateTime, Timelike};
use serde::{Deserialize, Serialize};

/// Name of the symlink at the storage root referencing the most recent
/// snapshot.
pub const LAST_POINTER: &str = "last";

const STAMP_FORMAT: &str = "%Y%m%d-%H%M";
const WEEK_PREFIX: &str = "week-";

/// Creation timestamp of a snapshot, at minute granularity.
///
/// A directory name is recognized as a snapshot only if it round-trips
/// through the stamp format exactly; anything else is invisible to
/// retention logic.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub struct SnapshotStamp(NaiveDateTime);

impl SnapshotStamp {
    /// Stamp for the current local time.
    pub fn now() -> Self {
        Self(truncate_to_minute(Local::now().naive_local()))
    }

    /// Create a stamp from an explicit datetime (sub-minute precision is
    /// discarded).
    pub fn from_datetime(datetime: NaiveDateTime) -> Self {
        Self(truncate_to_minute(datetime))
    }

    /// Parse a directory name as a snapshot stamp.
    ///
    /// Returns `None` unless the name round-trips the format exactly.
    pub fn parse(name: &str) -> Option<Self> {
        let parsed = NaiveDateTime::parse_from_str(name, STAMP_FORMAT).ok()?;
        let stamp = Self(parsed);
        (stamp.to_string() == name).then_some(stamp)
    }

    /// The week bucket this snapshot belongs to.
    pub fn week(&self) -> WeekBucket {
        WeekBucket::for_date(self.0.date())
    }

    /// The underlying datetime.
    pub fn datetime(&self) -> NaiveDateTime {
        self.0
    }
}

impl fmt::Display for SnapshotStamp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0.format(STAMP_FORMAT))
    }
}

fn truncate_to_minute(datetime: NaiveDateTime) -> NaiveDateTime {
    datetime
        .with_second(0)
        .and_then(|dt| dt.with_nanosecond(0))
        .unwrap_or(datetime)
}

/// Archival grouping directory for one (year, week-of-year) pair.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct WeekBucket {
    /// Calendar year.
    pub year: i32,
    /// Monday-based week of year, 00-53.
    pub week: u32,
}

impl WeekBucket {
    /// Bucket containing the given date.
    pub fn for_date(date: chrono::NaiveDate) -> Self {
        // Monday-based week number; days before the first Monday of the
        // year land in week 0.
        let weekday = date.weekday().num_days_from_monday();
        let week = (date.ordinal() + 6 - weekday) / 7;
        Self {
            year: date.year(),
            week,
        }
    }

    /// Directory name for this bucket.
    pub fn dir_name(&self) -> String {
        format!("{WEEK_PREFIX}{:04}-{:02}", self.year, self.week)
    }

    /// Parse a directory name as a week bucket.
    pub fn parse(name: &str) -> Option<Self> {
        let rest = name.strip_prefix(WEEK_PREFIX)?;
        let (year, week) = rest.split_once('-')?;
        if year.len() != 4 || week.len() != 2 {
            return None;
        }
        let bucket = Self {
            year: year.parse().ok()?,
            week: week.parse().ok()?,
        };
        (bucket.dir_name() == name).then_some(bucket)
    }
}

impl fmt::Display for WeekBucket {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.dir_name())
    }
}
