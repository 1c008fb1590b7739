use chrono::{Duration, Local, NaiveDate, NaiveDateTime, Timelike};
use std::fmt::Display;
use std::str::FromStr;

use crate::utils::errors::FetchError;

const FORMAT: &str = "%Y%m%d%H";

/// Hour addressed by the GEMS data page, rendered as `YYYYMMDDHH`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct GemsTimestamp(NaiveDateTime);

impl GemsTimestamp {
    pub fn new(datetime: NaiveDateTime) -> Self {
        let hour = datetime
            .with_nanosecond(0)
            .and_then(|d| d.with_second(0))
            .and_then(|d| d.with_minute(0))
            .unwrap_or(datetime);
        GemsTimestamp(hour)
    }

    pub fn now() -> Self {
        GemsTimestamp::new(Local::now().naive_local())
    }

    /// Current local hour minus `hours`.
    pub fn hours_ago(hours: u32) -> Result<Self, FetchError> {
        GemsTimestamp::now().checked_sub_hours(hours)
    }

    /// Strings that are not 10 characters long fall back to the current hour,
    /// the web page would not accept them anyway.
    pub fn resolve(input: &str) -> Result<Self, FetchError> {
        if input.chars().count() != 10 {
            tracing::warn!(
                "Timestamp `{}` is not in YYYYMMDDHH format, using the current hour",
                input
            );
            return Ok(GemsTimestamp::now());
        }
        input.parse()
    }

    pub fn datetime(&self) -> NaiveDateTime {
        self.0
    }

    pub fn next_hour(&self) -> Result<Self, FetchError> {
        self.0
            .checked_add_signed(Duration::hours(1))
            .map(GemsTimestamp)
            .ok_or(FetchError::TimestampOutOfRange {
                start: *self,
                hours: 1,
            })
    }

    pub fn checked_sub_hours(&self, hours: u32) -> Result<Self, FetchError> {
        self.0
            .checked_sub_signed(Duration::hours(i64::from(hours)))
            .map(GemsTimestamp)
            .ok_or(FetchError::TimestampOutOfRange {
                start: *self,
                hours: -i64::from(hours),
            })
    }
}

impl FromStr for GemsTimestamp {
    type Err = FetchError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let invalid = || FetchError::InvalidTimestamp(s.to_string());
        if s.len() != 10 || !s.bytes().all(|b| b.is_ascii_digit()) {
            return Err(invalid());
        }
        // chrono refuses to parse a time without minutes, so split by hand
        let number = |range: std::ops::Range<usize>| s[range].parse::<u32>().map_err(|_| invalid());
        let year = number(0..4)? as i32;
        let datetime = NaiveDate::from_ymd_opt(year, number(4..6)?, number(6..8)?)
            .and_then(|date| date.and_hms_opt(number(8..10).ok()?, 0, 0))
            .ok_or_else(invalid)?;
        Ok(GemsTimestamp(datetime))
    }
}

impl Display for GemsTimestamp {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0.format(FORMAT))
    }
}
