//! `HH:MM` time-of-day values and the display format preference.

use std::{fmt, str::FromStr};

use chrono::{DateTime, NaiveTime, TimeZone, Timelike};
use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
/// Reasons a time string was rejected.
pub enum ClockParseError {
    /// The text has no hour at `[0,2)` or no minute at `[3,5)`.
    #[error("time string `{0}` is not in HH:MM form")]
    TooShort(String),
    /// The hour or minute field is not two ASCII digits.
    #[error("time string `{0}` has non-numeric fields")]
    NotNumeric(String),
    /// Hour above 23 or minute above 59.
    #[error("time {hour:02}:{minute:02} is out of range")]
    OutOfRange {
        /// Parsed hour.
        hour: u32,
        /// Parsed minute.
        minute: u32,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
/// Validated hour and minute of a day.
pub struct ClockTime(NaiveTime);

impl ClockTime {
    /// Midnight, the value of [`crate::time::DEF_TIME`].
    pub fn midnight() -> Self {
        Self(NaiveTime::MIN)
    }

    /// Builds a time from `hour` in `[0,23]` and `minute` in `[0,59]`.
    pub fn new(hour: u32, minute: u32) -> Option<Self> {
        NaiveTime::from_hms_opt(hour, minute, 0).map(Self)
    }

    /// Takes the hour and minute of `instant`, dropping seconds.
    pub fn from_datetime<Tz: TimeZone>(instant: &DateTime<Tz>) -> Self {
        Self::new(instant.hour(), instant.minute()).unwrap_or_else(Self::midnight)
    }

    /// Hour in `[0,23]`.
    pub fn hour(self) -> u32 {
        self.0.hour()
    }

    /// Minute in `[0,59]`.
    pub fn minute(self) -> u32 {
        self.0.minute()
    }

    /// The time as a `chrono` value with zero seconds.
    pub fn as_naive(self) -> NaiveTime {
        self.0
    }
}

fn two_digits(field: &str, text: &str) -> Result<u32, ClockParseError> {
    if field.len() != 2 || !field.bytes().all(|b| b.is_ascii_digit()) {
        return Err(ClockParseError::NotNumeric(text.to_string()));
    }
    field
        .parse()
        .map_err(|_| ClockParseError::NotNumeric(text.to_string()))
}

impl FromStr for ClockTime {
    type Err = ClockParseError;

    /// Reads the hour from bytes `[0,2)` and the minute from `[3,5)`; the separator is not
    /// inspected.
    fn from_str(text: &str) -> Result<Self, Self::Err> {
        let (Some(hour), Some(minute)) = (text.get(0..2), text.get(3..5)) else {
            return Err(ClockParseError::TooShort(text.to_string()));
        };
        let hour = two_digits(hour, text)?;
        let minute = two_digits(minute, text)?;
        Self::new(hour, minute).ok_or(ClockParseError::OutOfRange { hour, minute })
    }
}

impl fmt::Display for ClockTime {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:02}:{:02}", self.hour(), self.minute())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(try_from = "u8", into = "u8")]
/// User preference for clock display, persisted as its numeric code.
pub enum TimeFormat {
    /// 12-hour clock with AM/PM (code `1`).
    #[default]
    Hr12,
    /// 24-hour clock (code `2`).
    Hr24,
}

impl TimeFormat {
    /// Returns `true` for the 24-hour clock.
    pub fn is_24_hour(self) -> bool {
        self == Self::Hr24
    }
}

impl From<TimeFormat> for u8 {
    fn from(format: TimeFormat) -> Self {
        match format {
            TimeFormat::Hr12 => 1,
            TimeFormat::Hr24 => 2,
        }
    }
}

impl TryFrom<u8> for TimeFormat {
    type Error = String;

    fn try_from(code: u8) -> Result<Self, Self::Error> {
        match code {
            1 => Ok(Self::Hr12),
            2 => Ok(Self::Hr24),
            other => Err(format!("unknown time format code {other}")),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_hour_and_minute_fields() {
        let time: ClockTime = "07:45".parse().expect("parse");
        assert_eq!((time.hour(), time.minute()), (7, 45));
        assert_eq!(time.to_string(), "07:45");

        let dotted: ClockTime = "23.59".parse().expect("separator is not inspected");
        assert_eq!(dotted.to_string(), "23:59");
    }

    #[test]
    fn rejects_malformed_strings() {
        assert_eq!(
            "7:45".parse::<ClockTime>(),
            Err(ClockParseError::TooShort("7:45".into()))
        );
        assert_eq!(
            " 7:45".parse::<ClockTime>(),
            Err(ClockParseError::NotNumeric(" 7:45".into()))
        );
        assert_eq!(
            "07:4".parse::<ClockTime>(),
            Err(ClockParseError::TooShort("07:4".into()))
        );
        assert_eq!(
            "ab:cd".parse::<ClockTime>(),
            Err(ClockParseError::NotNumeric("ab:cd".into()))
        );
        assert_eq!(
            "24:00".parse::<ClockTime>(),
            Err(ClockParseError::OutOfRange {
                hour: 24,
                minute: 0
            })
        );
        assert!("é9:00".parse::<ClockTime>().is_err());
    }

    #[test]
    fn time_format_round_trips_through_numeric_code() {
        assert_eq!(serde_json::to_string(&TimeFormat::Hr24).expect("encode"), "2");
        let decoded: TimeFormat = serde_json::from_str("1").expect("decode");
        assert_eq!(decoded, TimeFormat::Hr12);
        assert!(serde_json::from_str::<TimeFormat>("3").is_err());
        assert!(TimeFormat::Hr24.is_24_hour());
        assert!(!TimeFormat::default().is_24_hour());
    }
}
