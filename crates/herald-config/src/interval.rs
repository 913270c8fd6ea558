//! Rotation interval parsing and due-time evaluation
//!
//! Intervals come in two flavors. A bare unit (`"monthly"`, `"day"`)
//! is *floating*: the action is due as soon as the calendar period
//! containing `now` is later than the one containing the last run, so a
//! monthly rotation fires in the first tick of each new month no matter
//! when in the previous month it last ran. A counted form (`"2 weeks"`)
//! is *fixed*: due once the full span has elapsed since the last run,
//! with month and year spans computed calendrically rather than as
//! fixed-length approximations.

use chrono::{DateTime, Datelike, Duration, Months, NaiveDate, Timelike, Utc};
use serde::de::Error as _;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use std::str::FromStr;

/// Errors produced while parsing an interval specification
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum IntervalParseError {
    #[error("Unrecognized interval unit: {0:?}")]
    UnknownUnit(String),

    #[error("Interval count must be a positive integer, got {0:?}")]
    InvalidCount(String),

    #[error("Weeks cannot float on the calendar; use a counted form such as \"1 week\"")]
    FloatingWeeks,

    #[error("Invalid interval {0:?} (expected \"<unit>\" or \"<count> <unit>\")")]
    InvalidFormat(String),
}

/// Time unit usable in a fixed (counted) interval
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum IntervalUnit {
    Years,
    Months,
    Weeks,
    Days,
    Hours,
    Minutes,
    Seconds,
}

impl IntervalUnit {
    /// Parse one unit token, accepting singular, plural, and adverbial
    /// forms ("month", "months", "monthly").
    fn parse(token: &str) -> Option<Self> {
        match token {
            "year" | "years" | "yearly" => Some(Self::Years),
            "month" | "months" | "monthly" => Some(Self::Months),
            "week" | "weeks" | "weekly" => Some(Self::Weeks),
            "day" | "days" | "daily" => Some(Self::Days),
            "hour" | "hours" | "hourly" => Some(Self::Hours),
            "minute" | "minutes" => Some(Self::Minutes),
            "second" | "seconds" => Some(Self::Seconds),
            _ => None,
        }
    }

    fn singular(self) -> &'static str {
        match self {
            Self::Years => "year",
            Self::Months => "month",
            Self::Weeks => "week",
            Self::Days => "day",
            Self::Hours => "hour",
            Self::Minutes => "minute",
            Self::Seconds => "second",
        }
    }
}

/// Time unit usable in a floating (calendar-aligned) interval.
///
/// Weeks are deliberately absent: there is no universally agreed week
/// boundary, so the parser rejects them in floating mode.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FloatingUnit {
    Years,
    Months,
    Days,
    Hours,
    Minutes,
    Seconds,
}

impl FloatingUnit {
    fn singular(self) -> &'static str {
        match self {
            Self::Years => "year",
            Self::Months => "month",
            Self::Days => "day",
            Self::Hours => "hour",
            Self::Minutes => "minute",
            Self::Seconds => "second",
        }
    }
}

impl TryFrom<IntervalUnit> for FloatingUnit {
    type Error = IntervalParseError;

    fn try_from(unit: IntervalUnit) -> std::result::Result<Self, IntervalParseError> {
        match unit {
            IntervalUnit::Years => Ok(Self::Years),
            IntervalUnit::Months => Ok(Self::Months),
            IntervalUnit::Weeks => Err(IntervalParseError::FloatingWeeks),
            IntervalUnit::Days => Ok(Self::Days),
            IntervalUnit::Hours => Ok(Self::Hours),
            IntervalUnit::Minutes => Ok(Self::Minutes),
            IntervalUnit::Seconds => Ok(Self::Seconds),
        }
    }
}

/// A parsed rotation interval
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IntervalSpec {
    /// Due when the calendar period rolls over
    Floating(FloatingUnit),
    /// Due `count` units after the last run
    Fixed { count: u32, unit: IntervalUnit },
}

impl IntervalSpec {
    /// Whether the action is due at `now` given it last ran at `last`.
    pub fn next_due(&self, last: DateTime<Utc>, now: DateTime<Utc>) -> bool {
        match *self {
            Self::Floating(unit) => match (period_start(now, unit), period_start(last, unit)) {
                (Some(current), Some(previous)) => current > previous,
                _ => false,
            },
            Self::Fixed { count, unit } => {
                add_periods(last, count, unit).is_some_and(|due_at| now >= due_at)
            }
        }
    }
}

impl FromStr for IntervalSpec {
    type Err = IntervalParseError;

    fn from_str(value: &str) -> std::result::Result<Self, Self::Err> {
        let tokens: Vec<&str> = value.split_whitespace().collect();
        match tokens.as_slice() {
            [unit] => {
                let unit = IntervalUnit::parse(&unit.to_lowercase())
                    .ok_or_else(|| IntervalParseError::UnknownUnit(unit.to_string()))?;
                Ok(Self::Floating(FloatingUnit::try_from(unit)?))
            }
            [count, unit] => {
                let unit = IntervalUnit::parse(&unit.to_lowercase())
                    .ok_or_else(|| IntervalParseError::UnknownUnit(unit.to_string()))?;
                let count: u32 = count
                    .parse()
                    .map_err(|_| IntervalParseError::InvalidCount(count.to_string()))?;
                if count == 0 {
                    return Err(IntervalParseError::InvalidCount(count.to_string()));
                }
                Ok(Self::Fixed { count, unit })
            }
            _ => Err(IntervalParseError::InvalidFormat(value.to_string())),
        }
    }
}

impl fmt::Display for IntervalSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match *self {
            Self::Floating(unit) => write!(f, "{}", unit.singular()),
            Self::Fixed { count: 1, unit } => write!(f, "1 {}", unit.singular()),
            Self::Fixed { count, unit } => write!(f, "{count} {}s", unit.singular()),
        }
    }
}

impl Serialize for IntervalSpec {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for IntervalSpec {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        raw.parse().map_err(D::Error::custom)
    }
}

/// First instant of the calendar period containing `t`, in UTC.
fn period_start(t: DateTime<Utc>, unit: FloatingUnit) -> Option<DateTime<Utc>> {
    let date = t.date_naive();
    let start = match unit {
        FloatingUnit::Years => NaiveDate::from_ymd_opt(date.year(), 1, 1)?.and_hms_opt(0, 0, 0)?,
        FloatingUnit::Months => {
            NaiveDate::from_ymd_opt(date.year(), date.month(), 1)?.and_hms_opt(0, 0, 0)?
        }
        FloatingUnit::Days => date.and_hms_opt(0, 0, 0)?,
        FloatingUnit::Hours => date.and_hms_opt(t.hour(), 0, 0)?,
        FloatingUnit::Minutes => date.and_hms_opt(t.hour(), t.minute(), 0)?,
        FloatingUnit::Seconds => date.and_hms_opt(t.hour(), t.minute(), t.second())?,
    };
    Some(start.and_utc())
}

/// `t` advanced by `count` units, calendrically for months and years.
fn add_periods(t: DateTime<Utc>, count: u32, unit: IntervalUnit) -> Option<DateTime<Utc>> {
    match unit {
        IntervalUnit::Years => t.checked_add_months(Months::new(count.checked_mul(12)?)),
        IntervalUnit::Months => t.checked_add_months(Months::new(count)),
        IntervalUnit::Weeks => t.checked_add_signed(Duration::weeks(i64::from(count))),
        IntervalUnit::Days => t.checked_add_signed(Duration::days(i64::from(count))),
        IntervalUnit::Hours => t.checked_add_signed(Duration::hours(i64::from(count))),
        IntervalUnit::Minutes => t.checked_add_signed(Duration::minutes(i64::from(count))),
        IntervalUnit::Seconds => t.checked_add_signed(Duration::seconds(i64::from(count))),
    }
}
