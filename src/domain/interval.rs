//! Revision interval table
//!
//! Maps a repetition count to the time until the next review. The table is a
//! fixed sequence of durations; counts past the end reuse the last entry.
//!
//! A table can be parsed from a compact text form, one `<number><unit>` token
//! per slot separated by whitespace:
//!
//! ```
//! use revise_scheduler::domain::IntervalTable;
//!
//! let table: IntervalTable = "10minute 1day 3days".parse().unwrap();
//! assert_eq!(table.next(0), chrono::Duration::minutes(10));
//! assert_eq!(table.next(1), chrono::Duration::days(1));
//! ```
//!
//! Slots not given in the text keep their default value.

use chrono::Duration;
use std::str::FromStr;

const MINUTE: i64 = 60;
const HOUR: i64 = 60 * MINUTE;
const DAY: i64 = 24 * HOUR;
const WEEK: i64 = 7 * DAY;
const MONTH: i64 = 30 * DAY;
const YEAR: i64 = 365 * DAY;

/// Default schedule, in seconds, indexed by repetition count
const DEFAULT_SCHEDULE: [i64; 17] = [
    DAY,
    3 * DAY,
    WEEK,
    2 * WEEK,
    3 * WEEK,
    MONTH,
    MONTH + MONTH / 2,
    2 * MONTH,
    3 * MONTH,
    4 * MONTH,
    6 * MONTH,
    9 * MONTH,
    YEAR,
    YEAR + YEAR / 2,
    2 * YEAR,
    3 * YEAR,
    5 * YEAR,
];

/// Errors that can occur when parsing an interval table
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum IntervalParseError {
    #[error("Unknown interval unit in token '{0}'")]
    UnknownUnit(String),

    #[error("Invalid interval magnitude in token '{0}'")]
    InvalidMagnitude(String),

    #[error("Too many intervals: table has {slots} slots, got {given}")]
    TooManyTokens { slots: usize, given: usize },
}

/// Immutable interval table.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IntervalTable {
    intervals: Vec<Duration>,
}

impl IntervalTable {
    /// Number of slots in every table
    pub const SLOTS: usize = DEFAULT_SCHEDULE.len();

    /// Duration until the next review after `repetitions` completed reviews.
    pub fn next(&self, repetitions: usize) -> Duration {
        let idx = repetitions.min(self.intervals.len() - 1);
        self.intervals[idx]
    }

    pub fn len(&self) -> usize {
        self.intervals.len()
    }

    pub fn is_empty(&self) -> bool {
        self.intervals.is_empty()
    }

    pub fn as_slice(&self) -> &[Duration] {
        &self.intervals
    }

    /// Parse a table from `<number><unit>` tokens, back-filling from the default.
    pub fn parse(text: &str) -> Result<Self, IntervalParseError> {
        let tokens: Vec<&str> = text.split_whitespace().collect();
        if tokens.len() > Self::SLOTS {
            return Err(IntervalParseError::TooManyTokens {
                slots: Self::SLOTS,
                given: tokens.len(),
            });
        }

        let mut table = Self::default();
        for (slot, token) in tokens.into_iter().enumerate() {
            table.intervals[slot] = parse_token(token)?;
        }

        Ok(table)
    }
}

impl Default for IntervalTable {
    fn default() -> Self {
        Self {
            intervals: DEFAULT_SCHEDULE.iter().map(|s| Duration::seconds(*s)).collect(),
        }
    }
}

impl FromStr for IntervalTable {
    type Err = IntervalParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        IntervalTable::parse(s)
    }
}

fn parse_token(token: &str) -> Result<Duration, IntervalParseError> {
    let split = token
        .find(|c: char| c.is_alphabetic())
        .ok_or_else(|| IntervalParseError::UnknownUnit(token.to_string()))?;
    let (magnitude, unit) = token.split_at(split);

    let unit_secs = unit_seconds(unit)
        .ok_or_else(|| IntervalParseError::UnknownUnit(token.to_string()))?;

    let magnitude: f64 = magnitude
        .parse()
        .map_err(|_| IntervalParseError::InvalidMagnitude(token.to_string()))?;
    if !magnitude.is_finite() || magnitude <= 0.0 {
        return Err(IntervalParseError::InvalidMagnitude(token.to_string()));
    }

    let seconds = (magnitude * unit_secs as f64).round();
    if seconds < 1.0 || seconds > (100 * YEAR) as f64 {
        return Err(IntervalParseError::InvalidMagnitude(token.to_string()));
    }

    Ok(Duration::seconds(seconds as i64))
}

fn unit_seconds(unit: &str) -> Option<i64> {
    let unit = unit.to_ascii_lowercase();
    let singular = unit.strip_suffix('s').unwrap_or(&unit);
    match singular {
        "minute" => Some(MINUTE),
        "hour" => Some(HOUR),
        "day" => Some(DAY),
        "week" => Some(WEEK),
        "month" => Some(MONTH),
        "year" => Some(YEAR),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_table() {
        let table = IntervalTable::default();
        assert_eq!(table.len(), IntervalTable::SLOTS);
        assert_eq!(table.next(0), Duration::days(1));
        assert_eq!(table.next(1), Duration::days(3));
        assert_eq!(table.next(2), Duration::weeks(1));
        assert_eq!(table.next(6), Duration::days(45));
        assert_eq!(table.next(16), Duration::days(5 * 365));
    }

    #[test]
    fn test_default_table_is_monotonic() {
        let table = IntervalTable::default();
        for i in 0..table.len() - 1 {
            assert!(table.next(i) <= table.next(i + 1), "slot {i}");
        }
    }

    #[test]
    fn test_clamps_to_last_entry() {
        let table = IntervalTable::default();
        let last = table.next(IntervalTable::SLOTS - 1);
        for count in [IntervalTable::SLOTS, IntervalTable::SLOTS + 1, 1_000, usize::MAX] {
            assert_eq!(table.next(count), last);
        }
    }

    #[test]
    fn test_parse_backfills_from_default() {
        let table = IntervalTable::parse("1minute 2hours").unwrap();
        assert_eq!(table.next(0), Duration::minutes(1));
        assert_eq!(table.next(1), Duration::hours(2));
        assert_eq!(table.next(2), IntervalTable::default().next(2));
        assert_eq!(table.len(), IntervalTable::SLOTS);
    }

    #[test]
    fn test_parse_empty_is_default() {
        assert_eq!(IntervalTable::parse("   ").unwrap(), IntervalTable::default());
    }

    #[test]
    fn test_parse_fractional_units() {
        let table = IntervalTable::parse("1.5month 1.5years").unwrap();
        assert_eq!(table.next(0), Duration::days(45));
        assert_eq!(table.next(1), Duration::seconds(YEAR + YEAR / 2));
    }

    #[test]
    fn test_parse_unknown_unit() {
        let err = IntervalParseError::UnknownUnit("3fortnights".to_string());
        assert_eq!(IntervalTable::parse("1day 3fortnights"), Err(err));
        assert!(matches!(
            IntervalTable::parse("12"),
            Err(IntervalParseError::UnknownUnit(_))
        ));
    }

    #[test]
    fn test_parse_invalid_magnitude() {
        for text in ["1.2.3day", "-1day", "0day", "day"] {
            assert!(
                matches!(IntervalTable::parse(text), Err(IntervalParseError::InvalidMagnitude(_))),
                "{text}"
            );
        }
    }

    #[test]
    fn test_parse_too_many_tokens() {
        let text = vec!["1day"; IntervalTable::SLOTS + 1].join(" ");
        assert_eq!(
            IntervalTable::parse(&text),
            Err(IntervalParseError::TooManyTokens {
                slots: IntervalTable::SLOTS,
                given: IntervalTable::SLOTS + 1,
            })
        );
    }
}
