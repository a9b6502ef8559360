//! Reminder user
//!
//! A user as seen by the reminder scanner: who they are and when in their own
//! day they want to be reminded.

use chrono::{DateTime, FixedOffset, NaiveTime, Timelike, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::DomainError;

/// Largest accepted UTC offset (±14h, in minutes)
pub const MAX_UTC_OFFSET_MINUTES: i32 = 14 * 60;

/// Longest accepted display name, in characters
pub const DISPLAY_NAME_MAX_LEN: usize = 100;

const MILLIS_PER_DAY: i64 = 24 * 60 * 60 * 1000;

/// User with a daily reminder time
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReminderUser {
    pub id: Uuid,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub display_name: Option<String>,
    /// Reminder time of day in the user's local time
    pub reminder_time: NaiveTime,
    /// Offset of the user's local time from UTC
    pub utc_offset_minutes: i32,
}

impl ReminderUser {
    /// Create a reminder user, validating the offset.
    pub fn new(
        id: Uuid,
        reminder_time: NaiveTime,
        utc_offset_minutes: i32,
    ) -> Result<Self, DomainError> {
        if utc_offset_minutes.abs() > MAX_UTC_OFFSET_MINUTES {
            return Err(DomainError::validation(
                "utc_offset_minutes",
                format!("must be within ±{MAX_UTC_OFFSET_MINUTES} minutes"),
            ));
        }

        Ok(Self {
            id,
            display_name: None,
            reminder_time,
            utc_offset_minutes,
        })
    }

    /// Attach a display name, trimmed to 1..=100 characters.
    pub fn with_display_name(mut self, display_name: &str) -> Result<Self, DomainError> {
        let trimmed = display_name.trim();
        let len = trimmed.chars().count();
        if len == 0 || len > DISPLAY_NAME_MAX_LEN {
            return Err(DomainError::validation(
                "display_name",
                format!("must be 1 to {DISPLAY_NAME_MAX_LEN} characters (got {len})"),
            ));
        }

        self.display_name = Some(trimmed.to_string());
        Ok(self)
    }

    /// The user's local wall-clock time at `now`.
    pub fn local_time(&self, now: DateTime<Utc>) -> NaiveTime {
        match FixedOffset::east_opt(self.utc_offset_minutes * 60) {
            Some(offset) => now.with_timezone(&offset).time(),
            None => now.time(),
        }
    }

    /// Whether a local reminder time falls in `[from, to)`.
    ///
    /// The range wraps around midnight; a range of a day or more always
    /// matches.
    pub fn is_reminder_due(&self, from: DateTime<Utc>, to: DateTime<Utc>) -> bool {
        let span_ms = (to - from).num_milliseconds();
        if span_ms <= 0 {
            return false;
        }
        if span_ms >= MILLIS_PER_DAY {
            return true;
        }

        let from_ms = millis_of_day(self.local_time(from));
        let reminder_ms = millis_of_day(self.reminder_time);
        let ahead = (reminder_ms - from_ms).rem_euclid(MILLIS_PER_DAY);

        ahead < span_ms
    }
}

fn millis_of_day(time: NaiveTime) -> i64 {
    time.num_seconds_from_midnight() as i64 * 1000 + (time.nanosecond() / 1_000_000) as i64
}
