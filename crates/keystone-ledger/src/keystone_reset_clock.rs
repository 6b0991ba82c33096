//! Regional weekly reset boundaries.
//!
//! Resets are evaluated in one fixed reference zone so every channel agrees on
//! when "midnight" is, independent of the host's local zone.

use chrono::{DateTime, Datelike, Duration, TimeZone, Utc, Weekday};
use chrono_tz::Tz;
use serde::{Deserialize, Serialize};

pub const RESET_REFERENCE_TIMEZONE: Tz = chrono_tz::America::Los_Angeles;
pub const RESET_PERIOD_DAYS: i64 = 7;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, Default)]
#[serde(rename_all = "lowercase")]
/// Enumerates supported `KeystoneRegion` values.
pub enum KeystoneRegion {
    #[default]
    Us,
    Eu,
}

impl KeystoneRegion {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Us => "US",
            Self::Eu => "EU",
        }
    }

    pub fn reset_weekday(self) -> Weekday {
        match self {
            Self::Us => Weekday::Tue,
            Self::Eu => Weekday::Wed,
        }
    }

    pub fn reset_day_label(self) -> &'static str {
        match self {
            Self::Us => "Tuesday",
            Self::Eu => "Wednesday",
        }
    }

    /// Only `eu` (any case) selects EU; anything else, including nothing, is US.
    pub fn from_command_argument(argument: Option<&str>) -> Self {
        match argument {
            Some(value) if value.trim().eq_ignore_ascii_case("eu") => Self::Eu,
            _ => Self::Us,
        }
    }
}

/// Returns the most recent reset midnight on or before `now` for `region`.
pub fn most_recent_reset_boundary(region: KeystoneRegion, now: DateTime<Utc>) -> DateTime<Utc> {
    let local_date = now.with_timezone(&RESET_REFERENCE_TIMEZONE).date_naive();
    let days_since_reset = (7 + local_date.weekday().num_days_from_monday()
        - region.reset_weekday().num_days_from_monday())
        % 7;
    let reset_date = local_date - Duration::days(i64::from(days_since_reset));
    // DST shifts in the reference zone happen at 02:00, so local midnight is never skipped.
    reset_date
        .and_hms_opt(0, 0, 0)
        .and_then(|midnight| {
            RESET_REFERENCE_TIMEZONE
                .from_local_datetime(&midnight)
                .earliest()
        })
        .map(|boundary| boundary.with_timezone(&Utc))
        .unwrap_or(now)
}

/// Returns true once `now` has reached the reset that follows `last_modified`.
pub fn is_stale(last_modified: DateTime<Utc>, region: KeystoneRegion, now: DateTime<Utc>) -> bool {
    let next_reset =
        most_recent_reset_boundary(region, last_modified) + Duration::days(RESET_PERIOD_DAYS);
    now >= next_reset
}
