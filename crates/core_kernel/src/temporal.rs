//! Clock abstraction and venue-timezone helpers
//!
//! Scheduling decisions (reminder windows, feedback follow-ups, payment due
//! dates) are made against the venue's local calendar while storage and
//! transport stay in UTC. `Timezone` converts between the two, and `Clock`
//! makes "now" injectable so scan windows are testable.

use chrono::{DateTime, Days, NaiveDate, NaiveTime, TimeZone, Utc};
use chrono_tz::Tz;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::str::FromStr;
use std::sync::RwLock;
use thiserror::Error;

/// Source of the current instant
///
/// Services take a `Clock` instead of calling `Utc::now()` directly so that
/// time-sensitive behaviour can be pinned in tests.
pub trait Clock: Send + Sync {
    fn now(&self) -> DateTime<Utc>;
}

/// Production clock backed by the system time
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}

/// Clock pinned to a chosen instant, adjustable after construction
#[derive(Debug)]
pub struct FixedClock {
    instant: RwLock<DateTime<Utc>>,
}

impl FixedClock {
    pub fn new(instant: DateTime<Utc>) -> Self {
        Self {
            instant: RwLock::new(instant),
        }
    }

    /// Repins the clock to the given instant
    pub fn set(&self, instant: DateTime<Utc>) {
        *self.instant.write().unwrap_or_else(|e| e.into_inner()) = instant;
    }

    /// Moves the clock forward (or backward) by the given duration
    pub fn advance(&self, delta: chrono::Duration) {
        let mut guard = self.instant.write().unwrap_or_else(|e| e.into_inner());
        *guard += delta;
    }
}

impl Clock for FixedClock {
    fn now(&self) -> DateTime<Utc> {
        *self.instant.read().unwrap_or_else(|e| e.into_inner())
    }
}

/// Error produced when a timezone name is not in the tz database
#[derive(Debug, Error, PartialEq, Eq)]
#[error("Unknown timezone: {0}")]
pub struct UnknownTimezone(pub String);

/// Timezone of the venue's local calendar
///
/// Wraps chrono_tz::Tz with custom serialization support.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Timezone(pub Tz);

impl Timezone {
    pub fn new(tz: Tz) -> Self {
        Self(tz)
    }

    /// Converts a UTC datetime to the local timezone
    pub fn to_local(&self, utc: DateTime<Utc>) -> DateTime<Tz> {
        utc.with_timezone(&self.0)
    }

    /// Returns the local calendar date for the given instant
    pub fn local_date(&self, at: DateTime<Utc>) -> NaiveDate {
        at.with_timezone(&self.0).date_naive()
    }

    /// Resolves a local wall-clock date and time to a UTC instant
    pub fn instant(&self, date: NaiveDate, time: NaiveTime) -> DateTime<Utc> {
        // DST can make a wall-clock time ambiguous or unrepresentable; take
        // the earlier instant, or scan forward to the first minute that exists.
        let mut probe = date.and_time(time);
        for _ in 0..120 {
            if let Some(local) = probe.and_local_timezone(self.0).earliest() {
                return local.with_timezone(&Utc);
            }
            probe += chrono::Duration::minutes(1);
        }
        Utc.from_utc_datetime(&probe)
    }

    /// Gets the start of day (00:00 local) as a UTC instant
    pub fn start_of_day(&self, date: NaiveDate) -> DateTime<Utc> {
        self.instant(date, NaiveTime::MIN)
    }

    /// Half-open UTC window `[start, end)` covering the local calendar day
    pub fn day_bounds(&self, date: NaiveDate) -> (DateTime<Utc>, DateTime<Utc>) {
        let next = date.checked_add_days(Days::new(1)).unwrap_or(date);
        (self.start_of_day(date), self.start_of_day(next))
    }
}

impl Default for Timezone {
    fn default() -> Self {
        Self(chrono_tz::UTC)
    }
}

impl FromStr for Timezone {
    type Err = UnknownTimezone;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Tz::from_str(s)
            .map(Timezone)
            .map_err(|_| UnknownTimezone(s.to_string()))
    }
}

impl Serialize for Timezone {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_str(self.0.name())
    }
}

impl<'de> Deserialize<'de> for Timezone {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        s.parse().map_err(serde::de::Error::custom)
    }
}
