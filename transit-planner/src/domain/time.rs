//! Timetable time handling.
//!
//! Timetables give times as "HH:MM" strings relative to the start of the
//! service day. Trips that run past midnight keep counting upwards
//! ("24:15", "25:02"), so a `TransitTime` is a minute offset from the service
//! day's midnight rather than a wall-clock time.

use std::fmt;

use chrono::{Duration, NaiveTime, Timelike};
use serde::{Deserialize, Serialize};

/// Error returned when parsing or constructing an invalid time.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("invalid time: {reason}")]
pub struct TimeError {
    reason: &'static str,
}

impl TimeError {
    fn new(reason: &'static str) -> Self {
        Self { reason }
    }
}

/// Last hour a service day can reach (trips running into the next morning).
const MAX_HOUR: u32 = 47;

const MINUTES_PER_DAY: u32 = 24 * 60;

/// A time within a service day, with minute resolution.
///
/// Values from "24:00" onwards belong to the following calendar day but are
/// still part of the same service day.
///
/// # Examples
///
/// ```
/// use transit_planner::domain::TransitTime;
///
/// let time = TransitTime::parse_hhmm("14:30").unwrap();
/// assert_eq!(time.hour(), 14);
/// assert_eq!(time.to_string(), "14:30");
///
/// let late = TransitTime::parse_hhmm("24:10").unwrap();
/// assert!(late.is_next_day());
/// assert!(late > time);
/// ```
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct TransitTime {
    minutes: u16,
}

impl TransitTime {
    /// The latest representable time, "47:59".
    pub const MAX: TransitTime = TransitTime {
        minutes: ((MAX_HOUR + 1) * 60 - 1) as u16,
    };

    /// Midnight at the start of the service day.
    pub const MIDNIGHT: TransitTime = TransitTime { minutes: 0 };

    /// Construct from hour and minute components.
    pub fn from_hm(hour: u32, minute: u32) -> Result<Self, TimeError> {
        if hour > MAX_HOUR {
            return Err(TimeError::new("hour must be 0-47"));
        }
        if minute > 59 {
            return Err(TimeError::new("minute must be 0-59"));
        }
        Ok(Self {
            minutes: (hour * 60 + minute) as u16,
        })
    }

    /// Construct from a minute offset, if it is in range.
    pub fn from_minutes(minutes: u32) -> Option<Self> {
        if minutes > Self::MAX.minutes as u32 {
            return None;
        }
        Some(Self {
            minutes: minutes as u16,
        })
    }

    /// Parse a time from "HH:MM" format.
    ///
    /// # Examples
    ///
    /// ```
    /// use transit_planner::domain::TransitTime;
    ///
    /// assert!(TransitTime::parse_hhmm("00:00").is_ok());
    /// assert!(TransitTime::parse_hhmm("25:30").is_ok());
    ///
    /// assert!(TransitTime::parse_hhmm("1430").is_err());
    /// assert!(TransitTime::parse_hhmm("14:3").is_err());
    /// assert!(TransitTime::parse_hhmm("48:00").is_err());
    /// ```
    pub fn parse_hhmm(s: &str) -> Result<Self, TimeError> {
        if s.len() != 5 {
            return Err(TimeError::new("expected HH:MM format"));
        }

        let bytes = s.as_bytes();
        if bytes[2] != b':' {
            return Err(TimeError::new("expected colon at position 2"));
        }

        let hour =
            parse_two_digits(&bytes[0..2]).ok_or_else(|| TimeError::new("invalid hour digits"))?;
        let minute = parse_two_digits(&bytes[3..5])
            .ok_or_else(|| TimeError::new("invalid minute digits"))?;

        Self::from_hm(hour, minute)
    }

    /// Convert a wall-clock time into a same-day transit time.
    pub fn from_naive_time(time: NaiveTime) -> Self {
        Self {
            minutes: (time.hour() * 60 + time.minute()) as u16,
        }
    }

    /// Wall-clock time of day, wrapping past midnight.
    pub fn to_naive_time(&self) -> NaiveTime {
        let wrapped = self.minutes as u32 % MINUTES_PER_DAY;
        NaiveTime::from_hms_opt(wrapped / 60, wrapped % 60, 0).unwrap_or(NaiveTime::MIN)
    }

    /// Minutes since the service day's midnight.
    pub fn minutes_since_midnight(&self) -> u32 {
        self.minutes as u32
    }

    /// Returns the hour (0-47).
    pub fn hour(&self) -> u32 {
        self.minutes as u32 / 60
    }

    /// Returns the minute (0-59).
    pub fn minute(&self) -> u32 {
        self.minutes as u32 % 60
    }

    /// True for times at or after "24:00".
    pub fn is_next_day(&self) -> bool {
        self.minutes as u32 >= MINUTES_PER_DAY
    }

    /// Add minutes, returning `None` past "47:59".
    pub fn checked_add_minutes(&self, minutes: u32) -> Option<Self> {
        Self::from_minutes(self.minutes as u32 + minutes)
    }

    /// Add minutes, clamping at [`TransitTime::MAX`].
    pub fn saturating_add_minutes(&self, minutes: u32) -> Self {
        self.checked_add_minutes(minutes).unwrap_or(Self::MAX)
    }

    /// Subtract minutes, clamping at midnight.
    pub fn saturating_sub_minutes(&self, minutes: u32) -> Self {
        Self {
            minutes: (self.minutes as u32).saturating_sub(minutes) as u16,
        }
    }

    /// Signed minutes from `earlier` to `self`.
    pub fn minutes_since(&self, earlier: Self) -> i32 {
        self.minutes as i32 - earlier.minutes as i32
    }

    /// Returns the duration between two times.
    ///
    /// Returns a negative duration if `other` is after `self`.
    pub fn signed_duration_since(&self, other: Self) -> Duration {
        Duration::minutes(self.minutes_since(other) as i64)
    }

    /// True if `self` lies in `[start, end]`.
    pub fn between(&self, start: Self, end: Self) -> bool {
        *self >= start && *self <= end
    }
}

impl fmt::Debug for TransitTime {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "TransitTime({:02}:{:02})", self.hour(), self.minute())
    }
}

impl fmt::Display for TransitTime {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:02}:{:02}", self.hour(), self.minute())
    }
}

impl TryFrom<String> for TransitTime {
    type Error = TimeError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse_hhmm(&value)
    }
}

impl From<TransitTime> for String {
    fn from(value: TransitTime) -> Self {
        value.to_string()
    }
}

/// Parse two ASCII digit bytes into a u32.
fn parse_two_digits(bytes: &[u8]) -> Option<u32> {
    if bytes.len() != 2 {
        return None;
    }
    let d1 = (bytes[0] as char).to_digit(10)?;
    let d2 = (bytes[1] as char).to_digit(10)?;
    Some(d1 * 10 + d2)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn t(s: &str) -> TransitTime {
        TransitTime::parse_hhmm(s).unwrap()
    }

    #[test]
    fn parse_valid_times() {
        assert_eq!(t("00:00").minutes_since_midnight(), 0);
        assert_eq!(t("09:05").minutes_since_midnight(), 545);
        assert_eq!(t("23:59").minutes_since_midnight(), 1439);
        assert_eq!(t("47:59"), TransitTime::MAX);
    }

    #[test]
    fn reject_invalid_format() {
        assert!(TransitTime::parse_hhmm("").is_err());
        assert!(TransitTime::parse_hhmm("9:05").is_err());
        assert!(TransitTime::parse_hhmm("09-05").is_err());
        assert!(TransitTime::parse_hhmm("ab:cd").is_err());
        assert!(TransitTime::parse_hhmm("48:00").is_err());
        assert!(TransitTime::parse_hhmm("12:60").is_err());
    }

    #[test]
    fn error_display() {
        let err = TransitTime::parse_hhmm("12:60").unwrap_err();
        assert_eq!(err.to_string(), "invalid time: minute must be 0-59");
    }

    #[test]
    fn next_day_times() {
        assert!(!t("23:59").is_next_day());
        assert!(t("24:00").is_next_day());
        assert_eq!(t("25:30").to_naive_time(), NaiveTime::from_hms_opt(1, 30, 0).unwrap());
    }

    #[test]
    fn arithmetic() {
        let time = t("23:50");
        assert_eq!(time.saturating_add_minutes(20), t("24:10"));
        assert_eq!(time.saturating_sub_minutes(50), t("23:00"));
        assert_eq!(t("00:10").saturating_sub_minutes(30), TransitTime::MIDNIGHT);
        assert_eq!(TransitTime::MAX.saturating_add_minutes(5), TransitTime::MAX);
        assert_eq!(TransitTime::MAX.checked_add_minutes(1), None);
        assert_eq!(t("10:15").minutes_since(t("10:00")), 15);
        assert_eq!(t("10:00").minutes_since(t("10:15")), -15);
        assert_eq!(
            t("11:00").signed_duration_since(t("10:00")),
            Duration::minutes(60)
        );
    }

    #[test]
    fn between_is_inclusive() {
        assert!(t("10:00").between(t("10:00"), t("10:30")));
        assert!(t("10:30").between(t("10:00"), t("10:30")));
        assert!(!t("10:31").between(t("10:00"), t("10:30")));
    }

    #[test]
    fn serde_as_string() {
        let json = serde_json::to_string(&t("08:45")).unwrap();
        assert_eq!(json, "\"08:45\"");
        let back: TransitTime = serde_json::from_str(&json).unwrap();
        assert_eq!(back, t("08:45"));
        assert!(serde_json::from_str::<TransitTime>("\"8:45\"").is_err());
    }

    #[test]
    fn debug() {
        assert_eq!(format!("{:?}", t("07:03")), "TransitTime(07:03)");
    }
}

#[cfg(test)]
mod proptests {
    use super::*;
    use proptest::prelude::*;

    prop_compose! {
        fn valid_time()(hour in 0u32..48, minute in 0u32..60) -> String {
            format!("{:02}:{:02}", hour, minute)
        }
    }

    proptest! {
        /// Parse then display roundtrips
        #[test]
        fn parse_display_roundtrip(time_str in valid_time()) {
            let parsed = TransitTime::parse_hhmm(&time_str).unwrap();
            prop_assert_eq!(parsed.to_string(), time_str);
        }

        /// Ordering agrees with minute offsets
        #[test]
        fn ordering_matches_minutes(a in 0u32..2880, b in 0u32..2880) {
            let ta = TransitTime::from_minutes(a).unwrap();
            let tb = TransitTime::from_minutes(b).unwrap();
            prop_assert_eq!(ta.cmp(&tb), a.cmp(&b));
        }

        /// Adding then measuring gives back the offset
        #[test]
        fn add_then_since(start in 0u32..1440, delta in 0u32..1440) {
            let t0 = TransitTime::from_minutes(start).unwrap();
            let t1 = t0.saturating_add_minutes(delta);
            prop_assert_eq!(t1.minutes_since(t0), delta as i32);
        }

        /// Out-of-range hours never parse
        #[test]
        fn large_hours_rejected(hour in 48u32..100, minute in 0u32..60) {
            let s = format!("{:02}:{:02}", hour, minute);
            prop_assert!(TransitTime::parse_hhmm(&s).is_err());
        }
    }
}
