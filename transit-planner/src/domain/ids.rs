//! Identifier types for timetable entities.
//!
//! Timetable feeds use opaque string identifiers. Each entity kind gets its
//! own newtype so a trip id can never be passed where a station id is
//! expected. Identifiers are validated at construction: non-empty, no
//! whitespace.

use std::fmt;
use std::sync::Arc;

use serde::{Deserialize, Serialize};

/// Error returned when parsing an invalid identifier.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("invalid {kind} id: {reason}")]
pub struct InvalidId {
    kind: &'static str,
    reason: &'static str,
}

fn validate(kind: &'static str, s: &str) -> Result<(), InvalidId> {
    if s.is_empty() {
        return Err(InvalidId {
            kind,
            reason: "must not be empty",
        });
    }
    if s.chars().any(char::is_whitespace) {
        return Err(InvalidId {
            kind,
            reason: "must not contain whitespace",
        });
    }
    Ok(())
}

macro_rules! timetable_id {
    ($(#[$meta:meta])* $name:ident, $kind:literal) => {
        $(#[$meta])*
        #[derive(Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
        #[serde(try_from = "String", into = "String")]
        pub struct $name(Arc<str>);

        impl $name {
            /// Parse an identifier, rejecting empty or whitespace-bearing input.
            pub fn parse(s: &str) -> Result<Self, InvalidId> {
                validate($kind, s)?;
                Ok(Self(Arc::from(s)))
            }

            /// Returns the identifier as a string slice.
            pub fn as_str(&self) -> &str {
                &self.0
            }
        }

        impl fmt::Debug for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}({})", stringify!($name), self.0)
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(&self.0)
            }
        }

        impl TryFrom<String> for $name {
            type Error = InvalidId;

            fn try_from(value: String) -> Result<Self, Self::Error> {
                Self::parse(&value)
            }
        }

        impl From<$name> for String {
            fn from(value: $name) -> Self {
                value.0.to_string()
            }
        }
    };
}

timetable_id!(
    /// A physical stop (tram stop, bus stop, rail station).
    ///
    /// # Examples
    ///
    /// ```
    /// use transit_planner::domain::StationId;
    ///
    /// let id = StationId::parse("9400ZZMAALT").unwrap();
    /// assert_eq!(id.as_str(), "9400ZZMAALT");
    ///
    /// assert!(StationId::parse("").is_err());
    /// assert!(StationId::parse("ALT RINCHAM").is_err());
    /// ```
    StationId,
    "station"
);

timetable_id!(
    /// A boarding point owned by a station.
    PlatformId,
    "platform"
);

timetable_id!(
    /// A named route, e.g. one direction of a tram line.
    RouteId,
    "route"
);

timetable_id!(
    /// A single scheduled vehicle run.
    TripId,
    "trip"
);

timetable_id!(
    /// A calendar service: the set of days a group of trips runs on.
    ServiceId,
    "service"
);

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_valid() {
        assert!(StationId::parse("ALT").is_ok());
        assert!(TripId::parse("trip-1:a").is_ok());
        assert!(ServiceId::parse("WKDY").is_ok());
    }

    #[test]
    fn reject_invalid() {
        assert!(RouteId::parse("").is_err());
        assert!(RouteId::parse("A B").is_err());
        assert!(PlatformId::parse("P1\t").is_err());
    }

    #[test]
    fn error_display_names_kind() {
        let err = TripId::parse("").unwrap_err();
        assert_eq!(err.to_string(), "invalid trip id: must not be empty");
    }

    #[test]
    fn display_and_debug() {
        let id = StationId::parse("ALT").unwrap();
        assert_eq!(format!("{}", id), "ALT");
        assert_eq!(format!("{:?}", id), "StationId(ALT)");
    }

    #[test]
    fn serde_validates() {
        let id: RouteId = serde_json::from_str("\"Green\"").unwrap();
        assert_eq!(id.as_str(), "Green");
        assert!(serde_json::from_str::<RouteId>("\"\"").is_err());
        assert_eq!(serde_json::to_string(&id).unwrap(), "\"Green\"");
    }

    #[test]
    fn hash_consistent_with_eq() {
        use std::collections::HashSet;
        let mut set = HashSet::new();
        set.insert(TripId::parse("T1").unwrap());
        assert!(set.contains(&TripId::parse("T1").unwrap()));
        assert!(!set.contains(&TripId::parse("T2").unwrap()));
    }
}
