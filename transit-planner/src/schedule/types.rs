//! Schedule entity types.

use std::path::Path;

use chrono::{Datelike, NaiveDate, Weekday};
use serde::{Deserialize, Serialize};

use super::ScheduleError;
use crate::domain::{
    LatLong, PlatformId, RouteId, ServiceId, StationId, TransitTime, TransportMode, TripId,
};

fn yes() -> bool {
    true
}

/// A physical stop.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Station {
    pub id: StationId,
    pub name: String,
    pub position: LatLong,
    /// Modes calling here.
    pub modes: Vec<TransportMode>,
    /// Platforms owned by this station (empty for modes without platforms).
    #[serde(default)]
    pub platforms: Vec<PlatformId>,
    /// Marked as an interchange in the source data.
    #[serde(default)]
    pub is_interchange: bool,
}

impl Station {
    /// True if the station has any platform-based mode.
    pub fn has_platforms(&self) -> bool {
        !self.platforms.is_empty()
    }
}

/// A boarding point within a station.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Platform {
    pub id: PlatformId,
    pub station: StationId,
    pub name: String,
    pub position: LatLong,
}

/// A route: a sequence of stops served by one mode.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Route {
    pub id: RouteId,
    pub name: String,
    pub mode: TransportMode,
}

/// A trip calling at a station.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StopCall {
    pub station: StationId,
    /// Platform used, for platform-based modes.
    #[serde(default)]
    pub platform: Option<PlatformId>,
    /// Stop sequence number from the source feed; increases along the trip.
    pub sequence: u32,
    pub arrival: TransitTime,
    pub departure: TransitTime,
    /// Passengers may board here.
    #[serde(default = "yes")]
    pub pick_up: bool,
    /// Passengers may alight here.
    #[serde(default = "yes")]
    pub drop_off: bool,
}

/// A single scheduled run of a vehicle along a route.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Trip {
    pub id: TripId,
    pub route: RouteId,
    pub service: ServiceId,
    /// Stop calls. Feeds do not always list them in travel order; `sequence`
    /// is authoritative.
    pub calls: Vec<StopCall>,
}

impl Trip {
    /// Lowest stop sequence number on the trip.
    pub fn first_sequence(&self) -> Option<u32> {
        self.calls.iter().map(|c| c.sequence).min()
    }

    /// Highest stop sequence number on the trip.
    pub fn last_sequence(&self) -> Option<u32> {
        self.calls.iter().map(|c| c.sequence).max()
    }

    /// Calls sorted by stop sequence number.
    pub fn calls_in_order(&self) -> Vec<&StopCall> {
        let mut calls: Vec<&StopCall> = self.calls.iter().collect();
        calls.sort_by_key(|c| c.sequence);
        calls
    }
}

/// Weekly running pattern of a service over a validity range.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ServiceCalendar {
    pub service: ServiceId,
    pub start: NaiveDate,
    pub end: NaiveDate,
    pub days: Vec<Weekday>,
}

impl ServiceCalendar {
    /// True if the weekly pattern covers `date` (exceptions not applied).
    pub fn pattern_matches(&self, date: NaiveDate) -> bool {
        date >= self.start && date <= self.end && self.days.contains(&date.weekday())
    }
}

/// Whether an exception adds or removes a date.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ExceptionKind {
    Added,
    Removed,
}

/// A single-date override of a service's weekly pattern.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CalendarException {
    pub service: ServiceId,
    pub date: NaiveDate,
    pub kind: ExceptionKind,
}

/// The complete resolved timetable.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Schedule {
    #[serde(default)]
    pub stations: Vec<Station>,
    #[serde(default)]
    pub platforms: Vec<Platform>,
    #[serde(default)]
    pub routes: Vec<Route>,
    #[serde(default)]
    pub trips: Vec<Trip>,
    #[serde(default)]
    pub calendars: Vec<ServiceCalendar>,
    #[serde(default)]
    pub exceptions: Vec<CalendarException>,
}

impl Schedule {
    /// Parse a schedule snapshot from JSON text.
    pub fn from_json(json: &str) -> Result<Self, ScheduleError> {
        Ok(serde_json::from_str(json)?)
    }

    /// Load a schedule snapshot from a JSON file.
    pub fn load(path: &Path) -> Result<Self, ScheduleError> {
        let text = std::fs::read_to_string(path).map_err(|source| ScheduleError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_json(&text)
    }

    /// Look up a station by id.
    pub fn station(&self, id: &StationId) -> Option<&Station> {
        self.stations.iter().find(|s| &s.id == id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    const SNAPSHOT: &str = r#"{
        "stations": [
            {"id": "ALT", "name": "Altrincham", "position": {"lat": 53.387, "lon": -2.347},
             "modes": ["tram"], "platforms": ["ALT1"], "is_interchange": true}
        ],
        "platforms": [
            {"id": "ALT1", "station": "ALT", "name": "Platform 1",
             "position": {"lat": 53.387, "lon": -2.347}}
        ],
        "routes": [{"id": "Purple", "name": "Altrincham - Piccadilly", "mode": "tram"}],
        "trips": [
            {"id": "T1", "route": "Purple", "service": "WKDY", "calls": [
                {"station": "ALT", "platform": "ALT1", "sequence": 1,
                 "arrival": "08:00", "departure": "08:00"}
            ]}
        ],
        "calendars": [
            {"service": "WKDY", "start": "2024-01-01", "end": "2024-12-31",
             "days": ["Mon", "Tue", "Wed", "Thu", "Fri"]}
        ],
        "exceptions": [{"service": "WKDY", "date": "2024-12-25", "kind": "removed"}]
    }"#;

    #[test]
    fn parse_snapshot() {
        let schedule = Schedule::from_json(SNAPSHOT).unwrap();
        assert_eq!(schedule.stations.len(), 1);
        assert_eq!(schedule.trips[0].calls.len(), 1);
        assert!(schedule.trips[0].calls[0].pick_up);
        assert!(schedule.trips[0].calls[0].drop_off);
        assert_eq!(schedule.exceptions[0].kind, ExceptionKind::Removed);
        assert!(schedule.stations[0].is_interchange);
    }

    #[test]
    fn load_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(SNAPSHOT.as_bytes()).unwrap();

        let schedule = Schedule::load(file.path()).unwrap();
        let alt = StationId::parse("ALT").unwrap();
        assert_eq!(schedule.station(&alt).unwrap().name, "Altrincham");
    }

    #[test]
    fn load_missing_file() {
        let dir = tempfile::tempdir().unwrap();
        let err = Schedule::load(&dir.path().join("nope.json")).unwrap_err();
        assert!(matches!(err, ScheduleError::Io { .. }));
    }

    #[test]
    fn reject_bad_time() {
        let bad = SNAPSHOT.replace("\"08:00\", \"departure\"", "\"8am\", \"departure\"");
        assert!(matches!(
            Schedule::from_json(&bad),
            Err(ScheduleError::Json(_))
        ));
    }

    #[test]
    fn calendar_pattern() {
        let cal = ServiceCalendar {
            service: ServiceId::parse("WKDY").unwrap(),
            start: NaiveDate::from_ymd_opt(2024, 3, 1).unwrap(),
            end: NaiveDate::from_ymd_opt(2024, 3, 31).unwrap(),
            days: vec![Weekday::Mon, Weekday::Fri],
        };
        // 2024-03-15 is a Friday, 2024-03-16 a Saturday
        assert!(cal.pattern_matches(NaiveDate::from_ymd_opt(2024, 3, 15).unwrap()));
        assert!(!cal.pattern_matches(NaiveDate::from_ymd_opt(2024, 3, 16).unwrap()));
        // Monday outside the range
        assert!(!cal.pattern_matches(NaiveDate::from_ymd_opt(2024, 4, 1).unwrap()));
    }

    #[test]
    fn trip_sequence_bounds() {
        let schedule = Schedule::from_json(SNAPSHOT).unwrap();
        let trip = &schedule.trips[0];
        assert_eq!(trip.first_sequence(), Some(1));
        assert_eq!(trip.last_sequence(), Some(1));
    }

    #[test]
    fn calls_sorted_by_sequence() {
        let mut trip = Schedule::from_json(SNAPSHOT).unwrap().trips.remove(0);
        let mut later = trip.calls[0].clone();
        later.sequence = 5;
        let mut earlier = trip.calls[0].clone();
        earlier.sequence = 0;
        trip.calls = vec![later, trip.calls[0].clone(), earlier];

        let order: Vec<u32> = trip.calls_in_order().iter().map(|c| c.sequence).collect();
        assert_eq!(order, vec![0, 1, 5]);
    }
}
