//! Schedule fixtures for unit and scenario tests.

use chrono::{NaiveDate, Weekday};

use crate::domain::{
    LatLong, PlatformId, RouteId, ServiceId, StationId, TransitTime, TransportMode, TripId,
};
use crate::schedule::{
    CalendarException, ExceptionKind, Platform, Route, Schedule, ServiceCalendar, Station,
    StopCall, Trip,
};

pub(crate) fn date(s: &str) -> NaiveDate {
    NaiveDate::parse_from_str(s, "%Y-%m-%d").unwrap()
}

pub(crate) fn time(s: &str) -> TransitTime {
    TransitTime::parse_hhmm(s).unwrap()
}

pub(crate) fn station_id(s: &str) -> StationId {
    StationId::parse(s).unwrap()
}

/// A Wednesday inside the default calendars.
pub(crate) fn weekday() -> NaiveDate {
    date("2024-03-13")
}

/// A Sunday inside the default calendars.
pub(crate) fn sunday() -> NaiveDate {
    date("2024-03-17")
}

/// Trips as `(trip id, [(station, time)])`. A time is either "HH:MM" for
/// equal arrival and departure, or "HH:MM/HH:MM" for arrival/departure.
pub(crate) type TripStops<'a> = (&'a str, &'a [(&'a str, &'a str)]);

/// Incrementally assembled [`Schedule`].
///
/// Starts with two calendars covering 2024: "WKDY" (Monday to Friday) and
/// "SUN" (Sundays).
pub(crate) struct ScheduleFixture {
    schedule: Schedule,
}

impl ScheduleFixture {
    pub(crate) fn new() -> Self {
        let mut schedule = Schedule::default();
        schedule.calendars.push(ServiceCalendar {
            service: ServiceId::parse("WKDY").unwrap(),
            start: date("2024-01-01"),
            end: date("2024-12-31"),
            days: vec![
                Weekday::Mon,
                Weekday::Tue,
                Weekday::Wed,
                Weekday::Thu,
                Weekday::Fri,
            ],
        });
        schedule.calendars.push(ServiceCalendar {
            service: ServiceId::parse("SUN").unwrap(),
            start: date("2024-01-01"),
            end: date("2024-12-31"),
            days: vec![Weekday::Sun],
        });
        Self { schedule }
    }

    /// A tram stop with a single platform "{id}_1".
    pub(crate) fn tram_station(&mut self, id: &str, lat: f64, lon: f64) -> &mut Self {
        self.station_with_modes(id, lat, lon, &[TransportMode::Tram])
    }

    pub(crate) fn bus_station(&mut self, id: &str, lat: f64, lon: f64) -> &mut Self {
        self.station_with_modes(id, lat, lon, &[TransportMode::Bus])
    }

    /// A station serving `modes`, with platform "{id}_1" if any mode uses
    /// platforms.
    pub(crate) fn station_with_modes(
        &mut self,
        id: &str,
        lat: f64,
        lon: f64,
        modes: &[TransportMode],
    ) -> &mut Self {
        let position = LatLong::new(lat, lon);
        let mut platforms = Vec::new();
        if modes.iter().any(|m| m.has_platforms()) {
            let platform = PlatformId::parse(&format!("{id}_1")).unwrap();
            self.schedule.platforms.push(Platform {
                id: platform.clone(),
                station: station_id(id),
                name: "Platform 1".to_string(),
                position,
            });
            platforms.push(platform);
        }
        self.schedule.stations.push(Station {
            id: station_id(id),
            name: id.to_string(),
            position,
            modes: modes.to_vec(),
            platforms,
            is_interchange: false,
        });
        self
    }

    pub(crate) fn mark_interchange(&mut self, id: &str) -> &mut Self {
        let id = station_id(id);
        if let Some(station) = self.schedule.stations.iter_mut().find(|s| s.id == id) {
            station.is_interchange = true;
        }
        self
    }

    pub(crate) fn tram_route(&mut self, route: &str, service: &str, trips: &[TripStops<'_>]) -> &mut Self {
        self.route(route, TransportMode::Tram, service, trips)
    }

    pub(crate) fn bus_route(&mut self, route: &str, service: &str, trips: &[TripStops<'_>]) -> &mut Self {
        self.route(route, TransportMode::Bus, service, trips)
    }

    /// Add a route and its trips. Stop sequence numbers count up from 1 and
    /// platform-based modes use the station's first platform when it has one.
    pub(crate) fn route(
        &mut self,
        route: &str,
        mode: TransportMode,
        service: &str,
        trips: &[TripStops<'_>],
    ) -> &mut Self {
        let route_id = RouteId::parse(route).unwrap();
        if !self.schedule.routes.iter().any(|r| r.id == route_id) {
            self.schedule.routes.push(Route {
                id: route_id.clone(),
                name: route.to_string(),
                mode,
            });
        }

        for (trip, calls) in trips {
            let calls = calls
                .iter()
                .enumerate()
                .map(|(i, (station, times))| {
                    let (arrival, departure) = match times.split_once('/') {
                        Some((arr, dep)) => (time(arr), time(dep)),
                        None => (time(times), time(times)),
                    };
                    StopCall {
                        station: station_id(station),
                        platform: self.platform_for(station, mode),
                        sequence: i as u32 + 1,
                        arrival,
                        departure,
                        pick_up: true,
                        drop_off: true,
                    }
                })
                .collect();
            self.schedule.trips.push(Trip {
                id: TripId::parse(trip).unwrap(),
                route: route_id.clone(),
                service: ServiceId::parse(service).unwrap(),
                calls,
            });
        }
        self
    }

    fn platform_for(&self, station: &str, mode: TransportMode) -> Option<PlatformId> {
        if !mode.has_platforms() {
            return None;
        }
        let id = station_id(station);
        self.schedule
            .stations
            .iter()
            .find(|s| s.id == id)
            .and_then(|s| s.platforms.first().cloned())
    }

    /// Add a trip exactly as given.
    pub(crate) fn trip(&mut self, trip: Trip) -> &mut Self {
        self.schedule.trips.push(trip);
        self
    }

    pub(crate) fn calendar(
        &mut self,
        service: &str,
        start: &str,
        end: &str,
        days: &[Weekday],
    ) -> &mut Self {
        self.schedule.calendars.push(ServiceCalendar {
            service: ServiceId::parse(service).unwrap(),
            start: date(start),
            end: date(end),
            days: days.to_vec(),
        });
        self
    }

    pub(crate) fn exception(&mut self, service: &str, on: &str, kind: ExceptionKind) -> &mut Self {
        self.schedule.exceptions.push(CalendarException {
            service: ServiceId::parse(service).unwrap(),
            date: date(on),
            kind,
        });
        self
    }

    pub(crate) fn build(&self) -> Schedule {
        self.schedule.clone()
    }
}
