//! Walking neighbours between stations.
//!
//! Stations close enough to walk between become neighbours, enabling
//! connections that don't appear in any timetable (e.g. from a tram stop to a
//! nearby bus stop). Walk durations are derived from straight-line distance
//! and a walking speed.

use std::collections::{BTreeMap, HashMap};

use chrono::Duration;

use crate::domain::{LatLong, StationId};
use crate::schedule::Station;

/// Minutes needed to walk `distance_m` at `speed_m_per_min`.
///
/// Rounds up, and never returns less than one minute so that a walk always
/// advances the journey clock.
pub fn walk_minutes(distance_m: f64, speed_m_per_min: f64) -> u32 {
    if speed_m_per_min <= 0.0 {
        return u32::MAX;
    }
    ((distance_m / speed_m_per_min).ceil() as u32).max(1)
}

/// Stations within `range_m` of `point`, nearest first, with walk minutes.
pub fn stations_within<'a>(
    point: &LatLong,
    stations: impl IntoIterator<Item = (&'a StationId, &'a LatLong)>,
    range_m: f64,
    speed_m_per_min: f64,
) -> Vec<(StationId, u32)> {
    let mut found: Vec<(StationId, f64)> = stations
        .into_iter()
        .map(|(id, pos)| (id.clone(), point.distance_m(pos)))
        .filter(|(_, d)| *d <= range_m)
        .collect();
    found.sort_by(|a, b| a.1.total_cmp(&b.1).then_with(|| a.0.cmp(&b.0)));
    found
        .into_iter()
        .map(|(id, d)| (id, walk_minutes(d, speed_m_per_min)))
        .collect()
}

/// Symmetric station-to-station walk table.
///
/// A walk from A to B takes as long as the walk back.
#[derive(Debug, Clone, Default)]
pub struct WalkableConnections {
    /// Walk minutes to each neighbour, keyed by station. Both directions are
    /// present.
    neighbours: HashMap<StationId, BTreeMap<StationId, u32>>,
}

impl WalkableConnections {
    /// No neighbours at all.
    pub fn new() -> Self {
        Self::default()
    }

    /// Discover neighbours among `stations`: every distinct pair no further
    /// apart than `max_distance_m`.
    pub fn from_stations(stations: &[Station], max_distance_m: f64, speed_m_per_min: f64) -> Self {
        let mut connections = Self::new();
        for (i, a) in stations.iter().enumerate() {
            for b in &stations[i + 1..] {
                let distance = a.position.distance_m(&b.position);
                if distance <= max_distance_m {
                    connections.add(
                        a.id.clone(),
                        b.id.clone(),
                        walk_minutes(distance, speed_m_per_min),
                    );
                }
            }
        }
        connections
    }

    /// Record a walk in both directions. A station is never its own
    /// neighbour, so `from == to` is ignored.
    pub fn add(&mut self, from: StationId, to: StationId, duration_minutes: u32) {
        if from == to {
            return;
        }
        self.neighbours
            .entry(from.clone())
            .or_default()
            .insert(to.clone(), duration_minutes);
        self.neighbours
            .entry(to)
            .or_default()
            .insert(from, duration_minutes);
    }

    /// Walk time from `from` to `to` as a duration.
    pub fn get(&self, from: &StationId, to: &StationId) -> Option<Duration> {
        self.minutes(from, to).map(|mins| Duration::minutes(mins as i64))
    }

    /// Walk time from `from` to `to` in whole minutes.
    pub fn minutes(&self, from: &StationId, to: &StationId) -> Option<u32> {
        self.neighbours.get(from)?.get(to).copied()
    }

    /// Whether `to` is a walking neighbour of `from`.
    pub fn is_walkable(&self, from: &StationId, to: &StationId) -> bool {
        self.minutes(from, to).is_some()
    }

    /// Neighbours of `from` with their walk minutes, ordered by station id.
    pub fn neighbours_of<'a>(
        &'a self,
        from: &StationId,
    ) -> impl Iterator<Item = (&'a StationId, u32)> {
        self.neighbours
            .get(from)
            .into_iter()
            .flat_map(|walks| walks.iter().map(|(to, mins)| (to, *mins)))
    }

    /// Owned copy of [`Self::neighbours_of`].
    pub fn walkable_from(&self, from: &StationId) -> Vec<(StationId, u32)> {
        self.neighbours_of(from)
            .map(|(to, mins)| (to.clone(), mins))
            .collect()
    }

    /// All directed pairs, ordered, for building graph edges deterministically.
    pub fn pairs(&self) -> Vec<(&StationId, &StationId, u32)> {
        let mut pairs: Vec<_> = self
            .neighbours
            .iter()
            .flat_map(|(from, walks)| walks.iter().map(move |(to, mins)| (from, to, *mins)))
            .collect();
        pairs.sort();
        pairs
    }

    /// Number of neighbour pairs, each counted once.
    pub fn len(&self) -> usize {
        self.neighbours.values().map(BTreeMap::len).sum::<usize>() / 2
    }

    pub fn is_empty(&self) -> bool {
        self.neighbours.is_empty()
    }
}

/// Fluent construction from string ids, for fixtures and hand-made tables.
#[derive(Debug, Default)]
pub struct WalkableConnectionsBuilder {
    inner: WalkableConnections,
}

impl WalkableConnectionsBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a walkable connection, skipping invalid station ids.
    pub fn add(mut self, from: &str, to: &str, duration_minutes: u32) -> Self {
        if let (Ok(from), Ok(to)) = (StationId::parse(from), StationId::parse(to)) {
            self.inner.add(from, to, duration_minutes);
        }
        self
    }

    pub fn build(self) -> WalkableConnections {
        self.inner
    }
}
