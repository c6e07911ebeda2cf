//! Per-branch journey state.
//!
//! The clock is derived from an anchor: the time and cumulative path cost at
//! the last point the clock was pinned (query start, boarding, a caught
//! departure, alighting). Between anchors the clock advances by exactly the
//! cost accumulated since, so `clock = anchor_time + (total - anchor_cost)`.
//!
//! States are values. Each step derives a child state and the parent is left
//! untouched for sibling branches.

use crate::domain::{TransitTime, TransportMode, TripId};

/// Journey state machine violations.
///
/// These mean the search let an impossible step through, not that the
/// caller did anything wrong.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum StateError {
    #[error("boarding a vehicle at {at} while already on a {mode}")]
    AlreadyBoarded { mode: TransportMode, at: TransitTime },

    #[error("no vehicle boarded at {at}")]
    NotBoarded { at: TransitTime },
}

/// Where one search branch stands.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct JourneyState {
    clock: TransitTime,
    boarded: Option<TransportMode>,
    anchor_time: TransitTime,
    anchor_cost: u32,
    trip: Option<TripId>,
    rides: u32,
}

impl JourneyState {
    /// State at the start of a query: not boarded, nothing spent.
    pub fn new(query_time: TransitTime) -> Self {
        Self {
            clock: query_time,
            boarded: None,
            anchor_time: query_time,
            anchor_cost: 0,
            trip: None,
            rides: 0,
        }
    }

    pub fn clock(&self) -> TransitTime {
        self.clock
    }

    pub fn boarded_mode(&self) -> Option<TransportMode> {
        self.boarded
    }

    pub fn is_boarded(&self) -> bool {
        self.boarded.is_some()
    }

    /// Vehicle legs completed so far.
    pub fn rides(&self) -> u32 {
        self.rides
    }

    /// The trip being ridden, once a departure has been caught.
    pub fn current_trip(&self) -> Option<&TripId> {
        self.trip.as_ref()
    }

    fn clock_at(&self, total_cost: u32) -> TransitTime {
        self.anchor_time
            .saturating_add_minutes(total_cost.saturating_sub(self.anchor_cost))
    }

    /// Step onto a vehicle of `mode` with `total_cost` spent so far.
    pub fn board(&self, mode: TransportMode, total_cost: u32) -> Result<Self, StateError> {
        if let Some(current) = self.boarded {
            return Err(StateError::AlreadyBoarded {
                mode: current,
                at: self.clock,
            });
        }
        let clock = self.clock_at(total_cost);
        Ok(Self {
            clock,
            boarded: Some(mode),
            anchor_time: clock,
            anchor_cost: total_cost,
            trip: None,
            rides: self.rides,
        })
    }

    /// Leave the vehicle with `total_cost` spent so far.
    pub fn alight(&self, total_cost: u32) -> Result<Self, StateError> {
        if self.boarded.is_none() {
            return Err(StateError::NotBoarded { at: self.clock });
        }
        let clock = self.clock_at(total_cost);
        Ok(Self {
            clock,
            boarded: None,
            anchor_time: clock,
            anchor_cost: total_cost,
            trip: None,
            rides: self.rides + 1,
        })
    }

    /// Move the clock on to account for `total_cost`, boarded or not.
    pub fn advance_clock(&self, total_cost: u32) -> Self {
        Self {
            clock: self.clock_at(total_cost),
            ..self.clone()
        }
    }

    /// Catch `trip` departing at `departure`, which becomes the new anchor.
    pub fn record_departure(
        &self,
        departure: TransitTime,
        trip: &TripId,
        total_cost: u32,
    ) -> Result<Self, StateError> {
        if self.boarded.is_none() {
            return Err(StateError::NotBoarded { at: self.clock });
        }
        Ok(Self {
            clock: departure,
            boarded: self.boarded,
            anchor_time: departure,
            anchor_cost: total_cost,
            trip: Some(trip.clone()),
            rides: self.rides,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::time;

    fn trip(s: &str) -> TripId {
        TripId::parse(s).unwrap()
    }

    #[test]
    fn walking_advances_clock_by_cost() {
        let state = JourneyState::new(time("08:00"));
        let walked = state.advance_clock(7);

        assert_eq!(walked.clock(), time("08:07"));
        assert!(!walked.is_boarded());
        // Parent untouched
        assert_eq!(state.clock(), time("08:00"));
    }

    #[test]
    fn ride_sets_clock_from_departure() {
        let start = JourneyState::new(time("08:00")).advance_clock(5);
        let boarded = start.board(TransportMode::Tram, 6).unwrap();
        assert_eq!(boarded.clock(), time("08:06"));
        assert_eq!(boarded.boarded_mode(), Some(TransportMode::Tram));

        // Wait for the 08:15, then ride for 10 minutes and pay 1 to alight
        let caught = boarded
            .record_departure(time("08:15"), &trip("T1"), 6)
            .unwrap();
        assert_eq!(caught.clock(), time("08:15"));
        assert_eq!(caught.current_trip(), Some(&trip("T1")));

        let riding = caught.advance_clock(16);
        assert_eq!(riding.clock(), time("08:25"));

        let alighted = riding.alight(17).unwrap();
        assert_eq!(alighted.clock(), time("08:26"));
        assert!(!alighted.is_boarded());
        assert!(alighted.current_trip().is_none());
        assert_eq!(caught.rides(), 0);
        assert_eq!(alighted.rides(), 1);
    }

    #[test]
    fn double_board_fails() {
        let boarded = JourneyState::new(time("08:00"))
            .board(TransportMode::Bus, 2)
            .unwrap();
        assert_eq!(
            boarded.board(TransportMode::Tram, 3),
            Err(StateError::AlreadyBoarded {
                mode: TransportMode::Bus,
                at: time("08:02"),
            })
        );
    }

    #[test]
    fn alight_without_boarding_fails() {
        let state = JourneyState::new(time("08:00"));
        assert_eq!(
            state.alight(1),
            Err(StateError::NotBoarded { at: time("08:00") })
        );
        assert!(state.record_departure(time("08:05"), &trip("T1"), 0).is_err());
    }

    #[test]
    fn clock_saturates() {
        let state = JourneyState::new(time("47:50")).advance_clock(30);
        assert_eq!(state.clock(), TransitTime::MAX);
    }

    #[test]
    fn error_display() {
        let err = StateError::NotBoarded { at: time("09:30") };
        assert_eq!(
            err.to_string(),
            "no vehicle boarded at 09:30"
        );
    }
}
