//! Admissibility checks applied to each candidate step of the search.
//!
//! Every check is a pure function of the step and the branch's state. The
//! traversal engine chains them cheapest first and stops at the first
//! rejection.

use std::collections::{BTreeMap, BTreeSet, HashSet};

use crate::domain::{ServiceId, StationId, TransitTime, TransportMode, TripId};
use crate::graph::{EdgeKind, HourNode, NodeId, Relation, ServiceSpan};

use super::calendar::RunningServices;
use super::reachability::Reachability;

/// Why a step was not taken.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum RejectReason {
    /// The calendar service does not run on the travel date.
    NotRunning,
    /// The clock is outside the service's departures, allowing for the wait.
    ServiceWindow,
    /// The clock is outside the hour, allowing for the wait.
    HourWindow,
    /// The departure has gone, or is more than the maximum wait away.
    MinuteWindow,
    /// A step that would switch trip without alighting.
    TripContinuity,
    /// Alighting straight after boarding.
    Reboard,
    /// No destination station is reachable from this route-station.
    Unreachable,
    /// The path is at the edge count ceiling.
    PathLength,
    /// The station is already on this path.
    Revisit,
    /// An equivalent visit has already been explored.
    Visited,
    /// The mode was not requested.
    ModeExcluded,
    /// An edge or node id did not resolve.
    Dangling,
    /// A walk straight after another walk.
    ChainedWalk,
    /// A change of vehicle away from an interchange, when changes are
    /// limited to interchanges.
    NotInterchange,
}

/// Outcome of a single check.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Admission {
    Admit,
    Reject(RejectReason),
}

impl Admission {
    pub fn is_admitted(self) -> bool {
        self == Admission::Admit
    }

    /// Run `next` only if this check admitted.
    pub fn and_then(self, next: impl FnOnce() -> Admission) -> Admission {
        match self {
            Admission::Admit => next(),
            reject => reject,
        }
    }

    fn check(admit: bool, reason: RejectReason) -> Self {
        if admit {
            Admission::Admit
        } else {
            Admission::Reject(reason)
        }
    }
}

/// Admit a service node iff its calendar service runs on the travel date.
pub fn calendar(running: &RunningServices, service: &ServiceId) -> Admission {
    Admission::check(running.is_running(service), RejectReason::NotRunning)
}

/// Admit iff `clock` lies in `[earliest - max_wait, latest]`.
pub fn service_window(span: Option<ServiceSpan>, clock: TransitTime, max_wait: u32) -> Admission {
    let admit = span.is_some_and(|span| {
        clock.between(span.earliest.saturating_sub_minutes(max_wait), span.latest)
    });
    Admission::check(admit, RejectReason::ServiceWindow)
}

/// Admit iff `clock` lies in `[hour start - max_wait, hour end]`.
pub fn hour_window(hour: &HourNode, clock: TransitTime, max_wait: u32) -> Admission {
    Admission::check(
        clock.between(hour.start().saturating_sub_minutes(max_wait), hour.end()),
        RejectReason::HourWindow,
    )
}

/// Admit iff `departure` is no earlier than `clock` and at most `max_wait`
/// minutes after it.
pub fn minute_window(departure: TransitTime, clock: TransitTime, max_wait: u32) -> Admission {
    Admission::check(
        departure.between(clock, clock.saturating_add_minutes(max_wait)),
        RejectReason::MinuteWindow,
    )
}

/// While riding `current`, only steps that stay on it are admitted.
pub fn trip_continuity(current: Option<&TripId>, relation: &Relation) -> Admission {
    let Some(current) = current else {
        return Admission::Admit;
    };
    let admit = match relation {
        Relation::ToService { trips } => trips.contains(current),
        Relation::ToMinute { trip } | Relation::GoesTo { trip, .. } => trip == current,
        _ => true,
    };
    Admission::check(admit, RejectReason::TripContinuity)
}

/// The step after boarding must not be straight back off.
pub fn reboard(previous: Option<EdgeKind>, next: EdgeKind) -> Admission {
    let bounce = previous.is_some_and(EdgeKind::is_boarding) && next.is_departing();
    Admission::check(!bounce, RejectReason::Reboard)
}

/// A walk may not follow straight on from another walk.
pub fn chained_walk(previous: Option<EdgeKind>, next: EdgeKind) -> Admission {
    let chained = previous.is_some_and(EdgeKind::is_walk) && next.is_walk();
    Admission::check(!chained, RejectReason::ChainedWalk)
}

/// With changes limited to interchanges, any boarding after the first ride
/// must be an interchange boarding.
pub fn change_point(next: EdgeKind, rides: u32, interchange_only: bool) -> Admission {
    let admit = !interchange_only || rides == 0 || next != EdgeKind::Board;
    Admission::check(admit, RejectReason::NotInterchange)
}

/// Admit a route-station iff a destination station may still be reached
/// from it.
pub fn destination_reachable(
    reachability: &Reachability,
    route_station: NodeId,
    targets: &HashSet<StationId>,
) -> Admission {
    Admission::check(
        reachability.admits(route_station, targets),
        RejectReason::Unreachable,
    )
}

/// Admit while the path has at most `ceiling` edges.
pub fn path_length(edges: usize, ceiling: usize) -> Admission {
    Admission::check(edges <= ceiling, RejectReason::PathLength)
}

/// Admit boarding a `mode` the request allows. `None` allows every mode.
pub fn mode_allowed(modes: Option<&BTreeSet<TransportMode>>, mode: TransportMode) -> Admission {
    Admission::check(
        modes.is_none_or(|m| m.contains(&mode)),
        RejectReason::ModeExcluded,
    )
}

/// Rejection tallies for one query.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Diagnostics {
    pub rejected: BTreeMap<RejectReason, usize>,
    pub expanded: usize,
    pub accepted: usize,
}

impl Diagnostics {
    pub fn reject(&mut self, reason: RejectReason) {
        *self.rejected.entry(reason).or_default() += 1;
    }

    pub fn rejections(&self, reason: RejectReason) -> usize {
        self.rejected.get(&reason).copied().unwrap_or(0)
    }

    pub fn total_rejections(&self) -> usize {
        self.rejected.values().sum()
    }

    /// Add another query's tallies to these.
    pub fn merge(&mut self, other: &Diagnostics) {
        for (reason, count) in &other.rejected {
            *self.rejected.entry(*reason).or_default() += count;
        }
        self.expanded += other.expanded;
        self.accepted += other.accepted;
    }
}
