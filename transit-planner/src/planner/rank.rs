//! Itinerary ranking for merged search results.
//!
//! Each candidate time is searched independently, so results from several
//! times overlap and arrive in no useful order.

use std::collections::HashSet;

use super::itinerary::Itinerary;

/// Rank itineraries by preference.
///
/// Itineraries are ranked by:
/// 1. Arrival time (earlier is better)
/// 2. Number of changes (fewer is better)
/// 3. Total cost (lower is better)
/// 4. Departure time (later is better, less waiting around)
///
/// Returns itineraries sorted best-first.
pub fn rank_itineraries(mut itineraries: Vec<Itinerary>) -> Vec<Itinerary> {
    itineraries.sort_by(|a, b| {
        a.arrives()
            .cmp(&b.arrives())
            .then_with(|| a.changes().cmp(&b.changes()))
            .then_with(|| a.total_cost.cmp(&b.total_cost))
            .then_with(|| b.departs().cmp(&a.departs()))
    });
    itineraries
}

/// Drop itineraries that ride the same trips between the same stops at the
/// same times as an earlier one, whatever time they were found from.
///
/// Keeps the first of each group, so order is otherwise preserved.
pub fn deduplicate(itineraries: Vec<Itinerary>) -> Vec<Itinerary> {
    let mut seen = HashSet::new();
    itineraries
        .into_iter()
        .filter(|itinerary| seen.insert(itinerary.key()))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{RouteId, ServiceId, TransitTime, TransportMode, TripId};
    use crate::planner::itinerary::{Leg, VehicleLeg};
    use crate::testing::{station_id, time};

    fn leg(trip: &str, from: &str, to: &str, departs: &str, arrives: &str) -> Leg {
        Leg::Vehicle(VehicleLeg {
            mode: TransportMode::Bus,
            route: RouteId::parse("B1").unwrap(),
            trip: TripId::parse(trip).unwrap(),
            service: ServiceId::parse("WKDY").unwrap(),
            board: station_id(from),
            board_platform: None,
            alight: station_id(to),
            alight_platform: None,
            departs: time(departs),
            arrives: time(arrives),
            passed_stops: 0,
            cost: 0,
        })
    }

    fn itinerary(query_time: &str, total_cost: u32, legs: Vec<Leg>) -> Itinerary {
        Itinerary {
            query_time: time(query_time),
            legs,
            total_cost,
        }
    }

    #[test]
    fn rank_by_arrival() {
        let late = itinerary("10:00", 30, vec![leg("X", "A", "B", "10:10", "10:40")]);
        let early = itinerary("10:00", 30, vec![leg("Y", "A", "B", "10:00", "10:30")]);

        let ranked = rank_itineraries(vec![late, early]);

        assert_eq!(ranked[0].arrives(), time("10:30"));
        assert_eq!(ranked[1].arrives(), time("10:40"));
    }

    #[test]
    fn rank_by_changes_when_same_arrival() {
        let direct = itinerary("10:00", 90, vec![leg("D", "A", "C", "10:00", "11:30")]);
        let change = itinerary(
            "10:00",
            80,
            vec![
                leg("C1", "A", "B", "10:00", "10:30"),
                leg("C2", "B", "C", "10:45", "11:30"),
            ],
        );

        let ranked = rank_itineraries(vec![change, direct]);

        assert_eq!(ranked[0].changes(), 0);
        assert_eq!(ranked[1].changes(), 1);
    }

    #[test]
    fn later_departure_breaks_ties() {
        let early = itinerary("09:50", 20, vec![leg("E", "A", "B", "09:55", "10:30")]);
        let late = itinerary("09:50", 20, vec![leg("L", "A", "B", "10:05", "10:30")]);

        let ranked = rank_itineraries(vec![early, late]);

        assert_eq!(ranked[0].departs(), time("10:05"));
    }

    #[test]
    fn deduplicate_across_query_times() {
        let first = itinerary("10:00", 30, vec![leg("X", "A", "B", "10:10", "10:40")]);
        let again = itinerary("10:05", 30, vec![leg("X", "A", "B", "10:10", "10:40")]);
        let other = itinerary("10:05", 30, vec![leg("Y", "A", "B", "10:20", "10:50")]);

        let result = deduplicate(vec![first, again, other]);

        assert_eq!(result.len(), 2);
        assert_eq!(result[0].query_time, time("10:00"));
    }

    #[test]
    fn empty_input() {
        assert!(rank_itineraries(vec![]).is_empty());
        assert!(deduplicate(vec![]).is_empty());
    }

    mod proptests {
        use super::*;
        use proptest::prelude::*;

        fn at(minutes: u32) -> TransitTime {
            TransitTime::from_minutes(minutes).unwrap()
        }

        fn arb_itinerary() -> impl Strategy<Value = Itinerary> {
            (0u32..1200, 1u32..120, 0u32..200, 0u8..4).prop_map(|(dep, ride, cost, trip)| {
                let mut it = itinerary("00:00", cost, vec![]);
                it.legs.push(Leg::Vehicle(VehicleLeg {
                    departs: at(dep),
                    arrives: at(dep + ride),
                    ..match leg(&format!("T{trip}"), "A", "B", "00:00", "00:00") {
                        Leg::Vehicle(v) => v,
                        Leg::Walk(_) => unreachable!(),
                    }
                }));
                it
            })
        }

        proptest! {
            #[test]
            fn ranked_arrivals_non_decreasing(items in prop::collection::vec(arb_itinerary(), 0..20)) {
                let ranked = rank_itineraries(items);
                for pair in ranked.windows(2) {
                    prop_assert!(pair[0].arrives() <= pair[1].arrives());
                }
            }

            #[test]
            fn deduplicate_is_idempotent(items in prop::collection::vec(arb_itinerary(), 0..20)) {
                let once = deduplicate(items);
                let twice = deduplicate(once.clone());
                prop_assert_eq!(once.len(), twice.len());
            }
        }
    }
}
