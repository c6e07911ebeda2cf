//! A built transport network, ready to be searched.
//!
//! Bundles the graph with everything precomputed from it once per
//! timetable version: interchanges, same-route reachability, walking
//! neighbours, service departure spans and the calendar index. Read-only
//! after construction, so one network can be shared behind an `Arc` by any
//! number of concurrent queries.

use std::collections::BTreeMap;

use chrono::NaiveDate;
use tracing::info;

use crate::domain::ServiceId;
use crate::graph::{
    BuildError, BuiltGraph, Graph, GraphBuilder, GraphConfig, Interchanges, ServiceSpan,
};
use crate::planner::{CalendarIndex, Reachability, RunningServices};
use crate::schedule::{Schedule, ScheduleFilter};
use crate::walkable::WalkableConnections;

#[derive(Debug)]
pub struct TransportNetwork {
    graph: Graph,
    interchanges: Interchanges,
    neighbours: WalkableConnections,
    service_spans: BTreeMap<ServiceId, ServiceSpan>,
    reachability: Reachability,
    calendars: CalendarIndex,
    config: GraphConfig,
}

impl TransportNetwork {
    /// Build from the whole schedule.
    pub fn build(schedule: &Schedule, config: GraphConfig) -> Result<Self, BuildError> {
        let built = GraphBuilder::new(schedule, &config).build()?;
        Ok(Self::from_built(built, schedule, config))
    }

    /// Build from the parts of the schedule `filter` includes.
    pub fn build_filtered<F: ScheduleFilter>(
        schedule: &Schedule,
        config: GraphConfig,
        filter: F,
    ) -> Result<Self, BuildError> {
        let built = GraphBuilder::new(schedule, &config)
            .with_filter(filter)
            .build()?;
        Ok(Self::from_built(built, schedule, config))
    }

    fn from_built(built: BuiltGraph, schedule: &Schedule, config: GraphConfig) -> Self {
        let BuiltGraph {
            graph,
            interchanges,
            neighbours,
            service_spans,
        } = built;
        let reachability = Reachability::compute(&graph, &interchanges, &neighbours, &config);
        let calendars = CalendarIndex::new(&schedule.calendars, &schedule.exceptions);

        info!(
            stations = graph.stations().count(),
            services = service_spans.len(),
            "network ready"
        );
        Self {
            graph,
            interchanges,
            neighbours,
            service_spans,
            reachability,
            calendars,
            config,
        }
    }

    pub fn graph(&self) -> &Graph {
        &self.graph
    }

    pub fn interchanges(&self) -> &Interchanges {
        &self.interchanges
    }

    pub fn neighbours(&self) -> &WalkableConnections {
        &self.neighbours
    }

    pub fn reachability(&self) -> &Reachability {
        &self.reachability
    }

    pub fn calendars(&self) -> &CalendarIndex {
        &self.calendars
    }

    pub fn config(&self) -> &GraphConfig {
        &self.config
    }

    /// Earliest and latest departure of every service in the graph.
    pub fn service_spans(&self) -> &BTreeMap<ServiceId, ServiceSpan> {
        &self.service_spans
    }

    /// Services with departures in the graph that run on `date`.
    pub fn running_services(&self, date: NaiveDate) -> RunningServices {
        self.calendars.running_on(date, &self.service_spans)
    }
}
