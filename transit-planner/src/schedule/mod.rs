//! In-memory schedule model.
//!
//! The schedule is the already-resolved timetable: stations and their
//! platforms, routes, trips with their ordered stop calls, and the raw
//! calendar data that says which days each service runs. Parsing timetable
//! feeds into this shape happens elsewhere; a JSON snapshot can be loaded
//! with [`Schedule::load`].

mod error;
mod filter;
mod types;

pub use error::ScheduleError;
pub use filter::{IncludeAll, ScheduleFilter, SubsetFilter};
pub use types::{
    CalendarException, ExceptionKind, Platform, Route, Schedule, ServiceCalendar, Station,
    StopCall, Trip,
};
