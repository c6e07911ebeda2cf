//! Multi-modal transit journey planner.
//!
//! Builds a time-expanded graph from a resolved timetable and searches it
//! for itineraries between stations or locations on a given date.

pub mod domain;
pub mod graph;
pub mod network;
pub mod planner;
pub mod schedule;
pub mod walkable;

#[cfg(test)]
mod testing;
