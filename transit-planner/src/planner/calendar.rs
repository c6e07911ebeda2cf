//! Which calendar services run on a given date.
//!
//! A service runs on a date if its weekly pattern covers the date within the
//! validity range, unless an exception removes it. An "added" exception makes
//! it run regardless of the pattern.

use std::collections::{BTreeMap, BTreeSet};

use chrono::NaiveDate;

use crate::domain::{ServiceId, TransitTime};
use crate::graph::ServiceSpan;
use crate::schedule::{CalendarException, ExceptionKind, ServiceCalendar};

/// Calendar patterns and exceptions indexed by service.
#[derive(Debug, Clone, Default)]
pub struct CalendarIndex {
    patterns: BTreeMap<ServiceId, Vec<ServiceCalendar>>,
    exceptions: BTreeMap<ServiceId, BTreeMap<NaiveDate, ExceptionKind>>,
}

impl CalendarIndex {
    pub fn new(calendars: &[ServiceCalendar], exceptions: &[CalendarException]) -> Self {
        let mut index = Self::default();
        for calendar in calendars {
            index
                .patterns
                .entry(calendar.service.clone())
                .or_default()
                .push(calendar.clone());
        }
        // Later entries for the same date win
        for exception in exceptions {
            index
                .exceptions
                .entry(exception.service.clone())
                .or_default()
                .insert(exception.date, exception.kind);
        }
        index
    }

    /// True if `service` runs on `date`.
    pub fn runs_on(&self, service: &ServiceId, date: NaiveDate) -> bool {
        match self.exceptions.get(service).and_then(|e| e.get(&date)) {
            Some(ExceptionKind::Added) => true,
            Some(ExceptionKind::Removed) => false,
            None => self
                .patterns
                .get(service)
                .is_some_and(|p| p.iter().any(|c| c.pattern_matches(date))),
        }
    }

    /// Every known service running on `date`.
    pub fn services_on(&self, date: NaiveDate) -> BTreeSet<ServiceId> {
        self.patterns
            .keys()
            .chain(self.exceptions.keys())
            .filter(|s| self.runs_on(s, date))
            .cloned()
            .collect()
    }

    /// Services running on `date` that have departures in the graph, with
    /// their departure spans.
    pub fn running_on(
        &self,
        date: NaiveDate,
        spans: &BTreeMap<ServiceId, ServiceSpan>,
    ) -> RunningServices {
        let running = spans
            .iter()
            .filter(|(service, _)| self.runs_on(service, date))
            .map(|(service, span)| (service.clone(), *span))
            .collect();
        RunningServices { date, running }
    }
}

/// The services running on one travel date.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunningServices {
    date: NaiveDate,
    running: BTreeMap<ServiceId, ServiceSpan>,
}

impl RunningServices {
    pub fn date(&self) -> NaiveDate {
        self.date
    }

    pub fn is_running(&self, service: &ServiceId) -> bool {
        self.running.contains_key(service)
    }

    /// Earliest and latest departure of a running service.
    pub fn span(&self, service: &ServiceId) -> Option<ServiceSpan> {
        self.running.get(service).copied()
    }

    /// Earliest departure of any running service.
    pub fn first_departure(&self) -> Option<TransitTime> {
        self.running.values().map(|s| s.earliest).min()
    }

    pub fn services(&self) -> impl Iterator<Item = &ServiceId> {
        self.running.keys()
    }

    pub fn len(&self) -> usize {
        self.running.len()
    }

    pub fn is_empty(&self) -> bool {
        self.running.is_empty()
    }
}


#[cfg(test)]
mod proptests {
    use super::*;
    use chrono::{Datelike, Days, Weekday};
    use proptest::prelude::*;

    const DAYS: [Weekday; 7] = [
        Weekday::Mon,
        Weekday::Tue,
        Weekday::Wed,
        Weekday::Thu,
        Weekday::Fri,
        Weekday::Sat,
        Weekday::Sun,
    ];

    fn base() -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 1, 1).unwrap()
    }

    proptest! {
        #[test]
        fn pattern_resolution_matches_definition(
            start in 0u64..200,
            len in 0u64..200,
            mask in 0u8..128,
            offset in 0u64..450,
        ) {
            let days: Vec<_> = DAYS
                .iter()
                .enumerate()
                .filter(|(i, _)| mask & (1 << i) != 0)
                .map(|(_, d)| *d)
                .collect();
            let start = base() + Days::new(start);
            let end = start + Days::new(len);
            let service = ServiceId::parse("S").unwrap();
            let calendar = ServiceCalendar {
                service: service.clone(),
                start,
                end,
                days: days.clone(),
            };
            let index = CalendarIndex::new(&[calendar], &[]);

            let day = base() + Days::new(offset);
            let expected = day >= start && day <= end && days.contains(&day.weekday());
            prop_assert_eq!(index.runs_on(&service, day), expected);
        }

        #[test]
        fn exceptions_always_win(
            mask in 0u8..128,
            offset in 0u64..365,
            added in any::<bool>(),
        ) {
            let days: Vec<_> = DAYS
                .iter()
                .enumerate()
                .filter(|(i, _)| mask & (1 << i) != 0)
                .map(|(_, d)| *d)
                .collect();
            let service = ServiceId::parse("S").unwrap();
            let day = base() + Days::new(offset);
            let calendar = ServiceCalendar {
                service: service.clone(),
                start: base(),
                end: base() + Days::new(365),
                days,
            };
            let kind = if added { ExceptionKind::Added } else { ExceptionKind::Removed };
            let exception = CalendarException { service: service.clone(), date: day, kind };
            let index = CalendarIndex::new(&[calendar], &[exception]);

            prop_assert_eq!(index.runs_on(&service, day), added);
        }
    }
}
