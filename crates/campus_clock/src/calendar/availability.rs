//! Point-in-time room availability.
//!
//! All instants are UTC; the engine's timezone is only used to decide what
//! "the same day" and "this week" mean.

use super::index::ResourceIndex;
use super::types::Occurrence;
use crate::config::RoomLinks;
use chrono::{DateTime, Datelike, Days, NaiveDate, NaiveTime, TimeDelta, TimeZone, Utc};
use chrono_tz::Tz;
use serde::Serialize;

/// How long a free room stays free.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", content = "at", rename_all = "snake_case")]
pub enum FreeUntil {
    /// Free until the next booking, later the same day
    Until(DateTime<Utc>),
    /// No further booking before the end of the day
    RestOfDay,
}

/// A room that is free at the query instant.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AvailableRoom {
    pub resource_id: String,
    pub floor_label: String,
    pub next_occurrence: Option<Occurrence>,
    pub free_until: FreeUntil,
    pub link: Option<String>,
}

/// Occurrences of one room over an ISO week.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct WeekView {
    pub monday: NaiveDate,
    /// Monday first, Sunday last
    pub days: [Vec<Occurrence>; 7],
}

/// Answers occupancy queries over a built index.
#[derive(Debug, Clone)]
pub struct AvailabilityEngine {
    index: ResourceIndex,
    links: RoomLinks,
    tz: Tz,
}

impl AvailabilityEngine {
    pub fn new(index: ResourceIndex, links: RoomLinks, tz: Tz) -> Self {
        Self { index, links, tz }
    }

    pub fn index(&self) -> &ResourceIndex {
        &self.index
    }

    pub fn tz(&self) -> Tz {
        self.tz
    }

    pub fn link_for(&self, resource_id: &str) -> Option<String> {
        self.links.link_for(resource_id)
    }

    /// True iff some occurrence of the room satisfies `start <= instant < end`.
    pub fn is_occupied(&self, resource_id: &str, instant: DateTime<Utc>) -> bool {
        self.index
            .occurrences(resource_id)
            .iter()
            .any(|o| o.contains(instant))
    }

    /// Earliest occurrence with `instant < start <= horizon_end`.
    pub fn next_occurrence_within_horizon(
        &self,
        resource_id: &str,
        instant: DateTime<Utc>,
        horizon_end: DateTime<Utc>,
    ) -> Option<&Occurrence> {
        self.index
            .occurrences(resource_id)
            .iter()
            .find(|o| o.start > instant && o.start <= horizon_end)
    }

    /// Last millisecond of the local day containing `instant`.
    pub fn end_of_local_day(&self, instant: DateTime<Utc>) -> DateTime<Utc> {
        let date = instant.with_timezone(&self.tz).date_naive();
        match date.checked_add_days(Days::new(1)) {
            Some(next) => self.local_midnight(next) - TimeDelta::milliseconds(1),
            None => DateTime::<Utc>::MAX_UTC,
        }
    }

    /// Rooms from `resource_ids` that are free at `instant`, in input order.
    pub fn list_available(
        &self,
        resource_ids: &[String],
        instant: DateTime<Utc>,
    ) -> Vec<AvailableRoom> {
        let horizon = self.end_of_local_day(instant);

        resource_ids
            .iter()
            .filter(|id| !self.is_occupied(id, instant))
            .map(|id| {
                let next_occurrence = self
                    .next_occurrence_within_horizon(id, instant, horizon)
                    .cloned();
                let free_until = match &next_occurrence {
                    Some(o) => FreeUntil::Until(o.start),
                    None => FreeUntil::RestOfDay,
                };
                AvailableRoom {
                    resource_id: id.clone(),
                    floor_label: self.index.floor_label(id),
                    next_occurrence,
                    free_until,
                    link: self.links.link_for(id),
                }
            })
            .collect()
    }

    /// Every indexed room that is free at `instant`, sorted by id.
    pub fn list_available_now(&self, instant: DateTime<Utc>) -> Vec<AvailableRoom> {
        self.list_available(&self.index.resource_ids(), instant)
    }

    /// Occurrences starting on the given local date, ascending.
    pub fn occurrences_on_date(&self, resource_id: &str, date: NaiveDate) -> Vec<Occurrence> {
        let Some(next) = date.checked_add_days(Days::new(1)) else {
            return Vec::new();
        };
        let (from, to) = (self.local_midnight(date), self.local_midnight(next));

        self.index
            .occurrences(resource_id)
            .iter()
            .filter(|o| o.start >= from && o.start < to)
            .cloned()
            .collect()
    }

    /// Occurrences of the ISO week containing `date`, split per day.
    pub fn occurrences_in_week(&self, resource_id: &str, date: NaiveDate) -> WeekView {
        let monday = week_monday(date);
        let days = std::array::from_fn(|offset| {
            monday
                .checked_add_days(Days::new(offset as u64))
                .map(|day| self.occurrences_on_date(resource_id, day))
                .unwrap_or_default()
        });
        WeekView { monday, days }
    }

    /// First instant of a local date. When midnight falls in a DST gap, the
    /// first valid local time after it is used.
    fn local_midnight(&self, date: NaiveDate) -> DateTime<Utc> {
        let mut naive = date.and_time(NaiveTime::MIN);
        for _ in 0..4 {
            if let Some(local) = self.tz.from_local_datetime(&naive).earliest() {
                return local.with_timezone(&Utc);
            }
            naive += TimeDelta::minutes(30);
        }
        naive.and_utc()
    }
}

/// Monday of the ISO week containing `date`. Sunday belongs to the week that
/// started six days before.
pub fn week_monday(date: NaiveDate) -> NaiveDate {
    let back = date.weekday().number_from_monday() - 1;
    date.checked_sub_days(Days::new(u64::from(back))).unwrap_or(date)
}
