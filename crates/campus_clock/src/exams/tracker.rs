//! Exam ingestion and queries.
//!
//! Ingestion derives the date/time validity flags once; every query after
//! that is a pure function over the ingested records.

use super::types::*;
use chrono::{
    DateTime, Datelike, Days, NaiveDate, NaiveDateTime, NaiveTime, TimeDelta, TimeZone, Utc,
};
use chrono_tz::Tz;
use regex::Regex;
use serde::Serialize;
use std::collections::{BTreeMap, BTreeSet, HashMap};
use std::sync::LazyLock;
use tracing::{info, warn};

static TIME_REGEX: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"^(\d{2}):(\d{2})$").unwrap());
static RANGE_REGEX: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)^(?:entre|between)\s+(\d{1,2}):(\d{2})\s+(?:et|and)\s+(\d{1,2}):(\d{2})$")
        .unwrap()
});

/// Parses a `YYYY-MM-DD` exam date; sentinels and anything else yield `None`.
pub fn parse_exam_date(raw: Option<&str>) -> Option<NaiveDate> {
    if is_unknown(raw) {
        return None;
    }
    NaiveDate::parse_from_str(raw?.trim(), "%Y-%m-%d").ok()
}

/// Parses an exam time.
///
/// Accepts exactly `HH:MM`, or a range such as `entre 08:00 et 13:00` in
/// which case the first time is used.
pub fn parse_exam_time(raw: Option<&str>) -> Option<NaiveTime> {
    if is_unknown(raw) {
        return None;
    }
    let raw = raw?.trim();
    let caps = TIME_REGEX
        .captures(raw)
        .or_else(|| RANGE_REGEX.captures(raw))?;
    let hours = caps.get(1)?.as_str().parse().ok()?;
    let minutes = caps.get(2)?.as_str().parse().ok()?;
    NaiveTime::from_hms_opt(hours, minutes, 0)
}

/// Resolves a local wall-clock time to an instant. Times falling in a DST
/// gap are moved forward by an hour.
pub fn local_to_utc(date: NaiveDate, time: NaiveTime, tz: Tz) -> Option<DateTime<Utc>> {
    let naive = NaiveDateTime::new(date, time);
    tz.from_local_datetime(&naive)
        .earliest()
        .or_else(|| tz.from_local_datetime(&(naive + TimeDelta::hours(1))).earliest())
        .map(|dt| dt.with_timezone(&Utc))
}

/// Exams of one local month.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MonthGroup {
    /// "YYYY-MM"
    pub key: String,
    pub exams: Vec<ExamRecord>,
}

/// Month groups on either side of the current month.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct MonthSplit {
    /// Current month and later, ascending
    pub future: Vec<MonthGroup>,
    /// Earlier months, ascending
    pub past: Vec<MonthGroup>,
}

/// Exam list as shown to users: dated exams by month plus undated ones.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ExamListing {
    pub months: MonthSplit,
    pub pending: Vec<ExamRecord>,
}

/// One cell of a month calendar.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CalendarDay {
    pub date: NaiveDate,
    pub in_month: bool,
    pub is_today: bool,
    pub exams: Vec<ExamRecord>,
}

/// Number of cells in a month grid (six weeks).
pub const MONTH_GRID_DAYS: usize = 42;

/// Exams whose datetime is strictly after `now`, ascending. Ties keep input
/// order.
pub fn upcoming(exams: &[ExamRecord], now: DateTime<Utc>) -> Vec<ExamRecord> {
    let mut upcoming: Vec<ExamRecord> = exams
        .iter()
        .filter(|e| e.datetime.is_some_and(|dt| dt > now))
        .cloned()
        .collect();
    upcoming.sort_by_key(|e| e.datetime);
    upcoming
}

/// The first upcoming exam, if any.
pub fn next(exams: &[ExamRecord], now: DateTime<Utc>) -> Option<ExamRecord> {
    upcoming(exams, now).into_iter().next()
}

/// Keeps exams of one UE. `None` or an empty id keeps everything.
pub fn filter_by_category(exams: &[ExamRecord], category: Option<&str>) -> Vec<ExamRecord> {
    match category {
        None | Some("") => exams.to_vec(),
        Some(ue_id) => exams.iter().filter(|e| e.ue_id == ue_id).cloned().collect(),
    }
}

/// Groups dated exams by local "YYYY-MM", each group sorted by datetime.
/// Exams without a datetime are left out.
pub fn group_by_month(exams: &[ExamRecord], tz: Tz) -> BTreeMap<String, Vec<ExamRecord>> {
    let mut grouped: BTreeMap<String, Vec<ExamRecord>> = BTreeMap::new();
    for exam in exams {
        if let Some(dt) = exam.datetime {
            let local = dt.with_timezone(&tz);
            let key = format!("{:04}-{:02}", local.year(), local.month());
            grouped.entry(key).or_default().push(exam.clone());
        }
    }
    for group in grouped.values_mut() {
        group.sort_by_key(|e| e.datetime);
    }
    grouped
}

/// Splits month groups around the local month containing `now`.
pub fn split_months(
    groups: BTreeMap<String, Vec<ExamRecord>>,
    now: DateTime<Utc>,
    tz: Tz,
) -> MonthSplit {
    let local_now = now.with_timezone(&tz);
    let current_key = format!("{:04}-{:02}", local_now.year(), local_now.month());

    let mut split = MonthSplit::default();
    for (key, exams) in groups {
        // Zero-padded keys compare like the months they name
        let group = MonthGroup { key, exams };
        if group.key >= current_key {
            split.future.push(group);
        } else {
            split.past.push(group);
        }
    }
    split
}

/// Owns the ingested exam records and the UE catalog.
#[derive(Debug, Clone)]
pub struct ExamTracker {
    exams: Vec<ExamRecord>,
    valid_exams: Vec<ExamRecord>,
    pending_exams: Vec<ExamRecord>,
    ues: HashMap<String, UeInfo>,
    last_updated: Option<String>,
    report: IngestReport,
    tz: Tz,
}

impl ExamTracker {
    /// Ingests a decoded exam feed.
    ///
    /// Records that don't have the expected shape are skipped with a
    /// warning. Duplicate ids are all kept.
    pub fn ingest(feed: ExamFeed, tz: Tz) -> Self {
        let mut report = IngestReport {
            records_seen: feed.examens.len(),
            ..IngestReport::default()
        };

        let mut exams = Vec::with_capacity(feed.examens.len());
        for (position, value) in feed.examens.into_iter().enumerate() {
            match serde_json::from_value::<RawExam>(value) {
                Ok(raw) => exams.push(enrich(raw, &feed.ues, tz)),
                Err(e) => {
                    report.records_skipped += 1;
                    warn!(position, error = %e, "Skipping malformed exam record");
                }
            }
        }

        let (valid_exams, pending_exams): (Vec<_>, Vec<_>) =
            exams.iter().cloned().partition(|e| e.has_valid_date);

        report.valid = valid_exams.len();
        report.pending = pending_exams.len();
        report.with_datetime = exams.iter().filter(|e| e.datetime.is_some()).count();

        info!(
            records = report.records_seen,
            skipped = report.records_skipped,
            valid = report.valid,
            pending = report.pending,
            with_datetime = report.with_datetime,
            ues = feed.ues.len(),
            "Exam feed ingested"
        );

        Self {
            exams,
            valid_exams,
            pending_exams,
            ues: feed.ues,
            last_updated: feed.last_updated,
            report,
            tz,
        }
    }

    pub fn exams(&self) -> &[ExamRecord] {
        &self.exams
    }

    /// Exams with a valid date (the time may still be unknown).
    pub fn valid_exams(&self) -> &[ExamRecord] {
        &self.valid_exams
    }

    /// Exams without a valid date.
    pub fn pending_exams(&self) -> &[ExamRecord] {
        &self.pending_exams
    }

    pub fn report(&self) -> &IngestReport {
        &self.report
    }

    pub fn last_updated(&self) -> Option<&str> {
        self.last_updated.as_deref()
    }

    pub fn tz(&self) -> Tz {
        self.tz
    }

    pub fn ue(&self, ue_id: &str) -> Option<&UeInfo> {
        self.ues.get(ue_id)
    }

    /// First record with the given id.
    pub fn find(&self, id: i64) -> Option<&ExamRecord> {
        self.exams.iter().find(|e| e.id == id)
    }

    pub fn upcoming(&self, now: DateTime<Utc>) -> Vec<ExamRecord> {
        upcoming(&self.valid_exams, now)
    }

    pub fn next(&self, now: DateTime<Utc>) -> Option<ExamRecord> {
        next(&self.valid_exams, now)
    }

    /// Dated exams split by month around `now`, plus the pending ones, both
    /// restricted to a UE when `category` is given.
    pub fn listing(&self, now: DateTime<Utc>, category: Option<&str>) -> ExamListing {
        let dated = filter_by_category(&self.valid_exams, category);
        ExamListing {
            months: split_months(group_by_month(&dated, self.tz), now, self.tz),
            pending: filter_by_category(&self.pending_exams, category),
        }
    }

    /// Valid exams scheduled on a date.
    pub fn exams_on_date(&self, date: NaiveDate, category: Option<&str>) -> Vec<ExamRecord> {
        let on_date: Vec<ExamRecord> = self
            .valid_exams
            .iter()
            .filter(|e| e.date == Some(date))
            .cloned()
            .collect();
        filter_by_category(&on_date, category)
    }

    /// Six-week grid for a month, starting on the Sunday on or before the
    /// first. Invalid months yield an empty grid.
    pub fn month_grid(
        &self,
        year: i32,
        month: u32,
        today: NaiveDate,
        category: Option<&str>,
    ) -> Vec<CalendarDay> {
        let Some(first) = NaiveDate::from_ymd_opt(year, month, 1) else {
            return Vec::new();
        };
        let lead = u64::from(first.weekday().num_days_from_sunday());
        let Some(start) = first.checked_sub_days(Days::new(lead)) else {
            return Vec::new();
        };

        start
            .iter_days()
            .take(MONTH_GRID_DAYS)
            .map(|date| CalendarDay {
                date,
                in_month: date.month() == month && date.year() == year,
                is_today: date == today,
                exams: self.exams_on_date(date, category),
            })
            .collect()
    }

    /// Distinct UE ids present in the exam records, sorted.
    pub fn ue_ids(&self) -> Vec<String> {
        self.exams
            .iter()
            .map(|e| e.ue_id.clone())
            .collect::<BTreeSet<_>>()
            .into_iter()
            .collect()
    }

    /// Catalog entries that carry a course link, sorted by UE id.
    pub fn ues_with_links(&self) -> Vec<(String, UeInfo)> {
        let mut linked: Vec<(String, UeInfo)> = self
            .ues
            .iter()
            .filter(|(_, ue)| ue.link.as_deref().is_some_and(|l| !l.is_empty()))
            .map(|(id, ue)| (id.clone(), ue.clone()))
            .collect();
        linked.sort_by(|a, b| a.0.cmp(&b.0));
        linked
    }
}

/// Joins a raw record with its UE and derives the date fields.
fn enrich(raw: RawExam, ues: &HashMap<String, UeInfo>, tz: Tz) -> ExamRecord {
    let ue_id = raw.ue_id.unwrap_or_default();
    let ue = ues.get(&ue_id);
    let or_id = |value: Option<&String>| {
        value
            .filter(|v| !v.is_empty())
            .cloned()
            .unwrap_or_else(|| ue_id.clone())
    };
    let ue_full_name = or_id(ue.map(|u| &u.full_name));
    let ue_code = or_id(ue.map(|u| &u.code));
    let ue_name = or_id(ue.map(|u| &u.name));

    let date = parse_exam_date(raw.date.as_deref());
    let time = parse_exam_time(raw.time.as_deref());
    let datetime = match (date, time) {
        (Some(date), Some(time)) => local_to_utc(date, time, tz),
        _ => None,
    };

    ExamRecord {
        id: raw.id,
        ue_full_name,
        ue_code,
        ue_name,
        ue_id,
        name: known(raw.name),
        exam_type: known(raw.exam_type),
        location: known(raw.location),
        duration: known(raw.duration),
        coefficient: known(raw.coefficient),
        documents: known(raw.documents),
        description: known(raw.description),
        status: known(raw.status),
        raw_date: raw.date,
        raw_time: raw.time,
        date,
        has_valid_date: date.is_some(),
        has_valid_time: time.is_some() && (date.is_none() || datetime.is_some()),
        datetime,
    }
}

fn known(value: Option<String>) -> Option<String> {
    value.filter(|v| !is_unknown(Some(v.as_str())))
}
