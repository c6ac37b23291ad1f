//! Countdown arithmetic and display helpers.
//!
//! Everything here is pure; callers pass `now` explicitly.

use chrono::{DateTime, Utc};
use serde::Serialize;

const MS_PER_SECOND: i64 = 1_000;
const MS_PER_MINUTE: i64 = 60 * MS_PER_SECOND;
const MS_PER_HOUR: i64 = 60 * MS_PER_MINUTE;
const MS_PER_DAY: i64 = 24 * MS_PER_HOUR;

/// Time left until a target instant.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct TimeRemaining {
    pub finished: bool,
    pub days: i64,
    /// 0..=23
    pub hours: i64,
    /// 0..=59
    pub minutes: i64,
    /// 0..=59
    pub seconds: i64,
    pub total_ms: i64,
}

/// Floor-based breakdown of `target - now`. Finished when the difference is
/// zero or negative.
pub fn time_remaining(target: DateTime<Utc>, now: DateTime<Utc>) -> TimeRemaining {
    let total_ms = (target - now).num_milliseconds();
    if total_ms <= 0 {
        return TimeRemaining {
            finished: true,
            ..TimeRemaining::default()
        };
    }

    TimeRemaining {
        finished: false,
        days: total_ms / MS_PER_DAY,
        hours: (total_ms % MS_PER_DAY) / MS_PER_HOUR,
        minutes: (total_ms % MS_PER_HOUR) / MS_PER_MINUTE,
        seconds: (total_ms % MS_PER_MINUTE) / MS_PER_SECOND,
        total_ms,
    }
}

/// How close a countdown is to expiring.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Urgency {
    /// Same day, under two hours
    Critical,
    /// Same day
    Urgent,
    /// One day left
    Warning,
    Normal,
}

impl Urgency {
    pub fn of(remaining: &TimeRemaining) -> Option<Self> {
        if remaining.finished {
            None
        } else if remaining.days == 0 && remaining.hours < 2 {
            Some(Urgency::Critical)
        } else if remaining.days == 0 {
            Some(Urgency::Urgent)
        } else if remaining.days <= 1 {
            Some(Urgency::Warning)
        } else {
            Some(Urgency::Normal)
        }
    }
}

/// Countdown ready for display.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CountdownDisplay {
    pub finished: bool,
    pub days: i64,
    pub hours: i64,
    pub minutes: i64,
    pub seconds: i64,
    pub urgency: Option<Urgency>,
    /// Short form, e.g. "2j 4h 10m"
    pub compact: String,
}

pub fn format_countdown(remaining: &TimeRemaining) -> CountdownDisplay {
    CountdownDisplay {
        finished: remaining.finished,
        days: remaining.days,
        hours: remaining.hours,
        minutes: remaining.minutes,
        seconds: remaining.seconds,
        urgency: Urgency::of(remaining),
        compact: compact(remaining),
    }
}

/// Short countdown text: the two or three most significant units.
pub fn compact(remaining: &TimeRemaining) -> String {
    if remaining.finished {
        "Terminé".to_string()
    } else if remaining.days > 0 {
        format!("{}j {}h {}m", remaining.days, remaining.hours, remaining.minutes)
    } else if remaining.hours > 0 {
        format!("{}h {}m {}s", remaining.hours, remaining.minutes, remaining.seconds)
    } else {
        format!("{}m {}s", remaining.minutes, remaining.seconds)
    }
}

/// Badge for list items, based on whole days left rounded up.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Proximity {
    Urgent,
    Soon,
    Later,
}

pub fn proximity(target: DateTime<Utc>, now: DateTime<Utc>) -> Option<Proximity> {
    let total_ms = (target - now).num_milliseconds();
    if total_ms <= 0 {
        return None;
    }
    let days_left = (total_ms + MS_PER_DAY - 1) / MS_PER_DAY;
    Some(match days_left {
        i64::MIN..=1 => Proximity::Urgent,
        2..=3 => Proximity::Soon,
        _ => Proximity::Later,
    })
}

/// Human label for an exam duration field.
pub fn exam_duration_label(raw: Option<&str>) -> String {
    match raw.map(str::trim) {
        None | Some("") | Some("NAN") => "Non précisée".to_string(),
        Some(value) if value.contains("minute") => value.to_string(),
        Some(value) => format!("{value} minutes"),
    }
}

/// Human label for a booking length: "45min", "2h", "1h30".
pub fn slot_duration_label(minutes: i64) -> String {
    let (hours, mins) = (minutes / 60, minutes % 60);
    match (hours, mins) {
        (0, m) => format!("{m}min"),
        (h, 0) => format!("{h}h"),
        (h, m) => format!("{h}h{m:02}"),
    }
}
