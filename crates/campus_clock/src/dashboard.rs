//! Periodic dashboard snapshot.
//!
//! [`compute`] is a pure function of `now` and the current snapshots; the
//! timer that calls it lives in the binary.

use crate::calendar::{AvailabilityEngine, AvailableRoom};
use crate::countdown::{self, CountdownDisplay, Proximity};
use crate::exams::{ExamRecord, ExamTracker};
use chrono::{DateTime, Utc};
use serde::Serialize;

/// How many exams are listed after the next one.
pub const FOLLOWING_EXAMS: usize = 2;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ExamCountdown {
    pub exam: ExamRecord,
    pub countdown: CountdownDisplay,
    pub proximity: Option<Proximity>,
}

impl ExamCountdown {
    /// `None` for exams without a resolved datetime.
    pub fn new(exam: ExamRecord, now: DateTime<Utc>) -> Option<Self> {
        let target = exam.datetime?;
        Some(Self {
            countdown: countdown::format_countdown(&countdown::time_remaining(target, now)),
            proximity: countdown::proximity(target, now),
            exam,
        })
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DashboardSnapshot {
    pub generated_at: DateTime<Utc>,
    /// `None` when the exam feed isn't loaded
    pub next_exam: Option<ExamCountdown>,
    pub following_exams: Vec<ExamCountdown>,
    /// `None` when the calendar feed isn't loaded
    pub available_rooms: Option<Vec<AvailableRoom>>,
}

/// Recomputes the dashboard at `now`.
pub fn compute(
    now: DateTime<Utc>,
    exams: Option<&ExamTracker>,
    rooms: Option<&AvailabilityEngine>,
) -> DashboardSnapshot {
    let mut upcoming = exams
        .map(|tracker| tracker.upcoming(now))
        .unwrap_or_default()
        .into_iter()
        .take(1 + FOLLOWING_EXAMS)
        .filter_map(|exam| ExamCountdown::new(exam, now));

    let next_exam = upcoming.next();
    let following_exams = upcoming.collect();

    DashboardSnapshot {
        generated_at: now,
        next_exam,
        following_exams,
        available_rooms: rooms.map(|engine| engine.list_available_now(now)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::calendar;
    use crate::config::RoomLinks;
    use crate::countdown::Urgency;
    use crate::exams;
    use chrono::TimeZone;
    use chrono_tz::Europe::Paris;

    fn tracker() -> ExamTracker {
        exams::ingest_json(
            r#"{ "ues": {}, "examens": [
                { "id": 1, "ue_id": "A", "date": "2025-10-22", "time": "11:00" },
                { "id": 2, "ue_id": "B", "date": "2025-10-25", "time": "09:00" },
                { "id": 3, "ue_id": "C", "date": "2025-11-02", "time": "09:00" },
                { "id": 4, "ue_id": "D", "date": "2025-12-02", "time": "09:00" },
                { "id": 5, "ue_id": "E", "date": "TBA", "time": "TBA" }
            ] }"#,
            Paris,
        )
        .unwrap()
    }

    #[test]
    fn test_compute_next_and_following() {
        // 10:00 Paris
        let now = Utc.with_ymd_and_hms(2025, 10, 22, 8, 0, 0).unwrap();
        let snapshot = compute(now, Some(&tracker()), None);

        let next = snapshot.next_exam.unwrap();
        assert_eq!(next.exam.id, 1);
        assert_eq!(next.countdown.hours, 1);
        assert_eq!(next.countdown.urgency, Some(Urgency::Critical));
        assert_eq!(next.proximity, Some(Proximity::Urgent));

        let following: Vec<i64> = snapshot.following_exams.iter().map(|e| e.exam.id).collect();
        assert_eq!(following, vec![2, 3]);
        assert!(snapshot.available_rooms.is_none());
    }

    #[test]
    fn test_compute_without_feeds() {
        let now = Utc.with_ymd_and_hms(2025, 10, 22, 8, 0, 0).unwrap();
        let snapshot = compute(now, None, None);
        assert!(snapshot.next_exam.is_none());
        assert!(snapshot.following_exams.is_empty());
    }

    #[test]
    fn test_compute_is_repeatable() {
        let (engine, _) = calendar::build_engine(
            "BEGIN:VEVENT\nDTSTART:20251022T080000Z\nDTEND:20251022T100000Z\nLOCATION:Nautibus C002\nEND:VEVENT\n\
BEGIN:VEVENT\nDTSTART:20251022T120000Z\nDTEND:20251022T130000Z\nLOCATION:Nautibus TD005\nEND:VEVENT\n",
            "Nautibus",
            RoomLinks::default(),
            Paris,
        );
        let tracker = tracker();
        let now = Utc.with_ymd_and_hms(2025, 10, 22, 9, 0, 0).unwrap();

        let first = compute(now, Some(&tracker), Some(&engine));
        let second = compute(now, Some(&tracker), Some(&engine));
        assert_eq!(first, second);

        let rooms = first.available_rooms.unwrap();
        assert_eq!(rooms.len(), 1);
        assert_eq!(rooms[0].resource_id, "TD005");
    }
}
