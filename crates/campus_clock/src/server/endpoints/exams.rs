//! Exam tracker endpoints.

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use chrono::Utc;
use serde::{Deserialize, Serialize};
use serde_json::json;
use std::sync::Arc;
use tracing::info;

use super::feed_unavailable;
use crate::countdown::{self, CountdownDisplay, Proximity};
use crate::dashboard::ExamCountdown;
use crate::exams::{ExamRecord, UeInfo};
use crate::server::types::ApiErrorType;
use crate::types::AppState;

#[derive(Debug, Deserialize)]
pub struct CategoryParams {
    /// Restrict to one UE id
    pub ue: Option<String>,
}

/// One exam with its display fields.
#[derive(Debug, Serialize)]
struct ExamDetail {
    #[serde(flatten)]
    exam: ExamRecord,
    display_name: String,
    duration_label: String,
    countdown: Option<CountdownDisplay>,
    proximity: Option<Proximity>,
}

impl ExamDetail {
    fn new(exam: ExamRecord) -> Self {
        let now = Utc::now();
        let (countdown, proximity) = match exam.datetime {
            Some(target) => (
                Some(countdown::format_countdown(&countdown::time_remaining(target, now))),
                countdown::proximity(target, now),
            ),
            None => (None, None),
        };
        Self {
            display_name: exam.display_name().to_string(),
            duration_label: countdown::exam_duration_label(exam.duration.as_deref()),
            countdown,
            proximity,
            exam,
        }
    }
}

#[derive(Debug, Serialize)]
struct LinkedUe {
    id: String,
    #[serde(flatten)]
    ue: UeInfo,
}

/// GET /exams
///
/// Dated exams grouped by month and split around now, plus pending ones.
pub async fn get_exams(
    State(s): State<Arc<AppState>>,
    Query(params): Query<CategoryParams>,
) -> Response {
    info!("GET /exams (ue={:?})", params.ue);

    match s.exams().await {
        Ok(tracker) => (
            StatusCode::OK,
            Json(tracker.listing(Utc::now(), params.ue.as_deref())),
        )
            .into_response(),
        Err(e) => feed_unavailable("exams", &e),
    }
}

/// GET /exams/next
///
/// The next exam with its countdown, or `null` when none is upcoming.
pub async fn get_next_exam(State(s): State<Arc<AppState>>) -> Response {
    info!("GET /exams/next");

    match s.exams().await {
        Ok(tracker) => {
            let now = Utc::now();
            let next = tracker
                .next(now)
                .and_then(|exam| ExamCountdown::new(exam, now));
            (StatusCode::OK, Json(next)).into_response()
        }
        Err(e) => feed_unavailable("exams", &e),
    }
}

/// GET /exams/:id
pub async fn get_exam(Path(id): Path<i64>, State(s): State<Arc<AppState>>) -> Response {
    info!("GET /exams/{}", id);

    let tracker = match s.exams().await {
        Ok(tracker) => tracker,
        Err(e) => return feed_unavailable("exams", &e),
    };
    match tracker.find(id) {
        Some(exam) => (StatusCode::OK, Json(ExamDetail::new(exam.clone()))).into_response(),
        None => ApiErrorType::from((
            StatusCode::NOT_FOUND,
            "Exam not found",
            Some(format!("No exam with id {id}")),
        ))
        .into_response(),
    }
}

/// GET /exams/calendar/:year/:month
///
/// Six-week grid for the month, Sunday first. A month outside 1..=12 gives an
/// empty grid.
pub async fn get_exam_calendar(
    Path((year, month)): Path<(i32, u32)>,
    State(s): State<Arc<AppState>>,
    Query(params): Query<CategoryParams>,
) -> Response {
    info!("GET /exams/calendar/{}/{} (ue={:?})", year, month, params.ue);

    match s.exams().await {
        Ok(tracker) => {
            let today = Utc::now().with_timezone(&s.tz).date_naive();
            let grid = tracker.month_grid(year, month, today, params.ue.as_deref());
            (StatusCode::OK, Json(grid)).into_response()
        }
        Err(e) => feed_unavailable("exams", &e),
    }
}

/// GET /ues
///
/// UE ids found in the exam records and the catalog entries with a link.
pub async fn get_ues(State(s): State<Arc<AppState>>) -> Response {
    info!("GET /ues");

    match s.exams().await {
        Ok(tracker) => {
            let linked: Vec<LinkedUe> = tracker
                .ues_with_links()
                .into_iter()
                .map(|(id, ue)| LinkedUe { id, ue })
                .collect();
            (
                StatusCode::OK,
                Json(json!({
                    "last_updated": tracker.last_updated(),
                    "ue_ids": tracker.ue_ids(),
                    "linked": linked,
                })),
            )
                .into_response()
        }
        Err(e) => feed_unavailable("exams", &e),
    }
}
