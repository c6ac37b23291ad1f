use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
};
use chrono::{DateTime, NaiveDate, Utc};
use chrono_tz::Tz;
use tracing::warn;

use crate::error::FeedError;
use crate::server::types::ApiErrorType;

pub mod exams;
pub mod rooms;
pub mod status;

/// 503 for a tracker whose feed failed to load.
fn feed_unavailable(tracker: &str, error: &FeedError) -> Response {
    warn!(tracker = tracker, error = %error, "Query against unloaded tracker");
    ApiErrorType::from((
        StatusCode::SERVICE_UNAVAILABLE,
        "Feed not loaded",
        Some(error.to_string()),
    ))
    .into_response()
}

fn bad_request(message: &str, details: String) -> Response {
    ApiErrorType::from((StatusCode::BAD_REQUEST, message, Some(details))).into_response()
}

/// Parses an optional `YYYY-MM-DD` parameter, defaulting to today in `tz`.
fn date_param(raw: Option<&str>, tz: Tz) -> Result<NaiveDate, Response> {
    match raw {
        None => Ok(Utc::now().with_timezone(&tz).date_naive()),
        Some(raw) => NaiveDate::parse_from_str(raw, "%Y-%m-%d")
            .map_err(|e| bad_request("Invalid date, expected YYYY-MM-DD", e.to_string())),
    }
}

/// Parses an optional RFC 3339 instant, defaulting to now.
fn instant_param(raw: Option<&str>) -> Result<DateTime<Utc>, Response> {
    match raw {
        None => Ok(Utc::now()),
        Some(raw) => DateTime::parse_from_rfc3339(raw)
            .map(|dt| dt.with_timezone(&Utc))
            .map_err(|e| bad_request("Invalid instant, expected RFC 3339", e.to_string())),
    }
}


#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_date_param() {
        let tz = chrono_tz::Europe::Paris;
        assert_eq!(
            date_param(Some("2025-10-22"), tz).unwrap(),
            NaiveDate::from_ymd_opt(2025, 10, 22).unwrap()
        );
        let err = date_param(Some("22/10/2025"), tz).unwrap_err();
        assert_eq!(err.status(), StatusCode::BAD_REQUEST);
    }

    #[test]
    fn test_instant_param() {
        let at = instant_param(Some("2025-10-22T10:00:00+02:00")).unwrap();
        assert_eq!(at.to_rfc3339(), "2025-10-22T08:00:00+00:00");
        assert!(instant_param(Some("tomorrow")).is_err());
    }
}
