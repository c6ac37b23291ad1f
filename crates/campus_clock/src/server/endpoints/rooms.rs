//! Room availability endpoints.

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::info;

use super::{date_param, feed_unavailable, instant_param};
use crate::calendar::{Occurrence, RoomKind};
use crate::countdown::slot_duration_label;
use crate::types::AppState;

#[derive(Debug, Deserialize)]
pub struct AtParams {
    /// RFC 3339 instant, now when absent
    pub at: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct DateParams {
    /// `YYYY-MM-DD`, today when absent
    pub date: Option<String>,
}

#[derive(Debug, Serialize)]
struct RoomSummary {
    resource_id: String,
    floor_label: String,
    kind: RoomKind,
    kind_label: &'static str,
    occurrences: usize,
    link: Option<String>,
}

#[derive(Debug, Serialize)]
struct Slot {
    #[serde(flatten)]
    occurrence: Occurrence,
    duration_label: String,
}

impl From<Occurrence> for Slot {
    fn from(occurrence: Occurrence) -> Self {
        Self {
            duration_label: slot_duration_label(occurrence.duration_minutes()),
            occurrence,
        }
    }
}

/// GET /rooms
///
/// Every tracked room with its floor and booking count, sorted by id.
pub async fn get_rooms(State(s): State<Arc<AppState>>) -> Response {
    info!("GET /rooms");

    let loaded = match s.rooms().await {
        Ok(loaded) => loaded,
        Err(e) => return feed_unavailable("calendar", &e),
    };
    let index = loaded.engine.index();

    let rooms: Vec<RoomSummary> = index
        .resource_ids()
        .into_iter()
        .map(|id| {
            let kind = RoomKind::classify(&id);
            RoomSummary {
                floor_label: index.floor_label(&id),
                kind,
                kind_label: kind.label(),
                occurrences: index.occurrences(&id).len(),
                link: loaded.engine.link_for(&id),
                resource_id: id,
            }
        })
        .collect();

    (StatusCode::OK, Json(rooms)).into_response()
}

/// GET /rooms/available
///
/// Rooms free at `at`, with how long they stay free.
pub async fn get_available(
    State(s): State<Arc<AppState>>,
    Query(params): Query<AtParams>,
) -> Response {
    info!("GET /rooms/available (at={:?})", params.at);

    let at = match instant_param(params.at.as_deref()) {
        Ok(at) => at,
        Err(response) => return response,
    };
    match s.rooms().await {
        Ok(loaded) => (StatusCode::OK, Json(loaded.engine.list_available_now(at))).into_response(),
        Err(e) => feed_unavailable("calendar", &e),
    }
}

/// GET /rooms/:room/day
///
/// Bookings of one room starting on a local date. Unknown rooms give an
/// empty list.
pub async fn get_room_day(
    Path(room): Path<String>,
    State(s): State<Arc<AppState>>,
    Query(params): Query<DateParams>,
) -> Response {
    info!("GET /rooms/{}/day (date={:?})", room, params.date);

    let date = match date_param(params.date.as_deref(), s.tz) {
        Ok(date) => date,
        Err(response) => return response,
    };
    match s.rooms().await {
        Ok(loaded) => {
            let slots: Vec<Slot> = loaded
                .engine
                .occurrences_on_date(&room, date)
                .into_iter()
                .map(Slot::from)
                .collect();
            (StatusCode::OK, Json(slots)).into_response()
        }
        Err(e) => feed_unavailable("calendar", &e),
    }
}

/// GET /rooms/:room/week
///
/// Bookings of one room over the Monday-to-Sunday week containing `date`.
pub async fn get_room_week(
    Path(room): Path<String>,
    State(s): State<Arc<AppState>>,
    Query(params): Query<DateParams>,
) -> Response {
    info!("GET /rooms/{}/week (date={:?})", room, params.date);

    let date = match date_param(params.date.as_deref(), s.tz) {
        Ok(date) => date,
        Err(response) => return response,
    };
    match s.rooms().await {
        Ok(loaded) => {
            (StatusCode::OK, Json(loaded.engine.occurrences_in_week(&room, date))).into_response()
        }
        Err(e) => feed_unavailable("calendar", &e),
    }
}

#[cfg(test)]
mod tests {
    use super::super::test_support::{state, unloaded_state};
    use super::*;
    use serde_json::Value;

    async fn body(response: Response) -> Value {
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        serde_json::from_slice(&bytes).unwrap()
    }

    #[tokio::test]
    async fn test_get_rooms() {
        let response = get_rooms(State(state())).await;
        assert_eq!(response.status(), StatusCode::OK);
        let rooms = body(response).await;
        assert_eq!(rooms[0]["resource_id"], "C002");
        assert_eq!(rooms[0]["floor_label"], "RDC");
        assert_eq!(rooms[1]["resource_id"], "TD005");
        assert_eq!(rooms[1]["kind"], "Td");
    }

    #[tokio::test]
    async fn test_get_available_at_instant() {
        let response = get_available(
            State(state()),
            Query(AtParams {
                at: Some("2025-10-22T09:00:00Z".to_string()),
            }),
        )
        .await;
        assert_eq!(response.status(), StatusCode::OK);
        let rooms = body(response).await;
        assert_eq!(rooms.as_array().unwrap().len(), 1);
        assert_eq!(rooms[0]["resource_id"], "TD005");
        assert_eq!(rooms[0]["free_until"]["kind"], "rest_of_day");
    }

    #[tokio::test]
    async fn test_get_available_bad_instant() {
        let response = get_available(
            State(state()),
            Query(AtParams {
                at: Some("midi".to_string()),
            }),
        )
        .await;
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_get_room_day() {
        let response = get_room_day(
            Path("C002".to_string()),
            State(state()),
            Query(DateParams {
                date: Some("2025-10-22".to_string()),
            }),
        )
        .await;
        let slots = body(response).await;
        assert_eq!(slots.as_array().unwrap().len(), 1);
        assert_eq!(slots[0]["title"], "Réseaux");
        assert_eq!(slots[0]["duration_label"], "2h");
    }

    #[tokio::test]
    async fn test_unknown_room_is_empty() {
        let response = get_room_day(
            Path("TP999".to_string()),
            State(state()),
            Query(DateParams {
                date: Some("2025-10-22".to_string()),
            }),
        )
        .await;
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(body(response).await, serde_json::json!([]));
    }

    #[tokio::test]
    async fn test_get_room_week() {
        let response = get_room_week(
            Path("TD005".to_string()),
            State(state()),
            Query(DateParams {
                date: Some("2025-10-26".to_string()),
            }),
        )
        .await;
        let week = body(response).await;
        assert_eq!(week["monday"], "2025-10-20");
        assert_eq!(week["days"][3][0]["resource_id"], "TD005");
    }

    #[tokio::test]
    async fn test_unloaded_calendar_is_unavailable() {
        let response = get_rooms(State(unloaded_state())).await;
        assert_eq!(response.status(), StatusCode::SERVICE_UNAVAILABLE);
        assert_eq!(body(response).await["message"], "Feed not loaded");
    }
}
