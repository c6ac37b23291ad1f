use axum::{
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use chrono::Utc;
use serde_json::json;
use std::sync::Arc;
use tracing::info;

use crate::types::AppState;

/// GET /health
///
/// Always 200; reports which feeds are loaded.
pub async fn get_health(State(s): State<Arc<AppState>>) -> Response {
    let summary = s.summary().await;
    (
        StatusCode::OK,
        Json(json!({
            "status": "ok",
            "calendar_loaded": summary.calendar.is_ok(),
            "exams_loaded": summary.exams.is_ok(),
        })),
    )
        .into_response()
}

/// GET /dashboard
///
/// Latest dashboard snapshot. Computed on the spot if the periodic task
/// hasn't produced one since the last load.
pub async fn get_dashboard(State(s): State<Arc<AppState>>) -> Response {
    info!("GET /dashboard");

    let snapshot = match s.dashboard().await {
        Some(snapshot) => snapshot,
        None => s.refresh_dashboard(Utc::now()).await,
    };
    (StatusCode::OK, Json(snapshot)).into_response()
}

/// POST /reload
///
/// Fetches both feeds again and replaces the current state.
pub async fn post_reload(State(s): State<Arc<AppState>>) -> Response {
    info!("POST /reload");

    let summary = s.reload().await;
    (StatusCode::OK, Json(summary)).into_response()
}
