use std::sync::Arc;

use axum::routing::{get, post};
use axum::Router;

use crate::server::endpoints::{exams, rooms, status};
use crate::types::AppState;

mod endpoints;
mod types;

pub use types::ApiErrorType;

/// Creates a router that can be used by `axum`.
///
/// # Parameters
/// - `app_state`: The app server state.
///
/// # Returns
/// The router.
pub fn create_router(app_state: Arc<AppState>) -> Router {
    let rooms_router = Router::new()
        .route("/", get(rooms::get_rooms))
        .route("/available", get(rooms::get_available))
        .route("/:room/day", get(rooms::get_room_day))
        .route("/:room/week", get(rooms::get_room_week));

    // `/exams/next` and `/exams/calendar/...` are static segments, so they
    // take precedence over `/:id`
    let exams_router = Router::new()
        .route("/", get(exams::get_exams))
        .route("/next", get(exams::get_next_exam))
        .route("/calendar/:year/:month", get(exams::get_exam_calendar))
        .route("/:id", get(exams::get_exam));

    Router::new()
        .route("/health", get(status::get_health))
        .route("/dashboard", get(status::get_dashboard))
        .route("/reload", post(status::post_reload))
        .route("/ues", get(exams::get_ues))
        .nest("/rooms", rooms_router)
        .nest("/exams", exams_router)
        .with_state(app_state)
}
