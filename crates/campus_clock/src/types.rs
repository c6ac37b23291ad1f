/// Shared application state
use crate::calendar::ParseReport;
use crate::config::AppConfig;
use crate::dashboard::{self, DashboardSnapshot};
use crate::error::FeedError;
use crate::exams::{ExamTracker, IngestReport};
use crate::feed::{FeedClient, LoadedCalendar};
use chrono::{DateTime, Utc};
use chrono_tz::Tz;
use serde::Serialize;
use std::sync::Arc;
use tokio::sync::RwLock;
use tracing::info;

/// Outcome of loading one tracker's feed.
pub type Loaded<T> = Result<Arc<T>, FeedError>;

/// Everything produced by one load, plus the dashboard computed from it.
struct Snapshots {
    rooms: Loaded<LoadedCalendar>,
    exams: Loaded<ExamTracker>,
    dashboard: Option<DashboardSnapshot>,
}

/// State shared by the HTTP handlers and the dashboard task.
///
/// Each tracker is either a built snapshot or the error that prevented
/// loading it. Both trackers and the dashboard sit behind a single lock, so a
/// dashboard is always computed from one load and a reload discards it.
pub struct AppState {
    pub config: AppConfig,
    pub tz: Tz,
    client: FeedClient,
    snapshots: RwLock<Snapshots>,
}

/// What a (re)load produced, for logging and the reload endpoint.
#[derive(Debug, Clone, Serialize)]
pub struct LoadSummary {
    pub calendar: Result<ParseReport, String>,
    pub exams: Result<IngestReport, String>,
}

impl LoadSummary {
    fn of(snapshots: &Snapshots) -> Self {
        Self {
            calendar: snapshots
                .rooms
                .as_ref()
                .map(|loaded| loaded.report.clone())
                .map_err(|e| e.to_string()),
            exams: snapshots
                .exams
                .as_ref()
                .map(|tracker| tracker.report().clone())
                .map_err(|e| e.to_string()),
        }
    }

    fn log(&self) {
        info!(
            calendar_ok = self.calendar.is_ok(),
            exams_ok = self.exams.is_ok(),
            "Feeds loaded"
        );
    }
}

impl AppState {
    /// Builds the state from already-loaded trackers.
    pub fn new(
        config: AppConfig,
        tz: Tz,
        client: FeedClient,
        rooms: Loaded<LoadedCalendar>,
        exams: Loaded<ExamTracker>,
    ) -> Self {
        Self {
            config,
            tz,
            client,
            snapshots: RwLock::new(Snapshots {
                rooms,
                exams,
                dashboard: None,
            }),
        }
    }

    /// Loads both feeds concurrently and builds the state.
    pub async fn load(config: AppConfig, tz: Tz, client: FeedClient) -> Self {
        let (rooms, exams) = Self::fetch_all(&client, &config, tz).await;
        let state = Self::new(config, tz, client, rooms, exams);
        state.summary().await.log();
        state
    }

    async fn fetch_all(
        client: &FeedClient,
        config: &AppConfig,
        tz: Tz,
    ) -> (Loaded<LoadedCalendar>, Loaded<ExamTracker>) {
        let (rooms, exams) = tokio::join!(
            client.load_calendar(config, tz),
            client.load_exams(config, tz)
        );
        (rooms.map(Arc::new), exams.map(Arc::new))
    }

    /// Fetches both feeds again and swaps in the results, failures included.
    ///
    /// Fetching happens outside the lock; the swap replaces both trackers
    /// and drops the stored dashboard in one step.
    pub async fn reload(&self) -> LoadSummary {
        let (rooms, exams) = Self::fetch_all(&self.client, &self.config, self.tz).await;

        let mut snapshots = self.snapshots.write().await;
        *snapshots = Snapshots {
            rooms,
            exams,
            dashboard: None,
        };
        let summary = LoadSummary::of(&snapshots);
        drop(snapshots);

        summary.log();
        summary
    }

    pub async fn rooms(&self) -> Loaded<LoadedCalendar> {
        self.snapshots.read().await.rooms.clone()
    }

    pub async fn exams(&self) -> Loaded<ExamTracker> {
        self.snapshots.read().await.exams.clone()
    }

    /// Recomputes the dashboard snapshot and stores it.
    ///
    /// Holds the write lock while computing, so the result can't outlive a
    /// concurrent reload or mix trackers from two loads.
    pub async fn refresh_dashboard(&self, now: DateTime<Utc>) -> DashboardSnapshot {
        let mut snapshots = self.snapshots.write().await;
        let snapshot = dashboard::compute(
            now,
            snapshots.exams.as_deref().ok(),
            snapshots.rooms.as_deref().ok().map(|loaded| &loaded.engine),
        );
        snapshots.dashboard = Some(snapshot.clone());
        snapshot
    }

    /// Last stored dashboard snapshot, if the task has run since the last load.
    pub async fn dashboard(&self) -> Option<DashboardSnapshot> {
        self.snapshots.read().await.dashboard.clone()
    }

    pub async fn summary(&self) -> LoadSummary {
        LoadSummary::of(&*self.snapshots.read().await)
    }
}
