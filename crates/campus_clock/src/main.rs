use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use anyhow::Context;
use campus_clock::{server, AppConfig, AppState, FeedClient};
use chrono::Utc;
use tracing::{info, warn};

const CONFIG_ENV: &str = "CAMPUS_CLOCK_CONFIG";
const DEFAULT_CONFIG: &str = "config.json";

fn config_path() -> PathBuf {
    std::env::args()
        .nth(1)
        .or_else(|| std::env::var(CONFIG_ENV).ok())
        .unwrap_or_else(|| DEFAULT_CONFIG.to_string())
        .into()
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let path = config_path();
    let (config, missing) = if path.exists() {
        (AppConfig::load_from_file(&path)?, false)
    } else {
        (AppConfig::default(), true)
    };

    tracing_subscriber::fmt()
        .with_max_level(config.tracing_level())
        .init();

    if missing {
        warn!(path = %path.display(), "Config file not found, using defaults");
    } else {
        info!(path = %path.display(), "Config loaded");
    }

    let tz = config.tz()?;
    let client = FeedClient::new()?;
    let state = Arc::new(AppState::load(config, tz, client).await);

    let interval = Duration::from_secs(state.config.dashboard_interval_secs.max(1));
    let dashboard_state = state.clone();
    tokio::spawn(async move {
        let mut ticker = tokio::time::interval(interval);
        loop {
            ticker.tick().await;
            let snapshot = dashboard_state.refresh_dashboard(Utc::now()).await;
            info!(
                next_exam = snapshot.next_exam.as_ref().map(|e| e.exam.id),
                available_rooms = snapshot.available_rooms.as_ref().map(Vec::len),
                "Dashboard refreshed"
            );
        }
    });

    let listener = tokio::net::TcpListener::bind(&state.config.bind_address)
        .await
        .with_context(|| format!("Failed to bind {}", state.config.bind_address))?;
    info!("Listening on {}", state.config.bind_address);

    axum::serve(listener, server::create_router(state.clone()))
        .with_graceful_shutdown(async {
            let _ = tokio::signal::ctrl_c().await;
            info!("Shutting down");
        })
        .await?;

    Ok(())
}
