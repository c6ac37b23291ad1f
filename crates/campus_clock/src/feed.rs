//! Feed loading.
//!
//! This is the only module doing I/O. Each feed is fetched once per load,
//! either over HTTP or from a local file; failures are returned as
//! [`FeedError`] and are not retried.

use crate::calendar::{self, AvailabilityEngine, ParseReport};
use crate::config::AppConfig;
use crate::error::FeedError;
use crate::exams::{self, ExamTracker};
use chrono_tz::Tz;
use rand::Rng;
use reqwest::Client;
use std::path::PathBuf;
use std::time::{Duration, Instant};
use tracing::{error, info};
use url::Url;

/// Where a feed comes from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FeedSource {
    Http(Url),
    File(PathBuf),
}

impl FeedSource {
    /// Interprets a configured source: `http(s)://` and `file://` URLs, or a
    /// plain path.
    pub fn parse(source: &str) -> Result<Self, FeedError> {
        let source = source.trim();
        let invalid = || FeedError::InvalidSource {
            source_str: source.to_string(),
        };
        if source.is_empty() {
            return Err(invalid());
        }

        match Url::parse(source) {
            Ok(url) => match url.scheme() {
                "http" | "https" => Ok(FeedSource::Http(url)),
                "file" => url.to_file_path().map(FeedSource::File).map_err(|_| invalid()),
                // Windows drive letters parse as a one-letter scheme
                scheme if scheme.len() == 1 => Ok(FeedSource::File(PathBuf::from(source))),
                _ => Err(invalid()),
            },
            Err(url::ParseError::RelativeUrlWithoutBase) => {
                Ok(FeedSource::File(PathBuf::from(source)))
            }
            Err(_) => Err(invalid()),
        }
    }
}

impl std::fmt::Display for FeedSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            FeedSource::Http(url) => write!(f, "{url}"),
            FeedSource::File(path) => write!(f, "{}", path.display()),
        }
    }
}

/// Configuration for the feed client.
#[derive(Debug, Clone)]
pub struct FeedClientConfig {
    pub user_agent: String,
    pub connect_timeout: Duration,
    pub timeout: Duration,
}

impl Default for FeedClientConfig {
    fn default() -> Self {
        Self {
            user_agent: concat!("campus_clock/", env!("CARGO_PKG_VERSION")).to_string(),
            connect_timeout: Duration::from_secs(10),
            timeout: Duration::from_secs(30),
        }
    }
}

/// Calendar feed turned into an engine, with its parse report.
#[derive(Debug, Clone)]
pub struct LoadedCalendar {
    pub engine: AvailabilityEngine,
    pub report: ParseReport,
}

/// Fetches and decodes the two feeds.
#[derive(Debug, Clone)]
pub struct FeedClient {
    client: Client,
}

impl FeedClient {
    /// Creates a new feed client with default configuration.
    pub fn new() -> Result<Self, FeedError> {
        Self::with_config(FeedClientConfig::default())
    }

    pub fn with_config(config: FeedClientConfig) -> Result<Self, FeedError> {
        let client = Client::builder()
            .user_agent(&config.user_agent)
            .connect_timeout(config.connect_timeout)
            .timeout(config.timeout)
            .build()
            .map_err(|e| FeedError::Network {
                message: format!("Failed to build HTTP client: {}", e),
            })?;
        Ok(Self { client })
    }

    /// Fetches a feed as text.
    pub async fn fetch_text(
        &self,
        source: &FeedSource,
        correlation_id: &str,
    ) -> Result<String, FeedError> {
        let start = Instant::now();
        info!(correlation_id = %correlation_id, source = %source, "Fetching feed");

        let text = match source {
            FeedSource::Http(url) => {
                let response = self.client.get(url.clone()).send().await?;
                if !response.status().is_success() {
                    return Err(FeedError::HttpStatus {
                        url: url.to_string(),
                        status: response.status().as_u16(),
                    });
                }
                response.text().await?
            }
            FeedSource::File(path) => tokio::fs::read_to_string(path).await?,
        };

        info!(
            correlation_id = %correlation_id,
            bytes = text.len(),
            duration_ms = start.elapsed().as_millis() as u64,
            "Feed fetched"
        );
        Ok(text)
    }

    /// Loads the calendar feed and builds the availability engine.
    pub async fn load_calendar(
        &self,
        config: &AppConfig,
        tz: Tz,
    ) -> Result<LoadedCalendar, FeedError> {
        let correlation_id = generate_correlation_id();
        let result = async {
            let source = FeedSource::parse(&config.calendar_feed)?;
            let text = self.fetch_text(&source, &correlation_id).await?;
            let (engine, report) = calendar::build_engine(
                &text,
                &config.building,
                config.room_links.clone(),
                tz,
            );
            Ok::<_, FeedError>(LoadedCalendar { engine, report })
        }
        .await;

        if let Err(e) = &result {
            error!(correlation_id = %correlation_id, error = %e, "Calendar feed load failed");
        }
        result
    }

    /// Loads the exam feed and ingests it.
    pub async fn load_exams(&self, config: &AppConfig, tz: Tz) -> Result<ExamTracker, FeedError> {
        let correlation_id = generate_correlation_id();
        let result = async {
            let source = FeedSource::parse(&config.exam_feed)?;
            let text = self.fetch_text(&source, &correlation_id).await?;
            Ok::<_, FeedError>(exams::ingest_json(&text, tz)?)
        }
        .await;

        if let Err(e) = &result {
            error!(correlation_id = %correlation_id, error = %e, "Exam feed load failed");
        }
        result
    }
}

/// Short id tying together the log lines of one load.
pub fn generate_correlation_id() -> String {
    use std::time::{SystemTime, UNIX_EPOCH};
    let timestamp = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default()
        .as_micros();
    let random: u32 = rand::thread_rng().gen();
    format!("{:x}-{:08x}", timestamp & 0xFFFFFFFF, random)
}
