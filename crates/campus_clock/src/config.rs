/// Application configuration loaded from a JSON file
use crate::error::ConfigError;
use chrono_tz::Tz;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fs;
use std::path::Path;

/// Top-level configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    /// Address the HTTP API listens on
    pub bind_address: String,
    /// IANA name of the single local timezone (e.g. "Europe/Paris")
    pub timezone: String,
    /// Calendar feed, URL or local path
    pub calendar_feed: String,
    /// Exam feed, URL or local path
    pub exam_feed: String,
    /// Building whose rooms are tracked (matched inside LOCATION fields)
    pub building: String,
    /// How often the dashboard snapshot is recomputed
    pub dashboard_interval_secs: u64,
    /// Maximum log level ("error", "warn", "info", "debug", "trace")
    pub log_level: String,
    pub room_links: RoomLinks,
}

/// Mapping from room id to the id used by the external schedule viewer.
///
/// Rooms missing from `ids` simply have no link.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RoomLinks {
    /// URL with a `{id}` placeholder for the external id
    #[serde(default)]
    pub url_template: String,
    #[serde(default)]
    pub ids: HashMap<String, String>,
}

impl RoomLinks {
    /// Renders the external schedule link for a room, if it is known.
    pub fn link_for(&self, resource_id: &str) -> Option<String> {
        if self.url_template.is_empty() {
            return None;
        }
        self.ids
            .get(resource_id)
            .map(|id| self.url_template.replace("{id}", id))
    }
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            bind_address: "0.0.0.0:3000".to_string(),
            timezone: "Europe/Paris".to_string(),
            calendar_feed: "ADECal.ics".to_string(),
            exam_feed: "examens.json".to_string(),
            building: "Nautibus".to_string(),
            dashboard_interval_secs: 60,
            log_level: "info".to_string(),
            room_links: RoomLinks::default(),
        }
    }
}

impl AppConfig {
    /// Loads the configuration from a JSON file
    ///
    /// # Arguments
    /// * `path` - Path to the config file
    ///
    /// # Returns
    /// * `Ok(AppConfig)` - Loaded configuration; missing keys take their defaults
    /// * `Err` - If the file can't be read or parsed, or names an unknown timezone
    pub fn load_from_file(path: &Path) -> Result<Self, ConfigError> {
        let content = fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.display().to_string(),
            source,
        })?;
        let config = Self::from_json(&content).map_err(|source| ConfigError::Parse {
            path: path.display().to_string(),
            source,
        })?;

        // Fail early rather than at first query
        config.tz()?;
        Ok(config)
    }

    pub fn from_json(content: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(content)
    }

    /// Parses the configured timezone.
    pub fn tz(&self) -> Result<Tz, ConfigError> {
        self.timezone
            .parse::<Tz>()
            .map_err(|_| ConfigError::InvalidTimezone {
                name: self.timezone.clone(),
            })
    }

    /// Maps `log_level` onto a tracing level, defaulting to INFO.
    pub fn tracing_level(&self) -> tracing::Level {
        self.log_level
            .parse::<tracing::Level>()
            .unwrap_or(tracing::Level::INFO)
    }
}
