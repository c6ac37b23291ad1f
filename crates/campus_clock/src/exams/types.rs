/// Types for exam feed data
use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Deserializer, Serialize};
use std::collections::HashMap;

/// Strings the feed uses for "intentionally unknown".
pub const SENTINELS: [&str; 2] = ["NAN", "TBA"];

/// Returns true when a raw feed value is absent or a sentinel.
pub fn is_unknown(value: Option<&str>) -> bool {
    match value {
        None => true,
        Some(v) => SENTINELS.contains(&v),
    }
}

/// Raw exam document, as published
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ExamFeed {
    #[serde(rename = "lastUpdated", default)]
    pub last_updated: Option<String>,

    #[serde(default)]
    pub ues: HashMap<String, UeInfo>,

    /// Kept untyped so one malformed record doesn't reject the whole feed
    #[serde(default)]
    pub examens: Vec<serde_json::Value>,
}

/// Course unit (UE) catalog entry
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct UeInfo {
    #[serde(default)]
    pub code: String,

    #[serde(default)]
    pub name: String,

    #[serde(rename = "fullName", default)]
    pub full_name: String,

    #[serde(rename = "Link", default, skip_serializing_if = "Option::is_none")]
    pub link: Option<String>,
}

/// One exam record as found in `examens`
#[derive(Debug, Clone, Deserialize)]
pub struct RawExam {
    pub id: i64,

    #[serde(default, deserialize_with = "loose_string")]
    pub ue_id: Option<String>,

    #[serde(default, deserialize_with = "loose_string")]
    pub date: Option<String>,

    #[serde(default, deserialize_with = "loose_string")]
    pub time: Option<String>,

    #[serde(default, deserialize_with = "loose_string")]
    pub duration: Option<String>,

    #[serde(default, deserialize_with = "loose_string")]
    pub location: Option<String>,

    #[serde(default, deserialize_with = "loose_string")]
    pub coefficient: Option<String>,

    #[serde(default, deserialize_with = "loose_string")]
    pub documents: Option<String>,

    #[serde(default, deserialize_with = "loose_string")]
    pub description: Option<String>,

    #[serde(default, deserialize_with = "loose_string")]
    pub status: Option<String>,

    #[serde(rename = "type", default, deserialize_with = "loose_string")]
    pub exam_type: Option<String>,

    #[serde(default, deserialize_with = "loose_string")]
    pub name: Option<String>,
}

/// Accepts strings, numbers and booleans as text; null and anything else
/// become `None`.
fn loose_string<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<serde_json::Value>::deserialize(deserializer)?;
    Ok(match value {
        Some(serde_json::Value::String(s)) => Some(s),
        Some(serde_json::Value::Number(n)) => Some(n.to_string()),
        Some(serde_json::Value::Bool(b)) => Some(b.to_string()),
        _ => None,
    })
}

/// Exam record enriched with UE information and derived date fields
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ExamRecord {
    pub id: i64,
    pub ue_id: String,
    /// UE full name, or the UE id when the catalog has no entry
    pub ue_full_name: String,
    pub ue_code: String,
    pub ue_name: String,
    pub name: Option<String>,
    pub exam_type: Option<String>,
    pub location: Option<String>,
    pub duration: Option<String>,
    pub coefficient: Option<String>,
    pub documents: Option<String>,
    pub description: Option<String>,
    pub status: Option<String>,
    pub raw_date: Option<String>,
    pub raw_time: Option<String>,
    pub date: Option<NaiveDate>,
    pub has_valid_date: bool,
    pub has_valid_time: bool,
    /// Set iff both the date and the time are valid
    pub datetime: Option<DateTime<Utc>>,
}

impl ExamRecord {
    /// Title shown for the exam: its own name, else the UE full name.
    pub fn display_name(&self) -> &str {
        self.name.as_deref().unwrap_or(&self.ue_full_name)
    }
}

/// Counters describing what happened to the exam feed during ingestion.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct IngestReport {
    pub records_seen: usize,
    pub records_skipped: usize,
    pub valid: usize,
    pub pending: usize,
    pub with_datetime: usize,
}
