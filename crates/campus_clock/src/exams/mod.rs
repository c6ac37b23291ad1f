/// Exam feed ingestion and countdown queries
mod tracker;
mod types;

pub use tracker::*;
pub use types::*;

use chrono_tz::Tz;

/// Decodes an exam feed document and ingests it.
///
/// Only a document that isn't JSON, or whose top level doesn't have the
/// expected shape, is an error; bad individual records are skipped.
pub fn ingest_json(document: &str, tz: Tz) -> Result<ExamTracker, serde_json::Error> {
    let feed: ExamFeed = serde_json::from_str(document)?;
    Ok(ExamTracker::ingest(feed, tz))
}
