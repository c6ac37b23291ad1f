/// Calendar feed ingestion and room availability
mod availability;
mod index;
mod location;
mod parser;
mod types;

pub use availability::*;
pub use index::ResourceIndex;
pub use location::LocationExtractor;
pub use parser::{parse_feed, parse_ics_timestamp};
pub use types::*;

use crate::config::RoomLinks;
use chrono_tz::Tz;
use tracing::info;

/// Parses a calendar feed and builds the availability engine over it.
///
/// # Arguments
/// * `feed` - Raw feed text
/// * `building` - Building whose rooms are tracked
/// * `links` - External schedule links per room
/// * `tz` - Local timezone for day/week boundaries
///
/// # Returns
/// The engine and the parse report. Parsing never fails; dropped entries
/// only show up in the report.
pub fn build_engine(
    feed: &str,
    building: &str,
    links: RoomLinks,
    tz: Tz,
) -> (AvailabilityEngine, ParseReport) {
    let extractor = LocationExtractor::new(building);
    let parsed = parse_feed(feed, &extractor);

    let index = ResourceIndex::build(parsed.occurrences, parsed.resources);

    info!(
        building = %extractor.building(),
        rooms = index.len(),
        occurrences = parsed.report.occurrences,
        entries_seen = parsed.report.entries_seen,
        entries_dropped = parsed.report.entries_dropped,
        floating_timestamps = parsed.report.floating_timestamps,
        "Calendar feed indexed"
    );

    (AvailabilityEngine::new(index, links, tz), parsed.report)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};

    #[test]
    fn test_build_engine_end_to_end() {
        let feed = "BEGIN:VCALENDAR\n\
BEGIN:VEVENT\n\
DTSTART:20251022T080000Z\n\
DTEND:20251022T100000Z\n\
SUMMARY:CM Réseaux\n\
LOCATION:Nautibus C002 (RDC)\\, Nautibus TD005 (1er étage)\n\
END:VEVENT\n\
END:VCALENDAR\n";
        let (engine, report) = build_engine(
            feed,
            "Nautibus",
            RoomLinks::default(),
            chrono_tz::Europe::Paris,
        );
        assert_eq!(report.occurrences, 2);
        assert_eq!(engine.index().resource_ids(), vec!["C002", "TD005"]);
        assert_eq!(engine.index().floor_label("TD005"), "1er étage");

        let during = Utc.with_ymd_and_hms(2025, 10, 22, 9, 0, 0).unwrap();
        assert!(engine.list_available_now(during).is_empty());
        let after = Utc.with_ymd_and_hms(2025, 10, 22, 10, 0, 0).unwrap();
        assert_eq!(engine.list_available_now(after).len(), 2);
    }
}
