//! Best-effort parser for the iCalendar subset published by the schedule
//! system.
//!
//! Only `VEVENT` blocks and five properties are read. Entries missing a
//! location, start or end are dropped without error, as are entries whose
//! timestamps are not in the `YYYYMMDDTHHMMSSZ` UTC form. Local times, either
//! floating or qualified with `TZID=`, are counted and logged before the drop.

use super::location::LocationExtractor;
use super::types::{Occurrence, ParseReport, ParsedFeed, ResourceInfo, DEFAULT_TITLE};
use chrono::{DateTime, NaiveDateTime, Utc};
use std::collections::HashSet;
use tracing::{debug, warn};

const BEGIN_EVENT: &str = "BEGIN:VEVENT";
const END_EVENT: &str = "END:VEVENT";

/// Fields collected for the currently open VEVENT.
#[derive(Debug, Default)]
struct RawEntry {
    start: Option<String>,
    end: Option<String>,
    summary: Option<String>,
    location: Option<String>,
    description: Option<String>,
    /// A start or end carried a `TZID=` parameter
    zoned: bool,
}

impl RawEntry {
    /// Reads one content line, `NAME[;PARAM=...]:value`.
    fn absorb(&mut self, line: &str) {
        let Some((name, value)) = line.split_once(':') else {
            return;
        };
        let (property, params) = match name.split_once(';') {
            Some((property, params)) => (property, Some(params)),
            None => (name, None),
        };
        let value = Some(value.to_string());

        match property {
            "DTSTART" | "DTEND" => {
                if params.is_some_and(|p| p.to_ascii_uppercase().contains("TZID=")) {
                    self.zoned = true;
                }
                if property == "DTSTART" {
                    self.start = value;
                } else {
                    self.end = value;
                }
            }
            "SUMMARY" => self.summary = value,
            "LOCATION" => self.location = value,
            "DESCRIPTION" => self.description = value,
            _ => {}
        }
    }
}

/// Parses a compact UTC timestamp (`20251022T134500Z`).
///
/// Returns `None` for anything else, including floating times without the
/// `Z` suffix.
pub fn parse_ics_timestamp(value: &str) -> Option<DateTime<Utc>> {
    let compact = value.trim().strip_suffix('Z')?;
    NaiveDateTime::parse_from_str(compact, "%Y%m%dT%H%M%S")
        .ok()
        .map(|naive| naive.and_utc())
}

fn is_floating(value: &str) -> bool {
    let value = value.trim();
    !value.ends_with('Z') && NaiveDateTime::parse_from_str(value, "%Y%m%dT%H%M%S").is_ok()
}

/// Joins RFC 5545 folded lines and trims every line.
fn unfold_lines(feed: &str) -> Vec<String> {
    let mut lines: Vec<String> = Vec::new();
    for raw in feed.split('\n') {
        let raw = raw.strip_suffix('\r').unwrap_or(raw);
        if raw.starts_with([' ', '\t']) {
            if let Some(last) = lines.last_mut() {
                last.push_str(&raw[1..]);
                continue;
            }
        }
        lines.push(raw.to_string());
    }
    lines.into_iter().map(|l| l.trim().to_string()).collect()
}

/// Parses a calendar feed into occurrences, one per referenced room.
///
/// # Arguments
/// * `feed` - Raw feed text
/// * `extractor` - Room extractor for the tracked building
///
/// # Returns
/// The occurrences in feed order, the first-seen room information and a
/// report of what was dropped. Never fails.
pub fn parse_feed(feed: &str, extractor: &LocationExtractor) -> ParsedFeed {
    let mut parsed = ParsedFeed::default();
    let mut seen_rooms: HashSet<String> = HashSet::new();
    let mut current: Option<RawEntry> = None;

    for line in unfold_lines(feed) {
        if line == BEGIN_EVENT {
            current = Some(RawEntry::default());
        } else if line == END_EVENT {
            if let Some(entry) = current.take() {
                parsed.report.entries_seen += 1;
                materialize(entry, extractor, &mut parsed, &mut seen_rooms);
            }
        } else if let Some(entry) = current.as_mut() {
            entry.absorb(&line);
        }
    }

    parsed.report.occurrences = parsed.occurrences.len();
    parsed
}

fn materialize(
    entry: RawEntry,
    extractor: &LocationExtractor,
    parsed: &mut ParsedFeed,
    seen_rooms: &mut HashSet<String>,
) {
    let zoned = entry.zoned;
    let (Some(location), Some(raw_start), Some(raw_end)) =
        (entry.location, entry.start, entry.end)
    else {
        parsed.report.entries_dropped += 1;
        return;
    };

    let parsed_times = (parse_ics_timestamp(&raw_start), parse_ics_timestamp(&raw_end));
    let (start, end) = match parsed_times {
        (Some(start), Some(end)) if !zoned => (start, end),
        _ => {
            if zoned || is_floating(&raw_start) || is_floating(&raw_end) {
                parsed.report.floating_timestamps += 1;
                warn!(
                    start = %raw_start,
                    end = %raw_end,
                    zoned,
                    "Dropping entry with non-UTC timestamp"
                );
            } else {
                debug!(
                    start = %raw_start,
                    end = %raw_end,
                    "Dropping entry with unparsable timestamp"
                );
            }
            parsed.report.entries_dropped += 1;
            return;
        }
    };

    if end <= start {
        debug!(%start, %end, "Dropping entry with empty interval");
        parsed.report.entries_dropped += 1;
        return;
    }

    let rooms = extractor.extract_resources(&location);
    if rooms.is_empty() {
        parsed.report.entries_without_rooms += 1;
        return;
    }

    let title = entry.summary.unwrap_or_else(|| DEFAULT_TITLE.to_string());
    let description = entry.description.unwrap_or_default();

    for room in rooms {
        if seen_rooms.insert(room.resource_id.clone()) {
            parsed.resources.push(ResourceInfo {
                resource_id: room.resource_id.clone(),
                floor_label: room.floor_label,
            });
        }
        parsed.occurrences.push(Occurrence {
            title: title.clone(),
            start,
            end,
            resource_id: room.resource_id,
            description: description.clone(),
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    const FEED: &str = "BEGIN:VCALENDAR\r\n\
BEGIN:VEVENT\r\n\
DTSTART:20251022T134500Z\r\n\
DTEND:20251022T154500Z\r\n\
SUMMARY:TD Algorithmique\r\n\
LOCATION:Nautibus C002 (RDC)\\, Nautibus TD005 (1er étage)\r\n\
DESCRIPTION:Groupe A\r\n\
END:VEVENT\r\n\
BEGIN:VEVENT\r\n\
DTSTART:20251023T080000Z\r\n\
DTEND:20251023T100000Z\r\n\
LOCATION:Nautibus C002 (2ème étage)\r\n\
END:VEVENT\r\n\
BEGIN:VEVENT\r\n\
DTSTART:20251023T080000Z\r\n\
SUMMARY:No end\r\n\
LOCATION:Nautibus C003\r\n\
END:VEVENT\r\n\
END:VCALENDAR\r\n";

    #[test]
    fn test_parse_ics_timestamp() {
        assert_eq!(
            parse_ics_timestamp("20251022T134500Z"),
            Some(Utc.with_ymd_and_hms(2025, 10, 22, 13, 45, 0).unwrap())
        );
        assert_eq!(parse_ics_timestamp("20251022T134500"), None);
        assert_eq!(parse_ics_timestamp("2025-10-22"), None);
        assert_eq!(parse_ics_timestamp("20251322T134500Z"), None);
    }

    #[test]
    fn test_multi_room_entry_expands() {
        let parsed = parse_feed(FEED, &LocationExtractor::default());
        assert_eq!(parsed.occurrences.len(), 3);

        let first = &parsed.occurrences[0];
        assert_eq!(first.resource_id, "C002");
        assert_eq!(first.title, "TD Algorithmique");
        assert_eq!(first.description, "Groupe A");
        assert_eq!(parsed.occurrences[1].resource_id, "TD005");
        assert_eq!(parsed.occurrences[1].start, first.start);
    }

    #[test]
    fn test_defaults_and_first_seen_floor() {
        let parsed = parse_feed(FEED, &LocationExtractor::default());
        let second_c002 = &parsed.occurrences[2];
        assert_eq!(second_c002.title, DEFAULT_TITLE);
        assert_eq!(second_c002.description, "");

        // C002 was first seen on the ground floor; the later label is ignored
        assert_eq!(
            parsed.resources,
            vec![
                ResourceInfo {
                    resource_id: "C002".to_string(),
                    floor_label: "RDC".to_string()
                },
                ResourceInfo {
                    resource_id: "TD005".to_string(),
                    floor_label: "1er étage".to_string()
                },
            ]
        );
    }

    #[test]
    fn test_report_counts_drops() {
        let parsed = parse_feed(FEED, &LocationExtractor::default());
        assert_eq!(parsed.report.entries_seen, 3);
        assert_eq!(parsed.report.entries_dropped, 1);
        assert_eq!(parsed.report.occurrences, 3);
    }

    #[test]
    fn test_start_before_end_always_holds() {
        let feed = "BEGIN:VEVENT\nDTSTART:20251022T100000Z\nDTEND:20251022T100000Z\nLOCATION:Nautibus C002\nEND:VEVENT\n\
BEGIN:VEVENT\nDTSTART:20251022T110000Z\nDTEND:20251022T100000Z\nLOCATION:Nautibus C002\nEND:VEVENT\n\
BEGIN:VEVENT\nDTSTART:20251022T090000Z\nDTEND:20251022T100000Z\nLOCATION:Nautibus C002\nEND:VEVENT\n";
        let parsed = parse_feed(feed, &LocationExtractor::default());
        assert_eq!(parsed.occurrences.len(), 1);
        assert_eq!(parsed.report.entries_dropped, 2);
        assert!(parsed.occurrences.iter().all(|o| o.start < o.end));
    }

    #[test]
    fn test_floating_timestamps_are_flagged() {
        let feed = "BEGIN:VEVENT\nDTSTART:20251022T100000\nDTEND:20251022T120000\nLOCATION:Nautibus C002\nEND:VEVENT\n\
BEGIN:VEVENT\nDTSTART;TZID=Europe/Paris:20251022T100000\nDTEND:20251022T120000Z\nLOCATION:Nautibus C002\nEND:VEVENT\n";
        let parsed = parse_feed(feed, &LocationExtractor::default());
        assert!(parsed.occurrences.is_empty());
        assert_eq!(parsed.report.floating_timestamps, 2);
        assert_eq!(parsed.report.entries_dropped, 2);
    }

    #[test]
    fn test_tzid_timestamps_are_flagged() {
        let feed = "BEGIN:VEVENT\n\
DTSTART;TZID=Europe/Paris:20251022T100000\n\
DTEND;TZID=Europe/Paris:20251022T120000\n\
LOCATION:Nautibus C002\n\
END:VEVENT\n\
BEGIN:VEVENT\n\
DTSTART;TZID=Europe/Paris:20251022T100000Z\n\
DTEND:20251022T120000Z\n\
LOCATION:Nautibus C002\n\
END:VEVENT\n";
        let parsed = parse_feed(feed, &LocationExtractor::default());
        assert!(parsed.occurrences.is_empty());
        assert_eq!(parsed.report.entries_seen, 2);
        assert_eq!(parsed.report.entries_dropped, 2);
        assert_eq!(parsed.report.floating_timestamps, 2);
    }

    #[test]
    fn test_parameterized_text_properties() {
        let feed = "BEGIN:VEVENT\n\
DTSTART:20251022T100000Z\n\
DTEND:20251022T120000Z\n\
SUMMARY;LANGUAGE=fr:Réunion: bilan\n\
LOCATION:Nautibus C002\n\
END:VEVENT\n";
        let parsed = parse_feed(feed, &LocationExtractor::default());
        assert_eq!(parsed.occurrences.len(), 1);
        assert_eq!(parsed.occurrences[0].title, "Réunion: bilan");
    }

    #[test]
    fn test_folded_location_line() {
        let feed = "BEGIN:VEVENT\nDTSTART:20251022T100000Z\nDTEND:20251022T120000Z\nLOCATION:Nautibus C002 (RDC)\\, Nauti\n bus TD007 (1er étage)\nEND:VEVENT\n";
        let parsed = parse_feed(feed, &LocationExtractor::default());
        let rooms: Vec<_> = parsed.occurrences.iter().map(|o| o.resource_id.as_str()).collect();
        assert_eq!(rooms, vec!["C002", "TD007"]);
    }

    #[test]
    fn test_entry_without_tracked_room() {
        let feed = "BEGIN:VEVENT\nDTSTART:20251022T100000Z\nDTEND:20251022T120000Z\nLOCATION:Thémis 3\nEND:VEVENT\n";
        let parsed = parse_feed(feed, &LocationExtractor::default());
        assert!(parsed.occurrences.is_empty());
        assert_eq!(parsed.report.entries_without_rooms, 1);
        assert_eq!(parsed.report.entries_dropped, 0);
    }

    #[test]
    fn test_lines_outside_events_ignored() {
        let feed = "SUMMARY:stray\nLOCATION:Nautibus C002\nEND:VEVENT\n";
        let parsed = parse_feed(feed, &LocationExtractor::default());
        assert_eq!(parsed.report.entries_seen, 0);
        assert!(parsed.occurrences.is_empty());
    }
}
