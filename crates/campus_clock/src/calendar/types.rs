/// Types for calendar feed data
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Floor label used when a location mention carries no floor qualifier.
pub const UNKNOWN_FLOOR: &str = "Étage inconnu";

/// Title used when an entry has no SUMMARY line.
pub const DEFAULT_TITLE: &str = "Sans titre";

/// One concrete booking of one room.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Occurrence {
    pub title: String,
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
    pub resource_id: String,
    pub description: String,
}

impl Occurrence {
    /// Half-open containment: `start <= instant < end`.
    pub fn contains(&self, instant: DateTime<Utc>) -> bool {
        self.start <= instant && instant < self.end
    }

    pub fn duration_minutes(&self) -> i64 {
        (self.end - self.start).num_minutes()
    }
}

/// Descriptive information about a room, recorded the first time it is seen.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResourceInfo {
    pub resource_id: String,
    pub floor_label: String,
}

/// A room mention extracted from a LOCATION field.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResourceRef {
    pub resource_id: String,
    pub floor_label: String,
}

/// Room families, as used to group rooms in listings.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum RoomKind {
    Td,
    Tp,
    Lecture,
    Other,
}

impl RoomKind {
    /// Classifies a room id by its prefix (TD..., TP..., C...).
    pub fn classify(resource_id: &str) -> Self {
        let upper = resource_id.to_uppercase();
        if upper.starts_with("TD") {
            RoomKind::Td
        } else if upper.starts_with("TP") {
            RoomKind::Tp
        } else if upper.starts_with('C') {
            RoomKind::Lecture
        } else {
            RoomKind::Other
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            RoomKind::Td => "Salles TD",
            RoomKind::Tp => "Salles TP",
            RoomKind::Lecture => "Salles C",
            RoomKind::Other => "Autres",
        }
    }
}

/// Counters describing what happened to a feed during parsing.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ParseReport {
    /// VEVENT blocks that were closed
    pub entries_seen: usize,
    /// Entries dropped for a missing/unparsable field or an empty interval
    pub entries_dropped: usize,
    /// Timestamps without a trailing `Z` (not guessed, entry dropped)
    pub floating_timestamps: usize,
    /// Entries whose location named no tracked room
    pub entries_without_rooms: usize,
    pub occurrences: usize,
}

/// Result of parsing a calendar feed.
#[derive(Debug, Clone, Default)]
pub struct ParsedFeed {
    pub occurrences: Vec<Occurrence>,
    /// First-seen floor information, in order of first appearance
    pub resources: Vec<ResourceInfo>,
    pub report: ParseReport,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_room_kind_classification() {
        assert_eq!(RoomKind::classify("TD005"), RoomKind::Td);
        assert_eq!(RoomKind::classify("tp101"), RoomKind::Tp);
        assert_eq!(RoomKind::classify("C002"), RoomKind::Lecture);
        assert_eq!(RoomKind::classify("A1"), RoomKind::Other);
        // TPR rooms are still TP rooms
        assert_eq!(RoomKind::classify("TPR2"), RoomKind::Tp);
    }
}
