//! Room extraction from free-text LOCATION fields.
//!
//! A single field can name several rooms, e.g.
//! `Nautibus C002 (RDC)\, Nautibus TD005 (1er étage)`. Only mentions of the
//! configured building count; anything else in the field is ignored.

use super::types::{ResourceRef, UNKNOWN_FLOOR};
use regex::Regex;
use std::sync::LazyLock;

static MENTION_SPLIT: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"[,\\]").unwrap());
static FLOOR_REGEX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)\((.*?étage|RDC)\)").unwrap());

/// Extracts room references for one building.
#[derive(Debug, Clone)]
pub struct LocationExtractor {
    building: String,
    room_regex: Regex,
}

impl LocationExtractor {
    /// Creates an extractor for the given building name.
    pub fn new(building: &str) -> Self {
        let pattern = format!(r"(?i){}\s+([A-Z]+\d+[A-Z]?\d*)", regex::escape(building));
        Self {
            building: building.to_string(),
            // The building is escaped, so the pattern is always valid
            room_regex: Regex::new(&pattern).unwrap(),
        }
    }

    pub fn building(&self) -> &str {
        &self.building
    }

    /// Returns every qualifying room mention in the field, in order.
    ///
    /// Mentions without a recognizable room id are skipped; the result may
    /// be empty.
    pub fn extract_resources(&self, location: &str) -> Vec<ResourceRef> {
        MENTION_SPLIT
            .split(location)
            .map(str::trim)
            .filter_map(|mention| self.extract_one(mention))
            .collect()
    }

    fn extract_one(&self, mention: &str) -> Option<ResourceRef> {
        let resource_id = self
            .room_regex
            .captures(mention)
            .and_then(|caps| caps.get(1))
            .map(|m| m.as_str().to_string())?;

        let floor_label = FLOOR_REGEX
            .captures(mention)
            .and_then(|caps| caps.get(1))
            .map(|m| m.as_str().to_string())
            .unwrap_or_else(|| UNKNOWN_FLOOR.to_string());

        Some(ResourceRef {
            resource_id,
            floor_label,
        })
    }
}

impl Default for LocationExtractor {
    fn default() -> Self {
        Self::new("Nautibus")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_two_rooms_with_floors() {
        let rooms = LocationExtractor::default()
            .extract_resources("Nautibus C002 (RDC), Nautibus TD005 (1er étage)");
        assert_eq!(
            rooms,
            vec![
                ResourceRef {
                    resource_id: "C002".to_string(),
                    floor_label: "RDC".to_string(),
                },
                ResourceRef {
                    resource_id: "TD005".to_string(),
                    floor_label: "1er étage".to_string(),
                },
            ]
        );
    }

    #[test]
    fn test_escaped_comma_separator() {
        let rooms = LocationExtractor::default()
            .extract_resources(r"Nautibus TP101 (1er étage)\, Nautibus TP103");
        assert_eq!(rooms.len(), 2);
        assert_eq!(rooms[1].resource_id, "TP103");
        assert_eq!(rooms[1].floor_label, UNKNOWN_FLOOR);
    }

    #[test]
    fn test_other_buildings_ignored() {
        let rooms = LocationExtractor::default()
            .extract_resources("Thémis 12, Amphi Nautibus, Nautibus TPR2 (2ème étage)");
        assert_eq!(rooms.len(), 1);
        assert_eq!(rooms[0].resource_id, "TPR2");
        assert_eq!(rooms[0].floor_label, "2ème étage");
    }

    #[test]
    fn test_trailing_letter_digits() {
        let rooms = LocationExtractor::default().extract_resources("Nautibus C10B2");
        assert_eq!(rooms[0].resource_id, "C10B2");
    }

    #[test]
    fn test_custom_building() {
        let extractor = LocationExtractor::new("Déambu");
        assert!(extractor.extract_resources("Nautibus C002").is_empty());
        assert_eq!(
            extractor.extract_resources("déambu S12 (RDC)")[0].resource_id,
            "S12"
        );
    }
}
