/// Per-room index of occurrences
use super::types::{Occurrence, ResourceInfo, RoomKind, UNKNOWN_FLOOR};
use std::collections::{BTreeMap, HashMap};

/// Occurrences grouped by room, each group sorted by start.
#[derive(Debug, Clone, Default)]
pub struct ResourceIndex {
    rooms: BTreeMap<String, Vec<Occurrence>>,
    infos: HashMap<String, ResourceInfo>,
}

impl ResourceIndex {
    /// Builds the index.
    ///
    /// Input order is kept within a room before a stable sort by start, so
    /// occurrences with equal starts stay in feed order. Duplicates are kept.
    /// The first info seen for a room wins.
    pub fn build(occurrences: Vec<Occurrence>, infos: Vec<ResourceInfo>) -> Self {
        let mut rooms: BTreeMap<String, Vec<Occurrence>> = BTreeMap::new();
        for occurrence in occurrences {
            rooms
                .entry(occurrence.resource_id.clone())
                .or_default()
                .push(occurrence);
        }
        for list in rooms.values_mut() {
            list.sort_by_key(|o| o.start);
        }

        let mut info_map = HashMap::new();
        for info in infos {
            info_map.entry(info.resource_id.clone()).or_insert(info);
        }

        Self {
            rooms,
            infos: info_map,
        }
    }

    /// Sorted room ids.
    pub fn resource_ids(&self) -> Vec<String> {
        self.rooms.keys().cloned().collect()
    }

    /// Occurrences for a room; unknown rooms yield an empty slice.
    pub fn occurrences(&self, resource_id: &str) -> &[Occurrence] {
        self.rooms
            .get(resource_id)
            .map(Vec::as_slice)
            .unwrap_or_default()
    }

    pub fn info(&self, resource_id: &str) -> Option<&ResourceInfo> {
        self.infos.get(resource_id)
    }

    /// Floor label for a room, falling back to the unknown-floor sentinel.
    pub fn floor_label(&self, resource_id: &str) -> String {
        self.info(resource_id)
            .map(|i| i.floor_label.clone())
            .unwrap_or_else(|| UNKNOWN_FLOOR.to_string())
    }

    pub fn contains(&self, resource_id: &str) -> bool {
        self.rooms.contains_key(resource_id)
    }

    /// Number of rooms.
    pub fn len(&self) -> usize {
        self.rooms.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rooms.is_empty()
    }

    /// Total number of occurrences across all rooms.
    pub fn occurrence_count(&self) -> usize {
        self.rooms.values().map(Vec::len).sum()
    }

    /// All occurrences, room by room in id order.
    pub fn flatten(&self) -> Vec<Occurrence> {
        self.rooms.values().flatten().cloned().collect()
    }

    /// Sorted room ids grouped by family.
    pub fn rooms_by_kind(&self) -> BTreeMap<RoomKind, Vec<String>> {
        let mut groups: BTreeMap<RoomKind, Vec<String>> = BTreeMap::new();
        for id in self.rooms.keys() {
            groups
                .entry(RoomKind::classify(id))
                .or_default()
                .push(id.clone());
        }
        groups
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};

    fn occurrence(room: &str, title: &str, start_hour: u32) -> Occurrence {
        Occurrence {
            title: title.to_string(),
            start: Utc.with_ymd_and_hms(2025, 10, 22, start_hour, 0, 0).unwrap(),
            end: Utc.with_ymd_and_hms(2025, 10, 22, start_hour + 1, 0, 0).unwrap(),
            resource_id: room.to_string(),
            description: String::new(),
        }
    }

    #[test]
    fn test_groups_sorted_by_start() {
        let index = ResourceIndex::build(
            vec![
                occurrence("TD005", "late", 15),
                occurrence("C002", "b", 10),
                occurrence("TD005", "early", 8),
            ],
            vec![],
        );
        assert_eq!(index.resource_ids(), vec!["C002", "TD005"]);
        let titles: Vec<_> = index.occurrences("TD005").iter().map(|o| o.title.as_str()).collect();
        assert_eq!(titles, vec!["early", "late"]);
    }

    #[test]
    fn test_equal_starts_keep_input_order_and_duplicates() {
        let index = ResourceIndex::build(
            vec![
                occurrence("C002", "first", 9),
                occurrence("C002", "second", 9),
                occurrence("C002", "first", 9),
            ],
            vec![],
        );
        let titles: Vec<_> = index.occurrences("C002").iter().map(|o| o.title.as_str()).collect();
        assert_eq!(titles, vec!["first", "second", "first"]);
    }

    #[test]
    fn test_unknown_room_is_empty() {
        let index = ResourceIndex::build(vec![occurrence("C002", "a", 9)], vec![]);
        assert!(index.occurrences("C999").is_empty());
        assert_eq!(index.floor_label("C999"), UNKNOWN_FLOOR);
    }

    #[test]
    fn test_flatten_round_trip() {
        let input = vec![
            occurrence("TP101", "x", 12),
            occurrence("C002", "y", 9),
            occurrence("TP101", "z", 8),
            occurrence("C002", "y", 9),
        ];
        let index = ResourceIndex::build(input.clone(), vec![]);
        let mut flat = index.flatten();
        let mut expected = input;
        let key = |o: &Occurrence| (o.resource_id.clone(), o.start, o.title.clone());
        flat.sort_by_key(key);
        expected.sort_by_key(key);
        assert_eq!(flat, expected);
        assert_eq!(index.occurrence_count(), 4);
    }

    #[test]
    fn test_first_info_wins() {
        let index = ResourceIndex::build(
            vec![occurrence("C002", "a", 9)],
            vec![
                ResourceInfo {
                    resource_id: "C002".to_string(),
                    floor_label: "RDC".to_string(),
                },
                ResourceInfo {
                    resource_id: "C002".to_string(),
                    floor_label: "1er étage".to_string(),
                },
            ],
        );
        assert_eq!(index.floor_label("C002"), "RDC");
    }

    #[test]
    fn test_rooms_by_kind() {
        let index = ResourceIndex::build(
            vec![
                occurrence("TP103", "a", 9),
                occurrence("C002", "a", 9),
                occurrence("TD005", "a", 9),
                occurrence("TP101", "a", 9),
            ],
            vec![],
        );
        let groups = index.rooms_by_kind();
        assert_eq!(groups[&RoomKind::Tp], vec!["TP101", "TP103"]);
        assert_eq!(groups[&RoomKind::Lecture], vec!["C002"]);
        assert!(!groups.contains_key(&RoomKind::Other));
    }
}
