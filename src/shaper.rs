// 📋 Table Shaper - labeled tables from (combined-code, count) pairs

use crate::county::{split_combined_code, CountyNames};
use serde::{Deserialize, Serialize};

/// One displayable row: origin name, destination name, count, raw key.
///
/// For per-county totals the key is a single 5-digit code, so `name2` is
/// always a placeholder and the presentation hides that column.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InteractionRow {
    #[serde(rename = "County_Name1")]
    pub name1: String,

    #[serde(rename = "County_Name2")]
    pub name2: String,

    #[serde(rename = "Migration_Count")]
    pub count: u64,

    #[serde(rename = "County_Code")]
    pub code: String,
}

/// Join pairs against the name table, keeping input order.
///
/// Input is expected pre-sorted (descending by count); nothing is re-sorted
/// here. Unknown codes become `Unknown (<key>)`, never an error.
pub fn shape_table(pairs: &[(String, u64)], names: &CountyNames) -> Vec<InteractionRow> {
    pairs
        .iter()
        .map(|(key, count)| {
            let (origin, destination) = split_combined_code(key);
            InteractionRow {
                name1: names.label_or_unknown(origin, key),
                name2: names.label_or_unknown(destination, key),
                count: *count,
                code: key.clone(),
            }
        })
        .collect()
}

/// Rows whose origin is the selected county
pub fn filter_by_origin(rows: &[InteractionRow], origin_name: &str) -> Vec<InteractionRow> {
    rows.iter()
        .filter(|row| row.name1 == origin_name)
        .cloned()
        .collect()
}

/// Case-insensitive substring search over both names (the table's search box)
pub fn search(rows: &[InteractionRow], query: &str) -> Vec<InteractionRow> {
    let needle = query.trim().to_lowercase();
    if needle.is_empty() {
        return rows.to_vec();
    }

    rows.iter()
        .filter(|row| {
            row.name1.to_lowercase().contains(&needle) || row.name2.to_lowercase().contains(&needle)
        })
        .cloned()
        .collect()
}

/// Largest count in a table; scales the destination progress bars
pub fn max_count(rows: &[InteractionRow]) -> u64 {
    rows.iter().map(|row| row.count).max().unwrap_or(0)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn names() -> CountyNames {
        CountyNames::from_pairs(vec![
            ("36061", "New York County, NY"),
            ("36047", "Kings County, NY"),
        ])
    }

    fn pairs() -> Vec<(String, u64)> {
        vec![
            ("3606136047".to_string(), 1200),
            ("3606199999".to_string(), 700),
            ("3604736061".to_string(), 300),
        ]
    }

    #[test]
    fn test_shape_table_labels_both_halves() {
        let rows = shape_table(&pairs(), &names());

        assert_eq!(rows.len(), 3);
        assert_eq!(rows[0].name1, "New York County, NY");
        assert_eq!(rows[0].name2, "Kings County, NY");
        assert_eq!(rows[0].count, 1200);
        assert_eq!(rows[0].code, "3606136047");
    }

    #[test]
    fn test_shape_table_keeps_input_order() {
        let rows = shape_table(&pairs(), &names());
        let counts: Vec<u64> = rows.iter().map(|r| r.count).collect();

        assert_eq!(counts, vec![1200, 700, 300]);
    }

    #[test]
    fn test_unknown_destination_degrades_to_placeholder() {
        let rows = shape_table(&pairs(), &names());

        assert_eq!(rows[1].name1, "New York County, NY");
        assert_eq!(rows[1].name2, "Unknown (3606199999)");
    }

    #[test]
    fn test_single_code_rows_have_placeholder_destination() {
        let totals = vec![("36061".to_string(), 80_000)];
        let rows = shape_table(&totals, &names());

        assert_eq!(rows[0].name1, "New York County, NY");
        assert_eq!(rows[0].name2, "Unknown (36061)");
    }

    #[test]
    fn test_filter_by_origin() {
        let rows = shape_table(&pairs(), &names());
        let filtered = filter_by_origin(&rows, "New York County, NY");

        assert_eq!(filtered.len(), 2);
        assert!(filtered.iter().all(|r| r.name1 == "New York County, NY"));
        assert!(filter_by_origin(&rows, "Nowhere, ZZ").is_empty());
    }

    #[test]
    fn test_search_matches_either_name() {
        let rows = shape_table(&pairs(), &names());

        assert_eq!(search(&rows, "kings").len(), 2);
        assert_eq!(search(&rows, "  ").len(), 3);
        assert!(search(&rows, "orange").is_empty());
    }

    #[test]
    fn test_max_count() {
        let rows = shape_table(&pairs(), &names());

        assert_eq!(max_count(&rows), 1200);
        assert_eq!(max_count(&[]), 0);
    }

    #[test]
    fn test_serialized_column_names() {
        let rows = shape_table(&pairs()[..1], &names());
        let json = serde_json::to_value(&rows[0]).unwrap();

        assert_eq!(json["County_Name1"], "New York County, NY");
        assert_eq!(json["Migration_Count"], 1200);
    }
}
