// 🏙️ Regional Aggregator - New York metro in/out comparison

use crate::county::{CountyNames, Direction};
use crate::loader::CountMap;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Counties shown in the New York metro bar chart.
///
/// `34029` (Ocean County, NJ) is listed twice and yields two rows. Whether the
/// second entry was meant to be another GEOID is unknown, so it stays as is.
pub const NY_METRO_CODES: [&str; 25] = [
    "36047", "36081", "36061", "36103", "36005", "36059", "36119", "34003", "34023", "36031",
    "34017", "34025", "34029", "34029", "34039", "34031", "34027", "36085", "36071", "36087",
    "36027", "34037", "34019", "36079", "42103",
];

#[derive(Debug, Error, PartialEq, Eq)]
pub enum RegionalError {
    #[error("no {} total for county {code}", .direction.label())]
    MissingAggregate { code: String, direction: Direction },
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RegionalRow {
    pub code: String,
    #[serde(rename = "County")]
    pub county: String,
    #[serde(rename = "In-Migration")]
    pub in_migration: u64,
    #[serde(rename = "Out-Migration")]
    pub out_migration: u64,
}

impl RegionalRow {
    pub fn net(&self) -> i64 {
        self.in_migration as i64 - self.out_migration as i64
    }
}

/// One row per listed code, in list order, duplicates included.
///
/// The totals must cover every code: a gap is an error rather than a zero.
pub fn regional_comparison(
    codes: &[&str],
    names: &CountyNames,
    in_totals: &CountMap,
    out_totals: &CountMap,
) -> Result<Vec<RegionalRow>, RegionalError> {
    codes
        .iter()
        .map(|code| {
            let total = |totals: &CountMap, direction| {
                totals
                    .get(*code)
                    .copied()
                    .ok_or_else(|| RegionalError::MissingAggregate {
                        code: code.to_string(),
                        direction,
                    })
            };

            Ok(RegionalRow {
                code: code.to_string(),
                county: names.label_or_unknown(code, code),
                in_migration: total(in_totals, Direction::In)?,
                out_migration: total(out_totals, Direction::Out)?,
            })
        })
        .collect()
}
