// 📍 Geo Mapper - county totals joined against gazetteer coordinates

use crate::county::{CountyNames, COUNTY_CODE_LEN};
use anyhow::{anyhow, Context, Result};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::io::Read;
use std::path::Path;
use tracing::{debug, info};

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Location {
    pub lat: f64,
    pub long: f64,
}

/// A point on the 3D maps
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MapPoint {
    #[serde(rename = "ID")]
    pub id: String,
    pub name: String,
    pub lat: f64,
    pub long: f64,
    pub migration: u64,
}

/// Left-pad a GEOID to 5 digits; the gazetteer stores "6037" for "06037".
pub fn pad_geoid(raw: &str) -> String {
    format!("{:0>width$}", raw.trim(), width = COUNTY_CODE_LEN)
}

// ============================================================================
// LOCATION TABLE
// ============================================================================

/// GEOID → internal point, read from the tab-separated county gazetteer
#[derive(Debug, Clone, Default)]
pub struct LocationTable {
    by_code: HashMap<String, Location>,
}

impl LocationTable {
    pub fn from_path(path: &Path) -> Result<Self> {
        let file = std::fs::File::open(path)
            .with_context(|| format!("Failed to open location table {}", path.display()))?;
        let table = Self::from_reader(file)
            .with_context(|| format!("Failed to parse location table {}", path.display()))?;

        info!(counties = table.len(), "Loaded county locations from {}", path.display());
        Ok(table)
    }

    /// Needs `GEOID` and `INTPTLAT` headers; longitude is the last column
    /// (its header carries trailing padding in the published files).
    pub fn from_reader<R: Read>(reader: R) -> Result<Self> {
        let mut rdr = csv::ReaderBuilder::new()
            .delimiter(b'\t')
            .trim(csv::Trim::All)
            .flexible(true)
            .from_reader(reader);

        let headers = rdr.headers().context("Missing header row")?.clone();
        let geoid_idx = column_index(&headers, "GEOID")?;
        let lat_idx = column_index(&headers, "INTPTLAT")?;
        let long_idx = headers
            .len()
            .checked_sub(1)
            .ok_or_else(|| anyhow!("Location table has no columns"))?;

        let mut by_code = HashMap::new();
        for (line, record) in rdr.records().enumerate() {
            let record = record.with_context(|| format!("Bad record at data line {}", line + 1))?;

            let field = |idx: usize| -> Result<&str> {
                record
                    .get(idx)
                    .ok_or_else(|| anyhow!("Data line {} has only {} fields", line + 1, record.len()))
            };

            let code = pad_geoid(field(geoid_idx)?);
            let lat: f64 = field(lat_idx)?
                .parse()
                .with_context(|| format!("Bad latitude for {}", code))?;
            let long: f64 = field(long_idx)?
                .parse()
                .with_context(|| format!("Bad longitude for {}", code))?;

            by_code.insert(code, Location { lat, long });
        }

        Ok(Self { by_code })
    }

    pub fn lookup(&self, code: &str) -> Option<Location> {
        self.by_code.get(code).copied()
    }

    pub fn contains(&self, code: &str) -> bool {
        self.by_code.contains_key(code)
    }

    pub fn len(&self) -> usize {
        self.by_code.len()
    }

    pub fn is_empty(&self) -> bool {
        self.by_code.is_empty()
    }
}

impl FromIterator<(String, Location)> for LocationTable {
    fn from_iter<I: IntoIterator<Item = (String, Location)>>(iter: I) -> Self {
        Self {
            by_code: iter.into_iter().collect(),
        }
    }
}

fn column_index(headers: &csv::StringRecord, name: &str) -> Result<usize> {
    headers
        .iter()
        .position(|h| h == name)
        .ok_or_else(|| anyhow!("Location table is missing the {} column", name))
}

// ============================================================================
// JOIN
// ============================================================================

/// One point per input pair with a known location, in input order.
///
/// Pairs without a location are dropped. Output never outgrows the input.
pub fn map_points(
    pairs: &[(String, u64)],
    names: &CountyNames,
    locations: &LocationTable,
) -> Vec<MapPoint> {
    let points: Vec<MapPoint> = pairs
        .iter()
        .filter_map(|(code, migration)| {
            let location = locations.lookup(code)?;
            Some(MapPoint {
                id: code.clone(),
                name: names.label_or_unknown(code, code),
                lat: location.lat,
                long: location.long,
                migration: *migration,
            })
        })
        .collect();

    if points.len() < pairs.len() {
        debug!(
            dropped = pairs.len() - points.len(),
            "Counties without a location were left off the map"
        );
    }

    points
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::LOCATIONS_TSV;

    fn names() -> CountyNames {
        CountyNames::from_pairs(vec![
            ("36061", "New York County, NY"),
            ("06037", "Los Angeles County, CA"),
        ])
    }

    #[test]
    fn test_pad_geoid() {
        assert_eq!(pad_geoid("6037"), "06037");
        assert_eq!(pad_geoid("36061"), "36061");
        assert_eq!(pad_geoid(" 1001 "), "01001");
    }

    #[test]
    fn test_parse_gazetteer() {
        let table = LocationTable::from_reader(LOCATIONS_TSV.as_bytes()).unwrap();

        assert_eq!(table.len(), 3);
        let la = table.lookup("06037").unwrap();
        assert_eq!(la.lat, 34.196398);
        assert_eq!(la.long, -118.261862);
        assert!(table.lookup("6037").is_none());
        assert!(table.lookup("99999").is_none());
    }

    #[test]
    fn test_missing_geoid_column() {
        let tsv = "USPS\tNAME\tINTPTLAT\tINTPTLONG\nNY\tX\t1.0\t2.0\n";
        let err = LocationTable::from_reader(tsv.as_bytes()).unwrap_err();

        assert!(err.to_string().contains("GEOID"));
    }

    #[test]
    fn test_bad_latitude_is_an_error() {
        let tsv = "GEOID\tINTPTLAT\tINTPTLONG\n36061\tnorth\t-73.9\n";
        assert!(LocationTable::from_reader(tsv.as_bytes()).is_err());
    }

    #[test]
    fn test_map_points_drops_unlocated_counties() {
        let table = LocationTable::from_reader(LOCATIONS_TSV.as_bytes()).unwrap();
        let pairs = vec![
            ("36061".to_string(), 80_000),
            ("99999".to_string(), 75_000),
            ("06037".to_string(), 70_000),
        ];

        let points = map_points(&pairs, &names(), &table);

        assert!(points.len() <= pairs.len());
        assert_eq!(points.len(), 2);
        assert!(points.iter().all(|p| table.contains(&p.id)));
        assert_eq!(points[0].name, "New York County, NY");
        assert_eq!(points[0].migration, 80_000);
        assert_eq!(points[1].id, "06037");
    }

    #[test]
    fn test_located_county_without_name_gets_placeholder() {
        let table: LocationTable = vec![(
            "36047".to_string(),
            Location { lat: 40.6, long: -73.9 },
        )]
        .into_iter()
        .collect();

        let points = map_points(&[("36047".to_string(), 10)], &names(), &table);
        assert_eq!(points[0].name, "Unknown (36047)");
    }

    #[test]
    fn test_empty_input() {
        let table = LocationTable::default();
        assert!(map_points(&[], &names(), &table).is_empty());
    }
}
