// 📂 Data Loader - precomputed migration aggregates from disk
//
// Everything is read once, synchronously, and never written back. A failure
// here aborts startup: the dashboard has nothing to show without its inputs.

use crate::config::DataConfig;
use crate::county::CountyNames;
use anyhow::{Context, Result};
use geojson::{FeatureCollection, GeoJson};
use serde::de::DeserializeOwned;
use sha2::{Digest, Sha256};
use std::collections::HashMap;
use std::fs;
use std::path::Path;
use tracing::info;

/// (key, count) pairs, pre-sorted descending by count upstream
pub type CountPairs = Vec<(String, u64)>;

/// Key → count lookup
pub type CountMap = HashMap<String, u64>;

/// Which pre-sorted list a table or map was built from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Dataset {
    Interactions,
    OutMigration,
    InMigration,
}

impl Dataset {
    pub fn label(&self) -> &'static str {
        match self {
            Dataset::Interactions => "County interactions",
            Dataset::OutMigration => "Out-Migration",
            Dataset::InMigration => "In-Migration",
        }
    }
}

// ============================================================================
// LOADED DATA
// ============================================================================

#[derive(Debug, Clone)]
pub struct MigrationData {
    pub names: CountyNames,
    /// Combined origin+destination key → exemptions, sorted descending
    pub interactions: CountPairs,
    pub out_sorted: CountPairs,
    pub in_sorted: CountPairs,
    /// Raw combined-key → exemptions map
    pub exemption_counts: CountMap,
    /// Per-county totals used by the regional comparison
    pub out_totals: CountMap,
    pub in_totals: CountMap,
    /// SHA-256 over every input file, identifies this load in cache keys
    pub fingerprint: String,
}

impl MigrationData {
    pub fn load(config: &DataConfig) -> Result<Self> {
        let mut hasher = Sha256::new();

        let names = load_code_to_name(&config.path(&config.code_to_name), &mut hasher)?;
        let interactions = read_json(&config.path(&config.sorted_pairs), &mut hasher)?;
        let out_sorted = read_json(&config.path(&config.out_migration_sorted), &mut hasher)?;
        let in_sorted = read_json(&config.path(&config.in_migration_sorted), &mut hasher)?;
        let exemption_counts = read_json(&config.path(&config.exemption_count), &mut hasher)?;
        let out_totals = read_json(&config.path(&config.out_migration), &mut hasher)?;
        let in_totals = read_json(&config.path(&config.in_migration), &mut hasher)?;

        let data = Self {
            names,
            interactions,
            out_sorted,
            in_sorted,
            exemption_counts,
            out_totals,
            in_totals,
            fingerprint: format!("{:x}", hasher.finalize()),
        };

        info!(
            counties = data.names.len(),
            pairs = data.interactions.len(),
            out_counties = data.out_sorted.len(),
            in_counties = data.in_sorted.len(),
            "Loaded migration data from {}",
            config.dir.display()
        );

        Ok(data)
    }

    pub fn pairs(&self, dataset: Dataset) -> &[(String, u64)] {
        match dataset {
            Dataset::Interactions => &self.interactions,
            Dataset::OutMigration => &self.out_sorted,
            Dataset::InMigration => &self.in_sorted,
        }
    }

    /// Raw exemptions recorded for one origin → destination pair
    pub fn pair_count(&self, origin: &str, destination: &str) -> Option<u64> {
        self.exemption_counts
            .get(&format!("{}{}", origin, destination))
            .copied()
    }
}

// ============================================================================
// FILE READERS
// ============================================================================

fn read_json<T: DeserializeOwned>(path: &Path, hasher: &mut Sha256) -> Result<T> {
    let bytes = fs::read(path).with_context(|| format!("Failed to read {}", path.display()))?;
    hasher.update(&bytes);
    serde_json::from_slice(&bytes)
        .with_context(|| format!("Failed to deserialize {}", path.display()))
}

/// The name table is a JSON object; its key order is the selector order.
fn load_code_to_name(path: &Path, hasher: &mut Sha256) -> Result<CountyNames> {
    let raw: serde_json::Map<String, serde_json::Value> = read_json(path, hasher)?;

    let mut names = CountyNames::new();
    for (code, value) in raw {
        let name = value
            .as_str()
            .with_context(|| format!("County name for {} is not a string", code))?;
        names.insert(code, name.to_string());
    }

    Ok(names)
}

/// County polygons keyed by their `NAME` property
pub fn load_feature_collection(path: &Path) -> Result<FeatureCollection> {
    let text = fs::read_to_string(path)
        .with_context(|| format!("Failed to read {}", path.display()))?;
    let geojson: GeoJson = text
        .parse()
        .with_context(|| format!("Failed to parse GeoJSON {}", path.display()))?;

    let collection = FeatureCollection::try_from(geojson)
        .with_context(|| format!("{} is not a FeatureCollection", path.display()))?;

    info!(features = collection.features.len(), "Loaded county polygons");
    Ok(collection)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::write_fixture_dir;

    #[test]
    fn test_dataset_labels() {
        assert_eq!(Dataset::Interactions.label(), "County interactions");
        assert_eq!(Dataset::OutMigration.label(), "Out-Migration");
        assert_eq!(Dataset::InMigration.label(), "In-Migration");
    }

    #[test]
    fn test_load_fixture_dir() {
        let fixture = write_fixture_dir();
        let config = &fixture.config;
        let data = MigrationData::load(config).unwrap();

        assert_eq!(data.names.get("36061"), Some("New York County, NY"));
        assert_eq!(data.names.options()[0], "New York County, NY");
        assert_eq!(data.interactions[0], ("3606136047".to_string(), 1200));
        assert_eq!(data.out_sorted.len(), 3);
        assert_eq!(data.in_totals.get("36061"), Some(&100_000));
        assert_eq!(data.fingerprint.len(), 64);
    }

    #[test]
    fn test_pair_count_lookup() {
        let fixture = write_fixture_dir();
        let config = &fixture.config;
        let data = MigrationData::load(config).unwrap();

        assert_eq!(data.pair_count("36061", "36047"), Some(1200));
        assert_eq!(data.pair_count("36047", "99999"), None);
    }

    #[test]
    fn test_fingerprint_is_stable_across_loads() {
        let fixture = write_fixture_dir();
        let config = &fixture.config;
        let first = MigrationData::load(config).unwrap();
        let second = MigrationData::load(config).unwrap();

        assert_eq!(first.fingerprint, second.fingerprint);
    }

    #[test]
    fn test_missing_file_names_the_path() {
        let fixture = write_fixture_dir();
        let mut config = fixture.config.clone();
        config.in_migration = "missing.json".to_string();

        let err = MigrationData::load(&config).unwrap_err();
        assert!(format!("{:#}", err).contains("missing.json"));
    }

    #[test]
    fn test_non_string_name_is_rejected() {
        let fixture = write_fixture_dir();
        let config = &fixture.config;
        fs::write(config.path(&config.code_to_name), r#"{"36061": 5}"#).unwrap();

        assert!(MigrationData::load(config).is_err());
    }

    #[test]
    fn test_load_feature_collection() {
        let fixture = write_fixture_dir();
        let config = &fixture.config;
        let collection = load_feature_collection(&config.path(&config.counties_geojson)).unwrap();

        assert_eq!(collection.features.len(), 2);
    }
}
