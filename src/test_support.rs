// Shared fixtures for module tests: a complete data directory on disk.

use crate::config::{DashboardConfig, DataConfig};
use crate::dashboard::Dashboard;
use crate::regional::NY_METRO_CODES;
use std::fs;
use std::ops::Deref;
use tempfile::TempDir;

pub const LOCATIONS_TSV: &str = "USPS\tGEOID\tANSICODE\tNAME\tALAND\tAWATER\tALAND_SQMI\tAWATER_SQMI\tINTPTLAT\tINTPTLONG                \n\
NY\t36061\t00974129\tNew York County\t58690498\t28541727\t22.661\t11.020\t40.776557\t-73.970174\n\
NY\t36047\t00974122\tKings County\t179676536\t71137389\t69.373\t27.466\t40.635133\t-73.950777\n\
CA\t6037\t00277283\tLos Angeles County\t10510651024\t1794730436\t4058.184\t692.951\t34.196398\t-118.261862\n";

/// Display names lose 10 trailing characters, so " County, NY" leaves a space.
pub const COUNTIES_GEOJSON: &str = r#"{
  "type": "FeatureCollection",
  "features": [
    {
      "type": "Feature",
      "properties": { "NAME": "New York " },
      "geometry": {
        "type": "Polygon",
        "coordinates": [[[-74.0, 40.7], [-73.9, 40.7], [-73.9, 40.9], [-74.0, 40.9], [-74.0, 40.7]]]
      }
    },
    {
      "type": "Feature",
      "properties": { "NAME": "Kings " },
      "geometry": {
        "type": "Polygon",
        "coordinates": [[[-74.05, 40.55], [-73.85, 40.55], [-73.85, 40.75], [-74.05, 40.75], [-74.05, 40.55]]]
      }
    }
  ]
}"#;

/// A written data directory; removed when dropped, so keep it alive while
/// the config is in use.
pub struct Fixture {
    pub config: DataConfig,
    _dir: TempDir,
}

/// Write every input file into a fresh temp directory and point a config at it.
pub fn write_fixture_dir() -> Fixture {
    let dir = tempfile::Builder::new()
        .prefix("migration-fixture-")
        .tempdir()
        .unwrap();

    let config = DataConfig {
        dir: dir.path().to_path_buf(),
        ..DataConfig::default()
    };

    let write = |file: &str, contents: &str| fs::write(config.path(file), contents).unwrap();

    write(
        &config.code_to_name,
        r#"{
            "36061": "New York County, NY",
            "36047": "Kings County, NY",
            "06037": "Los Angeles County, CA",
            "34029": "Ocean County, NJ"
        }"#,
    );
    write(
        &config.sorted_pairs,
        r#"[["3606136047", 1200], ["3606106037", 800], ["0603736061", 500], ["3604736061", 300]]"#,
    );
    write(
        &config.out_migration_sorted,
        r#"[["36061", 80000], ["06037", 70000], ["36047", 60000]]"#,
    );
    write(
        &config.in_migration_sorted,
        r#"[["36061", 100000], ["06037", 90000], ["36047", 50000]]"#,
    );
    write(
        &config.exemption_count,
        r#"{"3606136047": 1200, "3606106037": 800, "0603736061": 500, "3604736061": 300}"#,
    );

    let totals = |in_direction: bool| {
        let entries: Vec<String> = NY_METRO_CODES
            .iter()
            .enumerate()
            .filter(|(i, code)| !NY_METRO_CODES[..*i].contains(*code))
            .map(|(i, code)| {
                let value = match (*code, in_direction) {
                    ("36061", true) => 100_000,
                    ("36061", false) => 80_000,
                    (_, true) => 1_000 + i as u64,
                    (_, false) => 2_000 + i as u64,
                };
                format!("\"{}\": {}", code, value)
            })
            .collect();
        format!("{{{}}}", entries.join(", "))
    };
    write(&config.in_migration, &totals(true));
    write(&config.out_migration, &totals(false));

    write(&config.locations, LOCATIONS_TSV);
    write(&config.counties_geojson, COUNTIES_GEOJSON);

    Fixture { config, _dir: dir }
}

/// A dashboard loaded from a fixture directory that stays on disk as long
/// as the dashboard does (locations are read lazily).
pub struct FixtureDashboard {
    dashboard: Dashboard,
    _fixture: Fixture,
}

impl Deref for FixtureDashboard {
    type Target = Dashboard;

    fn deref(&self) -> &Dashboard {
        &self.dashboard
    }
}

/// Load a dashboard over fresh fixtures; `configure` adjusts the config and
/// may rewrite files in the data directory first.
pub fn fixture_dashboard(configure: impl FnOnce(&mut DashboardConfig)) -> FixtureDashboard {
    let fixture = write_fixture_dir();
    let mut config = DashboardConfig {
        data: fixture.config.clone(),
        ..DashboardConfig::default()
    };
    configure(&mut config);

    FixtureDashboard {
        dashboard: Dashboard::load(config).unwrap(),
        _fixture: fixture,
    }
}

#[test]
fn test_fixture_dir_is_removed_on_drop() {
    let fixture = write_fixture_dir();
    let dir = fixture.config.dir.clone();
    assert!(dir.join(&fixture.config.code_to_name).exists());

    drop(fixture);
    assert!(!dir.exists());
}
