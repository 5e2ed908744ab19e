// 🖥️ Dashboard - one full recomputation per interaction
//
// Loader → Shaper / Geo Mapper / Regional Aggregator → page model, with the
// Choropleth Builder run only for the selected county. Table shaping, the
// location table and the regional comparison go through the memo cache; map
// points and the choropleth are rebuilt on every render.

use crate::assistant::{answer_question, build_assistant, Assistant, AssistantContext, AssistantReply};
use crate::cache::{CacheKey, MemoCache};
use crate::choropleth::{build_choropleth, ChoroplethFigure};
use crate::config::DashboardConfig;
use crate::county::{split_combined_code, Direction};
use crate::figures::{migration_map, regional_bar_chart, BarChartFigure, MapFigure};
use crate::geo_mapper::{map_points, LocationTable};
use crate::loader::{load_feature_collection, CountMap, Dataset, MigrationData};
use crate::regional::{regional_comparison, RegionalRow, NY_METRO_CODES};
use crate::shaper::{filter_by_origin, max_count, shape_table, InteractionRow};
use crate::summary::{CountySummary, SummaryCard};
use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use geojson::FeatureCollection;
use serde::Serialize;
use std::sync::Arc;
use std::time::Instant;
use tracing::info;
use uuid::Uuid;

pub const PAGE_TITLE: &str = "2003-2004 US Migration Patterns";
pub const HEADING: &str = "US Migration Patterns in 2003-2004";

/// Preselected when present in the name table
pub const DEFAULT_COUNTY: &str = "New York County, NY";

// ============================================================================
// PAGE MODEL
// ============================================================================

#[derive(Debug, Clone, Serialize)]
pub struct CountySelector {
    pub options: Vec<String>,
    pub selected_index: Option<usize>,
}

impl CountySelector {
    pub fn selected(&self) -> Option<&str> {
        self.selected_index
            .and_then(|idx| self.options.get(idx))
            .map(String::as_str)
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct DestinationRow {
    pub name: String,
    pub count: u64,
    /// count / largest count among this county's destinations
    pub share: f64,
}

#[derive(Debug, Clone, Serialize)]
pub struct CountyPanel {
    pub name: String,
    pub code: String,
    pub summary: CountySummary,
    pub cards: Vec<SummaryCard>,
    pub destinations: Vec<DestinationRow>,
    pub destinations_max: u64,
    pub choropleth: ChoroplethFigure,
}

#[derive(Debug, Clone, Serialize)]
pub struct MapPanel {
    pub figure: MapFigure,
    /// Per-county totals shown under the map
    pub table: Arc<Vec<InteractionRow>>,
}

#[derive(Debug, Clone, Serialize)]
pub struct DashboardPage {
    pub render_id: Uuid,
    pub generated_at: DateTime<Utc>,
    pub title: &'static str,
    pub interactions: Arc<Vec<InteractionRow>>,
    pub out_map: MapPanel,
    pub in_map: MapPanel,
    pub regional: Arc<Vec<RegionalRow>>,
    pub bar_chart: BarChartFigure,
    pub selector: CountySelector,
    pub county: Option<CountyPanel>,
}

#[derive(Debug, Clone, Serialize)]
pub struct PairDetail {
    pub origin: String,
    pub destination: String,
    pub origin_name: String,
    pub destination_name: String,
    pub count: Option<u64>,
}

// ============================================================================
// DASHBOARD
// ============================================================================

pub struct Dashboard {
    config: DashboardConfig,
    data: MigrationData,
    counties: FeatureCollection,
    assistant: Box<dyn Assistant>,
    cache: MemoCache,
}

impl Dashboard {
    /// Read every input named by the config; any failure aborts.
    pub fn load(config: DashboardConfig) -> Result<Self> {
        let data = MigrationData::load(&config.data)?;
        let counties =
            load_feature_collection(&config.data.path(&config.data.counties_geojson))?;
        let assistant = build_assistant(&config.assistant);

        Ok(Self::new(config, data, counties, assistant))
    }

    pub fn new(
        config: DashboardConfig,
        data: MigrationData,
        counties: FeatureCollection,
        assistant: Box<dyn Assistant>,
    ) -> Self {
        Self {
            config,
            data,
            counties,
            assistant,
            cache: MemoCache::new(),
        }
    }

    pub fn config(&self) -> &DashboardConfig {
        &self.config
    }

    pub fn data(&self) -> &MigrationData {
        &self.data
    }

    pub fn counties(&self) -> &FeatureCollection {
        &self.counties
    }

    pub fn cache(&self) -> &MemoCache {
        &self.cache
    }

    /// Labeled table for one of the pre-sorted lists (memoized)
    pub fn table(&self, dataset: Dataset) -> Result<Arc<Vec<InteractionRow>>> {
        let key = CacheKey::new("shape_table", &(dataset, &self.data.fingerprint))?;
        self.cache.get_or_try_insert_with(key, || {
            Ok::<_, anyhow::Error>(shape_table(self.data.pairs(dataset), &self.data.names))
        })
    }

    /// Gazetteer coordinates (memoized by file path)
    pub fn locations(&self) -> Result<Arc<LocationTable>> {
        let path = self.config.data.path(&self.config.data.locations);
        let key = CacheKey::new("location_table", &path)?;
        self.cache
            .get_or_try_insert_with(key, || LocationTable::from_path(&path))
    }

    /// New York metro comparison (memoized); fails if any listed code lacks a total
    pub fn regional(&self) -> Result<Arc<Vec<RegionalRow>>> {
        let key = CacheKey::new("regional_comparison", &(&NY_METRO_CODES, &self.data.fingerprint))?;
        let rows = self.cache.get_or_try_insert_with(key, || {
            regional_comparison(
                &NY_METRO_CODES,
                &self.data.names,
                &self.data.in_totals,
                &self.data.out_totals,
            )
        })?;
        Ok(rows)
    }

    /// 3D map for one direction, rebuilt on every call
    pub fn map(&self, direction: Direction) -> Result<MapFigure> {
        let dataset = match direction {
            Direction::Out => Dataset::OutMigration,
            Direction::In => Dataset::InMigration,
        };

        let pairs = self.data.pairs(dataset);
        let limit = self.config.maps.point_limit.unwrap_or(pairs.len()).min(pairs.len());
        let locations = self.locations()?;

        let points = map_points(&pairs[..limit], &self.data.names, &locations);
        Ok(migration_map(direction, points))
    }

    /// Requested county if it is an option, else the default county, else the first option
    pub fn selector(&self, requested: Option<&str>) -> CountySelector {
        let options: Vec<String> = self
            .data
            .names
            .options()
            .into_iter()
            .map(str::to_string)
            .collect();

        let position = |name: &str| options.iter().position(|option| option == name);

        let selected_index = requested
            .and_then(|name| position(name))
            .or_else(|| position(DEFAULT_COUNTY))
            .or(if options.is_empty() { None } else { Some(0) });

        CountySelector {
            options,
            selected_index,
        }
    }

    /// Cards, destinations and choropleth for one county; None if the name is not an option
    pub fn county_panel(&self, name: &str) -> Result<Option<CountyPanel>> {
        let code = match self.data.names.code_of(name) {
            Some(code) => code.to_string(),
            None => return Ok(None),
        };

        let out_totals: CountMap = self.data.out_sorted.iter().cloned().collect();
        let in_totals: CountMap = self.data.in_sorted.iter().cloned().collect();
        let summary = CountySummary::lookup(&code, &in_totals, &out_totals);

        let interactions = self.table(Dataset::Interactions)?;
        let filtered = filter_by_origin(&interactions, name);
        let destinations_max = max_count(&filtered);

        let destinations = filtered
            .iter()
            .map(|row| DestinationRow {
                name: row.name2.clone(),
                count: row.count,
                share: if destinations_max == 0 {
                    0.0
                } else {
                    row.count as f64 / destinations_max as f64
                },
            })
            .collect();

        let choropleth = build_choropleth(
            &filtered,
            name,
            &self.counties,
            &self.config.server.geojson_url,
        );

        Ok(Some(CountyPanel {
            name: name.to_string(),
            code,
            cards: summary.cards().to_vec(),
            summary,
            destinations,
            destinations_max,
            choropleth,
        }))
    }

    /// The whole page, top to bottom
    pub fn render(&self, requested: Option<&str>) -> Result<DashboardPage> {
        let started = Instant::now();
        let render_id = Uuid::new_v4();

        let interactions = self.table(Dataset::Interactions)?;
        let out_map = MapPanel {
            figure: self.map(Direction::Out)?,
            table: self.table(Dataset::OutMigration)?,
        };
        let in_map = MapPanel {
            figure: self.map(Direction::In)?,
            table: self.table(Dataset::InMigration)?,
        };

        let regional = self
            .regional()
            .context("Failed to build the New York metro comparison")?;
        let bar_chart = regional_bar_chart(&regional);

        let selector = self.selector(requested);
        let county = match selector.selected() {
            Some(name) => self.county_panel(name)?,
            None => None,
        };

        info!(
            %render_id,
            county = selector.selected().unwrap_or("-"),
            out_points = out_map.figure.data.len(),
            in_points = in_map.figure.data.len(),
            elapsed_ms = started.elapsed().as_millis() as u64,
            "Rendered dashboard"
        );

        Ok(DashboardPage {
            render_id,
            generated_at: Utc::now(),
            title: HEADING,
            interactions,
            out_map,
            in_map,
            regional,
            bar_chart,
            selector,
            county,
        })
    }

    /// Exemptions for one origin → destination pair, with both names resolved
    pub fn pair(&self, origin: &str, destination: &str) -> PairDetail {
        let key = format!("{}{}", origin, destination);
        let (origin_code, destination_code) = split_combined_code(&key);

        PairDetail {
            origin: origin.to_string(),
            destination: destination.to_string(),
            origin_name: self.data.names.label_or_unknown(origin_code, &key),
            destination_name: self.data.names.label_or_unknown(destination_code, &key),
            count: self.data.pair_count(origin, destination),
        }
    }

    /// Runs the configured assistant synchronously; call off any async runtime.
    pub fn ask(&self, question: &str) -> Result<AssistantReply> {
        let in_rows = self.table(Dataset::InMigration)?;
        let out_rows = self.table(Dataset::OutMigration)?;
        let context =
            AssistantContext::from_tables(&in_rows, &out_rows, self.config.assistant.excerpt_rows);

        Ok(answer_question(self.assistant.as_ref(), question, &context))
    }
}
