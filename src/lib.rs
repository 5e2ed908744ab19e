// US Migration Dashboard - Core Library
// Exposes all modules for use in the terminal UI, the web server, and tests

pub mod county;         // County codes, names, combined pair keys
pub mod config;         // TOML configuration
pub mod loader;         // Data Loader - reference and aggregate files
pub mod shaper;         // Table Shaper - labeled interaction tables
pub mod geo_mapper;     // Geo Mapper - gazetteer coordinates, map points
pub mod regional;       // Regional Aggregator - New York metro comparison
pub mod choropleth;     // Choropleth Builder - per-county destination map
pub mod summary;        // Summary cards - in / out / net
pub mod figures;        // 3D maps and the regional bar chart
pub mod cache;          // Memo cache with explicit invalidation
pub mod assistant;      // Question box - echo or chat completion
pub mod dashboard;      // Presentation layer - page model
pub mod html;           // Presentation layer - HTML page
pub mod logging;        // tracing subscriber setup

#[cfg(test)]
mod test_support;

// Re-export commonly used types
pub use county::{split_combined_code, CountyNames, Direction};
pub use config::{AssistantConfig, AssistantMode, ConfigError, DashboardConfig, DataConfig};
pub use loader::{load_feature_collection, CountMap, CountPairs, Dataset, MigrationData};
pub use shaper::{filter_by_origin, search, shape_table, InteractionRow};
pub use geo_mapper::{map_points, LocationTable, MapPoint};
pub use regional::{regional_comparison, RegionalError, RegionalRow, NY_METRO_CODES};
pub use choropleth::{build_choropleth, ChoroplethFigure, ChoroplethView, GeoCenter};
pub use summary::{format_thousands, CountySummary, SummaryCard};
pub use figures::{migration_map, regional_bar_chart, BarChartFigure, MapFigure};
pub use cache::{CacheKey, MemoCache};
pub use assistant::{answer_question, Assistant, AssistantContext, AssistantError, AssistantReply};
pub use dashboard::{CountyPanel, Dashboard, DashboardPage, PairDetail};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
