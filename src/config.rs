// ⚙️ Dashboard Configuration - TOML file with built-in defaults
//
// Every field has a default so an empty (or missing) file yields the layout
// the dashboard ships with: a `data/` directory next to the binary.

use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// File picked up when no explicit config path is given
pub const DEFAULT_CONFIG_FILE: &str = "dashboard.toml";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config file {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse config file {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },

    #[error("assistant mode 'openai' requires assistant.api_key")]
    MissingApiKey,

    #[error("assistant temperature must be within 0.0..=2.0, got {0}")]
    InvalidTemperature(f64),
}

// ============================================================================
// SECTIONS
// ============================================================================

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct DashboardConfig {
    pub data: DataConfig,
    pub maps: MapConfig,
    pub server: ServerConfig,
    pub assistant: AssistantConfig,
}

/// Where the precomputed inputs live
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DataConfig {
    pub dir: PathBuf,
    pub code_to_name: String,
    pub sorted_pairs: String,
    pub out_migration_sorted: String,
    pub in_migration_sorted: String,
    pub exemption_count: String,
    pub out_migration: String,
    pub in_migration: String,
    /// Tab-separated county gazetteer (GEOID, INTPTLAT, INTPTLONG)
    pub locations: String,
    pub counties_geojson: String,
}

impl Default for DataConfig {
    fn default() -> Self {
        Self {
            dir: PathBuf::from("data"),
            code_to_name: "code_to_name.json".to_string(),
            sorted_pairs: "sorted_pairs_by_exemptions.json".to_string(),
            out_migration_sorted: "out_migration_sorted.json".to_string(),
            in_migration_sorted: "in_migration_sorted.json".to_string(),
            exemption_count: "exemption_count.json".to_string(),
            out_migration: "out_migration.json".to_string(),
            in_migration: "in_migration.json".to_string(),
            locations: "counties_national.txt".to_string(),
            counties_geojson: "counties.geojson".to_string(),
        }
    }
}

impl DataConfig {
    /// Resolve a file name against the data directory
    pub fn path(&self, file: &str) -> PathBuf {
        self.dir.join(file)
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct MapConfig {
    /// Keep only the first N (highest) counties on each 3D map; None = all
    pub point_limit: Option<usize>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub bind: String,
    /// URL the browser fetches county polygons from
    pub geojson_url: String,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind: "0.0.0.0:3000".to_string(),
            geojson_url: "/api/geojson".to_string(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AssistantMode {
    /// Echo the (context + question) text back
    #[default]
    Echo,
    /// Chat-completion call against an OpenAI-compatible endpoint
    OpenAi,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AssistantConfig {
    pub mode: AssistantMode,
    pub model: String,
    pub temperature: f64,
    pub endpoint: String,
    pub api_key: Option<String>,
    /// Prepended to the question in echo mode
    pub context_prompt: String,
    /// Head/tail rows of each table quoted in the system instruction
    pub excerpt_rows: usize,
    pub timeout_secs: u64,
}

impl Default for AssistantConfig {
    fn default() -> Self {
        Self {
            mode: AssistantMode::Echo,
            model: "gpt-4o-mini".to_string(),
            temperature: 0.7,
            endpoint: "https://api.openai.com/v1/chat/completions".to_string(),
            api_key: None,
            context_prompt: String::new(),
            excerpt_rows: 5,
            timeout_secs: 30,
        }
    }
}

// ============================================================================
// LOADING
// ============================================================================

impl DashboardConfig {
    /// Load from `path`, or from `dashboard.toml` when present, or defaults.
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        let path = match path {
            Some(path) => path.to_path_buf(),
            None => {
                let fallback = PathBuf::from(DEFAULT_CONFIG_FILE);
                if !fallback.exists() {
                    return Ok(Self::default());
                }
                fallback
            }
        };

        let text = fs::read_to_string(&path).map_err(|source| ConfigError::Read {
            path: path.clone(),
            source,
        })?;

        let config: Self =
            toml::from_str(&text).map_err(|source| ConfigError::Parse { path, source })?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.assistant.mode == AssistantMode::OpenAi
            && self.assistant.api_key.as_deref().map_or(true, str::is_empty)
        {
            return Err(ConfigError::MissingApiKey);
        }

        if !(0.0..=2.0).contains(&self.assistant.temperature) {
            return Err(ConfigError::InvalidTemperature(self.assistant.temperature));
        }

        Ok(())
    }
}
