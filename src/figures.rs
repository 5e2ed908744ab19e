// 📈 Figure Specs - 3D migration maps and the regional bar chart
//
// Plain serializable descriptions; the web page hands them to deck.gl and
// Plotly, the terminal UI reads the same numbers directly.

use crate::county::Direction;
use crate::geo_mapper::MapPoint;
use crate::regional::RegionalRow;
use serde::Serialize;
use serde_json::{json, Value};

/// Column width in meters
pub const COLUMN_RADIUS: f64 = 5000.0;

/// Scatter point radius is magnitude divided by this
pub const SCATTER_RADIUS_DIVISOR: f64 = 5000.0;

pub const IN_BAR_COLOR: &str = "#8fbc8f";
pub const OUT_BAR_COLOR: &str = "#FF7276";

pub fn direction_rgb(direction: Direction) -> [u8; 3] {
    match direction {
        Direction::Out => [255, 0, 0],
        Direction::In => [0, 255, 0],
    }
}

// ============================================================================
// 3D MAP
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct ViewState {
    pub latitude: f64,
    pub longitude: f64,
    pub zoom: f64,
    pub pitch: f64,
}

impl Default for ViewState {
    /// Continental US, tilted
    fn default() -> Self {
        Self {
            latitude: 38.0,
            longitude: -103.0,
            zoom: 4.0,
            pitch: 50.0,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type")]
pub enum DeckLayer {
    /// Tower per county, height = migration
    ColumnLayer {
        radius: f64,
        elevation_scale: f64,
        coverage: f64,
        fill_color: [u8; 3],
        pickable: bool,
        auto_highlight: bool,
    },
    /// Dot per county, radius = migration / divisor
    ScatterplotLayer {
        radius_divisor: f64,
        color: [u8; 3],
        pickable: bool,
    },
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MapFigure {
    pub title: String,
    pub direction: Direction,
    pub initial_view_state: ViewState,
    pub layers: Vec<DeckLayer>,
    pub data: Vec<MapPoint>,
}

pub fn migration_map(direction: Direction, points: Vec<MapPoint>) -> MapFigure {
    let color = direction_rgb(direction);
    let title = match direction {
        Direction::Out => "Top Counties by Out-Migration",
        Direction::In => "Top Counties by In-Migration",
    };

    MapFigure {
        title: title.to_string(),
        direction,
        initial_view_state: ViewState::default(),
        layers: vec![
            DeckLayer::ColumnLayer {
                radius: COLUMN_RADIUS,
                elevation_scale: 1.0,
                coverage: 1.0,
                fill_color: color,
                pickable: true,
                auto_highlight: true,
            },
            DeckLayer::ScatterplotLayer {
                radius_divisor: SCATTER_RADIUS_DIVISOR,
                color,
                pickable: true,
            },
        ],
        data: points,
    }
}

impl MapFigure {
    pub fn max_migration(&self) -> u64 {
        self.data.iter().map(|p| p.migration).max().unwrap_or(0)
    }
}

// ============================================================================
// BAR CHART
// ============================================================================

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BarSeries {
    pub name: &'static str,
    pub color: &'static str,
    pub values: Vec<u64>,
}

/// Horizontal grouped bars, one category per county row
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BarChartFigure {
    pub title: String,
    pub categories: Vec<String>,
    pub series: Vec<BarSeries>,
}

pub fn regional_bar_chart(rows: &[RegionalRow]) -> BarChartFigure {
    BarChartFigure {
        title: "Net Migration to the New York metropolitan area counties".to_string(),
        categories: rows.iter().map(|row| row.county.clone()).collect(),
        series: vec![
            BarSeries {
                name: Direction::In.label(),
                color: IN_BAR_COLOR,
                values: rows.iter().map(|row| row.in_migration).collect(),
            },
            BarSeries {
                name: Direction::Out.label(),
                color: OUT_BAR_COLOR,
                values: rows.iter().map(|row| row.out_migration).collect(),
            },
        ],
    }
}

impl BarChartFigure {
    pub fn to_plotly(&self) -> Value {
        let traces: Vec<Value> = self
            .series
            .iter()
            .map(|series| {
                json!({
                    "type": "bar",
                    "orientation": "h",
                    "name": series.name,
                    "y": self.categories,
                    "x": series.values,
                    "marker": { "color": series.color },
                })
            })
            .collect();

        json!({
            "data": traces,
            "layout": {
                "barmode": "group",
                "yaxis": { "title": { "text": "County" }, "automargin": true },
                "height": 40 + 28 * self.categories.len().max(1),
                "margin": { "t": 10 },
            },
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn point(id: &str, migration: u64) -> MapPoint {
        MapPoint {
            id: id.to_string(),
            name: format!("County {}", id),
            lat: 40.0,
            long: -74.0,
            migration,
        }
    }

    #[test]
    fn test_map_colors_follow_direction() {
        let out = migration_map(Direction::Out, vec![point("36061", 80_000)]);
        let inbound = migration_map(Direction::In, vec![point("36061", 100_000)]);

        match &out.layers[0] {
            DeckLayer::ColumnLayer { fill_color, radius, .. } => {
                assert_eq!(*fill_color, [255, 0, 0]);
                assert_eq!(*radius, 5000.0);
            }
            other => panic!("unexpected first layer {:?}", other),
        }
        match &inbound.layers[1] {
            DeckLayer::ScatterplotLayer { color, radius_divisor, .. } => {
                assert_eq!(*color, [0, 255, 0]);
                assert_eq!(*radius_divisor, 5000.0);
            }
            other => panic!("unexpected second layer {:?}", other),
        }
        assert_eq!(inbound.title, "Top Counties by In-Migration");
    }

    #[test]
    fn test_default_view_state() {
        let figure = migration_map(Direction::Out, vec![]);

        assert_eq!(figure.initial_view_state.latitude, 38.0);
        assert_eq!(figure.initial_view_state.longitude, -103.0);
        assert_eq!(figure.initial_view_state.pitch, 50.0);
        assert_eq!(figure.max_migration(), 0);
    }

    #[test]
    fn test_layer_serializes_with_type_tag() {
        let figure = migration_map(Direction::Out, vec![point("36061", 1)]);
        let json = serde_json::to_value(&figure).unwrap();

        assert_eq!(json["layers"][0]["type"], "ColumnLayer");
        assert_eq!(json["layers"][1]["type"], "ScatterplotLayer");
        assert_eq!(json["data"][0]["ID"], "36061");
        assert_eq!(json["direction"], "out");
    }

    #[test]
    fn test_regional_bar_chart() {
        let rows = vec![
            RegionalRow {
                code: "36061".to_string(),
                county: "New York County, NY".to_string(),
                in_migration: 100_000,
                out_migration: 80_000,
            },
            RegionalRow {
                code: "36047".to_string(),
                county: "Kings County, NY".to_string(),
                in_migration: 50_000,
                out_migration: 60_000,
            },
        ];
        let chart = regional_bar_chart(&rows);

        assert_eq!(chart.categories, vec!["New York County, NY", "Kings County, NY"]);
        assert_eq!(chart.series[0].name, "In-Migration");
        assert_eq!(chart.series[0].color, "#8fbc8f");
        assert_eq!(chart.series[1].values, vec![80_000, 60_000]);

        let plotly = chart.to_plotly();
        assert_eq!(plotly["data"][1]["orientation"], "h");
        assert_eq!(plotly["data"][1]["marker"]["color"], "#FF7276");
    }
}
