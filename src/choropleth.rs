// 🗺️ Choropleth Builder - destination counties colored by migration count
//
// Destination names are matched against the GeoJSON `NAME` property after a
// fixed-width suffix strip. Names whose state qualifier is not exactly that
// wide silently mis-key: they match the wrong polygon or none at all.

use crate::shaper::InteractionRow;
use geo::Centroid;
use geojson::FeatureCollection;
use serde::Serialize;
use serde_json::{json, Value};
use tracing::debug;

/// Characters removed from the end of a display name before matching
pub const STATE_SUFFIX_LEN: usize = 10;

/// Property the polygons are keyed by
pub const FEATURE_NAME_PROPERTY: &str = "NAME";

/// Zoom applied when the view is centered on the selected county
pub const CENTERED_PROJECTION_SCALE: f64 = 15.0;

/// Drop the last 10 characters; shorter names become empty.
pub fn strip_state_suffix(name: &str) -> String {
    let keep = name.chars().count().saturating_sub(STATE_SUFFIX_LEN);
    name.chars().take(keep).collect()
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct GeoCenter {
    pub lon: f64,
    pub lat: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "framing", rename_all = "snake_case")]
pub enum ChoroplethView {
    /// Library default framing, nothing recentered
    Default,
    Centered {
        center: GeoCenter,
        projection_scale: f64,
    },
}

impl ChoroplethView {
    pub fn center(&self) -> Option<GeoCenter> {
        match self {
            ChoroplethView::Default => None,
            ChoroplethView::Centered { center, .. } => Some(*center),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ChoroplethFigure {
    /// Stripped destination names, one per row
    pub locations: Vec<String>,
    pub values: Vec<u64>,
    /// Full destination names for hover text
    pub hover_names: Vec<String>,
    pub geojson_url: String,
    pub feature_id_key: String,
    pub color_scale: &'static str,
    pub projection: &'static str,
    pub view: ChoroplethView,
}

/// Centroid (lon, lat) of the first feature whose name equals `name`.
///
/// Area-weighted for polygons. None when no feature matches or the matched
/// geometry is empty or unconvertible.
pub fn find_feature_centroid(collection: &FeatureCollection, name: &str) -> Option<GeoCenter> {
    let feature = collection.features.iter().find(|feature| {
        feature
            .properties
            .as_ref()
            .and_then(|props| props.get(FEATURE_NAME_PROPERTY))
            .and_then(Value::as_str)
            == Some(name)
    })?;

    let geometry = feature.geometry.as_ref()?;
    let shape = match geo::Geometry::<f64>::try_from(geometry.value.clone()) {
        Ok(shape) => shape,
        Err(e) => {
            debug!("Polygon for {:?} could not be converted: {}", name, e);
            return None;
        }
    };

    shape.centroid().map(|point| GeoCenter {
        lon: point.x(),
        lat: point.y(),
    })
}

/// Build the figure for the selected county's destinations.
///
/// `rows` should already be filtered to the selected origin. A selected name
/// with no matching polygon keeps the default framing.
pub fn build_choropleth(
    rows: &[InteractionRow],
    selected_name: &str,
    collection: &FeatureCollection,
    geojson_url: &str,
) -> ChoroplethFigure {
    let selected_key = strip_state_suffix(selected_name);

    let view = match find_feature_centroid(collection, &selected_key) {
        Some(center) => ChoroplethView::Centered {
            center,
            projection_scale: CENTERED_PROJECTION_SCALE,
        },
        None => {
            debug!("No polygon named {:?}; using default framing", selected_key);
            ChoroplethView::Default
        }
    };

    ChoroplethFigure {
        locations: rows.iter().map(|row| strip_state_suffix(&row.name2)).collect(),
        values: rows.iter().map(|row| row.count).collect(),
        hover_names: rows.iter().map(|row| row.name2.clone()).collect(),
        geojson_url: geojson_url.to_string(),
        feature_id_key: format!("properties.{}", FEATURE_NAME_PROPERTY),
        color_scale: "Blues",
        projection: "mercator",
        view,
    }
}

impl ChoroplethFigure {
    /// Plotly figure JSON (`data` + `layout`)
    pub fn to_plotly(&self) -> Value {
        let mut geo = json!({
            "projection": { "type": self.projection },
        });

        if let ChoroplethView::Centered {
            center,
            projection_scale,
        } = &self.view
        {
            geo = json!({
                "projection": { "type": self.projection, "scale": projection_scale },
                "center": { "lon": center.lon, "lat": center.lat },
                "showcoastlines": true,
                "coastlinecolor": "Black",
                "showland": true,
                "landcolor": "LightGray",
                "showlakes": true,
                "lakecolor": "LightBlue",
            });
        }

        json!({
            "data": [{
                "type": "choropleth",
                "geojson": self.geojson_url,
                "featureidkey": self.feature_id_key,
                "locations": self.locations,
                "z": self.values,
                "text": self.hover_names,
                "colorscale": self.color_scale,
                "colorbar": { "title": { "text": "Migration_Count" } },
            }],
            "layout": {
                "geo": geo,
                "margin": { "r": 0, "t": 0, "l": 0, "b": 0 },
            },
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::COUNTIES_GEOJSON;
    use geojson::GeoJson;

    fn counties() -> FeatureCollection {
        let geojson: GeoJson = COUNTIES_GEOJSON.parse().unwrap();
        FeatureCollection::try_from(geojson).unwrap()
    }

    fn row(name2: &str, count: u64) -> InteractionRow {
        InteractionRow {
            name1: "New York County, NY".to_string(),
            name2: name2.to_string(),
            count,
            code: "3606136047".to_string(),
        }
    }

    fn assert_close(a: f64, b: f64) {
        assert!((a - b).abs() < 1e-9, "{} != {}", a, b);
    }

    #[test]
    fn test_strip_state_suffix() {
        assert_eq!(strip_state_suffix("Kings County, NY"), "Kings ");
        assert_eq!(strip_state_suffix("0123456789"), "");
        assert_eq!(strip_state_suffix("short"), "");
        assert_eq!(strip_state_suffix(""), "");
    }

    #[test]
    fn test_find_feature_centroid() {
        let center = find_feature_centroid(&counties(), "New York ").unwrap();

        assert_close(center.lon, -73.95);
        assert_close(center.lat, 40.8);
        assert!(find_feature_centroid(&counties(), "Queens ").is_none());
    }

    #[test]
    fn test_recenters_on_selected_polygon() {
        let rows = vec![row("Kings County, NY", 1200)];
        let figure = build_choropleth(&rows, "New York County, NY", &counties(), "/api/geojson");

        let expected = find_feature_centroid(&counties(), "New York ").unwrap();
        match figure.view {
            ChoroplethView::Centered {
                center,
                projection_scale,
            } => {
                assert_eq!(center, expected);
                assert_eq!(projection_scale, CENTERED_PROJECTION_SCALE);
            }
            ChoroplethView::Default => panic!("expected centered view"),
        }
    }

    #[test]
    fn test_unmatched_selection_keeps_default_framing() {
        let rows = vec![row("Kings County, NY", 1200)];
        let figure = build_choropleth(&rows, "Los Angeles County, CA", &counties(), "/api/geojson");

        assert_eq!(figure.view, ChoroplethView::Default);
        assert!(figure.view.center().is_none());
        assert!(figure.to_plotly()["layout"]["geo"].get("center").is_none());
    }

    #[test]
    fn test_differently_sized_suffix_mis_keys() {
        // ", New York" is wider than the fixed strip and leaves "New York County"
        let figure = build_choropleth(&[], "New York County, New York", &counties(), "/api/geojson");
        assert_eq!(figure.view, ChoroplethView::Default);
    }

    #[test]
    fn test_locations_follow_rows() {
        let rows = vec![row("Kings County, NY", 1200), row("Unknown (3606199999)", 7)];
        let figure = build_choropleth(&rows, "New York County, NY", &counties(), "/api/geojson");

        assert_eq!(figure.locations, vec!["Kings ".to_string(), "Unknown (3".to_string()]);
        assert_eq!(figure.values, vec![1200, 7]);
        assert_eq!(figure.hover_names[0], "Kings County, NY");
        assert_eq!(figure.feature_id_key, "properties.NAME");
    }

    #[test]
    fn test_plotly_layout_for_centered_view() {
        let figure = build_choropleth(&[], "New York County, NY", &counties(), "/api/geojson");
        let plotly = figure.to_plotly();

        assert_eq!(plotly["data"][0]["type"], "choropleth");
        assert_eq!(plotly["data"][0]["colorscale"], "Blues");
        assert_eq!(plotly["layout"]["geo"]["projection"]["type"], "mercator");
        assert_eq!(plotly["layout"]["geo"]["projection"]["scale"], 15.0);
        assert_close(plotly["layout"]["geo"]["center"]["lon"].as_f64().unwrap(), -73.95);
        assert_eq!(plotly["layout"]["margin"]["t"], 0);
    }

    #[test]
    fn test_feature_without_geometry_is_not_a_match() {
        let geojson: GeoJson = r#"{"type": "FeatureCollection", "features": [
            {"type": "Feature", "properties": {"NAME": "New York "}, "geometry": null}
        ]}"#
        .parse()
        .unwrap();
        let collection = FeatureCollection::try_from(geojson).unwrap();

        assert!(find_feature_centroid(&collection, "New York ").is_none());
    }
}
