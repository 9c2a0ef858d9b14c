//! Style configuration for overlay layers.
//!
//! Styles are declared per layer in the catalog. The renderer-facing paint
//! properties are derived from them by the lifecycle manager.

use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

pub const DEFAULT_OPACITY: f64 = 0.7;
pub const DEFAULT_MIN_ZOOM: f64 = 0.0;
pub const DEFAULT_MAX_ZOOM: f64 = 22.0;

/// Display style of one overlay layer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LayerStyle {
    /// Nominal opacity, 0-1
    #[serde(default = "default_opacity")]
    pub opacity: f64,

    #[serde(default = "default_min_zoom")]
    pub min_zoom: f64,

    #[serde(default = "default_max_zoom")]
    pub max_zoom: f64,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub legend: Vec<LegendEntry>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub fill_color: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub stroke_color: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub stroke_width: Option<f64>,
}

fn default_opacity() -> f64 {
    DEFAULT_OPACITY
}

fn default_min_zoom() -> f64 {
    DEFAULT_MIN_ZOOM
}

fn default_max_zoom() -> f64 {
    DEFAULT_MAX_ZOOM
}

impl Default for LayerStyle {
    fn default() -> Self {
        Self {
            opacity: DEFAULT_OPACITY,
            min_zoom: DEFAULT_MIN_ZOOM,
            max_zoom: DEFAULT_MAX_ZOOM,
            legend: Vec::new(),
            fill_color: None,
            stroke_color: None,
            stroke_width: None,
        }
    }
}

impl LayerStyle {
    /// Opacity as handed to the renderer.
    pub fn clamped_opacity(&self) -> f64 {
        clamp_opacity(self.opacity)
    }

    /// Whether `zoom` falls within `[min_zoom, max_zoom]`.
    pub fn zoom_in_range(&self, zoom: f64) -> bool {
        zoom >= self.min_zoom && zoom <= self.max_zoom
    }
}

/// Clamp an opacity to [0, 1]; NaN becomes fully transparent.
pub fn clamp_opacity(value: f64) -> f64 {
    if value.is_nan() {
        0.0
    } else {
        value.clamp(0.0, 1.0)
    }
}

/// One row of a layer legend.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LegendEntry {
    pub label: String,
    pub color: String,
}

/// Attribute value to color mapping for data-driven coloring.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StyleMap {
    /// Feature attribute the match is keyed on
    pub property: String,

    /// Ordered value → color pairs
    pub entries: Vec<StyleMapEntry>,

    /// Color for values not listed
    #[serde(default = "default_fallback_color")]
    pub default_color: String,
}

fn default_fallback_color() -> String {
    "#888888".to_string()
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StyleMapEntry {
    pub value: String,
    pub color: String,
}

impl StyleMap {
    pub fn new(property: impl Into<String>, default_color: impl Into<String>) -> Self {
        Self {
            property: property.into(),
            entries: Vec::new(),
            default_color: default_color.into(),
        }
    }

    pub fn with_entry(mut self, value: impl Into<String>, color: impl Into<String>) -> Self {
        self.entries.push(StyleMapEntry {
            value: value.into(),
            color: color.into(),
        });
        self
    }

    /// Renderer `match` expression: `["match", ["get", prop], v1, c1, ..., default]`.
    ///
    /// With no entries the default color is returned as a flat value, since an
    /// empty `match` is rejected by renderers.
    pub fn to_match_expression(&self) -> Value {
        if self.entries.is_empty() {
            return Value::String(self.default_color.clone());
        }

        let mut expr = vec![json!("match"), json!(["get", self.property])];
        for entry in &self.entries {
            expr.push(json!(entry.value));
            expr.push(json!(entry.color));
        }
        expr.push(json!(self.default_color));
        Value::Array(expr)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_opacity_clamped() {
        let style = LayerStyle {
            opacity: 1.7,
            ..Default::default()
        };
        assert_eq!(style.clamped_opacity(), 1.0);
        assert_eq!(clamp_opacity(-0.2), 0.0);
        assert_eq!(clamp_opacity(f64::NAN), 0.0);
    }

    #[test]
    fn test_match_expression() {
        let map = StyleMap::new("FLOOD_RISK", "#cccccc")
            .with_entry("High", "#d7191c")
            .with_entry("Low", "#abd9e9");

        assert_eq!(
            map.to_match_expression(),
            json!([
                "match",
                ["get", "FLOOD_RISK"],
                "High",
                "#d7191c",
                "Low",
                "#abd9e9",
                "#cccccc"
            ])
        );
    }

    #[test]
    fn test_empty_match_is_flat_color() {
        let map = StyleMap::new("CLASS", "#123456");
        assert_eq!(map.to_match_expression(), json!("#123456"));
    }

    #[test]
    fn test_style_defaults_from_yaml_like_json() {
        let style: LayerStyle = serde_json::from_str(r##"{"fillColor": "#ff0000"}"##).unwrap();
        assert_eq!(style.opacity, DEFAULT_OPACITY);
        assert_eq!(style.max_zoom, DEFAULT_MAX_ZOOM);
        assert!(style.zoom_in_range(12.0));
    }
}
