//! Minimal GeoJSON types for feature query responses.
//!
//! Only what the overlay pipeline inspects is typed (geometry type, properties);
//! coordinates are carried through untouched to the renderer.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// A GeoJSON FeatureCollection.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct FeatureCollection {
    /// Type identifier (always "FeatureCollection").
    #[serde(rename = "type")]
    pub type_: String,

    /// Array of features.
    #[serde(default)]
    pub features: Vec<Feature>,
}

impl FeatureCollection {
    /// Create a new empty FeatureCollection.
    pub fn new() -> Self {
        Self {
            type_: "FeatureCollection".to_string(),
            features: Vec::new(),
        }
    }

    /// Add multiple features to the collection.
    pub fn with_features(mut self, features: Vec<Feature>) -> Self {
        self.features.extend(features);
        self
    }

    pub fn len(&self) -> usize {
        self.features.len()
    }

    pub fn is_empty(&self) -> bool {
        self.features.is_empty()
    }
}

impl Default for FeatureCollection {
    fn default() -> Self {
        Self::new()
    }
}

/// A GeoJSON Feature.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Feature {
    /// Type identifier (always "Feature").
    #[serde(rename = "type")]
    pub type_: String,

    /// Optional feature identifier (string or number in the wild).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<Value>,

    /// Geometry; `null` is legal GeoJSON for attribute-only rows.
    #[serde(default)]
    pub geometry: Option<Geometry>,

    /// Attribute values.
    #[serde(default)]
    pub properties: Option<Map<String, Value>>,
}

impl Feature {
    /// Create a feature with the given geometry and no properties.
    pub fn new(geometry: Geometry) -> Self {
        Self {
            type_: "Feature".to_string(),
            id: None,
            geometry: Some(geometry),
            properties: None,
        }
    }

    /// Attach a single property.
    pub fn with_property(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.properties
            .get_or_insert_with(Map::new)
            .insert(key.into(), value.into());
        self
    }

    /// GeoJSON geometry type, if a geometry is present.
    pub fn geometry_type(&self) -> Option<&str> {
        self.geometry.as_ref().map(|g| g.type_.as_str())
    }
}

/// A GeoJSON geometry.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Geometry {
    /// Geometry type (e.g. "Polygon", "MultiLineString").
    #[serde(rename = "type")]
    pub type_: String,

    /// Coordinates, passed through to the renderer as-is.
    #[serde(default)]
    pub coordinates: Value,
}

impl Geometry {
    pub fn new(type_: impl Into<String>, coordinates: Value) -> Self {
        Self {
            type_: type_.into(),
            coordinates,
        }
    }

    /// Create a point geometry.
    pub fn point(lon: f64, lat: f64) -> Self {
        Self::new("Point", serde_json::json!([lon, lat]))
    }

    /// Create a line geometry from (lon, lat) pairs.
    pub fn line_string(coords: &[(f64, f64)]) -> Self {
        let coords: Vec<[f64; 2]> = coords.iter().map(|(x, y)| [*x, *y]).collect();
        Self::new("LineString", serde_json::json!(coords))
    }

    /// Create a single-ring polygon from (lon, lat) pairs.
    pub fn polygon(ring: &[(f64, f64)]) -> Self {
        let ring: Vec<[f64; 2]> = ring.iter().map(|(x, y)| [*x, *y]).collect();
        Self::new("Polygon", serde_json::json!([ring]))
    }
}
