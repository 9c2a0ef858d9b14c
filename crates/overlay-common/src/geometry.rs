//! Geometry families used to pick renderer primitives for feature data.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Which primitive family a feature layer renders as.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum GeometryFamily {
    Polygon,
    Line,
    Point,
}

impl GeometryFamily {
    /// Map a GeoJSON geometry type to its family.
    pub fn from_geojson_type(type_: &str) -> Option<Self> {
        match type_ {
            "Polygon" | "MultiPolygon" => Some(Self::Polygon),
            "LineString" | "MultiLineString" => Some(Self::Line),
            "Point" | "MultiPoint" => Some(Self::Point),
            _ => None,
        }
    }

    /// Map Esri's `geometryType` enumeration to a family.
    pub fn from_esri(type_: &str) -> Option<Self> {
        match type_ {
            "esriGeometryPolygon" | "esriGeometryEnvelope" => Some(Self::Polygon),
            "esriGeometryPolyline" => Some(Self::Line),
            "esriGeometryPoint" | "esriGeometryMultipoint" => Some(Self::Point),
            _ => None,
        }
    }

    /// Tie-break rank: lower wins.
    pub fn priority(&self) -> u8 {
        match self {
            Self::Polygon => 0,
            Self::Line => 1,
            Self::Point => 2,
        }
    }
}

impl fmt::Display for GeometryFamily {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Polygon => "polygon",
            Self::Line => "line",
            Self::Point => "point",
        };
        f.write_str(s)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_geojson_mapping() {
        assert_eq!(
            GeometryFamily::from_geojson_type("MultiPolygon"),
            Some(GeometryFamily::Polygon)
        );
        assert_eq!(
            GeometryFamily::from_geojson_type("MultiLineString"),
            Some(GeometryFamily::Line)
        );
        assert_eq!(
            GeometryFamily::from_geojson_type("MultiPoint"),
            Some(GeometryFamily::Point)
        );
        assert_eq!(GeometryFamily::from_geojson_type("GeometryCollection"), None);
    }

    #[test]
    fn test_esri_mapping() {
        assert_eq!(
            GeometryFamily::from_esri("esriGeometryPolyline"),
            Some(GeometryFamily::Line)
        );
        assert_eq!(
            GeometryFamily::from_esri("esriGeometryMultipoint"),
            Some(GeometryFamily::Point)
        );
        assert_eq!(GeometryFamily::from_esri("esriGeometryMultiPatch"), None);
    }

    #[test]
    fn test_hint_deserializes_lowercase() {
        let g: GeometryFamily = serde_json::from_str("\"line\"").unwrap();
        assert_eq!(g, GeometryFamily::Line);
    }
}
