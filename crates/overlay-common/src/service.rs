//! Service protocol configurations.
//!
//! One variant per protocol. The `type` tag fully determines which adapter may
//! process a config; unknown tags land in [`ServiceConfig::Unsupported`] so a
//! single bad catalog row can be rejected without failing the whole catalog.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::{GeometryFamily, StyleMap};

pub const DEFAULT_TILE_SIZE: u32 = 256;

/// Protocol-specific access configuration of a layer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "kebab-case")]
pub enum ServiceConfig {
    /// Pre-rendered ArcGIS MapServer tile cache
    ArcgisCached(CachedTileService),
    /// ArcGIS MapServer on-demand `/export`
    ArcgisDynamic(DynamicExportService),
    /// ArcGIS FeatureServer/MapServer layer `/query`
    ArcgisFeature(FeatureQueryService),
    /// OGC Web Map Service GetMap
    Wms(WmsService),
    /// Raw `{z}/{x}/{y}` raster tiles
    Xyz(XyzService),
    /// Vector tiles (MVT/PBF) streamed by the renderer
    VectorTiles(VectorTileService),
    /// Any `type` this build has no adapter for
    #[serde(other)]
    Unsupported,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CachedTileService {
    pub url: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub requires_proxy: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub attribution: Option<String>,
    #[serde(default = "default_tile_size")]
    pub tile_size: u32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DynamicExportService {
    pub url: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub requires_proxy: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub attribution: Option<String>,
    /// Sublayer ids to show; empty shows the service defaults
    #[serde(default)]
    pub layers: Vec<u32>,
    #[serde(default = "default_export_format")]
    pub format: String,
    #[serde(default = "default_tile_size")]
    pub tile_size: u32,
    /// Custom symbology (`dynamicLayers` JSON), forwarded verbatim
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub dynamic_layers: Option<Value>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FeatureQueryService {
    /// Layer endpoint, e.g. `.../FeatureServer/0`
    pub url: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub requires_proxy: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub attribution: Option<String>,
    #[serde(rename = "where", default = "default_where")]
    pub where_clause: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub geometry_type: Option<GeometryFamily>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub style_map: Option<StyleMap>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WmsService {
    pub url: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub requires_proxy: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub attribution: Option<String>,
    pub layers: Vec<String>,
    #[serde(default = "default_wms_version")]
    pub version: String,
    #[serde(default = "default_wms_crs")]
    pub crs: String,
    #[serde(default = "default_wms_format")]
    pub format: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct XyzService {
    /// Template containing `{z}`, `{x}` and `{y}`
    pub url: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub requires_proxy: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub attribution: Option<String>,
    #[serde(default = "default_tile_size")]
    pub tile_size: u32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VectorTileService {
    /// Template containing `{z}`, `{x}` and `{y}`
    pub url: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub requires_proxy: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub attribution: Option<String>,
    pub source_layer: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub geometry_type: Option<GeometryFamily>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub style_map: Option<StyleMap>,
}

fn default_tile_size() -> u32 {
    DEFAULT_TILE_SIZE
}

fn default_export_format() -> String {
    "png32".to_string()
}

fn default_where() -> String {
    "1=1".to_string()
}

fn default_wms_version() -> String {
    "1.3.0".to_string()
}

fn default_wms_crs() -> String {
    "EPSG:3857".to_string()
}

fn default_wms_format() -> String {
    "image/png".to_string()
}

impl ServiceConfig {
    /// The `type` tag as written in catalog data.
    pub fn kind(&self) -> &'static str {
        match self {
            ServiceConfig::ArcgisCached(_) => "arcgis-cached",
            ServiceConfig::ArcgisDynamic(_) => "arcgis-dynamic",
            ServiceConfig::ArcgisFeature(_) => "arcgis-feature",
            ServiceConfig::Wms(_) => "wms",
            ServiceConfig::Xyz(_) => "xyz",
            ServiceConfig::VectorTiles(_) => "vector-tiles",
            ServiceConfig::Unsupported => "unsupported",
        }
    }

    pub fn url(&self) -> Option<&str> {
        match self {
            ServiceConfig::ArcgisCached(s) => Some(&s.url),
            ServiceConfig::ArcgisDynamic(s) => Some(&s.url),
            ServiceConfig::ArcgisFeature(s) => Some(&s.url),
            ServiceConfig::Wms(s) => Some(&s.url),
            ServiceConfig::Xyz(s) => Some(&s.url),
            ServiceConfig::VectorTiles(s) => Some(&s.url),
            ServiceConfig::Unsupported => None,
        }
    }

    pub fn attribution(&self) -> Option<&str> {
        match self {
            ServiceConfig::ArcgisCached(s) => s.attribution.as_deref(),
            ServiceConfig::ArcgisDynamic(s) => s.attribution.as_deref(),
            ServiceConfig::ArcgisFeature(s) => s.attribution.as_deref(),
            ServiceConfig::Wms(s) => s.attribution.as_deref(),
            ServiceConfig::Xyz(s) => s.attribution.as_deref(),
            ServiceConfig::VectorTiles(s) => s.attribution.as_deref(),
            ServiceConfig::Unsupported => None,
        }
    }

    /// Explicit `requiresProxy` flag, if the catalog set one.
    pub fn requires_proxy_flag(&self) -> Option<bool> {
        match self {
            ServiceConfig::ArcgisCached(s) => s.requires_proxy,
            ServiceConfig::ArcgisDynamic(s) => s.requires_proxy,
            ServiceConfig::ArcgisFeature(s) => s.requires_proxy,
            ServiceConfig::Wms(s) => s.requires_proxy,
            ServiceConfig::Xyz(s) => s.requires_proxy,
            ServiceConfig::VectorTiles(s) => s.requires_proxy,
            ServiceConfig::Unsupported => None,
        }
    }

    /// Layers whose data is fetched as GeoJSON and must follow the viewport.
    pub fn is_feature_backed(&self) -> bool {
        matches!(self, ServiceConfig::ArcgisFeature(_))
    }

    /// Geometry family declared in the catalog, if any.
    pub fn geometry_hint(&self) -> Option<GeometryFamily> {
        match self {
            ServiceConfig::ArcgisFeature(s) => s.geometry_type,
            ServiceConfig::VectorTiles(s) => s.geometry_type,
            _ => None,
        }
    }

    pub fn style_map(&self) -> Option<&StyleMap> {
        match self {
            ServiceConfig::ArcgisFeature(s) => s.style_map.as_ref(),
            ServiceConfig::VectorTiles(s) => s.style_map.as_ref(),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_dynamic_export() {
        let json = r#"{
            "type": "arcgis-dynamic",
            "url": "https://example.gov.au/arcgis/rest/services/Cadastre/MapServer",
            "layers": [0, 4],
            "requiresProxy": true
        }"#;
        let service: ServiceConfig = serde_json::from_str(json).unwrap();
        match &service {
            ServiceConfig::ArcgisDynamic(s) => {
                assert_eq!(s.layers, vec![0, 4]);
                assert_eq!(s.format, "png32");
                assert_eq!(s.tile_size, DEFAULT_TILE_SIZE);
                assert_eq!(s.requires_proxy, Some(true));
            }
            other => panic!("unexpected variant: {other:?}"),
        }
        assert_eq!(service.kind(), "arcgis-dynamic");
        assert!(!service.is_feature_backed());
    }

    #[test]
    fn test_parse_feature_with_hint() {
        let json = r##"{
            "type": "arcgis-feature",
            "url": "https://example.gov.au/arcgis/rest/services/Flood/FeatureServer/0",
            "geometryType": "polygon",
            "styleMap": {"property": "RISK", "entries": [{"value": "High", "color": "#f00"}]}
        }"##;
        let service: ServiceConfig = serde_json::from_str(json).unwrap();
        assert!(service.is_feature_backed());
        assert_eq!(service.geometry_hint(), Some(GeometryFamily::Polygon));
        assert_eq!(service.style_map().unwrap().default_color, "#888888");
        match service {
            ServiceConfig::ArcgisFeature(s) => assert_eq!(s.where_clause, "1=1"),
            other => panic!("unexpected variant: {other:?}"),
        }
    }

    #[test]
    fn test_unknown_type_is_unsupported() {
        let json = r#"{"type": "bogus", "url": "https://example.com"}"#;
        let service: ServiceConfig = serde_json::from_str(json).unwrap();
        assert_eq!(service, ServiceConfig::Unsupported);
        assert_eq!(service.url(), None);
    }

    #[test]
    fn test_wms_defaults() {
        let json = r#"{"type": "wms", "url": "https://example.com/wms", "layers": ["a"]}"#;
        match serde_json::from_str::<ServiceConfig>(json).unwrap() {
            ServiceConfig::Wms(s) => {
                assert_eq!(s.version, "1.3.0");
                assert_eq!(s.crs, "EPSG:3857");
                assert_eq!(s.format, "image/png");
            }
            other => panic!("unexpected variant: {other:?}"),
        }
    }
}
