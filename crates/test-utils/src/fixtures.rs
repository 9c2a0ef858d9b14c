//! Layer and feature fixtures.

use std::sync::Arc;

use layer_catalog::Catalog;
use overlay_common::{
    BoundingBox, CoverageInfo, Feature, FeatureCollection, FeatureQueryService, Geometry,
    GeometryFamily, LayerCategory, LayerLevel, LayerStyle, OverlayLayer, ServiceConfig,
    XyzService,
};
use serde_json::{json, Value};

use crate::paths::catalog_dir;

/// Brisbane CBD and surrounds.
pub fn brisbane_viewport() -> BoundingBox {
    BoundingBox::new(152.95, -27.55, 153.1, -27.4)
}

/// The catalog shipped in `config/catalog/`.
pub fn shipped_catalog() -> Arc<Catalog> {
    Arc::new(Catalog::load_from_dir(catalog_dir()).expect("shipped catalog should load"))
}

/// Layer `id` from the shipped catalog.
pub fn catalog_layer(id: &str) -> Arc<OverlayLayer> {
    shipped_catalog()
        .get(id)
        .cloned()
        .unwrap_or_else(|| panic!("layer {id} missing from shipped catalog"))
}

fn layer(id: &str, service: ServiceConfig) -> OverlayLayer {
    OverlayLayer {
        id: id.to_string(),
        name: format!("Test layer {id}"),
        category: LayerCategory::Hazards,
        description: String::new(),
        level: LayerLevel::State,
        source_id: "test".to_string(),
        coverage: CoverageInfo::new(BoundingBox::new(138.0, -29.2, 153.55, -10.7), &["QLD"]),
        service,
        style: LayerStyle::default(),
        quality: None,
        last_updated: None,
        tags: Vec::new(),
    }
}

/// ArcGIS feature layer with an optional geometry hint.
pub fn feature_layer(id: &str, hint: Option<GeometryFamily>) -> Arc<OverlayLayer> {
    Arc::new(layer(
        id,
        ServiceConfig::ArcgisFeature(FeatureQueryService {
            url: format!("https://gis.example.qld.gov.au/arcgis/rest/services/{id}/FeatureServer/0"),
            requires_proxy: None,
            attribution: None,
            where_clause: "1=1".to_string(),
            geometry_type: hint,
            style_map: None,
        }),
    ))
}

pub fn xyz_layer(id: &str) -> Arc<OverlayLayer> {
    Arc::new(layer(
        id,
        ServiceConfig::Xyz(XyzService {
            url: "https://tiles.example.com/{z}/{x}/{y}.png".to_string(),
            requires_proxy: None,
            attribution: None,
            tile_size: 256,
        }),
    ))
}

/// A layer whose `type` no adapter understands.
pub fn bogus_layer() -> Arc<OverlayLayer> {
    let value = json!({
        "id": "bogus-layer",
        "name": "Bogus",
        "category": "hazards",
        "level": "state",
        "sourceId": "test",
        "coverage": {"bbox": [150, -30, 152, -28], "jurisdictions": ["QLD"]},
        "service": {"type": "bogus", "url": "https://example.com"}
    });
    Arc::new(serde_json::from_value(value).expect("bogus layer fixture parses"))
}

pub fn point_features(n: usize) -> Vec<Feature> {
    (0..n)
        .map(|i| Feature::new(Geometry::point(153.0 + i as f64 * 0.001, -27.5)))
        .collect()
}

pub fn line_features(n: usize) -> Vec<Feature> {
    (0..n)
        .map(|i| {
            let x = 153.0 + i as f64 * 0.001;
            Feature::new(Geometry::line_string(&[(x, -27.5), (x, -27.45)]))
        })
        .collect()
}

pub fn polygon_features(n: usize) -> Vec<Feature> {
    (0..n)
        .map(|i| {
            let x = 153.0 + i as f64 * 0.001;
            Feature::new(Geometry::polygon(&[
                (x, -27.5),
                (x + 0.0005, -27.5),
                (x + 0.0005, -27.495),
                (x, -27.5),
            ]))
        })
        .collect()
}

/// GeoJSON body for a feature query response.
pub fn collection_json(features: Vec<Feature>) -> Value {
    serde_json::to_value(FeatureCollection::new().with_features(features))
        .expect("feature collection serializes")
}
