//! Common types shared across the overlay layer crates.

pub mod bbox;
pub mod crs;
pub mod error;
pub mod geojson;
pub mod geometry;
pub mod layer;
pub mod service;
pub mod style;
pub mod tile;

pub use bbox::BoundingBox;
pub use crs::CrsCode;
pub use error::{ConfigError, OverlayError, OverlayResult};
pub use geojson::{Feature, FeatureCollection, Geometry};
pub use geometry::GeometryFamily;
pub use layer::{
    Council, CoverageInfo, DataQuality, DataSource, LayerCategory, LayerLevel, LayerMetadata,
    OverlayLayer,
};
pub use service::{
    CachedTileService, DynamicExportService, FeatureQueryService, ServiceConfig,
    VectorTileService, WmsService, XyzService,
};
pub use style::{LayerStyle, LegendEntry, StyleMap, StyleMapEntry};
pub use tile::TileCoord;
