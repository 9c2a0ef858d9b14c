//! The map renderer seam.
//!
//! Any map engine that can add and remove sources and layers, set paint and
//! layout properties, and report its viewport and style stack can host
//! overlays. Only [`LayerManager`](crate::LayerManager) calls these methods.

use overlay_common::{BoundingBox, FeatureCollection};
use serde::Serialize;
use serde_json::{Map, Value};
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RendererError {
    #[error("source already exists: {0}")]
    SourceExists(String),

    #[error("source not found: {0}")]
    SourceNotFound(String),

    #[error("layer already exists: {0}")]
    LayerExists(String),

    #[error("layer not found: {0}")]
    LayerNotFound(String),

    #[error("layer '{layer_id}' has no property '{property}'")]
    UnknownProperty { layer_id: String, property: String },

    #[error("{0}")]
    Other(String),
}

/// Data source registered with the renderer.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum SourceSpec {
    Raster {
        tiles: Vec<String>,
        #[serde(rename = "tileSize")]
        tile_size: u32,
        #[serde(skip_serializing_if = "Option::is_none")]
        attribution: Option<String>,
    },
    #[serde(rename = "geojson")]
    GeoJson {
        data: FeatureCollection,
        #[serde(skip_serializing_if = "Option::is_none")]
        attribution: Option<String>,
    },
    Vector {
        tiles: Vec<String>,
        #[serde(skip_serializing_if = "Option::is_none")]
        attribution: Option<String>,
    },
}

/// Kind of drawing primitive. Determines which paint properties apply.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum PrimitiveKind {
    Raster,
    Fill,
    Line,
    Circle,
}

impl PrimitiveKind {
    pub const ALL: [PrimitiveKind; 4] = [
        PrimitiveKind::Raster,
        PrimitiveKind::Fill,
        PrimitiveKind::Line,
        PrimitiveKind::Circle,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            PrimitiveKind::Raster => "raster",
            PrimitiveKind::Fill => "fill",
            PrimitiveKind::Line => "line",
            PrimitiveKind::Circle => "circle",
        }
    }

    /// Paint property controlling this primitive's opacity.
    pub fn opacity_property(&self) -> &'static str {
        match self {
            PrimitiveKind::Raster => "raster-opacity",
            PrimitiveKind::Fill => "fill-opacity",
            PrimitiveKind::Line => "line-opacity",
            PrimitiveKind::Circle => "circle-opacity",
        }
    }
}

/// A drawing layer bound to a source.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LayerSpec {
    pub id: String,
    #[serde(rename = "type")]
    pub kind: PrimitiveKind,
    pub source: String,
    #[serde(rename = "source-layer", skip_serializing_if = "Option::is_none")]
    pub source_layer: Option<String>,
    pub paint: Map<String, Value>,
    #[serde(skip_serializing_if = "Map::is_empty")]
    pub layout: Map<String, Value>,
    #[serde(rename = "minzoom", skip_serializing_if = "Option::is_none")]
    pub min_zoom: Option<f64>,
    #[serde(rename = "maxzoom", skip_serializing_if = "Option::is_none")]
    pub max_zoom: Option<f64>,
}

impl LayerSpec {
    pub fn new(id: impl Into<String>, kind: PrimitiveKind, source: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            kind,
            source: source.into(),
            source_layer: None,
            paint: Map::new(),
            layout: Map::new(),
            min_zoom: None,
            max_zoom: None,
        }
    }

    pub fn paint(mut self, property: &str, value: impl Into<Value>) -> Self {
        self.paint.insert(property.to_string(), value.into());
        self
    }

    pub fn source_layer(mut self, source_layer: Option<String>) -> Self {
        self.source_layer = source_layer;
        self
    }

    pub fn zoom_range(mut self, min_zoom: f64, max_zoom: f64) -> Self {
        self.min_zoom = Some(min_zoom);
        self.max_zoom = Some(max_zoom);
        self
    }
}

/// One entry of the renderer's current style stack, bottom to top.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StyleLayer {
    pub id: String,
    /// Renderer layer type, e.g. "background", "fill", "symbol"
    pub kind: String,
}

impl StyleLayer {
    pub fn new(id: impl Into<String>, kind: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            kind: kind.into(),
        }
    }

    /// Label layers; overlays are inserted below the first one.
    pub fn is_symbol(&self) -> bool {
        self.kind == "symbol"
    }
}

/// Imperative map renderer.
pub trait MapRenderer: Send {
    fn add_source(&mut self, id: &str, spec: SourceSpec) -> Result<(), RendererError>;

    fn remove_source(&mut self, id: &str) -> Result<(), RendererError>;

    fn has_source(&self, id: &str) -> bool;

    /// Replace a GeoJSON source's data in place.
    fn set_source_data(&mut self, id: &str, data: FeatureCollection) -> Result<(), RendererError>;

    /// Insert `spec` below `before_id`, or on top when `None`.
    fn add_layer(&mut self, spec: LayerSpec, before_id: Option<&str>) -> Result<(), RendererError>;

    fn remove_layer(&mut self, id: &str) -> Result<(), RendererError>;

    fn has_layer(&self, id: &str) -> bool;

    fn set_paint_property(
        &mut self,
        layer_id: &str,
        property: &str,
        value: Value,
    ) -> Result<(), RendererError>;

    fn set_layout_property(
        &mut self,
        layer_id: &str,
        property: &str,
        value: Value,
    ) -> Result<(), RendererError>;

    /// Current viewport in EPSG:4326.
    fn bounds(&self) -> BoundingBox;

    fn zoom(&self) -> f64;

    fn style_layers(&self) -> Vec<StyleLayer>;
}

/// Id of the first label layer in the style, if any.
pub fn first_symbol_layer<R: MapRenderer + ?Sized>(renderer: &R) -> Option<String> {
    renderer
        .style_layers()
        .into_iter()
        .find(StyleLayer::is_symbol)
        .map(|l| l.id)
}
