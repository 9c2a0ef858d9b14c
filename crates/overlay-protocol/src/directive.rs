//! Render directives produced by the service adapters.

use overlay_common::BoundingBox;
use serde::{Deserialize, Serialize};

/// Token the renderer replaces with the tile's Web Mercator extent.
pub const BBOX_TEMPLATE: &str = "{bbox-epsg-3857}";

/// Same-origin endpoint that relays CORS-restricted image services.
pub const DEFAULT_PROXY_ENDPOINT: &str = "/api/tile-proxy";

/// What the renderer needs to show a layer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "kebab-case")]
pub enum RenderDirective {
    /// Raster tiles addressed by `{z}/{x}/{y}`
    RasterTiles {
        url: String,
        tile_size: u32,
        attribution: Option<String>,
    },
    /// Rendered images requested per tile extent via [`BBOX_TEMPLATE`]
    RasterExport {
        url: String,
        tile_size: u32,
        attribution: Option<String>,
        proxied: bool,
    },
    /// GeoJSON fetched once per viewport
    GeoJsonFetch {
        url: String,
        attribution: Option<String>,
    },
    /// Vector tiles streamed by the renderer
    VectorTiles {
        url: String,
        source_layer: String,
        attribution: Option<String>,
    },
}

impl RenderDirective {
    pub fn kind(&self) -> &'static str {
        match self {
            RenderDirective::RasterTiles { .. } => "raster-tiles",
            RenderDirective::RasterExport { .. } => "raster-export",
            RenderDirective::GeoJsonFetch { .. } => "geojson-fetch",
            RenderDirective::VectorTiles { .. } => "vector-tiles",
        }
    }

    pub fn url(&self) -> &str {
        match self {
            RenderDirective::RasterTiles { url, .. }
            | RenderDirective::RasterExport { url, .. }
            | RenderDirective::GeoJsonFetch { url, .. }
            | RenderDirective::VectorTiles { url, .. } => url,
        }
    }

    pub fn is_raster(&self) -> bool {
        matches!(
            self,
            RenderDirective::RasterTiles { .. } | RenderDirective::RasterExport { .. }
        )
    }
}

/// Per-call inputs the adapters need beyond the layer config.
#[derive(Debug, Clone, PartialEq)]
pub struct AdapterContext {
    /// Proxy endpoint for CORS-restricted services
    pub proxy_endpoint: String,
    /// Current viewport (EPSG:4326) for feature queries
    pub bbox: Option<BoundingBox>,
    /// Ask feature services to simplify geometry for the viewport scale
    pub simplify: bool,
    /// Cap on features per query (`resultRecordCount`)
    pub max_records: Option<u32>,
    /// Tile size for services whose config has none (WMS)
    pub tile_size: u32,
}

impl Default for AdapterContext {
    fn default() -> Self {
        Self {
            proxy_endpoint: DEFAULT_PROXY_ENDPOINT.to_string(),
            bbox: None,
            simplify: true,
            max_records: None,
            tile_size: overlay_common::service::DEFAULT_TILE_SIZE,
        }
    }
}

impl AdapterContext {
    pub fn with_bbox(mut self, bbox: BoundingBox) -> Self {
        self.bbox = Some(bbox);
        self
    }
}
