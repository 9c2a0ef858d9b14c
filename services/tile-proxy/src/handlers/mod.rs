//! HTTP request handlers.
//!
//! - `proxy`: same-origin relay for bbox-addressed image services
//! - `tiles`: MBTiles vector tiles, tileset metadata and listing
//! - `health`: health check and Prometheus metrics

pub mod health;
pub mod proxy;
pub mod tiles;

pub use health::{health_handler, metrics_handler};
pub use proxy::{proxy_handler, upstream_url, ProxyParams};
pub use tiles::{
    list_tilesets_handler, tileset_metadata_handler, vector_tile_handler, TilesetListResponse,
};
