//! Tile proxy and local vector tile server.
//!
//! Two jobs behind one router:
//! - `/api/tile-proxy` relays image requests to services that refuse
//!   cross-origin browsers, substituting the tile's bbox.
//! - `/api/v1/tiles/...` serves pre-built vector tiles from MBTiles files.

pub mod config;
pub mod error;
pub mod handlers;
pub mod mbtiles;
pub mod metrics;
pub mod state;

use std::sync::Arc;

use axum::{extract::Extension, routing::get, Router};
use metrics_exporter_prometheus::PrometheusHandle;
use tower_http::{compression::CompressionLayer, cors::CorsLayer, trace::TraceLayer};

use state::AppState;

/// Build the service router.
pub fn router(state: Arc<AppState>, prometheus: PrometheusHandle) -> Router {
    Router::new()
        .route("/api/tile-proxy", get(handlers::proxy_handler))
        .route("/api/v1/tiles", get(handlers::list_tilesets_handler))
        .route("/api/v1/tiles/", get(handlers::list_tilesets_handler))
        .route(
            "/api/v1/tiles/:tileset/metadata",
            get(handlers::tileset_metadata_handler),
        )
        .route(
            "/api/v1/tiles/:tileset/:z/:x/:y",
            get(handlers::vector_tile_handler),
        )
        .route("/health", get(handlers::health_handler))
        .route("/metrics", get(handlers::metrics_handler))
        .layer(Extension(state))
        .layer(Extension(prometheus))
        .layer(TraceLayer::new_for_http())
        .layer(CompressionLayer::new())
        .layer(CorsLayer::permissive())
}
