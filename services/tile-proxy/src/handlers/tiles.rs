//! Vector tiles served from MBTiles.

use std::sync::Arc;

use axum::{
    extract::{Extension, Path},
    http::{header, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use overlay_common::tile::{TileCoord, MAX_ZOOM};
use serde::Serialize;
use tracing::{debug, instrument};

use crate::error::ApiError;
use crate::mbtiles::{is_gzipped, TilesetMetadata, TilesetSummary};
use crate::metrics;
use crate::state::AppState;

pub const TILE_CACHE_CONTROL: &str = "public, max-age=86400, stale-while-revalidate=604800";

#[derive(Debug, Serialize)]
pub struct TilesetListResponse {
    pub tilesets: Vec<TilesetSummary>,
}

/// Parse the final path segment, `{y}.pbf` or a bare `{y}`.
fn parse_row(segment: &str) -> Result<u32, ApiError> {
    segment
        .strip_suffix(".pbf")
        .unwrap_or(segment)
        .parse()
        .map_err(|_| ApiError::BadRequest(format!("Invalid tile row: {segment}")))
}

/// GET /api/v1/tiles/:tileset/:z/:x/:y.pbf
#[instrument(skip_all, fields(tileset = %tileset, z = z, x = x))]
pub async fn vector_tile_handler(
    Extension(state): Extension<Arc<AppState>>,
    Path((tileset, z, x, y)): Path<(String, u32, u32, String)>,
) -> Result<Response, ApiError> {
    if z > MAX_ZOOM {
        return Err(ApiError::BadRequest("Invalid zoom level".to_string()));
    }
    let coord = TileCoord::new(z, x, parse_row(&y)?);
    if !coord.is_valid() {
        return Err(ApiError::BadRequest(format!(
            "Tile {} outside zoom grid",
            coord.path()
        )));
    }

    let Some(data) = state.tiles.tile(&tileset, coord).await? else {
        metrics::record_vector_tile(&tileset, false);
        debug!(tile = %coord.path(), "No tile data");
        return Ok(StatusCode::NO_CONTENT.into_response());
    };
    metrics::record_vector_tile(&tileset, true);

    let encoding = if is_gzipped(&data) { "gzip" } else { "identity" };
    Ok((
        [
            (header::CONTENT_TYPE, "application/x-protobuf"),
            (header::CONTENT_ENCODING, encoding),
            (header::CACHE_CONTROL, TILE_CACHE_CONTROL),
        ],
        data,
    )
        .into_response())
}

/// GET /api/v1/tiles/:tileset/metadata
#[instrument(skip_all, fields(tileset = %tileset))]
pub async fn tileset_metadata_handler(
    Extension(state): Extension<Arc<AppState>>,
    Path(tileset): Path<String>,
) -> Result<Json<TilesetMetadata>, ApiError> {
    Ok(Json(state.tiles.metadata(&tileset).await?))
}

/// GET /api/v1/tiles/
pub async fn list_tilesets_handler(
    Extension(state): Extension<Arc<AppState>>,
) -> Json<TilesetListResponse> {
    Json(TilesetListResponse {
        tilesets: state.tiles.list(),
    })
}
