//! Service adapters for overlay layers.
//!
//! Translates a layer's declarative [`ServiceConfig`] into a
//! [`RenderDirective`] the map renderer can consume. Supports:
//! - ArcGIS MapServer tile caches, dynamic `/export` and layer `/query`
//! - OGC WMS 1.1.1 and 1.3.0 GetMap
//! - Raw XYZ raster tiles and vector tiles
//!
//! No adapter performs network I/O; fetching GeoJSON is the caller's job.

pub mod arcgis;
pub mod directive;
pub mod proxy;
pub mod vector_tiles;
pub mod wms;
pub mod xyz;

use overlay_common::{ConfigError, ServiceConfig};
use tracing::debug;

pub use arcgis::{arcgis_feature_url, max_allowable_offset, FeatureQueryOptions};
pub use directive::{AdapterContext, RenderDirective, BBOX_TEMPLATE};
pub use wms::WmsVersion;

/// Build the render directive for one layer's service config.
///
/// Dispatch is exhaustive over the protocol tag; an `Unsupported` config is a
/// configuration error for this layer only.
pub fn build_access(
    layer_id: &str,
    service: &ServiceConfig,
    ctx: &AdapterContext,
) -> Result<RenderDirective, ConfigError> {
    let directive = match service {
        ServiceConfig::ArcgisCached(s) => arcgis::cached_tiles(layer_id, s)?,
        ServiceConfig::ArcgisDynamic(s) => arcgis::dynamic_export(layer_id, s, ctx)?,
        ServiceConfig::ArcgisFeature(s) => {
            let options = FeatureQueryOptions {
                bbox: ctx.bbox,
                simplify: ctx.simplify,
                max_records: ctx.max_records,
            };
            RenderDirective::GeoJsonFetch {
                url: arcgis::feature_query(layer_id, s, &options)?,
                attribution: s.attribution.clone(),
            }
        }
        ServiceConfig::Wms(s) => wms::get_map(layer_id, s, ctx)?,
        ServiceConfig::Xyz(s) => xyz::raster_tiles(layer_id, s)?,
        ServiceConfig::VectorTiles(s) => vector_tiles::vector_source(layer_id, s)?,
        ServiceConfig::Unsupported => {
            return Err(ConfigError::UnsupportedServiceType {
                layer_id: layer_id.to_string(),
            })
        }
    };

    debug!(
        layer_id = %layer_id,
        service = service.kind(),
        directive = directive.kind(),
        "Built render directive"
    );
    Ok(directive)
}

/// Check that a service URL is absolute http(s) or a same-origin path.
pub(crate) fn validate_url(layer_id: &str, url: &str) -> Result<(), ConfigError> {
    let invalid = |reason: &str| ConfigError::InvalidUrl {
        layer_id: layer_id.to_string(),
        url: url.to_string(),
        reason: reason.to_string(),
    };

    if url.trim().is_empty() {
        return Err(invalid("empty URL"));
    }
    if url.starts_with('/') {
        return Ok(());
    }

    let parsed = url::Url::parse(url).map_err(|e| invalid(&e.to_string()))?;
    match parsed.scheme() {
        "http" | "https" => Ok(()),
        other => Err(invalid(&format!("unsupported scheme '{}'", other))),
    }
}

/// Append an encoded query string to a URL that may already carry one.
pub fn append_query(url: &str, query: &str) -> String {
    if query.is_empty() {
        return url.to_string();
    }
    if url.ends_with('?') || url.ends_with('&') {
        format!("{}{}", url, query)
    } else if url.contains('?') {
        format!("{}&{}", url, query)
    } else {
        format!("{}?{}", url, query)
    }
}
