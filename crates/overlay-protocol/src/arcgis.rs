//! ArcGIS REST adapters: tile cache, dynamic export and feature query.

use overlay_common::{
    BoundingBox, CachedTileService, ConfigError, DynamicExportService, FeatureQueryService,
    ServiceConfig,
};
use url::form_urlencoded::Serializer;

use crate::directive::{AdapterContext, RenderDirective};
use crate::{append_query, proxy, validate_url};

/// Viewport span divisor for `maxAllowableOffset`.
pub const SIMPLIFY_DIVISOR: f64 = 500.0;

/// Below this offset (degrees, ~1 m at the equator) simplification is skipped.
pub const MIN_SIMPLIFY_OFFSET: f64 = 1e-5;

const TILE_SUFFIX: &str = "/tile/{z}/{y}/{x}";

/// Strip trailing slashes so path segments can be appended.
fn trim_base(url: &str) -> &str {
    url.trim_end_matches('/')
}

// ============================================================================
// Cached tiles
// ============================================================================

/// `<MapServer>/tile/{z}/{y}/{x}`. Note ArcGIS orders row before column.
pub fn cached_tile_url(service: &CachedTileService) -> String {
    let base = trim_base(&service.url);
    if base.contains(TILE_SUFFIX) {
        base.to_string()
    } else {
        format!("{}{}", base, TILE_SUFFIX)
    }
}

pub(crate) fn cached_tiles(
    layer_id: &str,
    service: &CachedTileService,
) -> Result<RenderDirective, ConfigError> {
    validate_url(layer_id, &service.url)?;
    Ok(RenderDirective::RasterTiles {
        url: cached_tile_url(service),
        tile_size: service.tile_size,
        attribution: service.attribution.clone(),
    })
}

// ============================================================================
// Dynamic export
// ============================================================================

/// `/export` URL without the bbox parameter.
pub fn dynamic_export_base(service: &DynamicExportService) -> String {
    let base = trim_base(&service.url);
    let endpoint = if base.ends_with("/export") {
        base.to_string()
    } else {
        format!("{}/export", base)
    };

    let size = format!("{},{}", service.tile_size, service.tile_size);
    let mut query = Serializer::new(String::new());
    query
        .append_pair("f", "image")
        .append_pair("format", &service.format)
        .append_pair("transparent", "true")
        .append_pair("dpi", "96")
        .append_pair("bboxSR", "3857")
        .append_pair("imageSR", "3857")
        .append_pair("size", &size);

    if !service.layers.is_empty() {
        let ids: Vec<String> = service.layers.iter().map(|id| id.to_string()).collect();
        query.append_pair("layers", &format!("show:{}", ids.join(",")));
    }

    if let Some(symbology) = &service.dynamic_layers {
        query.append_pair("dynamicLayers", &symbology.to_string());
    }

    append_query(&endpoint, &query.finish())
}

pub(crate) fn dynamic_export(
    layer_id: &str,
    service: &DynamicExportService,
    ctx: &AdapterContext,
) -> Result<RenderDirective, ConfigError> {
    validate_url(layer_id, &service.url)?;
    if let Some(symbology) = &service.dynamic_layers {
        if !symbology.is_array() {
            return Err(ConfigError::Invalid {
                layer_id: layer_id.to_string(),
                message: "dynamicLayers must be a JSON array".to_string(),
            });
        }
    }

    let base = dynamic_export_base(service);
    let (url, proxied) = proxy::route(&ctx.proxy_endpoint, &base, service.requires_proxy);

    Ok(RenderDirective::RasterExport {
        url,
        tile_size: service.tile_size,
        attribution: service.attribution.clone(),
        proxied,
    })
}

// ============================================================================
// Feature query
// ============================================================================

/// Options for a `/query` request.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct FeatureQueryOptions {
    /// Restrict to features intersecting this EPSG:4326 box
    pub bbox: Option<BoundingBox>,
    /// Scale geometry simplification to the bbox size
    pub simplify: bool,
    /// `resultRecordCount` cap
    pub max_records: Option<u32>,
}

/// Simplification tolerance for a viewport: `max(lngSpan, latSpan) / 500`,
/// or `None` when that is below [`MIN_SIMPLIFY_OFFSET`].
pub fn max_allowable_offset(bbox: &BoundingBox) -> Option<f64> {
    let span = bbox.width().abs().max(bbox.height().abs());
    let offset = span / SIMPLIFY_DIVISOR;
    (offset > MIN_SIMPLIFY_OFFSET).then_some(offset)
}

/// Build the layer `/query` URL returning GeoJSON in EPSG:4326.
pub fn arcgis_feature_url(service: &FeatureQueryService, options: &FeatureQueryOptions) -> String {
    let base = trim_base(&service.url);
    let endpoint = if base.ends_with("/query") {
        base.to_string()
    } else {
        format!("{}/query", base)
    };

    let mut query = Serializer::new(String::new());
    query
        .append_pair("where", &service.where_clause)
        .append_pair("outFields", "*")
        .append_pair("returnGeometry", "true")
        .append_pair("outSR", "4326");

    if let Some(bbox) = &options.bbox {
        query
            .append_pair("geometry", &bbox.to_param_string())
            .append_pair("geometryType", "esriGeometryEnvelope")
            .append_pair("inSR", "4326")
            .append_pair("spatialRel", "esriSpatialRelIntersects");

        if options.simplify {
            if let Some(offset) = max_allowable_offset(bbox) {
                query.append_pair("maxAllowableOffset", &offset.to_string());
            }
        }
    }

    if let Some(limit) = options.max_records {
        query.append_pair("resultRecordCount", &limit.to_string());
    }

    query.append_pair("f", "geojson");
    append_query(&endpoint, &query.finish())
}

pub(crate) fn feature_query(
    layer_id: &str,
    service: &FeatureQueryService,
    options: &FeatureQueryOptions,
) -> Result<String, ConfigError> {
    validate_url(layer_id, &service.url)?;
    if service.where_clause.trim().is_empty() {
        return Err(ConfigError::Invalid {
            layer_id: layer_id.to_string(),
            message: "empty where clause".to_string(),
        });
    }
    Ok(arcgis_feature_url(service, options))
}

/// Count-only query for the feature service (`returnCountOnly=true`).
pub fn feature_count_url(service: &FeatureQueryService) -> String {
    let endpoint = format!("{}/query", trim_base(&service.url));
    let query = Serializer::new(String::new())
        .append_pair("where", &service.where_clause)
        .append_pair("returnCountOnly", "true")
        .append_pair("f", "json")
        .finish();
    append_query(&endpoint, &query)
}

// ============================================================================
// Service metadata
// ============================================================================

/// `?f=json` endpoint describing the layer, where the protocol has one.
///
/// For dynamic exports the first shown sublayer is described, since only
/// sublayers carry `editingInfo`.
pub fn service_info_url(service: &ServiceConfig) -> Option<String> {
    let url = match service {
        ServiceConfig::ArcgisFeature(s) => trim_base(&s.url).to_string(),
        ServiceConfig::ArcgisDynamic(s) => match s.layers.first() {
            Some(id) => format!("{}/{}", trim_base(&s.url), id),
            None => trim_base(&s.url).to_string(),
        },
        ServiceConfig::ArcgisCached(s) => trim_base(&s.url).to_string(),
        ServiceConfig::Wms(_)
        | ServiceConfig::Xyz(_)
        | ServiceConfig::VectorTiles(_)
        | ServiceConfig::Unsupported => return None,
    };
    Some(append_query(&url, "f=json"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use overlay_common::GeometryFamily;

    fn feature_service() -> FeatureQueryService {
        FeatureQueryService {
            url: "https://example.gov.au/arcgis/rest/services/Flood/FeatureServer/0".to_string(),
            requires_proxy: None,
            attribution: None,
            where_clause: "1=1".to_string(),
            geometry_type: Some(GeometryFamily::Polygon),
            style_map: None,
        }
    }

    #[test]
    fn test_cached_tile_url() {
        let service = CachedTileService {
            url: "https://example.gov.au/arcgis/rest/services/Imagery/MapServer/".to_string(),
            requires_proxy: None,
            attribution: None,
            tile_size: 256,
        };
        assert_eq!(
            cached_tile_url(&service),
            "https://example.gov.au/arcgis/rest/services/Imagery/MapServer/tile/{z}/{y}/{x}"
        );
    }

    #[test]
    fn test_offset_threshold() {
        // 1e-3 degree viewport -> 2e-6, below the useful threshold
        let tiny = BoundingBox::new(153.0, -27.0, 153.001, -26.9995);
        assert_eq!(max_allowable_offset(&tiny), None);

        let city = BoundingBox::new(152.9, -27.6, 153.2, -27.3);
        let offset = max_allowable_offset(&city).unwrap();
        assert!((offset - 0.3 / 500.0).abs() < 1e-12);
    }

    #[test]
    fn test_feature_url_without_bbox_has_no_spatial_filter() {
        let url = arcgis_feature_url(&feature_service(), &FeatureQueryOptions::default());
        assert!(url.starts_with(
            "https://example.gov.au/arcgis/rest/services/Flood/FeatureServer/0/query?"
        ));
        assert!(url.contains("f=geojson"));
        assert!(!url.contains("geometry="));
        assert!(!url.contains("maxAllowableOffset"));
    }

    #[test]
    fn test_count_url() {
        let url = feature_count_url(&feature_service());
        assert!(url.contains("returnCountOnly=true"));
        assert!(url.ends_with("f=json"));
    }

    #[test]
    fn test_service_info_url_for_dynamic_uses_first_sublayer() {
        let service = ServiceConfig::ArcgisDynamic(DynamicExportService {
            url: "https://example.gov.au/arcgis/rest/services/Cadastre/MapServer".to_string(),
            requires_proxy: None,
            attribution: None,
            layers: vec![4, 5],
            format: "png32".to_string(),
            tile_size: 256,
            dynamic_layers: None,
        });
        assert_eq!(
            service_info_url(&service).unwrap(),
            "https://example.gov.au/arcgis/rest/services/Cadastre/MapServer/4?f=json"
        );
    }
}
