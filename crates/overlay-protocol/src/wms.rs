//! OGC WMS GetMap adapter.
//!
//! WMS 1.3.0 names the reference system parameter `CRS`; 1.1.1 and earlier
//! call it `SRS`. Overlays always request Web Mercator tiles, where both
//! versions use easting/northing axis order, so the bbox is never swapped.

use overlay_common::{ConfigError, CrsCode, WmsService};
use url::form_urlencoded::Serializer;

use crate::directive::{AdapterContext, RenderDirective};
use crate::{append_query, proxy, validate_url};

/// WMS protocol version.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WmsVersion {
    V1_1_1,
    V1_3_0,
}

impl WmsVersion {
    /// Parse a version string. Anything before 1.3 speaks the 1.1.x dialect.
    pub fn parse(s: &str) -> Option<Self> {
        match s.trim() {
            "1.3.0" | "1.3" => Some(Self::V1_3_0),
            "1.1.1" | "1.1.0" | "1.1" | "1.0.0" => Some(Self::V1_1_1),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::V1_1_1 => "1.1.1",
            Self::V1_3_0 => "1.3.0",
        }
    }

    /// Name of the reference system parameter for this version.
    pub fn crs_param(&self) -> &'static str {
        match self {
            Self::V1_1_1 => "SRS",
            Self::V1_3_0 => "CRS",
        }
    }
}

/// GetMap URL without the bbox parameter.
pub fn get_map_base(service: &WmsService, version: WmsVersion, crs: CrsCode, size: u32) -> String {
    let size = size.to_string();
    let layers = service.layers.join(",");
    let crs = crs.to_string();

    let query = Serializer::new(String::new())
        .append_pair("SERVICE", "WMS")
        .append_pair("REQUEST", "GetMap")
        .append_pair("VERSION", version.as_str())
        .append_pair("LAYERS", &layers)
        .append_pair("STYLES", "")
        .append_pair("FORMAT", &service.format)
        .append_pair("TRANSPARENT", "TRUE")
        .append_pair(version.crs_param(), &crs)
        .append_pair("WIDTH", &size)
        .append_pair("HEIGHT", &size)
        .finish();

    append_query(service.url.trim_end_matches('&'), &query)
}

pub(crate) fn get_map(
    layer_id: &str,
    service: &WmsService,
    ctx: &AdapterContext,
) -> Result<RenderDirective, ConfigError> {
    validate_url(layer_id, &service.url)?;

    if service.layers.is_empty() {
        return Err(ConfigError::Invalid {
            layer_id: layer_id.to_string(),
            message: "WMS config lists no layers".to_string(),
        });
    }

    let version = WmsVersion::parse(&service.version).ok_or_else(|| ConfigError::Invalid {
        layer_id: layer_id.to_string(),
        message: format!("unsupported WMS version '{}'", service.version),
    })?;

    // Tiles are requested with a Web Mercator bbox, so the service must speak it.
    let crs = CrsCode::from_wms_string(&service.crs)
        .ok()
        .filter(|c| *c == CrsCode::Epsg3857)
        .ok_or_else(|| ConfigError::UnsupportedCrs {
            layer_id: layer_id.to_string(),
            crs: service.crs.clone(),
        })?;

    let base = get_map_base(service, version, crs, ctx.tile_size);
    let (url, proxied) = proxy::route(&ctx.proxy_endpoint, &base, service.requires_proxy);

    Ok(RenderDirective::RasterExport {
        url,
        tile_size: ctx.tile_size,
        attribution: service.attribution.clone(),
        proxied,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_version_parse() {
        assert_eq!(WmsVersion::parse("1.3.0"), Some(WmsVersion::V1_3_0));
        assert_eq!(WmsVersion::parse("1.1.1"), Some(WmsVersion::V1_1_1));
        assert_eq!(WmsVersion::parse("2.0"), None);
    }

    #[test]
    fn test_crs_param_name() {
        assert_eq!(WmsVersion::V1_3_0.crs_param(), "CRS");
        assert_eq!(WmsVersion::V1_1_1.crs_param(), "SRS");
    }
}
