//! Same-origin relay for image services without CORS headers.

use std::sync::Arc;

use axum::{
    extract::{Extension, Query},
    http::{header, StatusCode},
    response::{IntoResponse, Response},
};
use overlay_common::BoundingBox;
use overlay_protocol::{append_query, BBOX_TEMPLATE};
use serde::Deserialize;
use tracing::{debug, instrument, warn};
use url::Url;

use crate::error::ApiError;
use crate::metrics;
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct ProxyParams {
    /// Upstream URL without a bbox, or with a `{bbox-epsg-3857}` token
    pub base: String,
    pub bbox: String,
}

/// Resolve the upstream URL for one tile: substitute the bbox token when
/// present, append a `bbox=` parameter otherwise.
pub fn upstream_url(base: &str, bbox: &BoundingBox) -> Result<Url, ApiError> {
    let bbox = bbox.to_param_string();
    let resolved = if base.contains(BBOX_TEMPLATE) {
        base.replace(BBOX_TEMPLATE, &bbox)
    } else {
        append_query(base, &format!("bbox={bbox}"))
    };

    let url = Url::parse(&resolved)
        .map_err(|e| ApiError::BadRequest(format!("Invalid upstream URL: {e}")))?;
    match url.scheme() {
        "http" | "https" => Ok(url),
        other => Err(ApiError::BadRequest(format!(
            "Unsupported upstream scheme: {other}"
        ))),
    }
}

/// GET /api/tile-proxy?base=<url>&bbox=<minx,miny,maxx,maxy>
#[instrument(skip_all, fields(base = %params.base))]
pub async fn proxy_handler(
    Extension(state): Extension<Arc<AppState>>,
    Query(params): Query<ProxyParams>,
) -> Result<Response, ApiError> {
    let bbox = BoundingBox::from_wms_string(&params.bbox).map_err(|e| {
        metrics::record_rejected("bbox");
        ApiError::BadRequest(format!("Invalid bbox: {e}"))
    })?;
    let url = upstream_url(&params.base, &bbox).inspect_err(|_| {
        metrics::record_rejected("url");
    })?;

    let host = url.host_str().unwrap_or_default();
    if !state.host_allowed(host) {
        metrics::record_rejected("host");
        warn!(host = %host, "Upstream host not allowed");
        return Err(ApiError::Forbidden(format!("Host not allowed: {host}")));
    }

    debug!(upstream = %url, "Proxying tile request");
    let upstream = state.http.get(url.as_str()).send().await.map_err(|e| {
        metrics::record_upstream_failure();
        warn!(error = %e, "Upstream request failed");
        ApiError::BadGateway(format!("Upstream request failed: {e}"))
    })?;

    let status = StatusCode::from_u16(upstream.status().as_u16()).unwrap_or(StatusCode::BAD_GATEWAY);
    let content_type = upstream
        .headers()
        .get(reqwest::header::CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .unwrap_or("application/octet-stream")
        .to_string();
    let cache_control = upstream
        .headers()
        .get(reqwest::header::CACHE_CONTROL)
        .and_then(|v| v.to_str().ok())
        .unwrap_or("public, max-age=3600")
        .to_string();

    let body = upstream.bytes().await.map_err(|e| {
        metrics::record_upstream_failure();
        ApiError::BadGateway(format!("Upstream body failed: {e}"))
    })?;

    metrics::record_proxy_request(status.as_u16());
    if !status.is_success() {
        warn!(status = status.as_u16(), "Upstream returned an error status");
    }

    Ok((
        status,
        [
            (header::CONTENT_TYPE, content_type),
            (header::CACHE_CONTROL, cache_control),
        ],
        body,
    )
        .into_response())
}
