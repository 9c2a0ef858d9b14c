//! Same-origin proxy routing for CORS-restricted image services.
//!
//! Browsers refuse cross-origin images from many government servers, so
//! dynamic export and WMS URLs are wrapped as
//! `<endpoint>?base=<percent-encoded upstream>&bbox={bbox-epsg-3857}`.
//! The proxy substitutes the bbox and relays the upstream response.

use crate::directive::BBOX_TEMPLATE;

/// Proxy unless the catalog explicitly opted out.
pub fn should_proxy(requires_proxy: Option<bool>) -> bool {
    requires_proxy != Some(false)
}

/// Percent-encode a full URL for use as a single query value.
pub fn encode_component(value: &str) -> String {
    url::form_urlencoded::byte_serialize(value.as_bytes()).collect()
}

/// Wrap an upstream base URL (without bbox) in a proxy URL.
pub fn proxied_url(endpoint: &str, base: &str) -> String {
    format!(
        "{}?base={}&bbox={}",
        endpoint,
        encode_component(base),
        BBOX_TEMPLATE
    )
}

/// Direct (unproxied) URL: the base with the bbox token appended.
pub fn direct_url(base: &str) -> String {
    crate::append_query(base, &format!("bbox={}", BBOX_TEMPLATE))
}

/// Route `base` through the proxy or append the bbox token directly.
pub fn route(endpoint: &str, base: &str, requires_proxy: Option<bool>) -> (String, bool) {
    if should_proxy(requires_proxy) {
        (proxied_url(endpoint, base), true)
    } else {
        (direct_url(base), false)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_should_proxy_defaults_on() {
        assert!(should_proxy(None));
        assert!(should_proxy(Some(true)));
        assert!(!should_proxy(Some(false)));
    }

    #[test]
    fn test_proxied_url_round_trips_base() {
        let base = "https://example.gov.au/arcgis/rest/services/X/MapServer/export?f=image&layers=show%3A0";
        let url = proxied_url("/api/tile-proxy", base);

        assert!(url.starts_with("/api/tile-proxy?base="));
        assert!(url.ends_with("&bbox={bbox-epsg-3857}"));

        let query = url.split_once('?').unwrap().1;
        let base_param = url::form_urlencoded::parse(query.as_bytes())
            .find(|(k, _)| k == "base")
            .map(|(_, v)| v.into_owned())
            .unwrap();
        assert_eq!(base_param, base);
    }

    #[test]
    fn test_direct_url_keeps_token_raw() {
        assert_eq!(
            direct_url("https://a/export?f=image"),
            "https://a/export?f=image&bbox={bbox-epsg-3857}"
        );
    }
}
