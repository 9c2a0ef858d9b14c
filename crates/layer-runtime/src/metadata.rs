//! Background metadata and freshness tracking.
//!
//! Metadata is fetched on a spawned task when a layer is activated and is
//! never awaited before the layer is shown. Failures leave the entry empty.
//! A fetch whose layer was forgotten while it ran drops its result.

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex};

use chrono::{DateTime, NaiveDate, Utc};
use overlay_common::{LayerMetadata, OverlayLayer, ServiceConfig};
use overlay_protocol::arcgis::{feature_count_url, service_info_url};
use serde::Serialize;
use serde_json::Value;
use tokio::task::JoinHandle;
use tracing::{debug, warn};

use crate::config::RuntimeConfig;
use crate::transport::{get_service_json, FeatureTransport};

/// How recently a layer's data was edited.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Freshness {
    Current,
    Aging,
    Stale,
    Unknown,
}

impl Freshness {
    pub fn classify(
        edited: Option<DateTime<Utc>>,
        now: DateTime<Utc>,
        current_days: i64,
        aging_days: i64,
    ) -> Self {
        let Some(edited) = edited else {
            return Freshness::Unknown;
        };
        let age = (now - edited).num_days();
        if age <= current_days {
            Freshness::Current
        } else if age <= aging_days {
            Freshness::Aging
        } else {
            Freshness::Stale
        }
    }
}

/// Parse a publisher-declared date: `YYYY-MM-DD`, `YYYY-MM` or `YYYY`.
pub fn parse_declared_date(s: &str) -> Option<DateTime<Utc>> {
    let s = s.trim();
    let date = NaiveDate::parse_from_str(s, "%Y-%m-%d")
        .or_else(|_| NaiveDate::parse_from_str(&format!("{s}-01"), "%Y-%m-%d"))
        .or_else(|_| NaiveDate::parse_from_str(&format!("{s}-01-01"), "%Y-%m-%d"))
        .ok()?;
    Some(date.and_hms_opt(0, 0, 0)?.and_utc())
}

/// Extract metadata fields from an ArcGIS `?f=json` layer description.
pub fn parse_service_info(info: &Value) -> LayerMetadata {
    let last_edit_date = info
        .pointer("/editingInfo/lastEditDate")
        .and_then(Value::as_i64)
        .and_then(DateTime::from_timestamp_millis);

    let description = ["description", "serviceDescription"]
        .iter()
        .filter_map(|k| info.get(*k).and_then(Value::as_str))
        .map(str::trim)
        .find(|s| !s.is_empty())
        .map(str::to_string);

    let copyright = info
        .get("copyrightText")
        .and_then(Value::as_str)
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string);

    LayerMetadata {
        last_edit_date,
        description,
        copyright,
        feature_count: None,
    }
}

pub struct MetadataTracker {
    transport: Arc<dyn FeatureTransport>,
    config: RuntimeConfig,
    /// `None` marks a fetch that completed without usable metadata
    cache: Mutex<HashMap<String, Option<LayerMetadata>>>,
    /// Layer id to the token of its running fetch
    in_flight: Mutex<HashMap<String, u64>>,
    next_token: AtomicU64,
}

impl MetadataTracker {
    pub fn new(transport: Arc<dyn FeatureTransport>, config: RuntimeConfig) -> Self {
        Self {
            transport,
            config,
            cache: Mutex::new(HashMap::new()),
            in_flight: Mutex::new(HashMap::new()),
            next_token: AtomicU64::new(0),
        }
    }

    /// Start a background fetch unless one is cached or already running.
    pub fn spawn_fetch(self: &Arc<Self>, layer: Arc<OverlayLayer>) -> Option<JoinHandle<()>> {
        if service_info_url(&layer.service).is_none() {
            return None;
        }
        let token = {
            let cache = self.cache.lock().ok()?;
            if cache.contains_key(&layer.id) {
                return None;
            }
            let mut in_flight = self.in_flight.lock().ok()?;
            if in_flight.contains_key(&layer.id) {
                return None;
            }
            let token = self.next_token.fetch_add(1, Ordering::SeqCst);
            in_flight.insert(layer.id.clone(), token);
            token
        };

        let tracker = Arc::clone(self);
        Some(tokio::spawn(async move {
            let metadata = tracker.fetch(&layer).await;
            // Same lock order as above and in `forget`.
            let Ok(mut cache) = tracker.cache.lock() else {
                return;
            };
            let Ok(mut in_flight) = tracker.in_flight.lock() else {
                return;
            };
            if in_flight.get(&layer.id) != Some(&token) {
                debug!(layer_id = %layer.id, "Layer forgotten during metadata fetch, dropping result");
                return;
            }
            in_flight.remove(&layer.id);
            cache.insert(layer.id.clone(), metadata);
        }))
    }

    /// Fetch metadata now. `None` when the protocol has no metadata endpoint
    /// or the service could not be reached.
    pub async fn fetch(&self, layer: &OverlayLayer) -> Option<LayerMetadata> {
        let url = service_info_url(&layer.service)?;
        let info = match get_service_json(self.transport.as_ref(), &url).await {
            Ok(info) => info,
            Err(e) => {
                warn!(layer_id = %layer.id, error = %e, "Metadata fetch failed");
                return None;
            }
        };

        let mut metadata = parse_service_info(&info);

        if let ServiceConfig::ArcgisFeature(service) = &layer.service {
            let count_url = feature_count_url(service);
            match get_service_json(self.transport.as_ref(), &count_url).await {
                Ok(body) => metadata.feature_count = body.get("count").and_then(Value::as_u64),
                Err(e) => debug!(layer_id = %layer.id, error = %e, "Feature count unavailable"),
            }
        }

        Some(metadata)
    }

    pub fn get(&self, layer_id: &str) -> Option<LayerMetadata> {
        self.cache.lock().ok()?.get(layer_id).cloned().flatten()
    }

    /// Drop cached metadata and orphan any fetch still running for the layer.
    pub fn forget(&self, layer_id: &str) {
        if let Ok(mut cache) = self.cache.lock() {
            cache.remove(layer_id);
            if let Ok(mut in_flight) = self.in_flight.lock() {
                in_flight.remove(layer_id);
            }
        }
    }

    /// Freshness from the service's last edit date, falling back to the
    /// catalog's declared update date.
    pub fn freshness(&self, layer: &OverlayLayer, now: DateTime<Utc>) -> Freshness {
        let edited = self
            .get(&layer.id)
            .and_then(|m| m.last_edit_date)
            .or_else(|| layer.last_updated.as_deref().and_then(parse_declared_date));
        Freshness::classify(edited, now, self.config.current_days, self.config.aging_days)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, TimeZone};
    use serde_json::json;

    #[test]
    fn test_classify() {
        let now = Utc.with_ymd_and_hms(2024, 12, 1, 0, 0, 0).unwrap();
        let classify = |days: i64| Freshness::classify(Some(now - Duration::days(days)), now, 90, 365);

        assert_eq!(classify(10), Freshness::Current);
        assert_eq!(classify(90), Freshness::Current);
        assert_eq!(classify(91), Freshness::Aging);
        assert_eq!(classify(400), Freshness::Stale);
        assert_eq!(Freshness::classify(None, now, 90, 365), Freshness::Unknown);
    }

    #[test]
    fn test_declared_dates() {
        let month = parse_declared_date("2024-06").unwrap();
        assert_eq!(month, Utc.with_ymd_and_hms(2024, 6, 1, 0, 0, 0).unwrap());
        assert!(parse_declared_date("2024-06-15").is_some());
        assert!(parse_declared_date("2023").is_some());
        assert!(parse_declared_date("last spring").is_none());
    }

    #[test]
    fn test_parse_service_info() {
        let info = json!({
            "name": "Flood Awareness",
            "description": "  ",
            "serviceDescription": "Floodplain assessment overlay",
            "copyrightText": "State of Queensland",
            "editingInfo": {"lastEditDate": 1_700_000_000_000_i64}
        });
        let metadata = parse_service_info(&info);
        assert_eq!(metadata.description.as_deref(), Some("Floodplain assessment overlay"));
        assert_eq!(metadata.copyright.as_deref(), Some("State of Queensland"));
        assert_eq!(
            metadata.last_edit_date.unwrap().timestamp_millis(),
            1_700_000_000_000
        );
    }
}
