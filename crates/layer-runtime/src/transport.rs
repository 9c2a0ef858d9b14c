//! HTTP access for feature queries and service metadata.

use std::time::Duration;

use async_trait::async_trait;
use metrics::counter;
use overlay_common::FeatureCollection;
use serde_json::Value;
use thiserror::Error;
use tracing::{debug, instrument, warn};

#[derive(Debug, Error)]
pub enum TransportError {
    #[error("request to {url} failed: {message}")]
    Request { url: String, message: String },

    #[error("HTTP {status} from {url}")]
    Status { url: String, status: u16 },

    #[error("invalid response from {url}: {message}")]
    Decode { url: String, message: String },

    /// ArcGIS reports many failures as a 200 with an `error` object.
    #[error("service error from {url}: {message}")]
    Service { url: String, message: String },
}

/// Fetches JSON documents. Timeouts are the transport's concern.
#[async_trait]
pub trait FeatureTransport: Send + Sync {
    async fn get_json(&self, url: &str) -> Result<Value, TransportError>;
}

/// `reqwest`-backed transport.
#[derive(Debug, Clone)]
pub struct HttpTransport {
    client: reqwest::Client,
}

impl HttpTransport {
    pub fn new(timeout: Duration) -> Result<Self, TransportError> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .user_agent(concat!("overlay-layers/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| TransportError::Request {
                url: String::new(),
                message: e.to_string(),
            })?;
        Ok(Self { client })
    }

    pub fn with_client(client: reqwest::Client) -> Self {
        Self { client }
    }
}

#[async_trait]
impl FeatureTransport for HttpTransport {
    #[instrument(skip(self), level = "debug")]
    async fn get_json(&self, url: &str) -> Result<Value, TransportError> {
        let response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|e| TransportError::Request {
                url: url.to_string(),
                message: e.to_string(),
            })?;

        let status = response.status();
        if !status.is_success() {
            return Err(TransportError::Status {
                url: url.to_string(),
                status: status.as_u16(),
            });
        }

        response.json().await.map_err(|e| TransportError::Decode {
            url: url.to_string(),
            message: e.to_string(),
        })
    }
}

/// Fetch JSON and surface an embedded ArcGIS `error` object as a failure.
pub async fn get_service_json(
    transport: &dyn FeatureTransport,
    url: &str,
) -> Result<Value, TransportError> {
    let body = transport.get_json(url).await?;
    if let Some(err) = body.get("error") {
        let message = err
            .get("message")
            .and_then(Value::as_str)
            .unwrap_or("unknown error")
            .to_string();
        return Err(TransportError::Service {
            url: url.to_string(),
            message,
        });
    }
    Ok(body)
}

/// Fetch a GeoJSON FeatureCollection.
///
/// Never fails: any error yields an empty collection so one broken service
/// cannot hold up its siblings.
pub async fn fetch_features(
    transport: &dyn FeatureTransport,
    layer_id: &str,
    url: &str,
) -> FeatureCollection {
    let result = get_service_json(transport, url).await.and_then(|body| {
        serde_json::from_value::<FeatureCollection>(body).map_err(|e| TransportError::Decode {
            url: url.to_string(),
            message: e.to_string(),
        })
    });

    match result {
        Ok(collection) => {
            debug!(layer_id = %layer_id, features = collection.len(), "Fetched features");
            collection
        }
        Err(e) => {
            warn!(layer_id = %layer_id, error = %e, "Feature fetch failed, showing no features");
            counter!("overlay_feature_fetch_failures_total").increment(1);
            FeatureCollection::new()
        }
    }
}
