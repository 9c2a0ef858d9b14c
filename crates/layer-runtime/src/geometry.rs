//! Geometry family resolution for feature-backed layers.
//!
//! Strategies run in order and the first answer wins:
//! 1. the config's `geometryType` hint
//! 2. a majority vote over up to [`SAMPLE_SIZE`] fetched features
//! 3. the service's own `?f=json` metadata
//!
//! When none answers the layer is drawn as polygons.

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use overlay_common::{Feature, GeometryFamily, OverlayLayer};
use overlay_protocol::arcgis::service_info_url;
use serde_json::Value;
use tracing::{debug, warn};

use crate::transport::{get_service_json, FeatureTransport};

/// Features inspected by [`SampleStrategy`].
pub const SAMPLE_SIZE: usize = 10;

#[async_trait]
pub trait GeometryStrategy: Send + Sync {
    fn name(&self) -> &'static str;

    async fn resolve(&self, layer: &OverlayLayer, samples: &[Feature]) -> Option<GeometryFamily>;
}

/// Explicit `geometryType` on the service config.
#[derive(Debug, Default)]
pub struct HintStrategy;

#[async_trait]
impl GeometryStrategy for HintStrategy {
    fn name(&self) -> &'static str {
        "hint"
    }

    async fn resolve(&self, layer: &OverlayLayer, _samples: &[Feature]) -> Option<GeometryFamily> {
        layer.service.geometry_hint()
    }
}

/// Majority family among the first [`SAMPLE_SIZE`] features.
#[derive(Debug, Default)]
pub struct SampleStrategy;

impl SampleStrategy {
    /// Ties go to polygon, then line, then point.
    pub fn majority(samples: &[Feature]) -> Option<GeometryFamily> {
        let mut counts: HashMap<GeometryFamily, usize> = HashMap::new();
        for family in samples
            .iter()
            .take(SAMPLE_SIZE)
            .filter_map(|f| f.geometry_type())
            .filter_map(GeometryFamily::from_geojson_type)
        {
            *counts.entry(family).or_default() += 1;
        }

        counts
            .into_iter()
            .max_by(|(fa, ca), (fb, cb)| {
                ca.cmp(cb)
                    .then_with(|| fb.priority().cmp(&fa.priority()))
            })
            .map(|(family, _)| family)
    }
}

#[async_trait]
impl GeometryStrategy for SampleStrategy {
    fn name(&self) -> &'static str {
        "sample"
    }

    async fn resolve(&self, _layer: &OverlayLayer, samples: &[Feature]) -> Option<GeometryFamily> {
        Self::majority(samples)
    }
}

/// Declared `geometryType` from the service metadata endpoint.
pub struct ServiceMetadataStrategy {
    transport: Arc<dyn FeatureTransport>,
}

impl ServiceMetadataStrategy {
    pub fn new(transport: Arc<dyn FeatureTransport>) -> Self {
        Self { transport }
    }
}

#[async_trait]
impl GeometryStrategy for ServiceMetadataStrategy {
    fn name(&self) -> &'static str {
        "service-metadata"
    }

    async fn resolve(&self, layer: &OverlayLayer, _samples: &[Feature]) -> Option<GeometryFamily> {
        let url = service_info_url(&layer.service)?;
        match get_service_json(self.transport.as_ref(), &url).await {
            Ok(info) => info
                .get("geometryType")
                .and_then(Value::as_str)
                .and_then(GeometryFamily::from_esri),
            Err(e) => {
                debug!(layer_id = %layer.id, error = %e, "Service metadata unavailable");
                None
            }
        }
    }
}

/// Ordered list of strategies with a polygon fallback.
pub struct GeometryResolver {
    strategies: Vec<Box<dyn GeometryStrategy>>,
}

impl GeometryResolver {
    pub fn new(strategies: Vec<Box<dyn GeometryStrategy>>) -> Self {
        Self { strategies }
    }

    /// Hint, then samples, then service metadata.
    pub fn standard(transport: Arc<dyn FeatureTransport>) -> Self {
        Self::new(vec![
            Box::new(HintStrategy),
            Box::new(SampleStrategy),
            Box::new(ServiceMetadataStrategy::new(transport)),
        ])
    }

    pub async fn resolve(&self, layer: &OverlayLayer, samples: &[Feature]) -> GeometryFamily {
        for strategy in &self.strategies {
            if let Some(family) = strategy.resolve(layer, samples).await {
                debug!(
                    layer_id = %layer.id,
                    strategy = strategy.name(),
                    geometry = %family,
                    "Resolved geometry family"
                );
                return family;
            }
        }

        warn!(layer_id = %layer.id, "Could not determine geometry type, drawing as polygons");
        GeometryFamily::Polygon
    }
}
