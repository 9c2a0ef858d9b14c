//! Layer lifecycle: the only code that mutates the renderer.
//!
//! Every overlay gets one source and one or two drawing primitives with ids
//! derived from the layer id, so activation can always find and remove what a
//! previous activation left behind.
//!
//! Each activation is stamped with a generation number. Network results are
//! applied only if the layer is still active under the same generation;
//! anything else is a stale result and is dropped. Viewport refreshes also
//! carry a per-layer sequence number, and only the latest one started may
//! land.

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex as StdMutex};

use metrics::counter;
use overlay_common::style::clamp_opacity;
use overlay_common::{
    BoundingBox, GeometryFamily, OverlayError, OverlayLayer, OverlayResult, StyleMap,
};
use overlay_protocol::{build_access, RenderDirective};
use serde_json::{json, Value};
use tokio::sync::Mutex;
use tracing::{debug, info, instrument, warn};

use crate::active::ActiveLayerSet;
use crate::config::RuntimeConfig;
use crate::geometry::GeometryResolver;
use crate::metadata::MetadataTracker;
use crate::renderer::{first_symbol_layer, LayerSpec, MapRenderer, PrimitiveKind, SourceSpec};
use crate::transport::{fetch_features, FeatureTransport};

/// Polygon fills are drawn lighter than the nominal opacity so stacked
/// layers stay readable.
pub const FILL_OPACITY_SCALE: f64 = 0.6;

const PREFIX: &str = "overlay-";
const OUTLINE_SUFFIX: &str = "-outline";
const DEFAULT_COLOR: &str = "#3388ff";

/// Renderer source id for a layer.
pub fn source_id(layer_id: &str) -> String {
    format!("{PREFIX}{layer_id}")
}

/// Main primitive id for a layer.
pub fn primitive_id(layer_id: &str) -> String {
    format!("{PREFIX}{layer_id}")
}

/// Outline primitive id for polygon layers.
pub fn outline_id(layer_id: &str) -> String {
    format!("{PREFIX}{layer_id}{OUTLINE_SUFFIX}")
}

/// What happened to a fetched result.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ApplyOutcome {
    Applied,
    /// The layer was deactivated or re-activated while the fetch ran, or a
    /// newer refresh was started
    Discarded,
    /// Nothing to do (inactive, or not feature-backed)
    Skipped,
}

#[derive(Debug, Clone)]
struct ManagedLayer {
    layer: Arc<OverlayLayer>,
    generation: u64,
    /// Bumped by every refresh started under this generation
    refresh_seq: u64,
    opacity: f64,
    /// Primitive ids and kinds, bottom to top; empty until applied
    primitives: Vec<(String, PrimitiveKind)>,
    feature_backed: bool,
}

pub struct LayerManager<R: MapRenderer> {
    renderer: Mutex<R>,
    transport: Arc<dyn FeatureTransport>,
    resolver: GeometryResolver,
    metadata: Option<Arc<MetadataTracker>>,
    config: RuntimeConfig,
    state: StdMutex<HashMap<String, ManagedLayer>>,
    color_overrides: StdMutex<HashMap<String, StyleMap>>,
    generation: AtomicU64,
}

impl<R: MapRenderer> LayerManager<R> {
    pub fn new(renderer: R, transport: Arc<dyn FeatureTransport>, config: RuntimeConfig) -> Self {
        Self {
            renderer: Mutex::new(renderer),
            resolver: GeometryResolver::standard(Arc::clone(&transport)),
            transport,
            metadata: None,
            config,
            state: StdMutex::new(HashMap::new()),
            color_overrides: StdMutex::new(HashMap::new()),
            generation: AtomicU64::new(0),
        }
    }

    pub fn with_resolver(mut self, resolver: GeometryResolver) -> Self {
        self.resolver = resolver;
        self
    }

    /// Fetch service metadata in the background whenever a layer is activated.
    pub fn with_metadata(mut self, tracker: Arc<MetadataTracker>) -> Self {
        self.metadata = Some(tracker);
        self
    }

    pub fn config(&self) -> &RuntimeConfig {
        &self.config
    }

    /// Register a data-driven colour mapping for one layer, taking precedence
    /// over any `styleMap` in its service config.
    pub fn set_color_override(&self, layer_id: &str, style_map: StyleMap) {
        if let Ok(mut overrides) = self.color_overrides.lock() {
            overrides.insert(layer_id.to_string(), style_map);
        }
    }

    pub fn clear_color_override(&self, layer_id: &str) {
        if let Ok(mut overrides) = self.color_overrides.lock() {
            overrides.remove(layer_id);
        }
    }

    /// Current renderer viewport.
    pub async fn viewport(&self) -> BoundingBox {
        self.renderer.lock().await.bounds()
    }

    pub async fn zoom(&self) -> f64 {
        self.renderer.lock().await.zoom()
    }

    pub fn is_active(&self, layer_id: &str) -> bool {
        self.state
            .lock()
            .map(|s| s.contains_key(layer_id))
            .unwrap_or(false)
    }

    /// Active layers that refresh with the viewport, sorted by id.
    pub fn feature_layer_ids(&self) -> Vec<String> {
        let mut ids: Vec<String> = self
            .state
            .lock()
            .map(|s| {
                s.iter()
                    .filter(|(_, m)| m.feature_backed)
                    .map(|(id, _)| id.clone())
                    .collect()
            })
            .unwrap_or_default();
        ids.sort();
        ids
    }

    /// Renderer primitive ids currently owned by a layer.
    pub fn primitive_ids(&self, layer_id: &str) -> Vec<String> {
        self.state
            .lock()
            .ok()
            .and_then(|s| {
                s.get(layer_id)
                    .map(|m| m.primitives.iter().map(|(id, _)| id.clone()).collect())
            })
            .unwrap_or_default()
    }

    /// Show a layer. Idempotent: anything left by a previous activation of the
    /// same layer is removed first.
    ///
    /// A configuration error is returned before the renderer is touched.
    #[instrument(skip(self, layer), fields(layer_id = %layer.id))]
    pub async fn activate(
        &self,
        layer: Arc<OverlayLayer>,
        opacity: Option<f64>,
    ) -> OverlayResult<ApplyOutcome> {
        let opacity = clamp_opacity(opacity.unwrap_or(layer.style.opacity));
        let feature_backed = layer.service.is_feature_backed();

        let bbox = if feature_backed {
            Some(self.viewport().await)
        } else {
            None
        };
        let ctx = self.config.adapter_context(bbox);
        let directive = build_access(&layer.id, &layer.service, &ctx).map_err(|e| {
            warn!(error = %e, "Rejected layer configuration");
            counter!("overlay_config_errors_total").increment(1);
            OverlayError::from(e)
        })?;

        let generation = self.begin(&layer, opacity, feature_backed)?;

        // Network work happens without the renderer lock held.
        let (source, family) = match &directive {
            RenderDirective::RasterTiles {
                url,
                tile_size,
                attribution,
            }
            | RenderDirective::RasterExport {
                url,
                tile_size,
                attribution,
                ..
            } => (
                SourceSpec::Raster {
                    tiles: vec![url.clone()],
                    tile_size: *tile_size,
                    attribution: attribution.clone(),
                },
                None,
            ),
            RenderDirective::GeoJsonFetch { url, attribution } => {
                let data = fetch_features(self.transport.as_ref(), &layer.id, url).await;
                let family = self.resolver.resolve(&layer, &data.features).await;
                (
                    SourceSpec::GeoJson {
                        data,
                        attribution: attribution.clone(),
                    },
                    Some(family),
                )
            }
            RenderDirective::VectorTiles {
                url, attribution, ..
            } => {
                let family = self.resolver.resolve(&layer, &[]).await;
                (
                    SourceSpec::Vector {
                        tiles: vec![url.clone()],
                        attribution: attribution.clone(),
                    },
                    Some(family),
                )
            }
        };

        let source_layer = match &directive {
            RenderDirective::VectorTiles { source_layer, .. } => Some(source_layer.clone()),
            _ => None,
        };
        let specs = match family {
            None => vec![self.raster_spec(&layer, opacity)],
            Some(family) => self.vector_specs(&layer, family, source_layer, opacity),
        };

        let mut renderer = self.renderer.lock().await;
        if !self.is_current(&layer.id, generation) {
            debug!("Layer changed during activation, discarding result");
            counter!("overlay_stale_results_total").increment(1);
            return Ok(ApplyOutcome::Discarded);
        }

        remove_primitives(&mut *renderer, &layer.id);

        if let Err(e) = add_primitives(&mut *renderer, &layer.id, source, &specs) {
            remove_primitives(&mut *renderer, &layer.id);
            self.end(&layer.id);
            warn!(error = %e, "Renderer rejected layer");
            return Err(OverlayError::Renderer(e.to_string()));
        }

        let primitives: Vec<(String, PrimitiveKind)> =
            specs.iter().map(|s| (s.id.clone(), s.kind)).collect();
        if let Ok(mut state) = self.state.lock() {
            if let Some(managed) = state.get_mut(&layer.id) {
                managed.primitives = primitives;
            }
        }
        drop(renderer);

        if let Some(tracker) = &self.metadata {
            tracker.spawn_fetch(Arc::clone(&layer));
        }

        info!(
            service = layer.service.kind(),
            directive = directive.kind(),
            primitives = specs.len(),
            "Activated layer"
        );
        counter!("overlay_layer_activations_total").increment(1);
        Ok(ApplyOutcome::Applied)
    }

    /// Remove a layer's primitives and source. Unknown ids are a no-op.
    ///
    /// Any fetch still in flight for the layer is discarded when it lands.
    pub async fn deactivate(&self, layer_id: &str) -> bool {
        let was_active = self.end(layer_id);

        let mut renderer = self.renderer.lock().await;
        remove_primitives(&mut *renderer, layer_id);
        drop(renderer);

        if let Some(tracker) = &self.metadata {
            tracker.forget(layer_id);
        }
        if was_active {
            debug!(layer_id = %layer_id, "Deactivated layer");
        }
        was_active
    }

    /// Re-query a feature layer for the renderer's current viewport.
    pub async fn refresh(&self, layer_id: &str) -> OverlayResult<ApplyOutcome> {
        let bbox = self.viewport().await;
        self.refresh_with_bbox(layer_id, bbox).await
    }

    /// Re-query a feature layer for `bbox` and swap the source data in place.
    #[instrument(skip(self, layer_id, bbox), fields(layer_id = %layer_id))]
    pub async fn refresh_with_bbox(
        &self,
        layer_id: &str,
        bbox: BoundingBox,
    ) -> OverlayResult<ApplyOutcome> {
        let Some((layer, generation, seq)) = self.begin_refresh(layer_id) else {
            return Ok(ApplyOutcome::Skipped);
        };

        let ctx = self.config.adapter_context(Some(bbox));
        let url = match build_access(&layer.id, &layer.service, &ctx)? {
            RenderDirective::GeoJsonFetch { url, .. } => url,
            _ => return Ok(ApplyOutcome::Skipped),
        };

        let data = fetch_features(self.transport.as_ref(), layer_id, &url).await;

        let mut renderer = self.renderer.lock().await;
        if !self.is_latest_refresh(layer_id, generation, seq) {
            debug!(seq, "Layer deactivated or refreshed again, discarding result");
            counter!("overlay_stale_results_total").increment(1);
            return Ok(ApplyOutcome::Discarded);
        }

        let source = source_id(layer_id);
        if !renderer.has_source(&source) {
            // Activation has not landed yet, or the style was wiped.
            return Ok(ApplyOutcome::Skipped);
        }
        renderer
            .set_source_data(&source, data)
            .map_err(|e| OverlayError::Renderer(e.to_string()))?;
        Ok(ApplyOutcome::Applied)
    }

    /// Set a layer's opacity.
    ///
    /// Every opacity property is tried on every primitive; the ones a
    /// primitive does not have are rejected by the renderer and ignored.
    pub async fn set_opacity(&self, layer_id: &str, value: f64) -> OverlayResult<()> {
        let opacity = clamp_opacity(value);
        let primitives = {
            let mut state = self
                .state
                .lock()
                .map_err(|_| OverlayError::Internal("layer state poisoned".to_string()))?;
            let managed = state
                .get_mut(layer_id)
                .ok_or_else(|| OverlayError::LayerNotFound(layer_id.to_string()))?;
            managed.opacity = opacity;
            managed.primitives.clone()
        };

        let mut renderer = self.renderer.lock().await;
        for (id, _) in &primitives {
            for kind in PrimitiveKind::ALL {
                let value = match kind {
                    PrimitiveKind::Fill => opacity * FILL_OPACITY_SCALE,
                    _ => opacity,
                };
                if renderer
                    .set_paint_property(id, kind.opacity_property(), json!(value))
                    .is_ok()
                {
                    debug!(layer_id = %layer_id, primitive = %id, property = kind.opacity_property(), "Opacity set");
                }
            }
        }
        Ok(())
    }

    pub async fn set_visibility(&self, layer_id: &str, visible: bool) -> OverlayResult<()> {
        let primitives = self.primitive_ids(layer_id);
        if primitives.is_empty() && !self.is_active(layer_id) {
            return Err(OverlayError::LayerNotFound(layer_id.to_string()));
        }

        let value = if visible { "visible" } else { "none" };
        let mut renderer = self.renderer.lock().await;
        for id in &primitives {
            renderer
                .set_layout_property(id, "visibility", json!(value))
                .map_err(|e| OverlayError::Renderer(e.to_string()))?;
        }
        Ok(())
    }

    /// Re-create every active layer after the basemap style was replaced.
    ///
    /// Layers are restored one at a time in the order of `active`. Failures
    /// are logged and do not stop the rest. Returns how many were restored.
    pub async fn on_style_load(&self, active: &ActiveLayerSet) -> usize {
        let mut restored = 0;
        for entry in active.iter() {
            match self
                .activate(Arc::clone(&entry.layer), Some(entry.opacity))
                .await
            {
                Ok(ApplyOutcome::Applied) => {
                    restored += 1;
                    if !entry.visible {
                        if let Err(e) = self.set_visibility(entry.id(), false).await {
                            warn!(layer_id = %entry.id(), error = %e, "Could not hide restored layer");
                        }
                    }
                }
                Ok(_) => {}
                Err(e) => {
                    warn!(layer_id = %entry.id(), error = %e, "Could not restore layer after style load")
                }
            }
        }
        info!(restored, total = active.len(), "Re-applied overlays after style load");
        restored
    }

    // ------------------------------------------------------------------------
    // Primitive specs
    // ------------------------------------------------------------------------

    fn raster_spec(&self, layer: &OverlayLayer, opacity: f64) -> LayerSpec {
        LayerSpec::new(primitive_id(&layer.id), PrimitiveKind::Raster, source_id(&layer.id))
            .paint("raster-opacity", opacity)
            .zoom_range(layer.style.min_zoom, layer.style.max_zoom)
    }

    fn vector_specs(
        &self,
        layer: &OverlayLayer,
        family: GeometryFamily,
        source_layer: Option<String>,
        opacity: f64,
    ) -> Vec<LayerSpec> {
        let style = &layer.style;
        let source = source_id(&layer.id);
        let color = self.color_for(layer);
        let stroke = style
            .stroke_color
            .as_ref()
            .map(|c| json!(c))
            .unwrap_or_else(|| color.clone());

        let base = |id: String, kind: PrimitiveKind| {
            LayerSpec::new(id, kind, source.clone())
                .source_layer(source_layer.clone())
                .zoom_range(style.min_zoom, style.max_zoom)
        };

        match family {
            GeometryFamily::Polygon => vec![
                base(primitive_id(&layer.id), PrimitiveKind::Fill)
                    .paint("fill-color", color)
                    .paint("fill-opacity", opacity * FILL_OPACITY_SCALE),
                base(outline_id(&layer.id), PrimitiveKind::Line)
                    .paint("line-color", stroke)
                    .paint("line-width", style.stroke_width.unwrap_or(1.0))
                    .paint("line-opacity", opacity),
            ],
            GeometryFamily::Line => vec![base(primitive_id(&layer.id), PrimitiveKind::Line)
                .paint("line-color", color)
                .paint("line-width", style.stroke_width.unwrap_or(2.0))
                .paint("line-opacity", opacity)],
            GeometryFamily::Point => vec![base(primitive_id(&layer.id), PrimitiveKind::Circle)
                .paint("circle-color", color)
                .paint("circle-radius", 5.0)
                .paint("circle-opacity", opacity)
                .paint("circle-stroke-color", "#ffffff")
                .paint("circle-stroke-width", 1.0)],
        }
    }

    /// Registered override, then the config `styleMap`, then a flat colour.
    fn color_for(&self, layer: &OverlayLayer) -> Value {
        let override_map = self
            .color_overrides
            .lock()
            .ok()
            .and_then(|o| o.get(&layer.id).cloned());
        if let Some(map) = override_map.as_ref().or(layer.service.style_map()) {
            return map.to_match_expression();
        }
        json!(layer
            .style
            .fill_color
            .as_deref()
            .or(layer.style.stroke_color.as_deref())
            .unwrap_or(DEFAULT_COLOR))
    }

    // ------------------------------------------------------------------------
    // Generation bookkeeping
    // ------------------------------------------------------------------------

    /// Record a new activation and return its generation.
    fn begin(
        &self,
        layer: &Arc<OverlayLayer>,
        opacity: f64,
        feature_backed: bool,
    ) -> OverlayResult<u64> {
        let generation = self.generation.fetch_add(1, Ordering::SeqCst) + 1;
        let mut state = self
            .state
            .lock()
            .map_err(|_| OverlayError::Internal("layer state poisoned".to_string()))?;
        let primitives = state
            .get(&layer.id)
            .map(|m| m.primitives.clone())
            .unwrap_or_default();
        state.insert(
            layer.id.clone(),
            ManagedLayer {
                layer: Arc::clone(layer),
                generation,
                refresh_seq: 0,
                opacity,
                primitives,
                feature_backed,
            },
        );
        Ok(generation)
    }

    /// Forget a layer. Returns whether it was active.
    fn end(&self, layer_id: &str) -> bool {
        self.state
            .lock()
            .map(|mut s| s.remove(layer_id).is_some())
            .unwrap_or(false)
    }

    fn is_current(&self, layer_id: &str, generation: u64) -> bool {
        self.state
            .lock()
            .map(|s| s.get(layer_id).is_some_and(|m| m.generation == generation))
            .unwrap_or(false)
    }

    /// Start a refresh of an active feature layer, superseding any refresh
    /// still in flight for it.
    fn begin_refresh(&self, layer_id: &str) -> Option<(Arc<OverlayLayer>, u64, u64)> {
        let mut state = self.state.lock().ok()?;
        let managed = state.get_mut(layer_id).filter(|m| m.feature_backed)?;
        managed.refresh_seq += 1;
        Some((
            Arc::clone(&managed.layer),
            managed.generation,
            managed.refresh_seq,
        ))
    }

    fn is_latest_refresh(&self, layer_id: &str, generation: u64, seq: u64) -> bool {
        self.state
            .lock()
            .map(|s| {
                s.get(layer_id)
                    .is_some_and(|m| m.generation == generation && m.refresh_seq == seq)
            })
            .unwrap_or(false)
    }
}

/// Remove the layer's derived primitives and source, skipping any that are absent.
fn remove_primitives<R: MapRenderer + ?Sized>(renderer: &mut R, layer_id: &str) {
    for id in [outline_id(layer_id), primitive_id(layer_id)] {
        if renderer.has_layer(&id) {
            if let Err(e) = renderer.remove_layer(&id) {
                warn!(layer_id = %layer_id, primitive = %id, error = %e, "Failed to remove primitive");
            }
        }
    }
    let source = source_id(layer_id);
    if renderer.has_source(&source) {
        if let Err(e) = renderer.remove_source(&source) {
            warn!(layer_id = %layer_id, error = %e, "Failed to remove source");
        }
    }
}

/// Add one source and its primitives below the first label layer.
fn add_primitives<R: MapRenderer + ?Sized>(
    renderer: &mut R,
    layer_id: &str,
    source: SourceSpec,
    specs: &[LayerSpec],
) -> Result<(), crate::renderer::RendererError> {
    let before = first_symbol_layer(renderer);
    renderer.add_source(&source_id(layer_id), source)?;
    for spec in specs {
        renderer.add_layer(spec.clone(), before.as_deref())?;
    }
    Ok(())
}
