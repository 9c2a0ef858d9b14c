//! In-memory map renderer.
//!
//! Behaves like a strict style-spec renderer: adding a duplicate id or
//! removing a missing one is an error, and paint properties must belong to
//! the layer's type. Clones share state, so a test can keep a handle while
//! the lifecycle manager owns another.

use std::collections::BTreeMap;
use std::sync::{Arc, Mutex, MutexGuard};

use layer_runtime::{LayerSpec, MapRenderer, RendererError, SourceSpec, StyleLayer};
use overlay_common::{BoundingBox, FeatureCollection};
use serde_json::Value;

#[derive(Debug, Clone)]
enum StackEntry {
    Basemap(StyleLayer),
    Overlay(LayerSpec),
}

impl StackEntry {
    fn id(&self) -> &str {
        match self {
            StackEntry::Basemap(l) => &l.id,
            StackEntry::Overlay(s) => &s.id,
        }
    }

    fn style_layer(&self) -> StyleLayer {
        match self {
            StackEntry::Basemap(l) => l.clone(),
            StackEntry::Overlay(s) => StyleLayer::new(s.id.clone(), s.kind.as_str()),
        }
    }
}

#[derive(Debug)]
struct RecordingState {
    basemap: Vec<StyleLayer>,
    stack: Vec<StackEntry>,
    sources: BTreeMap<String, SourceSpec>,
    data_updates: BTreeMap<String, usize>,
    bounds: BoundingBox,
    zoom: f64,
}

#[derive(Debug, Clone)]
pub struct RecordingRenderer {
    state: Arc<Mutex<RecordingState>>,
}

impl Default for RecordingRenderer {
    fn default() -> Self {
        Self::new()
    }
}

impl RecordingRenderer {
    /// A basemap with imagery, roads and two label layers, viewing Brisbane at zoom 12.
    pub fn new() -> Self {
        Self::with_basemap(vec![
            StyleLayer::new("background", "background"),
            StyleLayer::new("imagery", "raster"),
            StyleLayer::new("roads", "line"),
            StyleLayer::new("place-labels", "symbol"),
            StyleLayer::new("poi-labels", "symbol"),
        ])
    }

    pub fn with_basemap(basemap: Vec<StyleLayer>) -> Self {
        let stack = basemap.iter().cloned().map(StackEntry::Basemap).collect();
        Self {
            state: Arc::new(Mutex::new(RecordingState {
                basemap,
                stack,
                sources: BTreeMap::new(),
                data_updates: BTreeMap::new(),
                bounds: BoundingBox::new(152.95, -27.55, 153.1, -27.4),
                zoom: 12.0,
            })),
        }
    }

    fn lock(&self) -> MutexGuard<'_, RecordingState> {
        self.state.lock().unwrap_or_else(|e| e.into_inner())
    }

    pub fn set_viewport(&self, bounds: BoundingBox, zoom: f64) {
        let mut state = self.lock();
        state.bounds = bounds;
        state.zoom = zoom;
    }

    /// Simulate a basemap style reload: all sources and overlays vanish.
    pub fn wipe(&self) {
        let mut state = self.lock();
        state.sources.clear();
        state.stack = state
            .basemap
            .iter()
            .cloned()
            .map(StackEntry::Basemap)
            .collect();
    }

    pub fn source_ids(&self) -> Vec<String> {
        self.lock().sources.keys().cloned().collect()
    }

    pub fn source(&self, id: &str) -> Option<SourceSpec> {
        self.lock().sources.get(id).cloned()
    }

    /// Ids of every layer in the style, bottom to top.
    pub fn style_ids(&self) -> Vec<String> {
        self.lock().stack.iter().map(|e| e.id().to_string()).collect()
    }

    /// Overlay layer ids, bottom to top.
    pub fn overlay_ids(&self) -> Vec<String> {
        self.lock()
            .stack
            .iter()
            .filter_map(|e| match e {
                StackEntry::Overlay(s) => Some(s.id.clone()),
                StackEntry::Basemap(_) => None,
            })
            .collect()
    }

    pub fn layer(&self, id: &str) -> Option<LayerSpec> {
        self.lock().stack.iter().find_map(|e| match e {
            StackEntry::Overlay(s) if s.id == id => Some(s.clone()),
            _ => None,
        })
    }

    pub fn paint(&self, layer_id: &str, property: &str) -> Option<Value> {
        self.layer(layer_id)?.paint.get(property).cloned()
    }

    pub fn layout(&self, layer_id: &str, property: &str) -> Option<Value> {
        self.layer(layer_id)?.layout.get(property).cloned()
    }

    /// Times `set_source_data` was called for a source.
    pub fn data_updates(&self, source_id: &str) -> usize {
        self.lock().data_updates.get(source_id).copied().unwrap_or(0)
    }

    /// Feature count currently held by a GeoJSON source.
    pub fn feature_count(&self, source_id: &str) -> Option<usize> {
        match self.lock().sources.get(source_id)? {
            SourceSpec::GeoJson { data, .. } => Some(data.len()),
            _ => None,
        }
    }

    /// Sources plus overlay layers.
    pub fn primitive_count(&self) -> usize {
        let state = self.lock();
        state.sources.len()
            + state
                .stack
                .iter()
                .filter(|e| matches!(e, StackEntry::Overlay(_)))
                .count()
    }
}

impl MapRenderer for RecordingRenderer {
    fn add_source(&mut self, id: &str, spec: SourceSpec) -> Result<(), RendererError> {
        let mut state = self.lock();
        if state.sources.contains_key(id) {
            return Err(RendererError::SourceExists(id.to_string()));
        }
        state.sources.insert(id.to_string(), spec);
        Ok(())
    }

    fn remove_source(&mut self, id: &str) -> Result<(), RendererError> {
        let mut state = self.lock();
        let in_use = state.stack.iter().any(|e| match e {
            StackEntry::Overlay(s) => s.source == id,
            StackEntry::Basemap(_) => false,
        });
        if in_use {
            return Err(RendererError::Other(format!("source {id} is in use")));
        }
        state
            .sources
            .remove(id)
            .map(|_| ())
            .ok_or_else(|| RendererError::SourceNotFound(id.to_string()))
    }

    fn has_source(&self, id: &str) -> bool {
        self.lock().sources.contains_key(id)
    }

    fn set_source_data(&mut self, id: &str, data: FeatureCollection) -> Result<(), RendererError> {
        let mut state = self.lock();
        match state.sources.get_mut(id) {
            Some(SourceSpec::GeoJson { data: current, .. }) => *current = data,
            Some(_) => return Err(RendererError::Other(format!("source {id} is not GeoJSON"))),
            None => return Err(RendererError::SourceNotFound(id.to_string())),
        }
        *state.data_updates.entry(id.to_string()).or_default() += 1;
        Ok(())
    }

    fn add_layer(&mut self, spec: LayerSpec, before_id: Option<&str>) -> Result<(), RendererError> {
        let mut state = self.lock();
        if state.stack.iter().any(|e| e.id() == spec.id) {
            return Err(RendererError::LayerExists(spec.id));
        }
        if !state.sources.contains_key(&spec.source) {
            return Err(RendererError::SourceNotFound(spec.source));
        }
        let index = match before_id {
            Some(before) => state
                .stack
                .iter()
                .position(|e| e.id() == before)
                .ok_or_else(|| RendererError::LayerNotFound(before.to_string()))?,
            None => state.stack.len(),
        };
        state.stack.insert(index, StackEntry::Overlay(spec));
        Ok(())
    }

    fn remove_layer(&mut self, id: &str) -> Result<(), RendererError> {
        let mut state = self.lock();
        let index = state
            .stack
            .iter()
            .position(|e| matches!(e, StackEntry::Overlay(s) if s.id == id))
            .ok_or_else(|| RendererError::LayerNotFound(id.to_string()))?;
        state.stack.remove(index);
        Ok(())
    }

    fn has_layer(&self, id: &str) -> bool {
        self.lock().stack.iter().any(|e| e.id() == id)
    }

    fn set_paint_property(
        &mut self,
        layer_id: &str,
        property: &str,
        value: Value,
    ) -> Result<(), RendererError> {
        let mut state = self.lock();
        let spec = state
            .stack
            .iter_mut()
            .find_map(|e| match e {
                StackEntry::Overlay(s) if s.id == layer_id => Some(s),
                _ => None,
            })
            .ok_or_else(|| RendererError::LayerNotFound(layer_id.to_string()))?;

        let prefix = format!("{}-", spec.kind.as_str());
        if !property.starts_with(&prefix) {
            return Err(RendererError::UnknownProperty {
                layer_id: layer_id.to_string(),
                property: property.to_string(),
            });
        }
        spec.paint.insert(property.to_string(), value);
        Ok(())
    }

    fn set_layout_property(
        &mut self,
        layer_id: &str,
        property: &str,
        value: Value,
    ) -> Result<(), RendererError> {
        let mut state = self.lock();
        let spec = state
            .stack
            .iter_mut()
            .find_map(|e| match e {
                StackEntry::Overlay(s) if s.id == layer_id => Some(s),
                _ => None,
            })
            .ok_or_else(|| RendererError::LayerNotFound(layer_id.to_string()))?;
        spec.layout.insert(property.to_string(), value);
        Ok(())
    }

    fn bounds(&self) -> BoundingBox {
        self.lock().bounds
    }

    fn zoom(&self) -> f64 {
        self.lock().zoom
    }

    fn style_layers(&self) -> Vec<StyleLayer> {
        self.lock().stack.iter().map(StackEntry::style_layer).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use layer_runtime::PrimitiveKind;

    #[test]
    fn test_paint_property_must_match_kind() {
        let mut renderer = RecordingRenderer::new();
        renderer
            .add_source(
                "s",
                SourceSpec::Raster {
                    tiles: vec!["https://t/{z}/{x}/{y}.png".to_string()],
                    tile_size: 256,
                    attribution: None,
                },
            )
            .unwrap();
        renderer
            .add_layer(LayerSpec::new("r", PrimitiveKind::Raster, "s"), None)
            .unwrap();

        assert!(renderer
            .set_paint_property("r", "raster-opacity", Value::from(0.5))
            .is_ok());
        assert!(renderer
            .set_paint_property("r", "fill-opacity", Value::from(0.5))
            .is_err());
        assert!(renderer
            .set_paint_property("missing", "raster-opacity", Value::from(0.5))
            .is_err());
    }

    #[test]
    fn test_insert_before_and_wipe() {
        let mut renderer = RecordingRenderer::new();
        let handle = renderer.clone();
        renderer
            .add_source(
                "s",
                SourceSpec::GeoJson {
                    data: FeatureCollection::new(),
                    attribution: None,
                },
            )
            .unwrap();
        renderer
            .add_layer(
                LayerSpec::new("f", PrimitiveKind::Fill, "s"),
                Some("place-labels"),
            )
            .unwrap();

        assert_eq!(
            handle.style_ids(),
            vec!["background", "imagery", "roads", "f", "place-labels", "poi-labels"]
        );

        handle.wipe();
        assert_eq!(handle.primitive_count(), 0);
        assert_eq!(handle.style_ids().len(), 5);
    }
}
