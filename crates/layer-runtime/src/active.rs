//! Caller-held record of which layers are switched on.
//!
//! The lifecycle manager reads this set after a style reload but never owns
//! it; the UI decides what is active.

use std::collections::BTreeMap;
use std::sync::Arc;

use overlay_common::style::clamp_opacity;
use overlay_common::OverlayLayer;

use crate::persistence::PersistedLayers;

#[derive(Debug, Clone, PartialEq)]
pub enum LoadStatus {
    Loading,
    Ready,
    /// Loaded but the service returned no features
    Empty,
    /// Toggled on but could not be shown
    Failed(String),
}

#[derive(Debug, Clone)]
pub struct ActiveLayer {
    pub layer: Arc<OverlayLayer>,
    pub opacity: f64,
    pub visible: bool,
    pub status: LoadStatus,
}

impl ActiveLayer {
    pub fn new(layer: Arc<OverlayLayer>) -> Self {
        let opacity = layer.style.clamped_opacity();
        Self {
            layer,
            opacity,
            visible: true,
            status: LoadStatus::Loading,
        }
    }

    pub fn id(&self) -> &str {
        &self.layer.id
    }
}

/// Active layers in activation order.
#[derive(Debug, Clone, Default)]
pub struct ActiveLayerSet {
    layers: Vec<ActiveLayer>,
}

impl ActiveLayerSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add or replace, keeping the original position on replace.
    pub fn insert(&mut self, active: ActiveLayer) {
        match self.layers.iter_mut().find(|a| a.id() == active.id()) {
            Some(existing) => *existing = active,
            None => self.layers.push(active),
        }
    }

    pub fn remove(&mut self, layer_id: &str) -> Option<ActiveLayer> {
        let pos = self.layers.iter().position(|a| a.id() == layer_id)?;
        Some(self.layers.remove(pos))
    }

    pub fn get(&self, layer_id: &str) -> Option<&ActiveLayer> {
        self.layers.iter().find(|a| a.id() == layer_id)
    }

    pub fn get_mut(&mut self, layer_id: &str) -> Option<&mut ActiveLayer> {
        self.layers.iter_mut().find(|a| a.id() == layer_id)
    }

    pub fn contains(&self, layer_id: &str) -> bool {
        self.get(layer_id).is_some()
    }

    pub fn set_opacity(&mut self, layer_id: &str, opacity: f64) -> bool {
        match self.get_mut(layer_id) {
            Some(active) => {
                active.opacity = clamp_opacity(opacity);
                true
            }
            None => false,
        }
    }

    pub fn set_status(&mut self, layer_id: &str, status: LoadStatus) {
        if let Some(active) = self.get_mut(layer_id) {
            active.status = status;
        }
    }

    pub fn iter(&self) -> impl Iterator<Item = &ActiveLayer> {
        self.layers.iter()
    }

    pub fn ids(&self) -> Vec<String> {
        self.layers.iter().map(|a| a.id().to_string()).collect()
    }

    pub fn len(&self) -> usize {
        self.layers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.layers.is_empty()
    }

    pub fn to_persisted(&self) -> PersistedLayers {
        PersistedLayers {
            active_layer_ids: self.ids(),
            opacity_by_id: self
                .layers
                .iter()
                .map(|a| (a.id().to_string(), a.opacity))
                .collect::<BTreeMap<_, _>>(),
        }
    }
}
