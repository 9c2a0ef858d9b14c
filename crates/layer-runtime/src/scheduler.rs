//! Debounced viewport refresh for feature-backed layers.
//!
//! Each active feature layer moves Idle -> Pending on a move-end, Pending ->
//! Fetching when the shared debounce timer fires, and back to Idle when its
//! query lands. Another move-end before the timer fires restarts it, so a
//! burst of pans costs one query per layer, scoped to the last viewport.
//! When fetches from successive timer fires overlap, only the most recently
//! started one is applied.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use futures::future::join_all;
use overlay_common::BoundingBox;
use tokio::task::JoinHandle;
use tracing::{debug, warn};

use crate::lifecycle::{ApplyOutcome, LayerManager};
use crate::renderer::MapRenderer;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RefreshState {
    Idle,
    Pending,
    Fetching,
}

#[derive(Default)]
struct SchedulerState {
    latest_bbox: Option<BoundingBox>,
    layers: HashMap<String, RefreshState>,
    timer: Option<JoinHandle<()>>,
}

pub struct ViewportScheduler<R: MapRenderer + 'static> {
    manager: Arc<LayerManager<R>>,
    debounce: Duration,
    state: Arc<Mutex<SchedulerState>>,
}

impl<R: MapRenderer + 'static> ViewportScheduler<R> {
    pub fn new(manager: Arc<LayerManager<R>>) -> Self {
        let debounce = manager.config().debounce;
        Self::with_debounce(manager, debounce)
    }

    pub fn with_debounce(manager: Arc<LayerManager<R>>, debounce: Duration) -> Self {
        Self {
            manager,
            debounce,
            state: Arc::new(Mutex::new(SchedulerState::default())),
        }
    }

    pub fn manager(&self) -> &Arc<LayerManager<R>> {
        &self.manager
    }

    /// Handle a map move-end: mark feature layers pending and restart the timer.
    pub fn on_move_end(&self, bbox: BoundingBox) {
        let Ok(mut state) = self.state.lock() else {
            return;
        };
        state.latest_bbox = Some(bbox);
        let ids = self.manager.feature_layer_ids();
        // Layers deactivated on the manager directly leave entries behind.
        state.layers.retain(|id, _| ids.contains(id));
        for id in ids {
            state.layers.insert(id, RefreshState::Pending);
        }

        if let Some(timer) = state.timer.take() {
            timer.abort();
        }

        let manager = Arc::clone(&self.manager);
        let shared = Arc::clone(&self.state);
        let debounce = self.debounce;
        state.timer = Some(tokio::spawn(async move {
            tokio::time::sleep(debounce).await;
            // Detach the fetches so a later restart of the timer cannot cancel them.
            tokio::spawn(flush(manager, shared));
        }));
    }

    /// Deactivate a layer and drop its refresh state. A fetch in flight for
    /// it is discarded when it lands.
    pub async fn deactivate(&self, layer_id: &str) -> bool {
        if let Ok(mut state) = self.state.lock() {
            state.layers.remove(layer_id);
        }
        self.manager.deactivate(layer_id).await
    }

    pub fn state_of(&self, layer_id: &str) -> Option<RefreshState> {
        self.state.lock().ok()?.layers.get(layer_id).copied()
    }

    /// Whether a debounce timer is waiting to fire.
    pub fn is_scheduled(&self) -> bool {
        self.state
            .lock()
            .map(|s| s.timer.as_ref().is_some_and(|t| !t.is_finished()))
            .unwrap_or(false)
    }
}

impl<R: MapRenderer + 'static> Drop for ViewportScheduler<R> {
    fn drop(&mut self) {
        if let Ok(mut state) = self.state.lock() {
            if let Some(timer) = state.timer.take() {
                timer.abort();
            }
        }
    }
}

/// Refresh every pending layer concurrently with the latest viewport.
async fn flush<R: MapRenderer + 'static>(
    manager: Arc<LayerManager<R>>,
    shared: Arc<Mutex<SchedulerState>>,
) {
    let (bbox, ids) = {
        let Ok(mut state) = shared.lock() else {
            return;
        };
        let Some(bbox) = state.latest_bbox else {
            return;
        };
        let ids: Vec<String> = state
            .layers
            .iter_mut()
            .filter(|(_, s)| **s == RefreshState::Pending)
            .map(|(id, s)| {
                *s = RefreshState::Fetching;
                id.clone()
            })
            .collect();
        (bbox, ids)
    };

    if ids.is_empty() {
        return;
    }
    debug!(layers = ids.len(), bbox = %bbox.to_param_string(), "Refreshing feature layers");

    let results = join_all(ids.into_iter().map(|id| {
        let manager = Arc::clone(&manager);
        async move {
            let outcome = manager.refresh_with_bbox(&id, bbox).await;
            (id, outcome)
        }
    }))
    .await;

    let Ok(mut state) = shared.lock() else {
        return;
    };
    for (id, outcome) in results {
        match outcome {
            Ok(ApplyOutcome::Discarded) => debug!(layer_id = %id, "Dropped stale refresh"),
            Ok(_) => {}
            Err(e) => warn!(layer_id = %id, error = %e, "Viewport refresh failed"),
        }
        // A move-end during the fetch may have re-queued the layer; leave that alone.
        if let Some(s) = state.layers.get_mut(&id) {
            if *s == RefreshState::Fetching {
                *s = RefreshState::Idle;
            }
        }
    }
}
