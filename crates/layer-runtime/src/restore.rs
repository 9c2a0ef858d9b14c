//! Restoring persisted layer choices at startup.

use std::sync::Arc;

use layer_catalog::Catalog;
use overlay_common::OverlayResult;
use tracing::{info, warn};

use crate::active::{ActiveLayer, ActiveLayerSet, LoadStatus};
use crate::lifecycle::{ApplyOutcome, LayerManager};
use crate::persistence::LayerPreferenceStore;
use crate::renderer::MapRenderer;

/// Activate the layers saved in `store`, one at a time in saved order.
///
/// Activations are awaited in sequence; overlapping style mutations during
/// initial load can scramble insertion order. Ids no longer in the catalog
/// are skipped. A layer that fails to activate stays in the returned set
/// marked [`LoadStatus::Failed`].
pub async fn restore_layers<R: MapRenderer>(
    manager: &LayerManager<R>,
    store: &dyn LayerPreferenceStore,
    catalog: &Catalog,
) -> OverlayResult<ActiveLayerSet> {
    let mut active = ActiveLayerSet::new();
    let Some(saved) = store.load()? else {
        return Ok(active);
    };

    for id in &saved.active_layer_ids {
        let Some(layer) = catalog.get(id) else {
            warn!(layer_id = %id, "Saved layer is no longer in the catalog, skipping");
            continue;
        };

        let mut entry = ActiveLayer::new(Arc::clone(layer));
        if let Some(&opacity) = saved.opacity_by_id.get(id) {
            entry.opacity = overlay_common::style::clamp_opacity(opacity);
        }

        entry.status = match manager.activate(Arc::clone(layer), Some(entry.opacity)).await {
            Ok(ApplyOutcome::Applied) => LoadStatus::Ready,
            Ok(_) => LoadStatus::Loading,
            Err(e) => {
                warn!(layer_id = %id, error = %e, "Failed to restore layer");
                LoadStatus::Failed(e.to_string())
            }
        };
        active.insert(entry);
    }

    info!(
        restored = active.len(),
        saved = saved.active_layer_ids.len(),
        "Restored saved layers"
    );
    Ok(active)
}
