//! Viewport/coverage overlap tests used for layer ranking.
//!
//! Areas are computed in flat degrees. That is fine for ranking layers
//! against one viewport and wrong for anything that needs real areas.

use std::sync::Arc;

use overlay_common::{BoundingBox, OverlayLayer};

/// Strict rectangle overlap: touching edges do not count.
pub fn bbox_intersects(a: &BoundingBox, b: &BoundingBox) -> bool {
    a.intersects(b)
}

/// Share of `viewport` covered by `coverage`, 0..=100.
pub fn bbox_intersection_percent(viewport: &BoundingBox, coverage: &BoundingBox) -> f64 {
    viewport.intersection_percent(coverage)
}

/// Coverage boxes of every catalog layer, kept alongside the layer handle.
///
/// A linear scan is plenty for a few hundred layers.
#[derive(Debug, Default, Clone)]
pub struct CoverageIndex {
    entries: Vec<(BoundingBox, Arc<OverlayLayer>)>,
}

impl CoverageIndex {
    pub fn new<'a, I>(layers: I) -> Self
    where
        I: IntoIterator<Item = &'a Arc<OverlayLayer>>,
    {
        let entries = layers
            .into_iter()
            .filter(|l| l.coverage.has_coverage())
            .map(|l| (l.coverage.bbox, Arc::clone(l)))
            .collect();
        Self { entries }
    }

    /// Layers whose coverage overlaps `viewport`, with the overlap percentage.
    pub fn intersecting(&self, viewport: &BoundingBox) -> Vec<(Arc<OverlayLayer>, f64)> {
        self.entries
            .iter()
            .filter(|(bbox, _)| bbox_intersects(viewport, bbox))
            .map(|(bbox, layer)| (Arc::clone(layer), bbox_intersection_percent(viewport, bbox)))
            .collect()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
