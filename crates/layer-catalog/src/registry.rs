//! Read-only queries over the catalog.

use std::cmp::Ordering;
use std::sync::Arc;

use overlay_common::{BoundingBox, LayerCategory, LayerLevel, OverlayLayer};

use crate::catalog::Catalog;
use crate::coverage::CoverageIndex;
use crate::jurisdiction::{detect_viewport_state, Jurisdiction};

/// A layer worth suggesting for the current viewport.
#[derive(Debug, Clone)]
pub struct Recommendation {
    pub layer: Arc<OverlayLayer>,
    /// Share of the viewport the layer covers, 0..=100
    pub coverage_percent: f64,
}

/// Conjunctive filter; unset fields match everything.
#[derive(Debug, Clone, Default)]
pub struct LayerFilter {
    pub text: Option<String>,
    pub category: Option<LayerCategory>,
    pub level: Option<LayerLevel>,
    pub source_id: Option<String>,
    pub jurisdiction: Option<String>,
}

impl LayerFilter {
    pub fn matches(&self, layer: &OverlayLayer) -> bool {
        if let Some(text) = &self.text {
            let needle = text.trim().to_lowercase();
            if !needle.is_empty() && !layer.matches_text(&needle) {
                return false;
            }
        }
        if self.category.is_some_and(|c| c != layer.category) {
            return false;
        }
        if self.level.is_some_and(|l| l != layer.level) {
            return false;
        }
        if let Some(source) = &self.source_id {
            if &layer.source_id != source {
                return false;
            }
        }
        if let Some(code) = &self.jurisdiction {
            if !layer.coverage.applies_to(code) {
                return false;
            }
        }
        true
    }
}

pub struct LayerRegistry {
    catalog: Arc<Catalog>,
    coverage: CoverageIndex,
}

impl LayerRegistry {
    pub fn new(catalog: Arc<Catalog>) -> Self {
        let coverage = CoverageIndex::new(catalog.layers());
        Self { catalog, coverage }
    }

    pub fn catalog(&self) -> &Arc<Catalog> {
        &self.catalog
    }

    pub fn get(&self, id: &str) -> Option<Arc<OverlayLayer>> {
        self.catalog.get(id).cloned()
    }

    /// Case-insensitive substring search over name, description and tags.
    /// A blank query matches nothing.
    pub fn search_layers(&self, query: &str) -> Vec<Arc<OverlayLayer>> {
        let needle = query.trim().to_lowercase();
        if needle.is_empty() {
            return Vec::new();
        }
        self.catalog
            .layers()
            .iter()
            .filter(|l| l.matches_text(&needle))
            .cloned()
            .collect()
    }

    pub fn filter(&self, filter: &LayerFilter) -> Vec<Arc<OverlayLayer>> {
        self.catalog
            .layers()
            .iter()
            .filter(|l| filter.matches(l))
            .cloned()
            .collect()
    }

    pub fn by_category(&self, category: LayerCategory) -> Vec<Arc<OverlayLayer>> {
        self.filter(&LayerFilter {
            category: Some(category),
            ..Default::default()
        })
    }

    pub fn by_level(&self, level: LayerLevel) -> Vec<Arc<OverlayLayer>> {
        self.filter(&LayerFilter {
            level: Some(level),
            ..Default::default()
        })
    }

    pub fn by_source(&self, source_id: &str) -> Vec<Arc<OverlayLayer>> {
        self.filter(&LayerFilter {
            source_id: Some(source_id.to_string()),
            ..Default::default()
        })
    }

    pub fn for_jurisdiction(&self, code: &str) -> Vec<Arc<OverlayLayer>> {
        self.filter(&LayerFilter {
            jurisdiction: Some(code.to_string()),
            ..Default::default()
        })
    }

    pub fn detect_viewport_state(&self, viewport: &BoundingBox) -> Option<&'static Jurisdiction> {
        detect_viewport_state(viewport)
    }

    /// Layers overlapping `viewport` whose zoom bracket contains `zoom`,
    /// most-covering first. Equal coverage keeps id order.
    pub fn recommended_layers(&self, viewport: &BoundingBox, zoom: f64) -> Vec<Recommendation> {
        let mut recs: Vec<Recommendation> = self
            .coverage
            .intersecting(viewport)
            .into_iter()
            .filter(|(layer, _)| layer.style.zoom_in_range(zoom))
            .map(|(layer, coverage_percent)| Recommendation {
                layer,
                coverage_percent,
            })
            .collect();

        recs.sort_by(|a, b| {
            b.coverage_percent
                .partial_cmp(&a.coverage_percent)
                .unwrap_or(Ordering::Equal)
                .then_with(|| a.layer.id.cmp(&b.layer.id))
        });
        recs
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_filter_matches_all() {
        let catalog = Arc::new(Catalog::default());
        let registry = LayerRegistry::new(catalog);
        assert!(registry.filter(&LayerFilter::default()).is_empty());
        assert!(registry.search_layers("   ").is_empty());
    }
}
