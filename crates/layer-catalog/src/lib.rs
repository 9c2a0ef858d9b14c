//! Overlay layer catalog and registry.
//!
//! The [`Catalog`] holds the immutable layer records loaded from YAML data
//! tables. The [`LayerRegistry`] answers "which layers apply here" on top of
//! it using the coverage index.

pub mod catalog;
pub mod coverage;
pub mod jurisdiction;
pub mod registry;

pub use catalog::{Catalog, CatalogBuilder, CatalogError, CatalogFile, CatalogGroup};
pub use coverage::{bbox_intersection_percent, bbox_intersects, CoverageIndex};
pub use jurisdiction::{
    detect_viewport_state, find_jurisdiction, Jurisdiction, AUSTRALIAN_JURISDICTIONS,
};
pub use registry::{LayerFilter, LayerRegistry, Recommendation};
