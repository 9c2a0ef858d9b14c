//! Runtime side of the overlay system.
//!
//! - [`LayerManager`] owns every renderer mutation for overlays
//! - [`ViewportScheduler`] debounces viewport-driven feature refreshes
//! - [`GeometryResolver`] picks fill, line or circle primitives for feature data
//! - [`MetadataTracker`] fetches service metadata in the background
//!
//! The renderer, HTTP transport and preference storage are traits so hosts
//! and tests can plug in their own.

pub mod active;
pub mod config;
pub mod geometry;
pub mod lifecycle;
pub mod metadata;
pub mod persistence;
pub mod renderer;
pub mod restore;
pub mod scheduler;
pub mod transport;

pub use active::{ActiveLayer, ActiveLayerSet, LoadStatus};
pub use config::RuntimeConfig;
pub use geometry::{
    GeometryResolver, GeometryStrategy, HintStrategy, SampleStrategy, ServiceMetadataStrategy,
};
pub use lifecycle::{
    outline_id, primitive_id, source_id, ApplyOutcome, LayerManager, FILL_OPACITY_SCALE,
};
pub use metadata::{Freshness, MetadataTracker};
pub use persistence::{
    InMemoryPreferenceStore, JsonFilePreferenceStore, LayerPreferenceStore, PersistedLayers,
};
pub use renderer::{
    LayerSpec, MapRenderer, PrimitiveKind, RendererError, SourceSpec, StyleLayer,
};
pub use restore::restore_layers;
pub use scheduler::{RefreshState, ViewportScheduler};
pub use transport::{fetch_features, FeatureTransport, HttpTransport, TransportError};
