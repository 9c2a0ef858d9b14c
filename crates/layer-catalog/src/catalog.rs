//! Static layer catalog loaded from YAML data tables.
//!
//! The config directory holds one file per publishing group (national
//! agencies, each state, each council) plus two reference tables:
//!
//! ```text
//! config/catalog/
//!   national.yaml     # id, name, jurisdiction, layers: [...]
//!   qld.yaml
//!   sources.yaml      # sources: [...]
//!   councils.yaml     # councils: [...]
//! ```
//!
//! A file that fails to parse is logged and skipped so one bad table does
//! not take the whole catalog down.

use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use overlay_common::{Council, DataSource, OverlayLayer};
use serde::Deserialize;
use thiserror::Error;
use tracing::{debug, info, warn};

const SOURCES_FILE: &str = "sources.yaml";
const COUNCILS_FILE: &str = "councils.yaml";

#[derive(Debug, Error)]
pub enum CatalogError {
    #[error("catalog directory not found: {0}")]
    DirectoryNotFound(PathBuf),

    #[error("failed to read {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse {path}: {message}")]
    Parse { path: PathBuf, message: String },
}

/// One group file: a publisher tier and the layers it contributes.
#[derive(Debug, Clone, Deserialize)]
pub struct CatalogFile {
    pub id: String,
    pub name: String,
    /// Jurisdiction code the group belongs to; absent for national groups
    #[serde(default)]
    pub jurisdiction: Option<String>,
    #[serde(default)]
    pub layers: Vec<OverlayLayer>,
}

impl CatalogFile {
    pub fn from_yaml(contents: &str) -> Result<Self, serde_yaml::Error> {
        serde_yaml::from_str(contents)
    }
}

#[derive(Debug, Deserialize)]
struct SourcesFile {
    #[serde(default)]
    sources: Vec<DataSource>,
}

#[derive(Debug, Deserialize)]
struct CouncilsFile {
    #[serde(default)]
    councils: Vec<Council>,
}

/// Named group of layer ids, in file order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CatalogGroup {
    pub id: String,
    pub name: String,
    pub jurisdiction: Option<String>,
    pub layer_ids: Vec<String>,
}

/// Immutable set of layer definitions plus reference tables.
#[derive(Debug, Default)]
pub struct Catalog {
    layers: Vec<Arc<OverlayLayer>>,
    index: HashMap<String, usize>,
    groups: Vec<CatalogGroup>,
    sources: HashMap<String, DataSource>,
    councils: HashMap<String, Council>,
}

impl Catalog {
    pub fn builder() -> CatalogBuilder {
        CatalogBuilder::default()
    }

    /// Load every `*.yaml` table in `dir`.
    ///
    /// Files are read in name order so duplicate resolution is stable.
    pub fn load_from_dir<P: AsRef<Path>>(dir: P) -> Result<Self, CatalogError> {
        let dir = dir.as_ref();
        if !dir.is_dir() {
            return Err(CatalogError::DirectoryNotFound(dir.to_path_buf()));
        }

        let entries = fs::read_dir(dir).map_err(|source| CatalogError::Io {
            path: dir.to_path_buf(),
            source,
        })?;

        let mut paths: Vec<PathBuf> = entries
            .flatten()
            .map(|e| e.path())
            .filter(|p| p.extension().and_then(|s| s.to_str()) == Some("yaml"))
            .collect();
        paths.sort();

        let mut builder = CatalogBuilder::default();
        for path in &paths {
            let contents = match fs::read_to_string(path) {
                Ok(c) => c,
                Err(e) => {
                    warn!(error = %e, path = ?path, "Failed to read catalog file");
                    continue;
                }
            };

            let file_name = path.file_name().and_then(|s| s.to_str()).unwrap_or("");
            let parsed = match file_name {
                SOURCES_FILE => serde_yaml::from_str::<SourcesFile>(&contents)
                    .map(|f| f.sources.into_iter().for_each(|s| {
                        builder.add_source(s);
                    })),
                COUNCILS_FILE => serde_yaml::from_str::<CouncilsFile>(&contents)
                    .map(|f| f.councils.into_iter().for_each(|c| {
                        builder.add_council(c);
                    })),
                _ => CatalogFile::from_yaml(&contents).map(|group| {
                    debug!(group = %group.id, layers = group.layers.len(), "Loaded catalog group");
                    builder.add_group(group);
                }),
            };

            if let Err(e) = parsed {
                warn!(error = %e, path = ?path, "Failed to parse catalog file");
            }
        }

        let catalog = builder.build();
        info!(
            layers = catalog.len(),
            groups = catalog.groups.len(),
            sources = catalog.sources.len(),
            councils = catalog.councils.len(),
            "Layer catalog loaded"
        );
        Ok(catalog)
    }

    pub fn get(&self, id: &str) -> Option<&Arc<OverlayLayer>> {
        self.index.get(id).map(|&i| &self.layers[i])
    }

    /// All layers in load order.
    pub fn layers(&self) -> &[Arc<OverlayLayer>] {
        &self.layers
    }

    pub fn groups(&self) -> &[CatalogGroup] {
        &self.groups
    }

    pub fn data_source(&self, id: &str) -> Option<&DataSource> {
        self.sources.get(id)
    }

    pub fn council(&self, id: &str) -> Option<&Council> {
        self.councils.get(id)
    }

    /// Councils belonging to a state, sorted by name.
    pub fn councils_in(&self, state: &str) -> Vec<&Council> {
        let mut councils: Vec<&Council> = self
            .councils
            .values()
            .filter(|c| c.state.eq_ignore_ascii_case(state))
            .collect();
        councils.sort_by(|a, b| a.name.cmp(&b.name));
        councils
    }

    pub fn len(&self) -> usize {
        self.layers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.layers.is_empty()
    }
}

/// Accumulates groups and reference records, rejecting duplicate layer ids.
#[derive(Debug, Default)]
pub struct CatalogBuilder {
    catalog: Catalog,
}

impl CatalogBuilder {
    pub fn add_group(&mut self, group: CatalogFile) -> &mut Self {
        let mut layer_ids = Vec::with_capacity(group.layers.len());
        for layer in group.layers {
            let id = layer.id.clone();
            if self.push_layer(layer) {
                layer_ids.push(id);
            }
        }
        self.catalog.groups.push(CatalogGroup {
            id: group.id,
            name: group.name,
            jurisdiction: group.jurisdiction,
            layer_ids,
        });
        self
    }

    /// Add a layer outside any group.
    pub fn add_layer(&mut self, layer: OverlayLayer) -> &mut Self {
        self.push_layer(layer);
        self
    }

    pub fn add_source(&mut self, source: DataSource) -> &mut Self {
        self.catalog.sources.insert(source.id.clone(), source);
        self
    }

    pub fn add_council(&mut self, council: Council) -> &mut Self {
        self.catalog.councils.insert(council.id.clone(), council);
        self
    }

    pub fn build(self) -> Catalog {
        self.catalog
    }

    /// First definition of an id wins.
    fn push_layer(&mut self, layer: OverlayLayer) -> bool {
        if self.catalog.index.contains_key(&layer.id) {
            warn!(layer = %layer.id, "Duplicate layer id in catalog, keeping first definition");
            return false;
        }
        self.catalog
            .index
            .insert(layer.id.clone(), self.catalog.layers.len());
        self.catalog.layers.push(Arc::new(layer));
        true
    }
}
