//! Layer preference persistence port.

use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use overlay_common::{OverlayError, OverlayResult};
use serde::{Deserialize, Serialize};
use tracing::warn;

/// What survives between sessions: which layers were on and how opaque.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PersistedLayers {
    #[serde(default)]
    pub active_layer_ids: Vec<String>,
    #[serde(default)]
    pub opacity_by_id: BTreeMap<String, f64>,
}

/// Load/save of [`PersistedLayers`]. The storage medium is the implementor's business.
pub trait LayerPreferenceStore: Send + Sync {
    /// `Ok(None)` when nothing has been saved yet.
    fn load(&self) -> OverlayResult<Option<PersistedLayers>>;

    fn save(&self, state: &PersistedLayers) -> OverlayResult<()>;
}

#[derive(Debug, Default)]
pub struct InMemoryPreferenceStore {
    state: Mutex<Option<PersistedLayers>>,
}

impl InMemoryPreferenceStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_state(state: PersistedLayers) -> Self {
        Self {
            state: Mutex::new(Some(state)),
        }
    }
}

impl LayerPreferenceStore for InMemoryPreferenceStore {
    fn load(&self) -> OverlayResult<Option<PersistedLayers>> {
        let state = self
            .state
            .lock()
            .map_err(|_| OverlayError::Persistence("preference store poisoned".to_string()))?;
        Ok(state.clone())
    }

    fn save(&self, state: &PersistedLayers) -> OverlayResult<()> {
        let mut slot = self
            .state
            .lock()
            .map_err(|_| OverlayError::Persistence("preference store poisoned".to_string()))?;
        *slot = Some(state.clone());
        Ok(())
    }
}

/// Preferences in a JSON file.
#[derive(Debug, Clone)]
pub struct JsonFilePreferenceStore {
    path: PathBuf,
}

impl JsonFilePreferenceStore {
    pub fn new<P: AsRef<Path>>(path: P) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl LayerPreferenceStore for JsonFilePreferenceStore {
    /// A corrupt file is treated as no saved state.
    fn load(&self) -> OverlayResult<Option<PersistedLayers>> {
        let contents = match fs::read_to_string(&self.path) {
            Ok(c) => c,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(OverlayError::Persistence(e.to_string())),
        };

        match serde_json::from_str(&contents) {
            Ok(state) => Ok(Some(state)),
            Err(e) => {
                warn!(error = %e, path = ?self.path, "Ignoring unreadable layer preferences");
                Ok(None)
            }
        }
    }

    fn save(&self, state: &PersistedLayers) -> OverlayResult<()> {
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent)
                    .map_err(|e| OverlayError::Persistence(e.to_string()))?;
            }
        }
        let json = serde_json::to_string_pretty(state)?;
        fs::write(&self.path, json).map_err(|e| OverlayError::Persistence(e.to_string()))
    }
}
