//! Error types for the overlay layer crates.

use thiserror::Error;

/// Result type alias using OverlayError.
pub type OverlayResult<T> = Result<T, OverlayError>;

/// A layer definition the adapters cannot turn into a render directive.
///
/// Always scoped to one layer; other layers keep working.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConfigError {
    #[error("Layer '{layer_id}': unsupported service type")]
    UnsupportedServiceType { layer_id: String },

    #[error("Layer '{layer_id}': malformed URL template '{template}': {reason}")]
    MalformedTemplate {
        layer_id: String,
        template: String,
        reason: String,
    },

    #[error("Layer '{layer_id}': invalid service URL '{url}': {reason}")]
    InvalidUrl {
        layer_id: String,
        url: String,
        reason: String,
    },

    #[error("Layer '{layer_id}': unsupported CRS '{crs}'")]
    UnsupportedCrs { layer_id: String, crs: String },

    #[error("Layer '{layer_id}': {message}")]
    Invalid { layer_id: String, message: String },
}

impl ConfigError {
    /// Id of the layer this error belongs to.
    pub fn layer_id(&self) -> &str {
        match self {
            ConfigError::UnsupportedServiceType { layer_id }
            | ConfigError::MalformedTemplate { layer_id, .. }
            | ConfigError::InvalidUrl { layer_id, .. }
            | ConfigError::UnsupportedCrs { layer_id, .. }
            | ConfigError::Invalid { layer_id, .. } => layer_id,
        }
    }
}

/// Primary error type for overlay operations.
#[derive(Debug, Error)]
pub enum OverlayError {
    // === Configuration Errors ===
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error("Layer not found: {0}")]
    LayerNotFound(String),

    // === Renderer Errors ===
    #[error("Renderer error: {0}")]
    Renderer(String),

    // === Infrastructure Errors ===
    #[error("Persistence error: {0}")]
    Persistence(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

// Conversion from common error types
impl From<std::io::Error> for OverlayError {
    fn from(err: std::io::Error) -> Self {
        OverlayError::Internal(err.to_string())
    }
}

impl From<serde_json::Error> for OverlayError {
    fn from(err: serde_json::Error) -> Self {
        OverlayError::Internal(format!("JSON error: {}", err))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_error_carries_layer_id() {
        let err: OverlayError = ConfigError::UnsupportedServiceType {
            layer_id: "bogus-layer".to_string(),
        }
        .into();
        match err {
            OverlayError::Config(c) => assert_eq!(c.layer_id(), "bogus-layer"),
            other => panic!("unexpected error: {other}"),
        }
    }
}
