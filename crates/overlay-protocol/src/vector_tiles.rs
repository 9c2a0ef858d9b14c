//! Vector tile sources. The renderer streams tiles on demand; nothing is fetched here.

use overlay_common::{ConfigError, VectorTileService};

use crate::directive::RenderDirective;
use crate::validate_url;
use crate::xyz::validate_template;

pub(crate) fn vector_source(
    layer_id: &str,
    service: &VectorTileService,
) -> Result<RenderDirective, ConfigError> {
    validate_url(layer_id, &service.url)?;
    validate_template(layer_id, &service.url)?;

    if service.source_layer.trim().is_empty() {
        return Err(ConfigError::Invalid {
            layer_id: layer_id.to_string(),
            message: "vector tiles need a sourceLayer".to_string(),
        });
    }

    Ok(RenderDirective::VectorTiles {
        url: service.url.clone(),
        source_layer: service.source_layer.clone(),
        attribution: service.attribution.clone(),
    })
}
