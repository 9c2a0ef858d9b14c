//! Raw XYZ raster tiles: the template is passed through untouched.

use overlay_common::{ConfigError, XyzService};

use crate::directive::RenderDirective;
use crate::validate_url;

/// Placeholders every tile template must carry.
pub const TILE_PLACEHOLDERS: [&str; 3] = ["{z}", "{x}", "{y}"];

/// Reject templates missing any of `{z}`, `{x}`, `{y}`.
pub fn validate_template(layer_id: &str, template: &str) -> Result<(), ConfigError> {
    let missing: Vec<&str> = TILE_PLACEHOLDERS
        .iter()
        .copied()
        .filter(|p| !template.contains(p))
        .collect();

    if missing.is_empty() {
        Ok(())
    } else {
        Err(ConfigError::MalformedTemplate {
            layer_id: layer_id.to_string(),
            template: template.to_string(),
            reason: format!("missing {}", missing.join(", ")),
        })
    }
}

pub(crate) fn raster_tiles(
    layer_id: &str,
    service: &XyzService,
) -> Result<RenderDirective, ConfigError> {
    validate_url(layer_id, &service.url)?;
    validate_template(layer_id, &service.url)?;

    Ok(RenderDirective::RasterTiles {
        url: service.url.clone(),
        tile_size: service.tile_size,
        attribution: service.attribution.clone(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validate_template() {
        assert!(validate_template("l", "https://t.example.com/{z}/{x}/{y}.png").is_ok());

        let err = validate_template("l", "https://t.example.com/{z}/{x}.png").unwrap_err();
        match err {
            ConfigError::MalformedTemplate { reason, .. } => assert_eq!(reason, "missing {y}"),
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_pass_through() {
        let service = XyzService {
            url: "https://t.example.com/{z}/{x}/{y}.png".to_string(),
            requires_proxy: None,
            attribution: Some("© Example".to_string()),
            tile_size: 512,
        };
        let directive = raster_tiles("l", &service).unwrap();
        assert_eq!(directive.url(), service.url);
        assert!(matches!(
            directive,
            RenderDirective::RasterTiles { tile_size: 512, .. }
        ));
    }
}
