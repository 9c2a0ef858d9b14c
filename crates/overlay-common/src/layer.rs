//! Overlay layer definitions and reference records.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};

use crate::{BoundingBox, LayerStyle, ServiceConfig};

/// Keyword that makes a layer apply to every jurisdiction.
pub const ALL_JURISDICTIONS: &str = "all";

/// One togglable overlay dataset. Immutable once loaded from the catalog.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OverlayLayer {
    /// Unique layer identifier (e.g. "qld-cadastre")
    pub id: String,

    /// Human-readable name
    pub name: String,

    pub category: LayerCategory,

    #[serde(default)]
    pub description: String,

    pub level: LayerLevel,

    /// Id of the publishing [`DataSource`]; non-owning
    pub source_id: String,

    pub coverage: CoverageInfo,

    pub service: ServiceConfig,

    #[serde(default)]
    pub style: LayerStyle,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub quality: Option<DataQuality>,

    /// Publisher-declared update date, free text (e.g. "2024-03")
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_updated: Option<String>,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub tags: Vec<String>,
}

impl OverlayLayer {
    /// Case-insensitive substring match across name, description and tags.
    pub fn matches_text(&self, needle_lower: &str) -> bool {
        self.name.to_lowercase().contains(needle_lower)
            || self.description.to_lowercase().contains(needle_lower)
            || self
                .tags
                .iter()
                .any(|t| t.to_lowercase().contains(needle_lower))
    }
}

/// Thematic grouping used by layer pickers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum LayerCategory {
    Hazards,
    Environment,
    Planning,
    Cadastre,
    Infrastructure,
    Heritage,
    Water,
    Boundaries,
    Imagery,
    #[serde(other)]
    Other,
}

/// Government tier that publishes the layer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LayerLevel {
    National,
    State,
    Council,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DataQuality {
    /// Statutory dataset from the responsible agency
    Authoritative,
    /// Derived or modelled from other datasets
    Derived,
    /// Indicative only, not for decisions
    Indicative,
}

/// Where a layer has meaningful data.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CoverageInfo {
    /// `[minLng, minLat, maxLng, maxLat]`; zero area means no coverage
    pub bbox: BoundingBox,

    /// Jurisdiction codes, or `["all"]`. YAML may also say `jurisdictions: all`.
    #[serde(deserialize_with = "one_or_many")]
    pub jurisdictions: Vec<String>,
}

impl CoverageInfo {
    pub fn new(bbox: BoundingBox, jurisdictions: &[&str]) -> Self {
        Self {
            bbox,
            jurisdictions: jurisdictions.iter().map(|s| s.to_string()).collect(),
        }
    }

    /// Whether the layer is meaningful for the given jurisdiction code.
    pub fn applies_to(&self, jurisdiction: &str) -> bool {
        self.jurisdictions.iter().any(|j| {
            j.eq_ignore_ascii_case(ALL_JURISDICTIONS) || j.eq_ignore_ascii_case(jurisdiction)
        })
    }

    pub fn has_coverage(&self) -> bool {
        !self.bbox.is_empty()
    }
}

fn one_or_many<'de, D>(deserializer: D) -> Result<Vec<String>, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum OneOrMany {
        One(String),
        Many(Vec<String>),
    }

    Ok(match OneOrMany::deserialize(deserializer)? {
        OneOrMany::One(s) => vec![s],
        OneOrMany::Many(v) => v,
    })
}

/// Session-scoped metadata fetched from a layer's service.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LayerMetadata {
    pub last_edit_date: Option<DateTime<Utc>>,
    pub description: Option<String>,
    pub copyright: Option<String>,
    pub feature_count: Option<u64>,
}

/// Publisher of one or more layers.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DataSource {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub publisher: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub portal_url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub license: Option<String>,
}

/// A local government area with its own planning data portal.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Council {
    pub id: String,
    pub name: String,
    /// Jurisdiction code of the parent state (e.g. "QLD")
    pub state: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub portal_url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub bbox: Option<BoundingBox>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_jurisdictions_keyword_or_list() {
        let all: CoverageInfo =
            serde_json::from_str(r#"{"bbox": [112, -44, 154, -10], "jurisdictions": "all"}"#)
                .unwrap();
        assert!(all.applies_to("QLD"));
        assert!(all.applies_to("wa"));

        let listed: CoverageInfo = serde_json::from_str(
            r#"{"bbox": [138, -29.2, 153.55, -10.7], "jurisdictions": ["QLD"]}"#,
        )
        .unwrap();
        assert!(listed.applies_to("qld"));
        assert!(!listed.applies_to("NSW"));
    }

    #[test]
    fn test_zero_area_coverage() {
        let cov = CoverageInfo::new(BoundingBox::new(150.0, -27.0, 150.0, -26.0), &["QLD"]);
        assert!(!cov.has_coverage());
    }

    #[test]
    fn test_unknown_category_is_other() {
        let c: LayerCategory = serde_json::from_str("\"transport\"").unwrap();
        assert_eq!(c, LayerCategory::Other);
    }
}
