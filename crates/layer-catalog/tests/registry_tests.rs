//! Catalog loading and registry queries against the shipped catalog tables.

use std::fs;
use std::path::PathBuf;
use std::sync::Arc;

use layer_catalog::{
    bbox_intersection_percent, bbox_intersects, Catalog, LayerFilter, LayerRegistry,
};
use overlay_common::{BoundingBox, LayerCategory, LayerLevel};

fn catalog_dir() -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("../../config/catalog")
}

fn registry() -> LayerRegistry {
    let catalog = Catalog::load_from_dir(catalog_dir()).expect("shipped catalog loads");
    LayerRegistry::new(Arc::new(catalog))
}

fn brisbane() -> BoundingBox {
    BoundingBox::new(152.95, -27.55, 153.1, -27.4)
}

// ============================================================================
// Loading
// ============================================================================

#[test]
fn test_shipped_catalog_loads() {
    let registry = registry();
    let catalog = registry.catalog();

    assert!(catalog.len() >= 10);
    assert!(catalog.get("qld-cadastre").is_some());
    assert_eq!(catalog.data_source("qld-spatial").unwrap().license.as_deref(), Some("CC BY 4.0"));
    assert_eq!(catalog.council("brisbane").unwrap().state, "QLD");
    assert_eq!(catalog.councils_in("qld").len(), 2);

    let group_ids: Vec<&str> = catalog.groups().iter().map(|g| g.id.as_str()).collect();
    assert_eq!(group_ids, vec!["brisbane", "national", "nsw", "qld"]);
}

#[test]
fn test_every_protocol_is_represented() {
    let registry = registry();
    let mut kinds: Vec<&str> = registry
        .catalog()
        .layers()
        .iter()
        .map(|l| l.service.kind())
        .collect();
    kinds.sort();
    kinds.dedup();
    assert_eq!(
        kinds,
        vec!["arcgis-cached", "arcgis-dynamic", "arcgis-feature", "vector-tiles", "wms", "xyz"]
    );
}

#[test]
fn test_bad_file_is_skipped() {
    let dir = tempfile::tempdir().unwrap();
    fs::write(dir.path().join("broken.yaml"), "id: [unterminated").unwrap();
    fs::write(
        dir.path().join("good.yaml"),
        r#"
id: test
name: Test
layers:
  - id: t-xyz
    name: Test tiles
    category: imagery
    level: national
    sourceId: ga
    coverage:
      bbox: [150, -30, 152, -28]
      jurisdictions: all
    service:
      type: xyz
      url: https://t.example.com/{z}/{x}/{y}.png
  - id: t-bogus
    name: Unknown protocol
    category: other
    level: state
    sourceId: ga
    coverage:
      bbox: [150, -30, 152, -28]
      jurisdictions: [QLD]
    service:
      type: bogus
      url: https://example.com
"#,
    )
    .unwrap();
    fs::write(dir.path().join("notes.txt"), "ignored").unwrap();

    let catalog = Catalog::load_from_dir(dir.path()).unwrap();
    assert_eq!(catalog.len(), 2);
    // Unknown protocols still load; the adapter rejects them per layer.
    assert_eq!(catalog.get("t-bogus").unwrap().service.kind(), "unsupported");
}

// ============================================================================
// Coverage
// ============================================================================

#[test]
fn test_intersects_is_symmetric() {
    let boxes = [
        BoundingBox::new(0.0, 0.0, 10.0, 10.0),
        BoundingBox::new(5.0, 5.0, 15.0, 15.0),
        BoundingBox::new(10.0, 0.0, 20.0, 10.0),
        BoundingBox::new(-5.0, -5.0, 0.0, 0.0),
        BoundingBox::new(2.0, 2.0, 3.0, 3.0),
    ];
    for a in &boxes {
        for b in &boxes {
            assert_eq!(bbox_intersects(a, b), bbox_intersects(b, a), "{a:?} vs {b:?}");
        }
    }
}

#[test]
fn test_intersection_percent_bounds() {
    let qld = BoundingBox::new(138.0, -29.2, 153.55, -10.7);
    assert_eq!(bbox_intersection_percent(&brisbane(), &qld), 100.0);

    let perth = BoundingBox::new(115.7, -32.1, 116.0, -31.8);
    assert_eq!(bbox_intersection_percent(&perth, &qld), 0.0);
}

// ============================================================================
// Registry queries
// ============================================================================

#[test]
fn test_search_is_case_insensitive_across_fields() {
    let registry = registry();

    let by_name: Vec<String> = registry
        .search_layers("BUSHFIRE")
        .iter()
        .map(|l| l.id.clone())
        .collect();
    assert_eq!(by_name, vec!["nsw-bushfire-prone"]);

    // "dcdb" only appears in tags
    assert_eq!(registry.search_layers("dcdb")[0].id, "qld-cadastre");

    // "ramsar" appears in the description and tags, counted once
    assert_eq!(registry.search_layers("ramsar").len(), 1);
}

#[test]
fn test_filters() {
    let registry = registry();

    assert!(registry
        .by_category(LayerCategory::Hazards)
        .iter()
        .all(|l| l.category == LayerCategory::Hazards));
    assert!(registry
        .by_level(LayerLevel::Council)
        .iter()
        .all(|l| l.id.starts_with("bne-")));
    assert_eq!(registry.by_source("nsw-spatial").len(), 2);

    // National layers apply everywhere
    let wa = registry.for_jurisdiction("WA");
    assert!(!wa.is_empty());
    assert!(wa.iter().all(|l| l.level == LayerLevel::National));

    let flood_in_qld = registry.filter(&LayerFilter {
        text: Some("flood".to_string()),
        jurisdiction: Some("QLD".to_string()),
        ..Default::default()
    });
    let mut ids: Vec<&str> = flood_in_qld.iter().map(|l| l.id.as_str()).collect();
    ids.sort();
    assert_eq!(ids, vec!["bne-flood", "qld-flood-awareness"]);
}

#[test]
fn test_recommended_layers_respect_zoom_and_sort_by_coverage() {
    let registry = registry();
    let viewport = brisbane();

    let recs = registry.recommended_layers(&viewport, 16.0);
    let ids: Vec<&str> = recs.iter().map(|r| r.layer.id.as_str()).collect();

    // Topo stops at zoom 16 inclusive, NSW layers are out of view
    assert!(ids.contains(&"au-topo"));
    assert!(ids.contains(&"qld-cadastre"));
    assert!(ids.contains(&"bne-flood"));
    assert!(!ids.iter().any(|id| id.starts_with("nsw-")));

    for pair in recs.windows(2) {
        assert!(pair[0].coverage_percent >= pair[1].coverage_percent);
    }

    // Zoomed out, the cadastre (minZoom 14) drops off
    let zoomed_out = registry.recommended_layers(&viewport, 8.0);
    assert!(zoomed_out.iter().all(|r| r.layer.id != "qld-cadastre"));
}

#[test]
fn test_viewport_state() {
    let registry = registry();
    assert_eq!(registry.detect_viewport_state(&brisbane()).unwrap().code, "QLD");

    let sydney = BoundingBox::new(151.1, -33.95, 151.3, -33.8);
    assert_eq!(registry.detect_viewport_state(&sydney).unwrap().code, "NSW");
}
