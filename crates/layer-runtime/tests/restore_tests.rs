//! Restoring saved layers and background metadata.

use std::sync::Arc;
use std::time::Duration;

use chrono::{TimeZone, Utc};
use layer_catalog::Catalog;
use layer_runtime::{
    primitive_id, restore_layers, Freshness, InMemoryPreferenceStore, JsonFilePreferenceStore,
    LayerManager, LayerPreferenceStore, LoadStatus, MetadataTracker, PersistedLayers,
    RuntimeConfig,
};
use serde_json::json;
use test_utils::{
    bogus_layer, catalog_layer, feature_layer, shipped_catalog, FakeTransport, RecordingRenderer,
};

fn saved(ids: &[&str], opacities: &[(&str, f64)]) -> PersistedLayers {
    PersistedLayers {
        active_layer_ids: ids.iter().map(|s| s.to_string()).collect(),
        opacity_by_id: opacities
            .iter()
            .map(|(id, o)| (id.to_string(), *o))
            .collect(),
    }
}

// ============================================================================
// Restore
// ============================================================================

#[tokio::test]
async fn test_restore_activates_in_saved_order() {
    let renderer = RecordingRenderer::new();
    let transport = FakeTransport::new();
    let manager = LayerManager::new(
        renderer.clone(),
        Arc::new(transport),
        RuntimeConfig::default(),
    );
    let store = InMemoryPreferenceStore::with_state(saved(
        &["qld-cadastre", "retired-layer", "au-topo"],
        &[("au-topo", 0.4)],
    ));

    let active = restore_layers(&manager, &store, &shipped_catalog())
        .await
        .unwrap();

    assert_eq!(active.ids(), vec!["qld-cadastre", "au-topo"]);
    assert!(active.iter().all(|a| a.status == LoadStatus::Ready));
    assert_eq!(
        renderer.overlay_ids(),
        vec![primitive_id("qld-cadastre"), primitive_id("au-topo")]
    );
    assert_eq!(
        renderer.paint(&primitive_id("au-topo"), "raster-opacity"),
        Some(json!(0.4))
    );
}

#[tokio::test]
async fn test_restore_with_nothing_saved() {
    let manager = LayerManager::new(
        RecordingRenderer::new(),
        Arc::new(FakeTransport::new()),
        RuntimeConfig::default(),
    );
    let active = restore_layers(&manager, &InMemoryPreferenceStore::new(), &Catalog::default())
        .await
        .unwrap();
    assert!(active.is_empty());
}

#[tokio::test]
async fn test_broken_layer_restores_as_failed() {
    let renderer = RecordingRenderer::new();
    let manager = LayerManager::new(
        renderer.clone(),
        Arc::new(FakeTransport::new()),
        RuntimeConfig::default(),
    );
    let mut builder = Catalog::builder();
    builder
        .add_layer((*bogus_layer()).clone())
        .add_layer((*catalog_layer("au-topo")).clone());
    let catalog = builder.build();
    let store = InMemoryPreferenceStore::with_state(saved(&["bogus-layer", "au-topo"], &[]));

    let active = restore_layers(&manager, &store, &catalog).await.unwrap();

    assert!(matches!(
        active.get("bogus-layer").unwrap().status,
        LoadStatus::Failed(_)
    ));
    assert_eq!(active.get("au-topo").unwrap().status, LoadStatus::Ready);
    assert_eq!(renderer.overlay_ids(), vec![primitive_id("au-topo")]);
}

#[tokio::test]
async fn test_active_set_round_trips_through_file_store() {
    let dir = tempfile::tempdir().unwrap();
    let store = JsonFilePreferenceStore::new(dir.path().join("layers.json"));
    let manager = LayerManager::new(
        RecordingRenderer::new(),
        Arc::new(FakeTransport::new()),
        RuntimeConfig::default(),
    );
    store
        .save(&saved(&["au-topo", "bne-flood"], &[("bne-flood", 0.55)]))
        .unwrap();

    let mut active = restore_layers(&manager, &store, &shipped_catalog())
        .await
        .unwrap();
    active.set_opacity("au-topo", 0.9);
    active.remove("bne-flood");
    store.save(&active.to_persisted()).unwrap();

    assert_eq!(
        store.load().unwrap(),
        Some(saved(&["au-topo"], &[("au-topo", 0.9)]))
    );
}

// ============================================================================
// Metadata
// ============================================================================

#[tokio::test]
async fn test_metadata_fetched_and_classified() {
    let transport = FakeTransport::new();
    let edited = Utc.with_ymd_and_hms(2024, 3, 1, 0, 0, 0).unwrap();
    transport
        .respond(
            "FeatureServer/0?f=json",
            json!({
                "description": "Flood extents",
                "copyrightText": "State of Queensland",
                "editingInfo": {"lastEditDate": edited.timestamp_millis()}
            }),
        )
        .respond("returnCountOnly=true", json!({"count": 42}));
    let tracker = Arc::new(MetadataTracker::new(
        Arc::new(transport),
        RuntimeConfig::default(),
    ));
    let layer = feature_layer("flood", None);

    tracker
        .spawn_fetch(Arc::clone(&layer))
        .expect("fetch should start")
        .await
        .unwrap();

    let metadata = tracker.get("flood").unwrap();
    assert_eq!(metadata.feature_count, Some(42));
    assert_eq!(metadata.copyright.as_deref(), Some("State of Queensland"));
    assert_eq!(metadata.last_edit_date, Some(edited));

    let soon = Utc.with_ymd_and_hms(2024, 4, 1, 0, 0, 0).unwrap();
    let later = Utc.with_ymd_and_hms(2025, 6, 1, 0, 0, 0).unwrap();
    assert_eq!(tracker.freshness(&layer, soon), Freshness::Current);
    assert_eq!(tracker.freshness(&layer, later), Freshness::Stale);

    // Cached: no second fetch
    assert!(tracker.spawn_fetch(Arc::clone(&layer)).is_none());
}

#[tokio::test]
async fn test_metadata_failure_is_empty() {
    let transport = FakeTransport::new();
    transport.fail("?f=json");
    let tracker = Arc::new(MetadataTracker::new(
        Arc::new(transport),
        RuntimeConfig::default(),
    ));
    let layer = feature_layer("flood", None);

    tracker.spawn_fetch(Arc::clone(&layer)).unwrap().await.unwrap();

    assert!(tracker.get("flood").is_none());
    assert_eq!(
        tracker.freshness(&layer, Utc::now()),
        Freshness::Unknown
    );
}

#[tokio::test]
async fn test_declared_date_used_without_service_metadata() {
    let tracker = MetadataTracker::new(Arc::new(FakeTransport::new()), RuntimeConfig::default());
    // "2024-06" in the shipped catalog
    let layer = catalog_layer("au-epbc-wetlands");

    let now = Utc.with_ymd_and_hms(2024, 8, 1, 0, 0, 0).unwrap();
    assert_eq!(tracker.freshness(&layer, now), Freshness::Current);
}

#[tokio::test(start_paused = true)]
async fn test_activation_does_not_wait_for_metadata() {
    let renderer = RecordingRenderer::new();
    let transport = FakeTransport::new();
    transport
        .respond("MapServer?f=json", json!({"copyrightText": "Geoscience Australia"}))
        .set_delay(Duration::from_secs(5));
    let transport = Arc::new(transport);
    let tracker = Arc::new(MetadataTracker::new(
        transport.clone(),
        RuntimeConfig::default(),
    ));
    let manager = LayerManager::new(renderer.clone(), transport, RuntimeConfig::default())
        .with_metadata(Arc::clone(&tracker));

    let started = tokio::time::Instant::now();
    manager
        .activate(catalog_layer("au-imagery"), None)
        .await
        .unwrap();

    assert_eq!(started.elapsed(), Duration::ZERO);
    assert_eq!(renderer.overlay_ids(), vec![primitive_id("au-imagery")]);
    assert!(tracker.get("au-imagery").is_none());

    tokio::time::sleep(Duration::from_secs(6)).await;
    assert_eq!(
        tracker.get("au-imagery").unwrap().copyright.as_deref(),
        Some("Geoscience Australia")
    );
}

#[tokio::test(start_paused = true)]
async fn test_metadata_landing_after_deactivate_is_dropped() {
    let renderer = RecordingRenderer::new();
    let transport = FakeTransport::new();
    transport
        .respond("MapServer?f=json", json!({"copyrightText": "Geoscience Australia"}))
        .set_delay(Duration::from_secs(5));
    let tracker = Arc::new(MetadataTracker::new(
        Arc::new(transport.clone()),
        RuntimeConfig::default(),
    ));
    let manager = LayerManager::new(
        renderer.clone(),
        Arc::new(transport.clone()),
        RuntimeConfig::default(),
    )
    .with_metadata(Arc::clone(&tracker));

    manager
        .activate(catalog_layer("au-imagery"), None)
        .await
        .unwrap();
    assert!(manager.deactivate("au-imagery").await);

    tokio::time::sleep(Duration::from_secs(30)).await;
    assert!(tracker.get("au-imagery").is_none());

    // Re-activation fetches again instead of trusting a leftover entry
    manager
        .activate(catalog_layer("au-imagery"), None)
        .await
        .unwrap();
    tokio::time::sleep(Duration::from_secs(6)).await;
    assert_eq!(transport.requests_matching("MapServer?f=json").len(), 2);
    assert_eq!(
        tracker.get("au-imagery").unwrap().copyright.as_deref(),
        Some("Geoscience Australia")
    );
}
