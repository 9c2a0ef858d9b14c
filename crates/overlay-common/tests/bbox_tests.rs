//! Tests for BoundingBox overlap math used by the coverage index.

use overlay_common::bbox::{BboxParseError, BoundingBox};

// ============================================================================
// Parsing tests
// ============================================================================

#[test]
fn test_parse_bbox_negative() {
    let bbox = BoundingBox::from_wms_string("-180,-90,180,90").unwrap();
    assert_eq!(bbox, BoundingBox::new(-180.0, -90.0, 180.0, 90.0));
}

#[test]
fn test_parse_bbox_web_mercator() {
    let bbox = BoundingBox::from_wms_string(
        "16697923.618991,-3130860.678560,16853467.785946,-3037393.052342",
    )
    .unwrap();
    assert!((bbox.min_x - 16697923.618991).abs() < 1e-6);
    assert!((bbox.max_y - (-3037393.052342)).abs() < 1e-6);
}

#[test]
fn test_parse_bbox_tolerates_spaces() {
    let bbox = BoundingBox::from_wms_string(" 150, -28, 151, -27 ").unwrap();
    assert_eq!(bbox, BoundingBox::new(150.0, -28.0, 151.0, -27.0));
}

#[test]
fn test_parse_bbox_invalid_format() {
    assert!(matches!(
        BoundingBox::from_wms_string("0,0,100"),
        Err(BboxParseError::InvalidFormat(_))
    ));
    assert!(matches!(
        BoundingBox::from_wms_string(""),
        Err(BboxParseError::InvalidFormat(_))
    ));
}

#[test]
fn test_parse_bbox_rejects_non_finite() {
    assert!(matches!(
        BoundingBox::from_wms_string("NaN,0,1,1"),
        Err(BboxParseError::InvalidNumber(_))
    ));
    assert!(matches!(
        BoundingBox::from_wms_string("abc,0,100,100"),
        Err(BboxParseError::InvalidNumber(_))
    ));
}

// ============================================================================
// Intersection tests
// ============================================================================

#[test]
fn test_intersects_is_symmetric() {
    let boxes = [
        BoundingBox::new(0.0, 0.0, 10.0, 10.0),
        BoundingBox::new(5.0, 5.0, 15.0, 15.0),
        BoundingBox::new(10.0, 0.0, 20.0, 10.0),
        BoundingBox::new(20.0, 20.0, 30.0, 30.0),
        BoundingBox::new(2.0, 2.0, 3.0, 3.0),
        BoundingBox::new(4.0, 4.0, 4.0, 8.0),
        BoundingBox::new(-5.0, -5.0, 0.5, 0.5),
    ];

    for a in &boxes {
        for b in &boxes {
            assert_eq!(
                a.intersects(b),
                b.intersects(a),
                "asymmetric result for {a:?} / {b:?}"
            );
        }
    }
}

#[test]
fn test_touching_edges_do_not_intersect() {
    let a = BoundingBox::new(0.0, 0.0, 10.0, 10.0);
    let right = BoundingBox::new(10.0, 0.0, 20.0, 10.0);
    let above = BoundingBox::new(0.0, 10.0, 10.0, 20.0);
    let corner = BoundingBox::new(10.0, 10.0, 20.0, 20.0);
    assert!(!a.intersects(&right));
    assert!(!a.intersects(&above));
    assert!(!a.intersects(&corner));
}

#[test]
fn test_zero_area_box_never_intersects() {
    let coverage = BoundingBox::new(0.0, 0.0, 10.0, 10.0);
    let line = BoundingBox::new(5.0, 0.0, 5.0, 10.0);
    assert!(line.is_empty());
    assert!(!coverage.intersects(&line));
    assert!(!line.intersects(&coverage));
}

#[test]
fn test_intersection_with_self() {
    let bbox = BoundingBox::new(0.0, 0.0, 10.0, 10.0);
    assert_eq!(bbox.intersection(&bbox).unwrap(), bbox);
}

// ============================================================================
// Intersection percentage tests
// ============================================================================

#[test]
fn test_percent_viewport_inside_coverage_is_100() {
    let queensland = BoundingBox::new(138.0, -29.2, 153.55, -10.7);
    let brisbane = BoundingBox::new(152.9, -27.6, 153.2, -27.3);
    assert_eq!(brisbane.intersection_percent(&queensland), 100.0);
}

#[test]
fn test_percent_disjoint_is_zero() {
    let a = BoundingBox::new(0.0, 0.0, 1.0, 1.0);
    let b = BoundingBox::new(5.0, 5.0, 6.0, 6.0);
    assert_eq!(a.intersection_percent(&b), 0.0);
}

#[test]
fn test_percent_half_overlap() {
    let viewport = BoundingBox::new(0.0, 0.0, 10.0, 10.0);
    let coverage = BoundingBox::new(5.0, -10.0, 50.0, 50.0);
    assert!((viewport.intersection_percent(&coverage) - 50.0).abs() < 1e-9);
}

#[test]
fn test_percent_of_empty_viewport_is_zero() {
    let viewport = BoundingBox::new(1.0, 1.0, 1.0, 1.0);
    let coverage = BoundingBox::new(0.0, 0.0, 10.0, 10.0);
    assert_eq!(viewport.intersection_percent(&coverage), 0.0);
}

// ============================================================================
// Misc
// ============================================================================

#[test]
fn test_param_string() {
    let bbox = BoundingBox::new(150.0, -28.0, 151.5, -27.0);
    assert_eq!(bbox.to_param_string(), "150,-28,151.5,-27");
}
