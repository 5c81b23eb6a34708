use geocluster::partition::{MapItem, classify_by_tag};
use geocluster::{
    BoundingBox, CategoryKey, ClusterEngine, ClusterError, EngineBuilder, EngineConfig,
    IndexParams, Region, SpatialIndex,
};
use std::collections::BTreeSet;

fn world() -> Region {
    Region::new(0.0, 0.0, 85.0, 180.0)
}

fn engine_at(region: Region) -> ClusterEngine<MapItem> {
    EngineBuilder::new()
        .region(region)
        .classify(classify_by_tag)
        .build()
        .expect("Failed to build engine")
}

/// Deterministic scattered markers in three categories, with every tenth item an overlay.
fn scattered(n: usize) -> Vec<MapItem> {
    let mut state: u64 = 0x2545_f491_4f6c_dd1d;
    let mut next = move || {
        state = state
            .wrapping_mul(6_364_136_223_846_793_005)
            .wrapping_add(1_442_695_040_888_963_407);
        (state >> 11) as f64 / (1u64 << 53) as f64
    };

    (0..n)
        .map(|i| {
            let lng = next() * 360.0 - 180.0;
            let lat = next() * 160.0 - 80.0;
            match i % 10 {
                9 => MapItem::overlay(),
                k => MapItem::marker(lng, lat, ["red", "green", "blue"][k % 3]),
            }
        })
        .collect()
}

#[test]
fn test_empty_input() {
    let mut engine = engine_at(world());
    let handle = engine.rebuild(Vec::new()).unwrap();

    assert!(handle.is_empty());
    let frame = engine.frame();
    assert!(frame.units.is_empty());
    assert!(frame.other.is_empty());
    assert!(!frame.spiral_active);
}

#[test]
fn test_only_overlays() {
    let mut engine = engine_at(world());
    engine
        .rebuild(vec![MapItem::overlay(), MapItem::overlay()])
        .unwrap();

    assert!(engine.handle().is_empty());
    assert_eq!(engine.frame().other, vec![0, 1]);
}

#[test]
fn test_untagged_markers_pass_through() {
    let mut engine = engine_at(world());
    engine
        .rebuild(vec![
            MapItem::untagged(1.0, 1.0),
            MapItem::marker(2.0, 2.0, "red"),
        ])
        .unwrap();

    assert_eq!(engine.frame().other, vec![0]);
    assert_eq!(engine.handle().categories().count(), 1);
}

#[test]
fn test_out_of_range_point_reports_input_index() {
    let mut engine = engine_at(world());
    let err = engine
        .rebuild(vec![
            MapItem::overlay(),
            MapItem::marker(2.0, 2.0, "red"),
            MapItem::marker(2.0, 95.0, "red"),
        ])
        .unwrap_err();

    match err {
        ClusterError::Configuration(msg) => assert!(msg.contains("input index 2"), "{}", msg),
        other => panic!("unexpected error: {:?}", other),
    }
    assert!(engine.items().is_empty());
}

#[test]
fn test_every_point_rendered_exactly_once() {
    let items = scattered(2_000);
    let mut engine = engine_at(world());
    let handle = engine.rebuild(items.clone()).unwrap();

    for category in handle.categories() {
        let index = handle.get(category).unwrap();

        for zoom in [1, 4, 8, 12, 16, 20, 21] {
            let nodes = index.query(&BoundingBox::world(), zoom);
            let total: usize = nodes.iter().map(|n| n.point_count).sum();
            assert_eq!(total, index.len(), "zoom {} category {}", zoom, category);

            let mut seen = BTreeSet::new();
            for node in &nodes {
                let leaves = match node.original_index {
                    Some(original) => vec![original],
                    None => handle
                        .leaves(category, node.id, None)
                        .unwrap()
                        .into_iter()
                        .map(|p| p.original_index)
                        .collect(),
                };
                for original in leaves {
                    assert!(seen.insert(original), "index {} rendered twice", original);
                }
            }
            assert_eq!(seen.len(), index.len());
        }
    }

    let frame = engine.frame();
    let clustered: usize = frame.clusters().map(|n| n.point_count).sum();
    assert_eq!(
        clustered + frame.singletons().count() + frame.other.len(),
        items.len()
    );
}

#[test]
fn test_cluster_counts_shrink_with_zoom() {
    let mut engine = engine_at(world());
    let handle = engine.rebuild(scattered(1_000)).unwrap();
    let index = handle.get(&CategoryKey::new("red")).unwrap();

    let mut previous = 0;
    for zoom in 1..=21 {
        let visible = index.level_len(zoom);
        assert!(visible >= previous, "zoom {}", zoom);
        previous = visible;
    }
    assert_eq!(index.level_len(21), index.len());
}

#[test]
fn test_antimeridian_region() {
    let mut engine = engine_at(Region::new(0.0, 180.0, 5.0, 1.0));
    engine
        .rebuild(vec![
            MapItem::marker(179.5, 0.0, "red"),
            MapItem::marker(-179.5, 0.0, "red"),
            MapItem::marker(0.0, 0.0, "red"),
        ])
        .unwrap();

    let mut visible: Vec<_> = engine
        .nodes(&CategoryKey::new("red"))
        .iter()
        .filter_map(|n| n.original_index)
        .collect();
    visible.sort();
    assert_eq!(visible, vec![0, 1]);
}

#[test]
fn test_coincident_points_spiral_at_max_zoom() {
    let items: Vec<_> = (0..20)
        .map(|_| MapItem::marker(2.3, 48.85, "red"))
        .collect();
    let mut engine = engine_at(Region::new(48.85, 2.3, 0.0005, 0.0005));
    engine.rebuild(items).unwrap();

    assert_eq!(engine.viewport().unwrap().zoom, 20);
    let red = engine.nodes(&CategoryKey::new("red"));
    assert_eq!(red.len(), 1);
    assert_eq!(red[0].point_count, 20);

    let positions = engine.spiral_positions();
    assert_eq!(positions.len(), 20);
    for pair in positions.windows(2) {
        assert!(pair[1].radius() > pair[0].radius());
    }
}

#[test]
fn test_zoom_clamped_to_configured_range() {
    let config = EngineConfig::default().with_index(IndexParams::default().with_zoom_range(3, 12));
    let mut engine = EngineBuilder::new()
        .config(config)
        .region(Region::new(48.85, 2.3, 0.0001, 0.0001))
        .classify(classify_by_tag)
        .build()
        .unwrap();
    engine.rebuild(vec![MapItem::marker(2.3, 48.85, "red")]).unwrap();
    assert_eq!(engine.viewport().unwrap().zoom, 12);

    engine.reproject(world()).unwrap();
    assert_eq!(engine.viewport().unwrap().zoom, 3);
}

#[test]
fn test_config_from_json_drives_engine() {
    let config = EngineConfig::from_json(
        r#"{ "index": { "radius": 60.0 }, "spiral": { "enabled": false } }"#,
    )
    .unwrap();
    assert_eq!(config.index.radius, 60.0);
    assert_eq!(config.index.max_zoom, 20);

    let mut engine = EngineBuilder::new()
        .config(config)
        .region(Region::new(48.85, 2.3, 0.0005, 0.0005))
        .classify(classify_by_tag)
        .build()
        .unwrap();
    engine
        .rebuild(vec![
            MapItem::marker(2.3, 48.85, "red"),
            MapItem::marker(2.3, 48.85, "red"),
        ])
        .unwrap();
    assert!(!engine.is_spiral_active());

    assert!(EngineConfig::from_json(r#"{ "unknown": 1 }"#).is_err());
}
