use geocluster::partition::{MapItem, classify_by_tag};
use geocluster::{CategoryKey, EngineBuilder, Region, SyncClusterEngine};
use parking_lot::Mutex;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::mpsc;
use std::thread;
use std::time::Duration;

type Slot = Arc<Mutex<Option<SyncClusterEngine<MapItem>>>>;

fn street() -> Region {
    Region::new(48.85, 2.30, 0.001, 0.001)
}

fn shared() -> SyncClusterEngine<MapItem> {
    let engine = EngineBuilder::new()
        .region(Region::new(48.85, 2.30, 0.5, 0.5))
        .classify(classify_by_tag)
        .build()
        .expect("Failed to build engine");
    SyncClusterEngine::new(engine)
}

fn markers(n: usize) -> Vec<MapItem> {
    (0..n)
        .map(|i| MapItem::marker(2.30 + i as f64 * 0.0001, 48.85, "red"))
        .collect()
}

#[test]
fn test_clones_share_state() {
    let engine = shared();
    let other = engine.clone();

    engine.rebuild(markers(5)).unwrap();
    assert_eq!(other.handle().categories().count(), 1);

    other.reproject(Region::new(48.85, 2.30, 0.1, 0.1)).unwrap();
    assert_eq!(engine.region().longitude_delta, 0.1);
}

#[test]
fn test_readers_see_complete_frames() {
    let engine = shared();
    engine.rebuild(markers(50)).unwrap();

    let writer = {
        let engine = engine.clone();
        thread::spawn(move || {
            for i in 0..20 {
                let n = if i % 2 == 0 { 10 } else { 50 };
                engine.rebuild(markers(n)).unwrap();
            }
        })
    };

    let readers: Vec<_> = (0..4)
        .map(|_| {
            let engine = engine.clone();
            thread::spawn(move || {
                for _ in 0..50 {
                    let total = engine.with_engine(|e| {
                        let frame = e.frame();
                        let clustered: usize = frame.clusters().map(|n| n.point_count).sum();
                        assert_eq!(
                            clustered + frame.singletons().count(),
                            e.items().len()
                        );
                        e.items().len()
                    });
                    assert!(total == 10 || total == 50);
                }
            })
        })
        .collect();

    writer.join().unwrap();
    for reader in readers {
        reader.join().unwrap();
    }
}

#[test]
fn test_activate_through_wrapper() {
    let engine = shared();
    engine.rebuild(markers(3)).unwrap();

    let red = CategoryKey::new("red");
    let id = engine.with_engine(|e| e.nodes(&red)[0].id);
    let activation = engine.activate_cluster(&red, id).unwrap();
    assert_eq!(activation.leaves.len(), 3);
    assert!(!engine.is_spiral_active());
}

#[test]
fn test_hooks_can_read_the_shared_engine() {
    let slot: Slot = Arc::new(Mutex::new(None));
    let events = Arc::new(Mutex::new(Vec::new()));

    let (markers_slot, markers_events) = (Arc::clone(&slot), Arc::clone(&events));
    let (settled_slot, settled_events) = (Arc::clone(&slot), Arc::clone(&events));

    let engine = EngineBuilder::new()
        .region(Region::new(48.85, 2.30, 0.5, 0.5))
        .classify(classify_by_tag)
        .on_markers_changed(move |_| {
            let shared = markers_slot.lock().clone();
            if let Some(shared) = shared {
                let units = shared.frame().units.len();
                let categories = shared.handle().categories().count();
                markers_events
                    .lock()
                    .push(format!("markers {} {}", units, categories));
            }
        })
        .on_region_settled(move |region, _| {
            let shared = settled_slot.lock().clone();
            if let Some(shared) = shared {
                let stored = shared.with_engine(|e| e.region().longitude_delta);
                assert_eq!(stored, region.longitude_delta);
                settled_events.lock().push("settled".to_string());
            }
        })
        .build()
        .unwrap();

    let shared = SyncClusterEngine::new(engine);
    *slot.lock() = Some(shared.clone());

    let (tx, rx) = mpsc::channel();
    let worker = shared.clone();
    thread::spawn(move || {
        worker.rebuild(markers(3)).unwrap();
        worker.reproject(Region::new(48.85, 2.30, 0.1, 0.1)).unwrap();
        tx.send(()).unwrap();
    });

    rx.recv_timeout(Duration::from_secs(5))
        .expect("transition with a reading hook did not return");

    assert_eq!(
        *events.lock(),
        vec![
            "markers 1 1".to_string(),
            "settled".to_string(),
            "markers 1 1".to_string(),
        ]
    );
    *slot.lock() = None;
}

#[test]
fn test_transition_started_from_hook() {
    let slot: Slot = Arc::new(Mutex::new(None));
    let events = Arc::new(Mutex::new(Vec::new()));
    let moved = Arc::new(AtomicBool::new(false));

    let (markers_slot, markers_events) = (Arc::clone(&slot), Arc::clone(&events));
    let settled_events = Arc::clone(&events);

    let engine = EngineBuilder::new()
        .region(Region::new(48.85, 2.30, 0.5, 0.5))
        .classify(classify_by_tag)
        .on_markers_changed(move |_| {
            markers_events.lock().push("markers");
            let shared = markers_slot.lock().clone();
            if let Some(shared) = shared {
                if !moved.swap(true, Ordering::SeqCst) {
                    shared.reproject(street()).unwrap();
                }
            }
        })
        .on_region_settled(move |_, _| settled_events.lock().push("settled"))
        .build()
        .unwrap();

    let shared = SyncClusterEngine::new(engine);
    *slot.lock() = Some(shared.clone());

    let (tx, rx) = mpsc::channel();
    let worker = shared.clone();
    thread::spawn(move || {
        worker.rebuild(markers(2)).unwrap();
        tx.send(()).unwrap();
    });

    rx.recv_timeout(Duration::from_secs(5))
        .expect("nested transition did not return");

    assert_eq!(*events.lock(), vec!["markers", "settled", "markers"]);
    assert_eq!(shared.region(), street());
    assert!(shared.is_spiral_active());
    *slot.lock() = None;
}
