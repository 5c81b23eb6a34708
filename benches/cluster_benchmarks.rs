use criterion::{BenchmarkId, Criterion, black_box, criterion_group, criterion_main};
use geocluster::partition::{MapItem, classify_by_tag};
use geocluster::{
    BoundingBox, CategoryKey, ClusterIndex, EngineBuilder, IndexParams, Point, Region,
    SpatialIndex, SpiralConfig,
};
use geocluster::compute::spiral;

fn scattered_points(n: usize) -> Vec<Point> {
    let category = CategoryKey::new("bench");
    (0..n)
        .map(|i| {
            let t = i as f64;
            let lng = (t * 137.508).rem_euclid(360.0) - 180.0;
            let lat = (t * 71.3).rem_euclid(160.0) - 80.0;
            Point::new(i, lng, lat, category.clone(), i)
        })
        .collect()
}

fn benchmark_index_build(c: &mut Criterion) {
    let mut group = c.benchmark_group("index_build");
    let params = IndexParams::default();

    for size in [1_000, 10_000, 50_000] {
        let points = scattered_points(size);
        group.bench_with_input(BenchmarkId::from_parameter(size), &points, |b, points| {
            b.iter(|| {
                ClusterIndex::build(CategoryKey::new("bench"), black_box(points.clone()), &params)
                    .unwrap()
            })
        });
    }

    group.finish();
}

fn benchmark_query(c: &mut Criterion) {
    let mut group = c.benchmark_group("query");
    let index =
        ClusterIndex::build(CategoryKey::new("bench"), scattered_points(50_000), &IndexParams::default())
            .unwrap();

    group.bench_function("world_zoom_2", |b| {
        b.iter(|| index.query(black_box(&BoundingBox::world()), 2))
    });

    group.bench_function("city_zoom_10", |b| {
        let bbox = BoundingBox::new(1.8, 48.35, 2.8, 49.35);
        b.iter(|| index.query(black_box(&bbox), 10))
    });

    group.bench_function("antimeridian_zoom_6", |b| {
        let bbox = BoundingBox::new(170.0, -20.0, -170.0, 20.0);
        b.iter(|| index.query(black_box(&bbox), 6))
    });

    group.finish();
}

fn benchmark_spiral_layout(c: &mut Criterion) {
    let mut group = c.benchmark_group("spiral_layout");
    let config = SpiralConfig::default();
    let center = geo::Point::new(2.3, 48.85);

    for size in [8, 100, 1_000] {
        let leaves = scattered_points(size);
        group.bench_with_input(BenchmarkId::from_parameter(size), &leaves, |b, leaves| {
            b.iter(|| spiral::layout(center, black_box(leaves), &config))
        });
    }

    group.finish();
}

fn benchmark_engine(c: &mut Criterion) {
    let mut group = c.benchmark_group("engine");

    let items: Vec<MapItem> = scattered_points(20_000)
        .into_iter()
        .enumerate()
        .map(|(i, p)| MapItem::marker(p.longitude(), p.latitude(), ["red", "blue"][i % 2]))
        .collect();

    let mut engine = EngineBuilder::new()
        .region(Region::new(0.0, 0.0, 60.0, 90.0))
        .classify(classify_by_tag)
        .build()
        .unwrap();

    group.bench_function("rebuild_20k", |b| {
        b.iter(|| engine.rebuild(black_box(items.clone())).unwrap())
    });

    let regions = [
        Region::new(0.0, 0.0, 60.0, 90.0),
        Region::new(48.85, 2.3, 0.5, 0.5),
        Region::new(48.85, 2.3, 0.001, 0.001),
    ];
    group.bench_function("reproject", |b| {
        let mut i = 0;
        b.iter(|| {
            engine.reproject(regions[i % regions.len()]).unwrap();
            i += 1;
        })
    });

    group.finish();
}

criterion_group!(
    benches,
    benchmark_index_build,
    benchmark_query,
    benchmark_spiral_layout,
    benchmark_engine
);
criterion_main!(benches);
