//! Benchmarks for geo crate distance calculations.

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use pawfinder_geo::{distances_from, haversine_distance, Coordinate};

fn create_pins(count: usize) -> Vec<Option<Coordinate>> {
    (0..count)
        .map(|i| {
            // Every tenth report has no pin
            if i % 10 == 0 {
                return None;
            }
            let lat = 6.0 + (i as f64 * 0.01) % 14.0;
            let lng = 97.5 + (i as f64 * 0.01) % 8.0;
            Some(Coordinate::new(lat, lng))
        })
        .collect()
}

fn bench_single_distance(c: &mut Criterion) {
    let bangkok = Coordinate::new(13.7563, 100.5018);
    let chiang_mai = Coordinate::new(18.7883, 98.9853);

    c.bench_function("haversine_single", |b| {
        b.iter(|| haversine_distance(black_box(&bangkok), black_box(&chiang_mai)))
    });
}

fn bench_batch_distances(c: &mut Criterion) {
    let mut group = c.benchmark_group("distances_from");
    let reference = Coordinate::new(13.7563, 100.5018);

    for size in [10, 100, 1000, 10000].iter() {
        let pins = create_pins(*size);

        group.bench_with_input(BenchmarkId::from_parameter(size), size, |b, _| {
            b.iter(|| distances_from(black_box(Some(&reference)), black_box(&pins)))
        });
    }

    group.finish();
}

criterion_group!(benches, bench_single_distance, bench_batch_distances);
criterion_main!(benches);
