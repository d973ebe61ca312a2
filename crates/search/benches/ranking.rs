//! Benchmarks for report ranking.

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use pawfinder_search::{
    filter_reports, sort_reports, Coordinate, FilterCriteria, PetCategory, PetReport, ReportKind,
    SortMode, SortOptions,
};

fn create_reports(count: usize) -> Vec<PetReport> {
    (0..count)
        .map(|i| {
            let category = if i % 3 == 0 { PetCategory::Dog } else { PetCategory::Cat };
            let mut report = PetReport::new(i.to_string(), ReportKind::Lost, category)
                .with_reward((i % 50) as f64 * 100.0)
                .with_event_date(format!("2024-{:02}-{:02}", i % 12 + 1, i % 28 + 1));
            if i % 10 != 0 {
                let lat = 6.0 + (i as f64 * 0.01) % 14.0;
                let lng = 97.5 + (i as f64 * 0.01) % 8.0;
                report = report.with_coordinate(Coordinate::new(lat, lng));
            }
            report
        })
        .collect()
}

fn bench_sort_modes(c: &mut Criterion) {
    let mut group = c.benchmark_group("sort_reports");
    let reference = Coordinate::new(13.7563, 100.5018);

    for size in [100, 1000, 10000].iter() {
        let reports = create_reports(*size);
        for mode in [SortMode::RewardDesc, SortMode::DateDesc, SortMode::DistanceAsc] {
            let options = SortOptions::new(mode).with_reference(Some(reference));
            group.bench_with_input(BenchmarkId::new(mode.as_str(), size), size, |b, _| {
                b.iter(|| sort_reports(black_box(&reports), black_box(&options)))
            });
        }
    }

    group.finish();
}

fn bench_filter(c: &mut Criterion) {
    let reports = create_reports(10000);
    let criteria = FilterCriteria::any().with_category(PetCategory::Cat);

    c.bench_function("filter_cats_10000", |b| {
        b.iter(|| filter_reports(black_box(&reports), black_box(&criteria)))
    });
}

criterion_group!(benches, bench_sort_modes, bench_filter);
criterion_main!(benches);
