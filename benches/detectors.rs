//! Benchmarks for change-point detection.

use brent_regimes::changepoint::{
    pelt_detect, ChangePointDetector, DetectorConfig, KernelCost, NormalCost, PeltConfig,
    SegmentationConfig, SegmentationDetector,
};
use brent_regimes::core::ReturnSeries;
use chrono::{Duration, NaiveDate};
use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};

fn generate_shifted(n: usize) -> Vec<f64> {
    (0..n)
        .map(|i| {
            let level = if i < n / 2 { 0.0 } else { 0.02 };
            level + (((i * 7919) % 101) as f64 - 50.0) * 2e-4
        })
        .collect()
}

fn as_returns(values: Vec<f64>) -> ReturnSeries {
    let start = NaiveDate::from_ymd_opt(1990, 1, 1).unwrap();
    let dates = (0..values.len())
        .map(|i| start + Duration::days(i as i64))
        .collect();
    ReturnSeries::new(dates, values).unwrap()
}

fn bench_costs(c: &mut Criterion) {
    let mut group = c.benchmark_group("pelt_costs");

    for size in [500, 1000, 2000, 4000].iter() {
        let signal = generate_shifted(*size);
        let config = PeltConfig::default().penalty(10.0).min_segment_length(50).jump(5);

        group.bench_with_input(BenchmarkId::new("Normal", size), size, |b, _| {
            let cost = NormalCost::new(&signal);
            b.iter(|| pelt_detect(black_box(&cost), &config))
        });

        group.bench_with_input(BenchmarkId::new("Kernel", size), size, |b, _| {
            let cost = KernelCost::new(&signal, 64, None, 42).unwrap();
            b.iter(|| pelt_detect(black_box(&cost), &config))
        });
    }

    group.finish();
}

fn bench_segmentation(c: &mut Criterion) {
    let mut group = c.benchmark_group("segmentation_detector");

    for size in [1000, 4000].iter() {
        let returns = as_returns(generate_shifted(*size));
        let detector = SegmentationDetector::new(
            DetectorConfig::default().n_change_points(3),
            SegmentationConfig::default(),
        );
        group.bench_with_input(BenchmarkId::new("two_pass", size), size, |b, _| {
            b.iter(|| detector.detect(black_box(&returns)))
        });
    }

    group.finish();
}

#[cfg(feature = "bayesian")]
fn bench_bayesian(c: &mut Criterion) {
    use brent_regimes::changepoint::{BayesianConfig, BayesianDetector};

    let mut group = c.benchmark_group("bayesian_detector");
    group.sample_size(10);

    let returns = as_returns(generate_shifted(1000));
    let detector = BayesianDetector::new(
        DetectorConfig::default().n_change_points(1),
        BayesianConfig::default().draws(200).tune(100).chains(2),
    );
    group.bench_function("k1_n1000", |b| b.iter(|| detector.detect(black_box(&returns))));

    group.finish();
}

#[cfg(not(feature = "bayesian"))]
fn bench_bayesian(_c: &mut Criterion) {}

criterion_group!(benches, bench_costs, bench_segmentation, bench_bayesian);
criterion_main!(benches);
