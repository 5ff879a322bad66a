//! Criterion benchmarks for hierarchical posterior sampling.
//!
//! Sampling dominates end-to-end runtime; these track the cost of a chain
//! iteration across measurement-set sizes and chain budgets.

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use yc_config::{SamplerSettings, YieldPriors};
use yc_core::inference::hierarchical::{HierarchicalYieldModel, NoiseSpec};

fn measurements(n: usize) -> Vec<f64> {
    (0..n).map(|i| 330.0 + (i as f64 * 7.3) % 25.0).collect()
}

fn bench_posterior_sample(c: &mut Criterion) {
    let model = HierarchicalYieldModel::new(YieldPriors::default());
    let settings = SamplerSettings {
        n_chains: 2,
        n_draws_per_chain: 200,
        n_warmup: 200,
    };

    let mut group = c.benchmark_group("inference/posterior_sample");
    for n in [6, 24, 96] {
        let data = measurements(n);
        group.bench_with_input(BenchmarkId::from_parameter(n), &data, |b, data| {
            b.iter(|| {
                model
                    .posterior_sample(
                        black_box(data),
                        &NoiseSpec::Scalar(5.0),
                        &settings,
                        42,
                        None,
                    )
                    .expect("sampling failed")
            })
        });
    }
    group.finish();
}

fn bench_prior_predictive(c: &mut Criterion) {
    let model = HierarchicalYieldModel::new(YieldPriors::default());
    c.bench_function("inference/prior_predictive_4k", |b| {
        b.iter(|| model.prior_predictive(black_box(4000), 7).expect("draws failed"))
    });
}

criterion_group!(benches, bench_posterior_sample, bench_prior_predictive);
criterion_main!(benches);
