use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use llr_impute::prelude::*;
use llr_impute::selection::least_indices;
use rand::prelude::*;
use rand_xoshiro::Xoshiro256PlusPlus;

fn create_data(n_rows: usize, n_features: usize, missing_rate: f64) -> Dataset {
    let mut rng = Xoshiro256PlusPlus::seed_from_u64(42);

    let rows = (0..n_rows)
        .map(|_| {
            let base: Vec<f64> = (0..n_features - 1).map(|_| rng.gen::<f64>() * 10.0).collect();
            // Last column depends on the others
            let target = base.iter().sum::<f64>() + rng.gen::<f64>() * 0.1;
            let values: Vec<f64> = base
                .into_iter()
                .map(|v| if rng.gen::<f64>() < missing_rate { f64::NAN } else { v })
                .chain(std::iter::once(target))
                .collect();
            Row::from_numeric(&values)
        })
        .collect();

    Dataset::new(Schema::numeric(n_features), rows).unwrap()
}

fn bench_selection(c: &mut Criterion) {
    let mut group = c.benchmark_group("selection");
    let mut rng = Xoshiro256PlusPlus::seed_from_u64(7);

    for n in [1_000, 10_000, 100_000].iter() {
        let keys: Vec<f64> = (0..*n).map(|_| rng.gen::<f64>()).collect();
        group.bench_with_input(BenchmarkId::new("least_indices_k50", n), &keys, |b, keys| {
            b.iter(|| {
                let mut work = keys.clone();
                least_indices(black_box(&mut work), 50).unwrap()
            })
        });
    }

    group.finish();
}

fn bench_solvers(c: &mut Criterion) {
    let mut group = c.benchmark_group("solvers");
    let dataset = create_data(2000, 12, 0.1);

    for solver in [
        SolverStrategy::Uniform,
        SolverStrategy::Optimize1D,
        SolverStrategy::Optimize2D,
        SolverStrategy::GenericQp,
    ] {
        let config = LlrConfig::new()
            .with_k(20)
            .with_neighbor_strategy(NeighborStrategy::BruteForce)
            .with_solver(solver);
        let mut engine = LlrEngine::new(config).unwrap();
        engine.train(&dataset, 11).unwrap();

        group.bench_function(BenchmarkId::new("impute", format!("{:?}", solver)), |b| {
            b.iter(|| engine.impute(black_box(&dataset)).unwrap())
        });
    }

    group.finish();
}

fn bench_neighbor_strategies(c: &mut Criterion) {
    let mut group = c.benchmark_group("neighbors");
    group.sample_size(10);

    for n_rows in [1000, 5000].iter() {
        let dataset = create_data(*n_rows, 10, 0.05);
        for strategy in [NeighborStrategy::BruteForce, NeighborStrategy::Approximate] {
            let config = LlrConfig::new().with_k(10).with_neighbor_strategy(strategy);
            let mut engine = LlrEngine::new(config).unwrap();
            engine.train(&dataset, 9).unwrap();

            group.bench_with_input(
                BenchmarkId::new(format!("{:?}", strategy), n_rows),
                &dataset,
                |b, ds| b.iter(|| engine.impute(black_box(ds)).unwrap()),
            );
        }
    }

    group.finish();
}

criterion_group!(benches, bench_selection, bench_solvers, bench_neighbor_strategies);
criterion_main!(benches);
