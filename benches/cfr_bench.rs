//! Benchmarks for the CFR+ engines.

use criterion::{black_box, criterion_group, criterion_main, Criterion};
use cfr_plus::cfr::{CfrConfig, CfrPlus, InfoSetStore};
use cfr_plus::games::kuhn::KuhnNode;
use cfr_plus::games::tictactoe::SymmetricNode;

fn kuhn_iteration_benchmark(c: &mut Criterion) {
    let mut solver: CfrPlus<KuhnNode> = CfrPlus::new(KuhnNode::root(), CfrConfig::default()).unwrap();

    c.bench_function("kuhn_single_iteration", |b| {
        b.iter(|| {
            solver.iterate(true, true).unwrap();
            black_box(solver.iteration())
        })
    });
}

fn kuhn_1000_iterations_benchmark(c: &mut Criterion) {
    c.bench_function("kuhn_1000_iterations", |b| {
        b.iter(|| {
            let mut solver: CfrPlus<KuhnNode> = CfrPlus::new(KuhnNode::root(), CfrConfig::default()).unwrap();
            solver.train(black_box(1000)).map(|stats| stats.iterations).unwrap()
        })
    });
}

fn tictactoe_iteration_benchmark(c: &mut Criterion) {
    let mut solver: CfrPlus<SymmetricNode, u64> = CfrPlus::new(SymmetricNode::new(), CfrConfig::default()).unwrap();

    c.bench_function("tictactoe_symmetric_iteration", |b| {
        b.iter(|| {
            solver.iterate(true, true).unwrap();
            black_box(solver.iteration())
        })
    });
}

fn tictactoe_discovery_benchmark(c: &mut Criterion) {
    c.bench_function("tictactoe_symmetric_discovery", |b| {
        b.iter(|| {
            let mut store: InfoSetStore<u64> = InfoSetStore::new();
            black_box(store.discover(&SymmetricNode::new()).unwrap())
        })
    });
}

criterion_group!(
    benches,
    kuhn_iteration_benchmark,
    kuhn_1000_iterations_benchmark,
    tictactoe_iteration_benchmark,
    tictactoe_discovery_benchmark
);
criterion_main!(benches);
