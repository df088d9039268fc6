//! Evaluation benchmarks.
//!
//! These benchmarks measure the bottom-up and top-down evaluators on random
//! networks with heavily shared subgraphs.
//!
//! Run with:
//! ```bash
//! cargo bench --bench evaluation
//! ```

use criterion::{criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};
use rand::prelude::*;
use rand_chacha::ChaCha8Rng;

use spn_rs::data::DataMatrix;
use spn_rs::dispatch::NetworkType;
use spn_rs::leaves::Leaf;
use spn_rs::reference::NodeId;
use spn_rs::spn::{Spn, SpnConfig};
use spn_rs::types::LeafType;

// ============================================================================
// Helper: Random network
// ============================================================================

/// Build a random network over `num_vars` Gaussian variables.
///
/// Each level holds `width` sums per variable block; every sum mixes products
/// drawn from the previous level, so nodes are shared by many parents.
fn build_random_network(num_vars: usize, width: usize, seed: u64) -> (Spn, NodeId) {
    let mut spn = Spn::with_config(SpnConfig::default().with_seed(seed));
    let mut rng = ChaCha8Rng::seed_from_u64(seed);

    // Level 0: `width` random leaves per variable.
    let mut blocks: Vec<(Vec<usize>, Vec<NodeId>)> = (0..num_vars)
        .map(|v| {
            let nodes = (0..width)
                .map(|_| {
                    let leaf = Leaf::random(LeafType::Gaussian, &mut rng).unwrap();
                    spn.mk_leaf(&[v], leaf).unwrap()
                })
                .collect();
            (vec![v], nodes)
        })
        .collect();

    // Merge neighbouring blocks until one is left.
    while blocks.len() > 1 {
        let mut next = Vec::with_capacity(blocks.len() / 2 + 1);
        let mut it = blocks.into_iter();
        while let Some((scope_a, a)) = it.next() {
            let Some((scope_b, b)) = it.next() else {
                next.push((scope_a, a));
                break;
            };
            let scope: Vec<usize> = scope_a.iter().chain(&scope_b).copied().collect();
            let products: Vec<NodeId> = (0..width)
                .map(|_| {
                    let x = a[rng.random_range(0..a.len())];
                    let y = b[rng.random_range(0..b.len())];
                    spn.mk_product(&[x, y], &scope).unwrap()
                })
                .collect();
            let sums = (0..width)
                .map(|_| spn.mk_sum(&products, &scope, None).unwrap())
                .collect();
            next.push((scope, sums));
        }
        blocks = next;
    }

    let (scope, top) = blocks.pop().unwrap();
    let root = spn.mk_sum(&top, &scope, None).unwrap();
    (spn, root)
}

fn random_data(num_vars: usize, rows: usize, seed: u64) -> DataMatrix {
    let mut rng = ChaCha8Rng::seed_from_u64(seed);
    let mut data = DataMatrix::missing(rows, num_vars);
    for r in 0..rows {
        for c in 0..num_vars {
            if rng.random_bool(0.8) {
                data.set(r, c, rng.random_range(-2.0..2.0));
            }
        }
    }
    data
}

// ============================================================================
// Benchmark: Log-likelihood vs. number of rows
// ============================================================================

fn bench_log_likelihood_rows(c: &mut Criterion) {
    let mut group = c.benchmark_group("spn/log_likelihood_rows");

    let (spn, root) = build_random_network(16, 4, 42);

    for rows in [1, 16, 256, 1024] {
        let data = random_data(16, rows, 7);
        group.throughput(Throughput::Elements(rows as u64));
        group.bench_with_input(BenchmarkId::new("v=16,w=4", rows), &data, |b, data| {
            b.iter(|| spn.log_likelihood(NetworkType::Spn, root, data).unwrap());
        });
    }

    group.finish();
}

// ============================================================================
// Benchmark: Network width (sharing)
// ============================================================================

fn bench_network_width(c: &mut Criterion) {
    let mut group = c.benchmark_group("spn/network_width");

    let data = random_data(16, 64, 7);

    for width in [2, 4, 8] {
        let (spn, root) = build_random_network(16, width, 42);
        group.bench_with_input(BenchmarkId::new("likelihood", width), &width, |b, _| {
            b.iter(|| spn.likelihood(NetworkType::Spn, root, &data).unwrap());
        });
    }

    group.finish();
}

// ============================================================================
// Benchmark: Top-down consumers
// ============================================================================

fn bench_top_down(c: &mut Criterion) {
    let mut group = c.benchmark_group("spn/top_down");
    group.sample_size(20);

    let (spn, root) = build_random_network(16, 4, 42);
    let data = random_data(16, 64, 7);

    group.bench_function("log_gradients", |b| {
        b.iter(|| spn.log_gradients(root, &data).unwrap());
    });

    group.bench_function("sample", |b| {
        let mut rng = ChaCha8Rng::seed_from_u64(1);
        b.iter(|| spn.sample(root, &data, &mut rng).unwrap());
    });

    group.finish();
}

criterion_group!(benches, bench_log_likelihood_rows, bench_network_width, bench_top_down);

criterion_main!(benches);
