#[path = "shared.rs"]
mod shared;
use shared::*;

use criterion::{black_box, criterion_group, Criterion};
use geoknn::index::{BuildParams, Index};
use geoknn::join::{st_join, JoinHow};
use tracing::info;

fn configure_criterion() -> Criterion {
    Criterion::default().measurement_time(BENCH_TIMEOUT)
}

fn benchmark_st_join(_c: &mut Criterion) {
    info!("Setting up benchmark: st_join");
    let left = generate_points(200);
    let right = generate_points(BENCH_NUM_SHAPES);
    let right_index = Index::build(&right, BuildParams::default()).unwrap();
    let mut cc = configure_criterion();
    cc.bench_function("st_join", |b| {
        b.iter(|| {
            let rows: Vec<_> = st_join(&left, &right_index, &right, BENCH_KNN_K, JoinHow::Inner).collect();
            black_box(rows)
        })
    });
}

criterion_group!(benches, benchmark_st_join);
