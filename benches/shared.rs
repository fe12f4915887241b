#![allow(dead_code)]

use geoknn::geometry::{Geometry, Point};
use geoknn::provider::VecProvider;
use tracing::info;

pub const BENCH_TIMEOUT: std::time::Duration = std::time::Duration::from_secs(10);
pub const BENCH_NUM_SHAPES: usize = 2_000;
pub const BENCH_KNN_K: usize = 10;

/// A deterministic, dependency-free stand-in for uniformly scattered points.
pub fn generate_points(n: usize) -> VecProvider {
    info!("Generating {} benchmark points", n);
    let mut state = 0x9E3779B97F4A7C15u64;
    let mut next = || {
        state = state.wrapping_add(0x9E3779B97F4A7C15);
        let mut z = state;
        z = (z ^ (z >> 30)).wrapping_mul(0xBF58476D1CE4E5B9);
        z = (z ^ (z >> 27)).wrapping_mul(0x94D049BB133111EB);
        z ^ (z >> 31)
    };
    let shapes = (0..n)
        .map(|_| {
            let x = (next() % 1_000_000) as f64 / 1000.0;
            let y = (next() % 1_000_000) as f64 / 1000.0;
            Geometry::Point(Point::new(x, y))
        })
        .collect();
    VecProvider::new(shapes)
}
