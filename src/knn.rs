//! ## True-kNN refiner
//!
//! Consumes the lazy approximate-nearest stream (`traversal.rs`) and promotes its candidates to
//! an exact ranked answer: compute the true distance for each candidate as it arrives, keep a
//! bounded best-k buffer, and stop as soon as the next lower bound can no longer beat the
//! buffer's worst confirmed distance. Soundness rests entirely on the traversal's non-decreasing
//! yield plus the enclosure's lower-bound guarantee (`enclosure.rs`).

use crate::geometry::{distance, Geometry};
use crate::index::Index;
use crate::provider::{ShapeId, ShapeProvider};
use ordered_float::OrderedFloat;
use std::cmp::Ordering;
use std::collections::BinaryHeap;
use tracing::debug;

#[derive(Debug)]
struct BestEntry {
    dist: OrderedFloat<f64>,
    id: ShapeId,
}

impl PartialEq for BestEntry {
    fn eq(&self, other: &Self) -> bool {
        self.dist == other.dist && self.id == other.id
    }
}

impl Eq for BestEntry {}

// Ordered so that `BinaryHeap`'s natural max stays the current worst-of-the-best: farthest
// distance first, and among ties the larger id (so the smaller id survives an eviction,
// matching the ascending-id tie-break on the final result).
impl Ord for BestEntry {
    fn cmp(&self, other: &Self) -> Ordering {
        self.dist.cmp(&other.dist).then_with(|| self.id.cmp(&other.id))
    }
}

impl PartialOrd for BestEntry {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

/// A bounded priority structure of at most `k` `(ShapeId, exact_distance)` entries, ordered by
/// exact distance descending so the worst-of-the-best is a cheap peek.
struct BestK {
    heap: BinaryHeap<BestEntry>,
    k: usize,
}

impl BestK {
    fn new(k: usize) -> Self {
        BestK {
            heap: BinaryHeap::with_capacity(k),
            k,
        }
    }

    fn is_full(&self) -> bool {
        self.heap.len() >= self.k
    }

    /// The largest exact distance currently held, or `+inf` while the buffer has room.
    fn worst(&self) -> f64 {
        if self.is_full() {
            self.heap.peek().map_or(f64::INFINITY, |e| e.dist.into_inner())
        } else {
            f64::INFINITY
        }
    }

    /// Considers `(id, dist)` for inclusion in the buffer. When the buffer is full and `dist`
    /// exactly ties the current worst-of-the-best, the candidate with the smaller `id` wins —
    /// `BestEntry::cmp` already orders ties by descending id, so comparing the new entry against
    /// the current peek (rather than just comparing distances) gets this for free.
    fn consider(&mut self, id: ShapeId, dist: f64) {
        let candidate = BestEntry {
            dist: OrderedFloat(dist),
            id,
        };
        if !self.is_full() {
            self.heap.push(candidate);
        } else if self.heap.peek().is_some_and(|worst| &candidate < worst) {
            self.heap.pop();
            self.heap.push(candidate);
        }
    }

    fn into_sorted(self) -> Vec<(ShapeId, f64)> {
        let mut entries = self.heap.into_vec();
        entries.sort_by(|a, b| a.dist.cmp(&b.dist).then_with(|| a.id.cmp(&b.id)));
        entries.into_iter().map(|e| (e.id, e.dist.into_inner())).collect()
    }
}

/// Exact top-k nearest neighbours of `query` in `index`, sorted by exact distance ascending and
/// then by `ShapeId` ascending. `k == 0` or an empty index both return an empty vector; `k > n`
/// returns all `n` shapes, fully sorted.
pub fn true_knn<P: ShapeProvider>(
    index: &Index,
    provider: &P,
    query: &Geometry,
    k: usize,
) -> Vec<(ShapeId, f64)> {
    true_knn_capped(index, provider, query, k, None)
}

/// As [`true_knn`], but caps the number of exact distance evaluations at `max_candidates` as a
/// cost bound. This is a safety valve on pathological inputs, not an approximate-kNN mode: when
/// the termination bound (§4.E) fires before the cap is reached, the result is exactly the same
/// as `true_knn`'s. Only on inputs degenerate enough to exhaust the cap first does the returned
/// set stop being guaranteed exact.
pub fn true_knn_capped<P: ShapeProvider>(
    index: &Index,
    provider: &P,
    query: &Geometry,
    k: usize,
    max_candidates: Option<usize>,
) -> Vec<(ShapeId, f64)> {
    if k == 0 || index.is_empty() {
        return Vec::new();
    }

    debug!("true_knn: k={}, max_candidates={:?}", k, max_candidates);

    let mut best = BestK::new(k);
    let mut evaluated = 0usize;
    for (id, lb) in index.approx_nearest(provider, query.clone()) {
        if best.is_full() && lb > best.worst() {
            break;
        }
        let d = distance(provider.get(id), query);
        best.consider(id, d);
        evaluated += 1;
        if max_candidates.is_some_and(|cap| evaluated >= cap) {
            break;
        }
    }
    best.into_sorted()
}

/// A stream yielding the final top-k entries one at a time, in the same order `true_knn` would
/// return them. Requires internal buffering equal to `k`, since the exact rank of any entry is
/// not known until the refiner has terminated.
pub struct TrueKnnLazy {
    inner: std::vec::IntoIter<(ShapeId, f64)>,
}

impl Iterator for TrueKnnLazy {
    type Item = (ShapeId, f64);

    fn next(&mut self) -> Option<Self::Item> {
        self.inner.next()
    }
}

impl Index {
    /// Eager convenience wrapper around [`true_knn`].
    pub fn true_knn<P: ShapeProvider>(&self, provider: &P, query: &Geometry, k: usize) -> Vec<(ShapeId, f64)> {
        true_knn(self, provider, query, k)
    }

    /// As [`Index::true_knn`], yielding results one at a time instead of as a materialized `Vec`.
    pub fn true_knn_lazy<P: ShapeProvider>(&self, provider: &P, query: &Geometry, k: usize) -> TrueKnnLazy {
        TrueKnnLazy {
            inner: true_knn(self, provider, query, k).into_iter(),
        }
    }
}
