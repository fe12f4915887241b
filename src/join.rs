//! ## Spatial join driver
//!
//! Applies the true-kNN refiner (`knn.rs`) independently to each geometry on the left side
//! against a BVH already built over the right side, and emits a lazy stream of results. One
//! `next()` on the returned stream triggers exactly one refinement pass; nothing is
//! materialized up front.

use crate::geometry::Geometry;
use crate::index::Index;
use crate::knn::true_knn;
use crate::provider::{ShapeId, ShapeProvider};
use tracing::debug;

/// How to handle a left element whose top-k against the right side is empty (only possible when
/// the right side is empty).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum JoinHow {
    /// Drop left elements with an empty top-k.
    Inner,
    /// Emit left elements with an empty top-k as an empty list.
    Left,
}

/// A lazy stream of `(left_id, top_k)` pairs, one per (surviving) left element, in left
/// iteration order.
pub struct JoinStream<'a, L: ShapeProvider, R: ShapeProvider> {
    left: &'a L,
    left_ids: std::vec::IntoIter<ShapeId>,
    right_index: &'a Index,
    right_provider: &'a R,
    k: usize,
    how: JoinHow,
}

impl<'a, L: ShapeProvider, R: ShapeProvider> Iterator for JoinStream<'a, L, R> {
    type Item = (ShapeId, Vec<(ShapeId, f64)>);

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            let left_id = self.left_ids.next()?;
            let query: &Geometry = self.left.get(left_id);
            let top_k = true_knn(self.right_index, self.right_provider, query, self.k);

            if top_k.is_empty() && self.how == JoinHow::Inner {
                debug!("st_join: dropping left id {} (inner join, empty right side)", left_id);
                continue;
            }
            return Some((left_id, top_k));
        }
    }
}

/// Runs a true-kNN query for every element of `left` against `right_index`, in `left`'s
/// iteration order.
///
/// Self-joins (where `left` and `right_provider` are backed by the same data) are supported with
/// no automatic exclusion of the identity match — callers who want to drop the self match should
/// request `k + 1` and filter it out themselves.
pub fn st_join<'a, L: ShapeProvider, R: ShapeProvider>(
    left: &'a L,
    right_index: &'a Index,
    right_provider: &'a R,
    k: usize,
    how: JoinHow,
) -> JoinStream<'a, L, R> {
    JoinStream {
        left,
        left_ids: left.ids().into_iter(),
        right_index,
        right_provider,
        k,
        how,
    }
}
