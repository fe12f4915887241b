//! ## Lazy approximate-nearest iterator
//!
//! Produces `(ShapeId, lower_bound_distance)` pairs in non-decreasing order of lower-bound
//! distance to a query geometry, via best-first branch-and-bound over the BVH. This is the
//! traversal the true-kNN refiner (`knn.rs`) pulls from; it never looks more than one pop ahead
//! and releases its heap as soon as it is dropped.

use crate::geometry::{bbox, Geometry};
use crate::index::{Index, IndexNode};
use crate::provider::{ShapeId, ShapeProvider};
use ordered_float::OrderedFloat;
use std::cmp::Ordering;
use std::collections::BinaryHeap;

enum HeapItem<'a> {
    Node(&'a IndexNode),
    Shape(ShapeId),
}

impl HeapItem<'_> {
    /// Nodes sort before shapes at equal lower bound, per the traversal's tie-break rule.
    fn kind_rank(&self) -> u8 {
        match self {
            HeapItem::Node(_) => 0,
            HeapItem::Shape(_) => 1,
        }
    }
}

struct Entry<'a> {
    lb: OrderedFloat<f64>,
    seq: u64,
    item: HeapItem<'a>,
}

impl PartialEq for Entry<'_> {
    fn eq(&self, other: &Self) -> bool {
        self.lb == other.lb && self.item.kind_rank() == other.item.kind_rank() && self.seq == other.seq
    }
}

impl Eq for Entry<'_> {}

// `BinaryHeap` is a max-heap; reversing the comparison here turns it into the min-heap (by `lb`,
// then node-before-shape, then insertion order) that best-first traversal needs.
impl Ord for Entry<'_> {
    fn cmp(&self, other: &Self) -> Ordering {
        other
            .lb
            .cmp(&self.lb)
            .then_with(|| other.item.kind_rank().cmp(&self.item.kind_rank()))
            .then_with(|| other.seq.cmp(&self.seq))
    }
}

impl PartialOrd for Entry<'_> {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

/// A lazy, pull-driven stream of `(ShapeId, lower_bound_distance)` pairs in non-decreasing order
/// of `lower_bound_distance`. Dropping the iterator releases its heap immediately.
pub struct ApproxNearestIter<'a, P: ShapeProvider> {
    provider: &'a P,
    query: Geometry,
    heap: BinaryHeap<Entry<'a>>,
    next_seq: u64,
}

impl<'a, P: ShapeProvider> ApproxNearestIter<'a, P> {
    pub(crate) fn new(index: &'a Index, provider: &'a P, query: Geometry) -> Self {
        let mut iter = ApproxNearestIter {
            provider,
            query,
            heap: BinaryHeap::new(),
            next_seq: 0,
        };
        let root_lb = index.root().enclosure().distance_lower_bound(&iter.query);
        iter.push(root_lb, HeapItem::Node(index.root()));
        iter
    }

    fn push(&mut self, lb: f64, item: HeapItem<'a>) {
        self.heap.push(Entry {
            lb: OrderedFloat(lb),
            seq: self.next_seq,
            item,
        });
        self.next_seq += 1;
    }
}

impl<'a, P: ShapeProvider> Iterator for ApproxNearestIter<'a, P> {
    type Item = (ShapeId, f64);

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            let entry = self.heap.pop()?;
            match entry.item {
                HeapItem::Shape(id) => return Some((id, entry.lb.into_inner())),
                HeapItem::Node(IndexNode::Leaf { ids, .. }) => {
                    let q_bbox = bbox(&self.query);
                    for &id in ids {
                        let shape_bbox = bbox(self.provider.get(id));
                        let lb = shape_bbox.distance_to_rect(&q_bbox);
                        self.push(lb, HeapItem::Shape(id));
                    }
                }
                HeapItem::Node(IndexNode::Internal { children, .. }) => {
                    for child in children {
                        let lb = child.enclosure().distance_lower_bound(&self.query);
                        self.push(lb, HeapItem::Node(child));
                    }
                }
            }
        }
    }
}

impl Index {
    /// Opens a lazy best-first traversal over this index's shapes in non-decreasing order of
    /// their bbox-based lower bound distance to `query`.
    pub fn approx_nearest<'a, P: ShapeProvider>(
        &'a self,
        provider: &'a P,
        query: Geometry,
    ) -> ApproxNearestIter<'a, P> {
        ApproxNearestIter::new(self, provider, query)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geometry::Point;
    use crate::index::BuildParams;
    use crate::provider::VecProvider;

    fn provider_of(coords: &[(f64, f64)]) -> VecProvider {
        VecProvider::new(
            coords
                .iter()
                .map(|&(x, y)| Geometry::Point(Point::new(x, y)))
                .collect(),
        )
    }

    #[test]
    fn test_yields_every_shape_exactly_once() {
        let coords: Vec<(f64, f64)> = (0..97).map(|i| (i as f64, (i * 3 % 17) as f64)).collect();
        let provider = provider_of(&coords);
        let index = Index::build(&provider, BuildParams::default()).unwrap();
        let query = Geometry::Point(Point::new(5.0, 5.0));

        let mut seen: Vec<ShapeId> = index.approx_nearest(&provider, query).map(|(id, _)| id).collect();
        seen.sort_unstable();
        let expected: Vec<ShapeId> = (0..97).collect();
        assert_eq!(seen, expected);
    }

    #[test]
    fn test_lower_bounds_are_non_decreasing() {
        let coords: Vec<(f64, f64)> = (0..150).map(|i| ((i * 11 % 83) as f64, (i * 19 % 97) as f64)).collect();
        let provider = provider_of(&coords);
        let index = Index::build(&provider, BuildParams::default()).unwrap();
        let query = Geometry::Point(Point::new(40.0, 40.0));

        let mut prev = 0.0;
        for (_, lb) in index.approx_nearest(&provider, query) {
            assert!(lb + 1e-9 >= prev, "lower bounds must be non-decreasing");
            prev = lb;
        }
    }

    #[test]
    fn test_empty_index_yields_nothing() {
        let provider = provider_of(&[]);
        let index = Index::build(&provider, BuildParams::default()).unwrap();
        let query = Geometry::Point(Point::new(0.0, 0.0));
        assert_eq!(index.approx_nearest(&provider, query).count(), 0);
    }
}
