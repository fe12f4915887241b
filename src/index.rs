//! ## BVH index
//!
//! A bulk-built, immutable bounding-volume hierarchy over a `ShapeProvider`, partitioned
//! top-down by a deterministic k-means-style split (`DKMeans`). There is no insert/delete API:
//! the tree is built once from a full id set and never mutated afterwards, which is what lets
//! `traversal.rs` share one index across concurrent read-only queries without locks.

use crate::enclosure::{Enclosure, EnclosureKind};
use crate::error::GeoKnnError;
use crate::geometry::Point;
use crate::provider::{ShapeId, ShapeProvider};
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::SeedableRng;
use std::collections::HashMap;
use tracing::info;

/// Build-time parameters controlling the shape of the BVH.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BuildParams {
    /// Maximum number of shapes held directly by a leaf node.
    pub leaf_capacity: usize,
    /// Maximum number of children an internal node may have.
    pub max_fanout: usize,
    /// Minimum number of children an internal node should have (advisory below the root).
    pub min_fanout: usize,
    /// Maximum number of Lloyd-style reassignment rounds per split.
    pub kmeans_max_iters: usize,
    /// Which enclosure variant to build the tree with.
    pub enclosure_kind: EnclosureKind,
    /// Seed for the deterministic RNG used during k-means++-style seeding.
    pub rng_seed: u64,
}

impl Default for BuildParams {
    fn default() -> Self {
        BuildParams {
            leaf_capacity: 8,
            max_fanout: 16,
            min_fanout: 2,
            kmeans_max_iters: 8,
            enclosure_kind: EnclosureKind::Rect,
            rng_seed: 0,
        }
    }
}

impl BuildParams {
    fn validate(&self) -> Result<(), GeoKnnError> {
        if self.leaf_capacity < 1 {
            return Err(GeoKnnError::InvalidParameter {
                message: "leaf_capacity must be >= 1".to_string(),
            });
        }
        if self.max_fanout < 2 {
            return Err(GeoKnnError::InvalidParameter {
                message: "max_fanout must be >= 2".to_string(),
            });
        }
        if self.min_fanout < 1 {
            return Err(GeoKnnError::InvalidParameter {
                message: "min_fanout must be >= 1".to_string(),
            });
        }
        if self.min_fanout > self.max_fanout {
            return Err(GeoKnnError::InvalidParameter {
                message: "min_fanout must be <= max_fanout".to_string(),
            });
        }
        if self.leaf_capacity < self.min_fanout {
            // `cluster_ids` targets `max_fanout.min(ids.len())` clusters whenever a node holds
            // more than `leaf_capacity` ids. If `leaf_capacity` were allowed below `min_fanout`,
            // a node could split with as few as `leaf_capacity + 1` ids, landing at fewer than
            // `min_fanout` children and breaking invariant 4 for a non-root internal node.
            return Err(GeoKnnError::InvalidParameter {
                message: "leaf_capacity must be >= min_fanout".to_string(),
            });
        }
        Ok(())
    }
}

/// A node of the BVH: either a leaf owning a non-empty set of shape ids, or an internal node
/// owning an ordered list of children.
#[derive(Debug, Clone)]
pub enum IndexNode {
    Leaf {
        ids: Vec<ShapeId>,
        enclosure: Enclosure,
    },
    Internal {
        children: Vec<IndexNode>,
        enclosure: Enclosure,
    },
}

impl IndexNode {
    pub fn enclosure(&self) -> &Enclosure {
        match self {
            IndexNode::Leaf { enclosure, .. } => enclosure,
            IndexNode::Internal { enclosure, .. } => enclosure,
        }
    }
}

/// An immutable BVH over a fixed set of shapes. Built once via [`Index::build`]; there is no
/// insert or delete API in this crate.
#[derive(Debug, Clone)]
pub struct Index {
    root: IndexNode,
    params: BuildParams,
    len: usize,
}

impl Index {
    /// Bulk-builds an index over every shape `provider` currently holds.
    ///
    /// An empty provider is not an error: `build` returns an index whose root is an empty leaf,
    /// and every query against it returns an empty result.
    pub fn build<P: ShapeProvider>(provider: &P, params: BuildParams) -> Result<Index, GeoKnnError> {
        params.validate()?;

        let mut ids = provider.ids();
        // Sorting here, rather than trusting provider order, is what keeps two builds over the
        // same provider deterministic even when the provider is backed by a HashMap (whose
        // iteration order is not guaranteed stable across runs).
        ids.sort_unstable();

        for &id in &ids {
            if !provider.get(id).is_finite() {
                return Err(GeoKnnError::NonFiniteCoordinate { shape: id });
            }
        }

        info!(
            "building index over {} shapes (leaf_capacity={}, max_fanout={})",
            ids.len(),
            params.leaf_capacity,
            params.max_fanout
        );

        if ids.is_empty() {
            let enclosure = empty_enclosure(params.enclosure_kind);
            return Ok(Index {
                root: IndexNode::Leaf {
                    ids: Vec::new(),
                    enclosure,
                },
                params,
                len: 0,
            });
        }

        let centroids: HashMap<ShapeId, Point> = ids
            .iter()
            .map(|&id| (id, centroid_of(provider, id)))
            .collect();

        let mut rng = StdRng::seed_from_u64(params.rng_seed);
        let root = build_node(&ids, provider, &centroids, &params, &mut rng);
        let len = ids.len();
        Ok(Index { root, params, len })
    }

    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    pub fn params(&self) -> &BuildParams {
        &self.params
    }

    pub(crate) fn root(&self) -> &IndexNode {
        &self.root
    }
}

fn empty_enclosure(kind: EnclosureKind) -> Enclosure {
    use crate::geometry::{Geometry, Point as GPoint};
    // An enclosure of a degenerate point at the origin; never compared against since an empty
    // leaf has no shapes to yield.
    Enclosure::of_geometry(&Geometry::Point(GPoint::new(0.0, 0.0)), kind)
}

fn centroid_of<P: ShapeProvider>(provider: &P, id: ShapeId) -> Point {
    let rect = crate::geometry::bbox(provider.get(id));
    Point::new((rect.xmin + rect.xmax) / 2.0, (rect.ymin + rect.ymax) / 2.0)
}

fn dist_sq(a: &Point, b: &Point) -> f64 {
    let dx = a.x - b.x;
    let dy = a.y - b.y;
    dx * dx + dy * dy
}

fn build_node<P: ShapeProvider>(
    ids: &[ShapeId],
    provider: &P,
    centroids: &HashMap<ShapeId, Point>,
    params: &BuildParams,
    rng: &mut StdRng,
) -> IndexNode {
    if ids.len() <= params.leaf_capacity {
        let enclosure = ids
            .iter()
            .map(|&id| Enclosure::of_geometry(provider.get(id), params.enclosure_kind))
            .reduce(|a, b| a.combine(&b))
            .expect("a leaf is only built from a non-empty id slice");
        return IndexNode::Leaf {
            ids: ids.to_vec(),
            enclosure,
        };
    }

    let clusters = cluster_ids(ids, centroids, params, rng);
    let children: Vec<IndexNode> = clusters
        .iter()
        .map(|cluster| build_node(cluster, provider, centroids, params, rng))
        .collect();
    let enclosure = children
        .iter()
        .map(|c| *c.enclosure())
        .reduce(|a, b| a.combine(&b))
        .expect("clustering never produces zero children for a non-empty id slice");
    IndexNode::Internal { children, enclosure }
}

/// Partitions `ids` into at most `max_fanout` non-empty clusters via the `DKMeans` split: a
/// deterministic k-means++-style seeding, bounded Lloyd reassignment, and a balance guard that
/// re-seeds any cluster left empty.
fn cluster_ids(
    ids: &[ShapeId],
    centroids: &HashMap<ShapeId, Point>,
    params: &BuildParams,
    rng: &mut StdRng,
) -> Vec<Vec<ShapeId>> {
    let b = params.max_fanout.min(ids.len());
    let seeds = choose_seeds(ids, centroids, b, rng);
    let mut seed_centroids: Vec<Point> = seeds.iter().map(|id| centroids[id]).collect();

    let mut assignment = vec![0usize; ids.len()];
    assign_all(ids, centroids, &seed_centroids, &mut assignment);

    for _ in 0..params.kmeans_max_iters {
        let mut sums = vec![(0.0f64, 0.0f64, 0usize); seed_centroids.len()];
        for (i, &id) in ids.iter().enumerate() {
            let c = centroids[&id];
            let slot = &mut sums[assignment[i]];
            slot.0 += c.x;
            slot.1 += c.y;
            slot.2 += 1;
        }

        let mut centroids_changed = false;
        for (i, (sx, sy, count)) in sums.into_iter().enumerate() {
            if count == 0 {
                continue;
            }
            let updated = Point::new(sx / count as f64, sy / count as f64);
            if (updated.x - seed_centroids[i].x).abs() > 1e-12
                || (updated.y - seed_centroids[i].y).abs() > 1e-12
            {
                centroids_changed = true;
            }
            seed_centroids[i] = updated;
        }

        let mut new_assignment = assignment.clone();
        assign_all(ids, centroids, &seed_centroids, &mut new_assignment);
        let reassigned = new_assignment != assignment;
        assignment = new_assignment;

        if !reassigned && !centroids_changed {
            break;
        }
    }

    let mut groups = group_by_assignment(ids, &assignment, seed_centroids.len());
    let mut reseed_attempts = 0;
    while groups.iter().any(Vec::is_empty) && reseed_attempts < params.max_fanout {
        reseed_attempts += 1;
        let Some(empty_idx) = groups.iter().position(Vec::is_empty) else {
            break;
        };
        let Some(largest_idx) = groups
            .iter()
            .enumerate()
            .filter(|(i, _)| *i != empty_idx)
            .max_by_key(|(_, g)| g.len())
            .map(|(i, _)| i)
        else {
            break;
        };
        if groups[largest_idx].len() < 2 {
            break;
        }

        let largest = std::mem::take(&mut groups[largest_idx]);
        let (s1, s2) = two_most_distant(&largest, centroids);
        let c1 = centroids[&s1];
        let c2 = centroids[&s2];
        let mut group_a = Vec::new();
        let mut group_b = Vec::new();
        for id in largest {
            if dist_sq(&centroids[&id], &c1) <= dist_sq(&centroids[&id], &c2) {
                group_a.push(id);
            } else {
                group_b.push(id);
            }
        }
        groups[largest_idx] = group_a;
        groups[empty_idx] = group_b;
    }

    if groups.iter().any(Vec::is_empty) {
        groups = fallback_balanced_partition(ids, centroids, b);
    }

    groups.retain(|g| !g.is_empty());
    groups
}

/// Deterministic k-means++-style seeding: the first seed is the medoid of a bounded sample (for
/// scalability on large inputs), subsequent seeds are the farthest-point choices.
fn choose_seeds(
    ids: &[ShapeId],
    centroids: &HashMap<ShapeId, Point>,
    b: usize,
    rng: &mut StdRng,
) -> Vec<ShapeId> {
    const MEDOID_SAMPLE_CAP: usize = 64;

    let candidates: Vec<ShapeId> = if ids.len() <= MEDOID_SAMPLE_CAP {
        ids.to_vec()
    } else {
        let mut shuffled = ids.to_vec();
        shuffled.shuffle(rng);
        shuffled.truncate(MEDOID_SAMPLE_CAP);
        shuffled
    };

    let mut best_id = candidates[0];
    let mut best_sum = f64::INFINITY;
    for &cand in &candidates {
        let c = centroids[&cand];
        let sum: f64 = ids.iter().map(|id| dist_sq(&c, &centroids[id])).sum();
        if sum < best_sum || ((sum - best_sum).abs() < f64::EPSILON && cand < best_id) {
            best_sum = sum;
            best_id = cand;
        }
    }

    let mut chosen = vec![best_id];
    while chosen.len() < b && chosen.len() < ids.len() {
        let mut next_id = None;
        let mut next_dist = -1.0;
        for &id in ids {
            if chosen.contains(&id) {
                continue;
            }
            let c = centroids[&id];
            let nearest = chosen
                .iter()
                .map(|s| dist_sq(&c, &centroids[s]))
                .fold(f64::INFINITY, f64::min);
            let better = nearest > next_dist
                || ((nearest - next_dist).abs() < f64::EPSILON && Some(id) < next_id);
            if better {
                next_dist = nearest;
                next_id = Some(id);
            }
        }
        match next_id {
            Some(id) => chosen.push(id),
            None => break,
        }
    }
    chosen
}

fn assign_all(
    ids: &[ShapeId],
    centroids: &HashMap<ShapeId, Point>,
    seed_centroids: &[Point],
    assignment: &mut [usize],
) {
    for (i, &id) in ids.iter().enumerate() {
        let c = centroids[&id];
        let mut best = 0;
        let mut best_d = dist_sq(&c, &seed_centroids[0]);
        for (j, sc) in seed_centroids.iter().enumerate().skip(1) {
            let d = dist_sq(&c, sc);
            if d < best_d {
                best_d = d;
                best = j;
            }
        }
        assignment[i] = best;
    }
}

fn group_by_assignment(ids: &[ShapeId], assignment: &[usize], n_groups: usize) -> Vec<Vec<ShapeId>> {
    let mut groups = vec![Vec::new(); n_groups];
    for (i, &id) in ids.iter().enumerate() {
        groups[assignment[i]].push(id);
    }
    groups
}

/// The two members of `ids` whose centroids are farthest apart (brute force; `ids` here is a
/// single cluster being re-split, not the whole input set).
fn two_most_distant(ids: &[ShapeId], centroids: &HashMap<ShapeId, Point>) -> (ShapeId, ShapeId) {
    if ids.len() == 1 {
        return (ids[0], ids[0]);
    }
    let mut best = (ids[0], ids[1]);
    let mut best_d = dist_sq(&centroids[&ids[0]], &centroids[&ids[1]]);
    for i in 0..ids.len() {
        for j in (i + 1)..ids.len() {
            let d = dist_sq(&centroids[&ids[i]], &centroids[&ids[j]]);
            if d > best_d {
                best_d = d;
                best = (ids[i], ids[j]);
            }
        }
    }
    best
}

/// Last-resort partition used when clustering cannot escape empty groups: sort by centroid and
/// chunk evenly.
fn fallback_balanced_partition(
    ids: &[ShapeId],
    centroids: &HashMap<ShapeId, Point>,
    b: usize,
) -> Vec<Vec<ShapeId>> {
    let mut sorted = ids.to_vec();
    sorted.sort_by(|a, c| {
        let pa = centroids[a];
        let pc = centroids[c];
        pa.x.partial_cmp(&pc.x)
            .unwrap_or(std::cmp::Ordering::Equal)
            .then(pa.y.partial_cmp(&pc.y).unwrap_or(std::cmp::Ordering::Equal))
    });
    let chunk_size = sorted.len().div_ceil(b).max(1);
    sorted.chunks(chunk_size).map(<[ShapeId]>::to_vec).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geometry::{Geometry, Point as GPoint};
    use crate::provider::VecProvider;

    fn points(coords: &[(f64, f64)]) -> VecProvider {
        VecProvider::new(
            coords
                .iter()
                .map(|&(x, y)| Geometry::Point(GPoint::new(x, y)))
                .collect(),
        )
    }

    fn count_ids(node: &IndexNode) -> Vec<ShapeId> {
        match node {
            IndexNode::Leaf { ids, .. } => ids.clone(),
            IndexNode::Internal { children, .. } => {
                children.iter().flat_map(count_ids).collect()
            }
        }
    }

    fn assert_containment(node: &IndexNode, provider: &VecProvider) {
        let enc = *node.enclosure();
        match node {
            IndexNode::Leaf { ids, .. } => {
                for &id in ids {
                    let g = provider.get(id);
                    assert_eq!(enc.distance_lower_bound(g), 0.0, "leaf must contain its shapes");
                }
            }
            IndexNode::Internal { children, .. } => {
                for child in children {
                    let child_enc = *child.enclosure();
                    // A child's enclosure corners must lie within (or on) the parent's lower
                    // bound of zero, i.e. the parent's enclosure contains the child's.
                    if let (Enclosure::Rect(p), Enclosure::Rect(c)) = (enc, child_enc) {
                        assert!(p.xmin <= c.xmin + 1e-6 && p.xmax >= c.xmax - 1e-6);
                        assert!(p.ymin <= c.ymin + 1e-6 && p.ymax >= c.ymax - 1e-6);
                    }
                    assert_containment(child, provider);
                }
            }
        }
    }

    #[test]
    fn test_build_empty_provider() {
        let provider = points(&[]);
        let index = Index::build(&provider, BuildParams::default()).unwrap();
        assert!(index.is_empty());
        assert_eq!(index.len(), 0);
    }

    #[test]
    fn test_build_partition_covers_every_id_once() {
        let coords: Vec<(f64, f64)> = (0..200).map(|i| (i as f64, (i * 7 % 50) as f64)).collect();
        let provider = points(&coords);
        let params = BuildParams {
            leaf_capacity: 4,
            max_fanout: 5,
            ..Default::default()
        };
        let index = Index::build(&provider, params).unwrap();
        let mut ids = count_ids(index.root());
        ids.sort_unstable();
        let expected: Vec<ShapeId> = (0..200).collect();
        assert_eq!(ids, expected);
    }

    #[test]
    fn test_build_containment_invariant() {
        let coords: Vec<(f64, f64)> = (0..120).map(|i| ((i * 3) as f64, (i * 5) as f64)).collect();
        let provider = points(&coords);
        let params = BuildParams {
            leaf_capacity: 6,
            max_fanout: 4,
            ..Default::default()
        };
        let index = Index::build(&provider, params).unwrap();
        assert_containment(index.root(), &provider);
    }

    #[test]
    fn test_build_is_deterministic() {
        let coords: Vec<(f64, f64)> = (0..150).map(|i| ((i * 13 % 97) as f64, (i * 31 % 61) as f64)).collect();
        let provider = points(&coords);
        let params = BuildParams {
            leaf_capacity: 5,
            max_fanout: 6,
            rng_seed: 42,
            ..Default::default()
        };
        let a = Index::build(&provider, params).unwrap();
        let b = Index::build(&provider, params).unwrap();
        let mut ids_a = count_ids(a.root());
        let mut ids_b = count_ids(b.root());
        ids_a.sort_unstable();
        ids_b.sort_unstable();
        assert_eq!(ids_a, ids_b);
        assert_eq!(format!("{:?}", a.root()), format!("{:?}", b.root()));
    }

    #[test]
    fn test_invalid_params_rejected() {
        let provider = points(&[(0.0, 0.0)]);
        let bad = BuildParams {
            max_fanout: 1,
            ..Default::default()
        };
        assert!(Index::build(&provider, bad).is_err());
    }

    #[test]
    fn test_leaf_capacity_below_min_fanout_rejected() {
        let provider = points(&[(0.0, 0.0)]);
        let bad = BuildParams {
            leaf_capacity: 1,
            min_fanout: 5,
            max_fanout: 16,
            ..Default::default()
        };
        assert!(Index::build(&provider, bad).is_err());
    }

    #[test]
    fn test_non_finite_coordinate_rejected() {
        let provider = points(&[(0.0, 0.0), (f64::NAN, 1.0)]);
        let err = Index::build(&provider, BuildParams::default()).unwrap_err();
        assert!(matches!(err, GeoKnnError::NonFiniteCoordinate { shape: 1 }));
    }
}
