//! ## Shape provider
//!
//! A `ShapeProvider` is a thin, read-only, random-access adaptor over any mapping-like
//! collection of geometries keyed by a stable `ShapeId`. It is the uniform view the BVH is built
//! over and the view queries resolve candidate ids back to geometries through.

use crate::geometry::Geometry;
use std::collections::HashMap;

/// An opaque key identifying a shape within a provider, stable for the provider's lifetime.
pub type ShapeId = u64;

/// A read-only, random-access view over a collection of geometries.
///
/// Implementations must be safe to share across threads for concurrent reads: the index and its
/// queries never mutate a provider.
pub trait ShapeProvider {
    /// The number of shapes in this provider.
    fn len(&self) -> usize;

    /// Whether this provider has no shapes.
    fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// The geometry for `id`. Panics if `id` is not present — callers only ever pass ids
    /// obtained from `ids()` or from the index built over this same provider.
    fn get(&self, id: ShapeId) -> &Geometry;

    /// All ids in this provider, in an implementation-defined but stable order.
    fn ids(&self) -> Vec<ShapeId>;
}

/// A provider backed by a `Vec<Geometry>`; ids are the vector index cast to `ShapeId`.
#[derive(Debug, Clone)]
pub struct VecProvider {
    shapes: Vec<Geometry>,
}

impl VecProvider {
    pub fn new(shapes: Vec<Geometry>) -> Self {
        VecProvider { shapes }
    }
}

impl ShapeProvider for VecProvider {
    fn len(&self) -> usize {
        self.shapes.len()
    }

    fn get(&self, id: ShapeId) -> &Geometry {
        &self.shapes[id as usize]
    }

    fn ids(&self) -> Vec<ShapeId> {
        (0..self.shapes.len() as ShapeId).collect()
    }
}

/// A provider backed by a `HashMap<ShapeId, Geometry>`, for callers with a non-contiguous or
/// externally assigned id space (e.g. a tabular row index).
#[derive(Debug, Clone)]
pub struct MapProvider {
    shapes: HashMap<ShapeId, Geometry>,
}

impl MapProvider {
    pub fn new(shapes: HashMap<ShapeId, Geometry>) -> Self {
        MapProvider { shapes }
    }
}

impl ShapeProvider for MapProvider {
    fn len(&self) -> usize {
        self.shapes.len()
    }

    fn get(&self, id: ShapeId) -> &Geometry {
        self.shapes
            .get(&id)
            .unwrap_or_else(|| panic!("shape id {id} not present in provider"))
    }

    fn ids(&self) -> Vec<ShapeId> {
        self.shapes.keys().copied().collect()
    }
}
