//! ## geoknn
//!
//! An indexed true k-nearest-neighbour engine for heterogeneous 2D geometries. A "true" kNN
//! query ranks results by the exact shortest Euclidean distance between geometry pairs, rather
//! than the centroid- or bounding-volume-distance approximations most off-the-shelf spatial
//! indexes return.
//!
//! The pieces, leaves first:
//!
//! - [`geometry`]: points, line strings, polygons and their multi- variants, plus exact `bbox`
//!   and `distance` functions.
//! - [`provider`]: a uniform read-only view over a collection of geometries keyed by a stable
//!   [`provider::ShapeId`].
//! - [`enclosure`]: the `Rect`/`Sphere` bounding-volume variant the BVH is built out of.
//! - [`index`]: the bulk-built, immutable BVH (`IndexTree`), partitioned top-down by a
//!   deterministic k-means-style split.
//! - [`traversal`]: a lazy best-first iterator over the BVH, yielding candidates in
//!   non-decreasing lower-bound-distance order.
//! - [`knn`]: the true-kNN refiner that promotes that lazy stream into an exact, bounded top-k.
//! - [`join`]: a lazy spatial join driver applying the refiner independently per left geometry.
//!
//! ```
//! use geoknn::geometry::{Geometry, Point};
//! use geoknn::index::{BuildParams, Index};
//! use geoknn::provider::VecProvider;
//!
//! let provider = VecProvider::new(vec![
//!     Geometry::Point(Point::new(0.0, 0.0)),
//!     Geometry::Point(Point::new(1.0, 0.0)),
//!     Geometry::Point(Point::new(5.0, 5.0)),
//! ]);
//! let index = Index::build(&provider, BuildParams::default()).unwrap();
//! let results = index.true_knn(&provider, &Geometry::Point(Point::new(0.1, 0.0)), 2);
//! assert_eq!(results[0].0, 0);
//! ```

pub mod enclosure;
pub mod error;
pub mod geometry;
pub mod index;
pub mod join;
pub mod knn;
mod logging;
pub mod provider;
pub mod traversal;

pub use enclosure::{Enclosure, EnclosureKind};
pub use error::GeoKnnError;
pub use index::{BuildParams, Index};
pub use join::{st_join, JoinHow};
pub use knn::{true_knn, true_knn_capped};
pub use provider::{MapProvider, ShapeId, ShapeProvider, VecProvider};
