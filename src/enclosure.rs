//! ## Enclosures
//!
//! An `Enclosure` is a coarse geometric summary of a set of shapes: either an axis-aligned
//! `Rect` or a bounding `Sphere`. Both variants support `combine` (smallest enclosure containing
//! both inputs) and `distance_lower_bound` (a value never larger than the true distance from any
//! point inside the enclosure to a query geometry). The BVH (`index.rs`) is generic over which
//! variant it builds with; the two are interchangeable at the index level.

use crate::geometry::{bbox, Geometry, Point, Rect};

/// Conservative outward growth applied by `combine`, so that floating-point rounding during
/// repeated unions never shrinks an enclosure below what it should contain.
const GROWTH_EPSILON: f64 = 1e-9;

/// A bounding sphere: centre plus radius.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Sphere {
    pub cx: f64,
    pub cy: f64,
    pub r: f64,
}

impl Sphere {
    fn of_point(p: &Point) -> Self {
        Sphere {
            cx: p.x,
            cy: p.y,
            r: 0.0,
        }
    }

    fn of_rect(rect: &Rect) -> Self {
        let cx = (rect.xmin + rect.xmax) / 2.0;
        let cy = (rect.ymin + rect.ymax) / 2.0;
        let r = ((rect.xmax - cx).powi(2) + (rect.ymax - cy).powi(2)).sqrt();
        Sphere { cx, cy, r }
    }

    fn union(&self, other: &Sphere) -> Sphere {
        let dx = other.cx - self.cx;
        let dy = other.cy - self.cy;
        let centre_dist = (dx * dx + dy * dy).sqrt();

        if self.r >= centre_dist + other.r {
            return *self;
        }
        if other.r >= centre_dist + self.r {
            return *other;
        }

        let new_r = (centre_dist + self.r + other.r) / 2.0;
        if centre_dist < 1e-12 {
            return Sphere {
                cx: self.cx,
                cy: self.cy,
                r: self.r.max(other.r),
            };
        }
        let t = (new_r - self.r) / centre_dist;
        Sphere {
            cx: self.cx + dx * t,
            cy: self.cy + dy * t,
            r: new_r,
        }
    }

    fn distance_to_point(&self, p: &Point) -> f64 {
        let dx = p.x - self.cx;
        let dy = p.y - self.cy;
        let centre_dist = (dx * dx + dy * dy).sqrt();
        (centre_dist - self.r).max(0.0)
    }
}

/// Which enclosure variant a BVH is built with. Both are interchangeable at the index level.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EnclosureKind {
    Rect,
    Sphere,
}

/// A bounding-volume summary of a set of shapes: either an axis-aligned rectangle or a
/// bounding sphere.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Enclosure {
    Rect(Rect),
    Sphere(Sphere),
}

impl Enclosure {
    /// The enclosure of a single shape's bbox, in the requested variant.
    pub fn of_geometry(g: &Geometry, kind: EnclosureKind) -> Enclosure {
        let rect = bbox(g);
        match kind {
            EnclosureKind::Rect => Enclosure::Rect(rect),
            EnclosureKind::Sphere => Enclosure::Sphere(Sphere::of_rect(&rect)),
        }
    }

    /// The smallest enclosure of the same variant containing both `self` and `other`. Panics if
    /// the two enclosures are of different variants — the BVH never mixes variants within one
    /// tree.
    pub fn combine(&self, other: &Enclosure) -> Enclosure {
        match (self, other) {
            (Enclosure::Rect(a), Enclosure::Rect(b)) => {
                let u = a.union(b);
                Enclosure::Rect(grow_rect(&u))
            }
            (Enclosure::Sphere(a), Enclosure::Sphere(b)) => {
                let u = a.union(b);
                Enclosure::Sphere(Sphere {
                    cx: u.cx,
                    cy: u.cy,
                    r: u.r + GROWTH_EPSILON,
                })
            }
            _ => panic!("cannot combine enclosures of different variants"),
        }
    }

    /// A lower bound on `distance(s, q)` for every shape `s` inside this enclosure, computed
    /// against `bbox(q)` rather than `q` directly — since `bbox(q)` contains `q`, any lower bound
    /// valid against the bbox is also valid against the geometry itself.
    pub fn distance_lower_bound(&self, q: &Geometry) -> f64 {
        let q_bbox = bbox(q);
        match self {
            Enclosure::Rect(rect) => rect.distance_to_rect(&q_bbox),
            Enclosure::Sphere(sphere) => {
                let closest = closest_point_of_rect(&q_bbox, sphere.cx, sphere.cy);
                sphere.distance_to_point(&closest)
            }
        }
    }
}

fn grow_rect(r: &Rect) -> Rect {
    Rect {
        xmin: r.xmin - GROWTH_EPSILON,
        xmax: r.xmax + GROWTH_EPSILON,
        ymin: r.ymin - GROWTH_EPSILON,
        ymax: r.ymax + GROWTH_EPSILON,
    }
}

/// The point of `rect` closest to `(cx, cy)` — used to turn a sphere-to-rect query into a
/// sphere-to-point one.
fn closest_point_of_rect(rect: &Rect, cx: f64, cy: f64) -> Point {
    Point {
        x: cx.clamp(rect.xmin, rect.xmax),
        y: cy.clamp(rect.ymin, rect.ymax),
    }
}
