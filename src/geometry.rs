//! ## Geometry primitives
//!
//! This module is the concrete stand-in for the external "geometry library" collaborator that
//! the rest of the crate is built against: a `Point`, an axis-aligned `Rect`, and a `Geometry`
//! enum covering points, multi-points, line strings, multi-line-strings, polygons and
//! multi-polygons, together with exact `bbox` and `distance` functions.
//!
//! Everything downstream of this module (the index, the traversal, the refiner, the join) only
//! ever calls `bbox(g)` and `distance(g, h)`. A caller backed by a real geometry library can
//! swap this module out entirely as long as it offers the same two functions over its own type.

use std::cmp::Ordering;

/// A point in the plane.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Point {
    pub x: f64,
    pub y: f64,
}

impl Point {
    pub fn new(x: f64, y: f64) -> Self {
        Point { x, y }
    }

    pub fn is_finite(&self) -> bool {
        self.x.is_finite() && self.y.is_finite()
    }

    fn distance_sq(&self, other: &Point) -> f64 {
        let dx = self.x - other.x;
        let dy = self.y - other.y;
        dx * dx + dy * dy
    }
}

/// An axis-aligned bounding rectangle `[xmin, xmax] x [ymin, ymax]`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Rect {
    pub xmin: f64,
    pub xmax: f64,
    pub ymin: f64,
    pub ymax: f64,
}

impl Rect {
    /// A rectangle containing exactly one point.
    pub fn of_point(p: &Point) -> Self {
        Rect {
            xmin: p.x,
            xmax: p.x,
            ymin: p.y,
            ymax: p.y,
        }
    }

    pub fn is_finite(&self) -> bool {
        self.xmin.is_finite()
            && self.xmax.is_finite()
            && self.ymin.is_finite()
            && self.ymax.is_finite()
    }

    pub fn width(&self) -> f64 {
        self.xmax - self.xmin
    }

    pub fn height(&self) -> f64 {
        self.ymax - self.ymin
    }

    pub fn area(&self) -> f64 {
        self.width() * self.height()
    }

    pub fn contains_point(&self, p: &Point) -> bool {
        p.x >= self.xmin && p.x <= self.xmax && p.y >= self.ymin && p.y <= self.ymax
    }

    pub fn intersects(&self, other: &Rect) -> bool {
        !(other.xmin > self.xmax
            || other.xmax < self.xmin
            || other.ymin > self.ymax
            || other.ymax < self.ymin)
    }

    /// The smallest rectangle containing both `self` and `other`.
    pub fn union(&self, other: &Rect) -> Rect {
        Rect {
            xmin: self.xmin.min(other.xmin),
            xmax: self.xmax.max(other.xmax),
            ymin: self.ymin.min(other.ymin),
            ymax: self.ymax.max(other.ymax),
        }
    }

    /// The additional area required to enlarge `self` to include `other`.
    pub fn enlargement(&self, other: &Rect) -> f64 {
        self.union(other).area() - self.area()
    }

    /// The Euclidean distance from this rectangle to a point; zero if the point lies inside.
    pub fn distance_to_point(&self, p: &Point) -> f64 {
        let dx = if p.x < self.xmin {
            self.xmin - p.x
        } else if p.x > self.xmax {
            p.x - self.xmax
        } else {
            0.0
        };
        let dy = if p.y < self.ymin {
            self.ymin - p.y
        } else if p.y > self.ymax {
            p.y - self.ymax
        } else {
            0.0
        };
        (dx * dx + dy * dy).sqrt()
    }

    /// The Euclidean distance between two rectangles; zero if they overlap.
    pub fn distance_to_rect(&self, other: &Rect) -> f64 {
        let dx = if other.xmax < self.xmin {
            self.xmin - other.xmax
        } else if other.xmin > self.xmax {
            other.xmin - self.xmax
        } else {
            0.0
        };
        let dy = if other.ymax < self.ymin {
            self.ymin - other.ymax
        } else if other.ymin > self.ymax {
            other.ymin - self.ymax
        } else {
            0.0
        };
        (dx * dx + dy * dy).sqrt()
    }
}

/// A polygon with an exterior ring and zero or more interior rings (holes).
///
/// Rings are not required to repeat their first point as their last; distance treats every
/// ring as a closed loop of edges.
#[derive(Debug, Clone, PartialEq)]
pub struct Polygon {
    pub exterior: Vec<Point>,
    pub interiors: Vec<Vec<Point>>,
}

impl Polygon {
    pub fn new(exterior: Vec<Point>) -> Self {
        Polygon {
            exterior,
            interiors: Vec::new(),
        }
    }

    fn rings(&self) -> impl Iterator<Item = &Vec<Point>> {
        std::iter::once(&self.exterior).chain(self.interiors.iter())
    }
}

/// A 2D geometry: a point, a multi-point, a line string, a multi-line-string, a polygon, or a
/// multi-polygon.
///
/// Point-in-polygon containment is intentionally not implemented here — topological predicates
/// are out of scope for this crate (they belong to a containment/intersection library); the
/// `distance` function below only ever measures boundary-to-boundary or boundary-to-point
/// distance, which is exact and well-defined without containment.
#[derive(Debug, Clone, PartialEq)]
pub enum Geometry {
    Point(Point),
    MultiPoint(Vec<Point>),
    LineString(Vec<Point>),
    MultiLineString(Vec<Vec<Point>>),
    Polygon(Polygon),
    MultiPolygon(Vec<Polygon>),
}

impl Geometry {
    /// All vertices of this geometry, used for both bbox computation and point-based distance.
    fn vertices(&self) -> Vec<Point> {
        match self {
            Geometry::Point(p) => vec![*p],
            Geometry::MultiPoint(pts) => pts.clone(),
            Geometry::LineString(pts) => pts.clone(),
            Geometry::MultiLineString(lines) => lines.iter().flatten().copied().collect(),
            Geometry::Polygon(poly) => poly.rings().flatten().copied().collect(),
            Geometry::MultiPolygon(polys) => polys
                .iter()
                .flat_map(|poly| poly.rings().flatten().copied())
                .collect(),
        }
    }

    /// All closed-ring/line edges of this geometry. Empty for point geometries.
    fn edges(&self) -> Vec<(Point, Point)> {
        match self {
            Geometry::Point(_) | Geometry::MultiPoint(_) => Vec::new(),
            Geometry::LineString(pts) => edges_of_path(pts),
            Geometry::MultiLineString(lines) => {
                lines.iter().flat_map(|l| edges_of_path(l)).collect()
            }
            Geometry::Polygon(poly) => poly.rings().flat_map(|r| edges_of_ring(r)).collect(),
            Geometry::MultiPolygon(polys) => polys
                .iter()
                .flat_map(|poly| poly.rings().flat_map(|r| edges_of_ring(r)))
                .collect(),
        }
    }

    pub fn is_finite(&self) -> bool {
        self.vertices().iter().all(Point::is_finite)
    }
}

fn edges_of_path(pts: &[Point]) -> Vec<(Point, Point)> {
    pts.windows(2).map(|w| (w[0], w[1])).collect()
}

fn edges_of_ring(pts: &[Point]) -> Vec<(Point, Point)> {
    if pts.len() < 2 {
        return Vec::new();
    }
    let mut edges = edges_of_path(pts);
    edges.push((pts[pts.len() - 1], pts[0]));
    edges
}

/// The bounding rectangle of a geometry.
pub fn bbox(g: &Geometry) -> Rect {
    let vertices = g.vertices();
    let first = vertices
        .first()
        .copied()
        .expect("a geometry must have at least one vertex");
    vertices
        .iter()
        .skip(1)
        .fold(Rect::of_point(&first), |acc, p| acc.union(&Rect::of_point(p)))
}

/// The exact shortest Euclidean distance between two geometries.
///
/// Decomposes both geometries into their constituent points and edges and takes the minimum
/// distance over every (point-or-edge, point-or-edge) pair. `distance(g, g) == 0.0` always,
/// since a geometry shares every point and edge with itself.
pub fn distance(a: &Geometry, b: &Geometry) -> f64 {
    let a_points = a.vertices();
    let a_edges = a.edges();
    let b_points = b.vertices();
    let b_edges = b.edges();

    let mut best = f64::INFINITY;

    for pa in &a_points {
        for pb in &b_points {
            best = best.min(point_point_distance(pa, pb));
        }
        for (q0, q1) in &b_edges {
            best = best.min(point_segment_distance(pa, q0, q1));
        }
    }
    for (p0, p1) in &a_edges {
        for pb in &b_points {
            best = best.min(point_segment_distance(pb, p0, p1));
        }
        for (q0, q1) in &b_edges {
            best = best.min(segment_segment_distance(p0, p1, q0, q1));
        }
    }

    best
}

fn point_point_distance(a: &Point, b: &Point) -> f64 {
    a.distance_sq(b).sqrt()
}

fn point_segment_distance(p: &Point, a: &Point, b: &Point) -> f64 {
    let dx = b.x - a.x;
    let dy = b.y - a.y;
    let len_sq = dx * dx + dy * dy;
    if len_sq == 0.0 {
        return point_point_distance(p, a);
    }
    let t = ((p.x - a.x) * dx + (p.y - a.y) * dy) / len_sq;
    let t = t.clamp(0.0, 1.0);
    let proj = Point::new(a.x + t * dx, a.y + t * dy);
    point_point_distance(p, &proj)
}

/// Distance between segments `(a0, a1)` and `(b0, b1)`; zero if they intersect.
fn segment_segment_distance(a0: &Point, a1: &Point, b0: &Point, b1: &Point) -> f64 {
    if segments_intersect(a0, a1, b0, b1) {
        return 0.0;
    }
    let mut best = point_segment_distance(a0, b0, b1);
    best = best.min(point_segment_distance(a1, b0, b1));
    best = best.min(point_segment_distance(b0, a0, a1));
    best = best.min(point_segment_distance(b1, a0, a1));
    best
}

fn orientation(a: &Point, b: &Point, c: &Point) -> Ordering {
    let cross = (b.x - a.x) * (c.y - a.y) - (b.y - a.y) * (c.x - a.x);
    if cross.abs() < 1e-12 {
        Ordering::Equal
    } else if cross > 0.0 {
        Ordering::Greater
    } else {
        Ordering::Less
    }
}

fn on_segment(a: &Point, b: &Point, p: &Point) -> bool {
    p.x >= a.x.min(b.x) - 1e-12
        && p.x <= a.x.max(b.x) + 1e-12
        && p.y >= a.y.min(b.y) - 1e-12
        && p.y <= a.y.max(b.y) + 1e-12
}

fn segments_intersect(a0: &Point, a1: &Point, b0: &Point, b1: &Point) -> bool {
    let o1 = orientation(a0, a1, b0);
    let o2 = orientation(a0, a1, b1);
    let o3 = orientation(b0, b1, a0);
    let o4 = orientation(b0, b1, a1);

    if o1 != o2 && o3 != o4 {
        return true;
    }

    (o1 == Ordering::Equal && on_segment(a0, a1, b0))
        || (o2 == Ordering::Equal && on_segment(a0, a1, b1))
        || (o3 == Ordering::Equal && on_segment(b0, b1, a0))
        || (o4 == Ordering::Equal && on_segment(b0, b1, a1))
}
