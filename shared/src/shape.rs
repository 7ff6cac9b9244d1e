use serde::{Deserialize, Serialize};

use crate::vec2::{FloatPoint, IntPoint, IntVector};

fn orientation(a: IntPoint, b: IntPoint, c: IntPoint) -> i128 {
    (b - a).cross(c - a)
}

fn on_segment(a: IntPoint, b: IntPoint, p: IntPoint) -> bool {
    a.x.min(b.x) <= p.x && p.x <= a.x.max(b.x) && a.y.min(b.y) <= p.y && p.y <= a.y.max(b.y)
}

/// Closed segment intersection test, exact. Degenerate segments are points.
pub fn segments_intersect(p1: IntPoint, p2: IntPoint, q1: IntPoint, q2: IntPoint) -> bool {
    let o1 = orientation(p1, p2, q1).signum();
    let o2 = orientation(p1, p2, q2).signum();
    let o3 = orientation(q1, q2, p1).signum();
    let o4 = orientation(q1, q2, p2).signum();
    if o1 * o2 < 0 && o3 * o4 < 0 {
        return true;
    }
    (o1 == 0 && on_segment(p1, p2, q1))
        || (o2 == 0 && on_segment(p1, p2, q2))
        || (o3 == 0 && on_segment(q1, q2, p1))
        || (o4 == 0 && on_segment(q1, q2, p2))
}

pub fn point_segment_distance(p: FloatPoint, a: FloatPoint, b: FloatPoint) -> f64 {
    let ab = b - a;
    let len2 = ab.magnitude2();
    if len2 <= 0.0 {
        return p.distance(a);
    }
    let t = ((p - a).dot(ab) / len2).clamp(0.0, 1.0);
    p.distance(a + ab * t)
}

pub fn segment_distance(p1: IntPoint, p2: IntPoint, q1: IntPoint, q2: IntPoint) -> f64 {
    if segments_intersect(p1, p2, q1, q2) {
        return 0.0;
    }
    let (fp1, fp2, fq1, fq2) = (p1.to_float(), p2.to_float(), q1.to_float(), q2.to_float());
    point_segment_distance(fp1, fq1, fq2)
        .min(point_segment_distance(fp2, fq1, fq2))
        .min(point_segment_distance(fq1, fp1, fp2))
        .min(point_segment_distance(fq2, fp1, fp2))
}

/// Closed containment in a convex counterclockwise polygon. Polygons with one
/// or two corners are treated as a point or a segment.
pub fn point_in_convex_polygon(p: IntPoint, polygon: &[IntPoint]) -> bool {
    match polygon.len() {
        0 => false,
        1 => polygon[0] == p,
        2 => orientation(polygon[0], polygon[1], p) == 0 && on_segment(polygon[0], polygon[1], p),
        n => (0..n).all(|i| orientation(polygon[i], polygon[(i + 1) % n], p) >= 0),
    }
}

/// True if the segment `p`-`q` passes through the interior of the convex
/// counterclockwise polygon. Touching the boundary does not count.
pub fn segment_crosses_polygon_interior(p: IntPoint, q: IntPoint, polygon: &[IntPoint]) -> bool {
    let n = polygon.len();
    if n < 3 {
        return false;
    }
    // separating polygon edge
    for i in 0..n {
        let a = polygon[i];
        let b = polygon[(i + 1) % n];
        if orientation(a, b, p) <= 0 && orientation(a, b, q) <= 0 {
            return false;
        }
    }
    if p == q {
        return true;
    }
    // separating segment line
    let all_left = polygon.iter().all(|&v| orientation(p, q, v) >= 0);
    let all_right = polygon.iter().all(|&v| orientation(p, q, v) <= 0);
    !(all_left || all_right)
}

fn edges(corners: &[IntPoint]) -> Vec<(IntPoint, IntPoint)> {
    match corners.len() {
        0 => Vec::new(),
        1 => vec![(corners[0], corners[0])],
        2 => vec![(corners[0], corners[1])],
        n => (0..n).map(|i| (corners[i], corners[(i + 1) % n])).collect(),
    }
}

fn cores_intersect(a: &[IntPoint], b: &[IntPoint]) -> bool {
    let edges_a = edges(a);
    let edges_b = edges(b);
    for &(p1, p2) in &edges_a {
        for &(q1, q2) in &edges_b {
            if segments_intersect(p1, p2, q1, q2) {
                return true;
            }
        }
    }
    (a.len() >= 3 && b.first().is_some_and(|&p| point_in_convex_polygon(p, a)))
        || (b.len() >= 3 && a.first().is_some_and(|&p| point_in_convex_polygon(p, b)))
}

fn core_distance(a: &[IntPoint], b: &[IntPoint]) -> f64 {
    if cores_intersect(a, b) {
        return 0.0;
    }
    let mut min = f64::MAX;
    for &(p1, p2) in &edges(a) {
        for &(q1, q2) in &edges(b) {
            min = min.min(segment_distance(p1, p2, q1, q2));
        }
    }
    min
}

/// Convex hull in counterclockwise order without collinear corners.
/// Fewer than three distinct input points yield the points themselves
/// and collinear input yields the two extreme points.
pub fn convex_hull(points: &[IntPoint]) -> Vec<IntPoint> {
    let mut pts = points.to_vec();
    pts.sort();
    pts.dedup();
    if pts.len() <= 2 {
        return pts;
    }
    let mut lower: Vec<IntPoint> = Vec::new();
    for &p in &pts {
        while lower.len() >= 2 && orientation(lower[lower.len() - 2], lower[lower.len() - 1], p) <= 0 {
            lower.pop();
        }
        lower.push(p);
    }
    let mut upper: Vec<IntPoint> = Vec::new();
    for &p in pts.iter().rev() {
        while upper.len() >= 2 && orientation(upper[upper.len() - 2], upper[upper.len() - 1], p) <= 0 {
            upper.pop();
        }
        upper.push(p);
    }
    lower.pop();
    upper.pop();
    lower.extend(upper);
    lower
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct IntBox {
    pub ll: IntPoint,
    pub ur: IntPoint,
}

impl IntBox {
    pub const EMPTY: IntBox = IntBox {
        ll: IntPoint::new(i64::MAX, i64::MAX),
        ur: IntPoint::new(i64::MIN, i64::MIN),
    };

    pub fn new(a: IntPoint, b: IntPoint) -> IntBox {
        IntBox {
            ll: IntPoint::new(a.x.min(b.x), a.y.min(b.y)),
            ur: IntPoint::new(a.x.max(b.x), a.y.max(b.y)),
        }
    }
    pub fn from_point(p: IntPoint) -> IntBox {
        IntBox { ll: p, ur: p }
    }
    pub fn is_empty(&self) -> bool {
        self.ll.x > self.ur.x || self.ll.y > self.ur.y
    }
    pub fn width(&self) -> i64 {
        self.ur.x - self.ll.x
    }
    pub fn height(&self) -> i64 {
        self.ur.y - self.ll.y
    }
    pub fn center(&self) -> IntPoint {
        IntPoint::new(
            self.ll.x + (self.ur.x - self.ll.x) / 2,
            self.ll.y + (self.ur.y - self.ll.y) / 2,
        )
    }
    pub fn union(&self, other: &IntBox) -> IntBox {
        if self.is_empty() {
            return *other;
        }
        if other.is_empty() {
            return *self;
        }
        IntBox {
            ll: IntPoint::new(self.ll.x.min(other.ll.x), self.ll.y.min(other.ll.y)),
            ur: IntPoint::new(self.ur.x.max(other.ur.x), self.ur.y.max(other.ur.y)),
        }
    }
    pub fn add_point(&self, p: IntPoint) -> IntBox {
        self.union(&IntBox::from_point(p))
    }
    pub fn intersects(&self, other: &IntBox) -> bool {
        !self.is_empty()
            && !other.is_empty()
            && self.ll.x <= other.ur.x
            && other.ll.x <= self.ur.x
            && self.ll.y <= other.ur.y
            && other.ll.y <= self.ur.y
    }
    pub fn contains(&self, p: IntPoint) -> bool {
        self.ll.x <= p.x && p.x <= self.ur.x && self.ll.y <= p.y && p.y <= self.ur.y
    }
    pub fn contains_box(&self, other: &IntBox) -> bool {
        !other.is_empty() && self.contains(other.ll) && self.contains(other.ur)
    }
    pub fn enlarge(&self, distance: i64) -> IntBox {
        if self.is_empty() {
            return *self;
        }
        IntBox {
            ll: IntPoint::new(self.ll.x - distance, self.ll.y - distance),
            ur: IntPoint::new(self.ur.x + distance, self.ur.y + distance),
        }
    }
    /// Corners in counterclockwise order starting at the lower left.
    pub fn corners(&self) -> [IntPoint; 4] {
        [
            self.ll,
            IntPoint::new(self.ur.x, self.ll.y),
            self.ur,
            IntPoint::new(self.ll.x, self.ur.y),
        ]
    }
}

/// Intersection of an axis-parallel box and a 45 degree rotated box:
/// `x - y` is bounded by the `dif` pair and `x + y` by the `sum` pair.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct IntOctagon {
    pub x_min: i64,
    pub y_min: i64,
    pub x_max: i64,
    pub y_max: i64,
    pub dif_min: i64,
    pub dif_max: i64,
    pub sum_min: i64,
    pub sum_max: i64,
}

impl IntOctagon {
    pub const EMPTY: IntOctagon = IntOctagon {
        x_min: i64::MAX,
        y_min: i64::MAX,
        x_max: i64::MIN,
        y_max: i64::MIN,
        dif_min: i64::MAX,
        dif_max: i64::MIN,
        sum_min: i64::MAX,
        sum_max: i64::MIN,
    };

    pub fn from_point(p: IntPoint) -> IntOctagon {
        IntOctagon {
            x_min: p.x,
            y_min: p.y,
            x_max: p.x,
            y_max: p.y,
            dif_min: p.x - p.y,
            dif_max: p.x - p.y,
            sum_min: p.x + p.y,
            sum_max: p.x + p.y,
        }
    }
    pub fn from_points(points: &[IntPoint]) -> IntOctagon {
        points
            .iter()
            .fold(IntOctagon::EMPTY, |acc, &p| acc.union(&IntOctagon::from_point(p)))
    }
    pub fn from_box(b: &IntBox) -> IntOctagon {
        if b.is_empty() {
            return IntOctagon::EMPTY;
        }
        IntOctagon::from_points(&b.corners())
    }
    pub fn is_empty(&self) -> bool {
        self.x_min > self.x_max
            || self.y_min > self.y_max
            || self.dif_min > self.dif_max
            || self.sum_min > self.sum_max
    }
    pub fn union(&self, other: &IntOctagon) -> IntOctagon {
        if self.is_empty() {
            return *other;
        }
        if other.is_empty() {
            return *self;
        }
        IntOctagon {
            x_min: self.x_min.min(other.x_min),
            y_min: self.y_min.min(other.y_min),
            x_max: self.x_max.max(other.x_max),
            y_max: self.y_max.max(other.y_max),
            dif_min: self.dif_min.min(other.dif_min),
            dif_max: self.dif_max.max(other.dif_max),
            sum_min: self.sum_min.min(other.sum_min),
            sum_max: self.sum_max.max(other.sum_max),
        }
    }
    pub fn intersects(&self, other: &IntOctagon) -> bool {
        !self.is_empty()
            && !other.is_empty()
            && self.x_min <= other.x_max
            && other.x_min <= self.x_max
            && self.y_min <= other.y_max
            && other.y_min <= self.y_max
            && self.dif_min <= other.dif_max
            && other.dif_min <= self.dif_max
            && self.sum_min <= other.sum_max
            && other.sum_min <= self.sum_max
    }
    pub fn contains(&self, p: IntPoint) -> bool {
        let dif = p.x - p.y;
        let sum = p.x + p.y;
        self.x_min <= p.x
            && p.x <= self.x_max
            && self.y_min <= p.y
            && p.y <= self.y_max
            && self.dif_min <= dif
            && dif <= self.dif_max
            && self.sum_min <= sum
            && sum <= self.sum_max
    }
    /// Grows the octagon so that it contains every point within `distance`
    /// of the original. Diagonal bounds are rounded outward.
    pub fn enlarge(&self, distance: i64) -> IntOctagon {
        if self.is_empty() || distance <= 0 {
            return *self;
        }
        let diagonal = (distance as f64 * std::f64::consts::SQRT_2).ceil() as i64;
        IntOctagon {
            x_min: self.x_min - distance,
            y_min: self.y_min - distance,
            x_max: self.x_max + distance,
            y_max: self.y_max + distance,
            dif_min: self.dif_min - diagonal,
            dif_max: self.dif_max + diagonal,
            sum_min: self.sum_min - diagonal,
            sum_max: self.sum_max + diagonal,
        }
        .normalize()
    }
    /// Tightens diagonal bounds that lie outside the box corners.
    pub fn normalize(&self) -> IntOctagon {
        if self.is_empty() {
            return *self;
        }
        IntOctagon {
            dif_min: self.dif_min.max(self.x_min - self.y_max),
            dif_max: self.dif_max.min(self.x_max - self.y_min),
            sum_min: self.sum_min.max(self.x_min + self.y_min),
            sum_max: self.sum_max.min(self.x_max + self.y_max),
            ..*self
        }
    }
    pub fn bounding_box(&self) -> IntBox {
        if self.is_empty() {
            return IntBox::EMPTY;
        }
        IntBox {
            ll: IntPoint::new(self.x_min, self.y_min),
            ur: IntPoint::new(self.x_max, self.y_max),
        }
    }
    /// Corners in counterclockwise order, duplicates removed.
    pub fn to_polygon(&self) -> Vec<IntPoint> {
        if self.is_empty() {
            return Vec::new();
        }
        let o = self.normalize();
        let vertices = [
            IntPoint::new(o.sum_min - o.y_min, o.y_min),
            IntPoint::new(o.dif_max + o.y_min, o.y_min),
            IntPoint::new(o.x_max, o.x_max - o.dif_max),
            IntPoint::new(o.x_max, o.sum_max - o.x_max),
            IntPoint::new(o.sum_max - o.y_max, o.y_max),
            IntPoint::new(o.y_max + o.dif_min, o.y_max),
            IntPoint::new(o.x_min, o.x_min - o.dif_min),
            IntPoint::new(o.x_min, o.sum_min - o.x_min),
        ];
        convex_hull(&vertices)
    }
}

/// A convex polygon (possibly degenerated to a segment or a point) grown by a
/// radius. Trace segments, round pads and clearance zones are all tile shapes.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TileShape {
    corners: Vec<IntPoint>,
    radius: i64,
}

impl TileShape {
    pub fn point(center: IntPoint, radius: i64) -> TileShape {
        TileShape {
            corners: vec![center],
            radius: radius.max(0),
        }
    }
    pub fn segment(a: IntPoint, b: IntPoint, half_width: i64) -> TileShape {
        TileShape {
            corners: convex_hull(&[a, b]),
            radius: half_width.max(0),
        }
    }
    /// Convex hull of the points grown by `radius`, `None` without points.
    pub fn polygon(points: &[IntPoint], radius: i64) -> Option<TileShape> {
        let corners = convex_hull(points);
        if corners.is_empty() {
            return None;
        }
        Some(TileShape {
            corners,
            radius: radius.max(0),
        })
    }
    pub fn rectangle(b: &IntBox) -> Option<TileShape> {
        if b.is_empty() {
            return None;
        }
        TileShape::polygon(&b.corners(), 0)
    }
    pub fn corners(&self) -> &[IntPoint] {
        &self.corners
    }
    pub fn radius(&self) -> i64 {
        self.radius
    }
    pub fn enlarge(&self, distance: i64) -> TileShape {
        TileShape {
            corners: self.corners.clone(),
            radius: (self.radius + distance).max(0),
        }
    }
    pub fn translate(&self, v: IntVector) -> TileShape {
        TileShape {
            corners: self.corners.iter().map(|&p| p + v).collect(),
            radius: self.radius,
        }
    }
    pub fn bounding_box(&self) -> IntBox {
        self.corners
            .iter()
            .fold(IntBox::EMPTY, |acc, &p| acc.add_point(p))
            .enlarge(self.radius)
    }
    pub fn bounding_octagon(&self) -> IntOctagon {
        IntOctagon::from_points(&self.corners).enlarge(self.radius)
    }
    pub fn center_approx(&self) -> FloatPoint {
        let sum = self
            .corners
            .iter()
            .fold(FloatPoint::default(), |acc, p| acc + p.to_float());
        sum / self.corners.len().max(1) as f64
    }
    pub fn contains(&self, p: IntPoint) -> bool {
        if point_in_convex_polygon(p, &self.corners) {
            return true;
        }
        core_distance(&self.corners, &[p]) <= self.radius as f64
    }
    /// Distance between the two shapes, negative when they overlap by more
    /// than their cores touching.
    pub fn distance(&self, other: &TileShape) -> f64 {
        core_distance(&self.corners, &other.corners) - self.radius as f64 - other.radius as f64
    }
    /// True if the shapes are closer than `clearance`. Shapes exactly at the
    /// clearance distance do not intersect.
    pub fn intersects_with_clearance(&self, other: &TileShape, clearance: i64) -> bool {
        let required = clearance as f64 + self.radius as f64 + other.radius as f64;
        let core = core_distance(&self.corners, &other.corners);
        core < required - DISTANCE_TOLERANCE
    }
}

/// Slack for float distances of shapes that were placed exactly on a
/// clearance boundary.
const DISTANCE_TOLERANCE: f64 = 1e-6;

#[cfg(test)]
mod tests {
    use super::*;

    fn p(x: i64, y: i64) -> IntPoint {
        IntPoint::new(x, y)
    }

    #[test]
    fn hull_drops_inner_and_collinear_points() {
        let hull = convex_hull(&[p(0, 0), p(5, 0), p(10, 0), p(10, 10), p(0, 10), p(3, 4)]);
        assert_eq!(hull, vec![p(0, 0), p(10, 0), p(10, 10), p(0, 10)]);
        assert_eq!(convex_hull(&[p(0, 0), p(2, 2), p(4, 4)]), vec![p(0, 0), p(4, 4)]);
    }

    #[test]
    fn segment_distance_accounts_for_width() {
        let a = TileShape::segment(p(0, 0), p(100, 0), 5);
        let b = TileShape::segment(p(0, 30), p(100, 30), 5);
        assert!((a.distance(&b) - 20.0).abs() < 1e-9);
        assert!(!a.intersects_with_clearance(&b, 20));
        assert!(a.intersects_with_clearance(&b, 21));
    }

    #[test]
    fn overlapping_cores_have_zero_core_distance() {
        let square = TileShape::polygon(&[p(0, 0), p(10, 0), p(10, 10), p(0, 10)], 0).unwrap();
        let inner = TileShape::point(p(5, 5), 1);
        assert_eq!(square.distance(&inner), -1.0);
        let crossing = TileShape::segment(p(-5, 5), p(15, 5), 0);
        assert!(square.intersects_with_clearance(&crossing, 0));
        assert!(square.contains(p(10, 10)));
        assert!(!square.contains(p(11, 10)));
    }

    #[test]
    fn octagon_polygon_contains_enlarged_shape() {
        let shape = TileShape::segment(p(0, 0), p(100, 0), 10);
        let octagon = shape.bounding_octagon();
        let polygon = octagon.to_polygon();
        assert_eq!(polygon.len(), 8);
        for corner in &polygon {
            assert!(octagon.contains(*corner));
        }
        for probe in [p(-10, 0), p(110, 0), p(50, 10), p(50, -10), p(-7, 7), p(107, -7)] {
            assert!(point_in_convex_polygon(probe, &polygon), "{probe:?}");
        }
    }

    #[test]
    fn interior_crossing_ignores_touching() {
        let square = vec![p(0, 0), p(10, 0), p(10, 10), p(0, 10)];
        assert!(segment_crosses_polygon_interior(p(-5, 5), p(15, 5), &square));
        assert!(!segment_crosses_polygon_interior(p(-5, 0), p(15, 0), &square));
        assert!(!segment_crosses_polygon_interior(p(-5, 10), p(0, 15), &square));
        assert!(!segment_crosses_polygon_interior(p(10, 0), p(10, 10), &square));
    }
}
