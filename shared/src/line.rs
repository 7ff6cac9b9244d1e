use serde::{Deserialize, Serialize};

use crate::{
    direction::Direction,
    vec2::{FloatPoint, IntPoint, IntVector, RationalPoint},
};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Side {
    OnTheLeft,
    OnTheRight,
    Collinear,
}

impl Side {
    fn of_sign(value: i128) -> Side {
        match value.signum() {
            1 => Side::OnTheLeft,
            -1 => Side::OnTheRight,
            _ => Side::Collinear,
        }
    }
    pub fn negate(&self) -> Side {
        match self {
            Side::OnTheLeft => Side::OnTheRight,
            Side::OnTheRight => Side::OnTheLeft,
            Side::Collinear => Side::Collinear,
        }
    }
}

/// Infinite directed line through two distinct integer points.
/// The direction is fixed by the order of `a` and `b`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Line {
    pub a: IntPoint,
    pub b: IntPoint,
}

impl Line {
    /// Returns `None` if the two points coincide.
    pub fn new(a: IntPoint, b: IntPoint) -> Option<Line> {
        if a == b { None } else { Some(Line { a, b }) }
    }
    pub fn from_direction(p: IntPoint, direction: Direction) -> Line {
        Line {
            a: p,
            b: p + direction.vector(),
        }
    }
    pub fn vector(&self) -> IntVector {
        self.b - self.a
    }
    pub fn direction(&self) -> Direction {
        // a != b is a construction invariant
        Direction::from_vector(self.vector()).unwrap_or(Direction::RIGHT)
    }
    pub fn opposite(&self) -> Line {
        Line {
            a: self.b,
            b: self.a,
        }
    }
    pub fn side_of(&self, p: IntPoint) -> Side {
        Side::of_sign(self.vector().cross(p - self.a))
    }
    pub fn side_of_rational(&self, p: RationalPoint) -> Side {
        let v = self.vector();
        let px = p.x() - self.a.x as i128 * p.z();
        let py = p.y() - self.a.y as i128 * p.z();
        Side::of_sign(v.x as i128 * py - v.y as i128 * px)
    }
    pub fn is_parallel(&self, other: &Line) -> bool {
        self.vector().cross(other.vector()) == 0
    }
    /// True if both lines lie on the same carrier, regardless of orientation.
    pub fn is_equal_or_opposite(&self, other: &Line) -> bool {
        self.is_parallel(other) && self.side_of(other.a) == Side::Collinear
    }
    /// Exact intersection point, `None` for parallel lines.
    pub fn intersection(&self, other: &Line) -> Option<RationalPoint> {
        let d1 = self.vector();
        let d2 = other.vector();
        let det = d1.cross(d2);
        if det == 0 {
            return None;
        }
        let num = (other.a - self.a).cross(d2);
        RationalPoint::new(
            self.a.x as i128 * det + d1.x as i128 * num,
            self.a.y as i128 * det + d1.y as i128 * num,
            det,
        )
    }
    pub fn intersection_approx(&self, other: &Line) -> Option<FloatPoint> {
        self.intersection(other).map(|p| p.to_float())
    }
    /// Signed euclidean distance, positive on the left.
    pub fn signed_distance(&self, p: FloatPoint) -> f64 {
        let v = self.vector().to_float();
        v.cross(p - self.a.to_float()) / v.length()
    }
    /// The parallel line with the same direction moved `distance` to the left
    /// (to the right for negative values), rounded onto the integer grid.
    pub fn translate(&self, distance: f64) -> Line {
        let v = self.vector().to_float();
        let shift = v.perp().normalize() * distance;
        let a = (self.a.to_float() + shift).round();
        Line {
            a,
            b: a + self.vector(),
        }
    }
    /// The parallel line with the same direction passing through `p`.
    pub fn through(&self, p: IntPoint) -> Line {
        Line {
            a: p,
            b: p + self.vector(),
        }
    }
    /// The line through `p` perpendicular to this one, turned to the left.
    pub fn perpendicular_through(&self, p: IntPoint) -> Line {
        Line::from_direction(p, self.direction().turn_90())
    }
    pub fn perpendicular_projection(&self, p: FloatPoint) -> FloatPoint {
        let a = self.a.to_float();
        let v = self.vector().to_float();
        let t = (p - a).dot(v) / v.magnitude2();
        a + v * t
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn line(ax: i64, ay: i64, bx: i64, by: i64) -> Line {
        Line::new(IntPoint::new(ax, ay), IntPoint::new(bx, by)).unwrap()
    }

    #[test]
    fn intersection_of_diagonals_can_be_half_integer() {
        let l1 = line(0, 0, 1, 1);
        let l2 = line(0, 1, 1, 0);
        let p = l1.intersection(&l2).unwrap();
        assert!(!p.is_integral());
        assert_eq!(p.to_float(), FloatPoint::new(0.5, 0.5));
        assert!(l1.intersection(&line(5, 5, 6, 6)).is_none());
    }

    #[test]
    fn side_of_follows_direction() {
        let l = line(0, 0, 10, 0);
        assert_eq!(l.side_of(IntPoint::new(3, 2)), Side::OnTheLeft);
        assert_eq!(l.side_of(IntPoint::new(3, -2)), Side::OnTheRight);
        assert_eq!(l.opposite().side_of(IntPoint::new(3, 2)), Side::OnTheRight);
        let p = RationalPoint::new(7, -1, 2).unwrap();
        assert_eq!(l.side_of_rational(p), Side::OnTheRight);
    }

    #[test]
    fn translate_keeps_direction() {
        let l = line(0, 0, 10, 0);
        let moved = l.translate(3.0);
        assert_eq!(moved.direction(), l.direction());
        assert_eq!(moved.a, IntPoint::new(0, 3));
        assert!((moved.signed_distance(IntPoint::new(4, 0).to_float()) + 3.0).abs() < 1e-9);
        assert!(l.through(IntPoint::new(2, 7)).is_parallel(&l));
    }

    #[test]
    fn projection_lands_on_line() {
        let l = line(0, 0, 10, 10);
        let p = l.perpendicular_projection(FloatPoint::new(10.0, 0.0));
        assert!((p.x - 5.0).abs() < 1e-9 && (p.y - 5.0).abs() < 1e-9);
    }
}
