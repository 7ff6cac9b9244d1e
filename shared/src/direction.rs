use serde::{Deserialize, Serialize};

use crate::vec2::{IntPoint, IntVector};

/// Direction of a line, stored as a primitive integer vector (gcd of the
/// components is 1). Two parallel lines with the same orientation share it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Direction {
    x: i64,
    y: i64,
}

impl Direction {
    pub const RIGHT: Direction = Direction { x: 1, y: 0 };
    pub const UP: Direction = Direction { x: 0, y: 1 };

    /// Returns `None` for the zero vector.
    pub fn from_vector(v: IntVector) -> Option<Direction> {
        if v.is_zero() {
            return None;
        }
        let g = gcd(v.x, v.y);
        Some(Direction {
            x: v.x / g,
            y: v.y / g,
        })
    }
    pub fn from_points(from: IntPoint, to: IntPoint) -> Option<Direction> {
        Direction::from_vector(to - from)
    }
    pub fn x(&self) -> i64 {
        self.x
    }
    pub fn y(&self) -> i64 {
        self.y
    }
    pub fn vector(&self) -> IntVector {
        IntVector::new(self.x, self.y)
    }
    pub fn opposite(&self) -> Direction {
        Direction {
            x: -self.x,
            y: -self.y,
        }
    }
    pub fn turn_90(&self) -> Direction {
        Direction {
            x: -self.y,
            y: self.x,
        }
    }
    pub fn is_orthogonal(&self) -> bool {
        self.x == 0 || self.y == 0
    }
    pub fn is_diagonal(&self) -> bool {
        self.x.abs() == self.y.abs()
    }
    pub fn is_multiple_of_45_degree(&self) -> bool {
        self.is_orthogonal() || self.is_diagonal()
    }
    pub fn to_direction45(&self) -> Option<Direction45> {
        Direction45::from_direction(*self)
    }
    /// Cosine of the angle between the two directions.
    pub fn cos_angle(&self, other: Direction) -> f64 {
        use cgmath::InnerSpace;
        let a = self.vector().to_float().to_vector2().normalize();
        let b = other.vector().to_float().to_vector2().normalize();
        a.dot(b)
    }
}

fn gcd(a: i64, b: i64) -> i64 {
    let (mut a, mut b) = (a.abs(), b.abs());
    while b != 0 {
        (a, b) = (b, a % b);
    }
    a
}

/// One of the eight octilinear directions.
#[derive(Debug, Clone, Copy, PartialEq, Hash, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Direction45 {
    Up,
    Down,
    Left,
    Right,
    TopRight,
    TopLeft,
    BottomRight,
    BottomLeft,
}

impl Direction45 {
    pub fn opposite(&self) -> Direction45 {
        Direction45::int_to_direction((self.direction_to_int() + 4) % 8)
    }
    pub fn is_diagonal(&self) -> bool {
        matches!(
            self,
            Direction45::TopRight
                | Direction45::TopLeft
                | Direction45::BottomRight
                | Direction45::BottomLeft
        )
    }
    // clockwise, starting at Up
    fn direction_to_int(&self) -> i32 {
        match self {
            Direction45::Up => 0,
            Direction45::TopRight => 1,
            Direction45::Right => 2,
            Direction45::BottomRight => 3,
            Direction45::Down => 4,
            Direction45::BottomLeft => 5,
            Direction45::Left => 6,
            Direction45::TopLeft => 7,
        }
    }
    fn int_to_direction(i: i32) -> Direction45 {
        match i.rem_euclid(8) {
            0 => Direction45::Up,
            1 => Direction45::TopRight,
            2 => Direction45::Right,
            3 => Direction45::BottomRight,
            4 => Direction45::Down,
            5 => Direction45::BottomLeft,
            6 => Direction45::Left,
            _ => Direction45::TopLeft,
        }
    }
    fn difference(&self, other: Direction45) -> i32 {
        (self.direction_to_int() - other.direction_to_int()).rem_euclid(8)
    }
    /// True if going from `self` to `other` is a 90 degree turn.
    pub fn is_right_angle(&self, other: Direction45) -> bool {
        matches!(self.difference(other), 2 | 6)
    }
    /// True if going from `self` to `other` is a 135 degree turn.
    pub fn is_sharp_angle(&self, other: Direction45) -> bool {
        matches!(self.difference(other), 3 | 5)
    }
    /// The direction of a cut line that splits the turn from `dir1` to `dir2`
    /// into two 45 degree turns (for a right angle) or into a 90 and a 45
    /// degree turn (for a sharp angle). `None` for any other turn.
    pub fn between(dir1: Direction45, dir2: Direction45) -> Option<Direction45> {
        let dir2_int = dir2.direction_to_int();
        match dir1.difference(dir2) {
            2 | 3 => Some(Direction45::int_to_direction(dir2_int + 1)),
            5 | 6 => Some(Direction45::int_to_direction(dir2_int + 7)),
            _ => None,
        }
    }
    pub fn left_90_dir(&self) -> Direction45 {
        Direction45::int_to_direction(self.direction_to_int() + 6)
    }
    pub fn right_90_dir(&self) -> Direction45 {
        Direction45::int_to_direction(self.direction_to_int() + 2)
    }
    pub fn left_45_dir(&self) -> Direction45 {
        Direction45::int_to_direction(self.direction_to_int() + 7)
    }
    pub fn right_45_dir(&self) -> Direction45 {
        Direction45::int_to_direction(self.direction_to_int() + 1)
    }
    pub fn to_int_vector(&self) -> IntVector {
        match self {
            Direction45::Up => IntVector::new(0, 1),
            Direction45::Down => IntVector::new(0, -1),
            Direction45::Left => IntVector::new(-1, 0),
            Direction45::Right => IntVector::new(1, 0),
            Direction45::TopRight => IntVector::new(1, 1),
            Direction45::TopLeft => IntVector::new(-1, 1),
            Direction45::BottomRight => IntVector::new(1, -1),
            Direction45::BottomLeft => IntVector::new(-1, -1),
        }
    }
    pub fn to_direction(&self) -> Direction {
        let v = self.to_int_vector();
        Direction { x: v.x, y: v.y }
    }
    pub fn from_direction(direction: Direction) -> Option<Direction45> {
        let result = match (direction.x, direction.y) {
            (0, 1) => Direction45::Up,
            (0, -1) => Direction45::Down,
            (-1, 0) => Direction45::Left,
            (1, 0) => Direction45::Right,
            (1, 1) => Direction45::TopRight,
            (-1, 1) => Direction45::TopLeft,
            (1, -1) => Direction45::BottomRight,
            (-1, -1) => Direction45::BottomLeft,
            _ => return None,
        };
        Some(result)
    }
    pub fn from_points(from: IntPoint, to: IntPoint) -> Option<Direction45> {
        Direction::from_points(from, to).and_then(Direction45::from_direction)
    }
}

/// Board-wide policy on which segment directions are allowed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum AngleRestriction {
    #[default]
    None,
    FortyFiveDegree,
    NinetyDegree,
}

impl AngleRestriction {
    pub fn allows(&self, direction: Direction) -> bool {
        match self {
            AngleRestriction::None => true,
            AngleRestriction::FortyFiveDegree => direction.is_multiple_of_45_degree(),
            AngleRestriction::NinetyDegree => direction.is_orthogonal(),
        }
    }
    pub fn allows_segment(&self, from: IntPoint, to: IntPoint) -> bool {
        match Direction::from_points(from, to) {
            Some(direction) => self.allows(direction),
            None => true,
        }
    }
}

/// All ways to connect `from` and `to` with segments allowed by `restriction`,
/// using at most one intermediate corner. Each path starts with `from` and ends
/// with `to`. A direct connection is returned alone when it is allowed;
/// otherwise the two bends are returned, the one leaving `from` in the
/// diagonal (or horizontal) direction first.
pub fn restricted_connections(
    from: IntPoint,
    to: IntPoint,
    restriction: AngleRestriction,
) -> Vec<Vec<IntPoint>> {
    if from == to {
        return vec![vec![from]];
    }
    if restriction.allows_segment(from, to) {
        return vec![vec![from, to]];
    }
    let dx = to.x - from.x;
    let dy = to.y - from.y;
    match restriction {
        AngleRestriction::NinetyDegree => vec![
            vec![from, IntPoint::new(to.x, from.y), to],
            vec![from, IntPoint::new(from.x, to.y), to],
        ],
        AngleRestriction::FortyFiveDegree => {
            let m = dx.abs().min(dy.abs());
            let diagonal = IntVector::new(dx.signum() * m, dy.signum() * m);
            vec![vec![from, from + diagonal, to], vec![from, to - diagonal, to]]
        }
        AngleRestriction::None => vec![vec![from, to]],
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn direction_is_primitive() {
        let d = Direction::from_vector(IntVector::new(6, -4)).unwrap();
        assert_eq!((d.x(), d.y()), (3, -2));
        assert!(Direction::from_vector(IntVector::new(0, 0)).is_none());
        assert_eq!(
            Direction::from_vector(IntVector::new(0, -7)).unwrap().to_direction45(),
            Some(Direction45::Down)
        );
    }

    #[test]
    fn between_cuts_right_and_sharp_turns() {
        assert_eq!(
            Direction45::between(Direction45::Right, Direction45::Up),
            Some(Direction45::TopRight)
        );
        assert_eq!(
            Direction45::between(Direction45::Right, Direction45::TopLeft),
            Some(Direction45::Up)
        );
        assert_eq!(
            Direction45::between(Direction45::TopRight, Direction45::TopLeft),
            Some(Direction45::Up)
        );
        assert_eq!(
            Direction45::between(Direction45::Up, Direction45::Right),
            Some(Direction45::TopRight)
        );
        assert_eq!(Direction45::between(Direction45::Up, Direction45::TopRight), None);
    }

    #[test]
    fn forty_five_connections_are_octilinear() {
        let from = IntPoint::new(0, 0);
        let to = IntPoint::new(10, 4);
        let paths = restricted_connections(from, to, AngleRestriction::FortyFiveDegree);
        assert_eq!(paths.len(), 2);
        assert_eq!(paths[0][1], IntPoint::new(4, 4));
        assert_eq!(paths[1][1], IntPoint::new(6, 0));
        for path in &paths {
            for pair in path.windows(2) {
                assert!(AngleRestriction::FortyFiveDegree.allows_segment(pair[0], pair[1]));
            }
        }
    }

    #[test]
    fn allowed_connection_is_direct() {
        let paths = restricted_connections(
            IntPoint::new(0, 0),
            IntPoint::new(0, 9),
            AngleRestriction::NinetyDegree,
        );
        assert_eq!(paths, vec![vec![IntPoint::new(0, 0), IntPoint::new(0, 9)]]);
    }
}
