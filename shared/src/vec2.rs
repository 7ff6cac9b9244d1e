use std::ops::{Add, Div, Mul, Neg, Sub};

use serde::{Deserialize, Serialize};

/// Largest absolute board coordinate accepted by the store.
/// Keeps every exact predicate on rational corners inside `i128`.
pub const MAX_COORDINATE: i64 = 1 << 28;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default, Serialize, Deserialize)]
pub struct IntPoint {
    pub x: i64,
    pub y: i64,
}

impl IntPoint {
    pub const fn new(x: i64, y: i64) -> Self {
        IntPoint { x, y }
    }
    pub fn to_float(&self) -> FloatPoint {
        FloatPoint {
            x: self.x as f64,
            y: self.y as f64,
        }
    }
    pub fn to_rational(&self) -> RationalPoint {
        RationalPoint::from_int(*self)
    }
    pub fn is_valid(&self) -> bool {
        self.x.abs() <= MAX_COORDINATE && self.y.abs() <= MAX_COORDINATE
    }
    pub fn distance(&self, other: IntPoint) -> f64 {
        (*self - other).length_approx()
    }
    /// Euclidean distance after scaling the x and y deltas by the given cost factors.
    pub fn weighted_distance(&self, other: IntPoint, horizontal: f64, vertical: f64) -> f64 {
        let dx = (self.x - other.x) as f64 * horizontal;
        let dy = (self.y - other.y) as f64 * vertical;
        (dx * dx + dy * dy).sqrt()
    }
}

impl Sub for IntPoint {
    type Output = IntVector;

    fn sub(self, other: IntPoint) -> IntVector {
        IntVector {
            x: self.x - other.x,
            y: self.y - other.y,
        }
    }
}

impl Add<IntVector> for IntPoint {
    type Output = IntPoint;

    fn add(self, v: IntVector) -> IntPoint {
        IntPoint {
            x: self.x + v.x,
            y: self.y + v.y,
        }
    }
}

impl Sub<IntVector> for IntPoint {
    type Output = IntPoint;

    fn sub(self, v: IntVector) -> IntPoint {
        IntPoint {
            x: self.x - v.x,
            y: self.y - v.y,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default, Serialize, Deserialize)]
pub struct IntVector {
    pub x: i64,
    pub y: i64,
}

impl IntVector {
    pub const fn new(x: i64, y: i64) -> Self {
        IntVector { x, y }
    }
    pub fn is_zero(&self) -> bool {
        self.x == 0 && self.y == 0
    }
    /// z-component of the cross product, exact.
    pub fn cross(&self, other: IntVector) -> i128 {
        self.x as i128 * other.y as i128 - self.y as i128 * other.x as i128
    }
    pub fn dot(&self, other: IntVector) -> i128 {
        self.x as i128 * other.x as i128 + self.y as i128 * other.y as i128
    }
    pub fn to_float(&self) -> FloatPoint {
        FloatPoint {
            x: self.x as f64,
            y: self.y as f64,
        }
    }
    pub fn length_approx(&self) -> f64 {
        self.to_float().length()
    }
    /// Rotated by 90 degrees counterclockwise.
    pub fn turn_90(&self) -> IntVector {
        IntVector {
            x: -self.y,
            y: self.x,
        }
    }
}

impl Neg for IntVector {
    type Output = IntVector;

    fn neg(self) -> IntVector {
        IntVector {
            x: -self.x,
            y: -self.y,
        }
    }
}

impl Mul<i64> for IntVector {
    type Output = IntVector;

    fn mul(self, scalar: i64) -> IntVector {
        IntVector {
            x: self.x * scalar,
            y: self.y * scalar,
        }
    }
}

impl Add for IntVector {
    type Output = IntVector;

    fn add(self, other: IntVector) -> IntVector {
        IntVector {
            x: self.x + other.x,
            y: self.y + other.y,
        }
    }
}

/// Floating point companion of `IntPoint`, used only for distance and length
/// estimation. Values are rounded before they become corners.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct FloatPoint {
    pub x: f64,
    pub y: f64,
}

impl FloatPoint {
    pub const fn new(x: f64, y: f64) -> Self {
        FloatPoint { x, y }
    }
    pub fn dot(self, other: FloatPoint) -> f64 {
        self.x * other.x + self.y * other.y
    }
    pub fn cross(self, other: FloatPoint) -> f64 {
        self.x * other.y - self.y * other.x
    }

    /// Returns a vector perpendicular to self
    pub fn perp(self) -> FloatPoint {
        FloatPoint {
            x: -self.y,
            y: self.x,
        }
    }

    pub fn normalize(self) -> FloatPoint {
        let len = self.length();
        if len > f64::EPSILON {
            FloatPoint {
                x: self.x / len,
                y: self.y / len,
            }
        } else {
            self
        }
    }
    pub fn magnitude2(self) -> f64 {
        self.x * self.x + self.y * self.y
    }
    pub fn length(self) -> f64 {
        self.magnitude2().sqrt()
    }
    pub fn distance(self, other: FloatPoint) -> f64 {
        (self - other).length()
    }
    pub fn is_finite(self) -> bool {
        self.x.is_finite() && self.y.is_finite()
    }
    pub fn round(self) -> IntPoint {
        IntPoint {
            x: self.x.round() as i64,
            y: self.y.round() as i64,
        }
    }
    pub fn to_vector2(self) -> cgmath::Vector2<f64> {
        cgmath::Vector2::new(self.x, self.y)
    }
}

impl From<cgmath::Vector2<f64>> for FloatPoint {
    fn from(v: cgmath::Vector2<f64>) -> Self {
        FloatPoint { x: v.x, y: v.y }
    }
}

impl Add for FloatPoint {
    type Output = FloatPoint;

    fn add(self, other: FloatPoint) -> FloatPoint {
        FloatPoint {
            x: self.x + other.x,
            y: self.y + other.y,
        }
    }
}

impl Sub for FloatPoint {
    type Output = FloatPoint;

    fn sub(self, other: FloatPoint) -> FloatPoint {
        FloatPoint {
            x: self.x - other.x,
            y: self.y - other.y,
        }
    }
}

impl Mul<f64> for FloatPoint {
    type Output = FloatPoint;

    fn mul(self, scalar: f64) -> FloatPoint {
        FloatPoint {
            x: self.x * scalar,
            y: self.y * scalar,
        }
    }
}

impl Div<f64> for FloatPoint {
    type Output = FloatPoint;

    fn div(self, scalar: f64) -> FloatPoint {
        FloatPoint {
            x: self.x / scalar,
            y: self.y / scalar,
        }
    }
}

impl Neg for FloatPoint {
    type Output = FloatPoint;

    fn neg(self) -> FloatPoint {
        FloatPoint {
            x: -self.x,
            y: -self.y,
        }
    }
}

/// Exact point in homogeneous coordinates `(x / z, y / z)`, kept reduced with `z > 0`
/// so that structural equality is value equality.
/// Line intersections land here before they are rounded onto the integer grid.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct RationalPoint {
    x: i128,
    y: i128,
    z: i128,
}

impl RationalPoint {
    /// Returns `None` for a zero denominator.
    pub fn new(x: i128, y: i128, z: i128) -> Option<Self> {
        if z == 0 {
            return None;
        }
        let sign = if z < 0 { -1 } else { 1 };
        let g = gcd(gcd(x, y), z);
        Some(RationalPoint {
            x: sign * x / g,
            y: sign * y / g,
            z: sign * z / g,
        })
    }
    pub fn from_int(p: IntPoint) -> Self {
        RationalPoint {
            x: p.x as i128,
            y: p.y as i128,
            z: 1,
        }
    }
    pub fn x(&self) -> i128 {
        self.x
    }
    pub fn y(&self) -> i128 {
        self.y
    }
    pub fn z(&self) -> i128 {
        self.z
    }
    pub fn is_integral(&self) -> bool {
        self.x % self.z == 0 && self.y % self.z == 0
    }
    pub fn to_int(&self) -> Option<IntPoint> {
        if self.is_integral() {
            Some(IntPoint::new((self.x / self.z) as i64, (self.y / self.z) as i64))
        } else {
            None
        }
    }
    pub fn to_float(&self) -> FloatPoint {
        FloatPoint {
            x: self.x as f64 / self.z as f64,
            y: self.y as f64 / self.z as f64,
        }
    }
    /// Nearest integer point, ties away from zero.
    pub fn round(&self) -> IntPoint {
        if let Some(p) = self.to_int() {
            return p;
        }
        IntPoint::new(round_div(self.x, self.z), round_div(self.y, self.z))
    }
}

fn round_div(numerator: i128, denominator: i128) -> i64 {
    let twice = 2 * numerator;
    let q = if twice >= 0 {
        (twice + denominator) / (2 * denominator)
    } else {
        -((-twice + denominator) / (2 * denominator))
    };
    q as i64
}

fn gcd(a: i128, b: i128) -> i128 {
    let (mut a, mut b) = (a.abs(), b.abs());
    while b != 0 {
        (a, b) = (b, a % b);
    }
    a
}

impl From<IntPoint> for RationalPoint {
    fn from(p: IntPoint) -> Self {
        RationalPoint::from_int(p)
    }
}
