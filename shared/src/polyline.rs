use serde::{Deserialize, Serialize};

use crate::{
    direction::{AngleRestriction, Direction},
    line::{Line, Side},
    shape::TileShape,
    vec2::{FloatPoint, IntPoint, RationalPoint},
};

/// A trace centerline stored as a sequence of lines. Corner `i` is the
/// intersection of lines `i` and `i + 1`, so `n` lines carry `n - 1` corners
/// and `n - 2` segments. The first and last line only cut off the ends.
/// Consecutive lines are never parallel.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "Vec<Line>", into = "Vec<Line>")]
pub struct Polyline {
    lines: Vec<Line>,
    corners: Vec<RationalPoint>,
}

impl TryFrom<Vec<Line>> for Polyline {
    type Error = String;

    fn try_from(lines: Vec<Line>) -> Result<Self, Self::Error> {
        Polyline::from_lines(lines).ok_or_else(|| "degenerate polyline".to_string())
    }
}

impl From<Polyline> for Vec<Line> {
    fn from(polyline: Polyline) -> Self {
        polyline.lines
    }
}

impl Polyline {
    /// Builds the polyline through the given corners. Repeated corners and
    /// corners in the middle of a straight run are dropped. Returns `None` if
    /// fewer than two distinct corners remain.
    pub fn from_corners(corners: &[IntPoint]) -> Option<Polyline> {
        let cleaned = clean_corners(corners);
        if cleaned.len() < 2 {
            return None;
        }
        let mut lines = Vec::with_capacity(cleaned.len() + 1);
        let first = Line::new(cleaned[0], cleaned[1])?;
        lines.push(first.perpendicular_through(cleaned[0]));
        for pair in cleaned.windows(2) {
            lines.push(Line::new(pair[0], pair[1])?);
        }
        let n = cleaned.len();
        let last = Line::new(cleaned[n - 2], cleaned[n - 1])?;
        lines.push(last.perpendicular_through(cleaned[n - 1]));
        Polyline::from_lines(lines)
    }

    /// Returns `None` for fewer than three lines, for parallel neighbours and
    /// for segments that run against the direction of their line.
    pub fn from_lines(lines: Vec<Line>) -> Option<Polyline> {
        if lines.len() < 3 {
            return None;
        }
        let mut corners = Vec::with_capacity(lines.len() - 1);
        for pair in lines.windows(2) {
            corners.push(pair[0].intersection(&pair[1])?);
        }
        let polyline = Polyline { lines, corners };
        if polyline.has_reversed_segment() {
            return None;
        }
        Some(polyline)
    }

    fn has_reversed_segment(&self) -> bool {
        (0..self.segment_count()).any(|seg| {
            let a = self.corners[seg].to_float();
            let b = self.corners[seg + 1].to_float();
            let v = self.lines[seg + 1].vector().to_float();
            (b - a).dot(v) < 0.0
        })
    }

    pub fn lines(&self) -> &[Line] {
        &self.lines
    }
    pub fn line_count(&self) -> usize {
        self.lines.len()
    }
    pub fn corner_count(&self) -> usize {
        self.corners.len()
    }
    pub fn segment_count(&self) -> usize {
        self.lines.len() - 2
    }
    pub fn corner(&self, index: usize) -> RationalPoint {
        self.corners[index]
    }
    pub fn corner_approx(&self, index: usize) -> FloatPoint {
        self.corners[index].to_float()
    }
    pub fn first_corner(&self) -> RationalPoint {
        self.corners[0]
    }
    pub fn last_corner(&self) -> RationalPoint {
        self.corners[self.corners.len() - 1]
    }
    pub fn is_integral(&self) -> bool {
        self.corners.iter().all(|c| c.is_integral())
    }
    /// Corners rounded onto the grid; exact for integral polylines.
    pub fn int_corners(&self) -> Vec<IntPoint> {
        self.corners.iter().map(|c| c.round()).collect()
    }
    pub fn segment_direction(&self, segment: usize) -> Direction {
        self.lines[segment + 1].direction()
    }
    pub fn length_approx(&self) -> f64 {
        self.corners
            .windows(2)
            .map(|pair| pair[0].to_float().distance(pair[1].to_float()))
            .sum()
    }
    pub fn reverse(&self) -> Polyline {
        let lines: Vec<Line> = self.lines.iter().rev().map(|l| l.opposite()).collect();
        let corners = self.corners.iter().rev().copied().collect();
        Polyline { lines, corners }
    }
    pub fn allows_restriction(&self, restriction: AngleRestriction) -> bool {
        (0..self.segment_count()).all(|seg| restriction.allows(self.segment_direction(seg)))
    }

    /// Shape of one segment of the centerline grown by `half_width`.
    pub fn offset_shape(&self, half_width: i64, segment: usize) -> TileShape {
        TileShape::segment(
            self.corners[segment].round(),
            self.corners[segment + 1].round(),
            half_width,
        )
    }

    /// Drops inner lines whose segment has collapsed to a point.
    pub fn skip_segments_of_length_0(&self) -> Polyline {
        let n = self.lines.len();
        let mut keep = vec![true; n];
        for line in 1..n - 1 {
            if self.corners[line - 1] == self.corners[line] {
                keep[line] = false;
            }
        }
        if keep.iter().all(|&k| k) {
            return self.clone();
        }
        let lines: Vec<Line> = self
            .lines
            .iter()
            .zip(keep)
            .filter_map(|(line, k)| k.then_some(*line))
            .collect();
        Polyline::from_lines(lines).unwrap_or_else(|| self.clone())
    }

    /// Moves every corner onto the integer grid. Ends are never moved: a
    /// polyline with a non-integral end corner yields `None`. Under the 45
    /// degree policy two diagonals can meet half way between grid points;
    /// such a corner is cut by a short orthogonal segment on its inner side
    /// instead of being rounded.
    pub fn to_integral(&self, restriction: AngleRestriction) -> Option<Polyline> {
        if self.is_integral() {
            return Some(self.clone());
        }
        let first = self.first_corner().to_int()?;
        let last = self.last_corner().to_int()?;
        let n = self.corners.len();
        let mut result = Vec::with_capacity(n + 2);
        result.push(first);
        for i in 1..n - 1 {
            let corner = self.corners[i];
            if let Some(p) = corner.to_int() {
                result.push(p);
                continue;
            }
            let diagonal_pair = self.lines[i].direction().is_diagonal()
                && self.lines[i + 1].direction().is_diagonal();
            if restriction == AngleRestriction::FortyFiveDegree && diagonal_pair {
                let (a, b) = self.cut_half_integer_corner(i)?;
                result.push(a);
                result.push(b);
            } else {
                result.push(corner.round());
            }
        }
        result.push(last);
        Polyline::from_corners(&result)
    }

    fn cut_half_integer_corner(&self, i: usize) -> Option<(IntPoint, IntPoint)> {
        let corner = self.corners[i].to_float();
        let inside = (self.corners[i - 1].to_float() - corner) + (self.corners[i + 1].to_float() - corner);
        let cut = if inside.y.abs() >= inside.x.abs() {
            let y = if inside.y > 0.0 { corner.y.ceil() } else { corner.y.floor() } as i64;
            Line::new(IntPoint::new(0, y), IntPoint::new(1, y))?
        } else {
            let x = if inside.x > 0.0 { corner.x.ceil() } else { corner.x.floor() } as i64;
            Line::new(IntPoint::new(x, 0), IntPoint::new(x, 1))?
        };
        let a = self.lines[i].intersection(&cut)?.to_int()?;
        let b = self.lines[i + 1].intersection(&cut)?.to_int()?;
        Some((a, b))
    }

    /// Same polyline with line `index` replaced. `None` if the result is
    /// degenerate.
    pub fn with_line(&self, index: usize, line: Line) -> Option<Polyline> {
        let mut lines = self.lines.clone();
        lines[index] = line;
        Polyline::from_lines(lines)
    }
    pub fn without_line(&self, index: usize) -> Option<Polyline> {
        let mut lines = self.lines.clone();
        lines.remove(index);
        Polyline::from_lines(lines)
    }

    /// Side of the corner `index` relative to the line through its two
    /// neighbours, `Collinear` at the ends.
    pub fn corner_side(&self, index: usize) -> Side {
        if index == 0 || index + 1 >= self.corners.len() {
            return Side::Collinear;
        }
        let prev = self.corners[index - 1].round();
        let next = self.corners[index + 1].round();
        match Line::new(prev, next) {
            Some(line) => line.side_of_rational(self.corners[index]),
            None => Side::Collinear,
        }
    }
}

/// Removes repeated corners and corners lying on the straight line between
/// their neighbours.
pub fn clean_corners(corners: &[IntPoint]) -> Vec<IntPoint> {
    let mut result: Vec<IntPoint> = Vec::with_capacity(corners.len());
    for &c in corners {
        if result.last() == Some(&c) {
            continue;
        }
        while result.len() >= 2 {
            let a = result[result.len() - 2];
            let b = result[result.len() - 1];
            if (b - a).cross(c - b) == 0 {
                result.pop();
            } else {
                break;
            }
        }
        if result.last() != Some(&c) {
            result.push(c);
        }
    }
    result
}
