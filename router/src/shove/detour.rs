use ordered_float::NotNan;
use shared::{
    direction::{AngleRestriction, Direction, restricted_connections},
    line::{Line, Side},
    polyline::clean_corners,
    shape::{IntOctagon, TileShape, segment_crosses_polygon_interior},
    vec2::IntPoint,
};
use tracing::trace;

fn cross(a: IntPoint, b: IntPoint, c: IntPoint) -> i128 {
    (b - a).cross(c - a)
}

fn strictly_inside(p: IntPoint, polygon: &[IntPoint]) -> bool {
    let n = polygon.len();
    n >= 3 && (0..n).all(|i| cross(polygon[i], polygon[(i + 1) % n], p) > 0)
}

fn path_length(corners: &[IntPoint]) -> f64 {
    corners.windows(2).map(|pair| pair[0].distance(pair[1])).sum()
}

/// The region a trace centerline has to stay out of to keep `distance` from
/// the shapes: their bounding octagon grown by `distance`, or its bounding
/// box when only orthogonal segments are allowed. Counterclockwise.
pub fn obstacle_polygon(shapes: &[TileShape], distance: i64, restriction: AngleRestriction) -> Vec<IntPoint> {
    let octagon = shapes
        .iter()
        .fold(IntOctagon::EMPTY, |acc, shape| acc.union(&shape.bounding_octagon()))
        .enlarge(distance);
    match restriction {
        AngleRestriction::NinetyDegree => IntOctagon::from_box(&octagon.bounding_box()).to_polygon(),
        _ => octagon.to_polygon(),
    }
}

/// Path from `from` to `to` around the convex counterclockwise `polygon`,
/// following its boundary with the polygon on the left (`counterclockwise`)
/// or on the right.
fn hug_path(from: IntPoint, to: IntPoint, polygon: &[IntPoint], counterclockwise: bool) -> Option<Vec<IntPoint>> {
    let walk: Vec<IntPoint> = if counterclockwise {
        polygon.to_vec()
    } else {
        polygon.iter().rev().copied().collect()
    };
    let sign = if counterclockwise { 1 } else { -1 };
    let keeps_polygon_aside = |a: IntPoint, b: IntPoint| walk.iter().all(|&v| cross(a, b, v) * sign >= 0);

    let start = walk
        .iter()
        .enumerate()
        .filter(|&(_, &v)| v != from && keeps_polygon_aside(from, v))
        .max_by_key(|&(_, &v)| (v - from).dot(v - from))
        .map(|(index, _)| index)?;
    let n = walk.len();
    let mut path = vec![from, walk[start]];
    let mut index = start;
    for _ in 0..=n {
        if keeps_polygon_aside(walk[index], to) {
            path.push(to);
            return Some(clean_corners(&path));
        }
        index = (index + 1) % n;
        path.push(walk[index]);
    }
    None
}

/// Replaces segments the angle policy forbids by a bend. The bend corner
/// goes on the side of the polygon when that keeps out of its interior,
/// otherwise on the far side.
fn restrict_path(
    path: &[IntPoint],
    polygon: &[IntPoint],
    restriction: AngleRestriction,
    counterclockwise: bool,
) -> Option<Vec<IntPoint>> {
    let inner = if counterclockwise { Side::OnTheLeft } else { Side::OnTheRight };
    let mut result = vec![*path.first()?];
    for pair in path.windows(2) {
        let (from, to) = (pair[0], pair[1]);
        if restriction.allows_segment(from, to) {
            result.push(to);
            continue;
        }
        let line = Line::new(from, to)?;
        let mut options = restricted_connections(from, to, restriction);
        options.sort_by_key(|option| !(option.len() == 3 && line.side_of(option[1]) == inner));
        let chosen = options.into_iter().find(|option| {
            option
                .windows(2)
                .all(|seg| !segment_crosses_polygon_interior(seg[0], seg[1], polygon))
        })?;
        result.extend_from_slice(&chosen[1..]);
    }
    Some(result)
}

/// Last lattice point of the segment `from`-`to` before it enters the
/// interior of `polygon`. `from` must not lie inside.
fn entry_cut(from: IntPoint, to: IntPoint, polygon: &[IntPoint]) -> IntPoint {
    let Some(direction) = Direction::from_points(from, to) else {
        return from;
    };
    let step = direction.vector();
    let steps = if step.x != 0 {
        (to.x - from.x) / step.x
    } else {
        (to.y - from.y) / step.y
    };
    let at = |k: i64| from + step * k;
    let (mut outside, mut inside) = (0, steps);
    while inside - outside > 1 {
        let middle = outside + (inside - outside) / 2;
        if segment_crosses_polygon_interior(from, at(middle), polygon) {
            inside = middle;
        } else {
            outside = middle;
        }
    }
    at(outside)
}

/// Reroutes the part of the path that runs through the interior of the
/// convex counterclockwise `polygon` along its boundary, on whichever side
/// gives the shorter result. The path is cut where it first enters and
/// last leaves the polygon; everything outside the cuts is kept. Returns
/// `None` if an end of the crossing part lies inside the polygon or neither
/// side works out.
pub fn detour(corners: &[IntPoint], polygon: &[IntPoint], restriction: AngleRestriction) -> Option<Vec<IntPoint>> {
    if polygon.len() < 3 || corners.len() < 2 {
        return Some(corners.to_vec());
    }
    let crossing: Vec<usize> = (0..corners.len() - 1)
        .filter(|&k| segment_crosses_polygon_interior(corners[k], corners[k + 1], polygon))
        .collect();
    let (Some(&first), Some(&last)) = (crossing.first(), crossing.last()) else {
        return Some(corners.to_vec());
    };
    if strictly_inside(corners[first], polygon) || strictly_inside(corners[last + 1], polygon) {
        trace!(from = ?corners[first], to = ?corners[last + 1], "detour end inside obstacle");
        return None;
    }
    let entry = entry_cut(corners[first], corners[first + 1], polygon);
    let exit = entry_cut(corners[last + 1], corners[last], polygon);

    let mut best: Option<(NotNan<f64>, Vec<IntPoint>)> = None;
    for counterclockwise in [true, false] {
        let Some(hug) = hug_path(entry, exit, polygon, counterclockwise) else {
            continue;
        };
        let Some(hug) = restrict_path(&hug, polygon, restriction, counterclockwise) else {
            continue;
        };
        let mut rerouted = corners[..=first].to_vec();
        rerouted.extend(hug);
        rerouted.extend_from_slice(&corners[last + 1..]);
        let rerouted = clean_corners(&rerouted);
        if rerouted
            .windows(2)
            .any(|pair| segment_crosses_polygon_interior(pair[0], pair[1], polygon))
        {
            continue;
        }
        let Ok(length) = NotNan::new(path_length(&rerouted)) else {
            continue;
        };
        if best.as_ref().is_none_or(|(best_length, _)| length < *best_length) {
            best = Some((length, rerouted));
        }
    }
    best.map(|(_, rerouted)| rerouted)
}
