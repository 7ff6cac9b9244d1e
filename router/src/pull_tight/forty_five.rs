use shared::{
    direction::{AngleRestriction, Direction45, restricted_connections},
    polyline::Polyline,
    vec2::IntPoint,
};
use tracing::trace;

use super::{PullTightContext, doubling_bisection};

/// Replaces one or two inner corners by an octilinear connection of their
/// outer neighbours: a straight segment where allowed, otherwise one of the
/// two single-bend connections.
pub(super) fn reduce_corners(ctx: &PullTightContext, polyline: &Polyline) -> Option<Polyline> {
    let mut current = polyline.clone();
    let mut changed = false;
    let mut i = 1;
    'outer: while i + 1 < current.corner_count() {
        let corners = current.int_corners();
        for removed in [2, 1] {
            if i + removed >= corners.len() {
                continue;
            }
            let from = corners[i - 1];
            let to = corners[i + removed];
            for path in restricted_connections(from, to, AngleRestriction::FortyFiveDegree) {
                let mut candidate: Vec<IntPoint> = corners[..i].to_vec();
                candidate.extend_from_slice(path.get(1..path.len().saturating_sub(1)).unwrap_or(&[]));
                candidate.extend_from_slice(&corners[i + removed..]);
                if let Some(next) =
                    Polyline::from_corners(&candidate).and_then(|candidate| ctx.accept(&current, &candidate))
                {
                    current = next;
                    changed = true;
                    continue 'outer;
                }
            }
        }
        i += 1;
    }
    changed.then_some(current)
}

/// Cuts right and sharp angles by a segment in the direction halfway between
/// the two legs, so the trace keeps only 45 degree turns where clearance
/// permits. All cut corners lie on the integer grid.
pub(super) fn smoothen_corners(ctx: &PullTightContext, polyline: &Polyline) -> Option<Polyline> {
    let mut current = polyline.clone();
    let mut changed = false;
    let mut i = 1;
    while i + 1 < current.corner_count() {
        if let Some(next) = cut_corner(ctx, &current, i) {
            current = next;
            changed = true;
        }
        i += 1;
    }
    changed.then_some(current)
}

fn cut_corner(ctx: &PullTightContext, polyline: &Polyline, index: usize) -> Option<Polyline> {
    let corners = polyline.int_corners();
    let (prev, corner, next) = (corners[index - 1], corners[index], corners[index + 1]);
    let incoming = Direction45::from_points(prev, corner)?;
    let outgoing = Direction45::from_points(corner, next)?;
    let cut = Direction45::between(incoming, outgoing)?;

    // incoming * s + outgoing * t is a multiple of the cut direction
    let d1 = incoming.to_int_vector();
    let d2 = outgoing.to_int_vector();
    let w = cut.to_int_vector();
    let det = d1.cross(d2);
    if det == 0 {
        return None;
    }
    let s = (w.cross(d2) * det.signum()) as i64;
    let t = (d1.cross(w) * det.signum()) as i64;
    if s <= 0 || t <= 0 {
        return None;
    }
    let steps = |from: IntPoint, to: IntPoint| (to.x - from.x).abs().max((to.y - from.y).abs());
    let max_scale = (steps(prev, corner) / s).min(steps(corner, next) / t);
    let min_scale = ctx.settings.pull_tight_accuracy / 2;
    let result = doubling_bisection(max_scale, min_scale, |scale| {
        let a = corner - d1 * (s * scale);
        let b = corner + d2 * (t * scale);
        let mut candidate: Vec<IntPoint> = corners[..index].to_vec();
        candidate.push(a);
        candidate.push(b);
        candidate.extend_from_slice(&corners[index + 1..]);
        Polyline::from_corners(&candidate).and_then(|candidate| ctx.accept(polyline, &candidate))
    });
    if result.is_some() {
        trace!(index, ?corner, ?cut, "45 degree corner cut");
    }
    result
}
