use shared::{direction::Direction, polyline::Polyline, vec2::IntPoint};
use tracing::trace;

use super::{PullTightContext, doubling_bisection};

/// Drops inner corners one at a time, connecting their neighbours directly.
pub(super) fn reduce_corners(ctx: &PullTightContext, polyline: &Polyline) -> Option<Polyline> {
    let mut current = polyline.clone();
    let mut changed = false;
    let mut i = 1;
    while i + 1 < current.corner_count() {
        let mut corners = current.int_corners();
        corners.remove(i);
        match Polyline::from_corners(&corners).and_then(|candidate| ctx.accept(&current, &candidate)) {
            Some(next) => {
                current = next;
                changed = true;
            }
            None => i += 1,
        }
    }
    changed.then_some(current)
}

/// Cuts each inner corner by a segment at equal distance from the corner on
/// both legs, as deep as clearance allows. Corners that are almost straight
/// are left alone since cutting them gains nothing but rounding noise.
pub(super) fn smoothen_corners(ctx: &PullTightContext, polyline: &Polyline) -> Option<Polyline> {
    let mut current = polyline.clone();
    let mut changed = false;
    let mut i = 1;
    while i + 1 < current.corner_count() {
        if ctx.stop.is_stop_requested() {
            break;
        }
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
    let incoming = Direction::from_points(prev, corner)?;
    let outgoing = Direction::from_points(corner, next)?;
    if incoming.cos_angle(outgoing) > ctx.settings.smoothing_max_cos {
        return None;
    }
    let back = (prev - corner).to_float().normalize();
    let ahead = (next - corner).to_float().normalize();
    let max_cut = corner.distance(prev).min(corner.distance(next)).floor() as i64;
    let result = doubling_bisection(max_cut, ctx.settings.pull_tight_accuracy, |cut| {
        let a = (corner.to_float() + back * cut as f64).round();
        let b = (corner.to_float() + ahead * cut as f64).round();
        let mut candidate: Vec<IntPoint> = corners[..index].to_vec();
        candidate.push(a);
        candidate.push(b);
        candidate.extend_from_slice(&corners[index + 1..]);
        Polyline::from_corners(&candidate).and_then(|candidate| ctx.accept(polyline, &candidate))
    });
    if result.is_some() {
        trace!(index, ?corner, "corner cut");
    }
    result
}
