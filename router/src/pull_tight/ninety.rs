use shared::{
    direction::{AngleRestriction, restricted_connections},
    polyline::Polyline,
    vec2::IntPoint,
};

use super::PullTightContext;

/// Replaces two consecutive inner corners, a Z or U shaped run, by an L
/// shaped or straight connection of the corners around them.
pub(super) fn reduce_corners(ctx: &PullTightContext, polyline: &Polyline) -> Option<Polyline> {
    let mut current = polyline.clone();
    let mut changed = false;
    let mut i = 1;
    'outer: while i + 2 < current.corner_count() {
        let corners = current.int_corners();
        let from = corners[i - 1];
        let to = corners[i + 2];
        for path in restricted_connections(from, to, AngleRestriction::NinetyDegree) {
            let mut candidate: Vec<IntPoint> = corners[..i].to_vec();
            candidate.extend_from_slice(path.get(1..path.len().saturating_sub(1)).unwrap_or(&[]));
            candidate.extend_from_slice(&corners[i + 2..]);
            if let Some(next) = Polyline::from_corners(&candidate).and_then(|candidate| ctx.accept(&current, &candidate)) {
                current = next;
                changed = true;
                continue 'outer;
            }
        }
        i += 1;
    }
    changed.then_some(current)
}
