use shared::{
    item::{ItemId, TraceEnd},
    polyline::Polyline,
    vec2::IntPoint,
};
use tracing::debug;

use super::{PullTightContext, doubling_bisection};
use crate::{board::Board, error::Result, settings::RouterSettings, stop::Stoppable};

/// Where two traces meet at an acute angle, moves their common end point
/// along the first segment of `id` so that the detour back and forth
/// disappears. Only junctions of exactly two traces are touched; ends on vias,
/// pins and planes stay put.
///
/// If the trace bends at its next corner, the junction jumps straight to that
/// corner. At a sharp end without room for that, the junction slides along
/// the segment as far as the other trace's new segment stays legal.
pub fn smoothen_end_corners(
    board: &mut Board,
    id: ItemId,
    settings: &RouterSettings,
    stop: &dyn Stoppable,
) -> Result<bool> {
    let mut changed = false;
    for end in [TraceEnd::Start, TraceEnd::End] {
        if stop.is_stop_requested() || !board.contains(id) {
            break;
        }
        if smoothen_end(board, id, end, settings, stop)? {
            changed = true;
        }
    }
    Ok(changed)
}

fn smoothen_end(
    board: &mut Board,
    id: ItemId,
    end: TraceEnd,
    settings: &RouterSettings,
    stop: &dyn Stoppable,
) -> Result<bool> {
    let item = board.get_item(id)?;
    let trace = board.trace(id)?;
    let corners = trace.corners_from(end);
    let junction = corners[0];
    let contacts = board.end_contacts(id, end)?;
    let [other_id] = contacts[..] else {
        return Ok(false);
    };
    let other_item = board.get_item(other_id)?;
    let Some(other) = other_item.as_trace() else {
        return Ok(false);
    };
    if item.is_user_fixed() || other_item.is_user_fixed() || other.layer != trace.layer {
        return Ok(false);
    }
    let other_end = if other.first_corner() == junction {
        TraceEnd::Start
    } else {
        TraceEnd::End
    };
    if board.end_contacts(other_id, other_end)? != [id] {
        return Ok(false);
    }
    let other_corners = other.corners_from(other_end);
    let (a, b) = (corners[1], other_corners[1]);
    if (a - junction).dot(b - junction) <= 0 {
        return Ok(false);
    }

    let other_ctx = PullTightContext::for_trace(board, other_id, settings, stop)?;
    let restriction = other_ctx.restriction;
    let reachable = |point: IntPoint| {
        point != b && restriction.allows_segment(point, b) && other_ctx.segment_is_legal(point, b)
    };
    let bend = corners.len() >= 3 && reachable(a);
    let new_junction = if bend {
        a
    } else {
        let length = junction.distance(a);
        let max_step = length.floor() as i64 - 1;
        let slide = (a - junction).to_float() / length;
        doubling_bisection(max_step, settings.pull_tight_accuracy, |step| {
            let point = (junction.to_float() + slide * step as f64).round();
            (point != junction && restriction.allows_segment(point, a) && reachable(point)).then_some(point)
        })
        .unwrap_or(junction)
    };
    if new_junction == junction {
        return Ok(false);
    }

    let own_corners = replace_first(&corners, new_junction);
    let other_new = replace_first(&other_corners, new_junction);
    let old_length = trace.length() + other.length();
    let (Some(own), Some(other_polyline)) = (oriented(own_corners, end), oriented(other_new, other_end)) else {
        return Ok(false);
    };
    if own.length_approx() + other_polyline.length_approx() >= old_length {
        return Ok(false);
    }
    debug!(?id, ?other_id, from = ?junction, to = ?new_junction, bend, "acute trace junction smoothed");
    board.change_polyline(id, own)?;
    board.change_polyline(other_id, other_polyline)?;
    Ok(true)
}

fn replace_first(corners: &[IntPoint], first: IntPoint) -> Vec<IntPoint> {
    let mut result = Vec::with_capacity(corners.len());
    result.push(first);
    result.extend(corners[1..].iter().copied().filter(|&c| c != first));
    result
}

fn oriented(mut corners: Vec<IntPoint>, end: TraceEnd) -> Option<Polyline> {
    if end == TraceEnd::End {
        corners.reverse();
    }
    Polyline::from_corners(&corners)
}
