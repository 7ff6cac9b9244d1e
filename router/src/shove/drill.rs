use cgmath::Deg;
use shared::{
    item::{ItemId, TraceEnd},
    polyline::{Polyline, clean_corners},
    shape::TileShape,
    vec2::{FloatPoint, IntPoint, MAX_COORDINATE},
};
use tracing::debug;

use super::{Budget, ShoveContext, shove_obstacles_of};
use crate::{board::Board, error::ShoveError, via_opt::reroute_end};

/// Point of the shape core nearest to `p`.
fn nearest_core_point(shape: &TileShape, p: FloatPoint) -> FloatPoint {
    match shape.corners() {
        [a, b] => {
            let (a, b) = (a.to_float(), b.to_float());
            let ab = b - a;
            let t = ((p - a).dot(ab) / ab.magnitude2()).clamp(0.0, 1.0);
            a + ab * t
        }
        _ => shape.center_approx(),
    }
}

/// Pushes the via out of the way of `pusher` along the line from the pusher
/// to the via center, by the smallest distance that clears it. Attached
/// trace ends are dragged along, then the via and those traces make room
/// for themselves.
pub(super) fn shove_via(
    board: &mut Board,
    via_id: ItemId,
    pusher_id: ItemId,
    budget: Budget,
    ctx: &mut ShoveContext,
) -> Result<(), ShoveError> {
    if budget.via_depth <= 0 {
        return Err(ShoveError::RecursionExhausted { obstacle: via_id });
    }
    let via_item = board.get_item(via_id)?;
    let via = board.via(via_id)?;
    let pusher = board.get_item(pusher_id)?;
    let center = via.center;
    let mut conflicting: Vec<(usize, TileShape, i64)> = Vec::new();
    for layer in 0..board.layer_count() {
        let clearance = board.clearance_value(pusher.clearance_class, via_item.clearance_class, layer);
        let via_shapes = via_item.shapes_on_layer(layer);
        for shape in pusher.shapes_on_layer(layer) {
            if via_shapes.iter().any(|v| shape.intersects_with_clearance(v, clearance)) {
                conflicting.push((layer, shape, clearance));
            }
        }
    }
    let Some((_, first_shape, _)) = conflicting.first() else {
        return Ok(());
    };

    let away = center.to_float() - nearest_core_point(first_shape, center.to_float());
    let direction = if away.length() >= 0.5 {
        away.normalize()
    } else {
        // center sits on the pusher core
        FloatPoint::new(1.0, 0.0)
    };
    let padstack = via.padstack.clone();
    let position_at = |distance: i64| (center.to_float() + direction * distance as f64).round();
    let clear_at = |distance: i64| {
        let p = position_at(distance);
        conflicting.iter().all(|(layer, shape, clearance)| {
            padstack
                .shape_on_layer(*layer)
                .is_none_or(|pad| !shape.intersects_with_clearance(&pad.to_tile_shape(p, Deg(0.0)), *clearance))
        })
    };

    let mut distance = 1;
    while !clear_at(distance) {
        distance *= 2;
        if distance > MAX_COORDINATE {
            return Err(ShoveError::Blocked { obstacle: via_id });
        }
    }
    let (mut blocked, mut clear) = (distance / 2, distance);
    while clear - blocked > 1 {
        let mid = blocked + (clear - blocked) / 2;
        if clear_at(mid) {
            clear = mid;
        } else {
            blocked = mid;
        }
    }
    let new_center = position_at(clear);
    if !new_center.is_valid() {
        return Err(ShoveError::Blocked { obstacle: via_id });
    }
    debug!(?via_id, ?pusher_id, from = ?center, to = ?new_center, "via shoved");

    let dragged = drag_via(board, via_id, new_center, ctx)?;
    shove_obstacles_of(
        board,
        via_id,
        Budget {
            via_depth: budget.via_depth - 1,
            ..budget
        },
        ctx,
    )?;
    for trace_id in dragged {
        if board.contains(trace_id) {
            shove_obstacles_of(board, trace_id, budget.deeper(), ctx)?;
        }
    }
    Ok(())
}

/// Moves the via and reroutes the ends of the traces ending at its center.
/// Traces that collapse to a point are removed. Returns the traces that are
/// still on the board.
pub(super) fn drag_via(
    board: &mut Board,
    via_id: ItemId,
    new_center: IntPoint,
    ctx: &mut ShoveContext,
) -> Result<Vec<ItemId>, ShoveError> {
    let old_center = board.via(via_id)?.center;
    let mut contacts: Vec<(ItemId, TraceEnd)> = Vec::new();
    for (id, end) in board.via_trace_contacts(via_id)? {
        if board.trace(id)?.end_corner(end) == old_center {
            contacts.push((id, end));
        }
    }
    board.move_via(via_id, new_center)?;
    ctx.touched.insert(via_id);
    let restriction = board.angle_restriction();
    let mut dragged = Vec::new();
    for (id, end) in contacts {
        let corners = board.trace(id)?.corners_from(end);
        let mut rerouted = clean_corners(&reroute_end(&corners, new_center, restriction));
        if rerouted.len() < 2 {
            board.remove_item(id)?;
            ctx.touched.remove(&id);
            continue;
        }
        if end == TraceEnd::End {
            rerouted.reverse();
        }
        let polyline = Polyline::from_corners(&rerouted).ok_or(ShoveError::Blocked { obstacle: id })?;
        board.change_polyline(id, polyline)?;
        ctx.touched.insert(id);
        dragged.push(id);
    }
    Ok(dragged)
}
