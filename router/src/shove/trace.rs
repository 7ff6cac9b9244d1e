use shared::{item::ItemId, polyline::Polyline, shape::TileShape};
use tracing::debug;

use super::{Budget, ShoveContext, detour::{detour, obstacle_polygon}, shove_obstacles_of};
use crate::{board::Board, error::ShoveError};

/// Reroutes the trace around the shapes of `pusher` that it comes too close
/// to, then makes room for the new route with one level less of budget.
/// The trace ends never move.
pub(super) fn shove_trace(
    board: &mut Board,
    trace_id: ItemId,
    pusher_id: ItemId,
    budget: Budget,
    ctx: &mut ShoveContext,
) -> Result<(), ShoveError> {
    let blocked = ShoveError::Blocked { obstacle: trace_id };
    let item = board.get_item(trace_id)?;
    let trace = board.trace(trace_id)?;
    let pusher = board.get_item(pusher_id)?;
    let layer = trace.layer;
    let clearance = board.clearance_value(pusher.clearance_class, item.clearance_class, layer);
    let segment_shapes = trace.segment_shapes();
    let conflicting: Vec<TileShape> = pusher
        .shapes_on_layer(layer)
        .into_iter()
        .filter(|shape| segment_shapes.iter().any(|segment| shape.intersects_with_clearance(segment, clearance)))
        .collect();
    if conflicting.is_empty() {
        return Ok(());
    }
    let restriction = board.angle_restriction();
    let polygon = obstacle_polygon(&conflicting, clearance + trace.half_width + 1, restriction);
    let corners = trace.corners();
    let Some(rerouted) = detour(&corners, &polygon, restriction) else {
        debug!(?trace_id, ?pusher_id, "no detour around pusher");
        return Err(blocked);
    };

    // inner corners carrying other items cannot be dropped
    for corner in &corners[1..corners.len() - 1] {
        if rerouted.contains(corner) {
            continue;
        }
        let attached = board
            .trace_ends_at(*corner, layer, &item.nets)
            .iter()
            .any(|&(other, _)| other != trace_id)
            || !board.pads_at(*corner, layer, &item.nets).is_empty();
        if attached {
            return Err(blocked);
        }
    }

    let polyline = Polyline::from_corners(&rerouted).ok_or(blocked)?;
    debug!(?trace_id, ?pusher_id, corners = rerouted.len(), "trace shoved");
    board.change_polyline(trace_id, polyline)?;
    ctx.touched.insert(trace_id);
    shove_obstacles_of(board, trace_id, budget.deeper(), ctx)
}
