use shared::{item::ItemId, shape::TileShape, vec2::IntPoint};
use tracing::debug;

use super::{TraceParams, detour::{detour, obstacle_polygon}};
use crate::{board::Board, error::ShoveError};

fn segment_shapes(corners: &[IntPoint], half_width: i64) -> Vec<TileShape> {
    corners
        .windows(2)
        .map(|pair| TileShape::segment(pair[0], pair[1], half_width))
        .collect()
}

/// Bends the planned trace around items that cannot be shoved, one obstacle
/// at a time, smallest id first. Shovable obstacles are left in the way for
/// the shove to deal with. Fails once `max_depth` detours did not clear the
/// path or an obstacle cannot be passed.
pub(super) fn spring_over(
    board: &Board,
    corners: &[IntPoint],
    params: &TraceParams,
    max_depth: i32,
) -> Result<Vec<IntPoint>, ShoveError> {
    let restriction = board.angle_restriction();
    let mut corners = corners.to_vec();
    let mut depth = max_depth;
    loop {
        let shapes = segment_shapes(&corners, params.half_width);
        let mut fixed: Vec<ItemId> = shapes
            .iter()
            .flat_map(|shape| board.find_overlapping(shape, params.layer, &params.nets, params.clearance_class))
            .filter(|&id| board.item(id).is_some_and(|item| item.is_shove_fixed()))
            .collect();
        fixed.sort_unstable();
        let Some(&obstacle) = fixed.first() else {
            return Ok(corners);
        };
        if depth <= 0 {
            return Err(ShoveError::SpringOverFailed { obstacle });
        }
        depth -= 1;

        let item = board.get_item(obstacle)?;
        let clearance = board.clearance_value(item.clearance_class, params.clearance_class, params.layer);
        let conflicting: Vec<TileShape> = item
            .shapes_on_layer(params.layer)
            .into_iter()
            .filter(|shape| shapes.iter().any(|segment| shape.intersects_with_clearance(segment, clearance)))
            .collect();
        let polygon = obstacle_polygon(&conflicting, clearance + params.half_width + 1, restriction);
        corners = detour(&corners, &polygon, restriction).ok_or(ShoveError::SpringOverFailed { obstacle })?;
        debug!(?obstacle, corners = corners.len(), "sprang over fixed obstacle");
    }
}
