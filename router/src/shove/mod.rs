//! Forced insertion: placing a trace segment, via or pin where other copper
//! is in the way by pushing the movable items aside.
//!
//! The new item is put on the board first and protected as shove-fixed.
//! Its obstacles are then resolved one at a time in id order: traces are
//! rerouted around the pusher, vias are pushed out along the line from the
//! pusher, and every moved item in turn resolves its own obstacles with a
//! smaller budget. Items that cannot move end the attempt. Planned traces
//! first spring over unmovable items.
//!
//! Every entry point works on a clone of the board. `insert_*` commits the
//! clone on success; `check_*` runs the identical code and throws the clone
//! away, so a positive check guarantees the insert succeeds on the same board.

mod detour;
mod drill;
mod spring_over;
mod trace;

use std::{collections::BTreeSet, sync::Arc};

use shared::{
    clearance::ClearanceClass,
    direction::{AngleRestriction, Direction, restricted_connections},
    item::{FixedState, ItemId, ItemKind},
    net::NetNoList,
    pad::Padstack,
    polyline::Polyline,
    shape::TileShape,
    vec2::IntPoint,
};
use tracing::{debug, warn};

use crate::{
    board::Board, error::ShoveError, pull_tight::doubling_bisection, settings::RouterSettings, stop::Stoppable,
};

pub use detour::{detour, obstacle_polygon};

/// Layer, width and electrical identity of a trace to insert.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TraceParams {
    pub layer: usize,
    pub half_width: i64,
    pub nets: NetNoList,
    pub clearance_class: ClearanceClass,
}

/// A via or pin to insert.
#[derive(Debug, Clone, PartialEq)]
pub struct PadParams {
    pub center: IntPoint,
    pub padstack: Arc<Padstack>,
    pub nets: NetNoList,
    pub clearance_class: ClearanceClass,
    /// Only used for pins.
    pub rotation_degrees: f64,
}

/// Result of checking a trace segment.
#[derive(Debug, Clone, PartialEq)]
pub struct ShoveCheck {
    /// Length of the longest prefix of the segment that can be inserted.
    pub possible_length: f64,
    /// The item that stopped the full segment, if an item did.
    pub obstacle: Option<ItemId>,
    /// The whole segment can be inserted.
    pub fits: bool,
}

/// Remaining recursion budget of one shove chain.
#[derive(Debug, Clone, Copy)]
struct Budget {
    depth: i32,
    via_depth: i32,
}

impl Budget {
    fn from_settings(settings: &RouterSettings) -> Self {
        Budget {
            depth: settings.max_shove_depth,
            via_depth: settings.max_via_shove_depth,
        }
    }
    fn deeper(self) -> Self {
        Budget {
            depth: self.depth - 1,
            ..self
        }
    }
}

struct ShoveContext<'a> {
    settings: &'a RouterSettings,
    stop: &'a dyn Stoppable,
    /// Items created or moved so far; all of them are verified at the end.
    touched: BTreeSet<ItemId>,
}

impl<'a> ShoveContext<'a> {
    fn new(settings: &'a RouterSettings, stop: &'a dyn Stoppable) -> Self {
        ShoveContext {
            settings,
            stop,
            touched: BTreeSet::new(),
        }
    }
}

/// Makes room for item `id`, which stays shove-fixed while its obstacles
/// are being moved.
fn shove_obstacles_of(board: &mut Board, id: ItemId, budget: Budget, ctx: &mut ShoveContext) -> Result<(), ShoveError> {
    if ctx.stop.is_stop_requested() {
        return Err(ShoveError::Stopped);
    }
    let previous = board.get_item(id)?.fixed_state;
    board.set_fixed_state(id, previous.max(FixedState::ShoveFixed))?;
    let result = resolve_obstacles(board, id, budget, ctx);
    if board.contains(id) {
        board.set_fixed_state(id, previous)?;
    }
    result
}

fn resolve_obstacles(board: &mut Board, id: ItemId, budget: Budget, ctx: &mut ShoveContext) -> Result<(), ShoveError> {
    let mut resolved = Vec::new();
    while board.contains(id) {
        let Some(&obstacle) = board.item_obstacles(id)?.first() else {
            return Ok(());
        };
        if resolved.contains(&obstacle) {
            debug!(?id, ?obstacle, "obstacle came back after being shoved");
            return Err(ShoveError::Blocked { obstacle });
        }
        let item = board.get_item(obstacle)?;
        if item.is_shove_fixed() {
            return Err(ShoveError::Blocked { obstacle });
        }
        match item.kind {
            ItemKind::Via(_) => drill::shove_via(board, obstacle, id, budget, ctx)?,
            ItemKind::Trace(_) => {
                if budget.depth <= 0 {
                    warn!(?id, ?obstacle, "shove depth used up, probably endless loop");
                    return Err(ShoveError::RecursionExhausted { obstacle });
                }
                trace::shove_trace(board, obstacle, id, budget, ctx)?;
            }
            _ => return Err(ShoveError::Blocked { obstacle }),
        }
        resolved.push(obstacle);
    }
    Ok(())
}

/// Fails with the first remaining obstacle of any item the shove created or
/// moved.
fn verify_touched(board: &Board, ctx: &ShoveContext) -> Result<(), ShoveError> {
    for &id in &ctx.touched {
        if !board.contains(id) {
            continue;
        }
        if let Some(&obstacle) = board.item_obstacles(id)?.first() {
            debug!(?id, ?obstacle, "shoved item left in conflict");
            return Err(ShoveError::Blocked { obstacle });
        }
    }
    Ok(())
}

/// Runs `op` on a copy of the board and commits the copy only on success.
/// On failure the board is unchanged apart from the failing obstacle slot.
fn run_atomically<T>(
    board: &mut Board,
    op: impl FnOnce(&mut Board) -> Result<T, ShoveError>,
) -> Result<T, ShoveError> {
    let mut scratch = board.clone();
    match op(&mut scratch) {
        Ok(value) => {
            scratch.set_shove_failing_obstacle(None);
            *board = scratch;
            Ok(value)
        }
        Err(err) => {
            debug!(%err, "forced insertion failed");
            board.set_shove_failing_obstacle(err.obstacle());
            Err(err)
        }
    }
}

fn check_with<T>(board: &Board, op: impl FnOnce(&mut Board) -> Result<T, ShoveError>) -> Result<T, ShoveError> {
    let mut scratch = board.clone();
    op(&mut scratch)
}

fn forced_trace(
    board: &mut Board,
    corners: &[IntPoint],
    params: &TraceParams,
    ctx: &mut ShoveContext,
) -> Result<ItemId, ShoveError> {
    let corners = spring_over::spring_over(board, corners, params, ctx.settings.max_spring_over_depth)?;
    let id = board.insert_trace(
        &corners,
        params.layer,
        params.half_width,
        params.nets.clone(),
        params.clearance_class,
        FixedState::Unfixed,
    )?;
    ctx.touched.insert(id);
    shove_obstacles_of(board, id, Budget::from_settings(ctx.settings), ctx)?;
    verify_touched(board, ctx)?;
    board.combine_trace(id)?;
    Ok(id)
}

fn segment_corners(board: &Board, from: IntPoint, to: IntPoint) -> Vec<IntPoint> {
    restricted_connections(from, to, board.angle_restriction())
        .into_iter()
        .next()
        .unwrap_or_else(|| vec![from, to])
}

fn forced_segment(
    board: &mut Board,
    from: IntPoint,
    to: IntPoint,
    params: &TraceParams,
    ctx: &mut ShoveContext,
) -> Result<ItemId, ShoveError> {
    let corners = segment_corners(board, from, to);
    forced_trace(board, &corners, params, ctx)
}

/// A trace along `corners` that is valid and already clear of everything.
/// Its forced insertion has nothing to shove and cannot fail.
fn fits_as_is(board: &Board, corners: &[IntPoint], params: &TraceParams, stop: &dyn Stoppable) -> bool {
    !stop.is_stop_requested()
        && params.layer < board.layer_count()
        && corners.iter().all(|corner| corner.is_valid())
        && Polyline::from_corners(corners).is_some()
        && corners.windows(2).all(|pair| {
            let shape = TileShape::segment(pair[0], pair[1], params.half_width);
            board.check_shape(&shape, params.layer, &params.nets, params.clearance_class)
        })
}

/// Inserts the segment from `from` to `to`, bent into allowed directions if
/// needed, shoving whatever is in the way. The new trace is merged with a
/// trace it continues; the id of the resulting trace is returned.
pub fn insert_forced_trace_segment(
    board: &mut Board,
    from: IntPoint,
    to: IntPoint,
    params: &TraceParams,
    settings: &RouterSettings,
    stop: &dyn Stoppable,
) -> Result<ItemId, ShoveError> {
    let mut ctx = ShoveContext::new(settings, stop);
    run_atomically(board, |board| forced_segment(board, from, to, params, &mut ctx))
}

/// How much of the segment from `from` to `to` could be inserted with
/// [`insert_forced_trace_segment`]. Leaves the board untouched.
pub fn check_trace_segment(
    board: &Board,
    from: IntPoint,
    to: IntPoint,
    params: &TraceParams,
    settings: &RouterSettings,
    stop: &dyn Stoppable,
) -> ShoveCheck {
    // only prefixes that actually shove something run on a copy of the board
    let attempt = |target: IntPoint| {
        if fits_as_is(board, &segment_corners(board, from, target), params, stop) {
            return Ok(());
        }
        let mut ctx = ShoveContext::new(settings, stop);
        check_with(board, |board| forced_segment(board, from, target, params, &mut ctx)).map(|_| ())
    };
    let length = from.distance(to);
    let obstacle = match attempt(to) {
        Ok(_) => {
            return ShoveCheck {
                possible_length: length,
                obstacle: None,
                fits: true,
            };
        }
        Err(err) => err.obstacle(),
    };

    // along the primitive direction the prefix ends stay on the segment
    let restriction = board.angle_restriction();
    let primitive = Direction::from_points(from, to)
        .filter(|&direction| restriction != AngleRestriction::None && restriction.allows(direction))
        .map(|direction| direction.vector());
    let point_at = |step: i64| match primitive {
        Some(v) => from + v * (step as f64 / v.length_approx()).floor() as i64,
        None => (from.to_float() + (to - from).to_float() * (step as f64 / length)).round(),
    };
    let possible = doubling_bisection(length.floor() as i64, settings.pull_tight_accuracy, |step| {
        let point = point_at(step);
        (point != from && attempt(point).is_ok()).then_some(point)
    });
    ShoveCheck {
        possible_length: possible.map_or(0.0, |point| from.distance(point)),
        obstacle,
        fits: false,
    }
}

fn forced_via(board: &mut Board, pad: &PadParams, ctx: &mut ShoveContext) -> Result<ItemId, ShoveError> {
    let id = board.insert_via(
        pad.center,
        pad.padstack.clone(),
        pad.nets.clone(),
        pad.clearance_class,
        FixedState::Unfixed,
    )?;
    ctx.touched.insert(id);
    shove_obstacles_of(board, id, Budget::from_settings(ctx.settings), ctx)?;
    verify_touched(board, ctx)?;
    Ok(id)
}

/// Inserts a via, pushing traces and vias out of its pads.
pub fn insert_forced_via(
    board: &mut Board,
    pad: &PadParams,
    settings: &RouterSettings,
    stop: &dyn Stoppable,
) -> Result<ItemId, ShoveError> {
    let mut ctx = ShoveContext::new(settings, stop);
    run_atomically(board, |board| forced_via(board, pad, &mut ctx))
}

pub fn check_forced_via(
    board: &Board,
    pad: &PadParams,
    settings: &RouterSettings,
    stop: &dyn Stoppable,
) -> Result<(), ShoveError> {
    let mut ctx = ShoveContext::new(settings, stop);
    check_with(board, |board| forced_via(board, pad, &mut ctx)).map(|_| ())
}

fn forced_pin(board: &mut Board, pad: &PadParams, ctx: &mut ShoveContext) -> Result<ItemId, ShoveError> {
    let id = board.insert_pin(
        pad.center,
        pad.padstack.clone(),
        pad.rotation_degrees,
        pad.nets.clone(),
        pad.clearance_class,
    )?;
    ctx.touched.insert(id);
    shove_obstacles_of(board, id, Budget::from_settings(ctx.settings), ctx)?;
    verify_touched(board, ctx)?;
    Ok(id)
}

/// Inserts a pin, pushing traces and vias out of its pads. Pins themselves
/// never move afterwards.
pub fn insert_forced_pin(
    board: &mut Board,
    pad: &PadParams,
    settings: &RouterSettings,
    stop: &dyn Stoppable,
) -> Result<ItemId, ShoveError> {
    let mut ctx = ShoveContext::new(settings, stop);
    run_atomically(board, |board| forced_pin(board, pad, &mut ctx))
}

pub fn check_forced_pin(
    board: &Board,
    pad: &PadParams,
    settings: &RouterSettings,
    stop: &dyn Stoppable,
) -> Result<(), ShoveError> {
    let mut ctx = ShoveContext::new(settings, stop);
    check_with(board, |board| forced_pin(board, pad, &mut ctx)).map(|_| ())
}

fn moved_via(board: &mut Board, via_id: ItemId, center: IntPoint, ctx: &mut ShoveContext) -> Result<(), ShoveError> {
    let budget = Budget::from_settings(ctx.settings);
    let dragged = drill::drag_via(board, via_id, center, ctx)?;
    shove_obstacles_of(board, via_id, budget, ctx)?;
    for trace_id in dragged {
        if board.contains(trace_id) {
            shove_obstacles_of(board, trace_id, budget, ctx)?;
        }
    }
    verify_touched(board, ctx)
}

/// Moves a via to `center`, dragging the ends of its traces along and
/// shoving what the via and those traces run into.
pub fn move_via(
    board: &mut Board,
    via_id: ItemId,
    center: IntPoint,
    settings: &RouterSettings,
    stop: &dyn Stoppable,
) -> Result<(), ShoveError> {
    let mut ctx = ShoveContext::new(settings, stop);
    run_atomically(board, |board| moved_via(board, via_id, center, &mut ctx))
}

pub fn check_move_via(
    board: &Board,
    via_id: ItemId,
    center: IntPoint,
    settings: &RouterSettings,
    stop: &dyn Stoppable,
) -> Result<(), ShoveError> {
    let mut ctx = ShoveContext::new(settings, stop);
    check_with(board, |board| moved_via(board, via_id, center, &mut ctx))
}

#[cfg(test)]
mod tests {
    use super::*;

    use crate::stop::{NeverStop, StopFlag};
    use shared::{clearance::ClearanceMatrix, shape::IntBox};

    fn p(x: i64, y: i64) -> IntPoint {
        IntPoint::new(x, y)
    }

    fn params() -> TraceParams {
        TraceParams {
            layer: 0,
            half_width: 50,
            nets: NetNoList::single(1),
            clearance_class: 0,
        }
    }

    #[test]
    fn clear_path_fits_as_is() {
        let mut board = Board::new(
            1,
            IntBox::new(p(-10_000, -10_000), p(10_000, 10_000)),
            ClearanceMatrix::uniform(1, 100),
            AngleRestriction::None,
        );
        board
            .insert_trace(&[p(0, 1000), p(5000, 1000)], 0, 50, NetNoList::single(2), 0, FixedState::Unfixed)
            .unwrap();

        assert!(fits_as_is(&board, &[p(0, 0), p(5000, 0)], &params(), &NeverStop));
        assert!(!fits_as_is(&board, &[p(0, 0), p(5000, 2000)], &params(), &NeverStop));
        assert!(!fits_as_is(&board, &[p(0, 0), p(0, 0)], &params(), &NeverStop));
        let stop = StopFlag::new();
        stop.request_stop();
        assert!(!fits_as_is(&board, &[p(0, 0), p(5000, 0)], &params(), &stop));

        let check = check_trace_segment(&board, p(0, 0), p(5000, 0), &params(), &RouterSettings::default(), &NeverStop);
        assert!(check.fits);
    }

    #[test]
    fn deeper_budget_only_spends_trace_depth() {
        let budget = Budget::from_settings(&RouterSettings::default()).deeper();
        assert_eq!(budget.depth, 19);
        assert_eq!(budget.via_depth, 8);
    }
}
