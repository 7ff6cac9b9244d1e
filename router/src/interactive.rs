//! The calls an editor makes: insert a trace, insert a via or pin, move a
//! via and tidy up a region. Each one shoves as needed and then optimizes
//! what changed, if the settings ask for it.

use shared::{
    item::ItemId,
    shape::{IntBox, IntOctagon},
    vec2::IntPoint,
};
use tracing::{debug, info};

use crate::{
    board::Board,
    error::{BoardError, Result, ShoveError},
    pull_tight::opt_changed_area,
    settings::RouterSettings,
    shove::{self, PadParams, TraceParams},
    stop::Stoppable,
    via_opt::optimize_via,
};

/// What [`optimize_region`] changed.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct OptimizeReport {
    pub traces_changed: usize,
    pub vias_moved: usize,
}

fn after_insert(board: &mut Board, settings: &RouterSettings, stop: &dyn Stoppable) -> Result<()> {
    if settings.pull_tight_after_insert {
        let changed = opt_changed_area(board, settings, stop)?;
        debug!(changed, "pulled tight after insert");
    }
    Ok(())
}

/// Inserts a trace through `corners`, one forced segment at a time, and
/// returns the id of the resulting trace. Either the whole trace goes in or
/// the board is left as it was, with the failing obstacle recorded.
pub fn insert_trace(
    board: &mut Board,
    corners: &[IntPoint],
    params: &TraceParams,
    settings: &RouterSettings,
    stop: &dyn Stoppable,
) -> std::result::Result<ItemId, ShoveError> {
    if corners.len() < 2 {
        return Err(BoardError::InvalidGeometry(format!("trace needs two corners: {corners:?}")).into());
    }
    let snapshot = board.snapshot();
    let mut last = None;
    for pair in corners.windows(2) {
        if pair[0] == pair[1] {
            continue;
        }
        match shove::insert_forced_trace_segment(board, pair[0], pair[1], params, settings, stop) {
            Ok(id) => last = Some(id),
            Err(err) => {
                board.restore(snapshot);
                board.set_shove_failing_obstacle(err.obstacle());
                return Err(err);
            }
        }
    }
    let id = last.ok_or_else(|| BoardError::InvalidGeometry("trace corners coincide".to_string()))?;
    after_insert(board, settings, stop)?;
    info!(?id, layer = params.layer, "trace inserted");
    Ok(id)
}

pub fn insert_via(
    board: &mut Board,
    pad: &PadParams,
    settings: &RouterSettings,
    stop: &dyn Stoppable,
) -> std::result::Result<ItemId, ShoveError> {
    let id = shove::insert_forced_via(board, pad, settings, stop)?;
    after_insert(board, settings, stop)?;
    info!(?id, center = ?pad.center, "via inserted");
    Ok(id)
}

pub fn insert_pin(
    board: &mut Board,
    pad: &PadParams,
    settings: &RouterSettings,
    stop: &dyn Stoppable,
) -> std::result::Result<ItemId, ShoveError> {
    let id = shove::insert_forced_pin(board, pad, settings, stop)?;
    after_insert(board, settings, stop)?;
    info!(?id, center = ?pad.center, "pin inserted");
    Ok(id)
}

/// Drags a via to `center`, then pulls tight the traces around the old and
/// new location. The via stays where it was put.
pub fn move_via(
    board: &mut Board,
    via_id: ItemId,
    center: IntPoint,
    settings: &RouterSettings,
    stop: &dyn Stoppable,
) -> std::result::Result<(), ShoveError> {
    shove::move_via(board, via_id, center, settings, stop)?;
    after_insert(board, settings, stop)?;
    info!(?via_id, ?center, "via moved");
    Ok(())
}

/// Moves the vias inside `region` to better places and pulls tight every
/// trace running through it.
pub fn optimize_region(
    board: &mut Board,
    region: &IntBox,
    settings: &RouterSettings,
    stop: &dyn Stoppable,
) -> Result<OptimizeReport> {
    let octagon = IntOctagon::from_box(region);
    for layer in 0..board.layer_count() {
        board.join_changed_area(layer, &octagon);
    }
    let mut report = OptimizeReport::default();
    for via_id in board.via_ids() {
        if stop.is_stop_requested() {
            break;
        }
        let inside = board.via(via_id).is_ok_and(|via| region.contains(via.center));
        if inside && optimize_via(board, via_id, settings, stop)? {
            report.vias_moved += 1;
        }
    }
    report.traces_changed = opt_changed_area(board, settings, stop)?;
    info!(
        traces_changed = report.traces_changed,
        vias_moved = report.vias_moved,
        "region optimized"
    );
    Ok(report)
}
