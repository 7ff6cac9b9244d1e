//! Moving vias to cheaper places.
//!
//! A via connecting two traces slides toward one of the neighbouring trace
//! corners; a fanout via with a single trace slides along that trace. A move
//! is only taken when it keeps every touched item legal and lowers the
//! weighted length of the attached traces. After a move the attached traces
//! are pulled tight and neighbouring vias get their turn, bounded by a depth
//! budget and a guard against revisiting a via at the same place.

use std::collections::HashSet;

use shared::{
    direction::{AngleRestriction, restricted_connections},
    item::{ItemId, ItemKind, TraceEnd},
    line::Line,
    polyline::{Polyline, clean_corners},
    vec2::IntPoint,
};
use tracing::{debug, error, trace, warn};

use crate::{
    board::Board,
    error::Result,
    pull_tight::{doubling_bisection, pull_tight_trace},
    settings::RouterSettings,
    stop::Stoppable,
};

/// A move must lower the weighted trace length by at least this much.
const MIN_COST_GAIN: f64 = 0.5;

/// A trace ending at the via, with its corners ordered from the via outward.
#[derive(Debug, Clone)]
struct ContactTrace {
    id: ItemId,
    end: TraceEnd,
    layer: usize,
    corners: Vec<IntPoint>,
    /// Nothing but the via is attached at the far end.
    far_end_free: bool,
}

struct ViaOptimizer<'a> {
    settings: &'a RouterSettings,
    stop: &'a dyn Stoppable,
    visited: HashSet<(ItemId, IntPoint)>,
    calls_left: i32,
}

/// Tries to move the via to a better place. Returns true if it moved.
pub fn optimize_via(
    board: &mut Board,
    via_id: ItemId,
    settings: &RouterSettings,
    stop: &dyn Stoppable,
) -> Result<bool> {
    let mut optimizer = ViaOptimizer {
        settings,
        stop,
        visited: HashSet::new(),
        calls_left: settings.max_via_opt_depth.max(0).saturating_mul(4),
    };
    optimizer.opt_via(board, via_id, settings.max_via_opt_depth)
}

impl ViaOptimizer<'_> {
    fn opt_via(&mut self, board: &mut Board, via_id: ItemId, depth: i32) -> Result<bool> {
        if depth <= 0 || self.calls_left <= 0 {
            warn!(?via_id, depth, "via optimization budget used up, probably endless loop");
            return Ok(false);
        }
        self.calls_left -= 1;
        if self.stop.is_stop_requested() {
            return Ok(false);
        }
        let Some(item) = board.item(via_id) else {
            return Ok(false);
        };
        let Some(via) = item.as_via() else {
            return Ok(false);
        };
        if item.is_user_fixed() {
            return Ok(false);
        }
        let center = via.center;
        if !self.visited.insert((via_id, center)) {
            trace!(?via_id, ?center, "via already optimized at this location");
            return Ok(false);
        }
        if !board.via_pin_contacts(via_id)?.is_empty() {
            return Ok(false);
        }
        let Some(contacts) = contact_traces(board, via_id, center)? else {
            return Ok(false);
        };
        let planes = board.via_plane_contacts(via_id)?;
        let moved = match contacts.as_slice() {
            [first, second] => self.two_traces(board, via_id, center, first, second, &planes)?,
            [single] => self.fanout(board, via_id, center, single, &planes)?,
            _ => None,
        };
        let Some(moved) = moved else {
            return Ok(false);
        };
        *board = moved;
        let new_center = board.via(via_id)?.center;
        debug!(?via_id, from = ?center, to = ?new_center, "via moved");

        let mut far_vias = Vec::new();
        for contact in &contacts {
            if !board.contains(contact.id) {
                continue;
            }
            pull_tight_trace(board, contact.id, self.settings, self.stop)?;
            let item = board.get_item(contact.id)?;
            let trace = board.trace(contact.id)?;
            let far_end = if trace.first_corner() == new_center {
                trace.last_corner()
            } else {
                trace.first_corner()
            };
            far_vias.extend(
                board
                    .vias_at(far_end, contact.layer, &item.nets)
                    .into_iter()
                    .filter(|&other| other != via_id),
            );
        }
        for other in far_vias {
            self.opt_via(board, other, depth - 1)?;
        }
        self.opt_via(board, via_id, depth - 1)?;
        Ok(true)
    }

    fn two_traces(
        &self,
        board: &Board,
        via_id: ItemId,
        center: IntPoint,
        first: &ContactTrace,
        second: &ContactTrace,
        planes: &[ItemId],
    ) -> Result<Option<Board>> {
        let contacts = [first.clone(), second.clone()];
        let c1 = first.corners[1];
        let c2 = second.corners[1];
        let v1 = c1 - center;
        let v2 = c2 - center;
        let plan = |target: IntPoint| plan_move(board, self.settings, via_id, &contacts, planes, target);

        // both traces leave along the same line
        if v1.cross(v2) == 0 && v1.dot(v2) > 0 {
            let nearer = if center.distance(c1) <= center.distance(c2) { c1 } else { c2 };
            return plan(nearer);
        }

        let cost = |contact: &ContactTrace, corner: IntPoint| {
            let factor = self.settings.trace_cost(contact.layer);
            center.weighted_distance(corner, factor.horizontal, factor.vertical)
        };
        let mut targets = [c1, c2];
        if cost(second, c2) < cost(first, c1) {
            targets.swap(0, 1);
        }
        for target in targets {
            if let Some(moved) = self.reposition_via(board, via_id, center, &contacts, planes, target)? {
                return Ok(Some(moved));
            }
        }

        if v1.dot(v2) > 0 {
            let (near, far) = if center.distance(c1) <= center.distance(c2) { (c1, c2) } else { (c2, c1) };
            if let Some(line) = Line::new(center, far) {
                let projected = line.perpendicular_projection(near.to_float());
                if projected.is_finite() {
                    if let Some(moved) = plan(projected.round())? {
                        return Ok(Some(moved));
                    }
                }
            }
        }

        for corner in [c1, c2] {
            for target in [IntPoint::new(corner.x, center.y), IntPoint::new(center.x, corner.y)] {
                if let Some(moved) = plan(target)? {
                    return Ok(Some(moved));
                }
            }
        }
        Ok(None)
    }

    fn fanout(
        &self,
        board: &Board,
        via_id: ItemId,
        center: IntPoint,
        contact: &ContactTrace,
        planes: &[ItemId],
    ) -> Result<Option<Board>> {
        let contacts = [contact.clone()];
        let next = contact.corners[1];
        if let Some(moved) = self.reposition_via(board, via_id, center, &contacts, planes, next)? {
            return Ok(Some(moved));
        }
        let Some(&after_next) = contact.corners.get(2) else {
            return Ok(None);
        };
        let Some(line) = Line::new(next, after_next) else {
            return Ok(None);
        };
        let projected = line.perpendicular_projection(center.to_float());
        if !projected.is_finite() {
            return Ok(None);
        }
        let target = projected.round();
        if !board.angle_restriction().allows_segment(target, after_next) {
            return Ok(None);
        }
        plan_move(board, self.settings, via_id, &contacts, planes, target)
    }

    /// Moves the via toward `target`: all the way if possible, otherwise as
    /// far as a bisection on the distance finds a legal, cheaper place.
    fn reposition_via(
        &self,
        board: &Board,
        via_id: ItemId,
        center: IntPoint,
        contacts: &[ContactTrace],
        planes: &[ItemId],
        target: IntPoint,
    ) -> Result<Option<Board>> {
        if let Some(moved) = plan_move(board, self.settings, via_id, contacts, planes, target)? {
            return Ok(Some(moved));
        }
        let length = center.distance(target);
        let max_step = length.floor() as i64;
        let direction = (target - center).to_float() / length;
        let mut failure = None;
        let moved = doubling_bisection(max_step, self.settings.pull_tight_accuracy, |step| {
            let point = (center.to_float() + direction * step as f64).round();
            match plan_move(board, self.settings, via_id, contacts, planes, point) {
                Ok(moved) => moved,
                Err(err) => {
                    failure = Some(err);
                    None
                }
            }
        });
        match failure {
            Some(err) => Err(err),
            None => Ok(moved),
        }
    }
}

/// Traces ending at the via, or `None` if one of them does not end exactly
/// at the via center.
fn contact_traces(board: &Board, via_id: ItemId, center: IntPoint) -> Result<Option<Vec<ContactTrace>>> {
    let mut result: Vec<ContactTrace> = Vec::new();
    for (id, end) in board.via_trace_contacts(via_id)? {
        if result.iter().any(|contact| contact.id == id) {
            // both ends of one trace on the same via
            return Ok(None);
        }
        let trace = board.trace(id)?;
        if trace.end_corner(end) != center {
            error!(
                target: "invariant",
                ?via_id,
                trace_id = ?id,
                ?center,
                trace_end = ?trace.end_corner(end),
                "contact trace does not end at the via center"
            );
            return Ok(None);
        }
        let far = match end {
            TraceEnd::Start => TraceEnd::End,
            TraceEnd::End => TraceEnd::Start,
        };
        let far_end_free = board.end_contacts(id, far)?.is_empty();
        result.push(ContactTrace {
            id,
            end,
            layer: trace.layer,
            corners: trace.corners_from(end),
            far_end_free,
        });
    }
    Ok(Some(result))
}

fn weighted_length(corners: &[IntPoint], settings: &RouterSettings, layer: usize) -> f64 {
    let factor = settings.trace_cost(layer);
    corners
        .windows(2)
        .map(|pair| pair[0].weighted_distance(pair[1], factor.horizontal, factor.vertical))
        .sum()
}

/// The corners of a contact trace after its via end moved to `target`.
pub(crate) fn reroute_end(corners: &[IntPoint], target: IntPoint, restriction: AngleRestriction) -> Vec<IntPoint> {
    let next = corners[1];
    let mut result = vec![target];
    if target != next && !restriction.allows_segment(target, next) {
        if let Some(path) = restricted_connections(target, next, restriction).into_iter().next() {
            result.extend(path.get(1..path.len().saturating_sub(1)).unwrap_or(&[]));
        }
    }
    result.extend_from_slice(&corners[1..]);
    result
}

/// The board with the via moved to `target` and its traces rerouted, if
/// the result is legal, keeps the via inside its planes and is cheaper.
fn plan_move(
    board: &Board,
    settings: &RouterSettings,
    via_id: ItemId,
    contacts: &[ContactTrace],
    planes: &[ItemId],
    target: IntPoint,
) -> Result<Option<Board>> {
    let center = board.via(via_id)?.center;
    if target == center || !target.is_valid() {
        return Ok(None);
    }
    for &plane in planes {
        let inside = match &board.get_item(plane)?.kind {
            ItemKind::ConductionArea(area) => area.shape.contains(target),
            _ => true,
        };
        if !inside {
            return Ok(None);
        }
    }
    let restriction = board.angle_restriction();
    let mut scratch = board.clone();
    scratch.move_via(via_id, target)?;
    let mut old_cost = 0.0;
    let mut new_cost = 0.0;
    let mut rerouted = Vec::new();
    for contact in contacts {
        old_cost += weighted_length(&contact.corners, settings, contact.layer);
        let corners = clean_corners(&reroute_end(&contact.corners, target, restriction));
        if corners.len() < 2 {
            if !contact.far_end_free {
                return Ok(None);
            }
            scratch.remove_item(contact.id)?;
            continue;
        }
        new_cost += weighted_length(&corners, settings, contact.layer);
        let mut oriented = corners;
        if contact.end == TraceEnd::End {
            oriented.reverse();
        }
        let Some(polyline) = Polyline::from_corners(&oriented) else {
            return Ok(None);
        };
        scratch.change_polyline(contact.id, polyline)?;
        rerouted.push(contact.id);
    }
    if new_cost > old_cost - MIN_COST_GAIN {
        return Ok(None);
    }
    if !scratch.item_obstacles(via_id)?.is_empty() {
        return Ok(None);
    }
    for id in rerouted {
        if !scratch.item_obstacles(id)?.is_empty() {
            return Ok(None);
        }
    }
    Ok(Some(scratch))
}
