//! Shortening and simplifying trace centerlines without creating clearance
//! violations.
//!
//! One driver loop serves all three angle policies. Each pass skips
//! collapsed segments, removes lines and corners, moves lines toward their
//! neighbouring corners and finally cuts corners. Every step either commits
//! a complete, legal, integral polyline or leaves the input untouched, so
//! stopping between steps never leaves a broken trace behind.

mod any_angle;
mod end_corners;
mod forty_five;
mod ninety;

use std::collections::HashSet;

use shared::{
    clearance::ClearanceClass,
    direction::AngleRestriction,
    item::{ItemId, TraceEnd},
    line::Line,
    net::NetNoList,
    polyline::Polyline,
    shape::{IntOctagon, TileShape},
    vec2::IntPoint,
};
use tracing::{debug, trace};

use crate::{board::Board, error::Result, settings::RouterSettings, stop::Stoppable};

pub use end_corners::smoothen_end_corners;

/// A candidate must be at least this much shorter to count as progress.
const MIN_LENGTH_GAIN: f64 = 0.5;
/// Removing corners may lengthen the trace by this much through rounding.
const ROUNDING_TOLERANCE: f64 = 1.5;
/// Corners closer to a line than this are treated as lying on it.
const CORNER_ON_LINE_EPSILON: f64 = 1.0;

/// Which family of geometric moves the driver applies.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PullTightVariant {
    AnyAngle,
    FortyFive,
    Ninety,
}

impl From<AngleRestriction> for PullTightVariant {
    fn from(restriction: AngleRestriction) -> Self {
        match restriction {
            AngleRestriction::None => PullTightVariant::AnyAngle,
            AngleRestriction::FortyFiveDegree => PullTightVariant::FortyFive,
            AngleRestriction::NinetyDegree => PullTightVariant::Ninety,
        }
    }
}

/// Everything the moves need to know about the trace being optimized.
/// Built once per trace and passed down explicitly.
pub struct PullTightContext<'a> {
    pub board: &'a Board,
    pub layer: usize,
    pub half_width: i64,
    pub nets: NetNoList,
    pub clearance_class: ClearanceClass,
    /// Pins the trace ends in; their copper is not an obstacle.
    pub ignored_pins: Vec<ItemId>,
    pub settings: &'a RouterSettings,
    pub stop: &'a dyn Stoppable,
    pub restriction: AngleRestriction,
}

type Step<'a> = fn(&PullTightContext<'a>, &Polyline) -> Option<Polyline>;

impl<'a> PullTightContext<'a> {
    pub fn for_trace(
        board: &'a Board,
        id: ItemId,
        settings: &'a RouterSettings,
        stop: &'a dyn Stoppable,
    ) -> Result<Self> {
        let item = board.get_item(id)?;
        let trace = board.trace(id)?;
        let mut ignored_pins = Vec::new();
        for end in [TraceEnd::Start, TraceEnd::End] {
            ignored_pins.extend(board.contact_pins_at(trace.end_corner(end), trace.layer, &item.nets));
        }
        ignored_pins.sort_unstable();
        ignored_pins.dedup();
        Ok(PullTightContext {
            board,
            layer: trace.layer,
            half_width: trace.half_width,
            nets: item.nets.clone(),
            clearance_class: item.clearance_class,
            ignored_pins,
            settings,
            stop,
            restriction: board.angle_restriction(),
        })
    }

    pub fn variant(&self) -> PullTightVariant {
        self.restriction.into()
    }

    pub fn segment_is_legal(&self, from: IntPoint, to: IntPoint) -> bool {
        let shape = TileShape::segment(from, to, self.half_width);
        self.board
            .check_trace(&shape, self.layer, &self.nets, self.clearance_class, &self.ignored_pins)
    }

    /// Turns a candidate into an integral polyline and keeps it if it is an
    /// improvement over `old`: same end corners, allowed directions, shorter
    /// (or fewer corners at about the same length) and legal in all segments
    /// that were not already part of `old`.
    pub fn accept(&self, old: &Polyline, candidate: &Polyline) -> Option<Polyline> {
        let integral = candidate.to_integral(self.restriction)?;
        let polyline = Polyline::from_corners(&integral.int_corners())?;
        let old_corners = old.int_corners();
        let new_corners = polyline.int_corners();
        if new_corners == old_corners {
            return None;
        }
        if new_corners.first() != old_corners.first() || new_corners.last() != old_corners.last() {
            trace!("candidate moves an end corner");
            return None;
        }
        if !polyline.allows_restriction(self.restriction) {
            return None;
        }
        let old_length = old.length_approx();
        let new_length = polyline.length_approx();
        let shorter = new_length <= old_length - MIN_LENGTH_GAIN;
        let simpler = new_corners.len() < old_corners.len() && new_length <= old_length + ROUNDING_TOLERANCE;
        if !shorter && !simpler {
            return None;
        }
        let old_segments: HashSet<(IntPoint, IntPoint)> =
            old_corners.windows(2).map(|pair| (pair[0], pair[1])).collect();
        let legal = new_corners
            .windows(2)
            .filter(|pair| !old_segments.contains(&(pair[0], pair[1])))
            .all(|pair| self.segment_is_legal(pair[0], pair[1]));
        if !legal {
            trace!(?new_corners, "candidate violates clearance");
            return None;
        }
        Some(polyline)
    }

    /// Runs the optimization passes until nothing changes, the pass limit
    /// is reached or a stop is requested.
    pub fn optimize(&self, polyline: &Polyline) -> Polyline {
        let steps: [Step<'a>; 5] = [
            Self::skip_segments_of_length_0,
            Self::reduce_lines,
            Self::reduce_corners,
            Self::reposition_lines,
            Self::smoothen_corners,
        ];
        let mut current = polyline.clone();
        for pass in 0..self.settings.max_pull_tight_iterations {
            if self.stop.is_stop_requested() {
                debug!(pass, "pull tight stopped");
                break;
            }
            let mut changed = false;
            for step in steps {
                if let Some(next) = step(self, &current) {
                    current = next;
                    changed = true;
                }
            }
            if !changed {
                break;
            }
        }
        current
    }

    fn skip_segments_of_length_0(&self, polyline: &Polyline) -> Option<Polyline> {
        if polyline.skip_segments_of_length_0() == *polyline {
            return None;
        }
        // rebuilding from the corners keeps both ends exactly where they are
        Polyline::from_corners(&polyline.to_integral(self.restriction)?.int_corners())
    }

    /// Removes a segment by intersecting the two lines around it.
    fn reduce_lines(&self, polyline: &Polyline) -> Option<Polyline> {
        let mut current = polyline.clone();
        let mut changed = false;
        let mut i = 2;
        while i + 3 <= current.line_count() {
            let next = current
                .without_line(i)
                .and_then(|candidate| self.accept(&current, &candidate));
            match next {
                Some(next) => {
                    current = next;
                    changed = true;
                }
                None => i += 1,
            }
        }
        changed.then_some(current)
    }

    fn reduce_corners(&self, polyline: &Polyline) -> Option<Polyline> {
        match self.variant() {
            PullTightVariant::AnyAngle => any_angle::reduce_corners(self, polyline),
            PullTightVariant::FortyFive => forty_five::reduce_corners(self, polyline),
            PullTightVariant::Ninety => ninety::reduce_corners(self, polyline),
        }
    }

    fn smoothen_corners(&self, polyline: &Polyline) -> Option<Polyline> {
        match self.variant() {
            PullTightVariant::AnyAngle => any_angle::smoothen_corners(self, polyline),
            PullTightVariant::FortyFive => forty_five::smoothen_corners(self, polyline),
            PullTightVariant::Ninety => None,
        }
    }

    fn reposition_lines(&self, polyline: &Polyline) -> Option<Polyline> {
        let mut current = polyline.clone();
        let mut changed = false;
        let mut i = 2;
        while i + 3 <= current.line_count() {
            if self.stop.is_stop_requested() {
                break;
            }
            if let Some(next) = self.reposition_line(&current, i) {
                current = next;
                changed = true;
            }
            i += 1;
        }
        changed.then_some(current)
    }

    /// Moves the inner line `index` parallel to itself toward the nearer
    /// of the corners just beyond its two neighbouring segments, as far as
    /// clearance allows.
    fn reposition_line(&self, polyline: &Polyline, index: usize) -> Option<Polyline> {
        let line = polyline.lines()[index];
        let distance_to = |corner: usize| line.signed_distance(polyline.corner_approx(corner));
        let last_corner = polyline.corner_count() - 1;

        // corners on the line itself are absorbed by looking one further out
        let mut prev = index - 2;
        while distance_to(prev).abs() < CORNER_ON_LINE_EPSILON && prev > 0 {
            prev -= 1;
        }
        let mut next = index + 1;
        while distance_to(next).abs() < CORNER_ON_LINE_EPSILON && next < last_corner {
            next += 1;
        }
        let prev_distance = distance_to(prev);
        let next_distance = distance_to(next);
        let candidates = [(prev, prev_distance), (next, next_distance)];
        let mut usable = candidates
            .iter()
            .filter(|(_, distance)| distance.abs() >= CORNER_ON_LINE_EPSILON);
        let &(first_corner, first_distance) = usable.next()?;
        let (target_corner, distance) = match usable.next() {
            Some(&(second_corner, second_distance)) => {
                if first_distance.signum() != second_distance.signum() {
                    return None;
                }
                if second_distance.abs() < first_distance.abs() {
                    (second_corner, second_distance)
                } else {
                    (first_corner, first_distance)
                }
            }
            None => (first_corner, first_distance),
        };
        let target = polyline.corner(target_corner).to_int()?;

        let try_line = |moved: Line| {
            polyline
                .with_line(index, moved)
                .map(|candidate| candidate.skip_segments_of_length_0())
                .and_then(|candidate| self.accept(polyline, &candidate))
        };
        if let Some(result) = try_line(line.through(target)) {
            trace!(index, ?target, "line moved onto corner");
            return Some(result);
        }
        let max_move = distance.abs().floor() as i64;
        let sign = distance.signum();
        doubling_bisection(max_move, self.settings.pull_tight_accuracy, |step| {
            try_line(translated_line(&line, sign * step as f64, target))
        })
    }
}

/// Translates `line` by `distance` toward `target`, walking back in half
/// unit steps when rounding pushed the line past the target.
fn translated_line(line: &Line, distance: f64, target: IntPoint) -> Line {
    let original_side = line.side_of(target);
    let mut applied = distance;
    let mut moved = line.translate(applied);
    while moved.side_of(target) == original_side.negate() && applied * distance > 0.0 {
        applied -= 0.5 * distance.signum();
        moved = line.translate(applied);
    }
    moved
}

/// Finds the largest move in `1..=max` for which `try_at` yields a result.
/// The full move is tried first; after that the interval between the
/// largest legal and the smallest illegal move is halved until it is no
/// wider than `min_move`.
pub fn doubling_bisection<T>(max: i64, min_move: i64, mut try_at: impl FnMut(i64) -> Option<T>) -> Option<T> {
    if max <= 0 {
        return None;
    }
    if let Some(result) = try_at(max) {
        return Some(result);
    }
    let min_move = min_move.max(1);
    let mut best = None;
    let mut legal = 0;
    let mut illegal = max;
    while illegal - legal > min_move {
        let mid = legal + (illegal - legal) / 2;
        match try_at(mid) {
            Some(result) => {
                best = Some(result);
                legal = mid;
            }
            None => illegal = mid,
        }
    }
    best
}

/// Pull-tight one trace in place. Returns true if its geometry changed.
pub fn pull_tight_trace(
    board: &mut Board,
    id: ItemId,
    settings: &RouterSettings,
    stop: &dyn Stoppable,
) -> Result<bool> {
    let original = board.trace(id)?.polyline.clone();
    let optimized = PullTightContext::for_trace(board, id, settings, stop)?.optimize(&original);
    let mut changed = false;
    if optimized != original {
        debug!(
            ?id,
            corners_before = original.corner_count(),
            corners_after = optimized.corner_count(),
            "trace pulled tight"
        );
        board.change_polyline(id, optimized)?;
        changed = true;
    }
    if smoothen_end_corners(board, id, settings, stop)? {
        changed = true;
    }
    Ok(changed)
}

/// Pull-tight every trace touching the changed area of the board until the
/// area stays empty. Returns the number of trace optimizations that changed
/// something.
pub fn opt_changed_area(board: &mut Board, settings: &RouterSettings, stop: &dyn Stoppable) -> Result<usize> {
    let mut changed_count = 0;
    for _ in 0..settings.max_pull_tight_iterations {
        if stop.is_stop_requested() {
            break;
        }
        let area = board.take_changed_area();
        if area.is_empty() {
            break;
        }
        let ids: Vec<ItemId> = board
            .trace_ids()
            .into_iter()
            .filter(|&id| {
                board.trace(id).is_ok_and(|trace| {
                    let octagon = IntOctagon::from_points(&trace.corners());
                    area.intersects(trace.layer, &octagon.enlarge(trace.half_width))
                })
            })
            .collect();
        for id in ids {
            if stop.is_stop_requested() {
                break;
            }
            if board.contains(id) && pull_tight_trace(board, id, settings, stop)? {
                changed_count += 1;
            }
        }
    }
    Ok(changed_count)
}
