use std::{collections::BTreeMap, sync::Arc};

use shared::{
    clearance::{ClearanceClass, ClearanceMatrix},
    direction::AngleRestriction,
    item::{ConductionArea, FixedState, Item, ItemId, ItemKind, Keepout, Outline, Pin, Trace, TraceEnd, Via},
    net::NetNoList,
    pad::Padstack,
    polyline::Polyline,
    shape::{IntBox, IntOctagon, TileShape},
    vec2::IntPoint,
};
use tracing::{debug, trace};

use crate::{
    changed_area::ChangedArea,
    error::{BoardError, Result},
    quad_tree::{QuadTreeNode, SpatialEntry},
};

/// The routing board: every item with its shapes indexed per layer.
///
/// All mutations go through this type so that the spatial index, the changed
/// area and the items never disagree. Item ids are handed out in increasing
/// order and never reused.
#[derive(Debug, Clone)]
pub struct Board {
    layer_count: usize,
    bounds: IntBox,
    angle_restriction: AngleRestriction,
    clearance: ClearanceMatrix,
    items: BTreeMap<ItemId, Item>,
    next_id: u32,
    layer_trees: Vec<QuadTreeNode>,
    changed_area: ChangedArea,
    shove_failing_obstacle: Option<ItemId>,
}

/// Copy of a board taken before a speculative change.
#[derive(Debug, Clone)]
pub struct BoardSnapshot(Board);

impl Board {
    pub fn new(
        layer_count: usize,
        bounds: IntBox,
        clearance: ClearanceMatrix,
        angle_restriction: AngleRestriction,
    ) -> Board {
        Board {
            layer_count,
            bounds,
            angle_restriction,
            clearance,
            items: BTreeMap::new(),
            next_id: 1,
            layer_trees: (0..layer_count).map(|_| QuadTreeNode::new(bounds, 0)).collect(),
            changed_area: ChangedArea::new(layer_count),
            shove_failing_obstacle: None,
        }
    }

    pub fn layer_count(&self) -> usize {
        self.layer_count
    }
    pub fn bounds(&self) -> IntBox {
        self.bounds
    }
    pub fn angle_restriction(&self) -> AngleRestriction {
        self.angle_restriction
    }
    pub fn set_angle_restriction(&mut self, restriction: AngleRestriction) {
        self.angle_restriction = restriction;
    }
    pub fn clearance_matrix(&self) -> &ClearanceMatrix {
        &self.clearance
    }
    pub fn clearance_value(&self, a: ClearanceClass, b: ClearanceClass, layer: usize) -> i64 {
        self.clearance.value(a, b, layer)
    }

    fn check_layer(&self, layer: usize) -> Result<()> {
        if layer >= self.layer_count {
            return Err(BoardError::LayerOutOfRange {
                layer,
                layer_count: self.layer_count,
            });
        }
        Ok(())
    }

    fn check_point(point: IntPoint) -> Result<()> {
        if !point.is_valid() {
            return Err(BoardError::InvalidGeometry(format!(
                "coordinate out of range: {point:?}"
            )));
        }
        Ok(())
    }

    fn shape_of(item: &Item, layer: usize, shape_index: usize) -> Option<TileShape> {
        match &item.kind {
            ItemKind::Trace(trace) if trace.layer == layer => {
                (shape_index < trace.polyline.segment_count())
                    .then(|| trace.polyline.offset_shape(trace.half_width, shape_index))
            }
            ItemKind::Trace(_) => None,
            _ => item.shapes_on_layer(layer).into_iter().nth(shape_index),
        }
    }

    fn index_item(&mut self, item: &Item) {
        for layer in 0..self.layer_count {
            for (shape_index, shape) in item.shapes_on_layer(layer).iter().enumerate() {
                self.layer_trees[layer].insert(SpatialEntry {
                    id: item.id,
                    shape_index,
                    bbox: shape.bounding_box(),
                });
                self.changed_area.join(layer, &shape.bounding_octagon());
            }
        }
    }

    fn unindex_item(&mut self, item: &Item) {
        for layer in 0..self.layer_count {
            if !item.is_on_layer(layer) {
                continue;
            }
            self.layer_trees[layer].remove(item.id);
            for shape in item.shapes_on_layer(layer) {
                self.changed_area.join(layer, &shape.bounding_octagon());
            }
        }
    }

    fn add_item(&mut self, nets: NetNoList, clearance_class: ClearanceClass, fixed_state: FixedState, kind: ItemKind) -> ItemId {
        let id = ItemId(self.next_id);
        self.next_id += 1;
        let item = Item {
            id,
            nets,
            clearance_class,
            fixed_state,
            kind,
        };
        trace!(?id, kind = item.kind_name(), "insert item");
        self.index_item(&item);
        self.items.insert(id, item);
        id
    }

    fn replace_item(&mut self, item: Item) -> Result<()> {
        let old = self.items.remove(&item.id).ok_or(BoardError::UnknownItem(item.id))?;
        self.unindex_item(&old);
        self.index_item(&item);
        self.items.insert(item.id, item);
        Ok(())
    }

    pub fn insert_trace(
        &mut self,
        corners: &[IntPoint],
        layer: usize,
        half_width: i64,
        nets: NetNoList,
        clearance_class: ClearanceClass,
        fixed_state: FixedState,
    ) -> Result<ItemId> {
        for &corner in corners {
            Self::check_point(corner)?;
        }
        let polyline = Polyline::from_corners(corners)
            .ok_or_else(|| BoardError::InvalidGeometry(format!("trace needs two distinct corners: {corners:?}")))?;
        self.insert_trace_polyline(polyline, layer, half_width, nets, clearance_class, fixed_state)
    }

    pub fn insert_trace_polyline(
        &mut self,
        polyline: Polyline,
        layer: usize,
        half_width: i64,
        nets: NetNoList,
        clearance_class: ClearanceClass,
        fixed_state: FixedState,
    ) -> Result<ItemId> {
        self.check_layer(layer)?;
        if !polyline.is_integral() {
            return Err(BoardError::InvalidGeometry("trace corners must be integral".to_string()));
        }
        let kind = ItemKind::Trace(Trace {
            polyline,
            layer,
            half_width,
        });
        Ok(self.add_item(nets, clearance_class, fixed_state, kind))
    }

    pub fn insert_via(
        &mut self,
        center: IntPoint,
        padstack: Arc<Padstack>,
        nets: NetNoList,
        clearance_class: ClearanceClass,
        fixed_state: FixedState,
    ) -> Result<ItemId> {
        Self::check_point(center)?;
        if let Some(layer) = padstack.to_layer() {
            self.check_layer(layer)?;
        }
        let kind = ItemKind::Via(Via { center, padstack });
        Ok(self.add_item(nets, clearance_class, fixed_state, kind))
    }

    pub fn insert_pin(
        &mut self,
        center: IntPoint,
        padstack: Arc<Padstack>,
        rotation_degrees: f64,
        nets: NetNoList,
        clearance_class: ClearanceClass,
    ) -> Result<ItemId> {
        Self::check_point(center)?;
        if let Some(layer) = padstack.to_layer() {
            self.check_layer(layer)?;
        }
        let kind = ItemKind::Pin(Pin {
            center,
            padstack,
            rotation_degrees,
        });
        Ok(self.add_item(nets, clearance_class, FixedState::SystemFixed, kind))
    }

    pub fn insert_conduction_area(
        &mut self,
        shape: TileShape,
        layer: usize,
        nets: NetNoList,
        clearance_class: ClearanceClass,
        is_obstacle: bool,
    ) -> Result<ItemId> {
        self.check_layer(layer)?;
        let kind = ItemKind::ConductionArea(ConductionArea {
            shape,
            layer,
            is_obstacle,
        });
        Ok(self.add_item(nets, clearance_class, FixedState::SystemFixed, kind))
    }

    pub fn insert_outline(&mut self, corners: &[IntPoint], clearance_class: ClearanceClass) -> Result<ItemId> {
        if corners.len() < 3 {
            return Err(BoardError::InvalidGeometry("outline needs three corners".to_string()));
        }
        let kind = ItemKind::Outline(Outline {
            corners: corners.to_vec(),
        });
        Ok(self.add_item(NetNoList::empty(), clearance_class, FixedState::SystemFixed, kind))
    }

    pub fn insert_keepout(&mut self, shape: TileShape, layer: Option<usize>, clearance_class: ClearanceClass) -> Result<ItemId> {
        if let Some(layer) = layer {
            self.check_layer(layer)?;
        }
        let kind = ItemKind::Keepout(Keepout { shape, layer });
        Ok(self.add_item(NetNoList::empty(), clearance_class, FixedState::SystemFixed, kind))
    }

    pub fn remove_item(&mut self, id: ItemId) -> Result<Item> {
        let item = self.items.remove(&id).ok_or(BoardError::UnknownItem(id))?;
        trace!(?id, kind = item.kind_name(), "remove item");
        self.unindex_item(&item);
        Ok(item)
    }

    /// Replaces the centerline of a trace, keeping its id.
    pub fn change_polyline(&mut self, id: ItemId, polyline: Polyline) -> Result<()> {
        if !polyline.is_integral() {
            return Err(BoardError::InvalidGeometry("trace corners must be integral".to_string()));
        }
        let mut item = self.get_item(id)?.clone();
        match &mut item.kind {
            ItemKind::Trace(trace) => trace.polyline = polyline,
            _ => return Err(Self::wrong_kind(&item, "trace")),
        }
        self.replace_item(item)
    }

    /// Moves the via only; attached traces are left to the caller.
    pub fn move_via(&mut self, id: ItemId, center: IntPoint) -> Result<()> {
        Self::check_point(center)?;
        let mut item = self.get_item(id)?.clone();
        match &mut item.kind {
            ItemKind::Via(via) => via.center = center,
            _ => return Err(Self::wrong_kind(&item, "via")),
        }
        self.replace_item(item)
    }

    pub fn set_fixed_state(&mut self, id: ItemId, fixed_state: FixedState) -> Result<()> {
        let item = self.items.get_mut(&id).ok_or(BoardError::UnknownItem(id))?;
        item.fixed_state = fixed_state;
        Ok(())
    }

    fn wrong_kind(item: &Item, expected: &'static str) -> BoardError {
        BoardError::WrongKind {
            id: item.id,
            expected,
            found: item.kind_name(),
        }
    }

    pub fn item(&self, id: ItemId) -> Option<&Item> {
        self.items.get(&id)
    }
    pub fn get_item(&self, id: ItemId) -> Result<&Item> {
        self.items.get(&id).ok_or(BoardError::UnknownItem(id))
    }
    pub fn contains(&self, id: ItemId) -> bool {
        self.items.contains_key(&id)
    }
    /// Items in id order.
    pub fn items(&self) -> impl Iterator<Item = &Item> {
        self.items.values()
    }
    pub fn item_count(&self) -> usize {
        self.items.len()
    }
    pub fn trace(&self, id: ItemId) -> Result<&Trace> {
        let item = self.get_item(id)?;
        item.as_trace().ok_or_else(|| Self::wrong_kind(item, "trace"))
    }
    pub fn via(&self, id: ItemId) -> Result<&Via> {
        let item = self.get_item(id)?;
        item.as_via().ok_or_else(|| Self::wrong_kind(item, "via"))
    }
    pub fn trace_ids(&self) -> Vec<ItemId> {
        self.items.values().filter(|item| item.as_trace().is_some()).map(|item| item.id).collect()
    }
    pub fn via_ids(&self) -> Vec<ItemId> {
        self.items.values().filter(|item| item.as_via().is_some()).map(|item| item.id).collect()
    }

    /// Every `(item, shape index)` on `layer` whose shape comes closer to
    /// `shape` than the clearance between the two classes, skipping items
    /// that share a net with `nets`. Sorted by id, then shape index.
    pub fn find_overlapping_entries(
        &self,
        shape: &TileShape,
        layer: usize,
        nets: &NetNoList,
        clearance_class: ClearanceClass,
    ) -> Vec<(ItemId, usize)> {
        let Some(tree) = self.layer_trees.get(layer) else {
            return Vec::new();
        };
        let area = shape.bounding_box().enlarge(self.clearance.max_value(layer));
        let mut candidates = Vec::new();
        tree.query(&area, &mut candidates);
        let mut result: Vec<(ItemId, usize)> = candidates
            .into_iter()
            .filter_map(|entry| {
                let item = self.items.get(&entry.id)?;
                if !item.is_obstacle_for(nets) {
                    return None;
                }
                let other = Self::shape_of(item, layer, entry.shape_index)?;
                let clearance = self.clearance.value(item.clearance_class, clearance_class, layer);
                shape
                    .intersects_with_clearance(&other, clearance)
                    .then_some((entry.id, entry.shape_index))
            })
            .collect();
        result.sort_unstable();
        result.dedup();
        result
    }

    pub fn find_overlapping(
        &self,
        shape: &TileShape,
        layer: usize,
        nets: &NetNoList,
        clearance_class: ClearanceClass,
    ) -> Vec<ItemId> {
        let mut ids: Vec<ItemId> = self
            .find_overlapping_entries(shape, layer, nets, clearance_class)
            .into_iter()
            .map(|(id, _)| id)
            .collect();
        ids.dedup();
        ids
    }

    /// True if `shape` keeps clearance from everything except items sharing
    /// a net and the explicitly ignored pins.
    pub fn check_trace(
        &self,
        shape: &TileShape,
        layer: usize,
        nets: &NetNoList,
        clearance_class: ClearanceClass,
        ignored_pins: &[ItemId],
    ) -> bool {
        self.find_overlapping(shape, layer, nets, clearance_class)
            .iter()
            .all(|id| ignored_pins.contains(id))
    }

    pub fn check_shape(&self, shape: &TileShape, layer: usize, nets: &NetNoList, clearance_class: ClearanceClass) -> bool {
        self.check_trace(shape, layer, nets, clearance_class, &[])
    }

    /// Items violating clearance with any shape of `id`, sorted.
    pub fn item_obstacles(&self, id: ItemId) -> Result<Vec<ItemId>> {
        let item = self.get_item(id)?;
        let mut result = Vec::new();
        for layer in 0..self.layer_count {
            for shape in item.shapes_on_layer(layer) {
                result.extend(
                    self.find_overlapping(&shape, layer, &item.nets, item.clearance_class)
                        .into_iter()
                        .filter(|&other| other != id),
                );
            }
        }
        result.sort_unstable();
        result.dedup();
        Ok(result)
    }

    fn candidates_at(&self, point: IntPoint, layer: usize) -> Vec<ItemId> {
        let Some(tree) = self.layer_trees.get(layer) else {
            return Vec::new();
        };
        let mut entries = Vec::new();
        tree.query(&IntBox::from_point(point), &mut entries);
        let mut ids: Vec<ItemId> = entries.into_iter().map(|entry| entry.id).collect();
        ids.sort_unstable();
        ids.dedup();
        ids
    }

    /// Traces on `layer` sharing a net with `nets` that start or end at `point`.
    pub fn trace_ends_at(&self, point: IntPoint, layer: usize, nets: &NetNoList) -> Vec<(ItemId, TraceEnd)> {
        let mut result = Vec::new();
        for id in self.candidates_at(point, layer) {
            let Some(item) = self.items.get(&id) else { continue };
            let Some(trace) = item.as_trace() else { continue };
            if trace.layer != layer || !item.nets.shares_net(nets) {
                continue;
            }
            if trace.first_corner() == point {
                result.push((id, TraceEnd::Start));
            }
            if trace.last_corner() == point {
                result.push((id, TraceEnd::End));
            }
        }
        result
    }

    /// Vias, pins and conduction areas on `layer` sharing a net with `nets`
    /// whose copper contains `point`.
    pub fn pads_at(&self, point: IntPoint, layer: usize, nets: &NetNoList) -> Vec<ItemId> {
        self.candidates_at(point, layer)
            .into_iter()
            .filter(|id| {
                self.items.get(id).is_some_and(|item| {
                    matches!(
                        item.kind,
                        ItemKind::Via(_) | ItemKind::Pin(_) | ItemKind::ConductionArea(_)
                    ) && item.nets.shares_net(nets)
                        && item.shapes_on_layer(layer).iter().any(|shape| shape.contains(point))
                })
            })
            .collect()
    }

    /// Items electrically attached at one end of a trace, sorted.
    pub fn end_contacts(&self, id: ItemId, end: TraceEnd) -> Result<Vec<ItemId>> {
        let item = self.get_item(id)?;
        let trace = item.as_trace().ok_or_else(|| Self::wrong_kind(item, "trace"))?;
        let point = trace.end_corner(end);
        let mut result: Vec<ItemId> = self
            .trace_ends_at(point, trace.layer, &item.nets)
            .into_iter()
            .map(|(other, _)| other)
            .filter(|&other| other != id)
            .collect();
        result.extend(self.pads_at(point, trace.layer, &item.nets));
        result.sort_unstable();
        result.dedup();
        Ok(result)
    }

    /// Traces with an end inside the pad of the via on one of its layers.
    pub fn via_trace_contacts(&self, via_id: ItemId) -> Result<Vec<(ItemId, TraceEnd)>> {
        let item = self.get_item(via_id)?;
        if item.as_via().is_none() {
            return Err(Self::wrong_kind(item, "via"));
        }
        let mut result = Vec::new();
        for layer in 0..self.layer_count {
            for shape in item.shapes_on_layer(layer) {
                let mut entries = Vec::new();
                self.layer_trees[layer].query(&shape.bounding_box(), &mut entries);
                for entry in entries {
                    let Some(other) = self.items.get(&entry.id) else { continue };
                    let Some(trace) = other.as_trace() else { continue };
                    if trace.layer != layer || !other.nets.shares_net(&item.nets) {
                        continue;
                    }
                    for end in [TraceEnd::Start, TraceEnd::End] {
                        if shape.contains(trace.end_corner(end)) {
                            result.push((entry.id, end));
                        }
                    }
                }
            }
        }
        result.sort_unstable_by_key(|&(id, end)| (id, end == TraceEnd::End));
        result.dedup();
        Ok(result)
    }

    /// Conduction areas of the via's net containing its center.
    pub fn via_plane_contacts(&self, via_id: ItemId) -> Result<Vec<ItemId>> {
        let item = self.get_item(via_id)?;
        let via = item.as_via().ok_or_else(|| Self::wrong_kind(item, "via"))?;
        let mut result = Vec::new();
        for layer in via.padstack.layers().filter(|&l| l < self.layer_count) {
            result.extend(self.pads_at(via.center, layer, &item.nets).into_iter().filter(|id| {
                self.items
                    .get(id)
                    .is_some_and(|other| matches!(other.kind, ItemKind::ConductionArea(_)))
            }));
        }
        result.sort_unstable();
        result.dedup();
        Ok(result)
    }

    /// Pins sharing the via's net whose copper contains the via center.
    pub fn via_pin_contacts(&self, via_id: ItemId) -> Result<Vec<ItemId>> {
        let item = self.get_item(via_id)?;
        let via = item.as_via().ok_or_else(|| Self::wrong_kind(item, "via"))?;
        let mut result = Vec::new();
        for layer in via.padstack.layers().filter(|&l| l < self.layer_count) {
            result.extend(self.pads_at(via.center, layer, &item.nets).into_iter().filter(|id| {
                self.items
                    .get(id)
                    .is_some_and(|other| matches!(other.kind, ItemKind::Pin(_)))
            }));
        }
        result.sort_unstable();
        result.dedup();
        Ok(result)
    }

    /// Pins on `layer` whose copper contains `point` and that either share a
    /// net with `nets` or carry no net at all. Traces may end inside them.
    pub fn contact_pins_at(&self, point: IntPoint, layer: usize, nets: &NetNoList) -> Vec<ItemId> {
        self.candidates_at(point, layer)
            .into_iter()
            .filter(|id| {
                self.items.get(id).is_some_and(|item| {
                    matches!(item.kind, ItemKind::Pin(_))
                        && (item.nets.is_empty() || item.nets.shares_net(nets))
                        && item.shapes_on_layer(layer).iter().any(|shape| shape.contains(point))
                })
            })
            .collect()
    }

    /// Vias centered exactly at `point` sharing a net with `nets`.
    pub fn vias_at(&self, point: IntPoint, layer: usize, nets: &NetNoList) -> Vec<ItemId> {
        self.pads_at(point, layer, nets)
            .into_iter()
            .filter(|id| {
                self.items
                    .get(id)
                    .and_then(Item::as_via)
                    .is_some_and(|via| via.center == point)
            })
            .collect()
    }

    /// Splits a trace at `point`, which must be an inner corner or lie
    /// inside one of its segments. The first part keeps the id; the id of the
    /// second part is returned. `None` if the point is an end or off the trace.
    pub fn split_trace(&mut self, id: ItemId, point: IntPoint) -> Result<Option<ItemId>> {
        let item = self.get_item(id)?.clone();
        let trace = item.as_trace().ok_or_else(|| Self::wrong_kind(&item, "trace"))?;
        let corners = trace.corners();
        let n = corners.len();
        if point == corners[0] || point == corners[n - 1] {
            return Ok(None);
        }
        let mut parts = None;
        for k in 0..n - 1 {
            let (a, b) = (corners[k], corners[k + 1]);
            if point == b {
                parts = Some((corners[..=k + 1].to_vec(), corners[k + 1..].to_vec()));
                break;
            }
            if (b - a).cross(point - a) == 0 && IntBox::new(a, b).contains(point) {
                let mut first = corners[..=k].to_vec();
                first.push(point);
                let mut second = vec![point];
                second.extend_from_slice(&corners[k + 1..]);
                parts = Some((first, second));
                break;
            }
        }
        let Some((first, second)) = parts else {
            return Ok(None);
        };
        let first = Polyline::from_corners(&first)
            .ok_or_else(|| BoardError::InvalidGeometry("degenerate split".to_string()))?;
        self.change_polyline(id, first)?;
        let new_id = self.insert_trace(
            &second,
            trace.layer,
            trace.half_width,
            item.nets.clone(),
            item.clearance_class,
            item.fixed_state,
        )?;
        debug!(?id, ?new_id, ?point, "split trace");
        Ok(Some(new_id))
    }

    /// Merges the trace with a trace continuing it at either end, as long as
    /// exactly that trace is attached there and both agree on layer, width,
    /// nets and clearance class. Returns true if anything was merged; the
    /// merged trace keeps `id`.
    pub fn combine_trace(&mut self, id: ItemId) -> Result<bool> {
        let mut combined = false;
        'outer: loop {
            let item = self.get_item(id)?.clone();
            let trace = item.as_trace().ok_or_else(|| Self::wrong_kind(&item, "trace"))?.clone();
            for end in [TraceEnd::Start, TraceEnd::End] {
                let contacts = self.end_contacts(id, end)?;
                let [other_id] = contacts[..] else { continue };
                let other_item = self.get_item(other_id)?;
                let Some(other) = other_item.as_trace() else { continue };
                if other.layer != trace.layer
                    || other.half_width != trace.half_width
                    || other_item.nets != item.nets
                    || other_item.clearance_class != item.clearance_class
                    || other_item.is_user_fixed()
                    || item.is_user_fixed()
                {
                    continue;
                }
                let point = trace.end_corner(end);
                let other_end = if other.first_corner() == point {
                    TraceEnd::Start
                } else {
                    TraceEnd::End
                };
                if self.end_contacts(other_id, other_end)? != [id] {
                    continue;
                }
                let continuation = other.corners_from(other_end);
                let corners: Vec<IntPoint> = match end {
                    TraceEnd::End => trace.corners().into_iter().chain(continuation.into_iter().skip(1)).collect(),
                    TraceEnd::Start => continuation
                        .into_iter()
                        .rev()
                        .chain(trace.corners().into_iter().skip(1))
                        .collect(),
                };
                let Some(polyline) = Polyline::from_corners(&corners) else { continue };
                self.remove_item(other_id)?;
                self.change_polyline(id, polyline)?;
                debug!(?id, ?other_id, "combined traces");
                combined = true;
                continue 'outer;
            }
            return Ok(combined);
        }
    }

    pub fn changed_area(&self) -> &ChangedArea {
        &self.changed_area
    }
    pub fn take_changed_area(&mut self) -> ChangedArea {
        let area = self.changed_area.clone();
        self.changed_area.clear();
        area
    }
    pub fn join_changed_area(&mut self, layer: usize, octagon: &IntOctagon) {
        self.changed_area.join(layer, octagon);
    }

    /// The obstacle that made the last forced insertion fail.
    pub fn shove_failing_obstacle(&self) -> Option<ItemId> {
        self.shove_failing_obstacle
    }
    pub fn set_shove_failing_obstacle(&mut self, obstacle: Option<ItemId>) {
        self.shove_failing_obstacle = obstacle;
    }

    pub fn snapshot(&self) -> BoardSnapshot {
        BoardSnapshot(self.clone())
    }
    pub fn restore(&mut self, snapshot: BoardSnapshot) {
        *self = snapshot.0;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use shared::pad::PadShape;

    fn board() -> Board {
        Board::new(
            2,
            IntBox::new(IntPoint::new(-10_000, -10_000), IntPoint::new(10_000, 10_000)),
            ClearanceMatrix::uniform(2, 10),
            AngleRestriction::None,
        )
    }

    fn p(x: i64, y: i64) -> IntPoint {
        IntPoint::new(x, y)
    }

    #[test]
    fn overlap_respects_clearance_and_nets() {
        let mut board = board();
        let id = board
            .insert_trace(&[p(0, 0), p(1000, 0)], 0, 5, NetNoList::single(1), 0, FixedState::Unfixed)
            .unwrap();
        let close = TileShape::segment(p(0, 19), p(1000, 19), 5);
        assert_eq!(board.find_overlapping(&close, 0, &NetNoList::single(2), 0), vec![id]);
        assert!(board.find_overlapping(&close, 0, &NetNoList::single(1), 0).is_empty());
        assert!(board.find_overlapping(&close, 1, &NetNoList::single(2), 0).is_empty());
        let far = TileShape::segment(p(0, 20), p(1000, 20), 5);
        assert!(board.check_shape(&far, 0, &NetNoList::single(2), 0));
    }

    #[test]
    fn change_polyline_keeps_id_and_reindexes() {
        let mut board = board();
        let id = board
            .insert_trace(&[p(0, 0), p(1000, 0)], 0, 5, NetNoList::single(1), 0, FixedState::Unfixed)
            .unwrap();
        board.take_changed_area();
        let moved = Polyline::from_corners(&[p(0, 500), p(1000, 500)]).unwrap();
        board.change_polyline(id, moved).unwrap();
        let probe = TileShape::point(p(500, 0), 1);
        assert!(board.check_shape(&probe, 0, &NetNoList::single(2), 0));
        assert!(!board.changed_area().octagon(0).is_empty());
        assert_eq!(board.trace(id).unwrap().first_corner(), p(0, 500));
        assert!(matches!(board.via(id), Err(BoardError::WrongKind { .. })));
    }

    #[test]
    fn split_and_combine_are_inverse() {
        let mut board = board();
        let nets = NetNoList::single(3);
        let id = board
            .insert_trace(&[p(0, 0), p(100, 0), p(100, 100)], 0, 5, nets.clone(), 0, FixedState::Unfixed)
            .unwrap();
        let second = board.split_trace(id, p(50, 0)).unwrap().unwrap();
        assert_eq!(board.trace(id).unwrap().corners(), vec![p(0, 0), p(50, 0)]);
        assert_eq!(board.trace(second).unwrap().corners(), vec![p(50, 0), p(100, 0), p(100, 100)]);
        assert_eq!(board.end_contacts(id, TraceEnd::End).unwrap(), vec![second]);
        assert!(board.combine_trace(id).unwrap());
        assert!(!board.contains(second));
        assert_eq!(board.trace(id).unwrap().corners(), vec![p(0, 0), p(100, 0), p(100, 100)]);
        assert_eq!(board.split_trace(id, p(0, 0)).unwrap(), None);
    }

    #[test]
    fn via_contacts_find_trace_ends_inside_the_pad() {
        let mut board = board();
        let nets = NetNoList::single(1);
        let padstack = Arc::new(Padstack::uniform("via", PadShape::Circle { diameter: 60 }, 0, 1));
        let via = board.insert_via(p(0, 0), padstack, nets.clone(), 0, FixedState::Unfixed).unwrap();
        let t1 = board
            .insert_trace(&[p(0, 0), p(500, 0)], 0, 5, nets.clone(), 0, FixedState::Unfixed)
            .unwrap();
        let t2 = board
            .insert_trace(&[p(-500, 0), p(0, 0)], 1, 5, nets.clone(), 0, FixedState::Unfixed)
            .unwrap();
        let other_net = board
            .insert_trace(&[p(0, 0), p(0, 500)], 0, 5, NetNoList::single(2), 0, FixedState::Unfixed)
            .unwrap();
        assert_eq!(
            board.via_trace_contacts(via).unwrap(),
            vec![(t1, TraceEnd::Start), (t2, TraceEnd::End)]
        );
        assert_eq!(board.end_contacts(t1, TraceEnd::Start).unwrap(), vec![via]);
        assert_eq!(board.vias_at(p(0, 0), 1, &nets), vec![via]);
        assert_eq!(board.item_obstacles(other_net).unwrap(), vec![via, t1]);
    }

    #[test]
    fn snapshot_restores_items() {
        let mut board = board();
        let snapshot = board.snapshot();
        board
            .insert_trace(&[p(0, 0), p(10, 0)], 0, 1, NetNoList::single(1), 0, FixedState::Unfixed)
            .unwrap();
        assert_eq!(board.item_count(), 1);
        board.restore(snapshot);
        assert_eq!(board.item_count(), 0);
        assert!(matches!(
            board.insert_trace(&[p(0, 0), p(10, 0)], 7, 1, NetNoList::single(1), 0, FixedState::Unfixed),
            Err(BoardError::LayerOutOfRange { layer: 7, .. })
        ));
    }
}
