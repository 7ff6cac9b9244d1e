use std::sync::Arc;

use cgmath::Deg;
use serde::{Deserialize, Serialize};

use crate::{
    clearance::ClearanceClass,
    net::NetNoList,
    pad::Padstack,
    polyline::Polyline,
    shape::TileShape,
    vec2::IntPoint,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ItemId(pub u32);

/// How firmly an item is anchored. Ordered from loosest to firmest.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default, Serialize, Deserialize)]
pub enum FixedState {
    #[default]
    Unfixed,
    /// Temporarily protected while an insertion shoves its neighbours.
    ShoveFixed,
    UserFixed,
    SystemFixed,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TraceEnd {
    Start,
    End,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Trace {
    pub polyline: Polyline,
    pub layer: usize,
    pub half_width: i64,
}

impl Trace {
    pub fn corners(&self) -> Vec<IntPoint> {
        self.polyline.int_corners()
    }
    pub fn first_corner(&self) -> IntPoint {
        self.polyline.first_corner().round()
    }
    pub fn last_corner(&self) -> IntPoint {
        self.polyline.last_corner().round()
    }
    pub fn end_corner(&self, end: TraceEnd) -> IntPoint {
        match end {
            TraceEnd::Start => self.first_corner(),
            TraceEnd::End => self.last_corner(),
        }
    }
    /// Corners ordered so that the given end comes first.
    pub fn corners_from(&self, end: TraceEnd) -> Vec<IntPoint> {
        let mut corners = self.corners();
        if end == TraceEnd::End {
            corners.reverse();
        }
        corners
    }
    pub fn segment_shapes(&self) -> Vec<TileShape> {
        (0..self.polyline.segment_count())
            .map(|seg| self.polyline.offset_shape(self.half_width, seg))
            .collect()
    }
    pub fn length(&self) -> f64 {
        self.polyline.length_approx()
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Via {
    pub center: IntPoint,
    pub padstack: Arc<Padstack>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Pin {
    pub center: IntPoint,
    pub padstack: Arc<Padstack>,
    pub rotation_degrees: f64,
}

/// Copper area such as a plane. Traces and vias of its own net may end
/// anywhere inside it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConductionArea {
    pub shape: TileShape,
    pub layer: usize,
    pub is_obstacle: bool,
}

/// The board edge as a closed polygon. Its edges are obstacles on every layer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Outline {
    pub corners: Vec<IntPoint>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Keepout {
    pub shape: TileShape,
    /// `None` blocks every layer.
    pub layer: Option<usize>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum ItemKind {
    Trace(Trace),
    Via(Via),
    Pin(Pin),
    ConductionArea(ConductionArea),
    Outline(Outline),
    Keepout(Keepout),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Item {
    pub id: ItemId,
    pub nets: NetNoList,
    pub clearance_class: ClearanceClass,
    pub fixed_state: FixedState,
    pub kind: ItemKind,
}

impl Item {
    pub fn kind_name(&self) -> &'static str {
        match self.kind {
            ItemKind::Trace(_) => "trace",
            ItemKind::Via(_) => "via",
            ItemKind::Pin(_) => "pin",
            ItemKind::ConductionArea(_) => "conduction area",
            ItemKind::Outline(_) => "outline",
            ItemKind::Keepout(_) => "keepout",
        }
    }
    pub fn as_trace(&self) -> Option<&Trace> {
        match &self.kind {
            ItemKind::Trace(trace) => Some(trace),
            _ => None,
        }
    }
    pub fn as_via(&self) -> Option<&Via> {
        match &self.kind {
            ItemKind::Via(via) => Some(via),
            _ => None,
        }
    }
    pub fn is_on_layer(&self, layer: usize) -> bool {
        match &self.kind {
            ItemKind::Trace(trace) => trace.layer == layer,
            ItemKind::Via(via) => via.padstack.shape_on_layer(layer).is_some(),
            ItemKind::Pin(pin) => pin.padstack.shape_on_layer(layer).is_some(),
            ItemKind::ConductionArea(area) => area.layer == layer,
            ItemKind::Outline(_) => true,
            ItemKind::Keepout(keepout) => keepout.layer.is_none_or(|l| l == layer),
        }
    }
    /// Shapes on one layer; the position of a shape in the list is its
    /// shape index in the spatial index.
    pub fn shapes_on_layer(&self, layer: usize) -> Vec<TileShape> {
        if !self.is_on_layer(layer) {
            return Vec::new();
        }
        match &self.kind {
            ItemKind::Trace(trace) => trace.segment_shapes(),
            ItemKind::Via(via) => via
                .padstack
                .shape_on_layer(layer)
                .map(|shape| vec![shape.to_tile_shape(via.center, Deg(0.0))])
                .unwrap_or_default(),
            ItemKind::Pin(pin) => pin
                .padstack
                .shape_on_layer(layer)
                .map(|shape| vec![shape.to_tile_shape(pin.center, Deg(pin.rotation_degrees))])
                .unwrap_or_default(),
            ItemKind::ConductionArea(area) => vec![area.shape.clone()],
            ItemKind::Outline(outline) => {
                let n = outline.corners.len();
                (0..n)
                    .map(|i| TileShape::segment(outline.corners[i], outline.corners[(i + 1) % n], 0))
                    .collect()
            }
            ItemKind::Keepout(keepout) => vec![keepout.shape.clone()],
        }
    }
    /// Traces and vias can be shoved unless they are fixed; every other kind
    /// always stays where it is.
    pub fn is_shove_fixed(&self) -> bool {
        match self.kind {
            ItemKind::Trace(_) | ItemKind::Via(_) => self.fixed_state >= FixedState::ShoveFixed,
            _ => true,
        }
    }
    pub fn is_user_fixed(&self) -> bool {
        self.fixed_state >= FixedState::UserFixed
    }
    /// True if this item must keep clearance from copper of `nets`.
    pub fn is_obstacle_for(&self, nets: &NetNoList) -> bool {
        match &self.kind {
            ItemKind::Outline(_) | ItemKind::Keepout(_) => true,
            ItemKind::ConductionArea(area) => area.is_obstacle && !self.nets.shares_net(nets),
            _ => !self.nets.shares_net(nets),
        }
    }
}
