use std::collections::BTreeMap;

use cgmath::{Deg, Rad, Rotation, Rotation2, Vector2};
use serde::{Deserialize, Serialize};

use crate::{
    shape::TileShape,
    vec2::{FloatPoint, IntPoint},
};

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PadShape {
    Circle {
        diameter: i64,
    },
    Rectangle {
        width: i64,
        height: i64,
    },
    RoundRect {
        width: i64,
        height: i64,
        corner_radius: i64,
    },
    /// Convex outline relative to the pad center.
    Polygon {
        corners: Vec<IntPoint>,
    },
}

impl PadShape {
    fn rotate_offsets(offsets: &[Vector2<f64>], center: IntPoint, rotation: Deg<f64>) -> Vec<IntPoint> {
        let rotation_rad: Rad<f64> = rotation.into();
        let rotation = cgmath::Basis2::from_angle(rotation_rad);
        let position = center.to_float();
        offsets
            .iter()
            .map(|offset| (position + FloatPoint::from(rotation.rotate_vector(*offset))).round())
            .collect()
    }

    fn rectangle_offsets(width: f64, height: f64) -> [Vector2<f64>; 4] {
        let hw = width / 2.0;
        let hh = height / 2.0;
        [
            Vector2::new(-hw, -hh),
            Vector2::new(hw, -hh),
            Vector2::new(hw, hh),
            Vector2::new(-hw, hh),
        ]
    }

    /// The copper of the pad placed at `center` and rotated counterclockwise.
    pub fn to_tile_shape(&self, center: IntPoint, rotation: Deg<f64>) -> TileShape {
        let shape = match self {
            PadShape::Circle { diameter } => Some(TileShape::point(center, diameter / 2)),
            PadShape::Rectangle { width, height } => {
                let offsets = Self::rectangle_offsets(*width as f64, *height as f64);
                TileShape::polygon(&Self::rotate_offsets(&offsets, center, rotation), 0)
            }
            PadShape::RoundRect {
                width,
                height,
                corner_radius,
            } => {
                // inner rectangle grown by the corner radius
                let r = (*corner_radius).clamp(0, width.min(height) / 2);
                let offsets = Self::rectangle_offsets((width - 2 * r) as f64, (height - 2 * r) as f64);
                TileShape::polygon(&Self::rotate_offsets(&offsets, center, rotation), r)
            }
            PadShape::Polygon { corners } => {
                let offsets: Vec<Vector2<f64>> = corners
                    .iter()
                    .map(|c| Vector2::new(c.x as f64, c.y as f64))
                    .collect();
                TileShape::polygon(&Self::rotate_offsets(&offsets, center, rotation), 0)
            }
        };
        shape.unwrap_or_else(|| TileShape::point(center, 0))
    }
}

/// Pad shapes of a via or pin, keyed by layer. Layers without an entry carry
/// no copper.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Padstack {
    pub name: String,
    layer_shapes: BTreeMap<usize, PadShape>,
}

impl Padstack {
    pub fn new(name: impl Into<String>, layer_shapes: BTreeMap<usize, PadShape>) -> Self {
        Padstack {
            name: name.into(),
            layer_shapes,
        }
    }
    /// The same shape on every layer of `from_layer..=to_layer`.
    pub fn uniform(name: impl Into<String>, shape: PadShape, from_layer: usize, to_layer: usize) -> Self {
        let layer_shapes = (from_layer..=to_layer).map(|layer| (layer, shape.clone())).collect();
        Padstack::new(name, layer_shapes)
    }
    pub fn shape_on_layer(&self, layer: usize) -> Option<&PadShape> {
        self.layer_shapes.get(&layer)
    }
    pub fn layers(&self) -> impl Iterator<Item = usize> + '_ {
        self.layer_shapes.keys().copied()
    }
    pub fn from_layer(&self) -> Option<usize> {
        self.layer_shapes.keys().next().copied()
    }
    pub fn to_layer(&self) -> Option<usize> {
        self.layer_shapes.keys().next_back().copied()
    }
}
