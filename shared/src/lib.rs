pub mod clearance;
pub mod direction;
pub mod item;
pub mod line;
pub mod net;
pub mod pad;
pub mod polyline;
pub mod shape;
pub mod vec2;
