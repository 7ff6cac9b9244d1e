#![allow(dead_code)]

use std::sync::Arc;

use router::{
    board::Board,
    shove::{PadParams, TraceParams},
};
use shared::{
    clearance::ClearanceMatrix,
    direction::AngleRestriction,
    item::{FixedState, ItemId},
    net::NetNoList,
    pad::{PadShape, Padstack},
    shape::IntBox,
    vec2::IntPoint,
};
use tracing_subscriber::EnvFilter;

pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}

pub fn p(x: i64, y: i64) -> IntPoint {
    IntPoint::new(x, y)
}

/// Two layer board of 40000 x 40000 around the origin with one clearance
/// value between everything.
pub fn board(clearance: i64, restriction: AngleRestriction) -> Board {
    init_tracing();
    Board::new(
        2,
        IntBox::new(p(-20_000, -20_000), p(20_000, 20_000)),
        ClearanceMatrix::uniform(2, clearance),
        restriction,
    )
}

pub fn trace_params(net: u32, half_width: i64) -> TraceParams {
    TraceParams {
        layer: 0,
        half_width,
        nets: NetNoList::single(net),
        clearance_class: 0,
    }
}

pub fn round_padstack(diameter: i64) -> Arc<Padstack> {
    Arc::new(Padstack::uniform("via", PadShape::Circle { diameter }, 0, 1))
}

pub fn square_padstack(size: i64) -> Arc<Padstack> {
    Arc::new(Padstack::uniform(
        "smd",
        PadShape::Rectangle {
            width: size,
            height: size,
        },
        0,
        0,
    ))
}

pub fn pad(center: IntPoint, padstack: Arc<Padstack>, net: u32) -> PadParams {
    PadParams {
        center,
        padstack,
        nets: NetNoList::single(net),
        clearance_class: 0,
        rotation_degrees: 0.0,
    }
}

pub fn add_trace(board: &mut Board, corners: &[IntPoint], net: u32, half_width: i64) -> ItemId {
    board
        .insert_trace(corners, 0, half_width, NetNoList::single(net), 0, FixedState::Unfixed)
        .unwrap()
}

/// Every trace and via keeps clearance to everything else.
pub fn assert_legal(board: &Board) {
    for id in board.trace_ids().into_iter().chain(board.via_ids()) {
        let obstacles = board.item_obstacles(id).unwrap();
        assert!(obstacles.is_empty(), "{id:?} violates clearance with {obstacles:?}");
    }
}
