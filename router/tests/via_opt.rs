mod common;

use common::{add_trace, assert_legal, board, p, round_padstack, square_padstack};
use router::{settings::RouterSettings, stop::NeverStop, via_opt::optimize_via};
use shared::{
    direction::AngleRestriction,
    item::FixedState,
    net::NetNoList,
    shape::{IntBox, TileShape},
};

#[test]
fn near_straight_via_moves_onto_the_line() {
    let mut board = board(100, AngleRestriction::None);
    let a = p(-10_000, 875);
    let b = p(10_000, 875);
    let via = board
        .insert_via(p(0, 0), round_padstack(600), NetNoList::single(1), 0, FixedState::Unfixed)
        .unwrap();
    add_trace(&mut board, &[a, p(0, 0)], 1, 100);
    add_trace(&mut board, &[p(0, 0), b], 1, 100);
    let before: f64 = board.trace_ids().iter().map(|&id| board.trace(id).unwrap().length()).sum();

    assert!(optimize_via(&mut board, via, &RouterSettings::default(), &NeverStop).unwrap());

    let center = board.via(via).unwrap().center;
    assert_eq!(center.y, 875);
    let after: f64 = board.trace_ids().iter().map(|&id| board.trace(id).unwrap().length()).sum();
    assert!(after < before);
    assert_legal(&board);
}

#[test]
fn user_fixed_via_stays() {
    let mut board = board(100, AngleRestriction::None);
    let via = board
        .insert_via(p(0, 0), round_padstack(600), NetNoList::single(1), 0, FixedState::UserFixed)
        .unwrap();
    add_trace(&mut board, &[p(-10_000, 875), p(0, 0)], 1, 100);
    add_trace(&mut board, &[p(0, 0), p(10_000, 875)], 1, 100);
    assert!(!optimize_via(&mut board, via, &RouterSettings::default(), &NeverStop).unwrap());
    assert_eq!(board.via(via).unwrap().center, p(0, 0));
}

#[test]
fn plane_via_stays_inside_its_plane() {
    let mut board = board(100, AngleRestriction::None);
    let plane = TileShape::rectangle(&IntBox::new(p(-2000, -2000), p(2000, 2000))).unwrap();
    board
        .insert_conduction_area(plane.clone(), 1, NetNoList::single(1), 0, false)
        .unwrap();
    let via = board
        .insert_via(p(0, 0), round_padstack(600), NetNoList::single(1), 0, FixedState::Unfixed)
        .unwrap();
    add_trace(&mut board, &[p(0, 0), p(5000, 0), p(5000, 5000)], 1, 100);

    optimize_via(&mut board, via, &RouterSettings::default(), &NeverStop).unwrap();

    let center = board.via(via).unwrap().center;
    assert!(plane.contains(center));
    assert_legal(&board);
}

#[test]
fn chained_vias_terminate() {
    let mut board = board(100, AngleRestriction::None);
    let padstack = round_padstack(600);
    let first = board
        .insert_via(p(0, 0), padstack.clone(), NetNoList::single(1), 0, FixedState::Unfixed)
        .unwrap();
    board
        .insert_via(p(3000, 400), padstack, NetNoList::single(1), 0, FixedState::Unfixed)
        .unwrap();
    add_trace(&mut board, &[p(-10_000, 300), p(0, 0)], 1, 100);
    add_trace(&mut board, &[p(0, 0), p(3000, 400)], 1, 100);
    add_trace(&mut board, &[p(3000, 400), p(10_000, 0)], 1, 100);
    let before: f64 = board.trace_ids().iter().map(|&id| board.trace(id).unwrap().length()).sum();

    optimize_via(&mut board, first, &RouterSettings::default(), &NeverStop).unwrap();

    let after: f64 = board.trace_ids().iter().map(|&id| board.trace(id).unwrap().length()).sum();
    assert!(after <= before + 1.5);
    assert_legal(&board);
}

#[test]
fn fanout_via_slides_toward_its_pin() {
    let mut board = board(100, AngleRestriction::None);
    let via = board
        .insert_via(p(0, 0), round_padstack(600), NetNoList::single(1), 0, FixedState::Unfixed)
        .unwrap();
    board
        .insert_pin(p(5000, 0), square_padstack(400), 0.0, NetNoList::single(1), 0)
        .unwrap();
    let trace = add_trace(&mut board, &[p(0, 0), p(5000, 0)], 1, 100);
    let before = board.trace(trace).unwrap().length();

    assert!(optimize_via(&mut board, via, &RouterSettings::default(), &NeverStop).unwrap());

    let center = board.via(via).unwrap().center;
    assert_eq!(center.y, 0);
    assert!((4000..5000).contains(&center.x), "via only moved to {center:?}");
    let trace = board.trace(trace).unwrap();
    assert_eq!(trace.first_corner(), center);
    assert_eq!(trace.last_corner(), p(5000, 0));
    assert!(trace.length() < before);
    assert_legal(&board);
}
