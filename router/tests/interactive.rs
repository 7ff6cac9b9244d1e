mod common;

use common::{add_trace, assert_legal, board, p, round_padstack};
use router::{interactive::optimize_region, settings::RouterSettings, stop::NeverStop};
use shared::{direction::AngleRestriction, item::FixedState, net::NetNoList, shape::IntBox};

#[test]
fn region_optimization_moves_vias_and_tightens_traces() {
    let mut board = board(100, AngleRestriction::None);
    let via = board
        .insert_via(p(0, 0), round_padstack(600), NetNoList::single(1), 0, FixedState::Unfixed)
        .unwrap();
    add_trace(&mut board, &[p(-10_000, 875), p(0, 0)], 1, 100);
    add_trace(&mut board, &[p(0, 0), p(10_000, 875)], 1, 100);
    let wobbly = add_trace(&mut board, &[p(0, 5000), p(10, 5001), p(20, 4999), p(40, 5000)], 2, 5);
    board.take_changed_area();

    let report = optimize_region(
        &mut board,
        &IntBox::new(p(-1000, -1000), p(1000, 6000)),
        &RouterSettings::default(),
        &NeverStop,
    )
    .unwrap();

    assert_eq!(report.vias_moved, 1);
    assert!(report.traces_changed >= 1);
    assert_eq!(board.via(via).unwrap().center.y, 875);
    assert_eq!(board.trace(wobbly).unwrap().corners(), vec![p(0, 5000), p(40, 5000)]);
    assert_legal(&board);
}

#[test]
fn region_without_items_reports_nothing() {
    let mut board = board(100, AngleRestriction::None);
    let report = optimize_region(
        &mut board,
        &IntBox::new(p(-1000, -1000), p(1000, 1000)),
        &RouterSettings::default(),
        &NeverStop,
    )
    .unwrap();
    assert_eq!(report, Default::default());
}
