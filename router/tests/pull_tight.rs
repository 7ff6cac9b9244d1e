mod common;

use common::{add_trace, assert_legal, board, p};
use rand::{Rng, SeedableRng, rngs::StdRng};
use router::{
    pull_tight::{pull_tight_trace, smoothen_end_corners},
    settings::RouterSettings,
    stop::{NeverStop, StopFlag},
};
use shared::{
    direction::AngleRestriction,
    item::{FixedState, ItemId},
    net::NetNoList,
    shape::TileShape,
};

#[test]
fn jittered_trace_becomes_straight() {
    let mut board = board(100, AngleRestriction::None);
    let id = add_trace(&mut board, &[p(0, 0), p(10, 1), p(20, -1), p(30, 0), p(40, 0)], 1, 5);
    let settings = RouterSettings::default();
    assert!(pull_tight_trace(&mut board, id, &settings, &NeverStop).unwrap());
    assert_eq!(board.trace(id).unwrap().corners(), vec![p(0, 0), p(40, 0)]);
}

#[test]
fn second_pull_tight_changes_nothing() {
    let mut board = board(100, AngleRestriction::None);
    let id = add_trace(&mut board, &[p(0, 0), p(10, 1), p(20, -1), p(30, 0), p(40, 0)], 1, 5);
    let settings = RouterSettings::default();
    pull_tight_trace(&mut board, id, &settings, &NeverStop).unwrap();
    let once = board.trace(id).unwrap().corners();
    assert!(!pull_tight_trace(&mut board, id, &settings, &NeverStop).unwrap());
    assert_eq!(board.trace(id).unwrap().corners(), once);
}

#[test]
fn bending_around_a_keepout_stays_legal_and_keeps_the_ends() {
    let mut board = board(100, AngleRestriction::None);
    board
        .insert_keepout(TileShape::point(p(6000, 0), 800), Some(0), 0)
        .unwrap();
    let id = add_trace(
        &mut board,
        &[p(0, 0), p(3000, 2000), p(4000, 1500), p(8000, 2500), p(12000, 0)],
        1,
        50,
    );
    assert_legal(&board);
    let before = board.trace(id).unwrap().length();
    pull_tight_trace(&mut board, id, &RouterSettings::default(), &NeverStop).unwrap();
    let trace = board.trace(id).unwrap();
    assert!(trace.length() < before);
    assert_eq!(trace.first_corner(), p(0, 0));
    assert_eq!(trace.last_corner(), p(12000, 0));
    assert!(trace.corners().len() >= 3);
    assert_legal(&board);
}

#[test]
fn forty_five_degree_staircase_becomes_diagonal() {
    let mut board = board(100, AngleRestriction::FortyFiveDegree);
    let id = add_trace(&mut board, &[p(0, 0), p(10, 0), p(10, 10), p(20, 10), p(20, 20)], 1, 2);
    pull_tight_trace(&mut board, id, &RouterSettings::default(), &NeverStop).unwrap();
    assert_eq!(board.trace(id).unwrap().corners(), vec![p(0, 0), p(20, 20)]);
}

#[test]
fn ninety_degree_staircase_becomes_one_bend() {
    let mut board = board(100, AngleRestriction::NinetyDegree);
    let id = add_trace(&mut board, &[p(0, 0), p(10, 0), p(10, 10), p(20, 10), p(20, 20)], 1, 2);
    pull_tight_trace(&mut board, id, &RouterSettings::default(), &NeverStop).unwrap();
    let corners = board.trace(id).unwrap().corners();
    assert_eq!(corners, vec![p(0, 0), p(20, 0), p(20, 20)]);
}

#[test]
fn requested_stop_leaves_the_trace_alone() {
    let mut board = board(100, AngleRestriction::None);
    let corners = [p(0, 0), p(10, 1), p(20, -1), p(30, 0), p(40, 0)];
    let id = add_trace(&mut board, &corners, 1, 5);
    let stop = StopFlag::new();
    stop.request_stop();
    assert!(!pull_tight_trace(&mut board, id, &RouterSettings::default(), &stop).unwrap());
    assert_eq!(board.trace(id).unwrap().corners(), corners.to_vec());
}

#[test]
fn obstacle_keeps_the_detour() {
    let mut board = board(100, AngleRestriction::None);
    board
        .insert_trace(&[p(5000, -3000), p(5000, 3000)], 0, 100, NetNoList::single(2), 0, FixedState::UserFixed)
        .unwrap();
    let id = add_trace(&mut board, &[p(0, 0), p(2000, 5000), p(8000, 5000), p(10000, 0)], 1, 100);
    pull_tight_trace(&mut board, id, &RouterSettings::default(), &NeverStop).unwrap();
    let trace = board.trace(id).unwrap();
    assert!(trace.corners().len() >= 3);
    assert!(trace.length() < p(0, 0).distance(p(2000, 5000)) * 2.0 + 6000.0);
    assert_legal(&board);
}

/// Two traces leaving a free junction at (0, 0) at an acute angle. The first
/// one bends at (6000, 0).
fn acute_junction(keepout: Option<TileShape>) -> (router::board::Board, ItemId, ItemId) {
    let mut board = board(100, AngleRestriction::None);
    if let Some(shape) = keepout {
        board.insert_keepout(shape, Some(0), 0).unwrap();
    }
    let bent = add_trace(&mut board, &[p(0, 0), p(6000, 0), p(9000, -2000)], 1, 10);
    let straight = add_trace(&mut board, &[p(0, 0), p(6000, 2000)], 1, 10);
    assert_legal(&board);
    (board, bent, straight)
}

#[test]
fn acute_junction_moves_to_the_bend() {
    let (mut board, bent, straight) = acute_junction(None);
    assert!(smoothen_end_corners(&mut board, bent, &RouterSettings::default(), &NeverStop).unwrap());
    assert_eq!(board.trace(bent).unwrap().corners(), vec![p(6000, 0), p(9000, -2000)]);
    assert_eq!(board.trace(straight).unwrap().corners(), vec![p(6000, 0), p(6000, 2000)]);
    assert_legal(&board);
}

#[test]
fn acute_junction_stays_when_the_shortcut_is_blocked() {
    // close enough to x = 6000 that no shortcut to (6000, 2000) from the
    // far part of the first segment keeps clearance
    let keepout = TileShape::point(p(5800, 1000), 150);
    let (mut board, bent, straight) = acute_junction(Some(keepout));
    let settings = RouterSettings {
        pull_tight_accuracy: 10_000,
        ..RouterSettings::default()
    };
    assert!(!smoothen_end_corners(&mut board, bent, &settings, &NeverStop).unwrap());
    assert_eq!(board.trace(bent).unwrap().corners(), vec![p(0, 0), p(6000, 0), p(9000, -2000)]);
    assert_eq!(board.trace(straight).unwrap().corners(), vec![p(0, 0), p(6000, 2000)]);
}

#[test]
fn random_traces_never_get_longer_or_illegal() {
    let mut rng = StdRng::seed_from_u64(42);
    let settings = RouterSettings::default();
    for round in 0..24 {
        let restriction = if round % 2 == 0 {
            AngleRestriction::None
        } else {
            AngleRestriction::NinetyDegree
        };
        let mut board = board(100, restriction);
        for _ in 0..3 {
            let center = p(rng.random_range(1000..15_000), rng.random_range(-4000..4000));
            let radius = rng.random_range(100..600);
            board.insert_keepout(TileShape::point(center, radius), Some(0), 0).unwrap();
        }
        let mut corners = vec![p(0, 0)];
        let mut at = p(0, 0);
        for step in 0..8 {
            let dx = rng.random_range(200..2000);
            let dy = rng.random_range(-1500..1500);
            at = match restriction {
                AngleRestriction::NinetyDegree if step % 2 == 1 => p(at.x, at.y + dy),
                AngleRestriction::NinetyDegree => p(at.x + dx, at.y),
                _ => p(at.x + dx, at.y + dy),
            };
            corners.push(at);
        }
        let id = add_trace(&mut board, &corners, 1, 50);
        if !board.item_obstacles(id).unwrap().is_empty() {
            continue;
        }
        let before = board.trace(id).unwrap().length();

        pull_tight_trace(&mut board, id, &settings, &NeverStop).unwrap();

        let trace = board.trace(id).unwrap();
        // each removed corner may cost a little rounding
        assert!(trace.length() <= before + 1.5 * corners.len() as f64, "round {round}: {corners:?}");
        assert_eq!(trace.first_corner(), p(0, 0));
        assert_eq!(trace.last_corner(), at);
        assert!(trace.polyline.allows_restriction(restriction), "round {round}");
        assert_legal(&board);
    }
}
