mod common;

use common::{add_trace, assert_legal, board, p, pad, round_padstack, square_padstack, trace_params};
use rand::{Rng, SeedableRng, rngs::StdRng};
use router::{
    error::ShoveError,
    interactive,
    settings::RouterSettings,
    shove::{
        self, check_forced_pin, check_forced_via, check_move_via, check_trace_segment, insert_forced_pin,
        insert_forced_trace_segment, insert_forced_via, move_via,
    },
    stop::{NeverStop, StopFlag},
};
use shared::{direction::AngleRestriction, item::FixedState, net::NetNoList, shape::TileShape};

#[test]
fn pin_pushes_trace_aside() {
    let mut board = board(100, AngleRestriction::None);
    let trace = add_trace(&mut board, &[p(0, 0), p(10_000, 0)], 1, 100);
    let pin_pad = pad(p(5000, 0), square_padstack(400), 2);
    let settings = RouterSettings::default();

    let pin = interactive::insert_pin(&mut board, &pin_pad, &settings, &NeverStop).unwrap();

    let shoved = board.trace(trace).unwrap();
    assert_eq!(shoved.first_corner(), p(0, 0));
    assert_eq!(shoved.last_corner(), p(10_000, 0));
    assert!(shoved.corners().len() > 2);
    assert!(board.item_obstacles(pin).unwrap().is_empty());
    assert_legal(&board);
    assert_eq!(board.shove_failing_obstacle(), None);
}

#[test]
fn shove_only_bends_the_trace_near_the_pin() {
    for restriction in [
        AngleRestriction::None,
        AngleRestriction::FortyFiveDegree,
        AngleRestriction::NinetyDegree,
    ] {
        let mut board = board(100, restriction);
        // close to the old trace on both sides, far from the pin
        board.insert_keepout(TileShape::point(p(2000, -500), 200), Some(0), 0).unwrap();
        board.insert_keepout(TileShape::point(p(8000, 500), 200), Some(0), 0).unwrap();
        let trace = add_trace(&mut board, &[p(0, 0), p(10_000, 0)], 1, 100);
        let pin_pad = pad(p(5000, 0), square_padstack(400), 2);

        insert_forced_pin(&mut board, &pin_pad, &RouterSettings::default(), &NeverStop).unwrap();

        let corners = board.trace(trace).unwrap().corners();
        assert_eq!(corners[0], p(0, 0));
        assert_eq!(corners[corners.len() - 1], p(10_000, 0));
        for corner in &corners[1..corners.len() - 1] {
            assert!((4599..=5401).contains(&corner.x), "{restriction:?}: {corners:?}");
            assert!(corner.y.abs() <= 401, "{restriction:?}: {corners:?}");
        }
        for pair in corners.windows(2) {
            assert!(restriction.allows_segment(pair[0], pair[1]), "{restriction:?}: {corners:?}");
        }
        assert_legal(&board);
    }
}

#[test]
fn new_via_drills_the_old_one_away() {
    let mut board = board(100, AngleRestriction::None);
    let padstack = round_padstack(200);
    let old = board
        .insert_via(p(0, 0), padstack.clone(), NetNoList::single(1), 0, FixedState::Unfixed)
        .unwrap();
    let settings = RouterSettings::default();

    interactive::insert_via(&mut board, &pad(p(250, 0), padstack, 2), &settings, &NeverStop).unwrap();

    let center = board.via(old).unwrap().center;
    assert!(center.x <= -50, "via only moved to {center:?}");
    assert_eq!(center.y, 0);
    assert_legal(&board);
}

#[test]
fn via_drags_its_traces_along() {
    let mut board = board(100, AngleRestriction::None);
    let padstack = round_padstack(400);
    let via = board
        .insert_via(p(0, 0), padstack.clone(), NetNoList::single(1), 0, FixedState::Unfixed)
        .unwrap();
    let left = add_trace(&mut board, &[p(-5000, 0), p(0, 0)], 1, 100);
    let right = add_trace(&mut board, &[p(0, 0), p(5000, 2000)], 1, 100);
    let settings = RouterSettings {
        pull_tight_after_insert: false,
        ..RouterSettings::default()
    };

    interactive::move_via(&mut board, via, p(0, 1500), &settings, &NeverStop).unwrap();

    assert_eq!(board.via(via).unwrap().center, p(0, 1500));
    assert_eq!(board.trace(left).unwrap().last_corner(), p(0, 1500));
    assert_eq!(board.trace(right).unwrap().first_corner(), p(0, 1500));
    assert_legal(&board);
}

#[test]
fn trace_end_inside_the_pin_blocks() {
    let mut board = board(100, AngleRestriction::None);
    let trace = add_trace(&mut board, &[p(0, 0), p(10_000, 0)], 1, 100);
    let settings = RouterSettings::default();
    let pin_pad = pad(p(0, 0), square_padstack(400), 2);

    let err = insert_forced_pin(&mut board, &pin_pad, &settings, &NeverStop).unwrap_err();

    assert_eq!(err, ShoveError::Blocked { obstacle: trace });
    assert_eq!(board.shove_failing_obstacle(), Some(trace));
    assert_eq!(board.item_count(), 1);
    assert_eq!(board.trace(trace).unwrap().corners(), vec![p(0, 0), p(10_000, 0)]);
}

#[test]
fn no_shove_depth_means_exhausted() {
    let mut board = board(100, AngleRestriction::None);
    let trace = add_trace(&mut board, &[p(0, 0), p(10_000, 0)], 1, 100);
    let settings = RouterSettings {
        max_shove_depth: 0,
        ..RouterSettings::default()
    };
    let pin_pad = pad(p(5000, 0), square_padstack(400), 2);

    let err = insert_forced_pin(&mut board, &pin_pad, &settings, &NeverStop).unwrap_err();
    assert_eq!(err, ShoveError::RecursionExhausted { obstacle: trace });
    assert_eq!(err.obstacle(), Some(trace));
}

#[test]
fn trace_springs_over_a_pin() {
    let mut board = board(100, AngleRestriction::None);
    let pin = board
        .insert_pin(p(5000, 0), square_padstack(400), 0.0, NetNoList::single(2), 0)
        .unwrap();
    let settings = RouterSettings::default();

    let id = interactive::insert_trace(
        &mut board,
        &[p(0, 0), p(10_000, 0)],
        &trace_params(1, 100),
        &settings,
        &NeverStop,
    )
    .unwrap();

    let trace = board.trace(id).unwrap();
    assert_eq!(trace.first_corner(), p(0, 0));
    assert_eq!(trace.last_corner(), p(10_000, 0));
    assert!(board.item_obstacles(pin).unwrap().is_empty());
    assert_legal(&board);
}

#[test]
fn spring_over_without_budget_fails() {
    let mut board = board(100, AngleRestriction::None);
    let pin = board
        .insert_pin(p(5000, 0), square_padstack(400), 0.0, NetNoList::single(2), 0)
        .unwrap();
    let settings = RouterSettings {
        max_spring_over_depth: 0,
        ..RouterSettings::default()
    };

    let err = interactive::insert_trace(
        &mut board,
        &[p(0, 0), p(10_000, 0)],
        &trace_params(1, 100),
        &settings,
        &NeverStop,
    )
    .unwrap_err();

    assert_eq!(err, ShoveError::SpringOverFailed { obstacle: pin });
    assert_eq!(board.shove_failing_obstacle(), Some(pin));
    assert!(board.trace_ids().is_empty());
}

#[test]
fn multi_segment_trace_is_one_item() {
    let mut board = board(100, AngleRestriction::FortyFiveDegree);
    let settings = RouterSettings {
        pull_tight_after_insert: false,
        ..RouterSettings::default()
    };
    let id = interactive::insert_trace(
        &mut board,
        &[p(0, 0), p(4000, 0), p(6000, 2000), p(6000, 6000)],
        &trace_params(1, 100),
        &settings,
        &NeverStop,
    )
    .unwrap();
    assert_eq!(board.trace_ids(), vec![id]);
    assert_eq!(
        board.trace(id).unwrap().corners(),
        vec![p(0, 0), p(4000, 0), p(6000, 2000), p(6000, 6000)]
    );
}

#[test]
fn stopped_shove_changes_nothing() {
    let mut board = board(100, AngleRestriction::None);
    let trace = add_trace(&mut board, &[p(0, 0), p(10_000, 0)], 1, 100);
    let stop = StopFlag::new();
    stop.request_stop();
    let pin_pad = pad(p(5000, 0), square_padstack(400), 2);

    let err = insert_forced_pin(&mut board, &pin_pad, &RouterSettings::default(), &stop).unwrap_err();
    assert_eq!(err, ShoveError::Stopped);
    assert_eq!(board.item_count(), 1);
    assert_eq!(board.trace(trace).unwrap().corners(), vec![p(0, 0), p(10_000, 0)]);
}

#[test]
fn check_matches_insert() {
    let mut rng = StdRng::seed_from_u64(42);
    let settings = RouterSettings::default();
    for _ in 0..10 {
        let mut board = board(50, AngleRestriction::None);
        for _ in 0..6 {
            let from = p(rng.random_range(-8000..8000), rng.random_range(-8000..8000));
            let to = p(rng.random_range(-8000..8000), rng.random_range(-8000..8000));
            if from == to {
                continue;
            }
            let id = add_trace(&mut board, &[from, to], rng.random_range(2..5), 50);
            if !board.item_obstacles(id).unwrap().is_empty() {
                board.remove_item(id).unwrap();
            }
        }
        for _ in 0..2 {
            let center = p(rng.random_range(-8000..8000), rng.random_range(-8000..8000));
            let pin_pad = pad(center, square_padstack(300), 5);
            let checked = check_forced_pin(&board, &pin_pad, &settings, &NeverStop);
            let mut copy = board.clone();
            let inserted = insert_forced_pin(&mut copy, &pin_pad, &settings, &NeverStop);
            assert_eq!(checked.is_ok(), inserted.is_ok());
            if inserted.is_ok() {
                board = copy;
                assert_legal(&board);
            }
        }

        let from = p(rng.random_range(-8000..8000), rng.random_range(-8000..8000));
        let to = p(rng.random_range(-8000..8000), rng.random_range(-8000..8000));
        let params = trace_params(1, 50);
        let check = check_trace_segment(&board, from, to, &params, &settings, &NeverStop);
        let inserted = insert_forced_trace_segment(&mut board, from, to, &params, &settings, &NeverStop);
        assert_eq!(check.fits, inserted.is_ok(), "{from:?} -> {to:?}: {inserted:?}");
        if check.fits {
            assert!((check.possible_length - from.distance(to)).abs() < 1e-9);
            assert_legal(&board);
        } else {
            assert!(check.possible_length < from.distance(to));
            assert_eq!(check.obstacle, inserted.err().and_then(|err| err.obstacle()));
        }
    }
}

#[test]
fn detour_is_reexported_for_planners() {
    let polygon = shove::obstacle_polygon(
        &[shared::shape::TileShape::point(p(50, 0), 10)],
        10,
        AngleRestriction::FortyFiveDegree,
    );
    let path = shove::detour(&[p(0, 0), p(100, 0)], &polygon, AngleRestriction::FortyFiveDegree).unwrap();
    for pair in path.windows(2) {
        assert!(AngleRestriction::FortyFiveDegree.allows_segment(pair[0], pair[1]));
    }
}

#[test]
fn via_checks_match_inserts() {
    let mut rng = StdRng::seed_from_u64(42);
    let settings = RouterSettings::default();
    for _ in 0..10 {
        let mut board = board(50, AngleRestriction::None);
        for _ in 0..6 {
            let from = p(rng.random_range(-6000..6000), rng.random_range(-6000..6000));
            let to = p(rng.random_range(-6000..6000), rng.random_range(-6000..6000));
            if from == to {
                continue;
            }
            let id = add_trace(&mut board, &[from, to], rng.random_range(2..5), 50);
            if !board.item_obstacles(id).unwrap().is_empty() {
                board.remove_item(id).unwrap();
            }
        }

        let center = p(rng.random_range(-6000..6000), rng.random_range(-6000..6000));
        let via_pad = pad(center, round_padstack(300), 1);
        let checked = check_forced_via(&board, &via_pad, &settings, &NeverStop);
        let mut copy = board.clone();
        let inserted = insert_forced_via(&mut copy, &via_pad, &settings, &NeverStop);
        assert_eq!(checked.is_ok(), inserted.is_ok(), "{center:?}: {inserted:?}");
        let Ok(via) = inserted else {
            assert_eq!(copy.item_count(), board.item_count());
            continue;
        };
        board = copy;
        assert_legal(&board);

        let target = p(
            center.x + rng.random_range(-3000..3000),
            center.y + rng.random_range(-3000..3000),
        );
        let checked = check_move_via(&board, via, target, &settings, &NeverStop);
        let mut copy = board.clone();
        let moved = move_via(&mut copy, via, target, &settings, &NeverStop);
        assert_eq!(checked, moved, "{center:?} -> {target:?}");
        if moved.is_ok() {
            assert_eq!(copy.via(via).unwrap().center, target);
            assert_legal(&copy);
        } else {
            assert_eq!(copy.via(via).unwrap().center, center);
        }
    }
}
