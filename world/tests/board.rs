use dice_roll_core::{
    BoardContext, Command, DieId, Event, GameClock, Orientation, Tick, TileCoord,
};
use dice_roll_world::{self as world, query, Board, BoardConfig, BoardLayout};

fn spawn_ready(board: &mut Board, tile: TileCoord, face: u8) -> DieId {
    let mut events = Vec::new();
    world::apply(
        board,
        Command::SpawnDie {
            tile,
            orientation: Orientation::with_top(face, 0).expect("valid face"),
            ready_at: query::tick(board),
        },
        &mut events,
    );
    match events.as_slice() {
        [Event::DieSpawned { die, .. }] => *die,
        other => panic!("unexpected spawn events: {other:?}"),
    }
}

#[test]
fn reservation_round_trip() {
    let mut board = Board::default();
    let tile = TileCoord::new(0, 0);

    assert!(board.is_tile_available(tile));
    assert!(board.reserve_tile(tile));
    assert!(!board.is_tile_available(tile));
    assert_eq!(query::reserved_tiles(&board), vec![tile]);

    board.unreserve_tile(tile);
    assert!(board.is_tile_available(tile));
    assert!(query::reserved_tiles(&board).is_empty());
}

#[test]
fn reserving_same_tile_twice_fails() {
    let mut board = Board::default();
    let tile = TileCoord::new(1, 0);

    assert!(board.reserve_tile(tile));
    assert!(!board.reserve_tile(tile));
}

#[test]
fn boundary_and_occupied_tiles_are_unavailable() {
    let mut board = Board::default();
    assert!(!board.is_tile_available(TileCoord::new(-2, 6)));
    assert!(!board.reserve_tile(TileCoord::new(7, -3)));

    let _ = spawn_ready(&mut board, TileCoord::new(-1, 1), 3);
    assert!(!board.is_tile_available(TileCoord::new(-1, 1)));
    assert!(!query::available_tiles(&board).contains(&TileCoord::new(-1, 1)));
    assert_eq!(query::available_tiles(&board).len(), 64);
}

#[test]
fn history_stays_within_undo_window() {
    let mut board = Board::default();
    let _ = spawn_ready(&mut board, TileCoord::new(0, 0), 5);
    let undo = query::config(&board).undo_ticks();

    let mut events = Vec::new();
    for _ in 0..12 {
        board.end_tick(&mut events);
        board.update_tick(0.0, &mut events);

        let current = board.tick();
        let oldest = current.saturating_sub(undo);
        let newest = current.next();
        for tick in query::board_state(&board).ticks() {
            assert!(tick >= oldest && tick <= newest, "{tick} outside window");
        }
    }
    assert_eq!(board.tick(), Tick::new(12));
    assert_eq!(query::board_state(&board).ticks().count(), 5);
}

#[test]
fn pair_of_twos_scores_after_despawn_window() {
    let mut board = Board::default();
    let first = spawn_ready(&mut board, TileCoord::new(0, 0), 2);
    let second = spawn_ready(&mut board, TileCoord::new(1, 0), 2);
    let despawn = query::config(&board).despawn_duration();

    let mut events = Vec::new();
    board.end_tick(&mut events);

    let pair = query::tick_pair(&board).expect("pair");
    assert_eq!(pair.current.groups().len(), 1);
    assert_eq!(pair.current.groups()[0].len(), 2);
    assert_eq!(board.score(), 0);
    assert!(board.is_tile_available(TileCoord::new(0, 0)));

    for _ in 1..despawn {
        board.end_tick(&mut events);
        assert_eq!(board.score(), 0);
    }

    events.clear();
    board.end_tick(&mut events);
    assert_eq!(board.score(), 4);
    assert_eq!(
        events,
        vec![
            Event::TickChanged {
                previous: Tick::new(despawn),
                current: Tick::new(despawn + 1),
            },
            Event::DieDespawned {
                die: first,
                tick: Tick::new(despawn + 1),
            },
            Event::DieDespawned {
                die: second,
                tick: Tick::new(despawn + 1),
            },
            Event::ScoreAwarded {
                points: 4,
                total: 4,
            },
        ]
    );

    board.end_tick(&mut events);
    board.update_tick(0.5, &mut events);
    assert_eq!(board.score(), 4);
    assert!(query::dice(&board).is_empty());
}

#[test]
fn despawn_marked_mid_tick_scores_after_window() {
    let mut board = Board::default();
    let first = spawn_ready(&mut board, TileCoord::new(0, 0), 2);
    let second = spawn_ready(&mut board, TileCoord::new(1, 0), 2);
    let despawn = query::config(&board).despawn_duration();

    let mut events = Vec::new();
    board.update_tick(0.1, &mut events);
    let pair = query::tick_pair(&board).expect("pair");
    for die in [first, second] {
        let (current, next) = pair.die(die).expect("live die");
        assert_eq!(current.despawn_tick(), Some(Tick::ZERO));
        assert_eq!(next.despawn_tick(), Some(Tick::ZERO));
    }

    let mut scored_at = None;
    for _ in 0..6 {
        events.clear();
        board.end_tick(&mut events);
        board.update_tick(0.0, &mut events);
        for die in [first, second] {
            if let Some(state) = query::die(&board, die) {
                assert_eq!(state.despawn_tick(), Some(Tick::ZERO));
            }
        }
        let scored = events
            .iter()
            .any(|event| matches!(event, Event::ScoreAwarded { .. }));
        if scored {
            assert_eq!(scored_at, None, "score credited twice");
            scored_at = Some(board.tick());
        }
    }

    assert_eq!(scored_at, Some(Tick::new(despawn)));
    assert_eq!(board.score(), 4);
}

#[test]
fn repeated_tick_updates_do_not_change_groups() {
    let mut board = Board::new(BoardConfig::default(), BoardLayout::standard());
    let _ = spawn_ready(&mut board, TileCoord::new(0, 0), 3);
    let _ = spawn_ready(&mut board, TileCoord::new(0, 1), 3);
    let _ = spawn_ready(&mut board, TileCoord::new(0, 2), 3);

    let mut events = Vec::new();
    board.update_tick(0.1, &mut events);
    let first = query::tick_pair(&board).expect("pair").current.groups().to_vec();
    board.update_tick(0.2, &mut events);
    let second = query::tick_pair(&board).expect("pair").current.groups().to_vec();

    assert_eq!(first, second);
    assert_eq!(first.len(), 1);
    assert_eq!(first[0].score(), 9);
}

#[test]
fn custom_layout_limits_spawn_tiles() {
    let playable = [TileCoord::new(0, 0), TileCoord::new(1, 0)];
    let invalid = [TileCoord::new(2, 0), TileCoord::new(1, 0)];
    let board = Board::new(BoardConfig::new(2, 1), BoardLayout::new(invalid, playable));

    assert_eq!(query::available_tiles(&board), vec![TileCoord::new(0, 0)]);
}
