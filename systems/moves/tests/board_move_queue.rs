use dice_roll_core::{
    BoardContext, Command, DieId, Direction, Event, GameClock, Orientation, Tick, TileCoord,
};
use dice_roll_system_moves::BoardMoveQueue;
use dice_roll_world::{self as world, query, Board};

const FAST: f32 = 8.0;

fn board_with_die(tile: TileCoord, face: u8) -> (Board, DieId) {
    let mut board = Board::default();
    let mut events = Vec::new();
    world::apply(
        &mut board,
        Command::SpawnDie {
            tile,
            orientation: Orientation::with_top(face, 0).expect("valid face"),
            ready_at: Tick::ZERO,
        },
        &mut events,
    );
    let die = match events.as_slice() {
        [Event::DieSpawned { die, .. }] => *die,
        other => panic!("unexpected events: {other:?}"),
    };
    (board, die)
}

fn start_roll(
    board: &mut Board,
    moves: &mut BoardMoveQueue,
    die: DieId,
    direction: Direction,
    progress: f32,
) {
    let tile = query::die(board, die).expect("live die").tile();
    let queue = moves.die_mut(die);
    let _ = queue.clear_all_except_oldest(board, tile);
    let handle = queue.latest_or_new(FAST, true);
    assert!(queue.initialize_move(board, handle, &[direction]));
    let _ = queue.add_progress(board, progress, FAST, true);
}

fn pair_tiles(board: &Board, die: DieId) -> (TileCoord, TileCoord) {
    let pair = query::tick_pair(board).expect("pair");
    let (current, next) = pair.die(die).expect("live die");
    (current.tile(), next.tile())
}

#[test]
fn completed_roll_ends_the_tick() {
    let (mut board, die) = board_with_die(TileCoord::new(0, 0), 2);
    let mut moves = BoardMoveQueue::new();
    start_roll(&mut board, &mut moves, die, Direction::East, 1.0);

    let mut events = Vec::new();
    moves.update(&mut board, 1.0, &mut events);

    assert_eq!(
        events,
        vec![
            Event::TickChanged {
                previous: Tick::ZERO,
                current: Tick::new(1),
            },
            Event::TickUpdated {
                tick: Tick::new(1),
                progress: 0.0,
            },
        ]
    );
    let rolled = query::die(&board, die).expect("live die");
    assert_eq!(rolled.tile(), TileCoord::new(1, 0));
    assert_eq!(
        rolled.face(),
        Orientation::with_top(2, 0)
            .expect("valid face")
            .rolled(Direction::East)
            .top()
    );
    assert!(query::reserved_tiles(&board).is_empty());
    assert!(!board.is_tile_available(TileCoord::new(1, 0)));
    assert!(board.is_tile_available(TileCoord::new(0, 0)));
    assert!(moves.is_idle());
}

#[test]
fn partial_roll_exposes_next_tick_state() {
    let (mut board, die) = board_with_die(TileCoord::new(0, 0), 3);
    let mut moves = BoardMoveQueue::new();
    start_roll(&mut board, &mut moves, die, Direction::North, 0.5);

    let mut events = Vec::new();
    moves.update(&mut board, 1.0, &mut events);

    assert_eq!(
        events,
        vec![Event::TickUpdated {
            tick: Tick::ZERO,
            progress: 0.5,
        }]
    );
    assert_eq!(board.tick(), Tick::ZERO);
    assert_eq!(
        pair_tiles(&board, die),
        (TileCoord::new(0, 0), TileCoord::new(0, 1))
    );
    assert_eq!(query::reserved_tiles(&board), vec![TileCoord::new(0, 1)]);
}

#[test]
fn progress_is_limited_by_elapsed_time() {
    let (mut board, die) = board_with_die(TileCoord::new(0, 0), 3);
    let mut moves = BoardMoveQueue::new();
    start_roll(&mut board, &mut moves, die, Direction::East, 1.0);

    let mut events = Vec::new();
    moves.update(&mut board, 0.05, &mut events);

    assert!((moves.progress() - 0.4).abs() < 1.0e-4);
    assert_eq!(board.tick(), Tick::ZERO);
}

#[test]
fn cancelled_roll_erases_next_tick() {
    let (mut board, die) = board_with_die(TileCoord::new(0, 0), 4);
    let mut moves = BoardMoveQueue::new();
    start_roll(&mut board, &mut moves, die, Direction::West, 0.3);

    let mut events = Vec::new();
    moves.update(&mut board, 1.0, &mut events);
    assert_eq!(
        pair_tiles(&board, die),
        (TileCoord::new(0, 0), TileCoord::new(-1, 0))
    );

    let rounded = moves
        .die_mut(die)
        .round_latest_progress(&mut board, 4.7, true, false);
    assert!(rounded.is_some());
    assert!(query::reserved_tiles(&board).is_empty());

    events.clear();
    moves.update(&mut board, 1.0, &mut events);

    assert_eq!(
        events,
        vec![Event::TickUpdated {
            tick: Tick::ZERO,
            progress: 0.0,
        }]
    );
    assert_eq!(
        pair_tiles(&board, die),
        (TileCoord::new(0, 0), TileCoord::new(0, 0))
    );
    assert!(moves.is_idle());
}

#[test]
fn chained_roll_continues_into_next_tick() {
    let (mut board, die) = board_with_die(TileCoord::new(0, 0), 5);
    let mut moves = BoardMoveQueue::new();
    start_roll(&mut board, &mut moves, die, Direction::East, 1.5);

    let fractional = moves
        .die(die)
        .expect("queue")
        .moves()
        .filter(|queued| queued.progress() > 0.0 && queued.progress() < 1.0)
        .count();
    assert_eq!(fractional, 1);

    let mut events = Vec::new();
    moves.update(&mut board, 1.0, &mut events);

    let tick_changes = events
        .iter()
        .filter(|event| matches!(event, Event::TickChanged { .. }))
        .count();
    assert_eq!(tick_changes, 1);
    assert_eq!(board.tick(), Tick::new(1));
    assert_eq!(
        pair_tiles(&board, die),
        (TileCoord::new(1, 0), TileCoord::new(2, 0))
    );
    assert!((moves.progress() - 0.5).abs() < 1.0e-4);
    assert_eq!(query::reserved_tiles(&board), vec![TileCoord::new(2, 0)]);
}

#[test]
fn user_roll_drives_board_progress() {
    let (mut board, user_die) = board_with_die(TileCoord::new(0, 0), 2);
    let mut events = Vec::new();
    world::apply(
        &mut board,
        Command::SpawnDie {
            tile: TileCoord::new(-2, 2),
            orientation: Orientation::with_top(6, 0).expect("valid face"),
            ready_at: Tick::ZERO,
        },
        &mut events,
    );
    let system_die = DieId::new(1);

    let mut moves = BoardMoveQueue::new();
    {
        let queue = moves.die_mut(system_die);
        let _ = queue.clear_all_except_oldest(&mut board, TileCoord::new(-2, 2));
        let handle = queue.latest_or_new(20.0, false);
        assert!(queue.initialize_move(&mut board, handle, &[Direction::South]));
        let _ = queue.add_progress(&mut board, 0.9, 20.0, false);
    }
    start_roll(&mut board, &mut moves, user_die, Direction::East, 0.4);

    events.clear();
    moves.update(&mut board, 1.0, &mut events);

    assert!((moves.progress() - 0.4).abs() < 1.0e-4);
    assert_eq!(board.tick(), Tick::ZERO);
}

#[test]
fn removing_a_die_releases_its_reservations() {
    let (mut board, die) = board_with_die(TileCoord::new(0, 0), 2);
    let mut moves = BoardMoveQueue::new();
    start_roll(&mut board, &mut moves, die, Direction::South, 1.4);
    assert_eq!(query::reserved_tiles(&board).len(), 2);

    moves.remove_die(&mut board, die);

    assert!(query::reserved_tiles(&board).is_empty());
    assert!(moves.die(die).is_none());
    assert!(moves.die_mut(DieId::new(9)).is_empty());
}
