//! Frame loop wiring the board, move queue, spawner and a seeded autoplayer.

use dice_roll_core::{Command, DieId, Direction, Event, GameClock, TileCoord};
use dice_roll_system_drag::{DragInput, DRAG_DIST_PER_ROLL};
use dice_roll_system_moves::BoardMoveQueue;
use dice_roll_system_spawning::Spawning;
use dice_roll_world::{self as world, query, Board};
use glam::Vec2;
use rand::{seq::SliceRandom, Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use tracing::{debug, trace};

use crate::config::FileConfig;

/// Pointer travel of the autoplayer per frame, in tile units.
const DRAG_STEP: f32 = 0.2;
/// Frames the autoplayer waits between gestures.
const IDLE_FRAMES: u32 = 4;
/// Offsets the autoplayer seed from the spawner seed.
const PLAYER_SEED_SALT: u64 = 0x9e37_79b9_7f4a_7c15;

/// Counters reported at the end of a session.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct Summary {
    /// Frames simulated.
    pub frames: u32,
    /// Board tick reached.
    pub tick: u32,
    /// Total points awarded.
    pub score: u64,
    /// Dice on the board at the end.
    pub dice: usize,
    /// Dice that entered the board.
    pub spawned: u32,
    /// Dice that despawned.
    pub despawned: u32,
}

/// Headless game session.
#[derive(Debug)]
pub struct Session {
    board: Board,
    moves: BoardMoveQueue,
    spawning: Spawning,
    player: Autoplayer,
    frame_dt: f32,
    summary: Summary,
}

impl Session {
    /// Builds a session from configuration. Call [`Session::start`] before
    /// stepping.
    #[must_use]
    pub fn new(config: &FileConfig) -> Self {
        let seed = config.session.seed;
        Self {
            board: Board::new(config.board.board_config(), config.board.layout()),
            moves: BoardMoveQueue::new(),
            spawning: Spawning::new(config.spawning.config(seed)),
            player: Autoplayer::new(seed ^ PLAYER_SEED_SALT),
            frame_dt: config.session.frame_ms as f32 / 1000.0,
            summary: Summary::default(),
        }
    }

    /// Starts a new game, placing the initial dice.
    pub fn start(&mut self, out_events: &mut Vec<Event>) {
        let from = out_events.len();
        self.moves.reset();
        self.player.cancel();
        self.summary = Summary::default();
        world::apply(&mut self.board, Command::StartGame, out_events);
        self.dispatch(out_events, from);
    }

    /// Simulates one frame.
    pub fn step(&mut self, out_events: &mut Vec<Event>) {
        let from = out_events.len();
        self.player.act(&mut self.board, &mut self.moves);
        self.moves.update(&mut self.board, self.frame_dt, out_events);
        self.dispatch(out_events, from);
        self.summary.frames += 1;
    }

    /// Starts a game and simulates `frames` frames, appending every event.
    pub fn run(&mut self, frames: u32, out_events: &mut Vec<Event>) -> Summary {
        self.start(out_events);
        for _ in 0..frames {
            self.step(out_events);
        }
        self.summary()
    }

    /// Counters so far.
    #[must_use]
    pub fn summary(&self) -> Summary {
        Summary {
            tick: self.board.tick().get(),
            score: self.board.score(),
            dice: query::dice(&self.board).len(),
            ..self.summary
        }
    }

    /// Board being played.
    #[must_use]
    pub const fn board(&self) -> &Board {
        &self.board
    }

    /// Feeds events produced since `from` to the spawner and the move queue.
    fn dispatch(&mut self, events: &mut Vec<Event>, from: usize) {
        for event in &events[from..] {
            if let Event::DieDespawned { die, .. } = event {
                self.moves.remove_die(&mut self.board, *die);
            }
        }

        let available = query::available_tiles(&self.board);
        let mut commands = Vec::new();
        self.spawning.handle(&events[from..], &available, &mut commands);
        for command in commands {
            world::apply(&mut self.board, command, events);
        }

        for event in &events[from..] {
            match event {
                Event::DieSpawned { .. } => self.summary.spawned += 1,
                Event::DieDespawned { .. } => self.summary.despawned += 1,
                Event::SpawnRejected { tile } => debug!(%tile, "spawner picked a blocked tile"),
                _ => {}
            }
        }
    }
}

#[derive(Debug)]
struct Gesture {
    drag: DragInput,
    point: Vec2,
    target: Vec2,
}

/// Seeded stand-in for a player: picks a die, drags it toward a random
/// neighbour over several frames and releases it.
#[derive(Debug)]
struct Autoplayer {
    rng: ChaCha8Rng,
    gesture: Option<Gesture>,
    idle_frames: u32,
}

impl Autoplayer {
    fn new(seed: u64) -> Self {
        Self {
            rng: ChaCha8Rng::seed_from_u64(seed),
            gesture: None,
            idle_frames: 0,
        }
    }

    fn cancel(&mut self) {
        self.gesture = None;
        self.idle_frames = 0;
    }

    fn act(&mut self, board: &mut Board, moves: &mut BoardMoveQueue) {
        let Some(mut gesture) = self.gesture.take() else {
            if self.idle_frames > 0 {
                self.idle_frames -= 1;
            } else {
                self.gesture = self.begin(board, moves);
            }
            return;
        };

        let offset = gesture.target - gesture.point;
        let step = offset.clamp_length_max(DRAG_STEP);
        gesture.point += step;
        if !gesture.drag.update(gesture.point, board, moves) {
            self.idle_frames = IDLE_FRAMES;
            return;
        }

        if offset.length() <= DRAG_STEP {
            let die = gesture.drag.die();
            let _ = gesture.drag.end(step, board, moves);
            trace!(%die, "autoplayer released die");
            self.idle_frames = IDLE_FRAMES;
        } else {
            self.gesture = Some(gesture);
        }
    }

    fn begin(&mut self, board: &mut Board, moves: &mut BoardMoveQueue) -> Option<Gesture> {
        let tick = board.tick();
        let candidates: Vec<(DieId, TileCoord)> = query::dice(board)
            .into_iter()
            .filter(|state| state.is_spawned(tick))
            .map(|state| (state.id(), state.tile()))
            .collect();
        let &(die, tile) = candidates.choose(&mut self.rng)?;
        let direction = *Direction::ALL.choose(&mut self.rng)?;
        let rolls: f32 = self.rng.gen_range(0.3..2.2);

        let (dx, dy) = direction.offset();
        let start = Vec2::new(tile.x() as f32, tile.y() as f32);
        let target = start + Vec2::new(dx as f32, dy as f32) * DRAG_DIST_PER_ROLL * rolls;
        let drag = DragInput::begin(die, start, board, moves)?;
        trace!(%die, ?direction, rolls, "autoplayer grabbed die");
        Some(Gesture {
            drag,
            point: start,
            target,
        })
    }
}
