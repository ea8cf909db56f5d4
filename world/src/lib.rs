#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Authoritative board state management for Dice Roll.

mod board_state;
mod group;
mod tick_state;
mod tiles;

use dice_roll_core::{
    BoardContext, Command, DieId, DieState, Event, GameClock, IdGenerator, Orientation, Tick,
    TileCoord,
};
use tracing::{debug, info, warn};

pub use board_state::{BoardState, TickChange, DEFAULT_UNDO_TICKS};
pub use group::BoardDieGroup;
pub use tick_state::TickState;
pub use tiles::BoardLayout;

use tiles::ReservedTiles;

/// Ticks a die takes to leave the board once its group qualifies.
pub const DEFAULT_DESPAWN_DURATION: u32 = 3;

/// Tunable parameters of the board simulation.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct BoardConfig {
    despawn_duration: u32,
    undo_ticks: u32,
}

impl BoardConfig {
    /// Creates a new board configuration.
    #[must_use]
    pub const fn new(despawn_duration: u32, undo_ticks: u32) -> Self {
        Self {
            despawn_duration,
            undo_ticks,
        }
    }

    /// Ticks a die takes to leave the board once its group qualifies.
    #[must_use]
    pub const fn despawn_duration(&self) -> u32 {
        self.despawn_duration
    }

    /// Settled ticks kept behind the current one.
    #[must_use]
    pub const fn undo_ticks(&self) -> u32 {
        self.undo_ticks
    }
}

impl Default for BoardConfig {
    fn default() -> Self {
        Self::new(DEFAULT_DESPAWN_DURATION, DEFAULT_UNDO_TICKS)
    }
}

#[derive(Clone, Copy, Debug)]
struct SpawnSlot {
    tile: TileCoord,
    ready_at: Tick,
}

/// Represents the authoritative Dice Roll board.
#[derive(Debug)]
pub struct Board {
    config: BoardConfig,
    layout: BoardLayout,
    state: BoardState,
    reserved: ReservedTiles,
    spawn_slot: Option<SpawnSlot>,
    ids: IdGenerator,
    tick: Tick,
    progress: f32,
    score: u64,
}

impl Board {
    /// Creates an empty board using the provided configuration and layout.
    #[must_use]
    pub fn new(config: BoardConfig, layout: BoardLayout) -> Self {
        let mut board = Self {
            state: BoardState::new(config.undo_ticks(), config.despawn_duration()),
            config,
            layout,
            reserved: ReservedTiles::default(),
            spawn_slot: None,
            ids: IdGenerator::new(),
            tick: Tick::ZERO,
            progress: 0.0,
            score: 0,
        };
        board.reset();
        board
    }

    fn reset(&mut self) {
        self.state.reset();
        self.reserved.clear();
        self.spawn_slot = None;
        self.ids = IdGenerator::new();
        self.tick = Tick::ZERO;
        self.progress = 0.0;
        self.score = 0;
        let _ = self.state.tick_state_or_insert(self.tick);
        self.state.ensure_next(self.tick);
    }

    fn spawn_die(
        &mut self,
        tile: TileCoord,
        orientation: Orientation,
        ready_at: Tick,
        out_events: &mut Vec<Event>,
    ) {
        if !self.is_tile_available(tile) {
            debug!(%tile, "spawn rejected, tile unavailable");
            out_events.push(Event::SpawnRejected { tile });
            return;
        }

        let die = self.ids.next_id();
        let tick = self.tick;
        let staged = match self.state.insert_die_state(die, tick) {
            Ok(state) => {
                state.set_tile(tile);
                state.set_orientation(orientation);
                state.set_spawn_tick(Some(ready_at));
                state.clone()
            }
            Err(error) => {
                debug_assert!(false, "{error}");
                warn!(%error, "spawn skipped");
                return;
            }
        };

        if self.state.tick_state(tick.next()).is_some() {
            let next = self.state.tick_state_or_insert(tick.next()).die_or_insert(die);
            staged.copy_to(next);
        }

        if ready_at > tick {
            self.spawn_slot = Some(SpawnSlot { tile, ready_at });
        }

        debug!(%die, %tile, face = staged.face(), %ready_at, "spawned die");
        out_events.push(Event::DieSpawned {
            die,
            tile,
            face: staged.face(),
            ready_at,
        });
    }
}

impl Default for Board {
    fn default() -> Self {
        Self::new(BoardConfig::default(), BoardLayout::standard())
    }
}

impl BoardContext for Board {
    fn is_tile_available(&self, tile: TileCoord) -> bool {
        if self.layout.is_invalid(tile) {
            return false;
        }
        if self.state.is_tile_occupied(tile, self.tick) {
            return false;
        }
        if self.spawn_slot.is_some_and(|slot| slot.tile == tile) {
            return false;
        }
        !self.reserved.contains(tile)
    }

    fn reserve_tile(&mut self, tile: TileCoord) -> bool {
        if !self.is_tile_available(tile) {
            return false;
        }
        match self.reserved.insert(tile) {
            Ok(()) => true,
            Err(error) => {
                debug_assert!(false, "{error}");
                warn!(%error, "reservation skipped");
                false
            }
        }
    }

    fn unreserve_tile(&mut self, tile: TileCoord) {
        if let Err(error) = self.reserved.remove(tile) {
            debug_assert!(false, "{error}");
            warn!(%error, "unreserve skipped");
        }
    }

    fn die_state(&self, die: DieId, tick: Tick) -> Option<&DieState> {
        self.state.die_state(die, tick).ok()
    }

    fn die_state_or_insert(&mut self, die: DieId, tick: Tick) -> &mut DieState {
        self.state.tick_state_or_insert(tick).die_or_insert(die)
    }

    fn clear_tick(&mut self, tick: Tick) {
        self.state.clear_tick(tick);
        if tick == self.tick.next() {
            self.state.fill_tick(self.tick, tick);
        }
    }
}

impl GameClock for Board {
    fn tick(&self) -> Tick {
        self.tick
    }

    fn score(&self) -> u64 {
        self.score
    }

    fn end_tick(&mut self, out_events: &mut Vec<Event>) {
        let previous = self.tick;
        let current = previous.next();
        self.tick = current;
        self.progress = 0.0;
        out_events.push(Event::TickChanged { previous, current });

        let change = self.state.change_tick(previous, current);
        for die in change.despawned {
            debug!(%die, tick = %current, "despawned die");
            out_events.push(Event::DieDespawned { die, tick: current });
        }
        if change.score > 0 {
            self.score = self.score.saturating_add(u64::from(change.score));
            info!(points = change.score, total = self.score, tick = %current, "score awarded");
            out_events.push(Event::ScoreAwarded {
                points: change.score,
                total: self.score,
            });
        }

        if self.spawn_slot.is_some_and(|slot| slot.ready_at <= current) {
            self.spawn_slot = None;
        }
    }

    fn update_tick(&mut self, progress: f32, out_events: &mut Vec<Event>) {
        self.progress = progress.clamp(0.0, 1.0);
        self.state.update_tick(self.tick);
        self.state.ensure_next(self.tick);
        out_events.push(Event::TickUpdated {
            tick: self.tick,
            progress: self.progress,
        });
    }
}

/// Applies the provided command to the board, mutating state deterministically.
pub fn apply(board: &mut Board, command: Command, out_events: &mut Vec<Event>) {
    match command {
        Command::StartGame => {
            board.reset();
            info!("game started");
            out_events.push(Event::GameStarted { tick: board.tick });
        }
        Command::SpawnDie {
            tile,
            orientation,
            ready_at,
        } => board.spawn_die(tile, orientation, ready_at, out_events),
    }
}

/// Query functions that provide read-only access to the board state.
pub mod query {
    use dice_roll_core::{BoardContext, DieId, DieState, Tick, TileCoord};

    use super::{Board, BoardConfig, BoardLayout, BoardState, TickState};

    /// Current tick and the pre-seeded next tick, with progress between them.
    #[derive(Clone, Copy, Debug)]
    pub struct TickPair<'a> {
        /// Settled state at the current tick.
        pub current: &'a TickState,
        /// State the board is moving toward.
        pub next: Option<&'a TickState>,
        /// Progress toward `next` in `[0, 1]`.
        pub progress: f32,
    }

    impl<'a> TickPair<'a> {
        /// Current and next state of `die`, when it is live at the current tick.
        ///
        /// The next state falls back to the current one when the die has no
        /// entry at the next tick.
        #[must_use]
        pub fn die(&self, die: DieId) -> Option<(&'a DieState, &'a DieState)> {
            let current = self.current.die(die)?;
            let next = self
                .next
                .and_then(|state| state.die(die))
                .unwrap_or(current);
            Some((current, next))
        }
    }

    /// Tick the board has settled on.
    #[must_use]
    pub fn tick(board: &Board) -> Tick {
        board.tick
    }

    /// Progress toward the next tick.
    #[must_use]
    pub fn progress(board: &Board) -> f32 {
        board.progress
    }

    /// Total score credited so far.
    #[must_use]
    pub fn score(board: &Board) -> u64 {
        board.score
    }

    /// Configuration the board runs with.
    #[must_use]
    pub fn config(board: &Board) -> BoardConfig {
        board.config
    }

    /// Static tile geometry of the board.
    #[must_use]
    pub fn layout(board: &Board) -> &BoardLayout {
        &board.layout
    }

    /// Read-only access to the tick history.
    #[must_use]
    pub fn board_state(board: &Board) -> &BoardState {
        &board.state
    }

    /// Captures the state pair views interpolate between.
    ///
    /// Returns `None` only before the first tick state exists.
    #[must_use]
    pub fn tick_pair(board: &Board) -> Option<TickPair<'_>> {
        let current = board.state.tick_state(board.tick)?;
        Some(TickPair {
            current,
            next: board.state.tick_state(board.tick.next()),
            progress: board.progress,
        })
    }

    /// Live state of `die` at the current tick.
    #[must_use]
    pub fn die(board: &Board, die: DieId) -> Option<&DieState> {
        board.state.tick_state(board.tick)?.die(die)
    }

    /// Live dice at the current tick, in spawn order.
    #[must_use]
    pub fn dice(board: &Board) -> Vec<&DieState> {
        board
            .state
            .tick_state(board.tick)
            .map(|state| state.dice().collect())
            .unwrap_or_default()
    }

    /// Playable tiles a die could spawn on or move to right now.
    #[must_use]
    pub fn available_tiles(board: &Board) -> Vec<TileCoord> {
        board
            .layout
            .playable_tiles()
            .iter()
            .copied()
            .filter(|tile| board.is_tile_available(*tile))
            .collect()
    }

    /// Tiles currently claimed by in-flight moves.
    #[must_use]
    pub fn reserved_tiles(board: &Board) -> Vec<TileCoord> {
        board.reserved.iter().collect()
    }

    /// Tile held for a die that is still spawning.
    #[must_use]
    pub fn spawn_slot(board: &Board) -> Option<TileCoord> {
        board.spawn_slot.map(|slot| slot.tile)
    }
}
