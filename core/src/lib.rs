#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Core contracts shared across the Dice Roll simulation.
//!
//! This crate defines the message surface that connects adapters, the
//! authoritative board, and the systems that drive it. Adapters and systems
//! submit [`Command`] values describing desired mutations, the board executes
//! them through its `apply` entry point, and then broadcasts [`Event`] values
//! for systems to react to deterministically. Systems that need synchronous
//! answers from the board (tile reservations, tick advancement) talk to it
//! through the [`BoardContext`] and [`GameClock`] seams instead of a global.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Highest pip count shown on a die face.
pub const MAX_FACE: u8 = 6;

/// Tolerance used whenever roll progress is compared against a boundary.
pub const PROGRESS_EPSILON: f32 = 1.0e-5;

/// Reports whether two progress values are equal within [`PROGRESS_EPSILON`].
#[must_use]
pub fn approximately(a: f32, b: f32) -> bool {
    (a - b).abs() <= PROGRESS_EPSILON
}

/// Commands that express all permissible board mutations outside of moves.
#[derive(Clone, Debug, PartialEq)]
pub enum Command {
    /// Clears the board and restarts the tick counter at zero.
    StartGame,
    /// Requests that a new die be placed onto the board.
    SpawnDie {
        /// Tile the die should occupy.
        tile: TileCoord,
        /// Initial rotation of the die.
        orientation: Orientation,
        /// Tick at which the die finishes spawning and becomes interactable.
        ready_at: Tick,
    },
}

/// Events broadcast by the board after processing commands or ticks.
///
/// Within a single buffer a [`Event::TickChanged`] always precedes the
/// [`Event::TickUpdated`] events that belong to the new tick.
#[derive(Clone, Debug, PartialEq)]
pub enum Event {
    /// Announces that the board was reset and a new game began.
    GameStarted {
        /// Tick the game starts at.
        tick: Tick,
    },
    /// Announces that the discrete tick counter changed.
    TickChanged {
        /// Tick that was current before the change.
        previous: Tick,
        /// Tick that is current after the change.
        current: Tick,
    },
    /// Reports continuous progress within the current tick.
    TickUpdated {
        /// Tick the progress belongs to.
        tick: Tick,
        /// Normalised progress toward the next tick in `[0, 1]`.
        progress: f32,
    },
    /// Confirms that a die was placed onto the board.
    DieSpawned {
        /// Identifier allocated to the die.
        die: DieId,
        /// Tile the die occupies.
        tile: TileCoord,
        /// Face shown on top of the die.
        face: u8,
        /// Tick at which the die finishes spawning.
        ready_at: Tick,
    },
    /// Reports that a spawn request targeted an unavailable tile.
    SpawnRejected {
        /// Tile requested by the spawner.
        tile: TileCoord,
    },
    /// Confirms that a die finished despawning and left the board.
    DieDespawned {
        /// Identifier of the removed die.
        die: DieId,
        /// Tick at which the die was removed.
        tick: Tick,
    },
    /// Reports score credited for fully despawned groups.
    ScoreAwarded {
        /// Points credited by the tick change.
        points: u32,
        /// Running total after crediting.
        total: u64,
    },
}

/// Axis a roll travels along.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Axis {
    /// Horizontal axis, columns.
    X,
    /// Vertical axis, rows.
    Y,
}

/// Unit directions a die can roll in.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Direction {
    /// Movement toward increasing `x`.
    East,
    /// Movement toward decreasing `x`.
    West,
    /// Movement toward increasing `y`.
    North,
    /// Movement toward decreasing `y`.
    South,
}

impl Direction {
    /// All four directions in a fixed order.
    pub const ALL: [Direction; 4] = [
        Direction::East,
        Direction::West,
        Direction::North,
        Direction::South,
    ];

    /// Builds the direction along `axis` whose sign matches `sign`.
    ///
    /// A non-negative sign maps to the positive direction.
    #[must_use]
    pub fn from_axis(axis: Axis, sign: f32) -> Self {
        match (axis, sign >= 0.0) {
            (Axis::X, true) => Self::East,
            (Axis::X, false) => Self::West,
            (Axis::Y, true) => Self::North,
            (Axis::Y, false) => Self::South,
        }
    }

    /// Direction pointing the opposite way.
    #[must_use]
    pub const fn reversed(self) -> Self {
        match self {
            Self::East => Self::West,
            Self::West => Self::East,
            Self::North => Self::South,
            Self::South => Self::North,
        }
    }

    /// Axis the direction travels along.
    #[must_use]
    pub const fn axis(self) -> Axis {
        match self {
            Self::East | Self::West => Axis::X,
            Self::North | Self::South => Axis::Y,
        }
    }

    /// Sign of the direction along its axis, `1.0` or `-1.0`.
    #[must_use]
    pub const fn sign(self) -> f32 {
        match self {
            Self::East | Self::North => 1.0,
            Self::West | Self::South => -1.0,
        }
    }

    /// Integer offset applied to a tile when stepping in this direction.
    #[must_use]
    pub const fn offset(self) -> (i32, i32) {
        match self {
            Self::East => (1, 0),
            Self::West => (-1, 0),
            Self::North => (0, 1),
            Self::South => (0, -1),
        }
    }
}

/// Integer tile coordinate on the board.
#[derive(
    Clone, Copy, Debug, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
)]
pub struct TileCoord {
    x: i32,
    y: i32,
}

impl TileCoord {
    /// Creates a new tile coordinate.
    #[must_use]
    pub const fn new(x: i32, y: i32) -> Self {
        Self { x, y }
    }

    /// Column of the tile.
    #[must_use]
    pub const fn x(&self) -> i32 {
        self.x
    }

    /// Row of the tile.
    #[must_use]
    pub const fn y(&self) -> i32 {
        self.y
    }

    /// Tile reached by stepping once in `direction`.
    #[must_use]
    pub const fn step(self, direction: Direction) -> Self {
        let (dx, dy) = direction.offset();
        Self::new(self.x + dx, self.y + dy)
    }

    /// Reports whether two tiles share an edge.
    ///
    /// Exactly one axis differs, and by exactly one.
    #[must_use]
    pub fn is_adjacent(self, other: TileCoord) -> bool {
        let dx = self.x.abs_diff(other.x);
        let dy = self.y.abs_diff(other.y);
        dx + dy == 1
    }

    /// Direction from this tile to an adjacent one.
    #[must_use]
    pub fn direction_to(self, other: TileCoord) -> Option<Direction> {
        Direction::ALL
            .into_iter()
            .find(|direction| self.step(*direction) == other)
    }
}

impl fmt::Display for TileCoord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({}, {})", self.x, self.y)
    }
}

/// Unique identifier assigned to a die.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct DieId(u32);

impl DieId {
    /// Creates a new die identifier with the provided numeric value.
    #[must_use]
    pub const fn new(value: u32) -> Self {
        Self(value)
    }

    /// Retrieves the numeric representation of the identifier.
    #[must_use]
    pub const fn get(&self) -> u32 {
        self.0
    }
}

impl fmt::Display for DieId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Monotonic allocator for [`DieId`] values.
#[derive(Clone, Debug, Default)]
pub struct IdGenerator {
    next: u32,
}

impl IdGenerator {
    /// Creates a generator whose first id is zero.
    #[must_use]
    pub const fn new() -> Self {
        Self { next: 0 }
    }

    /// Allocates the next identifier.
    pub fn next_id(&mut self) -> DieId {
        let id = DieId::new(self.next);
        self.next = self.next.wrapping_add(1);
        id
    }
}

/// Discrete simulation step.
#[derive(
    Clone, Copy, Debug, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
)]
pub struct Tick(u32);

impl Tick {
    /// First tick of every game.
    pub const ZERO: Tick = Tick(0);

    /// Creates a new tick wrapper.
    #[must_use]
    pub const fn new(value: u32) -> Self {
        Self(value)
    }

    /// Retrieves the underlying tick number.
    #[must_use]
    pub const fn get(&self) -> u32 {
        self.0
    }

    /// Tick immediately after this one.
    #[must_use]
    pub const fn next(self) -> Self {
        Self(self.0.saturating_add(1))
    }

    /// Tick `count` steps later.
    #[must_use]
    pub const fn offset(self, count: u32) -> Self {
        Self(self.0.saturating_add(count))
    }

    /// Tick `count` steps earlier, stopping at zero.
    #[must_use]
    pub const fn saturating_sub(self, count: u32) -> Self {
        Self(self.0.saturating_sub(count))
    }
}

impl fmt::Display for Tick {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// One of the 24 discrete rotations of a die.
///
/// Stored as the faces pointing up, north and east; the remaining faces are
/// their opposites, which always sum to seven.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Orientation {
    top: u8,
    north: u8,
    east: u8,
}

impl Orientation {
    /// Reference rotation with one pip on top, two facing north and three east.
    pub const UPRIGHT: Orientation = Orientation {
        top: 1,
        north: 2,
        east: 3,
    };

    /// Builds a rotation showing `face` on top, turned `quarter_turns` times
    /// about the vertical axis.
    ///
    /// Returns `None` when `face` is not a valid pip count.
    #[must_use]
    pub fn with_top(face: u8, quarter_turns: u8) -> Option<Self> {
        let base = Self::UPRIGHT;
        let upright = match face {
            1 => base,
            2 => base.rolled(Direction::South),
            3 => base.rolled(Direction::West),
            4 => base.rolled(Direction::East),
            5 => base.rolled(Direction::North),
            6 => base.rolled(Direction::North).rolled(Direction::North),
            _ => return None,
        };
        Some((0..quarter_turns % 4).fold(upright, |orientation, _| orientation.yawed()))
    }

    /// Face pointing up, the pip count the die currently shows.
    #[must_use]
    pub const fn top(&self) -> u8 {
        self.top
    }

    /// Face pointing north.
    #[must_use]
    pub const fn north(&self) -> u8 {
        self.north
    }

    /// Face pointing east.
    #[must_use]
    pub const fn east(&self) -> u8 {
        self.east
    }

    /// Rotation after rolling one tile in `direction`.
    #[must_use]
    pub const fn rolled(self, direction: Direction) -> Self {
        match direction {
            Direction::East => Self {
                top: opposite(self.east),
                north: self.north,
                east: self.top,
            },
            Direction::West => Self {
                top: self.east,
                north: self.north,
                east: opposite(self.top),
            },
            Direction::North => Self {
                top: opposite(self.north),
                north: self.top,
                east: self.east,
            },
            Direction::South => Self {
                top: self.north,
                north: opposite(self.top),
                east: self.east,
            },
        }
    }

    /// Rotation after a quarter turn about the vertical axis.
    #[must_use]
    pub const fn yawed(self) -> Self {
        Self {
            top: self.top,
            north: opposite(self.east),
            east: self.north,
        }
    }
}

const fn opposite(face: u8) -> u8 {
    MAX_FACE + 1 - face
}

impl Default for Orientation {
    fn default() -> Self {
        Self::UPRIGHT
    }
}

/// Snapshot of a single die at one tick.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct DieState {
    id: DieId,
    tile: TileCoord,
    orientation: Orientation,
    spawn_tick: Option<Tick>,
    despawn_tick: Option<Tick>,
}

impl DieState {
    /// Creates a fresh state for `id` at the origin tile, already spawned.
    #[must_use]
    pub fn new(id: DieId) -> Self {
        Self {
            id,
            tile: TileCoord::default(),
            orientation: Orientation::UPRIGHT,
            spawn_tick: None,
            despawn_tick: None,
        }
    }

    /// Identifier of the die this state belongs to.
    #[must_use]
    pub const fn id(&self) -> DieId {
        self.id
    }

    /// Tile occupied at this tick.
    #[must_use]
    pub const fn tile(&self) -> TileCoord {
        self.tile
    }

    /// Rotation at this tick.
    #[must_use]
    pub const fn orientation(&self) -> Orientation {
        self.orientation
    }

    /// Face showing on top.
    #[must_use]
    pub const fn face(&self) -> u8 {
        self.orientation.top()
    }

    /// Tick at which spawning completes, if the die was staged.
    #[must_use]
    pub const fn spawn_tick(&self) -> Option<Tick> {
        self.spawn_tick
    }

    /// Tick at which despawning began, if it has.
    #[must_use]
    pub const fn despawn_tick(&self) -> Option<Tick> {
        self.despawn_tick
    }

    /// Moves the die to `tile` without rolling it.
    pub fn set_tile(&mut self, tile: TileCoord) {
        self.tile = tile;
    }

    /// Replaces the rotation of the die.
    pub fn set_orientation(&mut self, orientation: Orientation) {
        self.orientation = orientation;
    }

    /// Records the tick at which spawning completes.
    pub fn set_spawn_tick(&mut self, tick: Option<Tick>) {
        self.spawn_tick = tick;
    }

    /// Records the tick at which despawning began.
    pub fn set_despawn_tick(&mut self, tick: Option<Tick>) {
        self.despawn_tick = tick;
    }

    /// Rolls the die one tile in `direction`, landing on `target`.
    pub fn roll(&mut self, direction: Direction, target: TileCoord) {
        self.tile = target;
        self.orientation = self.orientation.rolled(direction);
    }

    /// Copies everything but the identity into `other`.
    ///
    /// Both states must describe the same die.
    pub fn copy_to(&self, other: &mut DieState) {
        debug_assert_eq!(other.id, self.id, "copy_to requires matching die ids");
        other.tile = self.tile;
        other.orientation = self.orientation;
        other.spawn_tick = self.spawn_tick;
        other.despawn_tick = self.despawn_tick;
    }

    /// Whether the die is still spawning onto the board at `tick`.
    #[must_use]
    pub fn is_spawning(&self, tick: Tick) -> bool {
        self.spawn_tick.is_some_and(|spawn| tick < spawn)
    }

    /// Whether the die is despawning off the board at `tick`.
    #[must_use]
    pub fn is_despawning(&self, tick: Tick) -> bool {
        self.despawn_tick.is_some_and(|despawn| tick >= despawn)
    }

    /// Whether the die has fully despawned at `tick` given the despawn window.
    #[must_use]
    pub fn is_despawned(&self, tick: Tick, despawn_duration: u32) -> bool {
        self.despawn_tick
            .is_some_and(|despawn| tick >= despawn.offset(despawn_duration))
    }

    /// Whether the die is fully on the board and can be interacted with.
    #[must_use]
    pub fn is_spawned(&self, tick: Tick) -> bool {
        !self.is_spawning(tick) && !self.is_despawning(tick)
    }

    /// Direction of travel between this state and a later state of the same die.
    #[must_use]
    pub fn direction_to(&self, other: &DieState) -> Option<Direction> {
        self.tile.direction_to(other.tile)
    }
}

/// Tile occupancy authority and tick-state accessors used by the systems.
pub trait BoardContext {
    /// Reports whether a move may target `tile` right now.
    fn is_tile_available(&self, tile: TileCoord) -> bool;

    /// Reserves `tile` when available, reporting whether the claim succeeded.
    fn reserve_tile(&mut self, tile: TileCoord) -> bool;

    /// Releases a reservation previously obtained through [`Self::reserve_tile`].
    fn unreserve_tile(&mut self, tile: TileCoord);

    /// State of `die` at `tick`, if recorded.
    fn die_state(&self, die: DieId, tick: Tick) -> Option<&DieState>;

    /// State of `die` at `tick`, inserting a fresh one when missing.
    fn die_state_or_insert(&mut self, die: DieId, tick: Tick) -> &mut DieState;

    /// Erases everything recorded for `tick`.
    fn clear_tick(&mut self, tick: Tick);
}

/// Tick counter and score sink driven by the board move queue.
pub trait GameClock {
    /// Tick that is currently settled.
    fn tick(&self) -> Tick;

    /// Total score credited so far.
    fn score(&self) -> u64;

    /// Advances to the next tick, publishing the resulting events.
    fn end_tick(&mut self, out: &mut Vec<Event>);

    /// Publishes continuous progress within the current tick.
    fn update_tick(&mut self, progress: f32, out: &mut Vec<Event>);
}

/// Contract violations detected by the board.
///
/// None of these occur in correct operation.
#[derive(Clone, Copy, Debug, PartialEq, Eq, thiserror::Error)]
pub enum BoardError {
    /// A state for the die already exists at the tick.
    #[error("die {die} already has a state at tick {tick}")]
    DuplicateDie {
        /// Die that was inserted twice.
        die: DieId,
        /// Tick of the duplicate insert.
        tick: Tick,
    },
    /// No state exists for the die at the tick.
    #[error("die {die} has no state at tick {tick}")]
    MissingDie {
        /// Die that was looked up.
        die: DieId,
        /// Tick of the lookup.
        tick: Tick,
    },
    /// No tick state exists for the tick.
    #[error("no state recorded for tick {tick}")]
    MissingTick {
        /// Tick that was looked up.
        tick: Tick,
    },
    /// The tile was reserved twice.
    #[error("tile {tile} is already reserved")]
    TileAlreadyReserved {
        /// Tile that was reserved.
        tile: TileCoord,
    },
    /// A reservation was released for a tile nobody reserved.
    #[error("tile {tile} is not reserved")]
    TileNotReserved {
        /// Tile that was released.
        tile: TileCoord,
    },
}
