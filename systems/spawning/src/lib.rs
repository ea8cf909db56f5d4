#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Deterministic spawning system responsible for emitting die spawn commands.

use dice_roll_core::{Command, Event, Orientation, Tick, TileCoord, MAX_FACE};
use rand::{seq::SliceRandom, Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;

/// Dice placed on the board when a game starts.
pub const DEFAULT_INITIAL_DICE: u32 = 20;
/// Ticks a newly spawned die spends rising before it can be rolled.
pub const DEFAULT_SPAWN_DURATION: u32 = 3;

/// Configuration parameters required to construct the spawning system.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Config {
    initial_dice: u32,
    spawn_duration: u32,
    rng_seed: u64,
}

impl Config {
    /// Creates a new configuration.
    ///
    /// A `spawn_duration` of zero disables periodic spawns.
    #[must_use]
    pub const fn new(initial_dice: u32, spawn_duration: u32, rng_seed: u64) -> Self {
        Self {
            initial_dice,
            spawn_duration,
            rng_seed,
        }
    }

    /// Dice placed on game start.
    #[must_use]
    pub const fn initial_dice(&self) -> u32 {
        self.initial_dice
    }

    /// Ticks between periodic spawns, also the time each spawn takes.
    #[must_use]
    pub const fn spawn_duration(&self) -> u32 {
        self.spawn_duration
    }

    /// Seed of the spawn generator.
    #[must_use]
    pub const fn rng_seed(&self) -> u64 {
        self.rng_seed
    }
}

impl Default for Config {
    fn default() -> Self {
        Self::new(DEFAULT_INITIAL_DICE, DEFAULT_SPAWN_DURATION, 0)
    }
}

/// Pure system that emits spawn commands on game start and on a fixed tick
/// cadence.
#[derive(Debug)]
pub struct Spawning {
    config: Config,
    rng: ChaCha8Rng,
}

impl Spawning {
    /// Creates a new spawning system using the supplied configuration.
    #[must_use]
    pub fn new(config: Config) -> Self {
        Self {
            config,
            rng: ChaCha8Rng::seed_from_u64(config.rng_seed),
        }
    }

    /// Consumes events and the currently available tiles to emit spawn
    /// commands.
    ///
    /// Tiles are only drawn from `available_tiles`, and the initial dice of a
    /// game never share a tile.
    pub fn handle(
        &mut self,
        events: &[Event],
        available_tiles: &[TileCoord],
        out: &mut Vec<Command>,
    ) {
        for event in events {
            match event {
                Event::GameStarted { tick } => self.spawn_initial(*tick, available_tiles, out),
                Event::TickChanged { current, .. } if self.is_spawn_tick(*current) => {
                    let ready_at = current.offset(self.config.spawn_duration);
                    if let Some(tile) = available_tiles.choose(&mut self.rng) {
                        let orientation = self.random_orientation();
                        out.push(Command::SpawnDie {
                            tile: *tile,
                            orientation,
                            ready_at,
                        });
                    }
                }
                _ => {}
            }
        }
    }

    fn spawn_initial(&mut self, tick: Tick, available_tiles: &[TileCoord], out: &mut Vec<Command>) {
        let count = usize::try_from(self.config.initial_dice).unwrap_or(usize::MAX);
        let tiles: Vec<TileCoord> = available_tiles
            .choose_multiple(&mut self.rng, count)
            .copied()
            .collect();
        for tile in tiles {
            let orientation = self.random_orientation();
            out.push(Command::SpawnDie {
                tile,
                orientation,
                ready_at: tick,
            });
        }
    }

    fn is_spawn_tick(&self, tick: Tick) -> bool {
        let duration = self.config.spawn_duration;
        duration > 0 && tick.get() >= 1 && (tick.get() - 1) % duration == 0
    }

    fn random_orientation(&mut self) -> Orientation {
        let face = self.rng.gen_range(1..=MAX_FACE);
        let quarter_turns = self.rng.gen_range(0..4);
        Orientation::with_top(face, quarter_turns).unwrap_or(Orientation::UPRIGHT)
    }
}
