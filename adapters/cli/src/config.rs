//! TOML session configuration.

use std::{fs, path::Path};

use anyhow::Context;
use dice_roll_core::TileCoord;
use dice_roll_system_spawning as spawning;
use dice_roll_world::{BoardConfig, BoardLayout, DEFAULT_DESPAWN_DURATION, DEFAULT_UNDO_TICKS};
use serde::Deserialize;

/// Complete configuration of a headless session.
///
/// Every table and key is optional; missing values fall back to defaults.
#[derive(Clone, Debug, Default, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct FileConfig {
    /// Frame loop settings.
    pub session: SessionSettings,
    /// Board timing and geometry.
    pub board: BoardSettings,
    /// Spawner settings.
    pub spawning: SpawningSettings,
}

/// `[session]` table.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct SessionSettings {
    /// Seed shared by the spawner and the autoplayer.
    pub seed: u64,
    /// Number of frames to simulate.
    pub frames: u32,
    /// Simulated frame length in milliseconds.
    pub frame_ms: u32,
}

impl Default for SessionSettings {
    fn default() -> Self {
        Self {
            seed: 0,
            frames: 600,
            frame_ms: 16,
        }
    }
}

/// `[board]` table.
#[derive(Clone, Debug, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct BoardSettings {
    /// Ticks a group takes to despawn.
    pub despawn_duration: u32,
    /// Settled ticks kept behind the current one.
    pub undo_ticks: u32,
    /// Replaces the standard boundary tiles when present.
    pub invalid_tiles: Option<Vec<TileCoord>>,
    /// Replaces the standard spawn tiles when present.
    pub playable_tiles: Option<Vec<TileCoord>>,
}

impl Default for BoardSettings {
    fn default() -> Self {
        Self {
            despawn_duration: DEFAULT_DESPAWN_DURATION,
            undo_ticks: DEFAULT_UNDO_TICKS,
            invalid_tiles: None,
            playable_tiles: None,
        }
    }
}

impl BoardSettings {
    /// Timing configuration handed to the board.
    #[must_use]
    pub const fn board_config(&self) -> BoardConfig {
        BoardConfig::new(self.despawn_duration, self.undo_ticks)
    }

    /// Standard layout with any configured tile lists swapped in.
    #[must_use]
    pub fn layout(&self) -> BoardLayout {
        let standard = BoardLayout::standard();
        let invalid = self
            .invalid_tiles
            .clone()
            .unwrap_or_else(|| standard.invalid_tiles().collect());
        let playable = self
            .playable_tiles
            .clone()
            .unwrap_or_else(|| standard.playable_tiles().to_vec());
        BoardLayout::new(invalid, playable)
    }
}

/// `[spawning]` table.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct SpawningSettings {
    /// Dice placed when the game starts.
    pub initial_dice: u32,
    /// Ticks between periodic spawns.
    pub spawn_duration: u32,
}

impl Default for SpawningSettings {
    fn default() -> Self {
        let defaults = spawning::Config::default();
        Self {
            initial_dice: defaults.initial_dice(),
            spawn_duration: defaults.spawn_duration(),
        }
    }
}

impl SpawningSettings {
    /// Spawner configuration seeded with `seed`.
    #[must_use]
    pub const fn config(&self, seed: u64) -> spawning::Config {
        spawning::Config::new(self.initial_dice, self.spawn_duration, seed)
    }
}

impl FileConfig {
    /// Parses a configuration document.
    pub fn parse(contents: &str) -> anyhow::Result<Self> {
        toml::from_str(contents).context("invalid session configuration")
    }

    /// Reads the configuration at `path`, or the defaults when no path is
    /// given.
    pub fn load(path: Option<&Path>) -> anyhow::Result<Self> {
        let Some(path) = path else {
            return Ok(Self::default());
        };
        let contents = fs::read_to_string(path)
            .with_context(|| format!("failed to read config file {}", path.display()))?;
        Self::parse(&contents).with_context(|| format!("failed to load {}", path.display()))
    }
}
