//! Single tile-to-tile roll.

use dice_roll_core::{approximately, Direction, TileCoord};

/// One roll of a die toward an adjacent tile.
///
/// A move without a direction is pending: it exists in the queue but has not
/// claimed a target tile yet.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct DieMove {
    pub(crate) direction: Option<Direction>,
    pub(crate) target: TileCoord,
    pub(crate) progress: f32,
    pub(crate) roll_speed: f32,
    pub(crate) is_finished: bool,
    pub(crate) is_user: bool,
    pub(crate) is_reserved: bool,
}

impl DieMove {
    pub(crate) fn new(roll_speed: f32, is_user: bool) -> Self {
        Self {
            roll_speed,
            is_user,
            ..Self::default()
        }
    }

    /// Direction of travel, `None` while pending.
    #[must_use]
    pub const fn direction(&self) -> Option<Direction> {
        self.direction
    }

    /// Tile the move rolls onto.
    #[must_use]
    pub const fn target(&self) -> TileCoord {
        self.target
    }

    /// Progress toward the target in `[0, 1]`.
    #[must_use]
    pub const fn progress(&self) -> f32 {
        self.progress
    }

    /// Progress gained per second of board time.
    #[must_use]
    pub const fn roll_speed(&self) -> f32 {
        self.roll_speed
    }

    /// Whether the move settled on a boundary.
    #[must_use]
    pub const fn is_finished(&self) -> bool {
        self.is_finished
    }

    /// Whether a player gesture created the move.
    #[must_use]
    pub const fn is_user(&self) -> bool {
        self.is_user
    }

    /// Whether the move still holds a reservation on its target.
    #[must_use]
    pub const fn is_reserved(&self) -> bool {
        self.is_reserved
    }

    /// Whether a direction and target were assigned.
    #[must_use]
    pub const fn is_initialized(&self) -> bool {
        self.direction.is_some()
    }

    /// Whether the move settled back on its start tile.
    #[must_use]
    pub fn is_cancelled(&self) -> bool {
        self.is_finished && approximately(self.progress, 0.0)
    }

    /// Whether the move settled on its target tile.
    #[must_use]
    pub fn is_committed(&self) -> bool {
        self.is_finished && approximately(self.progress, 1.0)
    }

    /// Whether progress lies within `limit` of either end.
    ///
    /// `limit` is expected to be below one half.
    #[must_use]
    pub fn is_nearer_to_finishing(&self, limit: f32) -> bool {
        self.progress < limit || self.progress > 1.0 - limit
    }
}
