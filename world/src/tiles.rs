//! Static board geometry and the in-flight reservation set.

use std::collections::BTreeSet;

use dice_roll_core::{BoardError, TileCoord};

/// Boundary ring of the standard board. Every playable tile is enclosed by it
/// against single-tile steps.
const STANDARD_INVALID_TILES: [(i32, i32); 34] = [
    (-2, 6),
    (-1, 5),
    (0, 4),
    (1, 3),
    (2, 2),
    (3, 1),
    (4, 0),
    (5, -1),
    (6, -2),
    (7, -3),
    (6, -4),
    (5, -5),
    (4, -6),
    (3, -7),
    (2, -6),
    (1, -5),
    (0, -4),
    (-1, -3),
    (-2, -2),
    (-3, -1),
    (-4, 0),
    (-5, 1),
    (-6, 2),
    (-7, 4),
    (-7, 3),
    (-6, 3),
    (-6, 4),
    (-6, 5),
    (-5, 5),
    (-5, 6),
    (-4, 6),
    (-3, 6),
    (-3, 7),
    (-4, 7),
];

/// Playable rows of the standard board as `(row, first column, last column)`.
const STANDARD_ROWS: [(i32, i32, i32); 12] = [
    (5, -4, -2),
    (4, -5, -1),
    (3, -5, 0),
    (2, -5, 1),
    (1, -4, 2),
    (0, -3, 3),
    (-1, -2, 4),
    (-2, -1, 5),
    (-3, 0, 6),
    (-4, 1, 5),
    (-5, 2, 4),
    (-6, 3, 3),
];

/// Tile geometry of a board: the tiles dice may never enter and the tiles
/// dice may spawn on.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct BoardLayout {
    invalid: BTreeSet<TileCoord>,
    playable: Vec<TileCoord>,
}

impl BoardLayout {
    /// Creates a layout from explicit tile lists.
    ///
    /// Playable tiles that also appear in the invalid set are dropped.
    #[must_use]
    pub fn new(
        invalid: impl IntoIterator<Item = TileCoord>,
        playable: impl IntoIterator<Item = TileCoord>,
    ) -> Self {
        let invalid: BTreeSet<TileCoord> = invalid.into_iter().collect();
        let mut playable: Vec<TileCoord> = playable
            .into_iter()
            .filter(|tile| !invalid.contains(tile))
            .collect();
        playable.sort_unstable();
        playable.dedup();
        Self { invalid, playable }
    }

    /// The 65-tile board enclosed by its 34-tile boundary ring.
    #[must_use]
    pub fn standard() -> Self {
        let invalid = STANDARD_INVALID_TILES
            .iter()
            .map(|&(x, y)| TileCoord::new(x, y));
        let playable = STANDARD_ROWS.iter().flat_map(|&(y, first, last)| {
            (first..=last).map(move |x| TileCoord::new(x, y))
        });
        Self::new(invalid, playable)
    }

    /// Reports whether `tile` belongs to the static boundary.
    #[must_use]
    pub fn is_invalid(&self, tile: TileCoord) -> bool {
        self.invalid.contains(&tile)
    }

    /// Tiles that make up the static boundary, in ascending order.
    pub fn invalid_tiles(&self) -> impl Iterator<Item = TileCoord> + '_ {
        self.invalid.iter().copied()
    }

    /// Tiles dice may spawn on, in ascending order.
    #[must_use]
    pub fn playable_tiles(&self) -> &[TileCoord] {
        &self.playable
    }
}

impl Default for BoardLayout {
    fn default() -> Self {
        Self::standard()
    }
}

/// Tiles claimed by in-flight moves.
#[derive(Clone, Debug, Default)]
pub(crate) struct ReservedTiles {
    tiles: BTreeSet<TileCoord>,
}

impl ReservedTiles {
    pub(crate) fn contains(&self, tile: TileCoord) -> bool {
        self.tiles.contains(&tile)
    }

    pub(crate) fn insert(&mut self, tile: TileCoord) -> Result<(), BoardError> {
        if self.tiles.insert(tile) {
            Ok(())
        } else {
            Err(BoardError::TileAlreadyReserved { tile })
        }
    }

    pub(crate) fn remove(&mut self, tile: TileCoord) -> Result<(), BoardError> {
        if self.tiles.remove(&tile) {
            Ok(())
        } else {
            Err(BoardError::TileNotReserved { tile })
        }
    }

    pub(crate) fn iter(&self) -> impl Iterator<Item = TileCoord> + '_ {
        self.tiles.iter().copied()
    }

    pub(crate) fn clear(&mut self) {
        self.tiles.clear();
    }
}
