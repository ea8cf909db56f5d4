//! Connected clusters of same-face dice.

use dice_roll_core::{DieId, DieState, Tick};

/// Dice sharing one face that touch each other directly or through other
/// members. Groups are rebuilt from scratch on every tick update.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct BoardDieGroup {
    face: u8,
    members: Vec<DieId>,
    score: u32,
    is_despawned: bool,
}

impl BoardDieGroup {
    /// Creates an empty group for dice showing `face`.
    #[must_use]
    pub const fn new(face: u8) -> Self {
        Self {
            face,
            members: Vec::new(),
            score: 0,
            is_despawned: false,
        }
    }

    /// Face shared by every member.
    #[must_use]
    pub const fn face(&self) -> u8 {
        self.face
    }

    /// Members in the order they joined.
    #[must_use]
    pub fn members(&self) -> &[DieId] {
        &self.members
    }

    /// Number of members.
    #[must_use]
    pub fn len(&self) -> usize {
        self.members.len()
    }

    /// Whether the group has no members.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.members.is_empty()
    }

    /// Whether `die` belongs to the group.
    #[must_use]
    pub fn contains(&self, die: DieId) -> bool {
        self.members.contains(&die)
    }

    /// Adds `die` unless it is already a member.
    pub fn add_if_absent(&mut self, die: DieId) {
        if !self.contains(die) {
            self.members.push(die);
        }
    }

    /// Moves every member of `other` into this group, leaving `other` empty.
    pub fn absorb(&mut self, other: &mut BoardDieGroup) {
        for die in other.members.drain(..) {
            self.add_if_absent(die);
        }
    }

    /// Whether the two groups share a member or have adjacent members.
    ///
    /// Tiles are looked up in `dice`; members missing from it never connect.
    #[must_use]
    pub fn is_connected(&self, other: &BoardDieGroup, dice: &[DieState]) -> bool {
        self.members.iter().any(|die| {
            other.contains(*die) || {
                let Some(tile) = tile_of(dice, *die) else {
                    return false;
                };
                other
                    .members
                    .iter()
                    .filter_map(|other_die| tile_of(dice, *other_die))
                    .any(|other_tile| tile.is_adjacent(other_tile))
            }
        })
    }

    /// Marks a large enough group as despawning and recomputes its score.
    ///
    /// Members without a despawn tick receive `tick`; existing despawn ticks
    /// are kept. The group counts as despawned once every member finished its
    /// despawn window.
    pub fn update(&mut self, tick: Tick, despawn_duration: u32, dice: &mut [DieState]) {
        self.score = 0;
        self.is_despawned = false;

        if !self.is_complete() {
            return;
        }

        for die in dice.iter_mut().filter(|die| self.contains(die.id())) {
            if die.despawn_tick().is_none() {
                die.set_despawn_tick(Some(tick));
            }
        }

        let len = u32::try_from(self.members.len()).unwrap_or(u32::MAX);
        self.score = u32::from(self.face).saturating_mul(len);
        self.is_despawned = self.members.iter().all(|member| {
            dice.iter()
                .find(|die| die.id() == *member)
                .is_some_and(|die| die.is_despawned(tick, despawn_duration))
        });
    }

    /// Whether the group holds at least as many dice as its face shows.
    #[must_use]
    pub fn is_complete(&self) -> bool {
        self.face > 1 && self.members.len() >= usize::from(self.face)
    }

    /// Points the group is worth once it has despawned.
    #[must_use]
    pub const fn score(&self) -> u32 {
        self.score
    }

    /// Whether every member finished despawning.
    #[must_use]
    pub const fn is_despawned(&self) -> bool {
        self.is_despawned
    }
}

fn tile_of(dice: &[DieState], die: DieId) -> Option<dice_roll_core::TileCoord> {
    dice.iter()
        .find(|state| state.id() == die)
        .map(DieState::tile)
}
