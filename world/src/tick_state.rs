//! Every die state recorded for a single tick.

use std::collections::BTreeSet;

use dice_roll_core::{BoardError, DieId, DieState, Tick, TileCoord};

use crate::group::BoardDieGroup;

/// Die states at one tick plus the groups and score derived from them.
///
/// Dice that finish despawning are retired rather than dropped: they stay
/// visible to grouping for the rest of this tick so repeated updates agree,
/// but they are no longer live and are never carried into later ticks.
#[derive(Clone, Debug)]
pub struct TickState {
    tick: Tick,
    dice: Vec<DieState>,
    retired: Vec<DieId>,
    groups: Vec<BoardDieGroup>,
    score: u32,
}

impl TickState {
    /// Creates an empty state for `tick`.
    #[must_use]
    pub const fn new(tick: Tick) -> Self {
        Self {
            tick,
            dice: Vec::new(),
            retired: Vec::new(),
            groups: Vec::new(),
            score: 0,
        }
    }

    /// Tick the state describes.
    #[must_use]
    pub const fn tick(&self) -> Tick {
        self.tick
    }

    /// Adds a fresh state for `die`.
    pub fn insert(&mut self, die: DieId) -> Result<&mut DieState, BoardError> {
        if self.dice.iter().any(|state| state.id() == die) {
            return Err(BoardError::DuplicateDie {
                die,
                tick: self.tick,
            });
        }
        Ok(self.push(die))
    }

    /// State of `die`, inserting a fresh one when none is recorded.
    pub(crate) fn die_or_insert(&mut self, die: DieId) -> &mut DieState {
        match self.dice.iter().position(|state| state.id() == die) {
            Some(index) => &mut self.dice[index],
            None => self.push(die),
        }
    }

    fn push(&mut self, die: DieId) -> &mut DieState {
        self.dice.push(DieState::new(die));
        let index = self.dice.len() - 1;
        &mut self.dice[index]
    }

    fn is_live(&self, die: DieId) -> bool {
        !self.retired.contains(&die)
    }

    /// State of a live die.
    #[must_use]
    pub fn die(&self, die: DieId) -> Option<&DieState> {
        self.dice
            .iter()
            .find(|state| state.id() == die && self.is_live(die))
    }

    /// Mutable state of a live die.
    pub fn die_mut(&mut self, die: DieId) -> Option<&mut DieState> {
        if !self.is_live(die) {
            return None;
        }
        self.dice.iter_mut().find(|state| state.id() == die)
    }

    /// Whether a live state for `die` is recorded.
    #[must_use]
    pub fn contains(&self, die: DieId) -> bool {
        self.die(die).is_some()
    }

    /// Live die on `tile` that is not despawning.
    #[must_use]
    pub fn die_at(&self, tile: TileCoord) -> Option<&DieState> {
        self.dice()
            .find(|state| state.tile() == tile && !state.is_despawning(self.tick))
    }

    /// Live dice in insertion order.
    pub fn dice(&self) -> impl Iterator<Item = &DieState> + '_ {
        self.dice
            .iter()
            .filter(move |state| self.is_live(state.id()))
    }

    /// Dice that finished despawning at this tick.
    #[must_use]
    pub fn retired(&self) -> &[DieId] {
        &self.retired
    }

    /// Groups found by the last update.
    #[must_use]
    pub fn groups(&self) -> &[BoardDieGroup] {
        &self.groups
    }

    /// Points earned by groups that finished despawning at this tick.
    #[must_use]
    pub const fn score(&self) -> u32 {
        self.score
    }

    /// Copies every live die missing from `target` into it.
    pub fn fill(&self, target: &mut TickState) {
        for state in self.dice() {
            if target.dice.iter().any(|existing| existing.id() == state.id()) {
                continue;
            }
            let copy = target.push(state.id());
            state.copy_to(copy);
        }
    }

    /// Rebuilds groups, marks despawns, computes the score and retires dice
    /// whose despawn window elapsed.
    ///
    /// Running it twice on an unchanged state gives the same result.
    pub fn update(&mut self, despawn_duration: u32) {
        self.groups = build_groups(self.tick, &self.dice);
        for group in &mut self.groups {
            group.update(self.tick, despawn_duration, &mut self.dice);
        }

        self.score = self
            .groups
            .iter()
            .filter(|group| group.is_despawned())
            .map(BoardDieGroup::score)
            .fold(0, u32::saturating_add);

        let waiting: BTreeSet<DieId> = self
            .groups
            .iter()
            .filter(|group| group.is_complete() && !group.is_despawned())
            .flat_map(|group| group.members().iter().copied())
            .collect();

        let finished: Vec<DieId> = self
            .dice
            .iter()
            .filter(|state| state.is_despawned(self.tick, despawn_duration))
            .map(DieState::id)
            .filter(|die| self.is_live(*die) && !waiting.contains(die))
            .collect();
        self.retired.extend(finished);
    }

    /// Drops every die, group and score.
    pub fn clear(&mut self) {
        self.dice.clear();
        self.retired.clear();
        self.groups.clear();
        self.score = 0;
    }
}

fn is_groupable(state: &DieState, tick: Tick) -> bool {
    !state.is_spawning(tick) && state.face() > 1
}

fn build_groups(tick: Tick, dice: &[DieState]) -> Vec<BoardDieGroup> {
    let mut groups: Vec<BoardDieGroup> = Vec::new();

    for (index, a) in dice.iter().enumerate() {
        if !is_groupable(a, tick) {
            continue;
        }
        for b in &dice[index + 1..] {
            if !is_groupable(b, tick) {
                continue;
            }
            if a.face() != b.face() || !a.tile().is_adjacent(b.tile()) {
                continue;
            }

            let owner = groups
                .iter()
                .position(|group| group.contains(a.id()))
                .or_else(|| groups.iter().position(|group| group.contains(b.id())));
            let group = match owner {
                Some(position) => &mut groups[position],
                None => {
                    groups.push(BoardDieGroup::new(a.face()));
                    let last = groups.len() - 1;
                    &mut groups[last]
                }
            };
            group.add_if_absent(a.id());
            group.add_if_absent(b.id());
        }
    }

    while let Some((keep, merge)) = find_mergeable(&groups, dice) {
        let mut absorbed = groups.remove(merge);
        groups[keep].absorb(&mut absorbed);
    }

    groups
}

fn find_mergeable(groups: &[BoardDieGroup], dice: &[DieState]) -> Option<(usize, usize)> {
    for (first, a) in groups.iter().enumerate() {
        for (offset, b) in groups[first + 1..].iter().enumerate() {
            if a.face() == b.face() && a.is_connected(b, dice) {
                return Some((first, first + 1 + offset));
            }
        }
    }
    None
}
