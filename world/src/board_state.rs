//! Sliding window of tick states.

use std::collections::BTreeMap;

use dice_roll_core::{BoardError, DieId, DieState, Tick, TileCoord};

use crate::tick_state::TickState;

/// Number of settled ticks kept behind the current one.
pub const DEFAULT_UNDO_TICKS: u32 = 3;

/// Outcome of moving the board to a new tick.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct TickChange {
    /// Points earned by groups that finished despawning at the new tick.
    pub score: u32,
    /// Dice retired at the new tick.
    pub despawned: Vec<DieId>,
    /// Ticks dropped from the history window.
    pub pruned: Vec<Tick>,
}

/// Tick states keyed by tick, bounded to `[current - undo_ticks, current + 1]`
/// after every tick change.
#[derive(Clone, Debug)]
pub struct BoardState {
    ticks: BTreeMap<Tick, TickState>,
    undo_ticks: u32,
    despawn_duration: u32,
}

impl BoardState {
    /// Creates an empty history.
    #[must_use]
    pub const fn new(undo_ticks: u32, despawn_duration: u32) -> Self {
        Self {
            ticks: BTreeMap::new(),
            undo_ticks,
            despawn_duration,
        }
    }

    /// Number of settled ticks kept behind the current one.
    #[must_use]
    pub const fn undo_ticks(&self) -> u32 {
        self.undo_ticks
    }

    /// Ticks currently held, in ascending order.
    pub fn ticks(&self) -> impl Iterator<Item = Tick> + '_ {
        self.ticks.keys().copied()
    }

    /// State recorded for `tick`.
    #[must_use]
    pub fn tick_state(&self, tick: Tick) -> Option<&TickState> {
        self.ticks.get(&tick)
    }

    /// State recorded for `tick`, created empty when missing.
    pub fn tick_state_or_insert(&mut self, tick: Tick) -> &mut TickState {
        self.ticks
            .entry(tick)
            .or_insert_with(|| TickState::new(tick))
    }

    /// State of `die` at `tick`.
    pub fn die_state(&self, die: DieId, tick: Tick) -> Result<&DieState, BoardError> {
        self.ticks
            .get(&tick)
            .ok_or(BoardError::MissingTick { tick })?
            .die(die)
            .ok_or(BoardError::MissingDie { die, tick })
    }

    /// Adds a fresh state for `die` at `tick`, creating the tick if needed.
    pub fn insert_die_state(
        &mut self,
        die: DieId,
        tick: Tick,
    ) -> Result<&mut DieState, BoardError> {
        self.tick_state_or_insert(tick).insert(die)
    }

    /// Whether a live state for `die` exists at `tick`.
    #[must_use]
    pub fn contains_die(&self, die: DieId, tick: Tick) -> bool {
        self.die_state(die, tick).is_ok()
    }

    /// Whether a die that is not despawning sits on `tile` at `tick`.
    #[must_use]
    pub fn is_tile_occupied(&self, tile: TileCoord, tick: Tick) -> bool {
        self.ticks
            .get(&tick)
            .is_some_and(|state| state.die_at(tile).is_some())
    }

    /// Settles the board on `current`.
    ///
    /// A single forward step seeds `current` with every die it lacks from
    /// `previous`, then seeds `current + 1` from the updated state. Ticks
    /// outside the history window are dropped afterwards.
    pub fn change_tick(&mut self, previous: Tick, current: Tick) -> TickChange {
        let is_forward_step = current == previous.next() && current != previous;

        let mut current_state = self
            .ticks
            .remove(&current)
            .unwrap_or_else(|| TickState::new(current));

        if is_forward_step {
            if let Some(previous_state) = self.ticks.get(&previous) {
                previous_state.fill(&mut current_state);
            }
        }

        let retired_before = current_state.retired().len();
        current_state.update(self.despawn_duration);
        let despawned = current_state.retired()[retired_before..].to_vec();
        let score = current_state.score();

        if is_forward_step {
            let next_state = self.tick_state_or_insert(current.next());
            current_state.fill(next_state);
        }
        let _ = self.ticks.insert(current, current_state);
        self.carry_despawn_ticks(current);

        let pruned = self.prune(current);
        if !pruned.is_empty() {
            tracing::trace!(?pruned, %current, "pruned tick history");
        }

        TickChange {
            score,
            despawned,
            pruned,
        }
    }

    /// Recomputes groups for `tick` without crediting anything.
    ///
    /// Despawn ticks set by the update are copied into the states already
    /// staged for `tick + 1`.
    pub fn update_tick(&mut self, tick: Tick) {
        let despawn_duration = self.despawn_duration;
        self.tick_state_or_insert(tick).update(despawn_duration);
        self.carry_despawn_ticks(tick);
    }

    /// Makes sure `tick + 1` exists, seeding it from `tick` when it was missing.
    pub fn ensure_next(&mut self, tick: Tick) {
        if !self.ticks.contains_key(&tick.next()) {
            self.fill_tick(tick, tick.next());
        }
    }

    /// Copies every live die of `source` missing from `target` into it,
    /// creating `target` when needed.
    pub fn fill_tick(&mut self, source: Tick, target: Tick) {
        let mut target_state = self
            .ticks
            .remove(&target)
            .unwrap_or_else(|| TickState::new(target));
        if let Some(source_state) = self.ticks.get(&source) {
            source_state.fill(&mut target_state);
        }
        let _ = self.ticks.insert(target, target_state);
    }

    /// Erases everything recorded at `tick`.
    pub fn clear_tick(&mut self, tick: Tick) {
        if let Some(state) = self.ticks.get_mut(&tick) {
            state.clear();
        }
    }

    /// Drops every tick.
    pub fn reset(&mut self) {
        self.ticks.clear();
    }

    fn carry_despawn_ticks(&mut self, tick: Tick) {
        let Some(state) = self.ticks.get(&tick) else {
            return;
        };
        let marked: Vec<(DieId, Tick)> = state
            .dice()
            .filter_map(|die| die.despawn_tick().map(|despawn| (die.id(), despawn)))
            .collect();
        let Some(next_state) = self.ticks.get_mut(&tick.next()) else {
            return;
        };
        for (die, despawn) in marked {
            if let Some(staged) = next_state.die_mut(die) {
                if staged.despawn_tick().is_none() {
                    staged.set_despawn_tick(Some(despawn));
                }
            }
        }
    }

    fn prune(&mut self, current: Tick) -> Vec<Tick> {
        let oldest = current.saturating_sub(self.undo_ticks);
        let newest = current.next();
        let pruned: Vec<Tick> = self
            .ticks
            .keys()
            .copied()
            .filter(|tick| *tick < oldest || *tick > newest)
            .collect();
        for tick in &pruned {
            let _ = self.ticks.remove(tick);
        }
        pruned
    }
}

impl Default for BoardState {
    fn default() -> Self {
        Self::new(DEFAULT_UNDO_TICKS, crate::DEFAULT_DESPAWN_DURATION)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use dice_roll_core::Orientation;

    #[test]
    fn missing_lookups_name_what_is_missing() {
        let mut board = BoardState::default();
        assert_eq!(
            board.die_state(DieId::new(0), Tick::new(4)),
            Err(BoardError::MissingTick { tick: Tick::new(4) })
        );
        let _ = board.tick_state_or_insert(Tick::new(4));
        assert_eq!(
            board.die_state(DieId::new(0), Tick::new(4)),
            Err(BoardError::MissingDie {
                die: DieId::new(0),
                tick: Tick::new(4)
            })
        );
    }

    #[test]
    fn forward_step_carries_dice_and_seeds_next_tick() {
        let mut board = BoardState::default();
        let die = DieId::new(3);
        board
            .insert_die_state(die, Tick::ZERO)
            .expect("fresh die")
            .set_tile(TileCoord::new(1, 1));

        let change = board.change_tick(Tick::ZERO, Tick::new(1));
        assert_eq!(change, TickChange::default());
        assert!(board.contains_die(die, Tick::new(1)));
        assert!(board.contains_die(die, Tick::new(2)));
        assert!(board.is_tile_occupied(TileCoord::new(1, 1), Tick::new(2)));
    }

    #[test]
    fn moved_die_is_not_overwritten_by_fill() {
        let mut board = BoardState::default();
        let die = DieId::new(0);
        let _ = board.insert_die_state(die, Tick::ZERO).expect("fresh die");
        let moved = board.insert_die_state(die, Tick::new(1)).expect("fresh die");
        moved.set_orientation(Orientation::UPRIGHT.rolled(dice_roll_core::Direction::East));
        moved.set_tile(TileCoord::new(1, 0));

        let _ = board.change_tick(Tick::ZERO, Tick::new(1));
        let state = board.die_state(die, Tick::new(1)).expect("carried");
        assert_eq!(state.tile(), TileCoord::new(1, 0));
        assert_eq!(state.face(), 4);
    }

    #[test]
    fn despawn_tick_reaches_staged_next_tick() {
        let mut board = BoardState::default();
        for (id, x) in [(0, 0), (1, 1)] {
            let state = board
                .insert_die_state(DieId::new(id), Tick::ZERO)
                .expect("fresh die");
            state.set_tile(TileCoord::new(x, 0));
            state.set_orientation(Orientation::with_top(2, 0).expect("valid face"));
        }
        board.ensure_next(Tick::ZERO);

        board.update_tick(Tick::ZERO);
        let staged = board.die_state(DieId::new(1), Tick::new(1)).expect("staged");
        assert_eq!(staged.despawn_tick(), Some(Tick::ZERO));

        let _ = board.change_tick(Tick::ZERO, Tick::new(1));
        for id in [0, 1] {
            let carried = board.die_state(DieId::new(id), Tick::new(1)).expect("carried");
            assert_eq!(carried.despawn_tick(), Some(Tick::ZERO));
        }
    }

    #[test]
    fn ensure_next_does_not_replace_existing_state() {
        let mut board = BoardState::default();
        let _ = board.insert_die_state(DieId::new(0), Tick::ZERO).expect("fresh die");
        board.ensure_next(Tick::ZERO);
        assert!(board.contains_die(DieId::new(0), Tick::new(1)));

        board.clear_tick(Tick::new(1));
        board.ensure_next(Tick::ZERO);
        assert!(!board.contains_die(DieId::new(0), Tick::new(1)));
    }
}
