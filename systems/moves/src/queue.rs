//! Per-die FIFO of rolls.

use std::collections::VecDeque;

use dice_roll_core::{approximately, BoardContext, DieId, Direction, TileCoord};
use tracing::trace;

use crate::{
    arena::{Arena, Handle},
    die_move::DieMove,
};

/// Ordered rolls queued for one die.
///
/// Only the newest move can be unfinished: a new move is appended once the
/// previous one settled on a boundary. `current_tile` is where the die stands
/// after every committed move.
#[derive(Clone, Debug)]
pub struct DieMoveQueue {
    die: DieId,
    moves: VecDeque<Handle>,
    pool: Arena<DieMove>,
    current_tile: TileCoord,
}

impl DieMoveQueue {
    /// Creates an empty queue for `die`.
    #[must_use]
    pub fn new(die: DieId) -> Self {
        Self {
            die,
            moves: VecDeque::new(),
            pool: Arena::new(),
            current_tile: TileCoord::default(),
        }
    }

    /// Hands an empty queue over to another die, keeping its pooled moves.
    pub(crate) fn recycle(&mut self, die: DieId) {
        debug_assert!(self.is_empty(), "recycled queue still holds moves");
        self.die = die;
        self.current_tile = TileCoord::default();
    }

    /// Die the queue belongs to.
    #[must_use]
    pub const fn die(&self) -> DieId {
        self.die
    }

    /// Tile the die stands on after every committed move.
    #[must_use]
    pub const fn current_tile(&self) -> TileCoord {
        self.current_tile
    }

    /// Whether no moves are queued.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.moves.is_empty()
    }

    /// Number of queued moves.
    #[must_use]
    pub fn len(&self) -> usize {
        self.moves.len()
    }

    /// Queued moves, oldest first.
    pub fn moves(&self) -> impl Iterator<Item = &DieMove> + '_ {
        self.moves.iter().filter_map(|handle| self.pool.get(*handle))
    }

    /// Move behind `handle`, if it is still queued.
    #[must_use]
    pub fn get(&self, handle: Handle) -> Option<&DieMove> {
        self.pool.get(handle)
    }

    /// Handle of the oldest move.
    #[must_use]
    pub fn oldest_handle(&self) -> Option<Handle> {
        self.moves.front().copied()
    }

    /// Handle of the newest move.
    #[must_use]
    pub fn latest_handle(&self) -> Option<Handle> {
        self.moves.back().copied()
    }

    /// Oldest move, the one the board is animating.
    #[must_use]
    pub fn oldest(&self) -> Option<&DieMove> {
        self.pool.get(self.oldest_handle()?)
    }

    /// Newest move, the one drag input feeds.
    #[must_use]
    pub fn latest(&self) -> Option<&DieMove> {
        self.pool.get(self.latest_handle()?)
    }

    /// Tile one step from the current tile.
    #[must_use]
    pub fn adjacent_tile(&self, direction: Direction) -> TileCoord {
        self.current_tile.step(direction)
    }

    /// Tile the die will stand on if the newest move is rounded to a boundary.
    #[must_use]
    pub fn settled_tile_after_rounding(&self) -> TileCoord {
        match self.latest() {
            Some(latest)
                if latest.is_initialized() && !latest.is_finished && latest.progress >= 0.5 =>
            {
                latest.target
            }
            _ => self.current_tile,
        }
    }

    /// Newest move when it is unfinished, otherwise a fresh pending move
    /// appended to the queue.
    pub fn latest_or_new(&mut self, roll_speed: f32, is_user: bool) -> Handle {
        if let Some(handle) = self.latest_handle() {
            if self.pool.get(handle).is_some_and(|latest| !latest.is_finished) {
                return handle;
            }
        }
        let handle = self.pool.insert(DieMove::new(roll_speed, is_user));
        self.moves.push_back(handle);
        handle
    }

    /// Assigns the first direction whose target tile can be reserved.
    ///
    /// Returns `false` when no candidate tile is available; the move then
    /// stays pending and the caller is expected to discard it.
    pub fn initialize_move<B>(
        &mut self,
        board: &mut B,
        handle: Handle,
        directions: &[Direction],
    ) -> bool
    where
        B: BoardContext + ?Sized,
    {
        match self.pool.get(handle) {
            None => return false,
            Some(pending) if pending.is_initialized() => return true,
            Some(_) => {}
        }

        for direction in directions {
            let target = self.adjacent_tile(*direction);
            if !board.reserve_tile(target) {
                continue;
            }
            if let Some(pending) = self.pool.get_mut(handle) {
                pending.direction = Some(*direction);
                pending.target = target;
                pending.is_reserved = true;
            }
            return true;
        }
        false
    }

    /// Feeds `delta` progress into the newest move.
    ///
    /// Reaching 1 commits the move and chains a new one in the same direction
    /// with the leftover. Reaching 0 cancels the move and chains one in the
    /// opposite direction with the leftover flipped. When a chained move
    /// cannot reserve its target the leftover is dropped and the pending move
    /// stays at the tail. A pending newest move absorbs nothing.
    pub fn add_progress<B>(
        &mut self,
        board: &mut B,
        delta: f32,
        roll_speed: f32,
        is_user: bool,
    ) -> Handle
    where
        B: BoardContext + ?Sized,
    {
        let mut remaining = delta;
        let mut handle = self.latest_or_new(roll_speed, is_user);

        while !approximately(remaining, 0.0) {
            let Some(active) = self.pool.get_mut(handle) else {
                break;
            };
            let Some(direction) = active.direction else {
                break;
            };

            let step = if remaining > 0.0 {
                remaining.min(1.0 - active.progress)
            } else {
                remaining.max(-active.progress)
            };
            remaining -= step;
            active.progress = (active.progress + step).clamp(0.0, 1.0);

            let next_direction = if approximately(active.progress, 0.0) {
                active.progress = 0.0;
                active.is_finished = true;
                remaining = -remaining;
                direction.reversed()
            } else if approximately(active.progress, 1.0) {
                active.progress = 1.0;
                active.is_finished = true;
                self.current_tile = active.target;
                direction
            } else {
                continue;
            };

            if approximately(remaining, 0.0) {
                break;
            }

            trace!(die = %self.die, ?next_direction, remaining, "chaining roll");
            handle = self.latest_or_new(roll_speed, is_user);
            if !self.initialize_move(board, handle, &[next_direction]) {
                break;
            }
        }

        handle
    }

    /// Settles the newest move on a boundary.
    ///
    /// Progress snaps to 1 when `always_round_up` is set, otherwise to the
    /// nearer end with exact halves going up. A move rounded back to 0 gives
    /// up its reservation. A pending newest move is discarded instead.
    pub fn round_latest_progress<B>(
        &mut self,
        board: &mut B,
        roll_speed: f32,
        is_user: bool,
        always_round_up: bool,
    ) -> Option<Handle>
    where
        B: BoardContext + ?Sized,
    {
        let handle = self.latest_handle()?;
        let latest = self.pool.get_mut(handle)?;

        if !latest.is_initialized() {
            self.remove_move(board, handle);
            return None;
        }

        latest.roll_speed = roll_speed;
        latest.is_user = is_user;
        latest.is_finished = true;
        latest.progress = if always_round_up || latest.progress >= 0.5 {
            1.0
        } else {
            0.0
        };

        if latest.progress > 0.5 {
            self.current_tile = latest.target;
        } else if latest.is_reserved {
            latest.is_reserved = false;
            board.unreserve_tile(latest.target);
        }

        Some(handle)
    }

    /// Drops one move and releases its reservation.
    pub fn remove_move<B>(&mut self, board: &mut B, handle: Handle)
    where
        B: BoardContext + ?Sized,
    {
        if let Some(position) = self.moves.iter().position(|queued| *queued == handle) {
            let _ = self.moves.remove(position);
        }
        if let Some(removed) = self.pool.remove(handle) {
            release(board, &removed);
        }
    }

    /// Drops the oldest move and releases its reservation.
    pub fn remove_oldest<B>(&mut self, board: &mut B) -> Option<DieMove>
    where
        B: BoardContext + ?Sized,
    {
        let handle = self.moves.pop_front()?;
        let removed = self.pool.remove(handle)?;
        release(board, &removed);
        Some(removed)
    }

    /// Drops every move.
    pub fn clear_all<B>(&mut self, board: &mut B)
    where
        B: BoardContext + ?Sized,
    {
        while self.remove_oldest(board).is_some() {}
        self.moves.clear();
    }

    /// Drops every move except the oldest, which the board may already be
    /// animating.
    ///
    /// The current tile becomes the oldest move's target when that move is
    /// committed, otherwise `current_tile`.
    pub fn clear_all_except_oldest<B>(
        &mut self,
        board: &mut B,
        current_tile: TileCoord,
    ) -> Option<Handle>
    where
        B: BoardContext + ?Sized,
    {
        while self.moves.len() > 1 {
            if let Some(handle) = self.latest_handle() {
                self.remove_move(board, handle);
            }
        }

        self.current_tile = match self.oldest() {
            Some(oldest) if oldest.is_committed() => oldest.target,
            _ => current_tile,
        };
        self.oldest_handle()
    }
}

fn release<B>(board: &mut B, removed: &DieMove)
where
    B: BoardContext + ?Sized,
{
    if removed.is_reserved {
        board.unreserve_tile(removed.target);
    }
}

#[cfg(test)]
mod tests {
    use std::collections::BTreeSet;

    use dice_roll_core::{DieState, Tick};

    use super::*;

    #[derive(Default)]
    struct OpenBoard {
        blocked: BTreeSet<TileCoord>,
        reserved: BTreeSet<TileCoord>,
        state: Option<DieState>,
    }

    impl BoardContext for OpenBoard {
        fn is_tile_available(&self, tile: TileCoord) -> bool {
            !self.blocked.contains(&tile) && !self.reserved.contains(&tile)
        }

        fn reserve_tile(&mut self, tile: TileCoord) -> bool {
            self.is_tile_available(tile) && self.reserved.insert(tile)
        }

        fn unreserve_tile(&mut self, tile: TileCoord) {
            assert!(self.reserved.remove(&tile), "{tile} was not reserved");
        }

        fn die_state(&self, _die: DieId, _tick: Tick) -> Option<&DieState> {
            self.state.as_ref()
        }

        fn die_state_or_insert(&mut self, die: DieId, _tick: Tick) -> &mut DieState {
            self.state.get_or_insert_with(|| DieState::new(die))
        }

        fn clear_tick(&mut self, _tick: Tick) {
            self.state = None;
        }
    }

    fn queue_heading_east(board: &mut OpenBoard) -> DieMoveQueue {
        let mut queue = DieMoveQueue::new(DieId::new(0));
        let handle = queue.latest_or_new(8.0, true);
        assert!(queue.initialize_move(board, handle, &[Direction::East]));
        queue
    }

    fn fractional_moves(queue: &DieMoveQueue) -> usize {
        queue
            .moves()
            .filter(|queued| queued.progress > 0.0 && queued.progress < 1.0)
            .count()
    }

    #[test]
    fn overflow_commits_and_chains_same_direction() {
        let mut board = OpenBoard::default();
        let mut queue = queue_heading_east(&mut board);

        let _ = queue.add_progress(&mut board, 1.5, 8.0, true);

        let moves: Vec<&DieMove> = queue.moves().collect();
        assert_eq!(moves.len(), 2);
        assert!(moves[0].is_committed());
        assert_eq!(moves[1].target, TileCoord::new(2, 0));
        assert!(approximately(moves[1].progress, 0.5));
        assert_eq!(queue.current_tile(), TileCoord::new(1, 0));
        assert_eq!(fractional_moves(&queue), 1);
    }

    #[test]
    fn exact_overflow_lands_two_tiles_away() {
        let mut board = OpenBoard::default();
        let mut queue = queue_heading_east(&mut board);

        let _ = queue.add_progress(&mut board, 2.0, 8.0, true);

        assert_eq!(queue.len(), 2);
        assert!(queue.moves().all(DieMove::is_committed));
        assert_eq!(queue.current_tile(), TileCoord::new(2, 0));
        assert_eq!(fractional_moves(&queue), 0);
    }

    #[test]
    fn underflow_reverses_with_leftover() {
        let mut board = OpenBoard::default();
        let mut queue = queue_heading_east(&mut board);

        let _ = queue.add_progress(&mut board, 0.25, 8.0, true);
        let _ = queue.add_progress(&mut board, -0.5, 8.0, true);

        let moves: Vec<&DieMove> = queue.moves().collect();
        assert_eq!(moves.len(), 2);
        assert!(moves[0].is_cancelled());
        assert_eq!(moves[1].direction, Some(Direction::West));
        assert_eq!(moves[1].target, TileCoord::new(-1, 0));
        assert!(approximately(moves[1].progress, 0.25));
        assert_eq!(queue.current_tile(), TileCoord::new(0, 0));
    }

    #[test]
    fn blocked_chain_absorbs_leftover() {
        let mut board = OpenBoard::default();
        let _ = board.blocked.insert(TileCoord::new(2, 0));
        let mut queue = queue_heading_east(&mut board);

        let _ = queue.add_progress(&mut board, 1.7, 8.0, true);

        assert_eq!(queue.len(), 2);
        assert!(queue.oldest().is_some_and(DieMove::is_committed));
        assert!(queue.latest().is_some_and(|latest| !latest.is_initialized()));
        assert_eq!(queue.current_tile(), TileCoord::new(1, 0));
    }

    #[test]
    fn pending_move_absorbs_nothing() {
        let mut board = OpenBoard::default();
        let mut queue = DieMoveQueue::new(DieId::new(0));
        let _ = queue.add_progress(&mut board, 0.4, 8.0, true);
        assert_eq!(queue.len(), 1);
        assert!(queue.latest().is_some_and(|latest| latest.progress == 0.0));
    }

    #[test]
    fn initialize_uses_first_reservable_direction() {
        let mut board = OpenBoard::default();
        let _ = board.blocked.insert(TileCoord::new(0, 1));
        let mut queue = DieMoveQueue::new(DieId::new(0));
        let handle = queue.latest_or_new(8.0, true);

        assert!(queue.initialize_move(&mut board, handle, &[Direction::North, Direction::West]));
        assert_eq!(queue.get(handle).and_then(DieMove::direction), Some(Direction::West));
        assert!(!board.is_tile_available(TileCoord::new(-1, 0)));

        let blocked = queue.latest_or_new(8.0, true);
        assert_eq!(blocked, handle);
    }

    #[test]
    fn failed_initialization_leaves_move_pending() {
        let mut board = OpenBoard::default();
        let _ = board.blocked.insert(TileCoord::new(1, 0));
        let mut queue = DieMoveQueue::new(DieId::new(0));
        let handle = queue.latest_or_new(8.0, true);

        assert!(!queue.initialize_move(&mut board, handle, &[Direction::East]));
        assert!(queue.get(handle).is_some_and(|pending| !pending.is_initialized()));
        queue.remove_move(&mut board, handle);
        assert!(queue.is_empty());
    }

    #[test]
    fn rounding_down_releases_reservation() {
        let mut board = OpenBoard::default();
        let mut queue = queue_heading_east(&mut board);
        let _ = queue.add_progress(&mut board, 0.3, 8.0, true);

        let handle = queue.round_latest_progress(&mut board, 4.7, true, false);

        let rounded = handle.and_then(|handle| queue.get(handle)).expect("rounded move");
        assert!(rounded.is_cancelled());
        assert!(!rounded.is_reserved());
        assert!(board.is_tile_available(TileCoord::new(1, 0)));

        let _ = queue.remove_oldest(&mut board);
        assert!(queue.is_empty());
    }

    #[test]
    fn rounding_rules() {
        let mut board = OpenBoard::default();
        let mut queue = queue_heading_east(&mut board);
        let _ = queue.add_progress(&mut board, 0.5, 8.0, true);
        let _ = queue.round_latest_progress(&mut board, 4.7, true, false);
        assert!(queue.latest().is_some_and(DieMove::is_committed));
        assert_eq!(queue.current_tile(), TileCoord::new(1, 0));

        let mut board = OpenBoard::default();
        let mut queue = queue_heading_east(&mut board);
        let _ = queue.add_progress(&mut board, 0.1, 8.0, true);
        let _ = queue.round_latest_progress(&mut board, 4.7, true, true);
        assert!(queue.latest().is_some_and(DieMove::is_committed));
        assert!(queue.latest().is_some_and(|latest| latest.roll_speed == 4.7));
    }

    #[test]
    fn clearing_keeps_oldest_and_releases_tail() {
        let mut board = OpenBoard::default();
        let mut queue = queue_heading_east(&mut board);
        let _ = queue.add_progress(&mut board, 1.5, 8.0, true);

        let oldest = queue.clear_all_except_oldest(&mut board, TileCoord::new(0, 0));

        assert_eq!(oldest, queue.oldest_handle());
        assert_eq!(queue.len(), 1);
        assert_eq!(queue.current_tile(), TileCoord::new(1, 0));
        assert!(board.is_tile_available(TileCoord::new(2, 0)));
        assert!(!board.is_tile_available(TileCoord::new(1, 0)));

        queue.clear_all(&mut board);
        assert!(queue.is_empty());
        assert!(board.reserved.is_empty());
    }

    #[test]
    fn settled_tile_follows_rounding() {
        let mut board = OpenBoard::default();
        let mut queue = queue_heading_east(&mut board);
        let _ = queue.add_progress(&mut board, 0.2, 8.0, true);
        assert_eq!(queue.settled_tile_after_rounding(), TileCoord::new(0, 0));
        let _ = queue.add_progress(&mut board, 0.6, 8.0, true);
        assert_eq!(queue.settled_tile_after_rounding(), TileCoord::new(1, 0));
    }
}
