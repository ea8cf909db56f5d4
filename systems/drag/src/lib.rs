#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Translates pointer drags on the board plane into queued die rolls.
//!
//! Drag points are board-plane coordinates in tile units, with `x` growing
//! east and `y` growing north.

use dice_roll_core::{Axis, BoardContext, DieId, Direction, GameClock, TileCoord};
use dice_roll_system_moves::{BoardMoveQueue, DieMoveQueue, Handle};
use glam::Vec2;
use tracing::trace;

/// Drag distance that rolls a die onto the next tile.
pub const DRAG_DIST_PER_ROLL: f32 = 1.1;
/// Drag distance below which pointer movement is ignored.
pub const MIN_DRAG_MAG: f32 = 0.03;
/// Distance from either end of a roll within which it may change direction.
pub const ROLL_DIR_CHANGE_PROGRESS_LIMIT: f32 = 0.35;
/// Margin by which the perpendicular drag must dominate to change direction.
pub const ROLL_DIR_CHANGE_DIFF_LIMIT: f32 = 0.03;
/// Release speed above which a drag counts as a swipe.
pub const SWIPE_SPEED_LIMIT: f32 = 0.1;
/// Roll speed while the pointer drives the die.
pub const FAST_ROLL_SPEED: f32 = 8.0;
/// Roll speed of a released die settling on its tile.
pub const SLOW_ROLL_SPEED: f32 = 4.7;

/// Drag magnitude and sign along both axes, capped at one roll per axis.
#[derive(Clone, Copy, Debug)]
struct DragSample {
    amount: Vec2,
    magnitude: Vec2,
}

impl DragSample {
    fn new(amount: Vec2) -> Self {
        Self {
            amount,
            magnitude: amount.abs().min(Vec2::splat(DRAG_DIST_PER_ROLL)),
        }
    }

    fn direction(&self, axis: Axis) -> Direction {
        match axis {
            Axis::X => Direction::from_axis(Axis::X, self.amount.x),
            Axis::Y => Direction::from_axis(Axis::Y, self.amount.y),
        }
    }

    fn dominant_axis(&self) -> Axis {
        if self.magnitude.x > self.magnitude.y {
            Axis::X
        } else {
            Axis::Y
        }
    }

    fn other_axis(axis: Axis) -> Axis {
        match axis {
            Axis::X => Axis::Y,
            Axis::Y => Axis::X,
        }
    }

    /// Portion of the drag consumed by a roll along `axis`, and the progress
    /// it adds to a roll heading `direction`. Drag across the rolling axis is
    /// consumed without effect.
    fn consume(&self, direction: Direction) -> (Vec2, f32) {
        match direction.axis() {
            Axis::X => {
                let along = self.magnitude.x.copysign(self.amount.x);
                (
                    Vec2::new(along, self.amount.y),
                    direction.sign() * along / DRAG_DIST_PER_ROLL,
                )
            }
            Axis::Y => {
                let along = self.magnitude.y.copysign(self.amount.y);
                (
                    Vec2::new(self.amount.x, along),
                    direction.sign() * along / DRAG_DIST_PER_ROLL,
                )
            }
        }
    }
}

/// Drag gesture in progress on a single die.
#[derive(Clone, Debug)]
pub struct DragInput {
    die: DieId,
    previous_point: Vec2,
}

impl DragInput {
    /// Starts dragging `die` from `point`.
    ///
    /// Returns `None` when the die is not spawned at the current tick. Queued
    /// rolls other than the one the board may be animating are discarded.
    pub fn begin<B>(
        die: DieId,
        point: Vec2,
        board: &mut B,
        moves: &mut BoardMoveQueue,
    ) -> Option<Self>
    where
        B: BoardContext + GameClock + ?Sized,
    {
        let tile = interactable_tile(die, board)?;
        let _ = moves.die_mut(die).clear_all_except_oldest(board, tile);
        trace!(%die, %tile, "drag started");
        Some(Self {
            die,
            previous_point: point,
        })
    }

    /// Die being dragged.
    #[must_use]
    pub const fn die(&self) -> DieId {
        self.die
    }

    /// Last drag point already turned into roll progress.
    #[must_use]
    pub const fn previous_point(&self) -> Vec2 {
        self.previous_point
    }

    /// Feeds the pointer position into the die's move queue.
    ///
    /// Returns `false` once the die stops being interactable; its queue is
    /// then cleared and the drag is over.
    pub fn update<B>(&mut self, point: Vec2, board: &mut B, moves: &mut BoardMoveQueue) -> bool
    where
        B: BoardContext + GameClock + ?Sized,
    {
        let queue = moves.die_mut(self.die);
        if interactable_tile(self.die, board).is_none() {
            queue.clear_all(board);
            trace!(die = %self.die, "drag interrupted");
            return false;
        }

        loop {
            let sample = DragSample::new(point - self.previous_point);
            if sample.magnitude.max_element() <= MIN_DRAG_MAG {
                break;
            }

            let mut handle = queue.latest_or_new(FAST_ROLL_SPEED, true);
            let is_initialized = queue.get(handle).is_some_and(|latest| latest.is_initialized());
            if !is_initialized {
                let preferred = sample.dominant_axis();
                let fallback = DragSample::other_axis(preferred);
                let directions = [sample.direction(preferred), sample.direction(fallback)];
                let _ = queue.initialize_move(board, handle, &directions);
            } else if queue
                .get(handle)
                .is_some_and(|latest| latest.is_nearer_to_finishing(ROLL_DIR_CHANGE_PROGRESS_LIMIT))
            {
                handle = change_direction(queue, board, handle, &sample);
            }

            let Some(direction) = queue.get(handle).and_then(|latest| latest.direction()) else {
                self.previous_point = point;
                queue.remove_move(board, handle);
                break;
            };

            let (drag_delta, progress_delta) = sample.consume(direction);
            if drag_delta == Vec2::ZERO {
                break;
            }
            let _ = queue.add_progress(board, progress_delta, FAST_ROLL_SPEED, true);
            self.previous_point += drag_delta;
        }

        true
    }

    /// Releases the die.
    ///
    /// The newest roll is settled on the nearer tile, or on its target when
    /// the release speed counts as a swipe. Returns the settled roll, if any.
    pub fn end<B>(
        self,
        release_velocity: Vec2,
        board: &mut B,
        moves: &mut BoardMoveQueue,
    ) -> Option<Handle>
    where
        B: BoardContext + GameClock + ?Sized,
    {
        let tile = interactable_tile(self.die, board)?;
        let queue = moves.die_mut(self.die);
        let _ = queue.clear_all_except_oldest(board, tile);

        let did_swipe = release_velocity.length() > SWIPE_SPEED_LIMIT;
        let always_round_up = !queue.is_empty() && did_swipe;
        trace!(die = %self.die, did_swipe, "drag ended");
        queue.round_latest_progress(board, SLOW_ROLL_SPEED, true, always_round_up)
    }
}

fn interactable_tile<B>(die: DieId, board: &B) -> Option<TileCoord>
where
    B: BoardContext + GameClock + ?Sized,
{
    let tick = board.tick();
    board
        .die_state(die, tick)
        .filter(|state| state.is_spawned(tick))
        .map(|state| state.tile())
}

/// Switches the newest roll to the perpendicular axis when the drag clearly
/// favours it and the tile the die would settle on has a free neighbour that
/// way. Returns the roll that should receive progress.
fn change_direction<B>(
    queue: &mut DieMoveQueue,
    board: &mut B,
    handle: Handle,
    sample: &DragSample,
) -> Handle
where
    B: BoardContext + ?Sized,
{
    let Some(current) = queue.get(handle).and_then(|latest| latest.direction()) else {
        return handle;
    };
    let difference = (sample.magnitude.x - sample.magnitude.y).abs();
    if difference <= ROLL_DIR_CHANGE_DIFF_LIMIT {
        return handle;
    }

    let favoured = sample.dominant_axis();
    if favoured == current.axis() {
        return handle;
    }
    let direction = sample.direction(favoured);
    let target = queue.settled_tile_after_rounding().step(direction);
    if !board.is_tile_available(target) {
        return handle;
    }

    let _ = queue.round_latest_progress(board, SLOW_ROLL_SPEED, true, false);
    let turned = queue.latest_or_new(FAST_ROLL_SPEED, true);
    let _ = queue.initialize_move(board, turned, &[direction]);
    trace!(die = %queue.die(), ?direction, %target, "roll changed direction");
    turned
}
