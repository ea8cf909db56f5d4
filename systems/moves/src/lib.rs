#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Move queues that turn continuous roll progress into discrete board ticks.
//!
//! Each die owns a [`DieMoveQueue`] of tile-to-tile rolls fed by drag input.
//! The [`BoardMoveQueue`] advances one board-wide progress value toward the
//! oldest roll of the driving die and ends a tick on the board whenever that
//! progress reaches a boundary.

mod arena;
mod die_move;
mod queue;

use std::collections::BTreeMap;

use dice_roll_core::{approximately, BoardContext, DieId, Event, GameClock, Tick};

pub use arena::{Arena, Handle};
pub use die_move::DieMove;
pub use queue::DieMoveQueue;

#[derive(Clone, Copy, Debug, PartialEq)]
struct Aggregate {
    progress: f32,
    roll_speed: f32,
    is_cancelled: bool,
}

/// Drives board ticks from the oldest queued roll of every die.
#[derive(Debug, Default)]
pub struct BoardMoveQueue {
    queues: BTreeMap<DieId, DieMoveQueue>,
    spare: Vec<DieMoveQueue>,
    progress: f32,
}

impl BoardMoveQueue {
    /// Creates a move queue with no dice.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Queue for `die`, created empty on first use.
    pub fn die_mut(&mut self, die: DieId) -> &mut DieMoveQueue {
        let spare = &mut self.spare;
        self.queues.entry(die).or_insert_with(|| match spare.pop() {
            Some(mut queue) => {
                queue.recycle(die);
                queue
            }
            None => DieMoveQueue::new(die),
        })
    }

    /// Queue for `die`, if one was created.
    #[must_use]
    pub fn die(&self, die: DieId) -> Option<&DieMoveQueue> {
        self.queues.get(&die)
    }

    /// Clears the queue of `die`, releasing its reservations.
    pub fn remove_die<B>(&mut self, board: &mut B, die: DieId)
    where
        B: BoardContext + ?Sized,
    {
        if let Some(mut queue) = self.queues.remove(&die) {
            queue.clear_all(board);
            self.spare.push(queue);
        }
    }

    /// Forgets every queue and resets board progress.
    ///
    /// Reservations are not released; call this together with a board reset.
    pub fn reset(&mut self) {
        self.queues.clear();
        self.progress = 0.0;
    }

    /// Whether no die has a queued roll.
    #[must_use]
    pub fn is_idle(&self) -> bool {
        self.queues.values().all(DieMoveQueue::is_empty)
    }

    /// Board-wide progress toward the next tick.
    #[must_use]
    pub const fn progress(&self) -> f32 {
        self.progress
    }

    /// Advances board progress by `dt` seconds.
    ///
    /// Progress moves toward the driving roll at the fastest contending roll
    /// speed and the next-tick state of every rolling die is refreshed.
    /// Reaching 1 then ends the tick and pops every die's oldest roll.
    /// Reaching 0 while the driving roll was cancelled erases the next tick
    /// and pops as well. Loops while time remains and progress can still move.
    pub fn update<B>(&mut self, board: &mut B, dt: f32, out_events: &mut Vec<Event>)
    where
        B: BoardContext + GameClock + ?Sized,
    {
        let mut remaining = dt.max(0.0);
        let mut aggregate = self.aggregate();

        loop {
            if let Some(target) = aggregate {
                let max_step = remaining * target.roll_speed;
                let gap = target.progress - self.progress;
                if gap.abs() < max_step {
                    self.progress += gap;
                    remaining -= gap.abs() / target.roll_speed;
                } else {
                    self.progress += max_step.copysign(gap);
                    remaining = 0.0;
                }
                self.progress = self.progress.clamp(0.0, 1.0);

                let reached_end = approximately(self.progress, 1.0);
                let reached_start =
                    !reached_end && approximately(self.progress, 0.0) && target.is_cancelled;
                let is_boundary = reached_end || reached_start;

                let tick = board.tick();
                if reached_start {
                    board.clear_tick(tick.next());
                } else {
                    for queue in self.queues.values() {
                        propagate_next_state(queue, board, tick);
                    }
                }
                if reached_end {
                    board.end_tick(out_events);
                }

                if is_boundary {
                    self.progress = 0.0;
                }
                board.update_tick(self.progress, out_events);

                if is_boundary {
                    for queue in self.queues.values_mut() {
                        let _ = queue.remove_oldest(board);
                    }
                }

                aggregate = self.aggregate();
            }

            let can_move = aggregate
                .is_some_and(|target| !approximately(self.progress, target.progress));
            if !can_move || remaining <= 0.0 {
                break;
            }
        }
    }

    fn aggregate(&self) -> Option<Aggregate> {
        let oldest: Vec<&DieMove> = self
            .queues
            .values()
            .filter_map(DieMoveQueue::oldest)
            .collect();
        let has_user_move = oldest.iter().any(|candidate| candidate.is_user());
        let mut contenders = oldest
            .into_iter()
            .filter(|candidate| candidate.is_user() || !has_user_move);

        let driving = contenders.next()?;
        let roll_speed = contenders
            .map(DieMove::roll_speed)
            .fold(driving.roll_speed(), f32::max);

        Some(Aggregate {
            progress: driving.progress(),
            roll_speed,
            is_cancelled: driving.is_cancelled(),
        })
    }
}

fn propagate_next_state<B>(queue: &DieMoveQueue, board: &mut B, tick: Tick)
where
    B: BoardContext + ?Sized,
{
    let Some(oldest) = queue.oldest() else {
        return;
    };
    let Some(direction) = oldest.direction() else {
        return;
    };
    let Some(current) = board.die_state(queue.die(), tick) else {
        return;
    };
    if !current.is_spawned(tick) {
        return;
    }

    let mut next = current.clone();
    if !oldest.is_cancelled() {
        next.roll(direction, oldest.target());
    }
    next.copy_to(board.die_state_or_insert(queue.die(), tick.next()));
}
