// SPDX-License-Identifier: MIT OR Apache-2.0
//! One traversal of a unit sequence.
//!
//! A [`Pass`] owns one [`Cursor`] per unit and advances them once per tick,
//! in traversal order. Forward passes walk the sequence top to bottom,
//! backward passes bottom to top; the container itself is never reordered.
//!
//! Ordering rule: while a holding pause has not reached a terminal state,
//! no unit after it in traversal order may leave `Pending`, except units
//! marked `excluded_from_holding_pauses`. Units before the barrier, and the
//! barrier itself, keep advancing.
//!
//! A pass keeps the direction it started with for traversal order and for
//! each unit's play direction. Direction conditions are checked against the
//! player's current direction, so a revert mid-pass gates units that have
//! not started yet.

use crate::player::PlayerEvent;
use crate::timing::{Direction, TimeScaleMode};
use crate::unit::{OwnerInfo, PlayContext, Point, SkipReason, UnitId, UnitKind, UnitSlot};
use indexmap::IndexMap;
use std::collections::HashMap;

/// Identifier of a pass, unique per player
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct PassId(pub u64);

/// Deltas handed out for one tick
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct TickTimes {
    /// Host delta times the player's time scale
    pub player: f32,
    /// Delta for units on the scaled clock, stretched by the duration multiplier
    pub scaled: f32,
    /// Delta for units on the unscaled clock, stretched by the duration multiplier
    pub unscaled: f32,
}

impl TickTimes {
    /// Derive the tick deltas from a raw host delta
    pub fn new(dt: f32, time_scale: f32, duration_multiplier: f32) -> Self {
        let dt = dt.max(0.0);
        let multiplier = duration_multiplier.max(f32::EPSILON);
        Self {
            player: dt * time_scale,
            scaled: dt * time_scale / multiplier,
            unscaled: dt / multiplier,
        }
    }

    /// Delta for a unit's clock
    pub fn for_mode(&self, mode: TimeScaleMode) -> f32 {
        match mode {
            TimeScaleMode::Scaled => self.scaled,
            TimeScaleMode::Unscaled => self.unscaled,
        }
    }
}

/// State of one unit within a pass
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum CursorState {
    /// Not reached yet, or blocked by a holding pause
    #[default]
    Pending,
    /// Waiting out the initial delay
    Delaying,
    /// Effect in flight
    Playing,
    /// Waiting between two repeats
    RepeatDelay,
    /// Finished for this pass
    Done,
    /// Did not run in this pass
    Skipped,
}

impl CursorState {
    /// Whether the unit is finished for this pass
    pub fn is_terminal(self) -> bool {
        matches!(self, CursorState::Done | CursorState::Skipped)
    }
}

/// Remaining repeats
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Repeats {
    Finite(u32),
    Forever,
}

/// Per-unit progress within a pass
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Cursor {
    /// Current state
    pub state: CursorState,
    /// Seconds spent in the current state
    pub state_elapsed: f32,
    /// Pass time of the first play, if any
    pub started_at: Option<f32>,
    /// Number of plays in this pass
    pub plays: u32,
    repeats_left: Repeats,
}

impl Default for Cursor {
    fn default() -> Self {
        Self {
            state: CursorState::Pending,
            state_elapsed: 0.0,
            started_at: None,
            plays: 0,
            repeats_left: Repeats::Finite(0),
        }
    }
}

impl Cursor {
    fn enter(&mut self, state: CursorState) {
        self.state = state;
        self.state_elapsed = 0.0;
    }
}

/// Result of advancing a pass by one tick
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PassStatus {
    /// Still waiting out the player's initial delay
    Delaying,
    /// Units are in flight
    Running {
        /// A holding pause is in progress
        holding: bool,
    },
    /// Every unit is terminal
    Complete,
}

enum StepOutcome {
    Continue,
    Rewind,
}

/// One traversal of the sequence triggered by a single Play
#[derive(Debug)]
pub struct Pass {
    id: PassId,
    direction: Direction,
    global_direction: Direction,
    intensity: f32,
    origin: Point,
    start_delay: f32,
    elapsed: f32,
    order: Vec<usize>,
    cursors: Vec<Cursor>,
    loops_left: HashMap<usize, Option<u32>>,
}

impl Pass {
    /// Create a pass over `unit_count` units
    pub fn new(
        id: PassId,
        unit_count: usize,
        direction: Direction,
        intensity: f32,
        origin: Point,
        start_delay: f32,
    ) -> Self {
        let order: Vec<usize> = match direction {
            Direction::Forward => (0..unit_count).collect(),
            Direction::Backward => (0..unit_count).rev().collect(),
        };
        Self {
            id,
            direction,
            global_direction: direction,
            intensity,
            origin,
            start_delay: start_delay.max(0.0),
            elapsed: 0.0,
            cursors: vec![Cursor::default(); order.len()],
            order,
            loops_left: HashMap::new(),
        }
    }

    /// Pass ID
    pub fn id(&self) -> PassId {
        self.id
    }

    /// Direction captured when the pass started
    pub fn direction(&self) -> Direction {
        self.direction
    }

    /// Seconds since the pass began (after the initial delay)
    pub fn elapsed(&self) -> f32 {
        self.elapsed
    }

    /// Whether the player's initial delay is still running
    pub fn is_delaying(&self) -> bool {
        self.start_delay > 0.0
    }

    /// Whether every cursor is terminal
    pub fn is_complete(&self) -> bool {
        !self.is_delaying() && self.cursors.iter().all(|c| c.state.is_terminal())
    }

    /// Cursor of the unit at a sequence index
    pub fn cursor(&self, index: usize) -> Option<&Cursor> {
        let position = self.order.iter().position(|&i| i == index)?;
        self.cursors.get(position)
    }

    /// Advance every cursor by one tick.
    ///
    /// `global` is the player's direction at this tick, used for direction
    /// conditions.
    pub fn advance(
        &mut self,
        slots: &mut IndexMap<UnitId, UnitSlot>,
        times: &TickTimes,
        global: Direction,
        now: f64,
        owner: &OwnerInfo,
        events: &mut Vec<PlayerEvent>,
    ) -> PassStatus {
        self.global_direction = global;
        if self.start_delay > 0.0 {
            self.start_delay -= times.player;
            if self.start_delay > 0.0 {
                return PassStatus::Delaying;
            }
            // Carry the part of the tick past the delay into the pass clock
            let overshoot = -self.start_delay;
            self.start_delay = 0.0;
            self.elapsed += times.scaled * (overshoot / times.player);
            tracing::debug!("Pass {:?} finished its initial delay", self.id);
        } else {
            self.elapsed += times.scaled;
        }

        let mut blocked = false;
        let mut holding = false;
        let mut preceding_done = true;

        for position in 0..self.order.len() {
            let index = self.order[position];
            let Some((_, slot)) = slots.get_index_mut(index) else {
                self.cursors[position].enter(CursorState::Skipped);
                continue;
            };

            let is_barrier = slot.is_holding_pause();
            let excluded = slot.excluded_from_holding_pauses && !is_barrier;

            if !blocked || excluded {
                let dt = times.for_mode(slot.timing.time_scale_mode);
                let outcome =
                    self.step_cursor(position, slot, dt, now, preceding_done, owner, events);
                if let StepOutcome::Rewind = outcome {
                    self.rewind(position, slots);
                }
            }

            let state = self.cursors[position].state;
            if is_barrier && !state.is_terminal() {
                blocked = true;
                holding |= state != CursorState::Pending;
            }
            if !excluded && !state.is_terminal() {
                preceding_done = false;
            }
        }

        if self.is_complete() {
            PassStatus::Complete
        } else {
            PassStatus::Running { holding }
        }
    }

    #[allow(clippy::too_many_arguments)]
    fn step_cursor(
        &mut self,
        position: usize,
        slot: &mut UnitSlot,
        dt: f32,
        now: f64,
        preceding_done: bool,
        owner: &OwnerInfo,
        events: &mut Vec<PlayerEvent>,
    ) -> StepOutcome {
        match self.cursors[position].state {
            CursorState::Done | CursorState::Skipped => return StepOutcome::Continue,
            CursorState::Pending => {
                if let Err(reason) = self.admit(slot, now, owner) {
                    self.skip(position, slot, reason, events);
                    return StepOutcome::Continue;
                }
                let cursor = &mut self.cursors[position];
                cursor.repeats_left = if slot.timing.repeat_forever {
                    Repeats::Forever
                } else {
                    Repeats::Finite(slot.timing.repeat_count)
                };
                cursor.enter(CursorState::Delaying);
            }
            CursorState::Delaying | CursorState::RepeatDelay => {
                self.cursors[position].state_elapsed += dt;
            }
            CursorState::Playing => {}
        }

        let cursor = self.cursors[position];
        let mut outcome = match cursor.state {
            CursorState::Delaying if cursor.state_elapsed >= slot.timing.initial_delay => {
                self.start_play(position, slot, now, preceding_done, events)
            }
            CursorState::RepeatDelay
                if cursor.state_elapsed >= slot.timing.delay_between_repeats =>
            {
                self.start_play(position, slot, now, preceding_done, events)
            }
            CursorState::Playing if !slot.unit().is_playing() => {
                self.finish_iteration(position, slot, preceding_done)
            }
            _ => StepOutcome::Continue,
        };

        // Finite repeats without a gap run back to back within the tick
        while self.repeats_immediately(position, slot) {
            outcome = self.start_play(position, slot, now, preceding_done, events);
        }
        outcome
    }

    fn repeats_immediately(&self, position: usize, slot: &UnitSlot) -> bool {
        let cursor = &self.cursors[position];
        cursor.state == CursorState::RepeatDelay
            && matches!(cursor.repeats_left, Repeats::Finite(_))
            && slot.timing.delay_between_repeats <= 0.0
    }

    fn admit(&self, slot: &mut UnitSlot, now: f64, owner: &OwnerInfo) -> Result<(), SkipReason> {
        if let Some(reason) = slot.check_gates(self.global_direction, self.intensity, now) {
            return Err(reason);
        }
        slot.ensure_initialized(owner).map_err(SkipReason::Fault)?;
        slot.unit().validate().map_err(SkipReason::Fault)
    }

    fn skip(
        &mut self,
        position: usize,
        slot: &UnitSlot,
        reason: SkipReason,
        events: &mut Vec<PlayerEvent>,
    ) {
        match &reason {
            SkipReason::Fault(error) => {
                tracing::warn!("Skipping unit '{}' in pass {:?}: {}", slot.label(), self.id, error);
            }
            other => {
                tracing::debug!("Skipping unit '{}' in pass {:?}: {:?}", slot.label(), self.id, other);
            }
        }
        self.cursors[position].enter(CursorState::Skipped);
        events.push(PlayerEvent::UnitSkipped {
            unit: slot.id,
            label: slot.label().to_string(),
            reason,
        });
    }

    fn start_play(
        &mut self,
        position: usize,
        slot: &mut UnitSlot,
        now: f64,
        preceding_done: bool,
        events: &mut Vec<PlayerEvent>,
    ) -> StepOutcome {
        if !slot.timing.should_run_for_direction(self.global_direction) {
            self.skip(position, slot, SkipReason::Direction, events);
            return StepOutcome::Continue;
        }

        let ctx = PlayContext {
            origin: self.origin,
            intensity: slot.timing.effective_intensity(self.intensity),
            direction: slot.timing.effective_play_direction(self.direction),
        };

        if let Err(error) = slot.unit_mut().play(&ctx) {
            self.skip(position, slot, SkipReason::Fault(error), events);
            return StepOutcome::Continue;
        }

        let elapsed = self.elapsed;
        let cursor = &mut self.cursors[position];
        if cursor.plays == 0 {
            slot.record_start(now);
            cursor.started_at = Some(elapsed);
        }
        cursor.plays += 1;
        cursor.enter(CursorState::Playing);
        tracing::trace!("Unit '{}' playing (play {})", slot.label(), cursor.plays);

        if slot.unit().is_playing() {
            StepOutcome::Continue
        } else {
            self.finish_iteration(position, slot, preceding_done)
        }
    }

    fn finish_iteration(
        &mut self,
        position: usize,
        slot: &UnitSlot,
        preceding_done: bool,
    ) -> StepOutcome {
        let kind = slot.kind();
        if let UnitKind::HoldingPause { wait_for_preceding: true } = kind {
            if !preceding_done {
                return StepOutcome::Continue;
            }
        }

        let cursor = &mut self.cursors[position];
        match cursor.repeats_left {
            Repeats::Forever => {
                cursor.enter(CursorState::RepeatDelay);
                return StepOutcome::Continue;
            }
            Repeats::Finite(left) if left > 0 => {
                cursor.repeats_left = Repeats::Finite(left - 1);
                cursor.enter(CursorState::RepeatDelay);
                return StepOutcome::Continue;
            }
            Repeats::Finite(_) => {}
        }

        cursor.enter(CursorState::Done);

        if let UnitKind::Looper(spec) = kind {
            let left = self.loops_left.entry(position).or_insert(spec.loops);
            match left {
                Some(0) => {}
                Some(n) => {
                    *n -= 1;
                    return StepOutcome::Rewind;
                }
                None => return StepOutcome::Rewind,
            }
        }
        StepOutcome::Continue
    }

    /// Send every cursor from the loop target up to the looper back to `Pending`
    fn rewind(&mut self, looper_position: usize, slots: &IndexMap<UnitId, UnitSlot>) {
        let Some(UnitKind::Looper(spec)) = slots
            .get_index(self.order[looper_position])
            .map(|(_, slot)| slot.kind())
        else {
            return;
        };

        let target = (0..looper_position)
            .rev()
            .find(|&position| {
                let kind = slots
                    .get_index(self.order[position])
                    .map(|(_, slot)| slot.kind());
                match kind {
                    Some(UnitKind::HoldingPause { .. }) => spec.jump_to_last_pause,
                    Some(UnitKind::LoopStart) => !spec.jump_to_last_pause,
                    _ => false,
                }
            })
            .unwrap_or(0);

        for position in target..=looper_position {
            self.cursors[position] = Cursor::default();
            if position != looper_position {
                self.loops_left.remove(&position);
            }
        }
        tracing::debug!(
            "Pass {:?} looping back from position {} to {}",
            self.id,
            looper_position,
            target
        );
    }
}
