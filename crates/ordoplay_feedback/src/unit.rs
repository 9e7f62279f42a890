// SPDX-License-Identifier: MIT OR Apache-2.0
//! Effect units and the slots that hold them in a sequence.

use crate::error::UnitError;
use crate::timing::{Direction, TimingPolicy, UNBOUNDED};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// A position in world space
pub type Point = [f32; 3];

/// Unique identifier for a unit in a sequence
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct UnitId(pub Uuid);

impl UnitId {
    /// Create a new random unit ID
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for UnitId {
    fn default() -> Self {
        Self::new()
    }
}

/// Loop behavior of a looper unit
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct LoopSpec {
    /// Number of jumps back, `None` loops forever
    pub loops: Option<u32>,
    /// Jump to the last holding pause instead of the last loop start
    pub jump_to_last_pause: bool,
}

/// Role a unit plays in sequencing
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UnitKind {
    /// Plain effect, no ordering constraints
    Effect,
    /// Barrier: nothing after it starts until it is done
    HoldingPause {
        /// Also hold until every earlier unit has finished
        wait_for_preceding: bool,
    },
    /// Marker a looper jumps back to
    LoopStart,
    /// Pause that rewinds part of the pass when it ends
    Looper(LoopSpec),
}

impl UnitKind {
    /// Whether this kind blocks downstream units while in progress
    pub fn is_holding_pause(&self) -> bool {
        matches!(self, UnitKind::HoldingPause { .. } | UnitKind::Looper(_))
    }
}

/// Owner handed to units on initialization
#[derive(Debug, Clone)]
pub struct OwnerInfo {
    /// Owning player's name
    pub name: String,
}

/// Parameters of a single Play call on a unit
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PlayContext {
    /// Where the feedback originates
    pub origin: Point,
    /// Resolved intensity
    pub intensity: f32,
    /// Resolved direction for this unit
    pub direction: Direction,
}

/// A schedulable action.
///
/// `play` must never block the tick. Effects that span several ticks start
/// an internal [`TimedTask`](crate::task::TimedTask) and advance it in
/// `update`, which the player calls once per tick while `is_playing` is true.
pub trait Unit: Send {
    /// Display label, used in logs and events
    fn label(&self) -> &str;

    /// Sequencing role
    fn kind(&self) -> UnitKind {
        UnitKind::Effect
    }

    /// One-time setup; must tolerate repeated calls
    fn initialize(&mut self, _owner: &OwnerInfo) -> Result<(), UnitError> {
        Ok(())
    }

    /// Check external targets before playing
    fn validate(&self) -> Result<(), UnitError> {
        Ok(())
    }

    /// Begin the effect
    fn play(&mut self, ctx: &PlayContext) -> Result<(), UnitError>;

    /// Advance the effect's timed task
    fn update(&mut self, _dt: f32) {}

    /// Whether a timed task is still in flight
    fn is_playing(&self) -> bool {
        false
    }

    /// Cut the effect short
    fn stop(&mut self, _origin: Point) {}

    /// Restore whatever the effect changed to its baseline
    fn reset_unit(&mut self) {}

    /// Intrinsic duration in seconds, 0 for instant effects
    fn duration(&self) -> f32 {
        0.0
    }

    /// Whether the unit keeps the pass open forever (infinite loops)
    fn is_unbounded(&self) -> bool {
        false
    }
}

/// Why a unit did not run in a pass
#[derive(Debug, Clone, PartialEq)]
pub enum SkipReason {
    /// The slot is disabled
    Inactive,
    /// The direction condition excludes the current direction
    Direction,
    /// The intensity is outside the unit's interval
    Intensity,
    /// The unit is cooling down
    Cooldown,
    /// The unit reached its play-count limit
    PlayCountExhausted,
    /// The unit reported an error
    Fault(UnitError),
}

/// A unit together with its sequencing attributes
pub struct UnitSlot {
    /// Unique slot ID
    pub id: UnitId,
    /// Inactive units keep their position but never execute
    pub active: bool,
    /// Timing rules
    pub timing: TimingPolicy,
    /// Whether the unit contributes to the player's total duration
    pub counts_toward_total_duration: bool,
    /// Ignore holding pauses in both directions
    pub excluded_from_holding_pauses: bool,
    unit: Box<dyn Unit>,
    initialized: bool,
    last_start_time: Option<f64>,
    play_count: u32,
}

impl UnitSlot {
    /// Wrap a unit with default timing
    pub fn new(unit: impl Unit + 'static) -> Self {
        Self::boxed(Box::new(unit))
    }

    /// Wrap an already boxed unit
    pub fn boxed(unit: Box<dyn Unit>) -> Self {
        Self {
            id: UnitId::new(),
            active: true,
            timing: TimingPolicy::default(),
            counts_toward_total_duration: true,
            excluded_from_holding_pauses: false,
            unit,
            initialized: false,
            last_start_time: None,
            play_count: 0,
        }
    }

    /// Set the timing policy
    pub fn with_timing(mut self, timing: TimingPolicy) -> Self {
        self.timing = timing;
        self
    }

    /// Enable or disable the slot
    pub fn with_active(mut self, active: bool) -> Self {
        self.active = active;
        self
    }

    /// Exclude from holding pauses
    pub fn excluded_from_holding_pauses(mut self) -> Self {
        self.excluded_from_holding_pauses = true;
        self
    }

    /// Leave this unit out of the total duration
    pub fn without_duration(mut self) -> Self {
        self.counts_toward_total_duration = false;
        self
    }

    /// Display label of the unit
    pub fn label(&self) -> &str {
        self.unit.label()
    }

    /// Sequencing role of the unit
    pub fn kind(&self) -> UnitKind {
        self.unit.kind()
    }

    /// The wrapped unit
    pub fn unit(&self) -> &dyn Unit {
        self.unit.as_ref()
    }

    /// The wrapped unit, mutably
    pub fn unit_mut(&mut self) -> &mut dyn Unit {
        self.unit.as_mut()
    }

    /// Whether this slot acts as a barrier.
    ///
    /// Barrier kinds ignore `excluded_from_holding_pauses` on themselves.
    pub fn is_holding_pause(&self) -> bool {
        self.unit.kind().is_holding_pause()
    }

    /// Non-negative intrinsic duration
    pub fn intrinsic_duration(&self) -> f32 {
        self.unit.duration().max(0.0)
    }

    /// Contribution of this slot to the player's total duration
    pub fn total_duration(&self) -> f32 {
        if !self.counts_toward_total_duration || !self.active {
            return 0.0;
        }
        if self.unit.is_unbounded() {
            return UNBOUNDED;
        }
        self.timing.compute_total_duration(self.intrinsic_duration())
    }

    /// Run the unit's one-time setup unless it already succeeded
    pub fn ensure_initialized(&mut self, owner: &OwnerInfo) -> Result<(), UnitError> {
        if self.initialized {
            return Ok(());
        }
        self.unit.initialize(owner)?;
        self.initialized = true;
        Ok(())
    }

    /// Whether initialization has succeeded
    pub fn is_initialized(&self) -> bool {
        self.initialized
    }

    /// Evaluate every gate that keeps this unit from starting
    pub fn check_gates(&self, direction: Direction, intensity: f32, now: f64) -> Option<SkipReason> {
        if !self.active {
            return Some(SkipReason::Inactive);
        }
        if !self.timing.should_run_for_direction(direction) {
            return Some(SkipReason::Direction);
        }
        if !self.timing.passes_intensity_gate(intensity) {
            return Some(SkipReason::Intensity);
        }
        if self.timing.is_in_cooldown(now, self.last_start_time) {
            return Some(SkipReason::Cooldown);
        }
        if self.timing.is_play_count_exhausted(self.play_count) {
            return Some(SkipReason::PlayCountExhausted);
        }
        None
    }

    /// Record the first start of a pass
    pub fn record_start(&mut self, now: f64) {
        self.last_start_time = Some(now);
        self.play_count += 1;
    }

    /// Time of the last recorded start
    pub fn last_start_time(&self) -> Option<f64> {
        self.last_start_time
    }

    /// Number of passes that started this unit
    pub fn play_count(&self) -> u32 {
        self.play_count
    }

    /// Restore the unit's targets and forget its play count
    pub fn reset(&mut self) {
        self.unit.reset_unit();
        self.play_count = 0;
    }
}

impl std::fmt::Debug for UnitSlot {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("UnitSlot")
            .field("id", &self.id)
            .field("label", &self.label())
            .field("active", &self.active)
            .field("timing", &self.timing)
            .finish_non_exhaustive()
    }
}
