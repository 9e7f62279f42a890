// SPDX-License-Identifier: MIT OR Apache-2.0
//! The feedback player: owns a unit sequence and drives it over time.
//!
//! This module handles:
//! - Transport controls (play, stop, pause/resume, revert)
//! - Player-level cooldown, initial delay and overlapping passes
//! - Aggregate duration
//! - Structural edits, queued while a pass is active
//! - Events reported back to the host

use crate::error::{FeedbackError, Result};
use crate::sequencer::{Pass, PassId, PassStatus, TickTimes};
use crate::settings::{PlayerSettings, MAX_TIME_SCALE, MIN_DURATION_MULTIPLIER};
use crate::timing::{Direction, UNBOUNDED};
use crate::unit::{OwnerInfo, Point, SkipReason, UnitId, UnitSlot};
use indexmap::IndexMap;

/// Why a Play call was dropped
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RejectReason {
    /// A pass is active and overlapping passes are disabled
    AlreadyPlaying,
    /// The player cooldown has not elapsed
    Cooldown,
}

/// Events reported to the host, drained with [`Player::take_events`]
#[derive(Debug, Clone, PartialEq)]
pub enum PlayerEvent {
    /// A Play call was accepted
    SequenceStarted {
        /// The new pass
        pass: PassId,
    },
    /// Every unit of a pass reached a terminal state
    SequenceCompleted {
        /// The finished pass
        pass: PassId,
    },
    /// A holding pause started blocking downstream units
    HoldingPauseEntered,
    /// No holding pause is blocking anymore
    HoldingPauseExited,
    /// Tick advancement was frozen
    Paused,
    /// Tick advancement was unfrozen
    Resumed,
    /// The player was stopped
    Stopped,
    /// The global direction changed
    DirectionChanged(Direction),
    /// Every unit was reset to its baseline
    Reset,
    /// A unit did not run in a pass
    UnitSkipped {
        /// The skipped unit
        unit: UnitId,
        /// Its label
        label: String,
        /// Why it was skipped
        reason: SkipReason,
    },
    /// A Play call was dropped
    PlayRejected(RejectReason),
}

/// Coarse transport state
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum PlayerState {
    /// Nothing running
    #[default]
    Idle,
    /// Waiting out the initial delay
    Delaying,
    /// A pass is running
    Playing,
    /// A pass is running but ticks are frozen
    Paused,
    /// Idle, but the player cooldown rejects Play
    Cooldown,
}

/// Outcome of a structural edit
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MutationOutcome {
    /// Applied immediately
    Applied,
    /// Deferred until the player is idle
    Queued,
}

enum PendingMutation {
    Add(UnitSlot),
    Remove(UnitId),
}

/// Orchestrates one unit sequence
pub struct Player {
    owner: OwnerInfo,
    units: IndexMap<UnitId, UnitSlot>,
    passes: Vec<Pass>,
    pending: Vec<PendingMutation>,
    events: Vec<PlayerEvent>,
    /// Global direction for new passes
    direction: Direction,
    /// Flip direction when a pass completes
    pub auto_reverse_on_end: bool,
    /// Global intensity multiplier
    pub intensity: f32,
    duration_multiplier: f32,
    /// Minimum time between two accepted Play calls
    pub cooldown: f32,
    /// Delay between Play and the start of the pass
    pub initial_delay: f32,
    /// Allow overlapping passes
    pub can_play_while_already_playing: bool,
    time_scale: f32,
    clock: f64,
    last_play_timestamp: Option<f64>,
    next_pass: u64,
    is_playing: bool,
    paused: bool,
    holding: bool,
}

impl Player {
    /// Create a player with default settings
    pub fn new(name: impl Into<String>) -> Self {
        Self::with_settings(name, &PlayerSettings::default())
    }

    /// Create a player from settings
    pub fn with_settings(name: impl Into<String>, settings: &PlayerSettings) -> Self {
        let settings = settings.clone().sanitized();
        Self {
            owner: OwnerInfo { name: name.into() },
            units: IndexMap::new(),
            passes: Vec::new(),
            pending: Vec::new(),
            events: Vec::new(),
            direction: settings.direction,
            auto_reverse_on_end: settings.auto_reverse_on_end,
            intensity: settings.intensity,
            duration_multiplier: settings.duration_multiplier,
            cooldown: settings.cooldown,
            initial_delay: settings.initial_delay,
            can_play_while_already_playing: settings.can_play_while_already_playing,
            time_scale: settings.time_scale,
            clock: 0.0,
            last_play_timestamp: None,
            next_pass: 0,
            is_playing: false,
            paused: false,
            holding: false,
        }
    }

    /// Snapshot of the current settings
    pub fn settings(&self) -> PlayerSettings {
        PlayerSettings {
            direction: self.direction,
            auto_reverse_on_end: self.auto_reverse_on_end,
            intensity: self.intensity,
            duration_multiplier: self.duration_multiplier,
            cooldown: self.cooldown,
            initial_delay: self.initial_delay,
            can_play_while_already_playing: self.can_play_while_already_playing,
            time_scale: self.time_scale,
            ..Default::default()
        }
    }

    /// Player name
    pub fn name(&self) -> &str {
        &self.owner.name
    }

    // --- Sequence ---------------------------------------------------------

    /// Append a unit. Queued while a pass is active.
    pub fn add_unit(&mut self, slot: UnitSlot) -> (UnitId, MutationOutcome) {
        let id = slot.id;
        if self.is_playing {
            tracing::debug!("Queueing add of unit '{}' until the player is idle", slot.label());
            self.pending.push(PendingMutation::Add(slot));
            return (id, MutationOutcome::Queued);
        }
        self.insert_slot(slot);
        (id, MutationOutcome::Applied)
    }

    /// Remove a unit. Queued while a pass is active.
    pub fn remove_unit(&mut self, id: UnitId) -> Result<MutationOutcome> {
        let queued_add = self
            .pending
            .iter()
            .any(|m| matches!(m, PendingMutation::Add(slot) if slot.id == id));
        if !self.units.contains_key(&id) && !queued_add {
            return Err(FeedbackError::UnitNotFound(id));
        }
        if self.is_playing {
            self.pending.push(PendingMutation::Remove(id));
            return Ok(MutationOutcome::Queued);
        }
        self.remove_slot(id);
        Ok(MutationOutcome::Applied)
    }

    fn insert_slot(&mut self, mut slot: UnitSlot) {
        if let Err(error) = slot.ensure_initialized(&self.owner) {
            tracing::warn!("Unit '{}' failed to initialize: {}", slot.label(), error);
        }
        self.units.insert(slot.id, slot);
    }

    fn remove_slot(&mut self, id: UnitId) {
        if let Some(mut slot) = self.units.shift_remove(&id) {
            if slot.unit().is_playing() {
                slot.unit_mut().stop([0.0; 3]);
            }
        }
    }

    fn apply_pending(&mut self) {
        for mutation in std::mem::take(&mut self.pending) {
            match mutation {
                PendingMutation::Add(slot) => self.insert_slot(slot),
                PendingMutation::Remove(id) => self.remove_slot(id),
            }
        }
    }

    /// Number of units in the sequence
    pub fn unit_count(&self) -> usize {
        self.units.len()
    }

    /// Number of structural edits waiting for the player to be idle
    pub fn pending_mutation_count(&self) -> usize {
        self.pending.len()
    }

    /// Units in sequence order
    pub fn units(&self) -> impl Iterator<Item = &UnitSlot> {
        self.units.values()
    }

    /// Get a unit slot
    pub fn unit(&self, id: UnitId) -> Option<&UnitSlot> {
        self.units.get(&id)
    }

    /// Get a unit slot for editing. Unavailable while a pass is active.
    pub fn unit_mut(&mut self, id: UnitId) -> Option<&mut UnitSlot> {
        if self.is_playing {
            return None;
        }
        self.units.get_mut(&id)
    }

    /// Run one-time setup on every unit
    pub fn initialize(&mut self) {
        for slot in self.units.values_mut() {
            if let Err(error) = slot.ensure_initialized(&self.owner) {
                tracing::warn!("Unit '{}' failed to initialize: {}", slot.label(), error);
            }
        }
    }

    // --- Transport --------------------------------------------------------

    /// Start a pass. Returns false if the call was rejected.
    pub fn play(&mut self, origin: Point, intensity: Option<f32>) -> bool {
        if self.is_playing && !self.can_play_while_already_playing {
            tracing::debug!("Play rejected on '{}': already playing", self.owner.name);
            self.events.push(PlayerEvent::PlayRejected(RejectReason::AlreadyPlaying));
            return false;
        }
        if self.is_in_cooldown() {
            tracing::debug!("Play rejected on '{}': cooldown", self.owner.name);
            self.events.push(PlayerEvent::PlayRejected(RejectReason::Cooldown));
            return false;
        }

        self.initialize();

        let id = PassId(self.next_pass);
        self.next_pass += 1;
        let intensity = intensity.unwrap_or(1.0) * self.intensity;
        self.passes.push(Pass::new(
            id,
            self.units.len(),
            self.direction,
            intensity,
            origin,
            self.initial_delay,
        ));
        self.last_play_timestamp = Some(self.clock);
        self.is_playing = true;
        self.events.push(PlayerEvent::SequenceStarted { pass: id });
        tracing::info!(
            "Playing '{}' {:?} at intensity {:.2} (pass {})",
            self.owner.name,
            self.direction,
            intensity,
            id.0
        );

        // Instant units fire in the same frame as the Play call
        if !self.paused {
            self.advance_passes(&TickTimes::default());
        }
        true
    }

    /// Stop every pass and interrupt units that honor stops
    pub fn stop(&mut self, origin: Point) {
        for slot in self.units.values_mut() {
            if slot.timing.interrupts_on_stop && slot.unit().is_playing() {
                slot.unit_mut().stop(origin);
            }
        }
        let was_active = self.is_playing;
        self.passes.clear();
        self.is_playing = false;
        self.paused = false;
        self.set_holding(false);
        self.apply_pending();
        if was_active {
            tracing::info!("Stopped '{}'", self.owner.name);
            self.events.push(PlayerEvent::Stopped);
        }
    }

    /// Freeze tick advancement. Only valid while playing.
    pub fn pause(&mut self) -> bool {
        if !self.is_playing || self.paused {
            return false;
        }
        self.paused = true;
        self.events.push(PlayerEvent::Paused);
        true
    }

    /// Unfreeze tick advancement
    pub fn resume(&mut self) -> bool {
        if !self.paused {
            return false;
        }
        self.paused = false;
        self.events.push(PlayerEvent::Resumed);
        true
    }

    /// Flip the global direction.
    ///
    /// Running passes keep their traversal order, but units they have not
    /// started yet are gated against the new direction.
    pub fn revert(&mut self) {
        self.direction = self.direction.reversed();
        tracing::debug!("'{}' direction is now {:?}", self.owner.name, self.direction);
        self.events.push(PlayerEvent::DirectionChanged(self.direction));
    }

    /// Restore every unit's targets. Fails while a pass is active.
    pub fn reset_all(&mut self) -> Result<()> {
        if self.is_playing {
            return Err(FeedbackError::Busy);
        }
        for slot in self.units.values_mut() {
            slot.reset();
        }
        self.passes.clear();
        tracing::info!("Reset '{}'", self.owner.name);
        self.events.push(PlayerEvent::Reset);
        Ok(())
    }

    /// Advance the player by one host frame
    pub fn tick(&mut self, dt: f32) {
        let dt = dt.max(0.0);
        self.clock += f64::from(dt);
        if self.paused {
            return;
        }

        let times = TickTimes::new(dt, self.time_scale, self.duration_multiplier);
        for slot in self.units.values_mut() {
            if slot.unit().is_playing() {
                let unit_dt = times.for_mode(slot.timing.time_scale_mode);
                slot.unit_mut().update(unit_dt);
            }
        }

        self.advance_passes(&times);
    }

    fn advance_passes(&mut self, times: &TickTimes) {
        if self.passes.is_empty() {
            return;
        }

        let mut holding = false;
        let mut completed = Vec::new();
        for pass in &mut self.passes {
            match pass.advance(&mut self.units, times, self.direction, self.clock, &self.owner, &mut self.events) {
                PassStatus::Complete => completed.push(pass.id()),
                PassStatus::Running { holding: h } => holding |= h,
                PassStatus::Delaying => {}
            }
        }
        self.set_holding(holding);

        if completed.is_empty() {
            return;
        }
        self.passes.retain(|pass| !completed.contains(&pass.id()));
        for id in completed {
            tracing::debug!("'{}' completed pass {}", self.owner.name, id.0);
            self.events.push(PlayerEvent::SequenceCompleted { pass: id });
            if self.auto_reverse_on_end {
                self.revert();
            }
        }

        if self.passes.is_empty() {
            self.is_playing = false;
            self.paused = false;
            self.apply_pending();
        }
    }

    fn set_holding(&mut self, holding: bool) {
        if holding == self.holding {
            return;
        }
        self.holding = holding;
        self.events.push(if holding {
            PlayerEvent::HoldingPauseEntered
        } else {
            PlayerEvent::HoldingPauseExited
        });
    }

    /// Play and tick until the pass completes.
    ///
    /// Returns the number of ticks run. Unbounded sequences are rejected
    /// before anything plays.
    pub fn play_to_completion(
        &mut self,
        origin: Point,
        intensity: Option<f32>,
        dt: f32,
        max_ticks: u64,
    ) -> Result<u64> {
        if self.is_unbounded() {
            return Err(FeedbackError::Unbounded);
        }
        self.play(origin, intensity);

        let mut ticks = 0;
        while self.is_playing {
            if ticks >= max_ticks {
                return Err(FeedbackError::TickBudgetExceeded(max_ticks));
            }
            self.tick(dt);
            ticks += 1;
        }
        Ok(ticks)
    }

    // --- Queries ----------------------------------------------------------

    /// Whether a pass is active
    pub fn is_playing(&self) -> bool {
        self.is_playing
    }

    /// Whether ticks are frozen
    pub fn is_paused(&self) -> bool {
        self.paused
    }

    /// Whether a holding pause is blocking downstream units
    pub fn is_in_holding_pause(&self) -> bool {
        self.holding
    }

    /// Whether the player cooldown rejects Play right now
    pub fn is_in_cooldown(&self) -> bool {
        self.last_play_timestamp
            .is_some_and(|last| self.clock - last < f64::from(self.cooldown))
    }

    /// Coarse transport state
    pub fn state(&self) -> PlayerState {
        if self.is_playing {
            if self.paused {
                PlayerState::Paused
            } else if self.passes.iter().all(Pass::is_delaying) {
                PlayerState::Delaying
            } else {
                PlayerState::Playing
            }
        } else if self.is_in_cooldown() {
            PlayerState::Cooldown
        } else {
            PlayerState::Idle
        }
    }

    /// Global direction for new passes
    pub fn direction(&self) -> Direction {
        self.direction
    }

    /// Set the global direction
    pub fn set_direction(&mut self, direction: Direction) {
        if direction != self.direction {
            self.revert();
        }
    }

    /// Player clock, in seconds of host time
    pub fn clock(&self) -> f64 {
        self.clock
    }

    /// Time of the last accepted Play
    pub fn last_play_timestamp(&self) -> Option<f64> {
        self.last_play_timestamp
    }

    /// Active passes
    pub fn passes(&self) -> &[Pass] {
        &self.passes
    }

    /// Duration multiplier
    pub fn duration_multiplier(&self) -> f32 {
        self.duration_multiplier
    }

    /// Set the duration multiplier
    pub fn set_duration_multiplier(&mut self, multiplier: f32) {
        self.duration_multiplier = multiplier.max(MIN_DURATION_MULTIPLIER);
    }

    /// Time scale
    pub fn time_scale(&self) -> f32 {
        self.time_scale
    }

    /// Set time scale (clamped to reasonable range)
    pub fn set_time_scale(&mut self, scale: f32) {
        self.time_scale = scale.clamp(0.0, MAX_TIME_SCALE);
    }

    /// Sum of every contributing unit's timeline, scaled by the duration
    /// multiplier, or [`UNBOUNDED`]
    pub fn total_duration(&self) -> f32 {
        let total: f32 = self.units.values().map(UnitSlot::total_duration).sum();
        if total.is_infinite() {
            return UNBOUNDED;
        }
        total * self.duration_multiplier
    }

    /// Whether a pass can never end on its own.
    ///
    /// Unlike [`Player::total_duration`], this also looks at units left out
    /// of the duration sum.
    pub fn is_unbounded(&self) -> bool {
        self.units
            .values()
            .any(|slot| slot.active && (slot.timing.is_unbounded() || slot.unit().is_unbounded()))
    }

    /// Total duration for call sites that need a finite answer
    pub fn try_total_duration(&self) -> Result<f32> {
        let total = self.total_duration();
        if total.is_finite() {
            Ok(total)
        } else {
            Err(FeedbackError::Unbounded)
        }
    }

    /// Get pending events and clear them
    pub fn take_events(&mut self) -> Vec<PlayerEvent> {
        std::mem::take(&mut self.events)
    }
}

impl std::fmt::Debug for Player {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Player")
            .field("name", &self.owner.name)
            .field("units", &self.units.len())
            .field("passes", &self.passes.len())
            .field("direction", &self.direction)
            .field("state", &self.state())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::timing::TimingPolicy;
    use crate::units::{CallbackUnit, HoldingPause};
    use std::sync::atomic::{AtomicU32, Ordering};
    use std::sync::Arc;

    fn counter_unit(counter: &Arc<AtomicU32>) -> UnitSlot {
        let counter = counter.clone();
        UnitSlot::new(CallbackUnit::new("count", move |_| {
            counter.fetch_add(1, Ordering::SeqCst);
        }))
    }

    #[test]
    fn test_instant_sequence_completes_on_play() {
        let counter = Arc::new(AtomicU32::new(0));
        let mut player = Player::new("test");
        player.add_unit(counter_unit(&counter));
        player.add_unit(counter_unit(&counter));

        assert!(player.play([0.0; 3], None));
        assert_eq!(counter.load(Ordering::SeqCst), 2);
        assert!(!player.is_playing());

        let events = player.take_events();
        assert_eq!(events.first(), Some(&PlayerEvent::SequenceStarted { pass: PassId(0) }));
        assert_eq!(events.last(), Some(&PlayerEvent::SequenceCompleted { pass: PassId(0) }));
    }

    #[test]
    fn test_play_rejected_while_playing() {
        let mut player = Player::new("test");
        player.can_play_while_already_playing = false;
        player.add_unit(UnitSlot::new(HoldingPause::new(1.0)));

        assert!(player.play([0.0; 3], None));
        assert!(player.is_playing());
        assert!(!player.play([0.0; 3], None));
        assert!(player
            .take_events()
            .contains(&PlayerEvent::PlayRejected(RejectReason::AlreadyPlaying)));
        assert_eq!(player.passes().len(), 1);
    }

    #[test]
    fn test_overlapping_passes() {
        let mut player = Player::new("test");
        player.add_unit(UnitSlot::new(HoldingPause::new(1.0)));
        assert!(player.play([0.0; 3], None));
        player.tick(0.1);
        assert!(player.play([0.0; 3], None));
        assert_eq!(player.passes().len(), 2);
    }

    #[test]
    fn test_player_cooldown() {
        let counter = Arc::new(AtomicU32::new(0));
        let mut player = Player::new("test");
        player.cooldown = 1.0;
        player.add_unit(counter_unit(&counter));

        assert!(player.play([0.0; 3], None));
        player.tick(0.5);
        assert!(!player.play([0.0; 3], None));
        assert_eq!(player.state(), PlayerState::Cooldown);
        player.tick(0.6);
        assert!(player.play([0.0; 3], None));
        assert_eq!(counter.load(Ordering::SeqCst), 2);
    }

    #[test]
    fn test_initial_delay() {
        let counter = Arc::new(AtomicU32::new(0));
        let mut player = Player::new("test");
        player.initial_delay = 0.25;
        player.add_unit(counter_unit(&counter));

        player.play([0.0; 3], None);
        assert_eq!(player.state(), PlayerState::Delaying);
        assert_eq!(counter.load(Ordering::SeqCst), 0);
        player.tick(0.1);
        player.tick(0.1);
        assert_eq!(counter.load(Ordering::SeqCst), 0);
        player.tick(0.1);
        assert_eq!(counter.load(Ordering::SeqCst), 1);
        assert!(!player.is_playing());
    }

    #[test]
    fn test_pause_and_resume() {
        let mut player = Player::new("test");
        player.add_unit(UnitSlot::new(HoldingPause::new(0.5)));
        player.play([0.0; 3], None);

        assert!(player.pause());
        assert_eq!(player.state(), PlayerState::Paused);
        for _ in 0..20 {
            player.tick(0.1);
        }
        assert!(player.is_playing());

        assert!(player.resume());
        for _ in 0..6 {
            player.tick(0.1);
        }
        assert!(!player.is_playing());
    }

    #[test]
    fn test_stop() {
        let mut player = Player::new("test");
        player.add_unit(UnitSlot::new(HoldingPause::new(5.0)));
        player.play([0.0; 3], None);
        player.tick(0.1);
        assert!(player.is_in_holding_pause());

        player.stop([0.0; 3]);
        assert!(!player.is_playing());
        assert!(!player.is_in_holding_pause());
        assert!(player.take_events().contains(&PlayerEvent::Stopped));
    }

    #[test]
    fn test_reset_requires_idle() {
        let mut player = Player::new("test");
        player.add_unit(UnitSlot::new(HoldingPause::new(1.0)));
        player.play([0.0; 3], None);
        assert!(matches!(player.reset_all(), Err(FeedbackError::Busy)));
        player.stop([0.0; 3]);
        assert!(player.reset_all().is_ok());
    }

    #[test]
    fn test_mutations_are_queued_while_playing() {
        let counter = Arc::new(AtomicU32::new(0));
        let mut player = Player::new("test");
        let (pause_id, _) = player.add_unit(UnitSlot::new(HoldingPause::new(0.3)));
        player.play([0.0; 3], None);

        let (_, outcome) = player.add_unit(counter_unit(&counter));
        assert_eq!(outcome, MutationOutcome::Queued);
        assert_eq!(player.remove_unit(pause_id).unwrap(), MutationOutcome::Queued);
        assert_eq!(player.unit_count(), 1);
        assert!(player.unit_mut(pause_id).is_none());

        for _ in 0..5 {
            player.tick(0.1);
        }
        assert!(!player.is_playing());
        assert_eq!(player.unit_count(), 1);
        assert_eq!(player.pending_mutation_count(), 0);
        assert!(player.unit(pause_id).is_none());
        assert_eq!(counter.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn test_remove_unknown_unit() {
        let mut player = Player::new("test");
        assert!(matches!(
            player.remove_unit(UnitId::new()),
            Err(FeedbackError::UnitNotFound(_))
        ));
    }

    #[test]
    fn test_auto_reverse() {
        let mut player = Player::new("test");
        player.auto_reverse_on_end = true;
        player.add_unit(counter_unit(&Arc::new(AtomicU32::new(0))));
        player.play([0.0; 3], None);
        assert_eq!(player.direction(), Direction::Backward);
        player.play([0.0; 3], None);
        assert_eq!(player.direction(), Direction::Forward);
    }

    #[test]
    fn test_duration_multiplier_stretches_time() {
        let mut player = Player::new("test");
        player.set_duration_multiplier(2.0);
        player.add_unit(UnitSlot::new(HoldingPause::new(0.5)));
        assert!((player.total_duration() - 1.0).abs() < 1e-6);

        player.play([0.0; 3], None);
        for _ in 0..8 {
            player.tick(0.1);
        }
        assert!(player.is_playing());
        for _ in 0..4 {
            player.tick(0.1);
        }
        assert!(!player.is_playing());
    }

    #[test]
    fn test_uncounted_unit_still_unbounded() {
        let mut player = Player::new("test");
        player.add_unit(
            UnitSlot::new(HoldingPause::new(0.1))
                .with_timing(TimingPolicy::new().with_repeat_forever(0.0))
                .without_duration(),
        );
        assert_eq!(player.total_duration(), 0.0);
        assert!(player.is_unbounded());

        let (id, _) = player.add_unit(UnitSlot::new(HoldingPause::new(0.1)));
        for slot in player.units.values_mut() {
            slot.active = slot.id == id;
        }
        assert!(!player.is_unbounded());
    }

    #[test]
    fn test_instant_repeats_finish_with_play() {
        let counter = Arc::new(AtomicU32::new(0));
        let mut player = Player::new("test");
        player.add_unit(counter_unit(&counter).with_timing(TimingPolicy::new().with_repeats(3, 0.0)));
        assert_eq!(player.total_duration(), 0.0);

        player.play([0.0; 3], None);
        assert_eq!(counter.load(Ordering::SeqCst), 4);
        assert!(!player.is_playing());
    }

    #[test]
    fn test_time_scale_is_clamped() {
        let mut player = Player::new("test");
        player.set_time_scale(100.0);
        assert_eq!(player.time_scale(), MAX_TIME_SCALE);
        player.set_time_scale(-1.0);
        assert_eq!(player.time_scale(), 0.0);
    }
}
