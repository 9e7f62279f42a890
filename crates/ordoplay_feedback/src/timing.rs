// SPDX-License-Identifier: MIT OR Apache-2.0
//! Per-unit timing rules: delay, cooldown, repeat, direction and intensity gating.

use serde::{Deserialize, Serialize};

/// Sentinel reported for durations that never end
pub const UNBOUNDED: f32 = f32::INFINITY;

/// Playback direction
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Hash, Serialize, Deserialize)]
pub enum Direction {
    /// Top to bottom, progress 0 to 1
    #[default]
    Forward,
    /// Bottom to top, progress 1 to 0
    Backward,
}

impl Direction {
    /// The opposite direction
    pub fn reversed(self) -> Self {
        match self {
            Direction::Forward => Direction::Backward,
            Direction::Backward => Direction::Forward,
        }
    }

    /// Check if this is the backward direction
    pub fn is_backward(self) -> bool {
        self == Direction::Backward
    }
}

/// Which global directions a unit runs for
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum DirectionCondition {
    /// Runs in both directions
    #[default]
    Always,
    /// Runs only while the player plays forward
    OnlyForward,
    /// Runs only while the player plays backward
    OnlyBackward,
}

/// How a unit derives its own play direction from the global one
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum PlayDirectionMode {
    /// Same as the player
    #[default]
    FollowGlobal,
    /// Opposite of the player
    OppositeGlobal,
    /// Always forward
    AlwaysForward,
    /// Always backward
    AlwaysBackward,
}

/// Which clock drives a unit's delays and effect task
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum TimeScaleMode {
    /// Host delta multiplied by the player's time scale
    #[default]
    Scaled,
    /// Raw host delta
    Unscaled,
}

/// Timing rules attached 1:1 to a unit
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TimingPolicy {
    /// Delay before the first play, in seconds
    pub initial_delay: f32,
    /// Minimum time between two starts, in seconds
    pub cooldown_duration: f32,
    /// Extra plays after the first one
    pub repeat_count: u32,
    /// Repeat until stopped
    pub repeat_forever: bool,
    /// Pause between two repeats, in seconds
    pub delay_between_repeats: f32,
    /// Directions this unit runs for
    pub direction_condition: DirectionCondition,
    /// How the unit's own direction is resolved
    pub play_direction_mode: PlayDirectionMode,
    /// Ignore the intensity passed to Play
    pub constant_intensity: bool,
    /// Only run when the intensity falls in `[intensity_min, intensity_max)`
    pub use_intensity_interval: bool,
    /// Inclusive lower intensity bound
    pub intensity_min: f32,
    /// Exclusive upper intensity bound
    pub intensity_max: f32,
    /// Whether Stop on the player cuts this unit short
    pub interrupts_on_stop: bool,
    /// Clock driving the unit
    pub time_scale_mode: TimeScaleMode,
    /// Maximum number of starts until the player is reset
    pub max_play_count: Option<u32>,
}

impl Default for TimingPolicy {
    fn default() -> Self {
        Self {
            initial_delay: 0.0,
            cooldown_duration: 0.0,
            repeat_count: 0,
            repeat_forever: false,
            delay_between_repeats: 0.0,
            direction_condition: DirectionCondition::Always,
            play_direction_mode: PlayDirectionMode::FollowGlobal,
            constant_intensity: false,
            use_intensity_interval: false,
            intensity_min: 0.0,
            intensity_max: 1.0,
            interrupts_on_stop: true,
            time_scale_mode: TimeScaleMode::Scaled,
            max_play_count: None,
        }
    }
}

impl TimingPolicy {
    /// Create the default policy
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the initial delay
    pub fn with_initial_delay(mut self, delay: f32) -> Self {
        self.initial_delay = delay.max(0.0);
        self
    }

    /// Set the cooldown
    pub fn with_cooldown(mut self, cooldown: f32) -> Self {
        self.cooldown_duration = cooldown.max(0.0);
        self
    }

    /// Set a finite repeat count and the delay between repeats
    pub fn with_repeats(mut self, count: u32, delay_between: f32) -> Self {
        self.repeat_count = count;
        self.repeat_forever = false;
        self.delay_between_repeats = delay_between.max(0.0);
        self
    }

    /// Repeat until stopped
    pub fn with_repeat_forever(mut self, delay_between: f32) -> Self {
        self.repeat_forever = true;
        self.delay_between_repeats = delay_between.max(0.0);
        self
    }

    /// Set the direction condition
    pub fn with_direction_condition(mut self, condition: DirectionCondition) -> Self {
        self.direction_condition = condition;
        self
    }

    /// Set the play direction mode
    pub fn with_play_direction_mode(mut self, mode: PlayDirectionMode) -> Self {
        self.play_direction_mode = mode;
        self
    }

    /// Gate on an intensity interval `[min, max)`
    pub fn with_intensity_interval(mut self, min: f32, max: f32) -> Self {
        self.use_intensity_interval = true;
        self.intensity_min = min;
        self.intensity_max = max;
        self
    }

    /// Set whether Stop interrupts this unit
    pub fn with_interrupts_on_stop(mut self, interrupts: bool) -> Self {
        self.interrupts_on_stop = interrupts;
        self
    }

    /// Set the clock driving this unit
    pub fn with_time_scale_mode(mut self, mode: TimeScaleMode) -> Self {
        self.time_scale_mode = mode;
        self
    }

    /// Check whether the unit runs for the given global direction
    pub fn should_run_for_direction(&self, global: Direction) -> bool {
        match self.direction_condition {
            DirectionCondition::Always => true,
            DirectionCondition::OnlyForward => global == Direction::Forward,
            DirectionCondition::OnlyBackward => global == Direction::Backward,
        }
    }

    /// Resolve the unit's own play direction
    pub fn effective_play_direction(&self, global: Direction) -> Direction {
        match self.play_direction_mode {
            PlayDirectionMode::FollowGlobal => global,
            PlayDirectionMode::OppositeGlobal => global.reversed(),
            PlayDirectionMode::AlwaysForward => Direction::Forward,
            PlayDirectionMode::AlwaysBackward => Direction::Backward,
        }
    }

    /// Check the intensity interval
    pub fn passes_intensity_gate(&self, intensity: f32) -> bool {
        !self.use_intensity_interval
            || (intensity >= self.intensity_min && intensity < self.intensity_max)
    }

    /// Intensity handed to the unit
    pub fn effective_intensity(&self, intensity: f32) -> f32 {
        if self.constant_intensity {
            1.0
        } else {
            intensity
        }
    }

    /// Check whether a unit started at `last_start` is still cooling down at `now`
    pub fn is_in_cooldown(&self, now: f64, last_start: Option<f64>) -> bool {
        match last_start {
            Some(last) => now - last < f64::from(self.cooldown_duration),
            None => false,
        }
    }

    /// Check whether the play-count limit is reached
    pub fn is_play_count_exhausted(&self, play_count: u32) -> bool {
        self.max_play_count.is_some_and(|max| play_count >= max)
    }

    /// Whether this policy never reaches a terminal state on its own
    pub fn is_unbounded(&self) -> bool {
        self.repeat_forever
    }

    /// Time this unit occupies on the timeline, or [`UNBOUNDED`]
    pub fn compute_total_duration(&self, intrinsic_duration: f32) -> f32 {
        if self.repeat_forever {
            return UNBOUNDED;
        }
        let intrinsic = intrinsic_duration.max(0.0);
        self.initial_delay
            + intrinsic
            + self.repeat_count as f32 * (intrinsic + self.delay_between_repeats)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_total_duration_with_repeats() {
        let timing = TimingPolicy::new()
            .with_initial_delay(0.5)
            .with_repeats(3, 1.0);
        assert!((timing.compute_total_duration(2.0) - 11.5).abs() < 1e-5);
    }

    #[test]
    fn test_total_duration_repeat_forever() {
        let timing = TimingPolicy::new().with_repeat_forever(0.2);
        assert_eq!(timing.compute_total_duration(1.0), UNBOUNDED);
        assert!(timing.is_unbounded());
    }

    #[test]
    fn test_direction_condition() {
        let timing = TimingPolicy::new().with_direction_condition(DirectionCondition::OnlyForward);
        assert!(timing.should_run_for_direction(Direction::Forward));
        assert!(!timing.should_run_for_direction(Direction::Backward));

        let timing = TimingPolicy::new().with_direction_condition(DirectionCondition::OnlyBackward);
        assert!(!timing.should_run_for_direction(Direction::Forward));
        assert!(timing.should_run_for_direction(Direction::Backward));
    }

    #[test]
    fn test_effective_play_direction() {
        let mut timing = TimingPolicy::new();
        assert_eq!(timing.effective_play_direction(Direction::Backward), Direction::Backward);

        timing.play_direction_mode = PlayDirectionMode::OppositeGlobal;
        assert_eq!(timing.effective_play_direction(Direction::Forward), Direction::Backward);

        timing.play_direction_mode = PlayDirectionMode::AlwaysForward;
        assert_eq!(timing.effective_play_direction(Direction::Backward), Direction::Forward);

        timing.play_direction_mode = PlayDirectionMode::AlwaysBackward;
        assert_eq!(timing.effective_play_direction(Direction::Forward), Direction::Backward);
    }

    #[test]
    fn test_intensity_gate() {
        let timing = TimingPolicy::new().with_intensity_interval(0.5, 1.0);
        assert!(!timing.passes_intensity_gate(0.3));
        assert!(timing.passes_intensity_gate(0.5));
        assert!(timing.passes_intensity_gate(0.7));
        assert!(!timing.passes_intensity_gate(1.0));

        assert!(TimingPolicy::new().passes_intensity_gate(42.0));
    }

    #[test]
    fn test_cooldown() {
        let timing = TimingPolicy::new().with_cooldown(1.0);
        assert!(!timing.is_in_cooldown(5.0, None));
        assert!(timing.is_in_cooldown(5.5, Some(5.0)));
        assert!(!timing.is_in_cooldown(6.0, Some(5.0)));
    }

    #[test]
    fn test_play_count_limit() {
        let mut timing = TimingPolicy::new();
        assert!(!timing.is_play_count_exhausted(1000));
        timing.max_play_count = Some(2);
        assert!(!timing.is_play_count_exhausted(1));
        assert!(timing.is_play_count_exhausted(2));
    }

    #[test]
    fn test_serialization() {
        let timing = TimingPolicy::new().with_repeats(2, 0.25).with_intensity_interval(0.1, 0.9);
        let ron_str = ron::ser::to_string_pretty(&timing, ron::ser::PrettyConfig::default()).unwrap();
        let loaded: TimingPolicy = ron::from_str(&ron_str).unwrap();
        assert_eq!(loaded, timing);
    }
}
