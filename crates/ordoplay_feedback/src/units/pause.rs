// SPDX-License-Identifier: MIT OR Apache-2.0
//! Units that shape the sequence rather than produce an effect.

use crate::error::UnitError;
use crate::task::TimedTask;
use crate::timing::Direction;
use crate::unit::{LoopSpec, PlayContext, Point, Unit, UnitKind};

/// Barrier that blocks every later unit until it is done
#[derive(Debug, Clone)]
pub struct HoldingPause {
    label: String,
    duration: f32,
    wait_for_preceding: bool,
    task: TimedTask,
}

impl HoldingPause {
    /// A pause holding for `duration` seconds
    pub fn new(duration: f32) -> Self {
        Self {
            label: "Holding Pause".to_string(),
            duration: duration.max(0.0),
            wait_for_preceding: false,
            task: TimedTask::new(),
        }
    }

    /// Also hold until every earlier unit has finished
    pub fn waiting_for_preceding(mut self) -> Self {
        self.wait_for_preceding = true;
        self
    }

    /// Set the label
    pub fn with_label(mut self, label: impl Into<String>) -> Self {
        self.label = label.into();
        self
    }
}

impl Unit for HoldingPause {
    fn label(&self) -> &str {
        &self.label
    }

    fn kind(&self) -> UnitKind {
        UnitKind::HoldingPause {
            wait_for_preceding: self.wait_for_preceding,
        }
    }

    fn play(&mut self, _ctx: &PlayContext) -> Result<(), UnitError> {
        // Pauses hold for wall time in either direction
        self.task.start(self.duration, Direction::Forward);
        Ok(())
    }

    fn update(&mut self, dt: f32) {
        self.task.advance(dt);
    }

    fn is_playing(&self) -> bool {
        self.task.is_running()
    }

    fn stop(&mut self, _origin: Point) {
        self.task.cancel();
    }

    fn reset_unit(&mut self) {
        self.task.cancel();
    }

    fn duration(&self) -> f32 {
        self.duration
    }
}

/// Marker a [`Looper`] jumps back to
#[derive(Debug, Clone, Default)]
pub struct LoopStart;

impl Unit for LoopStart {
    fn label(&self) -> &str {
        "Loop Start"
    }

    fn kind(&self) -> UnitKind {
        UnitKind::LoopStart
    }

    fn play(&mut self, _ctx: &PlayContext) -> Result<(), UnitError> {
        Ok(())
    }
}

/// Pause that sends the pass back to the last loop start when it ends
#[derive(Debug, Clone)]
pub struct Looper {
    label: String,
    pause: HoldingPause,
    spec: LoopSpec,
}

impl Looper {
    /// Pause for `duration`, then jump back `loops` times (`None` forever)
    pub fn new(duration: f32, loops: Option<u32>) -> Self {
        Self {
            label: "Looper".to_string(),
            pause: HoldingPause::new(duration),
            spec: LoopSpec {
                loops,
                jump_to_last_pause: false,
            },
        }
    }

    /// Jump to the last holding pause instead of the last loop start
    pub fn jumping_to_last_pause(mut self) -> Self {
        self.spec.jump_to_last_pause = true;
        self
    }

    /// Set the label
    pub fn with_label(mut self, label: impl Into<String>) -> Self {
        self.label = label.into();
        self
    }
}

impl Unit for Looper {
    fn label(&self) -> &str {
        &self.label
    }

    fn kind(&self) -> UnitKind {
        UnitKind::Looper(self.spec)
    }

    fn play(&mut self, ctx: &PlayContext) -> Result<(), UnitError> {
        self.pause.play(ctx)
    }

    fn update(&mut self, dt: f32) {
        self.pause.update(dt);
    }

    fn is_playing(&self) -> bool {
        self.pause.is_playing()
    }

    fn stop(&mut self, origin: Point) {
        self.pause.stop(origin);
    }

    fn reset_unit(&mut self) {
        self.pause.reset_unit();
    }

    fn duration(&self) -> f32 {
        self.pause.duration()
    }

    fn is_unbounded(&self) -> bool {
        self.spec.loops.is_none()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ctx() -> PlayContext {
        PlayContext {
            origin: [0.0; 3],
            intensity: 1.0,
            direction: Direction::Backward,
        }
    }

    #[test]
    fn test_holding_pause_runs_for_duration() {
        let mut pause = HoldingPause::new(0.5);
        pause.play(&ctx()).unwrap();
        assert!(pause.is_playing());
        pause.update(0.3);
        assert!(pause.is_playing());
        pause.update(0.3);
        assert!(!pause.is_playing());
    }

    #[test]
    fn test_zero_pause_is_instant() {
        let mut pause = HoldingPause::new(0.0);
        pause.play(&ctx()).unwrap();
        assert!(!pause.is_playing());
    }

    #[test]
    fn test_looper_kind() {
        let looper = Looper::new(0.1, Some(2)).jumping_to_last_pause();
        assert_eq!(
            looper.kind(),
            UnitKind::Looper(LoopSpec {
                loops: Some(2),
                jump_to_last_pause: true
            })
        );
        assert!(!looper.is_unbounded());
        assert!(Looper::new(0.1, None).is_unbounded());
    }
}
