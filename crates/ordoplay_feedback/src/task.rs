// SPDX-License-Identifier: MIT OR Apache-2.0
//! Cooperative timed tasks.
//!
//! Time-extended effects never block. They embed a [`TimedTask`], start it
//! from `play`, and advance it once per tick from `update`. Backward tasks
//! run the same timeline with progress going from 1 to 0.

use crate::timing::Direction;

/// A small per-tick state machine tracking elapsed time over a duration
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct TimedTask {
    duration: f32,
    elapsed: f32,
    direction: Direction,
    running: bool,
}

impl TimedTask {
    /// Create an idle task
    pub fn new() -> Self {
        Self::default()
    }

    /// Start (or restart) the task
    pub fn start(&mut self, duration: f32, direction: Direction) {
        self.duration = duration.max(0.0);
        self.elapsed = 0.0;
        self.direction = direction;
        self.running = self.duration > 0.0;
    }

    /// Advance by `dt` seconds. Returns true on the tick the task finishes.
    pub fn advance(&mut self, dt: f32) -> bool {
        if !self.running {
            return false;
        }
        self.elapsed = (self.elapsed + dt.max(0.0)).min(self.duration);
        if self.elapsed >= self.duration {
            self.running = false;
            return true;
        }
        false
    }

    /// Cancel without reaching the end
    pub fn cancel(&mut self) {
        self.running = false;
    }

    /// Whether the task is still in flight
    pub fn is_running(&self) -> bool {
        self.running
    }

    /// Seconds elapsed since start
    pub fn elapsed(&self) -> f32 {
        self.elapsed
    }

    /// Task duration in seconds
    pub fn duration(&self) -> f32 {
        self.duration
    }

    /// Direction the task was started with
    pub fn direction(&self) -> Direction {
        self.direction
    }

    /// Normalized progress, 0 to 1 forward and 1 to 0 backward
    pub fn progress(&self) -> f32 {
        let linear = if self.duration > 0.0 {
            (self.elapsed / self.duration).clamp(0.0, 1.0)
        } else {
            1.0
        };
        match self.direction {
            Direction::Forward => linear,
            Direction::Backward => 1.0 - linear,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_forward_progress() {
        let mut task = TimedTask::new();
        task.start(2.0, Direction::Forward);
        assert!(task.is_running());
        assert_eq!(task.progress(), 0.0);

        assert!(!task.advance(0.5));
        assert!((task.progress() - 0.25).abs() < 1e-6);

        assert!(task.advance(2.0));
        assert!(!task.is_running());
        assert_eq!(task.progress(), 1.0);
        assert!(!task.advance(1.0));
    }

    #[test]
    fn test_backward_progress_mirrors_forward() {
        let mut forward = TimedTask::new();
        let mut backward = TimedTask::new();
        forward.start(2.0, Direction::Forward);
        backward.start(2.0, Direction::Backward);
        assert_eq!(backward.progress(), 1.0);

        backward.advance(0.5);
        forward.advance(1.5);
        assert!((backward.progress() - forward.progress()).abs() < 1e-6);
        assert!((backward.progress() - 0.75).abs() < 1e-6);
    }

    #[test]
    fn test_zero_duration_is_instant() {
        let mut task = TimedTask::new();
        task.start(0.0, Direction::Forward);
        assert!(!task.is_running());
        assert_eq!(task.progress(), 1.0);

        task.start(0.0, Direction::Backward);
        assert_eq!(task.progress(), 0.0);
    }

    #[test]
    fn test_cancel() {
        let mut task = TimedTask::new();
        task.start(1.0, Direction::Forward);
        task.advance(0.4);
        task.cancel();
        assert!(!task.is_running());
        assert!((task.elapsed() - 0.4).abs() < 1e-6);
    }
}
