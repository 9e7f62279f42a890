// SPDX-License-Identifier: MIT OR Apache-2.0
//! Value tweens over a shared float target.

use crate::error::UnitError;
use crate::task::TimedTask;
use crate::unit::{OwnerInfo, PlayContext, Point, Unit};
use parking_lot::RwLock;
use std::sync::Arc;

/// Linear interpolation between two floats
pub(crate) fn lerp(a: f32, b: f32, t: f32) -> f32 {
    a + (b - a) * t
}

/// A float owned by the host and driven by units or responders
#[derive(Debug, Clone, Default)]
pub struct SharedValue(Arc<RwLock<f32>>);

impl SharedValue {
    /// Create a shared value
    pub fn new(value: f32) -> Self {
        Self(Arc::new(RwLock::new(value)))
    }

    /// Current value
    pub fn get(&self) -> f32 {
        *self.0.read()
    }

    /// Overwrite the value
    pub fn set(&self, value: f32) {
        *self.0.write() = value;
    }
}

/// Moves a shared value from `from` to `to` over its duration.
///
/// Backward plays run the same curve from `to` to `from`. Intensity scales
/// the travelled distance.
#[derive(Debug, Clone)]
pub struct ValueTween {
    label: String,
    target: Option<SharedValue>,
    from: f32,
    to: f32,
    duration: f32,
    intensity: f32,
    baseline: Option<f32>,
    task: TimedTask,
}

impl ValueTween {
    /// Create a tween without a target
    pub fn new(label: impl Into<String>, from: f32, to: f32, duration: f32) -> Self {
        Self {
            label: label.into(),
            target: None,
            from,
            to,
            duration: duration.max(0.0),
            intensity: 1.0,
            baseline: None,
            task: TimedTask::new(),
        }
    }

    /// Set the driven value
    pub fn with_target(mut self, target: SharedValue) -> Self {
        self.target = Some(target);
        self
    }

    /// Normalized progress of the current play
    pub fn progress(&self) -> f32 {
        self.task.progress()
    }

    fn apply(&self) {
        if let Some(target) = &self.target {
            let full = lerp(self.from, self.to, self.task.progress());
            target.set(lerp(self.from, full, self.intensity));
        }
    }
}

impl Unit for ValueTween {
    fn label(&self) -> &str {
        &self.label
    }

    fn initialize(&mut self, _owner: &OwnerInfo) -> Result<(), UnitError> {
        if self.baseline.is_none() {
            self.baseline = self.target.as_ref().map(SharedValue::get);
        }
        Ok(())
    }

    fn validate(&self) -> Result<(), UnitError> {
        if self.target.is_none() {
            return Err(UnitError::MissingTarget(format!("'{}' has no value to drive", self.label)));
        }
        if !self.from.is_finite() || !self.to.is_finite() {
            return Err(UnitError::InvalidParameter(format!(
                "'{}' has a non-finite endpoint",
                self.label
            )));
        }
        Ok(())
    }

    fn play(&mut self, ctx: &PlayContext) -> Result<(), UnitError> {
        self.validate()?;
        self.intensity = ctx.intensity;
        self.task.start(self.duration, ctx.direction);
        self.apply();
        Ok(())
    }

    fn update(&mut self, dt: f32) {
        self.task.advance(dt);
        self.apply();
    }

    fn is_playing(&self) -> bool {
        self.task.is_running()
    }

    fn stop(&mut self, _origin: Point) {
        self.task.cancel();
    }

    fn reset_unit(&mut self) {
        self.task.cancel();
        if let (Some(target), Some(baseline)) = (&self.target, self.baseline) {
            target.set(baseline);
        }
    }

    fn duration(&self) -> f32 {
        self.duration
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::timing::Direction;

    fn ctx(direction: Direction, intensity: f32) -> PlayContext {
        PlayContext {
            origin: [0.0; 3],
            intensity,
            direction,
        }
    }

    #[test]
    fn test_missing_target() {
        let mut tween = ValueTween::new("fade", 0.0, 1.0, 1.0);
        assert!(matches!(tween.validate(), Err(UnitError::MissingTarget(_))));
        assert!(tween.play(&ctx(Direction::Forward, 1.0)).is_err());
    }

    #[test]
    fn test_non_finite_endpoint() {
        let tween = ValueTween::new("fade", 0.0, f32::NAN, 1.0).with_target(SharedValue::new(0.0));
        assert!(matches!(tween.validate(), Err(UnitError::InvalidParameter(_))));
    }

    #[test]
    fn test_forward_and_backward() {
        let value = SharedValue::new(0.0);
        let mut tween = ValueTween::new("fade", 0.0, 10.0, 1.0).with_target(value.clone());

        tween.play(&ctx(Direction::Forward, 1.0)).unwrap();
        tween.update(0.25);
        assert!((value.get() - 2.5).abs() < 1e-5);

        tween.play(&ctx(Direction::Backward, 1.0)).unwrap();
        assert!((value.get() - 10.0).abs() < 1e-5);
        tween.update(0.25);
        assert!((value.get() - 7.5).abs() < 1e-5);
    }

    #[test]
    fn test_intensity_scales_distance() {
        let value = SharedValue::new(0.0);
        let mut tween = ValueTween::new("fade", 0.0, 10.0, 1.0).with_target(value.clone());
        tween.play(&ctx(Direction::Forward, 0.5)).unwrap();
        tween.update(1.0);
        assert!((value.get() - 5.0).abs() < 1e-5);
    }

    #[test]
    fn test_reset_restores_baseline() {
        let value = SharedValue::new(3.0);
        let mut tween = ValueTween::new("fade", 0.0, 10.0, 1.0).with_target(value.clone());
        let owner = OwnerInfo { name: "test".into() };
        tween.initialize(&owner).unwrap();
        tween.play(&ctx(Direction::Forward, 1.0)).unwrap();
        tween.update(0.5);
        assert!((value.get() - 5.0).abs() < 1e-5);

        // A second initialize must not capture the modified value
        tween.initialize(&owner).unwrap();
        tween.reset_unit();
        assert_eq!(value.get(), 3.0);
    }
}
