// SPDX-License-Identifier: MIT OR Apache-2.0
//! Units that reach shared targets through a broadcast channel.

use super::tween::{lerp, SharedValue};
use crate::broadcast::{BroadcastChannel, BroadcastKind, BroadcastPayload, ChannelId, Responder};
use crate::error::UnitError;
use crate::task::TimedTask;
use crate::unit::{PlayContext, Point, Unit};

/// Publishes play/stop/reset payloads on a channel.
///
/// The unit itself holds no target; it stays playing for the declared
/// effect duration so barriers can wait for the responders' effect.
#[derive(Debug, Clone)]
pub struct BroadcastUnit {
    label: String,
    channel: Option<BroadcastChannel>,
    channel_id: ChannelId,
    duration: f32,
    task: TimedTask,
}

impl BroadcastUnit {
    /// Create a broadcast unit without a channel
    pub fn new(label: impl Into<String>, channel_id: ChannelId, duration: f32) -> Self {
        Self {
            label: label.into(),
            channel: None,
            channel_id,
            duration: duration.max(0.0),
            task: TimedTask::new(),
        }
    }

    /// Set the channel to publish on
    pub fn with_channel(mut self, channel: BroadcastChannel) -> Self {
        self.channel = Some(channel);
        self
    }

    fn publish(&self, payload: BroadcastPayload) -> usize {
        match &self.channel {
            Some(channel) => channel.publish(self.channel_id, payload),
            None => 0,
        }
    }
}

impl Unit for BroadcastUnit {
    fn label(&self) -> &str {
        &self.label
    }

    fn validate(&self) -> Result<(), UnitError> {
        if self.channel.is_none() {
            return Err(UnitError::MissingTarget(format!("'{}' has no broadcast channel", self.label)));
        }
        Ok(())
    }

    fn play(&mut self, ctx: &PlayContext) -> Result<(), UnitError> {
        self.validate()?;
        let payload = BroadcastPayload::play(ctx.origin, ctx.intensity, self.duration, ctx.direction);
        let accepted = self.publish(payload);
        if accepted == 0 {
            tracing::debug!("'{}' reached no responder on {}", self.label, self.channel_id);
        }
        self.task.start(self.duration, ctx.direction);
        Ok(())
    }

    fn update(&mut self, dt: f32) {
        self.task.advance(dt);
    }

    fn is_playing(&self) -> bool {
        self.task.is_running()
    }

    fn stop(&mut self, origin: Point) {
        self.task.cancel();
        self.publish(BroadcastPayload::stop(origin));
    }

    fn reset_unit(&mut self) {
        self.task.cancel();
        self.publish(BroadcastPayload::reset());
    }

    fn duration(&self) -> f32 {
        self.duration
    }
}

fn distance(a: Point, b: Point) -> f32 {
    let dx = a[0] - b[0];
    let dy = a[1] - b[1];
    let dz = a[2] - b[2];
    (dx * dx + dy * dy + dz * dz).sqrt()
}

/// Responder remapping a play's progress onto a shared value
#[derive(Debug, Clone)]
pub struct ValueResponder {
    target: SharedValue,
    baseline: f32,
    /// Value at progress 0
    pub remap_zero: f32,
    /// Value at progress 1
    pub remap_one: f32,
    /// Responder position, for range gating
    pub position: Point,
    /// Reject plays originating farther than this
    pub range: Option<f32>,
    /// Restore the baseline when a play ends
    pub reset_after_play: bool,
    intensity: f32,
    task: TimedTask,
}

impl ValueResponder {
    /// Create a responder driving `target` between `remap_zero` and `remap_one`
    pub fn new(target: SharedValue, remap_zero: f32, remap_one: f32) -> Self {
        Self {
            baseline: target.get(),
            target,
            remap_zero,
            remap_one,
            position: [0.0; 3],
            range: None,
            reset_after_play: false,
            intensity: 1.0,
            task: TimedTask::new(),
        }
    }

    /// Only accept plays within `range` of `position`
    pub fn with_range(mut self, position: Point, range: f32) -> Self {
        self.position = position;
        self.range = Some(range.max(0.0));
        self
    }

    /// Restore the baseline when a play ends
    pub fn resetting_after_play(mut self) -> Self {
        self.reset_after_play = true;
        self
    }

    /// Normalized progress of the current play
    pub fn progress(&self) -> f32 {
        self.task.progress()
    }

    fn in_range(&self, origin: Point) -> bool {
        self.range
            .map_or(true, |range| distance(origin, self.position) <= range)
    }

    fn apply(&self) {
        let value = lerp(self.remap_zero, self.remap_one, self.task.progress());
        self.target.set(lerp(self.baseline, value, self.intensity));
    }
}

impl Responder for ValueResponder {
    fn accept(&mut self, channel: ChannelId, payload: BroadcastPayload) -> bool {
        match payload.kind {
            BroadcastKind::Play => {
                if !self.in_range(payload.origin) {
                    tracing::trace!("Responder on {} ignored an out-of-range play", channel);
                    return false;
                }
                self.intensity = payload.intensity;
                self.task.start(payload.duration, payload.direction);
                self.apply();
            }
            BroadcastKind::Stop => self.task.cancel(),
            BroadcastKind::Reset => {
                self.task.cancel();
                self.target.set(self.baseline);
            }
        }
        true
    }

    fn update(&mut self, dt: f32) {
        let finished = self.task.advance(dt);
        self.apply();
        if finished && self.reset_after_play {
            self.target.set(self.baseline);
        }
    }

    fn is_active(&self) -> bool {
        self.task.is_running()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::timing::Direction;
    use parking_lot::Mutex;
    use std::sync::Arc;

    fn ctx(origin: Point) -> PlayContext {
        PlayContext {
            origin,
            intensity: 1.0,
            direction: Direction::Forward,
        }
    }

    #[test]
    fn test_missing_channel() {
        let mut unit = BroadcastUnit::new("shake", ChannelId(0), 1.0);
        assert!(matches!(unit.play(&ctx([0.0; 3])), Err(UnitError::MissingTarget(_))));
    }

    #[test]
    fn test_responder_follows_broadcast() {
        let channel = BroadcastChannel::new();
        let value = SharedValue::new(0.0);
        let responder = Arc::new(Mutex::new(ValueResponder::new(value.clone(), 0.0, 4.0)));
        channel.register(ChannelId(2), &responder);

        let mut unit = BroadcastUnit::new("shake", ChannelId(2), 1.0).with_channel(channel.clone());
        unit.play(&ctx([0.0; 3])).unwrap();
        assert!(unit.is_playing());
        assert!(responder.lock().is_active());

        channel.update(0.5);
        assert!((value.get() - 2.0).abs() < 1e-5);

        unit.stop([0.0; 3]);
        assert!(!unit.is_playing());
        assert!(!responder.lock().is_active());
    }

    #[test]
    fn test_responder_outlives_unit() {
        let channel = BroadcastChannel::new();
        let value = SharedValue::new(0.0);
        let responder = Arc::new(Mutex::new(ValueResponder::new(value.clone(), 0.0, 1.0)));
        channel.register(ChannelId(0), &responder);

        {
            let mut unit = BroadcastUnit::new("flash", ChannelId(0), 1.0).with_channel(channel.clone());
            unit.play(&ctx([0.0; 3])).unwrap();
        }
        channel.update(1.0);
        assert!((value.get() - 1.0).abs() < 1e-5);
        assert!(!responder.lock().is_active());
    }

    #[test]
    fn test_range_gating() {
        let channel = BroadcastChannel::new();
        let value = SharedValue::new(0.0);
        let responder = Arc::new(Mutex::new(
            ValueResponder::new(value.clone(), 0.0, 1.0).with_range([0.0; 3], 5.0),
        ));
        channel.register(ChannelId(0), &responder);

        let mut unit = BroadcastUnit::new("flash", ChannelId(0), 1.0).with_channel(channel.clone());
        unit.play(&ctx([10.0, 0.0, 0.0])).unwrap();
        assert!(!responder.lock().is_active());

        unit.play(&ctx([3.0, 4.0, 0.0])).unwrap();
        assert!(responder.lock().is_active());
    }

    #[test]
    fn test_reset_after_play() {
        let channel = BroadcastChannel::new();
        let value = SharedValue::new(0.5);
        let responder = Arc::new(Mutex::new(
            ValueResponder::new(value.clone(), 0.0, 1.0).resetting_after_play(),
        ));
        channel.register(ChannelId::ALL, &responder);

        let mut unit = BroadcastUnit::new("flash", ChannelId(7), 0.5).with_channel(channel.clone());
        unit.play(&ctx([0.0; 3])).unwrap();
        channel.update(0.25);
        assert!((value.get() - 0.5).abs() < 1e-5);
        channel.update(0.25);
        assert_eq!(value.get(), 0.5);

        value.set(0.9);
        unit.reset_unit();
        assert_eq!(value.get(), 0.5);
    }
}
