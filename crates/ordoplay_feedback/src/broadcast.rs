// SPDX-License-Identifier: MIT OR Apache-2.0
//! Decoupled fan-out from units to shared-target responders.
//!
//! A [`BroadcastChannel`] is an explicit object handed to both sides. Units
//! publish payloads tagged with a [`ChannelId`]; every registered
//! [`Responder`] whose channel matches receives a copy. The channel only
//! keeps weak references, so a responder lives exactly as long as its owner
//! keeps it, independently of the units that address it.

use crate::timing::Direction;
use crate::unit::Point;
use parking_lot::{Mutex, RwLock};
use serde::{Deserialize, Serialize};
use std::sync::{Arc, Weak};
use uuid::Uuid;

/// Channel a payload is addressed to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ChannelId(pub i32);

impl ChannelId {
    /// Wildcard channel that matches every other channel
    pub const ALL: ChannelId = ChannelId(-1);

    /// Check whether two channels address each other
    pub fn matches(self, other: ChannelId) -> bool {
        self == other || self == Self::ALL || other == Self::ALL
    }
}

impl Default for ChannelId {
    fn default() -> Self {
        Self(0)
    }
}

impl std::fmt::Display for ChannelId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        if *self == Self::ALL {
            write!(f, "Channel(*)")
        } else {
            write!(f, "Channel({})", self.0)
        }
    }
}

/// What a payload asks responders to do
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum BroadcastKind {
    /// Start the effect
    Play,
    /// Cut the effect short
    Stop,
    /// Restore the target baseline
    Reset,
}

/// Effect parameters carried by a broadcast, copied to each responder
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BroadcastPayload {
    /// Requested action
    pub kind: BroadcastKind,
    /// Where the event originates
    pub origin: Point,
    /// Effect intensity
    pub intensity: f32,
    /// Effect duration in seconds
    pub duration: f32,
    /// Effect direction
    pub direction: Direction,
}

impl BroadcastPayload {
    /// A play payload
    pub fn play(origin: Point, intensity: f32, duration: f32, direction: Direction) -> Self {
        Self {
            kind: BroadcastKind::Play,
            origin,
            intensity,
            duration,
            direction,
        }
    }

    /// A stop payload
    pub fn stop(origin: Point) -> Self {
        Self {
            kind: BroadcastKind::Stop,
            origin,
            intensity: 0.0,
            duration: 0.0,
            direction: Direction::Forward,
        }
    }

    /// A reset payload
    pub fn reset() -> Self {
        Self {
            kind: BroadcastKind::Reset,
            origin: [0.0; 3],
            intensity: 0.0,
            duration: 0.0,
            direction: Direction::Forward,
        }
    }
}

/// Listener driving a shared target.
///
/// `accept` must return quickly; time-extended reactions start their own
/// task which [`BroadcastChannel::update`] advances once per tick.
pub trait Responder: Send {
    /// React to a payload. Returns false if the responder rejected it.
    fn accept(&mut self, channel: ChannelId, payload: BroadcastPayload) -> bool;

    /// Advance the responder's own task
    fn update(&mut self, _dt: f32) {}

    /// Whether the responder's task is still in flight
    fn is_active(&self) -> bool {
        false
    }
}

/// Handle returned by registration
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SubscriptionId(pub Uuid);

struct Registration {
    id: SubscriptionId,
    channel: ChannelId,
    responder: Weak<Mutex<dyn Responder>>,
}

#[derive(Default)]
struct Registry {
    registrations: Vec<Registration>,
}

impl Registry {
    fn prune(&mut self) {
        self.registrations.retain(|r| r.responder.strong_count() > 0);
    }
}

/// Cloneable handle to a set of responder registrations
#[derive(Clone, Default)]
pub struct BroadcastChannel {
    inner: Arc<RwLock<Registry>>,
}

impl BroadcastChannel {
    /// Create an empty channel
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a responder on a channel. The channel does not keep it alive.
    pub fn register<R: Responder + 'static>(
        &self,
        channel: ChannelId,
        responder: &Arc<Mutex<R>>,
    ) -> SubscriptionId {
        let shared: Arc<Mutex<dyn Responder>> = responder.clone();
        let id = SubscriptionId(Uuid::new_v4());
        self.inner.write().registrations.push(Registration {
            id,
            channel,
            responder: Arc::downgrade(&shared),
        });
        tracing::debug!("Registered responder on {}", channel);
        id
    }

    /// Remove a registration
    pub fn unregister(&self, id: SubscriptionId) -> bool {
        let mut registry = self.inner.write();
        let before = registry.registrations.len();
        registry.registrations.retain(|r| r.id != id);
        registry.registrations.len() != before
    }

    /// Number of live registrations
    pub fn responder_count(&self) -> usize {
        self.inner
            .read()
            .registrations
            .iter()
            .filter(|r| r.responder.strong_count() > 0)
            .count()
    }

    /// Upgrade matching registrations without holding the lock during dispatch
    fn matching(&self, channel: Option<ChannelId>) -> Vec<Arc<Mutex<dyn Responder>>> {
        self.inner
            .read()
            .registrations
            .iter()
            .filter(|r| channel.map_or(true, |c| r.channel.matches(c)))
            .filter_map(|r| r.responder.upgrade())
            .collect()
    }

    /// Deliver a payload, in registration order, to every matching responder.
    /// Returns how many responders accepted it.
    pub fn publish(&self, channel: ChannelId, payload: BroadcastPayload) -> usize {
        let targets = self.matching(Some(channel));
        let mut accepted = 0;
        for responder in targets {
            if responder.lock().accept(channel, payload) {
                accepted += 1;
            }
        }
        self.inner.write().prune();
        tracing::trace!("Published {:?} on {}: {} accepted", payload.kind, channel, accepted);
        accepted
    }

    /// Advance every live responder by one tick
    pub fn update(&self, dt: f32) {
        for responder in self.matching(None) {
            let mut responder = responder.lock();
            if responder.is_active() {
                responder.update(dt);
            }
        }
        self.inner.write().prune();
    }
}

impl std::fmt::Debug for BroadcastChannel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BroadcastChannel")
            .field("responders", &self.responder_count())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Default)]
    struct Recorder {
        received: Vec<(ChannelId, BroadcastKind)>,
    }

    impl Responder for Recorder {
        fn accept(&mut self, channel: ChannelId, payload: BroadcastPayload) -> bool {
            self.received.push((channel, payload.kind));
            true
        }
    }

    fn play_payload() -> BroadcastPayload {
        BroadcastPayload::play([0.0; 3], 1.0, 0.5, Direction::Forward)
    }

    #[test]
    fn test_channel_matching() {
        assert!(ChannelId(3).matches(ChannelId(3)));
        assert!(!ChannelId(3).matches(ChannelId(4)));
        assert!(ChannelId::ALL.matches(ChannelId(4)));
        assert!(ChannelId(4).matches(ChannelId::ALL));
    }

    #[test]
    fn test_publish_filters_by_channel() {
        let channel = BroadcastChannel::new();
        let one = Arc::new(Mutex::new(Recorder::default()));
        let two = Arc::new(Mutex::new(Recorder::default()));
        let any = Arc::new(Mutex::new(Recorder::default()));
        channel.register(ChannelId(1), &one);
        channel.register(ChannelId(2), &two);
        channel.register(ChannelId::ALL, &any);

        assert_eq!(channel.publish(ChannelId(1), play_payload()), 2);
        assert_eq!(one.lock().received.len(), 1);
        assert!(two.lock().received.is_empty());
        assert_eq!(any.lock().received.len(), 1);

        assert_eq!(channel.publish(ChannelId::ALL, BroadcastPayload::reset()), 3);
        assert_eq!(two.lock().received, vec![(ChannelId::ALL, BroadcastKind::Reset)]);
    }

    #[test]
    fn test_dropped_responder_is_pruned() {
        let channel = BroadcastChannel::new();
        let kept = Arc::new(Mutex::new(Recorder::default()));
        channel.register(ChannelId(0), &kept);
        {
            let dropped = Arc::new(Mutex::new(Recorder::default()));
            channel.register(ChannelId(0), &dropped);
            assert_eq!(channel.responder_count(), 2);
        }
        assert_eq!(channel.responder_count(), 1);
        assert_eq!(channel.publish(ChannelId(0), play_payload()), 1);
    }

    #[test]
    fn test_unregister() {
        let channel = BroadcastChannel::new();
        let responder = Arc::new(Mutex::new(Recorder::default()));
        let id = channel.register(ChannelId(0), &responder);
        assert!(channel.unregister(id));
        assert!(!channel.unregister(id));
        assert_eq!(channel.publish(ChannelId(0), play_payload()), 0);
    }
}
