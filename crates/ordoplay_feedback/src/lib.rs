// SPDX-License-Identifier: MIT OR Apache-2.0
//! Feedback sequencer for OrdoPlay.
//!
//! This crate plays ordered sequences of effect units over time:
//! - Per-unit timing (delay, cooldown, repeats, direction and intensity gates)
//! - Holding pauses that block downstream units
//! - Looping sub-sequences
//! - Transport controls (play, stop, pause/resume, revert)
//! - Broadcast channels reaching shared-target responders
//!
//! ## Architecture
//!
//! Everything is single-threaded and tick-driven. The host calls
//! [`Player::tick`] once per frame; each [`Pass`] advances one small state
//! machine per unit, and each time-extended effect advances its own
//! [`TimedTask`]. Nothing blocks: a holding pause only stops later units
//! from starting.

pub mod broadcast;
pub mod error;
pub mod player;
pub mod sequencer;
pub mod settings;
pub mod task;
pub mod timing;
pub mod unit;
pub mod units;

pub use broadcast::{BroadcastChannel, BroadcastKind, BroadcastPayload, ChannelId, Responder, SubscriptionId};
pub use error::{FeedbackError, Result, SettingsError, UnitError};
pub use player::{MutationOutcome, Player, PlayerEvent, PlayerState, RejectReason};
pub use sequencer::{Cursor, CursorState, Pass, PassId, PassStatus, TickTimes};
pub use settings::{PlayerSettings, SETTINGS_FORMAT_VERSION};
pub use task::TimedTask;
pub use timing::{Direction, DirectionCondition, PlayDirectionMode, TimeScaleMode, TimingPolicy, UNBOUNDED};
pub use unit::{LoopSpec, OwnerInfo, PlayContext, Point, SkipReason, Unit, UnitId, UnitKind, UnitSlot};
