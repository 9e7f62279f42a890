// SPDX-License-Identifier: MIT OR Apache-2.0
//! Built-in unit kinds.
//!
//! - Holding pauses, loop markers and loopers that shape the sequence
//! - Callback units for host-side actions
//! - Value tweens driving a shared float target
//! - Broadcast units and the value responder they address

mod broadcast;
mod callback;
mod pause;
mod tween;

pub use broadcast::{BroadcastUnit, ValueResponder};
pub use callback::CallbackUnit;
pub use pause::{HoldingPause, LoopStart, Looper};
pub use tween::{SharedValue, ValueTween};
