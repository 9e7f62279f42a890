// SPDX-License-Identifier: MIT OR Apache-2.0
//! RON presets describing a player, its units and their responders.

use indexmap::IndexMap;
use ordoplay_feedback::units::{
    BroadcastUnit, CallbackUnit, HoldingPause, LoopStart, Looper, SharedValue, ValueResponder,
    ValueTween,
};
use ordoplay_feedback::{
    BroadcastChannel, ChannelId, Player, PlayerSettings, SettingsError, TimingPolicy, UnitSlot,
    SETTINGS_FORMAT_VERSION,
};
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::sync::Arc;

/// Errors raised while loading or building a preset
#[derive(Debug, thiserror::Error)]
pub enum PresetError {
    /// The preset file could not be read
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// The preset file is not valid RON
    #[error("Parse error: {0}")]
    Parse(#[from] ron::error::SpannedError),

    /// The embedded player settings are invalid
    #[error("Settings error: {0}")]
    Settings(#[from] SettingsError),

    /// A unit or responder names a value the preset does not declare
    #[error("Unknown value '{0}'")]
    UnknownValue(String),
}

/// What a preset unit does
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum UnitSpecKind {
    /// Logs a line when played
    Log {
        /// Unit label
        label: String,
    },
    /// Tweens a named value
    Tween {
        /// Unit label
        label: String,
        /// Name of the driven value
        value: String,
        /// Start of the curve
        from: f32,
        /// End of the curve
        to: f32,
        /// Seconds
        duration: f32,
    },
    /// Blocks later units
    HoldingPause {
        /// Seconds
        duration: f32,
        /// Also wait for every earlier unit
        #[serde(default)]
        wait_for_preceding: bool,
    },
    /// Loop target marker
    LoopStart,
    /// Rewinds to the last loop start
    Looper {
        /// Seconds paused before jumping
        duration: f32,
        /// Jumps back, forever if omitted
        #[serde(default)]
        loops: Option<u32>,
        /// Jump to the last holding pause instead
        #[serde(default)]
        jump_to_last_pause: bool,
    },
    /// Publishes on the preset's broadcast channel
    Broadcast {
        /// Unit label
        label: String,
        /// Channel number
        channel: i32,
        /// Seconds
        duration: f32,
    },
}

fn default_true() -> bool {
    true
}

/// One unit of a preset
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UnitSpec {
    /// What the unit does
    pub kind: UnitSpecKind,
    /// Timing rules
    #[serde(default)]
    pub timing: TimingPolicy,
    /// Whether the unit runs at all
    #[serde(default = "default_true")]
    pub active: bool,
    /// Ignore holding pauses
    #[serde(default)]
    pub excluded_from_holding_pauses: bool,
    /// Whether the unit counts toward the total duration
    #[serde(default = "default_true")]
    pub counts_toward_total_duration: bool,
}

/// A responder listening on the preset's broadcast channel
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResponderSpec {
    /// Channel number, -1 for every channel
    pub channel: i32,
    /// Name of the driven value
    pub value: String,
    /// Value at progress 0
    pub remap_zero: f32,
    /// Value at progress 1
    pub remap_one: f32,
    /// Only accept plays within this distance of the origin
    #[serde(default)]
    pub range: Option<f32>,
    /// Restore the baseline when a play ends
    #[serde(default)]
    pub reset_after_play: bool,
}

/// A complete feedback preset
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Preset {
    /// Player name
    pub name: String,
    /// Player settings
    #[serde(default)]
    pub settings: PlayerSettings,
    /// Named values and their starting points
    #[serde(default)]
    pub values: IndexMap<String, f32>,
    /// Responders registered on the broadcast channel
    #[serde(default)]
    pub responders: Vec<ResponderSpec>,
    /// Units in sequence order
    pub units: Vec<UnitSpec>,
}

/// A player wired up from a preset
pub struct Rig {
    /// The player
    pub player: Player,
    /// Channel shared by broadcast units and responders
    pub channel: BroadcastChannel,
    /// Named values driven by the rig
    pub values: IndexMap<String, SharedValue>,
    /// Keeps responders alive for the channel's weak references
    pub responders: Vec<Arc<Mutex<ValueResponder>>>,
}

impl Preset {
    /// Load a preset from a RON file
    pub fn load(path: &Path) -> Result<Self, PresetError> {
        let content = std::fs::read_to_string(path)?;
        Self::from_ron(&content)
    }

    /// Parse a preset from a RON string
    pub fn from_ron(content: &str) -> Result<Self, PresetError> {
        let preset: Preset = ron::from_str(content)?;
        if preset.settings.version > SETTINGS_FORMAT_VERSION {
            return Err(SettingsError::UnsupportedVersion {
                found: preset.settings.version,
                supported: SETTINGS_FORMAT_VERSION,
            }
            .into());
        }
        Ok(preset)
    }

    /// Build the player, channel and responders
    pub fn build(&self) -> Result<Rig, PresetError> {
        let values: IndexMap<String, SharedValue> = self
            .values
            .iter()
            .map(|(name, value)| (name.clone(), SharedValue::new(*value)))
            .collect();
        let lookup = |name: &str| {
            values
                .get(name)
                .cloned()
                .ok_or_else(|| PresetError::UnknownValue(name.to_string()))
        };

        let channel = BroadcastChannel::new();
        let mut responders = Vec::with_capacity(self.responders.len());
        for spec in &self.responders {
            let mut responder = ValueResponder::new(lookup(spec.value.as_str())?, spec.remap_zero, spec.remap_one);
            if let Some(range) = spec.range {
                responder = responder.with_range([0.0; 3], range);
            }
            responder.reset_after_play = spec.reset_after_play;
            let responder = Arc::new(Mutex::new(responder));
            channel.register(ChannelId(spec.channel), &responder);
            responders.push(responder);
        }

        let mut player = Player::with_settings(self.name.clone(), &self.settings);
        for spec in &self.units {
            let slot = match &spec.kind {
                UnitSpecKind::Log { label } => {
                    let line = label.clone();
                    UnitSlot::new(CallbackUnit::new(label.clone(), move |ctx| {
                        tracing::info!("{} ({:?}, intensity {:.2})", line, ctx.direction, ctx.intensity);
                    }))
                }
                UnitSpecKind::Tween { label, value, from, to, duration } => UnitSlot::new(
                    ValueTween::new(label.clone(), *from, *to, *duration).with_target(lookup(value.as_str())?),
                ),
                UnitSpecKind::HoldingPause { duration, wait_for_preceding } => {
                    let pause = HoldingPause::new(*duration);
                    UnitSlot::new(if *wait_for_preceding {
                        pause.waiting_for_preceding()
                    } else {
                        pause
                    })
                }
                UnitSpecKind::LoopStart => UnitSlot::new(LoopStart),
                UnitSpecKind::Looper { duration, loops, jump_to_last_pause } => {
                    let looper = Looper::new(*duration, *loops);
                    UnitSlot::new(if *jump_to_last_pause {
                        looper.jumping_to_last_pause()
                    } else {
                        looper
                    })
                }
                UnitSpecKind::Broadcast { label, channel: id, duration } => UnitSlot::new(
                    BroadcastUnit::new(label.clone(), ChannelId(*id), *duration).with_channel(channel.clone()),
                ),
            };
            let mut slot = slot.with_timing(spec.timing.clone()).with_active(spec.active);
            slot.excluded_from_holding_pauses = spec.excluded_from_holding_pauses;
            slot.counts_toward_total_duration = spec.counts_toward_total_duration;
            player.add_unit(slot);
        }

        Ok(Rig {
            player,
            channel,
            values,
            responders,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const PRESET: &str = r#"(
        name: "door",
        settings: (cooldown: 0.5),
        values: {"glow": 0.0, "shake": 0.0},
        responders: [(channel: 3, value: "shake", remap_zero: 0.0, remap_one: 1.0)],
        units: [
            (kind: Log(label: "open")),
            (kind: Tween(label: "glow", value: "glow", from: 0.0, to: 1.0, duration: 0.5)),
            (kind: HoldingPause(duration: 0.25)),
            (kind: Broadcast(label: "rumble", channel: 3, duration: 0.5), timing: (initial_delay: 0.1)),
        ],
    )"#;

    #[test]
    fn test_parse_preset() {
        let preset = Preset::from_ron(PRESET).unwrap();
        assert_eq!(preset.name, "door");
        assert_eq!(preset.settings.cooldown, 0.5);
        assert_eq!(preset.units.len(), 4);
        assert!(preset.units[0].active);
        assert_eq!(preset.units[3].timing.initial_delay, 0.1);
    }

    #[test]
    fn test_build_rig() {
        let rig = Preset::from_ron(PRESET).unwrap().build().unwrap();
        assert_eq!(rig.player.unit_count(), 4);
        assert_eq!(rig.channel.responder_count(), 1);
        assert!((rig.player.total_duration() - 1.35).abs() < 1e-5);
    }

    #[test]
    fn test_unknown_value() {
        let preset = Preset::from_ron(
            r#"(name: "x", units: [(kind: Tween(label: "t", value: "missing", from: 0.0, to: 1.0, duration: 1.0))])"#,
        )
        .unwrap();
        assert!(matches!(preset.build(), Err(PresetError::UnknownValue(name)) if name == "missing"));
    }

    #[test]
    fn test_newer_settings_rejected() {
        let result = Preset::from_ron(r#"(name: "x", settings: (version: 42), units: [])"#);
        assert!(matches!(
            result,
            Err(PresetError::Settings(SettingsError::UnsupportedVersion { found: 42, .. }))
        ));
    }
}
