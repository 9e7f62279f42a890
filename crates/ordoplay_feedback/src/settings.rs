// SPDX-License-Identifier: MIT OR Apache-2.0
//! Player settings and their RON persistence.

use crate::error::SettingsError;
use crate::timing::Direction;
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Current settings format version
pub const SETTINGS_FORMAT_VERSION: u32 = 1;

/// Smallest accepted duration multiplier
pub const MIN_DURATION_MULTIPLIER: f32 = 0.01;

/// Largest accepted time scale
pub const MAX_TIME_SCALE: f32 = 10.0;

/// Player-level transport settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PlayerSettings {
    /// Settings format version
    pub version: u32,
    /// Initial global direction
    pub direction: Direction,
    /// Flip the direction each time a pass completes
    pub auto_reverse_on_end: bool,
    /// Global intensity multiplier
    pub intensity: f32,
    /// Stretches every delay and unit duration
    pub duration_multiplier: f32,
    /// Minimum time between two accepted Play calls
    pub cooldown: f32,
    /// Delay between Play and the start of the pass
    pub initial_delay: f32,
    /// Allow overlapping passes
    pub can_play_while_already_playing: bool,
    /// Multiplier on host time for scaled units
    pub time_scale: f32,
}

impl Default for PlayerSettings {
    fn default() -> Self {
        Self {
            version: SETTINGS_FORMAT_VERSION,
            direction: Direction::Forward,
            auto_reverse_on_end: false,
            intensity: 1.0,
            duration_multiplier: 1.0,
            cooldown: 0.0,
            initial_delay: 0.0,
            can_play_while_already_playing: true,
            time_scale: 1.0,
        }
    }
}

impl PlayerSettings {
    /// Load settings from a RON file
    pub fn load(path: &Path) -> Result<Self, SettingsError> {
        let content = std::fs::read_to_string(path)?;
        Self::from_ron(&content)
    }

    /// Parse settings from a RON string
    pub fn from_ron(content: &str) -> Result<Self, SettingsError> {
        let settings: PlayerSettings = ron::from_str(content)?;

        if settings.version > SETTINGS_FORMAT_VERSION {
            return Err(SettingsError::UnsupportedVersion {
                found: settings.version,
                supported: SETTINGS_FORMAT_VERSION,
            });
        }

        Ok(settings.sanitized())
    }

    /// Save settings to a RON file
    pub fn save(&self, path: &Path) -> Result<(), SettingsError> {
        let config = ron::ser::PrettyConfig::default()
            .struct_names(true)
            .enumerate_arrays(false);
        let content = ron::ser::to_string_pretty(self, config)?;
        std::fs::write(path, content)?;
        Ok(())
    }

    /// Clamp every value into its accepted range
    pub fn sanitized(mut self) -> Self {
        if self.duration_multiplier < MIN_DURATION_MULTIPLIER {
            tracing::warn!(
                "Duration multiplier {} is below {}, clamping",
                self.duration_multiplier,
                MIN_DURATION_MULTIPLIER
            );
            self.duration_multiplier = MIN_DURATION_MULTIPLIER;
        }
        self.time_scale = self.time_scale.clamp(0.0, MAX_TIME_SCALE);
        self.cooldown = self.cooldown.max(0.0);
        self.initial_delay = self.initial_delay.max(0.0);
        self.intensity = self.intensity.max(0.0);
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_settings() {
        let settings = PlayerSettings::default();
        assert_eq!(settings.version, SETTINGS_FORMAT_VERSION);
        assert_eq!(settings.direction, Direction::Forward);
        assert_eq!(settings.duration_multiplier, 1.0);
    }

    #[test]
    fn test_serialization() {
        let settings = PlayerSettings {
            auto_reverse_on_end: true,
            cooldown: 0.5,
            ..Default::default()
        };
        let ron_str = ron::ser::to_string_pretty(&settings, ron::ser::PrettyConfig::default()).unwrap();
        let loaded = PlayerSettings::from_ron(&ron_str).unwrap();
        assert_eq!(loaded, settings);
    }

    #[test]
    fn test_partial_file_uses_defaults() {
        let loaded = PlayerSettings::from_ron("(intensity: 0.5, direction: Backward)").unwrap();
        assert_eq!(loaded.intensity, 0.5);
        assert_eq!(loaded.direction, Direction::Backward);
        assert_eq!(loaded.time_scale, 1.0);
    }

    #[test]
    fn test_newer_version_rejected() {
        let result = PlayerSettings::from_ron("(version: 99)");
        assert!(matches!(
            result,
            Err(SettingsError::UnsupportedVersion { found: 99, .. })
        ));
    }

    #[test]
    fn test_sanitized() {
        let settings = PlayerSettings {
            duration_multiplier: 0.0,
            time_scale: 50.0,
            cooldown: -1.0,
            ..Default::default()
        }
        .sanitized();
        assert_eq!(settings.duration_multiplier, MIN_DURATION_MULTIPLIER);
        assert_eq!(settings.time_scale, MAX_TIME_SCALE);
        assert_eq!(settings.cooldown, 0.0);
    }
}
