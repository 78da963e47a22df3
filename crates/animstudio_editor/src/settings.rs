// SPDX-License-Identifier: MIT OR Apache-2.0
//! Editor settings and configuration.
//!
//! Settings are stored as RON next to the working directory. A missing
//! file means defaults; a file written by a newer editor is rejected.

use crate::error::{EditorError, Result};
use animstudio_sequencer::DEFAULT_KEYFRAME_DURATION;
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Current settings format version
pub const SETTINGS_FORMAT_VERSION: u32 = 1;

/// Settings file name
pub const SETTINGS_FILE_NAME: &str = "animstudio.ron";

/// Editor settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EditorSettings {
    /// Settings format version
    pub version: u32,
    /// Duration of newly added keyframes, in ticks
    pub default_keyframe_duration: f64,
    /// Initial playback speed multiplier
    pub playback_speed: f64,
    /// Frames per second for frame export
    pub export_fps: f64,
    /// Amount a single nudge moves an axis
    pub nudge_step: f64,
    /// Maximum undo history depth
    pub history_depth: usize,
    /// Decimal places kept in exported procedures
    pub export_decimals: u32,
    /// Default `tracing` filter when `RUST_LOG` is unset
    pub log_filter: String,
}

impl Default for EditorSettings {
    fn default() -> Self {
        Self {
            version: SETTINGS_FORMAT_VERSION,
            default_keyframe_duration: DEFAULT_KEYFRAME_DURATION,
            playback_speed: 1.0,
            export_fps: 20.0,
            nudge_step: 0.1,
            history_depth: crate::history::MAX_HISTORY,
            export_decimals: 3,
            log_filter: "animstudio_editor=debug".to_string(),
        }
    }
}

impl EditorSettings {
    /// Parse settings from RON text
    pub fn from_ron(text: &str) -> Result<Self> {
        let settings: EditorSettings = ron::from_str(text)?;

        // Version check
        if settings.version > SETTINGS_FORMAT_VERSION {
            return Err(EditorError::UnsupportedSettings {
                found: settings.version,
                supported: SETTINGS_FORMAT_VERSION,
            });
        }
        if !(settings.default_keyframe_duration.is_finite() && settings.default_keyframe_duration > 0.0) {
            return Err(EditorError::InvalidInput(format!(
                "default keyframe duration must be > 0, got {}",
                settings.default_keyframe_duration
            )));
        }

        Ok(settings)
    }

    /// Load settings from a file
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        Self::from_ron(&content)
    }

    /// Load settings, falling back to defaults when the file does not exist
    pub fn load_or_default(path: &Path) -> Result<Self> {
        if path.exists() {
            Self::load(path)
        } else {
            Ok(Self::default())
        }
    }

    /// Pretty RON text
    pub fn to_ron(&self) -> Result<String> {
        let config = ron::ser::PrettyConfig::default()
            .struct_names(true)
            .enumerate_arrays(false);
        Ok(ron::ser::to_string_pretty(self, config)?)
    }

    /// Save settings to a file
    pub fn save(&self, path: &Path) -> Result<()> {
        std::fs::write(path, self.to_ron()?)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_settings() {
        let settings = EditorSettings::default();
        assert_eq!(settings.version, SETTINGS_FORMAT_VERSION);
        assert_eq!(settings.default_keyframe_duration, 5.0);
        assert_eq!(settings.history_depth, 100);
    }

    #[test]
    fn test_serialization() {
        let mut settings = EditorSettings::default();
        settings.nudge_step = 0.25;
        let text = settings.to_ron().unwrap();
        assert_eq!(EditorSettings::from_ron(&text).unwrap(), settings);
    }

    #[test]
    fn test_partial_file_uses_defaults() {
        let settings = EditorSettings::from_ron("(export_fps: 30.0)").unwrap();
        assert_eq!(settings.export_fps, 30.0);
        assert_eq!(settings.nudge_step, 0.1);
    }

    #[test]
    fn test_newer_version_rejected() {
        let err = EditorSettings::from_ron("(version: 7)").unwrap_err();
        assert!(matches!(err, EditorError::UnsupportedSettings { found: 7, .. }));
    }

    #[test]
    fn test_missing_file_gives_defaults() {
        let path = Path::new("definitely/not/here/animstudio.ron");
        assert_eq!(EditorSettings::load_or_default(path).unwrap(), EditorSettings::default());
    }
}
