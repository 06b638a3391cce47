// SPDX-License-Identifier: MIT OR Apache-2.0
//! Player configuration.

use crate::compile::DEFAULT_SAMPLE_RATE;
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Current settings format version
pub const SETTINGS_FORMAT_VERSION: u32 = 1;

/// Settings file name
pub const SETTINGS_FILE_NAME: &str = "movie.ron";

/// Movie playback and compilation settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MovieSettings {
    /// Settings format version
    pub version: u32,
    /// Samples per second when compiling interpolated curves
    pub sample_rate: f32,
    /// Wrap to the start when playback reaches the end
    pub looping: bool,
    /// Playback speed multiplier
    pub time_scale: f32,
    /// Start playing as soon as the player is created
    pub autoplay: bool,
}

impl Default for MovieSettings {
    fn default() -> Self {
        Self {
            version: SETTINGS_FORMAT_VERSION,
            sample_rate: DEFAULT_SAMPLE_RATE,
            looping: false,
            time_scale: 1.0,
            autoplay: false,
        }
    }
}

impl MovieSettings {
    /// Parse settings from RON text. Missing fields take their defaults.
    pub fn from_ron(content: &str) -> std::io::Result<Self> {
        let settings: MovieSettings = ron::from_str(content).map_err(|e| {
            std::io::Error::new(std::io::ErrorKind::InvalidData, e.to_string())
        })?;

        // Version check
        if settings.version > SETTINGS_FORMAT_VERSION {
            return Err(std::io::Error::new(
                std::io::ErrorKind::InvalidData,
                format!(
                    "Settings version {} is newer than supported version {}",
                    settings.version, SETTINGS_FORMAT_VERSION
                ),
            ));
        }

        if !settings.sample_rate.is_finite() || settings.sample_rate <= 0.0 {
            return Err(std::io::Error::new(
                std::io::ErrorKind::InvalidData,
                format!("Invalid sample rate: {}", settings.sample_rate),
            ));
        }

        Ok(settings)
    }

    /// Load settings from a file
    pub fn load(path: &Path) -> std::io::Result<Self> {
        let content = std::fs::read_to_string(path)?;
        Self::from_ron(&content)
    }

    /// Save settings to a file
    pub fn save(&self, path: &Path) -> std::io::Result<()> {
        let config = ron::ser::PrettyConfig::default().struct_names(true);

        let content = ron::ser::to_string_pretty(self, config).map_err(|e| {
            std::io::Error::new(std::io::ErrorKind::InvalidData, e.to_string())
        })?;

        std::fs::write(path, content)
    }

    /// Settings file path inside a directory
    pub fn file_path(dir: &Path) -> std::path::PathBuf {
        dir.join(SETTINGS_FILE_NAME)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_fill_missing_fields() {
        let settings = MovieSettings::from_ron("(looping: true)").unwrap();
        assert!(settings.looping);
        assert_eq!(settings.sample_rate, DEFAULT_SAMPLE_RATE);
        assert_eq!(settings.time_scale, 1.0);
        assert_eq!(settings.version, SETTINGS_FORMAT_VERSION);
    }

    #[test]
    fn test_rejects_newer_version() {
        let err = MovieSettings::from_ron("(version: 99)").unwrap_err();
        assert_eq!(err.kind(), std::io::ErrorKind::InvalidData);
    }

    #[test]
    fn test_rejects_bad_sample_rate() {
        assert!(MovieSettings::from_ron("(sample_rate: 0.0)").is_err());
        assert!(MovieSettings::from_ron("(sample_rate: -30.0)").is_err());
    }

    #[test]
    fn test_save_and_load() {
        let dir = std::env::temp_dir().join(format!("ordoplay_movie_{}", uuid::Uuid::new_v4()));
        std::fs::create_dir_all(&dir).unwrap();
        let path = MovieSettings::file_path(&dir);

        let settings = MovieSettings {
            sample_rate: 60.0,
            autoplay: true,
            ..MovieSettings::default()
        };
        settings.save(&path).unwrap();
        assert_eq!(MovieSettings::load(&path).unwrap(), settings);

        std::fs::remove_dir_all(&dir).unwrap();
    }
}
