//! User settings and preferences
//!
//! Persisted as a single JSON file whose path the host chooses. A missing,
//! unreadable or out-of-range file is replaced with defaults.

use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::SettingsError;

/// Highest volume step; playback volume is `step / VOLUME_STEPS`
pub const VOLUME_STEPS: u8 = 20;

/// Window sizes selectable by `res_index`
pub const RESOLUTIONS: [(u32, u32); 4] = [(1024, 600), (1280, 720), (1440, 900), (1920, 1080)];

/// Interface language
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Language {
    English,
    Chinese,
}

impl Language {
    pub fn as_str(&self) -> &'static str {
        match self {
            Language::English => "en",
            Language::Chinese => "zh",
        }
    }
}

/// Game settings/preferences
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Settings {
    // === Audio ===
    /// Sound effect volume step (0..=20)
    pub effect_volume: u8,
    /// Music volume step (0..=20)
    pub music_volume: u8,

    // === Display ===
    /// Index into [`RESOLUTIONS`]
    pub res_index: u8,
    pub fullscreen: bool,

    /// 0 = English, 1 = Chinese
    pub lang_idx: u8,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            effect_volume: 2,
            music_volume: 2,
            res_index: 0,
            fullscreen: true,
            lang_idx: 0,
        }
    }
}

impl Settings {
    /// Effect playback volume in 0.0..=1.0
    pub fn effect_gain(&self) -> f32 {
        f32::from(self.effect_volume) / f32::from(VOLUME_STEPS)
    }

    /// Music playback volume in 0.0..=1.0
    pub fn music_gain(&self) -> f32 {
        f32::from(self.music_volume) / f32::from(VOLUME_STEPS)
    }

    pub fn resolution(&self) -> (u32, u32) {
        RESOLUTIONS[usize::from(self.res_index).min(RESOLUTIONS.len() - 1)]
    }

    pub fn language(&self) -> Language {
        if self.lang_idx == 1 {
            Language::Chinese
        } else {
            Language::English
        }
    }

    /// Reject any field outside its documented range
    pub fn validate(&self) -> Result<(), SettingsError> {
        let checks: [(&'static str, u8, u8); 4] = [
            ("effect_volume", self.effect_volume, VOLUME_STEPS),
            ("music_volume", self.music_volume, VOLUME_STEPS),
            ("res_index", self.res_index, (RESOLUTIONS.len() - 1) as u8),
            ("lang_idx", self.lang_idx, 1),
        ];
        for (field, value, max) in checks {
            if value > max {
                return Err(SettingsError::OutOfRange {
                    field,
                    value: i64::from(value),
                });
            }
        }
        Ok(())
    }

    /// Parse and validate settings from a file
    pub fn read(path: &Path) -> Result<Self, SettingsError> {
        let json = fs::read_to_string(path)?;
        let settings: Settings = serde_json::from_str(&json)?;
        settings.validate()?;
        Ok(settings)
    }

    /// Load settings, rewriting defaults when the file is missing or corrupt
    pub fn load(path: &Path) -> Self {
        match Self::read(path) {
            Ok(settings) => {
                log::info!("Loaded settings from {}", path.display());
                settings
            }
            Err(err) => {
                log::info!("Using default settings ({err})");
                let settings = Self::default();
                if let Err(err) = settings.save(path) {
                    log::warn!("Could not rewrite settings at {}: {err}", path.display());
                }
                settings
            }
        }
    }

    /// Save settings as pretty JSON
    pub fn save(&self, path: &Path) -> Result<(), SettingsError> {
        let json = serde_json::to_string_pretty(self)?;
        fs::write(path, json)?;
        log::info!("Settings saved");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let s = Settings::default();
        assert_eq!(
            (s.effect_volume, s.music_volume, s.res_index, s.fullscreen, s.lang_idx),
            (2, 2, 0, true, 0)
        );
        assert_eq!(s.resolution(), (1024, 600));
        assert!((s.effect_gain() - 0.1).abs() < 1e-6);
    }

    #[test]
    fn test_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("settings.json");
        let s = Settings {
            effect_volume: 20,
            music_volume: 0,
            res_index: 3,
            fullscreen: false,
            lang_idx: 1,
        };
        s.save(&path).unwrap();
        assert_eq!(Settings::load(&path), s);
        assert_eq!(s.resolution(), (1920, 1080));
        assert_eq!(s.language(), Language::Chinese);
        assert_eq!(s.music_gain(), 0.0);
    }

    #[test]
    fn test_missing_file_writes_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("settings.json");
        assert_eq!(Settings::load(&path), Settings::default());
        assert_eq!(Settings::read(&path).unwrap(), Settings::default());
    }

    #[test]
    fn test_malformed_file_rewritten() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("settings.json");
        fs::write(&path, "{ not json").unwrap();
        assert!(matches!(Settings::read(&path), Err(SettingsError::Parse(_))));
        assert_eq!(Settings::load(&path), Settings::default());
        assert_eq!(Settings::read(&path).unwrap(), Settings::default());
    }

    #[test]
    fn test_out_of_range_rewritten() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("settings.json");
        fs::write(
            &path,
            r#"{"effect_volume":30,"music_volume":2,"res_index":0,"fullscreen":true,"lang_idx":0}"#,
        )
        .unwrap();
        assert!(matches!(
            Settings::read(&path),
            Err(SettingsError::OutOfRange { field: "effect_volume", value: 30 })
        ));
        assert_eq!(Settings::load(&path), Settings::default());
    }
}
