//! Game settings and preferences
//!
//! Read from a JSON file; every field is optional and falls back to its default.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::Path;

use crate::consts::{SCREEN_HEIGHT, SCREEN_WIDTH};
use crate::sim::Bounds;

/// Quality preset levels
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub enum QualityPreset {
    Low,
    #[default]
    Medium,
    High,
}

impl QualityPreset {
    pub fn as_str(&self) -> &'static str {
        match self {
            QualityPreset::Low => "Low",
            QualityPreset::Medium => "Medium",
            QualityPreset::High => "High",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "low" => Some(QualityPreset::Low),
            "medium" | "med" => Some(QualityPreset::Medium),
            "high" => Some(QualityPreset::High),
            _ => None,
        }
    }

    /// Maximum background stars for this preset
    pub fn max_stars(&self) -> usize {
        match self {
            QualityPreset::Low => 40,
            QualityPreset::Medium => 150,
            QualityPreset::High => 300,
        }
    }

    /// Whether debris and ratio popups are drawn
    pub fn effects_enabled(&self) -> bool {
        !matches!(self, QualityPreset::Low)
    }
}

/// Settings loading failures
#[derive(Debug)]
pub enum SettingsError {
    Io(std::io::Error),
    Parse(serde_json::Error),
    Invalid(String),
}

impl fmt::Display for SettingsError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SettingsError::Io(e) => write!(f, "could not read settings: {e}"),
            SettingsError::Parse(e) => write!(f, "malformed settings: {e}"),
            SettingsError::Invalid(msg) => write!(f, "invalid settings: {msg}"),
        }
    }
}

impl std::error::Error for SettingsError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            SettingsError::Io(e) => Some(e),
            SettingsError::Parse(e) => Some(e),
            SettingsError::Invalid(_) => None,
        }
    }
}

impl From<std::io::Error> for SettingsError {
    fn from(e: std::io::Error) -> Self {
        SettingsError::Io(e)
    }
}

impl From<serde_json::Error> for SettingsError {
    fn from(e: serde_json::Error) -> Self {
        SettingsError::Parse(e)
    }
}

/// Game settings/preferences
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    /// Graphics quality preset
    pub quality: QualityPreset,

    // === Play area ===
    /// Logical screen width
    pub width: f32,
    /// Logical screen height
    pub height: f32,

    // === Simulation ===
    /// Fixed RNG seed (random per run when absent)
    pub seed: Option<u64>,
    /// Host frame rate
    pub target_fps: u32,

    // === Visual Effects ===
    /// Scrolling star field
    pub stars: bool,

    // === Accessibility ===
    /// Reduced motion (no death shake, no blinking)
    pub reduced_motion: bool,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            quality: QualityPreset::Medium,
            width: SCREEN_WIDTH,
            height: SCREEN_HEIGHT,
            seed: None,
            target_fps: 60,
            stars: true,
            reduced_motion: false,
        }
    }
}

impl Settings {
    /// Apply a quality preset (updates quality-dependent settings)
    pub fn apply_preset(&mut self, preset: QualityPreset) {
        self.quality = preset;

        // Low preset trades the star field for speed
        if preset == QualityPreset::Low {
            self.stars = false;
        }
    }

    /// Effective star cap (respects the `stars` toggle)
    pub fn max_stars(&self) -> usize {
        if !self.stars {
            0
        } else {
            self.quality.max_stars()
        }
    }

    pub fn bounds(&self) -> Bounds {
        Bounds::new(self.width, self.height)
    }

    /// Parse settings from JSON text. The quality preset wins over
    /// individual toggles it controls.
    pub fn from_json(json: &str) -> Result<Self, SettingsError> {
        let mut settings: Settings = serde_json::from_str(json)?;
        settings.apply_preset(settings.quality);
        settings.validate()?;
        Ok(settings)
    }

    /// Load settings from a JSON file
    pub fn load(path: impl AsRef<Path>) -> Result<Self, SettingsError> {
        let path = path.as_ref();
        let json = std::fs::read_to_string(path)?;
        let settings = Self::from_json(&json)?;
        log::info!("Loaded settings from {}", path.display());
        Ok(settings)
    }

    /// Load settings from `path`, falling back to defaults on any failure
    pub fn load_or_default(path: impl AsRef<Path>) -> Self {
        let path = path.as_ref();
        match Self::load(path) {
            Ok(settings) => settings,
            Err(SettingsError::Io(e)) if e.kind() == std::io::ErrorKind::NotFound => {
                log::info!("No settings at {}, using defaults", path.display());
                Self::default()
            }
            Err(e) => {
                log::warn!("Ignoring {}: {e}", path.display());
                Self::default()
            }
        }
    }

    pub fn validate(&self) -> Result<(), SettingsError> {
        if !(self.width.is_finite() && self.width > 0.0) {
            return Err(SettingsError::Invalid(format!("width {}", self.width)));
        }
        if !(self.height.is_finite() && self.height > 0.0) {
            return Err(SettingsError::Invalid(format!("height {}", self.height)));
        }
        if self.target_fps == 0 {
            return Err(SettingsError::Invalid("target_fps must be positive".into()));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_partial_json_keeps_defaults() {
        let settings = Settings::from_json(r#"{ "seed": 7, "quality": "High" }"#).unwrap();
        assert_eq!(settings.seed, Some(7));
        assert_eq!(settings.quality, QualityPreset::High);
        assert_eq!(settings.width, 800.0);
        assert_eq!(settings.max_stars(), 300);
    }

    #[test]
    fn test_invalid_dimensions_rejected() {
        let err = Settings::from_json(r#"{ "width": 0 }"#).unwrap_err();
        assert!(matches!(err, SettingsError::Invalid(_)));
        let err = Settings::from_json("{ not json").unwrap_err();
        assert!(matches!(err, SettingsError::Parse(_)));
    }

    #[test]
    fn test_low_preset_disables_stars() {
        let mut settings = Settings::default();
        settings.apply_preset(QualityPreset::Low);
        assert_eq!(settings.max_stars(), 0);
        assert!(!settings.quality.effects_enabled());
        assert_eq!(QualityPreset::parse("MED"), Some(QualityPreset::Medium));
        assert_eq!(QualityPreset::High.as_str(), "High");
    }

    #[test]
    fn test_low_quality_from_json_has_no_stars() {
        let settings = Settings::from_json(r#"{ "quality": "Low" }"#).unwrap();
        assert!(!settings.stars);
        assert_eq!(settings.max_stars(), 0);

        // Even an explicit toggle cannot bring them back on Low
        let settings = Settings::from_json(r#"{ "quality": "Low", "stars": true }"#).unwrap();
        assert_eq!(settings.max_stars(), 0);

        let settings = Settings::from_json(r#"{ "quality": "High", "stars": false }"#).unwrap();
        assert_eq!(settings.max_stars(), 0);
    }

    #[test]
    fn test_missing_file_falls_back() {
        let settings = Settings::load_or_default("/definitely/not/here.json");
        assert_eq!(settings, Settings::default());
    }

    #[test]
    fn test_round_trip_through_json() {
        let settings = Settings {
            seed: Some(99),
            reduced_motion: true,
            ..Settings::default()
        };
        let json = serde_json::to_string(&settings).unwrap();
        assert_eq!(Settings::from_json(&json).unwrap(), settings);
    }
}
