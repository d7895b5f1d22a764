//! Surface settings and tuning
//!
//! Persisted in LocalStorage on the web; defaults everywhere else.

use serde::{Deserialize, Serialize};

use crate::consts::{MAX_SEGMENTS, SPRING_OMEGA};
use crate::surface::{PointerParams, RippleParams, SourceConfig, SourceId};

/// Settings could not be read or written
#[derive(Debug, thiserror::Error)]
pub enum SettingsError {
    #[error("invalid settings JSON: {0}")]
    Json(#[from] serde_json::Error),
}

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

    pub fn from_str(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "low" => Some(QualityPreset::Low),
            "medium" | "med" => Some(QualityPreset::Medium),
            "high" => Some(QualityPreset::High),
            _ => None,
        }
    }

    /// Grid density
    pub fn segments_per_unit(&self) -> f32 {
        match self {
            QualityPreset::Low => 6.0,
            QualityPreset::Medium => 10.0,
            QualityPreset::High => 16.0,
        }
    }

    /// Segment counts for a viewport of the given world size
    pub fn segments_for(&self, world_width: f32, world_height: f32) -> (u32, u32) {
        let density = self.segments_per_unit();
        let axis = |extent: f32| {
            if extent.is_finite() && extent > 0.0 {
                ((extent * density).ceil() as u32).clamp(1, MAX_SEGMENTS)
            } else {
                1
            }
        };
        (axis(world_width), axis(world_height))
    }
}

/// Numeric tuning for every source
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Tuning {
    pub dialog: SourceConfig,
    pub secondary_dialog: SourceConfig,
    pub tile: SourceConfig,
    pub segmented_control: SourceConfig,
    pub pointer: PointerParams,
    pub ripple: RippleParams,
    /// Angular frequency shared by all strength springs
    pub spring_omega: f32,
}

impl Default for Tuning {
    fn default() -> Self {
        Self {
            dialog: SourceConfig::defaults_for(SourceId::Dialog),
            secondary_dialog: SourceConfig::defaults_for(SourceId::SecondaryDialog),
            tile: SourceConfig::defaults_for(SourceId::Tile),
            segmented_control: SourceConfig::defaults_for(SourceId::SegmentedControl),
            pointer: PointerParams::default(),
            ripple: RippleParams::default(),
            spring_omega: SPRING_OMEGA,
        }
    }
}

impl Tuning {
    pub fn source_config(&self, id: SourceId) -> SourceConfig {
        match id {
            SourceId::Dialog => self.dialog,
            SourceId::SecondaryDialog => self.secondary_dialog,
            SourceId::Tile => self.tile,
            SourceId::SegmentedControl => self.segmented_control,
        }
    }
}

/// Surface settings/preferences
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    /// Mesh density preset
    pub quality: QualityPreset,

    // === Effects ===
    /// Travelling ripples on dialog/tile transitions
    pub ripples: bool,
    /// Indentation under the pointer while dragging
    pub pointer_bump: bool,

    // === Accessibility ===
    /// Reduced motion (suppresses ripples)
    pub reduced_motion: bool,

    pub tuning: Tuning,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            quality: QualityPreset::Medium,
            ripples: true,
            pointer_bump: true,
            reduced_motion: false,
            tuning: Tuning::default(),
        }
    }
}

impl Settings {
    /// Create settings from a quality preset
    pub fn from_preset(preset: QualityPreset) -> Self {
        Self {
            quality: preset,
            ..Self::default()
        }
    }

    /// Effective ripples (respects reduced_motion)
    pub fn effective_ripples(&self) -> bool {
        self.ripples && !self.reduced_motion
    }

    pub fn from_json(json: &str) -> Result<Self, SettingsError> {
        Ok(serde_json::from_str(json)?)
    }

    pub fn to_json(&self) -> Result<String, SettingsError> {
        Ok(serde_json::to_string(self)?)
    }

    /// LocalStorage key
    #[allow(dead_code)]
    const STORAGE_KEY: &'static str = "warp_grid_settings";

    /// Load settings from LocalStorage (WASM only)
    #[cfg(target_arch = "wasm32")]
    pub fn load() -> Self {
        let storage = web_sys::window()
            .and_then(|w| w.local_storage().ok())
            .flatten();

        if let Some(storage) = storage {
            if let Ok(Some(json)) = storage.get_item(Self::STORAGE_KEY) {
                match Self::from_json(&json) {
                    Ok(settings) => {
                        log::info!("Loaded settings from LocalStorage");
                        return settings;
                    }
                    Err(e) => log::warn!("Ignoring stored settings: {}", e),
                }
            }
        }

        log::info!("Using default settings");
        Self::default()
    }

    /// Save settings to LocalStorage (WASM only)
    #[cfg(target_arch = "wasm32")]
    pub fn save(&self) {
        let storage = web_sys::window()
            .and_then(|w| w.local_storage().ok())
            .flatten();

        if let Some(storage) = storage {
            match self.to_json() {
                Ok(json) => match storage.set_item(Self::STORAGE_KEY, &json) {
                    Ok(()) => log::info!("Settings saved"),
                    Err(e) => log::warn!("Settings not saved: {:?}", e),
                },
                Err(e) => log::warn!("Settings not saved: {}", e),
            }
        }
    }

    /// Native stubs
    #[cfg(not(target_arch = "wasm32"))]
    pub fn load() -> Self {
        Self::default()
    }

    #[cfg(not(target_arch = "wasm32"))]
    pub fn save(&self) {
        // No-op for native
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_preset_names() {
        for preset in [QualityPreset::Low, QualityPreset::Medium, QualityPreset::High] {
            assert_eq!(QualityPreset::from_str(preset.as_str()), Some(preset));
        }
        assert_eq!(QualityPreset::from_str("med"), Some(QualityPreset::Medium));
        assert_eq!(QualityPreset::from_str("ultra"), None);
    }

    #[test]
    fn test_segments_for_viewport() {
        assert_eq!(QualityPreset::Medium.segments_for(16.0, 10.0), (160, 100));
        assert_eq!(QualityPreset::Low.segments_for(1.05, 0.5), (7, 3));
        // Capped, and never zero
        assert_eq!(QualityPreset::High.segments_for(100.0, 0.0), (MAX_SEGMENTS, 1));
    }

    #[test]
    fn test_reduced_motion_disables_ripples() {
        let mut settings = Settings::default();
        assert!(settings.effective_ripples());
        settings.reduced_motion = true;
        assert!(!settings.effective_ripples());
    }

    #[test]
    fn test_partial_json_fills_defaults() {
        let settings = Settings::from_json(r#"{"quality":"High","ripples":false}"#).unwrap();
        assert_eq!(settings.quality, QualityPreset::High);
        assert!(!settings.ripples);
        assert!(settings.pointer_bump);
        assert_eq!(settings.tuning, Tuning::default());
    }

    #[test]
    fn test_json_round_trip() {
        let mut settings = Settings::from_preset(QualityPreset::Low);
        settings.tuning.dialog.strength = -2.0;
        let json = settings.to_json().unwrap();
        assert_eq!(Settings::from_json(&json).unwrap(), settings);
    }

    #[test]
    fn test_bad_json_is_an_error() {
        assert!(matches!(
            Settings::from_json("{quality:"),
            Err(SettingsError::Json(_))
        ));
    }

    #[test]
    fn test_tuning_lookup() {
        let tuning = Tuning::default();
        assert_eq!(
            tuning.source_config(SourceId::Tile),
            SourceConfig::defaults_for(SourceId::Tile)
        );
    }
}
