use std::{fs, path::Path};

use serde::{Deserialize, Serialize};

use crate::{settings::Settings, tempo::TempoConfig, Result};

/// Top-level configuration structure for the application.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub window: WindowConfig,
    pub tempo: TempoConfig,
    /// Initial control-panel values.
    pub settings: Settings,
}

impl AppConfig {
    pub fn live_defaults() -> Self {
        Self::default()
    }

    /// Reads a JSON config file. Missing sections fall back to defaults and
    /// out-of-range settings are clamped.
    pub fn load(path: &Path) -> Result<Self> {
        let raw = fs::read_to_string(path)?;
        let config = Self::from_json(&raw)?;
        tracing::info!(path = %path.display(), "loaded configuration");
        Ok(config)
    }

    pub fn from_json(raw: &str) -> Result<Self> {
        let mut config: Self = serde_json::from_str(raw)?;
        config.settings.clamp_to_ranges();
        Ok(config)
    }

    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }
}

/// Initial viewport.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct WindowConfig {
    pub width: u32,
    pub height: u32,
}

impl Default for WindowConfig {
    fn default() -> Self {
        Self {
            width: 1280,
            height: 720,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::settings::BlendMode;

    #[test]
    fn partial_json_uses_defaults() {
        let config =
            AppConfig::from_json(r#"{"window": {"width": 800}, "settings": {"blendMode": "add"}}"#)
                .unwrap();

        assert_eq!(config.window.width, 800);
        assert_eq!(config.window.height, 720);
        assert_eq!(config.tempo, TempoConfig::default());
        assert_eq!(config.settings.blend_mode(), BlendMode::Add);
        assert_eq!(config.settings.blend_mode_index(), 1);
    }

    #[test]
    fn out_of_range_settings_are_clamped_on_load() {
        let config =
            AppConfig::from_json(r#"{"settings": {"bpm": 400, "pulseStrength": -2}}"#).unwrap();
        assert_eq!(config.settings.bpm(), 220);
        assert_eq!(config.settings.pulse_strength(), 0.0);
    }

    #[test]
    fn rejects_bad_colors_and_blend_modes() {
        assert!(AppConfig::from_json(r#"{"settings": {"colorA": "purple"}}"#).is_err());
        assert!(AppConfig::from_json(r#"{"settings": {"blendMode": "multiply"}}"#).is_err());
    }

    #[test]
    fn defaults_survive_a_json_round_trip() {
        let config = AppConfig::live_defaults();
        let parsed = AppConfig::from_json(&config.to_json().unwrap()).unwrap();
        assert_eq!(parsed, config);
    }
}
