use std::fs;
use std::path::Path;

use egui::Color32;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::codec::{DocumentFormat, hex_color};
use crate::input::PointerSource;
use crate::stroke::is_valid_width;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to parse config: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("Invalid config value: {0}")]
    Invalid(String),
}

/// Canvas settings. Missing fields fall back to their defaults when loading.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CanvasConfig {
    #[serde(with = "hex_color")]
    pub default_color: Color32,
    pub default_width: f64,
    /// Canvas color; also what the eraser paints with
    #[serde(with = "hex_color")]
    pub background: Color32,
    /// The only pointer source that draws
    pub primary_source: PointerSource,
    pub record_contact_point: bool,
    /// Append the `Up` location when it differs from the last recorded point
    pub record_lift_off: bool,
    /// Format new documents are written in
    pub document_format: DocumentFormat,
    /// Longest side of generated thumbnails, in pixels
    pub thumbnail_max_side: u32,
}

impl Default for CanvasConfig {
    fn default() -> Self {
        Self {
            default_color: Color32::BLACK,
            default_width: 5.0,
            background: Color32::WHITE,
            primary_source: PointerSource::Stylus,
            record_contact_point: true,
            record_lift_off: false,
            document_format: DocumentFormat::Versioned,
            thumbnail_max_side: 160,
        }
    }
}

impl CanvasConfig {
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let json = fs::read_to_string(path)?;
        Self::from_json(&json)
    }

    pub fn from_json(json: &str) -> Result<Self, ConfigError> {
        let config: Self = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    pub fn save(&self, path: impl AsRef<Path>) -> Result<(), ConfigError> {
        let json = serde_json::to_string_pretty(self)?;
        fs::write(path, json)?;
        Ok(())
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if !is_valid_width(self.default_width) {
            return Err(ConfigError::Invalid(format!(
                "default_width must be positive, got {}",
                self.default_width
            )));
        }
        if self.thumbnail_max_side == 0 {
            return Err(ConfigError::Invalid("thumbnail_max_side must be at least 1".into()));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_partial_config_uses_defaults() {
        let config = CanvasConfig::from_json(r#"{ "primary_source": "mouse" }"#).unwrap();
        assert_eq!(config.primary_source, PointerSource::Mouse);
        assert_eq!(config.default_width, 5.0);
        assert_eq!(config.background, Color32::WHITE);
        assert_eq!(config.document_format, DocumentFormat::Versioned);
        assert!(config.record_contact_point);
        assert!(!config.record_lift_off);
    }

    #[test]
    fn test_colors_are_hex() {
        let config = CanvasConfig::from_json(r##"{ "default_color": "#FF0000" }"##).unwrap();
        assert_eq!(config.default_color, Color32::RED);

        let json = serde_json::to_string(&CanvasConfig::default()).unwrap();
        assert!(json.contains(r##""background":"#FFFFFF""##));
        assert!(json.contains(r#""document_format":"versioned""#));
    }

    #[test]
    fn test_invalid_values() {
        assert!(matches!(
            CanvasConfig::from_json(r#"{ "default_width": 0 }"#),
            Err(ConfigError::Invalid(_))
        ));
        assert!(matches!(
            CanvasConfig::from_json(r#"{ "thumbnail_max_side": 0 }"#),
            Err(ConfigError::Invalid(_))
        ));
        assert!(matches!(
            CanvasConfig::from_json(r#"{ "primary_source": "trackpad" }"#),
            Err(ConfigError::Parse(_))
        ));
    }

    #[test]
    fn test_save_and_load() {
        let dir = std::env::temp_dir().join(format!("pencil-config-{}", uuid::Uuid::new_v4()));
        fs::create_dir_all(&dir).unwrap();
        let path = dir.join("canvas.json");

        let mut config = CanvasConfig::default();
        config.primary_source = PointerSource::Touch;
        config.default_width = 3.0;
        config.save(&path).unwrap();

        assert_eq!(CanvasConfig::load(&path).unwrap(), config);
        fs::remove_dir_all(&dir).unwrap();
    }
}
