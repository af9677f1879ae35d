use std::path::Path;

use anyhow::{bail, Context, Result};
use livetable_shared::{HandOptions, ScreenOptions};
use serde::{Deserialize, Serialize};

/// Options of both pipelines, as read from a `.toml` or `.json` file.
/// Sections and keys that are left out keep their defaults.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub hand: HandOptions,
    pub screen: ScreenOptions,
}

impl Config {
    pub fn from_toml_str(text: &str) -> Result<Self> {
        let config: Config = toml::from_str(text).context("Invalid TOML config")?;
        config.validate()?;
        Ok(config)
    }

    pub fn from_json_str(text: &str) -> Result<Self> {
        let config: Config = serde_json::from_str(text).context("Invalid JSON config")?;
        config.validate()?;
        Ok(config)
    }

    /// Loads a config file, picking the format from its extension
    pub fn load(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config {}", path.display()))?;
        let ext = path
            .extension()
            .and_then(|e| e.to_str())
            .map(|e| e.to_ascii_lowercase());
        let config = match ext.as_deref() {
            Some("toml") => Self::from_toml_str(&text),
            Some("json") => Self::from_json_str(&text),
            _ => bail!(
                "Unsupported config format {}, expected .toml or .json",
                path.display()
            ),
        };
        config.with_context(|| format!("Failed to load config {}", path.display()))
    }

    pub fn validate(&self) -> Result<()> {
        self.hand.validate().context("Invalid hand options")?;
        self.screen.validate().context("Invalid screen options")?;
        Ok(())
    }

    /// Overrides the maximum analyzed frame size
    pub fn with_max_size(mut self, width: Option<u32>, height: Option<u32>) -> Self {
        if let Some(width) = width {
            self.hand.max_image_width = width;
        }
        if let Some(height) = height {
            self.hand.max_image_height = height;
        }
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use livetable_shared::ThresholdType;

    #[test]
    fn test_toml_sections() {
        let config = Config::from_toml_str(
            r#"
            [hand]
            blurIntensity = 7
            thresholdType = "CV_THRESH_BINARY"

            [hand.depth]
            depthBlur = 5

            [screen.quadOptions]
            minAngleOfIntersectingLines = 60.0
            "#,
        )
        .unwrap();
        assert_eq!(config.hand.blur_intensity, 7);
        assert_eq!(config.hand.threshold_type, ThresholdType::Binary);
        assert_eq!(config.hand.depth.depth_blur, 5);
        assert_eq!(config.hand.crop_width, 12);
        assert_eq!(config.screen.quad_options.min_angle_of_intersecting_lines, 60.0);
        assert_eq!(config.screen.blur_intensity, 21);
    }

    #[test]
    fn test_empty_json_is_default() {
        assert_eq!(Config::from_json_str("{}").unwrap(), Config::default());
    }

    #[test]
    fn test_invalid_values_rejected_at_load() {
        let err = Config::from_json_str(r#"{"screen": {"blurIntensity": 20}}"#).unwrap_err();
        assert!(format!("{:#}", err).contains("blurIntensity"));
    }

    #[test]
    fn test_max_size_override() {
        let config = Config::default().with_max_size(Some(640), None);
        assert_eq!(config.hand.max_image_width, 640);
        assert_eq!(config.hand.max_image_height, 1000);
    }

    #[test]
    fn test_unknown_extension() {
        let file = tempfile::Builder::new().suffix(".yaml").tempfile().unwrap();
        std::fs::write(file.path(), "hand: {}").unwrap();
        let err = Config::load(file.path()).unwrap_err();
        assert!(err.to_string().contains("Unsupported config format"));
    }
}
