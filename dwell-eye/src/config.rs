//! Configuration for dwell-eye

use crate::error::VisionError;
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Minimum confidence for a detection to be drawn on the overlay
pub const DEFAULT_DISPLAY_THRESHOLD: f32 = 0.1;

/// Minimum confidence for a detection to be captured. Independent from
/// the display threshold.
pub const DEFAULT_CAPTURE_THRESHOLD: f32 = 0.2;

/// Drawing style for the detection overlay
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct OverlayStyle {
    /// Bounding box outline colour
    pub box_color: String,
    /// Bounding box outline width in pixels
    pub line_width: f32,
    /// Label text colour
    pub label_color: String,
    /// Elapsed timer text colour
    pub timer_color: String,
    /// Font for both text elements
    pub font: String,
    /// Distance between the box top edge and the text baseline
    pub label_lift: f32,
    /// Text baselines never go above this y so labels stay visible
    pub min_text_y: f32,
    /// Timer text is drawn this far left of the box's right edge
    pub timer_inset: f32,
}

impl Default for OverlayStyle {
    fn default() -> Self {
        Self {
            box_color: "#00FF00".to_string(),
            line_width: 2.0,
            label_color: "#00FF00".to_string(),
            timer_color: "#FF69B4".to_string(),
            font: "14px Arial".to_string(),
            label_lift: 5.0,
            min_text_y: 10.0,
            timer_inset: 25.0,
        }
    }
}

/// Vision system configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct VisionConfig {
    /// Camera device index (0, 1, 2, etc.)
    pub camera_id: u32,
    /// Target frame rate (frames per second)
    pub frame_rate: u32,
    /// Camera resolution (width, height)
    pub resolution: (u32, u32),
    /// Detections at or below this confidence are not drawn
    pub display_threshold: f32,
    /// Detections at or below this confidence are never captured
    pub capture_threshold: f32,
    /// Overlay drawing style
    pub style: OverlayStyle,
}

impl Default for VisionConfig {
    fn default() -> Self {
        Self {
            camera_id: 0,
            frame_rate: 30,
            resolution: (640, 480),
            display_threshold: DEFAULT_DISPLAY_THRESHOLD,
            capture_threshold: DEFAULT_CAPTURE_THRESHOLD,
            style: OverlayStyle::default(),
        }
    }
}

impl VisionConfig {
    /// Parse configuration from TOML. Missing keys take their defaults.
    pub fn from_toml_str(content: &str) -> Result<Self, VisionError> {
        let config: VisionConfig = toml::from_str(content)?;
        config.validate().map_err(VisionError::Config)?;
        Ok(config)
    }

    /// Load configuration from a TOML file
    pub fn load(path: impl AsRef<Path>) -> Result<Self, VisionError> {
        let content = std::fs::read_to_string(path.as_ref())?;
        Self::from_toml_str(&content)
    }

    /// Render the configuration as TOML
    pub fn to_toml_string(&self) -> Result<String, VisionError> {
        toml::to_string_pretty(self).map_err(|e| VisionError::Config(e.to_string()))
    }

    /// Validate configuration
    pub fn validate(&self) -> Result<(), String> {
        if self.frame_rate == 0 || self.frame_rate > 120 {
            return Err("Frame rate must be between 1 and 120".to_string());
        }

        if self.resolution.0 == 0 || self.resolution.1 == 0 {
            return Err("Resolution must be non-zero".to_string());
        }

        if self.resolution.0 > 7680 || self.resolution.1 > 4320 {
            return Err("Resolution too large (max 8K)".to_string());
        }

        if self.camera_id > 100 {
            return Err("Camera ID too large (max 100)".to_string());
        }

        for (name, value) in [
            ("display_threshold", self.display_threshold),
            ("capture_threshold", self.capture_threshold),
        ] {
            if !value.is_finite() || !(0.0..=1.0).contains(&value) {
                return Err(format!("{} must be within [0, 1]", name));
            }
        }

        if !self.style.line_width.is_finite() || self.style.line_width <= 0.0 {
            return Err("Line width must be positive".to_string());
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_default() {
        let config = VisionConfig::default();
        assert_eq!(config.camera_id, 0);
        assert_eq!(config.frame_rate, 30);
        assert_eq!(config.resolution, (640, 480));
        assert_eq!(config.display_threshold, 0.1);
        assert_eq!(config.capture_threshold, 0.2);
        assert_eq!(config.style.box_color, "#00FF00");
        assert_eq!(config.style.timer_color, "#FF69B4");
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_thresholds_are_independent() {
        let mut config = VisionConfig::default();
        config.display_threshold = 0.5;
        config.capture_threshold = 0.05;
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_config_validation_frame_rate() {
        let mut config = VisionConfig::default();
        config.frame_rate = 0;
        assert!(config.validate().is_err());
        config.frame_rate = 121;
        assert!(config.validate().is_err());
        config.frame_rate = 120;
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_config_validation_resolution() {
        let mut config = VisionConfig::default();
        config.resolution = (0, 480);
        assert!(config.validate().is_err());

        config.resolution = (7681, 4320);
        assert!(config.validate().is_err());

        config.resolution = (1, 1);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_config_validation_thresholds() {
        let mut config = VisionConfig::default();
        config.display_threshold = -0.1;
        assert!(config.validate().is_err());

        config.display_threshold = 0.1;
        config.capture_threshold = f32::NAN;
        assert!(config.validate().is_err());

        config.capture_threshold = 1.5;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_config_validation_line_width() {
        let mut config = VisionConfig::default();
        config.style.line_width = 0.0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_from_toml_partial() {
        let config = VisionConfig::from_toml_str(
            r##"
            frame_rate = 15
            capture_threshold = 0.4

            [style]
            box_color = "#FF0000"
            "##,
        )
        .unwrap();
        assert_eq!(config.frame_rate, 15);
        assert_eq!(config.capture_threshold, 0.4);
        assert_eq!(config.display_threshold, 0.1);
        assert_eq!(config.style.box_color, "#FF0000");
        assert_eq!(config.style.timer_inset, 25.0);
    }

    #[test]
    fn test_from_toml_invalid_values() {
        let err = VisionConfig::from_toml_str("frame_rate = 0").unwrap_err();
        assert!(matches!(err, VisionError::Config(_)));
    }

    #[test]
    fn test_toml_round_trip() {
        let config = VisionConfig::default();
        let text = config.to_toml_string().unwrap();
        let parsed = VisionConfig::from_toml_str(&text).unwrap();
        assert_eq!(parsed.resolution, config.resolution);
        assert_eq!(parsed.style, config.style);
    }

    #[test]
    fn test_load_from_file() {
        use std::io::Write;

        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "camera_id = 2").unwrap();
        writeln!(file, "resolution = [320, 240]").unwrap();

        let config = VisionConfig::load(file.path()).unwrap();
        assert_eq!(config.camera_id, 2);
        assert_eq!(config.resolution, (320, 240));
    }

    #[test]
    fn test_load_missing_file() {
        let err = VisionConfig::load("/nonexistent/dwell.toml").unwrap_err();
        assert!(matches!(err, VisionError::Io(_)));
    }
}
