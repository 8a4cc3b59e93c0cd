//! Error types for dwell-eye

use thiserror::Error;

#[derive(Error, Debug)]
pub enum VisionError {
    /// Camera or media acquisition failed. Terminal for the session.
    #[error("Camera error: {0}")]
    Camera(String),

    /// A single detection pass failed. The detection loop logs and retries.
    #[error("Classifier error: {0}")]
    Classifier(String),

    /// The classifier never became ready.
    #[error("Model error: {0}")]
    Model(String),

    #[error("Capture error: {0}")]
    Capture(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Image error: {0}")]
    Image(#[from] image::ImageError),

    #[error("TOML error: {0}")]
    Toml(#[from] toml::de::Error),
}

impl VisionError {
    /// Whether the error ends the session instead of a single cycle
    pub fn is_terminal(&self) -> bool {
        matches!(self, VisionError::Camera(_) | VisionError::Model(_))
    }
}
