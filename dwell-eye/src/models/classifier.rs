//! Classifier seam
//!
//! The object-detection model is an external collaborator. Anything that
//! can load asynchronously and then answer one detection pass per call
//! fits behind [`Classifier`].

use crate::camera::Frame;
use crate::error::VisionError;
use crate::models::Detection;
use async_trait::async_trait;

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait Classifier: Send + Sync {
    /// Resolves once the model has finished loading. Called exactly once
    /// by the detection loop before the first pass.
    async fn ready(&self) -> Result<(), VisionError>;

    /// Run one detection pass over `frame`
    async fn detect(&self, frame: &Frame) -> Result<Vec<Detection>, VisionError>;
}
