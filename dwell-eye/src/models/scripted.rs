//! Scripted classifier for replays, demos and tests

use crate::camera::Frame;
use crate::error::VisionError;
use crate::models::{Classifier, Detection};
use async_trait::async_trait;
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;
use tracing::debug;

/// Outcome of one scripted detection pass
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ScriptStep {
    Detections(Vec<Detection>),
    Fail(String),
}

/// Classifier that replays a fixed script of results, wrapping around at
/// the end. Frames are ignored.
pub struct ScriptedClassifier {
    steps: Vec<ScriptStep>,
    cursor: AtomicUsize,
    calls: AtomicUsize,
    latency: Duration,
    ready_delay: Duration,
    ready_error: Mutex<Option<String>>,
}

impl ScriptedClassifier {
    pub fn new(steps: Vec<ScriptStep>) -> Self {
        Self {
            steps,
            cursor: AtomicUsize::new(0),
            calls: AtomicUsize::new(0),
            latency: Duration::ZERO,
            ready_delay: Duration::ZERO,
            ready_error: Mutex::new(None),
        }
    }

    /// Every pass returns the same detections
    pub fn constant(detections: Vec<Detection>) -> Self {
        Self::new(vec![ScriptStep::Detections(detections)])
    }

    /// Parse a script from JSON (an array of steps)
    pub fn from_json(json: &str) -> Result<Self, VisionError> {
        let steps: Vec<ScriptStep> = serde_json::from_str(json)
            .map_err(|e| VisionError::Config(format!("Invalid classifier script: {}", e)))?;
        Ok(Self::new(steps))
    }

    /// Simulated inference time per pass
    pub fn with_latency(mut self, latency: Duration) -> Self {
        self.latency = latency;
        self
    }

    /// Simulated model load time
    pub fn with_ready_delay(mut self, delay: Duration) -> Self {
        self.ready_delay = delay;
        self
    }

    /// Model load fails with `message`
    pub fn with_ready_error(self, message: impl Into<String>) -> Self {
        *self.ready_error.lock() = Some(message.into());
        self
    }

    /// Number of detection passes served so far
    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl Classifier for ScriptedClassifier {
    async fn ready(&self) -> Result<(), VisionError> {
        if !self.ready_delay.is_zero() {
            tokio::time::sleep(self.ready_delay).await;
        }
        match self.ready_error.lock().take() {
            Some(message) => Err(VisionError::Model(message)),
            None => Ok(()),
        }
    }

    async fn detect(&self, _frame: &Frame) -> Result<Vec<Detection>, VisionError> {
        if !self.latency.is_zero() {
            tokio::time::sleep(self.latency).await;
        }
        self.calls.fetch_add(1, Ordering::SeqCst);

        if self.steps.is_empty() {
            return Ok(Vec::new());
        }

        let index = self.cursor.fetch_add(1, Ordering::SeqCst) % self.steps.len();
        debug!("Scripted classifier serving step {}", index);
        match &self.steps[index] {
            ScriptStep::Detections(detections) => Ok(detections.clone()),
            ScriptStep::Fail(message) => Err(VisionError::Classifier(message.clone())),
        }
    }
}
