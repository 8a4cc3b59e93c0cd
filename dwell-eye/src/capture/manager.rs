//! Snapshotting detected regions into captured objects

use crate::camera::Frame;
use crate::capture::drag::{DragController, Draggable, Point};
use crate::capture::CaptureBoard;
use crate::error::VisionError;
use crate::models::Detection;
use chrono::{DateTime, Utc};
use image::codecs::png::PngEncoder;
use image::{imageops, ColorType, ImageEncoder, RgbImage};
use tracing::{debug, warn};
use uuid::Uuid;

/// A frozen crop of a detection with its label caption.
///
/// Independent of the detection and its timer once created.
#[derive(Debug, Clone)]
pub struct CapturedObject {
    id: Uuid,
    label: String,
    confidence: f32,
    image: RgbImage,
    position: Point,
    captured_at: DateTime<Utc>,
    drag: Option<DragController>,
}

impl CapturedObject {
    pub fn new(label: impl Into<String>, confidence: f32, image: RgbImage, position: Point) -> Self {
        Self {
            id: Uuid::new_v4(),
            label: label.into(),
            confidence,
            image,
            position,
            captured_at: Utc::now(),
            drag: None,
        }
    }

    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn label(&self) -> &str {
        &self.label
    }

    /// Caption shown under the snapshot
    pub fn caption(&self) -> &str {
        &self.label
    }

    /// Confidence of the detection at capture time
    pub fn confidence(&self) -> f32 {
        self.confidence
    }

    pub fn image(&self) -> &RgbImage {
        &self.image
    }

    pub fn captured_at(&self) -> DateTime<Utc> {
        self.captured_at
    }

    pub fn is_draggable(&self) -> bool {
        self.drag.is_some()
    }

    pub fn drag_controller(&self) -> Option<&DragController> {
        self.drag.as_ref()
    }

    /// Whether `point` falls on the snapshot
    pub fn contains(&self, point: Point) -> bool {
        point.x >= self.position.x
            && point.y >= self.position.y
            && point.x < self.position.x + self.image.width() as f32
            && point.y < self.position.y + self.image.height() as f32
    }

    /// Snapshot encoded as PNG
    pub fn encode_png(&self) -> Result<Vec<u8>, VisionError> {
        let mut bytes = Vec::new();
        PngEncoder::new(&mut bytes).write_image(
            self.image.as_raw(),
            self.image.width(),
            self.image.height(),
            ColorType::Rgb8,
        )?;
        Ok(bytes)
    }
}

impl Draggable for CapturedObject {
    fn position(&self) -> Point {
        self.position
    }

    fn set_position(&mut self, position: Point) {
        self.position = position;
    }

    fn drag_slot(&mut self) -> &mut Option<DragController> {
        &mut self.drag
    }
}

/// Crops detections out of the current frame
#[derive(Debug, Clone)]
pub struct CaptureManager {
    capture_threshold: f32,
}

impl CaptureManager {
    pub fn new(capture_threshold: f32) -> Self {
        Self { capture_threshold }
    }

    pub fn capture_threshold(&self) -> f32 {
        self.capture_threshold
    }

    /// Snapshot one detection.
    ///
    /// Returns `Ok(None)` when the detection is not confident enough to be
    /// captured. The box is clamped to the frame first; a box with nothing
    /// left inside the frame is rejected. The snapshot is anchored at the
    /// box's own top-left corner unless clamping moved that edge.
    pub fn capture(&self, detection: &Detection, frame: &Frame) -> Result<Option<CapturedObject>, VisionError> {
        if !detection.exceeds(self.capture_threshold) {
            return Ok(None);
        }

        let rect = detection
            .bbox
            .clamp_to(frame.width(), frame.height())
            .ok_or_else(|| {
                VisionError::Capture(format!(
                    "'{}' box {:?} lies outside the {}x{} frame",
                    detection.label,
                    detection.bbox,
                    frame.width(),
                    frame.height()
                ))
            })?;

        let crop = imageops::crop_imm(frame, rect.x, rect.y, rect.width, rect.height).to_image();
        let mut object = CapturedObject::new(
            detection.label.clone(),
            detection.confidence,
            crop,
            Self::anchor(detection, rect.x, rect.y),
        );
        DragController::attach(&mut object);

        debug!(
            "Captured '{}' ({}x{} at {},{})",
            object.label, rect.width, rect.height, rect.x, rect.y
        );
        Ok(Some(object))
    }

    fn anchor(detection: &Detection, clamped_x: u32, clamped_y: u32) -> Point {
        let bbox = &detection.bbox;
        let x = if bbox.x >= 0.0 { bbox.x } else { clamped_x as f32 };
        let y = if bbox.y >= 0.0 { bbox.y } else { clamped_y as f32 };
        Point::new(x, y)
    }

    /// Capture every eligible detection onto `board`, returning the new ids.
    /// Rejected boxes are logged and skipped.
    pub fn capture_all(&self, detections: &[Detection], frame: &Frame, board: &mut CaptureBoard) -> Vec<Uuid> {
        let mut ids = Vec::new();
        for detection in detections {
            match self.capture(detection, frame) {
                Ok(Some(object)) => ids.push(board.insert(object)),
                Ok(None) => {}
                Err(e) => warn!("Skipping capture: {}", e),
            }
        }
        ids
    }
}

impl Default for CaptureManager {
    fn default() -> Self {
        Self::new(crate::config::DEFAULT_CAPTURE_THRESHOLD)
    }
}
