//! Detection values produced by a classifier

use serde::{Deserialize, Serialize};

/// Axis-aligned bounding box in frame-pixel coordinates
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BoundingBox {
    pub x: f32,
    pub y: f32,
    pub width: f32,
    pub height: f32,
}

/// Integer pixel region that lies fully inside a frame
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PixelRect {
    pub x: u32,
    pub y: u32,
    pub width: u32,
    pub height: u32,
}

impl BoundingBox {
    pub fn new(x: f32, y: f32, width: f32, height: f32) -> Self {
        Self { x, y, width, height }
    }

    pub fn is_finite(&self) -> bool {
        self.x.is_finite() && self.y.is_finite() && self.width.is_finite() && self.height.is_finite()
    }

    /// Clamp the box to a `frame_width` x `frame_height` frame.
    ///
    /// Returns `None` when nothing of the box is left inside the frame or
    /// the coordinates are not finite.
    pub fn clamp_to(&self, frame_width: u32, frame_height: u32) -> Option<PixelRect> {
        if !self.is_finite() || self.width <= 0.0 || self.height <= 0.0 {
            return None;
        }

        let fw = frame_width as f32;
        let fh = frame_height as f32;
        let left = self.x.floor().clamp(0.0, fw);
        let top = self.y.floor().clamp(0.0, fh);
        let right = (self.x + self.width).ceil().clamp(0.0, fw);
        let bottom = (self.y + self.height).ceil().clamp(0.0, fh);

        if right <= left || bottom <= top {
            return None;
        }

        Some(PixelRect {
            x: left as u32,
            y: top as u32,
            width: (right - left) as u32,
            height: (bottom - top) as u32,
        })
    }
}

/// One classifier output
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Detection {
    pub label: String,
    /// Confidence in [0, 1]
    pub confidence: f32,
    pub bbox: BoundingBox,
}

impl Detection {
    pub fn new(label: impl Into<String>, confidence: f32, bbox: BoundingBox) -> Self {
        Self {
            label: label.into(),
            confidence,
            bbox,
        }
    }

    /// Strictly above `threshold`. NaN confidences never pass.
    pub fn exceeds(&self, threshold: f32) -> bool {
        self.confidence > threshold
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_clamp_inside_frame() {
        let bbox = BoundingBox::new(10.0, 20.0, 30.0, 40.0);
        assert_eq!(
            bbox.clamp_to(640, 480),
            Some(PixelRect { x: 10, y: 20, width: 30, height: 40 })
        );
    }

    #[test]
    fn test_clamp_overhanging_edges() {
        let bbox = BoundingBox::new(-5.0, 470.0, 20.0, 30.0);
        assert_eq!(
            bbox.clamp_to(640, 480),
            Some(PixelRect { x: 0, y: 470, width: 15, height: 10 })
        );
    }

    #[test]
    fn test_clamp_fractional_box_covers_partial_pixels() {
        let bbox = BoundingBox::new(1.5, 2.5, 3.0, 3.0);
        assert_eq!(
            bbox.clamp_to(100, 100),
            Some(PixelRect { x: 1, y: 2, width: 4, height: 4 })
        );
    }

    #[test]
    fn test_clamp_outside_frame() {
        assert_eq!(BoundingBox::new(700.0, 10.0, 20.0, 20.0).clamp_to(640, 480), None);
        assert_eq!(BoundingBox::new(-50.0, -50.0, 20.0, 20.0).clamp_to(640, 480), None);
    }

    #[test]
    fn test_clamp_degenerate_boxes() {
        assert_eq!(BoundingBox::new(10.0, 10.0, 0.0, 20.0).clamp_to(640, 480), None);
        assert_eq!(BoundingBox::new(10.0, 10.0, -4.0, 20.0).clamp_to(640, 480), None);
        assert_eq!(BoundingBox::new(f32::NAN, 10.0, 4.0, 20.0).clamp_to(640, 480), None);
        assert_eq!(BoundingBox::new(10.0, 10.0, f32::INFINITY, 20.0).clamp_to(640, 480), None);
    }

    #[test]
    fn test_exceeds_is_strict() {
        let det = Detection::new("cup", 0.2, BoundingBox::new(0.0, 0.0, 1.0, 1.0));
        assert!(!det.exceeds(0.2));
        assert!(det.exceeds(0.1));

        let nan = Detection::new("cup", f32::NAN, BoundingBox::new(0.0, 0.0, 1.0, 1.0));
        assert!(!nan.exceeds(0.0));
    }
}
