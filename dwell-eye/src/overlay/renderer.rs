//! Per-cycle overlay drawing

use crate::config::OverlayStyle;
use crate::models::Detection;
use crate::overlay::OverlaySurface;
use crate::processing::TimerRegistry;
use tracing::debug;

/// Draws boxes, labels and dwell timers for one detection set
#[derive(Debug, Clone)]
pub struct OverlayRenderer {
    style: OverlayStyle,
    display_threshold: f32,
}

impl OverlayRenderer {
    pub fn new(style: OverlayStyle, display_threshold: f32) -> Self {
        Self {
            style,
            display_threshold,
        }
    }

    pub fn display_threshold(&self) -> f32 {
        self.display_threshold
    }

    /// Caption drawn above a box, e.g. `cup (95.0%)`. The percentage is
    /// rounded half up to one decimal.
    pub fn label_text(detection: &Detection) -> String {
        let percent = (f64::from(detection.confidence) * 1000.0).round() / 10.0;
        format!("{} ({:.1}%)", detection.label, percent)
    }

    /// Baseline for text above a box whose top edge is at `box_y`
    pub fn text_baseline(&self, box_y: f32) -> f32 {
        if box_y > self.style.min_text_y {
            box_y - self.style.label_lift
        } else {
            self.style.min_text_y
        }
    }

    /// Clear `surface` and redraw every detection above the display
    /// threshold. Timers must already reflect `detections`.
    pub fn render(&self, surface: &mut dyn OverlaySurface, detections: &[Detection], timers: &TimerRegistry) {
        surface.clear();

        let style = &self.style;
        let mut drawn = 0usize;
        for detection in detections.iter().filter(|d| d.exceeds(self.display_threshold)) {
            let bbox = &detection.bbox;
            let baseline = self.text_baseline(bbox.y);

            surface.stroke_rect(bbox.x, bbox.y, bbox.width, bbox.height, &style.box_color, style.line_width);
            surface.fill_text(&Self::label_text(detection), bbox.x, baseline, &style.label_color, &style.font);

            let elapsed = timers.elapsed(&detection.label).unwrap_or_default();
            surface.fill_text(
                &elapsed.to_string(),
                bbox.x + bbox.width - style.timer_inset,
                baseline,
                &style.timer_color,
                &style.font,
            );
            drawn += 1;
        }

        debug!("Overlay drew {} of {} detections", drawn, detections.len());
    }
}

impl Default for OverlayRenderer {
    fn default() -> Self {
        Self::new(OverlayStyle::default(), crate::config::DEFAULT_DISPLAY_THRESHOLD)
    }
}
