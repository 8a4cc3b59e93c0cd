//! Drawing surface seam and a recording implementation

use serde::{Deserialize, Serialize};

/// Host-supplied drawing primitives, aligned pixel-for-pixel with the
/// camera frame
pub trait OverlaySurface: Send {
    /// Set the surface dimensions. Resizing also clears the surface.
    fn resize(&mut self, width: u32, height: u32);

    fn size(&self) -> (u32, u32);

    /// Erase the whole surface
    fn clear(&mut self);

    fn stroke_rect(&mut self, x: f32, y: f32, width: f32, height: f32, color: &str, line_width: f32);

    /// Draw `text` with its baseline starting at (x, y)
    fn fill_text(&mut self, text: &str, x: f32, y: f32, color: &str, font: &str);
}

/// One recorded drawing operation
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "op", rename_all = "snake_case")]
pub enum DrawCommand {
    StrokeRect {
        x: f32,
        y: f32,
        width: f32,
        height: f32,
        color: String,
        line_width: f32,
    },
    FillText {
        text: String,
        x: f32,
        y: f32,
        color: String,
        font: String,
    },
}

/// Surface that keeps the commands drawn since the last clear
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DisplayList {
    width: u32,
    height: u32,
    commands: Vec<DrawCommand>,
}

impl DisplayList {
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            width,
            height,
            commands: Vec::new(),
        }
    }

    pub fn commands(&self) -> &[DrawCommand] {
        &self.commands
    }

    /// Text of every `FillText` command, in draw order
    pub fn texts(&self) -> Vec<&str> {
        self.commands
            .iter()
            .filter_map(|command| match command {
                DrawCommand::FillText { text, .. } => Some(text.as_str()),
                _ => None,
            })
            .collect()
    }

    pub fn rect_count(&self) -> usize {
        self.commands
            .iter()
            .filter(|command| matches!(command, DrawCommand::StrokeRect { .. }))
            .count()
    }

    pub fn is_blank(&self) -> bool {
        self.commands.is_empty()
    }
}

impl OverlaySurface for DisplayList {
    fn resize(&mut self, width: u32, height: u32) {
        self.width = width;
        self.height = height;
        self.commands.clear();
    }

    fn size(&self) -> (u32, u32) {
        (self.width, self.height)
    }

    fn clear(&mut self) {
        self.commands.clear();
    }

    fn stroke_rect(&mut self, x: f32, y: f32, width: f32, height: f32, color: &str, line_width: f32) {
        self.commands.push(DrawCommand::StrokeRect {
            x,
            y,
            width,
            height,
            color: color.to_string(),
            line_width,
        });
    }

    fn fill_text(&mut self, text: &str, x: f32, y: f32, color: &str, font: &str) {
        self.commands.push(DrawCommand::FillText {
            text: text.to_string(),
            x,
            y,
            color: color.to_string(),
            font: font.to_string(),
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_resize_clears() {
        let mut list = DisplayList::new(10, 10);
        list.stroke_rect(0.0, 0.0, 5.0, 5.0, "#00FF00", 2.0);
        list.resize(640, 480);
        assert_eq!(list.size(), (640, 480));
        assert!(list.is_blank());
    }

    #[test]
    fn test_records_in_order() {
        let mut list = DisplayList::new(10, 10);
        list.stroke_rect(1.0, 2.0, 3.0, 4.0, "#00FF00", 2.0);
        list.fill_text("cup", 1.0, 10.0, "#00FF00", "14px Arial");
        assert_eq!(list.rect_count(), 1);
        assert_eq!(list.texts(), vec!["cup"]);
        list.clear();
        assert!(list.is_blank());
    }

    #[test]
    fn test_serializes_with_op_tag() {
        let mut list = DisplayList::new(4, 4);
        list.fill_text("0:01", 0.0, 10.0, "#FF69B4", "14px Arial");
        let json = serde_json::to_value(&list).unwrap();
        assert_eq!(json["commands"][0]["op"], "fill_text");
        assert_eq!(json["width"], 4);
    }
}
