//! Capturing detections as draggable snapshots

pub mod board;
pub mod drag;
pub mod manager;

pub use board::CaptureBoard;
pub use drag::{DragController, DragResponse, DragState, Draggable, Point, PointerEvent};
pub use manager::{CaptureManager, CapturedObject};
