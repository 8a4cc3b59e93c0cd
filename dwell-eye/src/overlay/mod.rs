//! Detection overlay: drawing surface and renderer

pub mod renderer;
pub mod surface;

pub use renderer::OverlayRenderer;
pub use surface::{DisplayList, DrawCommand, OverlaySurface};
