//! dwell-eye: live detection overlay with dwell timers
//!
//! Draws classifier detections over a camera feed, times how long each
//! label has been continuously visible, and lets the user capture detected
//! regions as draggable snapshots.
//!
//! The classifier, the camera and the drawing surface are collaborators
//! supplied by the host through [`models::Classifier`],
//! [`camera::FrameFeed`] and [`overlay::OverlaySurface`].

pub mod camera;
pub mod capture;
pub mod config;
pub mod error;
pub mod models;
pub mod overlay;
pub mod processing;
pub mod session;

pub use config::{OverlayStyle, VisionConfig};
pub use error::VisionError;
pub use session::{Session, SessionEvent};
