//! Detection values and the classifier they come from

pub mod classifier;
pub mod detection;
pub mod scripted;

pub use classifier::Classifier;
pub use detection::{BoundingBox, Detection, PixelRect};
pub use scripted::{ScriptStep, ScriptedClassifier};
