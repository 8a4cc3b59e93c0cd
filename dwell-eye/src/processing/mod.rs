//! Per-cycle processing: visibility timers and the detection loop

pub mod detection_loop;
pub mod timers;

pub use detection_loop::{DetectionLoop, DetectionSink, LoopState, LoopStats};
pub use timers::{Clock, Elapsed, ManualClock, SystemClock, TimerRegistry};
