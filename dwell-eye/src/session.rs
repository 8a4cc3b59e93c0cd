//! Session: the coordinating object that owns all per-feed state
//!
//! The latest detection set, the timer registry, the overlay surface and
//! the capture board live behind one lock. The detection loop, the capture
//! button and pointer input all go through it, so the registry and the
//! overlay never observe overlapping detection sets.

use crate::camera::{Frame, FrameFeed, FrameGeometry};
use crate::capture::{CaptureBoard, CaptureManager, DragResponse, PointerEvent};
use crate::config::VisionConfig;
use crate::error::VisionError;
use crate::models::{Classifier, Detection};
use crate::overlay::{OverlayRenderer, OverlaySurface};
use crate::processing::{Clock, DetectionLoop, DetectionSink, Elapsed, SystemClock, TimerRegistry};
use parking_lot::Mutex;
use std::sync::Arc;
use tokio::sync::{broadcast, mpsc, watch};
use tokio::task::JoinHandle;
use tracing::{debug, error, info, warn};
use uuid::Uuid;

/// Progress notifications for hosts
#[derive(Debug, Clone, PartialEq)]
pub enum SessionEvent {
    /// Overlay resized to match the camera
    FrameGeometry(FrameGeometry),
    ModelReady,
    ModelFailed { message: String },
    CycleCompleted { cycle: u64, detections: usize },
    ClassifierFailed { cycle: u64, message: String },
    Captured { ids: Vec<Uuid> },
    CameraFailed { message: String },
}

struct SessionState<S> {
    detections: Vec<Detection>,
    timers: TimerRegistry,
    surface: S,
    board: CaptureBoard,
}

pub struct Session<S: OverlaySurface> {
    config: Arc<VisionConfig>,
    frames: FrameFeed,
    renderer: OverlayRenderer,
    capture: CaptureManager,
    state: Mutex<SessionState<S>>,
    events: broadcast::Sender<SessionEvent>,
    /// Raised once the session can no longer run, e.g. the camera is gone
    halt: watch::Sender<bool>,
}

impl<S: OverlaySurface + 'static> Session<S> {
    /// Create a session drawing onto `surface`
    pub fn new(config: VisionConfig, surface: S) -> Result<Self, VisionError> {
        Self::with_clock(config, surface, Arc::new(SystemClock))
    }

    /// Create a session whose timers read `clock`
    pub fn with_clock(config: VisionConfig, surface: S, clock: Arc<dyn Clock>) -> Result<Self, VisionError> {
        config
            .validate()
            .map_err(|e| VisionError::Config(format!("Invalid vision config: {}", e)))?;

        const EVENT_BUFFER_SIZE: usize = 1024;
        let (events, _) = broadcast::channel(EVENT_BUFFER_SIZE);

        Ok(Self {
            renderer: OverlayRenderer::new(config.style.clone(), config.display_threshold),
            capture: CaptureManager::new(config.capture_threshold),
            config: Arc::new(config),
            frames: FrameFeed::new(),
            state: Mutex::new(SessionState {
                detections: Vec::new(),
                timers: TimerRegistry::new(clock),
                surface,
                board: CaptureBoard::new(),
            }),
            events,
            halt: watch::channel(false).0,
        })
    }

    pub fn config(&self) -> &Arc<VisionConfig> {
        &self.config
    }

    pub fn frames(&self) -> &FrameFeed {
        &self.frames
    }

    pub fn subscribe_events(&self) -> broadcast::Receiver<SessionEvent> {
        self.events.subscribe()
    }

    /// Hand the session a new camera frame. The overlay is resized before
    /// the frame becomes visible to the detection loop.
    pub fn push_frame(&self, frame: Frame) {
        if let Some(geometry) = self.frames.record_geometry(&frame) {
            self.on_frame_geometry(geometry);
        }
        self.frames.send(frame);
    }

    /// Size the overlay to the camera frame. Repeating the same geometry
    /// is a no-op.
    pub fn on_frame_geometry(&self, geometry: FrameGeometry) {
        {
            let mut state = self.state.lock();
            if state.surface.size() == (geometry.width, geometry.height) {
                return;
            }
            state.surface.resize(geometry.width, geometry.height);
        }
        info!("Overlay sized to {}x{}", geometry.width, geometry.height);
        self.emit(SessionEvent::FrameGeometry(geometry));
    }

    /// Replace the current detection set, then update timers and redraw
    pub fn apply_detections(&self, detections: Vec<Detection>) {
        let mut guard = self.state.lock();
        self.apply_locked(&mut guard, detections);
    }

    fn apply_locked(&self, state: &mut SessionState<S>, detections: Vec<Detection>) {
        state.detections = detections;
        state.timers.update(state.detections.iter().map(|d| d.label.as_str()));
        self.renderer
            .render(&mut state.surface, &state.detections, &state.timers);
    }

    /// Whether a terminal failure has ended the session
    pub fn is_halted(&self) -> bool {
        *self.halt.borrow()
    }

    /// Capture button: snapshot every detection in the latest set above
    /// the capture threshold, using the latest frame
    pub fn capture_button(&self) -> Vec<Uuid> {
        let Some(frame) = self.frames.latest() else {
            warn!("Capture requested before the first camera frame");
            return Vec::new();
        };

        let ids = {
            let mut guard = self.state.lock();
            let state = &mut *guard;
            self.capture.capture_all(&state.detections, &frame, &mut state.board)
        };

        info!("Captured {} object(s)", ids.len());
        if !ids.is_empty() {
            self.emit(SessionEvent::Captured { ids: ids.clone() });
        }
        ids
    }

    /// Route pointer input to the captured objects
    pub fn handle_pointer(&self, event: PointerEvent) -> Option<(Uuid, DragResponse)> {
        self.state.lock().board.handle_pointer(event)
    }

    /// Copy of the latest detection set
    pub fn detections(&self) -> Vec<Detection> {
        self.state.lock().detections.clone()
    }

    pub fn elapsed(&self, label: &str) -> Option<Elapsed> {
        self.state.lock().timers.elapsed(label)
    }

    pub fn tracked_labels(&self) -> Vec<String> {
        self.state.lock().timers.labels()
    }

    /// Inspect the overlay surface
    pub fn with_surface<R>(&self, f: impl FnOnce(&S) -> R) -> R {
        f(&self.state.lock().surface)
    }

    /// Inspect or rearrange the captured objects
    pub fn with_board<R>(&self, f: impl FnOnce(&mut CaptureBoard) -> R) -> R {
        f(&mut self.state.lock().board)
    }

    /// Report a camera acquisition failure. Terminal for the session: the
    /// detection loop ends and later cycle results are discarded.
    pub fn camera_failed(&self, err: &VisionError) {
        error!("Camera error: {}", err);
        // Held so no cycle result can land between the halt and the event
        let _guard = self.state.lock();
        self.halt.send_replace(true);
        self.emit(SessionEvent::CameraFailed {
            message: err.to_string(),
        });
    }

    fn emit(&self, event: SessionEvent) {
        // No subscribers is fine
        let _ = self.events.send(event);
    }
}

impl<S: OverlaySurface + 'static> Session<S> {
    /// Start the detection loop for this session
    pub fn start_detection(self: &Arc<Self>, classifier: Arc<dyn Classifier>) -> DetectionLoop {
        let sink: Arc<dyn DetectionSink> = self.clone();
        DetectionLoop::spawn_with_halt(classifier, self.frames.subscribe(), sink, self.halt.subscribe())
    }

    /// Forward a camera stream into the session until it ends or fails
    pub fn attach_camera(
        self: &Arc<Self>,
        mut frames: mpsc::Receiver<Result<Frame, VisionError>>,
    ) -> JoinHandle<Result<(), VisionError>> {
        let session = self.clone();
        tokio::spawn(async move {
            while let Some(frame) = frames.recv().await {
                match frame {
                    Ok(frame) => session.push_frame(frame),
                    Err(e) => {
                        session.camera_failed(&e);
                        return Err(e);
                    }
                }
            }
            debug!("Camera stream ended");
            Ok(())
        })
    }
}

impl<S: OverlaySurface + 'static> DetectionSink for Session<S> {
    fn on_ready(&self) {
        self.emit(SessionEvent::ModelReady);
    }

    fn on_load_failed(&self, error: &VisionError) {
        self.emit(SessionEvent::ModelFailed {
            message: error.to_string(),
        });
    }

    fn on_detections(&self, cycle: u64, detections: Vec<Detection>) {
        let mut guard = self.state.lock();
        if self.is_halted() {
            debug!("Dropping cycle {} result, session halted", cycle);
            return;
        }
        let count = detections.len();
        self.apply_locked(&mut guard, detections);
        self.emit(SessionEvent::CycleCompleted {
            cycle,
            detections: count,
        });
    }

    fn on_failure(&self, cycle: u64, error: &VisionError) {
        let _guard = self.state.lock();
        if self.is_halted() {
            return;
        }
        self.emit(SessionEvent::ClassifierFailed {
            cycle,
            message: error.to_string(),
        });
    }
}
