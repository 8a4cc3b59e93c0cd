//! Continuous detection cycle against an external classifier

use crate::camera::Frame;
use crate::error::VisionError;
use crate::models::{Classifier, Detection};
use parking_lot::{Mutex, RwLock};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tracing::{debug, error, info, warn};

/// Receives the outcome of every detection cycle, in order
pub trait DetectionSink: Send + Sync + 'static {
    /// The classifier finished loading
    fn on_ready(&self);

    /// The classifier never became ready; the loop has ended
    fn on_load_failed(&self, error: &VisionError);

    /// A cycle succeeded
    fn on_detections(&self, cycle: u64, detections: Vec<Detection>);

    /// A cycle failed; the loop carries on with the next one
    fn on_failure(&self, cycle: u64, error: &VisionError);
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoopState {
    /// Waiting for the classifier to become ready
    Idle,
    Running,
    Stopped,
    /// The classifier failed to load
    Failed,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct LoopStats {
    /// Completed cycles, successful or not
    pub cycles: u64,
    pub failures: u64,
}

/// Handle to a running detection loop.
///
/// Cycles run strictly one after another: the next request is only made
/// once the previous result has been handed to the sink. There is no
/// per-cycle timeout; a classifier call that never completes stalls the
/// loop until [`DetectionLoop::stop`] is called.
pub struct DetectionLoop {
    shutdown: watch::Sender<bool>,
    state: Arc<RwLock<LoopState>>,
    stats: Arc<RwLock<LoopStats>>,
    handle: Mutex<Option<JoinHandle<()>>>,
}

impl DetectionLoop {
    /// Spawn the loop on the current tokio runtime
    pub fn spawn(
        classifier: Arc<dyn Classifier>,
        frames: watch::Receiver<Option<Arc<Frame>>>,
        sink: Arc<dyn DetectionSink>,
    ) -> Self {
        let (_, halt) = watch::channel(false);
        Self::spawn_with_halt(classifier, frames, sink, halt)
    }

    /// Spawn the loop, also ending it for good once `halt` turns true.
    ///
    /// The owner of `halt` uses it for terminal conditions such as a lost
    /// camera. A dropped `halt` sender never ends the loop.
    pub fn spawn_with_halt(
        classifier: Arc<dyn Classifier>,
        frames: watch::Receiver<Option<Arc<Frame>>>,
        sink: Arc<dyn DetectionSink>,
        halt: watch::Receiver<bool>,
    ) -> Self {
        let (shutdown, shutdown_rx) = watch::channel(false);
        let state = Arc::new(RwLock::new(LoopState::Idle));
        let stats = Arc::new(RwLock::new(LoopStats::default()));

        let worker = LoopWorker {
            classifier,
            frames,
            sink,
            shutdown: shutdown_rx,
            halt,
            state: state.clone(),
            stats: stats.clone(),
        };
        let handle = tokio::spawn(worker.run());

        Self {
            shutdown,
            state,
            stats,
            handle: Mutex::new(Some(handle)),
        }
    }

    pub fn state(&self) -> LoopState {
        *self.state.read()
    }

    pub fn stats(&self) -> LoopStats {
        *self.stats.read()
    }

    pub fn is_running(&self) -> bool {
        matches!(self.state(), LoopState::Idle | LoopState::Running)
    }

    /// Stop the loop, cancelling an in-flight classifier request
    pub async fn stop(&self) {
        let _ = self.shutdown.send(true);

        let handle = self.handle.lock().take();
        if let Some(mut handle) = handle {
            if tokio::time::timeout(Duration::from_secs(1), &mut handle).await.is_err() {
                warn!("Detection loop did not stop in time, aborting");
                handle.abort();
            }
        }

        let mut state = self.state.write();
        if *state != LoopState::Failed {
            *state = LoopState::Stopped;
        }
    }
}

impl Drop for DetectionLoop {
    fn drop(&mut self) {
        let _ = self.shutdown.send(true);
        if let Some(handle) = self.handle.lock().take() {
            handle.abort();
        }
    }
}

struct LoopWorker {
    classifier: Arc<dyn Classifier>,
    frames: watch::Receiver<Option<Arc<Frame>>>,
    sink: Arc<dyn DetectionSink>,
    shutdown: watch::Receiver<bool>,
    halt: watch::Receiver<bool>,
    state: Arc<RwLock<LoopState>>,
    stats: Arc<RwLock<LoopStats>>,
}

/// Resolves once `halt` is raised; pending forever if its sender is gone
async fn halted(halt: &mut watch::Receiver<bool>) {
    let closed = halt.wait_for(|raised| *raised).await.is_err();
    if closed {
        std::future::pending::<()>().await;
    }
}

impl LoopWorker {
    async fn run(mut self) {
        let ready = tokio::select! {
            biased;
            _ = self.shutdown.changed() => {
                *self.state.write() = LoopState::Stopped;
                return;
            }
            _ = halted(&mut self.halt) => {
                warn!("Session halted before the classifier was ready");
                *self.state.write() = LoopState::Stopped;
                return;
            }
            ready = self.classifier.ready() => ready,
        };

        if let Err(e) = ready {
            error!("Classifier failed to load: {}", e);
            *self.state.write() = LoopState::Failed;
            self.sink.on_load_failed(&e);
            return;
        }

        info!("Model loaded, starting detection loop");
        *self.state.write() = LoopState::Running;
        self.sink.on_ready();

        let mut cycle = 0u64;
        loop {
            let latest = self.frames.borrow_and_update().clone();
            let Some(frame) = latest else {
                debug!("No camera frame yet, waiting");
                tokio::select! {
                    biased;
                    _ = self.shutdown.changed() => break,
                    _ = halted(&mut self.halt) => break,
                    changed = self.frames.changed() => {
                        if changed.is_err() {
                            warn!("Frame feed closed, stopping detection loop");
                            break;
                        }
                    }
                }
                continue;
            };

            let result = tokio::select! {
                biased;
                _ = self.shutdown.changed() => break,
                _ = halted(&mut self.halt) => break,
                result = self.classifier.detect(&frame) => result,
            };

            cycle += 1;
            match result {
                Ok(detections) => {
                    self.stats.write().cycles += 1;
                    self.sink.on_detections(cycle, detections);
                }
                Err(e) => {
                    {
                        let mut stats = self.stats.write();
                        stats.cycles += 1;
                        stats.failures += 1;
                    }
                    error!("Detection cycle {} failed: {}", cycle, e);
                    self.sink.on_failure(cycle, &e);
                }
            }

            tokio::task::yield_now().await;
        }

        *self.state.write() = LoopState::Stopped;
        info!("Detection loop stopped after {} cycles", cycle);
    }
}
