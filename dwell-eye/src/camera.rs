//! Camera frames: the shared frame feed and a synthetic camera source

use crate::config::VisionConfig;
use crate::error::VisionError;
use image::{Rgb, RgbImage};
use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tokio::sync::{mpsc, watch};
use tracing::{debug, error, info, warn};

/// One camera frame
pub type Frame = RgbImage;

/// Pixel dimensions of the camera frames
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct FrameGeometry {
    pub width: u32,
    pub height: u32,
}

impl FrameGeometry {
    pub fn of(frame: &Frame) -> Self {
        Self {
            width: frame.width(),
            height: frame.height(),
        }
    }
}

/// Latest-frame slot shared by the camera, the detection loop and capture.
///
/// Only the newest frame is kept. Readers that fall behind skip frames.
pub struct FrameFeed {
    sender: watch::Sender<Option<Arc<Frame>>>,
    geometry: RwLock<Option<FrameGeometry>>,
}

impl FrameFeed {
    pub fn new() -> Self {
        let (sender, _) = watch::channel(None);
        Self {
            sender,
            geometry: RwLock::new(None),
        }
    }

    /// Publish a frame. Returns the geometry when it is seen for the first
    /// time or differs from the previous frame's.
    pub fn publish(&self, frame: Frame) -> Option<FrameGeometry> {
        let geometry = self.record_geometry(&frame);
        self.send(frame);
        geometry
    }

    /// Note the geometry of a frame about to be sent. Returns it when it is
    /// new, without making the frame visible to subscribers.
    pub fn record_geometry(&self, frame: &Frame) -> Option<FrameGeometry> {
        let geometry = FrameGeometry::of(frame);
        let mut known = self.geometry.write();
        if *known == Some(geometry) {
            return None;
        }
        *known = Some(geometry);
        debug!("Frame geometry now {}x{}", geometry.width, geometry.height);
        Some(geometry)
    }

    /// Make `frame` the latest one
    pub fn send(&self, frame: Frame) {
        self.sender.send_replace(Some(Arc::new(frame)));
    }

    /// Most recent frame, if any has arrived
    pub fn latest(&self) -> Option<Arc<Frame>> {
        self.sender.borrow().clone()
    }

    pub fn geometry(&self) -> Option<FrameGeometry> {
        *self.geometry.read()
    }

    /// Watch for new frames
    pub fn subscribe(&self) -> watch::Receiver<Option<Arc<Frame>>> {
        self.sender.subscribe()
    }
}

impl Default for FrameFeed {
    fn default() -> Self {
        Self::new()
    }
}

/// Camera that renders a moving test pattern at the configured rate
pub struct SyntheticCamera {
    config: Arc<VisionConfig>,
    is_running: Arc<RwLock<bool>>,
    fail_after: Option<u64>,
}

impl SyntheticCamera {
    pub fn new(config: Arc<VisionConfig>) -> Self {
        Self {
            config,
            is_running: Arc::new(RwLock::new(false)),
            fail_after: None,
        }
    }

    /// Simulate the device disappearing after `frames` frames
    pub fn with_failure_after(mut self, frames: u64) -> Self {
        self.fail_after = Some(frames);
        self
    }

    /// Render test pattern frame number `index`
    pub fn render_frame(&self, index: u64) -> Frame {
        let (width, height) = self.config.resolution;
        let shift = (index % 256) as u32;
        RgbImage::from_fn(width, height, |x, y| {
            Rgb([
                ((x + shift) % 256) as u8,
                ((y + shift) % 256) as u8,
                ((x ^ y) % 256) as u8,
            ])
        })
    }

    /// Start frame capture stream.
    ///
    /// A camera failure is delivered as the final item of the stream.
    pub fn start_stream(&self) -> Result<mpsc::Receiver<Result<Frame, VisionError>>, VisionError> {
        {
            let mut is_running = self.is_running.write();
            if *is_running {
                return Err(VisionError::Camera("Camera stream already running".to_string()));
            }
            *is_running = true;
        }

        const FRAME_BUFFER_SIZE: usize = 30;
        let (tx, rx) = mpsc::channel(FRAME_BUFFER_SIZE);
        let camera = SyntheticCamera {
            config: self.config.clone(),
            is_running: self.is_running.clone(),
            fail_after: self.fail_after,
        };

        tokio::spawn(async move {
            let frame_rate = camera.config.frame_rate.max(1);
            let mut interval =
                tokio::time::interval(std::time::Duration::from_secs_f64(1.0 / frame_rate as f64));
            let mut index = 0u64;

            loop {
                interval.tick().await;
                if !*camera.is_running.read() {
                    break;
                }

                if camera.fail_after.is_some_and(|limit| index >= limit) {
                    error!("Camera {} stopped delivering frames", camera.config.camera_id);
                    let _ = tx
                        .send(Err(VisionError::Camera(format!(
                            "Camera {} disconnected",
                            camera.config.camera_id
                        ))))
                        .await;
                    break;
                }

                if tx.send(Ok(camera.render_frame(index))).await.is_err() {
                    warn!("Frame receiver dropped, stopping camera stream");
                    break;
                }
                index += 1;
            }

            *camera.is_running.write() = false;
            info!("Camera stream stopped");
        });

        info!(
            "Synthetic camera {} streaming {}x{} @ {}fps",
            self.config.camera_id, self.config.resolution.0, self.config.resolution.1, self.config.frame_rate
        );
        Ok(rx)
    }

    /// Stop camera stream
    pub fn stop(&self) {
        *self.is_running.write() = false;
    }

    pub fn is_running(&self) -> bool {
        *self.is_running.read()
    }
}

impl Drop for SyntheticCamera {
    fn drop(&mut self) {
        self.stop();
    }
}
