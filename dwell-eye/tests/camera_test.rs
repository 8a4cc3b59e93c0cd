//! Tests for SyntheticCamera and the session's camera pump

use dwell_eye::camera::{FrameGeometry, SyntheticCamera};
use dwell_eye::config::VisionConfig;
use dwell_eye::error::VisionError;
use dwell_eye::overlay::{DisplayList, OverlaySurface};
use dwell_eye::{Session, SessionEvent};
use std::sync::Arc;
use std::time::Duration;

fn small_config() -> Arc<VisionConfig> {
    let mut config = VisionConfig::default();
    config.resolution = (32, 24);
    config.frame_rate = 100;
    Arc::new(config)
}

#[tokio::test]
async fn test_stream_delivers_frames_at_resolution() {
    let camera = SyntheticCamera::new(small_config());
    let mut frames = camera.start_stream().unwrap();
    assert!(camera.is_running());

    let frame = tokio::time::timeout(Duration::from_secs(2), frames.recv())
        .await
        .unwrap()
        .unwrap()
        .unwrap();
    assert_eq!(frame.dimensions(), (32, 24));

    camera.stop();
}

#[tokio::test]
async fn test_second_start_rejected() {
    let camera = SyntheticCamera::new(small_config());
    let _frames = camera.start_stream().unwrap();
    assert!(matches!(camera.start_stream(), Err(VisionError::Camera(_))));
    camera.stop();
    assert!(!camera.is_running());
}

#[tokio::test]
async fn test_frames_change_over_time() {
    let camera = SyntheticCamera::new(small_config());
    assert_ne!(camera.render_frame(0), camera.render_frame(1));
    assert_eq!(camera.render_frame(3), camera.render_frame(3));
}

#[tokio::test]
async fn test_failing_camera_reported_through_session() {
    let config = small_config();
    let camera = SyntheticCamera::new(config.clone()).with_failure_after(2);
    let session = Arc::new(Session::new((*config).clone(), DisplayList::default()).unwrap());
    let mut events = session.subscribe_events();

    let pump = session.attach_camera(camera.start_stream().unwrap());
    let result = tokio::time::timeout(Duration::from_secs(5), pump)
        .await
        .unwrap()
        .unwrap();
    assert!(matches!(result, Err(VisionError::Camera(_))));

    assert_eq!(
        events.recv().await.unwrap(),
        SessionEvent::FrameGeometry(FrameGeometry { width: 32, height: 24 })
    );
    match events.recv().await.unwrap() {
        SessionEvent::CameraFailed { message } => assert!(message.contains("disconnected")),
        other => panic!("Expected camera failure, got {:?}", other),
    }
    assert_eq!(session.with_surface(|s| s.size()), (32, 24));
}
