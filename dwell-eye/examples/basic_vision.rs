//! Basic example of using dwell-eye
//!
//! Streams a synthetic camera into a session, runs a scripted classifier
//! for a couple of seconds, captures whatever is in view and prints the
//! overlay that was drawn.

use dwell_eye::camera::SyntheticCamera;
use dwell_eye::models::{BoundingBox, Detection, ScriptedClassifier};
use dwell_eye::overlay::DisplayList;
use dwell_eye::{Session, SessionEvent, VisionConfig};
use std::sync::Arc;
use std::time::Duration;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Initialize tracing (optional)
    // tracing_subscriber::fmt::init();

    let config = VisionConfig {
        frame_rate: 15,
        resolution: (320, 240),
        ..VisionConfig::default()
    };

    let camera = SyntheticCamera::new(Arc::new(config.clone()));
    let session = Arc::new(Session::new(config, DisplayList::default())?);
    let mut events = session.subscribe_events();

    let _pump = session.attach_camera(camera.start_stream()?);

    let classifier = ScriptedClassifier::constant(vec![
        Detection::new("cup", 0.92, BoundingBox::new(40.0, 60.0, 80.0, 90.0)),
        Detection::new("plant", 0.18, BoundingBox::new(200.0, 20.0, 60.0, 120.0)),
    ])
    .with_latency(Duration::from_millis(100));
    let detection_loop = session.start_detection(Arc::new(classifier));

    let deadline = tokio::time::sleep(Duration::from_secs(2));
    tokio::pin!(deadline);
    loop {
        tokio::select! {
            _ = &mut deadline => break,
            event = events.recv() => {
                if let Ok(SessionEvent::ModelReady) = event {
                    println!("Model ready");
                }
            }
        }
    }

    let captured = session.capture_button();
    println!("Captured {} object(s)", captured.len());

    detection_loop.stop().await;
    camera.stop();

    let overlay = session.with_surface(|s| serde_json::to_string_pretty(s))?;
    println!("{}", overlay);
    Ok(())
}
