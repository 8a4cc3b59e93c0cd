//! Integration tests for dwell-eye: the user-visible scenarios

use dwell_eye::camera::Frame;
use dwell_eye::capture::{CaptureManager, DragController, Draggable, Point, PointerEvent};
use dwell_eye::config::VisionConfig;
use dwell_eye::models::{BoundingBox, Detection};
use dwell_eye::overlay::{DisplayList, DrawCommand};
use dwell_eye::processing::ManualClock;
use dwell_eye::Session;
use std::sync::Arc;
use std::time::Duration;

fn create_detection(label: &str, confidence: f32, bbox: (f32, f32, f32, f32)) -> Detection {
    Detection::new(label, confidence, BoundingBox::new(bbox.0, bbox.1, bbox.2, bbox.3))
}

fn session_with_frame() -> (Arc<ManualClock>, Session<DisplayList>) {
    let clock = Arc::new(ManualClock::new());
    let session = Session::with_clock(VisionConfig::default(), DisplayList::default(), clock.clone()).unwrap();
    session.push_frame(Frame::new(640, 480));
    (clock, session)
}

#[test]
fn test_cup_sustained_for_65_seconds() {
    let (clock, session) = session_with_frame();
    let cup = create_detection("cup", 0.95, (10.0, 10.0, 50.0, 50.0));

    session.apply_detections(vec![cup.clone()]);
    for _ in 0..65 {
        clock.advance(Duration::from_secs(1));
        session.apply_detections(vec![cup.clone()]);
    }

    let commands = session.with_surface(|s| s.commands().to_vec());
    assert_eq!(commands.len(), 3);
    assert_eq!(
        commands[2],
        DrawCommand::FillText {
            text: "1:05".to_string(),
            x: 35.0,
            y: 10.0,
            color: "#FF69B4".to_string(),
            font: "14px Arial".to_string(),
        }
    );
}

#[test]
fn test_bottle_captured_at_origin() {
    let (_clock, session) = session_with_frame();
    session.apply_detections(vec![create_detection("bottle", 0.3, (0.0, 0.0, 30.0, 80.0))]);

    let ids = session.capture_button();
    assert_eq!(ids.len(), 1);
    session.with_board(|board| {
        assert_eq!(board.len(), 1);
        let bottle = board.get(ids[0]).unwrap();
        assert_eq!(bottle.position(), Point::new(0.0, 0.0));
        assert_eq!(bottle.image().dimensions(), (30, 80));
        assert_eq!(bottle.caption(), "bottle");
        assert!(bottle.is_draggable());
    });
}

#[test]
fn test_low_confidence_not_captured() {
    let (_clock, session) = session_with_frame();
    session.apply_detections(vec![create_detection("cup", 0.15, (0.0, 0.0, 30.0, 30.0))]);

    assert!(session.capture_button().is_empty());
    assert!(session.with_board(|b| b.is_empty()));

    // Still shown on the overlay: 0.15 clears the display threshold
    assert_eq!(session.with_surface(|s| s.rect_count()), 1);
}

#[test]
fn test_drag_from_press_offset() {
    let frame = Frame::new(640, 480);
    let manager = CaptureManager::default();
    let mut object = manager
        .capture(&create_detection("cup", 0.9, (100.0, 100.0, 40.0, 40.0)), &frame)
        .unwrap()
        .unwrap();

    DragController::dispatch(&mut object, PointerEvent::Press(Point::new(105.0, 105.0)));
    DragController::dispatch(&mut object, PointerEvent::Move(Point::new(200.0, 150.0)));
    DragController::dispatch(&mut object, PointerEvent::Release);

    assert_eq!(object.position(), Point::new(195.0, 145.0));
    assert!(!object.drag_controller().unwrap().is_dragging());
}

#[test]
fn test_captured_png_decodes() {
    let (_clock, session) = session_with_frame();
    session.apply_detections(vec![create_detection("bottle", 0.8, (5.0, 5.0, 12.0, 7.0))]);
    let id = session.capture_button()[0];

    let png = session.with_board(|b| b.get(id).unwrap().encode_png().unwrap());
    let decoded = image::load_from_memory(&png).unwrap();
    assert_eq!(decoded.to_rgb8().dimensions(), (12, 7));
}
