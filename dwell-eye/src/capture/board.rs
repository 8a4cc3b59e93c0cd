//! The surface captured objects are placed on

use crate::capture::drag::{DragController, DragResponse, Point, PointerEvent};
use crate::capture::CapturedObject;
use tracing::debug;
use uuid::Uuid;

/// Ordered collection of captured objects; later entries sit on top.
///
/// A press picks the topmost object under the pointer. Moves and the
/// release go to that object wherever the pointer is.
#[derive(Debug, Default)]
pub struct CaptureBoard {
    objects: Vec<CapturedObject>,
    active: Option<Uuid>,
}

impl CaptureBoard {
    pub fn new() -> Self {
        Self::default()
    }

    /// Place a captured object on top of the board
    pub fn insert(&mut self, object: CapturedObject) -> Uuid {
        let id = object.id();
        self.objects.push(object);
        id
    }

    pub fn get(&self, id: Uuid) -> Option<&CapturedObject> {
        self.objects.iter().find(|o| o.id() == id)
    }

    pub fn get_mut(&mut self, id: Uuid) -> Option<&mut CapturedObject> {
        self.objects.iter_mut().find(|o| o.id() == id)
    }

    pub fn remove(&mut self, id: Uuid) -> Option<CapturedObject> {
        let index = self.objects.iter().position(|o| o.id() == id)?;
        if self.active == Some(id) {
            self.active = None;
        }
        Some(self.objects.remove(index))
    }

    pub fn clear(&mut self) {
        self.objects.clear();
        self.active = None;
    }

    pub fn len(&self) -> usize {
        self.objects.len()
    }

    pub fn is_empty(&self) -> bool {
        self.objects.is_empty()
    }

    /// Bottom to top
    pub fn iter(&self) -> impl Iterator<Item = &CapturedObject> {
        self.objects.iter()
    }

    /// Topmost object under `point`
    pub fn hit_test(&self, point: Point) -> Option<Uuid> {
        self.objects.iter().rev().find(|o| o.contains(point)).map(|o| o.id())
    }

    /// Object currently being dragged
    pub fn active(&self) -> Option<Uuid> {
        self.active
    }

    /// Route a pointer event from the host.
    ///
    /// Returns the object that handled it and the drag outcome.
    pub fn handle_pointer(&mut self, event: PointerEvent) -> Option<(Uuid, DragResponse)> {
        let target = match event {
            PointerEvent::Press(point) => {
                let id = self.hit_test(point)?;
                self.active = Some(id);
                id
            }
            PointerEvent::Move(_) | PointerEvent::Release | PointerEvent::NativeDragStart => self.active?,
        };

        let object = self.get_mut(target)?;
        let response = DragController::dispatch(object, event);
        if matches!(response, DragResponse::Released) {
            debug!("Released captured object {}", target);
            self.active = None;
        }
        Some((target, response))
    }

    /// Route a pointer event straight to one object, bypassing hit testing
    pub fn dispatch_to(&mut self, id: Uuid, event: PointerEvent) -> Option<DragResponse> {
        let response = DragController::dispatch(self.get_mut(id)?, event);
        match response {
            DragResponse::Started => self.active = Some(id),
            DragResponse::Released if self.active == Some(id) => self.active = None,
            _ => {}
        }
        Some(response)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::capture::drag::Draggable;
    use image::RgbImage;

    fn object_at(x: f32, y: f32, size: u32) -> CapturedObject {
        let mut object = CapturedObject::new("cup", 0.9, RgbImage::new(size, size), Point::new(x, y));
        DragController::attach(&mut object);
        object
    }

    #[test]
    fn test_drag_through_board() {
        let mut board = CaptureBoard::new();
        let id = board.insert(object_at(100.0, 100.0, 20));

        assert_eq!(
            board.handle_pointer(PointerEvent::Press(Point::new(105.0, 105.0))),
            Some((id, DragResponse::Started))
        );
        board.handle_pointer(PointerEvent::Move(Point::new(200.0, 150.0)));
        assert_eq!(board.get(id).unwrap().position(), Point::new(195.0, 145.0));

        assert_eq!(
            board.handle_pointer(PointerEvent::Release),
            Some((id, DragResponse::Released))
        );
        assert!(board.active().is_none());
        assert!(board.handle_pointer(PointerEvent::Move(Point::new(0.0, 0.0))).is_none());
    }

    #[test]
    fn test_press_picks_topmost() {
        let mut board = CaptureBoard::new();
        let below = board.insert(object_at(0.0, 0.0, 50));
        let above = board.insert(object_at(10.0, 10.0, 50));

        assert_eq!(board.hit_test(Point::new(20.0, 20.0)), Some(above));
        assert_eq!(board.hit_test(Point::new(5.0, 5.0)), Some(below));
        assert_eq!(board.hit_test(Point::new(500.0, 5.0)), None);
    }

    #[test]
    fn test_press_on_empty_space() {
        let mut board = CaptureBoard::new();
        board.insert(object_at(0.0, 0.0, 10));
        assert!(board.handle_pointer(PointerEvent::Press(Point::new(50.0, 50.0))).is_none());
        assert!(board.active().is_none());
    }

    #[test]
    fn test_moves_follow_active_object_outside_bounds() {
        let mut board = CaptureBoard::new();
        let id = board.insert(object_at(0.0, 0.0, 10));
        board.handle_pointer(PointerEvent::Press(Point::new(1.0, 1.0)));
        board.handle_pointer(PointerEvent::Move(Point::new(301.0, 401.0)));
        assert_eq!(board.get(id).unwrap().position(), Point::new(300.0, 400.0));
    }

    #[test]
    fn test_native_drag_suppressed_for_active() {
        let mut board = CaptureBoard::new();
        let id = board.insert(object_at(0.0, 0.0, 10));
        board.handle_pointer(PointerEvent::Press(Point::new(1.0, 1.0)));
        assert_eq!(
            board.handle_pointer(PointerEvent::NativeDragStart),
            Some((id, DragResponse::SuppressNativeDrag))
        );
    }

    #[test]
    fn test_dispatch_to() {
        let mut board = CaptureBoard::new();
        let id = board.insert(object_at(0.0, 0.0, 10));
        assert_eq!(
            board.dispatch_to(id, PointerEvent::Press(Point::new(900.0, 900.0))),
            Some(DragResponse::Started)
        );
        assert_eq!(board.active(), Some(id));
        assert_eq!(board.dispatch_to(Uuid::new_v4(), PointerEvent::Release), None);
    }

    #[test]
    fn test_remove_and_clear() {
        let mut board = CaptureBoard::new();
        let a = board.insert(object_at(0.0, 0.0, 10));
        let b = board.insert(object_at(20.0, 0.0, 10));
        board.handle_pointer(PointerEvent::Press(Point::new(1.0, 1.0)));

        assert_eq!(board.remove(a).unwrap().id(), a);
        assert!(board.active().is_none());
        assert!(board.remove(a).is_none());
        assert_eq!(board.len(), 1);
        assert_eq!(board.iter().next().unwrap().id(), b);

        board.clear();
        assert!(board.is_empty());
    }
}
