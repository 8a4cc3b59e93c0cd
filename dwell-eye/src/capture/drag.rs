//! Press-drag-release behaviour for captured elements

use serde::{Deserialize, Serialize};
use std::ops::{Add, Sub};

/// Position in surface pixels
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Point {
    pub x: f32,
    pub y: f32,
}

impl Point {
    pub fn new(x: f32, y: f32) -> Self {
        Self { x, y }
    }
}

impl Add for Point {
    type Output = Point;

    fn add(self, other: Point) -> Point {
        Point::new(self.x + other.x, self.y + other.y)
    }
}

impl Sub for Point {
    type Output = Point;

    fn sub(self, other: Point) -> Point {
        Point::new(self.x - other.x, self.y - other.y)
    }
}

/// Pointer input routed to a draggable element
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum PointerEvent {
    Press(Point),
    Move(Point),
    Release,
    /// The platform is about to start its own drag-image gesture
    NativeDragStart,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum DragState {
    Idle,
    /// Pointer held down; `offset` is the pointer position relative to
    /// the element's top-left corner at press time
    Dragging { offset: Point },
}

/// What the controller did with an event
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum DragResponse {
    Ignored,
    Started,
    Moved(Point),
    Released,
    /// The native drag gesture must be cancelled by the host
    SuppressNativeDrag,
}

/// Anything the drag controller can move around
pub trait Draggable {
    /// Top-left corner
    fn position(&self) -> Point;

    fn set_position(&mut self, position: Point);

    /// Storage for the attached controller
    fn drag_slot(&mut self) -> &mut Option<DragController>;
}

#[derive(Debug, Clone)]
pub struct DragController {
    state: DragState,
}

impl DragController {
    fn new() -> Self {
        Self { state: DragState::Idle }
    }

    /// Make `element` respond to pointer drags
    pub fn attach<E: Draggable + ?Sized>(element: &mut E) {
        *element.drag_slot() = Some(DragController::new());
    }

    /// Route `event` to the controller attached to `element`
    pub fn dispatch<E: Draggable + ?Sized>(element: &mut E, event: PointerEvent) -> DragResponse {
        let Some(mut controller) = element.drag_slot().take() else {
            return DragResponse::Ignored;
        };
        let response = controller.handle(element, event);
        *element.drag_slot() = Some(controller);
        response
    }

    pub fn state(&self) -> DragState {
        self.state
    }

    pub fn is_dragging(&self) -> bool {
        matches!(self.state, DragState::Dragging { .. })
    }

    fn handle<E: Draggable + ?Sized>(&mut self, element: &mut E, event: PointerEvent) -> DragResponse {
        match (self.state, event) {
            (_, PointerEvent::Press(pointer)) => {
                self.state = DragState::Dragging {
                    offset: pointer - element.position(),
                };
                DragResponse::Started
            }
            (DragState::Dragging { offset }, PointerEvent::Move(pointer)) => {
                let position = pointer - offset;
                element.set_position(position);
                DragResponse::Moved(position)
            }
            (DragState::Dragging { .. }, PointerEvent::Release) => {
                self.state = DragState::Idle;
                DragResponse::Released
            }
            (_, PointerEvent::NativeDragStart) => DragResponse::SuppressNativeDrag,
            (DragState::Idle, PointerEvent::Move(_)) | (DragState::Idle, PointerEvent::Release) => {
                DragResponse::Ignored
            }
        }
    }
}
