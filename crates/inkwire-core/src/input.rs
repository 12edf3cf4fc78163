//! Pointer event model and mouse/touch coordinate normalization.

use kurbo::Point;
use serde::{Deserialize, Serialize};

/// Raw pointer position from the windowing layer, before normalization
/// to canvas-local coordinates.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum PointerInput {
    /// Mouse position in screen coordinates.
    Mouse { position: Point },
    /// Active touch contacts in screen coordinates. The first contact
    /// drives the stroke; the rest are ignored.
    Touch { contacts: Vec<Point> },
}

/// Pointer event type for unified mouse/touch handling, carrying
/// canvas-local positions.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum PointerEvent {
    Down { position: Point },
    Move { position: Point },
    Up,
}

/// The canvas's placement on screen, used to translate absolute pointer
/// positions into canvas-pixel coordinates.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CanvasBounds {
    /// Top-left corner of the canvas in screen coordinates.
    pub origin: Point,
    pub width: f64,
    pub height: f64,
}

impl CanvasBounds {
    pub fn new(origin: Point, width: f64, height: f64) -> Self {
        Self { origin, width, height }
    }

    /// Normalize a raw pointer position to canvas-local coordinates by
    /// subtracting the canvas origin. Touch input uses the first active
    /// contact; returns `None` when there is none.
    pub fn normalize(&self, input: &PointerInput) -> Option<Point> {
        let absolute = match input {
            PointerInput::Mouse { position } => *position,
            PointerInput::Touch { contacts } => *contacts.first()?,
        };
        Some(Point::new(
            absolute.x - self.origin.x,
            absolute.y - self.origin.y,
        ))
    }
}
