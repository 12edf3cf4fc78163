//! Stroke and brush data model.

use kurbo::Point;
use serde::{Deserialize, Serialize};

/// Brush width bounds exposed to the UI.
pub const MIN_BRUSH_SIZE: f64 = 1.0;
pub const MAX_BRUSH_SIZE: f64 = 50.0;

/// Serializable color representation (RGBA8).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct StrokeColor {
    pub r: u8,
    pub g: u8,
    pub b: u8,
    pub a: u8,
}

impl StrokeColor {
    pub fn new(r: u8, g: u8, b: u8, a: u8) -> Self {
        Self { r, g, b, a }
    }

    pub fn black() -> Self {
        Self::new(0, 0, 0, 255)
    }

    pub fn white() -> Self {
        Self::new(255, 255, 255, 255)
    }

    /// Parse a `#rrggbb` or `#rrggbbaa` hex string.
    pub fn from_hex(hex: &str) -> Option<Self> {
        let digits = hex.strip_prefix('#')?;
        match digits.len() {
            6 => {
                let r = u8::from_str_radix(&digits[0..2], 16).ok()?;
                let g = u8::from_str_radix(&digits[2..4], 16).ok()?;
                let b = u8::from_str_radix(&digits[4..6], 16).ok()?;
                Some(Self::new(r, g, b, 255))
            }
            8 => {
                let r = u8::from_str_radix(&digits[0..2], 16).ok()?;
                let g = u8::from_str_radix(&digits[2..4], 16).ok()?;
                let b = u8::from_str_radix(&digits[4..6], 16).ok()?;
                let a = u8::from_str_radix(&digits[6..8], 16).ok()?;
                Some(Self::new(r, g, b, a))
            }
            _ => None,
        }
    }

    /// Format as `#rrggbb` (alpha omitted when opaque).
    pub fn to_hex(&self) -> String {
        if self.a == 255 {
            format!("#{:02x}{:02x}{:02x}", self.r, self.g, self.b)
        } else {
            format!("#{:02x}{:02x}{:02x}{:02x}", self.r, self.g, self.b, self.a)
        }
    }
}

impl Default for StrokeColor {
    fn default() -> Self {
        Self::black()
    }
}

/// One completed freehand line: an ordered point sequence plus its
/// color and width. Points are appended while capturing and immutable
/// once the stroke is committed to the shared log.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Stroke {
    /// Points in canvas-pixel coordinates.
    pub points: Vec<Point>,
    /// Stroke color, snapshotted from the brush at capture start.
    pub color: StrokeColor,
    /// Stroke width in pixels.
    pub size: f64,
}

impl Stroke {
    /// Create an empty stroke with the given style.
    pub fn new(color: StrokeColor, size: f64) -> Self {
        Self {
            points: Vec::new(),
            color,
            size,
        }
    }

    /// Create from existing points.
    pub fn from_points(points: Vec<Point>, color: StrokeColor, size: f64) -> Self {
        Self { points, color, size }
    }

    /// Append a point to the path.
    pub fn add_point(&mut self, point: Point) {
        self.points.push(point);
    }

    /// Get the number of points.
    pub fn len(&self) -> usize {
        self.points.len()
    }

    /// Check if the path is empty.
    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    /// A stroke needs at least two points to be a visible line.
    /// Single-point strokes are clicks and are never committed.
    pub fn is_drawable(&self) -> bool {
        self.points.len() >= 2
    }
}

/// Current brush settings. Changes apply to future strokes only; the
/// capture session snapshots the brush when a stroke begins.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Brush {
    pub color: StrokeColor,
    size: f64,
}

impl Brush {
    pub fn new(color: StrokeColor, size: f64) -> Self {
        Self {
            color,
            size: size.clamp(MIN_BRUSH_SIZE, MAX_BRUSH_SIZE),
        }
    }

    pub fn size(&self) -> f64 {
        self.size
    }

    /// Set the brush width, clamped to the UI range.
    pub fn set_size(&mut self, size: f64) {
        self.size = size.clamp(MIN_BRUSH_SIZE, MAX_BRUSH_SIZE);
    }

    pub fn set_color(&mut self, color: StrokeColor) {
        self.color = color;
    }
}

impl Default for Brush {
    fn default() -> Self {
        Self {
            color: StrokeColor::black(),
            size: 5.0,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_hex_roundtrip() {
        let red = StrokeColor::from_hex("#ff0000").unwrap();
        assert_eq!(red, StrokeColor::new(255, 0, 0, 255));
        assert_eq!(red.to_hex(), "#ff0000");
    }

    #[test]
    fn test_hex_with_alpha() {
        let c = StrokeColor::from_hex("#00ff0080").unwrap();
        assert_eq!(c, StrokeColor::new(0, 255, 0, 128));
        assert_eq!(c.to_hex(), "#00ff0080");
    }

    #[test]
    fn test_hex_rejects_malformed() {
        assert!(StrokeColor::from_hex("ff0000").is_none());
        assert!(StrokeColor::from_hex("#ff00").is_none());
        assert!(StrokeColor::from_hex("#gg0000").is_none());
    }

    #[test]
    fn test_stroke_drawable() {
        let mut stroke = Stroke::new(StrokeColor::black(), 5.0);
        assert!(!stroke.is_drawable());

        stroke.add_point(Point::new(0.0, 0.0));
        assert!(!stroke.is_drawable());

        stroke.add_point(Point::new(10.0, 10.0));
        assert!(stroke.is_drawable());
        assert_eq!(stroke.len(), 2);
    }

    #[test]
    fn test_brush_clamps_size() {
        let mut brush = Brush::default();
        assert!((brush.size() - 5.0).abs() < f64::EPSILON);

        brush.set_size(0.0);
        assert!((brush.size() - MIN_BRUSH_SIZE).abs() < f64::EPSILON);

        brush.set_size(200.0);
        assert!((brush.size() - MAX_BRUSH_SIZE).abs() < f64::EPSILON);
    }
}
