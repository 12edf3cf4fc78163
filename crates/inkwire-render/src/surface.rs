//! CPU raster surface backed by a tiny-skia pixmap.

use inkwire_core::stroke::StrokeColor;
use kurbo::Point;
use thiserror::Error;
use tiny_skia::{Color, LineCap, LineJoin, Paint, PathBuilder, Pixmap, Transform};

/// Renderer errors.
#[derive(Debug, Error)]
pub enum RendererError {
    #[error("surface creation failed: {0}")]
    SurfaceCreation(String),
}

/// Result type for renderer operations.
pub type RenderResult<T> = Result<T, RendererError>;

fn to_skia(color: StrokeColor) -> Color {
    Color::from_rgba8(color.r, color.g, color.b, color.a)
}

/// A fixed-size 2D raster surface. Polylines are stroked with round caps
/// and joins; everything else (background fill, pixel access) is plain
/// pixmap manipulation. Rasterization is deterministic: the same
/// sequence of paint calls always yields the same bytes.
pub struct RasterSurface {
    pixmap: Pixmap,
    background: Color,
}

impl RasterSurface {
    /// Create a surface of `width` × `height` pixels, pre-filled with the
    /// background color. Zero-sized surfaces are an error, not a panic.
    pub fn new(width: u32, height: u32, background: StrokeColor) -> RenderResult<Self> {
        let mut pixmap = Pixmap::new(width, height).ok_or_else(|| {
            RendererError::SurfaceCreation(format!("invalid dimensions {width}x{height}"))
        })?;
        let background = to_skia(background);
        pixmap.fill(background);
        Ok(Self { pixmap, background })
    }

    /// Fill the whole surface with the background color.
    pub fn clear(&mut self) {
        self.pixmap.fill(self.background);
    }

    /// Stroke a connected polyline through `points` with the given color
    /// and width. Fewer than two points paints nothing.
    pub fn stroke_polyline(&mut self, points: &[Point], color: StrokeColor, width: f64) {
        if points.len() < 2 {
            return;
        }

        let mut builder = PathBuilder::new();
        builder.move_to(points[0].x as f32, points[0].y as f32);
        for point in &points[1..] {
            builder.line_to(point.x as f32, point.y as f32);
        }
        let Some(path) = builder.finish() else {
            // Degenerate geometry (e.g. non-finite coordinates)
            return;
        };

        let mut paint = Paint::default();
        paint.set_color(to_skia(color));
        paint.anti_alias = true;

        let stroke = tiny_skia::Stroke {
            width: width as f32,
            line_cap: LineCap::Round,
            line_join: LineJoin::Round,
            ..tiny_skia::Stroke::default()
        };

        self.pixmap
            .stroke_path(&path, &paint, &stroke, Transform::identity(), None);
    }

    /// Stroke a single segment (incremental feedback paint).
    pub fn stroke_segment(&mut self, from: Point, to: Point, color: StrokeColor, width: f64) {
        self.stroke_polyline(&[from, to], color, width);
    }

    pub fn width(&self) -> u32 {
        self.pixmap.width()
    }

    pub fn height(&self) -> u32 {
        self.pixmap.height()
    }

    /// Raw premultiplied RGBA8 pixel data.
    pub fn data(&self) -> &[u8] {
        self.pixmap.data()
    }

    /// Demultiplied RGBA at a pixel, if in bounds.
    pub fn pixel(&self, x: u32, y: u32) -> Option<(u8, u8, u8, u8)> {
        let p = self.pixmap.pixel(x, y)?.demultiply();
        Some((p.red(), p.green(), p.blue(), p.alpha()))
    }
}
