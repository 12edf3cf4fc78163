//! The render pipeline: full deterministic reconstruction from the log.
//!
//! On every log change the pipeline clears the surface to the background
//! and repaints every stroke in log order. No incremental diffing: the
//! dataset (hand-drawn strokes in one session) is bounded in practice,
//! and full reconstruction keeps the bitmap a pure function of the
//! snapshot.

use crate::surface::{RasterSurface, RenderResult};
use inkwire_core::capture::Segment;
use inkwire_core::stroke::{Stroke, StrokeColor};

pub struct RenderPipeline {
    surface: RasterSurface,
}

impl RenderPipeline {
    pub fn new(width: u32, height: u32, background: StrokeColor) -> RenderResult<Self> {
        Ok(Self {
            surface: RasterSurface::new(width, height, background)?,
        })
    }

    /// Repaint the whole canvas from a log snapshot, in log order.
    ///
    /// Strokes with fewer than two points should never reach the log,
    /// but the pipeline does not trust the producer and skips them.
    pub fn repaint(&mut self, strokes: &[Stroke]) {
        self.surface.clear();
        for stroke in strokes {
            if stroke.points.len() < 2 {
                log::debug!("skipping degenerate stroke in log snapshot");
                continue;
            }
            self.surface
                .stroke_polyline(&stroke.points, stroke.color, stroke.size);
        }
    }

    /// Paint the incremental feedback segment for an in-flight stroke.
    /// Local-only; the next full repaint supersedes it.
    pub fn paint_segment(&mut self, segment: &Segment) {
        self.surface
            .stroke_segment(segment.from, segment.to, segment.color, segment.width);
    }

    pub fn surface(&self) -> &RasterSurface {
        &self.surface
    }
}
