//! The local input-capture state machine.
//!
//! Owns the in-progress stroke buffer and cycles `Idle` → `Capturing` →
//! commit → `Idle`, guarded by the session's exclusion guard. The buffer
//! is never visible to other peers until `end` commits it to the shared
//! log, and a buffer that never reaches two points is discarded as a
//! click rather than a stroke.

use crate::guard::SessionGuard;
use crate::log::StrokeLog;
use crate::stroke::{Brush, Stroke, StrokeColor};
use kurbo::Point;

/// Capture states. The machine cycles forever; there is no terminal state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum CaptureState {
    #[default]
    Idle,
    Capturing,
}

/// The incremental segment painted for immediate local feedback while a
/// stroke is in flight. Superseded by the next full repaint.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Segment {
    pub from: Point,
    pub to: Point,
    pub color: StrokeColor,
    pub width: f64,
}

/// The local drawing session for one peer.
pub struct CaptureSession {
    state: CaptureState,
    /// At most one in-progress stroke, exclusively owned here.
    buffer: Option<Stroke>,
    brush: Brush,
    guard: SessionGuard,
}

impl CaptureSession {
    pub fn new(brush: Brush) -> Self {
        Self {
            state: CaptureState::Idle,
            buffer: None,
            brush,
            guard: SessionGuard::new(),
        }
    }

    /// Start capturing a stroke at `point` (pointer-down).
    ///
    /// Valid only in `Idle` with the guard unheld; otherwise a silent
    /// no-op. Snapshots the current brush into the buffer so later brush
    /// changes never retroactively alter this stroke. Returns whether the
    /// capture actually started.
    pub fn begin(&mut self, point: Point) -> bool {
        if self.state == CaptureState::Capturing {
            return false;
        }
        if !self.guard.try_acquire() {
            return false;
        }

        let mut stroke = Stroke::new(self.brush.color, self.brush.size());
        stroke.add_point(point);
        self.buffer = Some(stroke);
        self.state = CaptureState::Capturing;
        true
    }

    /// Append a point to the in-progress stroke (pointer-move while down).
    ///
    /// Returns the segment between the previous point and `point` for the
    /// caller to paint immediately. No-op (`None`) in `Idle`.
    pub fn extend(&mut self, point: Point) -> Option<Segment> {
        if self.state != CaptureState::Capturing {
            return None;
        }
        let buffer = self.buffer.as_mut()?;
        let from = *buffer.points.last()?;
        buffer.add_point(point);
        Some(Segment {
            from,
            to: point,
            color: buffer.color,
            width: buffer.size,
        })
    }

    /// Finish the capture (pointer-up or pointer-leave).
    ///
    /// Commits the buffer to the shared log iff it holds at least two
    /// points; a single-point buffer is a click and is silently dropped.
    /// Always discards the buffer, releases the guard, and returns to
    /// `Idle`. Returns whether a stroke was committed.
    pub fn end(&mut self, log: &mut dyn StrokeLog) -> bool {
        if self.state != CaptureState::Capturing {
            return false;
        }

        let committed = match self.buffer.take() {
            Some(stroke) if stroke.is_drawable() => {
                log.append(stroke);
                true
            }
            _ => false,
        };

        self.guard.release();
        self.state = CaptureState::Idle;
        committed
    }

    /// Empty the shared log's full range.
    ///
    /// Rejected as a no-op while a capture is in flight or while the
    /// guard is held, so an in-progress stroke is never truncated. This
    /// is enforced by the state machine, not by event timing. Returns
    /// whether the clear ran.
    pub fn clear(&mut self, log: &mut dyn StrokeLog) -> bool {
        if self.state == CaptureState::Capturing {
            log::debug!("clear rejected: capture in flight");
            return false;
        }
        if !self.guard.try_acquire() {
            return false;
        }
        log.clear();
        self.guard.release();
        true
    }

    /// Discard an incomplete capture without committing (session
    /// teardown mid-stroke). Nothing is ever partially committed.
    pub fn abort(&mut self) {
        self.buffer = None;
        self.guard.release();
        self.state = CaptureState::Idle;
    }

    pub fn state(&self) -> CaptureState {
        self.state
    }

    pub fn is_capturing(&self) -> bool {
        self.state == CaptureState::Capturing
    }

    /// Whether the session is busy (guard held) — for the UI, e.g.
    /// disabling the clear action while drawing.
    pub fn is_busy(&self) -> bool {
        self.guard.is_held()
    }

    /// The in-progress stroke, if any. Local-only; peers never see it.
    pub fn in_progress(&self) -> Option<&Stroke> {
        self.buffer.as_ref()
    }

    pub fn brush(&self) -> &Brush {
        &self.brush
    }

    /// Change the brush color for future strokes.
    pub fn set_brush_color(&mut self, color: StrokeColor) {
        self.brush.set_color(color);
    }

    /// Change the brush width for future strokes (clamped to the UI range).
    pub fn set_brush_size(&mut self, size: f64) {
        self.brush.set_size(size);
    }
}

impl Default for CaptureSession {
    fn default() -> Self {
        Self::new(Brush::default())
    }
}
