//! The whiteboard facade: capture, collaboration, and rendering wired
//! together for one peer.
//!
//! Event flow: pointer events feed the capture state machine, committed
//! strokes land in the room's shared log, and any log change (local or
//! remote) marks the board dirty. `pump` repaints from a fresh snapshot
//! when dirty, so the canvas is always reconstructed from the log rather
//! than patched incrementally.

use std::cell::Cell;
use std::rc::Rc;

use inkwire_core::capture::CaptureSession;
use inkwire_core::collaboration::RoomSession;
use inkwire_core::config::BoardConfig;
use inkwire_core::input::{CanvasBounds, PointerEvent};
use inkwire_core::log::StrokeLog;
use inkwire_core::stroke::{Brush, StrokeColor};
use inkwire_core::sync::SyncEvent;
use kurbo::Point;

use crate::pipeline::RenderPipeline;
use crate::surface::{RasterSurface, RenderResult};

pub struct Whiteboard {
    config: BoardConfig,
    session: CaptureSession,
    room: RoomSession,
    pipeline: RenderPipeline,
    /// Set by the log subscription on any mutation; cleared by `pump`.
    dirty: Rc<Cell<bool>>,
}

impl Whiteboard {
    pub fn new(config: BoardConfig) -> RenderResult<Self> {
        let pipeline = RenderPipeline::new(config.width, config.height, config.background)?;
        let session = CaptureSession::new(config.brush);
        let mut room = RoomSession::new(config.room.clone());

        // Starts dirty so the first pump paints the (empty) background
        let dirty = Rc::new(Cell::new(true));
        let flag = dirty.clone();
        room.log_mut().subscribe(Box::new(move || flag.set(true)));

        Ok(Self {
            config,
            session,
            room,
            pipeline,
            dirty,
        })
    }

    /// Pointer-down at a canvas-local position: start capturing.
    pub fn pointer_down(&mut self, position: Point) {
        self.session.begin(position);
    }

    /// Pointer-move while down: extend the in-flight stroke and paint the
    /// new segment immediately for local feedback.
    pub fn pointer_move(&mut self, position: Point) {
        if let Some(segment) = self.session.extend(position) {
            self.pipeline.paint_segment(&segment);
        }
    }

    /// Pointer-up or pointer-leave: finish the capture. A committed
    /// stroke is broadcast to the room; a discarded click is not.
    pub fn pointer_up(&mut self) {
        if self.session.end(self.room.log_mut()) {
            self.room.broadcast_sync();
        }
    }

    /// Clear the shared canvas for every peer. Rejected while a local
    /// capture is in flight.
    pub fn clear(&mut self) -> bool {
        let cleared = self.session.clear(self.room.log_mut());
        if cleared {
            self.room.broadcast_sync();
        }
        cleared
    }

    /// Handle an inbound relay frame.
    pub fn handle_server_frame(&mut self, json: &str) -> Option<SyncEvent> {
        self.room.handle_message(json)
    }

    /// Repaint from the current log snapshot if anything changed since
    /// the last pump. Returns whether a repaint happened.
    pub fn pump(&mut self) -> bool {
        if !self.dirty.replace(false) {
            return false;
        }
        let strokes = self.room.log().snapshot();
        self.pipeline.repaint(&strokes);
        true
    }

    pub fn surface(&self) -> &RasterSurface {
        self.pipeline.surface()
    }

    /// Drain wire messages queued for the relay (the transport owner
    /// sends these).
    pub fn take_outgoing(&mut self) -> Vec<String> {
        self.room.take_outgoing()
    }

    /// The canvas's own placement, for normalizing raw pointer input.
    pub fn bounds(&self) -> CanvasBounds {
        CanvasBounds::new(
            Point::ZERO,
            f64::from(self.config.width),
            f64::from(self.config.height),
        )
    }

    /// Dispatch a normalized pointer event.
    pub fn handle_pointer_event(&mut self, event: PointerEvent) {
        match event {
            PointerEvent::Down { position } => self.pointer_down(position),
            PointerEvent::Move { position } => self.pointer_move(position),
            PointerEvent::Up => self.pointer_up(),
        }
    }

    pub fn config(&self) -> &BoardConfig {
        &self.config
    }

    pub fn brush(&self) -> &Brush {
        self.session.brush()
    }

    pub fn set_brush_color(&mut self, color: StrokeColor) {
        self.session.set_brush_color(color);
    }

    pub fn set_brush_size(&mut self, size: f64) {
        self.session.set_brush_size(size);
    }

    pub fn is_drawing(&self) -> bool {
        self.session.is_capturing()
    }

    pub fn room(&self) -> &RoomSession {
        &self.room
    }

    pub fn room_mut(&mut self) -> &mut RoomSession {
        &mut self.room
    }
}
