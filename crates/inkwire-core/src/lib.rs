//! Inkwire Core Library
//!
//! Platform-agnostic engine for collaborative freehand drawing: the
//! capture state machine, the CRDT-backed shared stroke log, and the
//! relay wire protocol. The rendered canvas is always a pure function of
//! the log's contents, so peers that have seen the same strokes draw the
//! same pixels.

pub mod capture;
pub mod collaboration;
pub mod config;
pub mod crdt;
pub mod guard;
pub mod input;
pub mod log;
pub mod stroke;
pub mod sync;

pub use capture::{CaptureSession, CaptureState, Segment};
pub use collaboration::{RoomSession, DEFAULT_ROOM};
pub use config::BoardConfig;
pub use crdt::StrokeDoc;
pub use guard::SessionGuard;
pub use input::{CanvasBounds, PointerEvent, PointerInput};
pub use self::log::{CrdtStrokeLog, MemoryStrokeLog, StrokeLog};
pub use stroke::{Brush, Stroke, StrokeColor};
pub use sync::{ConnectionState, SyncEvent};

#[cfg(not(target_arch = "wasm32"))]
pub use sync::RelayClient;
