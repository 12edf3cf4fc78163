//! CRDT integration using Loro for the shared stroke log.
//!
//! # Schema
//!
//! ```text
//! LoroDoc
//! └── "strokes": LoroList<LoroMap> (committed strokes, in log order)
//! ```
//!
//! Each stroke map holds:
//! - "points": LoroList of [x, y] pairs
//! - "color_r" / "color_g" / "color_b" / "color_a": i64 channels
//! - "size": stroke width (double)
//!
//! Concurrent appends from different peers both survive the merge; the
//! interleaving is whatever Loro's list CRDT converges on, and is identical
//! on every peer that has imported the same set of updates.

mod convert;
mod schema;

pub use convert::{stroke_from_loro, stroke_to_loro};
pub use schema::{StrokeDoc, STROKES_KEY};

// Re-export Loro types used by the sync layer
pub use loro::{ExportMode, VersionVector};
