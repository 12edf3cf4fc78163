//! Inkwire Render Library
//!
//! CPU rasterization for the collaborative whiteboard: a deterministic
//! tiny-skia surface, the repaint-from-log pipeline, and the
//! [`Whiteboard`] facade that wires capture, collaboration, and
//! rendering together. Identical log snapshots always rasterize to
//! identical pixels, which is what lets two converged peers show the
//! same canvas.

pub mod board;
pub mod pipeline;
pub mod surface;

pub use board::Whiteboard;
pub use pipeline::RenderPipeline;
pub use surface::{RasterSurface, RenderResult, RendererError};
