//! Easel: batched, binary-encoded draw commands for remote 2D canvases
//!
//! The workspace is split in a few crates, re-exported here:
//!
//! - [`shared`]: ids and small geometric types
//! - [`config`]: the process-wide settings store
//! - [`protocol`]: numeric array codec, opcode and attribute tables, wire messages
//! - [`canvas`]: drawing surfaces, the batch manager, events and frame loops

pub use easel_canvas as canvas;
pub use easel_config as config;
pub use easel_protocol as protocol;
pub use easel_shared as shared;

/// The types most drawing code needs
pub mod prelude {
    pub use easel_canvas::canvas::Canvas;
    pub use easel_canvas::manager::{hold, BatchManager, ManagerHandle};
    pub use easel_canvas::multi::MultiCanvas;
    pub use easel_canvas::rough::RoughCanvas;
    pub use easel_canvas::surface::{DrawingSurface, FillRule};
    pub use easel_canvas::transport::{RecordingTransport, Transport};
    pub use easel_canvas::CanvasError;
    pub use easel_protocol::args::Arg;
    pub use easel_protocol::array::NdArray;
    pub use easel_protocol::points::PointSet;
    pub use easel_shared::types::Size;
}
