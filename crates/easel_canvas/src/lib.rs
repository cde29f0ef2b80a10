//! Batched drawing surfaces
//!
//! Canvases turn drawing calls into protocol commands and hand them to a shared
//! [`manager::BatchManager`], which either sends them right away or collects them into one
//! message per batch:
//!
//! ```text
//!   Canvas / RoughCanvas / MultiCanvas layers
//!        |  fill_rect(), set_fill_style(), ...
//!        v
//!   BatchManager  --(metadata, [command stream, arg buffers...])-->  Transport
//!        ^
//!   hold() / begin_batch() / end_batch()
//! ```
//!
//! Inbound events from the remote side are fed into [`canvas::Canvas::handle_event`].

pub mod canvas;
pub mod errors;
pub mod events;
pub mod frame;
pub mod image;
pub mod manager;
pub mod multi;
pub mod rough;
pub mod surface;
pub mod transport;

pub use crate::errors::CanvasError;
