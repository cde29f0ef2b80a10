//! Draw command protocol
//!
//! Encodes drawing calls into compact messages for a remote 2D canvas and decodes them again:
//!
//! - [`array`]: numeric arrays to `{shape, dtype}` descriptors plus raw little-endian bytes
//! - [`args`] and [`points`]: scalar/bulk argument normalization
//! - [`opcodes`], [`attributes`] and [`command`]: the opcode and attribute tables and the
//!   `[opcode, args, bufferCount]` entries built from them
//! - [`message`] and [`decode`]: the wire message and its decoder

pub mod args;
pub mod array;
pub mod attributes;
pub mod color;
pub mod command;
pub mod decode;
pub mod errors;
pub mod message;
pub mod opcodes;
pub mod points;
pub mod reference;

pub use crate::errors::ProtocolError;
