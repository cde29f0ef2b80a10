//! Shared functionality
//!
//! Small types used by every easel crate: sizes, model identifiers and the generic result type.
//!

pub mod types;
