//! Error results that can be returned from the easel protocol crate
use crate::array::DType;
use thiserror::Error;

/// Parser and encoder error that defines the reason why a command could not be encoded or decoded
#[derive(Debug, Error)]
pub enum ProtocolError {
    #[error("unknown command: {0}")]
    UnknownCommand(String),

    #[error("unknown opcode: {0}")]
    UnknownOpcode(u64),

    #[error("malformed command entry: {0}")]
    MalformedEntry(String),

    #[error("shape {shape:?} cannot hold {len} elements")]
    ShapeMismatch { shape: Vec<usize>, len: usize },

    #[error("strides {strides:?} do not fit shape {shape:?}")]
    InvalidStrides { shape: Vec<usize>, strides: Vec<isize> },

    #[error("item {index} has shape {shape:?}, expected a list of (x, y) points")]
    InvalidPointShape { index: usize, shape: Vec<usize> },

    #[error("item {index} has {found} points, at least {required} are required")]
    TooFewPoints {
        index: usize,
        found: usize,
        required: usize,
    },

    #[error("point counts add up to {expected} points but {found} points were given")]
    PointCountMismatch { expected: usize, found: usize },

    #[error("dtype {0} is not supported here")]
    UnsupportedDtype(DType),

    #[error("buffer for {dtype} array of shape {shape:?} must be {expected} bytes, got {found}")]
    BufferLength {
        dtype: DType,
        shape: Vec<usize>,
        expected: usize,
        found: usize,
    },

    #[error("buffer index {index} out of range, {count} buffers available")]
    BufferIndex { index: usize, count: usize },

    #[error("invalid value for {name}: {reason}")]
    InvalidArgument { name: String, reason: String },

    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),
}

impl ProtocolError {
    pub fn invalid(name: &str, reason: impl Into<String>) -> Self {
        ProtocolError::InvalidArgument {
            name: name.to_string(),
            reason: reason.into(),
        }
    }
}
