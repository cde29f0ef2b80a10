//! Error results that can be returned from the easel canvas crate
use crate::transport::TransportError;
use easel_protocol::ProtocolError;
use std::time::Duration;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum CanvasError {
    #[error("protocol error: {0}")]
    Protocol(#[from] ProtocolError),

    #[error("transport error: {0}")]
    Transport(#[from] TransportError),

    /// The remote surface has not reported ready. Names the call that fixes it.
    #[error("surface is not ready yet, {0}")]
    SurfaceNotReady(&'static str),

    #[error("surface did not report ready within {0:?}")]
    Timeout(Duration),

    #[error("unsupported file format '{0}', only .png files can be written")]
    Format(String),

    #[error("no image data has been received from the surface")]
    DataUnavailable,

    #[error("io error: {0}")]
    IO(#[from] std::io::Error),
}
