//! Outbound transport
//!
//! The object synchronization layer between the two processes is outside of this crate. It is
//! reached through the [`Transport`] trait, which accepts one message at a time.

use bytes::Bytes;
use easel_protocol::array::ArrayDescriptor;
use easel_protocol::decode::{decode_message, DecodedEntry};
use easel_protocol::message::OutboundMessage;
use easel_protocol::ProtocolError;
use std::cell::{Cell, RefCell};
use std::rc::Rc;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum TransportError {
    #[error("transport is closed")]
    Closed,

    #[error("send failed: {0}")]
    Send(String),
}

/// Sink for outbound messages
pub trait Transport {
    fn send(&mut self, metadata: ArrayDescriptor, buffers: Vec<Bytes>) -> Result<(), TransportError>;
}

/// Transport that keeps every message in memory. Clones share the same message log.
#[derive(Debug, Clone, Default)]
pub struct RecordingTransport {
    messages: Rc<RefCell<Vec<OutboundMessage>>>,
    failing: Rc<Cell<bool>>,
}

impl RecordingTransport {
    pub fn new() -> Self {
        Self::default()
    }

    /// When set, every send fails without recording the message
    pub fn set_failing(&self, failing: bool) {
        self.failing.set(failing);
    }

    pub fn len(&self) -> usize {
        self.messages.borrow().len()
    }

    pub fn is_empty(&self) -> bool {
        self.messages.borrow().is_empty()
    }

    pub fn messages(&self) -> Vec<OutboundMessage> {
        self.messages.borrow().clone()
    }

    /// Removes and returns all recorded messages
    pub fn take(&self) -> Vec<OutboundMessage> {
        self.messages.borrow_mut().drain(..).collect()
    }

    /// Decodes every recorded message
    pub fn decoded(&self) -> Result<Vec<Vec<DecodedEntry>>, ProtocolError> {
        self.messages.borrow().iter().map(decode_message).collect()
    }
}

impl Transport for RecordingTransport {
    fn send(&mut self, metadata: ArrayDescriptor, buffers: Vec<Bytes>) -> Result<(), TransportError> {
        if self.failing.get() {
            return Err(TransportError::Send("recording transport set to fail".into()));
        }

        self.messages
            .borrow_mut()
            .push(OutboundMessage { metadata, buffers });
        Ok(())
    }
}
