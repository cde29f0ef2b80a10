//! Batch manager
//!
//! All surfaces sharing a transport submit their commands through one manager. Outside of a
//! batch every command is sent as soon as it is submitted. Inside a batch commands are
//! collected and sent together as one message when the outermost batch ends (or on an explicit
//! flush).
//!
//! ```text
//!   Immediate --begin_batch()--> Batching (depth 1) --begin_batch()--> Batching (depth 2)
//!       ^                            |                                     |
//!       +-------end_batch()----------+ <-----------end_batch()-------------+
//!          (flushes pending)
//! ```
//!
//! Whenever a command targets another surface than the previous one, a switch entry is
//! inserted before it.

use crate::errors::CanvasError;
use crate::transport::Transport;
use bytes::Bytes;
use easel_protocol::command::Entry;
use easel_protocol::message::{serialize_commands, Payload};
use easel_protocol::reference::RemoteRef;
use log::{debug, error, warn};
use std::cell::{Cell, RefCell};
use std::fmt;
use std::mem;
use std::rc::Rc;

/// Shared handle to a batch manager
pub type ManagerHandle = Rc<RefCell<BatchManager>>;

pub struct BatchManager {
    transport: Box<dyn Transport>,
    /// Nesting depth of begin_batch calls, 0 means immediate mode
    depth: usize,
    pending: Vec<Entry>,
    buffers: Vec<Bytes>,
    /// Surface addressed last inside the running batch
    batch_surface: Option<RemoteRef>,
    /// Surface the remote side currently draws on
    last_surface: Option<RemoteRef>,
    /// Batch ends from guards dropped while the manager was borrowed
    deferred_ends: Rc<Cell<usize>>,
}

impl BatchManager {
    pub fn new(transport: impl Transport + 'static) -> Self {
        Self {
            transport: Box::new(transport),
            depth: 0,
            pending: Vec::new(),
            buffers: Vec::new(),
            batch_surface: None,
            last_surface: None,
            deferred_ends: Rc::new(Cell::new(0)),
        }
    }

    /// Creates a manager wrapped in a shareable handle
    pub fn shared(transport: impl Transport + 'static) -> ManagerHandle {
        Rc::new(RefCell::new(Self::new(transport)))
    }

    pub fn is_batching(&self) -> bool {
        self.depth > 0
    }

    pub fn depth(&self) -> usize {
        self.depth
    }

    /// Number of entries waiting for the next flush
    pub fn pending_len(&self) -> usize {
        self.pending.len()
    }

    /// Ends the batches whose guards could not reach the manager when they were dropped
    fn settle_deferred_ends(&mut self) -> Result<(), CanvasError> {
        for _ in 0..self.deferred_ends.replace(0) {
            self.end_one()?;
        }
        Ok(())
    }

    pub fn begin_batch(&mut self) {
        if let Err(err) = self.settle_deferred_ends() {
            error!("could not send batch: {err}");
        }
        if self.depth == 0 {
            self.pending.clear();
            self.buffers.clear();
            self.batch_surface = None;
        }
        self.depth += 1;
    }

    /// Queues (or directly sends) one entry for the given surface
    pub fn submit(
        &mut self,
        surface: &RemoteRef,
        entry: Entry,
        buffers: Vec<Bytes>,
    ) -> Result<(), CanvasError> {
        self.settle_deferred_ends()?;
        if self.is_batching() {
            if self.batch_surface.as_ref() != Some(surface) {
                debug!("batch switches to surface {surface}");
                self.pending.push(Entry::switch(surface));
                self.batch_surface = Some(surface.clone());
            }
            self.pending.push(entry);
            self.buffers.extend(buffers);
            return Ok(());
        }

        if self.last_surface.as_ref() != Some(surface) {
            debug!("switching to surface {surface}");
            self.send(Payload::Single(&Entry::switch(surface)), Vec::new())?;
            self.last_surface = Some(surface.clone());
        }
        self.send(Payload::Single(&entry), buffers)
    }

    /// Sends everything collected so far as one message. Does nothing when nothing is pending.
    pub fn flush(&mut self) -> Result<(), CanvasError> {
        if self.pending.is_empty() {
            return Ok(());
        }

        // the lists are emptied before sending: a failed message is not retried
        let entries = mem::take(&mut self.pending);
        let buffers = mem::take(&mut self.buffers);

        debug!("flushing {} commands", entries.len());
        self.send(Payload::Batch(&entries), buffers)?;
        if self.batch_surface.is_some() {
            self.last_surface.clone_from(&self.batch_surface);
        }
        Ok(())
    }

    pub fn end_batch(&mut self) -> Result<(), CanvasError> {
        self.settle_deferred_ends()?;
        self.end_one()
    }

    fn end_one(&mut self) -> Result<(), CanvasError> {
        match self.depth {
            0 => {
                warn!("end_batch called without a matching begin_batch");
                Ok(())
            }
            1 => {
                self.depth = 0;
                self.flush()
            }
            _ => {
                self.depth -= 1;
                Ok(())
            }
        }
    }

    fn send(&mut self, payload: Payload<'_>, buffers: Vec<Bytes>) -> Result<(), CanvasError> {
        let message = serialize_commands(payload, buffers)?;
        self.transport.send(message.metadata, message.buffers)?;
        Ok(())
    }
}

impl fmt::Debug for BatchManager {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BatchManager")
            .field("depth", &self.depth)
            .field("pending", &self.pending.len())
            .field("buffers", &self.buffers.len())
            .field("batch_surface", &self.batch_surface)
            .field("last_surface", &self.last_surface)
            .finish()
    }
}

/// Starts a batch that lasts as long as the returned guard
pub fn hold(manager: &ManagerHandle) -> HoldGuard {
    let mut inner = manager.borrow_mut();
    inner.begin_batch();
    HoldGuard {
        manager: manager.clone(),
        deferred_ends: inner.deferred_ends.clone(),
        released: false,
    }
}

/// Ends its batch when released or dropped. Only `release` reports a failed send; on drop the
/// error is logged. A guard dropped while the manager is borrowed ends its batch on the
/// manager's next use.
#[must_use = "the batch ends as soon as the guard is dropped"]
pub struct HoldGuard {
    manager: ManagerHandle,
    deferred_ends: Rc<Cell<usize>>,
    released: bool,
}

impl HoldGuard {
    pub fn release(mut self) -> Result<(), CanvasError> {
        self.released = true;
        self.manager.borrow_mut().end_batch()
    }
}

impl Drop for HoldGuard {
    fn drop(&mut self) {
        if self.released {
            return;
        }

        match self.manager.try_borrow_mut() {
            Ok(mut manager) => {
                if let Err(err) = manager.end_batch() {
                    error!("could not send batch: {err}");
                }
            }
            Err(_) => {
                warn!("batch manager is in use, batch ends on its next use");
                self.deferred_ends.set(self.deferred_ends.get() + 1);
            }
        }
    }
}
