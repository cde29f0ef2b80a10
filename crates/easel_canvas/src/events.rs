//! Inbound events
//!
//! The remote surface reports pointer, touch and keyboard activity as JSON objects tagged by an
//! `event` field. Each message is decoded into a [`CanvasEvent`] and handed to every callback
//! registered for its kind, in registration order.

use log::{debug, error, warn};
use serde::Deserialize;
use serde_json::Value;
use std::fmt::{self, Debug};

#[derive(Debug, Clone, Copy, PartialEq, Deserialize)]
pub struct PointerEvent {
    pub x: f64,
    pub y: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Deserialize)]
pub struct Touch {
    pub x: f64,
    pub y: f64,
    pub id: i64,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct TouchEvent {
    pub touches: Vec<Touch>,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct KeyEvent {
    pub key: String,
    pub shift_key: bool,
    pub ctrl_key: bool,
    pub meta_key: bool,
}

/// Event reported by the remote surface
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum CanvasEvent {
    MouseMove(PointerEvent),
    MouseDown(PointerEvent),
    MouseUp(PointerEvent),
    MouseOut(PointerEvent),
    TouchStart(TouchEvent),
    TouchEnd(TouchEvent),
    TouchMove(TouchEvent),
    TouchCancel(TouchEvent),
    KeyDown(KeyEvent),
    ClientReady,
    #[serde(other)]
    Unknown,
}

/// Decodes an inbound message. Malformed messages are logged and yield None.
pub fn decode_event(raw: &Value) -> Option<CanvasEvent> {
    match CanvasEvent::deserialize(raw) {
        Ok(CanvasEvent::Unknown) => {
            debug!("ignoring unknown event {}", raw.get("event").unwrap_or(&Value::Null));
            None
        }
        Ok(event) => Some(event),
        Err(err) => {
            warn!("dropping malformed event message {raw}: {err}");
            None
        }
    }
}

/// Event callback. Errors are logged and do not stop other callbacks.
pub struct Callback<D> {
    callback: Box<dyn FnMut(&D) -> anyhow::Result<()>>,
}

impl<D> Callback<D> {
    pub fn new(callback: impl FnMut(&D) -> anyhow::Result<()> + 'static) -> Self {
        Self {
            callback: Box::new(callback),
        }
    }

    pub fn execute(&mut self, data: &D) -> anyhow::Result<()> {
        (self.callback)(data)
    }
}

/// A callback together with the event kind it listens to
pub enum Listener {
    MouseMove(Callback<PointerEvent>),
    MouseDown(Callback<PointerEvent>),
    MouseUp(Callback<PointerEvent>),
    MouseOut(Callback<PointerEvent>),
    TouchStart(Callback<TouchEvent>),
    TouchEnd(Callback<TouchEvent>),
    TouchMove(Callback<TouchEvent>),
    TouchCancel(Callback<TouchEvent>),
    KeyDown(Callback<KeyEvent>),
    ClientReady(Callback<()>),
}

pub struct EventListener<D> {
    listeners: Vec<Callback<D>>,
}

impl<D> EventListener<D> {
    fn handle_event(&mut self, name: &str, event: &D) {
        for listener in self.listeners.iter_mut() {
            if let Err(err) = listener.execute(event) {
                error!("{name} callback failed: {err:#}");
            }
        }
    }

    pub fn len(&self) -> usize {
        self.listeners.len()
    }

    fn append(&mut self, other: EventListener<D>) {
        self.listeners.extend(other.listeners);
    }

    pub fn is_empty(&self) -> bool {
        self.listeners.is_empty()
    }
}

impl<D> Default for EventListener<D> {
    fn default() -> Self {
        Self {
            listeners: Vec::new(),
        }
    }
}

impl<D> Debug for EventListener<D> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EventListener")
            .field("listeners", &self.listeners.len())
            .finish()
    }
}

#[derive(Debug, Default)]
pub struct EventListeners {
    mouse_move: EventListener<PointerEvent>,
    mouse_down: EventListener<PointerEvent>,
    mouse_up: EventListener<PointerEvent>,
    mouse_out: EventListener<PointerEvent>,
    touch_start: EventListener<TouchEvent>,
    touch_end: EventListener<TouchEvent>,
    touch_move: EventListener<TouchEvent>,
    touch_cancel: EventListener<TouchEvent>,
    key_down: EventListener<KeyEvent>,
    client_ready: EventListener<()>,
}

impl EventListeners {
    pub fn add_listener(&mut self, listener: Listener) {
        match listener {
            Listener::MouseMove(callback) => self.mouse_move.listeners.push(callback),
            Listener::MouseDown(callback) => self.mouse_down.listeners.push(callback),
            Listener::MouseUp(callback) => self.mouse_up.listeners.push(callback),
            Listener::MouseOut(callback) => self.mouse_out.listeners.push(callback),
            Listener::TouchStart(callback) => self.touch_start.listeners.push(callback),
            Listener::TouchEnd(callback) => self.touch_end.listeners.push(callback),
            Listener::TouchMove(callback) => self.touch_move.listeners.push(callback),
            Listener::TouchCancel(callback) => self.touch_cancel.listeners.push(callback),
            Listener::KeyDown(callback) => self.key_down.listeners.push(callback),
            Listener::ClientReady(callback) => self.client_ready.listeners.push(callback),
        }
    }

    /// Moves the callbacks of `other` behind the ones already registered
    pub fn merge(&mut self, other: EventListeners) {
        self.mouse_move.append(other.mouse_move);
        self.mouse_down.append(other.mouse_down);
        self.mouse_up.append(other.mouse_up);
        self.mouse_out.append(other.mouse_out);
        self.touch_start.append(other.touch_start);
        self.touch_end.append(other.touch_end);
        self.touch_move.append(other.touch_move);
        self.touch_cancel.append(other.touch_cancel);
        self.key_down.append(other.key_down);
        self.client_ready.append(other.client_ready);
    }

    /// Runs the callbacks registered for the event's kind
    pub fn dispatch(&mut self, event: &CanvasEvent) {
        match event {
            CanvasEvent::MouseMove(data) => self.mouse_move.handle_event("mouse_move", data),
            CanvasEvent::MouseDown(data) => self.mouse_down.handle_event("mouse_down", data),
            CanvasEvent::MouseUp(data) => self.mouse_up.handle_event("mouse_up", data),
            CanvasEvent::MouseOut(data) => self.mouse_out.handle_event("mouse_out", data),
            CanvasEvent::TouchStart(data) => self.touch_start.handle_event("touch_start", data),
            CanvasEvent::TouchEnd(data) => self.touch_end.handle_event("touch_end", data),
            CanvasEvent::TouchMove(data) => self.touch_move.handle_event("touch_move", data),
            CanvasEvent::TouchCancel(data) => {
                self.touch_cancel.handle_event("touch_cancel", data)
            }
            CanvasEvent::KeyDown(data) => self.key_down.handle_event("key_down", data),
            CanvasEvent::ClientReady => self.client_ready.handle_event("client_ready", &()),
            CanvasEvent::Unknown => {}
        }
    }

    /// Decodes a raw message and dispatches it. Returns the event when it was recognized.
    pub fn dispatch_raw(&mut self, raw: &Value) -> Option<CanvasEvent> {
        let event = decode_event(raw)?;
        self.dispatch(&event);
        Some(event)
    }
}
