//! The main drawing surface
//!
//! A [`Canvas`] stands for one canvas widget on the remote side. Drawing goes through its batch
//! manager, inbound events come in through [`Canvas::handle_event`]. The remote side reports
//! `client_ready` once the widget is materialized; before that the canvas can be drawn on but
//! cannot hand out a [`SurfaceHandle`].

use crate::errors::CanvasError;
use crate::events::{
    decode_event, Callback, CanvasEvent, EventListeners, KeyEvent, Listener, PointerEvent,
    TouchEvent,
};
use crate::manager::ManagerHandle;
use crate::surface::{DrawingSurface, SurfaceState};
use bytes::Bytes;
use cow_utils::CowUtils;
use easel_config::config;
use easel_protocol::reference::RemoteRef;
use easel_shared::types::{ModelId, Size};
use log::{debug, info};
use serde_json::Value;
use std::cell::{Cell, RefCell};
use std::fs;
use std::mem;
use std::path::Path;
use std::time::Duration;

/// Time spent polling before giving up, saturating at `Duration::MAX`
fn total_wait(interval: Duration, retries: usize) -> Duration {
    u32::try_from(retries)
        .ok()
        .and_then(|retries| interval.checked_mul(retries))
        .unwrap_or(Duration::MAX)
}

/// Last known pointer position and button state
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct PointerState {
    pub inside: bool,
    pub down: bool,
    pub x: f64,
    pub y: f64,
}

impl PointerState {
    fn update(&mut self, event: &CanvasEvent) {
        match event {
            CanvasEvent::MouseMove(pointer) => {
                self.inside = true;
                self.move_to(pointer);
            }
            CanvasEvent::MouseDown(pointer) => {
                self.inside = true;
                self.down = true;
                self.move_to(pointer);
            }
            CanvasEvent::MouseUp(pointer) => {
                self.down = false;
                self.move_to(pointer);
            }
            CanvasEvent::MouseOut(pointer) => {
                self.inside = false;
                self.down = false;
                self.move_to(pointer);
            }
            _ => {}
        }
    }

    fn move_to(&mut self, pointer: &PointerEvent) {
        self.x = pointer.x;
        self.y = pointer.y;
    }
}

pub struct Canvas {
    reference: RemoteRef,
    size: Size<u32>,
    manager: ManagerHandle,
    state: SurfaceState,
    listeners: RefCell<EventListeners>,
    pointer: Cell<PointerState>,
    /// Set once the remote side reported `client_ready`
    ready: Cell<bool>,
    initialized: Cell<bool>,
    /// Raster snapshot kept in sync by the remote side, PNG encoded
    image_data: RefCell<Option<Bytes>>,
}

impl Canvas {
    /// Creates a canvas of the configured default size
    pub fn new(manager: &ManagerHandle) -> Self {
        let size = Size::new(
            config!(uint "canvas.default_width") as u32,
            config!(uint "canvas.default_height") as u32,
        );
        Self::with_size(manager, size)
    }

    pub fn with_size(manager: &ManagerHandle, size: Size<u32>) -> Self {
        let reference = RemoteRef::new(ModelId::new());
        debug!("created canvas {reference} of {}x{}", size.width, size.height);

        Self {
            reference,
            size,
            manager: manager.clone(),
            state: SurfaceState::new(),
            listeners: RefCell::new(EventListeners::default()),
            pointer: Cell::new(PointerState::default()),
            ready: Cell::new(false),
            initialized: Cell::new(false),
            image_data: RefCell::new(None),
        }
    }

    pub fn id(&self) -> &ModelId {
        self.reference.id()
    }

    pub fn size(&self) -> Size<u32> {
        self.size
    }

    pub fn width(&self) -> u32 {
        self.size.width
    }

    pub fn height(&self) -> u32 {
        self.size.height
    }

    /// Feeds an inbound message from the remote side. Returns the event when it was recognized.
    pub fn handle_event(&self, raw: &Value) -> Option<CanvasEvent> {
        let event = decode_event(raw)?;

        if event == CanvasEvent::ClientReady && !self.ready.replace(true) {
            info!("canvas {} is ready", self.reference);
        }
        let mut pointer = self.pointer.get();
        pointer.update(&event);
        self.pointer.set(pointer);

        // callbacks may register new listeners on this canvas while they run
        let mut listeners = mem::take(&mut *self.listeners.borrow_mut());
        listeners.dispatch(&event);
        let added = mem::replace(&mut *self.listeners.borrow_mut(), listeners);
        self.listeners.borrow_mut().merge(added);
        Some(event)
    }

    pub fn add_listener(&self, listener: Listener) {
        self.listeners.borrow_mut().add_listener(listener);
    }

    pub fn on_mouse_move(&self, callback: impl FnMut(&PointerEvent) -> anyhow::Result<()> + 'static) {
        self.add_listener(Listener::MouseMove(Callback::new(callback)));
    }

    pub fn on_mouse_down(&self, callback: impl FnMut(&PointerEvent) -> anyhow::Result<()> + 'static) {
        self.add_listener(Listener::MouseDown(Callback::new(callback)));
    }

    pub fn on_mouse_up(&self, callback: impl FnMut(&PointerEvent) -> anyhow::Result<()> + 'static) {
        self.add_listener(Listener::MouseUp(Callback::new(callback)));
    }

    pub fn on_mouse_out(&self, callback: impl FnMut(&PointerEvent) -> anyhow::Result<()> + 'static) {
        self.add_listener(Listener::MouseOut(Callback::new(callback)));
    }

    pub fn on_touch_start(&self, callback: impl FnMut(&TouchEvent) -> anyhow::Result<()> + 'static) {
        self.add_listener(Listener::TouchStart(Callback::new(callback)));
    }

    pub fn on_touch_end(&self, callback: impl FnMut(&TouchEvent) -> anyhow::Result<()> + 'static) {
        self.add_listener(Listener::TouchEnd(Callback::new(callback)));
    }

    pub fn on_touch_move(&self, callback: impl FnMut(&TouchEvent) -> anyhow::Result<()> + 'static) {
        self.add_listener(Listener::TouchMove(Callback::new(callback)));
    }

    pub fn on_touch_cancel(&self, callback: impl FnMut(&TouchEvent) -> anyhow::Result<()> + 'static) {
        self.add_listener(Listener::TouchCancel(Callback::new(callback)));
    }

    pub fn on_key_down(&self, callback: impl FnMut(&KeyEvent) -> anyhow::Result<()> + 'static) {
        self.add_listener(Listener::KeyDown(Callback::new(callback)));
    }

    pub fn on_client_ready(&self, callback: impl FnMut(&()) -> anyhow::Result<()> + 'static) {
        self.add_listener(Listener::ClientReady(Callback::new(callback)));
    }

    pub fn is_ready(&self) -> bool {
        self.ready.get()
    }

    /// Marks the canvas as materialized. Fails when the remote side has not reported ready yet.
    pub fn initialize(&self) -> Result<(), CanvasError> {
        if !self.ready.get() {
            return Err(CanvasError::SurfaceNotReady("await async_initialize()"));
        }
        self.initialized.set(true);
        Ok(())
    }

    /// Waits for the remote side to report ready, polling at the configured interval
    pub async fn async_initialize(&self) -> Result<(), CanvasError> {
        let interval = Duration::from_millis(config!(uint "surface.ready.poll_interval_ms") as u64);
        let max_retries = config!(uint "surface.ready.max_retries");

        for attempt in 0..=max_retries {
            if self.ready.get() {
                self.initialized.set(true);
                return Ok(());
            }
            if attempt < max_retries {
                tokio::time::sleep(interval).await;
            }
        }

        Err(CanvasError::Timeout(total_wait(interval, max_retries)))
    }

    /// Handle on the materialized surface
    pub fn surface(&self) -> Result<SurfaceHandle<'_>, CanvasError> {
        if !self.initialized.get() {
            return Err(CanvasError::SurfaceNotReady("call initialize() first"));
        }
        Ok(SurfaceHandle { canvas: self })
    }

    /// Stores the raster snapshot received from the remote side
    pub fn set_image_data(&self, data: Bytes) {
        *self.image_data.borrow_mut() = Some(data);
    }

    pub fn get_image_data(&self) -> Result<Bytes, CanvasError> {
        self.image_data
            .borrow()
            .clone()
            .ok_or(CanvasError::DataUnavailable)
    }

    /// Writes the raster snapshot to a `.png` file
    pub fn to_file(&self, path: impl AsRef<Path>) -> Result<(), CanvasError> {
        let path = path.as_ref();
        let name = path.to_string_lossy();
        if !name.cow_to_ascii_lowercase().ends_with(".png") {
            return Err(CanvasError::Format(name.into_owned()));
        }

        let data = self.get_image_data()?;
        fs::write(path, &data)?;
        debug!("wrote {} bytes to {}", data.len(), path.display());
        Ok(())
    }
}

impl DrawingSurface for Canvas {
    fn reference(&self) -> &RemoteRef {
        &self.reference
    }

    fn manager(&self) -> &ManagerHandle {
        &self.manager
    }

    fn state(&self) -> &SurfaceState {
        &self.state
    }
}

/// A canvas whose remote side is known to be materialized
#[derive(Clone, Copy)]
pub struct SurfaceHandle<'a> {
    canvas: &'a Canvas,
}

impl<'a> SurfaceHandle<'a> {
    pub fn canvas(&self) -> &'a Canvas {
        self.canvas
    }

    pub fn pointer(&self) -> PointerState {
        self.canvas.pointer.get()
    }

    pub fn size(&self) -> Size<u32> {
        self.canvas.size
    }
}
