//! Stacked canvases
//!
//! A [`MultiCanvas`] is a stack of equally sized layers, the first one at the bottom. All
//! layers share one batch manager, so drawing on several layers inside one hold still goes out
//! as a single message.

use crate::canvas::Canvas;
use crate::errors::CanvasError;
use crate::manager::{hold, ManagerHandle};
use crate::surface::DrawingSurface;
use easel_config::config;
use easel_shared::types::Size;

pub struct MultiCanvas {
    manager: ManagerHandle,
    layers: Vec<Canvas>,
    size: Size<u32>,
}

impl MultiCanvas {
    /// Creates `layers` layers of the configured default size
    pub fn new(manager: &ManagerHandle, layers: usize) -> Self {
        let size = Size::new(
            config!(uint "canvas.default_width") as u32,
            config!(uint "canvas.default_height") as u32,
        );
        Self::with_size(manager, layers, size)
    }

    pub fn with_size(manager: &ManagerHandle, layers: usize, size: Size<u32>) -> Self {
        Self {
            manager: manager.clone(),
            layers: (0..layers).map(|_| Canvas::with_size(manager, size)).collect(),
            size,
        }
    }

    pub fn layer(&self, index: usize) -> Option<&Canvas> {
        self.layers.get(index)
    }

    pub fn layers(&self) -> &[Canvas] {
        &self.layers
    }

    pub fn len(&self) -> usize {
        self.layers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.layers.is_empty()
    }

    pub fn size(&self) -> Size<u32> {
        self.size
    }

    /// Clears every layer in one batch
    pub fn clear(&self) -> Result<(), CanvasError> {
        let guard = hold(&self.manager);
        for layer in &self.layers {
            layer.clear()?;
        }
        guard.release()
    }
}
