//! Frame loops
//!
//! A frame loop calls a callback at a fixed rate on the current `LocalSet`, passing the time in
//! milliseconds since the previous frame. Frames that run late delay the following ones instead
//! of bursting to catch up.

use crate::manager::{hold, ManagerHandle};
use easel_config::config;
use log::{debug, error};
use std::cell::Cell;
use std::rc::Rc;
use std::time::Duration;
use tokio::task::{self, JoinHandle};
use tokio::time::{self, Instant, MissedTickBehavior};

/// Handle on a running frame loop
#[derive(Debug)]
pub struct FrameLoop {
    handle: JoinHandle<()>,
    cancelled: Rc<Cell<bool>>,
}

impl FrameLoop {
    /// Stops the loop. The callback is not called again once this returns.
    pub fn cancel(&self) {
        self.cancelled.set(true);
        self.handle.abort();
    }

    /// Whether the loop ended, by cancellation or by a failing callback
    pub fn is_finished(&self) -> bool {
        self.handle.is_finished()
    }
}

/// Calls `callback` `fps` times per second. With `fps` 0 the configured default rate is used.
///
/// Must be called from within a `LocalSet`. A callback error is logged and ends the loop.
pub fn call_repeated<F>(mut callback: F, fps: u32) -> FrameLoop
where
    F: FnMut(f64) -> anyhow::Result<()> + 'static,
{
    let fps = match fps {
        0 => config!(uint "frame.default_fps").max(1) as u32,
        fps => fps,
    };
    let period = Duration::from_secs_f64(1.0 / fps as f64);
    debug!("starting frame loop at {fps} fps");

    let cancelled = Rc::new(Cell::new(false));
    let flag = cancelled.clone();

    let handle = task::spawn_local(async move {
        let mut interval = time::interval(period);
        interval.set_missed_tick_behavior(MissedTickBehavior::Delay);

        interval.tick().await; // First tick is immediate
        let mut last = Instant::now();

        loop {
            interval.tick().await;
            if flag.get() {
                break;
            }

            let now = Instant::now();
            let elapsed = now.duration_since(last).as_secs_f64() * 1000.0;
            last = now;

            if let Err(err) = callback(elapsed) {
                error!("frame callback failed, stopping frame loop: {err:#}");
                break;
            }
        }
    });

    FrameLoop { handle, cancelled }
}

/// Like [`call_repeated`], but every frame is drawn inside one batch so it is sent as a single
/// message
pub fn set_render_loop<F>(manager: &ManagerHandle, mut callback: F, fps: u32) -> FrameLoop
where
    F: FnMut(f64) -> anyhow::Result<()> + 'static,
{
    let manager = manager.clone();
    call_repeated(
        move |elapsed| {
            let guard = hold(&manager);
            let result = callback(elapsed);
            guard.release()?;
            result
        },
        fps,
    )
}
