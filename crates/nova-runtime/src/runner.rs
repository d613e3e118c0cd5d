use std::{
    sync::{Arc, atomic::Ordering},
    thread,
    time::{Duration, Instant},
};

use libretro_bridge::Core;
use parking_lot::Mutex;

use crate::host::HostShared;

/// Name of the emulation thread.
pub(crate) const THREAD_NAME: &str = "nova-emu";

/// How far the carried deadline may lag before it is re-anchored to now.
const MAX_LAG_PERIODS: u32 = 2;

/// The pacing loop. Sole caller of `retro_run` while a game is running.
pub(crate) struct Runner {
    shared: Arc<HostShared>,
    core: Arc<Mutex<Option<Core>>>,
    next_frame_deadline: Instant,
}

impl Runner {
    pub(crate) fn new(shared: Arc<HostShared>, core: Arc<Mutex<Option<Core>>>) -> Self {
        Self {
            shared,
            core,
            next_frame_deadline: Instant::now(),
        }
    }

    pub(crate) fn run(&mut self) {
        self.attach_audio();
        let period = self.shared.config.frame_period;
        self.next_frame_deadline = Instant::now();

        while self.shared.state.is_running() {
            if self.shared.state.is_paused() {
                thread::sleep(self.shared.config.pause_poll);
                self.next_frame_deadline = Instant::now() + period;
                continue;
            }

            if !self.step_frame() {
                tracing::warn!("core vanished under the emulation thread");
                break;
            }
            self.shared.flush_residual_audio();

            if self.shared.state.is_fast_forward() {
                self.next_frame_deadline = Instant::now();
                continue;
            }

            self.next_frame_deadline += period;
            let now = Instant::now();
            if now < self.next_frame_deadline {
                thread::sleep(self.next_frame_deadline - now);
            } else if now.duration_since(self.next_frame_deadline) > period * MAX_LAG_PERIODS {
                self.next_frame_deadline = now;
            }
        }
    }

    /// Runs one frame under the core-entry lock.
    fn step_frame(&self) -> bool {
        let core = self.core.lock();
        let Some(core) = core.as_ref() else {
            return false;
        };
        core.run();
        self.shared.state.frame_seq.fetch_add(1, Ordering::Relaxed);
        true
    }

    fn attach_audio(&self) {
        let Some(sink) = self.shared.sink.lock().clone() else {
            return;
        };
        if let Err(e) = sink.attach_current_thread() {
            tracing::error!("failed to attach emulation thread, audio will be silent: {e:#}");
        }
    }
}

/// Frame period expressed as a rate, for logging.
pub(crate) fn period_hz(period: Duration) -> f64 {
    match period.as_secs_f64() {
        secs if secs > 0.0 => 1.0 / secs,
        _ => 0.0,
    }
}
