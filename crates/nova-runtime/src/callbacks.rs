//! The `extern "C"` callbacks handed to the core.
//!
//! libretro callbacks carry no user data, so they reach the host through the
//! process-wide [`ACTIVE`] slot that `Host` fills when it installs a core.

use std::{
    borrow::Cow,
    ffi::{CStr, c_char, c_uint, c_void},
    slice,
    sync::{Arc, Once},
};

use arc_swap::ArcSwapOption;
use libretro_bridge::{CallbackSet, raw};
use tracing::Level;

use crate::{
    host::HostShared,
    types::PixelFormat,
    video::{FrameView, blit},
};

pub(crate) static ACTIVE: ArcSwapOption<HostShared> = ArcSwapOption::const_empty();

type LogSink = unsafe extern "C" fn(level: c_uint, message: *const c_char);

unsafe extern "C" {
    fn nova_retro_log(level: c_uint, fmt: *const c_char, ...);
    fn nova_retro_log_set_sink(sink: Option<LogSink>);
}

pub(crate) fn callback_set() -> CallbackSet {
    CallbackSet::default()
        .with_environment(Some(environment))
        .with_video(Some(video_refresh))
        .with_audio_sample(Some(audio_sample))
        .with_audio_batch(Some(audio_sample_batch))
        .with_input_poll(Some(input_poll))
        .with_input_state(Some(input_state))
}

pub(crate) fn activate(shared: &Arc<HostShared>) {
    ACTIVE.store(Some(Arc::clone(shared)));
}

pub(crate) fn deactivate(shared: &Arc<HostShared>) {
    let current = ACTIVE.load();
    if current
        .as_ref()
        .is_some_and(|active| Arc::ptr_eq(active, shared))
    {
        ACTIVE.store(None);
    }
}

pub(crate) fn install_log_sink() {
    static ONCE: Once = Once::new();
    ONCE.call_once(|| unsafe { nova_retro_log_set_sink(Some(route_core_log)) });
}

unsafe extern "C" fn route_core_log(level: c_uint, message: *const c_char) {
    if message.is_null() {
        return;
    }
    let message = unsafe { CStr::from_ptr(message) }.to_string_lossy();
    let (level, line) = core_log_line(level, message.trim_end());

    if level == Level::ERROR {
        tracing::error!(target: CORE_LOG_TARGET, "{line}");
    } else if level == Level::INFO {
        tracing::info!(target: CORE_LOG_TARGET, "{line}");
    } else {
        tracing::debug!(target: CORE_LOG_TARGET, "{line}");
    }
}

const CORE_LOG_TARGET: &str = "nova::core";

/// Severity and text a core log message is emitted with. Warnings are
/// surfaced at info level with a `WARN: ` prefix; unknown levels fall back to
/// debug.
fn core_log_line(level: c_uint, message: &str) -> (Level, Cow<'_, str>) {
    match level {
        raw::RETRO_LOG_INFO => (Level::INFO, Cow::Borrowed(message)),
        raw::RETRO_LOG_WARN => (Level::INFO, Cow::Owned(format!("WARN: {message}"))),
        raw::RETRO_LOG_ERROR => (Level::ERROR, Cow::Borrowed(message)),
        _ => (Level::DEBUG, Cow::Borrowed(message)),
    }
}

unsafe extern "C" fn environment(cmd: c_uint, data: *mut c_void) -> bool {
    if data.is_null() {
        return false;
    }
    let active = ACTIVE.load();
    let Some(host) = active.as_ref() else {
        return false;
    };

    match cmd {
        raw::RETRO_ENVIRONMENT_GET_CAN_DUPE => {
            unsafe { *(data as *mut bool) = true };
            true
        }
        raw::RETRO_ENVIRONMENT_SET_PIXEL_FORMAT => {
            let requested = unsafe { *(data as *const c_uint) };
            match PixelFormat::from_raw(requested) {
                Some(format) => {
                    host.state.set_pixel_format(format);
                    tracing::info!("core pixel format set to {format:?}");
                    true
                }
                None => {
                    tracing::warn!("core requested unknown pixel format {requested}");
                    false
                }
            }
        }
        raw::RETRO_ENVIRONMENT_GET_SYSTEM_DIRECTORY => {
            unsafe { write_directory(data, host.directories.lock().system_ptr()) }
        }
        raw::RETRO_ENVIRONMENT_GET_SAVE_DIRECTORY => {
            unsafe { write_directory(data, host.directories.lock().save_ptr()) }
        }
        raw::RETRO_ENVIRONMENT_GET_LOG_INTERFACE => {
            let callback = data as *mut raw::retro_log_callback;
            unsafe { (*callback).log = Some(nova_retro_log) };
            true
        }
        _ => false,
    }
}

unsafe fn write_directory(data: *mut c_void, dir: Option<*const c_char>) -> bool {
    match dir {
        Some(ptr) => {
            unsafe { *(data as *mut *const c_char) = ptr };
            true
        }
        None => false,
    }
}

unsafe extern "C" fn video_refresh(
    data: *const c_void,
    width: c_uint,
    height: c_uint,
    pitch: usize,
) {
    // NULL data is a dupe request; the surface keeps the previous frame.
    if data.is_null() || width == 0 || height == 0 {
        return;
    }
    let active = ACTIVE.load();
    let Some(host) = active.as_ref() else {
        return;
    };

    let format = host.state.pixel_format();
    let (width, height) = (width as usize, height as usize);
    if pitch < width * format.bytes_per_pixel() {
        tracing::debug!("dropping frame with pitch {pitch} narrower than {width} px");
        return;
    }
    let len = FrameView::required_len(width, height, pitch, format);
    let frame = FrameView {
        data: unsafe { slice::from_raw_parts(data as *const u8, len) },
        width,
        height,
        pitch,
        format,
    };

    // Held for the whole blit so a rebind waits for the frame in flight.
    let mut surface = host.surface.lock();
    let Some(surface) = surface.as_mut() else {
        return;
    };

    surface.set_geometry(width as u32, height as u32, format.surface_format());
    let posted = match surface.lock() {
        Some(mut buffer) => {
            blit(&frame, &mut buffer);
            true
        }
        None => false,
    };
    if posted {
        surface.unlock_and_post();
    }
}

unsafe extern "C" fn audio_sample(left: i16, right: i16) {
    let frame = [left, right];
    unsafe { audio_sample_batch(frame.as_ptr(), 1) };
}

unsafe extern "C" fn audio_sample_batch(data: *const i16, frames: usize) -> usize {
    if data.is_null() || frames == 0 {
        return frames;
    }
    let active = ACTIVE.load();
    let Some(host) = active.as_ref() else {
        return frames;
    };
    if host.state.is_fast_forward() {
        return frames;
    }

    let samples = unsafe { slice::from_raw_parts(data, frames * 2) };
    let ready = host.stage.lock().push(samples);
    for chunk in ready {
        host.flush_audio(&chunk);
    }
    frames
}

unsafe extern "C" fn input_poll() {}

unsafe extern "C" fn input_state(port: c_uint, device: c_uint, index: c_uint, id: c_uint) -> i16 {
    if port != 0 || device != raw::RETRO_DEVICE_JOYPAD || index != 0 {
        return 0;
    }
    let active = ACTIVE.load();
    match active.as_ref() {
        Some(host) => host.state.button(id) as i16,
        None => 0,
    }
}
