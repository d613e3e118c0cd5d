//! Hand-maintained mirror of the parts of `libretro.h` the host consumes.
//!
//! Names follow the C header so that code reading against the libretro
//! documentation maps one-to-one.

#![allow(non_camel_case_types)]

use std::ffi::{c_char, c_uint, c_void};

pub const RETRO_DEVICE_NONE: c_uint = 0;
pub const RETRO_DEVICE_JOYPAD: c_uint = 1;

pub const RETRO_DEVICE_ID_JOYPAD_B: c_uint = 0;
pub const RETRO_DEVICE_ID_JOYPAD_Y: c_uint = 1;
pub const RETRO_DEVICE_ID_JOYPAD_SELECT: c_uint = 2;
pub const RETRO_DEVICE_ID_JOYPAD_START: c_uint = 3;
pub const RETRO_DEVICE_ID_JOYPAD_UP: c_uint = 4;
pub const RETRO_DEVICE_ID_JOYPAD_DOWN: c_uint = 5;
pub const RETRO_DEVICE_ID_JOYPAD_LEFT: c_uint = 6;
pub const RETRO_DEVICE_ID_JOYPAD_RIGHT: c_uint = 7;
pub const RETRO_DEVICE_ID_JOYPAD_A: c_uint = 8;
pub const RETRO_DEVICE_ID_JOYPAD_X: c_uint = 9;
pub const RETRO_DEVICE_ID_JOYPAD_L: c_uint = 10;
pub const RETRO_DEVICE_ID_JOYPAD_R: c_uint = 11;
pub const RETRO_DEVICE_ID_JOYPAD_L2: c_uint = 12;
pub const RETRO_DEVICE_ID_JOYPAD_R2: c_uint = 13;
pub const RETRO_DEVICE_ID_JOYPAD_L3: c_uint = 14;
pub const RETRO_DEVICE_ID_JOYPAD_R3: c_uint = 15;

pub const RETRO_ENVIRONMENT_GET_CAN_DUPE: c_uint = 3;
pub const RETRO_ENVIRONMENT_GET_SYSTEM_DIRECTORY: c_uint = 9;
pub const RETRO_ENVIRONMENT_SET_PIXEL_FORMAT: c_uint = 10;
pub const RETRO_ENVIRONMENT_GET_LOG_INTERFACE: c_uint = 27;
pub const RETRO_ENVIRONMENT_GET_SAVE_DIRECTORY: c_uint = 31;

pub const RETRO_PIXEL_FORMAT_0RGB1555: c_uint = 0;
pub const RETRO_PIXEL_FORMAT_XRGB8888: c_uint = 1;
pub const RETRO_PIXEL_FORMAT_RGB565: c_uint = 2;

pub const RETRO_LOG_DEBUG: c_uint = 0;
pub const RETRO_LOG_INFO: c_uint = 1;
pub const RETRO_LOG_WARN: c_uint = 2;
pub const RETRO_LOG_ERROR: c_uint = 3;

// Callbacks the frontend hands to the core.
pub type retro_environment_t = Option<unsafe extern "C" fn(cmd: c_uint, data: *mut c_void) -> bool>;
pub type retro_video_refresh_t =
    Option<unsafe extern "C" fn(data: *const c_void, width: c_uint, height: c_uint, pitch: usize)>;
pub type retro_audio_sample_t = Option<unsafe extern "C" fn(left: i16, right: i16)>;
pub type retro_audio_sample_batch_t =
    Option<unsafe extern "C" fn(data: *const i16, frames: usize) -> usize>;
pub type retro_input_poll_t = Option<unsafe extern "C" fn()>;
pub type retro_input_state_t =
    Option<unsafe extern "C" fn(port: c_uint, device: c_uint, index: c_uint, id: c_uint) -> i16>;
pub type retro_log_printf_t = Option<unsafe extern "C" fn(level: c_uint, fmt: *const c_char, ...)>;

// Entry points exported by the core.
pub type retro_init_t = unsafe extern "C" fn();
pub type retro_deinit_t = unsafe extern "C" fn();
pub type retro_run_t = unsafe extern "C" fn();
pub type retro_reset_t = unsafe extern "C" fn();
pub type retro_load_game_t = unsafe extern "C" fn(game: *const retro_game_info) -> bool;
pub type retro_unload_game_t = unsafe extern "C" fn();
pub type retro_get_system_info_t = unsafe extern "C" fn(info: *mut retro_system_info);
pub type retro_serialize_size_t = unsafe extern "C" fn() -> usize;
pub type retro_serialize_t = unsafe extern "C" fn(data: *mut c_void, size: usize) -> bool;
pub type retro_unserialize_t = unsafe extern "C" fn(data: *const c_void, size: usize) -> bool;
pub type retro_cheat_reset_t = unsafe extern "C" fn();
pub type retro_cheat_set_t = unsafe extern "C" fn(index: c_uint, enabled: bool, code: *const c_char);

pub type retro_set_environment_t = unsafe extern "C" fn(cb: retro_environment_t);
pub type retro_set_video_refresh_t = unsafe extern "C" fn(cb: retro_video_refresh_t);
pub type retro_set_audio_sample_t = unsafe extern "C" fn(cb: retro_audio_sample_t);
pub type retro_set_audio_sample_batch_t = unsafe extern "C" fn(cb: retro_audio_sample_batch_t);
pub type retro_set_input_poll_t = unsafe extern "C" fn(cb: retro_input_poll_t);
pub type retro_set_input_state_t = unsafe extern "C" fn(cb: retro_input_state_t);

#[repr(C)]
#[derive(Debug, Clone, Copy)]
pub struct retro_game_info {
    pub path: *const c_char,
    pub data: *const c_void,
    pub size: usize,
    pub meta: *const c_char,
}

#[repr(C)]
#[derive(Debug, Clone, Copy)]
pub struct retro_system_info {
    pub library_name: *const c_char,
    pub library_version: *const c_char,
    pub valid_extensions: *const c_char,
    pub need_fullpath: bool,
    pub block_extract: bool,
}

impl Default for retro_system_info {
    fn default() -> Self {
        Self {
            library_name: std::ptr::null(),
            library_version: std::ptr::null(),
            valid_extensions: std::ptr::null(),
            need_fullpath: false,
            block_extract: false,
        }
    }
}

#[repr(C)]
#[derive(Clone, Copy, Default)]
pub struct retro_log_callback {
    pub log: retro_log_printf_t,
}
