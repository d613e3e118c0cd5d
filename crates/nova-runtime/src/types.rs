use std::{io, path::PathBuf, time::Duration};

use libretro_bridge::{CoreLoadError, raw};

/// Interleaved i16 capacity of the audio stage (4096 stereo frames).
pub const AUDIO_STAGE_CAPACITY: usize = 8192;

pub(crate) const FRAME_PERIOD: Duration = Duration::from_micros(16_667);
pub(crate) const PAUSE_POLL: Duration = Duration::from_millis(16);
pub(crate) const DEFAULT_AUDIO_TARGET: usize = 4096;
pub(crate) const NATIVE_FPS: u32 = 60;

/// Tunables of a [`Host`](crate::Host).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HostConfig {
    /// Target spacing between two `retro_run` calls.
    pub frame_period: Duration,
    /// Sleep between checks while paused.
    pub pause_poll: Duration,
    /// Audio target in samples; the stage flushes at half of it.
    pub audio_target: usize,
    /// Value reported to the managed layer as the native frame rate.
    pub native_fps: u32,
}

impl Default for HostConfig {
    fn default() -> Self {
        Self {
            frame_period: FRAME_PERIOD,
            pause_poll: PAUSE_POLL,
            audio_target: DEFAULT_AUDIO_TARGET,
            native_fps: NATIVE_FPS,
        }
    }
}

impl HostConfig {
    /// Stage cursor at which staged samples are flushed mid-frame.
    pub fn flush_threshold(&self) -> usize {
        (self.audio_target / 2).clamp(1, AUDIO_STAGE_CAPACITY)
    }
}

/// Pixel layout a core renders in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum PixelFormat {
    Zrgb1555,
    Xrgb8888,
    #[default]
    Rgb565,
}

impl PixelFormat {
    pub fn from_raw(value: u32) -> Option<Self> {
        match value {
            raw::RETRO_PIXEL_FORMAT_0RGB1555 => Some(Self::Zrgb1555),
            raw::RETRO_PIXEL_FORMAT_XRGB8888 => Some(Self::Xrgb8888),
            raw::RETRO_PIXEL_FORMAT_RGB565 => Some(Self::Rgb565),
            _ => None,
        }
    }

    pub fn to_raw(self) -> u32 {
        match self {
            Self::Zrgb1555 => raw::RETRO_PIXEL_FORMAT_0RGB1555,
            Self::Xrgb8888 => raw::RETRO_PIXEL_FORMAT_XRGB8888,
            Self::Rgb565 => raw::RETRO_PIXEL_FORMAT_RGB565,
        }
    }

    #[inline]
    pub fn bytes_per_pixel(self) -> usize {
        match self {
            Self::Xrgb8888 => 4,
            Self::Zrgb1555 | Self::Rgb565 => 2,
        }
    }

    /// Surface format frames of this layout are presented in.
    #[inline]
    pub fn surface_format(self) -> SurfaceFormat {
        match self {
            Self::Xrgb8888 => SurfaceFormat::Rgba8888,
            Self::Zrgb1555 | Self::Rgb565 => SurfaceFormat::Rgb565,
        }
    }
}

/// Buffer formats a surface is configured with. Discriminants match the
/// `WINDOW_FORMAT_*` values of `ANativeWindow`.
#[repr(i32)]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SurfaceFormat {
    Rgba8888 = 1,
    Rgb565 = 4,
}

impl SurfaceFormat {
    pub fn from_raw(value: i32) -> Option<Self> {
        match value {
            1 => Some(Self::Rgba8888),
            4 => Some(Self::Rgb565),
            _ => None,
        }
    }

    #[inline]
    pub fn bytes_per_pixel(self) -> usize {
        match self {
            Self::Rgba8888 => 4,
            Self::Rgb565 => 2,
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum HostError {
    #[error("no core is loaded")]
    NoCore,
    #[error(transparent)]
    CoreLoad(#[from] CoreLoadError),
    #[error("path is not a valid C string: {0}")]
    InvalidPath(PathBuf),
    #[error("cheat code contains an interior NUL byte")]
    InvalidCheat,
    #[error("core rejected content {0}")]
    ContentRejected(PathBuf),
    #[error("core does not support save states")]
    SaveStateUnsupported,
    #[error("core failed to {op} state")]
    SaveStateRejected { op: &'static str },
    #[error("save state I/O failed for {path}: {source}")]
    StateIo {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("failed to spawn emulation thread: {0}")]
    ThreadSpawn(#[source] io::Error),
}
