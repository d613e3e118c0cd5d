//! Host side of a libretro frontend.
//!
//! [`Host`] owns one resident core, implements the callbacks the core calls
//! during a frame and drives it from a dedicated, frame-paced thread. Video is
//! blitted into a [`Surface`] and audio is staged and flushed into an
//! [`AudioSink`]; both are supplied by the embedding platform layer.

pub mod audio;
mod callbacks;
mod directories;
mod host;
mod runner;
mod state;
mod types;
pub mod video;

pub use audio::{AudioSink, AudioStage};
pub use host::Host;
pub use libretro_bridge::{CoreSymbols, SystemInfo, raw};
pub use types::{AUDIO_STAGE_CAPACITY, HostConfig, HostError, PixelFormat, SurfaceFormat};
pub use video::{FrameView, Surface, SurfaceBuffer};
