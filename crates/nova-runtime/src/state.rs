use std::sync::atomic::{AtomicBool, AtomicU16, AtomicU32, AtomicU64, Ordering};

use crate::types::PixelFormat;

/// Number of joypad buttons tracked in the input bitmap.
pub(crate) const JOYPAD_BUTTONS: u32 = 16;

/// Run flags, input bitmap and pixel format. Every field is written from one
/// side of the FFI boundary and read from the other, so relaxed ordering is
/// enough; the join in `Host::stop` provides the only required happens-before.
pub(crate) struct HostState {
    pub(crate) running: AtomicBool,
    pub(crate) paused: AtomicBool,
    pub(crate) fast_forward: AtomicBool,
    input: AtomicU16,
    pixel_format: AtomicU32,
    pub(crate) frame_seq: AtomicU64,
}

impl HostState {
    pub(crate) fn new() -> Self {
        Self {
            running: AtomicBool::new(false),
            paused: AtomicBool::new(false),
            fast_forward: AtomicBool::new(false),
            input: AtomicU16::new(0),
            pixel_format: AtomicU32::new(PixelFormat::Rgb565.to_raw()),
            frame_seq: AtomicU64::new(0),
        }
    }

    #[inline]
    pub(crate) fn is_running(&self) -> bool {
        self.running.load(Ordering::Relaxed)
    }

    #[inline]
    pub(crate) fn is_paused(&self) -> bool {
        self.paused.load(Ordering::Relaxed)
    }

    #[inline]
    pub(crate) fn is_fast_forward(&self) -> bool {
        self.fast_forward.load(Ordering::Relaxed)
    }

    /// Sets or clears the bit for `id`; ids outside the joypad range are ignored.
    pub(crate) fn set_button(&self, id: u32, pressed: bool) {
        if id >= JOYPAD_BUTTONS {
            return;
        }
        let bit = 1u16 << id;
        if pressed {
            self.input.fetch_or(bit, Ordering::Relaxed);
        } else {
            self.input.fetch_and(!bit, Ordering::Relaxed);
        }
    }

    pub(crate) fn button(&self, id: u32) -> bool {
        id < JOYPAD_BUTTONS && self.input.load(Ordering::Relaxed) & (1 << id) != 0
    }

    pub(crate) fn input_bits(&self) -> u16 {
        self.input.load(Ordering::Relaxed)
    }

    pub(crate) fn pixel_format(&self) -> PixelFormat {
        PixelFormat::from_raw(self.pixel_format.load(Ordering::Relaxed)).unwrap_or_default()
    }

    pub(crate) fn set_pixel_format(&self, format: PixelFormat) {
        self.pixel_format.store(format.to_raw(), Ordering::Relaxed);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn out_of_range_ids_are_ignored() {
        let state = HostState::new();
        state.set_button(16, true);
        state.set_button(u32::MAX, true);
        assert_eq!(state.input_bits(), 0);
        assert!(!state.button(16));
    }

    #[test]
    fn pixel_format_defaults_to_rgb565() {
        let state = HostState::new();
        assert_eq!(state.pixel_format(), PixelFormat::Rgb565);
        state.set_pixel_format(PixelFormat::Xrgb8888);
        assert_eq!(state.pixel_format(), PixelFormat::Xrgb8888);
    }

    proptest! {
        #[test]
        fn buttons_are_independent(
            initial in any::<u16>(),
            id in 0u32..16,
            pressed in any::<bool>(),
        ) {
            let state = HostState::new();
            for bit in 0..16 {
                state.set_button(bit, initial & (1 << bit) != 0);
            }

            state.set_button(id, pressed);

            prop_assert_eq!(state.button(id), pressed);
            for other in (0..16).filter(|&other| other != id) {
                prop_assert_eq!(state.button(other), initial & (1 << other) != 0);
            }
        }
    }
}
