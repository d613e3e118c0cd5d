use std::{ffi::c_void, mem::MaybeUninit, ptr::NonNull, slice};

use jni::{JNIEnv, objects::JObject, sys::jobject};
use nova_runtime::{Surface, SurfaceBuffer, SurfaceFormat};

#[repr(C)]
pub struct ANativeWindow {
    _private: [u8; 0],
}

#[repr(C)]
#[allow(non_camel_case_types)]
struct ANativeWindow_Buffer {
    width: i32,
    height: i32,
    /// In pixels.
    stride: i32,
    format: i32,
    bits: *mut c_void,
    reserved: [u32; 6],
}

#[repr(C)]
struct ARect {
    left: i32,
    top: i32,
    right: i32,
    bottom: i32,
}

#[link(name = "android")]
unsafe extern "C" {
    fn ANativeWindow_fromSurface(env: *mut jni::sys::JNIEnv, surface: jobject)
    -> *mut ANativeWindow;
    fn ANativeWindow_release(window: *mut ANativeWindow);
    fn ANativeWindow_setBuffersGeometry(
        window: *mut ANativeWindow,
        width: i32,
        height: i32,
        format: i32,
    ) -> i32;
    fn ANativeWindow_lock(
        window: *mut ANativeWindow,
        out_buffer: *mut ANativeWindow_Buffer,
        in_out_dirty_bounds: *mut ARect,
    ) -> i32;
    fn ANativeWindow_unlockAndPost(window: *mut ANativeWindow) -> i32;
}

/// A CPU-locked `ANativeWindow` acquired from a Java `Surface`.
///
/// Holds one native reference, released on drop.
pub(crate) struct NativeWindowSurface {
    window: NonNull<ANativeWindow>,
    locked: bool,
}

// SAFETY: ANativeWindow is reference counted and may be used from any thread;
// the host serializes all access through its surface mutex.
unsafe impl Send for NativeWindowSurface {}

impl NativeWindowSurface {
    pub(crate) fn from_surface(env: &JNIEnv, surface: &JObject) -> Option<Self> {
        let window = unsafe { ANativeWindow_fromSurface(env.get_native_interface(), surface.as_raw()) };
        NonNull::new(window).map(|window| Self {
            window,
            locked: false,
        })
    }

    fn unlock(&mut self) {
        if !self.locked {
            return;
        }
        self.locked = false;
        if unsafe { ANativeWindow_unlockAndPost(self.window.as_ptr()) } != 0 {
            tracing::debug!("ANativeWindow_unlockAndPost failed");
        }
    }
}

impl Surface for NativeWindowSurface {
    fn set_geometry(&mut self, width: u32, height: u32, format: SurfaceFormat) {
        let rc = unsafe {
            ANativeWindow_setBuffersGeometry(
                self.window.as_ptr(),
                width as i32,
                height as i32,
                format as i32,
            )
        };
        if rc != 0 {
            tracing::debug!("ANativeWindow_setBuffersGeometry({width}x{height}) failed: {rc}");
        }
    }

    fn lock(&mut self) -> Option<SurfaceBuffer<'_>> {
        let mut buffer = MaybeUninit::<ANativeWindow_Buffer>::zeroed();
        let rc = unsafe {
            ANativeWindow_lock(self.window.as_ptr(), buffer.as_mut_ptr(), std::ptr::null_mut())
        };
        if rc != 0 {
            return None;
        }
        self.locked = true;
        let buffer = unsafe { buffer.assume_init() };

        let shape = (
            usize::try_from(buffer.width),
            usize::try_from(buffer.height),
            usize::try_from(buffer.stride),
            SurfaceFormat::from_raw(buffer.format),
        );
        let (Ok(width), Ok(height), Ok(stride), Some(format)) = shape else {
            tracing::debug!("unusable window buffer format {}", buffer.format);
            self.unlock();
            return None;
        };
        if buffer.bits.is_null() {
            self.unlock();
            return None;
        }

        let len = stride * height * format.bytes_per_pixel();
        Some(SurfaceBuffer {
            pixels: unsafe { slice::from_raw_parts_mut(buffer.bits as *mut u8, len) },
            width,
            height,
            stride,
            format,
        })
    }

    fn unlock_and_post(&mut self) {
        self.unlock();
    }
}

impl Drop for NativeWindowSurface {
    fn drop(&mut self) {
        self.unlock();
        unsafe { ANativeWindow_release(self.window.as_ptr()) };
    }
}
