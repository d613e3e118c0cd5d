use crate::types::{PixelFormat, SurfaceFormat};

/// A presentation target the video callback blits into.
///
/// Mirrors the `ANativeWindow` protocol: configure the buffer geometry, lock
/// a CPU-visible buffer, write it and post it.
pub trait Surface: Send {
    fn set_geometry(&mut self, width: u32, height: u32, format: SurfaceFormat);

    /// Returns `None` when no buffer can be locked; the frame is then dropped.
    fn lock(&mut self) -> Option<SurfaceBuffer<'_>>;

    fn unlock_and_post(&mut self);
}

/// A locked surface buffer. `stride` is in pixels.
pub struct SurfaceBuffer<'a> {
    pub pixels: &'a mut [u8],
    pub width: usize,
    pub height: usize,
    pub stride: usize,
    pub format: SurfaceFormat,
}

/// One frame as handed over by `retro_video_refresh`. `pitch` is in bytes.
#[derive(Clone, Copy)]
pub struct FrameView<'a> {
    pub data: &'a [u8],
    pub width: usize,
    pub height: usize,
    pub pitch: usize,
    pub format: PixelFormat,
}

impl FrameView<'_> {
    /// Bytes the core must have provided for a frame of this shape.
    pub fn required_len(width: usize, height: usize, pitch: usize, format: PixelFormat) -> usize {
        match height {
            0 => 0,
            _ => pitch * (height - 1) + width * format.bytes_per_pixel(),
        }
    }
}

#[inline]
pub fn xrgb8888_to_rgba8888(pixel: u32) -> u32 {
    0xFF00_0000 | ((pixel & 0xFF) << 16) | (pixel & 0xFF00) | ((pixel >> 16) & 0xFF)
}

/// Repacks 0RGB1555 into RGB565, widening green to six bits.
#[inline]
pub fn zrgb1555_to_rgb565(pixel: u16) -> u16 {
    let r = (pixel >> 10) & 0x1F;
    let g = (pixel >> 5) & 0x1F;
    let b = pixel & 0x1F;
    let g6 = (g << 1) | (g >> 4);
    (r << 11) | (g6 << 5) | b
}

/// Converts `frame` into `dst`, clipped to the locked buffer.
///
/// Returns the number of rows written. Nothing is written when the buffer's
/// format does not match what `frame.format` presents as.
pub fn blit(frame: &FrameView<'_>, dst: &mut SurfaceBuffer<'_>) -> usize {
    if dst.format != frame.format.surface_format() {
        return 0;
    }

    let src_bpp = frame.format.bytes_per_pixel();
    let dst_bpp = dst.format.bytes_per_pixel();
    let rows = frame.height.min(dst.height);
    let cols = frame.width.min(dst.width).min(dst.stride);
    let dst_pitch = dst.stride * dst_bpp;

    let mut written = 0;
    for y in 0..rows {
        let src_start = y * frame.pitch;
        let dst_start = y * dst_pitch;
        let (Some(src), Some(out)) = (
            frame.data.get(src_start..src_start + cols * src_bpp),
            dst.pixels.get_mut(dst_start..dst_start + cols * dst_bpp),
        ) else {
            break;
        };

        match frame.format {
            PixelFormat::Xrgb8888 => {
                for (s, d) in src.chunks_exact(4).zip(out.chunks_exact_mut(4)) {
                    let pixel = u32::from_ne_bytes([s[0], s[1], s[2], s[3]]);
                    d.copy_from_slice(&xrgb8888_to_rgba8888(pixel).to_ne_bytes());
                }
            }
            PixelFormat::Zrgb1555 => {
                for (s, d) in src.chunks_exact(2).zip(out.chunks_exact_mut(2)) {
                    let pixel = u16::from_ne_bytes([s[0], s[1]]);
                    d.copy_from_slice(&zrgb1555_to_rgb565(pixel).to_ne_bytes());
                }
            }
            PixelFormat::Rgb565 => out.copy_from_slice(src),
        }
        written += 1;
    }
    written
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn rgba_at(pixels: &[u8], index: usize) -> u32 {
        let p = &pixels[index * 4..index * 4 + 4];
        u32::from_ne_bytes([p[0], p[1], p[2], p[3]])
    }

    fn rgb565_at(pixels: &[u8], index: usize) -> u16 {
        u16::from_ne_bytes([pixels[index * 2], pixels[index * 2 + 1]])
    }

    #[test]
    fn zrgb1555_green_keeps_six_bits() {
        assert_eq!(zrgb1555_to_rgb565(0x7FFF), 0xFFFF);
        assert_eq!(zrgb1555_to_rgb565(0x0000), 0x0000);
        // Pure green, 5-bit max -> 6-bit max.
        assert_eq!(zrgb1555_to_rgb565(0x1F << 5), 0x3F << 5);
        // Green 0b10000 -> 0b100001.
        assert_eq!(zrgb1555_to_rgb565(0x10 << 5), 0x21 << 5);
        assert_eq!(zrgb1555_to_rgb565(0x1F << 10), 0x1F << 11);
        assert_eq!(zrgb1555_to_rgb565(0x1F), 0x1F);
    }

    #[test]
    fn rgb565_honours_pitch_and_stride() {
        // 3x2 source with 2 pixels of row padding.
        let mut src = Vec::new();
        for y in 0..2u16 {
            for x in 0..5u16 {
                src.extend_from_slice(&(y * 100 + x).to_ne_bytes());
            }
        }
        let frame = FrameView {
            data: &src,
            width: 3,
            height: 2,
            pitch: 10,
            format: PixelFormat::Rgb565,
        };

        let mut pixels = vec![0xAAu8; 8 * 2 * 2];
        let mut dst = SurfaceBuffer {
            pixels: &mut pixels,
            width: 3,
            height: 2,
            stride: 8,
            format: SurfaceFormat::Rgb565,
        };
        assert_eq!(blit(&frame, &mut dst), 2);

        for x in 0..3 {
            assert_eq!(rgb565_at(&pixels, x), x as u16);
            assert_eq!(rgb565_at(&pixels, 8 + x), 100 + x as u16);
        }
        // Stride padding untouched.
        assert_eq!(rgb565_at(&pixels, 3), 0xAAAA);
        assert_eq!(rgb565_at(&pixels, 15), 0xAAAA);
    }

    #[test]
    fn mismatched_buffer_format_is_skipped() {
        let src = [0u8; 16];
        let frame = FrameView {
            data: &src,
            width: 2,
            height: 2,
            pitch: 8,
            format: PixelFormat::Xrgb8888,
        };
        let mut pixels = vec![0u8; 8];
        let mut dst = SurfaceBuffer {
            pixels: &mut pixels,
            width: 2,
            height: 2,
            stride: 2,
            format: SurfaceFormat::Rgb565,
        };
        assert_eq!(blit(&frame, &mut dst), 0);
        assert!(pixels.iter().all(|&b| b == 0));
    }

    #[test]
    fn oversized_frame_is_clipped() {
        let src = vec![0xFFu8; 64 * 64 * 2];
        let frame = FrameView {
            data: &src,
            width: 64,
            height: 64,
            pitch: 128,
            format: PixelFormat::Rgb565,
        };
        // Guard bytes after the buffer must stay untouched.
        let mut backing = vec![0u8; 16 * 8 * 2 + 32];
        let (buffer, guard) = backing.split_at_mut(16 * 8 * 2);
        let mut dst = SurfaceBuffer {
            pixels: buffer,
            width: 16,
            height: 8,
            stride: 16,
            format: SurfaceFormat::Rgb565,
        };
        assert_eq!(blit(&frame, &mut dst), 8);
        assert!(guard.iter().all(|&b| b == 0));
        assert!(backing[..16 * 8 * 2].iter().all(|&b| b == 0xFF));
    }

    proptest! {
        #[test]
        fn xrgb8888_sets_alpha_and_swaps_red_blue(
            width in 1usize..24,
            height in 1usize..24,
            pad in 0usize..4,
            seed in any::<u32>(),
        ) {
            let pitch = (width + pad) * 4;
            let source: Vec<u32> = (0..(width + pad) * height)
                .map(|i| seed.wrapping_mul(2_654_435_761).wrapping_add(i as u32 * 40_503))
                .collect();
            let bytes: Vec<u8> = source.iter().flat_map(|p| p.to_ne_bytes()).collect();
            let frame = FrameView {
                data: &bytes,
                width,
                height,
                pitch,
                format: PixelFormat::Xrgb8888,
            };

            let stride = width + 3;
            let mut pixels = vec![0u8; stride * height * 4];
            let mut dst = SurfaceBuffer {
                pixels: &mut pixels,
                width,
                height,
                stride,
                format: SurfaceFormat::Rgba8888,
            };
            prop_assert_eq!(blit(&frame, &mut dst), height);

            for y in 0..height {
                for x in 0..width {
                    let p = source[y * (width + pad) + x];
                    let out = rgba_at(&pixels, y * stride + x);
                    prop_assert_eq!(out >> 24, 0xFF);
                    prop_assert_eq!(out & 0xFF, (p >> 16) & 0xFF);
                    prop_assert_eq!((out >> 8) & 0xFF, (p >> 8) & 0xFF);
                    prop_assert_eq!((out >> 16) & 0xFF, p & 0xFF);
                }
            }
        }

        #[test]
        fn blit_stays_inside_locked_buffer(
            width in 1usize..48,
            height in 1usize..48,
            dst_width in 1usize..32,
            dst_height in 1usize..32,
            extra_stride in 0usize..4,
            format in prop_oneof![
                Just(PixelFormat::Rgb565),
                Just(PixelFormat::Zrgb1555),
                Just(PixelFormat::Xrgb8888),
            ],
        ) {
            let bpp = format.bytes_per_pixel();
            let src = vec![0x5Au8; width * height * bpp];
            let frame = FrameView { data: &src, width, height, pitch: width * bpp, format };

            let surface_format = format.surface_format();
            let stride = dst_width + extra_stride;
            let len = stride * dst_height * surface_format.bytes_per_pixel();
            let mut backing = vec![0u8; len + 64];
            let (buffer, guard) = backing.split_at_mut(len);
            let mut dst = SurfaceBuffer {
                pixels: buffer,
                width: dst_width,
                height: dst_height,
                stride,
                format: surface_format,
            };

            prop_assert_eq!(blit(&frame, &mut dst), height.min(dst_height));
            prop_assert!(guard.iter().all(|&b| b == 0));
        }
    }
}
