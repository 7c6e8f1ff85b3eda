//! Pixel formats and conversion into the byte order OpenGL expects
//!
//! The engine stores 32-bit colors as `0xAARRGGBB` words in native (little-endian)
//! order, i.e. `[B, G, R, A]` in memory. OpenGL's `RGBA`/`UNSIGNED_BYTE` upload wants
//! `[R, G, B, A]`. Everything in this module is pure so it can be tested without a
//! graphics context.

use crate::engine::{EngineImage, TextureLock};

/// Pixel layout of a raw buffer handed to
/// [`GuiDriver::create_texture_from_raw`](crate::GuiDriver::create_texture_from_raw)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ColorFormat {
    /// 32-bit engine color, `0xAARRGGBB` words (converted per pixel before upload)
    A8R8G8B8,
    /// 32-bit `[R, G, B, A]` bytes (uploaded as-is)
    R8G8B8A8,
    /// 8-bit alpha only (uploaded as a single channel)
    A8,
}

impl ColorFormat {
    /// Stable numeric code of this format
    pub const fn code(self) -> u32 {
        match self {
            ColorFormat::A8R8G8B8 => 0,
            ColorFormat::R8G8B8A8 => 1,
            ColorFormat::A8 => 2,
        }
    }

    /// Map a numeric code back to a format.
    ///
    /// Unknown codes are a programming error: they fail a debug assertion and
    /// degrade to [`ColorFormat::A8`] in release builds.
    pub fn from_code(code: u32) -> Self {
        match code {
            0 => ColorFormat::A8R8G8B8,
            1 => ColorFormat::R8G8B8A8,
            2 => ColorFormat::A8,
            unknown => {
                tracing::error!("Unknown color format: {unknown}");
                debug_assert!(false, "unknown color format code {unknown}");
                ColorFormat::A8
            }
        }
    }

    /// Bytes per pixel of a buffer in this format
    pub const fn bytes_per_pixel(self) -> usize {
        match self {
            ColorFormat::A8R8G8B8 | ColorFormat::R8G8B8A8 => 4,
            ColorFormat::A8 => 1,
        }
    }
}

/// Pixel layout of an engine texture's locked memory
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EngineColorFormat {
    /// 16 bit: 1 alpha bit, 5 bits per color channel
    A1R5G5B5,
    /// 16 bit: 5 bits red, 6 bits green, 5 bits blue
    R5G6B5,
    /// 24 bit: `[R, G, B]` bytes
    R8G8B8,
    /// 32 bit: `0xAARRGGBB` words
    A8R8G8B8,
}

impl EngineColorFormat {
    /// Bits used by one pixel
    pub const fn bits_per_pixel(self) -> u32 {
        match self {
            EngineColorFormat::A1R5G5B5 | EngineColorFormat::R5G6B5 => 16,
            EngineColorFormat::R8G8B8 => 24,
            EngineColorFormat::A8R8G8B8 => 32,
        }
    }

    /// Bytes used by one pixel
    pub const fn bytes_per_pixel(self) -> usize {
        (self.bits_per_pixel() / 8) as usize
    }
}

/// A 32-bit engine color stored as `0xAARRGGBB`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct Color(pub u32);

impl Color {
    /// Build a color from its channels
    pub const fn from_argb(a: u8, r: u8, g: u8, b: u8) -> Self {
        Color((a as u32) << 24 | (r as u32) << 16 | (g as u32) << 8 | b as u32)
    }

    pub const fn alpha(self) -> u8 {
        (self.0 >> 24) as u8
    }

    pub const fn red(self) -> u8 {
        (self.0 >> 16) as u8
    }

    pub const fn green(self) -> u8 {
        (self.0 >> 8) as u8
    }

    pub const fn blue(self) -> u8 {
        self.0 as u8
    }

    /// Decode one pixel of `format` starting at `bytes[0]`
    ///
    /// `bytes` must hold at least [`EngineColorFormat::bytes_per_pixel`] bytes.
    pub fn from_engine_pixel(bytes: &[u8], format: EngineColorFormat) -> Self {
        match format {
            EngineColorFormat::A1R5G5B5 => {
                let v = u16::from_le_bytes([bytes[0], bytes[1]]);
                let a = if v & 0x8000 != 0 { 0xFF } else { 0x00 };
                Color::from_argb(
                    a,
                    expand5((v >> 10) & 0x1F),
                    expand5((v >> 5) & 0x1F),
                    expand5(v & 0x1F),
                )
            }
            EngineColorFormat::R5G6B5 => {
                let v = u16::from_le_bytes([bytes[0], bytes[1]]);
                Color::from_argb(
                    0xFF,
                    expand5((v >> 11) & 0x1F),
                    expand6((v >> 5) & 0x3F),
                    expand5(v & 0x1F),
                )
            }
            EngineColorFormat::R8G8B8 => Color::from_argb(0xFF, bytes[0], bytes[1], bytes[2]),
            EngineColorFormat::A8R8G8B8 => {
                Color(u32::from_le_bytes([bytes[0], bytes[1], bytes[2], bytes[3]]))
            }
        }
    }

    /// Bytes in OpenGL `RGBA` order
    pub const fn to_rgba(self) -> [u8; 4] {
        [self.red(), self.green(), self.blue(), self.alpha()]
    }

    /// Inverse of [`Color::to_rgba`]
    pub const fn from_rgba(rgba: [u8; 4]) -> Self {
        Color::from_argb(rgba[3], rgba[0], rgba[1], rgba[2])
    }
}

#[inline]
fn expand5(v: u16) -> u8 {
    ((v << 3) | (v >> 2)) as u8
}

#[inline]
fn expand6(v: u16) -> u8 {
    ((v << 2) | (v >> 4)) as u8
}

/// Reorder a tightly packed `A8R8G8B8` buffer into `RGBA` bytes
pub fn argb_to_rgba(src: &[u8], width: u32, height: u32) -> Vec<u8> {
    let len = width as usize * height as usize * 4;
    src[..len]
        .chunks_exact(4)
        .flat_map(|px| Color::from_engine_pixel(px, EngineColorFormat::A8R8G8B8).to_rgba())
        .collect()
}

/// Reorder `RGBA` bytes back into an `A8R8G8B8` buffer
pub fn rgba_to_argb(src: &[u8]) -> Vec<u8> {
    src.chunks_exact(4)
        .flat_map(|px| Color::from_rgba([px[0], px[1], px[2], px[3]]).0.to_le_bytes())
        .collect()
}

/// Convert pitched engine texture memory into tightly packed `RGBA` bytes
///
/// Rows start every `pitch` bytes; only the first `width * bytes_per_pixel` bytes of a
/// row hold pixels.
pub fn pitched_to_rgba(
    data: &[u8],
    width: u32,
    height: u32,
    pitch: usize,
    format: EngineColorFormat,
) -> Vec<u8> {
    let bpp = format.bytes_per_pixel();
    let row_len = width as usize * bpp;
    let mut out = Vec::with_capacity(width as usize * height as usize * 4);
    for y in 0..height as usize {
        let row = &data[y * pitch..y * pitch + row_len];
        for px in row.chunks_exact(bpp) {
            out.extend_from_slice(&Color::from_engine_pixel(px, format).to_rgba());
        }
    }
    out
}

/// Read a locked engine texture into `RGBA` bytes
pub(crate) fn locked_texture_to_rgba(lock: &TextureLock<'_>) -> Vec<u8> {
    let [width, height] = lock.size();
    pitched_to_rgba(lock.pixels(), width, height, lock.pitch(), lock.format())
}

/// Read an engine image pixel by pixel into `RGBA` bytes
pub fn image_to_rgba(image: &dyn EngineImage) -> Vec<u8> {
    let [width, height] = image.dimension();
    let mut out = Vec::with_capacity(width as usize * height as usize * 4);
    for y in 0..height {
        for x in 0..width {
            out.extend_from_slice(&image.pixel(x, y).to_rgba());
        }
    }
    out
}
