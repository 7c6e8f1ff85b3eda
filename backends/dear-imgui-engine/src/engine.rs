//! The host engine as seen by this crate
//!
//! Any engine (or a test fake) plugs in by implementing these traits. An engine texture
//! is identified by its address together with its GL name, so a borrowed texture must
//! stay at the same place in memory for as long as a GUI texture refers to it.

use std::num::NonZeroU32;

use crate::color::{Color, EngineColorFormat};
use crate::driver::DriverKind;
use crate::error::{DriverError, DriverResult};

/// The engine's video device: screen, clock and the graphics API it renders with
pub trait EngineDevice {
    /// Which driver should render the GUI for this device
    fn driver_kind(&self) -> DriverKind;

    /// Current render target size in pixels
    fn screen_size(&self) -> [u32; 2];

    /// Monotonic engine time in milliseconds
    fn time_ms(&self) -> u32;
}

/// A texture living in the engine
pub trait EngineTexture {
    /// Size in pixels
    fn size(&self) -> [u32; 2];

    /// Bytes between the start of two consecutive rows
    fn pitch(&self) -> usize;

    fn color_format(&self) -> EngineColorFormat;

    /// Map the texture memory for reading.
    ///
    /// Every successful call is paired with exactly one [`EngineTexture::unlock`].
    fn lock(&self) -> Option<&[u8]>;

    fn unlock(&self);

    /// The OpenGL texture name backing this texture, if the engine renders with OpenGL
    fn native_handle(&self) -> Option<NonZeroU32> {
        None
    }
}

/// A CPU-side image living in the engine
pub trait EngineImage {
    /// Width and height in pixels
    fn dimension(&self) -> [u32; 2];

    /// Color of the pixel at `(x, y)`
    fn pixel(&self, x: u32, y: u32) -> Color;
}

/// Locked view of an [`EngineTexture`]; unlocks on drop
pub struct TextureLock<'a> {
    texture: &'a dyn EngineTexture,
    pixels: &'a [u8],
}

impl<'a> TextureLock<'a> {
    /// Lock `texture` and check that the mapped memory holds every row.
    ///
    /// Fails if the engine refuses the lock, reports a pitch shorter than a row of
    /// pixels, or maps fewer bytes than `(height - 1) * pitch + row` needs.
    pub fn new(texture: &'a dyn EngineTexture) -> DriverResult<Self> {
        let [width, height] = texture.size();
        let pitch = texture.pitch();
        let row_len = width as usize * texture.color_format().bytes_per_pixel();
        if pitch < row_len {
            tracing::warn!("Engine texture pitch {pitch} is shorter than its {row_len}-byte rows");
            return Err(DriverError::MissingTextureData(format!(
                "pitch {pitch} is shorter than a {row_len}-byte row"
            )));
        }

        let pixels = texture.lock().ok_or_else(|| {
            tracing::warn!("Engine texture could not be locked");
            DriverError::MissingTextureData("engine texture could not be locked".to_string())
        })?;
        let needed = match height as usize {
            0 => 0,
            rows => (rows - 1) * pitch + row_len,
        };
        if pixels.len() < needed {
            tracing::warn!(
                "Locked texture memory is {} bytes, expected at least {needed}",
                pixels.len()
            );
            texture.unlock();
            return Err(DriverError::MissingTextureData(format!(
                "locked texture memory is {} bytes, expected {needed}",
                pixels.len()
            )));
        }
        Ok(Self { texture, pixels })
    }

    pub fn pixels(&self) -> &[u8] {
        self.pixels
    }

    pub fn size(&self) -> [u32; 2] {
        self.texture.size()
    }

    pub fn pitch(&self) -> usize {
        self.texture.pitch()
    }

    pub fn format(&self) -> EngineColorFormat {
        self.texture.color_format()
    }
}

impl Drop for TextureLock<'_> {
    fn drop(&mut self) {
        self.texture.unlock();
    }
}

/// Address of an engine object, used as its identity
pub(crate) fn identity<T: ?Sized>(object: &T) -> usize {
    object as *const T as *const () as usize
}
