//! GUI textures and their lifecycle
//!
//! A [`GuiTexture`] remembers where its pixels came from and who owns the GPU memory.
//! Owned copies are re-uploaded on every update so in-place edits show up; a borrowed
//! engine texture is only rebuilt when it points somewhere else. Deletion never frees
//! a texture the engine still uses. Both drivers share the lifecycle implemented by
//! [`TextureRegistry`]; they only differ in the [`TextureUploader`] doing the GPU work.

use std::borrow::Cow;
use std::collections::HashMap;
use std::num::NonZeroU32;

use dear_imgui_rs::TextureId;

use crate::color::ColorFormat;
use crate::error::DriverResult;

/// Name of a GPU texture object
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct GpuTexture(pub NonZeroU32);

impl GpuTexture {
    /// Placeholder used by drivers that never touch the GPU
    pub const PLACEHOLDER: GpuTexture = GpuTexture(NonZeroU32::MIN);

    pub fn get(self) -> u32 {
        self.0.get()
    }
}

/// Where the pixels of a texture came from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TextureSource {
    /// Caller-provided buffer, identified by its address
    Raw { address: usize, format: ColorFormat },
    /// Engine texture, identified by its address and the GL texture backing it
    EngineTexture {
        address: usize,
        native: Option<NonZeroU32>,
    },
    /// Engine image, identified by its address
    EngineImage(usize),
    /// Dear ImGui's font atlas
    FontAtlas,
}

impl TextureSource {
    pub(crate) fn raw(pixels: &[u8], format: ColorFormat) -> Self {
        TextureSource::Raw {
            address: pixels.as_ptr() as usize,
            format,
        }
    }
}

/// Who frees the GPU memory of a texture
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TextureOwnership {
    /// Allocated here, freed on delete
    Owned,
    /// Owned by the engine, never freed here
    Borrowed,
}

/// Ownership used for textures created from engine textures
#[cfg(feature = "borrow-engine-textures")]
pub const ENGINE_TEXTURE_OWNERSHIP: TextureOwnership = TextureOwnership::Borrowed;
/// Ownership used for textures created from engine textures
#[cfg(not(feature = "borrow-engine-textures"))]
pub const ENGINE_TEXTURE_OWNERSHIP: TextureOwnership = TextureOwnership::Owned;

/// A texture known to Dear ImGui
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GuiTexture {
    pub gpu: GpuTexture,
    pub source: TextureSource,
    pub ownership: TextureOwnership,
}

impl GuiTexture {
    pub fn new(gpu: GpuTexture, source: TextureSource, ownership: TextureOwnership) -> Self {
        Self {
            gpu,
            source,
            ownership,
        }
    }

    /// Whether updating from `source` with `ownership` has to rebuild the GPU texture
    ///
    /// A copy may be stale whatever its source, so only a borrowed texture that keeps
    /// borrowing the same engine texture is reused.
    pub fn needs_recreate(&self, source: TextureSource, ownership: TextureOwnership) -> bool {
        self.ownership == TextureOwnership::Owned
            || ownership == TextureOwnership::Owned
            || self.source != source
    }
}

/// Pixel layout handed to the GPU
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UploadFormat {
    /// 4 bytes per pixel, `[R, G, B, A]`
    Rgba,
    /// 1 byte per pixel, alpha only
    Alpha,
}

impl UploadFormat {
    pub fn bytes_per_pixel(self) -> usize {
        match self {
            UploadFormat::Rgba => 4,
            UploadFormat::Alpha => 1,
        }
    }
}

/// Pixels ready for upload
#[derive(Debug, Clone)]
pub struct UploadRequest<'a> {
    pub format: UploadFormat,
    pub width: u32,
    pub height: u32,
    pub pixels: Cow<'a, [u8]>,
}

/// What a new GPU texture is built from
#[derive(Debug, Clone)]
pub enum TextureContent<'a> {
    /// Copy these pixels into a new texture
    Upload(UploadRequest<'a>),
    /// Reuse a texture owned by the engine
    Borrow(GpuTexture),
}

impl TextureContent<'_> {
    fn ownership(&self) -> TextureOwnership {
        match self {
            TextureContent::Upload(_) => TextureOwnership::Owned,
            TextureContent::Borrow(_) => TextureOwnership::Borrowed,
        }
    }
}

/// GPU side of texture management
pub trait TextureUploader {
    /// Allocate a texture and fill it with `request`
    fn upload(&mut self, request: &UploadRequest<'_>) -> DriverResult<GpuTexture>;

    /// Free a texture allocated by [`TextureUploader::upload`]
    fn release(&mut self, texture: GpuTexture);
}

/// Maps Dear ImGui texture ids to GUI textures
#[derive(Debug)]
pub struct TextureRegistry {
    textures: HashMap<TextureId, GuiTexture>,
    next_id: u64,
}

impl Default for TextureRegistry {
    fn default() -> Self {
        Self {
            textures: HashMap::new(),
            next_id: 1,
        }
    }
}

impl TextureRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of live textures
    pub fn len(&self) -> usize {
        self.textures.len()
    }

    pub fn is_empty(&self) -> bool {
        self.textures.is_empty()
    }

    pub fn get(&self, id: TextureId) -> Option<&GuiTexture> {
        self.textures.get(&id)
    }

    /// GPU texture to bind for `id`.
    ///
    /// Unknown ids are a programming error: debug builds assert, release builds get
    /// `None` and skip the draw.
    pub fn resolve(&self, id: TextureId) -> Option<GpuTexture> {
        let texture = self.get(id).map(|texture| texture.gpu);
        if texture.is_none() {
            tracing::error!("Draw command uses unknown texture {:?}", id);
            debug_assert!(false, "unknown or deleted texture {id:?}");
        }
        texture
    }

    fn allocate_id(&mut self) -> TextureId {
        let id = TextureId::new(self.next_id);
        self.next_id += 1;
        id
    }

    /// Build a GPU texture from `content` and register it
    pub fn create(
        &mut self,
        uploader: &mut dyn TextureUploader,
        source: TextureSource,
        content: TextureContent<'_>,
    ) -> DriverResult<TextureId> {
        let texture = materialize(uploader, source, content)?;
        let id = self.allocate_id();
        tracing::debug!(
            "Created texture {:?} (gpu {}, {:?}, {:?})",
            id,
            texture.gpu.get(),
            texture.source,
            texture.ownership
        );
        self.textures.insert(id, texture);
        Ok(id)
    }

    /// Point `id` at new content. `content` is only evaluated when
    /// [`GuiTexture::needs_recreate`] asks for a rebuild.
    pub fn update<'a>(
        &mut self,
        uploader: &mut dyn TextureUploader,
        id: TextureId,
        source: TextureSource,
        ownership: TextureOwnership,
        content: impl FnOnce() -> DriverResult<TextureContent<'a>>,
    ) -> DriverResult<()> {
        let Some(current) = self.get(id) else {
            tracing::error!("Update of unknown texture {:?}", id);
            debug_assert!(false, "update of unknown or deleted texture {id:?}");
            return Ok(());
        };

        if !current.needs_recreate(source, ownership) {
            tracing::debug!("Texture {:?} unchanged, reusing gpu {}", id, current.gpu.get());
            return Ok(());
        }

        let texture = materialize(uploader, source, content()?)?;
        if let Some(old) = self.textures.insert(id, texture) {
            release(uploader, &old);
        }
        tracing::debug!("Recreated texture {:?} from {:?}", id, source);
        Ok(())
    }

    /// Free the GPU memory of `id` if it is owned and forget it
    pub fn delete(&mut self, uploader: &mut dyn TextureUploader, id: TextureId) {
        match self.textures.remove(&id) {
            Some(texture) => {
                release(uploader, &texture);
                tracing::debug!("Deleted texture {:?}", id);
            }
            None => {
                tracing::error!("Delete of unknown texture {:?}", id);
                debug_assert!(false, "delete of unknown or deleted texture {id:?}");
            }
        }
    }

    /// Free every owned texture and forget all ids
    pub fn clear(&mut self, uploader: &mut dyn TextureUploader) {
        for (_, texture) in self.textures.drain() {
            release(uploader, &texture);
        }
    }
}

fn materialize(
    uploader: &mut dyn TextureUploader,
    source: TextureSource,
    content: TextureContent<'_>,
) -> DriverResult<GuiTexture> {
    let ownership = content.ownership();
    let gpu = match content {
        TextureContent::Upload(request) => uploader.upload(&request)?,
        TextureContent::Borrow(gpu) => gpu,
    };
    Ok(GuiTexture::new(gpu, source, ownership))
}

fn release(uploader: &mut dyn TextureUploader, texture: &GuiTexture) {
    if texture.ownership == TextureOwnership::Owned {
        uploader.release(texture.gpu);
    }
}
