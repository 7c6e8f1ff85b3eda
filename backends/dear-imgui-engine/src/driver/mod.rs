//! Drivers turn draw lists into graphics API calls and manage GUI textures

pub mod null;
pub mod opengl;

use std::borrow::Cow;

use dear_imgui_rs::TextureId;

use crate::color::{self, ColorFormat};
use crate::draw::{DrawListSource, RenderFrame};
use crate::engine::{self, EngineImage, EngineTexture, TextureLock};
use crate::error::{DriverError, DriverResult};
use crate::texture::{
    ENGINE_TEXTURE_OWNERSHIP, GpuTexture, TextureContent, TextureOwnership, TextureRegistry,
    TextureSource, TextureUploader, UploadFormat, UploadRequest,
};

pub use null::NullDriver;
pub use opengl::OpenGlDriver;

/// Graphics API a driver renders with
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DriverKind {
    OpenGl,
    /// No graphics API; textures are tracked but nothing is drawn
    Null,
}

/// Build the driver for `kind`. The OpenGL driver needs the engine's GL context.
pub fn create_driver(
    kind: DriverKind,
    gl: Option<glow::Context>,
) -> DriverResult<Box<dyn GuiDriver>> {
    match kind {
        DriverKind::OpenGl => {
            let gl = gl.ok_or_else(|| {
                DriverError::Generic("OpenGL driver requested without a GL context".to_string())
            })?;
            Ok(Box::new(OpenGlDriver::new(gl)?))
        }
        DriverKind::Null => Ok(Box::new(NullDriver::new())),
    }
}

/// Font atlas pixels as built by Dear ImGui
#[derive(Debug, Clone, Copy)]
pub struct FontAtlasPixels<'a> {
    pub format: UploadFormat,
    pub width: u32,
    pub height: u32,
    pub pixels: &'a [u8],
}

/// Renders Dear ImGui draw lists and owns the GPU side of GUI textures
///
/// Implementors provide the texture plumbing; creation, update and deletion follow
/// the same rules for every driver.
pub trait GuiDriver {
    fn kind(&self) -> DriverKind;

    /// Submit one frame. Graphics state touched here is restored before returning.
    fn render(&mut self, frame: &RenderFrame, lists: &[&dyn DrawListSource]) -> DriverResult<()>;

    /// The registry and the uploader backing it
    fn texture_parts(&mut self) -> (&mut TextureRegistry, &mut dyn TextureUploader);

    /// GPU texture of an engine texture when engine textures are borrowed
    fn borrow_engine_texture(&self, texture: &dyn EngineTexture) -> DriverResult<GpuTexture>;

    /// Number of live GUI textures
    fn texture_count(&self) -> usize;

    /// Whether draw commands may carry a vertex offset (large meshes)
    fn supports_vertex_offset(&self) -> bool {
        false
    }

    fn create_font_texture(&mut self, atlas: &FontAtlasPixels<'_>) -> DriverResult<TextureId> {
        let content = font_content(atlas)?;
        let (registry, uploader) = self.texture_parts();
        registry.create(uploader, TextureSource::FontAtlas, content)
    }

    /// Re-upload the font atlas into `id`
    fn update_font_texture(
        &mut self,
        id: TextureId,
        atlas: &FontAtlasPixels<'_>,
    ) -> DriverResult<()> {
        let (registry, uploader) = self.texture_parts();
        registry.update(
            uploader,
            id,
            TextureSource::FontAtlas,
            TextureOwnership::Owned,
            || font_content(atlas),
        )
    }

    fn create_texture_from_raw(
        &mut self,
        pixels: &[u8],
        format: ColorFormat,
        width: u32,
        height: u32,
    ) -> DriverResult<TextureId> {
        let content = raw_content(pixels, format, width, height)?;
        let (registry, uploader) = self.texture_parts();
        registry.create(uploader, TextureSource::raw(pixels, format), content)
    }

    fn update_texture_from_raw(
        &mut self,
        id: TextureId,
        pixels: &[u8],
        format: ColorFormat,
        width: u32,
        height: u32,
    ) -> DriverResult<()> {
        let (registry, uploader) = self.texture_parts();
        registry.update(
            uploader,
            id,
            TextureSource::raw(pixels, format),
            TextureOwnership::Owned,
            || raw_content(pixels, format, width, height),
        )
    }

    fn create_texture_from_engine_texture(
        &mut self,
        texture: &dyn EngineTexture,
    ) -> DriverResult<TextureId> {
        let content = engine_texture_content(self, texture)?;
        let (registry, uploader) = self.texture_parts();
        registry.create(uploader, engine_texture_source(texture), content)
    }

    fn update_texture_from_engine_texture(
        &mut self,
        id: TextureId,
        texture: &dyn EngineTexture,
    ) -> DriverResult<()> {
        let source = engine_texture_source(texture);
        let needs_recreate = match self.texture_parts().0.get(id) {
            Some(current) => current.needs_recreate(source, ENGINE_TEXTURE_OWNERSHIP),
            None => true,
        };
        // Reading the engine texture locks it, so only do it for a rebuild.
        let content = if needs_recreate {
            Some(engine_texture_content(self, texture)?)
        } else {
            None
        };
        let (registry, uploader) = self.texture_parts();
        registry.update(uploader, id, source, ENGINE_TEXTURE_OWNERSHIP, || {
            content.ok_or_else(|| {
                DriverError::Generic("engine texture content was not prepared".to_string())
            })
        })
    }

    fn create_texture_from_image(&mut self, image: &dyn EngineImage) -> DriverResult<TextureId> {
        let content = image_content(image);
        let (registry, uploader) = self.texture_parts();
        registry.create(
            uploader,
            TextureSource::EngineImage(engine::identity(image)),
            content,
        )
    }

    fn update_texture_from_image(
        &mut self,
        id: TextureId,
        image: &dyn EngineImage,
    ) -> DriverResult<()> {
        let (registry, uploader) = self.texture_parts();
        registry.update(
            uploader,
            id,
            TextureSource::EngineImage(engine::identity(image)),
            TextureOwnership::Owned,
            || Ok(image_content(image)),
        )
    }

    /// Free the texture (if owned) and forget `id`
    fn delete_texture(&mut self, id: TextureId) {
        let (registry, uploader) = self.texture_parts();
        registry.delete(uploader, id);
    }
}

fn engine_texture_source(texture: &dyn EngineTexture) -> TextureSource {
    TextureSource::EngineTexture {
        address: engine::identity(texture),
        native: texture.native_handle(),
    }
}

fn engine_texture_content<D: GuiDriver + ?Sized>(
    driver: &D,
    texture: &dyn EngineTexture,
) -> DriverResult<TextureContent<'static>> {
    match ENGINE_TEXTURE_OWNERSHIP {
        TextureOwnership::Borrowed => Ok(TextureContent::Borrow(
            driver.borrow_engine_texture(texture)?,
        )),
        TextureOwnership::Owned => engine_texture_pixels(texture),
    }
}

fn font_content<'a>(atlas: &FontAtlasPixels<'a>) -> DriverResult<TextureContent<'a>> {
    let expected = atlas.width as usize * atlas.height as usize * atlas.format.bytes_per_pixel();
    if expected == 0 || atlas.pixels.len() < expected {
        return Err(DriverError::MissingTextureData(format!(
            "font atlas has {} bytes, expected {expected}",
            atlas.pixels.len()
        )));
    }
    Ok(TextureContent::Upload(UploadRequest {
        format: atlas.format,
        width: atlas.width,
        height: atlas.height,
        pixels: Cow::Borrowed(&atlas.pixels[..expected]),
    }))
}

fn raw_content(
    pixels: &[u8],
    format: ColorFormat,
    width: u32,
    height: u32,
) -> DriverResult<TextureContent<'_>> {
    let expected = width as usize * height as usize * format.bytes_per_pixel();
    if pixels.len() < expected {
        tracing::error!(
            "Raw texture buffer has {} bytes, expected {expected}",
            pixels.len()
        );
        debug_assert!(false, "raw texture buffer too small");
        return Err(DriverError::MissingTextureData(format!(
            "raw buffer has {} bytes, expected {expected}",
            pixels.len()
        )));
    }
    let (upload_format, pixels) = match format {
        ColorFormat::A8R8G8B8 => (
            UploadFormat::Rgba,
            Cow::Owned(color::argb_to_rgba(pixels, width, height)),
        ),
        ColorFormat::R8G8B8A8 => (UploadFormat::Rgba, Cow::Borrowed(&pixels[..expected])),
        ColorFormat::A8 => (UploadFormat::Alpha, Cow::Borrowed(&pixels[..expected])),
    };
    Ok(TextureContent::Upload(UploadRequest {
        format: upload_format,
        width,
        height,
        pixels,
    }))
}

fn engine_texture_pixels(texture: &dyn EngineTexture) -> DriverResult<TextureContent<'static>> {
    let lock = TextureLock::new(texture)?;
    let [width, height] = lock.size();
    let pixels = color::locked_texture_to_rgba(&lock);
    Ok(TextureContent::Upload(UploadRequest {
        format: UploadFormat::Rgba,
        width,
        height,
        pixels: Cow::Owned(pixels),
    }))
}

fn image_content(image: &dyn EngineImage) -> TextureContent<'static> {
    let [width, height] = image.dimension();
    TextureContent::Upload(UploadRequest {
        format: UploadFormat::Rgba,
        width,
        height,
        pixels: Cow::Owned(color::image_to_rgba(image)),
    })
}
