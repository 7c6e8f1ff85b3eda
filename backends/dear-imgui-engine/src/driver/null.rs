//! Driver for engines without a graphics API

use crate::draw::{DrawListSource, RenderFrame};
use crate::driver::{DriverKind, GuiDriver};
use crate::engine::EngineTexture;
use crate::error::DriverResult;
use crate::texture::{GpuTexture, TextureRegistry, TextureUploader, UploadRequest};

/// Hands out [`GpuTexture::PLACEHOLDER`] and never talks to a GPU
#[derive(Debug, Default)]
struct PlaceholderUploader;

impl TextureUploader for PlaceholderUploader {
    fn upload(&mut self, _request: &UploadRequest<'_>) -> DriverResult<GpuTexture> {
        Ok(GpuTexture::PLACEHOLDER)
    }

    fn release(&mut self, _texture: GpuTexture) {}
}

/// Keeps texture bookkeeping identical to a real driver but draws nothing
#[derive(Debug, Default)]
pub struct NullDriver {
    registry: TextureRegistry,
    uploader: PlaceholderUploader,
}

impl NullDriver {
    pub fn new() -> Self {
        tracing::info!("Starting null GUI driver");
        Self::default()
    }

    pub fn registry(&self) -> &TextureRegistry {
        &self.registry
    }
}

impl GuiDriver for NullDriver {
    fn kind(&self) -> DriverKind {
        DriverKind::Null
    }

    fn render(&mut self, _frame: &RenderFrame, _lists: &[&dyn DrawListSource]) -> DriverResult<()> {
        Ok(())
    }

    fn texture_parts(&mut self) -> (&mut TextureRegistry, &mut dyn TextureUploader) {
        (&mut self.registry, &mut self.uploader)
    }

    fn borrow_engine_texture(&self, _texture: &dyn EngineTexture) -> DriverResult<GpuTexture> {
        Ok(GpuTexture::PLACEHOLDER)
    }

    fn texture_count(&self) -> usize {
        self.registry.len()
    }
}
