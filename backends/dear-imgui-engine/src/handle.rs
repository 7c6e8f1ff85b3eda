//! The GUI handle: one engine device bound to the thread's Dear ImGui context

use std::cell::{RefCell, RefMut};
use std::rc::{Rc, Weak};

use dear_imgui_rs::{
    BackendFlags, ConfigFlags, Context, FontId, GlyphRanges, TextureFormat, TextureId, Ui, sys,
};

use crate::color::ColorFormat;
use crate::draw::{DrawListSource, ImGuiDrawList, RenderFrame};
use crate::driver::{self, FontAtlasPixels, GuiDriver, OpenGlDriver};
use crate::engine::{EngineDevice, EngineImage, EngineTexture};
use crate::error::{DriverResult, GuiError, GuiResult};
use crate::events::EventStorage;
use crate::settings::GuiSettings;
use crate::texture::UploadFormat;

/// Delta time used for the first frame and when the engine clock did not advance
pub const DEFAULT_DELTA_TIME: f32 = 1.0 / 60.0;

/// Dear ImGui context and driver shared by every handle of a thread
struct SharedGui {
    driver: Box<dyn GuiDriver>,
    font_texture: TextureId,
    settings: GuiSettings,
    context: Context,
}

thread_local! {
    static SHARED: RefCell<Weak<RefCell<SharedGui>>> = const { RefCell::new(Weak::new()) };
}

impl SharedGui {
    fn create(settings: GuiSettings, mut driver: Box<dyn GuiDriver>) -> GuiResult<Self> {
        let mut context = Context::create();
        context
            .set_renderer_name(Some(format!("dear-imgui-engine ({:?})", driver.kind())))
            .map_err(|err| GuiError::Context(err.to_string()))?;
        if driver.supports_vertex_offset() {
            let io = context.io_mut();
            io.set_backend_flags(io.backend_flags() | BackendFlags::RENDERER_HAS_VTX_OFFSET);
        }
        apply_settings(&mut context, &settings)?;

        context.fonts().add_font_default(None);
        let font_texture = upload_font_atlas(&mut context, driver.as_mut(), None)?;

        tracing::info!(
            "Dear ImGui context created ({:?} driver, font texture {:?})",
            driver.kind(),
            font_texture
        );
        Ok(Self {
            driver,
            font_texture,
            settings,
            context,
        })
    }
}

impl Drop for SharedGui {
    fn drop(&mut self) {
        self.driver.delete_texture(self.font_texture);
        tracing::info!("Last GUI handle dropped, destroying Dear ImGui context");
    }
}

fn apply_settings(context: &mut Context, settings: &GuiSettings) -> GuiResult<()> {
    let io = context.io_mut();
    io.set_display_framebuffer_scale(settings.framebuffer_scale);
    io.set_mouse_draw_cursor(settings.draw_software_cursor);
    let mut flags = io.config_flags();
    flags.set(ConfigFlags::NAV_ENABLE_KEYBOARD, settings.keyboard_navigation);
    io.set_config_flags(flags);
    context
        .set_ini_filename(settings.ini_filename.clone())
        .map_err(|err| GuiError::Context(err.to_string()))
}

/// Build the atlas and hand its pixels to the driver, creating the font texture or
/// refreshing `existing`
fn upload_font_atlas(
    context: &mut Context,
    driver: &mut dyn GuiDriver,
    existing: Option<TextureId>,
) -> GuiResult<TextureId> {
    let mut fonts = context.fonts();
    if !fonts.build() {
        return Err(GuiError::FontLoading("font atlas could not be built".to_string()));
    }
    let Some(texture) = fonts.tex_data_mut() else {
        return Err(GuiError::FontLoading("font atlas has no texture data".to_string()));
    };
    let format = match texture.format() {
        TextureFormat::RGBA32 => UploadFormat::Rgba,
        TextureFormat::Alpha8 => UploadFormat::Alpha,
    };
    let (width, height) = (texture.width() as u32, texture.height() as u32);
    let Some(pixels) = texture.pixels() else {
        return Err(GuiError::FontLoading("font atlas has no pixels".to_string()));
    };
    let atlas = FontAtlasPixels {
        format,
        width,
        height,
        pixels,
    };
    let id = match existing {
        Some(id) => {
            driver.update_font_texture(id, &atlas)?;
            id
        }
        None => driver.create_font_texture(&atlas)?,
    };
    tracing::debug!("Font atlas {}x{} {:?} uploaded as {:?}", width, height, format, id);
    fonts.set_texture_id(id);
    Ok(id)
}

fn font_id(font: Option<&mut dear_imgui_rs::Font>, what: &str) -> GuiResult<FontId> {
    font.map(|font| font.id()).ok_or_else(|| {
        tracing::warn!("Could not load font from {}", what);
        GuiError::FontLoading(format!("could not load font from {what}"))
    })
}

/// Binds an engine device and its input to the Dear ImGui context of the thread
///
/// The context is created by the first live handle and destroyed with the last one.
/// Handles on the same thread share the context, the driver and the settings; the
/// driver passed to a later handle is dropped in favour of the one already running.
///
/// ```no_run
/// # use std::cell::RefCell;
/// # use std::rc::Rc;
/// # use dear_imgui_engine::{EngineDevice, EventStorage, GuiHandle};
/// # fn demo(device: Box<dyn EngineDevice>, gl: dear_imgui_engine::glow::Context) {
/// let events = Rc::new(RefCell::new(EventStorage::new()));
/// let mut gui = GuiHandle::opengl(device, Some(events.clone()), gl).unwrap();
/// gui.frame(|ui| {
///     ui.text("Hello from the engine");
/// })
/// .unwrap();
/// # }
/// ```
pub struct GuiHandle {
    device: Box<dyn EngineDevice>,
    events: Option<Rc<RefCell<EventStorage>>>,
    shared: Rc<RefCell<SharedGui>>,
    last_time_ms: Option<u32>,
}

impl GuiHandle {
    pub fn new(
        device: Box<dyn EngineDevice>,
        events: Option<Rc<RefCell<EventStorage>>>,
        driver: Box<dyn GuiDriver>,
    ) -> GuiResult<Self> {
        Self::attach(device, events, None, || Ok(driver))
    }

    /// Like [`GuiHandle::new`], and apply `settings` to the shared context
    pub fn with_settings(
        device: Box<dyn EngineDevice>,
        events: Option<Rc<RefCell<EventStorage>>>,
        driver: Box<dyn GuiDriver>,
        settings: GuiSettings,
    ) -> GuiResult<Self> {
        Self::attach(device, events, Some(settings), || Ok(driver))
    }

    /// Handle rendering with OpenGL on the engine's GL context
    pub fn opengl(
        device: Box<dyn EngineDevice>,
        events: Option<Rc<RefCell<EventStorage>>>,
        gl: glow::Context,
    ) -> GuiResult<Self> {
        Self::attach(device, events, None, || {
            Ok(Box::new(OpenGlDriver::new(gl)?) as Box<dyn GuiDriver>)
        })
    }

    /// Handle with the driver matching [`EngineDevice::driver_kind`]
    pub fn for_device(
        device: Box<dyn EngineDevice>,
        events: Option<Rc<RefCell<EventStorage>>>,
        gl: Option<glow::Context>,
    ) -> GuiResult<Self> {
        let kind = device.driver_kind();
        Self::attach(device, events, None, || driver::create_driver(kind, gl))
    }

    fn attach(
        device: Box<dyn EngineDevice>,
        events: Option<Rc<RefCell<EventStorage>>>,
        settings: Option<GuiSettings>,
        make_driver: impl FnOnce() -> DriverResult<Box<dyn GuiDriver>>,
    ) -> GuiResult<Self> {
        let shared = match SHARED.with(|shared| shared.borrow().upgrade()) {
            Some(shared) => {
                if let Some(settings) = settings {
                    let mut gui = shared.borrow_mut();
                    apply_settings(&mut gui.context, &settings)?;
                    gui.settings = settings;
                }
                tracing::debug!("Joining the existing Dear ImGui context");
                shared
            }
            None => {
                let gui = SharedGui::create(settings.unwrap_or_default(), make_driver()?)?;
                let shared = Rc::new(RefCell::new(gui));
                SHARED.with(|slot| *slot.borrow_mut() = Rc::downgrade(&shared));
                shared
            }
        };
        Ok(Self {
            device,
            events,
            shared,
            last_time_ms: None,
        })
    }

    /// Number of live handles on this thread
    pub fn instance_count() -> usize {
        SHARED.with(|shared| shared.borrow().strong_count())
    }

    pub fn settings(&self) -> GuiSettings {
        self.shared.borrow().settings.clone()
    }

    /// Apply `settings` to the shared context, and so to every handle
    pub fn set_settings(&mut self, settings: GuiSettings) -> GuiResult<()> {
        let mut gui = self.shared.borrow_mut();
        apply_settings(&mut gui.context, &settings)?;
        gui.settings = settings;
        Ok(())
    }

    /// Run `f` with the shared Dear ImGui context
    pub fn with_context<R>(&self, f: impl FnOnce(&mut Context) -> R) -> R {
        f(&mut self.shared.borrow_mut().context)
    }

    fn next_delta_time(&mut self) -> f32 {
        let now = self.device.time_ms();
        let delta = match self.last_time_ms {
            Some(last) if now > last => (now - last) as f32 / 1000.0,
            _ => DEFAULT_DELTA_TIME,
        };
        self.last_time_ms = Some(now);
        delta
    }

    /// Feed display size, timing and input to Dear ImGui and begin a frame
    ///
    /// The returned [`Ui`] must be dropped before [`GuiHandle::draw_all`].
    pub fn start_gui(&mut self) -> RefMut<'_, Ui> {
        let delta_time = self.next_delta_time();
        let [width, height] = self.device.screen_size();

        let mut gui = self.shared.borrow_mut();
        let scale = gui.settings.framebuffer_scale.map(|s| if s > 0.0 { s } else { 1.0 });
        let io = gui.context.io_mut();
        io.set_display_size([width as f32 / scale[0], height as f32 / scale[1]]);
        io.set_display_framebuffer_scale(scale);
        io.set_delta_time(delta_time);
        if let Some(events) = &self.events {
            events.borrow_mut().flush_into(io, scale);
        }
        RefMut::map(gui, |gui| gui.context.frame())
    }

    /// Finish the frame and submit its draw lists through the driver
    pub fn draw_all(&mut self) -> GuiResult<()> {
        let mut gui = self.shared.borrow_mut();
        let SharedGui {
            context, driver, ..
        } = &mut *gui;
        let draw_data = context.render();
        let frame = RenderFrame::from_draw_data(draw_data);
        let lists = ImGuiDrawList::collect(draw_data);
        let sources: Vec<&dyn DrawListSource> =
            lists.iter().map(|list| list as &dyn DrawListSource).collect();
        driver.render(&frame, &sources)?;
        Ok(())
    }

    /// [`GuiHandle::start_gui`], `build`, then [`GuiHandle::draw_all`]
    pub fn frame<R>(&mut self, build: impl FnOnce(&mut Ui) -> R) -> GuiResult<R> {
        let result = {
            let mut ui = self.start_gui();
            build(&mut ui)
        };
        self.draw_all()?;
        Ok(result)
    }

    pub fn add_default_font(&mut self) -> FontId {
        let mut gui = self.shared.borrow_mut();
        let mut fonts = gui.context.fonts();
        fonts.add_font_default(None).id()
    }

    /// Load a TrueType font from disk. Takes effect after [`GuiHandle::compile_fonts`].
    pub fn add_font_from_file_ttf(
        &mut self,
        path: &str,
        size_pixels: f32,
        glyph_ranges: Option<&[sys::ImWchar]>,
    ) -> GuiResult<FontId> {
        let mut gui = self.shared.borrow_mut();
        let mut fonts = gui.context.fonts();
        font_id(
            fonts.add_font_from_file_ttf(path, size_pixels, None, glyph_ranges),
            path,
        )
    }

    pub fn add_font_from_memory_ttf(
        &mut self,
        data: &[u8],
        size_pixels: f32,
        glyph_ranges: Option<&[sys::ImWchar]>,
    ) -> GuiResult<FontId> {
        let mut gui = self.shared.borrow_mut();
        let mut fonts = gui.context.fonts();
        font_id(
            fonts.add_font_from_memory_ttf(data, size_pixels, None, glyph_ranges),
            "memory",
        )
    }

    pub fn add_font_from_memory_compressed_ttf(
        &mut self,
        data: &[u8],
        size_pixels: f32,
        glyph_ranges: Option<&[sys::ImWchar]>,
    ) -> GuiResult<FontId> {
        let mut gui = self.shared.borrow_mut();
        let mut fonts = gui.context.fonts();
        font_id(
            fonts.add_font_from_memory_compressed_ttf(data, size_pixels, None, glyph_ranges),
            "compressed memory",
        )
    }

    pub fn add_font_from_memory_compressed_base85_ttf(
        &mut self,
        data: &str,
        size_pixels: f32,
        glyph_ranges: Option<&[sys::ImWchar]>,
    ) -> GuiResult<FontId> {
        let mut gui = self.shared.borrow_mut();
        let mut fonts = gui.context.fonts();
        font_id(
            fonts.add_font_from_memory_compressed_base85_ttf(data, size_pixels, None, glyph_ranges),
            "base85 memory",
        )
    }

    /// Rebuild the font atlas and refresh the font texture
    pub fn compile_fonts(&mut self) -> GuiResult<()> {
        let mut gui = self.shared.borrow_mut();
        let SharedGui {
            context,
            driver,
            font_texture,
            ..
        } = &mut *gui;
        *font_texture = upload_font_atlas(context, driver.as_mut(), Some(*font_texture))?;
        Ok(())
    }

    /// Drop every loaded font and go back to the default one
    pub fn reset_fonts(&mut self) -> GuiResult<()> {
        {
            let mut gui = self.shared.borrow_mut();
            let mut fonts = gui.context.fonts();
            fonts.clear();
            fonts.add_font_default(None);
        }
        self.compile_fonts()
    }

    /// Basic Latin and Latin-1 Supplement
    pub fn glyph_ranges_default() -> &'static [sys::ImWchar] {
        GlyphRanges::DEFAULT
    }

    pub fn glyph_ranges_japanese() -> &'static [sys::ImWchar] {
        GlyphRanges::JAPANESE
    }

    /// Common simplified Chinese, with kana and the CJK ideograph block
    pub fn glyph_ranges_chinese() -> &'static [sys::ImWchar] {
        GlyphRanges::CHINESE_SIMPLIFIED_COMMON
    }

    pub fn glyph_ranges_cyrillic() -> &'static [sys::ImWchar] {
        GlyphRanges::CYRILLIC
    }

    /// Texture id of the font atlas
    pub fn font_texture(&self) -> TextureId {
        self.shared.borrow().font_texture
    }

    /// Number of live GUI textures, including the font atlas
    pub fn texture_count(&self) -> usize {
        self.shared.borrow().driver.texture_count()
    }

    pub fn create_texture_from_image(&mut self, image: &dyn EngineImage) -> GuiResult<TextureId> {
        Ok(self.driver().create_texture_from_image(image)?)
    }

    pub fn update_texture_from_image(
        &mut self,
        id: TextureId,
        image: &dyn EngineImage,
    ) -> GuiResult<()> {
        Ok(self.driver().update_texture_from_image(id, image)?)
    }

    pub fn create_texture_from_engine_texture(
        &mut self,
        texture: &dyn EngineTexture,
    ) -> GuiResult<TextureId> {
        Ok(self.driver().create_texture_from_engine_texture(texture)?)
    }

    pub fn update_texture_from_engine_texture(
        &mut self,
        id: TextureId,
        texture: &dyn EngineTexture,
    ) -> GuiResult<()> {
        Ok(self.driver().update_texture_from_engine_texture(id, texture)?)
    }

    /// Texture from caller-owned pixels. The buffer's address identifies the source.
    pub fn create_texture_from_raw(
        &mut self,
        pixels: &[u8],
        format: ColorFormat,
        width: u32,
        height: u32,
    ) -> GuiResult<TextureId> {
        Ok(self
            .driver()
            .create_texture_from_raw(pixels, format, width, height)?)
    }

    pub fn update_texture_from_raw(
        &mut self,
        id: TextureId,
        pixels: &[u8],
        format: ColorFormat,
        width: u32,
        height: u32,
    ) -> GuiResult<()> {
        Ok(self
            .driver()
            .update_texture_from_raw(id, pixels, format, width, height)?)
    }

    pub fn delete_texture(&mut self, id: TextureId) {
        self.driver().delete_texture(id);
    }

    fn driver(&self) -> RefMut<'_, Box<dyn GuiDriver>> {
        RefMut::map(self.shared.borrow_mut(), |gui| &mut gui.driver)
    }
}

impl Drop for GuiHandle {
    fn drop(&mut self) {
        tracing::debug!(
            "GUI handle dropped, {} remaining",
            Rc::strong_count(&self.shared) - 1
        );
    }
}
