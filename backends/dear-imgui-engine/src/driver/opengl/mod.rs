//! OpenGL driver built on glow
//!
//! Draws with a small shader program and saves every piece of GL state it touches,
//! so the engine's own rendering is unaffected by the GUI pass.

mod gl;
mod shaders;
mod state;
#[cfg(test)]
mod testing;
mod versions;

use std::borrow::Cow;
use std::mem::size_of;
use std::num::NonZeroU32;

use dear_imgui_rs::TextureId;
use dear_imgui_rs::render::{DrawIdx, DrawVert};

use crate::draw::{DrawCommand, DrawListSource, RenderFrame};
use crate::driver::{DriverKind, GuiDriver};
use crate::engine::EngineTexture;
use crate::error::{DriverError, DriverResult};
use crate::texture::{GpuTexture, TextureRegistry, TextureUploader, UploadFormat, UploadRequest};

pub use gl::GlApi;
use gl::{GlBuffer, GlVertexArray};
use shaders::Shaders;
use state::GlStateBackup;
pub use versions::GlVersion;

fn to_byte_slice<T>(slice: &[T]) -> &[u8] {
    unsafe { std::slice::from_raw_parts(slice.as_ptr() as *const u8, size_of::<T>() * slice.len()) }
}

/// Alpha-only pixels as white RGBA, sampled the same way on every GL profile
fn expand_alpha(alpha: &[u8]) -> Vec<u8> {
    alpha.iter().flat_map(|&a| [0xFF, 0xFF, 0xFF, a]).collect()
}

/// GL objects shared by every frame; uploads GUI textures
struct GlDevice<G: GlApi> {
    gl: G,
    version: GlVersion,
    shaders: Shaders,
    vbo: GlBuffer,
    ebo: GlBuffer,
    state_backup: GlStateBackup,
}

impl<G: GlApi> GlDevice<G> {
    fn new(gl: G) -> DriverResult<Self> {
        let version = GlVersion::read(&gl);
        let shaders = Shaders::new(&gl, version)?;
        let buffers = gl.create_buffer().and_then(|vbo| match gl.create_buffer() {
            Ok(ebo) => Ok((vbo, ebo)),
            Err(err) => {
                gl.delete_buffer(vbo);
                Err(err)
            }
        });
        let (vbo, ebo) = match buffers {
            Ok(buffers) => buffers,
            Err(err) => {
                shaders.destroy(&gl);
                return Err(DriverError::CreateBufferObject(err));
            }
        };
        Ok(Self {
            gl,
            version,
            shaders,
            vbo,
            ebo,
            state_backup: GlStateBackup::default(),
        })
    }

    fn supports_vertex_offset(&self) -> bool {
        cfg!(feature = "vertex_offset_support") && self.version.vertex_offset_support()
    }

    fn create_vertex_array(&self) -> DriverResult<Option<GlVertexArray>> {
        #[cfg(feature = "bind_vertex_array_support")]
        if self.version.bind_vertex_array_support() {
            let vertex_array = self
                .gl
                .create_vertex_array()
                .map_err(DriverError::CreateVertexArray)?;
            self.gl.bind_vertex_array(Some(vertex_array));
            return Ok(Some(vertex_array));
        }
        Ok(None)
    }

    /// Blending on, culling and depth off, scissor on, GUI program and buffers bound
    fn set_up_render_state(&self, frame: &RenderFrame) {
        let gl = &self.gl;
        gl.enable(glow::BLEND);
        gl.blend_equation(glow::FUNC_ADD);
        gl.blend_func_separate(
            glow::SRC_ALPHA,
            glow::ONE_MINUS_SRC_ALPHA,
            glow::ONE,
            glow::ONE_MINUS_SRC_ALPHA,
        );
        gl.disable(glow::CULL_FACE);
        gl.disable(glow::DEPTH_TEST);
        gl.disable(glow::STENCIL_TEST);
        gl.enable(glow::SCISSOR_TEST);

        #[cfg(feature = "polygon_mode_support")]
        if self.version.polygon_mode_support() {
            gl.polygon_mode(glow::FRONT_AND_BACK, glow::FILL);
        }

        #[cfg(feature = "primitive_restart_support")]
        if self.version.primitive_restart_support() {
            gl.disable(glow::PRIMITIVE_RESTART);
        }

        let [fb_width, fb_height] = frame.framebuffer_size();
        gl.viewport(0, 0, fb_width as i32, fb_height as i32);

        gl.use_program(Some(self.shaders.program));
        gl.active_texture(glow::TEXTURE0);
        gl.uniform_1_i32(self.shaders.texture_location.as_ref(), 0);
        gl.uniform_matrix_4_f32_slice(
            self.shaders.projection_location.as_ref(),
            &frame.ortho_projection(),
        );

        gl.bind_buffer(glow::ARRAY_BUFFER, Some(self.vbo));
        gl.bind_buffer(glow::ELEMENT_ARRAY_BUFFER, Some(self.ebo));
        let stride = size_of::<DrawVert>() as i32;
        let attributes = [
            (
                self.shaders.position_attrib,
                2,
                glow::FLOAT,
                false,
                memoffset::offset_of!(DrawVert, pos),
            ),
            (
                self.shaders.uv_attrib,
                2,
                glow::FLOAT,
                false,
                memoffset::offset_of!(DrawVert, uv),
            ),
            // Packed colour, four normalized bytes
            (
                self.shaders.color_attrib,
                4,
                glow::UNSIGNED_BYTE,
                true,
                memoffset::offset_of!(DrawVert, col),
            ),
        ];
        for (location, size, data_type, normalized, offset) in attributes {
            gl.enable_vertex_attrib_array(location);
            gl.vertex_attrib_pointer_f32(location, size, data_type, normalized, stride, offset as i32);
        }
    }

    fn render_list(
        &self,
        registry: &TextureRegistry,
        frame: &RenderFrame,
        list: &dyn DrawListSource,
    ) -> DriverResult<()> {
        let gl = &self.gl;
        gl.bind_buffer(glow::ARRAY_BUFFER, Some(self.vbo));
        gl.buffer_data_u8_slice(
            glow::ARRAY_BUFFER,
            to_byte_slice(list.vertices()),
            glow::STREAM_DRAW,
        );
        gl.bind_buffer(glow::ELEMENT_ARRAY_BUFFER, Some(self.ebo));
        gl.buffer_data_u8_slice(
            glow::ELEMENT_ARRAY_BUFFER,
            to_byte_slice(list.indices()),
            glow::STREAM_DRAW,
        );

        list.visit_commands(&mut |command| {
            match command {
                DrawCommand::Elements {
                    count,
                    clip_rect,
                    texture_id,
                    vtx_offset,
                    idx_offset,
                } => self.draw_elements(
                    registry, frame, count, clip_rect, texture_id, vtx_offset, idx_offset,
                ),
                DrawCommand::ResetRenderState => self.set_up_render_state(frame),
                DrawCommand::Callback(callback) => callback(),
            }
            Ok(())
        })
    }

    #[allow(clippy::too_many_arguments)]
    fn draw_elements(
        &self,
        registry: &TextureRegistry,
        frame: &RenderFrame,
        count: usize,
        clip_rect: [f32; 4],
        texture_id: TextureId,
        vtx_offset: usize,
        idx_offset: usize,
    ) {
        let Some([x, y, width, height]) = frame.scissor_rect(clip_rect) else {
            return;
        };
        let Some(texture) = registry.resolve(texture_id) else {
            return;
        };
        let gl = &self.gl;
        gl.bind_texture(glow::TEXTURE_2D, Some(glow::NativeTexture(texture.0)));
        gl.scissor(x, y, width, height);

        let index_type = if size_of::<DrawIdx>() == 2 {
            glow::UNSIGNED_SHORT
        } else {
            glow::UNSIGNED_INT
        };
        let offset = (idx_offset * size_of::<DrawIdx>()) as i32;
        if self.supports_vertex_offset() {
            gl.draw_elements_base_vertex(
                glow::TRIANGLES,
                count as i32,
                index_type,
                offset,
                vtx_offset as i32,
            );
        } else {
            gl.draw_elements(glow::TRIANGLES, count as i32, index_type, offset);
        }
    }
}

impl<G: GlApi> TextureUploader for GlDevice<G> {
    fn upload(&mut self, request: &UploadRequest<'_>) -> DriverResult<GpuTexture> {
        let gl = &self.gl;
        let previous = NonZeroU32::new(gl.get_parameter_i32(glow::TEXTURE_BINDING_2D) as u32)
            .map(glow::NativeTexture);
        let alignment = gl.get_parameter_i32(glow::UNPACK_ALIGNMENT);

        let texture = gl.create_texture().map_err(DriverError::CreateTexture)?;
        gl.bind_texture(glow::TEXTURE_2D, Some(texture));
        for (parameter, value) in [
            (glow::TEXTURE_MIN_FILTER, glow::LINEAR),
            (glow::TEXTURE_MAG_FILTER, glow::LINEAR),
            (glow::TEXTURE_WRAP_S, glow::CLAMP_TO_EDGE),
            (glow::TEXTURE_WRAP_T, glow::CLAMP_TO_EDGE),
        ] {
            gl.tex_parameter_i32(glow::TEXTURE_2D, parameter, value as i32);
        }
        gl.pixel_store_i32(glow::UNPACK_ALIGNMENT, 1);

        let pixels = match request.format {
            UploadFormat::Rgba => Cow::Borrowed(request.pixels.as_ref()),
            UploadFormat::Alpha => Cow::Owned(expand_alpha(&request.pixels)),
        };
        gl.tex_image_2d(
            glow::TEXTURE_2D,
            glow::RGBA as i32,
            request.width as i32,
            request.height as i32,
            glow::RGBA,
            glow::UNSIGNED_BYTE,
            &pixels,
        );

        gl.pixel_store_i32(glow::UNPACK_ALIGNMENT, alignment);
        gl.bind_texture(glow::TEXTURE_2D, previous);
        tracing::trace!(
            "Uploaded {}x{} {:?} texture as gl {}",
            request.width,
            request.height,
            request.format,
            texture.0
        );
        Ok(GpuTexture(texture.0))
    }

    fn release(&mut self, texture: GpuTexture) {
        self.gl.delete_texture(glow::NativeTexture(texture.0));
    }
}

/// Renders GUI draw lists with OpenGL, OpenGL ES or WebGL through glow
pub struct OpenGlDriver<G: GlApi = glow::Context> {
    device: GlDevice<G>,
    registry: TextureRegistry,
}

impl OpenGlDriver<glow::Context> {
    /// Driver on the engine's current GL context
    pub fn new(gl: glow::Context) -> DriverResult<Self> {
        Self::with_gl(gl)
    }
}

impl<G: GlApi> OpenGlDriver<G> {
    /// Driver on any [`GlApi`] implementation
    pub fn with_gl(gl: G) -> DriverResult<Self> {
        let device = GlDevice::new(gl)?;
        tracing::info!(
            "Starting OpenGL GUI driver (GL {}.{}{}, {})",
            device.version.major,
            device.version.minor,
            if device.version.is_es { " ES" } else { "" },
            device.version.glsl_directive()
        );
        Ok(Self {
            device,
            registry: TextureRegistry::new(),
        })
    }

    pub fn gl(&self) -> &G {
        &self.device.gl
    }

    pub fn gl_version(&self) -> GlVersion {
        self.device.version
    }

    pub fn registry(&self) -> &TextureRegistry {
        &self.registry
    }
}

impl<G: GlApi> GuiDriver for OpenGlDriver<G> {
    fn kind(&self) -> DriverKind {
        DriverKind::OpenGl
    }

    fn render(&mut self, frame: &RenderFrame, lists: &[&dyn DrawListSource]) -> DriverResult<()> {
        if !frame.is_visible() {
            return Ok(());
        }
        let device = &mut self.device;
        let attribs = [
            device.shaders.position_attrib,
            device.shaders.uv_attrib,
            device.shaders.color_attrib,
        ];
        device
            .state_backup
            .backup(&device.gl, device.version, attribs);

        let result = device.create_vertex_array().and_then(|vertex_array| {
            device.set_up_render_state(frame);
            let drawn = lists
                .iter()
                .try_for_each(|list| device.render_list(&self.registry, frame, *list));
            if let Some(vertex_array) = vertex_array {
                device.gl.delete_vertex_array(vertex_array);
            }
            drawn
        });

        device.state_backup.restore(&device.gl, device.version);
        if let Err(err) = &result {
            tracing::error!("GUI render pass failed: {}", err);
        }
        result
    }

    fn texture_parts(&mut self) -> (&mut TextureRegistry, &mut dyn TextureUploader) {
        (&mut self.registry, &mut self.device)
    }

    fn borrow_engine_texture(&self, texture: &dyn EngineTexture) -> DriverResult<GpuTexture> {
        texture.native_handle().map(GpuTexture).ok_or_else(|| {
            DriverError::MissingTextureData("engine texture has no GL texture name".to_string())
        })
    }

    fn texture_count(&self) -> usize {
        self.registry.len()
    }

    fn supports_vertex_offset(&self) -> bool {
        self.device.supports_vertex_offset()
    }
}

impl<G: GlApi> Drop for OpenGlDriver<G> {
    fn drop(&mut self) {
        self.registry.clear(&mut self.device);
        let gl = &self.device.gl;
        self.device.shaders.destroy(gl);
        gl.delete_buffer(self.device.vbo);
        gl.delete_buffer(self.device.ebo);
        tracing::debug!("OpenGL GUI driver destroyed");
    }
}

#[cfg(test)]
mod tests {
    use super::testing::{RecordedDraw, RecordingGl};
    use super::*;
    use crate::color::{Color, ColorFormat, EngineColorFormat};
    use crate::draw::testing::{TestCommand, TestDrawList};
    use crate::engine::EngineImage;
    use pretty_assertions::assert_eq;

    fn driver(version: &str) -> OpenGlDriver<RecordingGl> {
        OpenGlDriver::with_gl(RecordingGl::new(version)).unwrap()
    }

    fn frame() -> RenderFrame {
        RenderFrame {
            display_pos: [0.0, 0.0],
            display_size: [800.0, 600.0],
            framebuffer_scale: [1.0, 1.0],
        }
    }

    struct Pixel(Color);

    impl EngineImage for Pixel {
        fn dimension(&self) -> [u32; 2] {
            [1, 1]
        }
        fn pixel(&self, _x: u32, _y: u32) -> Color {
            self.0
        }
    }

    struct GlBacked {
        pixels: [u8; 4],
        name: NonZeroU32,
    }

    impl EngineTexture for GlBacked {
        fn size(&self) -> [u32; 2] {
            [1, 1]
        }
        fn pitch(&self) -> usize {
            4
        }
        fn color_format(&self) -> EngineColorFormat {
            EngineColorFormat::A8R8G8B8
        }
        fn lock(&self) -> Option<&[u8]> {
            Some(&self.pixels)
        }
        fn unlock(&self) {}
        fn native_handle(&self) -> Option<NonZeroU32> {
            Some(self.name)
        }
    }

    fn gl_backed() -> GlBacked {
        GlBacked {
            // 0xFF112233 stored little-endian
            pixels: [0x33, 0x22, 0x11, 0xFF],
            name: NonZeroU32::new(4242).unwrap(),
        }
    }

    #[test]
    fn scissor_is_flipped_to_lower_left_origin() {
        let mut driver = driver("3.3.0 Core");
        let image = driver
            .create_texture_from_image(&Pixel(Color(0xFFFF_FFFF)))
            .unwrap();
        let gpu = driver.registry().get(image).unwrap().gpu;
        let list = TestDrawList::quad(image, [10.0, 20.0, 110.0, 70.0]);

        driver.render(&frame(), &[&list]).unwrap();

        assert_eq!(
            driver.gl().draws(),
            vec![RecordedDraw {
                count: 6,
                offset: 0,
                base_vertex: driver.supports_vertex_offset().then_some(0),
                texture: Some(gpu.get()),
                scissor: [10, 530, 100, 50],
            }]
        );
    }

    #[test]
    fn legacy_contexts_draw_without_base_vertex() {
        let mut driver = driver("2.1 Mesa");
        assert!(!driver.supports_vertex_offset());
        let image = driver
            .create_texture_from_image(&Pixel(Color(0xFFFF_FFFF)))
            .unwrap();
        let list = TestDrawList::quad(image, [0.0, 0.0, 800.0, 600.0]);

        driver.render(&frame(), &[&list]).unwrap();

        let draws = driver.gl().draws();
        assert_eq!(draws.len(), 1);
        assert_eq!(draws[0].base_vertex, None);
    }

    fn assert_render_restores_host_state(version: &str) {
        let mut driver = driver(version);
        driver.gl().bind_host_objects();
        let image = driver
            .create_texture_from_image(&Pixel(Color(0xFF00_00FF)))
            .unwrap();
        let before = driver.gl().snapshot();

        let mut list = TestDrawList::quad(image, [0.0, 0.0, 400.0, 300.0]);
        list.commands.push(TestCommand::ResetRenderState);
        list.commands.push(TestCommand::Callback);
        driver.render(&frame(), &[&list]).unwrap();

        assert_eq!(driver.gl().snapshot(), before);
        assert_eq!(list.callbacks_run.get(), 1);
    }

    #[test]
    fn render_restores_host_state() {
        assert_render_restores_host_state("3.3.0 Core");
    }

    #[test]
    fn render_restores_vertex_attributes_without_vertex_arrays() {
        assert_render_restores_host_state("2.1 Mesa");
        assert_render_restores_host_state("OpenGL ES 2.0");
    }

    #[test]
    fn empty_clip_and_invisible_frame_draw_nothing() {
        let mut driver = driver("3.3.0 Core");
        let image = driver
            .create_texture_from_image(&Pixel(Color(0xFFFF_FFFF)))
            .unwrap();
        let list = TestDrawList::quad(image, [50.0, 50.0, 50.0, 80.0]);
        driver.render(&frame(), &[&list]).unwrap();

        let hidden = RenderFrame {
            display_size: [0.0, 600.0],
            ..frame()
        };
        let visible_list = TestDrawList::quad(image, [0.0, 0.0, 10.0, 10.0]);
        driver.render(&hidden, &[&visible_list]).unwrap();

        assert!(driver.gl().draws().is_empty());
    }

    #[test]
    fn owned_texture_is_allocated_once_and_freed_on_delete() {
        let mut driver = driver("3.3.0 Core");
        let pixels = [0u8; 16];
        let id = driver
            .create_texture_from_raw(&pixels, ColorFormat::R8G8B8A8, 2, 2)
            .unwrap();
        assert_eq!(driver.gl().texture_allocations(), 1);
        assert_eq!(driver.gl().live_textures(), 1);

        driver.delete_texture(id);
        assert_eq!(driver.gl().texture_deallocations(), 1);
        assert_eq!(driver.gl().live_textures(), 0);
        assert_eq!(driver.texture_count(), 0);
    }

    #[test]
    fn edited_pixels_are_reuploaded_from_the_same_buffer() {
        let mut driver = driver("3.3.0 Core");
        let mut pixels = [0u8; 4];
        let id = driver
            .create_texture_from_raw(&pixels, ColorFormat::R8G8B8A8, 1, 1)
            .unwrap();

        pixels.copy_from_slice(&[9, 9, 9, 9]);
        driver
            .update_texture_from_raw(id, &pixels, ColorFormat::R8G8B8A8, 1, 1)
            .unwrap();

        let uploads = driver.gl().uploads();
        assert_eq!(uploads.len(), 2);
        assert_eq!(uploads[1].pixels, vec![9, 9, 9, 9]);
        assert_eq!(driver.gl().live_textures(), 1);
    }

    struct Red;
    struct Blue;

    impl EngineImage for Red {
        fn dimension(&self) -> [u32; 2] {
            [1, 1]
        }
        fn pixel(&self, _x: u32, _y: u32) -> Color {
            Color(0xFFFF_0000)
        }
    }

    impl EngineImage for Blue {
        fn dimension(&self) -> [u32; 2] {
            [1, 1]
        }
        fn pixel(&self, _x: u32, _y: u32) -> Color {
            Color(0xFF00_00FF)
        }
    }

    #[test]
    fn switching_between_zero_sized_images_uploads_the_new_one() {
        let mut driver = driver("3.3.0 Core");
        let id = driver.create_texture_from_image(&Red).unwrap();
        driver.update_texture_from_image(id, &Blue).unwrap();

        let uploads = driver.gl().uploads();
        assert_eq!(uploads.len(), 2);
        assert_eq!(uploads[1].pixels, vec![0x00, 0x00, 0xFF, 0xFF]);
    }

    struct BadPitch;

    impl EngineTexture for BadPitch {
        fn size(&self) -> [u32; 2] {
            [2, 2]
        }
        fn pitch(&self) -> usize {
            4
        }
        fn color_format(&self) -> EngineColorFormat {
            EngineColorFormat::A8R8G8B8
        }
        fn lock(&self) -> Option<&[u8]> {
            static MEMORY: [u8; 8] = [0; 8];
            Some(MEMORY.as_slice())
        }
        fn unlock(&self) {}
        fn native_handle(&self) -> Option<NonZeroU32> {
            NonZeroU32::new(4243)
        }
    }

    #[cfg(not(feature = "borrow-engine-textures"))]
    #[test]
    fn engine_texture_with_short_pitch_is_an_error() {
        let mut driver = driver("3.3.0 Core");
        assert!(matches!(
            driver.create_texture_from_engine_texture(&BadPitch),
            Err(DriverError::MissingTextureData(_))
        ));
        assert_eq!(driver.gl().texture_allocations(), 0);
        assert_eq!(driver.texture_count(), 0);
    }

    #[test]
    fn changed_update_replaces_gpu_texture_under_same_id() {
        let mut driver = driver("3.3.0 Core");
        let first = Pixel(Color(0xFF00_0000));
        let second = Pixel(Color(0xFFFF_FFFF));
        let id = driver.create_texture_from_image(&first).unwrap();
        driver.update_texture_from_image(id, &second).unwrap();

        assert_eq!(driver.gl().texture_allocations(), 2);
        assert_eq!(driver.gl().texture_deallocations(), 1);
        assert_eq!(driver.gl().live_textures(), 1);
        assert_eq!(driver.texture_count(), 1);
    }

    #[test]
    fn alpha_textures_upload_as_white_rgba() {
        let mut driver = driver("3.3.0 Core");
        let alpha = [10u8, 20];
        driver
            .create_texture_from_raw(&alpha, ColorFormat::A8, 2, 1)
            .unwrap();

        let uploads = driver.gl().uploads();
        assert_eq!(uploads.len(), 1);
        assert_eq!(uploads[0].format, glow::RGBA);
        assert_eq!(
            uploads[0].pixels,
            vec![0xFF, 0xFF, 0xFF, 10, 0xFF, 0xFF, 0xFF, 20]
        );
    }

    #[cfg(not(feature = "borrow-engine-textures"))]
    #[test]
    fn engine_textures_are_copied() {
        let mut driver = driver("3.3.0 Core");
        let id = driver
            .create_texture_from_engine_texture(&gl_backed())
            .unwrap();

        assert_eq!(driver.gl().texture_allocations(), 1);
        assert_eq!(driver.gl().uploads()[0].pixels, vec![0x11, 0x22, 0x33, 0xFF]);
        driver.delete_texture(id);
        assert_eq!(driver.gl().texture_deallocations(), 1);
    }

    #[cfg(feature = "borrow-engine-textures")]
    #[test]
    fn engine_textures_are_borrowed_and_never_freed() {
        let mut driver = driver("3.3.0 Core");
        let texture = gl_backed();
        let id = driver.create_texture_from_engine_texture(&texture).unwrap();

        assert_eq!(driver.registry().get(id).unwrap().gpu.get(), 4242);
        assert_eq!(driver.gl().texture_allocations(), 0);
        driver.delete_texture(id);
        assert_eq!(driver.gl().texture_deallocations(), 0);
    }

    #[cfg(feature = "borrow-engine-textures")]
    #[test]
    fn borrowed_update_follows_the_engine_texture() {
        let mut driver = driver("3.3.0 Core");
        let texture = gl_backed();
        let id = driver.create_texture_from_engine_texture(&texture).unwrap();

        driver
            .update_texture_from_engine_texture(id, &texture)
            .unwrap();
        assert_eq!(driver.registry().get(id).unwrap().gpu.get(), 4242);

        driver
            .update_texture_from_engine_texture(id, &BadPitch)
            .unwrap();
        assert_eq!(driver.registry().get(id).unwrap().gpu.get(), 4243);
        assert_eq!(driver.gl().texture_allocations(), 0);
        assert_eq!(driver.gl().texture_deallocations(), 0);
    }

    #[test]
    fn es_contexts_draw_without_base_vertex() {
        let driver = driver("OpenGL ES 3.0");
        assert_eq!(driver.kind(), DriverKind::OpenGl);
        assert!(driver.gl_version().is_es);
        assert!(!driver.supports_vertex_offset());
    }
}
