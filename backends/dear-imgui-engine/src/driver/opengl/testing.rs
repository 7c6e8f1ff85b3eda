//! A [`GlApi`] that records calls and tracks state instead of talking to a GPU

use std::cell::{Cell, RefCell};
use std::collections::{BTreeMap, BTreeSet};
use std::num::NonZeroU32;

use super::gl::{
    GlApi, GlBuffer, GlProgram, GlShader, GlTexture, GlUniformLocation, GlVertexArray,
};

/// One indexed draw call
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RecordedDraw {
    pub count: i32,
    pub offset: i32,
    pub base_vertex: Option<i32>,
    pub texture: Option<u32>,
    pub scissor: [i32; 4],
}

/// One texture upload
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecordedUpload {
    pub texture: Option<u32>,
    pub width: i32,
    pub height: i32,
    pub format: u32,
    pub pixels: Vec<u8>,
}

/// Observable GL state, compared before and after a pass
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GlSnapshot {
    pub enabled: BTreeSet<u32>,
    pub parameters: BTreeMap<u32, i32>,
    pub slices: BTreeMap<u32, Vec<i32>>,
    /// Enabled vertex attributes as `(vertex array, index)`
    pub vertex_attribs: BTreeSet<(i32, u32)>,
}

pub struct RecordingGl {
    version: String,
    next_name: Cell<u32>,
    enabled: RefCell<BTreeSet<u32>>,
    parameters: RefCell<BTreeMap<u32, i32>>,
    slices: RefCell<BTreeMap<u32, Vec<i32>>>,
    vertex_attribs: RefCell<BTreeSet<(i32, u32)>>,
    live_textures: RefCell<BTreeSet<u32>>,
    texture_allocations: Cell<u32>,
    texture_deallocations: Cell<u32>,
    draws: RefCell<Vec<RecordedDraw>>,
    uploads: RefCell<Vec<RecordedUpload>>,
}

impl RecordingGl {
    pub fn new(version: &str) -> Self {
        let gl = Self {
            version: version.to_string(),
            next_name: Cell::new(1),
            enabled: RefCell::default(),
            parameters: RefCell::default(),
            slices: RefCell::default(),
            vertex_attribs: RefCell::default(),
            live_textures: RefCell::default(),
            texture_allocations: Cell::new(0),
            texture_deallocations: Cell::new(0),
            draws: RefCell::default(),
            uploads: RefCell::default(),
        };
        for binding in [
            glow::ARRAY_BUFFER_BINDING,
            glow::ELEMENT_ARRAY_BUFFER_BINDING,
            glow::VERTEX_ARRAY_BINDING,
            glow::TEXTURE_BINDING_2D,
            glow::CURRENT_PROGRAM,
        ] {
            gl.set_parameter(binding, 0);
        }
        gl.set_parameter(glow::UNPACK_ALIGNMENT, 4);
        // A host state that differs from what the GUI pass sets up
        gl.enable(glow::DEPTH_TEST);
        gl.enable(glow::CULL_FACE);
        gl.viewport(0, 0, 1024, 768);
        gl.scissor(1, 2, 3, 4);
        gl.blend_func_separate(glow::ONE, glow::ZERO, glow::ONE, glow::ZERO);
        gl.blend_equation_separate(glow::FUNC_ADD, glow::FUNC_ADD);
        gl.active_texture(glow::TEXTURE3);
        gl.slices
            .borrow_mut()
            .insert(glow::POLYGON_MODE, vec![glow::LINE as i32, glow::LINE as i32]);
        gl
    }

    fn name(&self) -> NonZeroU32 {
        let name = self.next_name.get();
        self.next_name.set(name + 1);
        NonZeroU32::new(name).unwrap_or(NonZeroU32::MIN)
    }

    fn set_parameter(&self, parameter: u32, value: i32) {
        self.parameters.borrow_mut().insert(parameter, value);
    }

    /// Bind host objects so restore has something non-trivial to do
    pub fn bind_host_objects(&self) {
        let texture = self.create_texture().unwrap_or(glow::NativeTexture(NonZeroU32::MIN));
        self.bind_texture(glow::TEXTURE_2D, Some(texture));
        self.use_program(Some(glow::NativeProgram(self.name())));
        self.bind_buffer(glow::ARRAY_BUFFER, Some(glow::NativeBuffer(self.name())));
        self.enable_vertex_attrib_array(1);
        // The host texture is not part of the allocation counts under test.
        self.texture_allocations.set(0);
    }

    pub fn snapshot(&self) -> GlSnapshot {
        GlSnapshot {
            enabled: self.enabled.borrow().clone(),
            parameters: self.parameters.borrow().clone(),
            slices: self.slices.borrow().clone(),
            vertex_attribs: self.vertex_attribs.borrow().clone(),
        }
    }

    pub fn texture_allocations(&self) -> u32 {
        self.texture_allocations.get()
    }

    pub fn texture_deallocations(&self) -> u32 {
        self.texture_deallocations.get()
    }

    pub fn live_textures(&self) -> usize {
        self.live_textures.borrow().len()
    }

    pub fn draws(&self) -> Vec<RecordedDraw> {
        self.draws.borrow().clone()
    }

    pub fn uploads(&self) -> Vec<RecordedUpload> {
        self.uploads.borrow().clone()
    }

    fn bound_vertex_array(&self) -> i32 {
        self.get_parameter_i32(glow::VERTEX_ARRAY_BINDING)
    }

    fn bound_texture(&self) -> Option<u32> {
        self.parameters
            .borrow()
            .get(&glow::TEXTURE_BINDING_2D)
            .copied()
            .filter(|&name| name != 0)
            .map(|name| name as u32)
    }

    fn record_draw(&self, count: i32, offset: i32, base_vertex: Option<i32>) {
        let scissor = self
            .slices
            .borrow()
            .get(&glow::SCISSOR_BOX)
            .and_then(|b| <[i32; 4]>::try_from(b.as_slice()).ok())
            .unwrap_or_default();
        self.draws.borrow_mut().push(RecordedDraw {
            count,
            offset,
            base_vertex,
            texture: self.bound_texture(),
            scissor,
        });
    }
}

impl GlApi for RecordingGl {
    fn version_string(&self) -> String {
        self.version.clone()
    }

    fn is_enabled(&self, cap: u32) -> bool {
        self.enabled.borrow().contains(&cap)
    }

    fn enable(&self, cap: u32) {
        self.enabled.borrow_mut().insert(cap);
    }

    fn disable(&self, cap: u32) {
        self.enabled.borrow_mut().remove(&cap);
    }

    fn get_parameter_i32(&self, parameter: u32) -> i32 {
        self.parameters
            .borrow()
            .get(&parameter)
            .copied()
            .unwrap_or(0)
    }

    fn get_parameter_i32_slice(&self, parameter: u32, out: &mut [i32]) {
        if let Some(values) = self.slices.borrow().get(&parameter) {
            for (slot, value) in out.iter_mut().zip(values) {
                *slot = *value;
            }
        }
    }

    fn blend_equation(&self, mode: u32) {
        self.blend_equation_separate(mode, mode);
    }

    fn blend_equation_separate(&self, mode_rgb: u32, mode_alpha: u32) {
        self.set_parameter(glow::BLEND_EQUATION_RGB, mode_rgb as i32);
        self.set_parameter(glow::BLEND_EQUATION_ALPHA, mode_alpha as i32);
    }

    fn blend_func_separate(&self, src_rgb: u32, dst_rgb: u32, src_alpha: u32, dst_alpha: u32) {
        self.set_parameter(glow::BLEND_SRC_RGB, src_rgb as i32);
        self.set_parameter(glow::BLEND_DST_RGB, dst_rgb as i32);
        self.set_parameter(glow::BLEND_SRC_ALPHA, src_alpha as i32);
        self.set_parameter(glow::BLEND_DST_ALPHA, dst_alpha as i32);
    }

    fn viewport(&self, x: i32, y: i32, width: i32, height: i32) {
        self.slices
            .borrow_mut()
            .insert(glow::VIEWPORT, vec![x, y, width, height]);
    }

    fn scissor(&self, x: i32, y: i32, width: i32, height: i32) {
        self.slices
            .borrow_mut()
            .insert(glow::SCISSOR_BOX, vec![x, y, width, height]);
    }

    fn polygon_mode(&self, _face: u32, mode: u32) {
        self.slices
            .borrow_mut()
            .insert(glow::POLYGON_MODE, vec![mode as i32, mode as i32]);
    }

    fn create_buffer(&self) -> Result<GlBuffer, String> {
        Ok(glow::NativeBuffer(self.name()))
    }

    fn delete_buffer(&self, _buffer: GlBuffer) {}

    fn bind_buffer(&self, target: u32, buffer: Option<GlBuffer>) {
        let parameter = match target {
            glow::ARRAY_BUFFER => glow::ARRAY_BUFFER_BINDING,
            _ => glow::ELEMENT_ARRAY_BUFFER_BINDING,
        };
        self.set_parameter(parameter, buffer.map_or(0, |b| b.0.get() as i32));
    }

    fn buffer_data_u8_slice(&self, _target: u32, _data: &[u8], _usage: u32) {}

    fn create_vertex_array(&self) -> Result<GlVertexArray, String> {
        Ok(glow::NativeVertexArray(self.name()))
    }

    fn delete_vertex_array(&self, vertex_array: GlVertexArray) {
        let name = vertex_array.0.get() as i32;
        self.vertex_attribs
            .borrow_mut()
            .retain(|&(owner, _)| owner != name);
    }

    fn bind_vertex_array(&self, vertex_array: Option<GlVertexArray>) {
        self.set_parameter(
            glow::VERTEX_ARRAY_BINDING,
            vertex_array.map_or(0, |v| v.0.get() as i32),
        );
    }

    fn enable_vertex_attrib_array(&self, index: u32) {
        let key = (self.bound_vertex_array(), index);
        self.vertex_attribs.borrow_mut().insert(key);
    }

    fn disable_vertex_attrib_array(&self, index: u32) {
        let key = (self.bound_vertex_array(), index);
        self.vertex_attribs.borrow_mut().remove(&key);
    }

    fn is_vertex_attrib_array_enabled(&self, index: u32) -> bool {
        let key = (self.bound_vertex_array(), index);
        self.vertex_attribs.borrow().contains(&key)
    }

    fn vertex_attrib_pointer_f32(
        &self,
        _index: u32,
        _size: i32,
        _data_type: u32,
        _normalized: bool,
        _stride: i32,
        _offset: i32,
    ) {
    }

    fn active_texture(&self, unit: u32) {
        self.set_parameter(glow::ACTIVE_TEXTURE, unit as i32);
    }

    fn create_texture(&self) -> Result<GlTexture, String> {
        let name = self.name();
        self.live_textures.borrow_mut().insert(name.get());
        self.texture_allocations
            .set(self.texture_allocations.get() + 1);
        Ok(glow::NativeTexture(name))
    }

    fn delete_texture(&self, texture: GlTexture) {
        self.live_textures.borrow_mut().remove(&texture.0.get());
        self.texture_deallocations
            .set(self.texture_deallocations.get() + 1);
    }

    fn bind_texture(&self, _target: u32, texture: Option<GlTexture>) {
        self.set_parameter(
            glow::TEXTURE_BINDING_2D,
            texture.map_or(0, |t| t.0.get() as i32),
        );
    }

    fn tex_parameter_i32(&self, _target: u32, _parameter: u32, _value: i32) {}

    fn pixel_store_i32(&self, parameter: u32, value: i32) {
        self.set_parameter(parameter, value);
    }

    fn tex_image_2d(
        &self,
        _target: u32,
        _internal_format: i32,
        width: i32,
        height: i32,
        format: u32,
        _ty: u32,
        pixels: &[u8],
    ) {
        self.uploads.borrow_mut().push(RecordedUpload {
            texture: self.bound_texture(),
            width,
            height,
            format,
            pixels: pixels.to_vec(),
        });
    }

    fn create_shader(&self, _shader_type: u32) -> Result<GlShader, String> {
        Ok(glow::NativeShader(self.name()))
    }

    fn shader_source(&self, _shader: GlShader, _source: &str) {}

    fn compile_shader(&self, _shader: GlShader) {}

    fn get_shader_compile_status(&self, _shader: GlShader) -> bool {
        true
    }

    fn get_shader_info_log(&self, _shader: GlShader) -> String {
        String::new()
    }

    fn delete_shader(&self, _shader: GlShader) {}

    fn create_program(&self) -> Result<GlProgram, String> {
        Ok(glow::NativeProgram(self.name()))
    }

    fn attach_shader(&self, _program: GlProgram, _shader: GlShader) {}

    fn detach_shader(&self, _program: GlProgram, _shader: GlShader) {}

    fn link_program(&self, _program: GlProgram) {}

    fn get_program_link_status(&self, _program: GlProgram) -> bool {
        true
    }

    fn get_program_info_log(&self, _program: GlProgram) -> String {
        String::new()
    }

    fn delete_program(&self, _program: GlProgram) {}

    fn use_program(&self, program: Option<GlProgram>) {
        self.set_parameter(
            glow::CURRENT_PROGRAM,
            program.map_or(0, |p| p.0.get() as i32),
        );
    }

    fn get_uniform_location(&self, _program: GlProgram, name: &str) -> Option<GlUniformLocation> {
        match name {
            "Texture" => Some(glow::NativeUniformLocation(0)),
            "ProjMtx" => Some(glow::NativeUniformLocation(1)),
            _ => None,
        }
    }

    fn get_attrib_location(&self, _program: GlProgram, name: &str) -> Option<u32> {
        match name {
            "Position" => Some(0),
            "UV" => Some(1),
            "Color" => Some(2),
            _ => None,
        }
    }

    fn uniform_1_i32(&self, _location: Option<&GlUniformLocation>, _x: i32) {}

    fn uniform_matrix_4_f32_slice(&self, _location: Option<&GlUniformLocation>, _v: &[f32]) {}

    fn draw_elements(&self, _mode: u32, count: i32, _element_type: u32, offset: i32) {
        self.record_draw(count, offset, None);
    }

    fn draw_elements_base_vertex(
        &self,
        _mode: u32,
        count: i32,
        _element_type: u32,
        offset: i32,
        base_vertex: i32,
    ) {
        self.record_draw(count, offset, Some(base_vertex));
    }
}
