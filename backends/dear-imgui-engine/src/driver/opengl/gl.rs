//! The slice of OpenGL the driver uses
//!
//! Keeping the surface narrow lets tests swap the real context for a recording fake.

use glow::HasContext;

pub type GlBuffer = glow::NativeBuffer;
pub type GlTexture = glow::NativeTexture;
pub type GlVertexArray = glow::NativeVertexArray;
pub type GlProgram = glow::NativeProgram;
pub type GlShader = glow::NativeShader;
pub type GlUniformLocation = glow::NativeUniformLocation;

/// OpenGL calls issued by [`OpenGlDriver`](super::OpenGlDriver)
///
/// Must only be used from the thread that owns the GL context.
pub trait GlApi {
    fn version_string(&self) -> String;

    fn is_enabled(&self, cap: u32) -> bool;
    fn enable(&self, cap: u32);
    fn disable(&self, cap: u32);
    fn get_parameter_i32(&self, parameter: u32) -> i32;
    fn get_parameter_i32_slice(&self, parameter: u32, out: &mut [i32]);

    fn blend_equation(&self, mode: u32);
    fn blend_equation_separate(&self, mode_rgb: u32, mode_alpha: u32);
    fn blend_func_separate(&self, src_rgb: u32, dst_rgb: u32, src_alpha: u32, dst_alpha: u32);
    fn viewport(&self, x: i32, y: i32, width: i32, height: i32);
    fn scissor(&self, x: i32, y: i32, width: i32, height: i32);
    fn polygon_mode(&self, face: u32, mode: u32);

    fn create_buffer(&self) -> Result<GlBuffer, String>;
    fn delete_buffer(&self, buffer: GlBuffer);
    fn bind_buffer(&self, target: u32, buffer: Option<GlBuffer>);
    fn buffer_data_u8_slice(&self, target: u32, data: &[u8], usage: u32);

    fn create_vertex_array(&self) -> Result<GlVertexArray, String>;
    fn delete_vertex_array(&self, vertex_array: GlVertexArray);
    fn bind_vertex_array(&self, vertex_array: Option<GlVertexArray>);
    fn enable_vertex_attrib_array(&self, index: u32);
    fn disable_vertex_attrib_array(&self, index: u32);
    fn is_vertex_attrib_array_enabled(&self, index: u32) -> bool;
    #[allow(clippy::too_many_arguments)]
    fn vertex_attrib_pointer_f32(
        &self,
        index: u32,
        size: i32,
        data_type: u32,
        normalized: bool,
        stride: i32,
        offset: i32,
    );

    fn active_texture(&self, unit: u32);
    fn create_texture(&self) -> Result<GlTexture, String>;
    fn delete_texture(&self, texture: GlTexture);
    fn bind_texture(&self, target: u32, texture: Option<GlTexture>);
    fn tex_parameter_i32(&self, target: u32, parameter: u32, value: i32);
    fn pixel_store_i32(&self, parameter: u32, value: i32);
    #[allow(clippy::too_many_arguments)]
    fn tex_image_2d(
        &self,
        target: u32,
        internal_format: i32,
        width: i32,
        height: i32,
        format: u32,
        ty: u32,
        pixels: &[u8],
    );

    fn create_shader(&self, shader_type: u32) -> Result<GlShader, String>;
    fn shader_source(&self, shader: GlShader, source: &str);
    fn compile_shader(&self, shader: GlShader);
    fn get_shader_compile_status(&self, shader: GlShader) -> bool;
    fn get_shader_info_log(&self, shader: GlShader) -> String;
    fn delete_shader(&self, shader: GlShader);
    fn create_program(&self) -> Result<GlProgram, String>;
    fn attach_shader(&self, program: GlProgram, shader: GlShader);
    fn detach_shader(&self, program: GlProgram, shader: GlShader);
    fn link_program(&self, program: GlProgram);
    fn get_program_link_status(&self, program: GlProgram) -> bool;
    fn get_program_info_log(&self, program: GlProgram) -> String;
    fn delete_program(&self, program: GlProgram);
    fn use_program(&self, program: Option<GlProgram>);
    fn get_uniform_location(&self, program: GlProgram, name: &str) -> Option<GlUniformLocation>;
    fn get_attrib_location(&self, program: GlProgram, name: &str) -> Option<u32>;
    fn uniform_1_i32(&self, location: Option<&GlUniformLocation>, x: i32);
    fn uniform_matrix_4_f32_slice(&self, location: Option<&GlUniformLocation>, v: &[f32]);

    fn draw_elements(&self, mode: u32, count: i32, element_type: u32, offset: i32);
    fn draw_elements_base_vertex(
        &self,
        mode: u32,
        count: i32,
        element_type: u32,
        offset: i32,
        base_vertex: i32,
    );
}

impl GlApi for glow::Context {
    fn version_string(&self) -> String {
        unsafe { self.get_parameter_string(glow::VERSION) }
    }

    fn is_enabled(&self, cap: u32) -> bool {
        unsafe { HasContext::is_enabled(self, cap) }
    }

    fn enable(&self, cap: u32) {
        unsafe { HasContext::enable(self, cap) }
    }

    fn disable(&self, cap: u32) {
        unsafe { HasContext::disable(self, cap) }
    }

    fn get_parameter_i32(&self, parameter: u32) -> i32 {
        unsafe { HasContext::get_parameter_i32(self, parameter) }
    }

    fn get_parameter_i32_slice(&self, parameter: u32, out: &mut [i32]) {
        unsafe { HasContext::get_parameter_i32_slice(self, parameter, out) }
    }

    fn blend_equation(&self, mode: u32) {
        unsafe { HasContext::blend_equation(self, mode) }
    }

    fn blend_equation_separate(&self, mode_rgb: u32, mode_alpha: u32) {
        unsafe { HasContext::blend_equation_separate(self, mode_rgb, mode_alpha) }
    }

    fn blend_func_separate(&self, src_rgb: u32, dst_rgb: u32, src_alpha: u32, dst_alpha: u32) {
        unsafe { HasContext::blend_func_separate(self, src_rgb, dst_rgb, src_alpha, dst_alpha) }
    }

    fn viewport(&self, x: i32, y: i32, width: i32, height: i32) {
        unsafe { HasContext::viewport(self, x, y, width, height) }
    }

    fn scissor(&self, x: i32, y: i32, width: i32, height: i32) {
        unsafe { HasContext::scissor(self, x, y, width, height) }
    }

    fn polygon_mode(&self, face: u32, mode: u32) {
        unsafe { HasContext::polygon_mode(self, face, mode) }
    }

    fn create_buffer(&self) -> Result<GlBuffer, String> {
        unsafe { HasContext::create_buffer(self) }
    }

    fn delete_buffer(&self, buffer: GlBuffer) {
        unsafe { HasContext::delete_buffer(self, buffer) }
    }

    fn bind_buffer(&self, target: u32, buffer: Option<GlBuffer>) {
        unsafe { HasContext::bind_buffer(self, target, buffer) }
    }

    fn buffer_data_u8_slice(&self, target: u32, data: &[u8], usage: u32) {
        unsafe { HasContext::buffer_data_u8_slice(self, target, data, usage) }
    }

    fn create_vertex_array(&self) -> Result<GlVertexArray, String> {
        unsafe { HasContext::create_vertex_array(self) }
    }

    fn delete_vertex_array(&self, vertex_array: GlVertexArray) {
        unsafe { HasContext::delete_vertex_array(self, vertex_array) }
    }

    fn bind_vertex_array(&self, vertex_array: Option<GlVertexArray>) {
        unsafe { HasContext::bind_vertex_array(self, vertex_array) }
    }

    fn enable_vertex_attrib_array(&self, index: u32) {
        unsafe { HasContext::enable_vertex_attrib_array(self, index) }
    }

    fn disable_vertex_attrib_array(&self, index: u32) {
        unsafe { HasContext::disable_vertex_attrib_array(self, index) }
    }

    fn is_vertex_attrib_array_enabled(&self, index: u32) -> bool {
        let mut enabled = [0.0f32];
        unsafe {
            HasContext::get_vertex_attrib_parameter_f32_slice(
                self,
                index,
                glow::VERTEX_ATTRIB_ARRAY_ENABLED,
                &mut enabled,
            )
        }
        enabled[0] != 0.0
    }

    fn vertex_attrib_pointer_f32(
        &self,
        index: u32,
        size: i32,
        data_type: u32,
        normalized: bool,
        stride: i32,
        offset: i32,
    ) {
        unsafe {
            HasContext::vertex_attrib_pointer_f32(
                self, index, size, data_type, normalized, stride, offset,
            )
        }
    }

    fn active_texture(&self, unit: u32) {
        unsafe { HasContext::active_texture(self, unit) }
    }

    fn create_texture(&self) -> Result<GlTexture, String> {
        unsafe { HasContext::create_texture(self) }
    }

    fn delete_texture(&self, texture: GlTexture) {
        unsafe { HasContext::delete_texture(self, texture) }
    }

    fn bind_texture(&self, target: u32, texture: Option<GlTexture>) {
        unsafe { HasContext::bind_texture(self, target, texture) }
    }

    fn tex_parameter_i32(&self, target: u32, parameter: u32, value: i32) {
        unsafe { HasContext::tex_parameter_i32(self, target, parameter, value) }
    }

    fn pixel_store_i32(&self, parameter: u32, value: i32) {
        unsafe { HasContext::pixel_store_i32(self, parameter, value) }
    }

    fn tex_image_2d(
        &self,
        target: u32,
        internal_format: i32,
        width: i32,
        height: i32,
        format: u32,
        ty: u32,
        pixels: &[u8],
    ) {
        unsafe {
            HasContext::tex_image_2d(
                self,
                target,
                0,
                internal_format,
                width,
                height,
                0,
                format,
                ty,
                glow::PixelUnpackData::Slice(Some(pixels)),
            )
        }
    }

    fn create_shader(&self, shader_type: u32) -> Result<GlShader, String> {
        unsafe { HasContext::create_shader(self, shader_type) }
    }

    fn shader_source(&self, shader: GlShader, source: &str) {
        unsafe { HasContext::shader_source(self, shader, source) }
    }

    fn compile_shader(&self, shader: GlShader) {
        unsafe { HasContext::compile_shader(self, shader) }
    }

    fn get_shader_compile_status(&self, shader: GlShader) -> bool {
        unsafe { HasContext::get_shader_compile_status(self, shader) }
    }

    fn get_shader_info_log(&self, shader: GlShader) -> String {
        unsafe { HasContext::get_shader_info_log(self, shader) }
    }

    fn delete_shader(&self, shader: GlShader) {
        unsafe { HasContext::delete_shader(self, shader) }
    }

    fn create_program(&self) -> Result<GlProgram, String> {
        unsafe { HasContext::create_program(self) }
    }

    fn attach_shader(&self, program: GlProgram, shader: GlShader) {
        unsafe { HasContext::attach_shader(self, program, shader) }
    }

    fn detach_shader(&self, program: GlProgram, shader: GlShader) {
        unsafe { HasContext::detach_shader(self, program, shader) }
    }

    fn link_program(&self, program: GlProgram) {
        unsafe { HasContext::link_program(self, program) }
    }

    fn get_program_link_status(&self, program: GlProgram) -> bool {
        unsafe { HasContext::get_program_link_status(self, program) }
    }

    fn get_program_info_log(&self, program: GlProgram) -> String {
        unsafe { HasContext::get_program_info_log(self, program) }
    }

    fn delete_program(&self, program: GlProgram) {
        unsafe { HasContext::delete_program(self, program) }
    }

    fn use_program(&self, program: Option<GlProgram>) {
        unsafe { HasContext::use_program(self, program) }
    }

    fn get_uniform_location(&self, program: GlProgram, name: &str) -> Option<GlUniformLocation> {
        unsafe { HasContext::get_uniform_location(self, program, name) }
    }

    fn get_attrib_location(&self, program: GlProgram, name: &str) -> Option<u32> {
        unsafe { HasContext::get_attrib_location(self, program, name) }
    }

    fn uniform_1_i32(&self, location: Option<&GlUniformLocation>, x: i32) {
        unsafe { HasContext::uniform_1_i32(self, location, x) }
    }

    fn uniform_matrix_4_f32_slice(&self, location: Option<&GlUniformLocation>, v: &[f32]) {
        unsafe { HasContext::uniform_matrix_4_f32_slice(self, location, false, v) }
    }

    fn draw_elements(&self, mode: u32, count: i32, element_type: u32, offset: i32) {
        unsafe { HasContext::draw_elements(self, mode, count, element_type, offset) }
    }

    fn draw_elements_base_vertex(
        &self,
        mode: u32,
        count: i32,
        element_type: u32,
        offset: i32,
        base_vertex: i32,
    ) {
        unsafe {
            HasContext::draw_elements_base_vertex(
                self,
                mode,
                count,
                element_type,
                offset,
                base_vertex,
            )
        }
    }
}
