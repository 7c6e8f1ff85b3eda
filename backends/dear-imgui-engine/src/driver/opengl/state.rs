//! OpenGL state saved before and restored after the GUI pass

use std::num::NonZeroU32;

use super::gl::{GlApi, GlBuffer, GlProgram, GlTexture, GlVertexArray};
use super::versions::GlVersion;

/// Every piece of GL state the GUI pass touches
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct GlStateBackup {
    blend_enabled: bool,
    blend_src_rgb: u32,
    blend_dst_rgb: u32,
    blend_src_alpha: u32,
    blend_dst_alpha: u32,
    blend_equation_rgb: u32,
    blend_equation_alpha: u32,

    viewport: [i32; 4],
    scissor_test_enabled: bool,
    scissor_box: [i32; 4],

    array_buffer_binding: Option<GlBuffer>,
    element_array_buffer_binding: Option<GlBuffer>,
    #[cfg(feature = "bind_vertex_array_support")]
    vertex_array_binding: Option<GlVertexArray>,
    /// Enable bits of the GUI's vertex attributes, saved when no VAO scopes them
    vertex_attrib_arrays: Option<[(u32, bool); 3]>,

    active_texture: u32,
    texture_2d_binding: Option<GlTexture>,
    current_program: Option<GlProgram>,

    cull_face_enabled: bool,
    depth_test_enabled: bool,
    stencil_test_enabled: bool,

    #[cfg(feature = "polygon_mode_support")]
    polygon_mode: [i32; 2],
    #[cfg(feature = "primitive_restart_support")]
    primitive_restart_enabled: bool,
}

fn name(value: i32) -> Option<NonZeroU32> {
    NonZeroU32::new(value as u32)
}

fn set_capability<G: GlApi + ?Sized>(gl: &G, cap: u32, enabled: bool) {
    if enabled {
        gl.enable(cap);
    } else {
        gl.disable(cap);
    }
}

fn uses_vertex_array(version: GlVersion) -> bool {
    cfg!(feature = "bind_vertex_array_support") && version.bind_vertex_array_support()
}

impl GlStateBackup {
    /// Save the current state. `attribs` are the vertex attribute locations the pass
    /// enables.
    pub fn backup<G: GlApi + ?Sized>(&mut self, gl: &G, version: GlVersion, attribs: [u32; 3]) {
        self.blend_enabled = gl.is_enabled(glow::BLEND);
        self.blend_src_rgb = gl.get_parameter_i32(glow::BLEND_SRC_RGB) as u32;
        self.blend_dst_rgb = gl.get_parameter_i32(glow::BLEND_DST_RGB) as u32;
        self.blend_src_alpha = gl.get_parameter_i32(glow::BLEND_SRC_ALPHA) as u32;
        self.blend_dst_alpha = gl.get_parameter_i32(glow::BLEND_DST_ALPHA) as u32;
        self.blend_equation_rgb = gl.get_parameter_i32(glow::BLEND_EQUATION_RGB) as u32;
        self.blend_equation_alpha = gl.get_parameter_i32(glow::BLEND_EQUATION_ALPHA) as u32;

        gl.get_parameter_i32_slice(glow::VIEWPORT, &mut self.viewport);
        self.scissor_test_enabled = gl.is_enabled(glow::SCISSOR_TEST);
        gl.get_parameter_i32_slice(glow::SCISSOR_BOX, &mut self.scissor_box);

        self.array_buffer_binding =
            name(gl.get_parameter_i32(glow::ARRAY_BUFFER_BINDING)).map(glow::NativeBuffer);
        self.element_array_buffer_binding =
            name(gl.get_parameter_i32(glow::ELEMENT_ARRAY_BUFFER_BINDING)).map(glow::NativeBuffer);

        #[cfg(feature = "bind_vertex_array_support")]
        if version.bind_vertex_array_support() {
            self.vertex_array_binding =
                name(gl.get_parameter_i32(glow::VERTEX_ARRAY_BINDING)).map(glow::NativeVertexArray);
        }
        // Attribute enables live in the VAO when there is one, otherwise they are global.
        self.vertex_attrib_arrays = (!uses_vertex_array(version))
            .then(|| attribs.map(|index| (index, gl.is_vertex_attrib_array_enabled(index))));

        self.active_texture = gl.get_parameter_i32(glow::ACTIVE_TEXTURE) as u32;
        self.texture_2d_binding =
            name(gl.get_parameter_i32(glow::TEXTURE_BINDING_2D)).map(glow::NativeTexture);
        self.current_program =
            name(gl.get_parameter_i32(glow::CURRENT_PROGRAM)).map(glow::NativeProgram);

        self.cull_face_enabled = gl.is_enabled(glow::CULL_FACE);
        self.depth_test_enabled = gl.is_enabled(glow::DEPTH_TEST);
        self.stencil_test_enabled = gl.is_enabled(glow::STENCIL_TEST);

        #[cfg(feature = "polygon_mode_support")]
        if version.polygon_mode_support() {
            gl.get_parameter_i32_slice(glow::POLYGON_MODE, &mut self.polygon_mode);
        }

        #[cfg(feature = "primitive_restart_support")]
        if version.primitive_restart_support() {
            self.primitive_restart_enabled = gl.is_enabled(glow::PRIMITIVE_RESTART);
        }
    }

    pub fn restore<G: GlApi + ?Sized>(&self, gl: &G, version: GlVersion) {
        set_capability(gl, glow::BLEND, self.blend_enabled);
        gl.blend_func_separate(
            self.blend_src_rgb,
            self.blend_dst_rgb,
            self.blend_src_alpha,
            self.blend_dst_alpha,
        );
        gl.blend_equation_separate(self.blend_equation_rgb, self.blend_equation_alpha);

        let [x, y, w, h] = self.viewport;
        gl.viewport(x, y, w, h);
        set_capability(gl, glow::SCISSOR_TEST, self.scissor_test_enabled);
        let [x, y, w, h] = self.scissor_box;
        gl.scissor(x, y, w, h);

        #[cfg(feature = "bind_vertex_array_support")]
        if version.bind_vertex_array_support() {
            gl.bind_vertex_array(self.vertex_array_binding);
        }
        // The element buffer binding belongs to the VAO, so restore it after the VAO.
        gl.bind_buffer(glow::ARRAY_BUFFER, self.array_buffer_binding);
        gl.bind_buffer(glow::ELEMENT_ARRAY_BUFFER, self.element_array_buffer_binding);
        if let Some(attribs) = self.vertex_attrib_arrays {
            for (index, enabled) in attribs {
                if enabled {
                    gl.enable_vertex_attrib_array(index);
                } else {
                    gl.disable_vertex_attrib_array(index);
                }
            }
        }

        gl.active_texture(self.active_texture);
        gl.bind_texture(glow::TEXTURE_2D, self.texture_2d_binding);
        gl.use_program(self.current_program);

        set_capability(gl, glow::CULL_FACE, self.cull_face_enabled);
        set_capability(gl, glow::DEPTH_TEST, self.depth_test_enabled);
        set_capability(gl, glow::STENCIL_TEST, self.stencil_test_enabled);

        #[cfg(feature = "polygon_mode_support")]
        if version.polygon_mode_support() {
            gl.polygon_mode(glow::FRONT_AND_BACK, self.polygon_mode[0] as u32);
        }

        #[cfg(feature = "primitive_restart_support")]
        if version.primitive_restart_support() {
            set_capability(gl, glow::PRIMITIVE_RESTART, self.primitive_restart_enabled);
        }

        let _ = version;
    }
}
