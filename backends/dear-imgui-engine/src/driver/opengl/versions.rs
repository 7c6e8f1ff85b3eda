//! OpenGL version detection and what each version can do

use super::gl::GlApi;

/// OpenGL (or OpenGL ES) version of the current context
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GlVersion {
    pub major: u32,
    pub minor: u32,
    pub is_es: bool,
}

impl GlVersion {
    pub fn read<G: GlApi + ?Sized>(gl: &G) -> Self {
        Self::parse(&gl.version_string())
    }

    /// Parse a `GL_VERSION` string such as `"4.6.0 NVIDIA 460.89"` or
    /// `"OpenGL ES 3.0 Mesa 22.0"`
    pub fn parse(version_string: &str) -> Self {
        let is_es = version_string.contains("OpenGL ES");
        let (major, minor) = version_string
            .split_whitespace()
            .find_map(parse_major_minor)
            .unwrap_or(if is_es { (2, 0) } else { (2, 1) });
        Self {
            major,
            minor,
            is_es,
        }
    }

    fn at_least(self, major: u32, minor: u32) -> bool {
        (self.major, self.minor) >= (major, minor)
    }

    /// `glBindVertexArray`: GL 3.0+ and ES 3.0+
    pub fn bind_vertex_array_support(self) -> bool {
        self.major >= 3
    }

    /// `glDrawElementsBaseVertex`: desktop GL 3.2+
    pub fn vertex_offset_support(self) -> bool {
        !self.is_es && self.at_least(3, 2)
    }

    /// `glPolygonMode`: desktop GL only
    pub fn polygon_mode_support(self) -> bool {
        !self.is_es
    }

    /// `GL_PRIMITIVE_RESTART`: desktop GL 3.1+
    pub fn primitive_restart_support(self) -> bool {
        !self.is_es && self.at_least(3, 1)
    }

    /// `#version` line for shaders compiled on this context
    pub fn glsl_directive(self) -> &'static str {
        if self.is_es {
            return if self.major >= 3 {
                "#version 300 es"
            } else {
                "#version 100"
            };
        }
        match (self.major, self.minor) {
            (4.., _) | (3, 3..) => "#version 330 core",
            (3, 2) => "#version 150",
            (3, _) => "#version 130",
            _ => "#version 120",
        }
    }

    /// GLSL 1.20 / ES 1.00 use `attribute`/`varying` instead of `in`/`out`
    pub fn legacy_glsl(self) -> bool {
        matches!(self.glsl_directive(), "#version 120" | "#version 100")
    }
}

fn parse_major_minor(word: &str) -> Option<(u32, u32)> {
    let mut parts = word.split('.');
    let major = parts.next()?.parse().ok()?;
    let minor = parts.next()?.parse().ok()?;
    Some((major, minor))
}
