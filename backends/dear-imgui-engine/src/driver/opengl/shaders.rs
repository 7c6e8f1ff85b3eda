//! The GUI shader program

use super::gl::{GlApi, GlProgram, GlShader, GlUniformLocation};
use super::versions::GlVersion;
use crate::error::{DriverError, DriverResult};

/// Linked program with its uniform and attribute locations
#[derive(Debug)]
pub struct Shaders {
    pub program: GlProgram,
    pub texture_location: Option<GlUniformLocation>,
    pub projection_location: Option<GlUniformLocation>,
    pub position_attrib: u32,
    pub uv_attrib: u32,
    pub color_attrib: u32,
}

impl Shaders {
    pub fn new<G: GlApi + ?Sized>(gl: &G, version: GlVersion) -> DriverResult<Self> {
        let vertex = compile(gl, glow::VERTEX_SHADER, &vertex_source(version), "Vertex")?;
        let fragment = match compile(
            gl,
            glow::FRAGMENT_SHADER,
            &fragment_source(version),
            "Fragment",
        ) {
            Ok(fragment) => fragment,
            Err(err) => {
                gl.delete_shader(vertex);
                return Err(err);
            }
        };

        let program = gl.create_program().map_err(|err| {
            gl.delete_shader(vertex);
            gl.delete_shader(fragment);
            DriverError::CreateShader(err)
        })?;
        gl.attach_shader(program, vertex);
        gl.attach_shader(program, fragment);
        gl.link_program(program);
        let linked = gl.get_program_link_status(program);
        gl.detach_shader(program, vertex);
        gl.detach_shader(program, fragment);
        gl.delete_shader(vertex);
        gl.delete_shader(fragment);
        if !linked {
            let log = gl.get_program_info_log(program);
            gl.delete_program(program);
            return Err(DriverError::LinkProgram(log));
        }

        let attribs = ["Position", "UV", "Color"].map(|name| gl.get_attrib_location(program, name));
        let [Some(position_attrib), Some(uv_attrib), Some(color_attrib)] = attribs else {
            gl.delete_program(program);
            return Err(DriverError::LinkProgram(
                "Could not find Position, UV and Color attributes".to_string(),
            ));
        };

        Ok(Self {
            program,
            texture_location: gl.get_uniform_location(program, "Texture"),
            projection_location: gl.get_uniform_location(program, "ProjMtx"),
            position_attrib,
            uv_attrib,
            color_attrib,
        })
    }

    pub fn destroy<G: GlApi + ?Sized>(&self, gl: &G) {
        gl.delete_program(self.program);
    }
}

fn compile<G: GlApi + ?Sized>(
    gl: &G,
    kind: u32,
    source: &str,
    label: &str,
) -> DriverResult<GlShader> {
    let shader = gl.create_shader(kind).map_err(DriverError::CreateShader)?;
    gl.shader_source(shader, source);
    gl.compile_shader(shader);
    if !gl.get_shader_compile_status(shader) {
        let log = gl.get_shader_info_log(shader);
        gl.delete_shader(shader);
        return Err(DriverError::CompileShader(format!("{label} shader: {log}")));
    }
    Ok(shader)
}

fn precision(version: GlVersion) -> &'static str {
    if version.is_es {
        "precision mediump float;"
    } else {
        ""
    }
}

pub(crate) fn vertex_source(version: GlVersion) -> String {
    let (input, output) = if version.legacy_glsl() {
        ("attribute", "varying")
    } else {
        ("in", "out")
    };
    format!(
        r#"{directive}
{precision}
uniform mat4 ProjMtx;
{input} vec2 Position;
{input} vec2 UV;
{input} vec4 Color;
{output} vec2 Frag_UV;
{output} vec4 Frag_Color;

void main()
{{
    Frag_UV = UV;
    Frag_Color = Color;
    gl_Position = ProjMtx * vec4(Position.xy, 0, 1);
}}
"#,
        directive = version.glsl_directive(),
        precision = precision(version),
    )
}

pub(crate) fn fragment_source(version: GlVersion) -> String {
    if version.legacy_glsl() {
        format!(
            r#"{directive}
{precision}
uniform sampler2D Texture;
varying vec2 Frag_UV;
varying vec4 Frag_Color;

void main()
{{
    gl_FragColor = Frag_Color * texture2D(Texture, Frag_UV.st);
}}
"#,
            directive = version.glsl_directive(),
            precision = precision(version),
        )
    } else {
        format!(
            r#"{directive}
{precision}
uniform sampler2D Texture;
in vec2 Frag_UV;
in vec4 Frag_Color;
out vec4 Out_Color;

void main()
{{
    Out_Color = Frag_Color * texture(Texture, Frag_UV.st);
}}
"#,
            directive = version.glsl_directive(),
            precision = precision(version),
        )
    }
}
