//! Read-only view of a frame's draw lists, as consumed by the drivers

use dear_imgui_rs::internal::RawWrapper;
use dear_imgui_rs::render::{DrawCmd, DrawData, DrawIdx, DrawVert};
use dear_imgui_rs::{TextureId, sys};

use crate::error::DriverResult;

/// Viewport of one rendered frame
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RenderFrame {
    pub display_pos: [f32; 2],
    pub display_size: [f32; 2],
    pub framebuffer_scale: [f32; 2],
}

impl RenderFrame {
    pub fn from_draw_data(draw_data: &DrawData) -> Self {
        Self {
            display_pos: draw_data.display_pos,
            display_size: draw_data.display_size,
            framebuffer_scale: draw_data.framebuffer_scale,
        }
    }

    /// Framebuffer size in pixels
    pub fn framebuffer_size(&self) -> [f32; 2] {
        [
            self.display_size[0] * self.framebuffer_scale[0],
            self.display_size[1] * self.framebuffer_scale[1],
        ]
    }

    /// Whether there is anything to draw into
    pub fn is_visible(&self) -> bool {
        let [w, h] = self.framebuffer_size();
        w > 0.0 && h > 0.0
    }

    /// Orthographic projection mapping the display rectangle to clip space
    pub fn ortho_projection(&self) -> [f32; 16] {
        let l = self.display_pos[0];
        let r = self.display_pos[0] + self.display_size[0];
        let t = self.display_pos[1];
        let b = self.display_pos[1] + self.display_size[1];
        #[rustfmt::skip]
        let projection = [
            2.0 / (r - l),     0.0,               0.0,  0.0,
            0.0,               2.0 / (t - b),     0.0,  0.0,
            0.0,               0.0,               -1.0, 0.0,
            (r + l) / (l - r), (t + b) / (b - t), 0.0,  1.0,
        ];
        projection
    }

    /// Scissor box `[x, y, width, height]` for `clip_rect` in framebuffer pixels, with
    /// GL's lower-left origin. `None` when the clip rectangle is empty.
    pub fn scissor_rect(&self, clip_rect: [f32; 4]) -> Option<[i32; 4]> {
        let [sx, sy] = self.framebuffer_scale;
        let [px, py] = self.display_pos;
        let min_x = (clip_rect[0] - px) * sx;
        let min_y = (clip_rect[1] - py) * sy;
        let max_x = (clip_rect[2] - px) * sx;
        let max_y = (clip_rect[3] - py) * sy;
        if max_x <= min_x || max_y <= min_y {
            return None;
        }
        let fb_height = self.framebuffer_size()[1];
        Some([
            min_x as i32,
            (fb_height - max_y) as i32,
            (max_x - min_x) as i32,
            (max_y - min_y) as i32,
        ])
    }
}

/// One command of a draw list
pub enum DrawCommand<'a> {
    /// Draw `count` indices starting at `idx_offset` with `texture_id` bound
    Elements {
        count: usize,
        clip_rect: [f32; 4],
        texture_id: TextureId,
        vtx_offset: usize,
        idx_offset: usize,
    },
    /// Re-apply the GUI render state
    ResetRenderState,
    /// User callback registered on the draw list
    Callback(&'a mut dyn FnMut()),
}

/// A draw list borrowed for a single submission
pub trait DrawListSource {
    fn vertices(&self) -> &[DrawVert];

    fn indices(&self) -> &[DrawIdx];

    /// Feed every command to `visitor` in order, stopping at the first error
    fn visit_commands(
        &self,
        visitor: &mut dyn FnMut(DrawCommand<'_>) -> DriverResult<()>,
    ) -> DriverResult<()>;
}

/// A Dear ImGui draw list of the current frame
pub struct ImGuiDrawList<'a> {
    vertices: &'a [DrawVert],
    indices: &'a [DrawIdx],
    commands: Vec<DrawCmd>,
    raw: &'a sys::ImDrawList,
}

impl<'a> ImGuiDrawList<'a> {
    /// Views of every draw list in `draw_data`
    pub fn collect(draw_data: &'a DrawData) -> Vec<Self> {
        draw_data
            .draw_lists()
            .map(|list| Self {
                vertices: list.vtx_buffer(),
                indices: list.idx_buffer(),
                commands: list.commands().collect(),
                raw: unsafe { list.raw() },
            })
            .collect()
    }
}

impl DrawListSource for ImGuiDrawList<'_> {
    fn vertices(&self) -> &[DrawVert] {
        self.vertices
    }

    fn indices(&self) -> &[DrawIdx] {
        self.indices
    }

    fn visit_commands(
        &self,
        visitor: &mut dyn FnMut(DrawCommand<'_>) -> DriverResult<()>,
    ) -> DriverResult<()> {
        for command in &self.commands {
            match command {
                DrawCmd::Elements {
                    count, cmd_params, ..
                } => visitor(DrawCommand::Elements {
                    count: *count,
                    clip_rect: cmd_params.clip_rect,
                    texture_id: cmd_params.texture_id,
                    vtx_offset: cmd_params.vtx_offset,
                    idx_offset: cmd_params.idx_offset,
                })?,
                DrawCmd::ResetRenderState => visitor(DrawCommand::ResetRenderState)?,
                DrawCmd::RawCallback { callback, raw_cmd } => {
                    let (callback, raw_cmd, raw) = (*callback, *raw_cmd, self.raw);
                    let mut invoke = || unsafe { callback(raw, raw_cmd) };
                    visitor(DrawCommand::Callback(&mut invoke))?;
                }
            }
        }
        Ok(())
    }
}
