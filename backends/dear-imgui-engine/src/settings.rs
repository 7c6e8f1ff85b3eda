//! GUI settings shared by every handle on a thread

use std::path::PathBuf;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Settings applied to the shared Dear ImGui context
///
/// There is only one context per thread, so every [`GuiHandle`](crate::GuiHandle)
/// observes the settings most recently set through any of them.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize), serde(default))]
pub struct GuiSettings {
    /// Framebuffer pixels per display unit
    pub framebuffer_scale: [f32; 2],
    /// Let Dear ImGui draw the mouse cursor itself
    pub draw_software_cursor: bool,
    /// Enable keyboard navigation
    pub keyboard_navigation: bool,
    /// Where window layout is persisted; `None` disables persistence
    pub ini_filename: Option<PathBuf>,
}

impl Default for GuiSettings {
    fn default() -> Self {
        Self {
            framebuffer_scale: [1.0, 1.0],
            draw_software_cursor: false,
            keyboard_navigation: false,
            ini_filename: None,
        }
    }
}

impl GuiSettings {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_framebuffer_scale(mut self, scale: [f32; 2]) -> Self {
        self.framebuffer_scale = scale;
        self
    }

    pub fn with_software_cursor(mut self, enabled: bool) -> Self {
        self.draw_software_cursor = enabled;
        self
    }

    pub fn with_keyboard_navigation(mut self, enabled: bool) -> Self {
        self.keyboard_navigation = enabled;
        self
    }

    pub fn with_ini_filename(mut self, path: Option<impl Into<PathBuf>>) -> Self {
        self.ini_filename = path.map(Into::into);
        self
    }
}
