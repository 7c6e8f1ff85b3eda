//! Input events coming from the engine
//!
//! The host pushes events into an [`EventStorage`] from its event receiver; the handle
//! drains them into Dear ImGui's IO queue at the start of each frame, keeping the order
//! in which they arrived.

use std::collections::VecDeque;

use bitflags::bitflags;
use dear_imgui_rs::{Io, Key, input::MouseButton as ImGuiMouseButton};

bitflags! {
    /// Modifier keys held while a key event happened
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
    pub struct Modifiers: u8 {
        const SHIFT = 1 << 0;
        const CTRL = 1 << 1;
        const ALT = 1 << 2;
        const SUPER = 1 << 3;
    }
}

/// Mouse buttons the engine reports
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MouseButton {
    Left,
    Right,
    Middle,
}

impl MouseButton {
    const fn index(self) -> usize {
        match self {
            MouseButton::Left => 0,
            MouseButton::Right => 1,
            MouseButton::Middle => 2,
        }
    }
}

/// Convert an engine mouse button to a Dear ImGui mouse button
pub fn to_imgui_mouse_button(button: MouseButton) -> ImGuiMouseButton {
    match button {
        MouseButton::Left => ImGuiMouseButton::Left,
        MouseButton::Right => ImGuiMouseButton::Right,
        MouseButton::Middle => ImGuiMouseButton::Middle,
    }
}

/// Keys the engine reports
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EngineKey {
    /// A printable key, identified by its unshifted character
    Character(char),
    /// Function key `F1`..=`F12`
    Function(u8),
    Tab,
    Left,
    Right,
    Up,
    Down,
    PageUp,
    PageDown,
    Home,
    End,
    Insert,
    Delete,
    Backspace,
    Space,
    Enter,
    Escape,
    Menu,
    LeftShift,
    RightShift,
    LeftCtrl,
    RightCtrl,
    LeftAlt,
    RightAlt,
    LeftSuper,
    RightSuper,
}

/// Convert an engine key to a Dear ImGui key
pub fn to_imgui_key(key: EngineKey) -> Option<Key> {
    let key = match key {
        EngineKey::Character(ch) => return character_key(ch),
        EngineKey::Function(n) => return function_key(n),
        EngineKey::Tab => Key::Tab,
        EngineKey::Left => Key::LeftArrow,
        EngineKey::Right => Key::RightArrow,
        EngineKey::Up => Key::UpArrow,
        EngineKey::Down => Key::DownArrow,
        EngineKey::PageUp => Key::PageUp,
        EngineKey::PageDown => Key::PageDown,
        EngineKey::Home => Key::Home,
        EngineKey::End => Key::End,
        EngineKey::Insert => Key::Insert,
        EngineKey::Delete => Key::Delete,
        EngineKey::Backspace => Key::Backspace,
        EngineKey::Space => Key::Space,
        EngineKey::Enter => Key::Enter,
        EngineKey::Escape => Key::Escape,
        EngineKey::Menu => Key::Menu,
        EngineKey::LeftShift => Key::LeftShift,
        EngineKey::RightShift => Key::RightShift,
        EngineKey::LeftCtrl => Key::LeftCtrl,
        EngineKey::RightCtrl => Key::RightCtrl,
        EngineKey::LeftAlt => Key::LeftAlt,
        EngineKey::RightAlt => Key::RightAlt,
        EngineKey::LeftSuper => Key::LeftSuper,
        EngineKey::RightSuper => Key::RightSuper,
    };
    Some(key)
}

fn character_key(ch: char) -> Option<Key> {
    match ch.to_ascii_uppercase() {
        '0' => Some(Key::Key0),
        '1' => Some(Key::Key1),
        '2' => Some(Key::Key2),
        '3' => Some(Key::Key3),
        '4' => Some(Key::Key4),
        '5' => Some(Key::Key5),
        '6' => Some(Key::Key6),
        '7' => Some(Key::Key7),
        '8' => Some(Key::Key8),
        '9' => Some(Key::Key9),
        'A' => Some(Key::A),
        'B' => Some(Key::B),
        'C' => Some(Key::C),
        'D' => Some(Key::D),
        'E' => Some(Key::E),
        'F' => Some(Key::F),
        'G' => Some(Key::G),
        'H' => Some(Key::H),
        'I' => Some(Key::I),
        'J' => Some(Key::J),
        'K' => Some(Key::K),
        'L' => Some(Key::L),
        'M' => Some(Key::M),
        'N' => Some(Key::N),
        'O' => Some(Key::O),
        'P' => Some(Key::P),
        'Q' => Some(Key::Q),
        'R' => Some(Key::R),
        'S' => Some(Key::S),
        'T' => Some(Key::T),
        'U' => Some(Key::U),
        'V' => Some(Key::V),
        'W' => Some(Key::W),
        'X' => Some(Key::X),
        'Y' => Some(Key::Y),
        'Z' => Some(Key::Z),
        _ => None,
    }
}

fn function_key(n: u8) -> Option<Key> {
    match n {
        1 => Some(Key::F1),
        2 => Some(Key::F2),
        3 => Some(Key::F3),
        4 => Some(Key::F4),
        5 => Some(Key::F5),
        6 => Some(Key::F6),
        7 => Some(Key::F7),
        8 => Some(Key::F8),
        9 => Some(Key::F9),
        10 => Some(Key::F10),
        11 => Some(Key::F11),
        12 => Some(Key::F12),
        _ => None,
    }
}

/// One input event from the engine
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum InputEvent {
    /// Mouse moved to `[x, y]` in screen pixels
    MouseMoved([f32; 2]),
    MouseButton { button: MouseButton, pressed: bool },
    /// Vertical wheel movement in lines, positive away from the user
    MouseWheel(f32),
    Key {
        key: EngineKey,
        pressed: bool,
        modifiers: Modifiers,
    },
    /// Text input
    Character(char),
}

/// Input collected from the engine between two frames
#[derive(Debug, Default)]
pub struct EventStorage {
    pending: VecDeque<InputEvent>,
    mouse_pos: [f32; 2],
    mouse_down: [bool; 3],
    modifiers: Modifiers,
}

impl EventStorage {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record an event and update the current input state
    pub fn push(&mut self, event: InputEvent) {
        match event {
            InputEvent::MouseMoved(pos) => self.mouse_pos = pos,
            InputEvent::MouseButton { button, pressed } => {
                self.mouse_down[button.index()] = pressed;
            }
            InputEvent::Key { modifiers, .. } => self.modifiers = modifiers,
            InputEvent::MouseWheel(_) | InputEvent::Character(_) => {}
        }
        self.pending.push_back(event);
    }

    /// Last known mouse position
    pub fn mouse_pos(&self) -> [f32; 2] {
        self.mouse_pos
    }

    pub fn is_mouse_down(&self, button: MouseButton) -> bool {
        self.mouse_down[button.index()]
    }

    /// Modifiers reported with the last key event
    pub fn modifiers(&self) -> Modifiers {
        self.modifiers
    }

    /// Number of events waiting for the next frame
    pub fn pending_len(&self) -> usize {
        self.pending.len()
    }

    /// Take all pending events in arrival order
    pub fn drain(&mut self) -> impl Iterator<Item = InputEvent> + '_ {
        self.pending.drain(..)
    }

    /// Forward every pending event into Dear ImGui's input queue
    ///
    /// Mouse positions arrive in screen pixels and are divided by `framebuffer_scale`,
    /// the same factor that maps the screen size to the display size.
    pub(crate) fn flush_into(&mut self, io: &mut Io, framebuffer_scale: [f32; 2]) {
        let mut modifiers = None;
        for event in self.pending.drain(..) {
            match event {
                InputEvent::MouseMoved(pos) => {
                    io.add_mouse_pos_event(to_display_position(pos, framebuffer_scale));
                }
                InputEvent::MouseButton { button, pressed } => {
                    io.add_mouse_button_event(to_imgui_mouse_button(button), pressed);
                }
                InputEvent::MouseWheel(delta) => io.add_mouse_wheel_event([0.0, delta]),
                InputEvent::Key {
                    key,
                    pressed,
                    modifiers: mods,
                } => {
                    if modifiers != Some(mods) {
                        apply_modifiers(io, mods);
                        modifiers = Some(mods);
                    }
                    if let Some(key) = to_imgui_key(key) {
                        io.add_key_event(key, pressed);
                    }
                }
                InputEvent::Character(ch) => {
                    if !ch.is_control() || matches!(ch, '\t' | '\n' | '\r') {
                        io.add_input_character(ch);
                    }
                }
            }
        }
    }
}

/// Screen pixels to Dear ImGui display coordinates
pub fn to_display_position(pos: [f32; 2], framebuffer_scale: [f32; 2]) -> [f32; 2] {
    [pos[0] / framebuffer_scale[0], pos[1] / framebuffer_scale[1]]
}

// Dear ImGui tracks modifiers through the left/right modifier keys.
fn apply_modifiers(io: &mut Io, modifiers: Modifiers) {
    let shift = modifiers.contains(Modifiers::SHIFT);
    let ctrl = modifiers.contains(Modifiers::CTRL);
    let alt = modifiers.contains(Modifiers::ALT);
    let sup = modifiers.contains(Modifiers::SUPER);
    io.add_key_event(Key::LeftShift, shift);
    io.add_key_event(Key::RightShift, shift);
    io.add_key_event(Key::LeftCtrl, ctrl);
    io.add_key_event(Key::RightCtrl, ctrl);
    io.add_key_event(Key::LeftAlt, alt);
    io.add_key_event(Key::RightAlt, alt);
    io.add_key_event(Key::LeftSuper, sup);
    io.add_key_event(Key::RightSuper, sup);
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn key_mapping() {
        assert_eq!(to_imgui_key(EngineKey::Character('a')), Some(Key::A));
        assert_eq!(to_imgui_key(EngineKey::Character('Z')), Some(Key::Z));
        assert_eq!(to_imgui_key(EngineKey::Character('7')), Some(Key::Key7));
        assert_eq!(to_imgui_key(EngineKey::Character('#')), None);
        assert_eq!(to_imgui_key(EngineKey::Function(12)), Some(Key::F12));
        assert_eq!(to_imgui_key(EngineKey::Function(13)), None);
        assert_eq!(to_imgui_key(EngineKey::Enter), Some(Key::Enter));
        assert_eq!(to_imgui_key(EngineKey::Left), Some(Key::LeftArrow));
    }

    #[test]
    fn mouse_button_mapping() {
        assert_eq!(to_imgui_mouse_button(MouseButton::Left), ImGuiMouseButton::Left);
        assert_eq!(to_imgui_mouse_button(MouseButton::Right), ImGuiMouseButton::Right);
        assert_eq!(to_imgui_mouse_button(MouseButton::Middle), ImGuiMouseButton::Middle);
    }

    #[test]
    fn screen_positions_are_scaled_to_display_coordinates() {
        assert_eq!(to_display_position([790.0, 590.0], [2.0, 2.0]), [395.0, 295.0]);
        assert_eq!(to_display_position([10.0, 20.0], [1.0, 1.0]), [10.0, 20.0]);
    }

    #[test]
    fn storage_tracks_state_and_keeps_order() {
        let mut storage = EventStorage::new();
        storage.push(InputEvent::MouseMoved([10.0, 20.0]));
        storage.push(InputEvent::MouseButton {
            button: MouseButton::Right,
            pressed: true,
        });
        storage.push(InputEvent::Key {
            key: EngineKey::Character('c'),
            pressed: true,
            modifiers: Modifiers::CTRL,
        });

        assert_eq!(storage.mouse_pos(), [10.0, 20.0]);
        assert!(storage.is_mouse_down(MouseButton::Right));
        assert!(!storage.is_mouse_down(MouseButton::Left));
        assert_eq!(storage.modifiers(), Modifiers::CTRL);
        assert_eq!(storage.pending_len(), 3);

        let drained: Vec<_> = storage.drain().collect();
        assert_eq!(drained[0], InputEvent::MouseMoved([10.0, 20.0]));
        assert_eq!(drained.len(), 3);
        assert_eq!(storage.pending_len(), 0);
        // State survives draining
        assert!(storage.is_mouse_down(MouseButton::Right));
    }
}
