//! Dear ImGui inside a 3D engine's render loop
//!
//! This crate sits between a host engine and Dear ImGui. Each frame it feeds the
//! engine's display size, clock and input into Dear ImGui, and afterwards turns the
//! resulting draw lists into graphics calls while leaving the engine's own graphics
//! state untouched.
//!
//! # Features
//!
//! - **Shared context**: every [`GuiHandle`] on a thread uses the same Dear ImGui context,
//!   created by the first handle and destroyed with the last
//! - **OpenGL driver**: renders through [`glow`] on GL 2.1+, GL ES 2.0+ and WebGL
//! - **Null driver**: texture bookkeeping without a GPU, for headless engines and tests
//! - **Engine textures**: build GUI textures from engine textures, images or raw pixels,
//!   copied by default or borrowed with the `borrow-engine-textures` feature
//!
//! # Example
//!
//! ```rust,no_run
//! use std::cell::RefCell;
//! use std::rc::Rc;
//! use dear_imgui_engine::{DriverKind, EngineDevice, EventStorage, GuiHandle, InputEvent};
//!
//! struct Device;
//!
//! impl EngineDevice for Device {
//!     fn driver_kind(&self) -> DriverKind {
//!         DriverKind::Null
//!     }
//!     fn screen_size(&self) -> [u32; 2] {
//!         [1280, 720]
//!     }
//!     fn time_ms(&self) -> u32 {
//!         0
//!     }
//! }
//!
//! let events = Rc::new(RefCell::new(EventStorage::new()));
//! let mut gui = GuiHandle::for_device(Box::new(Device), Some(events.clone()), None).unwrap();
//!
//! // In the engine's event receiver:
//! events.borrow_mut().push(InputEvent::MouseMoved([100.0, 50.0]));
//!
//! // In the render loop, after the scene:
//! gui.frame(|ui| {
//!     ui.text("Hello from the engine");
//! })
//! .unwrap();
//! ```

// Re-export glow and dear-imgui-rs so hosts use matching versions.
pub use dear_imgui_rs;
pub use glow;

pub mod color;
pub mod draw;
pub mod driver;
pub mod engine;
mod error;
pub mod events;
mod handle;
#[cfg(feature = "subscriber")]
pub mod logging;
pub mod settings;
pub mod texture;

pub use color::{Color, ColorFormat, EngineColorFormat};
pub use draw::{DrawCommand, DrawListSource, RenderFrame};
pub use driver::{DriverKind, GuiDriver, NullDriver, OpenGlDriver, create_driver};
pub use engine::{EngineDevice, EngineImage, EngineTexture};
pub use error::*;
pub use events::{EngineKey, EventStorage, InputEvent, Modifiers, MouseButton};
pub use handle::*;
pub use settings::GuiSettings;
pub use texture::{GpuTexture, GuiTexture, TextureOwnership, TextureSource};
