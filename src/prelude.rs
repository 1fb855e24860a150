//! # Patina Prelude
//!
//! Convenient imports for typical viewer applications:
//!
//! ```no_run
//! use patina::prelude::*;
//!
//! fn main() {
//!     env_logger::init();
//!     let app = patina::default();
//!     app.run();
//! }
//! ```

// Re-export core application types
pub use crate::app::{AppEvent, FrameDriver, PatinaApp};
pub use crate::default;

// Re-export graphics and scene types
pub use crate::gfx::camera::CameraManager;
pub use crate::gfx::loaders::{LoadError, LoadedModel};
pub use crate::gfx::rendering::ToneMapping;
pub use crate::gfx::resources::{Material, MaterialManager, PbrParams, Shading};
pub use crate::gfx::scene::{DirectionalLight, NodeKind, Scene, SceneNode};
pub use crate::gfx::{RenderSettings, Viewport};

// Re-export UI types
pub use crate::ui::{environment_panel, PanelResponse, UiManager};

// Re-export common external dependencies
pub use cgmath::{InnerSpace, Vector3, Zero};
pub use imgui::Ui;
pub use wgpu::{Device, Queue};
