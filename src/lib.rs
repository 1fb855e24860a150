// src/lib.rs
//! Patina 3D Viewer
//!
//! A physically-based model viewer built on wgpu and winit: glTF model
//! loading, cube-map environment lighting, shadow mapping, HDR tone mapping,
//! an orbit camera and an ImGui debug panel.

pub mod app;
pub mod gfx;
pub mod prelude;
pub mod ui;
pub mod wgpu_utils;

// Re-export main types for convenience
pub use app::PatinaApp;

/// Creates a default Patina application instance
pub fn default() -> PatinaApp {
    pollster::block_on(PatinaApp::new())
}
