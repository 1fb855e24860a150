//! # Graphics Module
//!
//! Everything between the window and the pixels:
//!
//! - **Camera** ([`camera`]) - orbit camera with inertial damping
//! - **Asset loaders** ([`loaders`]) - glTF model and cube-map decoding
//! - **Rendering** ([`rendering`]) - shadow, PBR and skybox passes
//! - **Resources** ([`resources`]) - materials, textures, environment map
//! - **Scene** ([`scene`]) - node tree, light, and the material sync pass
//! - **Settings / Viewport** - shared debug state and resize tracking

pub mod camera;
pub mod loaders;
pub mod rendering;
pub mod resources;
pub mod scene;
pub mod settings;
pub mod viewport;

// Re-export commonly used types
pub use camera::orbit_camera::OrbitCamera;
pub use rendering::render_engine::RenderEngine;
pub use settings::RenderSettings;
pub use viewport::Viewport;
