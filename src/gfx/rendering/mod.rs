//! # Rendering Module
//!
//! The wgpu render path: engine, pipeline management and the tone mapping
//! selection. Shader sources (`pbr.wgsl`, `shadow.wgsl`, `skybox.wgsl`) live
//! alongside and are embedded at compile time.

pub mod pipeline_manager;
pub mod render_engine;
pub mod tone_mapping;

// Re-export commonly used types
pub use render_engine::RenderEngine;
pub use tone_mapping::ToneMapping;
