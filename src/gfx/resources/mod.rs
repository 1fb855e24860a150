//! # Resource Management Module
//!
//! GPU resource handling for the patina viewer: materials and their uniform
//! buffers, texture and depth-buffer creation, the environment cube map, and
//! the global per-frame bindings shared by every pipeline.

pub mod environment;
pub mod global_bindings;
pub mod material;
pub mod texture_resource;

// Re-export commonly used types
pub use environment::{CubeMapData, EnvironmentMap};
pub use material::{Material, MaterialId, MaterialManager, PbrParams, Shading};
pub use texture_resource::{ImageData, TextureResource};
