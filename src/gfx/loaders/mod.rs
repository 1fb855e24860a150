//! Asset loaders
//!
//! Decode model and environment assets from disk into CPU-side data. Both
//! loaders are blocking; the application runs them on worker threads and
//! delivers the results to the event loop as completion events.

pub mod cube_map;
pub mod gltf_model;

/// Model asset, relative to the asset root
pub const MODEL_PATH: &str = "models/FlightHelmet/glTF/FlightHelmet.gltf";

/// Environment cube map directory, relative to the asset root
pub const ENVIRONMENT_DIR: &str = "textures/environmentMaps/0";

/// Errors surfaced by the asset loaders
///
/// The application edge treats all of these as fatal; the typed variants
/// exist so the library surface stays honest about what can fail.
#[derive(Debug, thiserror::Error)]
pub enum LoadError {
    #[error("failed to import glTF file: {0}")]
    Gltf(#[from] gltf::Error),

    #[error("failed to decode image: {0}")]
    Image(#[from] image::ImageError),

    #[error("mesh primitive '{0}' has no position data")]
    MissingPositions(String),

    #[error("unsupported glTF texture format {0:?}")]
    UnsupportedTextureFormat(gltf::image::Format),

    #[error("{0}")]
    FaceMismatch(#[from] crate::gfx::resources::environment::FaceMismatch),
}

pub use cube_map::load_cube_map;
pub use gltf_model::{load_model, LoadedModel};
