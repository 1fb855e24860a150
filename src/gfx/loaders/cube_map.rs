//! Environment cube map loader
//!
//! Loads the six JPEG faces of an environment map from a directory and
//! validates them into a [`CubeMapData`].

use std::path::Path;

use crate::gfx::resources::{environment::CubeMapData, texture_resource::ImageData};

use super::LoadError;

/// Face file names in wgpu cube layer order (+X, -X, +Y, -Y, +Z, -Z)
pub const FACE_FILES: [&str; 6] = ["px.jpg", "nx.jpg", "py.jpg", "ny.jpg", "pz.jpg", "nz.jpg"];

/// Loads the six cube faces from `dir`
///
/// Blocking; run on a worker thread. Faces must be square and uniformly
/// sized, which [`CubeMapData::from_faces`] enforces.
pub fn load_cube_map(dir: &Path) -> Result<CubeMapData, LoadError> {
    let faces = [
        load_face(dir, FACE_FILES[0])?,
        load_face(dir, FACE_FILES[1])?,
        load_face(dir, FACE_FILES[2])?,
        load_face(dir, FACE_FILES[3])?,
        load_face(dir, FACE_FILES[4])?,
        load_face(dir, FACE_FILES[5])?,
    ];

    let cube = CubeMapData::from_faces(faces)?;
    log::info!(
        "loaded environment cube map from {} ({}x{} per face)",
        dir.display(),
        cube.size,
        cube.size
    );
    Ok(cube)
}

fn load_face(dir: &Path, file: &str) -> Result<ImageData, LoadError> {
    let path = dir.join(file);
    let image = image::open(&path)?.to_rgba8();
    let (width, height) = image.dimensions();
    Ok(ImageData::new(width, height, image.into_raw()))
}
