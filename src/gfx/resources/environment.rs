//! Environment cube map resources
//!
//! The environment map doubles as the scene background (via the skybox pass)
//! and as the ambient/reflection source for physically-based materials. Faces
//! are stored in the wgpu cube layer order +X, -X, +Y, -Y, +Z, -Z.

use super::texture_resource::ImageData;

/// Number of faces in a cube map
pub const CUBE_FACE_COUNT: usize = 6;

/// CPU-side cube map data, six square faces of identical size
#[derive(Debug, Clone)]
pub struct CubeMapData {
    pub size: u32,
    pub faces: [ImageData; CUBE_FACE_COUNT],
}

impl CubeMapData {
    /// Builds a cube map from six decoded faces, validating their shape
    ///
    /// Faces must be square and all the same size; the loader surfaces a
    /// mismatch as an error rather than uploading a corrupt cube.
    pub fn from_faces(faces: [ImageData; CUBE_FACE_COUNT]) -> Result<Self, FaceMismatch> {
        let size = faces[0].width;
        for (index, face) in faces.iter().enumerate() {
            if face.width != size || face.height != size {
                return Err(FaceMismatch {
                    face: index,
                    expected: size,
                    width: face.width,
                    height: face.height,
                });
            }
        }
        Ok(Self { size, faces })
    }

    /// A 1x1 black cube, used until the real environment finishes loading
    pub fn placeholder() -> Self {
        Self {
            size: 1,
            faces: std::array::from_fn(|_| ImageData::black_pixel()),
        }
    }
}

/// A cube face has a different shape than the first face
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FaceMismatch {
    pub face: usize,
    pub expected: u32,
    pub width: u32,
    pub height: u32,
}

impl std::fmt::Display for FaceMismatch {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "cube face {} is {}x{}, expected {}x{} to match face 0",
            self.face, self.width, self.height, self.expected, self.expected
        )
    }
}

impl std::error::Error for FaceMismatch {}

/// GPU-side environment cube map
pub struct EnvironmentMap {
    pub texture: wgpu::Texture,
    pub view: wgpu::TextureView,
    pub sampler: wgpu::Sampler,
}

impl EnvironmentMap {
    /// Uploads cube map data as an sRGB cube texture
    pub fn from_data(device: &wgpu::Device, queue: &wgpu::Queue, data: &CubeMapData) -> Self {
        let size = wgpu::Extent3d {
            width: data.size,
            height: data.size,
            depth_or_array_layers: CUBE_FACE_COUNT as u32,
        };

        let texture = device.create_texture(&wgpu::TextureDescriptor {
            label: Some("Environment Cube Map"),
            size,
            mip_level_count: 1,
            sample_count: 1,
            dimension: wgpu::TextureDimension::D2,
            format: wgpu::TextureFormat::Rgba8UnormSrgb,
            usage: wgpu::TextureUsages::TEXTURE_BINDING | wgpu::TextureUsages::COPY_DST,
            view_formats: &[],
        });

        for (layer, face) in data.faces.iter().enumerate() {
            queue.write_texture(
                wgpu::TexelCopyTextureInfo {
                    texture: &texture,
                    mip_level: 0,
                    origin: wgpu::Origin3d {
                        x: 0,
                        y: 0,
                        z: layer as u32,
                    },
                    aspect: wgpu::TextureAspect::All,
                },
                &face.pixels,
                wgpu::TexelCopyBufferLayout {
                    offset: 0,
                    bytes_per_row: Some(4 * face.width),
                    rows_per_image: Some(face.height),
                },
                wgpu::Extent3d {
                    width: face.width,
                    height: face.height,
                    depth_or_array_layers: 1,
                },
            );
        }

        let view = texture.create_view(&wgpu::TextureViewDescriptor {
            label: Some("Environment Cube View"),
            dimension: Some(wgpu::TextureViewDimension::Cube),
            ..Default::default()
        });

        let sampler = device.create_sampler(&wgpu::SamplerDescriptor {
            label: Some("Environment Sampler"),
            address_mode_u: wgpu::AddressMode::ClampToEdge,
            address_mode_v: wgpu::AddressMode::ClampToEdge,
            address_mode_w: wgpu::AddressMode::ClampToEdge,
            mag_filter: wgpu::FilterMode::Linear,
            min_filter: wgpu::FilterMode::Linear,
            mipmap_filter: wgpu::FilterMode::Nearest,
            ..Default::default()
        });

        Self {
            texture,
            view,
            sampler,
        }
    }

    /// Creates the black placeholder cube bound before the real load lands
    pub fn placeholder(device: &wgpu::Device, queue: &wgpu::Queue) -> Self {
        Self::from_data(device, queue, &CubeMapData::placeholder())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn from_faces_accepts_matching_faces() {
        let faces = std::array::from_fn(|_| ImageData::black_pixel());
        let cube = CubeMapData::from_faces(faces).unwrap();
        assert_eq!(cube.size, 1);
    }

    #[test]
    fn from_faces_rejects_mismatched_face() {
        let mut faces: [ImageData; CUBE_FACE_COUNT] =
            std::array::from_fn(|_| ImageData::black_pixel());
        faces[3] = ImageData::new(2, 2, vec![0; 16]);

        let err = CubeMapData::from_faces(faces).unwrap_err();
        assert_eq!(err.face, 3);
        assert_eq!(err.expected, 1);
    }
}
