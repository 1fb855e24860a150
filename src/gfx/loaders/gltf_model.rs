//! glTF model loader
//!
//! Imports a .gltf/.glb file and converts it into the viewer's scene-node
//! tree plus a set of physically-based materials. Geometry, node hierarchy
//! and material references are preserved; everything the viewer does not
//! render (animations, skins, cameras) is ignored.

use std::path::Path;

use cgmath::{Matrix4, SquareMatrix};

use crate::gfx::{
    resources::{
        material::{Material, MaterialId, PbrParams},
        texture_resource::ImageData,
    },
    scene::{
        node::{Mesh, SceneNode},
        vertex::Vertex3D,
    },
};

use super::LoadError;

/// A model decoded into scene nodes and materials
///
/// The CPU-side payload of the model-load completion event. GPU resources
/// are created later, on the UI thread, during the first frame after the
/// model is attached.
pub struct LoadedModel {
    pub name: String,
    pub root: SceneNode,
    pub materials: Vec<Material>,
}

/// Imports a glTF model from `path`
///
/// Blocking; run on a worker thread.
pub fn load_model(path: &Path) -> Result<LoadedModel, LoadError> {
    let (document, buffers, images) = gltf::import(path)?;

    let name = path
        .file_stem()
        .map(|stem| stem.to_string_lossy().into_owned())
        .unwrap_or_else(|| "model".to_string());

    let materials = convert_materials(&document, &images)?;
    let material_ids: Vec<MaterialId> = materials.iter().map(|m| m.name.clone()).collect();

    let mut root = SceneNode::group(&name, Matrix4::identity());
    if let Some(scene) = document.default_scene().or_else(|| document.scenes().next()) {
        for node in scene.nodes() {
            root.children
                .push(convert_node(&node, &buffers, &material_ids)?);
        }
    }

    log::info!(
        "loaded model '{}': {} materials, {} top-level nodes",
        name,
        material_ids.len(),
        root.children.len()
    );

    Ok(LoadedModel {
        name,
        root,
        materials,
    })
}

fn convert_materials(
    document: &gltf::Document,
    images: &[gltf::image::Data],
) -> Result<Vec<Material>, LoadError> {
    let mut materials = Vec::new();

    for material in document.materials() {
        let index = material.index().unwrap_or(materials.len());
        let name = material
            .name()
            .map(str::to_string)
            .unwrap_or_else(|| format!("material_{}", index));

        let pbr = material.pbr_metallic_roughness();
        let params = PbrParams {
            metallic: pbr.metallic_factor(),
            roughness: pbr.roughness_factor(),
            emissive: material.emissive_factor(),
            env_intensity: 1.0,
        };

        let mut converted = Material::pbr(&name, pbr.base_color_factor(), params);
        if let Some(info) = pbr.base_color_texture() {
            let source = info.texture().source().index();
            converted = converted.with_base_color_image(convert_image(&images[source])?);
        }
        materials.push(converted);
    }

    Ok(materials)
}

/// Converts decoded glTF pixel data to RGBA8
fn convert_image(data: &gltf::image::Data) -> Result<ImageData, LoadError> {
    use gltf::image::Format;

    let pixel_count = (data.width * data.height) as usize;
    let pixels = match data.format {
        Format::R8G8B8A8 => data.pixels.clone(),
        Format::R8G8B8 => {
            let mut rgba = Vec::with_capacity(pixel_count * 4);
            for rgb in data.pixels.chunks_exact(3) {
                rgba.extend_from_slice(rgb);
                rgba.push(255);
            }
            rgba
        }
        Format::R8 => {
            let mut rgba = Vec::with_capacity(pixel_count * 4);
            for &gray in &data.pixels {
                rgba.extend_from_slice(&[gray, gray, gray, 255]);
            }
            rgba
        }
        other => return Err(LoadError::UnsupportedTextureFormat(other)),
    };

    Ok(ImageData::new(data.width, data.height, pixels))
}

fn convert_node(
    node: &gltf::Node,
    buffers: &[gltf::buffer::Data],
    material_ids: &[MaterialId],
) -> Result<SceneNode, LoadError> {
    let name = node
        .name()
        .map(str::to_string)
        .unwrap_or_else(|| format!("node_{}", node.index()));
    let transform = Matrix4::from(node.transform().matrix());

    let mut converted = SceneNode::group(&name, transform);

    if let Some(mesh) = node.mesh() {
        for primitive in mesh.primitives() {
            converted.children.push(convert_primitive(
                &name,
                &primitive,
                buffers,
                material_ids,
            )?);
        }
    }

    for child in node.children() {
        converted
            .children
            .push(convert_node(&child, buffers, material_ids)?);
    }

    Ok(converted)
}

fn convert_primitive(
    node_name: &str,
    primitive: &gltf::Primitive,
    buffers: &[gltf::buffer::Data],
    material_ids: &[MaterialId],
) -> Result<SceneNode, LoadError> {
    let name = format!("{}_prim_{}", node_name, primitive.index());
    let reader = primitive.reader(|buffer| buffers.get(buffer.index()).map(|data| &data.0[..]));

    let positions: Vec<[f32; 3]> = reader
        .read_positions()
        .ok_or_else(|| LoadError::MissingPositions(name.clone()))?
        .collect();
    let normals: Option<Vec<[f32; 3]>> = reader.read_normals().map(|iter| iter.collect());
    let uvs: Option<Vec<[f32; 2]>> = reader
        .read_tex_coords(0)
        .map(|coords| coords.into_f32().collect());

    let mut vertices: Vec<Vertex3D> = positions
        .iter()
        .enumerate()
        .map(|(i, &position)| Vertex3D {
            position,
            normal: normals
                .as_ref()
                .and_then(|n| n.get(i).copied())
                .unwrap_or([0.0, 0.0, 0.0]),
            uv: uvs.as_ref().and_then(|u| u.get(i).copied()).unwrap_or([0.0, 0.0]),
        })
        .collect();

    let indices: Vec<u32> = match reader.read_indices() {
        Some(indices) => indices.into_u32().collect(),
        None => (0..vertices.len() as u32).collect(),
    };

    if normals.is_none() {
        Mesh::compute_normals(&mut vertices, &indices);
    }

    let material_id = primitive
        .material()
        .index()
        .and_then(|index| material_ids.get(index).cloned())
        .unwrap_or_else(|| "default".to_string());

    Ok(SceneNode::mesh(
        &name,
        Matrix4::identity(),
        Mesh::new(vertices, indices),
        material_id,
    ))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn convert_image_expands_rgb_to_rgba() {
        let data = gltf::image::Data {
            format: gltf::image::Format::R8G8B8,
            width: 2,
            height: 1,
            pixels: vec![10, 20, 30, 40, 50, 60],
        };

        let image = convert_image(&data).unwrap();
        assert_eq!(image.pixels, vec![10, 20, 30, 255, 40, 50, 60, 255]);
    }

    #[test]
    fn convert_image_rejects_unsupported_formats() {
        let data = gltf::image::Data {
            format: gltf::image::Format::R16G16B16,
            width: 1,
            height: 1,
            pixels: vec![0; 6],
        };

        assert!(matches!(
            convert_image(&data),
            Err(LoadError::UnsupportedTextureFormat(_))
        ));
    }
}
