//! Material system for PBR rendering
//!
//! Provides material definitions and centralized management with GPU resource
//! handling. Materials are stored in [`MaterialManager`] and mesh nodes
//! reference them by id. Property changes mark the material dirty; the GPU
//! uniform is re-uploaded on the next frame.

use std::collections::HashMap;
use wgpu::Device;

use crate::wgpu_utils::{
    binding_builder::{BindGroupBuilder, BindGroupLayoutBuilder, BindGroupLayoutWithDesc},
    binding_types,
    uniform_buffer::UniformBuffer,
};

use super::texture_resource::{ImageData, TextureResource};

/// Material id for referencing materials
pub type MaterialId = String;

/// GPU uniform data for materials
///
/// Must match the MaterialUniform struct in `pbr.wgsl` exactly.
#[repr(C)]
#[derive(Copy, Clone, Debug, bytemuck::Pod, bytemuck::Zeroable)]
pub struct MaterialUniform {
    pub base_color: [f32; 4],
    pub emissive: [f32; 3],
    pub env_intensity: f32,
    pub metallic: f32,
    pub roughness: f32,
    pub unlit: f32,
    _padding: f32,
}

type MaterialUBO = UniformBuffer<MaterialUniform>;

/// Material bind group management
///
/// All materials share the same layout: one uniform buffer, the base color
/// texture and its sampler.
pub struct MaterialBindings {
    bind_group_layout: BindGroupLayoutWithDesc,
    bind_group: Option<wgpu::BindGroup>,
}

impl MaterialBindings {
    pub fn new(device: &Device) -> Self {
        let bind_group_layout = BindGroupLayoutBuilder::new()
            .next_binding_fragment(binding_types::uniform())
            .next_binding_fragment(binding_types::texture_2d())
            .next_binding_fragment(binding_types::sampler(wgpu::SamplerBindingType::Filtering))
            .create(device, "Material Bind Group Layout");

        MaterialBindings {
            bind_group_layout,
            bind_group: None,
        }
    }

    pub fn create_bind_group(
        &mut self,
        device: &Device,
        ubo: &MaterialUBO,
        base_color: &TextureResource,
    ) {
        self.bind_group = Some(
            BindGroupBuilder::new(&self.bind_group_layout)
                .resource(ubo.binding_resource())
                .texture(&base_color.view)
                .sampler(&base_color.sampler)
                .create(device, "Material Bind Group"),
        );
    }

    pub fn bind_group_layout(&self) -> &wgpu::BindGroupLayout {
        &self.bind_group_layout.layout
    }

    pub fn bind_group(&self) -> &wgpu::BindGroup {
        self.bind_group
            .as_ref()
            .expect("Bind group has not been created yet!")
    }
}

/// Physically-based shading parameters
///
/// `env_intensity` scales the contribution of the environment map and is the
/// property the material sync pass distributes to every PBR material.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PbrParams {
    pub metallic: f32,
    pub roughness: f32,
    pub emissive: [f32; 3],
    pub env_intensity: f32,
}

impl Default for PbrParams {
    fn default() -> Self {
        Self {
            metallic: 0.0,
            roughness: 0.5,
            emissive: [0.0, 0.0, 0.0],
            env_intensity: 1.0,
        }
    }
}

/// Shading model of a material
///
/// Only physically-based materials respond to the environment; unlit
/// materials output their base color directly and are skipped by the
/// material sync pass.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Shading {
    Pbr(PbrParams),
    Unlit,
}

/// Material definition with CPU state and lazily created GPU resources
///
/// Materials are stored centrally in [`MaterialManager`] and shared between
/// mesh nodes. Mutating a property marks the material dirty; GPU resources
/// are refreshed by `update_gpu_resources` on the next frame.
pub struct Material {
    pub name: String,
    pub shading: Shading,
    pub base_color: [f32; 4],
    pub base_color_image: Option<ImageData>,

    needs_update: bool,
    ubo: Option<MaterialUBO>,
    bindings: Option<MaterialBindings>,
    base_color_texture: Option<TextureResource>,
}

impl Default for Material {
    fn default() -> Self {
        Self::pbr("default", [0.8, 0.8, 0.8, 1.0], PbrParams::default())
    }
}

impl Material {
    /// Creates a physically-based material
    pub fn pbr(name: &str, base_color: [f32; 4], params: PbrParams) -> Self {
        Self {
            name: name.to_string(),
            shading: Shading::Pbr(params),
            base_color,
            base_color_image: None,
            needs_update: true,
            ubo: None,
            bindings: None,
            base_color_texture: None,
        }
    }

    /// Creates an unlit material that outputs its base color directly
    pub fn unlit(name: &str, base_color: [f32; 4]) -> Self {
        Self {
            name: name.to_string(),
            shading: Shading::Unlit,
            base_color,
            base_color_image: None,
            needs_update: true,
            ubo: None,
            bindings: None,
            base_color_texture: None,
        }
    }

    /// Attaches a decoded base color image, uploaded on the next GPU refresh
    pub fn with_base_color_image(mut self, image: ImageData) -> Self {
        self.base_color_image = Some(image);
        self
    }

    pub fn is_pbr(&self) -> bool {
        matches!(self.shading, Shading::Pbr(_))
    }

    pub fn pbr_params(&self) -> Option<&PbrParams> {
        match &self.shading {
            Shading::Pbr(params) => Some(params),
            Shading::Unlit => None,
        }
    }

    /// Applies a new environment intensity if this material is physically
    /// based
    ///
    /// Returns whether the material qualified. The dirty flag is raised even
    /// when the value is unchanged, mirroring an unconditional `needsUpdate`;
    /// the observable material state is the same either way, which keeps the
    /// sync pass idempotent.
    pub fn set_env_intensity(&mut self, intensity: f32) -> bool {
        match &mut self.shading {
            Shading::Pbr(params) => {
                params.env_intensity = intensity;
                self.needs_update = true;
                true
            }
            Shading::Unlit => false,
        }
    }

    /// Marks the material as needing a GPU-side refresh
    pub fn mark_dirty(&mut self) {
        self.needs_update = true;
    }

    pub fn is_dirty(&self) -> bool {
        self.needs_update
    }

    fn uniform(&self) -> MaterialUniform {
        match self.shading {
            Shading::Pbr(params) => MaterialUniform {
                base_color: self.base_color,
                emissive: params.emissive,
                env_intensity: params.env_intensity,
                metallic: params.metallic.clamp(0.0, 1.0),
                roughness: params.roughness.clamp(0.0, 1.0),
                unlit: 0.0,
                _padding: 0.0,
            },
            Shading::Unlit => MaterialUniform {
                base_color: self.base_color,
                emissive: [0.0, 0.0, 0.0],
                env_intensity: 0.0,
                metallic: 0.0,
                roughness: 1.0,
                unlit: 1.0,
                _padding: 0.0,
            },
        }
    }

    /// Refreshes GPU resources if the material is dirty
    ///
    /// Creates the uniform buffer, base color texture and bind group on the
    /// first call; later calls only re-upload the uniform.
    pub fn update_gpu_resources(&mut self, device: &Device, queue: &wgpu::Queue) {
        if !self.needs_update && self.bindings.is_some() {
            return;
        }

        if self.ubo.is_none() {
            self.ubo = Some(MaterialUBO::new(device));
        }

        if self.base_color_texture.is_none() {
            let fallback = ImageData::white_pixel();
            let image = self.base_color_image.as_ref().unwrap_or(&fallback);
            self.base_color_texture = Some(TextureResource::create_from_image(
                device, queue, image, true, &self.name,
            ));
        }

        if self.bindings.is_none() {
            let mut bindings = MaterialBindings::new(device);
            bindings.create_bind_group(
                device,
                self.ubo.as_ref().unwrap(),
                self.base_color_texture.as_ref().unwrap(),
            );
            self.bindings = Some(bindings);
        }

        let uniform = self.uniform();
        if let Some(ubo) = &mut self.ubo {
            ubo.update_content(queue, uniform);
        }

        self.needs_update = false;
    }

    /// Gets the bind group for rendering
    pub fn bind_group(&self) -> Option<&wgpu::BindGroup> {
        self.bindings.as_ref().map(|b| b.bind_group())
    }

    /// Gets the bind group layout for pipeline creation
    pub fn bind_group_layout(&self) -> Option<&wgpu::BindGroupLayout> {
        self.bindings.as_ref().map(|b| b.bind_group_layout())
    }
}

/// Manages all materials in the viewer
///
/// Centralized storage; mesh nodes reference materials by id, so GPU
/// resources are shared between every node using the same material.
pub struct MaterialManager {
    materials: HashMap<MaterialId, Material>,
    default_material_id: MaterialId,
}

impl MaterialManager {
    /// Creates a new material manager with a default material
    pub fn new() -> Self {
        let mut manager = Self {
            materials: HashMap::new(),
            default_material_id: "default".to_string(),
        };
        manager.materials.insert("default".to_string(), Material::default());
        manager
    }

    /// Adds a material, returning its id
    pub fn add_material(&mut self, material: Material) -> MaterialId {
        let id = material.name.clone();
        self.materials.insert(id.clone(), material);
        id
    }

    pub fn get_material(&self, id: &str) -> Option<&Material> {
        self.materials.get(id)
    }

    pub fn get_material_mut(&mut self, id: &str) -> Option<&mut Material> {
        self.materials.get_mut(id)
    }

    pub fn get_default_material(&self) -> &Material {
        self.materials.get(&self.default_material_id).unwrap()
    }

    /// Gets the material for a mesh node with fallback to the default
    pub fn get_material_or_default(&self, id: &str) -> &Material {
        self.get_material(id)
            .unwrap_or_else(|| self.get_default_material())
    }

    pub fn list_materials(&self) -> Vec<&MaterialId> {
        self.materials.keys().collect()
    }

    /// Refreshes GPU resources for every dirty material
    pub fn update_dirty_gpu_resources(&mut self, device: &Device, queue: &wgpu::Queue) {
        for material in self.materials.values_mut() {
            material.update_gpu_resources(device, queue);
        }
    }

    /// Gets the shared material bind group layout for pipeline creation
    ///
    /// All materials use the same layout, so the default material's is used.
    pub fn bind_group_layout(&self) -> Option<&wgpu::BindGroupLayout> {
        self.get_default_material().bind_group_layout()
    }
}

impl Default for MaterialManager {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn set_env_intensity_applies_to_pbr_only() {
        let mut pbr = Material::pbr("helmet", [1.0; 4], PbrParams::default());
        let mut unlit = Material::unlit("wire", [1.0, 0.0, 0.0, 1.0]);

        assert!(pbr.set_env_intensity(4.5));
        assert_eq!(pbr.pbr_params().unwrap().env_intensity, 4.5);

        assert!(!unlit.set_env_intensity(4.5));
        assert!(unlit.pbr_params().is_none());
    }

    #[test]
    fn set_env_intensity_marks_dirty_even_when_unchanged() {
        let mut material = Material::pbr("helmet", [1.0; 4], PbrParams::default());
        material.needs_update = false;

        material.set_env_intensity(1.0);
        assert!(material.is_dirty());
    }

    #[test]
    fn manager_falls_back_to_default_material() {
        let manager = MaterialManager::new();
        let material = manager.get_material_or_default("does-not-exist");
        assert_eq!(material.name, "default");
    }

    #[test]
    fn unlit_uniform_flags_unlit() {
        let material = Material::unlit("wire", [0.2, 0.4, 0.6, 1.0]);
        let uniform = material.uniform();
        assert_eq!(uniform.unlit, 1.0);
        assert_eq!(uniform.env_intensity, 0.0);
    }
}
