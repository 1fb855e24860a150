//! Global uniform bindings for camera, light and tone mapping state
//!
//! One uniform buffer carries all per-frame global data shared by every
//! pipeline: camera matrices, the directional light with its shadow matrix,
//! and the tone mapping selection. Bound to slot 0 in all render pipelines.

use cgmath::SquareMatrix;

use crate::{
    gfx::camera::camera_utils::{convert_matrix4_to_array, CameraUniform},
    gfx::rendering::tone_mapping::ToneMapping,
    gfx::scene::light::DirectionalLight,
    wgpu_utils::{
        binding_builder::{BindGroupBuilder, BindGroupLayoutBuilder, BindGroupLayoutWithDesc},
        binding_types,
        uniform_buffer::UniformBuffer,
    },
};

/// Global uniform buffer content
///
/// Must match the GlobalUniform struct in the shaders exactly.
#[repr(C)]
#[derive(Copy, Clone, Debug, bytemuck::Pod, bytemuck::Zeroable)]
pub struct GlobalUBOContent {
    view_position: [f32; 4],
    view_proj: [[f32; 4]; 4],
    inv_view_proj: [[f32; 4]; 4],
    light_view_proj: [[f32; 4]; 4],
    light_position: [f32; 3],
    light_intensity: f32,
    light_color: [f32; 3],
    tone_exposure: f32,
    tone_mapping: u32,
    shadow_normal_bias: f32,
    _padding: [f32; 2],
}

/// Type alias for the global uniform buffer
pub type GlobalUBO = UniformBuffer<GlobalUBOContent>;

/// Updates the global uniform buffer for the current frame
///
/// Should be called once per frame before rendering, after camera damping
/// has been advanced.
pub fn update_global_ubo(
    ubo: &mut GlobalUBO,
    queue: &wgpu::Queue,
    camera: CameraUniform,
    light: &DirectionalLight,
    tone_mapping: ToneMapping,
    exposure: f32,
) {
    let view_proj = cgmath::Matrix4::from(camera.view_proj);
    let inv_view_proj = view_proj
        .invert()
        .unwrap_or_else(cgmath::Matrix4::identity);

    let content = GlobalUBOContent {
        view_position: camera.view_position,
        view_proj: camera.view_proj,
        inv_view_proj: convert_matrix4_to_array(inv_view_proj),
        light_view_proj: convert_matrix4_to_array(light.view_projection()),
        light_position: light.position.into(),
        light_intensity: light.intensity,
        light_color: light.color,
        tone_exposure: exposure,
        tone_mapping: tone_mapping.shader_index(),
        shadow_normal_bias: light.shadow.normal_bias,
        _padding: [0.0; 2],
    };

    ubo.update_content(queue, content);
}

/// Manages the bind group layout and bind group for global uniforms
pub struct GlobalBindings {
    bind_group_layout: BindGroupLayoutWithDesc,
    bind_group: Option<wgpu::BindGroup>,
}

impl GlobalBindings {
    pub fn new(device: &wgpu::Device) -> Self {
        let bind_group_layout = BindGroupLayoutBuilder::new()
            .next_binding_rendering(binding_types::uniform())
            .create(device, "Globals Bind Group Layout");

        GlobalBindings {
            bind_group_layout,
            bind_group: None,
        }
    }

    /// Creates the bind group with the provided uniform buffer
    ///
    /// Must be called before any rendering that needs global uniforms.
    pub fn create_bind_group(&mut self, device: &wgpu::Device, ubo: &GlobalUBO) {
        self.bind_group = Some(
            BindGroupBuilder::new(&self.bind_group_layout)
                .resource(ubo.binding_resource())
                .create(device, "Globals Bind Group"),
        );
    }

    pub fn bind_group_layout(&self) -> &wgpu::BindGroupLayout {
        &self.bind_group_layout.layout
    }

    /// # Panics
    /// Panics if `create_bind_group()` hasn't been called yet
    pub fn bind_group(&self) -> &wgpu::BindGroup {
        self.bind_group
            .as_ref()
            .expect("Bind group has not been created yet!")
    }
}
