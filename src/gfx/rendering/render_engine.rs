//! WGPU-based rendering engine for the patina viewer
//!
//! Owns the surface, device and per-frame passes: a depth-only shadow pass
//! from the light, the MSAA scene pass with the environment skybox, and the
//! UI overlay.

use std::sync::Arc;
use wgpu::{Device, TextureFormat};

use crate::gfx::{
    camera::camera_utils::CameraUniform,
    resources::{
        environment::{CubeMapData, EnvironmentMap},
        global_bindings::{update_global_ubo, GlobalBindings, GlobalUBO},
        material::{MaterialBindings, MaterialManager},
        texture_resource::TextureResource,
    },
    scene::{
        light::{DirectionalLight, ShadowSettings},
        node::{NodeKind, SceneNode},
        scene::Scene,
    },
    settings::RenderSettings,
};

use crate::wgpu_utils::{
    binding_builder::{BindGroupBuilder, BindGroupLayoutBuilder, BindGroupLayoutWithDesc},
    binding_types,
};

use super::pipeline_manager::{PipelineConfig, PipelineManager};

/// Samples per pixel for the scene color and depth targets
pub const MSAA_SAMPLE_COUNT: u32 = 4;

/// Core rendering engine managing GPU resources and draw passes
pub struct RenderEngine {
    surface: wgpu::Surface<'static>,
    device: Arc<wgpu::Device>,
    queue: Arc<wgpu::Queue>,
    config: wgpu::SurfaceConfiguration,
    format: TextureFormat,
    pub pipeline_manager: PipelineManager,

    depth_texture: TextureResource,
    msaa_target: TextureResource,
    shadow_map: TextureResource,

    global_ubo: GlobalUBO,
    global_bindings: GlobalBindings,

    environment_layout: BindGroupLayoutWithDesc,
    environment_bind_group: wgpu::BindGroup,
    // Kept alive for the bind group's sake
    _environment: EnvironmentMap,
}

impl RenderEngine {
    /// Creates a new render engine for the given window
    ///
    /// Initializes wgpu, creates the depth, MSAA and shadow targets, binds a
    /// placeholder environment cube and registers the three render pipelines.
    ///
    /// # Panics
    /// Panics if no adapter or device is available; renderer construction
    /// failures are fatal to the session.
    pub async fn new(
        window: impl Into<wgpu::SurfaceTarget<'static>>,
        width: u32,
        height: u32,
    ) -> RenderEngine {
        let instance = wgpu::Instance::new(&wgpu::InstanceDescriptor {
            backends: wgpu::Backends::all(),
            ..Default::default()
        });
        let surface = instance.create_surface(window).unwrap();

        let adapter = instance
            .request_adapter(&wgpu::RequestAdapterOptions {
                power_preference: wgpu::PowerPreference::default(),
                compatible_surface: Some(&surface),
                force_fallback_adapter: false,
            })
            .await
            .expect("Failed to request adapter!");

        let (device, queue) = {
            adapter
                .request_device(&wgpu::DeviceDescriptor {
                    label: Some("WGPU Device"),
                    required_features: wgpu::Features::default(),
                    required_limits: wgpu::Limits {
                        max_texture_dimension_2d: 4096,
                        ..wgpu::Limits::downlevel_defaults()
                    },
                    memory_hints: wgpu::MemoryHints::default(),
                    trace: wgpu::Trace::Off,
                })
                .await
                .expect("Failed to request a device!")
        };

        let surface_capabilities = surface.get_capabilities(&adapter);
        // Non-sRGB surface; the shaders encode gamma themselves.
        let format = surface_capabilities
            .formats
            .iter()
            .copied()
            .find(|f| !f.is_srgb())
            .unwrap_or(surface_capabilities.formats[0]);

        let config = wgpu::SurfaceConfiguration {
            usage: wgpu::TextureUsages::RENDER_ATTACHMENT,
            format,
            width: width.max(1),
            height: height.max(1),
            present_mode: wgpu::PresentMode::Fifo, // refresh-aligned, one frame per tick
            alpha_mode: surface_capabilities.alpha_modes[0],
            view_formats: vec![],
            desired_maximum_frame_latency: 2,
        };
        surface.configure(&device, &config);

        let depth_texture = TextureResource::create_depth_texture(
            &device,
            &config,
            MSAA_SAMPLE_COUNT,
            "Scene Depth Texture",
        );
        let msaa_target = TextureResource::create_msaa_target(&device, &config, MSAA_SAMPLE_COUNT);
        let shadow_map =
            TextureResource::create_shadow_map(&device, ShadowSettings::default().map_size);

        let global_ubo = GlobalUBO::new(&device);
        let mut global_bindings = GlobalBindings::new(&device);
        global_bindings.create_bind_group(&device, &global_ubo);

        // Per-node transform layout; node bind groups are created against an
        // identical layout in the scene module.
        let transform_layout = BindGroupLayoutBuilder::new()
            .next_binding_vertex(binding_types::uniform())
            .create(&device, "Transform Bind Group Layout");

        let material_layout = MaterialBindings::new(&device).bind_group_layout().clone();

        // Environment cube plus the shadow map, bound together in group 3 of
        // the PBR pass; the skybox pass reuses the same group at slot 1.
        let environment_layout = BindGroupLayoutBuilder::new()
            .next_binding_fragment(binding_types::texture_cube())
            .next_binding_fragment(binding_types::sampler(wgpu::SamplerBindingType::Filtering))
            .next_binding_fragment(binding_types::texture_depth_2d())
            .next_binding_fragment(binding_types::sampler(wgpu::SamplerBindingType::Comparison))
            .create(&device, "Environment Bind Group Layout");

        let environment = EnvironmentMap::placeholder(&device, &queue);
        let environment_bind_group = create_environment_bind_group(
            &device,
            &environment_layout,
            &environment,
            &shadow_map,
        );

        let device_handle: Arc<Device> = device.into();
        let queue_handle: Arc<wgpu::Queue> = queue.into();
        let mut pipeline_manager = PipelineManager::new(device_handle.clone());

        let _ = pipeline_manager.load_shader("pbr", include_str!("pbr.wgsl"));
        let _ = pipeline_manager.load_shader("shadow", include_str!("shadow.wgsl"));
        let _ = pipeline_manager.load_shader("skybox", include_str!("skybox.wgsl"));

        // Depth-only pass from the light; no culling to avoid light leaks
        pipeline_manager.register_pipeline(
            "Shadow",
            PipelineConfig::default()
                .with_label("SHADOW")
                .with_shader("shadow")
                .with_vertex_only()
                .with_cull_mode(None)
                .with_depth_format(TextureResource::DEPTH_FORMAT)
                .with_bind_group_layouts(vec![
                    global_bindings.bind_group_layout().clone(),
                    transform_layout.layout.clone(),
                ])
                .with_color_targets(vec![]),
        );

        pipeline_manager.register_pipeline(
            "PBR",
            PipelineConfig::default()
                .with_label("PBR")
                .with_shader("pbr")
                .with_depth_format(TextureResource::DEPTH_FORMAT)
                .with_sample_count(MSAA_SAMPLE_COUNT)
                .with_color_targets(vec![Some(wgpu::ColorTargetState {
                    format,
                    blend: Some(wgpu::BlendState::REPLACE),
                    write_mask: wgpu::ColorWrites::ALL,
                })])
                .with_bind_group_layouts(vec![
                    global_bindings.bind_group_layout().clone(),
                    transform_layout.layout.clone(),
                    material_layout,
                    environment_layout.layout.clone(),
                ]),
        );

        // Background fills only the pixels the scene left at depth 1.0
        pipeline_manager.register_pipeline(
            "Skybox",
            PipelineConfig::default()
                .with_label("SKYBOX")
                .with_shader("skybox")
                .with_no_vertex_buffers()
                .with_cull_mode(None)
                .with_depth_format(TextureResource::DEPTH_FORMAT)
                .with_depth_write(false)
                .with_depth_compare(wgpu::CompareFunction::LessEqual)
                .with_sample_count(MSAA_SAMPLE_COUNT)
                .with_color_targets(vec![Some(wgpu::ColorTargetState {
                    format,
                    blend: Some(wgpu::BlendState::REPLACE),
                    write_mask: wgpu::ColorWrites::ALL,
                })])
                .with_bind_group_layouts(vec![
                    global_bindings.bind_group_layout().clone(),
                    environment_layout.layout.clone(),
                ]),
        );

        if let Err(errors) = pipeline_manager.create_all_pipelines() {
            for error in errors {
                log::error!("{}", error);
            }
        }

        RenderEngine {
            surface,
            device: device_handle,
            queue: queue_handle,
            config,
            format,
            pipeline_manager,
            depth_texture,
            msaa_target,
            shadow_map,
            global_ubo,
            global_bindings,
            environment_layout,
            environment_bind_group,
            _environment: environment,
        }
    }

    /// Swaps in a loaded environment cube map
    ///
    /// Called from the environment-load completion event; replaces the
    /// placeholder bound at startup.
    pub fn set_environment(&mut self, data: &CubeMapData) {
        let environment = EnvironmentMap::from_data(&self.device, &self.queue, data);
        self.environment_bind_group = create_environment_bind_group(
            &self.device,
            &self.environment_layout,
            &environment,
            &self.shadow_map,
        );
        self._environment = environment;
    }

    /// Updates the global uniform buffer for the current frame
    ///
    /// Called after camera damping has been advanced and before the frame is
    /// encoded.
    pub fn update(
        &mut self,
        camera_uniform: CameraUniform,
        light: &DirectionalLight,
        settings: &RenderSettings,
    ) {
        update_global_ubo(
            &mut self.global_ubo,
            &self.queue,
            camera_uniform,
            light,
            settings.tone_mapping,
            settings.exposure,
        );
    }

    /// Renders one frame: shadow pass, scene pass with skybox, UI overlay
    ///
    /// A surface failure propagates as a panic; the render loop is not
    /// resumed after a lost frame.
    pub fn render_frame<F>(&mut self, scene: &mut Scene, ui_overlay: Option<F>)
    where
        F: FnOnce(&wgpu::Device, &wgpu::Queue, &mut wgpu::CommandEncoder, &wgpu::TextureView),
    {
        scene.update_gpu_resources(&self.device, &self.queue);

        let surface_texture = self
            .surface
            .get_current_texture()
            .expect("Failed to get surface texture!");
        let surface_view = surface_texture
            .texture
            .create_view(&wgpu::TextureViewDescriptor::default());

        let mut encoder = self
            .device
            .create_command_encoder(&wgpu::CommandEncoderDescriptor {
                label: Some("Render Encoder"),
            });

        // PASS 1: shadow map from the light's point of view
        {
            let mut shadow_pass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
                label: Some("Shadow Pass"),
                color_attachments: &[],
                depth_stencil_attachment: Some(wgpu::RenderPassDepthStencilAttachment {
                    view: &self.shadow_map.view,
                    depth_ops: Some(wgpu::Operations {
                        load: wgpu::LoadOp::Clear(1.0),
                        store: wgpu::StoreOp::Store,
                    }),
                    stencil_ops: None,
                }),
                occlusion_query_set: None,
                timestamp_writes: None,
            });

            if let Some(pipeline) = self.pipeline_manager.created_pipeline("Shadow") {
                shadow_pass.set_pipeline(pipeline);
                shadow_pass.set_bind_group(0, self.global_bindings.bind_group(), &[]);
                draw_shadow_nodes(&mut shadow_pass, &scene.root);
            }
        }

        // PASS 2: MSAA scene pass, resolved into the surface texture
        {
            let mut render_pass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
                label: Some("Scene Pass"),
                color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                    view: &self.msaa_target.view,
                    resolve_target: Some(&surface_view),
                    ops: wgpu::Operations {
                        load: wgpu::LoadOp::Clear(wgpu::Color {
                            r: 0.05,
                            g: 0.05,
                            b: 0.05,
                            a: 1.0,
                        }),
                        store: wgpu::StoreOp::Discard,
                    },
                })],
                depth_stencil_attachment: Some(wgpu::RenderPassDepthStencilAttachment {
                    view: &self.depth_texture.view,
                    depth_ops: Some(wgpu::Operations {
                        load: wgpu::LoadOp::Clear(1.0),
                        store: wgpu::StoreOp::Store,
                    }),
                    stencil_ops: None,
                }),
                occlusion_query_set: None,
                timestamp_writes: None,
            });

            render_pass.set_bind_group(0, self.global_bindings.bind_group(), &[]);

            if let Some(pipeline) = self.pipeline_manager.created_pipeline("PBR") {
                render_pass.set_pipeline(pipeline);
                render_pass.set_bind_group(3, &self.environment_bind_group, &[]);
                draw_scene_nodes(&mut render_pass, &scene.root, &scene.material_manager);
            }

            if let Some(pipeline) = self.pipeline_manager.created_pipeline("Skybox") {
                render_pass.set_pipeline(pipeline);
                render_pass.set_bind_group(1, &self.environment_bind_group, &[]);
                render_pass.draw(0..3, 0..1);
            }
        }

        // PASS 3: UI overlay on the resolved surface
        if let Some(ui_overlay) = ui_overlay {
            ui_overlay(&self.device, &self.queue, &mut encoder, &surface_view);
        }

        self.queue.submit(std::iter::once(encoder.finish()));
        surface_texture.present();
    }

    /// Convenience method for rendering without a UI overlay
    pub fn render_frame_simple(&mut self, scene: &mut Scene) {
        self.render_frame(
            scene,
            None::<fn(&wgpu::Device, &wgpu::Queue, &mut wgpu::CommandEncoder, &wgpu::TextureView)>,
        );
    }

    /// Resizes the render surface and recreates the size-dependent targets
    ///
    /// Takes the viewport's physical output size. The shadow map keeps its
    /// fixed resolution.
    pub fn resize(&mut self, width: u32, height: u32) {
        if width == 0 || height == 0 {
            return;
        }

        self.config.width = width;
        self.config.height = height;
        self.surface.configure(&self.device, &self.config);

        self.depth_texture = TextureResource::create_depth_texture(
            &self.device,
            &self.config,
            MSAA_SAMPLE_COUNT,
            "Scene Depth Texture",
        );
        self.msaa_target =
            TextureResource::create_msaa_target(&self.device, &self.config, MSAA_SAMPLE_COUNT);
    }

    /// Returns current surface dimensions in physical pixels
    pub fn get_surface_size(&self) -> (u32, u32) {
        (self.config.width, self.config.height)
    }

    pub fn device(&self) -> &wgpu::Device {
        &self.device
    }

    pub fn queue(&self) -> &wgpu::Queue {
        &self.queue
    }

    pub fn surface_format(&self) -> wgpu::TextureFormat {
        self.format
    }
}

fn create_environment_bind_group(
    device: &wgpu::Device,
    layout: &BindGroupLayoutWithDesc,
    environment: &EnvironmentMap,
    shadow_map: &TextureResource,
) -> wgpu::BindGroup {
    BindGroupBuilder::new(layout)
        .texture(&environment.view)
        .sampler(&environment.sampler)
        .texture(&shadow_map.view)
        .sampler(&shadow_map.sampler)
        .create(device, "Environment Bind Group")
}

/// Draws every shadow-casting mesh in the subtree
fn draw_shadow_nodes<'a>(render_pass: &mut wgpu::RenderPass<'a>, node: &'a SceneNode) {
    if let NodeKind::Mesh {
        mesh, cast_shadow, ..
    } = &node.kind
    {
        if *cast_shadow {
            if let Some(gpu) = node.gpu_resources() {
                render_pass.set_bind_group(1, gpu.bind_group(), &[]);
                mesh.draw(render_pass);
            }
        }
    }

    for child in &node.children {
        draw_shadow_nodes(render_pass, child);
    }
}

/// Draws every mesh in the subtree with its material bound
fn draw_scene_nodes<'a>(
    render_pass: &mut wgpu::RenderPass<'a>,
    node: &'a SceneNode,
    materials: &'a MaterialManager,
) {
    if let NodeKind::Mesh {
        mesh, material_id, ..
    } = &node.kind
    {
        if let Some(gpu) = node.gpu_resources() {
            let material = materials.get_material_or_default(material_id);
            if let Some(material_bind_group) = material.bind_group() {
                render_pass.set_bind_group(1, gpu.bind_group(), &[]);
                render_pass.set_bind_group(2, material_bind_group, &[]);
                mesh.draw(render_pass);
            } else {
                log::debug!(
                    "skipping '{}', material '{}' has no GPU resources yet",
                    node.name,
                    material.name
                );
            }
        }
    }

    for child in &node.children {
        draw_scene_nodes(render_pass, child, materials);
    }
}
