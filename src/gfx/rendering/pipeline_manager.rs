//! Render pipeline management
//!
//! Pipeline creation and caching with lazy instantiation, shared bind group
//! layouts and shader hot-reloading in debug builds.

use std::{collections::HashMap, sync::Arc};
use wgpu::*;

use crate::gfx::scene::vertex::Vertex3D;

/// Configuration for creating a render pipeline
#[derive(Debug, Clone)]
pub struct PipelineConfig {
    pub label: String,
    pub shader: String,
    pub bind_group_layouts: Vec<BindGroupLayout>,
    pub primitive_topology: PrimitiveTopology,
    pub cull_mode: Option<Face>,
    pub depth_format: Option<TextureFormat>,
    pub depth_write_enabled: bool,
    pub depth_compare: CompareFunction,
    pub sample_count: u32,
    pub color_targets: Vec<Option<ColorTargetState>>,
    pub vertex_only: bool,       // depth-only shadow pass
    pub no_vertex_buffers: bool, // fullscreen passes (skybox)
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            label: "Default Pipeline".to_string(),
            shader: "pbr".to_string(),
            bind_group_layouts: Vec::new(),
            primitive_topology: PrimitiveTopology::TriangleList,
            cull_mode: Some(Face::Back),
            depth_format: None,
            depth_write_enabled: true,
            depth_compare: CompareFunction::Less,
            sample_count: 1,
            color_targets: vec![Some(ColorTargetState {
                format: TextureFormat::Bgra8Unorm,
                blend: Some(BlendState::REPLACE),
                write_mask: ColorWrites::ALL,
            })],
            vertex_only: false,
            no_vertex_buffers: false,
        }
    }
}

impl PipelineConfig {
    pub fn with_label(mut self, label: &str) -> Self {
        self.label = label.to_owned();
        self
    }

    pub fn with_shader(mut self, shader: &str) -> Self {
        self.shader = shader.to_string();
        self
    }

    pub fn with_bind_group_layouts(mut self, layouts: Vec<BindGroupLayout>) -> Self {
        self.bind_group_layouts = layouts;
        self
    }

    pub fn with_cull_mode(mut self, face: Option<Face>) -> Self {
        self.cull_mode = face;
        self
    }

    pub fn with_depth_format(mut self, format: TextureFormat) -> Self {
        self.depth_format = Some(format);
        self
    }

    /// Keeps depth testing but disables writes (skybox behind the scene)
    pub fn with_depth_write(mut self, enabled: bool) -> Self {
        self.depth_write_enabled = enabled;
        self
    }

    pub fn with_depth_compare(mut self, compare: CompareFunction) -> Self {
        self.depth_compare = compare;
        self
    }

    /// Sample count must match the render pass attachments
    pub fn with_sample_count(mut self, sample_count: u32) -> Self {
        self.sample_count = sample_count;
        self
    }

    pub fn with_color_targets(mut self, targets: Vec<Option<ColorTargetState>>) -> Self {
        self.color_targets = targets;
        self
    }

    /// Depth-only pipeline without a fragment stage
    pub fn with_vertex_only(mut self) -> Self {
        self.vertex_only = true;
        self
    }

    /// Pipeline generating its geometry from the vertex index
    pub fn with_no_vertex_buffers(mut self) -> Self {
        self.no_vertex_buffers = true;
        self
    }
}

/// Manages render pipelines with caching and lazy creation
pub struct PipelineManager {
    device: Arc<Device>,
    pipelines: HashMap<String, RenderPipeline>,
    pipeline_configs: HashMap<String, PipelineConfig>,
    shader_modules: HashMap<String, ShaderModule>,
    shader_sources: HashMap<String, String>,
    pending_pipelines: Vec<String>,
}

impl PipelineManager {
    pub fn new(device: Arc<Device>) -> Self {
        Self {
            device,
            pipelines: HashMap::new(),
            pipeline_configs: HashMap::new(),
            shader_modules: HashMap::new(),
            shader_sources: HashMap::new(),
            pending_pipelines: Vec::new(),
        }
    }

    /// Registers a pipeline configuration without creating it
    ///
    /// Pipelines are created lazily when first requested via `get_pipeline()`.
    pub fn register_pipeline(&mut self, name: &str, config: PipelineConfig) {
        self.pipeline_configs.insert(name.to_string(), config);
        self.pending_pipelines.push(name.to_string());
    }

    /// Loads and compiles a shader module
    ///
    /// The source is kept for hot-reloading in debug builds.
    pub fn load_shader(&mut self, name: &str, source: &str) -> Result<(), String> {
        let shader_module = self.device.create_shader_module(ShaderModuleDescriptor {
            label: Some(name),
            source: ShaderSource::Wgsl(source.into()),
        });

        self.shader_modules.insert(name.to_string(), shader_module);
        self.shader_sources
            .insert(name.to_string(), source.to_string());
        Ok(())
    }

    /// Gets or creates a pipeline (lazy loading)
    pub fn get_pipeline(&mut self, name: &str) -> Option<&RenderPipeline> {
        if self.pipelines.contains_key(name) {
            return self.pipelines.get(name);
        }

        if let Some(config) = self.pipeline_configs.get(name).cloned() {
            match self.create_pipeline_from_config(name, &config) {
                Ok(pipeline) => {
                    self.pipelines.insert(name.to_string(), pipeline);
                    self.pending_pipelines.retain(|n| n != name);
                    return self.pipelines.get(name);
                }
                Err(e) => {
                    log::error!("failed to create pipeline '{}': {}", name, e);
                    return None;
                }
            }
        }

        None
    }

    /// Gets an already created pipeline without creating it lazily
    ///
    /// Used inside render passes, where several pipelines are borrowed from
    /// the manager at once.
    pub fn created_pipeline(&self, name: &str) -> Option<&RenderPipeline> {
        self.pipelines.get(name)
    }

    /// Creates all pending pipelines immediately
    ///
    /// Useful for validating configurations up front instead of at first use.
    pub fn create_all_pipelines(&mut self) -> Result<(), Vec<String>> {
        let mut errors = Vec::new();
        let pending = self.pending_pipelines.clone();

        for name in pending {
            if let Some(config) = self.pipeline_configs.get(&name).cloned() {
                match self.create_pipeline_from_config(&name, &config) {
                    Ok(pipeline) => {
                        self.pipelines.insert(name.clone(), pipeline);
                        self.pending_pipelines.retain(|n| n != &name);
                    }
                    Err(e) => {
                        errors.push(format!("Pipeline '{}': {}", name, e));
                    }
                }
            }
        }

        if errors.is_empty() {
            Ok(())
        } else {
            Err(errors)
        }
    }

    /// Hot-reloads a shader and recreates affected pipelines
    #[cfg(debug_assertions)]
    pub fn hot_reload_shader(
        &mut self,
        shader_name: &str,
        new_source: &str,
    ) -> Result<Vec<String>, String> {
        self.load_shader(shader_name, new_source)?;

        let mut affected_pipelines = Vec::new();
        for (pipeline_name, config) in &self.pipeline_configs {
            if config.shader == shader_name {
                affected_pipelines.push(pipeline_name.clone());
            }
        }

        for pipeline_name in &affected_pipelines {
            if let Some(config) = self.pipeline_configs.get(pipeline_name).cloned() {
                match self.create_pipeline_from_config(pipeline_name, &config) {
                    Ok(pipeline) => {
                        self.pipelines.insert(pipeline_name.clone(), pipeline);
                    }
                    Err(e) => {
                        log::error!(
                            "failed to recreate pipeline '{}' after shader reload: {}",
                            pipeline_name,
                            e
                        );
                    }
                }
            }
        }

        Ok(affected_pipelines)
    }

    fn create_pipeline_from_config(
        &self,
        name: &str,
        config: &PipelineConfig,
    ) -> Result<RenderPipeline, String> {
        let shader = self
            .shader_modules
            .get(&config.shader)
            .ok_or_else(|| format!("Shader '{}' not found", config.shader))?;

        let bind_group_layout_refs: Vec<&BindGroupLayout> =
            config.bind_group_layouts.iter().collect();
        let pipeline_layout = self
            .device
            .create_pipeline_layout(&PipelineLayoutDescriptor {
                label: Some(&format!("{} Layout", name)),
                bind_group_layouts: &bind_group_layout_refs,
                push_constant_ranges: &[],
            });

        let fragment_state = if config.vertex_only {
            None
        } else {
            Some(FragmentState {
                module: shader,
                entry_point: Some("fs_main"),
                targets: &config.color_targets,
                compilation_options: PipelineCompilationOptions::default(),
            })
        };

        let vertex_buffers: &[VertexBufferLayout] = if config.no_vertex_buffers {
            &[]
        } else {
            &[Vertex3D::desc()]
        };

        let depth_stencil = config.depth_format.map(|format| DepthStencilState {
            format,
            depth_write_enabled: config.depth_write_enabled,
            depth_compare: config.depth_compare,
            stencil: StencilState::default(),
            bias: DepthBiasState::default(),
        });

        let pipeline = self
            .device
            .create_render_pipeline(&RenderPipelineDescriptor {
                label: Some(&config.label),
                layout: Some(&pipeline_layout),
                vertex: VertexState {
                    module: shader,
                    entry_point: Some("vs_main"),
                    buffers: vertex_buffers,
                    compilation_options: PipelineCompilationOptions::default(),
                },
                fragment: fragment_state,
                primitive: PrimitiveState {
                    topology: config.primitive_topology,
                    strip_index_format: None,
                    front_face: FrontFace::Ccw,
                    cull_mode: config.cull_mode,
                    polygon_mode: PolygonMode::Fill,
                    unclipped_depth: false,
                    conservative: false,
                },
                depth_stencil,
                multisample: MultisampleState {
                    count: config.sample_count,
                    ..MultisampleState::default()
                },
                multiview: None,
                cache: None,
            });

        Ok(pipeline)
    }

    /// Lists all registered pipeline names
    pub fn list_pipelines(&self) -> Vec<&String> {
        self.pipeline_configs.keys().collect()
    }

    pub fn has_pipeline(&self, name: &str) -> bool {
        self.pipeline_configs.contains_key(name)
    }
}
