// src/wgpu_utils/binding_builder.rs
//! Builders for bind group layouts and bind groups
//!
//! Keeps binding indices implicit and sequential so layouts and the bind
//! groups created from them cannot drift apart.

/// A bind group layout together with the entries it was created from.
///
/// The entries are kept so that [`BindGroupBuilder`] can verify that the
/// number of bound resources matches the layout.
pub struct BindGroupLayoutWithDesc {
    pub layout: wgpu::BindGroupLayout,
    pub entries: Vec<wgpu::BindGroupLayoutEntry>,
}

/// Builder for bind group layouts with sequential binding indices
pub struct BindGroupLayoutBuilder {
    entries: Vec<wgpu::BindGroupLayoutEntry>,
    next_binding: u32,
}

impl BindGroupLayoutBuilder {
    pub fn new() -> Self {
        Self {
            entries: Vec::new(),
            next_binding: 0,
        }
    }

    /// Adds a binding with explicit shader stage visibility
    pub fn next_binding(mut self, visibility: wgpu::ShaderStages, ty: wgpu::BindingType) -> Self {
        self.entries.push(wgpu::BindGroupLayoutEntry {
            binding: self.next_binding,
            visibility,
            ty,
            count: None,
        });
        self.next_binding += 1;
        self
    }

    /// Adds a binding visible to the vertex stage only
    pub fn next_binding_vertex(self, ty: wgpu::BindingType) -> Self {
        self.next_binding(wgpu::ShaderStages::VERTEX, ty)
    }

    /// Adds a binding visible to the fragment stage only
    pub fn next_binding_fragment(self, ty: wgpu::BindingType) -> Self {
        self.next_binding(wgpu::ShaderStages::FRAGMENT, ty)
    }

    /// Adds a binding visible to both vertex and fragment stages
    pub fn next_binding_rendering(self, ty: wgpu::BindingType) -> Self {
        self.next_binding(
            wgpu::ShaderStages::VERTEX | wgpu::ShaderStages::FRAGMENT,
            ty,
        )
    }

    pub fn create(self, device: &wgpu::Device, label: &str) -> BindGroupLayoutWithDesc {
        let layout = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            label: Some(label),
            entries: &self.entries,
        });
        BindGroupLayoutWithDesc {
            layout,
            entries: self.entries,
        }
    }
}

impl Default for BindGroupLayoutBuilder {
    fn default() -> Self {
        Self::new()
    }
}

/// Builder for bind groups matching a [`BindGroupLayoutWithDesc`]
///
/// Resources are bound in the same order the layout entries were declared.
pub struct BindGroupBuilder<'a> {
    layout: &'a BindGroupLayoutWithDesc,
    entries: Vec<wgpu::BindGroupEntry<'a>>,
}

impl<'a> BindGroupBuilder<'a> {
    pub fn new(layout: &'a BindGroupLayoutWithDesc) -> Self {
        Self {
            layout,
            entries: Vec::with_capacity(layout.entries.len()),
        }
    }

    /// Binds the next resource in declaration order
    pub fn resource(mut self, resource: wgpu::BindingResource<'a>) -> Self {
        self.entries.push(wgpu::BindGroupEntry {
            binding: self.layout.entries[self.entries.len()].binding,
            resource,
        });
        self
    }

    /// Binds a texture view as the next resource
    pub fn texture(self, view: &'a wgpu::TextureView) -> Self {
        self.resource(wgpu::BindingResource::TextureView(view))
    }

    /// Binds a sampler as the next resource
    pub fn sampler(self, sampler: &'a wgpu::Sampler) -> Self {
        self.resource(wgpu::BindingResource::Sampler(sampler))
    }

    pub fn create(&self, device: &wgpu::Device, label: &str) -> wgpu::BindGroup {
        debug_assert_eq!(
            self.entries.len(),
            self.layout.entries.len(),
            "bind group '{}' does not bind every layout entry",
            label
        );
        device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some(label),
            layout: &self.layout.layout,
            entries: &self.entries,
        })
    }
}
