//! Scene graph nodes
//!
//! A [`SceneNode`] is either a grouping node or a drawable mesh referencing a
//! material by id. Nodes carry a local transform; world transforms are the
//! product of the ancestor chain and are pushed to the GPU once per frame.

use cgmath::Matrix4;
use wgpu::Device;

use crate::{
    gfx::resources::material::MaterialId,
    wgpu_utils::{
        binding_builder::{BindGroupBuilder, BindGroupLayoutBuilder},
        binding_types,
        uniform_buffer::UniformBuffer,
    },
};

use super::vertex::Vertex3D;

/// Per-node uniform data for the vertex stage
///
/// Must match the ModelUniform struct in `pbr.wgsl` and `shadow.wgsl`.
#[repr(C)]
#[derive(Copy, Clone, Debug, bytemuck::Pod, bytemuck::Zeroable)]
pub struct ModelUniform {
    pub model: [[f32; 4]; 4],
}

/// GPU resources for one drawable node
pub struct NodeGpuResources {
    transform_ubo: UniformBuffer<ModelUniform>,
    transform_bind_group: wgpu::BindGroup,
}

impl NodeGpuResources {
    fn new(device: &Device, name: &str) -> Self {
        let layout = BindGroupLayoutBuilder::new()
            .next_binding_vertex(binding_types::uniform())
            .create(device, "Transform Bind Group Layout");

        let transform_ubo = UniformBuffer::new(device);
        let transform_bind_group = BindGroupBuilder::new(&layout)
            .resource(transform_ubo.binding_resource())
            .create(device, &format!("{} Transform Bind Group", name));

        Self {
            transform_ubo,
            transform_bind_group,
        }
    }

    pub fn bind_group(&self) -> &wgpu::BindGroup {
        &self.transform_bind_group
    }
}

/// Triangle mesh geometry with lazily created GPU buffers
pub struct Mesh {
    vertices: Vec<Vertex3D>,
    indices: Vec<u32>,
    vertex_buffer: Option<wgpu::Buffer>,
    index_buffer: Option<wgpu::Buffer>,
    index_count: u32,
}

impl Mesh {
    pub fn new(vertices: Vec<Vertex3D>, indices: Vec<u32>) -> Self {
        let index_count = indices.len() as u32;
        Self {
            vertices,
            indices,
            vertex_buffer: None,
            index_buffer: None,
            index_count,
        }
    }

    pub fn vertex_count(&self) -> u32 {
        self.vertices.len() as u32
    }

    pub fn index_count(&self) -> u32 {
        self.index_count
    }

    /// Fills in missing normals by averaging face normals per vertex
    pub fn compute_normals(vertices: &mut [Vertex3D], indices: &[u32]) {
        let mut accumulated = vec![[0.0f32; 3]; vertices.len()];

        for triangle in indices.chunks_exact(3) {
            let [i0, i1, i2] = [
                triangle[0] as usize,
                triangle[1] as usize,
                triangle[2] as usize,
            ];
            let v0 = vertices[i0].position;
            let v1 = vertices[i1].position;
            let v2 = vertices[i2].position;

            let edge1 = [v1[0] - v0[0], v1[1] - v0[1], v1[2] - v0[2]];
            let edge2 = [v2[0] - v0[0], v2[1] - v0[1], v2[2] - v0[2]];
            let face_normal = [
                edge1[1] * edge2[2] - edge1[2] * edge2[1],
                edge1[2] * edge2[0] - edge1[0] * edge2[2],
                edge1[0] * edge2[1] - edge1[1] * edge2[0],
            ];

            for &index in &[i0, i1, i2] {
                for axis in 0..3 {
                    accumulated[index][axis] += face_normal[axis];
                }
            }
        }

        for (vertex, normal) in vertices.iter_mut().zip(accumulated) {
            let length =
                (normal[0] * normal[0] + normal[1] * normal[1] + normal[2] * normal[2]).sqrt();
            if length > 0.0 {
                vertex.normal = [
                    normal[0] / length,
                    normal[1] / length,
                    normal[2] / length,
                ];
            }
        }
    }

    fn upload(&mut self, device: &Device) {
        if self.vertex_buffer.is_some() {
            return;
        }

        self.vertex_buffer = Some(wgpu::util::DeviceExt::create_buffer_init(
            device,
            &wgpu::util::BufferInitDescriptor {
                label: Some("Vertex Buffer"),
                contents: bytemuck::cast_slice(&self.vertices),
                usage: wgpu::BufferUsages::VERTEX,
            },
        ));
        self.index_buffer = Some(wgpu::util::DeviceExt::create_buffer_init(
            device,
            &wgpu::util::BufferInitDescriptor {
                label: Some("Index Buffer"),
                contents: bytemuck::cast_slice(&self.indices),
                usage: wgpu::BufferUsages::INDEX,
            },
        ));
    }

    /// Issues the draw call, assuming bind groups are already set
    pub fn draw<'a>(&'a self, render_pass: &mut wgpu::RenderPass<'a>) {
        let (Some(vertex_buffer), Some(index_buffer)) =
            (&self.vertex_buffer, &self.index_buffer)
        else {
            return; // not uploaded yet
        };

        render_pass.set_vertex_buffer(0, vertex_buffer.slice(..));
        render_pass.set_index_buffer(index_buffer.slice(..), wgpu::IndexFormat::Uint32);
        render_pass.draw_indexed(0..self.index_count, 0, 0..1);
    }
}

/// What a node contributes to the scene
pub enum NodeKind {
    /// Pure grouping/transform node
    Group,
    /// Drawable geometry with a material reference and shadow flags
    Mesh {
        mesh: Mesh,
        material_id: MaterialId,
        cast_shadow: bool,
        receive_shadow: bool,
    },
}

/// One node in the scene graph
pub struct SceneNode {
    pub name: String,
    pub transform: Matrix4<f32>,
    pub kind: NodeKind,
    pub children: Vec<SceneNode>,
    gpu: Option<NodeGpuResources>,
}

impl SceneNode {
    pub fn group(name: &str, transform: Matrix4<f32>) -> Self {
        Self {
            name: name.to_string(),
            transform,
            kind: NodeKind::Group,
            children: Vec::new(),
            gpu: None,
        }
    }

    pub fn mesh(
        name: &str,
        transform: Matrix4<f32>,
        mesh: Mesh,
        material_id: MaterialId,
    ) -> Self {
        Self {
            name: name.to_string(),
            transform,
            kind: NodeKind::Mesh {
                mesh,
                material_id,
                cast_shadow: false,
                receive_shadow: false,
            },
            children: Vec::new(),
            gpu: None,
        }
    }

    pub fn is_mesh(&self) -> bool {
        matches!(self.kind, NodeKind::Mesh { .. })
    }

    /// Depth-first walk over this node and every descendant
    ///
    /// Traversal order is not observable by callers; no ordering dependency
    /// exists between sibling nodes.
    pub fn visit_mut(&mut self, visitor: &mut impl FnMut(&mut SceneNode)) {
        visitor(self);
        for child in &mut self.children {
            child.visit_mut(visitor);
        }
    }

    /// Immutable depth-first walk
    pub fn visit(&self, visitor: &mut impl FnMut(&SceneNode)) {
        visitor(self);
        for child in &self.children {
            child.visit(visitor);
        }
    }

    /// Uploads mesh buffers and world transforms for this subtree
    ///
    /// `parent` is the accumulated world transform of the ancestor chain.
    /// Buffers are created on first use; the transform uniform is re-written
    /// each frame (the uniform buffer skips redundant uploads itself).
    pub fn update_gpu_resources(
        &mut self,
        device: &Device,
        queue: &wgpu::Queue,
        parent: Matrix4<f32>,
    ) {
        let world = parent * self.transform;

        if let NodeKind::Mesh { mesh, .. } = &mut self.kind {
            mesh.upload(device);
            let gpu = self
                .gpu
                .get_or_insert_with(|| NodeGpuResources::new(device, &self.name));
            let world_array: [[f32; 4]; 4] = world.into();
            gpu.transform_ubo
                .update_content(queue, ModelUniform { model: world_array });
        }

        for child in &mut self.children {
            child.update_gpu_resources(device, queue, world);
        }
    }

    pub fn gpu_resources(&self) -> Option<&NodeGpuResources> {
        self.gpu.as_ref()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use cgmath::SquareMatrix;

    fn quad_mesh() -> Mesh {
        let vertices = vec![
            Vertex3D {
                position: [0.0, 0.0, 0.0],
                normal: [0.0, 0.0, 0.0],
                uv: [0.0, 0.0],
            },
            Vertex3D {
                position: [1.0, 0.0, 0.0],
                normal: [0.0, 0.0, 0.0],
                uv: [1.0, 0.0],
            },
            Vertex3D {
                position: [0.0, 1.0, 0.0],
                normal: [0.0, 0.0, 0.0],
                uv: [0.0, 1.0],
            },
        ];
        Mesh::new(vertices, vec![0, 1, 2])
    }

    #[test]
    fn visit_reaches_every_node() {
        let mut root = SceneNode::group("root", Matrix4::identity());
        let mut child = SceneNode::group("child", Matrix4::identity());
        child.children.push(SceneNode::mesh(
            "leaf",
            Matrix4::identity(),
            quad_mesh(),
            "default".to_string(),
        ));
        root.children.push(child);

        let mut names = Vec::new();
        root.visit(&mut |node| names.push(node.name.clone()));
        assert_eq!(names, vec!["root", "child", "leaf"]);
    }

    #[test]
    fn compute_normals_produces_unit_face_normal() {
        let mut vertices = vec![
            Vertex3D {
                position: [0.0, 0.0, 0.0],
                normal: [0.0, 0.0, 0.0],
                uv: [0.0, 0.0],
            },
            Vertex3D {
                position: [1.0, 0.0, 0.0],
                normal: [0.0, 0.0, 0.0],
                uv: [0.0, 0.0],
            },
            Vertex3D {
                position: [0.0, 1.0, 0.0],
                normal: [0.0, 0.0, 0.0],
                uv: [0.0, 0.0],
            },
        ];
        Mesh::compute_normals(&mut vertices, &[0, 1, 2]);

        for vertex in &vertices {
            assert!((vertex.normal[2] - 1.0).abs() < 1e-6);
        }
    }

    #[test]
    fn mesh_nodes_start_with_shadow_flags_off() {
        let node = SceneNode::mesh(
            "leaf",
            Matrix4::identity(),
            quad_mesh(),
            "default".to_string(),
        );
        match node.kind {
            NodeKind::Mesh {
                cast_shadow,
                receive_shadow,
                ..
            } => {
                assert!(!cast_shadow);
                assert!(!receive_shadow);
            }
            NodeKind::Group => panic!("expected mesh node"),
        }
    }
}
