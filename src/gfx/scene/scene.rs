//! Scene container and the material sync pass

use cgmath::{Matrix4, Rad, SquareMatrix, Vector3};
use wgpu::Device;

use crate::gfx::{
    camera::camera_utils::CameraManager,
    loaders::gltf_model::LoadedModel,
    resources::material::MaterialManager,
    settings::RenderSettings,
};

use super::{
    light::DirectionalLight,
    node::{NodeKind, SceneNode},
};

/// Placement applied to the loaded model's root node
///
/// Scale and position are fixed at load time; the Y rotation is live-bound
/// to the debug panel.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ModelPlacement {
    pub scale: f32,
    pub position: Vector3<f32>,
    pub rotation_y: f32,
}

impl Default for ModelPlacement {
    fn default() -> Self {
        Self {
            scale: 10.0,
            position: Vector3::new(0.0, -4.0, 0.0),
            rotation_y: std::f32::consts::FRAC_PI_2,
        }
    }
}

impl ModelPlacement {
    pub fn matrix(&self) -> Matrix4<f32> {
        let t = Matrix4::from_translation(self.position);
        let r = Matrix4::from_angle_y(Rad(self.rotation_y));
        let s = Matrix4::from_scale(self.scale);
        t * r * s
    }
}

/// Main scene: node tree, materials, light and camera
pub struct Scene {
    pub camera_manager: CameraManager,
    pub root: SceneNode,
    pub material_manager: MaterialManager,
    pub light: DirectionalLight,
    model_placement: ModelPlacement,
    model_name: Option<String>,
}

impl Scene {
    /// Creates an empty scene with the given camera manager
    pub fn new(camera_manager: CameraManager) -> Self {
        Self {
            camera_manager,
            root: SceneNode::group("root", Matrix4::identity()),
            material_manager: MaterialManager::new(),
            light: DirectionalLight::default(),
            model_placement: ModelPlacement::default(),
            model_name: None,
        }
    }

    /// Attaches a loaded model under the root with the default placement
    ///
    /// Called from the model-load completion event. The model's materials
    /// are moved into the material manager; its node tree becomes a child
    /// of the scene root, wrapped so the placement transform can be updated
    /// independently of the model's own node transforms.
    pub fn attach_model(&mut self, model: LoadedModel) {
        for material in model.materials {
            self.material_manager.add_material(material);
        }

        let mut wrapper = SceneNode::group(&model.name, self.model_placement.matrix());
        wrapper.children.push(model.root);
        self.model_name = Some(wrapper.name.clone());
        self.root.children.push(wrapper);

        log::info!("model '{}' attached to scene", self.model_name.as_deref().unwrap_or(""));
    }

    /// Applies a new Y rotation to the attached model, if any
    pub fn set_model_rotation_y(&mut self, rotation_y: f32) {
        self.model_placement.rotation_y = rotation_y;
        let placement = self.model_placement;
        if let Some(name) = &self.model_name {
            if let Some(node) = self
                .root
                .children
                .iter_mut()
                .find(|child| &child.name == name)
            {
                node.transform = placement.matrix();
            }
        }
    }

    /// Material sync pass
    ///
    /// Walks the node tree; every drawable mesh whose material is physically
    /// based gets the current environment intensity, has its material marked
    /// for a GPU refresh, and gets both shadow flags enabled. Unlit materials
    /// and group nodes are untouched. An empty tree is a no-op, and running
    /// the pass twice with the same settings leaves the same state as once.
    pub fn sync_materials(&mut self, settings: &RenderSettings) {
        let materials = &mut self.material_manager;
        let intensity = settings.env_intensity;

        self.root.visit_mut(&mut |node| {
            log::trace!("material sync visiting '{}'", node.name);

            if let NodeKind::Mesh {
                material_id,
                cast_shadow,
                receive_shadow,
                ..
            } = &mut node.kind
            {
                if let Some(material) = materials.get_material_mut(material_id) {
                    if material.set_env_intensity(intensity) {
                        *cast_shadow = true;
                        *receive_shadow = true;
                    }
                }
            }
        });
    }

    /// Uploads mesh buffers, world transforms and dirty materials
    ///
    /// Called once per frame before encoding the render passes.
    pub fn update_gpu_resources(&mut self, device: &Device, queue: &wgpu::Queue) {
        self.root
            .update_gpu_resources(device, queue, Matrix4::identity());
        self.material_manager
            .update_dirty_gpu_resources(device, queue);
    }

    /// Number of drawable mesh nodes in the tree
    pub fn mesh_count(&self) -> usize {
        let mut count = 0;
        self.root.visit(&mut |node| {
            if node.is_mesh() {
                count += 1;
            }
        });
        count
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::gfx::{
        camera::{camera_controller::CameraController, orbit_camera::OrbitCamera},
        resources::material::{Material, PbrParams},
        scene::node::Mesh,
        scene::vertex::Vertex3D,
    };
    use cgmath::Zero;

    fn test_scene() -> Scene {
        let camera = OrbitCamera::new(5.0, 0.2, 0.3, Vector3::zero(), 1.0);
        let controller = CameraController::new(0.005, 0.1);
        Scene::new(CameraManager::new(camera, controller))
    }

    fn triangle() -> Mesh {
        let vertices = vec![
            Vertex3D {
                position: [0.0, 0.0, 0.0],
                normal: [0.0, 0.0, 1.0],
                uv: [0.0, 0.0],
            };
            3
        ];
        Mesh::new(vertices, vec![0, 1, 2])
    }

    fn scene_with_meshes() -> Scene {
        let mut scene = test_scene();
        scene
            .material_manager
            .add_material(Material::pbr("leather", [1.0; 4], PbrParams::default()));
        scene
            .material_manager
            .add_material(Material::unlit("wire", [1.0, 0.0, 0.0, 1.0]));

        let mut group = SceneNode::group("helmet", Matrix4::identity());
        group.children.push(SceneNode::mesh(
            "strap",
            Matrix4::identity(),
            triangle(),
            "leather".to_string(),
        ));
        group.children.push(SceneNode::mesh(
            "marker",
            Matrix4::identity(),
            triangle(),
            "wire".to_string(),
        ));
        scene.root.children.push(group);
        scene
    }

    fn mesh_states(scene: &Scene) -> Vec<(String, bool, bool, Option<f32>)> {
        let mut states = Vec::new();
        scene.root.visit(&mut |node| {
            if let NodeKind::Mesh {
                material_id,
                cast_shadow,
                receive_shadow,
                ..
            } = &node.kind
            {
                let intensity = scene
                    .material_manager
                    .get_material(material_id)
                    .and_then(|m| m.pbr_params())
                    .map(|p| p.env_intensity);
                states.push((node.name.clone(), *cast_shadow, *receive_shadow, intensity));
            }
        });
        states.sort_by(|a, b| a.0.cmp(&b.0));
        states
    }

    #[test]
    fn sync_applies_intensity_and_shadow_flags_to_pbr_meshes() {
        let mut scene = scene_with_meshes();
        let settings = RenderSettings {
            env_intensity: 7.0,
            ..RenderSettings::default()
        };

        scene.sync_materials(&settings);

        let states = mesh_states(&scene);
        // Unlit mesh is skipped entirely.
        assert_eq!(
            states,
            vec![
                ("marker".to_string(), false, false, None),
                ("strap".to_string(), true, true, Some(7.0)),
            ]
        );
    }

    #[test]
    fn sync_is_idempotent() {
        let mut scene = scene_with_meshes();
        let settings = RenderSettings {
            env_intensity: 3.5,
            ..RenderSettings::default()
        };

        scene.sync_materials(&settings);
        let once = mesh_states(&scene);
        scene.sync_materials(&settings);
        let twice = mesh_states(&scene);

        assert_eq!(once, twice);
    }

    #[test]
    fn sync_on_empty_scene_is_a_no_op() {
        let mut scene = test_scene();
        scene.sync_materials(&RenderSettings::default());
        assert_eq!(scene.mesh_count(), 0);
    }

    #[test]
    fn intensity_change_reaches_every_qualifying_mesh() {
        let mut scene = scene_with_meshes();

        let mut settings = RenderSettings {
            env_intensity: 2.0,
            ..RenderSettings::default()
        };
        scene.sync_materials(&settings);

        settings.env_intensity = 7.0;
        scene.sync_materials(&settings);

        for (name, _, _, intensity) in mesh_states(&scene) {
            if name == "strap" {
                assert_eq!(intensity, Some(7.0));
            }
        }
    }

    #[test]
    fn model_rotation_updates_the_wrapper_transform() {
        let mut scene = test_scene();
        let model = LoadedModel {
            name: "helmet".to_string(),
            root: SceneNode::group("gltf", Matrix4::identity()),
            materials: Vec::new(),
        };
        scene.attach_model(model);

        scene.set_model_rotation_y(0.0);
        let expected = ModelPlacement {
            rotation_y: 0.0,
            ..ModelPlacement::default()
        };
        assert_eq!(scene.root.children[0].transform, expected.matrix());
    }
}
