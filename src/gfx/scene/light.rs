//! Directional light with shadow mapping parameters

use cgmath::{Matrix4, Point3, Vector3};

use crate::gfx::camera::orbit_camera::OPENGL_TO_WGPU_MATRIX;

/// Shadow mapping configuration for a directional light
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ShadowSettings {
    /// Shadow map resolution (square)
    pub map_size: u32,
    /// Far plane of the shadow camera; kept tight for depth precision
    pub camera_far: f32,
    /// Half-extent of the orthographic shadow frustum
    pub extent: f32,
    /// Depth offset against shadow acne on lit surfaces
    pub normal_bias: f32,
}

impl Default for ShadowSettings {
    fn default() -> Self {
        Self {
            map_size: 1024,
            camera_far: 10.0,
            extent: 8.0,
            normal_bias: 0.005,
        }
    }
}

/// Directional light aimed at the scene origin
///
/// The position determines the light direction; intensity and position are
/// bound directly by the debug panel.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DirectionalLight {
    pub position: Vector3<f32>,
    pub color: [f32; 3],
    pub intensity: f32,
    pub cast_shadow: bool,
    pub shadow: ShadowSettings,
}

impl Default for DirectionalLight {
    fn default() -> Self {
        Self {
            position: Vector3::new(0.25, 3.0, -2.25),
            color: [1.0, 1.0, 1.0],
            intensity: 1.0,
            cast_shadow: true,
            shadow: ShadowSettings::default(),
        }
    }
}

impl DirectionalLight {
    /// View-projection matrix of the shadow camera
    ///
    /// Orthographic, looking from the light position at the origin, with the
    /// far plane from [`ShadowSettings`].
    pub fn view_projection(&self) -> Matrix4<f32> {
        let eye = Point3::new(self.position.x, self.position.y, self.position.z);
        let view = Matrix4::look_at_rh(eye, Point3::new(0.0, 0.0, 0.0), Vector3::unit_y());
        let e = self.shadow.extent;
        let proj = cgmath::ortho(-e, e, -e, e, 0.1, self.shadow.camera_far);
        OPENGL_TO_WGPU_MATRIX * proj * view
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use cgmath::{InnerSpace, Transform};

    #[test]
    fn shadow_defaults_match_viewer_configuration() {
        let light = DirectionalLight::default();
        assert_eq!(light.shadow.map_size, 1024);
        assert_eq!(light.shadow.camera_far, 10.0);
    }

    #[test]
    fn shadow_camera_sees_the_origin() {
        let light = DirectionalLight::default();
        let clip = light
            .view_projection()
            .transform_point(Point3::new(0.0, 0.0, 0.0));
        assert!(clip.x.abs() <= 1.0 && clip.y.abs() <= 1.0);
        assert!(clip.z >= 0.0 && clip.z <= 1.0);
    }

    #[test]
    fn default_direction_points_down_toward_scene() {
        let light = DirectionalLight::default();
        let direction = light.position.normalize();
        assert!(direction.y > 0.0);
    }
}
