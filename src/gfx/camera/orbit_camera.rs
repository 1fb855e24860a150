use super::camera_utils::{convert_matrix4_to_array, Camera, CameraUniform};
use cgmath::*;

#[rustfmt::skip]
pub const OPENGL_TO_WGPU_MATRIX: cgmath::Matrix4<f32> = cgmath::Matrix4::new(
    1.0, 0.0, 0.0, 0.0,
    0.0, 1.0, 0.0, 0.0,
    0.0, 0.0, 0.5, 0.5,
    0.0, 0.0, 0.0, 1.0,
);

/// Perspective camera orbiting a focal point
///
/// Spherical state (distance, pitch, yaw) around `target`; the eye position
/// is derived. Y is up.
#[derive(Debug, Clone, Copy)]
pub struct OrbitCamera {
    pub distance: f32,
    pub pitch: f32,
    pub yaw: f32,
    pub eye: Vector3<f32>,
    pub target: Vector3<f32>,
    pub up: Vector3<f32>,
    pub bounds: OrbitCameraBounds,
    pub aspect: f32,
    pub fovy: Rad<f32>,
    pub znear: f32,
    pub zfar: f32,
    pub uniform: CameraUniform,
}

impl Camera for OrbitCamera {
    fn build_view_projection_matrix(&self) -> Matrix4<f32> {
        let eye = Point3::from_vec(self.eye);
        let target = Point3::from_vec(self.target);
        let view = Matrix4::look_at_rh(eye, target, self.up);
        let proj =
            OPENGL_TO_WGPU_MATRIX * perspective(self.fovy, self.aspect, self.znear, self.zfar);
        proj * view
    }
}

impl OrbitCamera {
    pub fn new(distance: f32, pitch: f32, yaw: f32, target: Vector3<f32>, aspect: f32) -> Self {
        let mut camera = Self {
            distance,
            pitch,
            yaw,
            eye: Vector3::zero(), // derived in update()
            target,
            up: Vector3::unit_y(),
            bounds: OrbitCameraBounds::default(),
            aspect,
            fovy: Deg(75.0).into(),
            znear: 0.1,
            zfar: 100.0,
            uniform: CameraUniform::default(),
        };
        camera.update();
        camera
    }

    /// Creates a camera orbiting `target` from an explicit eye position
    ///
    /// Converts the cartesian placement into the spherical orbit state.
    pub fn looking_from(eye: Vector3<f32>, target: Vector3<f32>, aspect: f32) -> Self {
        let offset = eye - target;
        let distance = offset.magnitude();
        let pitch = (offset.y / distance).asin();
        let yaw = offset.x.atan2(offset.z);
        Self::new(distance, pitch, yaw, target, aspect)
    }

    pub fn set_distance(&mut self, distance: f32) {
        self.distance = distance.clamp(
            self.bounds.min_distance.unwrap_or(f32::EPSILON),
            self.bounds.max_distance.unwrap_or(f32::MAX),
        );
        self.update();
    }

    pub fn add_distance(&mut self, delta: f32) {
        // Scale zoom steps with distance so it feels even at every range.
        let corrected_zoom = f32::log10(self.distance.max(1.1)) * delta;
        self.set_distance(self.distance + corrected_zoom);
    }

    pub fn set_pitch(&mut self, pitch: f32) {
        self.pitch = pitch.clamp(self.bounds.min_pitch, self.bounds.max_pitch);
        self.update();
    }

    pub fn add_pitch(&mut self, delta: f32) {
        self.set_pitch(self.pitch + delta);
    }

    pub fn set_yaw(&mut self, yaw: f32) {
        self.yaw = yaw;
        self.update();
    }

    pub fn add_yaw(&mut self, delta: f32) {
        self.set_yaw(self.yaw + delta);
    }

    /// Updates the camera after changing `distance`, `pitch` or `yaw`.
    fn update(&mut self) {
        self.eye =
            calculate_cartesian_eye_position(self.pitch, self.yaw, self.distance, self.target);
    }

    pub fn resize_projection(&mut self, aspect: f32) {
        self.aspect = aspect;
    }

    pub fn update_view_proj(&mut self) {
        self.uniform.view_position = [self.eye.x, self.eye.y, self.eye.z, 1.0];
        self.uniform.view_proj = convert_matrix4_to_array(self.build_view_projection_matrix());
    }
}

#[derive(Debug, Clone, Copy)]
pub struct OrbitCameraBounds {
    pub min_distance: Option<f32>,
    pub max_distance: Option<f32>,
    pub min_pitch: f32,
    pub max_pitch: f32,
}

impl Default for OrbitCameraBounds {
    fn default() -> Self {
        Self {
            min_distance: None,
            max_distance: Some(16.0),
            min_pitch: -std::f32::consts::PI / 2.0 + f32::EPSILON,
            max_pitch: std::f32::consts::PI / 2.0 - f32::EPSILON,
        }
    }
}

fn calculate_cartesian_eye_position(
    pitch: f32,
    yaw: f32,
    distance: f32,
    target: Vector3<f32>,
) -> Vector3<f32> {
    Vector3::new(
        distance * yaw.sin() * pitch.cos(),
        distance * pitch.sin(),
        distance * yaw.cos() * pitch.cos(),
    ) + target
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn looking_from_round_trips_the_eye_position() {
        let eye = Vector3::new(4.0, 1.0, -4.0);
        let camera = OrbitCamera::looking_from(eye, Vector3::zero(), 1.5);

        assert!((camera.eye - eye).magnitude() < 1e-4);
        assert!((camera.distance - 33.0f32.sqrt()).abs() < 1e-4);
    }

    #[test]
    fn pitch_is_clamped_short_of_the_poles() {
        let mut camera = OrbitCamera::new(5.0, 0.0, 0.0, Vector3::zero(), 1.0);
        camera.set_pitch(10.0);
        assert!(camera.pitch < std::f32::consts::PI / 2.0);
    }

    #[test]
    fn resize_projection_updates_aspect_only() {
        let mut camera = OrbitCamera::new(5.0, 0.2, 0.3, Vector3::zero(), 1.0);
        let eye = camera.eye;
        camera.resize_projection(1024.0 / 768.0);
        assert_eq!(camera.aspect, 1024.0 / 768.0);
        assert_eq!(camera.eye, eye);
    }
}
