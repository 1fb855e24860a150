//! Pointer input handling for the orbit camera, with inertial damping
//!
//! Pointer events accumulate into angular and zoom velocities; `advance`
//! applies them to the camera once per frame and decays them, so the orbit
//! keeps gliding briefly after the pointer stops.

use winit::{
    dpi::PhysicalPosition,
    event::{DeviceEvent, ElementState, MouseScrollDelta},
    window::Window,
};

use super::orbit_camera::OrbitCamera;

/// Velocities below this are snapped to zero to let the camera settle
const REST_THRESHOLD: f32 = 1e-5;

pub struct CameraController {
    pub rotate_speed: f32,
    pub zoom_speed: f32,
    /// Fraction of velocity carried into the next frame (0 = no inertia)
    pub damping: f32,
    yaw_velocity: f32,
    pitch_velocity: f32,
    zoom_velocity: f32,
    is_mouse_pressed: bool,
}

impl CameraController {
    pub fn new(rotate_speed: f32, zoom_speed: f32) -> Self {
        Self {
            rotate_speed,
            zoom_speed,
            damping: 0.82,
            yaw_velocity: 0.0,
            pitch_velocity: 0.0,
            zoom_velocity: 0.0,
            is_mouse_pressed: false,
        }
    }

    pub fn process_events(&mut self, event: &DeviceEvent, window: &Window) {
        match event {
            DeviceEvent::Button {
                button: 0, // Left Mouse Button
                state,
            } => {
                self.is_mouse_pressed = *state == ElementState::Pressed;
            }
            DeviceEvent::MouseWheel { delta, .. } => {
                let scroll_amount = -match delta {
                    MouseScrollDelta::LineDelta(_, scroll) => *scroll,
                    MouseScrollDelta::PixelDelta(PhysicalPosition { y: scroll, .. }) => {
                        *scroll as f32
                    }
                };
                self.zoom_velocity += scroll_amount * self.zoom_speed;
                window.request_redraw();
            }
            DeviceEvent::MouseMotion { delta } => {
                if self.is_mouse_pressed {
                    self.yaw_velocity += -delta.0 as f32 * self.rotate_speed;
                    self.pitch_velocity += delta.1 as f32 * self.rotate_speed;
                    window.request_redraw();
                }
            }
            _ => (),
        }
    }

    /// Applies accumulated velocities to the camera and decays them
    ///
    /// Called exactly once per tick, before the frame is rendered.
    pub fn advance(&mut self, camera: &mut OrbitCamera) {
        if self.yaw_velocity != 0.0 {
            camera.add_yaw(self.yaw_velocity);
        }
        if self.pitch_velocity != 0.0 {
            camera.add_pitch(self.pitch_velocity);
        }
        if self.zoom_velocity != 0.0 {
            camera.add_distance(self.zoom_velocity);
        }

        self.yaw_velocity = decay(self.yaw_velocity, self.damping);
        self.pitch_velocity = decay(self.pitch_velocity, self.damping);
        self.zoom_velocity = decay(self.zoom_velocity, self.damping);
    }

    /// True while inertia still moves the camera
    pub fn is_coasting(&self) -> bool {
        self.yaw_velocity != 0.0 || self.pitch_velocity != 0.0 || self.zoom_velocity != 0.0
    }
}

fn decay(velocity: f32, damping: f32) -> f32 {
    let damped = velocity * damping;
    if damped.abs() < REST_THRESHOLD {
        0.0
    } else {
        damped
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use cgmath::Vector3;

    fn camera() -> OrbitCamera {
        OrbitCamera::new(5.0, 0.2, 0.3, Vector3::new(0.0, 0.0, 0.0), 1.0)
    }

    #[test]
    fn advance_applies_and_decays_velocity() {
        let mut controller = CameraController::new(0.005, 0.1);
        let mut camera = camera();
        controller.yaw_velocity = 0.1;

        let yaw_before = camera.yaw;
        controller.advance(&mut camera);

        assert!((camera.yaw - (yaw_before + 0.1)).abs() < 1e-6);
        assert!(controller.yaw_velocity < 0.1);
        assert!(controller.is_coasting());
    }

    #[test]
    fn velocity_settles_to_rest() {
        let mut controller = CameraController::new(0.005, 0.1);
        let mut camera = camera();
        controller.pitch_velocity = 0.05;

        for _ in 0..200 {
            controller.advance(&mut camera);
        }
        assert!(!controller.is_coasting());
    }

    #[test]
    fn advance_without_input_is_a_no_op() {
        let mut controller = CameraController::new(0.005, 0.1);
        let mut camera = camera();
        let before = (camera.yaw, camera.pitch, camera.distance);

        controller.advance(&mut camera);

        assert_eq!(before, (camera.yaw, camera.pitch, camera.distance));
    }
}
