//! Application shell: window, event loop, frame driver and asset events
//!
//! Owns the winit event loop and wires the pieces together: asset loads run
//! on worker threads and post completion events back to the loop; the debug
//! panel mutates the shared settings; the frame driver guarantees the
//! control update precedes the render call every tick.

use std::path::PathBuf;
use std::sync::Arc;

use cgmath::{Vector3, Zero};
use winit::{
    application::ApplicationHandler,
    dpi::{LogicalSize, PhysicalSize},
    event::WindowEvent,
    event_loop::{ActiveEventLoop, ControlFlow, EventLoop, EventLoopProxy},
    window::{Window, WindowAttributes},
};

use crate::gfx::{
    camera::{
        camera_controller::CameraController, camera_utils::CameraManager,
        orbit_camera::OrbitCamera,
    },
    loaders::{self, cube_map::load_cube_map, gltf_model::load_model, gltf_model::LoadedModel},
    rendering::render_engine::RenderEngine,
    resources::environment::CubeMapData,
    scene::scene::Scene,
    settings::RenderSettings,
    viewport::Viewport,
};
use crate::ui::{
    manager::UiManager,
    panel::{environment_panel, PanelResponse},
};

/// Completion events posted by the loader threads
///
/// Model and environment loads finish independently and touch disjoint
/// scene state, so no ordering between them matters.
pub enum AppEvent {
    ModelLoaded(Box<LoadedModel>),
    EnvironmentLoaded(Box<CubeMapData>),
    LoadFailed { what: &'static str, error: String },
}

/// Per-frame driver with an explicit stop handle
///
/// One non-terminal state: running. Each tick invokes the control update
/// strictly before the render call; after [`stop`](FrameDriver::stop),
/// ticks are ignored.
#[derive(Debug, Clone, Copy)]
pub struct FrameDriver {
    running: bool,
    frame_count: u64,
}

impl Default for FrameDriver {
    fn default() -> Self {
        Self {
            running: true,
            frame_count: 0,
        }
    }
}

impl FrameDriver {
    pub fn new() -> Self {
        Self::default()
    }

    /// Runs one tick: `update` first, then `render`
    pub fn tick<T>(
        &mut self,
        target: &mut T,
        update: impl FnOnce(&mut T),
        render: impl FnOnce(&mut T),
    ) {
        if !self.running {
            return;
        }
        self.frame_count += 1;
        update(target);
        render(target);
    }

    /// Stops the driver; subsequent ticks do nothing
    pub fn stop(&mut self) {
        self.running = false;
    }

    pub fn is_running(&self) -> bool {
        self.running
    }

    pub fn frame_count(&self) -> u64 {
        self.frame_count
    }
}

/// The patina viewer application
///
/// Create with [`crate::default()`], optionally point it at an asset root,
/// then call [`run`](PatinaApp::run).
pub struct PatinaApp {
    event_loop: Option<EventLoop<AppEvent>>,
    app_state: AppState,
}

struct AppState {
    window: Option<Arc<Window>>,
    render_engine: Option<RenderEngine>,
    ui_manager: Option<UiManager>,
    scene: Scene,
    settings: RenderSettings,
    viewport: Viewport,
    frame_driver: FrameDriver,
    asset_root: PathBuf,
    proxy: EventLoopProxy<AppEvent>,
    loads_spawned: bool,
}

impl PatinaApp {
    /// Creates the application with the default scene and settings
    pub async fn new() -> Self {
        let event_loop = EventLoop::<AppEvent>::with_user_event()
            .build()
            .expect("Failed to create event loop");
        let proxy = event_loop.create_proxy();

        let mut camera =
            OrbitCamera::looking_from(Vector3::new(4.0, 1.0, -4.0), Vector3::zero(), 1.0);
        camera.bounds.min_distance = Some(1.1);
        let controller = CameraController::new(0.005, 0.1);
        let scene = Scene::new(CameraManager::new(camera, controller));

        Self {
            event_loop: Some(event_loop),
            app_state: AppState {
                window: None,
                render_engine: None,
                ui_manager: None,
                scene,
                settings: RenderSettings::default(),
                viewport: Viewport::new(1200, 800, 1.0),
                frame_driver: FrameDriver::new(),
                asset_root: PathBuf::from("assets"),
                proxy,
                loads_spawned: false,
            },
        }
    }

    /// Sets the directory the asset paths are resolved against
    pub fn set_asset_root(&mut self, root: impl Into<PathBuf>) {
        self.app_state.asset_root = root.into();
    }

    /// Runs the application (consumes self and starts the event loop)
    pub fn run(mut self) {
        let event_loop = self.event_loop.take().expect("Event loop already consumed");
        event_loop.set_control_flow(ControlFlow::Wait);

        event_loop
            .run_app(&mut self.app_state)
            .expect("Failed to run event loop");
    }
}

impl AppState {
    /// Starts both asset loads on worker threads
    ///
    /// Each posts exactly one completion event; the scene is only mutated
    /// back on the UI thread when the events are handled.
    fn spawn_asset_loads(&mut self) {
        if self.loads_spawned {
            return;
        }
        self.loads_spawned = true;

        let model_path = self.asset_root.join(loaders::MODEL_PATH);
        let proxy = self.proxy.clone();
        std::thread::spawn(move || {
            let event = match load_model(&model_path) {
                Ok(model) => AppEvent::ModelLoaded(Box::new(model)),
                Err(error) => AppEvent::LoadFailed {
                    what: "model",
                    error: error.to_string(),
                },
            };
            let _ = proxy.send_event(event);
        });

        let environment_dir = self.asset_root.join(loaders::ENVIRONMENT_DIR);
        let proxy = self.proxy.clone();
        std::thread::spawn(move || {
            let event = match load_cube_map(&environment_dir) {
                Ok(cube) => AppEvent::EnvironmentLoaded(Box::new(cube)),
                Err(error) => AppEvent::LoadFailed {
                    what: "environment map",
                    error: error.to_string(),
                },
            };
            let _ = proxy.send_event(event);
        });
    }

    /// Pushes the current viewport into the camera, surface and UI
    fn apply_viewport(&mut self) {
        self.scene
            .camera_manager
            .camera
            .resize_projection(self.viewport.aspect_ratio());

        let (width, height) = self.viewport.physical_size();
        if let Some(render_engine) = self.render_engine.as_mut() {
            render_engine.resize(width, height);
        }
        if let Some(ui_manager) = self.ui_manager.as_mut() {
            ui_manager.update_display_size(width, height);
        }
    }

    /// Encodes and presents one frame, then applies the panel response
    fn render_frame(&mut self) {
        let Some(render_engine) = self.render_engine.as_mut() else {
            return;
        };
        let Some(window) = self.window.as_ref() else {
            return;
        };

        render_engine.update(
            self.scene.camera_manager.camera.uniform,
            &self.scene.light,
            &self.settings,
        );

        // The panel edits copies while the scene is borrowed by the frame;
        // responses are applied once encoding is done.
        let mut settings = self.settings;
        let mut light = self.scene.light;
        let mut response = PanelResponse::default();

        if let Some(ui_manager) = self.ui_manager.as_mut() {
            let window_clone = window.clone();
            render_engine.render_frame(
                &mut self.scene,
                Some(
                    |device: &wgpu::Device,
                     queue: &wgpu::Queue,
                     encoder: &mut wgpu::CommandEncoder,
                     color_attachment: &wgpu::TextureView| {
                        ui_manager.draw(
                            device,
                            queue,
                            encoder,
                            &window_clone,
                            color_attachment,
                            |ui| {
                                response = environment_panel(ui, &mut settings, &mut light);
                            },
                        );
                    },
                ),
            );
        } else {
            render_engine.render_frame_simple(&mut self.scene);
        }

        self.settings = settings;
        self.scene.light = light;

        if response.model_rotation_changed {
            self.scene.set_model_rotation_y(settings.model_rotation_y);
        }
        if response.needs_material_sync() {
            self.scene.sync_materials(&self.settings);
        }
    }
}

impl ApplicationHandler<AppEvent> for AppState {
    fn resumed(&mut self, event_loop: &ActiveEventLoop) {
        if self.window.is_some() {
            return;
        }

        if let Ok(window) = event_loop.create_window(
            WindowAttributes::default()
                .with_title("patina")
                .with_inner_size(LogicalSize::new(1200, 800)),
        ) {
            let window_handle = Arc::new(window);
            self.window = Some(window_handle.clone());

            let scale_factor = window_handle.scale_factor();
            let logical: LogicalSize<f64> = window_handle.inner_size().to_logical(scale_factor);
            self.viewport = Viewport::new(
                logical.width.round() as u32,
                logical.height.round() as u32,
                scale_factor,
            );

            let (width, height) = self.viewport.physical_size();
            let window_clone = window_handle.clone();
            let renderer = pollster::block_on(async move {
                RenderEngine::new(window_clone, width, height).await
            });

            let mut ui_manager = UiManager::new(
                renderer.device(),
                renderer.queue(),
                renderer.surface_format(),
                &window_handle,
            );
            ui_manager.update_display_size(width, height);

            self.ui_manager = Some(ui_manager);
            self.render_engine = Some(renderer);

            self.scene
                .camera_manager
                .camera
                .resize_projection(self.viewport.aspect_ratio());

            self.spawn_asset_loads();
        }
    }

    fn window_event(
        &mut self,
        event_loop: &ActiveEventLoop,
        window_id: winit::window::WindowId,
        event: WindowEvent,
    ) {
        if self.render_engine.is_none() {
            return;
        }
        let Some(window) = self.window.as_ref().cloned() else {
            return;
        };

        // The panel gets first claim on input
        if let Some(ui_manager) = self.ui_manager.as_mut() {
            let ui_event: winit::event::Event<AppEvent> = winit::event::Event::WindowEvent {
                window_id,
                event: event.clone(),
            };
            if ui_manager.handle_input(&window, &ui_event) {
                window.request_redraw();
                return;
            }
        }

        match event {
            WindowEvent::KeyboardInput {
                event:
                    winit::event::KeyEvent {
                        physical_key: winit::keyboard::PhysicalKey::Code(key_code),
                        ..
                    },
                ..
            } => {
                if matches!(key_code, winit::keyboard::KeyCode::Escape) {
                    event_loop.exit();
                }
            }
            WindowEvent::Resized(PhysicalSize { width, height }) => {
                let scale_factor = window.scale_factor();
                let logical: LogicalSize<f64> =
                    PhysicalSize::new(width, height).to_logical(scale_factor);
                self.viewport.set_scale_factor(scale_factor);
                self.viewport
                    .resize(logical.width.round() as u32, logical.height.round() as u32);
                self.apply_viewport();
            }
            WindowEvent::ScaleFactorChanged { scale_factor, .. } => {
                self.viewport.set_scale_factor(scale_factor);
                self.apply_viewport();
            }
            WindowEvent::CloseRequested => {
                self.frame_driver.stop();
                event_loop.exit();
            }
            WindowEvent::RedrawRequested => {
                let mut driver = self.frame_driver;
                driver.tick(
                    self,
                    |state| state.scene.camera_manager.advance(),
                    |state| state.render_frame(),
                );
                self.frame_driver = driver;
            }
            _ => (),
        }
    }

    fn user_event(&mut self, _event_loop: &ActiveEventLoop, event: AppEvent) {
        match event {
            AppEvent::ModelLoaded(model) => {
                self.scene.attach_model(*model);
                self.scene.sync_materials(&self.settings);
            }
            AppEvent::EnvironmentLoaded(cube) => {
                if let Some(render_engine) = self.render_engine.as_mut() {
                    render_engine.set_environment(&cube);
                }
            }
            AppEvent::LoadFailed { what, error } => {
                // Fail loud: asset failures are fatal to the session.
                log::error!("failed to load {}: {}", what, error);
                panic!("failed to load {}: {}", what, error);
            }
        }

        if let Some(window) = self.window.as_ref() {
            window.request_redraw();
        }
    }

    fn device_event(
        &mut self,
        _event_loop: &ActiveEventLoop,
        _device_id: winit::event::DeviceId,
        event: winit::event::DeviceEvent,
    ) {
        let Some(window) = self.window.as_ref() else {
            return;
        };

        // Skip camera input while the panel is using the pointer
        if let Some(ui_manager) = self.ui_manager.as_ref() {
            let io = ui_manager.context.io();
            if io.want_capture_mouse || io.want_capture_keyboard {
                return;
            }
        }

        self.scene.camera_manager.process_event(&event, window);
    }

    fn about_to_wait(&mut self, _event_loop: &ActiveEventLoop) {
        // Self-rescheduling: each frame requests the next one
        if self.frame_driver.is_running() {
            if let Some(ref window) = self.window {
                window.request_redraw();
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tick_runs_update_strictly_before_render() {
        let mut driver = FrameDriver::new();
        let mut calls: Vec<&'static str> = Vec::new();

        driver.tick(
            &mut calls,
            |calls| calls.push("update"),
            |calls| calls.push("render"),
        );

        assert_eq!(calls, vec!["update", "render"]);
        assert_eq!(driver.frame_count(), 1);
    }

    #[test]
    fn stopped_driver_ignores_ticks() {
        let mut driver = FrameDriver::new();
        let mut calls: Vec<&'static str> = Vec::new();

        driver.stop();
        driver.tick(
            &mut calls,
            |calls| calls.push("update"),
            |calls| calls.push("render"),
        );

        assert!(calls.is_empty());
        assert_eq!(driver.frame_count(), 0);
        assert!(!driver.is_running());
    }

    #[test]
    fn every_tick_preserves_the_ordering_guarantee() {
        let mut driver = FrameDriver::new();
        let mut calls: Vec<&'static str> = Vec::new();

        for _ in 0..3 {
            driver.tick(
                &mut calls,
                |calls| calls.push("update"),
                |calls| calls.push("render"),
            );
        }

        assert_eq!(
            calls,
            vec!["update", "render", "update", "render", "update", "render"]
        );
        assert_eq!(driver.frame_count(), 3);
    }
}
