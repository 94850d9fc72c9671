//! Window, event loop and the per-frame update/render cycle

use std::{sync::Arc, time::Instant};

use thiserror::Error;
use winit::{
    application::ApplicationHandler,
    dpi::{LogicalSize, PhysicalSize},
    error::{EventLoopError, OsError},
    event::{DeviceEvent, DeviceId, ElementState, KeyEvent, WindowEvent},
    event_loop::{ActiveEventLoop, ControlFlow, EventLoop},
    keyboard::{KeyCode, PhysicalKey},
    window::{Window, WindowAttributes, WindowId},
};

use crate::{
    behaviour::SimpleMoveBehaviour,
    config::AppConfig,
    demo::DemoScene,
    gfx::{
        camera::{view_matrix, FrameUniform},
        lighting::LightingMode,
        rendering::{build_draw_list, DrawItem, DrawStats, RenderEngine, RenderError},
        resources::Resources,
        scene::GameScene,
    },
    input::InputState,
    performance::{FpsHistory, FrameTiming},
    ui::{LightingPanel, UiManager},
};

#[derive(Debug, Error)]
pub enum AppError {
    #[error("event loop failed: {0}")]
    EventLoop(#[from] EventLoopError),
    #[error("failed to create window: {0}")]
    Window(#[from] OsError),
    #[error("graphics initialisation failed: {0}")]
    Render(#[from] RenderError),
}

pub struct LightingApp {
    event_loop: Option<EventLoop<()>>,
    state: AppState,
}

struct AppState {
    config: AppConfig,
    window: Option<Arc<Window>>,
    render_engine: Option<RenderEngine>,
    ui_manager: Option<UiManager>,
    demo: DemoScene,
    panel: LightingPanel,
    input: InputState,
    clock: Instant,
    timing: FrameTiming,
    fps: FpsHistory,
    startup_error: Option<AppError>,
}

impl LightingApp {
    /// Creates the event loop; the window and GPU come up on first resume
    pub fn new(config: AppConfig, demo: DemoScene) -> Result<Self, AppError> {
        let event_loop = EventLoop::new()?;
        let mode = LightingMode::from_condition(config.lighting.initial_mode);

        Ok(Self {
            event_loop: Some(event_loop),
            state: AppState {
                config,
                window: None,
                render_engine: None,
                ui_manager: None,
                demo,
                panel: LightingPanel::new(mode),
                input: InputState::new(),
                clock: Instant::now(),
                timing: FrameTiming::new(0.0),
                fps: FpsHistory::new(),
                startup_error: None,
            },
        })
    }

    /// Runs until the window closes; returns any error that stopped startup
    pub fn run(mut self) -> Result<(), AppError> {
        let Some(event_loop) = self.event_loop.take() else {
            return Ok(());
        };
        event_loop.set_control_flow(ControlFlow::Poll);
        event_loop.run_app(&mut self.state)?;

        match self.state.startup_error.take() {
            Some(e) => Err(e),
            None => Ok(()),
        }
    }
}

impl AppState {
    fn init_graphics(&mut self, event_loop: &ActiveEventLoop) -> Result<(), AppError> {
        let settings = &self.config.window;
        let window = Arc::new(
            event_loop.create_window(
                WindowAttributes::default()
                    .with_title(settings.title.clone())
                    .with_inner_size(LogicalSize::new(settings.width, settings.height)),
            )?,
        );
        let (width, height) = window.inner_size().into();

        let render_engine = pollster::block_on(RenderEngine::new(
            window.clone(),
            width,
            height,
            settings.vsync,
            self.config.rendering.clear_color,
        ))?;

        let mut ui_manager = UiManager::new(
            render_engine.device(),
            render_engine.queue(),
            render_engine.surface_format(),
            &window,
        );
        ui_manager.update_display_size(width, height);

        if let Some(camera) = self.demo.scene.camera_mut(self.demo.camera) {
            camera.resize(width, height);
        }

        self.clock = Instant::now();
        self.timing = FrameTiming::new(0.0);
        self.ui_manager = Some(ui_manager);
        self.render_engine = Some(render_engine);
        self.window = Some(window);
        Ok(())
    }

    fn resize(&mut self, width: u32, height: u32) {
        if width == 0 || height == 0 {
            return;
        }
        log::debug!("Resized to {}x{}", width, height);
        if let Some(render_engine) = self.render_engine.as_mut() {
            render_engine.resize(width, height);
        }
        if let Some(ui_manager) = self.ui_manager.as_mut() {
            ui_manager.update_display_size(width, height);
        }
        if let Some(camera) = self.demo.scene.camera_mut(self.demo.camera) {
            camera.resize(width, height);
        }
    }

    fn apply_panel_changes(&mut self) {
        if let Some(mode) = self.panel.take_mode_change() {
            match self.demo.resources.shader_mut(self.demo.scene_shader) {
                Some(shader) => {
                    if let Err(e) = mode.apply(shader) {
                        log::error!("Failed to apply lighting mode: {}", e);
                    }
                }
                None => log::error!("Scene shader is missing"),
            }
        }
        if let Some(enabled) = self.panel.take_simple_move_change() {
            let count = self
                .demo
                .scene
                .set_behaviours_enabled::<SimpleMoveBehaviour>(enabled);
            log::info!(
                "Keyboard movement {} on {} objects",
                if enabled { "enabled" } else { "disabled" },
                count
            );
        }
    }

    fn redraw(&mut self, event_loop: &ActiveEventLoop) {
        let delta_time = self
            .timing
            .begin_frame(self.clock.elapsed().as_secs_f64());
        self.fps.push(delta_time);

        let (Some(window), Some(ui_manager)) = (self.window.as_ref(), self.ui_manager.as_mut())
        else {
            return;
        };
        let panel = &mut self.panel;
        let fps = &self.fps;
        ui_manager.update_logic(window, |ui| panel.draw(ui, fps));

        if !ui_manager.wants_keyboard() {
            for watcher in self.demo.key_watchers.iter_mut() {
                watcher.poll(&self.input, &mut self.demo.scene);
            }
        }
        self.apply_panel_changes();

        advance_scene(&mut self.demo.scene, delta_time, &self.input);

        let frame = frame_uniform(&self.demo.scene);
        let commands = build_draw_list(draw_items(&self.demo.scene, &self.demo.resources));
        log::trace!(
            "Frame: {:.4}s, {:?}",
            delta_time,
            DrawStats::from_commands(&commands)
        );

        if let (Some(render_engine), Some(ui_manager)) =
            (self.render_engine.as_mut(), self.ui_manager.as_mut())
        {
            let result = render_engine.render_frame(
                &mut self.demo.resources,
                &self.demo.scene,
                frame,
                &commands,
                Some(
                    |device: &wgpu::Device,
                     queue: &wgpu::Queue,
                     encoder: &mut wgpu::CommandEncoder,
                     view: &wgpu::TextureView| {
                        ui_manager.render(device, queue, encoder, view);
                    },
                ),
            );
            match result {
                Ok(()) => {}
                Err(RenderError::Surface(wgpu::SurfaceError::OutOfMemory)) => {
                    log::error!("Out of GPU memory, exiting");
                    event_loop.exit();
                }
                Err(e) => log::warn!("Frame skipped: {}", e),
            }
        }

        retire_destroyed(&mut self.demo.scene);
        self.input.end_frame();
        self.timing.end_frame();
    }
}

/// Runs behaviours and refreshes world matrices ahead of drawing
pub fn advance_scene(scene: &mut GameScene, delta_time: f32, input: &InputState) {
    scene.update_behaviours(delta_time, input);
    scene.update_world_matrices();
}

/// Removes entities whose destruction was requested this frame
///
/// Runs after the frame is drawn, so a destroyed entity is still visible for
/// the frame in which it was destroyed.
pub fn retire_destroyed(scene: &mut GameScene) -> usize {
    let removed = scene.poll();
    if removed > 0 {
        log::debug!("Destroyed {} entities", removed);
    }
    removed
}

/// Camera matrices for the frame, or identity if the scene has no camera
fn frame_uniform(scene: &GameScene) -> FrameUniform {
    let Some(entity) = scene.main_camera() else {
        return FrameUniform::default();
    };
    match (scene.transform(entity), scene.camera(entity)) {
        (Some(transform), Some(camera)) => FrameUniform::new(
            view_matrix(transform),
            camera.projection(),
            transform.local_position(),
        ),
        _ => FrameUniform::default(),
    }
}

/// Every renderable whose material still exists
pub fn draw_items(scene: &GameScene, resources: &Resources) -> Vec<DrawItem> {
    scene
        .renderables()
        .filter_map(|(entity, renderer, _)| {
            resources.render_key(renderer).map(|key| DrawItem {
                key,
                entity,
                mesh: renderer.mesh,
            })
        })
        .collect()
}

fn is_release(event: &WindowEvent) -> bool {
    match event {
        WindowEvent::KeyboardInput { event, .. } => event.state == ElementState::Released,
        WindowEvent::MouseInput { state, .. } => *state == ElementState::Released,
        _ => false,
    }
}

impl ApplicationHandler for AppState {
    fn resumed(&mut self, event_loop: &ActiveEventLoop) {
        if self.window.is_some() {
            return;
        }
        if let Err(e) = self.init_graphics(event_loop) {
            log::error!("{}", e);
            self.startup_error = Some(e);
            event_loop.exit();
        }
    }

    fn window_event(&mut self, event_loop: &ActiveEventLoop, window_id: WindowId, event: WindowEvent) {
        let Some(window) = self.window.clone() else {
            return;
        };

        // UI sees input first; releases always reach the scene so keys never stick
        let captured = match self.ui_manager.as_mut() {
            Some(ui_manager) => ui_manager.handle_input(&window, window_id, &event),
            None => false,
        };
        if !captured || is_release(&event) {
            self.input.process_window_event(&event);
        }

        match event {
            WindowEvent::KeyboardInput {
                event:
                    KeyEvent {
                        physical_key: PhysicalKey::Code(KeyCode::Escape),
                        state: ElementState::Pressed,
                        ..
                    },
                ..
            } => {
                log::info!("Escape pressed, exiting");
                event_loop.exit();
            }
            WindowEvent::Resized(PhysicalSize { width, height }) => self.resize(width, height),
            WindowEvent::CloseRequested => event_loop.exit(),
            WindowEvent::RedrawRequested => self.redraw(event_loop),
            _ => (),
        }
    }

    fn device_event(&mut self, _event_loop: &ActiveEventLoop, _device_id: DeviceId, event: DeviceEvent) {
        if let Some(ui_manager) = self.ui_manager.as_ref() {
            if ui_manager.wants_mouse() {
                return;
            }
        }
        self.input.process_device_event(&event);
    }

    fn about_to_wait(&mut self, _event_loop: &ActiveEventLoop) {
        if let Some(window) = self.window.as_ref() {
            window.request_redraw();
        }
    }
}
