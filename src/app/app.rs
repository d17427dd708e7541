use std::collections::BTreeSet;
use std::sync::Arc;
use std::time::Instant;

use egui_wgpu::ScreenDescriptor;
use egui_winit::State;
use log::{debug, info};

use crate::api::client::ApiClient;
use crate::camera::{CameraEvent, PointerButton};
use crate::error::ViewerError;
use crate::render::Renderer;
use crate::settings::Settings;
use crate::ui::Ui;
use crate::viewer::ViewerController;

/// LineDelta wheel steps to pixel-ish scroll units.
const WHEEL_LINE_FACTOR: f32 = 40.0;

pub struct EventResponse {
    pub repaint: bool,
    pub exit: bool,
}

pub struct App {
    pub window: Arc<winit::window::Window>,
    ui: Ui,
    renderer: Renderer,
    viewer: ViewerController,
    client: ApiClient,
    /// Item ids whose vertex buffers the renderer already holds.
    uploaded_clouds: BTreeSet<String>,
    current_cursor_pos: Option<(f64, f64)>,
    egui_state: State,
    egui_wants_pointer: bool,
    settings: Settings,
    last_frame: Instant,
}

impl App {
    pub async fn new(
        window: Arc<winit::window::Window>,
        apikey: Option<String>,
    ) -> Result<Self, Box<dyn std::error::Error>> {
        let renderer = Renderer::new(&window).await?;

        let egui_ctx = renderer.egui_context();
        let egui_state = State::new(
            egui_ctx.clone(),
            egui::viewport::ViewportId::ROOT,
            &window,
            None,
            None,
            None,
        );

        let settings = Settings::load();

        let mut viewer = ViewerController::new();
        viewer.set_transition_speed_multiplier(settings.viewer.transition_speed_multiplier);
        viewer.set_automode_dwell(settings.viewer.automode_dwell_seconds);
        if !settings.viewer.auto_rotate {
            viewer.camera_mut().set_auto_rotate(false);
        }

        let size = window.inner_size();
        viewer.set_viewport(size.width as f32, size.height as f32);

        viewer.set_on_state_change_start(Box::new(|change| {
            info!("transition to view {} ({}) started", change.index, change.view.title);
        }));
        viewer.set_on_state_change_complete(Box::new(|change| {
            info!("view {} ({}) reached", change.index, change.view.title);
        }));
        viewer.add_camera_listener(Box::new(|event| {
            if let CameraEvent::TargetLookAtChanged(center) = event {
                debug!(
                    "orbit center moved to ({:.2}, {:.2}, {:.2})",
                    center.x, center.y, center.z
                );
            }
        }));

        Ok(Self {
            window,
            ui: Ui::new(),
            renderer,
            viewer,
            client: ApiClient::new(apikey),
            uploaded_clouds: BTreeSet::new(),
            current_cursor_pos: None,
            egui_state,
            egui_wants_pointer: false,
            settings,
            last_frame: Instant::now(),
        })
    }

    pub async fn load_scene(&mut self, scene_id: &str, preview: bool) -> Result<(), ViewerError> {
        self.viewer.load_scene(&self.client, scene_id, preview).await?;

        self.renderer.clear_clouds();
        self.uploaded_clouds.clear();
        if let Some(document) = self.viewer.document() {
            self.renderer.set_background_color(document.background_rgba());
            self.window.set_title(&format!("Splatour - {}", document.name));
        }
        Ok(())
    }

    pub fn handle_event(&mut self, event: &winit::event::WindowEvent) -> EventResponse {
        // Let egui handle the event first
        let egui_response = self.egui_state.on_window_event(&self.window, event);
        let egui_wants_input = egui_response.consumed;

        match event {
            winit::event::WindowEvent::CloseRequested => {
                return EventResponse {
                    repaint: false,
                    exit: true,
                };
            }
            winit::event::WindowEvent::KeyboardInput { event, .. } => {
                if egui_wants_input {
                    return EventResponse {
                        repaint: egui_response.repaint,
                        exit: false,
                    };
                }
                if event.state == winit::event::ElementState::Pressed {
                    use winit::keyboard::{Key, NamedKey};
                    match &event.logical_key {
                        Key::Named(NamedKey::Escape) => {
                            return EventResponse {
                                repaint: false,
                                exit: true,
                            };
                        }
                        Key::Named(NamedKey::ArrowRight) => {
                            // Key navigation counts as interaction.
                            self.viewer.camera_mut().mark_user_interacted();
                            self.viewer.next_view();
                        }
                        Key::Named(NamedKey::ArrowLeft) => {
                            self.viewer.camera_mut().mark_user_interacted();
                            self.viewer.previous_view();
                        }
                        Key::Named(NamedKey::Space) => {
                            let automode = self.viewer.automode();
                            self.viewer.set_automode(!automode);
                        }
                        _ => {}
                    }
                }
            }
            winit::event::WindowEvent::Resized(size) => {
                self.renderer.resize(*size);
                self.viewer
                    .set_viewport(size.width as f32, size.height as f32);
            }
            winit::event::WindowEvent::MouseInput { state, button, .. } => {
                if self.egui_wants_pointer {
                    return EventResponse {
                        repaint: egui_response.repaint,
                        exit: false,
                    };
                }
                let pointer_button = match button {
                    winit::event::MouseButton::Left => Some(PointerButton::Primary),
                    winit::event::MouseButton::Right => Some(PointerButton::Secondary),
                    _ => None,
                };
                if let (Some(button), Some((x, y))) = (pointer_button, self.current_cursor_pos) {
                    match state {
                        winit::event::ElementState::Pressed => {
                            self.viewer.on_pointer_down(x as f32, y as f32, button);
                        }
                        winit::event::ElementState::Released => {
                            self.viewer.on_pointer_up(x as f32, y as f32);
                        }
                    }
                }
            }
            winit::event::WindowEvent::CursorMoved { position, .. } => {
                if self.egui_wants_pointer {
                    return EventResponse {
                        repaint: egui_response.repaint,
                        exit: false,
                    };
                }
                self.current_cursor_pos = Some((position.x, position.y));
                self.viewer
                    .on_pointer_move(position.x as f32, position.y as f32);
            }
            winit::event::WindowEvent::MouseWheel { delta, .. } => {
                if self.egui_wants_pointer {
                    return EventResponse {
                        repaint: egui_response.repaint,
                        exit: false,
                    };
                }
                match delta {
                    winit::event::MouseScrollDelta::LineDelta(_, y) => {
                        self.viewer.on_wheel(-y * WHEEL_LINE_FACTOR);
                    }
                    winit::event::MouseScrollDelta::PixelDelta(pos) => {
                        self.viewer.on_wheel(-pos.y as f32);
                    }
                }
            }
            _ => {}
        }

        EventResponse {
            repaint: false,
            exit: false,
        }
    }

    pub fn render(&mut self) -> Result<(), wgpu::SurfaceError> {
        let now = Instant::now();
        let dt = (now - self.last_frame).as_secs_f32().min(0.1);
        self.last_frame = now;

        self.viewer.update(dt);
        self.sync_clouds();

        let egui_ctx = self.renderer.egui_context();
        let raw_input = self.egui_state.take_egui_input(&self.window);

        let mut actions = Default::default();
        let full_output = egui_ctx.run(raw_input, |ctx| {
            actions = self.ui.show(ctx, &self.viewer, &mut self.settings);
        });

        // Update egui pointer state for next frame
        self.egui_wants_pointer = egui_ctx.wants_pointer_input();

        self.apply_ui_actions(actions);

        self.egui_state
            .handle_platform_output(&self.window, full_output.platform_output);

        let paint_jobs = egui_ctx.tessellate(full_output.shapes, full_output.pixels_per_point);

        let screen_descriptor = ScreenDescriptor {
            size_in_pixels: [
                self.window.inner_size().width,
                self.window.inner_size().height,
            ],
            pixels_per_point: self.window.scale_factor() as f32,
        };

        let projection = self.viewer.projection();
        self.renderer.render(
            projection.as_ref(),
            paint_jobs,
            full_output.textures_delta,
            screen_descriptor,
        )
    }

    fn apply_ui_actions(&mut self, actions: crate::ui::UiActions) {
        if actions.next_view {
            self.viewer.next_view();
        }
        if actions.previous_view {
            self.viewer.previous_view();
        }
        if let Some(index) = actions.goto_view {
            self.viewer.set_view(index as isize);
        }
        if actions.toggle_automode {
            let automode = self.viewer.automode();
            self.viewer.set_automode(!automode);
        }
    }

    /// Push clouds that finished downloading since last frame into GPU
    /// buffers.
    fn sync_clouds(&mut self) {
        let renderer = &mut self.renderer;
        let uploaded = &mut self.uploaded_clouds;
        for (item_id, cloud) in self.viewer.clouds() {
            if uploaded.insert(item_id.to_string()) {
                renderer.upload_cloud(item_id, cloud);
            }
        }
    }
}
