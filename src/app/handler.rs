use std::sync::Arc;

use log::error;
use tokio::runtime::Runtime;
use winit::application::ApplicationHandler;
use winit::event::WindowEvent;
use winit::event_loop::ActiveEventLoop;
use winit::window::{Window, WindowId};

use crate::app::app::App;

pub struct AppHandler {
    pub app: Option<App>,
    pub scene_id: Option<String>,
    pub apikey: Option<String>,
    pub preview: bool,
    pub runtime: Runtime,
}

impl ApplicationHandler for AppHandler {
    fn resumed(&mut self, event_loop: &ActiveEventLoop) {
        if self.app.is_none() {
            let window_attrs = Window::default_attributes()
                .with_title("Splatour")
                .with_inner_size(winit::dpi::LogicalSize::new(1200.0, 800.0));

            let window = match event_loop.create_window(window_attrs) {
                Ok(window) => Arc::new(window),
                Err(e) => {
                    error!("failed to create window: {e}");
                    event_loop.exit();
                    return;
                }
            };

            let mut app = match self
                .runtime
                .block_on(App::new(window, self.apikey.take()))
            {
                Ok(app) => app,
                Err(e) => {
                    error!("failed to initialize: {e}");
                    event_loop.exit();
                    return;
                }
            };

            // Load scene if provided as command line argument
            if let Some(scene_id) = &self.scene_id
                && let Err(e) = self
                    .runtime
                    .block_on(app.load_scene(scene_id, self.preview))
            {
                error!("failed to load scene '{scene_id}': {e}");
            }

            self.app = Some(app);
        }
    }

    fn window_event(
        &mut self,
        event_loop: &ActiveEventLoop,
        _window_id: WindowId,
        event: WindowEvent,
    ) {
        if let Some(app) = &mut self.app {
            let response = app.handle_event(&event);
            if response.repaint {
                app.window.request_redraw();
            }
            if response.exit {
                event_loop.exit();
            }
        }
    }

    fn about_to_wait(&mut self, _event_loop: &ActiveEventLoop) {
        if let Some(app) = &mut self.app {
            if let Err(e) = app.render() {
                error!("render error: {e:?}");
            }
            app.window.request_redraw();
        }
    }
}
