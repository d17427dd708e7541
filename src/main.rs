use winit::event_loop::{ControlFlow, EventLoop};

use splatour::app::AppHandler;

fn main() -> Result<(), Box<dyn std::error::Error>> {
    env_logger::init();

    // splatour <scene-id> [--preview], apikey from SPLATOUR_APIKEY
    let mut scene_id = None;
    let mut preview = false;
    for arg in std::env::args().skip(1) {
        match arg.as_str() {
            "--preview" => preview = true,
            _ => scene_id = Some(arg),
        }
    }
    let apikey = std::env::var("SPLATOUR_APIKEY").ok();

    let event_loop = EventLoop::new()?;
    event_loop.set_control_flow(ControlFlow::Poll);

    let mut handler = AppHandler {
        app: None,
        scene_id,
        apikey,
        preview,
        runtime: tokio::runtime::Runtime::new()?,
    };

    event_loop.run_app(&mut handler)?;

    Ok(())
}
