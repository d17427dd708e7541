pub mod api;
pub mod app;
pub mod camera;
pub mod error;
pub mod hitpoints;
pub mod math;
pub mod navigation;
pub mod render;
pub mod settings;
pub mod splat;
pub mod transition;
pub mod ui;
pub mod viewer;

pub const CONFY_APP_NAME: &str = "splatour";

pub use api::client::ApiClient;
pub use api::models::SceneDocument;
pub use camera::CameraController;
pub use error::{ApiError, ApiErrorKind, ViewerError};
pub use transition::TransitionDirector;
pub use viewer::ViewerController;
