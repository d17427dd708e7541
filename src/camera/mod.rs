pub mod controller;
pub mod events;
pub mod state;

pub use controller::{CameraController, PointerButton, PoseUpdate};
pub use events::{CameraEvent, CameraEventBus, CameraUpdate, ListenerId};
pub use state::{CameraFrame, Lens, OrbitPose};
