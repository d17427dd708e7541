//! Camera change events and the guarded listener registry.

use std::panic::{AssertUnwindSafe, catch_unwind};

use log::error;
use nalgebra_glm as glm;

use super::state::CameraFrame;

/// Aggregate per-frame update carrying both the instantaneous target
/// pose and the smoothed rendered pose. This is the signal the
/// hit-point projector consumes.
#[derive(Debug, Clone)]
pub struct CameraUpdate {
    pub target: CameraFrame,
    pub current: CameraFrame,
}

#[derive(Debug, Clone)]
pub enum CameraEvent {
    TargetPositionChanged(glm::Vec3),
    TargetLookAtChanged(glm::Vec3),
    TargetZoomChanged(f32),
    PositionChanged(glm::Vec3),
    LookAtChanged(glm::Vec3),
    ZoomChanged(f32),
    CameraUpdate(CameraUpdate),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ListenerId(usize);

type Listener = Box<dyn FnMut(&CameraEvent)>;

/// Listener registry. Each callback runs inside its own guarded call so
/// one misbehaving consumer cannot halt the render loop or starve the
/// other listeners.
#[derive(Default)]
pub struct CameraEventBus {
    listeners: Vec<(ListenerId, Listener)>,
    next_id: usize,
}

impl CameraEventBus {
    pub fn add_listener(&mut self, listener: Listener) -> ListenerId {
        let id = ListenerId(self.next_id);
        self.next_id += 1;
        self.listeners.push((id, listener));
        id
    }

    pub fn remove_listener(&mut self, id: ListenerId) {
        self.listeners.retain(|(listener_id, _)| *listener_id != id);
    }

    pub fn emit(&mut self, event: &CameraEvent) {
        for (id, listener) in &mut self.listeners {
            let result = catch_unwind(AssertUnwindSafe(|| listener(event)));
            if result.is_err() {
                error!("camera event listener {id:?} panicked; continuing");
            }
        }
    }
}
