//! Hit-point projector.
//!
//! Hit points are world-space anchors whose screen positions back the
//! overlay markers. They are recomputed whenever the rendered camera
//! pose moves and pushed to per-point callbacks; a callback only fires
//! when its point's screen state actually changed.

use std::collections::BTreeMap;
use std::panic::{AssertUnwindSafe, catch_unwind};

use log::error;
use nalgebra_glm as glm;

use crate::render::Projection;

/// Screen-space movement (px) below which no update is pushed.
const SCREEN_EPSILON: f32 = 0.1;

#[derive(Debug, Clone, PartialEq)]
pub struct HitPointUpdate {
    pub x: f32,
    pub y: f32,
    /// False when the point is behind the camera.
    pub visible: bool,
}

pub type HitPointCallback = Box<dyn FnMut(&HitPointUpdate)>;

struct HitPoint {
    position: glm::Vec3,
    callback: HitPointCallback,
    last: Option<HitPointUpdate>,
}

#[derive(Default)]
pub struct HitPointProjector {
    points: BTreeMap<String, HitPoint>,
}

impl HitPointProjector {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    /// Register a hit point. Re-adding an id replaces the point and its
    /// callback; the stale callback receives no farewell event.
    pub fn add(&mut self, id: impl Into<String>, position: glm::Vec3, callback: HitPointCallback) {
        self.points.insert(
            id.into(),
            HitPoint {
                position,
                callback,
                last: None,
            },
        );
    }

    /// Move an existing point. Returns false for unknown ids.
    pub fn update_position(&mut self, id: &str, position: glm::Vec3) -> bool {
        match self.points.get_mut(id) {
            Some(point) => {
                point.position = position;
                true
            }
            None => false,
        }
    }

    /// Unregister a point. Its callback receives one final invisible
    /// update so overlay markers can hide themselves.
    pub fn remove(&mut self, id: &str) {
        if let Some(mut point) = self.points.remove(id) {
            let farewell = HitPointUpdate {
                x: point.last.as_ref().map_or(0.0, |l| l.x),
                y: point.last.as_ref().map_or(0.0, |l| l.y),
                visible: false,
            };
            dispatch(id, &mut point.callback, &farewell);
        }
    }

    /// Remove every point, firing the final invisible update for each.
    pub fn clear(&mut self) {
        let points = std::mem::take(&mut self.points);
        for (id, mut point) in points {
            let farewell = HitPointUpdate {
                x: point.last.as_ref().map_or(0.0, |l| l.x),
                y: point.last.as_ref().map_or(0.0, |l| l.y),
                visible: false,
            };
            dispatch(&id, &mut point.callback, &farewell);
        }
    }

    /// Reproject every point, notifying only the callbacks whose screen
    /// state changed since the last pass.
    pub fn recompute(&mut self, projection: &Projection) {
        self.project_all(projection, false);
    }

    /// Reproject and notify every callback unconditionally. Used after
    /// layout changes where markers must resync even if nothing moved.
    pub fn force_update(&mut self, projection: &Projection) {
        self.project_all(projection, true);
    }

    fn project_all(&mut self, projection: &Projection, force: bool) {
        for (id, point) in &mut self.points {
            // Visibility is the forward half-space test alone; a point
            // outside the viewport still reports visible so markers can
            // sit partially clipped at the edge.
            let update = match projection.world_to_screen(&point.position) {
                Some((x, y, _)) => HitPointUpdate {
                    x,
                    y,
                    visible: true,
                },
                None => HitPointUpdate {
                    x: 0.0,
                    y: 0.0,
                    visible: false,
                },
            };

            let changed = match &point.last {
                Some(last) => {
                    last.visible != update.visible
                        || (last.x - update.x).abs() > SCREEN_EPSILON
                        || (last.y - update.y).abs() > SCREEN_EPSILON
                }
                None => true,
            };

            if force || changed {
                dispatch(id, &mut point.callback, &update);
                point.last = Some(update);
            }
        }
    }
}

fn dispatch(id: &str, callback: &mut HitPointCallback, update: &HitPointUpdate) {
    if catch_unwind(AssertUnwindSafe(|| callback(update))).is_err() {
        error!("hit point callback panicked for {id:?}");
    }
}
