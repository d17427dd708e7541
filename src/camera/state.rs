//! Camera pose state shared by the controller's target/real pair.

use nalgebra_glm as glm;

use crate::api::models::CameraPose;
use crate::math;

/// Spherical orbit pose around a look-at point. Orbiting, zooming and
/// panning each edit one component independently; the world position is
/// derived on demand.
#[derive(Debug, Clone)]
pub struct OrbitPose {
    pub distance: f32,
    pub polar_angle: f32,
    pub azimuth_angle: f32,
    pub look_at: glm::Vec3,
    pub zoom: f32,
}

impl OrbitPose {
    pub fn position(&self) -> glm::Vec3 {
        math::spherical_to_position(
            &self.look_at,
            self.distance,
            self.polar_angle,
            self.azimuth_angle,
        )
    }
}

impl Default for OrbitPose {
    fn default() -> Self {
        Self {
            distance: 45.0,
            polar_angle: 1.2,
            azimuth_angle: 2.4,
            look_at: glm::vec3(0.0, 0.0, 0.0),
            zoom: 1.0,
        }
    }
}

/// Cartesian snapshot of a pose as exposed to hosts and the transition
/// director.
#[derive(Debug, Clone, PartialEq)]
pub struct CameraFrame {
    pub position: glm::Vec3,
    pub look_at: glm::Vec3,
    pub zoom: f32,
}

impl CameraFrame {
    pub fn approx_eq(&self, other: &CameraFrame, epsilon: f32) -> bool {
        vec3_approx_eq(&self.position, &other.position, epsilon)
            && vec3_approx_eq(&self.look_at, &other.look_at, epsilon)
            && (self.zoom - other.zoom).abs() <= epsilon
    }
}

/// Perspective lens parameters. Tweened alongside the pose during a
/// transition so a view can narrow or widen the frustum.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Lens {
    pub fov: f32,
    pub near: f32,
    pub far: f32,
}

impl Lens {
    pub fn lerp(&self, other: &Lens, t: f32) -> Lens {
        Lens {
            fov: math::lerp(self.fov, other.fov, t),
            near: math::lerp(self.near, other.near, t),
            far: math::lerp(self.far, other.far, t),
        }
    }
}

impl From<&CameraPose> for Lens {
    fn from(pose: &CameraPose) -> Self {
        Lens {
            fov: pose.fov,
            near: pose.near,
            far: pose.far,
        }
    }
}

pub(crate) fn vec3_approx_eq(a: &glm::Vec3, b: &glm::Vec3, epsilon: f32) -> bool {
    (a.x - b.x).abs() <= epsilon && (a.y - b.y).abs() <= epsilon && (a.z - b.z).abs() <= epsilon
}
