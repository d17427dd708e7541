//! Camera projection math shared by rendering, click-select ray casts
//! and hit-point screen anchoring.

use nalgebra_glm as glm;

fn up() -> glm::Vec3 {
    glm::vec3(0.0, 1.0, 0.0)
}

/// A frozen view-projection for one frame, plus the viewport it maps to.
/// Depth runs zero to one to match the render pipeline.
#[derive(Debug, Clone)]
pub struct Projection {
    view_proj: glm::Mat4,
    inverse_view_proj: glm::Mat4,
    viewport: (f32, f32),
}

impl Projection {
    pub fn from_pose(
        position: &glm::Vec3,
        look_at: &glm::Vec3,
        fov_deg: f32,
        near: f32,
        far: f32,
        viewport: (f32, f32),
    ) -> Self {
        let aspect = viewport.0 / viewport.1.max(1.0);
        let proj = glm::perspective_zo(aspect, fov_deg.to_radians(), near, far);
        let view = glm::look_at(position, look_at, &up());
        let view_proj = proj * view;

        Self {
            view_proj,
            inverse_view_proj: glm::inverse(&view_proj),
            viewport,
        }
    }

    pub fn view_proj(&self) -> &glm::Mat4 {
        &self.view_proj
    }

    pub fn viewport(&self) -> (f32, f32) {
        self.viewport
    }

    /// Project a world point to pixel coordinates plus normalized depth.
    /// `None` when the point is behind the camera plane.
    pub fn world_to_screen(&self, world: &glm::Vec3) -> Option<(f32, f32, f32)> {
        let clip = self.view_proj * glm::vec4(world.x, world.y, world.z, 1.0);
        if clip.w <= 0.0 {
            return None;
        }

        let ndc = clip.xyz() / clip.w;
        let x = (ndc.x * 0.5 + 0.5) * self.viewport.0;
        let y = (1.0 - (ndc.y * 0.5 + 0.5)) * self.viewport.1;
        Some((x, y, ndc.z))
    }

    /// Unproject a pixel coordinate onto the far plane, giving the far
    /// end of the pick ray whose near end is the camera position.
    pub fn screen_to_world_far(&self, x: f32, y: f32) -> glm::Vec3 {
        let ndc_x = (x / self.viewport.0) * 2.0 - 1.0;
        let ndc_y = 1.0 - (y / self.viewport.1) * 2.0;

        let world = self.inverse_view_proj * glm::vec4(ndc_x, ndc_y, 1.0, 1.0);
        world.xyz() / world.w
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn projection() -> Projection {
        Projection::from_pose(
            &glm::vec3(0.0, 0.0, 10.0),
            &glm::vec3(0.0, 0.0, 0.0),
            60.0,
            0.1,
            1000.0,
            (800.0, 600.0),
        )
    }

    #[test]
    fn point_on_axis_projects_to_viewport_center() {
        let (x, y, depth) = projection().world_to_screen(&glm::vec3(0.0, 0.0, 0.0)).unwrap();
        assert!((x - 400.0).abs() < 1e-2);
        assert!((y - 300.0).abs() < 1e-2);
        assert!(depth > 0.0 && depth < 1.0);
    }

    #[test]
    fn point_behind_camera_is_rejected() {
        assert!(projection().world_to_screen(&glm::vec3(0.0, 0.0, 20.0)).is_none());
    }

    #[test]
    fn screen_up_maps_to_world_up() {
        let p = projection();
        // A pixel above center should unproject to a point with y > 0.
        let far = p.screen_to_world_far(400.0, 100.0);
        assert!(far.y > 0.0);
        // And the center pixel stays on the view axis.
        let center = p.screen_to_world_far(400.0, 300.0);
        assert!(center.x.abs() < 1e-2);
        assert!(center.y.abs() < 1e-2);
        assert!(center.z < 0.0);
    }

    #[test]
    fn project_unproject_round_trip_preserves_direction() {
        let p = projection();
        let world = glm::vec3(1.5, -0.75, 2.0);
        let (sx, sy, _) = p.world_to_screen(&world).unwrap();
        let far = p.screen_to_world_far(sx, sy);

        let camera = glm::vec3(0.0, 0.0, 10.0);
        let to_world = glm::normalize(&(world - camera));
        let to_far = glm::normalize(&(far - camera));
        assert!(glm::dot(&to_world, &to_far) > 0.999);
    }
}
