//! Frame-driven pose tween.
//!
//! At most one tween exists at a time. Starting a new one while another
//! is running replaces it outright; the replaced tween never reports
//! completion.

use crate::camera::{CameraFrame, Lens};
use crate::math;

use super::easing::Easing;

/// Pose plus lens captured at each end of a transition; both travel
/// under the same eased progress.
#[derive(Debug, Clone)]
pub struct TweenFrame {
    pub pose: CameraFrame,
    pub lens: Lens,
}

#[derive(Debug, Clone)]
pub enum TweenState {
    Idle,
    Running {
        elapsed: f32,
        duration: f32,
        easing: Easing,
        start: TweenFrame,
        end: TweenFrame,
    },
}

/// Outcome of a single [`TweenState::advance`] step.
#[derive(Debug, Clone)]
pub enum TweenTick {
    Idle,
    Progress(TweenFrame),
    Finished(TweenFrame),
}

impl TweenState {
    pub fn is_running(&self) -> bool {
        matches!(self, TweenState::Running { .. })
    }

    /// Begin interpolating from `start` to `end` over `duration` seconds.
    /// A non-positive duration completes on the next advance.
    pub fn start(&mut self, start: TweenFrame, end: TweenFrame, duration: f32, easing: Easing) {
        *self = TweenState::Running {
            elapsed: 0.0,
            duration: duration.max(0.0),
            easing,
            start,
            end,
        };
    }

    pub fn cancel(&mut self) {
        *self = TweenState::Idle;
    }

    /// Step the tween by `dt` seconds. On the final step the exact end
    /// frame is returned and the tween resets to idle, so callers can
    /// snap without accumulated interpolation error.
    pub fn advance(&mut self, dt: f32) -> TweenTick {
        let TweenState::Running {
            elapsed,
            duration,
            easing,
            start,
            end,
        } = self
        else {
            return TweenTick::Idle;
        };

        *elapsed += dt;

        if *elapsed >= *duration {
            let end = end.clone();
            *self = TweenState::Idle;
            return TweenTick::Finished(end);
        }

        let progress = easing.apply(*elapsed / *duration);
        let frame = TweenFrame {
            pose: CameraFrame {
                position: math::lerp_vec3(&start.pose.position, &end.pose.position, progress),
                look_at: math::lerp_vec3(&start.pose.look_at, &end.pose.look_at, progress),
                zoom: math::lerp(start.pose.zoom, end.pose.zoom, progress),
            },
            lens: start.lens.lerp(&end.lens, progress),
        };
        TweenTick::Progress(frame)
    }
}

impl Default for TweenState {
    fn default() -> Self {
        TweenState::Idle
    }
}

#[cfg(test)]
mod tests {
    use nalgebra_glm as glm;

    use super::*;

    fn frame(x: f32, zoom: f32, fov: f32) -> TweenFrame {
        TweenFrame {
            pose: CameraFrame {
                position: glm::vec3(x, 0.0, 0.0),
                look_at: glm::vec3(x, 0.0, -1.0),
                zoom,
            },
            lens: Lens {
                fov,
                near: 0.1,
                far: 1000.0,
            },
        }
    }

    #[test]
    fn idle_tween_reports_idle() {
        let mut tween = TweenState::default();
        assert!(matches!(tween.advance(0.016), TweenTick::Idle));
    }

    #[test]
    fn linear_tween_hits_midpoint() {
        let mut tween = TweenState::default();
        tween.start(frame(0.0, 1.0, 50.0), frame(10.0, 3.0, 70.0), 2.0, Easing::Linear);

        match tween.advance(1.0) {
            TweenTick::Progress(f) => {
                assert!((f.pose.position.x - 5.0).abs() < 1e-5);
                assert!((f.pose.zoom - 2.0).abs() < 1e-5);
                assert!((f.lens.fov - 60.0).abs() < 1e-4);
            }
            other => panic!("expected progress, got {other:?}"),
        }
    }

    #[test]
    fn final_step_returns_exact_end_and_idles() {
        let mut tween = TweenState::default();
        tween.start(frame(0.0, 1.0, 50.0), frame(10.0, 3.0, 70.0), 1.0, Easing::Linear);

        // Overshoot past the duration.
        match tween.advance(1.5) {
            TweenTick::Finished(f) => {
                assert_eq!(f.pose.position.x, 10.0);
                assert_eq!(f.pose.zoom, 3.0);
                assert_eq!(f.lens.fov, 70.0);
            }
            other => panic!("expected finished, got {other:?}"),
        }
        assert!(!tween.is_running());
        assert!(matches!(tween.advance(0.016), TweenTick::Idle));
    }

    #[test]
    fn zero_duration_finishes_immediately() {
        let mut tween = TweenState::default();
        tween.start(frame(0.0, 1.0, 50.0), frame(1.0, 1.0, 50.0), 0.0, Easing::Linear);
        assert!(matches!(tween.advance(0.0), TweenTick::Finished(_)));
    }

    #[test]
    fn restart_replaces_running_tween() {
        let mut tween = TweenState::default();
        tween.start(frame(0.0, 1.0, 50.0), frame(10.0, 1.0, 50.0), 2.0, Easing::Linear);
        tween.advance(1.0);

        tween.start(frame(5.0, 1.0, 50.0), frame(-5.0, 1.0, 50.0), 1.0, Easing::Linear);
        match tween.advance(0.5) {
            TweenTick::Progress(f) => assert!((f.pose.position.x - 0.0).abs() < 1e-5),
            other => panic!("expected progress of the new tween, got {other:?}"),
        }
    }
}
