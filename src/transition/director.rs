//! View transition orchestration.
//!
//! The director owns the single active tween and the notion of the
//! "current view". It drives a borrowed [`CameraController`] directly;
//! every frame the viewer calls [`TransitionDirector::advance`] before
//! the camera's own update step.

use std::panic::{AssertUnwindSafe, catch_unwind};

use log::{debug, error};

use crate::api::models::{
    GlobalMetadata, SceneDocument, View, ViewGroupMetadata, ViewMetadata,
};
use crate::camera::{CameraController, CameraFrame, Lens, PoseUpdate};

use super::easing::Easing;
use super::tween::{TweenFrame, TweenState, TweenTick};

/// Automode transitions run at half the configured speed, giving the
/// autoplaying tour a calmer pace than a user click.
const AUTOMODE_SPEED_FACTOR: f32 = 0.5;

/// Payload handed to the state-change callbacks: the subject view, the
/// group it belongs to and scene-wide metadata.
#[derive(Debug, Clone)]
pub struct ViewChange {
    pub index: usize,
    pub view: ViewMetadata,
    pub group: Option<ViewGroupMetadata>,
    pub global: GlobalMetadata,
}

impl ViewChange {
    fn resolve(document: &SceneDocument, index: usize, view: &View) -> Self {
        Self {
            index,
            view: ViewMetadata::from(view),
            group: document.group_of(&view.id).map(ViewGroupMetadata::from),
            global: GlobalMetadata::from(document),
        }
    }
}

/// Host callbacks fired around a transition. A panicking callback is
/// isolated and logged; it never corrupts camera state.
#[derive(Default)]
pub struct ViewerEvents {
    pub on_state_change_start: Option<Box<dyn FnMut(&ViewChange)>>,
    pub on_state_change_complete: Option<Box<dyn FnMut(&ViewChange)>>,
}

impl ViewerEvents {
    fn emit_start(&mut self, change: &ViewChange) {
        if let Some(callback) = self.on_state_change_start.as_mut()
            && catch_unwind(AssertUnwindSafe(|| callback(change))).is_err()
        {
            error!("onStateChangeStart callback panicked for view {}", change.index);
        }
    }

    fn emit_complete(&mut self, change: &ViewChange) {
        if let Some(callback) = self.on_state_change_complete.as_mut()
            && catch_unwind(AssertUnwindSafe(|| callback(change))).is_err()
        {
            error!("onStateChangeComplete callback panicked for view {}", change.index);
        }
    }
}

pub struct TransitionDirector {
    tween: TweenState,
    active_view: Option<usize>,
    /// View index the running tween is heading to.
    pending_view: Option<usize>,
    /// Lens of the last applied or tweened view; `None` until a view
    /// has been applied.
    lens: Option<Lens>,
    speed_multiplier: f32,
}

impl TransitionDirector {
    pub fn new() -> Self {
        Self {
            tween: TweenState::Idle,
            active_view: None,
            pending_view: None,
            lens: None,
            speed_multiplier: 1.0,
        }
    }

    pub fn active_view(&self) -> Option<usize> {
        self.active_view
    }

    pub fn is_transitioning(&self) -> bool {
        self.tween.is_running()
    }

    pub fn lens(&self) -> Option<Lens> {
        self.lens
    }

    /// Discard any in-flight tween without completing it. The camera is
    /// left wherever the last tick put it.
    pub fn cancel(&mut self) {
        self.tween.cancel();
        self.pending_view = None;
    }

    /// Global speed multiplier; 2.0 halves every transition's duration.
    pub fn set_speed_multiplier(&mut self, multiplier: f32) {
        self.speed_multiplier = multiplier.max(f32::EPSILON);
    }

    /// Apply the document's first view instantly, without callbacks or a
    /// tween. Used when a scene finishes loading.
    pub fn apply_initial_view(&mut self, document: &SceneDocument, camera: &mut CameraController) {
        let Some(view) = document.view_at(0) else {
            return;
        };

        self.tween.cancel();
        self.pending_view = None;

        apply_pose(camera, view);
        self.lens = Some(Lens::from(&view.item));
        self.active_view = Some(0);
    }

    /// Start (or redirect) a transition to the view at `index`, which is
    /// wrapped into range. A tween already in flight is discarded and
    /// never completes.
    pub fn transition_to(
        &mut self,
        index: isize,
        automode: bool,
        document: &SceneDocument,
        camera: &mut CameraController,
        events: &mut ViewerEvents,
    ) {
        let count = document.view_count();
        if count == 0 {
            return;
        }
        let index = wrap_index(index, count);

        let Some(view) = document.view_at(index) else {
            return;
        };

        if self.active_view.is_none() {
            // No view has ever been applied; snap instead of tweening.
            self.apply_initial_view(document, camera);
            if index == 0 {
                return;
            }
        }

        let was_running = self.tween.is_running();
        if was_running {
            debug!("redirecting transition to view {index}");
            self.tween.cancel();
        }

        let start = TweenFrame {
            pose: camera.current_frame(),
            lens: self
                .lens
                .unwrap_or_else(|| Lens::from(&document.data.camera)),
        };
        let end = TweenFrame {
            pose: CameraFrame {
                position: view.item.position_vec(),
                look_at: view.item.look_at_vec(),
                zoom: view.item.zoom,
            },
            lens: Lens::from(&view.item),
        };

        let multiplier = if automode {
            self.speed_multiplier * AUTOMODE_SPEED_FACTOR
        } else {
            self.speed_multiplier
        };
        let duration = view.duration / multiplier;
        let easing = Easing::parse(&view.easing);

        // The camera is unlocked and frozen for the whole flight; the
        // start callback fires once per initiated transition, redirects
        // included.
        camera.disable_controls();
        camera.set_locked_for_orbit(false);
        events.emit_start(&ViewChange::resolve(document, index, view));

        self.pending_view = Some(index);
        self.tween.start(start, end, duration, easing);
    }

    /// Per-frame step. While a tween runs the camera pose and lens are
    /// written synchronously and the base angle follows the pose; on the
    /// final tick the end frame is snapped exactly, the view's orbit
    /// limits are applied and the controls are handed back.
    pub fn advance(
        &mut self,
        dt: f32,
        document: &SceneDocument,
        camera: &mut CameraController,
        events: &mut ViewerEvents,
    ) {
        match self.tween.advance(dt) {
            TweenTick::Idle => {}
            TweenTick::Progress(frame) => {
                set_frame(camera, &frame.pose);
                self.lens = Some(frame.lens);
                camera.set_current_angle_as_base_angle();
            }
            TweenTick::Finished(frame) => {
                set_frame(camera, &frame.pose);
                self.lens = Some(frame.lens);

                let mut completed = None;
                if let Some(index) = self.pending_view.take()
                    && let Some(view) = document.view_at(index)
                {
                    camera.apply_pose_limits(&view.item);
                    self.active_view = Some(index);
                    completed = Some(ViewChange::resolve(document, index, view));
                }

                camera.set_current_angle_as_base_angle();
                camera.set_locked_for_orbit(true);
                camera.enable_controls();

                if let Some(change) = completed {
                    events.emit_complete(&change);
                }
            }
        }
    }
}

impl Default for TransitionDirector {
    fn default() -> Self {
        Self::new()
    }
}

/// Wrap an arbitrary signed index into `[0, count)`.
pub fn wrap_index(index: isize, count: usize) -> usize {
    let count = count as isize;
    (((index % count) + count) % count) as usize
}

fn set_frame(camera: &mut CameraController, frame: &CameraFrame) {
    camera.set_values(PoseUpdate {
        position: Some(frame.position),
        look_at: Some(frame.look_at),
        zoom: Some(frame.zoom),
    });
}

fn apply_pose(camera: &mut CameraController, view: &View) {
    camera.set_locked_for_orbit(false);
    set_frame(
        camera,
        &CameraFrame {
            position: view.item.position_vec(),
            look_at: view.item.look_at_vec(),
            zoom: view.item.zoom,
        },
    );
    camera.apply_pose_limits(&view.item);
    camera.set_current_angle_as_base_angle();
    camera.set_locked_for_orbit(true);
    camera.enable_controls();
}

#[cfg(test)]
mod tests {
    use std::cell::RefCell;
    use std::rc::Rc;

    use crate::api::models::sample_document;

    use super::*;

    fn recording_events(log: &Rc<RefCell<Vec<String>>>) -> ViewerEvents {
        let start_log = Rc::clone(log);
        let complete_log = Rc::clone(log);
        ViewerEvents {
            on_state_change_start: Some(Box::new(move |change| {
                start_log.borrow_mut().push(format!("start:{}", change.index));
            })),
            on_state_change_complete: Some(Box::new(move |change| {
                complete_log.borrow_mut().push(format!("complete:{}", change.index));
            })),
        }
    }

    #[test]
    fn wrap_index_handles_negative_and_overflow() {
        assert_eq!(wrap_index(-1, 5), 4);
        assert_eq!(wrap_index(5, 5), 0);
        assert_eq!(wrap_index(7, 5), 2);
        assert_eq!(wrap_index(-6, 5), 4);
        assert_eq!(wrap_index(3, 5), 3);
    }

    #[test]
    fn initial_view_applies_without_callbacks() {
        let document = sample_document();
        let mut camera = CameraController::new();
        let log = Rc::new(RefCell::new(Vec::new()));
        let mut events = recording_events(&log);
        let mut director = TransitionDirector::new();

        director.apply_initial_view(&document, &mut camera);
        director.advance(1.0 / 60.0, &document, &mut camera, &mut events);

        assert_eq!(director.active_view(), Some(0));
        assert!(!director.is_transitioning());
        assert!(log.borrow().is_empty());

        let view = document.view_at(0).unwrap();
        let expected = view.item.position_vec();
        assert!(nalgebra_glm::distance(&camera.position(), &expected) < 1e-3);
    }

    #[test]
    fn transition_runs_to_completion_with_callback_ordering() {
        let document = sample_document();
        let mut camera = CameraController::new();
        camera.set_auto_rotate(false);
        let log = Rc::new(RefCell::new(Vec::new()));
        let mut events = recording_events(&log);
        let mut director = TransitionDirector::new();

        director.apply_initial_view(&document, &mut camera);
        director.transition_to(1, false, &document, &mut camera, &mut events);

        assert!(director.is_transitioning());
        assert!(camera.controls_disabled());
        assert!(!camera.is_locked_for_orbit());

        // View 1 lasts 3 seconds in the fixture; drive well past it.
        for _ in 0..60 * 4 {
            director.advance(1.0 / 60.0, &document, &mut camera, &mut events);
            camera.update(1.0 / 60.0);
        }

        assert!(!director.is_transitioning());
        assert_eq!(director.active_view(), Some(1));
        assert!(!camera.controls_disabled());
        assert!(camera.is_locked_for_orbit());
        assert_eq!(*log.borrow(), vec!["start:1".to_string(), "complete:1".to_string()]);

        let view = document.view_at(1).unwrap();
        assert!(nalgebra_glm::distance(&camera.position(), &view.item.position_vec()) < 1e-3);
        assert!((camera.zoom() - view.item.zoom).abs() < 1e-3);
    }

    #[test]
    fn callbacks_carry_view_group_and_global_metadata() {
        let document = sample_document();
        let mut camera = CameraController::new();
        let seen = Rc::new(RefCell::new(Vec::new()));
        let sink = Rc::clone(&seen);
        let mut events = ViewerEvents {
            on_state_change_start: Some(Box::new(move |change| {
                sink.borrow_mut().push((
                    change.view.title.clone(),
                    change.group.as_ref().map(|g| g.title.clone()),
                    change.global.number_of_views,
                ));
            })),
            on_state_change_complete: None,
        };
        let mut director = TransitionDirector::new();

        director.apply_initial_view(&document, &mut camera);
        director.transition_to(2, false, &document, &mut camera, &mut events);

        assert_eq!(
            seen.borrow().as_slice(),
            &[("Hall".to_string(), Some("Interior".to_string()), 3)]
        );
    }

    #[test]
    fn lens_tweens_alongside_the_pose() {
        let mut document = sample_document();
        document.data.view_groups[0].views[1].item.fov = 70.0;
        let mut camera = CameraController::new();
        let mut events = ViewerEvents::default();
        let mut director = TransitionDirector::new();

        director.apply_initial_view(&document, &mut camera);
        assert_eq!(director.lens().map(|l| l.fov), Some(50.0));

        // View 1: 3 seconds, linear easing. Half a second in, the fov
        // sits strictly between the endpoints.
        director.transition_to(1, false, &document, &mut camera, &mut events);
        for _ in 0..30 {
            director.advance(1.0 / 60.0, &document, &mut camera, &mut events);
        }
        let mid = director.lens().unwrap().fov;
        assert!(mid > 50.0 && mid < 70.0);

        for _ in 0..60 * 3 {
            director.advance(1.0 / 60.0, &document, &mut camera, &mut events);
        }
        assert_eq!(director.lens().map(|l| l.fov), Some(70.0));
    }

    #[test]
    fn redirect_discards_first_tween_without_completion() {
        let document = sample_document();
        let mut camera = CameraController::new();
        let log = Rc::new(RefCell::new(Vec::new()));
        let mut events = recording_events(&log);
        let mut director = TransitionDirector::new();

        director.apply_initial_view(&document, &mut camera);
        director.transition_to(1, false, &document, &mut camera, &mut events);

        // Partway through, redirect to view 2.
        for _ in 0..30 {
            director.advance(1.0 / 60.0, &document, &mut camera, &mut events);
        }
        director.transition_to(2, false, &document, &mut camera, &mut events);

        for _ in 0..60 * 3 {
            director.advance(1.0 / 60.0, &document, &mut camera, &mut events);
        }

        assert_eq!(director.active_view(), Some(2));
        // Both starts fired, but only the second transition completed.
        assert_eq!(
            *log.borrow(),
            vec![
                "start:1".to_string(),
                "start:2".to_string(),
                "complete:2".to_string()
            ]
        );
    }

    #[test]
    fn negative_index_wraps_to_last_view() {
        let document = sample_document();
        let mut camera = CameraController::new();
        let mut events = ViewerEvents::default();
        let mut director = TransitionDirector::new();

        director.apply_initial_view(&document, &mut camera);
        director.transition_to(-1, false, &document, &mut camera, &mut events);

        for _ in 0..60 * 3 {
            director.advance(1.0 / 60.0, &document, &mut camera, &mut events);
        }
        assert_eq!(director.active_view(), Some(document.view_count() - 1));
    }

    #[test]
    fn automode_doubles_effective_duration() {
        let document = sample_document();
        let mut camera = CameraController::new();
        let mut events = ViewerEvents::default();
        let mut director = TransitionDirector::new();

        director.apply_initial_view(&document, &mut camera);
        // View 1: 3 seconds nominal, 6 under automode pacing.
        director.transition_to(1, true, &document, &mut camera, &mut events);

        for _ in 0..60 * 4 {
            director.advance(1.0 / 60.0, &document, &mut camera, &mut events);
        }
        assert!(director.is_transitioning());

        for _ in 0..60 * 3 {
            director.advance(1.0 / 60.0, &document, &mut camera, &mut events);
        }
        assert!(!director.is_transitioning());
    }

    #[test]
    fn panicking_callback_does_not_poison_camera_state() {
        let document = sample_document();
        let mut camera = CameraController::new();
        let mut events = ViewerEvents {
            on_state_change_start: Some(Box::new(|_| panic!("host bug"))),
            on_state_change_complete: Some(Box::new(|_| panic!("host bug"))),
        };
        let mut director = TransitionDirector::new();

        director.apply_initial_view(&document, &mut camera);
        director.transition_to(1, false, &document, &mut camera, &mut events);

        for _ in 0..60 * 4 {
            director.advance(1.0 / 60.0, &document, &mut camera, &mut events);
        }

        assert_eq!(director.active_view(), Some(1));
        assert!(!camera.controls_disabled());
        assert!(camera.is_locked_for_orbit());
    }
}
