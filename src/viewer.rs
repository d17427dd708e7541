//! Viewer orchestration.
//!
//! [`ViewerController`] owns the scene document, the camera, the
//! transition director, the hit-point projector and the tour navigator,
//! and wires them together once per frame. The windowing layer forwards
//! raw input here and renders whatever state it finds afterwards.

use std::collections::BTreeMap;
use std::panic::{AssertUnwindSafe, catch_unwind};
use std::sync::mpsc::{Receiver, Sender, channel};

use log::{error, info, warn};
use nalgebra_glm as glm;

use crate::api::client::ApiClient;
use crate::api::models::{GlobalMetadata, SceneDocument, ViewGroupMetadata};
use crate::camera::{CameraController, CameraEvent, Lens, ListenerId, PointerButton, PoseUpdate};
use crate::error::ViewerError;
use crate::hitpoints::HitPointProjector;
use crate::navigation::TourNavigator;
use crate::render::Projection;
use crate::splat::{AssetMessage, SplatCloud, start_load};
use crate::transition::{TransitionDirector, ViewChange, ViewerEvents};

/// Upper bound on click-select candidates contributed per splat cloud.
const MAX_PICK_POINTS_PER_CLOUD: usize = 2048;

/// Loading progress of one scene item, as a fraction in [0, 1] when the
/// download size is known.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ItemProgress {
    Downloading(Option<f32>),
    Ready,
    Failed,
}

pub struct ViewerController {
    document: Option<SceneDocument>,
    camera: CameraController,
    director: TransitionDirector,
    hitpoints: HitPointProjector,
    navigator: TourNavigator,
    events: ViewerEvents,

    asset_sender: Sender<AssetMessage>,
    asset_receiver: Receiver<AssetMessage>,
    clouds: BTreeMap<String, SplatCloud>,
    item_progress: BTreeMap<String, ItemProgress>,

    on_load_start: Option<Box<dyn FnMut()>>,
    on_load_progress: Option<Box<dyn FnMut(f32)>>,
    on_load_complete: Option<Box<dyn FnMut(&[ViewGroupMetadata], &GlobalMetadata)>>,
    on_error: Option<Box<dyn FnMut(&ViewerError)>>,

    viewport: (f32, f32),
    is_fetching: bool,
    last_error: Option<String>,
}

impl ViewerController {
    pub fn new() -> Self {
        let (asset_sender, asset_receiver) = channel();
        Self {
            document: None,
            camera: CameraController::new(),
            director: TransitionDirector::new(),
            hitpoints: HitPointProjector::new(),
            navigator: TourNavigator::new(),
            events: ViewerEvents::default(),
            asset_sender,
            asset_receiver,
            clouds: BTreeMap::new(),
            item_progress: BTreeMap::new(),
            on_load_start: None,
            on_load_progress: None,
            on_load_complete: None,
            on_error: None,
            viewport: (1.0, 1.0),
            is_fetching: false,
            last_error: None,
        }
    }

    // -- accessors ----------------------------------------------------------

    pub fn document(&self) -> Option<&SceneDocument> {
        self.document.as_ref()
    }

    pub fn camera(&self) -> &CameraController {
        &self.camera
    }

    pub fn camera_mut(&mut self) -> &mut CameraController {
        &mut self.camera
    }

    pub fn hitpoints_mut(&mut self) -> &mut HitPointProjector {
        &mut self.hitpoints
    }

    pub fn active_view(&self) -> Option<usize> {
        self.director.active_view()
    }

    pub fn is_transitioning(&self) -> bool {
        self.director.is_transitioning()
    }

    pub fn is_fetching(&self) -> bool {
        self.is_fetching
    }

    pub fn last_error(&self) -> Option<&str> {
        self.last_error.as_deref()
    }

    pub fn automode(&self) -> bool {
        self.navigator.automode()
    }

    pub fn clouds(&self) -> impl Iterator<Item = (&str, &SplatCloud)> {
        self.clouds.iter().map(|(id, cloud)| (id.as_str(), cloud))
    }

    pub fn item_progress(&self) -> &BTreeMap<String, ItemProgress> {
        &self.item_progress
    }

    pub fn all_assets_ready(&self) -> bool {
        !self.item_progress.is_empty()
            && self
                .item_progress
                .values()
                .all(|p| matches!(p, ItemProgress::Ready | ItemProgress::Failed))
    }

    // -- host callbacks -----------------------------------------------------

    pub fn set_on_state_change_start(&mut self, callback: Box<dyn FnMut(&ViewChange)>) {
        self.events.on_state_change_start = Some(callback);
    }

    pub fn set_on_state_change_complete(&mut self, callback: Box<dyn FnMut(&ViewChange)>) {
        self.events.on_state_change_complete = Some(callback);
    }

    /// Subscribe to camera change events. Listeners run inside the
    /// frame step; they receive each event at most once and may not
    /// re-enter the viewer.
    pub fn add_camera_listener(&mut self, listener: Box<dyn FnMut(&CameraEvent)>) -> ListenerId {
        self.camera.add_listener(listener)
    }

    pub fn remove_camera_listener(&mut self, id: ListenerId) {
        self.camera.remove_listener(id);
    }

    pub fn set_on_load_start(&mut self, callback: Box<dyn FnMut()>) {
        self.on_load_start = Some(callback);
    }

    /// Aggregate download progress across all visible items, in [0, 1].
    pub fn set_on_load_progress(&mut self, callback: Box<dyn FnMut(f32)>) {
        self.on_load_progress = Some(callback);
    }

    pub fn set_on_load_complete(
        &mut self,
        callback: Box<dyn FnMut(&[ViewGroupMetadata], &GlobalMetadata)>,
    ) {
        self.on_load_complete = Some(callback);
    }

    pub fn set_on_error(&mut self, callback: Box<dyn FnMut(&ViewerError)>) {
        self.on_error = Some(callback);
    }

    // -- scene loading ------------------------------------------------------

    /// Fetch a scene and make it current. A call arriving while another
    /// fetch is in flight is dropped, not queued. On failure the viewer
    /// stays alive in an idle state with the error recorded.
    pub async fn load_scene(
        &mut self,
        client: &ApiClient,
        scene_id: &str,
        preview: bool,
    ) -> Result<(), ViewerError> {
        if self.is_fetching {
            warn!("load_scene({scene_id}) dropped, a fetch is already in flight");
            return Ok(());
        }

        self.is_fetching = true;
        if let Some(callback) = self.on_load_start.as_mut()
            && catch_unwind(AssertUnwindSafe(|| callback())).is_err()
        {
            error!("onLoadStart callback panicked");
        }

        let result = if preview {
            client.get_preview_scene(scene_id).await
        } else {
            client.get_scene(scene_id).await
        };
        self.is_fetching = false;

        match result {
            Ok(document) => {
                self.install_document(document);
                Ok(())
            }
            Err(err) => {
                error!("failed to load scene {scene_id}: {err}");
                self.last_error = Some(err.to_string());
                let err = ViewerError::Api(err);
                self.emit_error(&err);
                Err(err)
            }
        }
    }

    fn emit_error(&mut self, err: &ViewerError) {
        if let Some(callback) = self.on_error.as_mut()
            && catch_unwind(AssertUnwindSafe(|| callback(err))).is_err()
        {
            error!("onError callback panicked");
        }
    }

    fn install_document(&mut self, document: SceneDocument) {
        info!(
            "scene {} loaded: {} items, {} views",
            document.id,
            document.data.items.len(),
            document.view_count()
        );

        self.last_error = None;
        self.hitpoints.clear();
        self.clouds.clear();
        self.item_progress.clear();
        self.camera.set_pick_points(Vec::new());
        self.camera.reset_user_interaction();
        self.navigator.set_automode(false);

        for item in &document.data.items {
            if !item.visible() {
                continue;
            }
            self.item_progress
                .insert(item.id().to_string(), ItemProgress::Downloading(None));
            start_load(
                item.id().to_string(),
                item.src().to_string(),
                self.asset_sender.clone(),
            );
        }

        self.director = TransitionDirector::new();
        self.director.apply_initial_view(&document, &mut self.camera);
        self.document = Some(document);
    }

    // -- navigation surface -------------------------------------------------

    pub fn set_view(&mut self, index: isize) {
        let Some(document) = self.document.take() else {
            return;
        };
        self.director
            .transition_to(index, false, &document, &mut self.camera, &mut self.events);
        self.document = Some(document);
    }

    pub fn next_view(&mut self) {
        let current = self.director.active_view().map_or(0, |i| i as isize + 1);
        self.set_view(current);
    }

    pub fn previous_view(&mut self) {
        let current = self.director.active_view().map_or(0, |i| i as isize - 1);
        self.set_view(current);
    }

    pub fn set_automode(&mut self, enabled: bool) {
        self.navigator.set_automode(enabled);
    }

    /// Seconds a view is held before automode hops onward.
    pub fn set_automode_dwell(&mut self, seconds: f32) {
        self.navigator.set_dwell(seconds);
    }

    pub fn set_transition_speed_multiplier(&mut self, multiplier: f32) {
        self.director.set_speed_multiplier(multiplier);
    }

    // -- programmatic camera surface ----------------------------------------

    /// Host-driven pose writes. Ignored while a transition owns the
    /// camera; otherwise the orbit lock is lifted for the write and the
    /// base angle rebased onto the result.
    pub fn set_camera_values(&mut self, update: PoseUpdate) {
        if self.director.is_transitioning() {
            return;
        }
        self.camera.set_locked_for_orbit(false);
        self.camera.set_values(update);
        self.camera.set_current_angle_as_base_angle();
        self.camera.set_locked_for_orbit(true);
    }

    /// As `set_camera_values`, but smoothed over the following frames.
    pub fn set_camera_target_values(&mut self, update: PoseUpdate) {
        if self.director.is_transitioning() {
            return;
        }
        self.camera.set_locked_for_orbit(false);
        self.camera.set_target_values(update);
        self.camera.set_current_angle_as_base_angle();
        self.camera.set_locked_for_orbit(true);
    }

    // -- input forwarding ---------------------------------------------------

    pub fn set_viewport(&mut self, width: f32, height: f32) {
        self.viewport = (width.max(1.0), height.max(1.0));
        if let Some(projection) = self.projection() {
            self.hitpoints.force_update(&projection);
        }
    }

    pub fn on_pointer_down(&mut self, x: f32, y: f32, button: PointerButton) {
        self.camera.on_pointer_down(x, y, button);
    }

    pub fn on_pointer_move(&mut self, x: f32, y: f32) {
        self.camera.on_pointer_move(x, y);
    }

    pub fn on_pointer_up(&mut self, x: f32, y: f32) {
        let projection = self.projection();
        self.camera.on_pointer_up(x, y, projection.as_ref());
    }

    pub fn on_wheel(&mut self, delta_y: f32) {
        self.camera.on_wheel(delta_y);
    }

    // -- frame step ---------------------------------------------------------

    /// One frame: drain loader messages, run the tour timer, advance any
    /// transition, smooth the camera and reproject hit points if the
    /// rendered pose moved.
    pub fn update(&mut self, dt: f32) {
        self.drain_asset_messages();

        let Some(document) = self.document.take() else {
            return;
        };

        if self.navigator.tick(dt, self.director.is_transitioning()) {
            let next = self.director.active_view().map_or(0, |i| i as isize + 1);
            self.director
                .transition_to(next, true, &document, &mut self.camera, &mut self.events);
        }

        self.director
            .advance(dt, &document, &mut self.camera, &mut self.events);

        let pose_changed = self.camera.update(dt);

        self.document = Some(document);

        if pose_changed
            && let Some(projection) = self.projection()
        {
            self.hitpoints.recompute(&projection);
        }
    }

    /// Lens in effect this frame: the active (or mid-tween) view's
    /// fov/near/far, falling back to the scene camera before any view
    /// has been applied.
    pub fn lens(&self) -> Option<Lens> {
        let document = self.document.as_ref()?;
        Some(
            self.director
                .lens()
                .unwrap_or_else(|| Lens::from(&document.data.camera)),
        )
    }

    /// Frozen projection for the current rendered pose, if a document
    /// provides the lens parameters.
    pub fn projection(&self) -> Option<Projection> {
        let lens = self.lens()?;
        // Zoom narrows the field of view.
        let fov = lens.fov / self.camera.zoom().max(f32::EPSILON);
        Some(Projection::from_pose(
            &self.camera.position(),
            &self.camera.look_at(),
            fov,
            lens.near,
            lens.far,
            self.viewport,
        ))
    }

    fn drain_asset_messages(&mut self) {
        while let Ok(message) = self.asset_receiver.try_recv() {
            match message {
                AssetMessage::Progress {
                    item_id,
                    loaded,
                    total,
                } => {
                    let fraction = total.map(|t| (loaded as f32 / t.max(1) as f32).min(1.0));
                    self.item_progress
                        .insert(item_id, ItemProgress::Downloading(fraction));
                    self.emit_load_progress();
                }
                AssetMessage::Loaded { item_id, cloud } => {
                    let stride = (cloud.len() / MAX_PICK_POINTS_PER_CLOUD).max(1);
                    self.camera.extend_pick_points(cloud.pick_points(stride));

                    self.item_progress.insert(item_id.clone(), ItemProgress::Ready);
                    self.clouds.insert(item_id, cloud);
                    self.emit_load_progress();
                    self.maybe_notify_loaded();
                }
                AssetMessage::Failed { item_id, error } => {
                    error!("asset {item_id} failed: {error}");
                    self.last_error = Some(error.to_string());
                    self.item_progress.insert(item_id, ItemProgress::Failed);
                    self.emit_error(&error);
                    self.emit_load_progress();
                    self.maybe_notify_loaded();
                }
            }
        }
    }

    /// Aggregate fraction over all tracked items; failed items count as
    /// settled so the bar can reach 1.0 and hand off to the error path.
    fn overall_load_progress(&self) -> f32 {
        if self.item_progress.is_empty() {
            return 0.0;
        }
        let sum: f32 = self
            .item_progress
            .values()
            .map(|p| match p {
                ItemProgress::Downloading(fraction) => fraction.unwrap_or(0.0),
                ItemProgress::Ready | ItemProgress::Failed => 1.0,
            })
            .sum();
        sum / self.item_progress.len() as f32
    }

    fn emit_load_progress(&mut self) {
        let progress = self.overall_load_progress();
        if let Some(callback) = self.on_load_progress.as_mut()
            && catch_unwind(AssertUnwindSafe(|| callback(progress))).is_err()
        {
            error!("onLoadProgressUpdate callback panicked");
        }
    }

    fn maybe_notify_loaded(&mut self) {
        if !self.all_assets_ready() || self.on_load_complete.is_none() {
            return;
        }
        let Some(document) = self.document.as_ref() else {
            return;
        };

        let groups: Vec<ViewGroupMetadata> = document
            .data
            .view_groups
            .iter()
            .map(ViewGroupMetadata::from)
            .collect();
        let global = GlobalMetadata::from(document);

        if let Some(callback) = self.on_load_complete.as_mut()
            && catch_unwind(AssertUnwindSafe(|| callback(&groups, &global))).is_err()
        {
            error!("onLoadComplete callback panicked");
        }
    }

    /// Tear the viewer down: kill any in-flight tween, clear the
    /// hit-point registry (each callback gets its final invisible
    /// update) and drop the document and host callbacks. Loader tasks
    /// still in flight find a closed channel and end silently.
    pub fn teardown(&mut self) {
        self.director.cancel();
        self.hitpoints.clear();
        self.document = None;
        self.clouds.clear();
        self.item_progress.clear();
        self.events = ViewerEvents::default();
        self.on_load_start = None;
        self.on_load_progress = None;
        self.on_load_complete = None;
        self.on_error = None;
        self.navigator.set_automode(false);

        // Replace the channel; stale loader tasks send into the dropped
        // receiver and end silently.
        let (sender, receiver) = channel();
        self.asset_sender = sender;
        self.asset_receiver = receiver;
    }

    /// Test-and-embedding hook: install an already parsed document
    /// without touching the network.
    pub fn install_document_direct(&mut self, document: SceneDocument) {
        self.install_document(document);
    }

    /// World positions of the hit-point anchors for visible views, used
    /// by the overlay to register its markers.
    pub fn view_anchor(&self, index: usize) -> Option<glm::Vec3> {
        let document = self.document.as_ref()?;
        let view = document.view_at(index)?;
        view.show_hit_point.then(|| view.item.look_at_vec())
    }
}

impl Default for ViewerController {
    fn default() -> Self {
        Self::new()
    }
}
