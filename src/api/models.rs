//! Typed scene document fetched from the scenes API.
//!
//! Wire naming is preserved through serde renames: the backend calls a
//! view a "transition" and a view group a "transitionGroup".

use std::collections::BTreeMap;

use nalgebra_glm as glm;
use serde::Deserialize;

pub type Metadata = BTreeMap<String, MetadataEntry>;

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MetadataEntry {
    pub value: String,
    pub updated_at: String,
}

/// Flatten authored metadata into plain key/value pairs for callbacks.
pub fn metadata_to_record(metadata: &Metadata) -> BTreeMap<String, String> {
    metadata
        .iter()
        .map(|(key, entry)| (key.clone(), entry.value.clone()))
        .collect()
}

/// Perspective camera pose. Orbit-constraint fields are deltas relative
/// to the base angle captured when the pose becomes active; `None` means
/// unconstrained in that direction.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CameraPose {
    pub id: String,
    pub position: [f32; 3],
    pub look_at: [f32; 3],
    pub zoom: f32,
    pub fov: f32,
    pub aspect: f32,
    pub near: f32,
    pub far: f32,
    pub min_azimuth_angle: Option<f32>,
    pub max_azimuth_angle: Option<f32>,
    pub min_polar_angle: Option<f32>,
    pub max_polar_angle: Option<f32>,
}

impl CameraPose {
    pub fn position_vec(&self) -> glm::Vec3 {
        glm::make_vec3(&self.position)
    }

    pub fn look_at_vec(&self) -> glm::Vec3 {
        glm::make_vec3(&self.look_at)
    }
}

/// Renderable scene item. The discriminator is the wire `type` field;
/// both variants reference an opaque splat resource by URL.
#[derive(Debug, Clone, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum SceneItem {
    Splat(SplatItem),
    Gs3d(Gs3dItem),
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SplatItem {
    pub id: String,
    pub position: [f32; 3],
    pub rotation: [f32; 4],
    pub scale: [f32; 3],
    #[serde(default = "default_visible")]
    pub visible: bool,
    pub src: String,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Gs3dItem {
    pub id: String,
    pub position: [f32; 3],
    pub rotation: [f32; 4],
    pub scale: [f32; 3],
    #[serde(default = "default_visible")]
    pub visible: bool,
    pub src: String,
    #[serde(default)]
    pub antialiased: bool,
}

fn default_visible() -> bool {
    true
}

impl SceneItem {
    pub fn id(&self) -> &str {
        match self {
            SceneItem::Splat(item) => &item.id,
            SceneItem::Gs3d(item) => &item.id,
        }
    }

    pub fn src(&self) -> &str {
        match self {
            SceneItem::Splat(item) => &item.src,
            SceneItem::Gs3d(item) => &item.src,
        }
    }

    pub fn position(&self) -> glm::Vec3 {
        match self {
            SceneItem::Splat(item) => glm::make_vec3(&item.position),
            SceneItem::Gs3d(item) => glm::make_vec3(&item.position),
        }
    }

    pub fn rotation(&self) -> [f32; 4] {
        match self {
            SceneItem::Splat(item) => item.rotation,
            SceneItem::Gs3d(item) => item.rotation,
        }
    }

    pub fn scale(&self) -> glm::Vec3 {
        match self {
            SceneItem::Splat(item) => glm::make_vec3(&item.scale),
            SceneItem::Gs3d(item) => glm::make_vec3(&item.scale),
        }
    }

    pub fn visible(&self) -> bool {
        match self {
            SceneItem::Splat(item) => item.visible,
            SceneItem::Gs3d(item) => item.visible,
        }
    }
}

/// One stop in the tour.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct View {
    pub id: String,
    pub title: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub show_hit_point: bool,
    #[serde(default)]
    pub show_text_details: bool,
    #[serde(default)]
    pub metadata: Metadata,
    /// Transition duration at multiplier 1, in seconds.
    pub duration: f32,
    /// Easing descriptor, compiled per transition (see `transition::easing`).
    pub easing: String,
    pub item: CameraPose,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ViewGroup {
    pub id: String,
    pub title: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub metadata: Metadata,
    #[serde(rename = "transitions")]
    pub views: Vec<View>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SceneData {
    pub camera: CameraPose,
    pub items: Vec<SceneItem>,
    #[serde(rename = "transitionGroups")]
    pub view_groups: Vec<ViewGroup>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LinkedScene {
    pub id: String,
    pub name: String,
}

/// Immutable snapshot of a fetched scene.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SceneDocument {
    pub id: String,
    pub team_id: String,
    pub name: String,
    pub description: String,
    pub version: String,
    #[serde(default)]
    pub metadata: Metadata,
    #[serde(default)]
    pub tags: Vec<String>,
    pub data: SceneData,
    pub background_color: String,
    #[serde(default)]
    pub summary_image: Option<String>,
    #[serde(default)]
    pub linked_scenes: Vec<LinkedScene>,
}

impl SceneDocument {
    /// Views of all groups flattened in group order then view order.
    /// Index `i` into this sequence is the navigation order the tour
    /// wraps around.
    pub fn views(&self) -> impl Iterator<Item = &View> {
        self.data.view_groups.iter().flat_map(|group| &group.views)
    }

    pub fn view_count(&self) -> usize {
        self.data.view_groups.iter().map(|g| g.views.len()).sum()
    }

    pub fn view_at(&self, index: usize) -> Option<&View> {
        self.views().nth(index)
    }

    /// The group containing the view with the given id.
    pub fn group_of(&self, view_id: &str) -> Option<&ViewGroup> {
        self.data
            .view_groups
            .iter()
            .find(|group| group.views.iter().any(|view| view.id == view_id))
    }

    pub fn background_rgba(&self) -> [f32; 4] {
        crate::math::hex_to_rgba(&self.background_color)
    }

    /// Structural checks serde cannot express. A failing document must
    /// never reach camera initialization.
    pub fn validate(&self) -> Result<(), String> {
        validate_pose(&self.data.camera, "scene camera")?;

        let mut seen = std::collections::BTreeSet::new();
        for group in &self.data.view_groups {
            for view in &group.views {
                if !seen.insert(view.id.as_str()) {
                    return Err(format!("duplicate view id {}", view.id));
                }
                if !view.duration.is_finite() || view.duration < 0.0 {
                    return Err(format!("view {} has invalid duration", view.id));
                }
                validate_pose(&view.item, &view.id)?;
            }
        }

        Ok(())
    }
}

fn validate_pose(pose: &CameraPose, context: &str) -> Result<(), String> {
    let finite = pose.position.iter().all(|v| v.is_finite())
        && pose.look_at.iter().all(|v| v.is_finite());
    if !finite {
        return Err(format!("{context}: non-finite camera vector"));
    }
    if !(pose.zoom.is_finite() && pose.zoom > 0.0) {
        return Err(format!("{context}: zoom must be positive"));
    }
    for delta in [
        pose.min_azimuth_angle,
        pose.max_azimuth_angle,
        pose.min_polar_angle,
        pose.max_polar_angle,
    ]
    .into_iter()
    .flatten()
    {
        if !delta.is_finite() || delta < 0.0 {
            return Err(format!("{context}: orbit-constraint delta must be >= 0"));
        }
    }
    Ok(())
}

// ---------------------------------------------------------------------------
// Callback metadata shapes handed to host events.

#[derive(Debug, Clone, PartialEq)]
pub struct ViewMetadata {
    pub title: String,
    pub description: Option<String>,
    pub metadata: BTreeMap<String, String>,
    pub show_text_details: bool,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ViewGroupMetadata {
    pub title: String,
    pub description: Option<String>,
    pub metadata: BTreeMap<String, String>,
    pub views: Vec<ViewMetadata>,
}

#[derive(Debug, Clone)]
pub struct GlobalMetadata {
    pub title: String,
    pub description: String,
    pub metadata: BTreeMap<String, String>,
    pub number_of_views: usize,
    pub summary_image: Option<String>,
    pub linked_scenes: Vec<LinkedScene>,
}

impl From<&View> for ViewMetadata {
    fn from(view: &View) -> Self {
        Self {
            title: view.title.clone(),
            description: view.description.clone(),
            metadata: metadata_to_record(&view.metadata),
            show_text_details: view.show_text_details,
        }
    }
}

impl From<&ViewGroup> for ViewGroupMetadata {
    fn from(group: &ViewGroup) -> Self {
        Self {
            title: group.title.clone(),
            description: group.description.clone(),
            metadata: metadata_to_record(&group.metadata),
            views: group.views.iter().map(ViewMetadata::from).collect(),
        }
    }
}

impl From<&SceneDocument> for GlobalMetadata {
    fn from(doc: &SceneDocument) -> Self {
        Self {
            title: doc.name.clone(),
            description: doc.description.clone(),
            metadata: metadata_to_record(&doc.metadata),
            number_of_views: doc.view_count(),
            summary_image: doc.summary_image.clone(),
            linked_scenes: doc.linked_scenes.clone(),
        }
    }
}

#[cfg(test)]
pub(crate) use tests::sample_document;

#[cfg(test)]
pub(crate) mod tests {
    use super::*;

    /// Minimal but complete two-group document used across the crate's
    /// test suites.
    pub(crate) fn sample_document() -> SceneDocument {
        let json = sample_json();
        let doc: SceneDocument = serde_json::from_str(&json).expect("sample parses");
        doc
    }

    pub(crate) fn sample_json() -> String {
        let pose = |x: f32, easing_id: &str| {
            format!(
                r#"{{
                    "id": "{easing_id}",
                    "type": "perspectiveCamera",
                    "position": [{x}, 2.0, 8.0],
                    "lookAt": [0.0, 0.0, 0.0],
                    "zoom": 1.0,
                    "fov": 50.0,
                    "aspect": 1.77,
                    "near": 0.1,
                    "far": 1000.0,
                    "minAzimuthAngle": 0.4,
                    "maxAzimuthAngle": 0.4,
                    "minPolarAngle": null,
                    "maxPolarAngle": null
                }}"#
            )
        };

        let view = |id: &str, title: &str, x: f32, duration: f32| {
            format!(
                r#"{{
                    "id": "{id}",
                    "type": "point",
                    "title": "{title}",
                    "duration": {duration},
                    "easing": "linear",
                    "showTextDetails": true,
                    "item": {}
                }}"#,
                pose(x, id)
            )
        };

        format!(
            r##"{{
                "id": "scene-1",
                "teamId": "team-1",
                "name": "Showroom",
                "description": "Demo scene",
                "version": "1",
                "tags": [],
                "backgroundColor": "#102030",
                "linkedScenes": [{{"id": "scene-2", "name": "Annex"}}],
                "data": {{
                    "camera": {},
                    "items": [
                        {{
                            "id": "item-1",
                            "type": "gs3d",
                            "src": "https://assets.example/statue.splat",
                            "position": [0.0, 0.0, 0.0],
                            "rotation": [0.0, 0.0, 0.0, 1.0],
                            "scale": [1.0, 1.0, 1.0]
                        }}
                    ],
                    "transitionGroups": [
                        {{
                            "id": "group-1",
                            "title": "Exterior",
                            "transitions": [{}, {}]
                        }},
                        {{
                            "id": "group-2",
                            "title": "Interior",
                            "transitions": [{}]
                        }}
                    ]
                }}
            }}"##,
            pose(0.0, "cam-default"),
            view("view-0", "Front", 0.0, 2.0),
            view("view-1", "Side", 4.0, 3.0),
            view("view-2", "Hall", -4.0, 2.0),
        )
    }

    #[test]
    fn parses_and_flattens_navigation_order() {
        let doc = sample_document();
        assert_eq!(doc.view_count(), 3);
        let titles: Vec<&str> = doc.views().map(|v| v.title.as_str()).collect();
        assert_eq!(titles, ["Front", "Side", "Hall"]);
        assert_eq!(doc.view_at(2).map(|v| v.id.as_str()), Some("view-2"));
        assert!(doc.view_at(3).is_none());
    }

    #[test]
    fn background_color_hex_survives_the_fixture() {
        let doc = sample_document();
        assert_eq!(doc.background_color, "#102030");
        let rgba = doc.background_rgba();
        assert!((rgba[0] - 16.0 / 255.0).abs() < 1e-4);
        assert!((rgba[1] - 32.0 / 255.0).abs() < 1e-4);
        assert!((rgba[2] - 48.0 / 255.0).abs() < 1e-4);
    }

    #[test]
    fn group_lookup_by_view_id() {
        let doc = sample_document();
        assert_eq!(doc.group_of("view-2").map(|g| g.title.as_str()), Some("Interior"));
        assert!(doc.group_of("missing").is_none());
    }

    #[test]
    fn item_enum_discriminates_on_type() {
        let doc = sample_document();
        match &doc.data.items[0] {
            SceneItem::Gs3d(item) => assert_eq!(item.src, "https://assets.example/statue.splat"),
            SceneItem::Splat(_) => panic!("expected gs3d item"),
        }
    }

    #[test]
    fn validates_sample() {
        assert!(sample_document().validate().is_ok());
    }

    #[test]
    fn rejects_negative_delta() {
        let mut doc = sample_document();
        doc.data.camera.min_azimuth_angle = Some(-1.0);
        assert!(doc.validate().is_err());
    }

    #[test]
    fn rejects_duplicate_view_ids() {
        let mut doc = sample_document();
        let dup = doc.data.view_groups[0].views[0].clone();
        doc.data.view_groups[1].views.push(dup);
        assert!(doc.validate().is_err());
    }

    #[test]
    fn metadata_flattens_to_plain_record() {
        let mut metadata = Metadata::new();
        metadata.insert(
            "artist".into(),
            MetadataEntry {
                value: "anon".into(),
                updated_at: "2024-01-01T00:00:00.000Z".into(),
            },
        );
        let record = metadata_to_record(&metadata);
        assert_eq!(record.get("artist").map(String::as_str), Some("anon"));
    }
}
