use crate::CONFY_APP_NAME;

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ViewerSettings {
    pub transition_speed_multiplier: f32,
    pub automode_dwell_seconds: f32,
    pub auto_rotate: bool,
    pub show_hit_points: bool,
    pub marker_radius: f32,
}

impl Default for ViewerSettings {
    fn default() -> Self {
        Self {
            transition_speed_multiplier: 1.0,
            automode_dwell_seconds: 3.0,
            auto_rotate: true,
            show_hit_points: true,
            marker_radius: 6.0,
        }
    }
}

impl ViewerSettings {
    pub fn load() -> Self {
        confy::load(CONFY_APP_NAME, "viewer").unwrap_or_default()
    }

    pub fn save(&self) {
        let _ = confy::store(CONFY_APP_NAME, "viewer", self);
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UiSettings {
    pub show_view_panel: bool,
    pub show_scene_info: bool,
    pub show_load_progress: bool,
}

impl Default for UiSettings {
    fn default() -> Self {
        Self {
            show_view_panel: true,
            show_scene_info: false,
            show_load_progress: true,
        }
    }
}

impl UiSettings {
    pub fn load() -> Self {
        confy::load(CONFY_APP_NAME, "ui").unwrap_or_default()
    }

    pub fn save(&self) {
        let _ = confy::store(CONFY_APP_NAME, "ui", self);
    }
}

// Aggregate struct for convenience
pub struct Settings {
    pub viewer: ViewerSettings,
    pub ui: UiSettings,
}

impl Settings {
    pub fn load() -> Self {
        Self {
            viewer: ViewerSettings::load(),
            ui: UiSettings::load(),
        }
    }
}
