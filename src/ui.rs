use crate::settings::Settings;
use crate::viewer::{ItemProgress, ViewerController};

/// What the overlay asked the app to do this frame.
#[derive(Default)]
pub struct UiActions {
    pub next_view: bool,
    pub previous_view: bool,
    pub goto_view: Option<usize>,
    pub toggle_automode: bool,
}

pub struct Ui;

impl Ui {
    pub fn new() -> Self {
        Self
    }

    pub fn show(
        &mut self,
        ctx: &egui::Context,
        viewer: &ViewerController,
        settings: &mut Settings,
    ) -> UiActions {
        let mut actions = UiActions::default();

        if settings.ui.show_view_panel {
            self.show_nav_bar(ctx, viewer, settings, &mut actions);
        }

        if settings.ui.show_scene_info {
            self.show_scene_info_window(ctx, viewer, settings);
        }

        if settings.ui.show_load_progress {
            self.show_load_progress(ctx, viewer);
        }

        if let Some(error) = viewer.last_error() {
            egui::TopBottomPanel::top("error_banner").show(ctx, |ui| {
                ui.colored_label(egui::Color32::LIGHT_RED, format!("⚠ {error}"));
            });
        }

        self.show_view_description(ctx, viewer);
        self.show_hit_point_markers(ctx, viewer, settings, &mut actions);

        actions
    }

    fn show_nav_bar(
        &mut self,
        ctx: &egui::Context,
        viewer: &ViewerController,
        settings: &mut Settings,
        actions: &mut UiActions,
    ) {
        egui::TopBottomPanel::bottom("nav_bar").show(ctx, |ui| {
            ui.horizontal(|ui| {
                if ui.button("⏴ Prev").clicked() {
                    actions.previous_view = true;
                }
                if ui.button("Next ⏵").clicked() {
                    actions.next_view = true;
                }

                if ui
                    .button(if viewer.automode() {
                        "⏸ Auto tour"
                    } else {
                        "▶ Auto tour"
                    })
                    .clicked()
                {
                    actions.toggle_automode = true;
                }

                ui.separator();

                if let (Some(document), Some(index)) = (viewer.document(), viewer.active_view()) {
                    if let Some(view) = document.view_at(index) {
                        ui.label(format!(
                            "{} ({}/{})",
                            view.title,
                            index + 1,
                            document.view_count()
                        ));
                    }
                }

                ui.separator();

                if ui
                    .button(if settings.ui.show_scene_info {
                        "✅ Info"
                    } else {
                        "⬜ Info"
                    })
                    .clicked()
                {
                    settings.ui.show_scene_info = !settings.ui.show_scene_info;
                    settings.ui.save();
                }
            });
        });
    }

    fn show_scene_info_window(
        &mut self,
        ctx: &egui::Context,
        viewer: &ViewerController,
        settings: &mut Settings,
    ) {
        egui::Window::new("Scene")
            .open(&mut settings.ui.show_scene_info)
            .resizable(false)
            .show(ctx, |ui| {
                let Some(document) = viewer.document() else {
                    ui.label("No scene loaded");
                    return;
                };
                ui.label(&document.name);
                if !document.description.is_empty() {
                    ui.label(&document.description);
                }
                ui.separator();
                ui.label(format!("Items: {}", document.data.items.len()));
                ui.label(format!("Views: {}", document.view_count()));
                for linked in &document.linked_scenes {
                    ui.label(format!("Linked: {}", linked.name));
                }
            });
    }

    fn show_load_progress(&mut self, ctx: &egui::Context, viewer: &ViewerController) {
        let progress = viewer.item_progress();
        if progress.is_empty() || viewer.all_assets_ready() {
            return;
        }

        egui::Window::new("Loading")
            .title_bar(false)
            .resizable(false)
            .anchor(egui::Align2::CENTER_CENTER, egui::vec2(0.0, 0.0))
            .show(ctx, |ui| {
                for (item_id, state) in progress {
                    match state {
                        ItemProgress::Downloading(Some(fraction)) => {
                            ui.add(
                                egui::ProgressBar::new(*fraction)
                                    .text(item_id.as_str())
                                    .desired_width(220.0),
                            );
                        }
                        ItemProgress::Downloading(None) => {
                            ui.horizontal(|ui| {
                                ui.spinner();
                                ui.label(item_id.as_str());
                            });
                        }
                        ItemProgress::Ready => {
                            ui.label(format!("✅ {item_id}"));
                        }
                        ItemProgress::Failed => {
                            ui.colored_label(
                                egui::Color32::LIGHT_RED,
                                format!("⚠ {item_id}"),
                            );
                        }
                    }
                }
            });
    }

    fn show_view_description(&mut self, ctx: &egui::Context, viewer: &ViewerController) {
        let Some(document) = viewer.document() else {
            return;
        };
        let Some(view) = viewer.active_view().and_then(|i| document.view_at(i)) else {
            return;
        };
        if !view.show_text_details || viewer.is_transitioning() {
            return;
        }
        let Some(description) = view.description.as_deref() else {
            return;
        };

        egui::Window::new(&view.title)
            .id(egui::Id::new("view_details"))
            .anchor(egui::Align2::LEFT_BOTTOM, egui::vec2(12.0, -40.0))
            .resizable(false)
            .show(ctx, |ui| {
                ui.label(description);
            });
    }

    /// Circular markers anchored at the look-at points of views that opt
    /// in; clicking one starts a transition to that view.
    fn show_hit_point_markers(
        &mut self,
        ctx: &egui::Context,
        viewer: &ViewerController,
        settings: &Settings,
        actions: &mut UiActions,
    ) {
        if !settings.viewer.show_hit_points || viewer.is_transitioning() {
            return;
        }
        let Some(document) = viewer.document() else {
            return;
        };
        let Some(projection) = viewer.projection() else {
            return;
        };

        let radius = settings.viewer.marker_radius;

        for (index, _) in document.views().enumerate() {
            if Some(index) == viewer.active_view() {
                continue;
            }
            let Some(anchor) = viewer.view_anchor(index) else {
                continue;
            };
            let Some((x, y, _)) = projection.world_to_screen(&anchor) else {
                continue;
            };
            let (width, height) = projection.viewport();
            if x < 0.0 || x > width || y < 0.0 || y > height {
                continue;
            }

            let pixels_per_point = ctx.pixels_per_point();
            let pos = egui::pos2(x / pixels_per_point, y / pixels_per_point);

            let response = egui::Area::new(egui::Id::new(("hit_point", index)))
                .fixed_pos(pos - egui::vec2(radius, radius))
                .show(ctx, |ui| {
                    let (rect, response) = ui.allocate_exact_size(
                        egui::vec2(radius * 2.0, radius * 2.0),
                        egui::Sense::click(),
                    );
                    let fill = if response.hovered() {
                        egui::Color32::WHITE
                    } else {
                        egui::Color32::from_white_alpha(160)
                    };
                    ui.painter().circle_filled(rect.center(), radius, fill);
                    ui.painter().circle_stroke(
                        rect.center(),
                        radius,
                        egui::Stroke::new(1.5, egui::Color32::BLACK),
                    );
                    response
                })
                .inner;

            if let Some(view) = document.view_at(index) {
                response.clone().on_hover_text(&view.title);
            }
            if response.clicked() {
                actions.goto_view = Some(index);
            }
        }
    }
}

impl Default for Ui {
    fn default() -> Self {
        Self::new()
    }
}
