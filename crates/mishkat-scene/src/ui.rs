//! Loading, error and control overlays using bevy_egui

use bevy::prelude::*;
use bevy_egui::{egui, EguiContexts, EguiPrimaryContextPass};
use mishkat_core::{LoadFailure, LoadStage};

use crate::environment::SceneEnvironment;
use crate::types::{Mounted, UiLayout, ViewerAction, ViewerSettings, ViewerStatus};

pub struct UiPlugin;

impl Plugin for UiPlugin {
    fn build(&self, app: &mut App) {
        app.add_systems(Update, update_ui_layout)
            .add_systems(EguiPrimaryContextPass, ui_system);
    }
}

/// Update UI layout based on window size
fn update_ui_layout(windows: Query<&Window>, mut ui_layout: ResMut<UiLayout>) {
    if let Ok(window) = windows.single() {
        let width = window.width();
        let height = window.height();

        if (ui_layout.screen_width - width).abs() > 1.0
            || (ui_layout.screen_height - height).abs() > 1.0
        {
            ui_layout.update_from_window(width, height);
        }
    }
}

const ERROR_ICON: &str = "✕";
const ERROR_COLOR: egui::Color32 = egui::Color32::from_rgb(230, 80, 80);

/// Headline of the error panel
pub fn error_headline(failure: Option<&LoadFailure>) -> &str {
    failure
        .map(|f| f.title.as_str())
        .filter(|t| !t.is_empty())
        .unwrap_or("Failed to load model")
}

/// Label for the spinner overlay
pub fn loading_label(progress: f32) -> String {
    if progress > 0.0 {
        format!("Loading 3D model... {:.0}%", progress)
    } else {
        "Loading 3D model...".to_string()
    }
}

fn ui_system(
    mut contexts: EguiContexts,
    status: Res<ViewerStatus>,
    settings: Res<ViewerSettings>,
    environment: Res<SceneEnvironment>,
    ui_layout: Res<UiLayout>,
    mounted: Res<Mounted>,
    mut actions: MessageWriter<ViewerAction>,
) {
    if !**mounted {
        return;
    }
    let ui_scale = ui_layout.ui_scale();
    let Ok(ctx) = contexts.ctx_mut() else { return };

    match status.stage() {
        LoadStage::Loading => {
            egui::Area::new(egui::Id::new("loading_overlay"))
                .anchor(egui::Align2::CENTER_CENTER, egui::vec2(0.0, 0.0))
                .interactable(false)
                .show(ctx, |ui| {
                    ui.vertical_centered(|ui| {
                        ui.add(egui::Spinner::new().size(32.0 * ui_scale));
                        ui.add_space(8.0);
                        ui.label(
                            egui::RichText::new(loading_label(status.progress()))
                                .size(14.0 * ui_scale)
                                .color(egui::Color32::LIGHT_GRAY),
                        );
                        if status.progress() > 0.0 {
                            ui.add(
                                egui::ProgressBar::new(status.progress() / 100.0)
                                    .desired_width(200.0 * ui_scale),
                            );
                        }
                    });
                });
        }
        LoadStage::Error => {
            let failure = status.failure();
            egui::Window::new("load_error")
                .collapsible(false)
                .resizable(false)
                .title_bar(false)
                .anchor(egui::Align2::CENTER_CENTER, egui::vec2(0.0, 0.0))
                .show(ctx, |ui| {
                    ui.set_max_width(320.0 * ui_scale);
                    ui.vertical_centered(|ui| {
                        ui.label(
                            egui::RichText::new(ERROR_ICON)
                                .size(32.0 * ui_scale)
                                .color(ERROR_COLOR),
                        );
                        ui.heading(
                            egui::RichText::new(error_headline(failure))
                                .size(18.0 * ui_scale)
                                .color(ERROR_COLOR),
                        );
                        ui.add_space(6.0);
                        if let Some(failure) = failure {
                            ui.label(egui::RichText::new(&failure.message).size(14.0 * ui_scale));
                        }
                    });
                });
        }
        LoadStage::Complete => {
            if settings.show_controls {
                controls(ctx, &status, &environment, ui_scale, &mut actions);
            }
        }
    }
}

fn controls(
    ctx: &egui::Context,
    status: &ViewerStatus,
    environment: &SceneEnvironment,
    ui_scale: f32,
    actions: &mut MessageWriter<ViewerAction>,
) {
    let button = |text: &str, active: bool| {
        let label = egui::RichText::new(text).size(14.0 * ui_scale);
        egui::Button::new(label)
            .selected(active)
            .min_size(egui::vec2(36.0 * ui_scale, 32.0 * ui_scale))
    };

    egui::Area::new(egui::Id::new("viewer_controls"))
        .anchor(egui::Align2::RIGHT_BOTTOM, egui::vec2(-12.0, -12.0))
        .show(ctx, |ui| {
            egui::Frame::popup(ui.style()).show(ui, |ui| {
                ui.horizontal(|ui| {
                    if ui.add(button("⟲ Reset", false)).on_hover_text("Reset view").clicked() {
                        actions.write(ViewerAction::ResetView);
                    }
                    if ui
                        .add(button("↻ Rotate", status.is_auto_rotating))
                        .on_hover_text("Toggle auto-rotate")
                        .clicked()
                    {
                        actions.write(ViewerAction::ToggleAutoRotate);
                    }
                    let hdri = ui
                        .add_enabled(environment.has_hdri(), button("☀ HDRI", status.hdri_enabled))
                        .on_hover_text("Toggle HDRI lighting")
                        .on_disabled_hover_text("No HDRI environment loaded");
                    if hdri.clicked() {
                        actions.write(ViewerAction::ToggleHdri);
                    }
                    let fullscreen = if status.is_fullscreen { "⛶ Exit" } else { "⛶ Full" };
                    if ui
                        .add(button(fullscreen, status.is_fullscreen))
                        .on_hover_text("Toggle fullscreen")
                        .clicked()
                    {
                        actions.write(ViewerAction::ToggleFullscreen);
                    }
                });
            });
        });
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_headline_uses_failure_title() {
        let failure = LoadFailure {
            title: "Unsupported format".into(),
            message: "Format FBX is not yet supported in preview.".into(),
        };
        assert_eq!(error_headline(Some(&failure)), "Unsupported format");
        assert_eq!(error_headline(None), "Failed to load model");
    }

    #[test]
    fn test_loading_label() {
        assert_eq!(loading_label(0.0), "Loading 3D model...");
        assert_eq!(loading_label(42.4), "Loading 3D model... 42%");
    }
}
