//! Load lifecycle and control toggles

use bevy::prelude::*;

use crate::types::{
    FullscreenChanged, FullscreenRequested, LoadProgress, ModelFailed, ModelLoaded, ViewerAction,
    ViewerNotification, ViewerStatus,
};

/// Plugin that keeps [`ViewerStatus`] in step with load results and user actions
pub struct StatusPlugin;

impl Plugin for StatusPlugin {
    fn build(&self, app: &mut App) {
        app.add_systems(Update, (track_load, apply_actions, sync_fullscreen));
    }
}

/// Fold load messages into the viewer state and notify the page
///
/// Progress is applied before completion so a final 100% report is not lost
/// behind the terminal event.
fn track_load(
    mut status: ResMut<ViewerStatus>,
    mut progress: MessageReader<LoadProgress>,
    mut loaded: MessageReader<ModelLoaded>,
    mut failed: MessageReader<ModelFailed>,
    mut notifications: MessageWriter<ViewerNotification>,
) {
    for LoadProgress(percent) in progress.read() {
        if let Some(event) = status.bypass_change_detection().report_progress(*percent) {
            status.set_changed();
            notifications.write(ViewerNotification(event));
        }
    }

    if loaded.read().count() > 0 {
        if let Some(event) = status.complete() {
            tracing::info!("Model loaded");
            notifications.write(ViewerNotification(event));
        }
    }

    for failure in failed.read() {
        if let Some(event) = status.fail(failure.title.clone(), failure.message.clone()) {
            tracing::error!(title = %failure.title, error = %failure.message, "Model failed to load");
            notifications.write(ViewerNotification(event));
        }
    }
}

fn apply_actions(
    mut actions: MessageReader<ViewerAction>,
    mut status: ResMut<ViewerStatus>,
    mut fullscreen: MessageWriter<FullscreenRequested>,
) {
    for action in actions.read() {
        match action {
            ViewerAction::ToggleAutoRotate => {
                let on = status.toggle_auto_rotate();
                tracing::debug!(on, "Auto-rotate toggled");
            }
            ViewerAction::ToggleHdri => {
                let on = status.toggle_hdri();
                tracing::debug!(on, "HDRI toggled");
            }
            ViewerAction::ToggleFullscreen => {
                fullscreen.write(FullscreenRequested(status.fullscreen_request()));
            }
            ViewerAction::ResetView => {}
        }
    }
}

fn sync_fullscreen(mut changes: MessageReader<FullscreenChanged>, mut status: ResMut<ViewerStatus>) {
    if let Some(FullscreenChanged(active)) = changes.read().last() {
        if status.bypass_change_detection().sync_fullscreen(*active) {
            status.set_changed();
        }
    }
}
