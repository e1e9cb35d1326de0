//! Shared resources and messages for the viewer scene

use bevy::prelude::*;
use mishkat_core::{
    EnvironmentPhase, FullscreenRequest, NormalizedModel, ViewerConfig, ViewerError, ViewerEvent,
    ViewerState,
};

/// Configuration of the mounted viewer
#[derive(Resource, Debug, Clone, Deref)]
pub struct ViewerSettings(pub ViewerConfig);

/// Load stage and UI toggles of the mounted viewer
#[derive(Resource, Debug, Clone, Deref, DerefMut)]
pub struct ViewerStatus(pub ViewerState);

impl ViewerStatus {
    pub fn new(config: &ViewerConfig) -> Self {
        Self(ViewerState::new(config))
    }
}

/// Whether a configuration is mounted; the app outlives individual mounts
#[derive(Resource, Debug, Clone, Copy, PartialEq, Eq, Deref)]
pub struct Mounted(pub bool);

impl Default for Mounted {
    fn default() -> Self {
        Self(true)
    }
}

/// The page mounted a new configuration on the running viewer
#[derive(Message, Debug, Clone)]
pub struct ViewerMounted(pub ViewerConfig);

/// The page unmounted the viewer
#[derive(Message, Debug, Clone, Copy, PartialEq, Eq)]
pub struct ViewerUnmounted;

/// Download progress of the model, in percent
#[derive(Message, Debug, Clone, Copy)]
pub struct LoadProgress(pub f32);

/// A decoded and normalized model, ready to spawn
#[derive(Message, Debug)]
pub struct ModelLoaded(pub NormalizedModel);

/// The model load failed and the viewer stays in its error state
#[derive(Message, Debug, Clone)]
pub struct ModelFailed {
    pub title: String,
    pub message: String,
}

impl From<&ViewerError> for ModelFailed {
    fn from(error: &ViewerError) -> Self {
        Self {
            title: error.title().to_string(),
            message: error.to_string(),
        }
    }
}

/// The HDRI pipeline settled
#[derive(Message, Debug, Clone)]
pub struct EnvironmentResolved(pub EnvironmentPhase);

/// Lifecycle notification for the embedding page
#[derive(Message, Debug, Clone, PartialEq)]
pub struct ViewerNotification(pub ViewerEvent);

/// User actions from the control overlay
#[derive(Message, Debug, Clone, Copy, PartialEq, Eq)]
pub enum ViewerAction {
    ResetView,
    ToggleAutoRotate,
    ToggleHdri,
    ToggleFullscreen,
}

/// Ask the platform to enter or leave fullscreen
#[derive(Message, Debug, Clone, Copy, PartialEq, Eq)]
pub struct FullscreenRequested(pub FullscreenRequest);

/// The platform's fullscreen status changed
#[derive(Message, Debug, Clone, Copy, PartialEq, Eq)]
pub struct FullscreenChanged(pub bool);

/// UI layout state, adjusted for small and portrait screens
#[derive(Resource, Debug, Clone)]
pub struct UiLayout {
    pub is_mobile: bool,
    pub screen_width: f32,
    pub screen_height: f32,
}

impl Default for UiLayout {
    fn default() -> Self {
        Self {
            is_mobile: false,
            screen_width: 1920.0,
            screen_height: 1080.0,
        }
    }
}

impl UiLayout {
    pub fn update_from_window(&mut self, width: f32, height: f32) {
        self.screen_width = width;
        self.screen_height = height;
        // Consider mobile if width < 800 or in portrait orientation
        self.is_mobile = width < 800.0 || (height > width * 1.2);
    }

    pub fn ui_scale(&self) -> f32 {
        if self.is_mobile { 1.2 } else { 1.0 }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mobile_detection() {
        let mut layout = UiLayout::default();
        layout.update_from_window(1280.0, 720.0);
        assert!(!layout.is_mobile);
        assert_eq!(layout.ui_scale(), 1.0);

        layout.update_from_window(390.0, 844.0);
        assert!(layout.is_mobile);
        assert_eq!(layout.ui_scale(), 1.2);

        // tall desktop window
        layout.update_from_window(900.0, 1200.0);
        assert!(layout.is_mobile);
    }

    #[test]
    fn test_failure_message_from_error() {
        let error = mishkat_core::DecodeRoute::from_declared("fbx")
            .ensure_supported()
            .unwrap_err();
        let failed = ModelFailed::from(&error);
        assert_eq!(failed.title, error.title());
        assert!(failed.message.contains("GLB, STL, OBJ, or PLY"));
    }
}
