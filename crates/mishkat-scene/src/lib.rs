//! Mishkat Scene - Bevy rendering for the product model viewer
//!
//! This crate turns the renderer-independent state of `mishkat-core` into a
//! lit Bevy scene: an orbit camera, the studio rig or HDRI environment, the
//! normalized model and the egui overlays. Platform glue (fetching, page
//! callbacks, fullscreen) lives in the host crate and talks to the scene
//! through the messages in [`types`].

pub mod camera;
pub mod environment;
pub mod lifecycle;
pub mod models;
pub mod status;
pub mod types;
pub mod ui;

use bevy::prelude::*;
use mishkat_core::ViewerConfig;

/// Plugin that sets up the viewer scene for the first configuration
///
/// Later configurations arrive as [`ViewerMounted`] messages.
pub struct MishkatScenePlugin {
    pub config: ViewerConfig,
}

impl MishkatScenePlugin {
    pub fn new(config: ViewerConfig) -> Self {
        Self { config }
    }
}

impl Plugin for MishkatScenePlugin {
    fn build(&self, app: &mut App) {
        let environment = self.config.environment().initial_phase();

        app.insert_resource(ViewerSettings(self.config.clone()))
            .insert_resource(ViewerStatus::new(&self.config))
            .insert_resource(environment::SceneEnvironment::new(environment))
            .init_resource::<UiLayout>()
            .init_resource::<Mounted>()
            .add_message::<LoadProgress>()
            .add_message::<ModelLoaded>()
            .add_message::<ModelFailed>()
            .add_message::<EnvironmentResolved>()
            .add_message::<ViewerNotification>()
            .add_message::<ViewerAction>()
            .add_message::<FullscreenRequested>()
            .add_message::<FullscreenChanged>()
            .add_message::<ViewerMounted>()
            .add_message::<ViewerUnmounted>()
            .add_plugins(camera::CameraPlugin)
            .add_plugins(environment::EnvironmentPlugin)
            .add_plugins(models::ModelsPlugin)
            .add_plugins(lifecycle::LifecyclePlugin)
            .add_plugins(status::StatusPlugin)
            .add_plugins(ui::UiPlugin);
    }
}

// Re-export commonly used types
pub use camera::{MainCamera, OrbitCamera};
pub use environment::SceneEnvironment;
pub use types::*;
