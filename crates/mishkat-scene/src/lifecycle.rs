//! Mounting and unmounting configurations on the running viewer
//!
//! A page hosts one Bevy app for its whole life. Mounting a new
//! configuration resets the per-mount state in place; unmounting clears the
//! model and hides the overlays until the next mount.

use bevy::prelude::*;
use mishkat_core::{OrbitConfig, OrbitController};

use crate::camera::OrbitCamera;
use crate::environment::SceneEnvironment;
use crate::models::ModelRoot;
use crate::types::{Mounted, ViewerMounted, ViewerSettings, ViewerStatus, ViewerUnmounted};

pub struct LifecyclePlugin;

impl Plugin for LifecyclePlugin {
    fn build(&self, app: &mut App) {
        app.add_systems(PreUpdate, apply_mounts);
    }
}

pub fn apply_mounts(
    mut commands: Commands,
    mut mounts: MessageReader<ViewerMounted>,
    mut unmounts: MessageReader<ViewerUnmounted>,
    models: Query<Entity, With<ModelRoot>>,
    mut mounted: ResMut<Mounted>,
) {
    let unmounted = unmounts.read().count() > 0;
    let mount = mounts.read().last();
    if !unmounted && mount.is_none() {
        return;
    }

    for entity in &models {
        commands.entity(entity).despawn();
    }

    match mount {
        Some(ViewerMounted(config)) => {
            tracing::info!(url = %config.model_url, "Mounting configuration");
            let environment = config.environment().initial_phase();
            commands.insert_resource(ViewerSettings(config.clone()));
            commands.insert_resource(ViewerStatus::new(config));
            commands.insert_resource(SceneEnvironment::new(environment));
            commands.insert_resource(OrbitCamera(OrbitController::new(OrbitConfig::from_viewer(config))));
            mounted.0 = true;
        }
        None => {
            tracing::info!("Viewer unmounted");
            mounted.0 = false;
        }
    }
}
