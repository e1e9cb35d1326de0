//! Model and HDRI loading from the configured URLs
//!
//! Both loads run as independent `spawn_local` tasks. Results land in
//! shared slots and are handed to the scene by [`process_pending_loads`]
//! once per frame. Every task holds a load ticket and drops its result if
//! the viewer was unmounted or remounted in the meantime.

use bevy::prelude::*;
use mishkat_core::{
    load_hdri, load_model, EnvironmentPhase, EnvironmentSettings, LoadTicket, NormalizedModel, ViewerConfig,
    ViewerSession,
};
use mishkat_scene::{
    EnvironmentResolved, LoadProgress, ModelFailed, ModelLoaded, SceneEnvironment, ViewerMounted, ViewerSettings,
};
use std::sync::{Arc, Mutex};

use crate::fetch::BrowserFetcher;

/// Plugin for model and environment loading
pub struct FileLoaderPlugin;

impl Plugin for FileLoaderPlugin {
    fn build(&self, app: &mut App) {
        app.init_resource::<PendingLoad>()
            .add_systems(Startup, start_initial_loads)
            .add_systems(
                PreUpdate,
                (restart_loads, process_pending_loads)
                    .chain()
                    .after(mishkat_scene::lifecycle::apply_mounts),
            );
    }
}

/// Session of the mounted viewer
#[derive(Resource, Debug, Clone, Default, Deref)]
pub struct Session(pub ViewerSession);

/// Pending load results
#[derive(Resource, Default)]
pub struct PendingLoad {
    pub progress: Arc<Mutex<Vec<f32>>>,
    pub model: Arc<Mutex<Option<Result<NormalizedModel, ModelFailed>>>>,
    pub environment: Arc<Mutex<Option<EnvironmentPhase>>>,
}

fn start_initial_loads(
    settings: Res<ViewerSettings>,
    environment: Res<SceneEnvironment>,
    pending: Res<PendingLoad>,
    session: Res<Session>,
) {
    start_loads(&settings, &environment.phase, &pending, &session);
}

/// Start over for a configuration mounted on the running app
fn restart_loads(
    mut mounts: MessageReader<ViewerMounted>,
    settings: Res<ViewerSettings>,
    environment: Res<SceneEnvironment>,
    mut pending: ResMut<PendingLoad>,
    session: Res<Session>,
) {
    if mounts.read().count() == 0 {
        return;
    }
    // fresh slots; tasks of the previous mount keep the old ones
    *pending = PendingLoad::default();
    start_loads(&settings, &environment.phase, &pending, &session);
}

/// The environment phase was planned when the configuration was mounted
fn start_loads(config: &ViewerConfig, phase: &EnvironmentPhase, pending: &PendingLoad, session: &ViewerSession) {
    let ticket = session.begin_load();
    spawn_model_load(config.clone(), ticket.clone(), pending);
    if let EnvironmentPhase::Loading { url, .. } = phase {
        spawn_environment_load(url.clone(), config.environment(), ticket, pending);
    }
}

fn spawn_model_load(config: ViewerConfig, ticket: LoadTicket, pending: &PendingLoad) {
    let progress_slot = pending.progress.clone();
    let model_slot = pending.model.clone();

    wasm_bindgen_futures::spawn_local(async move {
        let progress_ticket = ticket.clone();
        let on_progress = move |percent: f32| {
            if progress_ticket.is_live() {
                if let Ok(mut queue) = progress_slot.lock() {
                    queue.push(percent);
                }
            }
        };

        let result = load_model(&BrowserFetcher, &config, &on_progress)
            .await
            .map_err(|e| ModelFailed::from(&e));

        if !ticket.is_live() {
            tracing::debug!(url = %config.model_url, "Discarding model load for stale session");
            return;
        }
        if let Ok(mut slot) = model_slot.lock() {
            *slot = Some(result);
        }
    });
}

fn spawn_environment_load(
    url: String,
    settings: EnvironmentSettings,
    ticket: LoadTicket,
    pending: &PendingLoad,
) {
    let environment_slot = pending.environment.clone();

    wasm_bindgen_futures::spawn_local(async move {
        let phase = load_hdri(&BrowserFetcher, &url, &settings).await;
        if !ticket.is_live() {
            return;
        }
        if let Ok(mut slot) = environment_slot.lock() {
            *slot = Some(phase);
        }
    });
}

/// Hand finished loads to the scene
fn process_pending_loads(
    pending: Res<PendingLoad>,
    mut progress: MessageWriter<LoadProgress>,
    mut loaded: MessageWriter<ModelLoaded>,
    mut failed: MessageWriter<ModelFailed>,
    mut environment: MessageWriter<EnvironmentResolved>,
) {
    if let Ok(mut queue) = pending.progress.try_lock() {
        for percent in queue.drain(..) {
            progress.write(LoadProgress(percent));
        }
    }

    if let Ok(mut slot) = pending.model.try_lock() {
        match slot.take() {
            Some(Ok(model)) => {
                loaded.write(ModelLoaded(model));
            }
            Some(Err(failure)) => {
                failed.write(failure);
            }
            None => {}
        }
    }

    if let Ok(mut slot) = pending.environment.try_lock() {
        if let Some(phase) = slot.take() {
            environment.write(EnvironmentResolved(phase));
        }
    }
}
