//! One viewer app per page
//!
//! winit creates a single event loop per page, so only the first mount
//! starts the Bevy app. Later mounts on the same canvas queue their
//! configuration here and the running app picks it up on its next frame.

use bevy::prelude::*;
use mishkat_core::{ViewerConfig, ViewerSession};
use mishkat_scene::{Mounted, ViewerMounted, ViewerUnmounted};
use std::cell::RefCell;
use thiserror::Error;

use crate::callbacks::PageCallbacks;
use crate::file_loader::Session;

/// Everything one `mount()` call hands to the viewer
pub struct MountRequest {
    pub config: ViewerConfig,
    pub callbacks: PageCallbacks,
    pub session: ViewerSession,
}

#[derive(Error, Debug, PartialEq, Eq)]
pub enum MountError {
    #[error("Viewer already runs on {running}; mount on that canvas instead of {requested}")]
    CanvasTaken { running: String, requested: String },
}

/// What the caller must do with an accepted mount
pub enum Mount {
    /// No app yet; start one with this request
    Start(MountRequest),
    /// Queued for the running app
    Handoff,
}

/// Page-wide record of the running app
#[derive(Default)]
pub struct Host {
    canvas: Option<String>,
    pending: Option<MountRequest>,
}

impl Host {
    pub fn mount(&mut self, canvas: &str, request: MountRequest) -> Result<Mount, MountError> {
        match &self.canvas {
            None => {
                self.canvas = Some(canvas.to_string());
                Ok(Mount::Start(request))
            }
            Some(running) if running == canvas => {
                // superseded before the app saw it
                if let Some(previous) = self.pending.replace(request) {
                    previous.session.unmount();
                }
                Ok(Mount::Handoff)
            }
            Some(running) => Err(MountError::CanvasTaken {
                running: running.clone(),
                requested: canvas.to_string(),
            }),
        }
    }

    pub fn take_pending(&mut self) -> Option<MountRequest> {
        self.pending.take()
    }
}

thread_local! {
    static HOST: RefCell<Host> = RefCell::new(Host::default());
}

/// Run `f` on this page's host; never call the app from inside `f`
pub fn with_host<R>(f: impl FnOnce(&mut Host) -> R) -> R {
    HOST.with(|host| f(&mut host.borrow_mut()))
}

/// Plugin that feeds queued mounts into the running app
pub struct HostPlugin;

impl Plugin for HostPlugin {
    fn build(&self, app: &mut App) {
        app.add_systems(First, accept_mounts)
            .add_systems(Update, detach_on_unmount);
    }
}

fn accept_mounts(world: &mut World) {
    let Some(MountRequest { config, callbacks, session }) = with_host(Host::take_pending) else {
        return;
    };
    if let Some(previous) = world.get_resource::<Session>() {
        previous.unmount();
    }
    world.insert_resource(Session(session));
    world.insert_non_send_resource(callbacks);
    world.write_message(ViewerMounted(config));
}

fn detach_on_unmount(
    session: Res<Session>,
    mounted: Res<Mounted>,
    mut unmounted: MessageWriter<ViewerUnmounted>,
) {
    if **mounted && !session.is_mounted() {
        unmounted.write(ViewerUnmounted);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn request(url: &str) -> MountRequest {
        MountRequest {
            config: ViewerConfig::new(url, "glb"),
            callbacks: PageCallbacks::default(),
            session: ViewerSession::new(),
        }
    }

    #[test]
    fn test_second_mount_is_handed_to_running_app() {
        let mut host = Host::default();
        assert!(matches!(host.mount("#viewer", request("/a.glb")), Ok(Mount::Start(_))));
        assert!(matches!(host.mount("#viewer", request("/b.glb")), Ok(Mount::Handoff)));

        let pending = host.take_pending().unwrap();
        assert_eq!(pending.config.model_url, "/b.glb");
        assert!(host.take_pending().is_none());

        // remount after failure or unmount
        assert!(matches!(host.mount("#viewer", request("/c.glb")), Ok(Mount::Handoff)));
    }

    #[test]
    fn test_other_canvas_is_rejected() {
        let mut host = Host::default();
        assert!(matches!(host.mount("#viewer", request("/a.glb")), Ok(Mount::Start(_))));
        assert!(matches!(
            host.mount("#other", request("/b.glb")),
            Err(MountError::CanvasTaken { running, .. }) if running == "#viewer"
        ));
    }

    #[test]
    fn test_superseded_request_is_unmounted() {
        let mut host = Host::default();
        assert!(matches!(host.mount("#viewer", request("/a.glb")), Ok(Mount::Start(_))));
        let first = request("/b.glb");
        let first_session = first.session.clone();
        assert!(matches!(host.mount("#viewer", first), Ok(Mount::Handoff)));
        assert!(matches!(host.mount("#viewer", request("/c.glb")), Ok(Mount::Handoff)));
        assert!(!first_session.is_mounted());
        assert_eq!(host.take_pending().unwrap().config.model_url, "/c.glb");
    }

    fn app(session: ViewerSession) -> App {
        let mut app = App::new();
        app.add_plugins(MinimalPlugins)
            .insert_resource(Session(session))
            .init_resource::<Mounted>()
            .add_message::<ViewerMounted>()
            .add_message::<ViewerUnmounted>()
            .add_plugins(HostPlugin);
        app
    }

    #[test]
    fn test_running_app_accepts_queued_mount() {
        let old = ViewerSession::new();
        let mut app = app(old.clone());

        with_host(|host| {
            assert!(matches!(host.mount("#viewer", request("/a.glb")), Ok(Mount::Start(_))));
            assert!(matches!(host.mount("#viewer", request("/b.glb")), Ok(Mount::Handoff)));
        });
        app.update();

        assert!(!old.is_mounted());
        let world = app.world();
        assert!(world.resource::<Session>().is_mounted());
        let mounts: Vec<_> = app
            .world_mut()
            .resource_mut::<Messages<ViewerMounted>>()
            .drain()
            .map(|m| m.0.model_url)
            .collect();
        assert_eq!(mounts, vec!["/b.glb".to_string()]);
    }

    #[test]
    fn test_unmount_detaches_without_exiting() {
        let session = ViewerSession::new();
        let mut app = app(session.clone());
        app.update();
        assert!(app.world().resource::<Messages<ViewerUnmounted>>().is_empty());

        session.unmount();
        app.update();
        assert_eq!(app.world().resource::<Messages<ViewerUnmounted>>().len(), 1);
        assert!(app.should_exit().is_none());
    }
}
