//! Fullscreen API bridge
//!
//! The viewer only asks for fullscreen; the flag follows the browser's
//! `fullscreenchange` events so an Escape press is picked up too.

use bevy::prelude::*;
use mishkat_core::FullscreenRequest;
use mishkat_scene::{FullscreenChanged, FullscreenRequested};
use std::sync::{Arc, Mutex};
use wasm_bindgen::prelude::*;

/// Selector of the element that goes fullscreen
#[derive(Resource, Debug, Clone)]
pub struct FullscreenTarget(pub String);

#[derive(Resource, Default)]
struct PendingFullscreen(Arc<Mutex<Option<bool>>>);

/// Registered `fullscreenchange` listener, removed when the app is dropped
struct FullscreenListener {
    document: web_sys::Document,
    closure: Closure<dyn FnMut(web_sys::Event)>,
}

impl Drop for FullscreenListener {
    fn drop(&mut self) {
        let _ = self.document.remove_event_listener_with_callback(
            "fullscreenchange",
            self.closure.as_ref().unchecked_ref(),
        );
    }
}

pub struct FullscreenPlugin;

impl Plugin for FullscreenPlugin {
    fn build(&self, app: &mut App) {
        app.init_resource::<PendingFullscreen>()
            .add_systems(Startup, listen_for_changes)
            .add_systems(Update, (request_fullscreen, process_fullscreen_changes));
    }
}

fn listen_for_changes(world: &mut World) {
    let Some(document) = web_sys::window().and_then(|w| w.document()) else {
        return;
    };
    let slot = world.resource::<PendingFullscreen>().0.clone();
    let selector = world.resource::<FullscreenTarget>().0.clone();
    let doc = document.clone();

    let closure = Closure::wrap(Box::new(move |_event: web_sys::Event| {
        let target = doc.query_selector(&selector).ok().flatten();
        let active = is_viewer_fullscreen(doc.fullscreen_element().as_ref(), target.as_ref());
        if let Ok(mut pending) = slot.lock() {
            *pending = Some(active);
        }
    }) as Box<dyn FnMut(web_sys::Event)>);

    if let Err(e) = document
        .add_event_listener_with_callback("fullscreenchange", closure.as_ref().unchecked_ref())
    {
        tracing::warn!(error = ?e, "Could not listen for fullscreen changes");
        return;
    }
    world.insert_non_send_resource(FullscreenListener { document, closure });
}

/// Only the viewer's own element counts; another element going fullscreen
/// leaves the viewer windowed
fn is_viewer_fullscreen<E: PartialEq>(fullscreen: Option<&E>, target: Option<&E>) -> bool {
    matches!((fullscreen, target), (Some(f), Some(t)) if f == t)
}

fn request_fullscreen(mut requests: MessageReader<FullscreenRequested>, target: Res<FullscreenTarget>) {
    let Some(FullscreenRequested(request)) = requests.read().last() else {
        return;
    };
    let Some(document) = web_sys::window().and_then(|w| w.document()) else {
        return;
    };

    match request {
        FullscreenRequest::Enter => {
            let element = document.query_selector(&target.0).ok().flatten();
            match element {
                Some(element) => {
                    if let Err(e) = element.request_fullscreen() {
                        tracing::warn!(error = ?e, "Fullscreen request rejected");
                    }
                }
                None => tracing::warn!(selector = %target.0, "Fullscreen target not found"),
            }
        }
        FullscreenRequest::Exit => document.exit_fullscreen(),
    }
}

fn process_fullscreen_changes(pending: Res<PendingFullscreen>, mut changes: MessageWriter<FullscreenChanged>) {
    if let Ok(mut slot) = pending.0.try_lock() {
        if let Some(active) = slot.take() {
            changes.write(FullscreenChanged(active));
        }
    }
}
