//! Page callbacks: `onLoad()`, `onError(message)` and `onProgress(percent)`

use bevy::prelude::*;
use js_sys::{Function, Reflect};
use mishkat_core::ViewerEvent;
use mishkat_scene::ViewerNotification;
use wasm_bindgen::{JsCast, JsValue};

use crate::file_loader::Session;

/// JavaScript functions supplied to `mount()`; kept on the main thread
#[derive(Default)]
pub struct PageCallbacks {
    pub on_load: Option<Function>,
    pub on_error: Option<Function>,
    pub on_progress: Option<Function>,
}

impl PageCallbacks {
    /// Pick `onLoad`, `onError` and `onProgress` off a plain object
    pub fn from_object(callbacks: &JsValue) -> Self {
        let get = |name: &str| {
            if callbacks.is_undefined() || callbacks.is_null() {
                return None;
            }
            Reflect::get(callbacks, &JsValue::from_str(name))
                .ok()
                .and_then(|f| f.dyn_into::<Function>().ok())
        };
        Self {
            on_load: get("onLoad"),
            on_error: get("onError"),
            on_progress: get("onProgress"),
        }
    }

    fn invoke(&self, event: &ViewerEvent) {
        let result = match event {
            ViewerEvent::Loaded => self.on_load.as_ref().map(|f| f.call0(&JsValue::NULL)),
            ViewerEvent::Failed(message) => self
                .on_error
                .as_ref()
                .map(|f| f.call1(&JsValue::NULL, &JsValue::from_str(message))),
            ViewerEvent::Progress(percent) => self
                .on_progress
                .as_ref()
                .map(|f| f.call1(&JsValue::NULL, &JsValue::from_f64(f64::from(*percent)))),
        };
        if let Some(Err(e)) = result {
            tracing::warn!(?event, error = ?e, "Page callback threw");
        }
    }
}

pub struct CallbacksPlugin;

impl Plugin for CallbacksPlugin {
    fn build(&self, app: &mut App) {
        app.add_systems(PostUpdate, forward_notifications);
    }
}

fn forward_notifications(
    mut notifications: MessageReader<ViewerNotification>,
    callbacks: Option<NonSend<PageCallbacks>>,
    session: Res<Session>,
) {
    let Some(callbacks) = callbacks else {
        notifications.clear();
        return;
    };
    for ViewerNotification(event) in notifications.read() {
        if !session.is_mounted() {
            return;
        }
        callbacks.invoke(event);
    }
}
