//! Mishkat Viewer - embeddable browser viewer for product models
//!
//! A product page either calls [`mount`] with a JSON viewer configuration
//! and its callbacks, or serves the bundle on a page whose URL carries the
//! configuration (`?config=<url>` or `?model=…&format=…&hdri=…`).

mod app;
mod callbacks;
mod fetch;
mod file_loader;
mod fullscreen;
mod host;
mod page;

use mishkat_core::{ViewerConfig, ViewerSession};
use wasm_bindgen::prelude::*;

use crate::callbacks::PageCallbacks;
use crate::host::{Mount, MountError, MountRequest};
use crate::page::ConfigSource;

/// Handle returned by [`mount`]
#[wasm_bindgen]
pub struct ViewerHandle {
    session: ViewerSession,
}

#[wasm_bindgen]
impl ViewerHandle {
    /// Detach this configuration; results of loads still in flight are
    /// discarded and the canvas stays ready for the next `mount()`
    pub fn unmount(&self) {
        self.session.unmount();
    }

    #[wasm_bindgen(js_name = isMounted)]
    pub fn is_mounted(&self) -> bool {
        self.session.is_mounted()
    }
}

/// WASM entry point
#[wasm_bindgen(start)]
pub fn main() {
    // Set up panic hook for better error messages
    console_error_panic_hook::set_once();

    let params = page::query_params();
    tracing_wasm::set_as_global_default_with_config(
        tracing_wasm::WASMLayerConfigBuilder::new()
            .set_max_level(page::log_level(&params))
            .build()
    );

    match page::config_source(&params) {
        Some(ConfigSource::Inline(config)) => {
            if let Err(e) = start(app::DEFAULT_CANVAS, config, PageCallbacks::default()) {
                tracing::error!(error = %e, "Could not start viewer");
            }
        }
        Some(ConfigSource::Remote(url)) => {
            wasm_bindgen_futures::spawn_local(async move {
                let started = page::fetch_config(&url)
                    .await
                    .map_err(|e| e.to_string())
                    .and_then(|config| {
                        start(app::DEFAULT_CANVAS, config, PageCallbacks::default())
                            .map_err(|e| e.to_string())
                    });
                if let Err(e) = started {
                    tracing::error!(url = %url, error = %e, "Could not load viewer config");
                }
            });
        }
        // Embedding page calls mount()
        None => {}
    }
}

/// Mount the viewer on the canvas matched by `canvas`
///
/// `config` is a JSON `ViewerConfig`; `callbacks` may carry `onLoad`,
/// `onError` and `onProgress` functions. Mounting again, after an error or
/// to show another product, reuses the running viewer on the same canvas.
#[wasm_bindgen]
pub fn mount(canvas: &str, config: &str, callbacks: JsValue) -> Result<ViewerHandle, JsValue> {
    let config = ViewerConfig::from_json(config)
        .map_err(|e| JsValue::from_str(&format!("Invalid viewer config: {}", e)))?;
    let session = start(canvas, config, PageCallbacks::from_object(&callbacks))
        .map_err(|e| JsValue::from_str(&e.to_string()))?;
    Ok(ViewerHandle { session })
}

/// Start the page's app or hand the configuration to the running one
fn start(canvas: &str, config: ViewerConfig, callbacks: PageCallbacks) -> Result<ViewerSession, MountError> {
    let session = ViewerSession::new();
    let request = MountRequest {
        config,
        callbacks,
        session: session.clone(),
    };
    // the host borrow must end before the app runs
    let mount = host::with_host(|host| host.mount(canvas, request))?;
    match mount {
        Mount::Start(request) => app::run(canvas, request),
        Mount::Handoff => tracing::info!(canvas, "Remounting running viewer"),
    }
    Ok(session)
}
