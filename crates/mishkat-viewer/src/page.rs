//! Viewer configuration from the page URL
//!
//! Standalone pages boot the viewer with either `?config=<url>` pointing at a
//! JSON `ViewerConfig` or inline `?model=…&format=…&hdri=…` parameters.

use mishkat_core::ViewerConfig;
use wasm_bindgen::JsCast;
use wasm_bindgen_futures::JsFuture;

#[derive(Debug, Clone, PartialEq)]
pub enum ConfigSource {
    Inline(ViewerConfig),
    Remote(String),
}

/// Read a config source from query parameters
pub fn config_source(get: impl Fn(&str) -> Option<String>) -> Option<ConfigSource> {
    if let Some(url) = get("config").filter(|u| !u.is_empty()) {
        return Some(ConfigSource::Remote(url));
    }

    let model = get("model").filter(|m| !m.is_empty())?;
    let mut config = ViewerConfig::new(model, get("format").unwrap_or_default());
    config.hdri_url = get("hdri").filter(|h| !h.is_empty());
    if let Some(intensity) = get("intensity").and_then(|v| v.parse().ok()) {
        config.hdri_intensity = intensity;
    }
    if let Some(blur) = get("blur").and_then(|v| v.parse().ok()) {
        config.background_blur = blur;
    }
    if let Some(auto_rotate) = get("autoRotate") {
        config.auto_rotate = matches!(auto_rotate.as_str(), "" | "1" | "true");
    }
    Some(ConfigSource::Inline(config))
}

/// Max log level from `?log=`, WARN otherwise
pub fn log_level(get: impl Fn(&str) -> Option<String>) -> tracing::Level {
    get("log")
        .and_then(|level| level.parse().ok())
        .unwrap_or(tracing::Level::WARN)
}

/// Query parameter lookup for the current page
pub fn query_params() -> impl Fn(&str) -> Option<String> {
    let params = web_sys::window()
        .and_then(|w| w.location().href().ok())
        .and_then(|href| web_sys::Url::new(&href).ok())
        .map(|url| url.search_params());
    move |name| params.as_ref().and_then(|p| p.get(name))
}

/// Fetch and parse a remote JSON config
pub async fn fetch_config(url: &str) -> Result<ViewerConfig, String> {
    let window = web_sys::window().ok_or("No window")?;

    let resp = JsFuture::from(window.fetch_with_str(url))
        .await
        .map_err(|e| format!("Fetch failed: {:?}", e))?;
    let resp: web_sys::Response = resp.dyn_into().map_err(|_| "Response cast failed")?;

    if !resp.ok() {
        return Err(format!("HTTP {}: {}", resp.status(), resp.status_text()));
    }

    let text = JsFuture::from(resp.text().map_err(|_| "Failed to get text")?)
        .await
        .map_err(|e| format!("Text extraction failed: {:?}", e))?;
    let text = text.as_string().ok_or_else(|| "Not a string".to_string())?;

    ViewerConfig::from_json(&text).map_err(|e| format!("Invalid viewer config: {}", e))
}
