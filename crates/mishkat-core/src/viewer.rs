//! Viewer configuration as supplied by the embedding page

use serde::{Deserialize, Serialize};

use crate::environment::{EnvironmentSettings, DEFAULT_INTENSITY};
use crate::format::{DecodeRoute, ModelFormat};

/// Immutable settings for one viewer mount
///
/// Field names follow the page-side camelCase convention.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ViewerConfig {
    pub model_url: String,

    /// Declared format; inferred from the URL when absent
    #[serde(default)]
    pub format: Option<String>,

    #[serde(default)]
    pub hdri_url: Option<String>,

    #[serde(default = "default_hdri_intensity")]
    pub hdri_intensity: f32,

    #[serde(default = "default_true", alias = "enableHDRI")]
    pub enable_hdri: bool,

    /// `0..=10`
    #[serde(default)]
    pub background_blur: f32,

    #[serde(default = "default_true")]
    pub show_background: bool,

    #[serde(default = "default_camera_position")]
    pub camera_position: [f32; 3],

    #[serde(default)]
    pub auto_rotate: bool,

    /// Orbit speed in the classic orbit-controls unit (2.0 = one turn per 30 s)
    #[serde(default = "default_auto_rotate_speed")]
    pub auto_rotate_speed: f32,

    #[serde(default = "default_true")]
    pub show_controls: bool,

    #[serde(default = "default_true")]
    pub enable_zoom: bool,

    #[serde(default = "default_true")]
    pub enable_pan: bool,
}

fn default_true() -> bool {
    true
}

fn default_hdri_intensity() -> f32 {
    DEFAULT_INTENSITY
}

fn default_camera_position() -> [f32; 3] {
    [3.0, 3.0, 3.0]
}

fn default_auto_rotate_speed() -> f32 {
    2.0
}

impl ViewerConfig {
    pub fn new(model_url: impl Into<String>, format: impl Into<String>) -> Self {
        Self {
            model_url: model_url.into(),
            format: Some(format.into()),
            hdri_url: None,
            hdri_intensity: default_hdri_intensity(),
            enable_hdri: true,
            background_blur: 0.0,
            show_background: true,
            camera_position: default_camera_position(),
            auto_rotate: false,
            auto_rotate_speed: default_auto_rotate_speed(),
            show_controls: true,
            enable_zoom: true,
            enable_pan: true,
        }
    }

    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }

    /// Format as declared, falling back to the model URL's extension
    pub fn declared_format(&self) -> String {
        match self.format.as_deref().map(str::trim).filter(|f| !f.is_empty()) {
            Some(format) => format.to_string(),
            None => ModelFormat::from_path(&self.model_url)
                .map(|f| f.as_str().to_string())
                .unwrap_or_else(|| "unknown".to_string()),
        }
    }

    pub fn route(&self) -> DecodeRoute {
        DecodeRoute::from_declared(&self.declared_format())
    }

    pub fn environment(&self) -> EnvironmentSettings {
        EnvironmentSettings {
            hdri_url: self.hdri_url.clone(),
            intensity: self.hdri_intensity,
            enabled: self.enable_hdri,
            background_blur: self.background_blur,
            show_background: self.show_background,
        }
    }

    /// Auto-rotation in radians per second
    pub fn auto_rotate_rate(&self) -> f32 {
        self.auto_rotate_speed * std::f32::consts::PI / 30.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_minimal_json_gets_defaults() {
        let config =
            ViewerConfig::from_json(r#"{"modelUrl": "/models/lamp.glb", "format": "glb"}"#).unwrap();
        assert_eq!(config, ViewerConfig::new("/models/lamp.glb", "glb"));
        assert_eq!(config.camera_position, [3.0, 3.0, 3.0]);
        assert!(config.enable_hdri);
        assert!(config.show_controls);
        assert!(!config.auto_rotate);
        assert_eq!(config.hdri_intensity, 1.0);
    }

    #[test]
    fn test_full_json() {
        let json = r#"{
            "modelUrl": "https://cdn.example.com/vase.stl",
            "format": "STL",
            "hdriUrl": "https://cdn.example.com/studio.hdr",
            "hdriIntensity": 0.6,
            "enableHDRI": false,
            "backgroundBlur": 4,
            "cameraPosition": [0, 1, 5],
            "autoRotate": true,
            "autoRotateSpeed": 4,
            "enableZoom": false,
            "enablePan": false,
            "showControls": false
        }"#;
        let config = ViewerConfig::from_json(json).unwrap();
        assert_eq!(config.route(), DecodeRoute::Stl);
        assert!(!config.enable_hdri);
        assert_eq!(config.camera_position, [0.0, 1.0, 5.0]);

        let env = config.environment();
        assert_eq!(env.intensity, 0.6);
        assert!(!env.enabled);
        assert!((env.blur() - 0.16).abs() < 1e-6);
    }

    #[test]
    fn test_format_inferred_from_url() {
        let mut config = ViewerConfig::new("/models/bowl.ply?v=3", "");
        assert_eq!(config.route(), DecodeRoute::Ply);
        config.format = None;
        assert_eq!(config.route(), DecodeRoute::Ply);
        config.model_url = "/models/blob".into();
        assert!(matches!(config.route(), DecodeRoute::Unsupported(_)));
    }

    #[test]
    fn test_auto_rotate_rate() {
        let config = ViewerConfig::new("/m.glb", "glb");
        let turn_seconds = 2.0 * std::f32::consts::PI / config.auto_rotate_rate();
        assert!((turn_seconds - 30.0).abs() < 1e-3);
    }
}
