//! Configuration loading and validation

use anyhow::Result;
use mishkat_core::ViewerConfig;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::info;

/// Main configuration structure
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub assets: AssetsConfig,
    #[serde(default)]
    pub catalog: CatalogConfig,
    #[serde(default)]
    pub viewer: ViewerDefaults,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    /// Bind address for web server
    #[serde(default = "default_bind")]
    pub bind: String,
    /// Directory holding the built viewer bundle
    #[serde(default = "default_web_root")]
    pub web_root: PathBuf,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind: default_bind(),
            web_root: default_web_root(),
        }
    }
}

fn default_bind() -> String {
    "0.0.0.0:8080".to_string()
}

fn default_web_root() -> PathBuf {
    PathBuf::from("web")
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AssetsConfig {
    /// Path to 3D model files
    #[serde(default = "default_models_dir")]
    pub models_dir: PathBuf,
    /// Path to HDRI files
    #[serde(default = "default_hdri_dir")]
    pub hdri_dir: PathBuf,
    /// URL prefix the models directory is served under
    #[serde(default = "default_models_url")]
    pub models_url: String,
    /// URL prefix the HDRI directory is served under
    #[serde(default = "default_hdri_url")]
    pub hdri_url: String,
}

impl Default for AssetsConfig {
    fn default() -> Self {
        Self {
            models_dir: default_models_dir(),
            hdri_dir: default_hdri_dir(),
            models_url: default_models_url(),
            hdri_url: default_hdri_url(),
        }
    }
}

fn default_models_dir() -> PathBuf {
    PathBuf::from("./assets/models")
}

fn default_hdri_dir() -> PathBuf {
    PathBuf::from("./assets/hdri")
}

fn default_models_url() -> String {
    "/models".to_string()
}

fn default_hdri_url() -> String {
    "/hdri".to_string()
}

impl AssetsConfig {
    /// Public URL of a catalog model reference
    pub fn model_url(&self, url: &str) -> String {
        public_url(&self.models_url, url)
    }

    /// Public URL of a catalog HDRI reference
    pub fn hdri_url(&self, url: &str) -> String {
        public_url(&self.hdri_url, url)
    }
}

/// Bare file names are served from `prefix`; absolute paths and URLs pass through
fn public_url(prefix: &str, url: &str) -> String {
    if url.starts_with('/') || url.contains("://") {
        url.to_string()
    } else {
        format!("{}/{}", prefix.trim_end_matches('/'), url)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CatalogConfig {
    /// Path to the product catalog
    #[serde(default = "default_catalog_path")]
    pub path: PathBuf,
}

impl Default for CatalogConfig {
    fn default() -> Self {
        Self {
            path: default_catalog_path(),
        }
    }
}

fn default_catalog_path() -> PathBuf {
    PathBuf::from("./catalog.toml")
}

/// Viewer options applied to every product's viewer config
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ViewerDefaults {
    #[serde(default)]
    pub auto_rotate: bool,
    #[serde(default = "default_auto_rotate_speed")]
    pub auto_rotate_speed: f32,
    #[serde(default = "default_true")]
    pub show_controls: bool,
    #[serde(default = "default_true")]
    pub show_background: bool,
    #[serde(default = "default_true")]
    pub enable_hdri: bool,
    #[serde(default = "default_true")]
    pub enable_zoom: bool,
    #[serde(default = "default_true")]
    pub enable_pan: bool,
    #[serde(default = "default_camera_position")]
    pub camera_position: [f32; 3],
}

impl Default for ViewerDefaults {
    fn default() -> Self {
        Self {
            auto_rotate: false,
            auto_rotate_speed: default_auto_rotate_speed(),
            show_controls: true,
            show_background: true,
            enable_hdri: true,
            enable_zoom: true,
            enable_pan: true,
            camera_position: default_camera_position(),
        }
    }
}

fn default_true() -> bool {
    true
}

fn default_auto_rotate_speed() -> f32 {
    2.0
}

fn default_camera_position() -> [f32; 3] {
    [3.0, 3.0, 3.0]
}

impl ViewerDefaults {
    pub fn apply(&self, config: &mut ViewerConfig) {
        config.auto_rotate = self.auto_rotate;
        config.auto_rotate_speed = self.auto_rotate_speed;
        config.show_controls = self.show_controls;
        config.show_background = self.show_background;
        config.enable_hdri = self.enable_hdri;
        config.enable_zoom = self.enable_zoom;
        config.enable_pan = self.enable_pan;
        config.camera_position = self.camera_position;
    }
}

/// Load configuration from file
pub fn load_config(path: &Path) -> Result<Config> {
    if path.exists() {
        let content = std::fs::read_to_string(path)?;
        let config: Config = toml::from_str(&content)?;
        info!(path = %path.display(), "Loaded configuration");
        Ok(config)
    } else {
        info!(
            path = %path.display(),
            "Configuration file not found, using defaults"
        );
        Ok(Config::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_file_means_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let config = load_config(&dir.path().join("mishkat.toml")).unwrap();
        assert_eq!(config.server.bind, "0.0.0.0:8080");
        assert_eq!(config.assets.models_url, "/models");
        assert!(config.viewer.show_controls);
    }

    #[test]
    fn test_partial_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("mishkat.toml");
        std::fs::write(
            &path,
            r#"
[server]
bind = "127.0.0.1:9000"

[assets]
models_url = "/static/models/"

[viewer]
auto_rotate = true
camera_position = [0.0, 1.0, 4.0]
"#,
        )
        .unwrap();

        let config = load_config(&path).unwrap();
        assert_eq!(config.server.bind, "127.0.0.1:9000");
        assert_eq!(config.server.web_root, PathBuf::from("web"));
        assert_eq!(config.assets.hdri_url, "/hdri");
        assert!(config.viewer.auto_rotate);
        assert!(config.viewer.enable_pan);
        assert_eq!(config.catalog.path, PathBuf::from("./catalog.toml"));

        let mut viewer = ViewerConfig::new("/m.glb", "glb");
        config.viewer.apply(&mut viewer);
        assert!(viewer.auto_rotate);
        assert_eq!(viewer.camera_position, [0.0, 1.0, 4.0]);
    }

    #[test]
    fn test_invalid_file_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("mishkat.toml");
        std::fs::write(&path, "[server]\nbind = 8080\n").unwrap();
        assert!(load_config(&path).is_err());
    }

    #[test]
    fn test_public_urls() {
        let assets = AssetsConfig {
            models_url: "/static/models/".into(),
            ..Default::default()
        };
        assert_eq!(assets.model_url("lamp.glb"), "/static/models/lamp.glb");
        assert_eq!(assets.model_url("/elsewhere/lamp.glb"), "/elsewhere/lamp.glb");
        assert_eq!(
            assets.model_url("https://cdn.example.com/lamp.glb"),
            "https://cdn.example.com/lamp.glb"
        );
        assert_eq!(assets.hdri_url("studio.hdr"), "/hdri/studio.hdr");
    }
}
