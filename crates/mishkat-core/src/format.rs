//! Model formats and decoder dispatch

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::ViewerError;

/// Formats an admin can attach to a product
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ModelFormat {
    Glb,
    Gltf,
    Stl,
    Obj,
    Ply,
    Fbx,
    Dae,
}

impl ModelFormat {
    pub const ALL: [ModelFormat; 7] = [
        ModelFormat::Glb,
        ModelFormat::Gltf,
        ModelFormat::Stl,
        ModelFormat::Obj,
        ModelFormat::Ply,
        ModelFormat::Fbx,
        ModelFormat::Dae,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            ModelFormat::Glb => "glb",
            ModelFormat::Gltf => "gltf",
            ModelFormat::Stl => "stl",
            ModelFormat::Obj => "obj",
            ModelFormat::Ply => "ply",
            ModelFormat::Fbx => "fbx",
            ModelFormat::Dae => "dae",
        }
    }

    /// Whether the viewer can render this format
    pub fn is_previewable(&self) -> bool {
        !matches!(self, ModelFormat::Fbx | ModelFormat::Dae)
    }

    /// Infer the format from a file name or URL extension
    pub fn from_path(path: &str) -> Option<Self> {
        let path = url_path(path);
        let file = path.rsplit('/').next().unwrap_or(path);
        let (_, ext) = file.rsplit_once('.')?;
        ext.parse().ok()
    }
}

impl fmt::Display for ModelFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ModelFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized = s.trim().trim_start_matches('.').to_ascii_lowercase();
        ModelFormat::ALL
            .into_iter()
            .find(|f| f.as_str() == normalized)
            .ok_or_else(|| s.trim().to_string())
    }
}

/// Decoder selected for a declared format
///
/// GLB and glTF share one decoder. Anything the viewer cannot preview, known
/// or not, lands in `Unsupported` carrying the declared name.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DecodeRoute {
    Gltf,
    Stl,
    Obj,
    Ply,
    Unsupported(String),
}

impl DecodeRoute {
    /// Route a format string as declared by the embedding page
    pub fn from_declared(format: &str) -> Self {
        match format.parse::<ModelFormat>() {
            Ok(f) => Self::for_format(f),
            Err(raw) => DecodeRoute::Unsupported(raw),
        }
    }

    pub fn for_format(format: ModelFormat) -> Self {
        match format {
            ModelFormat::Glb | ModelFormat::Gltf => DecodeRoute::Gltf,
            ModelFormat::Stl => DecodeRoute::Stl,
            ModelFormat::Obj => DecodeRoute::Obj,
            ModelFormat::Ply => DecodeRoute::Ply,
            ModelFormat::Fbx | ModelFormat::Dae => {
                DecodeRoute::Unsupported(format.as_str().to_string())
            }
        }
    }

    /// Reject unsupported routes before any fetch is attempted
    pub fn ensure_supported(self) -> Result<Self, ViewerError> {
        match self {
            DecodeRoute::Unsupported(format) => Err(ViewerError::UnsupportedFormat { format }),
            route => Ok(route),
        }
    }

    pub fn label(&self) -> &str {
        match self {
            DecodeRoute::Gltf => "glTF",
            DecodeRoute::Stl => "STL",
            DecodeRoute::Obj => "OBJ",
            DecodeRoute::Ply => "PLY",
            DecodeRoute::Unsupported(format) => format,
        }
    }
}

/// Path portion of a URL, without query string or fragment
pub(crate) fn url_path(url: &str) -> &str {
    let end = url.find(['?', '#']).unwrap_or(url.len());
    &url[..end]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_is_case_insensitive() {
        assert_eq!("GLB".parse::<ModelFormat>(), Ok(ModelFormat::Glb));
        assert_eq!(" stl ".parse::<ModelFormat>(), Ok(ModelFormat::Stl));
        assert_eq!(".Ply".parse::<ModelFormat>(), Ok(ModelFormat::Ply));
        assert!("step".parse::<ModelFormat>().is_err());
    }

    #[test]
    fn test_from_path_ignores_query() {
        assert_eq!(
            ModelFormat::from_path("https://cdn.example.com/models/lantern.OBJ?token=abc"),
            Some(ModelFormat::Obj)
        );
        assert_eq!(ModelFormat::from_path("/models/star.glb#v2"), Some(ModelFormat::Glb));
        assert_eq!(ModelFormat::from_path("https://cdn.example.com/v1.2/model"), None);
        assert_eq!(ModelFormat::from_path("noext"), None);
    }

    #[test]
    fn test_routes() {
        assert_eq!(DecodeRoute::from_declared("glb"), DecodeRoute::Gltf);
        assert_eq!(DecodeRoute::from_declared("gltf"), DecodeRoute::Gltf);
        assert_eq!(DecodeRoute::from_declared("ply"), DecodeRoute::Ply);
        assert_eq!(
            DecodeRoute::from_declared("fbx"),
            DecodeRoute::Unsupported("fbx".to_string())
        );
        assert_eq!(
            DecodeRoute::from_declared("3mf"),
            DecodeRoute::Unsupported("3mf".to_string())
        );
    }

    #[test]
    fn test_unsupported_routes_are_rejected() {
        let err = DecodeRoute::from_declared("dae").ensure_supported().unwrap_err();
        let message = err.to_string();
        assert!(message.contains("DAE"));
        assert!(message.contains("GLB, STL, OBJ, or PLY"));
        assert!(DecodeRoute::from_declared("stl").ensure_supported().is_ok());
    }

    #[test]
    fn test_previewable() {
        assert!(ModelFormat::Glb.is_previewable());
        assert!(!ModelFormat::Fbx.is_previewable());
        assert!(!ModelFormat::Dae.is_previewable());
    }
}
