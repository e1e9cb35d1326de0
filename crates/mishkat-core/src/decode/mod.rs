//! Format decoders
//!
//! Each decoder turns raw bytes into a [`ModelScene`]. Formats that carry
//! no materials (STL, PLY, and OBJ without a resolvable library) get the
//! default gold material on every mesh.

pub mod gltf;
pub mod obj;
pub mod ply;
pub mod stl;

use std::collections::HashMap;
use thiserror::Error;

use crate::error::ViewerError;
use crate::format::DecodeRoute;
use crate::geometry::ModelScene;

pub use ply::PlyError;

/// Side resources a glTF references by relative URI, keyed by that URI
pub type ExternalResources = HashMap<String, Vec<u8>>;

#[derive(Error, Debug)]
pub enum DecodeError {
    #[error("STL parse error: {0}")]
    Stl(#[source] std::io::Error),
    #[error("OBJ parse error: {0}")]
    Obj(#[from] tobj::LoadError),
    #[error("PLY parse error: {0}")]
    Ply(#[from] PlyError),
    #[error("glTF parse error: {0}")]
    Gltf(#[from] ::gltf::Error),
    #[error("glTF buffer {index} ({uri}) is unavailable")]
    MissingBuffer { index: usize, uri: String },
    #[error("glTF buffer {index} holds {actual} bytes, expected {expected}")]
    ShortBuffer {
        index: usize,
        expected: usize,
        actual: usize,
    },
    #[error("Invalid data URI: {0}")]
    DataUri(String),
    #[error("Model contains no triangles")]
    Empty,
}

impl DecodeRoute {
    /// Decode bytes with the decoder this route selects
    pub fn decode(
        &self,
        bytes: &[u8],
        externals: &ExternalResources,
    ) -> Result<ModelScene, ViewerError> {
        let result = match self {
            DecodeRoute::Gltf => gltf::decode(bytes, externals),
            DecodeRoute::Stl => stl::decode(bytes),
            DecodeRoute::Obj => obj::decode(bytes),
            DecodeRoute::Ply => ply::decode(bytes),
            DecodeRoute::Unsupported(format) => {
                return Err(ViewerError::UnsupportedFormat {
                    format: format.clone(),
                })
            }
        };
        let scene = result.map_err(|e| ViewerError::decode(self.label(), e))?;
        if scene.is_empty() {
            return Err(ViewerError::decode(self.label(), DecodeError::Empty));
        }
        tracing::debug!(
            format = self.label(),
            meshes = scene.meshes.len(),
            triangles = scene.triangle_count(),
            "Decoded model"
        );
        Ok(scene)
    }
}
