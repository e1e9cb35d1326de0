//! Errors that end a model load

use thiserror::Error;

use crate::decode::DecodeError;
use crate::loader::FetchError;

/// A fatal model load failure, reported once through `on_error`
#[derive(Error, Debug)]
pub enum ViewerError {
    #[error("Format {} is not yet supported in preview. Please use GLB, STL, OBJ, or PLY format.", .format.to_uppercase())]
    UnsupportedFormat { format: String },
    #[error("Failed to fetch model: {0}")]
    Fetch(#[from] FetchError),
    #[error("Failed to decode {format} model: {source}")]
    Decode {
        format: String,
        #[source]
        source: DecodeError,
    },
    #[error("Model has no measurable size (largest dimension {max_dim}); nothing to display")]
    DegenerateGeometry { max_dim: f32 },
}

impl ViewerError {
    pub fn decode(format: impl Into<String>, source: DecodeError) -> Self {
        ViewerError::Decode {
            format: format.into(),
            source,
        }
    }

    /// Short headline for the error panel; `to_string()` carries the reason
    pub fn title(&self) -> &'static str {
        match self {
            ViewerError::UnsupportedFormat { .. } => "Unsupported format",
            ViewerError::Fetch(_) => "Model unavailable",
            ViewerError::Decode { .. } => "Failed to load model",
            ViewerError::DegenerateGeometry { .. } => "Empty model",
        }
    }
}
