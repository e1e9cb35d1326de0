//! Mishkat Core - Model decoding, normalization and viewer state
//!
//! This crate provides everything the product model viewer needs that does
//! not touch a renderer:
//! - Format dispatch and decoders for GLB/glTF, STL, OBJ and PLY
//! - Geometry normalization (center at origin, fit into a 2-unit cube)
//! - HDRI environment decoding, cubemap projection and the fallback pipeline
//! - Viewer state, orbit camera controller and load session liveness
//! - The async load pipeline over a pluggable resource fetcher
//! - The product catalog that feeds viewer configurations

pub mod catalog;
pub mod decode;
pub mod environment;
pub mod error;
pub mod format;
pub mod geometry;
pub mod loader;
pub mod material;
pub mod normalize;
pub mod orbit;
pub mod state;
pub mod viewer;

#[cfg(test)]
pub(crate) mod fixtures;

pub use catalog::{CatalogError, HdriAsset, ModelAsset, Product, ProductCatalog};
pub use decode::DecodeError;
pub use environment::{
    EnvironmentPhase, EnvironmentPlan, EnvironmentSettings, HdriEnvironment, HdriError,
    StudioPreset, StudioReason,
};
pub use error::ViewerError;
pub use format::{DecodeRoute, ModelFormat};
pub use geometry::{Aabb, MeshData, ModelScene, SceneMesh};
pub use loader::{load_environment, load_hdri, load_model, FetchError, ResourceFetcher};
pub use material::{MaterialDesc, TextureData};
pub use normalize::{NormalizedModel, Normalization};
pub use orbit::{OrbitConfig, OrbitController};
pub use state::{
    FullscreenRequest, LoadFailure, LoadStage, LoadTicket, ViewerEvent, ViewerSession, ViewerState,
};
pub use viewer::ViewerConfig;
