//! HDRI environment pipeline
//!
//! The environment is a small state machine. A configuration either settles
//! on studio lighting right away or starts loading an HDRI behind a dimmer
//! studio placeholder. Loading ends in either a ready HDRI environment or,
//! on any fetch, decode or processing failure, the neutral studio preset.
//! Environment failures are logged and never reach the model load outcome.

pub mod cubemap;
pub mod hdr;

use std::any::Any;
use std::panic::{catch_unwind, AssertUnwindSafe};
use std::sync::Arc;
use thiserror::Error;

use crate::format::url_path;
use crate::loader::FetchError;
use cubemap::CubeMap;
use hdr::EquirectMap;

pub const DEFAULT_INTENSITY: f32 = 1.0;
/// Upper bound of the user-facing background blur scale
pub const MAX_BACKGROUND_BLUR: f32 = 10.0;
pub const CUBE_FACE_SIZE: u32 = 256;

#[derive(Error, Debug)]
pub enum HdriError {
    #[error("{0} is not a .hdr or .hdri file")]
    UnsupportedExtension(String),
    #[error("Failed to fetch HDRI: {0}")]
    Fetch(#[from] FetchError),
    #[error("Failed to decode HDRI: {0}")]
    Decode(#[from] image::ImageError),
    #[error("HDRI image is empty")]
    Empty,
    #[error("HDRI processing panicked: {0}")]
    Panicked(String),
}

/// Built-in lighting rig used whenever no HDRI is active
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct StudioPreset {
    pub intensity: f32,
}

impl StudioPreset {
    pub const NEUTRAL: StudioPreset = StudioPreset { intensity: 1.0 };
    /// Shown while an HDRI is in flight
    pub const LOADING: StudioPreset = StudioPreset { intensity: 0.4 };
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StudioReason {
    Disabled,
    NoUrl,
    UnsupportedExtension,
    LoadFailed,
}

/// Environment-related slice of the viewer configuration
#[derive(Debug, Clone, PartialEq)]
pub struct EnvironmentSettings {
    pub hdri_url: Option<String>,
    pub intensity: f32,
    pub enabled: bool,
    /// User scale, `0..=10`
    pub background_blur: f32,
    pub show_background: bool,
}

impl Default for EnvironmentSettings {
    fn default() -> Self {
        Self {
            hdri_url: None,
            intensity: DEFAULT_INTENSITY,
            enabled: true,
            background_blur: 0.0,
            show_background: true,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum EnvironmentPlan {
    Studio(StudioReason),
    Fetch(String),
}

impl EnvironmentSettings {
    /// Decide between studio lighting and an HDRI fetch
    ///
    /// Logs when the URL is rejected, so call it once per mount and pass the
    /// resulting phase along.
    pub fn plan(&self) -> EnvironmentPlan {
        if !self.enabled {
            return EnvironmentPlan::Studio(StudioReason::Disabled);
        }
        match self.hdri_url.as_deref().map(str::trim).filter(|u| !u.is_empty()) {
            None => EnvironmentPlan::Studio(StudioReason::NoUrl),
            Some(url) if !has_hdri_extension(url) => {
                tracing::warn!(url, "HDRI URL is not a .hdr/.hdri file, using studio lighting");
                EnvironmentPlan::Studio(StudioReason::UnsupportedExtension)
            }
            Some(url) => EnvironmentPlan::Fetch(url.to_string()),
        }
    }

    pub fn initial_phase(&self) -> EnvironmentPhase {
        match self.plan() {
            EnvironmentPlan::Studio(reason) => EnvironmentPhase::Studio {
                preset: StudioPreset::NEUTRAL,
                reason,
            },
            EnvironmentPlan::Fetch(url) => EnvironmentPhase::Loading {
                placeholder: StudioPreset::LOADING,
                url,
            },
        }
    }

    /// Renderer blur in `0..=1`
    pub fn blur(&self) -> f32 {
        blur_factor(self.background_blur)
    }
}

#[derive(Debug, Clone)]
pub enum EnvironmentPhase {
    Studio {
        preset: StudioPreset,
        reason: StudioReason,
    },
    Loading {
        placeholder: StudioPreset,
        url: String,
    },
    Ready(Arc<HdriEnvironment>),
}

impl EnvironmentPhase {
    pub fn fallback() -> Self {
        EnvironmentPhase::Studio {
            preset: StudioPreset::NEUTRAL,
            reason: StudioReason::LoadFailed,
        }
    }

    pub fn is_ready(&self) -> bool {
        matches!(self, EnvironmentPhase::Ready(_))
    }

    pub fn is_loading(&self) -> bool {
        matches!(self, EnvironmentPhase::Loading { .. })
    }

    /// Studio preset to light the scene with, if any
    pub fn studio(&self) -> Option<StudioPreset> {
        match self {
            EnvironmentPhase::Studio { preset, .. } => Some(*preset),
            EnvironmentPhase::Loading { placeholder, .. } => Some(*placeholder),
            EnvironmentPhase::Ready(_) => None,
        }
    }
}

/// Decoded HDRI ready for upload
#[derive(Debug)]
pub struct HdriEnvironment {
    pub url: String,
    /// Sharp map for image-based lighting
    pub lighting: Arc<CubeMap>,
    /// Map shown behind the model; `None` when the background is hidden
    pub background: Option<Arc<CubeMap>>,
    pub intensity: f32,
    pub blur: f32,
}

/// Map the `0..=10` user scale onto `0..=1` with a quadratic ease
pub fn blur_factor(input: f32) -> f32 {
    let x = if input.is_finite() {
        input.clamp(0.0, MAX_BACKGROUND_BLUR)
    } else {
        0.0
    };
    (x / MAX_BACKGROUND_BLUR).powi(2)
}

/// Case-insensitive `.hdr`/`.hdri` check on the URL path
pub fn has_hdri_extension(url: &str) -> bool {
    let path = url_path(url).to_ascii_lowercase();
    path.ends_with(".hdr") || path.ends_with(".hdri")
}

/// Decode, orient and project an HDRI
pub fn build_environment(
    url: &str,
    bytes: &[u8],
    settings: &EnvironmentSettings,
) -> Result<HdriEnvironment, HdriError> {
    let mut map = EquirectMap::decode(bytes)?;
    map.flip_vertical();

    let lighting = Arc::new(CubeMap::from_equirect(&map, CUBE_FACE_SIZE));
    let blur = settings.blur();
    let background = match (settings.show_background, blur > 0.0) {
        (false, _) => None,
        (true, false) => Some(lighting.clone()),
        (true, true) => Some(Arc::new(CubeMap::from_equirect(
            &map.blurred(blur),
            CUBE_FACE_SIZE,
        ))),
    };

    Ok(HdriEnvironment {
        url: url.to_string(),
        lighting,
        background,
        intensity: settings.intensity,
        blur,
    })
}

/// Run environment work so that neither errors nor panics escape
///
/// Panics are only caught on targets that unwind.
pub fn isolate<T>(work: impl FnOnce() -> Result<T, HdriError>) -> Result<T, HdriError> {
    match catch_unwind(AssertUnwindSafe(work)) {
        Ok(result) => result,
        Err(payload) => Err(HdriError::Panicked(panic_message(payload.as_ref()))),
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        s.to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "unknown panic".to_string()
    }
}

/// Settle a loading environment from its fetch result
pub fn resolve(
    url: &str,
    fetched: Result<Vec<u8>, FetchError>,
    settings: &EnvironmentSettings,
) -> EnvironmentPhase {
    let result = isolate(|| {
        let bytes = fetched?;
        build_environment(url, &bytes, settings)
    });
    match result {
        Ok(env) => {
            tracing::info!(url, intensity = env.intensity, blur = env.blur, "HDRI environment ready");
            EnvironmentPhase::Ready(Arc::new(env))
        }
        Err(e) => {
            tracing::warn!(url, error = %e, "HDRI unavailable, falling back to studio lighting");
            EnvironmentPhase::fallback()
        }
    }
}
