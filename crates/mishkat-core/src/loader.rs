//! Asynchronous load pipeline
//!
//! Fetching is abstracted behind [`ResourceFetcher`] so the same pipeline
//! drives the browser viewer (fetch API) and the native tooling
//! (HTTP client or local files). Model and environment loads are
//! independent futures; an environment failure never touches the model.

use thiserror::Error;
use url::{ParseError, Url};

use crate::decode::{gltf, ExternalResources};
use crate::environment::{self, EnvironmentPhase, EnvironmentSettings};
use crate::error::ViewerError;
use crate::format::DecodeRoute;
use crate::normalize::NormalizedModel;
use crate::viewer::ViewerConfig;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum FetchError {
    #[error("{url} responded with HTTP {status}")]
    Status { url: String, status: u16 },
    #[error("request for {url} failed: {reason}")]
    Transport { url: String, reason: String },
}

impl FetchError {
    pub fn transport(url: &str, reason: impl ToString) -> Self {
        FetchError::Transport {
            url: url.to_string(),
            reason: reason.to_string(),
        }
    }
}

/// Source of model, texture and HDRI bytes
#[allow(async_fn_in_trait)]
pub trait ResourceFetcher {
    /// Fetch `url`, reporting download percent when the size is known
    async fn fetch(&self, url: &str, on_progress: &dyn Fn(f32)) -> Result<Vec<u8>, FetchError>;
}

fn ignore_progress(_: f32) {}

/// Fetch, decode and normalize the configured model
///
/// Unsupported formats fail before anything is fetched.
pub async fn load_model<F: ResourceFetcher>(
    fetcher: &F,
    config: &ViewerConfig,
    on_progress: &dyn Fn(f32),
) -> Result<NormalizedModel, ViewerError> {
    let route = config.route().ensure_supported()?;
    tracing::info!(url = %config.model_url, format = route.label(), "Loading model");

    let bytes = fetcher.fetch(&config.model_url, on_progress).await?;
    let externals = match route {
        DecodeRoute::Gltf => fetch_externals(fetcher, &config.model_url, &bytes).await?,
        _ => ExternalResources::new(),
    };

    let scene = route.decode(&bytes, &externals)?;
    scene.normalize()
}

async fn fetch_externals<F: ResourceFetcher>(
    fetcher: &F,
    base_url: &str,
    bytes: &[u8],
) -> Result<ExternalResources, ViewerError> {
    let uris = gltf::external_uris(bytes).map_err(|e| ViewerError::decode("glTF", e))?;
    if !uris.is_empty() {
        tracing::debug!(count = uris.len(), "Fetching glTF side files");
    }

    let fetches = uris.into_iter().map(|uri| async move {
        let url = resolve_url(base_url, &uri);
        let data = fetcher.fetch(&url, &ignore_progress).await;
        (uri, data)
    });

    let mut externals = ExternalResources::new();
    for (uri, data) in futures::future::join_all(fetches).await {
        externals.insert(uri, data?);
    }
    Ok(externals)
}

/// Resolve the environment for a configuration; never fails
///
/// Plans once, then fetches only when the plan calls for an HDRI.
pub async fn load_environment<F: ResourceFetcher>(
    fetcher: &F,
    settings: &EnvironmentSettings,
) -> EnvironmentPhase {
    match settings.initial_phase() {
        EnvironmentPhase::Loading { url, .. } => load_hdri(fetcher, &url, settings).await,
        settled => settled,
    }
}

/// Fetch and build an already planned HDRI; never fails
pub async fn load_hdri<F: ResourceFetcher>(
    fetcher: &F,
    url: &str,
    settings: &EnvironmentSettings,
) -> EnvironmentPhase {
    let fetched = fetcher.fetch(url, &ignore_progress).await;
    environment::resolve(url, fetched, settings)
}

/// Stand-in origin for bases that are paths rather than full URLs
const PATH_ORIGIN: &str = "https://path.invalid/";
const PATH_HOST: &str = "path.invalid";

/// Resolve a URI found inside a resource against that resource's URL
///
/// Full URLs follow standard reference resolution. Path bases (`/models/a.gltf`,
/// `models/a.gltf`) resolve to paths of the same kind.
pub fn resolve_url(base: &str, relative: &str) -> String {
    if relative.starts_with("data:") {
        return relative.to_string();
    }

    match Url::parse(base) {
        Ok(base) => match base.join(relative) {
            Ok(url) => url.into(),
            Err(e) => {
                tracing::debug!(%base, relative, error = %e, "Could not resolve URI");
                relative.to_string()
            }
        },
        Err(ParseError::RelativeUrlWithoutBase) => resolve_path(base, relative),
        Err(e) => {
            tracing::debug!(base, error = %e, "Model URL is not a valid URL");
            relative.to_string()
        }
    }
}

fn resolve_path(base: &str, relative: &str) -> String {
    let joined = Url::parse(PATH_ORIGIN)
        .and_then(|origin| origin.join(base))
        .and_then(|base_url| base_url.join(relative));
    let url = match joined {
        Ok(url) => url,
        Err(_) => return relative.to_string(),
    };
    if url.host_str() != Some(PATH_HOST) {
        // protocol-relative or absolute reference
        return url.into();
    }

    let mut path = url.path().to_string();
    if let Some(query) = url.query() {
        path.push('?');
        path.push_str(query);
    }
    if base.starts_with('/') {
        path
    } else {
        path.trim_start_matches('/').to_string()
    }
}
