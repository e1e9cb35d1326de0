//! Web server setup and routing

use anyhow::Result;
use axum::{routing::get, Router};
use std::sync::Arc;
use tower_http::cors::{Any, CorsLayer};
use tower_http::services::ServeDir;
use tower_http::trace::TraceLayer;
use tracing::info;

use crate::api;
use crate::state::AppState;

/// Build the application router
pub fn router(state: Arc<AppState>) -> Router {
    let assets = &state.config.assets;
    let server = &state.config.server;

    Router::new()
        // API routes
        .route("/api/products", get(api::list_products))
        .route("/api/products/{id}", get(api::get_product))
        .route("/api/products/{id}/viewer", get(api::get_viewer_config))
        // Serve models and environment maps
        .nest_service(&assets.models_url, ServeDir::new(&assets.models_dir))
        .nest_service(&assets.hdri_url, ServeDir::new(&assets.hdri_dir))
        // Static files (WASM viewer) - must be fallback for root
        .fallback_service(ServeDir::new(&server.web_root))
        .layer(TraceLayer::new_for_http())
        // CORS
        .layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any),
        )
        .with_state(state.clone())
}

/// Run plain HTTP server
pub async fn run(state: Arc<AppState>, bind: &str) -> Result<()> {
    let app = router(state);
    let listener = tokio::net::TcpListener::bind(bind).await?;
    info!(address = %bind, protocol = "HTTP", "Starting web server");
    axum::serve(listener, app).await?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::{ApiError, ProductSummary};
    use crate::config::Config;
    use axum::body::{to_bytes, Body};
    use axum::http::{Request, StatusCode};
    use mishkat_core::{Product, ProductCatalog, ViewerConfig};
    use serde::de::DeserializeOwned;
    use tower::ServiceExt;

    const CATALOG: &str = r#"
[[product]]
id = "lantern"
name = "Brass Lantern"

[[product.model]]
url = "lantern.glb"
sort_order = 1

[[product.hdri]]
url = "workshop.hdr"

[[product.hdri]]
url = "studio.hdr"
intensity = 0.7
is_default = true

[[product]]
id = "chair"
name = "Carved Chair"

[[product.model]]
url = "chair.fbx"

[[product]]
id = "print"
name = "Calligraphy Print"
"#;

    fn app(dir: &std::path::Path) -> Router {
        let mut config = Config::default();
        config.assets.models_dir = dir.join("models");
        config.assets.hdri_dir = dir.join("hdri");
        config.server.web_root = dir.join("web");
        config.viewer.auto_rotate = true;
        let catalog = ProductCatalog::from_toml(CATALOG).unwrap();
        router(AppState::with_catalog(config, catalog))
    }

    async fn get<T: DeserializeOwned>(app: Router, uri: &str) -> (StatusCode, T) {
        let response = app
            .oneshot(Request::builder().uri(uri).body(Body::empty()).unwrap())
            .await
            .unwrap();
        let status = response.status();
        let body = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        (status, serde_json::from_slice(&body).unwrap())
    }

    #[tokio::test]
    async fn test_list_products() {
        let dir = tempfile::tempdir().unwrap();
        let (status, products): (_, Vec<ProductSummary>) = get(app(dir.path()), "/api/products").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(products.len(), 3);
        assert!(products[0].previewable);
        assert_eq!(products[0].hdri_count, 2);
        assert!(!products[1].previewable);
        assert_eq!(products[2].model_count, 0);
    }

    #[tokio::test]
    async fn test_get_product() {
        let dir = tempfile::tempdir().unwrap();
        let (status, product): (_, Product) = get(app(dir.path()), "/api/products/lantern").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(product.model[0].url, "/models/lantern.glb");

        let (status, error): (_, ApiError) = get(app(dir.path()), "/api/products/missing").await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(error.error, "Product not found");
    }

    #[tokio::test]
    async fn test_viewer_config() {
        let dir = tempfile::tempdir().unwrap();
        let (status, config): (_, ViewerConfig) =
            get(app(dir.path()), "/api/products/lantern/viewer").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(config.model_url, "/models/lantern.glb");
        assert_eq!(config.hdri_url.as_deref(), Some("/hdri/studio.hdr"));
        assert_eq!(config.hdri_intensity, 0.7);
        assert!(config.auto_rotate);

        let (_, config): (_, ViewerConfig) =
            get(app(dir.path()), "/api/products/lantern/viewer?hdri=0").await;
        assert_eq!(config.hdri_url.as_deref(), Some("/hdri/workshop.hdr"));
    }

    #[tokio::test]
    async fn test_viewer_config_errors() {
        let dir = tempfile::tempdir().unwrap();
        let (status, _): (_, ApiError) =
            get(app(dir.path()), "/api/products/lantern/viewer?hdri=5").await;
        assert_eq!(status, StatusCode::BAD_REQUEST);

        let (status, _): (_, ApiError) = get(app(dir.path()), "/api/products/print/viewer").await;
        assert_eq!(status, StatusCode::NOT_FOUND);

        // unsupported formats still get a config; the viewer reports them
        let (status, config): (_, ViewerConfig) =
            get(app(dir.path()), "/api/products/chair/viewer").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(config.format.as_deref(), Some("fbx"));
    }

    #[tokio::test]
    async fn test_serves_model_files() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::create_dir_all(dir.path().join("models")).unwrap();
        std::fs::write(dir.path().join("models/lantern.glb"), b"glTF").unwrap();

        let response = app(dir.path())
            .oneshot(
                Request::builder()
                    .uri("/models/lantern.glb")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let body = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        assert_eq!(&body[..], b"glTF");
    }
}
