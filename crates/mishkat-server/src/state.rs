//! Application state management

use anyhow::{Context, Result};
use mishkat_core::{CatalogError, Product, ProductCatalog, ViewerConfig};
use std::sync::Arc;
use tracing::{info, warn};

use crate::config::Config;

/// Shared application state
pub struct AppState {
    pub config: Config,
    pub catalog: ProductCatalog,
}

impl AppState {
    /// Load the catalog named in the configuration
    ///
    /// A missing catalog file serves an empty catalog; an invalid one is an error.
    pub fn new(config: Config) -> Result<Arc<Self>> {
        let path = &config.catalog.path;
        let catalog = if path.exists() {
            let catalog = ProductCatalog::from_file(path)
                .with_context(|| format!("Failed to load catalog {}", path.display()))?;
            info!(path = %path.display(), products = catalog.len(), "Loaded product catalog");
            catalog
        } else {
            warn!(path = %path.display(), "Catalog file not found, serving no products");
            ProductCatalog::default()
        };
        Ok(Self::with_catalog(config, catalog))
    }

    pub fn with_catalog(config: Config, catalog: ProductCatalog) -> Arc<Self> {
        Arc::new(Self { config, catalog })
    }

    /// Product with model and HDRI references rewritten to public URLs
    pub fn product(&self, id: &str) -> Option<Product> {
        let mut product = self.catalog.get(id)?.clone();
        let assets = &self.config.assets;
        for model in &mut product.model {
            model.url = assets.model_url(&model.url);
            if let Some(thumbnail) = model.thumbnail_url.as_mut() {
                *thumbnail = assets.model_url(thumbnail);
            }
        }
        for hdri in &mut product.hdri {
            hdri.url = assets.hdri_url(&hdri.url);
        }
        Some(product)
    }

    pub fn products(&self) -> Vec<Product> {
        self.catalog
            .product
            .iter()
            .filter_map(|p| self.product(&p.id))
            .collect()
    }

    /// Viewer configuration for a product, with server-wide viewer defaults
    pub fn viewer_config(&self, product: &Product, hdri_index: Option<usize>) -> Result<ViewerConfig, CatalogError> {
        let mut config = product.viewer_config(hdri_index)?;
        self.config.viewer.apply(&mut config);
        Ok(config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    #[test]
    fn test_missing_catalog_serves_nothing() {
        let dir = tempfile::tempdir().unwrap();
        let mut config = Config::default();
        config.catalog.path = dir.path().join("catalog.toml");
        let state = AppState::new(config).unwrap();
        assert!(state.catalog.is_empty());
    }

    #[test]
    fn test_invalid_catalog_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let path: PathBuf = dir.path().join("catalog.toml");
        std::fs::write(&path, "[[product]]\nid = \"a\"\nname = \"A\"\n[[product]]\nid = \"a\"\nname = \"B\"\n").unwrap();
        let mut config = Config::default();
        config.catalog.path = path;
        assert!(AppState::new(config).is_err());
    }

    #[test]
    fn test_urls_are_public() {
        let catalog = ProductCatalog::from_toml(
            r#"
[[product]]
id = "bowl"
name = "Bowl"
[[product.model]]
url = "bowl.ply"
thumbnail_url = "bowl.png"
[[product.hdri]]
url = "courtyard.hdr"
is_default = true
"#,
        )
        .unwrap();
        let state = AppState::with_catalog(Config::default(), catalog);
        let product = state.product("bowl").unwrap();
        assert_eq!(product.model[0].url, "/models/bowl.ply");
        assert_eq!(product.model[0].thumbnail_url.as_deref(), Some("/models/bowl.png"));
        assert_eq!(product.hdri[0].url, "/hdri/courtyard.hdr");

        let viewer = state.viewer_config(&product, None).unwrap();
        assert_eq!(viewer.model_url, "/models/bowl.ply");
        assert_eq!(viewer.hdri_url.as_deref(), Some("/hdri/courtyard.hdr"));
    }
}
