//! Product catalog - 3D assets attached to storefront products
//!
//! Each product carries zero or more model files and HDRI environments. A
//! product has at most one default HDRI; the viewer uses it unless the
//! embedding page asks for another.

use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::path::Path;
use thiserror::Error;

use crate::format::ModelFormat;
use crate::viewer::ViewerConfig;

#[derive(Error, Debug)]
pub enum CatalogError {
    #[error("Failed to read catalog: {0}")]
    IoError(#[from] std::io::Error),
    #[error("Failed to parse catalog: {0}")]
    ParseError(#[from] toml::de::Error),
    #[error("Duplicate product id: {0}")]
    DuplicateProduct(String),
    #[error("Product {0} has more than one default HDRI")]
    MultipleDefaultHdri(String),
    #[error("Product {product}: cannot determine format of model {url}")]
    UnknownModelFormat { product: String, url: String },
    #[error("Product {0} has no 3D model")]
    NoModel(String),
    #[error("Product {product} has no HDRI at index {index}")]
    HdriIndex { product: String, index: usize },
}

/// A model file attached to a product
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModelAsset {
    /// Absolute URL or path relative to the models directory
    pub url: String,
    /// Declared format; inferred from filename or URL when absent
    #[serde(default)]
    pub format: Option<ModelFormat>,
    #[serde(default)]
    pub filename: Option<String>,
    /// Size in bytes
    #[serde(default)]
    pub file_size: u64,
    #[serde(default)]
    pub thumbnail_url: Option<String>,
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub sort_order: i32,
}

impl ModelAsset {
    pub fn resolved_format(&self) -> Option<ModelFormat> {
        self.format
            .or_else(|| self.filename.as_deref().and_then(ModelFormat::from_path))
            .or_else(|| ModelFormat::from_path(&self.url))
    }

    pub fn is_previewable(&self) -> bool {
        self.resolved_format().is_some_and(|f| f.is_previewable())
    }
}

/// An HDRI environment attached to a product
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HdriAsset {
    pub url: String,
    #[serde(default = "default_intensity")]
    pub intensity: f32,
    #[serde(default)]
    pub is_default: bool,
    /// `0..=10`
    #[serde(default)]
    pub background_blur: f32,
    #[serde(default)]
    pub title: Option<String>,
}

fn default_intensity() -> f32 {
    crate::environment::DEFAULT_INTENSITY
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Product {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub model: Vec<ModelAsset>,
    #[serde(default)]
    pub hdri: Vec<HdriAsset>,
}

impl Product {
    /// Models in display order
    pub fn sorted_models(&self) -> Vec<&ModelAsset> {
        let mut models: Vec<&ModelAsset> = self.model.iter().collect();
        models.sort_by_key(|m| m.sort_order);
        models
    }

    /// First model in display order
    pub fn primary_model(&self) -> Option<&ModelAsset> {
        self.model.iter().min_by_key(|m| m.sort_order)
    }

    pub fn default_hdri(&self) -> Option<&HdriAsset> {
        self.hdri.iter().find(|h| h.is_default)
    }

    /// Viewer configuration for the primary model
    ///
    /// `hdri_index` overrides the default HDRI; without a default and
    /// without an override the viewer uses studio lighting.
    pub fn viewer_config(&self, hdri_index: Option<usize>) -> Result<ViewerConfig, CatalogError> {
        let model = self
            .primary_model()
            .ok_or_else(|| CatalogError::NoModel(self.id.clone()))?;
        let format = model
            .resolved_format()
            .ok_or_else(|| CatalogError::UnknownModelFormat {
                product: self.id.clone(),
                url: model.url.clone(),
            })?;

        let hdri = match hdri_index {
            Some(index) => Some(self.hdri.get(index).ok_or_else(|| CatalogError::HdriIndex {
                product: self.id.clone(),
                index,
            })?),
            None => self.default_hdri(),
        };

        let mut config = ViewerConfig::new(model.url.clone(), format.as_str());
        if let Some(hdri) = hdri {
            config.hdri_url = Some(hdri.url.clone());
            config.hdri_intensity = hdri.intensity;
            config.background_blur = hdri.background_blur;
        }
        Ok(config)
    }
}

/// The catalog file
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProductCatalog {
    #[serde(default = "default_version")]
    pub version: String,
    #[serde(default)]
    pub product: Vec<Product>,
}

fn default_version() -> String {
    "1.0".to_string()
}

impl Default for ProductCatalog {
    fn default() -> Self {
        Self {
            version: default_version(),
            product: Vec::new(),
        }
    }
}

impl ProductCatalog {
    /// Load and validate a catalog from a TOML file
    pub fn from_file(path: &Path) -> Result<Self, CatalogError> {
        let content = std::fs::read_to_string(path)?;
        Self::from_toml(&content)
    }

    /// Load and validate a catalog from a TOML string
    pub fn from_toml(content: &str) -> Result<Self, CatalogError> {
        let catalog: ProductCatalog = toml::from_str(content)?;
        catalog.validate()?;
        Ok(catalog)
    }

    pub fn validate(&self) -> Result<(), CatalogError> {
        let mut seen = HashSet::new();
        for product in &self.product {
            if !seen.insert(product.id.as_str()) {
                return Err(CatalogError::DuplicateProduct(product.id.clone()));
            }
            if product.hdri.iter().filter(|h| h.is_default).count() > 1 {
                return Err(CatalogError::MultipleDefaultHdri(product.id.clone()));
            }
            if let Some(model) = product.model.iter().find(|m| m.resolved_format().is_none()) {
                return Err(CatalogError::UnknownModelFormat {
                    product: product.id.clone(),
                    url: model.url.clone(),
                });
            }
        }
        Ok(())
    }

    pub fn get(&self, id: &str) -> Option<&Product> {
        self.product.iter().find(|p| p.id == id)
    }

    pub fn len(&self) -> usize {
        self.product.len()
    }

    pub fn is_empty(&self) -> bool {
        self.product.is_empty()
    }
}
