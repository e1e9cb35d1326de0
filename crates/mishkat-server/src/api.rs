//! REST API handlers

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::IntoResponse,
    Json,
};
use mishkat_core::CatalogError;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::debug;

use crate::state::AppState;

/// API error response
#[derive(Debug, Serialize, Deserialize)]
pub struct ApiError {
    pub error: String,
}

impl ApiError {
    fn new(msg: impl Into<String>) -> Self {
        Self { error: msg.into() }
    }
}

fn not_found(what: &str) -> axum::response::Response {
    (StatusCode::NOT_FOUND, Json(ApiError::new(format!("{} not found", what)))).into_response()
}

/// Product list entry
#[derive(Debug, Serialize, Deserialize)]
pub struct ProductSummary {
    pub id: String,
    pub name: String,
    pub description: Option<String>,
    pub model_count: usize,
    pub hdri_count: usize,
    /// Primary model can be shown in the viewer
    pub previewable: bool,
    pub thumbnail_url: Option<String>,
}

/// List all products
pub async fn list_products(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    let products: Vec<ProductSummary> = state
        .products()
        .into_iter()
        .map(|p| {
            let primary = p.primary_model();
            ProductSummary {
                previewable: primary.is_some_and(|m| m.is_previewable()),
                thumbnail_url: primary.and_then(|m| m.thumbnail_url.clone()),
                model_count: p.model.len(),
                hdri_count: p.hdri.len(),
                id: p.id,
                name: p.name,
                description: p.description,
            }
        })
        .collect();
    Json(products)
}

/// Get a specific product by ID
pub async fn get_product(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> impl IntoResponse {
    match state.product(&id) {
        Some(product) => Json(product).into_response(),
        None => not_found("Product"),
    }
}

#[derive(Debug, Deserialize)]
pub struct ViewerQuery {
    /// Index into the product's HDRI list, overriding the default
    pub hdri: Option<usize>,
}

/// Viewer configuration for a product
pub async fn get_viewer_config(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
    Query(query): Query<ViewerQuery>,
) -> impl IntoResponse {
    let Some(product) = state.product(&id) else {
        return not_found("Product");
    };

    match state.viewer_config(&product, query.hdri) {
        Ok(config) => {
            debug!(product = %id, model = %config.model_url, "Viewer config served");
            Json(config).into_response()
        }
        Err(e) => {
            let status = match e {
                CatalogError::NoModel(_) => StatusCode::NOT_FOUND,
                CatalogError::HdriIndex { .. } => StatusCode::BAD_REQUEST,
                _ => StatusCode::UNPROCESSABLE_ENTITY,
            };
            (status, Json(ApiError::new(e.to_string()))).into_response()
        }
    }
}
