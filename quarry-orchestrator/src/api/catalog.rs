//! Discovery API Handlers
//!
//! Lets clients find out which variants and categories they may submit.

use std::sync::Arc;

use axum::{Json, extract::State};
use quarry_core::dto::catalog::{CategoryList, VariantList};

use crate::service::JobService;

/// GET /scraping/variants (also /scraping/models)
/// List supported strategy variants
pub async fn list_variants(State(service): State<Arc<JobService>>) -> Json<VariantList> {
    Json(service.variants())
}

/// GET /scraping/categories
/// List valid categories
pub async fn list_categories(State(service): State<Arc<JobService>>) -> Json<CategoryList> {
    Json(service.categories())
}
