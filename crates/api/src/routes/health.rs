//! Health check endpoint.

use std::sync::Arc;

use axum::Json;
use axum::extract::State;
use repository::ProductRepository;
use serde::Serialize;

use super::allocations::AppState;
use crate::error::ApiError;

#[derive(Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub products: usize,
    pub orders: usize,
}

/// GET /health: returns system health status with product and order counts.
pub async fn check<R: ProductRepository + Clone + 'static>(
    State(state): State<Arc<AppState<R>>>,
) -> Result<Json<HealthResponse>, ApiError> {
    let products = state
        .bootstrap
        .repository()
        .list()
        .await
        .map_err(service_layer::ServiceError::from)?
        .len();
    let orders = state.bootstrap.view().order_count().await;

    Ok(Json(HealthResponse {
        status: "ok",
        products,
        orders,
    }))
}
