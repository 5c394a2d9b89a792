//! Batch and allocation endpoints.

use std::sync::Arc;

use axum::Json;
use axum::extract::{Path, State};
use axum::http::StatusCode;
use chrono::NaiveDate;
use common::OrderId;
use domain::{Allocate, ChangeBatchQuantity, Command, CreateBatch, Deallocate};
use projections::AllocationEntry;
use repository::ProductRepository;
use serde::{Deserialize, Serialize};
use service_layer::{Bootstrap, CommandOutput, Message, TracingEventPublisher, TracingMailer};

use crate::error::ApiError;

/// Shared application state accessible from all handlers.
pub struct AppState<R: ProductRepository + Clone> {
    pub bootstrap: Bootstrap<R, TracingEventPublisher, TracingMailer>,
}

impl<R: ProductRepository + Clone> AppState<R> {
    /// Dispatches a command on a fresh bus.
    async fn handle(&self, cmd: impl Into<Command>) -> Result<Vec<CommandOutput>, ApiError> {
        let outputs = self
            .bootstrap
            .bus()
            .handle(Message::Command(cmd.into()))
            .await?;
        Ok(outputs)
    }
}

// -- Request types --

#[derive(Debug, Deserialize)]
pub struct AddBatchRequest {
    pub reference: String,
    pub sku: String,
    pub qty: u32,
    #[serde(default)]
    pub eta: Option<NaiveDate>,
}

#[derive(Debug, Deserialize)]
pub struct OrderLineRequest {
    #[serde(alias = "orderid")]
    pub order_id: String,
    pub sku: String,
    pub qty: u32,
}

#[derive(Debug, Deserialize)]
pub struct ChangeBatchQuantityRequest {
    pub reference: String,
    pub qty: u32,
}

// -- Response types --

#[derive(Serialize)]
pub struct MessageResponse {
    pub message: &'static str,
}

#[derive(Serialize)]
pub struct AllocateResponse {
    pub batch_reference: String,
}

const OK: MessageResponse = MessageResponse { message: "OK" };

// -- Handlers --

/// POST /add_batch: register a batch of stock.
#[tracing::instrument(skip(state))]
pub async fn add_batch<R: ProductRepository + Clone + 'static>(
    State(state): State<Arc<AppState<R>>>,
    Json(req): Json<AddBatchRequest>,
) -> Result<(StatusCode, Json<MessageResponse>), ApiError> {
    state
        .handle(CreateBatch::new(req.reference, req.sku, req.qty, req.eta))
        .await?;
    Ok((StatusCode::CREATED, Json(OK)))
}

/// POST /allocate: allocate an order line to a batch.
#[tracing::instrument(skip(state))]
pub async fn allocate<R: ProductRepository + Clone + 'static>(
    State(state): State<Arc<AppState<R>>>,
    Json(req): Json<OrderLineRequest>,
) -> Result<(StatusCode, Json<AllocateResponse>), ApiError> {
    let outputs = state
        .handle(Allocate::new(req.order_id, req.sku, req.qty))
        .await?;

    let Some(CommandOutput::Allocation(Some(reference))) = outputs.into_iter().next() else {
        metrics::counter!("api_out_of_stock_responses_total").increment(1);
        return Err(ApiError::BadRequest("Out of stock".to_string()));
    };

    Ok((
        StatusCode::ACCEPTED,
        Json(AllocateResponse {
            batch_reference: reference.to_string(),
        }),
    ))
}

/// POST /deallocate: release an order line.
#[tracing::instrument(skip(state))]
pub async fn deallocate<R: ProductRepository + Clone + 'static>(
    State(state): State<Arc<AppState<R>>>,
    Json(req): Json<OrderLineRequest>,
) -> Result<Json<MessageResponse>, ApiError> {
    state
        .handle(Deallocate::new(req.order_id, req.sku, req.qty))
        .await?;
    Ok(Json(OK))
}

/// POST /change_batch_quantity: change a batch's purchased quantity.
#[tracing::instrument(skip(state))]
pub async fn change_batch_quantity<R: ProductRepository + Clone + 'static>(
    State(state): State<Arc<AppState<R>>>,
    Json(req): Json<ChangeBatchQuantityRequest>,
) -> Result<Json<MessageResponse>, ApiError> {
    state
        .handle(ChangeBatchQuantity::new(req.reference, req.qty))
        .await?;
    Ok(Json(OK))
}

/// GET /allocations/{order_id}: list an order's allocations from the read model.
#[tracing::instrument(skip(state))]
pub async fn list<R: ProductRepository + Clone + 'static>(
    State(state): State<Arc<AppState<R>>>,
    Path(order_id): Path<String>,
) -> Result<Json<Vec<AllocationEntry>>, ApiError> {
    let entries = state
        .bootstrap
        .view()
        .allocations_for(&OrderId::new(order_id))
        .await;

    if entries.is_empty() {
        return Err(ApiError::NotFound("Not found".to_string()));
    }
    Ok(Json(entries))
}
