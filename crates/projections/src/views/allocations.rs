//! Allocations read model: which batch holds each order's lines.

use std::collections::HashMap;
use std::sync::Arc;

use common::{BatchReference, OrderId, Sku};
use serde::Serialize;
use tokio::sync::RwLock;

/// One allocated sku of an order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AllocationEntry {
    pub sku: Sku,
    pub batch_reference: BatchReference,
}

/// Denormalised view of allocations keyed by order.
///
/// Cloning shares the underlying state, so the copy held by the message bus
/// and the copy held by the HTTP layer see the same rows.
#[derive(Debug, Clone, Default)]
pub struct AllocationsView {
    orders: Arc<RwLock<HashMap<OrderId, Vec<AllocationEntry>>>>,
}

impl AllocationsView {
    /// Creates a new empty allocations view.
    pub fn new() -> Self {
        Self::default()
    }

    /// Records that an order's sku was allocated to a batch.
    ///
    /// An existing row for the same order and sku is replaced.
    pub async fn add_allocation(&self, order_id: OrderId, sku: Sku, batch_reference: BatchReference) {
        let mut orders = self.orders.write().await;
        let entries = orders.entry(order_id).or_default();
        entries.retain(|entry| entry.sku != sku);
        entries.push(AllocationEntry {
            sku,
            batch_reference,
        });
    }

    /// Removes the row for an order's sku, if any.
    pub async fn remove_allocation(&self, order_id: &OrderId, sku: &Sku) {
        let mut orders = self.orders.write().await;
        if let Some(entries) = orders.get_mut(order_id) {
            entries.retain(|entry| entry.sku != *sku);
            if entries.is_empty() {
                orders.remove(order_id);
            }
            tracing::debug!(%order_id, %sku, "allocation removed from view");
        }
    }

    /// Returns the allocations of an order, in the order they were recorded.
    pub async fn allocations_for(&self, order_id: &OrderId) -> Vec<AllocationEntry> {
        self.orders
            .read()
            .await
            .get(order_id)
            .cloned()
            .unwrap_or_default()
    }

    /// Returns the number of orders with at least one allocation.
    pub async fn order_count(&self) -> usize {
        self.orders.read().await.len()
    }
}
