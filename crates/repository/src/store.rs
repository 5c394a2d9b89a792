use async_trait::async_trait;
use common::{BatchReference, Sku, Version};
use domain::Product;

use crate::Result;

/// Core trait for product persistence.
///
/// A repository hands out owned copies of stored products and writes changed
/// products back. It never sees domain events: those live on the in-memory
/// aggregate only. All implementations must be thread-safe (Send + Sync).
#[async_trait]
pub trait ProductRepository: Send + Sync {
    /// Loads the product for a sku.
    ///
    /// Returns None if no product was ever saved for it.
    async fn get(&self, sku: &Sku) -> Result<Option<Product>>;

    /// Loads the product owning the batch with this reference.
    async fn get_by_batch_reference(&self, reference: &BatchReference)
    -> Result<Option<Product>>;

    /// Loads every stored product.
    async fn list(&self) -> Result<Vec<Product>>;

    /// Saves products atomically: either all are written or none are.
    ///
    /// Each product's `version()` must equal the stored version (or
    /// `Version::initial()` for a product that was never saved), otherwise the
    /// save fails with `ConcurrencyConflict`.
    ///
    /// Returns the new version of each product, in input order.
    async fn save(&self, products: &[Product]) -> Result<Vec<Version>>;
}
