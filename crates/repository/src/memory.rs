use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use common::{BatchReference, Sku, Version};
use domain::{Aggregate, Product};
use tokio::sync::RwLock;

use crate::{ProductRepository, RepositoryError, Result};

/// In-memory product repository.
///
/// Cloning produces another handle to the same storage, so one instance can
/// back many units of work. Stored products never carry pending events.
#[derive(Clone, Default)]
pub struct InMemoryProductRepository {
    products: Arc<RwLock<HashMap<Sku, Product>>>,
}

impl InMemoryProductRepository {
    /// Creates a new empty repository.
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the number of stored products.
    pub async fn product_count(&self) -> usize {
        self.products.read().await.len()
    }

    /// Removes every stored product.
    pub async fn clear(&self) {
        self.products.write().await.clear();
    }
}

#[async_trait]
impl ProductRepository for InMemoryProductRepository {
    async fn get(&self, sku: &Sku) -> Result<Option<Product>> {
        Ok(self.products.read().await.get(sku).cloned())
    }

    async fn get_by_batch_reference(
        &self,
        reference: &BatchReference,
    ) -> Result<Option<Product>> {
        let store = self.products.read().await;
        Ok(store
            .values()
            .find(|product| product.has_batch(reference))
            .cloned())
    }

    async fn list(&self) -> Result<Vec<Product>> {
        let store = self.products.read().await;
        let mut products: Vec<_> = store.values().cloned().collect();
        products.sort_by(|a, b| a.sku().cmp(b.sku()));
        Ok(products)
    }

    async fn save(&self, products: &[Product]) -> Result<Vec<Version>> {
        let mut store = self.products.write().await;

        // Check every version before writing anything
        for product in products {
            let current = store
                .get(product.sku())
                .map(Product::version)
                .unwrap_or(Version::initial());
            if current != product.version() {
                return Err(RepositoryError::ConcurrencyConflict {
                    sku: product.sku().clone(),
                    expected: product.version(),
                    actual: current,
                });
            }
        }

        let mut versions = Vec::with_capacity(products.len());
        for product in products {
            let mut stored = product.clone();
            stored.take_events();
            let version = product.version().next();
            stored.set_version(version);
            store.insert(stored.sku().clone(), stored);
            versions.push(version);
        }

        tracing::debug!(count = products.len(), "products saved");

        Ok(versions)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use domain::{Batch, OrderLine};

    fn product(sku: &str, reference: &str) -> Product {
        Product::new(sku, vec![Batch::new(reference, sku, 10, None)])
    }

    #[tokio::test]
    async fn test_save_and_get() {
        let repo = InMemoryProductRepository::new();

        let versions = repo.save(&[product("LAMP", "b1")]).await.unwrap();
        assert_eq!(versions, vec![Version::new(1)]);

        let loaded = repo.get(&Sku::new("LAMP")).await.unwrap().unwrap();
        assert_eq!(loaded.version(), Version::new(1));
        assert_eq!(loaded.batches().len(), 1);
        assert!(repo.get(&Sku::new("CHAIR")).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_get_by_batch_reference() {
        let repo = InMemoryProductRepository::new();
        repo.save(&[product("LAMP", "b1"), product("CHAIR", "b2")])
            .await
            .unwrap();

        let found = repo
            .get_by_batch_reference(&BatchReference::new("b2"))
            .await
            .unwrap()
            .unwrap();
        assert_eq!(found.sku(), &Sku::new("CHAIR"));

        let missing = repo
            .get_by_batch_reference(&BatchReference::new("b3"))
            .await
            .unwrap();
        assert!(missing.is_none());
    }

    #[tokio::test]
    async fn test_stale_version_is_rejected() {
        let repo = InMemoryProductRepository::new();
        repo.save(&[product("LAMP", "b1")]).await.unwrap();

        let mut first = repo.get(&Sku::new("LAMP")).await.unwrap().unwrap();
        let mut second = repo.get(&Sku::new("LAMP")).await.unwrap().unwrap();

        first.allocate(OrderLine::new("o1", "LAMP", 1));
        repo.save(&[first]).await.unwrap();

        second.allocate(OrderLine::new("o2", "LAMP", 1));
        let result = repo.save(&[second]).await;
        assert!(matches!(
            result,
            Err(RepositoryError::ConcurrencyConflict { .. })
        ));
    }

    #[tokio::test]
    async fn test_new_product_conflicts_with_existing_one() {
        let repo = InMemoryProductRepository::new();
        repo.save(&[product("LAMP", "b1")]).await.unwrap();

        let result = repo.save(&[product("LAMP", "b2")]).await;
        assert!(matches!(
            result,
            Err(RepositoryError::ConcurrencyConflict { .. })
        ));
    }

    #[tokio::test]
    async fn test_failed_save_writes_nothing() {
        let repo = InMemoryProductRepository::new();
        repo.save(&[product("LAMP", "b1")]).await.unwrap();

        let result = repo
            .save(&[product("CHAIR", "b2"), product("LAMP", "b3")])
            .await;
        assert!(result.is_err());
        assert_eq!(repo.product_count().await, 1);
    }

    #[tokio::test]
    async fn test_events_are_not_persisted() {
        let repo = InMemoryProductRepository::new();
        let mut lamp = product("LAMP", "b1");
        lamp.allocate(OrderLine::new("o1", "LAMP", 1));
        assert_eq!(lamp.pending_events().len(), 1);

        repo.save(&[lamp]).await.unwrap();

        let loaded = repo.get(&Sku::new("LAMP")).await.unwrap().unwrap();
        assert!(loaded.pending_events().is_empty());
        assert_eq!(loaded.batches()[0].allocated_quantity(), 1);
    }

    #[tokio::test]
    async fn test_list_and_clear() {
        let repo = InMemoryProductRepository::new();
        repo.save(&[product("LAMP", "b1"), product("CHAIR", "b2")])
            .await
            .unwrap();

        let skus: Vec<_> = repo
            .list()
            .await
            .unwrap()
            .iter()
            .map(|p| p.sku().to_string())
            .collect();
        assert_eq!(skus, vec!["CHAIR", "LAMP"]);

        repo.clear().await;
        assert_eq!(repo.product_count().await, 0);
    }
}
