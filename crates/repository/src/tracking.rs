//! Repository decorator that remembers every product it hands out.

use common::{BatchReference, Sku};
use domain::Product;

use crate::{ProductRepository, RepositoryError, Result};

/// Identity map over a [`ProductRepository`].
///
/// Every product returned by `get`/`get_by_batch_reference` or passed to `add`
/// is kept as a working copy, once per sku, in the order it was first seen.
/// Later lookups of the same sku return that same working copy, so all
/// changes made through one scope land on one instance and the events they
/// raise can be collected from [`seen`](Self::seen).
pub struct TrackingRepository<R: ProductRepository> {
    inner: R,
    seen: Vec<Product>,
}

impl<R: ProductRepository> TrackingRepository<R> {
    /// Wraps a repository with an empty seen set.
    pub fn new(inner: R) -> Self {
        Self {
            inner,
            seen: Vec::new(),
        }
    }

    /// Stages a new product. It is written by the next save of the seen set.
    pub fn add(&mut self, product: Product) -> Result<&mut Product> {
        if self.position(product.sku()).is_some() {
            return Err(RepositoryError::DuplicateProduct(product.sku().clone()));
        }
        tracing::debug!(sku = %product.sku(), "product added");
        self.seen.push(product);
        Ok(self.last_seen())
    }

    /// Returns the working copy of the product for a sku.
    pub async fn get(&mut self, sku: &Sku) -> Result<Option<&mut Product>> {
        if let Some(index) = self.position(sku) {
            return Ok(Some(&mut self.seen[index]));
        }

        let Some(product) = self.inner.get(sku).await? else {
            return Ok(None);
        };
        self.seen.push(product);
        Ok(Some(self.last_seen()))
    }

    /// Returns the working copy of the product owning a batch.
    pub async fn get_by_batch_reference(
        &mut self,
        reference: &BatchReference,
    ) -> Result<Option<&mut Product>> {
        if let Some(index) = self.seen.iter().position(|p| p.has_batch(reference)) {
            return Ok(Some(&mut self.seen[index]));
        }

        let Some(product) = self.inner.get_by_batch_reference(reference).await? else {
            return Ok(None);
        };
        if let Some(index) = self.position(product.sku()) {
            return Ok(Some(&mut self.seen[index]));
        }
        self.seen.push(product);
        Ok(Some(self.last_seen()))
    }

    /// Lists stored products. The result is a snapshot and is not tracked.
    pub async fn list(&self) -> Result<Vec<Product>> {
        self.inner.list().await
    }

    /// Iterates the tracked products in first-seen order.
    pub fn seen(&self) -> impl Iterator<Item = &Product> {
        self.seen.iter()
    }

    /// Mutable access to the tracked products in first-seen order.
    pub fn seen_mut(&mut self) -> &mut [Product] {
        &mut self.seen
    }

    fn position(&self, sku: &Sku) -> Option<usize> {
        self.seen.iter().position(|p| p.sku() == sku)
    }

    fn last_seen(&mut self) -> &mut Product {
        let index = self.seen.len() - 1;
        &mut self.seen[index]
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::InMemoryProductRepository;
    use domain::{Aggregate, Batch, OrderLine};

    async fn seeded_repository() -> InMemoryProductRepository {
        let repo = InMemoryProductRepository::new();
        repo.save(&[
            Product::new("LAMP", vec![Batch::new("b1", "LAMP", 10, None)]),
            Product::new("CHAIR", vec![Batch::new("b2", "CHAIR", 10, None)]),
        ])
        .await
        .unwrap();
        repo
    }

    fn seen_skus<R: ProductRepository>(tracking: &TrackingRepository<R>) -> Vec<String> {
        tracking.seen().map(|p| p.sku().to_string()).collect()
    }

    #[tokio::test]
    async fn test_get_tracks_products_once() {
        let mut tracking = TrackingRepository::new(seeded_repository().await);

        tracking.get(&Sku::new("LAMP")).await.unwrap();
        tracking.get(&Sku::new("CHAIR")).await.unwrap();
        tracking.get(&Sku::new("LAMP")).await.unwrap();

        assert_eq!(seen_skus(&tracking), vec!["LAMP", "CHAIR"]);
    }

    #[tokio::test]
    async fn test_missing_products_are_not_tracked() {
        let mut tracking = TrackingRepository::new(seeded_repository().await);

        assert!(tracking.get(&Sku::new("NOPE")).await.unwrap().is_none());
        assert!(
            tracking
                .get_by_batch_reference(&BatchReference::new("nope"))
                .await
                .unwrap()
                .is_none()
        );
        assert_eq!(tracking.seen().count(), 0);
    }

    #[tokio::test]
    async fn test_repeated_lookups_share_one_working_copy() {
        let mut tracking = TrackingRepository::new(seeded_repository().await);

        let product = tracking.get(&Sku::new("LAMP")).await.unwrap().unwrap();
        product.allocate(OrderLine::new("o1", "LAMP", 4));

        let again = tracking
            .get_by_batch_reference(&BatchReference::new("b1"))
            .await
            .unwrap()
            .unwrap();
        assert_eq!(again.batches()[0].available_quantity(), 6);
        assert_eq!(again.pending_events().len(), 1);
        assert_eq!(tracking.seen().count(), 1);
    }

    #[tokio::test]
    async fn test_add_tracks_new_product() {
        let mut tracking = TrackingRepository::new(InMemoryProductRepository::new());

        tracking.add(Product::new("LAMP", vec![])).unwrap();
        let product = tracking.get(&Sku::new("LAMP")).await.unwrap().unwrap();
        product
            .add_batch(Batch::new("b1", "LAMP", 5, None))
            .unwrap();

        assert_eq!(seen_skus(&tracking), vec!["LAMP"]);
        assert!(matches!(
            tracking.add(Product::new("LAMP", vec![])),
            Err(RepositoryError::DuplicateProduct(_))
        ));
    }

    #[tokio::test]
    async fn test_list_does_not_track() {
        let tracking = TrackingRepository::new(seeded_repository().await);

        assert_eq!(tracking.list().await.unwrap().len(), 2);
        assert_eq!(tracking.seen().count(), 0);
    }
}
