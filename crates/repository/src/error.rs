use common::{Sku, Version};
use thiserror::Error;

/// Errors that can occur when loading or saving products.
#[derive(Debug, Error)]
pub enum RepositoryError {
    /// A concurrency conflict occurred when saving a product.
    /// The version it was loaded at is no longer the stored version.
    #[error("Concurrency conflict for product {sku}: expected version {expected}, found {actual}")]
    ConcurrencyConflict {
        sku: Sku,
        expected: Version,
        actual: Version,
    },

    /// A product with this sku was added twice within one scope.
    #[error("Product already exists: {0}")]
    DuplicateProduct(Sku),

    /// The repository was used after its unit of work scope ended.
    #[error("No unit of work scope is open")]
    ScopeClosed,
}

/// Result type for repository operations.
pub type Result<T> = std::result::Result<T, RepositoryError>;
