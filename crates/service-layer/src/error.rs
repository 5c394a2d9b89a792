//! Service layer error types.

use common::{BatchReference, Sku};
use domain::ProductError;
use repository::RepositoryError;
use thiserror::Error;

/// Delivery failure of an outbound adapter.
#[derive(Debug, Error)]
pub enum NotificationError {
    /// The event publisher rejected a message.
    #[error("Publish to channel '{channel}' failed: {reason}")]
    Publish { channel: String, reason: String },

    /// The mailer rejected a message.
    #[error("Mail to '{address}' failed: {reason}")]
    Mail { address: String, reason: String },
}

/// Errors that can occur while handling a message.
#[derive(Debug, Error)]
pub enum ServiceError {
    /// No product exists for the sku.
    #[error("Invalid sku {0}")]
    InvalidSku(Sku),

    /// Order lines must have a positive quantity.
    #[error("Invalid quantity {0} for order line")]
    InvalidQuantity(u32),

    /// No product owns a batch with this reference.
    #[error("Batch not found: {0}")]
    BatchNotFound(BatchReference),

    /// Product aggregate rejected the change.
    #[error("Product error: {0}")]
    Product(#[from] ProductError),

    /// Repository error.
    #[error("Repository error: {0}")]
    Repository(#[from] RepositoryError),

    /// Outbound adapter error.
    #[error("Notification error: {0}")]
    Notification(#[from] NotificationError),

    /// Serialization error.
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl ServiceError {
    /// Returns true for an optimistic concurrency failure on save.
    pub fn is_concurrency_conflict(&self) -> bool {
        matches!(
            self,
            ServiceError::Repository(RepositoryError::ConcurrencyConflict { .. })
        )
    }
}

/// Convenience type alias for service results.
pub type Result<T> = std::result::Result<T, ServiceError>;
