//! Product aggregate and related types.

mod aggregate;
mod batch;
mod commands;
mod events;
mod value_objects;

pub use aggregate::Product;
pub use batch::Batch;
pub use commands::{Allocate, ChangeBatchQuantity, Command, CreateBatch, Deallocate};
pub use events::{Allocated, Deallocated, Event, OutOfStock};
pub use value_objects::OrderLine;

use common::{BatchReference, Sku};
use thiserror::Error;

/// Errors that can occur during product operations.
#[derive(Debug, Error)]
pub enum ProductError {
    /// No batch of this product has the reference.
    #[error("Batch not found: {reference}")]
    BatchNotFound { reference: BatchReference },

    /// A batch of another sku was added to the product.
    #[error("Batch sku {actual} does not match product sku {expected}")]
    SkuMismatch { expected: Sku, actual: Sku },

    /// A batch with the same reference already exists.
    #[error("Batch already exists: {reference}")]
    DuplicateBatch { reference: BatchReference },
}
