//! Persistence boundary for the product aggregate.
//!
//! - [`ProductRepository`] is the storage contract the service layer needs
//! - [`InMemoryProductRepository`] implements it with shared in-process state
//! - [`TrackingRepository`] wraps any repository and records the products it returns

pub mod error;
pub mod memory;
pub mod store;
pub mod tracking;

pub use error::{RepositoryError, Result};
pub use memory::InMemoryProductRepository;
pub use store::ProductRepository;
pub use tracking::TrackingRepository;
