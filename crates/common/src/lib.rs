//! Shared types for the allocation service.

mod types;

pub use types::{BatchReference, OrderId, Sku, Version};
