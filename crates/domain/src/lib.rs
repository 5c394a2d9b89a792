//! Domain layer for the allocation service.
//!
//! This crate provides the core domain abstractions including:
//! - Aggregate trait for entities that record their own events
//! - DomainEvent trait for domain events
//! - Product aggregate with its batches and allocation rules
//! - The commands and events exchanged with the service layer

pub mod aggregate;
pub mod product;

pub use aggregate::{Aggregate, DomainEvent};
pub use product::{
    Allocate, Allocated, Batch, ChangeBatchQuantity, Command, CreateBatch, Deallocate,
    Deallocated, Event, OrderLine, OutOfStock, Product, ProductError,
};
