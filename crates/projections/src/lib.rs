//! Read models for the query side.
//!
//! Views here are kept up to date by event handlers in the service layer and
//! read directly by the HTTP entrypoint, bypassing the product aggregate.

pub mod views;

pub use views::{AllocationEntry, AllocationsView};
